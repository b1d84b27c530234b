use super::{CommandTree, Node, NodeId, NodeKind, ROOT};
use crate::context::CommandContext;
use crate::parse_result::ParseResult;
use crate::permission::PermissionGate;
use crate::tokenizer::TokenQueue;

impl<S> CommandTree<S> {
    /// Completions for the last token in `queue`.
    ///
    /// Every token but the last is matched as during parsing. Branches the
    /// sender may not enter are skipped silently, and hidden literals are
    /// never offered. An empty final token asks for every candidate at
    /// the reached node.
    pub fn suggestions(
        &self,
        ctx: &mut CommandContext<S>,
        queue: &mut TokenQueue,
        gate: &dyn PermissionGate<S>,
    ) -> Vec<String> {
        let mut current = ROOT;
        'walk: while queue.remaining() > 1 {
            let Some(token) = queue.peek().map(str::to_string) else {
                break;
            };
            let node = self.node(current);

            for &child_id in &node.children {
                let child = self.node(child_id);
                if let NodeKind::Literal(literal) = &child.kind
                    && literal.matches(&token)
                    && child.permission.allows(gate, ctx.sender())
                {
                    queue.pop();
                    current = child_id;
                    continue 'walk;
                }
            }

            for &child_id in &node.children {
                let child = self.node(child_id);
                let NodeKind::Argument { name, parser, .. } = &child.kind else {
                    continue;
                };
                if !child.permission.allows(gate, ctx.sender()) {
                    continue;
                }
                let start = queue.position();
                match parser.parse_value(ctx, queue) {
                    // The parser swallowed the token being completed, so it
                    // owns the completion.
                    ParseResult::Success(_) if queue.is_empty() => {
                        queue.rewind(start);
                        let partial = queue.remaining_input();
                        return dedup(self.argument_suggestions(child, ctx, &partial));
                    },
                    ParseResult::Success(value) => {
                        ctx.store_boxed(name, value);
                        current = child_id;
                        continue 'walk;
                    },
                    ParseResult::Failure(_) => queue.rewind(start),
                }
            }
            return Vec::new();
        }

        let partial = queue.peek().unwrap_or("").to_string();
        dedup(self.child_suggestions(current, ctx, gate, &partial))
    }

    fn child_suggestions(
        &self,
        id: NodeId,
        ctx: &CommandContext<S>,
        gate: &dyn PermissionGate<S>,
        partial: &str,
    ) -> Vec<String> {
        let mut out = Vec::new();
        for &child_id in &self.node(id).children {
            let child = self.node(child_id);
            if !child.permission.allows(gate, ctx.sender()) {
                continue;
            }
            match &child.kind {
                NodeKind::Literal(literal) if !child.hidden => {
                    out.extend(literal.suggestions(partial));
                },
                NodeKind::Argument { .. } => {
                    out.extend(self.argument_suggestions(child, ctx, partial));
                },
                _ => {},
            }
        }
        out
    }

    fn argument_suggestions(
        &self,
        node: &Node<S>,
        ctx: &CommandContext<S>,
        partial: &str,
    ) -> Vec<String> {
        match &node.kind {
            NodeKind::Argument {
                suggestions: Some(provider),
                ..
            } => provider(ctx, partial),
            NodeKind::Argument { parser, .. } => parser.suggestions(ctx, partial),
            _ => Vec::new(),
        }
    }
}

/// Drop repeated candidates, keeping first occurrences in order.
fn dedup(candidates: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}
