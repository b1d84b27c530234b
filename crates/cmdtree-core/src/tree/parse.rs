use std::sync::Arc;

use cmdtree_types::error::{ArgumentFailure, CommandError, Result};

use super::{CommandTree, NodeId, NodeKind, ParsedCommand, ROOT};
use crate::command::Command;
use crate::context::CommandContext;
use crate::parse_result::ParseResult;
use crate::permission::{self, PermissionGate};
use crate::tokenizer::TokenQueue;

impl<S> CommandTree<S> {
    /// Parse a token queue into a command and a populated context.
    pub fn parse(
        &self,
        sender: S,
        queue: &mut TokenQueue,
        gate: &dyn PermissionGate<S>,
    ) -> Result<ParsedCommand<S>> {
        let mut context = CommandContext::new(sender);
        let command = self.parse_into(&mut context, queue, gate)?;
        Ok(ParsedCommand { command, context })
    }

    /// Walk the tree from the root, storing argument values in `ctx`.
    ///
    /// Literal children are tried before argument children, each group in
    /// declaration order. A failed or forbidden argument parse is rewound,
    /// so the queue is left exactly where the failing node started.
    pub fn parse_into(
        &self,
        ctx: &mut CommandContext<S>,
        queue: &mut TokenQueue,
        gate: &dyn PermissionGate<S>,
    ) -> Result<Arc<Command<S>>> {
        let mut current = ROOT;
        'walk: loop {
            let Some(token) = queue.peek().map(str::to_string) else {
                return self.finish(current, ctx, gate);
            };
            let node = self.node(current);
            if node.children.is_empty() {
                if current == ROOT {
                    return Err(CommandError::NoSuchCommand { input: token });
                }
                return Err(CommandError::TooManyArguments {
                    syntax: self.path_syntax(current),
                    remaining: queue.remaining_tokens().to_vec(),
                });
            }

            let mut denied: Option<String> = None;
            for &child_id in &node.children {
                let child = self.node(child_id);
                if let NodeKind::Literal(literal) = &child.kind
                    && literal.matches(&token)
                {
                    if child.permission.allows(gate, ctx.sender()) {
                        queue.pop();
                        current = child_id;
                        continue 'walk;
                    }
                    denied.get_or_insert_with(|| child.permission.describe());
                }
            }

            let mut failure: Option<(String, ArgumentFailure)> = None;
            for &child_id in &node.children {
                let child = self.node(child_id);
                let NodeKind::Argument { name, parser, .. } = &child.kind else {
                    continue;
                };
                let start = queue.position();
                if !child.permission.allows(gate, ctx.sender()) {
                    // Parsed only to tell a denial from a mismatch, against
                    // a scratch area that is thrown away afterwards.
                    let saved = ctx.detach_scratch();
                    let matched = parser.parse_value(ctx, queue).is_success();
                    ctx.reattach_scratch(saved);
                    queue.rewind(start);
                    if matched {
                        denied.get_or_insert_with(|| child.permission.describe());
                    }
                    continue;
                }
                match parser.parse_value(ctx, queue) {
                    ParseResult::Success(value) => {
                        ctx.store_boxed(name, value);
                        current = child_id;
                        continue 'walk;
                    },
                    ParseResult::Failure(reason) => {
                        queue.rewind(start);
                        failure = Some((name.clone(), reason));
                    },
                }
            }

            if let Some(permission) = denied {
                return Err(CommandError::MissingPermission { permission });
            }
            if let Some((argument, failure)) = failure {
                return Err(CommandError::InvalidSyntax {
                    syntax: self.branch_syntax(current),
                    argument,
                    failure,
                });
            }
            if current == ROOT {
                return Err(CommandError::NoSuchCommand { input: token });
            }
            return Err(self.unknown_literal(current, ctx, gate, token));
        }
    }

    /// Input ran out at `id`.
    fn finish(
        &self,
        id: NodeId,
        ctx: &CommandContext<S>,
        gate: &dyn PermissionGate<S>,
    ) -> Result<Arc<Command<S>>> {
        if id == ROOT {
            return Err(CommandError::NoSuchCommand {
                input: String::new(),
            });
        }
        match &self.node(id).command {
            Some(command) if permission::check(gate, ctx.sender(), command.permission()) => {
                Ok(Arc::clone(command))
            },
            Some(command) => Err(CommandError::MissingPermission {
                permission: command.permission().to_string(),
            }),
            None => Err(CommandError::NotEnoughArguments {
                syntax: self.branch_syntax(id),
            }),
        }
    }

    fn unknown_literal(
        &self,
        id: NodeId,
        ctx: &CommandContext<S>,
        gate: &dyn PermissionGate<S>,
        input: String,
    ) -> CommandError {
        let mut labels = Vec::new();
        let mut expected = Vec::new();
        for &child_id in &self.node(id).children {
            let child = self.node(child_id);
            if let NodeKind::Literal(literal) = &child.kind
                && child.permission.allows(gate, ctx.sender())
            {
                labels.push(literal.name().to_string());
                if !child.hidden {
                    expected.push(literal.name().to_string());
                }
            }
        }
        CommandError::InvalidSyntax {
            syntax: self.branch_syntax(id),
            argument: labels.join("|"),
            failure: ArgumentFailure::UnknownLiteral { input, expected },
        }
    }
}
