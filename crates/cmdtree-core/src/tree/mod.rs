//! The command tree.
//!
//! Commands are decomposed into a trie of literal and argument nodes held
//! in an arena. Shared prefixes are merged on insertion and pruned bottom-up
//! on removal. Registration rejects sibling arguments that could both match
//! the same input, so matching never needs to backtrack.

mod parse;
mod suggest;
#[cfg(test)]
mod tests;

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use cmdtree_types::error::{CommandError, Result};

use crate::argument::{
    CommandArgument, CommandComponent, DynParser, Literal, SuggestionProvider, parsers_overlap,
};
use crate::command::Command;
use crate::context::CommandContext;
use crate::permission::NodePermission;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

/// A successful parse: the matched command and the populated context.
pub struct ParsedCommand<S> {
    pub command: Arc<Command<S>>,
    pub context: CommandContext<S>,
}

impl<S: fmt::Debug> fmt::Debug for ParsedCommand<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedCommand")
            .field("command", &self.command)
            .field("context", &self.context)
            .finish()
    }
}

enum NodeKind<S> {
    Root,
    Literal(Literal),
    Argument {
        name: String,
        parser: Arc<dyn DynParser<S>>,
        optional: bool,
        suggestions: Option<SuggestionProvider<S>>,
    },
}

impl<S> Clone for NodeKind<S> {
    fn clone(&self) -> Self {
        match self {
            NodeKind::Root => NodeKind::Root,
            NodeKind::Literal(l) => NodeKind::Literal(l.clone()),
            NodeKind::Argument {
                name,
                parser,
                optional,
                suggestions,
            } => NodeKind::Argument {
                name: name.clone(),
                parser: Arc::clone(parser),
                optional: *optional,
                suggestions: suggestions.as_ref().map(Arc::clone),
            },
        }
    }
}

struct Node<S> {
    kind: NodeKind<S>,
    parent: Option<NodeId>,
    /// Declaration order.
    children: Vec<NodeId>,
    command: Option<Arc<Command<S>>>,
    /// Derived from every command at or below this node.
    permission: NodePermission,
    /// Derived: every command at or below this node is hidden.
    hidden: bool,
}

impl<S> Clone for Node<S> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            parent: self.parent,
            children: self.children.clone(),
            command: self.command.as_ref().map(Arc::clone),
            permission: self.permission.clone(),
            hidden: self.hidden,
        }
    }
}

impl<S> Node<S> {
    fn new(kind: NodeKind<S>, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            command: None,
            permission: NodePermission::Unrestricted,
            hidden: false,
        }
    }

    fn label(&self) -> String {
        match &self.kind {
            NodeKind::Root => String::new(),
            NodeKind::Literal(l) => l.name().to_string(),
            NodeKind::Argument { name, optional, .. } => {
                if *optional {
                    format!("[{name}]")
                } else {
                    format!("<{name}>")
                }
            },
        }
    }

    /// Identity used to merge prefixes: literal name, or argument name
    /// plus parser type.
    fn is_same_component(&self, component: &CommandComponent<S>) -> bool {
        match (&self.kind, component) {
            (NodeKind::Literal(l), CommandComponent::Literal(c)) => l.name() == c.name(),
            (NodeKind::Argument { name, parser, .. }, CommandComponent::Argument(a)) => {
                name == a.name() && parser.parser_id() == a.parser().parser_id()
            },
            _ => false,
        }
    }
}

/// Arena-backed trie of command nodes.
pub struct CommandTree<S> {
    nodes: Vec<Option<Node<S>>>,
    free: Vec<usize>,
}

impl<S> Default for CommandTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for CommandTree<S> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            free: self.free.clone(),
        }
    }
}

impl<S> CommandTree<S> {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeKind::Root, None))],
            free: Vec::new(),
        }
    }

    // -- Introspection --

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Children of a node in declaration order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Literal name, `<arg>`/`[arg]`, or empty for the root.
    pub fn label(&self, id: NodeId) -> Option<String> {
        self.get(id).map(Node::label)
    }

    /// Command attached to a node, if the node terminates one.
    pub fn command_at(&self, id: NodeId) -> Option<&Arc<Command<S>>> {
        self.get(id).and_then(|n| n.command.as_ref())
    }

    pub fn permission_of(&self, id: NodeId) -> Option<&NodePermission> {
        self.get(id).map(|n| &n.permission)
    }

    /// Follow a path of labels from the root.
    pub fn find(&self, labels: &[&str]) -> Option<NodeId> {
        let mut current = ROOT;
        for label in labels {
            current = *self
                .children(current)
                .iter()
                .find(|&&c| self.get(c).is_some_and(|n| n.label() == *label))?;
        }
        Some(current)
    }

    /// Live nodes, excluding the root.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.children(ROOT).is_empty()
    }

    /// Every registered command, depth-first in declaration order.
    pub fn commands(&self) -> Vec<Arc<Command<S>>> {
        let mut out: Vec<Arc<Command<S>>> = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if let Some(cmd) = &node.command
                && !out.iter().any(|c| Arc::ptr_eq(c, cmd))
            {
                out.push(Arc::clone(cmd));
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    // -- Registration --

    /// Insert a command, merging shared prefixes.
    ///
    /// Nothing is modified when insertion fails.
    pub fn insert(&mut self, command: Command<S>) -> Result<Arc<Command<S>>> {
        let command = Arc::new(command);
        let components = command.components();

        // Reuse the existing prefix, checking the first new node against its
        // would-be siblings.
        let mut path: Vec<NodeId> = Vec::new();
        let mut current = ROOT;
        for component in components {
            match self.matching_child(current, component)? {
                Some(child) => {
                    path.push(child);
                    current = child;
                },
                None => break,
            }
        }

        let attach = attach_depths(components);
        for &depth in &attach {
            if let Some(&id) = path.get(depth)
                && self.node(id).command.is_some()
            {
                return Err(CommandError::DuplicateCommand {
                    syntax: self.path_syntax(id),
                });
            }
        }

        for component in &components[path.len()..] {
            let parent = path.last().copied().unwrap_or(ROOT);
            let id = self.alloc(Node::new(node_kind(component), Some(parent)));
            self.node_mut(parent).children.push(id);
            path.push(id);
        }
        for depth in attach {
            self.node_mut(path[depth]).command = Some(Arc::clone(&command));
        }

        self.refresh_metadata();
        log::debug!("Registered command: {}", command.syntax());
        Ok(command)
    }

    /// Insert several commands atomically: either all are committed or the
    /// tree is left unchanged.
    pub fn insert_all(
        &mut self,
        commands: impl IntoIterator<Item = Command<S>>,
    ) -> Result<Vec<Arc<Command<S>>>> {
        let mut staged = self.clone();
        let mut inserted = Vec::new();
        for command in commands {
            inserted.push(staged.insert(command)?);
        }
        *self = staged;
        Ok(inserted)
    }

    /// Detach a command and prune nodes that no longer lead anywhere.
    pub fn remove(&mut self, command: &Command<S>) -> Result<Arc<Command<S>>> {
        let not_registered = || CommandError::UnknownCommand {
            syntax: command.syntax(),
        };

        let mut path: Vec<NodeId> = Vec::new();
        let mut current = ROOT;
        for component in command.components() {
            current = *self
                .children(current)
                .iter()
                .find(|&&c| self.node(c).is_same_component(component))
                .ok_or_else(not_registered)?;
            path.push(current);
        }

        let last = *path.last().ok_or_else(not_registered)?;
        let removed = match &self.node(last).command {
            Some(attached) if same_path(attached, command) => Arc::clone(attached),
            _ => return Err(not_registered()),
        };
        for &id in &path {
            let node = self.node_mut(id);
            if node
                .command
                .as_ref()
                .is_some_and(|c| Arc::ptr_eq(c, &removed))
            {
                node.command = None;
            }
        }

        let mut id = last;
        while id != ROOT {
            let node = self.node(id);
            if !node.children.is_empty() || node.command.is_some() {
                break;
            }
            let parent = node.parent.unwrap_or(ROOT);
            self.node_mut(parent).children.retain(|&c| c != id);
            self.release(id);
            id = parent;
        }

        self.refresh_metadata();
        log::debug!("Unregistered command: {}", removed.syntax());
        Ok(removed)
    }

    /// Existing child with the same identity as `component`, `None` if a
    /// new child must be created, or an error if the new child would be
    /// indistinguishable from an existing sibling. An argument node is only
    /// shared when the parser configuration and suggestion provider agree.
    fn matching_child(
        &self,
        parent: NodeId,
        component: &CommandComponent<S>,
    ) -> Result<Option<NodeId>> {
        let siblings = &self.node(parent).children;
        if let Some(&same) = siblings
            .iter()
            .find(|&&c| self.node(c).is_same_component(component))
        {
            match (component, &self.node(same).kind) {
                (CommandComponent::Literal(incoming), _) => {
                    self.check_literal_collision(parent, Some(same), incoming)?;
                },
                (CommandComponent::Argument(incoming), NodeKind::Argument { parser, suggestions, .. })
                    if !incoming.same_config(parser.as_ref(), suggestions.as_ref()) =>
                {
                    return Err(self.ambiguity(parent, same, &incoming.label()));
                },
                _ => {},
            }
            return Ok(Some(same));
        }

        match component {
            CommandComponent::Literal(incoming) => {
                self.check_literal_collision(parent, None, incoming)?;
            },
            CommandComponent::Argument(incoming) => {
                for &c in siblings {
                    if let NodeKind::Argument { parser, .. } = &self.node(c).kind
                        && parsers_overlap(parser.as_ref(), incoming.parser().as_ref())
                    {
                        return Err(self.ambiguity(parent, c, &incoming.label()));
                    }
                }
            },
        }
        Ok(None)
    }

    fn check_literal_collision(
        &self,
        parent: NodeId,
        skip: Option<NodeId>,
        incoming: &Literal,
    ) -> Result<()> {
        for &c in &self.node(parent).children {
            if Some(c) == skip {
                continue;
            }
            if let NodeKind::Literal(existing) = &self.node(c).kind
                && existing.collides_with(incoming)
            {
                return Err(self.ambiguity(parent, c, incoming.name()));
            }
        }
        Ok(())
    }

    fn ambiguity(&self, parent: NodeId, existing: NodeId, conflicting: &str) -> CommandError {
        let parent = if parent == ROOT {
            "<root>".to_string()
        } else {
            self.path_syntax(parent)
        };
        CommandError::AmbiguousNode {
            parent,
            existing: self.node(existing).label(),
            conflicting: conflicting.to_string(),
        }
    }

    /// Recompute derived permission, visibility and literal aliases for
    /// every node.
    fn refresh_metadata(&mut self) {
        self.refresh_node(ROOT, 0);
    }

    /// Returns every command at or below `id`, each once. `depth` is the
    /// component index `id` stands for.
    fn refresh_node(&mut self, id: NodeId, depth: usize) -> Vec<Arc<Command<S>>> {
        let own = self.node(id).command.as_ref().map(Arc::clone);
        let mut below: Vec<Arc<Command<S>>> = own.iter().map(Arc::clone).collect();
        let child_depth = if id == ROOT { 0 } else { depth + 1 };
        let children = self.node(id).children.clone();
        for child in children {
            // A command attached above a trailing optional argument also
            // sits on the child; every other path is disjoint.
            below.extend(
                self.refresh_node(child, child_depth)
                    .into_iter()
                    .filter(|c| !own.as_ref().is_some_and(|o| Arc::ptr_eq(o, c))),
            );
        }

        let node = self.node_mut(id);
        node.permission = NodePermission::from_commands(below.iter().map(|c| c.permission()));
        node.hidden = !below.is_empty() && below.iter().all(|c| c.is_hidden());
        if let NodeKind::Literal(literal) = &mut node.kind {
            let mut rebuilt = Literal::new(literal.name());
            for cmd in &below {
                if let Some(CommandComponent::Literal(declared)) = cmd.components().get(depth) {
                    rebuilt.merge_aliases(declared);
                }
            }
            *literal = rebuilt;
        }
        below
    }

    // -- Arena --

    fn alloc(&mut self, node: Node<S>) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            },
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            },
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.0] = None;
        self.free.push(id.0);
    }

    fn get(&self, id: NodeId) -> Option<&Node<S>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Internal lookup of an id the tree handed out itself.
    fn node(&self, id: NodeId) -> &Node<S> {
        self.get(id).expect("node id handed out by this tree")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<S> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .expect("node id handed out by this tree")
    }

    // -- Syntax strings --

    /// Labels from the root down to `id`.
    fn path_syntax(&self, id: NodeId) -> String {
        let mut labels = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ROOT {
                break;
            }
            let node = self.node(c);
            labels.push(node.label());
            current = node.parent;
        }
        labels.reverse();
        labels.join(" ")
    }

    /// Path to `id` followed by the alternatives available below it.
    fn branch_syntax(&self, id: NodeId) -> String {
        let path = self.path_syntax(id);
        let next: Vec<String> = self
            .node(id)
            .children
            .iter()
            .map(|&c| self.node(c).label())
            .collect();
        match (path.is_empty(), next.is_empty()) {
            (_, true) => path,
            (true, false) => next.join("|"),
            (false, false) => format!("{path} {}", next.join("|")),
        }
    }
}

impl<S> fmt::Debug for CommandTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let syntaxes: Vec<String> = self.commands().iter().map(|c| c.syntax()).collect();
        f.debug_struct("CommandTree")
            .field("nodes", &self.node_count())
            .field("commands", &syntaxes)
            .finish()
    }
}

fn node_kind<S>(component: &CommandComponent<S>) -> NodeKind<S> {
    match component {
        CommandComponent::Literal(l) => NodeKind::Literal(l.clone()),
        CommandComponent::Argument(a) => argument_kind(a),
    }
}

fn argument_kind<S>(argument: &CommandArgument<S>) -> NodeKind<S> {
    NodeKind::Argument {
        name: argument.name().to_string(),
        parser: Arc::clone(argument.parser()),
        optional: !argument.is_required(),
        suggestions: argument.suggestion_provider().map(Arc::clone),
    }
}

/// Component indices whose nodes execute the command: the last one, and
/// the one before every trailing optional argument.
fn attach_depths<S>(components: &[CommandComponent<S>]) -> Vec<usize> {
    let mut depths = vec![components.len() - 1];
    for (i, component) in components.iter().enumerate().skip(1) {
        if let CommandComponent::Argument(a) = component
            && !a.is_required()
        {
            depths.push(i - 1);
        }
    }
    depths
}

fn parser_identity<S>(component: &CommandComponent<S>) -> Option<(&str, TypeId, bool)> {
    component
        .as_argument()
        .map(|a| (a.name(), a.parser().parser_id(), a.is_required()))
}

/// Whether two commands describe the same path.
fn same_path<S>(a: &Command<S>, b: &Command<S>) -> bool {
    let (ca, cb) = (a.components(), b.components());
    ca.len() == cb.len()
        && ca.iter().zip(cb).all(|(x, y)| match (x, y) {
            (CommandComponent::Literal(l), CommandComponent::Literal(r)) => l.name() == r.name(),
            (CommandComponent::Argument(_), CommandComponent::Argument(_)) => {
                parser_identity(x) == parser_identity(y)
            },
            _ => false,
        })
}
