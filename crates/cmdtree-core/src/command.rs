//! Immutable command definitions and their builder.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use cmdtree_types::error::{CommandError, HandlerError, Result};

use crate::argument::{CommandArgument, CommandComponent, Literal};
use crate::context::CommandContext;
use crate::parse_result::ParseResult;
use crate::tokenizer::{TokenQueue, tokenize};

/// Handler invoked with the populated context once a command matches.
pub type CommandHandler<S> =
    Arc<dyn Fn(&CommandContext<S>) -> std::result::Result<(), HandlerError> + Send + Sync>;

/// Descriptive data attached to a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandMeta {
    pub description: String,
    /// Hidden commands are never offered as suggestions.
    pub hidden: bool,
    /// Free-form host data.
    pub entries: BTreeMap<String, String>,
}

/// A fully built command: a path of components from the root, a handler,
/// a permission and metadata.
pub struct Command<S> {
    components: Vec<CommandComponent<S>>,
    permission: String,
    meta: CommandMeta,
    handler: CommandHandler<S>,
}

impl<S> Command<S> {
    /// Start a command whose first component is the literal `name`.
    pub fn builder(name: impl Into<String>) -> CommandBuilder<S> {
        CommandBuilder::new(Literal::new(name))
    }

    /// Start a command whose root literal has aliases.
    pub fn builder_with_aliases<I, A>(name: impl Into<String>, aliases: I) -> CommandBuilder<S>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        CommandBuilder::new(Literal::new(name).with_aliases(aliases))
    }

    pub fn components(&self) -> &[CommandComponent<S>] {
        &self.components
    }

    /// Argument components in declaration order.
    pub fn arguments(&self) -> impl Iterator<Item = &CommandArgument<S>> {
        self.components.iter().filter_map(CommandComponent::as_argument)
    }

    /// Name of the root literal.
    pub fn name(&self) -> &str {
        match self.components.first() {
            Some(CommandComponent::Literal(l)) => l.name(),
            _ => "",
        }
    }

    /// Empty when unrestricted.
    pub fn permission(&self) -> &str {
        &self.permission
    }

    pub fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    pub fn description(&self) -> &str {
        &self.meta.description
    }

    pub fn is_hidden(&self) -> bool {
        self.meta.hidden
    }

    pub fn handler(&self) -> &CommandHandler<S> {
        &self.handler
    }

    /// Syntax string, e.g. `give <player> [amount]`.
    pub fn syntax(&self) -> String {
        self.components
            .iter()
            .map(CommandComponent::label)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fill in omitted optional arguments that declare a default, running
    /// the default through the argument's own parser.
    pub fn apply_defaults(&self, ctx: &mut CommandContext<S>) -> Result<()> {
        for arg in self.arguments() {
            let Some(default) = arg.default_value() else {
                continue;
            };
            if ctx.contains(arg.name()) {
                continue;
            }
            let mut queue = TokenQueue::new(tokenize(default)?);
            match arg.parser().parse_value(ctx, &mut queue) {
                ParseResult::Success(value) => ctx.store_boxed(arg.name(), value),
                ParseResult::Failure(failure) => {
                    return Err(CommandError::InvalidSyntax {
                        syntax: self.syntax(),
                        argument: arg.name().to_string(),
                        failure,
                    });
                },
            }
        }
        Ok(())
    }

    /// Run the handler against a context.
    pub fn execute(&self, ctx: &CommandContext<S>) -> Result<()> {
        (self.handler)(ctx).map_err(|source| CommandError::Execution {
            command: self.syntax(),
            source,
        })
    }
}

impl<S> Clone for Command<S> {
    fn clone(&self) -> Self {
        Self {
            components: self.components.clone(),
            permission: self.permission.clone(),
            meta: self.meta.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<S> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("syntax", &self.syntax())
            .field("permission", &self.permission)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Fluent builder producing an immutable [`Command`].
pub struct CommandBuilder<S> {
    components: Vec<CommandComponent<S>>,
    permission: String,
    meta: CommandMeta,
    handler: Option<CommandHandler<S>>,
}

impl<S> CommandBuilder<S> {
    fn new(root: Literal) -> Self {
        Self {
            components: vec![CommandComponent::Literal(root)],
            permission: String::new(),
            meta: CommandMeta::default(),
            handler: None,
        }
    }

    /// Append a literal keyword.
    pub fn literal(mut self, name: impl Into<String>) -> Self {
        self.components
            .push(CommandComponent::Literal(Literal::new(name)));
        self
    }

    /// Append a literal keyword with aliases.
    pub fn literal_with_aliases<I, A>(mut self, name: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.components
            .push(CommandComponent::Literal(Literal::new(name).with_aliases(aliases)));
        self
    }

    /// Append a parsed argument.
    pub fn argument(mut self, argument: CommandArgument<S>) -> Self {
        self.components.push(CommandComponent::Argument(argument));
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = permission.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = description.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.meta.hidden = true;
        self
    }

    pub fn meta_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.entries.insert(key.into(), value.into());
        self
    }

    pub fn handler(
        mut self,
        handler: impl Fn(&CommandContext<S>) -> std::result::Result<(), HandlerError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Make this command a proxy of `target`: the target's arguments are
    /// appended in declaration order and its handler, permission and
    /// description are reused.
    pub fn proxies(mut self, target: &Command<S>) -> Self {
        for arg in target.arguments() {
            self.components
                .push(CommandComponent::Argument(arg.clone()));
        }
        self.handler = Some(Arc::clone(&target.handler));
        self.permission = target.permission.clone();
        if self.meta.description.is_empty() {
            self.meta.description = target.meta.description.clone();
        }
        self
    }

    /// Validate and freeze the command.
    pub fn build(self) -> Result<Command<S>> {
        let syntax = self.syntax();
        let malformed = self.components.iter().any(|c| match c {
            CommandComponent::Literal(l) => {
                l.name().is_empty() || l.name().contains(char::is_whitespace)
            },
            CommandComponent::Argument(a) => a.name().is_empty(),
        });
        if malformed {
            return Err(CommandError::InvalidCommand(format!(
                "'{syntax}' has an empty or whitespace-containing component"
            )));
        }

        let mut seen_optional = false;
        let mut names: Vec<&str> = Vec::new();
        for component in &self.components {
            match component {
                CommandComponent::Literal(l) => {
                    if seen_optional {
                        return Err(CommandError::InvalidCommand(format!(
                            "'{syntax}': literal '{}' follows an optional argument",
                            l.name()
                        )));
                    }
                },
                CommandComponent::Argument(a) => {
                    if names.contains(&a.name()) {
                        return Err(CommandError::InvalidCommand(format!(
                            "'{syntax}': duplicate argument name '{}'",
                            a.name()
                        )));
                    }
                    names.push(a.name());
                    if a.is_required() && seen_optional {
                        return Err(CommandError::InvalidCommand(format!(
                            "'{syntax}': required argument '{}' follows an optional argument",
                            a.name()
                        )));
                    }
                    seen_optional |= !a.is_required();
                },
            }
        }

        let Some(handler) = self.handler else {
            return Err(CommandError::InvalidCommand(format!(
                "'{syntax}' has no handler"
            )));
        };

        Ok(Command {
            components: self.components,
            permission: self.permission,
            meta: self.meta,
            handler,
        })
    }

    fn syntax(&self) -> String {
        self.components
            .iter()
            .map(CommandComponent::label)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
