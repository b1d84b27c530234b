//! Argument parsers and the components a command is built from.
//!
//! A command is an ordered list of components. Each component is either a
//! [`Literal`] keyword or a [`CommandArgument`] that owns a parser. New
//! argument kinds are added by implementing [`ArgumentParser`].

mod integer;
mod literal;
mod string;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

pub use integer::IntegerParser;
pub use literal::Literal;
pub use string::{StringMode, StringParser};

use crate::context::{ArgumentValue, CommandContext};
use crate::parse_result::ParseResult;
use crate::tokenizer::TokenQueue;

/// How much input a parser may accept, used to reject sibling arguments
/// that could both match the same token at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Accepts only a recognisable subset of single tokens.
    Constrained,
    /// Accepts any single token.
    AnyToken,
    /// Consumes every remaining token.
    Greedy,
}

/// Parses tokens into a typed value and suggests completions.
///
/// `parse` must leave the queue untouched when it fails.
pub trait ArgumentParser<S>: Send + Sync + 'static {
    type Output: Any + Send + Sync;

    fn parse(&self, ctx: &mut CommandContext<S>, input: &mut TokenQueue)
    -> ParseResult<Self::Output>;

    fn suggestions(&self, _ctx: &CommandContext<S>, _input: &str) -> Vec<String> {
        Vec::new()
    }

    fn acceptance(&self) -> Acceptance {
        Acceptance::Constrained
    }

    /// Whether `other` accepts and produces exactly what `self` does. Two
    /// commands may share an argument node only when this holds; parsers
    /// that carry configuration must override it.
    fn same_config(&self, _other: &Self) -> bool {
        true
    }

    /// Short name shown in diagnostics.
    fn type_name(&self) -> &'static str;
}

/// Object-safe view of an [`ArgumentParser`] stored in the tree.
pub(crate) trait DynParser<S>: Send + Sync {
    fn parse_value(&self, ctx: &mut CommandContext<S>, input: &mut TokenQueue)
    -> ParseResult<ArgumentValue>;
    fn suggestions(&self, ctx: &CommandContext<S>, input: &str) -> Vec<String>;
    fn acceptance(&self) -> Acceptance;
    fn parser_id(&self) -> TypeId;
    fn same_config(&self, other: &dyn DynParser<S>) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<S, P: ArgumentParser<S>> DynParser<S> for P {
    fn parse_value(
        &self,
        ctx: &mut CommandContext<S>,
        input: &mut TokenQueue,
    ) -> ParseResult<ArgumentValue> {
        self.parse(ctx, input).map(|v| Box::new(v) as ArgumentValue)
    }

    fn suggestions(&self, ctx: &CommandContext<S>, input: &str) -> Vec<String> {
        <P as ArgumentParser<S>>::suggestions(self, ctx, input)
    }

    fn acceptance(&self) -> Acceptance {
        <P as ArgumentParser<S>>::acceptance(self)
    }

    fn parser_id(&self) -> TypeId {
        TypeId::of::<P>()
    }

    fn same_config(&self, other: &dyn DynParser<S>) -> bool {
        other
            .as_any()
            .downcast_ref::<P>()
            .is_some_and(|o| <P as ArgumentParser<S>>::same_config(self, o))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        <P as ArgumentParser<S>>::type_name(self)
    }
}

/// Custom completion source that replaces a parser's own suggestions.
pub type SuggestionProvider<S> = Arc<dyn Fn(&CommandContext<S>, &str) -> Vec<String> + Send + Sync>;

/// A named, parsed command argument.
pub struct CommandArgument<S> {
    name: String,
    parser: Arc<dyn DynParser<S>>,
    required: bool,
    default_value: Option<String>,
    suggestions: Option<SuggestionProvider<S>>,
}

impl<S> CommandArgument<S> {
    /// A required argument.
    pub fn new(name: impl Into<String>, parser: impl ArgumentParser<S>) -> Self {
        Self {
            name: name.into(),
            parser: Arc::new(parser),
            required: true,
            default_value: None,
            suggestions: None,
        }
    }

    /// Make the argument optional. Absent optional arguments are simply
    /// missing from the context.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Make the argument optional with a default, given as raw input that
    /// is run through the argument's parser when the argument is omitted.
    pub fn optional_with_default(mut self, default: impl Into<String>) -> Self {
        self.required = false;
        self.default_value = Some(default.into());
        self
    }

    /// Replace the parser's suggestions with a custom provider.
    pub fn with_suggestions(
        mut self,
        provider: impl Fn(&CommandContext<S>, &str) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.suggestions = Some(Arc::new(provider));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn type_name(&self) -> &'static str {
        self.parser.type_name()
    }

    pub(crate) fn parser(&self) -> &Arc<dyn DynParser<S>> {
        &self.parser
    }

    pub(crate) fn suggestion_provider(&self) -> Option<&SuggestionProvider<S>> {
        self.suggestions.as_ref()
    }

    /// Whether a tree node built from `self` would behave the same for
    /// `other`: same parser configuration and the same suggestion provider.
    pub(crate) fn same_config(
        &self,
        parser: &dyn DynParser<S>,
        suggestions: Option<&SuggestionProvider<S>>,
    ) -> bool {
        let same_provider = match (&self.suggestions, suggestions) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_provider && self.parser.same_config(parser)
    }

    /// Syntax label: `<name>` when required, `[name]` when optional.
    pub fn label(&self) -> String {
        if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }
}

impl<S> Clone for CommandArgument<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            parser: Arc::clone(&self.parser),
            required: self.required,
            default_value: self.default_value.clone(),
            suggestions: self.suggestions.as_ref().map(Arc::clone),
        }
    }
}

impl<S> fmt::Debug for CommandArgument<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandArgument")
            .field("name", &self.name)
            .field("parser", &self.parser.type_name())
            .field("required", &self.required)
            .field("default_value", &self.default_value)
            .finish()
    }
}

/// One step of a command path.
pub enum CommandComponent<S> {
    Literal(Literal),
    Argument(CommandArgument<S>),
}

impl<S> CommandComponent<S> {
    pub fn label(&self) -> String {
        match self {
            CommandComponent::Literal(l) => l.name().to_string(),
            CommandComponent::Argument(a) => a.label(),
        }
    }

    pub fn as_argument(&self) -> Option<&CommandArgument<S>> {
        match self {
            CommandComponent::Argument(a) => Some(a),
            CommandComponent::Literal(_) => None,
        }
    }
}

impl<S> Clone for CommandComponent<S> {
    fn clone(&self) -> Self {
        match self {
            CommandComponent::Literal(l) => CommandComponent::Literal(l.clone()),
            CommandComponent::Argument(a) => CommandComponent::Argument(a.clone()),
        }
    }
}

impl<S> fmt::Debug for CommandComponent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandComponent::Literal(l) => l.fmt(f),
            CommandComponent::Argument(a) => a.fmt(f),
        }
    }
}

/// Whether two sibling argument parsers could both accept the same input.
///
/// Parsers of the same concrete type always overlap, as does anything next
/// to a parser that accepts any token or consumes the rest of the input.
pub(crate) fn parsers_overlap<S>(a: &dyn DynParser<S>, b: &dyn DynParser<S>) -> bool {
    if a.parser_id() == b.parser_id() {
        return true;
    }
    let open = |p: &dyn DynParser<S>| p.acceptance() != Acceptance::Constrained;
    open(a) || open(b)
}
