//! Error types for cmdtree.

use std::io;

/// Boxed error returned by command handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reason an argument parser rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentFailure {
    /// The token queue was empty when the parser needed input.
    #[error("no input was provided")]
    NoInput,

    /// The token could not be read as the expected kind of value.
    #[error("'{input}' is not a valid {expected}")]
    InvalidFormat {
        input: String,
        expected: &'static str,
    },

    /// A numeric value parsed but fell outside the allowed range.
    #[error("{input} is not in the range {min}..={max}")]
    OutOfRange { input: String, min: i64, max: i64 },

    /// None of the literal keywords at this position matched the token.
    #[error("unknown keyword '{input}', expected one of: {}", .expected.join(", "))]
    UnknownLiteral {
        input: String,
        expected: Vec<String>,
    },

    /// Parser-specific reason.
    #[error("{0}")]
    Custom(String),
}

/// Errors produced while registering, parsing or executing commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {input}")]
    NoSuchCommand { input: String },

    #[error("invalid syntax for <{argument}> in '{syntax}': {failure}")]
    InvalidSyntax {
        syntax: String,
        argument: String,
        #[source]
        failure: ArgumentFailure,
    },

    #[error("not enough arguments, expected: {syntax}")]
    NotEnoughArguments { syntax: String },

    #[error("too many arguments for '{syntax}': {}", .remaining.join(" "))]
    TooManyArguments {
        syntax: String,
        remaining: Vec<String>,
    },

    #[error("missing permission: {permission}")]
    MissingPermission { permission: String },

    #[error("ambiguous node under '{parent}': '{conflicting}' conflicts with '{existing}'")]
    AmbiguousNode {
        parent: String,
        existing: String,
        conflicting: String,
    },

    #[error("command already registered: {syntax}")]
    DuplicateCommand { syntax: String },

    #[error("command not registered: {syntax}")]
    UnknownCommand { syntax: String },

    #[error("invalid command definition: {0}")]
    InvalidCommand(String),

    #[error("execution of '{command}' failed: {source}")]
    Execution {
        command: String,
        #[source]
        source: HandlerError,
    },

    #[error("execution rejected: {0}")]
    Rejected(String),

    #[error("execution cancelled")]
    Cancelled,

    #[error("tokenize error: {0}")]
    Tokenize(String),

    #[error("input too long: {len} bytes (max {max})")]
    InputTooLong { len: usize, max: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl CommandError {
    /// Whether this error was produced while matching input against the
    /// tree, as opposed to registration, configuration or execution.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            CommandError::NoSuchCommand { .. }
                | CommandError::InvalidSyntax { .. }
                | CommandError::NotEnoughArguments { .. }
                | CommandError::TooManyArguments { .. }
                | CommandError::MissingPermission { .. }
                | CommandError::Tokenize(_)
                | CommandError::InputTooLong { .. }
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CommandError>;
