//! cmdtree command engine.
//!
//! Commands are built from literal keywords and typed arguments, stored in
//! a prefix-merged tree, and matched against tokenized input with
//! deterministic precedence: literals before arguments, then declaration
//! order. Permissions prune the walk, ambiguous siblings are rejected at
//! registration, and matched commands run through a pluggable execution
//! coordinator.

// Re-exports from cmdtree-types (foundation types).
pub use cmdtree_types::config;
pub use cmdtree_types::error;

pub mod argument;
pub mod command;
pub mod context;
pub mod coordinator;
pub mod manager;
pub mod parse_result;
pub mod permission;
pub mod sender;
pub mod tokenizer;
pub mod tree;

/// Parses tokens into typed values; implement to add argument kinds.
pub use argument::ArgumentParser;
/// A named argument component of a command.
pub use argument::CommandArgument;
/// An immutable command definition.
pub use command::Command;
/// Fluent builder for [`Command`].
pub use command::CommandBuilder;
/// Per-invocation sender and parsed values.
pub use context::CommandContext;
/// Pending result of a scheduled command.
pub use coordinator::CommandHandle;
/// Strategy deciding where handlers run.
pub use coordinator::ExecutionCoordinator;
pub use coordinator::{InlineCoordinator, OffloadingCoordinator};
/// Facade binding tree, gate and coordinator.
pub use manager::CommandManager;
pub use manager::RegistrationHandler;
/// Outcome of an argument parse.
pub use parse_result::ParseResult;
/// Host permission check.
pub use permission::PermissionGate;
/// Native identity to sender conversion.
pub use sender::SenderMapping;
pub use tokenizer::TokenQueue;
/// The command tree and a successful parse.
pub use tree::{CommandTree, ParsedCommand};
