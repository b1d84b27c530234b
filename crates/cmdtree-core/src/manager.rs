//! The command manager: owns the tree, the permission gate and the
//! execution coordinator, and exposes the string-in entry points a host
//! calls.
//!
//! Registration takes `&mut self` and belongs to the host's setup phase.
//! Parsing, execution and suggestions take `&self` and may run concurrently
//! once the manager is shared.

use std::fmt;
use std::sync::Arc;

use cmdtree_types::config::{CoordinatorKind, DispatchConfig};
use cmdtree_types::error::{CommandError, HandlerError, Result};

use crate::command::Command;
use crate::context::CommandContext;
use crate::coordinator::{CommandHandle, ExecutionCoordinator, InlineCoordinator, OffloadingCoordinator};
use crate::permission::{self, PermissionGate};
use crate::tokenizer::{TokenQueue, tokenize, tokenize_partial};
use crate::tree::{CommandTree, ParsedCommand};

// ---------------------------------------------------------------------------
// Registration hook
// ---------------------------------------------------------------------------

/// Host hook told about every registration change, e.g. to mirror commands
/// into a platform's own command list.
pub trait RegistrationHandler<S>: Send + Sync {
    /// Called after a command enters the tree. An error rolls the
    /// registration back.
    fn on_register(&self, command: &Command<S>) -> std::result::Result<(), HandlerError>;

    fn on_unregister(&self, _command: &Command<S>) {}
}

/// Accepts every registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRegistrationHandler;

impl<S> RegistrationHandler<S> for NullRegistrationHandler {
    fn on_register(&self, _command: &Command<S>) -> std::result::Result<(), HandlerError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct CommandManager<S> {
    tree: CommandTree<S>,
    coordinator: Box<dyn ExecutionCoordinator<S>>,
    gate: Box<dyn PermissionGate<S>>,
    registration: Box<dyn RegistrationHandler<S>>,
    max_input_length: usize,
}

impl<S: Send + Sync + 'static> CommandManager<S> {
    pub fn new(
        coordinator: impl ExecutionCoordinator<S> + 'static,
        gate: impl PermissionGate<S> + 'static,
    ) -> Self {
        Self {
            tree: CommandTree::new(),
            coordinator: Box::new(coordinator),
            gate: Box::new(gate),
            registration: Box::new(NullRegistrationHandler),
            max_input_length: DispatchConfig::default().max_input_length,
        }
    }

    /// Build a manager with the coordinator and limits from `config`.
    pub fn from_config(
        config: &DispatchConfig,
        gate: impl PermissionGate<S> + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let mut manager = match config.coordinator {
            CoordinatorKind::Inline => Self::new(InlineCoordinator, gate),
            CoordinatorKind::Offloading => Self::new(
                OffloadingCoordinator::new(config.workers, config.queue_capacity)?,
                gate,
            ),
        };
        manager.max_input_length = config.max_input_length;
        log::debug!(
            "Command manager using {} coordinator",
            manager.coordinator.name()
        );
        Ok(manager)
    }
}

impl<S> CommandManager<S> {
    pub fn with_registration_handler(
        mut self,
        handler: impl RegistrationHandler<S> + 'static,
    ) -> Self {
        self.registration = Box::new(handler);
        self
    }

    pub fn with_max_input_length(mut self, max: usize) -> Self {
        self.max_input_length = max;
        self
    }

    // -- Registration --

    /// Register one command. The tree is only updated once the
    /// registration handler accepts it.
    pub fn register(&mut self, command: Command<S>) -> Result<Arc<Command<S>>> {
        let mut staged = self.tree.clone();
        let command = staged.insert(command)?;
        if let Err(e) = self.registration.on_register(&command) {
            return Err(rejected_by_host(&command, &e));
        }
        self.tree = staged;
        Ok(command)
    }

    /// Register a batch. Either every command is registered or none is.
    pub fn register_all(
        &mut self,
        commands: impl IntoIterator<Item = Command<S>>,
    ) -> Result<Vec<Arc<Command<S>>>> {
        let mut staged = self.tree.clone();
        let inserted = staged.insert_all(commands)?;
        for (i, command) in inserted.iter().enumerate() {
            if let Err(e) = self.registration.on_register(command) {
                for accepted in &inserted[..i] {
                    self.registration.on_unregister(accepted);
                }
                return Err(rejected_by_host(command, &e));
            }
        }
        self.tree = staged;
        Ok(inserted)
    }

    pub fn unregister(&mut self, command: &Command<S>) -> Result<Arc<Command<S>>> {
        let removed = self.tree.remove(command)?;
        self.registration.on_unregister(&removed);
        Ok(removed)
    }

    // -- Lookup --

    /// Resolve `input` to a command and a populated context without running
    /// anything. Defaults of omitted optional arguments are applied.
    pub fn parse(&self, sender: S, input: &str) -> Result<ParsedCommand<S>> {
        if input.len() > self.max_input_length {
            return Err(CommandError::InputTooLong {
                len: input.len(),
                max: self.max_input_length,
            });
        }
        let mut queue = TokenQueue::new(tokenize(input)?);
        let mut parsed = self.tree.parse(sender, &mut queue, self.gate.as_ref())?;
        parsed.command.apply_defaults(&mut parsed.context)?;
        Ok(parsed)
    }

    /// Parse `input` and hand the match to the coordinator. Parse failures
    /// resolve the returned handle immediately.
    pub fn parse_and_execute(&self, sender: S, input: &str) -> CommandHandle<S> {
        match self.parse(sender, input) {
            Ok(ParsedCommand { command, context }) => self.coordinator.schedule(command, context),
            Err(e) => {
                log::debug!("Parse failed for {input:?}: {e}");
                CommandHandle::ready(Err(e))
            },
        }
    }

    /// Completions for the last, possibly partial, token of `input`.
    pub fn suggest(&self, sender: S, input: &str) -> Vec<String> {
        if input.len() > self.max_input_length {
            return Vec::new();
        }
        let mut ctx = CommandContext::new(sender);
        let mut queue = TokenQueue::new(tokenize_partial(input));
        self.tree
            .suggestions(&mut ctx, &mut queue, self.gate.as_ref())
    }

    pub fn has_permission(&self, sender: &S, permission: &str) -> bool {
        permission::check(self.gate.as_ref(), sender, permission)
    }

    // -- Introspection --

    pub fn commands(&self) -> Vec<Arc<Command<S>>> {
        self.tree.commands()
    }

    pub fn tree(&self) -> &CommandTree<S> {
        &self.tree
    }

    pub fn coordinator_name(&self) -> &'static str {
        self.coordinator.name()
    }

    pub fn max_input_length(&self) -> usize {
        self.max_input_length
    }
}

impl<S> fmt::Debug for CommandManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandManager")
            .field("tree", &self.tree)
            .field("coordinator", &self.coordinator.name())
            .field("max_input_length", &self.max_input_length)
            .finish_non_exhaustive()
    }
}

fn rejected_by_host<S>(command: &Command<S>, cause: &HandlerError) -> CommandError {
    CommandError::InvalidCommand(format!(
        "registration of '{}' refused: {cause}",
        command.syntax()
    ))
}
