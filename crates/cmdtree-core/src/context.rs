//! Per-invocation state: sender, parsed argument values, parser scratch.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Type-erased parsed argument value.
pub type ArgumentValue = Box<dyn Any + Send + Sync>;

pub(crate) type Scratch = HashMap<String, ArgumentValue>;

/// Mutable bag created fresh for every parse and discarded after the
/// handler finishes.
///
/// Argument values are kept in parse order and keyed by argument name.
/// The sender is opaque to the engine; it is only handed to the permission
/// gate, to parsers and to the handler.
pub struct CommandContext<S> {
    sender: S,
    arguments: Vec<(String, ArgumentValue)>,
    scratch: Scratch,
}

impl<S> CommandContext<S> {
    pub fn new(sender: S) -> Self {
        Self {
            sender,
            arguments: Vec::new(),
            scratch: HashMap::new(),
        }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn into_sender(self) -> S {
        self.sender
    }

    /// Store a parsed value. Storing under an existing name replaces the
    /// value but keeps its original position.
    pub fn store<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.store_boxed(name, Box::new(value));
    }

    pub(crate) fn store_boxed(&mut self, name: &str, value: ArgumentValue) {
        match self.arguments.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.arguments.push((name.to_string(), value)),
        }
    }

    /// Typed access to a parsed value. `None` if absent or of another type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.arguments
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.downcast_ref::<T>())
    }

    /// Typed access with a fallback for absent optional arguments.
    pub fn get_or<'a, T: Any>(&'a self, name: &str, fallback: &'a T) -> &'a T {
        self.get(name).unwrap_or(fallback)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arguments.iter().any(|(n, _)| n == name)
    }

    /// Argument names in the order they were parsed.
    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Store parser-internal state that is not an argument value.
    pub fn put_scratch<T: Any + Send + Sync>(&mut self, key: &str, value: T) {
        self.scratch.insert(key.to_string(), Box::new(value));
    }

    pub fn scratch<T: Any>(&self, key: &str) -> Option<&T> {
        self.scratch.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Swap in an empty scratch area and return the current one.
    pub(crate) fn detach_scratch(&mut self) -> Scratch {
        std::mem::take(&mut self.scratch)
    }

    /// Restore a detached scratch area, dropping whatever was written since.
    pub(crate) fn reattach_scratch(&mut self, scratch: Scratch) {
        self.scratch = scratch;
    }

    pub fn take_scratch<T: Any>(&mut self, key: &str) -> Option<T> {
        let boxed = self.scratch.remove(key)?;
        match boxed.downcast::<T>() {
            Ok(v) => Some(*v),
            Err(original) => {
                self.scratch.insert(key.to_string(), original);
                None
            },
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for CommandContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("sender", &self.sender)
            .field("arguments", &self.argument_names().collect::<Vec<_>>())
            .field("scratch", &self.scratch.keys().collect::<Vec<_>>())
            .finish()
    }
}
