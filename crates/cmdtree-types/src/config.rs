//! Dispatch configuration.
//!
//! Loaded from TOML. Every field has a default so an empty document is a
//! valid configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{CommandError, Result};

/// Which execution strategy runs matched command handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatorKind {
    /// Run the handler on the calling thread before returning.
    #[default]
    Inline,
    /// Hand the handler to a worker pool and return immediately.
    Offloading,
}

/// Engine-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Execution strategy.
    #[serde(default)]
    pub coordinator: CoordinatorKind,
    /// Worker threads used by the offloading coordinator.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Pending jobs the offloading coordinator accepts before rejecting.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Longest raw input (in bytes) accepted for parsing.
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
}

fn default_workers() -> usize {
    4
}
fn default_queue_capacity() -> usize {
    64
}
fn default_max_input_length() -> usize {
    1024
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorKind::default(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_input_length: default_max_input_length(),
        }
    }
}

impl DispatchConfig {
    /// Parse and validate a configuration from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: DispatchConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        log::debug!("Loaded dispatch config from {}", path.display());
        Ok(config)
    }

    /// Reject values the coordinators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(CommandError::Config("workers must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(CommandError::Config(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if self.max_input_length == 0 {
            return Err(CommandError::Config(
                "max_input_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
