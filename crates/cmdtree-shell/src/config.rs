//! Shell configuration: engine settings plus the known senders.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use cmdtree_core::config::DispatchConfig;

/// A named identity and the permissions it holds. `*` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SenderEntry {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default = "default_sender")]
    pub default_sender: String,
    #[serde(default = "default_senders")]
    pub senders: Vec<SenderEntry>,
}

fn default_sender() -> String {
    "guest".to_string()
}

fn default_senders() -> Vec<SenderEntry> {
    vec![
        SenderEntry {
            name: "guest".to_string(),
            permissions: Vec::new(),
        },
        SenderEntry {
            name: "admin".to_string(),
            permissions: vec!["*".to_string()],
        },
    ]
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            default_sender: default_sender(),
            senders: default_senders(),
        }
    }
}

impl ShellConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ShellConfig = toml::from_str(source).context("invalid shell config")?;
        config.dispatch.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_toml_str(&source)?;
        log::info!(
            "Loaded shell config from {} ({} sender(s))",
            path.display(),
            config.senders.len()
        );
        Ok(config)
    }

    pub fn sender(&self, name: &str) -> Option<&SenderEntry> {
        self.senders.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use cmdtree_core::config::CoordinatorKind;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ShellConfig::from_toml_str("").unwrap();
        assert_eq!(config.default_sender, "guest");
        assert!(config.sender("admin").is_some());
        assert_eq!(config.dispatch.coordinator, CoordinatorKind::Inline);
    }

    #[test]
    fn parses_dispatch_and_senders() {
        let config = ShellConfig::from_toml_str(
            r#"
default_sender = "alice"

[dispatch]
coordinator = "offloading"
workers = 2

[[senders]]
name = "alice"
permissions = ["shell.give"]
"#,
        )
        .unwrap();
        assert_eq!(config.dispatch.coordinator, CoordinatorKind::Offloading);
        assert_eq!(config.dispatch.workers, 2);
        assert_eq!(
            config.sender("alice").unwrap().permissions,
            vec!["shell.give"]
        );
        assert!(config.sender("admin").is_none());
    }

    #[test]
    fn invalid_dispatch_rejected() {
        assert!(ShellConfig::from_toml_str("[dispatch]\nworkers = 0\n").is_err());
    }
}
