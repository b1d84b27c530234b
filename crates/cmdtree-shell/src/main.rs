//! cmdtree demo shell.
//!
//! Reads command lines from stdin and runs them through a `CommandManager`.
//! A line starting with `?` prints completions for the rest of the line,
//! `:as <name>` switches the sender, `:quit` exits. Pass a TOML config path
//! (or set `CMDTREE_CONFIG`) to choose the coordinator and senders, and
//! `--json` for machine-readable results.

mod commands;
mod config;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use cmdtree_core::error::CommandError;
use cmdtree_core::{CommandContext, CommandManager, SenderMapping};

use commands::{ShellUser, register_demo_commands, user_gate};
use config::{SenderEntry, ShellConfig};

#[derive(Debug, Serialize)]
struct Outcome<'a> {
    input: &'a str,
    sender: String,
    ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn resolve(senders: &[SenderEntry], name: &str) -> ShellUser {
    let permissions = senders
        .iter()
        .find(|s| s.name == name)
        .map(|s| s.permissions.clone())
        .unwrap_or_default();
    ShellUser {
        name: name.to_string(),
        permissions,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut json = false;
    let mut config_path = std::env::var_os("CMDTREE_CONFIG").map(PathBuf::from);
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }
    let config = match &config_path {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };

    let senders = Arc::new(config.senders.clone());
    let mapping: SenderMapping<String, ShellUser> = SenderMapping::new(
        move |name: &String| resolve(&senders, name),
        |user: &ShellUser| user.name.clone(),
    );

    let mut manager = CommandManager::from_config(&config.dispatch, user_gate)?;
    register_demo_commands(&mut manager)?;
    log::info!(
        "Registered {} command(s), {} coordinator",
        manager.commands().len(),
        manager.coordinator_name()
    );

    let interactive = io::stdin().is_terminal();
    let mut current = config.default_sender.clone();
    let mut stdout = io::stdout();
    if interactive {
        print!("{current}> ");
        stdout.flush()?;
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim() == ":quit" {
            break;
        }
        if let Some(partial) = line.strip_prefix('?') {
            let suggestions = manager.suggest(mapping.to_sender(&current), partial);
            if json {
                println!("{}", serde_json::to_string(&suggestions)?);
            } else {
                println!("{}", suggestions.join("  "));
            }
        } else if let Some(name) = line.strip_prefix(":as ") {
            current = name.trim().to_string();
            if config.sender(&current).is_none() {
                log::warn!("Unknown sender '{current}', no permissions granted");
            }
        } else if !line.trim().is_empty() {
            let result = manager
                .parse_and_execute(mapping.to_sender(&current), &line)
                .wait();
            report(&line, &current, result, json, &mapping)?;
        }
        if interactive {
            print!("{current}> ");
            stdout.flush()?;
        }
    }
    Ok(())
}

fn report(
    input: &str,
    sender: &str,
    result: std::result::Result<CommandContext<ShellUser>, CommandError>,
    json: bool,
    mapping: &SenderMapping<String, ShellUser>,
) -> Result<()> {
    let outcome = match &result {
        Ok(ctx) => Outcome {
            input,
            sender: mapping.to_native(ctx.sender()),
            ok: true,
            arguments: ctx.argument_names().map(str::to_string).collect(),
            error: None,
        },
        Err(e) => Outcome {
            input,
            sender: sender.to_string(),
            ok: false,
            arguments: Vec::new(),
            error: Some(e.to_string()),
        },
    };
    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else if let Some(error) = &outcome.error {
        eprintln!("error: {error}");
    }
    Ok(())
}
