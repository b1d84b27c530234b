//! Demo commands registered by the shell.

use cmdtree_core::argument::{CommandArgument, IntegerParser, StringParser};
use cmdtree_core::error::Result;
use cmdtree_core::{Command, CommandContext, CommandManager};

/// The engine-side sender: a resolved identity with its permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellUser {
    pub name: String,
    pub permissions: Vec<String>,
}

/// Permission gate backing the shell's manager.
pub fn user_gate(user: &ShellUser, permission: &str) -> bool {
    user.permissions
        .iter()
        .any(|p| p == "*" || p == permission)
}

const KNOWN_PLAYERS: &[&str] = &["Alice", "Bob", "Carol", "Dave"];

fn player_suggestions(_ctx: &CommandContext<ShellUser>, partial: &str) -> Vec<String> {
    KNOWN_PLAYERS
        .iter()
        .filter(|p| p.starts_with(partial))
        .map(|p| p.to_string())
        .collect()
}

fn player() -> CommandArgument<ShellUser> {
    CommandArgument::new("player", StringParser::single()).with_suggestions(player_suggestions)
}

fn text<'a>(ctx: &'a CommandContext<ShellUser>, name: &str) -> &'a str {
    ctx.get::<String>(name).map(String::as_str).unwrap_or_default()
}

/// Register every demo command, then `help` listing them.
pub fn register_demo_commands(manager: &mut CommandManager<ShellUser>) -> Result<()> {
    let teleport = Command::builder_with_aliases("teleport", ["tp"])
        .argument(player())
        .permission("shell.teleport")
        .description("Teleport to a player")
        .handler(|ctx| {
            println!("{} teleported to {}", ctx.sender().name, text(ctx, "player"));
            Ok(())
        })
        .build()?;
    let tpto = Command::builder("tpto")
        .proxies(&teleport)
        .build()?;

    let commands = vec![
        Command::builder("echo")
            .argument(CommandArgument::new("text", StringParser::greedy()))
            .description("Print the rest of the line")
            .handler(|ctx| {
                println!("{}", text(ctx, "text"));
                Ok(())
            })
            .build()?,
        Command::builder("whoami")
            .description("Show the current sender")
            .handler(|ctx| {
                let user: &ShellUser = ctx.sender();
                println!("{} [{}]", user.name, user.permissions.join(", "));
                Ok(())
            })
            .build()?,
        Command::builder("give")
            .argument(player())
            .argument(
                CommandArgument::new("amount", IntegerParser::new().range(1, 64))
                    .optional_with_default("1"),
            )
            .permission("shell.give")
            .description("Give items to a player")
            .handler(|ctx| {
                let amount = ctx.get::<i64>("amount").copied().unwrap_or(1);
                println!("Gave {amount} item(s) to {}", text(ctx, "player"));
                Ok(())
            })
            .build()?,
        Command::builder("sum")
            .argument(CommandArgument::new("a", IntegerParser::new()))
            .argument(CommandArgument::new("b", IntegerParser::new()))
            .description("Add two integers")
            .handler(|ctx| {
                let a = *ctx.get_or("a", &0i64);
                let b = *ctx.get_or("b", &0i64);
                let total = a.checked_add(b).ok_or("integer overflow")?;
                println!("{total}");
                Ok(())
            })
            .build()?,
        Command::builder("debug")
            .literal("panic")
            .hidden()
            .description("Panic inside a handler")
            .handler(|_| panic!("requested by debug panic"))
            .build()?,
        teleport,
        tpto,
    ];
    manager.register_all(commands)?;

    let listing: Vec<(String, String)> = manager
        .commands()
        .iter()
        .filter(|c| !c.is_hidden())
        .map(|c| (c.syntax(), c.description().to_string()))
        .collect();
    manager.register(
        Command::builder("help")
            .description("List commands")
            .handler(move |_| {
                for (syntax, description) in &listing {
                    println!("  {syntax:<28} {description}");
                }
                Ok(())
            })
            .build()?,
    )?;
    Ok(())
}
