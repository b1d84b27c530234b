use std::sync::Arc;

use cmdtree_types::error::{ArgumentFailure, CommandError, HandlerError};

use super::*;
use crate::argument::{
    ArgumentParser, CommandArgument, IntegerParser, StringParser,
};
use crate::command::CommandBuilder;
use crate::parse_result::ParseResult;
use crate::permission::{AllowAll, PermissionGate};
use crate::tokenizer::{TokenQueue, tokenize, tokenize_partial};

#[derive(Debug, Clone, Default)]
struct Player {
    granted: Vec<&'static str>,
}

impl Player {
    fn with(granted: &[&'static str]) -> Self {
        Self {
            granted: granted.to_vec(),
        }
    }
}

struct Granted;

impl PermissionGate<Player> for Granted {
    fn has_permission(&self, sender: &Player, permission: &str) -> bool {
        sender.granted.contains(&permission)
    }
}

fn noop(_: &CommandContext<Player>) -> std::result::Result<(), HandlerError> {
    Ok(())
}

fn build(builder: CommandBuilder<Player>) -> Command<Player> {
    builder.handler(noop).build().unwrap()
}

fn literal_path(words: &[&str]) -> Command<Player> {
    let mut b = Command::builder(words[0]);
    for w in &words[1..] {
        b = b.literal(*w);
    }
    build(b)
}

fn give() -> Command<Player> {
    build(
        Command::builder("give")
            .argument(CommandArgument::new("player", StringParser::single()))
            .argument(CommandArgument::new("amount", IntegerParser::new()))
            .permission("cmd.give"),
    )
}

fn queue(line: &str) -> TokenQueue {
    TokenQueue::new(tokenize(line).unwrap())
}

fn parse(tree: &CommandTree<Player>, sender: Player, line: &str) -> Result<ParsedCommand<Player>> {
    tree.parse(sender, &mut queue(line), &Granted)
}

fn suggest(tree: &CommandTree<Player>, sender: Player, line: &str) -> Vec<String> {
    let mut ctx = CommandContext::new(sender);
    let mut q = TokenQueue::new(tokenize_partial(line));
    tree.suggestions(&mut ctx, &mut q, &Granted)
}

// -- Registration --

#[test]
fn shared_literal_prefix_is_one_node() {
    let mut tree = CommandTree::new();
    tree.insert(literal_path(&["foo", "bar"])).unwrap();
    tree.insert(literal_path(&["foo", "baz"])).unwrap();

    assert_eq!(tree.children(tree.root()).len(), 1);
    let foo = tree.find(&["foo"]).unwrap();
    let labels: Vec<String> = tree
        .children(foo)
        .iter()
        .map(|&c| tree.label(c).unwrap())
        .collect();
    assert_eq!(labels, vec!["bar", "baz"]);
    assert_eq!(tree.node_count(), 3);
}

#[test]
fn argument_nodes_with_same_name_and_type_are_shared() {
    let mut tree = CommandTree::new();
    let player = || CommandArgument::new("player", StringParser::single());
    tree.insert(build(Command::builder("give").argument(player()).literal("item")))
        .unwrap();
    tree.insert(build(Command::builder("give").argument(player()).literal("money")))
        .unwrap();
    let node = tree.find(&["give", "<player>"]).unwrap();
    assert_eq!(tree.children(node).len(), 2);
}

#[test]
fn greedy_sibling_is_ambiguous_and_tree_is_unchanged() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("say").argument(CommandArgument::new("text", StringParser::greedy())),
    ))
    .unwrap();
    let before = tree.node_count();

    let err = tree
        .insert(build(
            Command::builder("say").argument(CommandArgument::new("n", IntegerParser::new())),
        ))
        .unwrap_err();
    match err {
        CommandError::AmbiguousNode {
            parent,
            existing,
            conflicting,
        } => {
            assert_eq!(parent, "say");
            assert_eq!(existing, "<text>");
            assert_eq!(conflicting, "<n>");
        },
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert_eq!(tree.node_count(), before);
    assert_eq!(tree.commands().len(), 1);
}

#[test]
fn insert_all_is_atomic() {
    let mut tree = CommandTree::new();
    let batch = vec![
        literal_path(&["ping"]),
        build(Command::builder("say").argument(CommandArgument::new("text", StringParser::greedy()))),
        build(Command::builder("say").argument(CommandArgument::new("word", StringParser::single()))),
    ];
    assert!(matches!(
        tree.insert_all(batch),
        Err(CommandError::AmbiguousNode { .. })
    ));
    assert!(tree.is_empty());
    assert!(parse(&tree, Player::default(), "ping").is_err());

    let ok = tree
        .insert_all(vec![literal_path(&["ping"]), literal_path(&["pong"])])
        .unwrap();
    assert_eq!(ok.len(), 2);
    assert_eq!(tree.commands().len(), 2);
}

#[test]
fn duplicate_command_rejected() {
    let mut tree = CommandTree::new();
    tree.insert(literal_path(&["ping"])).unwrap();
    let err = tree.insert(literal_path(&["ping"])).unwrap_err();
    assert!(matches!(err, CommandError::DuplicateCommand { syntax } if syntax == "ping"));
}

#[test]
fn literal_alias_collision_is_ambiguous() {
    let mut tree = CommandTree::new();
    tree.insert(build(Command::builder_with_aliases("teleport", ["tp"])))
        .unwrap();
    let err = tree
        .insert(build(Command::builder_with_aliases("transport", ["tp"])))
        .unwrap_err();
    assert!(matches!(err, CommandError::AmbiguousNode { .. }));
}

#[test]
fn reused_literal_gains_new_aliases() {
    let mut tree = CommandTree::new();
    tree.insert(build(Command::builder("teleport").literal("here")))
        .unwrap();
    tree.insert(build(
        Command::builder_with_aliases("teleport", ["tp"]).literal("there"),
    ))
    .unwrap();
    assert!(parse(&tree, Player::default(), "tp here").is_ok());
    assert!(parse(&tree, Player::default(), "teleport there").is_ok());
}

#[test]
fn differently_configured_argument_is_not_shared() {
    let mut tree = CommandTree::new();
    let n = |max| CommandArgument::new("n", IntegerParser::new().range(0, max));
    tree.insert(build(Command::builder("set").argument(n(5)).literal("a")))
        .unwrap();

    match tree.insert(build(Command::builder("set").argument(n(100)).literal("b"))) {
        Err(CommandError::AmbiguousNode {
            parent,
            existing,
            conflicting,
        }) => {
            assert_eq!(parent, "set");
            assert_eq!(existing, "<n>");
            assert_eq!(conflicting, "<n>");
        },
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert!(tree.find(&["set", "<n>", "b"]).is_none());

    tree.insert(build(Command::builder("set").argument(n(5)).literal("c")))
        .unwrap();
    assert!(parse(&tree, Player::default(), "set 4 c").is_ok());
}

#[test]
fn argument_with_other_provider_is_not_shared() {
    let mut tree = CommandTree::new();
    let player = || {
        CommandArgument::new("player", StringParser::single())
            .with_suggestions(|_, _| vec!["Alice".to_string()])
    };
    tree.insert(build(Command::builder("kick").argument(player()).literal("now")))
        .unwrap();
    assert!(matches!(
        tree.insert(build(Command::builder("kick").argument(player()).literal("later"))),
        Err(CommandError::AmbiguousNode { .. })
    ));

    let shared = player();
    tree.insert(build(Command::builder("ban").argument(shared.clone()).literal("now")))
        .unwrap();
    tree.insert(build(Command::builder("ban").argument(shared).literal("later")))
        .unwrap();
    assert_eq!(tree.children(tree.find(&["ban", "<player>"]).unwrap()).len(), 2);
}

#[test]
fn distinct_constrained_siblings_coexist() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("set").argument(CommandArgument::new("n", IntegerParser::new())),
    ))
    .unwrap();
    tree.insert(build(
        Command::builder("set").argument(CommandArgument::new("on", Switch)),
    ))
    .unwrap();
    let parsed = parse(&tree, Player::default(), "set on").unwrap();
    assert_eq!(parsed.context.get::<bool>("on"), Some(&true));
    let parsed = parse(&tree, Player::default(), "set 3").unwrap();
    assert_eq!(parsed.context.get::<i64>("n"), Some(&3));
}

// -- Removal --

#[test]
fn removing_longer_command_keeps_prefix_command() {
    let mut tree = CommandTree::new();
    let foo = tree.insert(literal_path(&["foo"])).unwrap();
    tree.insert(literal_path(&["foo", "bar"])).unwrap();

    tree.remove(&literal_path(&["foo", "bar"])).unwrap();
    let parsed = parse(&tree, Player::default(), "foo").unwrap();
    assert!(Arc::ptr_eq(&parsed.command, &foo));
    assert_eq!(tree.node_count(), 1);
    assert!(tree.find(&["foo", "bar"]).is_none());

    tree.remove(&literal_path(&["foo"])).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.node_count(), 0);
}

#[test]
fn removing_prefix_command_keeps_longer_command() {
    let mut tree = CommandTree::new();
    tree.insert(literal_path(&["foo"])).unwrap();
    tree.insert(literal_path(&["foo", "bar"])).unwrap();
    tree.remove(&literal_path(&["foo"])).unwrap();

    assert!(matches!(
        parse(&tree, Player::default(), "foo"),
        Err(CommandError::NotEnoughArguments { .. })
    ));
    assert!(parse(&tree, Player::default(), "foo bar").is_ok());
}

#[test]
fn removing_unknown_command_fails() {
    let mut tree = CommandTree::new();
    tree.insert(literal_path(&["foo", "bar"])).unwrap();
    assert!(matches!(
        tree.remove(&literal_path(&["foo"])),
        Err(CommandError::UnknownCommand { .. })
    ));
    assert!(matches!(
        tree.remove(&literal_path(&["nope"])),
        Err(CommandError::UnknownCommand { .. })
    ));
}

#[test]
fn removing_aliased_command_restores_shared_literal() {
    let mut tree = CommandTree::new();
    tree.insert(build(Command::builder("teleport").literal("here")))
        .unwrap();
    let there = tree
        .insert(build(
            Command::builder_with_aliases("teleport", ["tp"]).literal("there"),
        ))
        .unwrap();
    assert!(parse(&tree, Player::default(), "tp here").is_ok());

    tree.remove(&there).unwrap();
    assert!(parse(&tree, Player::default(), "teleport here").is_ok());
    assert!(matches!(
        parse(&tree, Player::default(), "tp here"),
        Err(CommandError::NoSuchCommand { input }) if input == "tp"
    ));
    assert_eq!(suggest(&tree, Player::default(), "t"), vec!["teleport"]);
}

#[test]
fn removal_frees_slots_for_reuse() {
    let mut tree = CommandTree::new();
    tree.insert(literal_path(&["a", "b", "c"])).unwrap();
    tree.remove(&literal_path(&["a", "b", "c"])).unwrap();
    tree.insert(literal_path(&["x", "y", "z"])).unwrap();
    assert_eq!(tree.nodes.len(), 4);
    assert_eq!(tree.node_count(), 3);
}

// -- Parsing --

#[test]
fn parses_give_with_permission() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();

    let parsed = parse(&tree, Player::with(&["cmd.give"]), "give Alice 5").unwrap();
    assert_eq!(parsed.command.syntax(), "give <player> <amount>");
    assert_eq!(parsed.context.get::<String>("player").unwrap(), "Alice");
    assert_eq!(parsed.context.get::<i64>("amount"), Some(&5));
}

#[test]
fn missing_permission_reported() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();
    let err = parse(&tree, Player::default(), "give Alice 5").unwrap_err();
    assert!(matches!(err, CommandError::MissingPermission { permission } if permission == "cmd.give"));
}

#[test]
fn invalid_argument_leaves_queue_at_failing_token() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();
    let mut ctx = CommandContext::new(Player::with(&["cmd.give"]));
    let mut q = queue("give Alice ten");

    let err = tree.parse_into(&mut ctx, &mut q, &Granted).unwrap_err();
    match err {
        CommandError::InvalidSyntax {
            syntax,
            argument,
            failure,
        } => {
            assert_eq!(syntax, "give <player> <amount>");
            assert_eq!(argument, "amount");
            assert!(matches!(failure, ArgumentFailure::InvalidFormat { input, .. } if input == "ten"));
        },
        other => panic!("expected invalid syntax, got {other:?}"),
    }
    assert_eq!(q.position(), 2);
    assert_eq!(q.peek(), Some("ten"));
    assert!(!ctx.contains("amount"));
}

#[test]
fn unknown_root_is_no_such_command() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();
    assert!(matches!(
        parse(&tree, Player::default(), "fly"),
        Err(CommandError::NoSuchCommand { input }) if input == "fly"
    ));
    assert!(matches!(
        CommandTree::<Player>::new().parse(Player::default(), &mut queue("fly"), &Granted),
        Err(CommandError::NoSuchCommand { .. })
    ));
}

#[test]
fn missing_and_extra_arguments() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();
    tree.insert(literal_path(&["ping"])).unwrap();
    let admin = Player::with(&["cmd.give"]);

    assert!(matches!(
        parse(&tree, admin.clone(), "give Alice"),
        Err(CommandError::NotEnoughArguments { syntax }) if syntax == "give <player> <amount>"
    ));
    match parse(&tree, admin, "ping extra words") {
        Err(CommandError::TooManyArguments { syntax, remaining }) => {
            assert_eq!(syntax, "ping");
            assert_eq!(remaining, vec!["extra", "words"]);
        },
        other => panic!("expected too many arguments, got {other:?}"),
    }
}

#[test]
fn unknown_sub_literal_lists_expected() {
    let mut tree = CommandTree::new();
    tree.insert(literal_path(&["foo", "bar"])).unwrap();
    tree.insert(literal_path(&["foo", "baz"])).unwrap();
    match parse(&tree, Player::default(), "foo qux") {
        Err(CommandError::InvalidSyntax { failure, .. }) => assert_eq!(
            failure,
            ArgumentFailure::UnknownLiteral {
                input: "qux".into(),
                expected: vec!["bar".into(), "baz".into()],
            }
        ),
        other => panic!("expected invalid syntax, got {other:?}"),
    }
}

#[test]
fn literal_beats_argument() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("set").argument(CommandArgument::new("value", StringParser::single())),
    ))
    .unwrap();
    let reset = tree.insert(literal_path(&["set", "reset"])).unwrap();

    let parsed = parse(&tree, Player::default(), "set reset").unwrap();
    assert!(Arc::ptr_eq(&parsed.command, &reset));
    let parsed = parse(&tree, Player::default(), "set other").unwrap();
    assert_eq!(parsed.context.get::<String>("value").unwrap(), "other");
}

#[test]
fn forbidden_literal_falls_through_to_argument() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("set").argument(CommandArgument::new("value", StringParser::single())),
    ))
    .unwrap();
    tree.insert(build(
        Command::builder("set").literal("reset").permission("cmd.reset"),
    ))
    .unwrap();

    let parsed = parse(&tree, Player::default(), "set reset").unwrap();
    assert_eq!(parsed.context.get::<String>("value").unwrap(), "reset");
}

#[test]
fn last_declared_argument_failure_is_reported() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("set").argument(CommandArgument::new("n", IntegerParser::new())),
    ))
    .unwrap();
    tree.insert(build(
        Command::builder("set").argument(CommandArgument::new("on", Switch)),
    ))
    .unwrap();
    match parse(&tree, Player::default(), "set maybe") {
        Err(CommandError::InvalidSyntax { argument, .. }) => assert_eq!(argument, "on"),
        other => panic!("expected invalid syntax, got {other:?}"),
    }
}

#[test]
fn forbidden_argument_failure_is_not_reported() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("set").argument(CommandArgument::new("n", IntegerParser::new())),
    ))
    .unwrap();
    tree.insert(build(
        Command::builder("set")
            .argument(CommandArgument::new("on", Switch))
            .permission("cmd.switch"),
    ))
    .unwrap();
    match parse(&tree, Player::default(), "set maybe") {
        Err(CommandError::InvalidSyntax { argument, .. }) => assert_eq!(argument, "n"),
        other => panic!("expected invalid syntax, got {other:?}"),
    }
}

#[test]
fn denied_parser_leaves_no_scratch_behind() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("set")
            .argument(CommandArgument::new("mark", Marking))
            .permission("cmd.mark"),
    ))
    .unwrap();
    tree.insert(build(
        Command::builder("set").argument(CommandArgument::new("n", IntegerParser::new())),
    ))
    .unwrap();

    let mut ctx = CommandContext::new(Player::default());
    ctx.put_scratch("earlier", 1i64);
    let mut q = queue("set 7");
    tree.parse_into(&mut ctx, &mut q, &Granted).unwrap();
    assert_eq!(ctx.get::<i64>("n"), Some(&7));
    assert!(ctx.scratch::<bool>("marked").is_none());
    assert_eq!(ctx.scratch::<i64>("earlier"), Some(&1));

    let mut ctx = CommandContext::new(Player::with(&["cmd.mark"]));
    tree.parse_into(&mut ctx, &mut queue("set 7"), &Granted).unwrap();
    assert_eq!(ctx.scratch::<bool>("marked"), Some(&true));
}

#[test]
fn optional_argument_attaches_command_at_prefix() {
    let mut tree = CommandTree::new();
    let cmd = tree
        .insert(build(
            Command::builder("heal")
                .argument(CommandArgument::new("player", StringParser::single()))
                .argument(CommandArgument::new("amount", IntegerParser::new()).optional()),
        ))
        .unwrap();

    let short = parse(&tree, Player::default(), "heal Bob").unwrap();
    let long = parse(&tree, Player::default(), "heal Bob 4").unwrap();
    assert!(Arc::ptr_eq(&short.command, &cmd));
    assert!(Arc::ptr_eq(&long.command, &cmd));
    assert!(!short.context.contains("amount"));
    assert_eq!(long.context.get::<i64>("amount"), Some(&4));

    let err = tree
        .insert(build(
            Command::builder("heal").argument(CommandArgument::new("player", StringParser::single())),
        ))
        .unwrap_err();
    assert!(matches!(err, CommandError::DuplicateCommand { .. }));

    tree.remove(&cmd).unwrap();
    assert!(tree.is_empty());
}

#[test]
fn alias_parses_to_same_command() {
    let mut tree = CommandTree::new();
    let tp = tree
        .insert(build(
            Command::builder_with_aliases("teleport", ["tp"])
                .argument(CommandArgument::new("player", StringParser::single())),
        ))
        .unwrap();
    let parsed = parse(&tree, Player::default(), "tp Alice").unwrap();
    assert!(Arc::ptr_eq(&parsed.command, &tp));
}

#[test]
fn quoted_token_is_single_argument() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();
    let parsed = parse(&tree, Player::with(&["cmd.give"]), "give \"Mr Bob\" 2").unwrap();
    assert_eq!(parsed.context.get::<String>("player").unwrap(), "Mr Bob");
}

// -- Node metadata --

#[test]
fn node_permission_aggregates_subtree() {
    let mut tree = CommandTree::new();
    tree.insert(build(Command::builder("admin").literal("kick").permission("a.kick")))
        .unwrap();
    tree.insert(build(Command::builder("admin").literal("ban").permission("a.ban")))
        .unwrap();
    let admin = tree.find(&["admin"]).unwrap();
    assert_eq!(
        tree.permission_of(admin),
        Some(&NodePermission::AnyOf(vec!["a.kick".into(), "a.ban".into()]))
    );

    tree.insert(literal_path(&["admin", "help"])).unwrap();
    assert_eq!(tree.permission_of(admin), Some(&NodePermission::Unrestricted));

    tree.remove(&literal_path(&["admin", "help"])).unwrap();
    assert!(matches!(tree.permission_of(admin), Some(NodePermission::AnyOf(_))));
}

#[test]
fn forbidden_subtree_denies_entry() {
    let mut tree = CommandTree::new();
    tree.insert(build(Command::builder("admin").literal("kick").permission("a.kick")))
        .unwrap();
    assert!(matches!(
        parse(&tree, Player::default(), "admin kick"),
        Err(CommandError::MissingPermission { permission }) if permission == "a.kick"
    ));
    assert!(parse(&tree, Player::with(&["a.kick"]), "admin kick").is_ok());
}

// -- Suggestions --

#[test]
fn suggests_root_literals() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();
    tree.insert(literal_path(&["ping"])).unwrap();
    let admin = Player::with(&["cmd.give"]);

    assert_eq!(suggest(&tree, admin.clone(), "gi"), vec!["give"]);
    assert_eq!(suggest(&tree, admin.clone(), ""), vec!["give", "ping"]);
    assert!(suggest(&tree, admin, "give Alice ").is_empty());
}

#[test]
fn forbidden_branches_are_not_suggested() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();
    assert!(suggest(&tree, Player::default(), "g").is_empty());
    assert!(suggest(&tree, Player::default(), "give Alice ").is_empty());
}

#[test]
fn hidden_commands_are_not_suggested_but_parse() {
    let mut tree = CommandTree::new();
    tree.insert(build(Command::builder("debug").hidden())).unwrap();
    tree.insert(literal_path(&["deploy"])).unwrap();
    assert_eq!(suggest(&tree, Player::default(), "de"), vec!["deploy"]);
    assert!(parse(&tree, Player::default(), "debug").is_ok());
}

#[test]
fn suggestions_include_aliases_once() {
    let mut tree = CommandTree::new();
    tree.insert(build(Command::builder_with_aliases("teleport", ["tp", "tele"])))
        .unwrap();
    assert_eq!(
        suggest(&tree, Player::default(), "te"),
        vec!["teleport", "tele"]
    );
    assert_eq!(
        suggest(&tree, Player::default(), "t"),
        vec!["teleport", "tp", "tele"]
    );
}

#[test]
fn argument_suggestions_use_provider_and_parser() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("kick").argument(
            CommandArgument::new("player", StringParser::single()).with_suggestions(
                |_, partial| {
                    ["Alice", "Alex", "Bob"]
                        .iter()
                        .filter(|n| n.starts_with(partial))
                        .map(|n| n.to_string())
                        .collect()
                },
            ),
        ),
    ))
    .unwrap();
    tree.insert(build(
        Command::builder("level").argument(CommandArgument::new("n", IntegerParser::new().range(1, 3))),
    ))
    .unwrap();

    assert_eq!(suggest(&tree, Player::default(), "kick Al"), vec!["Alice", "Alex"]);
    assert_eq!(suggest(&tree, Player::default(), "level "), vec!["1", "2", "3"]);
}

#[test]
fn greedy_argument_owns_trailing_completion() {
    let mut tree = CommandTree::new();
    tree.insert(build(Command::builder("say").argument(
        CommandArgument::new("text", StringParser::greedy())
            .with_suggestions(|_, partial| vec![format!("{partial}!")]),
    )))
    .unwrap();
    assert_eq!(
        suggest(&tree, Player::default(), "say hello wor"),
        vec!["hello wor!"]
    );
}

#[test]
fn suggestion_walk_stops_on_mismatch() {
    let mut tree = CommandTree::new();
    tree.insert(give()).unwrap();
    assert!(suggest(&tree, Player::with(&["cmd.give"]), "take Alice ").is_empty());
}

// -- Introspection --

#[test]
fn commands_listed_once_in_declaration_order() {
    let mut tree = CommandTree::new();
    tree.insert(build(
        Command::builder("heal")
            .argument(CommandArgument::new("player", StringParser::single()))
            .argument(CommandArgument::new("amount", IntegerParser::new()).optional()),
    ))
    .unwrap();
    tree.insert(literal_path(&["ping"])).unwrap();
    let syntaxes: Vec<String> = tree.commands().iter().map(|c| c.syntax()).collect();
    assert_eq!(syntaxes, vec!["heal <player> [amount]", "ping"]);
    assert!(tree.command_at(tree.find(&["heal", "<player>"]).unwrap()).is_some());
}

#[test]
fn allow_all_gate_works_with_any_sender() {
    let mut tree = CommandTree::<()>::new();
    tree.insert(
        Command::builder("secret")
            .permission("x")
            .handler(|_| Ok(()))
            .build()
            .unwrap(),
    )
    .unwrap();
    assert!(tree.parse((), &mut queue("secret"), &AllowAll).is_ok());
}

/// Accepts only `on` and `off`.
struct Switch;

impl ArgumentParser<Player> for Switch {
    type Output = bool;

    fn parse(&self, _ctx: &mut CommandContext<Player>, input: &mut TokenQueue) -> ParseResult<bool> {
        match input.peek() {
            Some(t @ ("on" | "off")) => {
                let on = t == "on";
                input.pop();
                ParseResult::success(on)
            },
            Some(t) => ParseResult::failure(ArgumentFailure::InvalidFormat {
                input: t.to_string(),
                expected: "on|off",
            }),
            None => ParseResult::failure(ArgumentFailure::NoInput),
        }
    }

    fn type_name(&self) -> &'static str {
        "switch"
    }
}

/// Records in scratch that it ran, then accepts integers.
struct Marking;

impl ArgumentParser<Player> for Marking {
    type Output = i64;

    fn parse(&self, ctx: &mut CommandContext<Player>, input: &mut TokenQueue) -> ParseResult<i64> {
        ctx.put_scratch("marked", true);
        match input.peek().map(str::parse::<i64>) {
            Some(Ok(v)) => {
                input.pop();
                ParseResult::success(v)
            },
            _ => ParseResult::failure(ArgumentFailure::NoInput),
        }
    }

    fn type_name(&self) -> &'static str {
        "marking"
    }
}

mod props {
    use proptest::prelude::*;

    use super::*;

    fn word() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["a", "b", "c"])
    }

    proptest! {
        #[test]
        fn registered_paths_parse_and_removal_empties_tree(
            paths in prop::collection::vec(prop::collection::vec(word(), 1..4), 1..12)
        ) {
            let mut tree = CommandTree::new();
            let mut registered: Vec<(Vec<&str>, Arc<Command<Player>>)> = Vec::new();
            for path in &paths {
                match tree.insert(literal_path(path)) {
                    Ok(cmd) => registered.push((path.clone(), cmd)),
                    Err(CommandError::DuplicateCommand { .. }) => {},
                    Err(other) => prop_assert!(false, "unexpected error: {other}"),
                }
            }

            for (path, cmd) in &registered {
                let parsed = parse(&tree, Player::default(), &path.join(" ")).unwrap();
                prop_assert!(Arc::ptr_eq(&parsed.command, cmd));
            }

            for (path, _) in registered.iter().rev() {
                tree.remove(&literal_path(path)).unwrap();
            }
            prop_assert!(tree.is_empty());
            prop_assert_eq!(tree.node_count(), 0);
        }

        #[test]
        fn failed_parse_never_consumes_past_failure(amount in "[a-z]{1,6}") {
            let mut tree = CommandTree::new();
            tree.insert(give()).unwrap();
            let mut ctx = CommandContext::new(Player::with(&["cmd.give"]));
            let mut q = TokenQueue::from(&["give", "Alice", amount.as_str()][..]);
            prop_assert!(tree.parse_into(&mut ctx, &mut q, &Granted).is_err());
            prop_assert_eq!(q.position(), 2);
        }
    }
}
