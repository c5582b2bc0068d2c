// tests/hook_parsing.rs

use std::path::PathBuf;

use proptest::prelude::*;

use devmirror::hooks::parse_hook;

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[test]
fn plain_command_has_no_watch_files() {
    let hook = parse_hook("command with spaces");
    assert_eq!(hook.command, "command with spaces");
    assert!(hook.watch_files.is_empty());
}

#[test]
fn single_watch_file() {
    let hook = parse_hook("command with spaces#watch:./src");
    assert_eq!(hook.command, "command with spaces");
    assert_eq!(hook.watch_files, paths(&["./src"]));
}

#[test]
fn multiple_watch_files() {
    let hook = parse_hook("command with spaces#watch:./file1.js,./file2.ts");
    assert_eq!(hook.command, "command with spaces");
    assert_eq!(hook.watch_files, paths(&["./file1.js", "./file2.ts"]));
}

#[test]
fn escaped_delimiter_is_literal() {
    let hook = parse_hook("command with spaces\\#watch:./src");
    assert_eq!(hook.command, "command with spaces\\#watch:./src");
    assert!(hook.watch_files.is_empty());
}

#[test]
fn last_unescaped_delimiter_wins() {
    let hook = parse_hook("command with spaces\\#watch:./src#watch:./file1.js,./file2.ts");
    assert_eq!(hook.command, "command with spaces\\#watch:./src");
    assert_eq!(hook.watch_files, paths(&["./file1.js", "./file2.ts"]));
}

#[test]
fn two_unescaped_delimiters_split_at_the_last() {
    // Everything before the last unescaped delimiter is the command,
    // including the earlier one.
    let hook = parse_hook("cmd#watch:a#watch:b");
    assert_eq!(hook.command, "cmd#watch:a");
    assert_eq!(hook.watch_files, paths(&["b"]));
}

#[test]
fn empty_entries_in_the_list_are_dropped() {
    let hook = parse_hook("cmd#watch:a,,b,");
    assert_eq!(hook.command, "cmd");
    assert_eq!(hook.watch_files, paths(&["a", "b"]));
}

proptest! {
    #[test]
    fn command_without_delimiter_parses_as_bare_command(
        cmd in "[a-zA-Z0-9 ./_-]{0,60}"
    ) {
        prop_assume!(!cmd.contains("#watch:"));
        let hook = parse_hook(&cmd);
        prop_assert_eq!(hook.command.as_str(), cmd.as_str());
        prop_assert!(hook.watch_files.is_empty());
    }

    #[test]
    fn appending_a_watch_suffix_always_binds_the_files(
        cmd in "[a-zA-Z0-9 ./_-]{1,40}",
        files in proptest::collection::vec("[a-zA-Z0-9./_-]{1,12}", 1..4)
    ) {
        prop_assume!(!cmd.contains("#watch:") && !cmd.ends_with('\\'));
        let raw = format!("{cmd}#watch:{}", files.join(","));
        let hook = parse_hook(&raw);
        prop_assert_eq!(hook.command.as_str(), cmd.as_str());
        let expected: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
        prop_assert_eq!(hook.watch_files, expected);
    }
}
