//! Tests for CLI dispatch logic: params extraction and flag defaults.

use std::path::PathBuf;

use super::*;

fn matches_for(argv: &[&str]) -> clap::ArgMatches {
    build_cli()
        .try_get_matches_from(argv)
        .unwrap_or_else(|e| panic!("{argv:?} should parse: {e}"))
}

#[test]
fn tokens_takes_file_or_inline_text() {
    let m = matches_for(&["xqs", "tokens", "query.xq"]);
    let (_, m) = m.subcommand().unwrap();
    let params = TokensParams::from_matches(m);
    assert_eq!(params.source_path, Some(PathBuf::from("query.xq")));
    assert_eq!(params.source_text, None);

    let m = matches_for(&["xqs", "tokens", "-s", "1 + 2"]);
    let (_, m) = m.subcommand().unwrap();
    let params = TokensParams::from_matches(m);
    assert_eq!(params.source_path, None);
    assert_eq!(params.source_text, Some("1 + 2".to_string()));
}

#[test]
fn tree_full_flag_defaults_off() {
    let m = matches_for(&["xqs", "tree", "query.xq"]);
    let (_, m) = m.subcommand().unwrap();
    assert!(!TreeParams::from_matches(m).full);

    let m = matches_for(&["xqs", "tree", "query.xq", "--full"]);
    let (_, m) = m.subcommand().unwrap();
    assert!(TreeParams::from_matches(m).full);
}

#[test]
fn check_extracts_dialect_format_and_strict() {
    let m = matches_for(&[
        "xqs", "check", "query.xq", "-d", "saxon-pe/9.8", "--format", "json", "--strict",
    ]);
    let (name, m) = m.subcommand().unwrap();
    assert_eq!(name, "check");
    let params = CheckParams::from_matches(m);
    assert_eq!(params.dialect, Some("saxon-pe/9.8".to_string()));
    assert_eq!(params.format, "json");
    assert!(params.strict);
}

#[test]
fn check_format_defaults_to_text() {
    let m = matches_for(&["xqs", "check", "query.xq"]);
    let (_, m) = m.subcommand().unwrap();
    let params = CheckParams::from_matches(m);
    assert_eq!(params.format, "text");
    assert_eq!(params.dialect, None);
}

#[test]
fn rejects_unknown_format() {
    let result = build_cli().try_get_matches_from(["xqs", "check", "q.xq", "--format", "yaml"]);
    assert!(result.is_err());
}
