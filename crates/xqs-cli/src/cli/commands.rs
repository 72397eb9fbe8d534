//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("xqs")
        .about("Error-tolerant XQuery/XPath parser")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(tokens_command())
        .subcommand(tree_command())
        .subcommand(check_command())
}

/// Show the token stream of a query.
fn tokens_command() -> Command {
    Command::new("tokens")
        .about("Show the token stream of a query")
        .override_usage(
            "\
  xqs tokens <FILE>
  xqs tokens -s <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  xqs tokens query.xq                # tokens of a file
  xqs tokens -s 'for $x in 1 to 3'   # tokens of inline text
  cat query.xq | xqs tokens -        # tokens from stdin"#,
        )
        .arg(source_path_arg())
        .arg(source_text_arg())
}

/// Show the syntax tree of a query.
fn tree_command() -> Command {
    Command::new("tree")
        .about("Show the syntax tree of a query")
        .override_usage(
            "\
  xqs tree <FILE>
  xqs tree -s <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  xqs tree query.xq                  # tree with trivia elided
  xqs tree query.xq --full           # lossless tree, trivia included
  xqs tree -s '1 + 2'                # inline query"#,
        )
        .arg(source_path_arg())
        .arg(source_text_arg())
        .arg(full_arg())
        .arg(color_arg())
}

/// Validate a query, optionally against a dialect target.
fn check_command() -> Command {
    Command::new("check")
        .about("Validate a query")
        .override_usage(
            "\
  xqs check <FILE>
  xqs check <FILE> -d <TARGET>
  xqs check -s <TEXT> [-d <TARGET>]",
        )
        .after_help(
            r#"EXAMPLES:
  xqs check query.xq                 # syntax only
  xqs check query.xq -d w3c/3.0      # also check dialect conformance
  xqs check query.xq -d saxon-pe     # latest known saxon-pe version
  xqs check query.xq --format json   # machine-readable diagnostics"#,
        )
        .arg(source_path_arg())
        .arg(source_text_arg())
        .arg(dialect_arg())
        .arg(format_arg())
        .arg(strict_arg())
        .arg(color_arg())
}
