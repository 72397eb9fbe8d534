use std::path::PathBuf;

use xqs_lib::lex;
use xqs_lib::lexer::token_text;

use crate::util::load_source;

pub struct TokensArgs {
    pub source_path: Option<PathBuf>,
    pub source_text: Option<String>,
}

pub fn run(args: TokensArgs) {
    let source = match load_source(args.source_path.as_deref(), args.source_text.as_deref()) {
        Ok(source) => source,
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    };

    for token in lex(&source) {
        println!(
            "{}@{:?} {:?}",
            token.kind.name(),
            token.range,
            token_text(&source, &token)
        );
    }
}
