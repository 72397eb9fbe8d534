use std::path::PathBuf;

use xqs_lib::parse;

use crate::util::load_source;

pub struct TreeArgs {
    pub source_path: Option<PathBuf>,
    pub source_text: Option<String>,
    pub full: bool,
    pub color: bool,
}

pub fn run(args: TreeArgs) {
    let source = match load_source(args.source_path.as_deref(), args.source_text.as_deref()) {
        Ok(source) => source,
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    };

    let parse = match parse(&source) {
        Ok(parse) => parse,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let dump = if args.full {
        parse.tree.dump_full()
    } else {
        parse.tree.dump()
    };
    print!("{dump}");

    if !parse.diagnostics.is_empty() {
        eprint!("{}", parse.diagnostics.render_colored(&source, args.color));
    }
    if parse.diagnostics.has_errors() {
        std::process::exit(1);
    }
}
