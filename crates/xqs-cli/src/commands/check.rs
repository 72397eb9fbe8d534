use std::path::PathBuf;

use xqs_lib::{ConformanceRegistry, DialectVersion, parse, validate};

use crate::util::load_source;

#[derive(Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct CheckArgs {
    pub source_path: Option<PathBuf>,
    pub source_text: Option<String>,
    pub dialect: Option<String>,
    pub format: OutputFormat,
    pub strict: bool,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let source = match load_source(args.source_path.as_deref(), args.source_text.as_deref()) {
        Ok(source) => source,
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    };

    let mut parse = match parse(&source) {
        Ok(parse) => parse,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Some(target) = &args.dialect {
        let target: DialectVersion = match target.parse() {
            Ok(target) => target,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        };
        let findings = validate(&parse.tree, &ConformanceRegistry::default(), &target);
        parse.diagnostics.extend(findings);
    }

    let diagnostics = &parse.diagnostics;
    let failed = diagnostics.has_errors() || (args.strict && diagnostics.has_warnings());

    match args.format {
        OutputFormat::Json => {
            let records = diagnostics.to_records();
            match serde_json::to_string_pretty(&records) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
        }
        OutputFormat::Text => {
            // Silent on success, like `cargo check`.
            if !diagnostics.is_empty() {
                eprint!("{}", diagnostics.render_colored(&source, args.color));
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
