//! xqs: error-tolerant XQuery/XPath parsing with a lossless syntax tree.
//!
//! # Example
//!
//! ```
//! let parse = xqs_lib::parse("for $n in 1 to 3 return $n * $n").expect("not cancelled");
//! eprintln!("{}", parse.tree.dump());
//! eprintln!("{}", parse.diagnostics.render("for $n in 1 to 3 return $n * $n"));
//! ```
//!
//! Parsing never fails on malformed input: unexpected tokens land in
//! error nodes, omitted constructs become zero-width markers, and the
//! returned tree always covers the whole source. The only fatal errors
//! are cooperative cancellation and the recursion limit.

pub mod conformance;
pub mod diagnostics;
pub mod lexer;
pub mod parser;

mod dialect;
mod dump;
mod tree;

pub use conformance::{ConformanceRegistry, validate};
pub use dialect::{Dialect, DialectVersion, Version};
pub use diagnostics::{DiagnosticKind, DiagnosticRecord, Diagnostics, DiagnosticsPrinter, Severity};
pub use lexer::{Lexer, LexerState, Token, TokenKind, lex, lex_avt};
pub use parser::{Parse, ParseOptions, parse, parse_with};
pub use tree::{ElementId, NodeKind, SyntaxTree};

/// Fatal parse errors. Syntax problems are never fatal; they come back
/// as [`Diagnostics`] next to a complete tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The cancellation flag flipped mid-parse.
    #[error("parse cancelled")]
    Cancelled,

    /// Input nested deeper than the configured limit.
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,
}

pub type Result<T> = std::result::Result<T, Error>;
