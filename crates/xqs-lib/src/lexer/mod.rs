//! Error-tolerant, resumable tokenizer.
//!
//! Entry points: [`lex`] for whole-buffer tokenizing, [`lex_avt`] for
//! XSLT attribute value templates, and [`Lexer::resume`] for
//! incremental re-lexing from a captured `(offset, state)` checkpoint.
//! The token vector always covers the source exactly: token `n+1`
//! starts where token `n` ends, the first token starts at 0, and the
//! last ends at the buffer length.

mod core;
mod cursor;
mod state;
mod token;

pub use self::core::{Lexer, lex, lex_avt};
pub use state::{LexerState, MAX_MODE_DEPTH};
pub use token::{Token, TokenKind, TokenSet, keyword, token_text};

pub(crate) use self::core::{is_ncname_char, is_ncname_start, is_xml_whitespace};
pub(crate) use state::Mode;

#[cfg(test)]
mod tests;
