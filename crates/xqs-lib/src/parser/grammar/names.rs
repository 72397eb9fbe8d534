//! QName assembly and its whitespace rules.
//!
//! Keywords are not reserved, so any keyword token can serve as a name
//! part. A `:` joins two name parts into a prefixed QName only when it
//! touches both of them; a colon with whitespace on both sides is left
//! for the caller (map constructors use it as the entry separator), and
//! a colon that touches only one side is a hard error.

use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::core::{CompletedMarker, Parser};
use crate::tree::NodeKind;

use super::NAME_FIRST;

impl Parser<'_> {
    /// Consume the current token if it can serve as a name part.
    pub(super) fn eat_name_token(&mut self) -> bool {
        if self.at_one_of(NAME_FIRST) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// `local` or `prefix:local`, wrapped in a `QName` node. Returns
    /// `None` without consuming anything when no name starts here.
    pub(super) fn parse_eqname(&mut self) -> Option<CompletedMarker> {
        if !self.at_one_of(NAME_FIRST) {
            return None;
        }
        let m = self.start();
        self.bump();
        if self.at(TokenKind::Colon) {
            if self.adjacent() {
                self.bump(); // :
                if self.at_one_of(NAME_FIRST) {
                    if !self.adjacent() {
                        self.error(DiagnosticKind::QNameSeparatorWhitespace);
                    }
                    self.bump();
                } else {
                    self.error(DiagnosticKind::ExpectedName);
                    self.missing("expected a local name after `:`");
                }
            } else if self.colon_begins_qname_tail() {
                // `prefix :local` with the separator split off the prefix.
                self.error(DiagnosticKind::QNameSeparatorWhitespace);
                self.bump(); // :
                self.bump(); // local
            }
            // A colon detached on both sides is not ours to consume.
        }
        Some(self.done(m, NodeKind::QName))
    }

    pub(super) fn parse_eqname_or_error(&mut self) {
        if self.parse_eqname().is_none() {
            self.error(DiagnosticKind::ExpectedName);
            self.missing("expected a name");
        }
    }

    /// Whether the current `:` is glued to a following name part.
    /// Speculative: peeks past the colon and rolls back.
    pub(super) fn colon_begins_qname_tail(&mut self) -> bool {
        debug_assert!(self.at(TokenKind::Colon));
        let checkpoint = self.checkpoint();
        self.bump();
        let tail = self.at_one_of(NAME_FIRST) && self.adjacent();
        self.rollback(checkpoint);
        tail
    }

    /// `*`, `prefix:*`, or `*:local`, as a `Wildcard` node. The prefix
    /// and the star must touch the colon on both sides.
    pub(super) fn parse_wildcard(&mut self) -> CompletedMarker {
        debug_assert!(self.at(TokenKind::Star));
        let m = self.start();
        self.bump(); // *
        if self.at(TokenKind::Colon) && self.adjacent() && self.colon_begins_qname_tail() {
            self.bump(); // :
            self.bump(); // local
        }
        self.done(m, NodeKind::Wildcard)
    }
}
