//! Deterministic textual dump of the syntax tree.
//!
//! This format is the golden-file contract for the test suite: two
//! spaces of indentation per depth, `Kind@start..end` for nodes,
//! `Kind@start..end "text"` for token leaves, and
//! `Missing@off..off (message)` for missing-construct markers. It is
//! stable for tests, not a user-facing surface.

use std::fmt::Write;

use crate::tree::{ElementId, SyntaxTree};

impl SyntaxTree {
    /// Full dump including whitespace and comment trivia. Concatenating
    /// the quoted leaf texts reproduces the source exactly.
    pub fn dump_full(&self) -> String {
        let mut out = String::new();
        self.dump_element(&mut out, self.root(), 0, true);
        out
    }

    /// Dump with trivia leaves elided; the usual golden format for
    /// grammar tests.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_element(&mut out, self.root(), 0, false);
        out
    }

    fn dump_element(&self, out: &mut String, id: ElementId, depth: usize, trivia: bool) {
        if !trivia && self.token_kind(id).is_some_and(|k| k.is_trivia()) {
            return;
        }

        for _ in 0..depth {
            out.push_str("  ");
        }

        let range = self.range(id);
        if let Some(kind) = self.node_kind(id) {
            let _ = writeln!(out, "{kind:?}@{range:?}");
            for child in self.children(id) {
                self.dump_element(out, child, depth + 1, trivia);
            }
        } else if let Some(kind) = self.token_kind(id) {
            let _ = writeln!(out, "{}@{range:?} {:?}", kind.name(), self.element_text(id));
        } else if let Some(message) = self.missing_message(id) {
            let _ = writeln!(out, "Missing@{range:?} ({message})");
        }
    }
}
