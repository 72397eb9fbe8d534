//! Parser state machine and low-level operations.
//!
//! The token stream is lazy: tokens are pulled from the mode lexer on
//! demand, and every token records the `(offset, LexerState)` checkpoint
//! taken just before it was lexed. That makes two things cheap:
//! speculative parsing (`checkpoint`/`rollback` truncates the token
//! vector and restores the lexer's mode stack), and parser-directed
//! re-lexing of `<` when the grammar position rules out an element
//! constructor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use text_size::{TextRange, TextSize};

use crate::Error;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::lexer::{Lexer, LexerState, Token, TokenKind, TokenSet, token_text};
use crate::tree::{Event, NodeKind, SyntaxTree};

/// How many bumps between cooperative cancellation checks.
const CANCEL_CHECK_INTERVAL: u32 = 32;

pub(crate) const DEFAULT_RECURSION_LIMIT: u32 = 128;

#[derive(Debug, Clone, Copy)]
pub(super) struct OpenDelimiter {
    pub span: TextRange,
}

/// Trivia tokens are buffered and flushed when a node starts or a
/// token is consumed, so trivia always attaches outside nodes.
pub(crate) struct Parser<'s> {
    pub(super) source: &'s str,
    lexer: Lexer<'s>,
    tokens: Vec<Token>,
    /// Lexer checkpoint taken immediately before `tokens[i]` was lexed.
    pre_states: Vec<(TextSize, LexerState)>,
    pos: usize,
    trivia_buffer: Vec<u32>,
    events: Vec<Event>,
    pub(super) diagnostics: Diagnostics,
    depth: u32,
    recursion_limit: u32,
    last_diagnostic_pos: Option<TextSize>,
    delimiter_stack: Vec<OpenDelimiter>,
    cancel: Option<Arc<AtomicBool>>,
    bumps_since_cancel_check: u32,
    fatal_error: Option<Error>,
}

pub(crate) struct Marker {
    event: usize,
    completed: bool,
}

#[derive(Clone, Copy)]
pub(crate) struct CompletedMarker {
    event: usize,
}

/// Full restore point: events, token stream, and lexer mode stack.
#[derive(Clone, Copy)]
pub(crate) struct Checkpoint {
    events: usize,
    tokens: usize,
    pos: usize,
    trivia: usize,
    lexer_offset: TextSize,
    lexer_state: LexerState,
    diagnostics: usize,
}

impl<'s> Parser<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            tokens: Vec::new(),
            pre_states: Vec::new(),
            pos: 0,
            trivia_buffer: Vec::with_capacity(4),
            events: Vec::new(),
            diagnostics: Diagnostics::new(),
            depth: 0,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            last_diagnostic_pos: None,
            delimiter_stack: Vec::with_capacity(8),
            cancel: None,
            bumps_since_cancel_check: 0,
            fatal_error: None,
        }
    }

    pub(crate) fn with_cancel_flag(mut self, cancel: Option<Arc<AtomicBool>>) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub(crate) fn finish(mut self) -> Result<(SyntaxTree, Diagnostics), Error> {
        self.eat_remaining_trivia();
        if let Some(err) = self.fatal_error {
            return Err(err);
        }
        self.lexical_diagnostics();
        let tree = SyntaxTree::build(self.source, self.tokens, self.events);
        Ok((tree, self.diagnostics))
    }

    // --- Token intake ---

    fn ensure_token(&mut self, index: usize) {
        while self.tokens.len() <= index {
            let checkpoint = (self.lexer.offset(), self.lexer.state());
            let Some(token) = self.lexer.next_token() else {
                break;
            };
            self.pre_states.push(checkpoint);
            self.tokens.push(token);
        }
    }

    fn skip_trivia_to_buffer(&mut self) {
        loop {
            self.ensure_token(self.pos);
            match self.tokens.get(self.pos) {
                Some(t) if t.kind.is_trivia() => {
                    self.trivia_buffer.push(self.pos as u32);
                    self.pos += 1;
                }
                _ => break,
            }
        }
    }

    fn drain_trivia(&mut self) {
        for index in self.trivia_buffer.drain(..) {
            self.events.push(Event::Token { index });
        }
    }

    /// Flush trailing trivia into the current node. The root must call
    /// this before closing, or end-of-input trivia would have no parent.
    pub(super) fn eat_remaining_trivia(&mut self) {
        self.skip_trivia_to_buffer();
        self.drain_trivia();
    }

    /// Current non-trivia token kind; `Eof` past the end.
    pub(super) fn current(&mut self) -> TokenKind {
        self.skip_trivia_to_buffer();
        self.tokens.get(self.pos).map_or(TokenKind::Eof, |t| t.kind)
    }

    /// LL(k) lookahead past trivia. Only `n <= 2` is used.
    pub(super) fn nth(&mut self, n: usize) -> TokenKind {
        self.skip_trivia_to_buffer();
        let mut seen = 0;
        let mut index = self.pos;
        loop {
            self.ensure_token(index);
            match self.tokens.get(index) {
                None => return TokenKind::Eof,
                Some(t) if t.kind.is_trivia() => {}
                Some(t) => {
                    if seen == n {
                        return t.kind;
                    }
                    seen += 1;
                }
            }
            index += 1;
        }
    }

    pub(super) fn at(&mut self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub(super) fn at_one_of(&mut self, set: TokenSet) -> bool {
        set.contains(self.current())
    }

    pub(super) fn at_eof(&mut self) -> bool {
        self.current() == TokenKind::Eof
    }

    pub(super) fn should_stop(&mut self) -> bool {
        self.at_eof() || self.fatal_error.is_some()
    }

    pub(super) fn current_span(&mut self) -> TextRange {
        self.skip_trivia_to_buffer();
        self.tokens
            .get(self.pos)
            .map_or_else(|| TextRange::empty(self.eof_offset()), |t| t.range)
    }

    pub(super) fn current_text(&mut self) -> &'s str {
        self.skip_trivia_to_buffer();
        match self.tokens.get(self.pos) {
            Some(t) => token_text(self.source, t),
            None => "",
        }
    }

    fn eof_offset(&self) -> TextSize {
        TextSize::new(self.source.len() as u32)
    }

    /// End of the last consumed non-trivia token.
    pub(super) fn last_token_end(&self) -> Option<TextSize> {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| !t.kind.is_trivia())
            .map(|t| t.range.end())
    }

    /// No trivia between the previous non-trivia token and the current
    /// one. Used for `a:b` QName assembly and `name#3` function refs.
    pub(super) fn adjacent(&mut self) -> bool {
        let start = self.current_span().start();
        self.last_token_end() == Some(start) && self.trivia_buffer.is_empty()
    }

    pub(super) fn bump(&mut self) {
        debug_assert!(!self.at_eof(), "bump called at EOF");
        self.check_cancelled();
        self.drain_trivia();
        self.events.push(Event::Token {
            index: self.pos as u32,
        });
        self.pos += 1;
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// On mismatch: emit a diagnostic and a missing-marker, but don't
    /// consume anything.
    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_msg(DiagnosticKind::UnexpectedToken, format!("expected {what}"));
        self.missing(format!("expected {what}"));
        false
    }

    /// The `<` at the current position is a comparison operator, not a
    /// tag open: discard the greedy tag reading and re-lex.
    pub(super) fn relex_less_than(&mut self) {
        self.skip_trivia_to_buffer();
        debug_assert_eq!(
            self.tokens.get(self.pos).map(|t| t.kind),
            Some(TokenKind::TagOpen)
        );
        let (offset, state) = self.pre_states[self.pos];
        self.tokens.truncate(self.pos);
        self.pre_states.truncate(self.pos);
        self.lexer.restore_to(offset, state);
        self.lexer.set_suppress_tag();
        self.ensure_token(self.pos);
        debug_assert_eq!(
            self.tokens.get(self.pos).map(|t| t.kind),
            Some(TokenKind::LessThan)
        );
    }

    // --- Markers and events ---

    pub(super) fn start(&mut self) -> Marker {
        self.drain_trivia();
        self.events.push(Event::Tombstone);
        Marker {
            event: self.events.len() - 1,
            completed: false,
        }
    }

    pub(super) fn done(&mut self, mut marker: Marker, kind: NodeKind) -> CompletedMarker {
        marker.completed = true;
        let event = marker.event;
        self.events[event] = Event::Start {
            kind,
            forward_parent: None,
        };
        self.events.push(Event::Finish);
        CompletedMarker { event }
    }

    /// Discard a started-but-unused marker.
    pub(super) fn abandon(&mut self, mut marker: Marker) {
        marker.completed = true;
        if marker.event == self.events.len() - 1 {
            self.events.pop();
        }
        // Otherwise the tombstone stays and the builder skips it.
    }

    /// Wrap a completed node in a new one: `1` becomes the left operand
    /// of `1 + 2` after the fact.
    pub(super) fn precede(&mut self, completed: CompletedMarker) -> Marker {
        let marker = self.start();
        let forward = (marker.event - completed.event) as u32;
        match &mut self.events[completed.event] {
            Event::Start { forward_parent, .. } => *forward_parent = Some(forward),
            _ => unreachable!("completed marker points at a Start event"),
        }
        marker
    }

    /// Zero-width pseudo-leaf for a construct the grammar required but
    /// the input omitted.
    pub(super) fn missing(&mut self, message: impl Into<String>) {
        let offset = self.last_token_end().unwrap_or_else(|| self.current_span().start());
        self.events.push(Event::Missing {
            message: message.into(),
            offset,
        });
    }

    pub(super) fn checkpoint(&mut self) -> Checkpoint {
        self.skip_trivia_to_buffer();
        Checkpoint {
            events: self.events.len(),
            tokens: self.tokens.len(),
            pos: self.pos,
            trivia: self.trivia_buffer.len(),
            lexer_offset: self.lexer.offset(),
            lexer_state: self.lexer.state(),
            diagnostics: self.diagnostics.len(),
        }
    }

    /// Un-consume everything since `checkpoint`, including the lexer's
    /// mode stack. Diagnostics reported since are kept only if the
    /// caller hasn't captured them; speculative paths capture before
    /// erroring, so truncation is safe here.
    pub(super) fn rollback(&mut self, checkpoint: Checkpoint) {
        debug_assert!(self.events.len() >= checkpoint.events);
        self.events.truncate(checkpoint.events);
        self.tokens.truncate(checkpoint.tokens);
        self.pre_states.truncate(checkpoint.tokens);
        self.pos = checkpoint.pos;
        self.trivia_buffer.truncate(checkpoint.trivia);
        self.diagnostics.truncate(checkpoint.diagnostics);
        self.lexer
            .restore_to(checkpoint.lexer_offset, checkpoint.lexer_state);
    }

    // --- Errors and recovery ---

    fn should_report(&mut self, pos: TextSize) -> bool {
        if self.last_diagnostic_pos == Some(pos) {
            return false;
        }
        self.last_diagnostic_pos = Some(pos);
        true
    }

    fn current_suppression_span(&mut self) -> TextRange {
        let eof = self.eof_offset();
        self.delimiter_stack
            .last()
            .map(|d| TextRange::new(d.span.start(), eof))
            .unwrap_or_else(|| self.current_span())
    }

    pub(super) fn error(&mut self, kind: DiagnosticKind) {
        let range = self.current_span();
        if !self.should_report(range.start()) {
            return;
        }
        let suppression = self.current_suppression_span();
        self.diagnostics
            .report(kind, range)
            .suppression_range(suppression)
            .emit();
    }

    pub(super) fn error_msg(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let range = self.current_span();
        if !self.should_report(range.start()) {
            return;
        }
        let suppression = self.current_suppression_span();
        self.diagnostics
            .report(kind, range)
            .message_raw(message)
            .suppression_range(suppression)
            .emit();
    }

    fn bump_as_error(&mut self) {
        if !self.at_eof() {
            let marker = self.start();
            self.bump();
            self.done(marker, NodeKind::Error);
        }
    }

    pub(super) fn error_and_bump(&mut self, kind: DiagnosticKind) {
        self.error(kind);
        self.bump_as_error();
    }

    /// Wrap unexpected tokens in an error node until a recovery point.
    /// Never discards characters: everything skipped lands inside the
    /// error node.
    pub(super) fn error_recover(&mut self, kind: DiagnosticKind, message: &str, recovery: TokenSet) {
        if self.at_one_of(recovery) || self.should_stop() {
            self.error_msg(kind, message);
            return;
        }

        self.error_msg(kind, message);
        let marker = self.start();
        while !self.at_one_of(recovery) && !self.should_stop() {
            self.bump();
        }
        self.done(marker, NodeKind::Error);
    }

    // --- Recursion and cancellation ---

    pub(super) fn enter_recursion(&mut self) -> bool {
        self.check_cancelled();
        if self.depth >= self.recursion_limit {
            if self.fatal_error.is_none() {
                self.fatal_error = Some(Error::RecursionLimitExceeded);
            }
            return false;
        }
        self.depth += 1;
        true
    }

    pub(super) fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn check_cancelled(&mut self) {
        self.bumps_since_cancel_check += 1;
        if self.bumps_since_cancel_check < CANCEL_CHECK_INTERVAL {
            return;
        }
        self.bumps_since_cancel_check = 0;
        if let Some(cancel) = &self.cancel
            && cancel.load(Ordering::Relaxed)
            && self.fatal_error.is_none()
        {
            self.fatal_error = Some(Error::Cancelled);
        }
    }

    // --- Delimiters (for cascading-error suppression spans) ---

    pub(super) fn push_delimiter(&mut self) {
        let span = self.current_span();
        self.delimiter_stack.push(OpenDelimiter { span });
    }

    pub(super) fn pop_delimiter(&mut self) -> Option<OpenDelimiter> {
        self.delimiter_stack.pop()
    }

    pub(super) fn error_unclosed_delimiter(
        &mut self,
        kind: DiagnosticKind,
        related_msg: impl Into<String>,
        open_range: TextRange,
    ) {
        let current = self.current_span();
        if !self.should_report(current.start()) {
            return;
        }
        let full_range = TextRange::new(open_range.start(), current.end());
        self.diagnostics
            .report(kind, open_range)
            .suppression_range(full_range)
            .related_to(related_msg, open_range)
            .emit();
    }

    // --- Post-parse lexical diagnostics ---

    /// Lexical problems are derived from the final token vector so
    /// speculative rollbacks never double-report them.
    fn lexical_diagnostics(&mut self) {
        let mut doc_comment_open: Option<TextRange> = None;
        for token in &self.tokens {
            let text = token_text(self.source, token);
            match token.kind {
                TokenKind::BadCharacter => {
                    self.diagnostics
                        .report(DiagnosticKind::BadCharacter, token.range)
                        .emit();
                }
                TokenKind::Comment if !comment_is_terminated(text) => {
                    self.diagnostics
                        .report(DiagnosticKind::UnclosedComment, token.range)
                        .emit();
                }
                TokenKind::StringLiteral if !string_is_terminated(text) => {
                    self.diagnostics
                        .report(DiagnosticKind::UnclosedString, token.range)
                        .emit();
                }
                TokenKind::CommentStart => doc_comment_open = Some(token.range),
                TokenKind::CommentEnd => doc_comment_open = None,
                _ => {}
            }
        }
        if let Some(range) = doc_comment_open {
            self.diagnostics
                .report(DiagnosticKind::UnclosedComment, range)
                .emit();
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        debug_assert!(self.completed, "marker dropped without done/abandon");
    }
}

fn comment_is_terminated(text: &str) -> bool {
    let mut depth = 0i32;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'(', b':') => {
                depth += 1;
                i += 2;
            }
            (b':', b')') => {
                depth -= 1;
                if depth == 0 {
                    return i + 2 == bytes.len();
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
    false
}

fn string_is_terminated(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(quote) = chars.next() else {
        return false;
    };
    while let Some(c) = chars.next() {
        if c == quote {
            match chars.clone().next() {
                // Doubled delimiter stays inside the literal.
                Some(n) if n == quote => {
                    chars.next();
                }
                Some(_) => return false, // lexer never produces this
                None => return true,
            }
        }
    }
    false
}
