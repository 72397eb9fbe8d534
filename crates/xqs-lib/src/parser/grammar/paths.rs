//! Path expressions, axis steps, node tests, and the postfix chain
//! (predicates, dynamic calls, lookups).
//!
//! Most of the decisions here are about what a leading name means: an
//! axis (`child::`), a kind test (`text()`), a computed constructor
//! (`element foo {..}`), a function call (`fn:exists(..)`), a function
//! reference (`exists#1`), or a plain name test. All of it resolves
//! with two tokens of lookahead.

use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::core::{CompletedMarker, Marker, Parser};
use crate::tree::NodeKind;

use super::{EXPR_RECOVERY, FORWARD_AXES, KIND_TEST_KEYWORDS, NAME_FIRST, REVERSE_AXES};

impl Parser<'_> {
    pub(super) fn parse_path_expr(&mut self) -> Option<CompletedMarker> {
        match self.current() {
            TokenKind::Slash => {
                let m = self.start();
                self.bump();
                // `/` alone selects the root; a following step is
                // optional.
                if self.at_step_start() {
                    if self.parse_step_expr().is_none() {
                        self.missing("expected a path step");
                    }
                    self.parse_path_tail();
                }
                Some(self.done(m, NodeKind::PathExpr))
            }
            TokenKind::SlashSlash => {
                let m = self.start();
                self.bump();
                if self.parse_step_expr().is_none() {
                    self.missing("expected a path step");
                    self.error(DiagnosticKind::ExpectedExpression);
                }
                self.parse_path_tail();
                Some(self.done(m, NodeKind::PathExpr))
            }
            _ => {
                let first = self.parse_step_expr()?;
                if !self.at(TokenKind::Slash) && !self.at(TokenKind::SlashSlash) {
                    return Some(first);
                }
                let m = self.precede(first);
                self.parse_path_tail();
                Some(self.done(m, NodeKind::PathExpr))
            }
        }
    }

    fn parse_path_tail(&mut self) {
        while self.at(TokenKind::Slash) || self.at(TokenKind::SlashSlash) {
            self.bump();
            if self.parse_step_expr().is_none() {
                self.missing("expected a path step");
                self.error(DiagnosticKind::ExpectedExpression);
            }
        }
    }

    fn at_step_start(&mut self) -> bool {
        matches!(
            self.current(),
            TokenKind::Star
                | TokenKind::At
                | TokenKind::Dot
                | TokenKind::DotDot
                | TokenKind::Dollar
                | TokenKind::ParenOpen
        ) || self.at_one_of(NAME_FIRST)
    }

    fn parse_step_expr(&mut self) -> Option<CompletedMarker> {
        match self.current() {
            TokenKind::At | TokenKind::DotDot | TokenKind::Star => Some(self.parse_axis_step()),
            k if k.is_ncname() => {
                if self.nth(1) == TokenKind::ColonColon
                    && (FORWARD_AXES.contains(k) || REVERSE_AXES.contains(k))
                {
                    return Some(self.parse_axis_step());
                }
                if KIND_TEST_KEYWORDS.contains(k) && self.nth(1) == TokenKind::ParenOpen {
                    return Some(self.parse_axis_step());
                }
                if self.at_constructor_primary() {
                    let primary = self.parse_primary_expr()?;
                    return Some(self.parse_postfix(primary));
                }
                Some(self.parse_name_step())
            }
            _ => {
                let primary = self.parse_primary_expr()?;
                Some(self.parse_postfix(primary))
            }
        }
    }

    /// A keyword that heads a non-path primary: a map or array
    /// constructor, a computed node constructor, or an inline function.
    fn at_constructor_primary(&mut self) -> bool {
        match self.current() {
            TokenKind::KwMap
            | TokenKind::KwArray
            | TokenKind::KwDocument
            | TokenKind::KwText
            | TokenKind::KwComment => self.nth(1) == TokenKind::BraceOpen,
            TokenKind::KwElement
            | TokenKind::KwAttribute
            | TokenKind::KwNamespace
            | TokenKind::KwProcessingInstruction => {
                self.nth(1) == TokenKind::BraceOpen
                    || (self.nth(1).is_ncname() && self.nth(2) == TokenKind::BraceOpen)
            }
            TokenKind::KwFunction => self.nth(1) == TokenKind::ParenOpen,
            _ => false,
        }
    }

    /// A step headed by a plain name: a function call, a function
    /// reference, or a name-test axis step.
    fn parse_name_step(&mut self) -> CompletedMarker {
        // prefix:* wildcard
        if self.nth(1) == TokenKind::Colon && self.nth(2) == TokenKind::Star {
            let m = self.start();
            let wildcard = self.start();
            self.bump(); // prefix
            if !self.adjacent() {
                self.error(DiagnosticKind::QNameSeparatorWhitespace);
            }
            self.bump(); // :
            if !self.adjacent() {
                self.error(DiagnosticKind::QNameSeparatorWhitespace);
            }
            self.bump(); // *
            self.done(wildcard, NodeKind::Wildcard);
            return self.finish_axis_step(m);
        }

        let m = self.start();
        let Some(qname) = self.parse_eqname() else {
            // Unreachable in practice: callers check NAME_FIRST.
            self.missing("expected a name");
            return self.done(m, NodeKind::Error);
        };
        if self.at(TokenKind::ParenOpen) {
            let call = self.precede(qname);
            self.parse_argument_list();
            let call = self.done(call, NodeKind::FunctionCall);
            self.abandon(m);
            return self.parse_postfix(call);
        }
        if self.at(TokenKind::Hash) && self.adjacent() {
            let named_ref = self.precede(qname);
            self.bump(); // #
            self.expect(TokenKind::IntegerLiteral, "an arity");
            let named_ref = self.done(named_ref, NodeKind::NamedFunctionRef);
            self.abandon(m);
            return self.parse_postfix(named_ref);
        }
        let test = self.precede(qname);
        self.done(test, NodeKind::NameTest);
        self.finish_axis_step(m)
    }

    fn parse_axis_step(&mut self) -> CompletedMarker {
        let m = self.start();
        match self.current() {
            TokenKind::DotDot => {
                self.bump();
            }
            TokenKind::At => {
                self.bump();
                self.parse_node_test();
            }
            k if self.nth(1) == TokenKind::ColonColon
                && (FORWARD_AXES.contains(k) || REVERSE_AXES.contains(k)) =>
            {
                self.bump(); // axis
                self.bump(); // ::
                self.parse_node_test();
            }
            _ => self.parse_node_test(),
        }
        self.finish_axis_step(m)
    }

    fn finish_axis_step(&mut self, m: Marker) -> CompletedMarker {
        while self.at(TokenKind::BracketOpen) {
            self.parse_predicate();
        }
        self.done(m, NodeKind::AxisStep)
    }

    fn parse_node_test(&mut self) {
        match self.current() {
            TokenKind::Star => {
                self.parse_wildcard();
            }
            k if KIND_TEST_KEYWORDS.contains(k) && self.nth(1) == TokenKind::ParenOpen => {
                self.parse_kind_test();
            }
            k if k.is_ncname() => {
                if self.nth(1) == TokenKind::Colon && self.nth(2) == TokenKind::Star {
                    let wildcard = self.start();
                    self.bump(); // prefix
                    if !self.adjacent() {
                        self.error(DiagnosticKind::QNameSeparatorWhitespace);
                    }
                    self.bump(); // :
                    if !self.adjacent() {
                        self.error(DiagnosticKind::QNameSeparatorWhitespace);
                    }
                    self.bump(); // *
                    self.done(wildcard, NodeKind::Wildcard);
                    return;
                }
                if let Some(qname) = self.parse_eqname() {
                    let test = self.precede(qname);
                    self.done(test, NodeKind::NameTest);
                }
            }
            _ => {
                self.error(DiagnosticKind::ExpectedName);
                self.missing("expected a node test");
            }
        }
    }

    pub(super) fn parse_predicate(&mut self) {
        let m = self.start();
        self.push_delimiter();
        let open_range = self.current_span();
        self.bump(); // [
        if !self.at(TokenKind::BracketClose) && self.parse_expr().is_none() {
            self.missing("expected an expression");
            self.error_recover(
                DiagnosticKind::ExpectedExpression,
                "expected an expression",
                EXPR_RECOVERY,
            );
        }
        if !self.eat(TokenKind::BracketClose) {
            self.error_unclosed_delimiter(
                DiagnosticKind::UnclosedBracket,
                "opened here",
                open_range,
            );
            self.missing("expected `]`");
        }
        self.pop_delimiter();
        self.done(m, NodeKind::Predicate);
    }

    /// Predicates, dynamic function calls, and lookups after a primary.
    pub(super) fn parse_postfix(&mut self, mut lhs: CompletedMarker) -> CompletedMarker {
        loop {
            match self.current() {
                TokenKind::BracketOpen => {
                    let m = self.precede(lhs);
                    self.parse_predicate();
                    lhs = self.done(m, NodeKind::PostfixExpr);
                }
                TokenKind::ParenOpen => {
                    let m = self.precede(lhs);
                    self.parse_argument_list();
                    lhs = self.done(m, NodeKind::PostfixExpr);
                }
                TokenKind::QuestionMark if self.at_key_specifier(1) => {
                    let m = self.precede(lhs);
                    self.parse_lookup();
                    lhs = self.done(m, NodeKind::PostfixExpr);
                }
                _ => break,
            }
        }
        lhs
    }

    fn at_key_specifier(&mut self, n: usize) -> bool {
        let kind = self.nth(n);
        kind.is_ncname()
            || matches!(
                kind,
                TokenKind::IntegerLiteral | TokenKind::Star | TokenKind::ParenOpen
            )
    }

    pub(super) fn parse_lookup(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump(); // ?
        match self.current() {
            TokenKind::IntegerLiteral | TokenKind::Star => self.bump(),
            TokenKind::ParenOpen => {
                self.parse_parenthesized_expr();
            }
            k if k.is_ncname() => self.bump(),
            _ => {
                self.error_msg(DiagnosticKind::UnexpectedToken, "expected a key specifier");
                self.missing("expected a key specifier");
            }
        }
        self.done(m, NodeKind::Lookup)
    }
}
