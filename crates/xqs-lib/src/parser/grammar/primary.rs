//! Primary expressions: literals, variable references, parenthesized
//! and enclosed expressions, function items, and the map, array, and
//! computed node constructors.

use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::core::{CompletedMarker, Parser};
use crate::tree::NodeKind;

use super::{EXPR_RECOVERY, NAME_FIRST};

impl Parser<'_> {
    pub(super) fn parse_primary_expr(&mut self) -> Option<CompletedMarker> {
        match self.current() {
            TokenKind::IntegerLiteral
            | TokenKind::DecimalLiteral
            | TokenKind::DoubleLiteral
            | TokenKind::StringLiteral => {
                let m = self.start();
                self.bump();
                Some(self.done(m, NodeKind::Literal))
            }
            TokenKind::Dollar => Some(self.parse_var_ref()),
            TokenKind::ParenOpen => Some(self.parse_parenthesized_expr()),
            TokenKind::Dot => {
                let m = self.start();
                self.bump();
                Some(self.done(m, NodeKind::ContextItemExpr))
            }
            TokenKind::BracketOpen => Some(self.parse_square_array_constructor()),
            TokenKind::QuestionMark => Some(self.parse_lookup()),
            TokenKind::TagOpen => Some(self.parse_direct_constructor()),
            TokenKind::XmlComment => {
                let m = self.start();
                self.bump();
                Some(self.done(m, NodeKind::DirCommentConstructor))
            }
            TokenKind::XmlPi => {
                let m = self.start();
                self.bump();
                Some(self.done(m, NodeKind::DirPIConstructor))
            }
            TokenKind::Percent => Some(self.parse_inline_function_expr()),
            TokenKind::KwFunction if self.nth(1) == TokenKind::ParenOpen => {
                Some(self.parse_inline_function_expr())
            }
            TokenKind::KwMap if self.nth(1) == TokenKind::BraceOpen => {
                Some(self.parse_map_constructor())
            }
            TokenKind::KwArray if self.nth(1) == TokenKind::BraceOpen => {
                let m = self.start();
                self.bump(); // array
                self.parse_enclosed_expr();
                Some(self.done(m, NodeKind::CurlyArrayConstructor))
            }
            TokenKind::KwDocument
            | TokenKind::KwElement
            | TokenKind::KwAttribute
            | TokenKind::KwNamespace
            | TokenKind::KwText
            | TokenKind::KwComment
            | TokenKind::KwProcessingInstruction => Some(self.parse_computed_constructor()),
            _ => None,
        }
    }

    pub(super) fn parse_var_ref(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump(); // $
        self.parse_eqname_or_error();
        self.done(m, NodeKind::VarRef)
    }

    pub(super) fn parse_parenthesized_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        self.push_delimiter();
        let open_range = self.current_span();
        self.bump(); // (
        if !self.at(TokenKind::ParenClose) && self.parse_expr().is_none() {
            self.error_recover(
                DiagnosticKind::ExpectedExpression,
                "expected an expression",
                EXPR_RECOVERY,
            );
        }
        if !self.eat(TokenKind::ParenClose) {
            self.error_unclosed_delimiter(
                DiagnosticKind::UnclosedParen,
                "opened here",
                open_range,
            );
            self.missing("expected `)`");
        }
        self.pop_delimiter();
        self.done(m, NodeKind::ParenthesizedExpr)
    }

    /// `{ Expr? }`. Empty bodies are legal.
    pub(super) fn parse_enclosed_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        self.push_delimiter();
        let open_range = self.current_span();
        self.expect(TokenKind::BraceOpen, "`{`");
        if !self.at(TokenKind::BraceClose) && !self.should_stop() && self.parse_expr().is_none() {
            self.error_recover(
                DiagnosticKind::ExpectedExpression,
                "expected an expression",
                EXPR_RECOVERY,
            );
        }
        if !self.eat(TokenKind::BraceClose) {
            self.error_unclosed_delimiter(
                DiagnosticKind::UnclosedBrace,
                "opened here",
                open_range,
            );
            self.missing("expected `}`");
        }
        self.pop_delimiter();
        self.done(m, NodeKind::EnclosedExpr)
    }

    pub(super) fn parse_argument_list(&mut self) {
        let m = self.start();
        self.push_delimiter();
        let open_range = self.current_span();
        self.bump(); // (
        if !self.at(TokenKind::ParenClose) {
            self.parse_argument();
            while self.eat(TokenKind::Comma) {
                self.parse_argument();
            }
        }
        if !self.eat(TokenKind::ParenClose) {
            self.error_unclosed_delimiter(
                DiagnosticKind::UnclosedParen,
                "opened here",
                open_range,
            );
            self.missing("expected `)`");
        }
        self.pop_delimiter();
        self.done(m, NodeKind::ArgumentList);
    }

    /// An expression or a `?` placeholder (for partial application).
    fn parse_argument(&mut self) {
        let m = self.start();
        if self.at(TokenKind::QuestionMark)
            && matches!(self.nth(1), TokenKind::Comma | TokenKind::ParenClose)
        {
            self.bump();
        } else {
            self.parse_expr_single_or_error();
        }
        self.done(m, NodeKind::Argument);
    }

    fn parse_map_constructor(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump(); // map
        self.push_delimiter();
        let open_range = self.current_span();
        self.bump(); // {
        if !self.at(TokenKind::BraceClose) {
            self.parse_map_entry();
            while self.eat(TokenKind::Comma) {
                self.parse_map_entry();
            }
        }
        if !self.eat(TokenKind::BraceClose) {
            self.error_unclosed_delimiter(
                DiagnosticKind::UnclosedBrace,
                "opened here",
                open_range,
            );
            self.missing("expected `}`");
        }
        self.pop_delimiter();
        self.done(m, NodeKind::MapConstructor)
    }

    fn parse_map_entry(&mut self) {
        let m = self.start();
        self.parse_expr_single_or_error();
        self.expect(TokenKind::Colon, "`:`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::MapConstructorEntry);
    }

    fn parse_square_array_constructor(&mut self) -> CompletedMarker {
        let m = self.start();
        self.push_delimiter();
        let open_range = self.current_span();
        self.bump(); // [
        if !self.at(TokenKind::BracketClose) {
            self.parse_expr_single_or_error();
            while self.eat(TokenKind::Comma) {
                self.parse_expr_single_or_error();
            }
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
        self.done(m, NodeKind::SquareArrayConstructor)
    }

    /// `%ann* function(params) as type { body }`
    fn parse_inline_function_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        while self.at(TokenKind::Percent) {
            self.parse_annotation();
        }
        self.expect(TokenKind::KwFunction, "`function`");
        self.push_delimiter();
        let open_range = self.current_span();
        let had_paren = self.expect(TokenKind::ParenOpen, "`(`");
        if self.at(TokenKind::Dollar) {
            self.parse_param_list();
        }
        if !self.eat(TokenKind::ParenClose) {
            if had_paren {
                self.error_unclosed_delimiter(
                    DiagnosticKind::UnclosedParen,
                    "parameter list opened here",
                    open_range,
                );
            }
            self.missing("expected `)`");
        }
        self.pop_delimiter();
        if self.at(TokenKind::KwAs) {
            self.parse_type_declaration();
        }
        self.parse_enclosed_expr();
        self.done(m, NodeKind::InlineFunctionExpr)
    }

    /// `element name { .. }`, `element { name-expr } { .. }`, and the
    /// other computed constructors.
    fn parse_computed_constructor(&mut self) -> CompletedMarker {
        let m = self.start();
        let kind = match self.current() {
            TokenKind::KwDocument => NodeKind::CompDocConstructor,
            TokenKind::KwElement => NodeKind::CompElemConstructor,
            TokenKind::KwAttribute => NodeKind::CompAttrConstructor,
            TokenKind::KwNamespace => NodeKind::CompNamespaceConstructor,
            TokenKind::KwText => NodeKind::CompTextConstructor,
            TokenKind::KwComment => NodeKind::CompCommentConstructor,
            TokenKind::KwProcessingInstruction => NodeKind::CompPIConstructor,
            _ => unreachable!("caller checked for a constructor keyword"),
        };
        let named = matches!(
            self.current(),
            TokenKind::KwElement
                | TokenKind::KwAttribute
                | TokenKind::KwNamespace
                | TokenKind::KwProcessingInstruction
        );
        self.bump(); // the keyword
        if named {
            if self.at(TokenKind::BraceOpen) {
                // The braces form: the first block is the name
                // expression, the second the content.
                self.parse_enclosed_expr();
            } else if self.at_one_of(NAME_FIRST) {
                self.parse_eqname_or_error();
            } else {
                self.error(DiagnosticKind::ExpectedName);
                self.missing("expected a constructor name");
            }
        }
        if self.at(TokenKind::BraceOpen) {
            self.parse_enclosed_expr();
        } else {
            self.error_msg(DiagnosticKind::UnexpectedToken, "expected `{`");
            self.missing("expected a content block");
        }
        self.done(m, kind)
    }
}
