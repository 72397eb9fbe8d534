//! The expression grammar: FLWOR and the other keyword-headed forms,
//! then the binary operator chain down to simple map expressions.
//!
//! Binary operators are parsed by layered descent, one method per
//! precedence level, wrapping left-associatively via `precede`. The
//! comparison level also owns the `<` reinterpretation: a `TagOpen` at
//! operator position cannot be a constructor, so the token stream is
//! rewound and re-lexed with tag recognition suppressed.

use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::core::{CompletedMarker, Parser};
use crate::tree::NodeKind;

use super::{COMPARISON_OPS, EXPR_RECOVERY};

impl Parser<'_> {
    /// `Expr ::= ExprSingle ("," ExprSingle)*`
    pub(super) fn parse_expr(&mut self) -> Option<CompletedMarker> {
        let first = self.parse_expr_single()?;
        if !self.at(TokenKind::Comma) {
            return Some(first);
        }
        let m = self.precede(first);
        while self.eat(TokenKind::Comma) {
            self.parse_expr_single_or_error();
        }
        Some(self.done(m, NodeKind::SequenceExpr))
    }

    pub(super) fn parse_expr_single(&mut self) -> Option<CompletedMarker> {
        if !self.enter_recursion() {
            return None;
        }
        let result = self.expr_single_inner();
        self.exit_recursion();
        result
    }

    pub(super) fn parse_expr_single_or_error(&mut self) {
        if self.parse_expr_single().is_none() {
            self.missing("expected an expression");
            self.error_recover(
                DiagnosticKind::ExpectedExpression,
                "expected an expression",
                EXPR_RECOVERY,
            );
        }
    }

    /// Keyword-headed forms need LL(2): `for` is only a FLWOR head when
    /// a `$` follows, `if` only a conditional when `(` follows, and so
    /// on. Otherwise the keyword is an ordinary name.
    fn expr_single_inner(&mut self) -> Option<CompletedMarker> {
        match self.current() {
            TokenKind::KwFor | TokenKind::KwLet if self.nth(1) == TokenKind::Dollar => {
                Some(self.parse_flwor_expr())
            }
            TokenKind::KwSome | TokenKind::KwEvery if self.nth(1) == TokenKind::Dollar => {
                Some(self.parse_quantified_expr())
            }
            TokenKind::KwIf if self.nth(1) == TokenKind::ParenOpen => Some(self.parse_if_expr()),
            TokenKind::KwSwitch if self.nth(1) == TokenKind::ParenOpen => {
                Some(self.parse_switch_expr())
            }
            TokenKind::KwTypeswitch if self.nth(1) == TokenKind::ParenOpen => {
                Some(self.parse_typeswitch_expr())
            }
            TokenKind::KwTry if self.nth(1) == TokenKind::BraceOpen => {
                Some(self.parse_try_catch_expr())
            }
            _ => self.parse_or_expr(),
        }
    }

    // --- FLWOR ---

    fn parse_flwor_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        loop {
            match self.current() {
                TokenKind::KwFor if self.nth(1) == TokenKind::Dollar => self.parse_for_clause(),
                TokenKind::KwLet if self.nth(1) == TokenKind::Dollar => self.parse_let_clause(),
                TokenKind::KwWhere => self.parse_where_clause(),
                TokenKind::KwOrder if self.nth(1) == TokenKind::KwBy => {
                    self.parse_order_by_clause()
                }
                TokenKind::KwStable if self.nth(1) == TokenKind::KwOrder => {
                    self.parse_order_by_clause()
                }
                TokenKind::KwCount if self.nth(1) == TokenKind::Dollar => {
                    self.parse_count_clause()
                }
                TokenKind::KwReturn => {
                    self.parse_return_clause();
                    break;
                }
                _ => {
                    self.error_msg(DiagnosticKind::UnexpectedToken, "expected `return`");
                    self.missing("expected `return` clause");
                    break;
                }
            }
        }
        self.done(m, NodeKind::FlworExpr)
    }

    fn parse_for_clause(&mut self) {
        let m = self.start();
        self.bump(); // for
        self.parse_for_binding();
        while self.eat(TokenKind::Comma) {
            self.parse_for_binding();
        }
        self.done(m, NodeKind::ForClause);
    }

    fn parse_for_binding(&mut self) {
        let m = self.start();
        self.expect(TokenKind::Dollar, "`$`");
        self.parse_eqname_or_error();
        if self.at(TokenKind::KwAs) {
            self.parse_type_declaration();
        }
        if self.at(TokenKind::KwAllowing) {
            let allowing = self.start();
            self.bump(); // allowing
            self.expect(TokenKind::KwEmpty, "`empty`");
            self.done(allowing, NodeKind::AllowingEmpty);
        }
        if self.at(TokenKind::KwAt) {
            let positional = self.start();
            self.bump(); // at
            self.expect(TokenKind::Dollar, "`$`");
            self.parse_eqname_or_error();
            self.done(positional, NodeKind::PositionalVar);
        }
        self.expect(TokenKind::KwIn, "`in`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::ForBinding);
    }

    fn parse_let_clause(&mut self) {
        let m = self.start();
        self.bump(); // let
        self.parse_let_binding();
        while self.eat(TokenKind::Comma) {
            self.parse_let_binding();
        }
        self.done(m, NodeKind::LetClause);
    }

    fn parse_let_binding(&mut self) {
        let m = self.start();
        self.expect(TokenKind::Dollar, "`$`");
        self.parse_eqname_or_error();
        if self.at(TokenKind::KwAs) {
            self.parse_type_declaration();
        }
        self.expect(TokenKind::ColonEquals, "`:=`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::LetBinding);
    }

    fn parse_where_clause(&mut self) {
        let m = self.start();
        self.bump(); // where
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::WhereClause);
    }

    fn parse_order_by_clause(&mut self) {
        let m = self.start();
        self.eat(TokenKind::KwStable);
        self.bump(); // order
        self.expect(TokenKind::KwBy, "`by`");
        self.parse_order_spec();
        while self.eat(TokenKind::Comma) {
            self.parse_order_spec();
        }
        self.done(m, NodeKind::OrderByClause);
    }

    fn parse_order_spec(&mut self) {
        let m = self.start();
        self.parse_expr_single_or_error();
        let _ = self.eat(TokenKind::KwAscending) || self.eat(TokenKind::KwDescending);
        if self.eat(TokenKind::KwEmpty)
            && !self.eat(TokenKind::KwGreatest)
            && !self.eat(TokenKind::KwLeast)
        {
            self.error_msg(
                DiagnosticKind::UnexpectedToken,
                "expected `greatest` or `least`",
            );
        }
        if self.eat(TokenKind::KwCollation) {
            self.expect(TokenKind::StringLiteral, "a collation URI");
        }
        self.done(m, NodeKind::OrderSpec);
    }

    fn parse_count_clause(&mut self) {
        let m = self.start();
        self.bump(); // count
        self.expect(TokenKind::Dollar, "`$`");
        self.parse_eqname_or_error();
        self.done(m, NodeKind::CountClause);
    }

    fn parse_return_clause(&mut self) {
        let m = self.start();
        self.bump(); // return
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::ReturnClause);
    }

    // --- Other keyword-headed forms ---

    fn parse_quantified_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump(); // some | every
        self.parse_quantified_binding();
        while self.eat(TokenKind::Comma) {
            self.parse_quantified_binding();
        }
        self.expect(TokenKind::KwSatisfies, "`satisfies`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::QuantifiedExpr)
    }

    fn parse_quantified_binding(&mut self) {
        let m = self.start();
        self.expect(TokenKind::Dollar, "`$`");
        self.parse_eqname_or_error();
        if self.at(TokenKind::KwAs) {
            self.parse_type_declaration();
        }
        self.expect(TokenKind::KwIn, "`in`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::QuantifiedBinding);
    }

    fn parse_if_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump(); // if
        self.parse_condition_parens();
        self.expect(TokenKind::KwThen, "`then`");
        self.parse_expr_single_or_error();
        self.expect(TokenKind::KwElse, "`else`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::IfExpr)
    }

    /// The `( Expr )` after `if`, `switch`, and `typeswitch`.
    fn parse_condition_parens(&mut self) {
        self.push_delimiter();
        let open_range = self.current_span();
        self.bump(); // (
        if self.parse_expr().is_none() {
            self.missing("expected an expression");
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
    }

    fn parse_switch_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump(); // switch
        self.parse_condition_parens();
        while self.at(TokenKind::KwCase) {
            self.parse_switch_case_clause();
        }
        self.expect(TokenKind::KwDefault, "`default`");
        self.expect(TokenKind::KwReturn, "`return`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::SwitchExpr)
    }

    /// `("case" operand)+ "return" ExprSingle`
    fn parse_switch_case_clause(&mut self) {
        let m = self.start();
        while self.eat(TokenKind::KwCase) {
            self.parse_expr_single_or_error();
        }
        self.expect(TokenKind::KwReturn, "`return`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::SwitchCaseClause);
    }

    fn parse_typeswitch_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump(); // typeswitch
        self.parse_condition_parens();
        while self.at(TokenKind::KwCase) {
            self.parse_case_clause();
        }
        self.expect(TokenKind::KwDefault, "`default`");
        if self.eat(TokenKind::Dollar) {
            self.parse_eqname_or_error();
        }
        self.expect(TokenKind::KwReturn, "`return`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::TypeswitchExpr)
    }

    /// `case ($v as)? SequenceType ("|" SequenceType)* return ExprSingle`
    fn parse_case_clause(&mut self) {
        let m = self.start();
        self.bump(); // case
        if self.at(TokenKind::Dollar) {
            self.bump();
            self.parse_eqname_or_error();
            self.expect(TokenKind::KwAs, "`as`");
        }
        self.parse_sequence_type();
        while self.eat(TokenKind::Pipe) {
            self.parse_sequence_type();
        }
        self.expect(TokenKind::KwReturn, "`return`");
        self.parse_expr_single_or_error();
        self.done(m, NodeKind::CaseClause);
    }

    fn parse_try_catch_expr(&mut self) -> CompletedMarker {
        let m = self.start();
        self.bump(); // try
        self.parse_enclosed_expr();
        if !self.at(TokenKind::KwCatch) {
            self.error_msg(DiagnosticKind::UnexpectedToken, "expected `catch`");
            self.missing("expected a `catch` clause");
        }
        while self.at(TokenKind::KwCatch) {
            self.parse_catch_clause();
        }
        self.done(m, NodeKind::TryCatchExpr)
    }

    fn parse_catch_clause(&mut self) {
        let m = self.start();
        self.bump(); // catch
        self.parse_catch_error_test();
        while self.eat(TokenKind::Pipe) {
            self.parse_catch_error_test();
        }
        if self.at(TokenKind::BraceOpen) {
            self.parse_enclosed_expr();
        } else {
            self.error_msg(DiagnosticKind::UnexpectedToken, "expected `{`");
            self.missing("expected a catch handler");
        }
        self.done(m, NodeKind::CatchClause);
    }

    fn parse_catch_error_test(&mut self) {
        let m = self.start();
        if self.at(TokenKind::Star) {
            self.parse_wildcard();
        } else if self.parse_eqname().is_none() {
            self.error(DiagnosticKind::ExpectedName);
            self.missing("expected an error name");
        }
        self.done(m, NodeKind::NameTest);
    }

    // --- The binary operator chain, loosest first ---

    fn parse_or_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_and_expr()?;
        while self.at(TokenKind::KwOr) {
            let m = self.precede(lhs);
            self.bump();
            if self.parse_and_expr().is_none() {
                self.missing("expected an expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::OrExpr);
        }
        Some(lhs)
    }

    fn parse_and_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_comparison_expr()?;
        while self.at(TokenKind::KwAnd) {
            let m = self.precede(lhs);
            self.bump();
            if self.parse_comparison_expr().is_none() {
                self.missing("expected an expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::AndExpr);
        }
        Some(lhs)
    }

    /// Comparisons don't associate; chains still parse (leaning left)
    /// but each extra operator is reported.
    fn parse_comparison_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_string_concat_expr()?;
        let mut chained = false;
        loop {
            // A `<` after a complete operand is an operator no matter
            // what follows it; undo the lexer's greedy tag reading.
            if self.at(TokenKind::TagOpen) {
                self.relex_less_than();
            }
            if !self.at_one_of(COMPARISON_OPS) {
                break;
            }
            if chained {
                self.error_msg(
                    DiagnosticKind::UnexpectedToken,
                    "comparison operators cannot be chained",
                );
            }
            chained = true;
            let m = self.precede(lhs);
            self.bump();
            if self.parse_string_concat_expr().is_none() {
                self.missing("expected an expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::ComparisonExpr);
        }
        Some(lhs)
    }

    fn parse_string_concat_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_range_expr()?;
        while self.at(TokenKind::PipePipe) {
            let m = self.precede(lhs);
            self.bump();
            if self.parse_range_expr().is_none() {
                self.missing("expected an expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::StringConcatExpr);
        }
        Some(lhs)
    }

    fn parse_range_expr(&mut self) -> Option<CompletedMarker> {
        let lhs = self.parse_additive_expr()?;
        if !self.at(TokenKind::KwTo) {
            return Some(lhs);
        }
        let m = self.precede(lhs);
        self.bump();
        if self.parse_additive_expr().is_none() {
            self.missing("expected an expression");
            self.error(DiagnosticKind::ExpectedExpression);
        }
        Some(self.done(m, NodeKind::RangeExpr))
    }

    fn parse_additive_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_multiplicative_expr()?;
        while self.at(TokenKind::Plus) || self.at(TokenKind::Minus) {
            let m = self.precede(lhs);
            self.bump();
            if self.parse_multiplicative_expr().is_none() {
                self.missing("expected an expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::AdditiveExpr);
        }
        Some(lhs)
    }

    fn parse_multiplicative_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_union_expr()?;
        while matches!(
            self.current(),
            TokenKind::Star | TokenKind::KwDiv | TokenKind::KwIdiv | TokenKind::KwMod
        ) {
            let m = self.precede(lhs);
            self.bump();
            if self.parse_union_expr().is_none() {
                self.missing("expected an expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::MultiplicativeExpr);
        }
        Some(lhs)
    }

    fn parse_union_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_intersect_except_expr()?;
        while self.at(TokenKind::KwUnion) || self.at(TokenKind::Pipe) {
            let m = self.precede(lhs);
            self.bump();
            if self.parse_intersect_except_expr().is_none() {
                self.missing("expected an expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::UnionExpr);
        }
        Some(lhs)
    }

    fn parse_intersect_except_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_instanceof_expr()?;
        while self.at(TokenKind::KwIntersect) || self.at(TokenKind::KwExcept) {
            let m = self.precede(lhs);
            self.bump();
            if self.parse_instanceof_expr().is_none() {
                self.missing("expected an expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::IntersectExceptExpr);
        }
        Some(lhs)
    }

    // --- Type operators, each applying at most once ---

    fn parse_instanceof_expr(&mut self) -> Option<CompletedMarker> {
        let lhs = self.parse_treat_expr()?;
        if !(self.at(TokenKind::KwInstance) && self.nth(1) == TokenKind::KwOf) {
            return Some(lhs);
        }
        let m = self.precede(lhs);
        self.bump(); // instance
        self.bump(); // of
        self.parse_sequence_type();
        Some(self.done(m, NodeKind::InstanceofExpr))
    }

    fn parse_treat_expr(&mut self) -> Option<CompletedMarker> {
        let lhs = self.parse_castable_expr()?;
        if !(self.at(TokenKind::KwTreat) && self.nth(1) == TokenKind::KwAs) {
            return Some(lhs);
        }
        let m = self.precede(lhs);
        self.bump(); // treat
        self.bump(); // as
        self.parse_sequence_type();
        Some(self.done(m, NodeKind::TreatExpr))
    }

    fn parse_castable_expr(&mut self) -> Option<CompletedMarker> {
        let lhs = self.parse_cast_expr()?;
        if !(self.at(TokenKind::KwCastable) && self.nth(1) == TokenKind::KwAs) {
            return Some(lhs);
        }
        let m = self.precede(lhs);
        self.bump(); // castable
        self.bump(); // as
        self.parse_single_type();
        Some(self.done(m, NodeKind::CastableExpr))
    }

    fn parse_cast_expr(&mut self) -> Option<CompletedMarker> {
        let lhs = self.parse_arrow_expr()?;
        if !(self.at(TokenKind::KwCast) && self.nth(1) == TokenKind::KwAs) {
            return Some(lhs);
        }
        let m = self.precede(lhs);
        self.bump(); // cast
        self.bump(); // as
        self.parse_single_type();
        Some(self.done(m, NodeKind::CastExpr))
    }

    fn parse_arrow_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_unary_expr()?;
        while self.at(TokenKind::Arrow) {
            let m = self.precede(lhs);
            self.bump(); // =>
            self.parse_arrow_function_specifier();
            if self.at(TokenKind::ParenOpen) {
                self.parse_argument_list();
            } else {
                self.error_msg(DiagnosticKind::UnexpectedToken, "expected `(`");
                self.missing("expected an argument list");
            }
            lhs = self.done(m, NodeKind::ArrowExpr);
        }
        Some(lhs)
    }

    fn parse_arrow_function_specifier(&mut self) {
        match self.current() {
            TokenKind::Dollar => {
                self.parse_var_ref();
            }
            TokenKind::ParenOpen => {
                self.parse_parenthesized_expr();
            }
            _ => self.parse_eqname_or_error(),
        }
    }

    fn parse_unary_expr(&mut self) -> Option<CompletedMarker> {
        if !self.at(TokenKind::Minus) && !self.at(TokenKind::Plus) {
            return self.parse_simple_map_expr();
        }
        let m = self.start();
        while self.at(TokenKind::Minus) || self.at(TokenKind::Plus) {
            self.bump();
        }
        if self.parse_simple_map_expr().is_none() {
            self.missing("expected an expression");
            self.error(DiagnosticKind::ExpectedExpression);
        }
        Some(self.done(m, NodeKind::UnaryExpr))
    }

    fn parse_simple_map_expr(&mut self) -> Option<CompletedMarker> {
        let mut lhs = self.parse_path_expr()?;
        while self.at(TokenKind::Bang) {
            let m = self.precede(lhs);
            self.bump();
            if self.parse_path_expr().is_none() {
                self.missing("expected a path expression");
                self.error(DiagnosticKind::ExpectedExpression);
            }
            lhs = self.done(m, NodeKind::SimpleMapExpr);
        }
        Some(lhs)
    }
}
