//! Sequence types, item types, and kind tests, including the vendor
//! `tuple(..)` and `union(..)` item types.

use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::core::Parser;
use crate::tree::NodeKind;

use super::{KIND_TEST_KEYWORDS, NAME_FIRST};

impl Parser<'_> {
    /// `as SequenceType`. Callers have already seen the `as`.
    pub(super) fn parse_type_declaration(&mut self) {
        let m = self.start();
        self.bump(); // as
        self.parse_sequence_type();
        self.done(m, NodeKind::TypeDeclaration);
    }

    pub(super) fn parse_sequence_type(&mut self) {
        let m = self.start();
        if self.at(TokenKind::KwEmptySequence) && self.nth(1) == TokenKind::ParenOpen {
            let e = self.start();
            self.bump(); // empty-sequence
            self.bump(); // (
            self.expect(TokenKind::ParenClose, "`)`");
            self.done(e, NodeKind::EmptySequenceType);
        } else {
            self.parse_item_type();
            self.parse_occurrence_indicator();
        }
        self.done(m, NodeKind::SequenceType);
    }

    /// `SimpleTypeName "?"?`, the restricted type after `cast as` and
    /// `castable as`.
    pub(super) fn parse_single_type(&mut self) {
        let m = self.start();
        let t = self.start();
        self.parse_eqname_or_error();
        self.done(t, NodeKind::AtomicOrUnionType);
        self.eat(TokenKind::QuestionMark);
        self.done(m, NodeKind::SequenceType);
    }

    /// Indicators bind greedily to the type; a second one glued on is
    /// an error but stays inside the type node.
    fn parse_occurrence_indicator(&mut self) {
        if !matches!(
            self.current(),
            TokenKind::QuestionMark | TokenKind::Star | TokenKind::Plus
        ) {
            return;
        }
        self.bump();
        while matches!(
            self.current(),
            TokenKind::QuestionMark | TokenKind::Star | TokenKind::Plus
        ) && self.adjacent()
        {
            self.error(DiagnosticKind::InvalidOccurrenceIndicator);
            self.bump();
        }
    }

    fn parse_item_type(&mut self) {
        match self.current() {
            TokenKind::ParenOpen => {
                let m = self.start();
                self.bump(); // (
                self.parse_item_type();
                self.expect(TokenKind::ParenClose, "`)`");
                self.done(m, NodeKind::ParenthesizedItemType);
            }
            TokenKind::KwItem if self.nth(1) == TokenKind::ParenOpen => {
                let m = self.start();
                self.bump(); // item
                self.bump(); // (
                self.expect(TokenKind::ParenClose, "`)`");
                self.done(m, NodeKind::AnyItemType);
            }
            TokenKind::KwEmptySequence if self.nth(1) == TokenKind::ParenOpen => {
                let m = self.start();
                self.bump(); // empty-sequence
                self.bump(); // (
                self.expect(TokenKind::ParenClose, "`)`");
                self.done(m, NodeKind::EmptySequenceType);
            }
            TokenKind::KwFunction if self.nth(1) == TokenKind::ParenOpen => {
                self.parse_function_test()
            }
            TokenKind::KwMap if self.nth(1) == TokenKind::ParenOpen => self.parse_map_test(),
            TokenKind::KwArray if self.nth(1) == TokenKind::ParenOpen => self.parse_array_test(),
            TokenKind::KwTuple if self.nth(1) == TokenKind::ParenOpen => self.parse_tuple_type(),
            TokenKind::KwUnion if self.nth(1) == TokenKind::ParenOpen => self.parse_union_type(),
            k if KIND_TEST_KEYWORDS.contains(k) && self.nth(1) == TokenKind::ParenOpen => {
                self.parse_kind_test();
            }
            k if NAME_FIRST.contains(k) => {
                let m = self.start();
                self.parse_eqname_or_error();
                self.done(m, NodeKind::AtomicOrUnionType);
            }
            _ => {
                self.error(DiagnosticKind::ExpectedSequenceType);
                self.missing("expected a sequence type");
            }
        }
    }

    /// Node kind tests, shared with path node tests. The caller has
    /// verified the keyword is followed by `(`.
    pub(super) fn parse_kind_test(&mut self) {
        let kw = self.current();
        let kind = match kw {
            TokenKind::KwNode => NodeKind::AnyKindTest,
            TokenKind::KwDocumentNode => NodeKind::DocumentTest,
            TokenKind::KwText => NodeKind::TextTest,
            TokenKind::KwComment => NodeKind::CommentTest,
            TokenKind::KwNamespaceNode => NodeKind::NamespaceNodeTest,
            TokenKind::KwProcessingInstruction => NodeKind::PITest,
            TokenKind::KwElement => NodeKind::ElementTest,
            TokenKind::KwAttribute => NodeKind::AttributeTest,
            TokenKind::KwSchemaElement => NodeKind::SchemaElementTest,
            TokenKind::KwSchemaAttribute => NodeKind::SchemaAttributeTest,
            _ => unreachable!("caller checked for a kind-test keyword"),
        };
        let m = self.start();
        self.bump(); // the keyword
        self.bump(); // (
        match kw {
            TokenKind::KwDocumentNode => {
                if matches!(
                    self.current(),
                    TokenKind::KwElement | TokenKind::KwSchemaElement
                ) && self.nth(1) == TokenKind::ParenOpen
                {
                    self.parse_kind_test();
                }
            }
            TokenKind::KwProcessingInstruction => {
                if self.at(TokenKind::StringLiteral) || self.at_one_of(NAME_FIRST) {
                    self.bump();
                }
            }
            TokenKind::KwElement | TokenKind::KwAttribute => {
                if self.at(TokenKind::Star) {
                    self.bump();
                } else if self.at_one_of(NAME_FIRST) {
                    self.parse_eqname_or_error();
                }
                if self.eat(TokenKind::Comma) {
                    self.parse_eqname_or_error();
                    if kw == TokenKind::KwElement {
                        self.eat(TokenKind::QuestionMark);
                    }
                }
            }
            TokenKind::KwSchemaElement | TokenKind::KwSchemaAttribute => {
                self.parse_eqname_or_error();
            }
            // node(), text(), comment(), namespace-node() are empty.
            _ => {}
        }
        self.expect(TokenKind::ParenClose, "`)`");
        self.done(m, kind);
    }

    /// `function(*)` or `function(SequenceType, ..) as SequenceType`
    fn parse_function_test(&mut self) {
        let m = self.start();
        self.bump(); // function
        self.bump(); // (
        if self.at(TokenKind::Star) {
            self.bump();
        } else if !self.at(TokenKind::ParenClose) {
            self.parse_sequence_type();
            while self.eat(TokenKind::Comma) {
                self.parse_sequence_type();
            }
        }
        self.expect(TokenKind::ParenClose, "`)`");
        if self.eat(TokenKind::KwAs) {
            self.parse_sequence_type();
        }
        self.done(m, NodeKind::FunctionTest);
    }

    /// `map(*)` or `map(AtomicType, SequenceType)`
    fn parse_map_test(&mut self) {
        let m = self.start();
        self.bump(); // map
        self.bump(); // (
        if self.at(TokenKind::Star) {
            self.bump();
        } else {
            let key = self.start();
            self.parse_eqname_or_error();
            self.done(key, NodeKind::AtomicOrUnionType);
            self.expect(TokenKind::Comma, "`,`");
            self.parse_sequence_type();
        }
        self.expect(TokenKind::ParenClose, "`)`");
        self.done(m, NodeKind::MapTest);
    }

    /// `array(*)` or `array(SequenceType)`
    fn parse_array_test(&mut self) {
        let m = self.start();
        self.bump(); // array
        self.bump(); // (
        if self.at(TokenKind::Star) {
            self.bump();
        } else {
            self.parse_sequence_type();
        }
        self.expect(TokenKind::ParenClose, "`)`");
        self.done(m, NodeKind::ArrayTest);
    }

    /// Saxon's `tuple(name: type, ..)` with optional fields marked `?`.
    fn parse_tuple_type(&mut self) {
        let m = self.start();
        self.bump(); // tuple
        self.bump(); // (
        if !self.at(TokenKind::ParenClose) {
            self.parse_tuple_field();
            while self.eat(TokenKind::Comma) {
                self.parse_tuple_field();
            }
        }
        self.expect(TokenKind::ParenClose, "`)`");
        self.done(m, NodeKind::TupleType);
    }

    fn parse_tuple_field(&mut self) {
        let m = self.start();
        if !self.eat_name_token() {
            self.error(DiagnosticKind::ExpectedName);
            self.missing("expected a field name");
        }
        self.eat(TokenKind::QuestionMark);
        if self.eat(TokenKind::Colon) {
            self.parse_sequence_type();
        }
        self.done(m, NodeKind::TupleField);
    }

    /// Saxon's `union(EQName, ..)`
    fn parse_union_type(&mut self) {
        let m = self.start();
        self.bump(); // union
        self.bump(); // (
        if !self.at(TokenKind::ParenClose) {
            self.parse_eqname_or_error();
            while self.eat(TokenKind::Comma) {
                self.parse_eqname_or_error();
            }
        }
        self.expect(TokenKind::ParenClose, "`)`");
        self.done(m, NodeKind::UnionType);
    }
}
