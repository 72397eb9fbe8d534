//! Direct XML constructors: `<a b="c">...</a>`.
//!
//! The lexer has already committed to the tag reading by the time the
//! parser sees `TagOpen` (the `<` touched a name at expression start),
//! so everything here runs in the XML lexer modes: tag names and
//! attributes, then element content with nested constructors and
//! enclosed expressions, down to the matching close tag.

use text_size::TextRange;

use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::core::{CompletedMarker, Parser};
use crate::tree::NodeKind;

impl Parser<'_> {
    pub(super) fn parse_direct_constructor(&mut self) -> CompletedMarker {
        let m = self.start();
        if !self.enter_recursion() {
            self.bump(); // <
            return self.done(m, NodeKind::Error);
        }
        let open_range = self.current_span();
        self.push_delimiter();
        self.bump(); // <
        let open_name = self.parse_tag_name();

        loop {
            match self.current() {
                TokenKind::NCName => self.parse_dir_attribute(),
                TokenKind::TagClose | TokenKind::SelfCloseTagClose | TokenKind::Eof => break,
                _ => self.error_and_bump(DiagnosticKind::UnexpectedToken),
            }
        }

        match self.current() {
            TokenKind::SelfCloseTagClose => self.bump(),
            TokenKind::TagClose => {
                self.bump();
                self.parse_element_content(open_range, open_name);
            }
            _ => {
                self.error_unclosed_delimiter(
                    DiagnosticKind::ExpectedTagClose,
                    "tag opened here",
                    open_range,
                );
                self.missing("expected `>`");
            }
        }

        self.pop_delimiter();
        self.exit_recursion();
        self.done(m, NodeKind::DirElemConstructor)
    }

    /// In-tag QName. The XML lexer modes don't keywordize names, so the
    /// parts are plain `NCName` tokens glued by `:`.
    fn parse_tag_name(&mut self) -> Option<TextRange> {
        if !self.at(TokenKind::NCName) {
            self.error(DiagnosticKind::ExpectedName);
            self.missing("expected a tag name");
            return None;
        }
        let start = self.current_span().start();
        let m = self.start();
        self.bump();
        if self.at(TokenKind::Colon) && self.adjacent() {
            self.bump();
            if self.at(TokenKind::NCName) && self.adjacent() {
                self.bump();
            } else {
                self.error(DiagnosticKind::ExpectedName);
                self.missing("expected a local name after `:`");
            }
        }
        let end = self.last_token_end().unwrap_or(start);
        self.done(m, NodeKind::QName);
        Some(TextRange::new(start, end))
    }

    fn parse_dir_attribute(&mut self) {
        let m = self.start();
        self.parse_tag_name();
        self.expect(TokenKind::Equals, "`=`");
        if self.at(TokenKind::Quote) || self.at(TokenKind::Apos) {
            self.parse_dir_attribute_value();
        } else {
            self.error(DiagnosticKind::ExpectedAttributeValue);
            self.missing("expected an attribute value");
        }
        self.done(m, NodeKind::DirAttribute);
    }

    fn parse_dir_attribute_value(&mut self) {
        let m = self.start();
        let quote = self.current();
        let quote_range = self.current_span();
        self.bump(); // " or '
        loop {
            if self.should_stop() {
                self.error_unclosed_delimiter(
                    DiagnosticKind::UnclosedString,
                    "value opened here",
                    quote_range,
                );
                self.missing("expected a closing quote");
                break;
            }
            match self.current() {
                k if k == quote => {
                    self.bump();
                    break;
                }
                TokenKind::BraceOpen => {
                    self.parse_enclosed_expr();
                }
                TokenKind::AttrContents
                | TokenKind::EntityRef
                | TokenKind::CharRef
                | TokenKind::EscapedBrace => self.bump(),
                _ => self.error_and_bump(DiagnosticKind::UnexpectedToken),
            }
        }
        self.done(m, NodeKind::DirAttributeValue);
    }

    fn parse_element_content(&mut self, open_range: TextRange, open_name: Option<TextRange>) {
        loop {
            if self.should_stop() {
                self.error_unclosed_delimiter(
                    DiagnosticKind::UnclosedTag,
                    "element opened here",
                    open_range,
                );
                self.missing("expected a closing tag");
                return;
            }
            match self.current() {
                TokenKind::CloseTagOpen => {
                    self.parse_close_tag(open_name);
                    return;
                }
                TokenKind::TagOpen => {
                    self.parse_direct_constructor();
                }
                TokenKind::XmlComment => {
                    let c = self.start();
                    self.bump();
                    self.done(c, NodeKind::DirCommentConstructor);
                }
                TokenKind::XmlPi => {
                    let c = self.start();
                    self.bump();
                    self.done(c, NodeKind::DirPIConstructor);
                }
                TokenKind::BraceOpen => {
                    self.parse_enclosed_expr();
                }
                // Character data, entity and character references,
                // escaped braces, and stray bad characters.
                _ => self.bump(),
            }
        }
    }

    fn parse_close_tag(&mut self, open_name: Option<TextRange>) {
        self.bump(); // </
        let close_name = self.parse_tag_name();
        if let (Some(open), Some(close)) = (open_name, close_name) {
            let source = self.source;
            let open_text = &source[std::ops::Range::<usize>::from(open)];
            let close_text = &source[std::ops::Range::<usize>::from(close)];
            if open_text != close_text {
                self.diagnostics
                    .report(DiagnosticKind::MismatchedCloseTag, close)
                    .message(open_text)
                    .related_to("opening tag here", open)
                    .fix("replace with the opening tag's name", open_text)
                    .emit();
            }
        }
        self.expect(TokenKind::TagClose, "`>`");
    }
}
