//! The mode lexer.
//!
//! A stack-based tokenizer: each base mode is an independent transition
//! function over the code-point cursor, and mode switches are explicit
//! push/pop operations on the packed [`LexerState`] stack. Because every
//! token boundary leaves the full stack (plus nesting counters) inside
//! the state value, lexing can resume from any previously captured
//! `(offset, state)` pair and reproduce the exact token sequence — the
//! editor integration relies on this for incremental re-lexing.
//!
//! Error handling: unrecognized code points coalesce into single
//! `BadCharacter` tokens, and unterminated strings/comments lex as one
//! token spanning to end of input. The lexer itself never fails.

use text_size::{TextRange, TextSize};

use super::cursor::CodePointCursor;
use super::state::{LexerState, Mode};
use super::token::{Token, TokenKind, keyword};

pub struct Lexer<'s> {
    cursor: CodePointCursor<'s>,
    state: LexerState,
    /// One-shot flag set by the token stream when the parser has decided
    /// a `<` is the comparison operator. Not part of the resumable
    /// state; it never survives past the next token.
    suppress_tag: bool,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            cursor: CodePointCursor::new(source),
            state: LexerState::default(),
            suppress_tag: false,
        }
    }

    /// Resumes lexing mid-file from a previously captured checkpoint.
    pub fn resume(source: &'s str, offset: TextSize, state: LexerState) -> Self {
        Self {
            cursor: CodePointCursor::at(source, offset.into()),
            state,
            suppress_tag: false,
        }
    }

    /// Lexer whose outermost mode is XSLT attribute-value-template text.
    pub fn new_avt(source: &'s str) -> Self {
        Self {
            cursor: CodePointCursor::new(source),
            state: LexerState::with_mode(Mode::Avt),
            suppress_tag: false,
        }
    }

    /// Checkpoint valid at [`Lexer::offset`].
    pub fn state(&self) -> LexerState {
        self.state
    }

    pub fn offset(&self) -> TextSize {
        self.cursor.offset()
    }

    pub(crate) fn set_suppress_tag(&mut self) {
        self.suppress_tag = true;
    }

    pub(crate) fn restore_to(&mut self, offset: TextSize, state: LexerState) {
        self.cursor.restore(u32::from(offset) as usize);
        self.state = state;
        self.suppress_tag = false;
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.cursor.is_eof() {
            return None;
        }
        let start = self.cursor.offset();
        let kind = match self.state.mode() {
            Mode::Default => self.default_token(),
            Mode::DocStart => self.doc_start_token(),
            Mode::DocContents => self.doc_contents_token(),
            Mode::DocTag => self.doc_tag_token(),
            Mode::DocParamVar => self.doc_param_var_token(),
            Mode::DocParamName => self.doc_param_name_token(),
            Mode::DocTrim => self.doc_trim_token(),
            Mode::XmlTag | Mode::XmlCloseTag => self.xml_tag_token(),
            Mode::XmlContent => self.xml_content_token(),
            Mode::XmlAttrQuot => self.xml_attr_token('"'),
            Mode::XmlAttrApos => self.xml_attr_token('\''),
            Mode::Avt => self.avt_token(),
        };
        let end = self.cursor.offset();
        debug_assert!(end > start, "lexer made no progress at {start:?}");
        Some(Token::new(kind, TextRange::new(start, end)))
    }

    // --- Default (core expression) mode ---

    fn default_token(&mut self) -> TokenKind {
        let suppress_tag = std::mem::take(&mut self.suppress_tag);
        let c = self.cursor.peek().expect("checked non-eof");
        match c {
            c if is_xml_whitespace(c) => {
                self.cursor.bump_while(is_xml_whitespace);
                TokenKind::Whitespace
            }
            '(' => {
                if self.cursor.peek_second() == Some(':') {
                    self.comment_token()
                } else {
                    self.cursor.bump();
                    TokenKind::ParenOpen
                }
            }
            ')' => self.single(TokenKind::ParenClose),
            '[' => self.single(TokenKind::BracketOpen),
            ']' => self.single(TokenKind::BracketClose),
            '{' => {
                self.cursor.bump();
                // Enclosed-expression frames nest via the mode stack so
                // that a later `}` knows whether it returns to XML
                // content, an attribute value, or an AVT.
                self.state.push(Mode::Default);
                TokenKind::BraceOpen
            }
            '}' => {
                self.cursor.bump();
                if self.state.depth() > 0 {
                    self.state.pop();
                }
                TokenKind::BraceClose
            }
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            '$' => self.single(TokenKind::Dollar),
            '%' => self.single(TokenKind::Percent),
            '@' => self.single(TokenKind::At),
            '#' => self.single(TokenKind::Hash),
            '?' => self.single(TokenKind::QuestionMark),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '.' => {
                self.cursor.bump();
                match self.cursor.peek() {
                    Some('.') => self.single(TokenKind::DotDot),
                    Some(c) if c.is_ascii_digit() => self.number_fraction(),
                    _ => TokenKind::Dot,
                }
            }
            '/' => {
                self.cursor.bump();
                if self.cursor.eat('/') {
                    TokenKind::SlashSlash
                } else {
                    TokenKind::Slash
                }
            }
            '!' => {
                self.cursor.bump();
                if self.cursor.eat('=') {
                    TokenKind::NotEquals
                } else {
                    TokenKind::Bang
                }
            }
            '|' => {
                self.cursor.bump();
                if self.cursor.eat('|') {
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                }
            }
            '=' => {
                self.cursor.bump();
                if self.cursor.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Equals
                }
            }
            '<' => self.less_than_or_tag(suppress_tag),
            '>' => {
                self.cursor.bump();
                if self.cursor.eat('>') {
                    TokenKind::NodeAfter
                } else if self.cursor.eat('=') {
                    TokenKind::GreaterThanOrEquals
                } else {
                    TokenKind::GreaterThan
                }
            }
            ':' => {
                self.cursor.bump();
                if self.cursor.eat(':') {
                    TokenKind::ColonColon
                } else if self.cursor.eat('=') {
                    TokenKind::ColonEquals
                } else {
                    TokenKind::Colon
                }
            }
            '"' | '\'' => self.string_literal(c),
            c if c.is_ascii_digit() => self.number(),
            c if is_ncname_start(c) => self.ncname(),
            _ => {
                self.cursor.bump_while(is_unrecognized);
                TokenKind::BadCharacter
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.bump();
        kind
    }

    fn less_than_or_tag(&mut self, suppress_tag: bool) -> TokenKind {
        self.cursor.bump();
        match self.cursor.peek() {
            Some('!') if self.cursor.peek_second() == Some('-') => self.xml_comment(),
            Some('?') => self.xml_pi(),
            Some('=') => {
                self.cursor.bump();
                TokenKind::LessThanOrEquals
            }
            Some('<') => {
                self.cursor.bump();
                TokenKind::NodeBefore
            }
            Some(c) if is_ncname_start(c) && !suppress_tag => {
                self.state.push(Mode::XmlTag);
                TokenKind::TagOpen
            }
            _ => TokenKind::LessThan,
        }
    }

    /// `<!-- ... -->` as one token; unterminated spans to end of input.
    fn xml_comment(&mut self) -> TokenKind {
        self.cursor.bump(); // !
        self.cursor.bump(); // -
        self.cursor.eat('-');
        while let Some(c) = self.cursor.bump() {
            if c == '-' && self.cursor.peek() == Some('-') && self.cursor.peek_second() == Some('>')
            {
                self.cursor.bump();
                self.cursor.bump();
                break;
            }
        }
        TokenKind::XmlComment
    }

    /// `<? ... ?>` as one token; unterminated spans to end of input.
    fn xml_pi(&mut self) -> TokenKind {
        self.cursor.bump(); // ?
        while let Some(c) = self.cursor.bump() {
            if c == '?' && self.cursor.peek() == Some('>') {
                self.cursor.bump();
                break;
            }
        }
        TokenKind::XmlPi
    }

    /// Whole string literal including delimiters. `""`/`''` doubling
    /// stays inside the token; unterminated strings run to end of input.
    fn string_literal(&mut self, quote: char) -> TokenKind {
        self.cursor.bump();
        loop {
            match self.cursor.peek() {
                None => break,
                Some(c) if c == quote => {
                    self.cursor.bump();
                    if self.cursor.peek() == Some(quote) {
                        self.cursor.bump();
                    } else {
                        break;
                    }
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
        TokenKind::StringLiteral
    }

    fn number(&mut self) -> TokenKind {
        self.cursor.bump_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.bump();
            return self.number_fraction();
        }
        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            return self.number_exponent(TokenKind::IntegerLiteral);
        }
        TokenKind::IntegerLiteral
    }

    /// After the `.` of a decimal; cursor sits on the first fraction
    /// digit.
    fn number_fraction(&mut self) -> TokenKind {
        self.cursor.bump_while(|c| c.is_ascii_digit());
        self.number_exponent(TokenKind::DecimalLiteral)
    }

    fn number_exponent(&mut self, without: TokenKind) -> TokenKind {
        if !matches!(self.cursor.peek(), Some('e' | 'E')) {
            return without;
        }
        // Only commit to the exponent when digits actually follow.
        let saved = self.cursor.save();
        self.cursor.bump();
        if matches!(self.cursor.peek(), Some('+' | '-')) {
            self.cursor.bump();
        }
        if self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.bump_while(|c| c.is_ascii_digit());
            TokenKind::DoubleLiteral
        } else {
            self.cursor.restore(saved);
            without
        }
    }

    fn ncname(&mut self) -> TokenKind {
        let start = self.cursor.save();
        self.cursor.bump();
        self.cursor.bump_while(is_ncname_char);
        let end = self.cursor.save();
        let text = &self.cursor.source()[start..end];
        keyword(text).unwrap_or(TokenKind::NCName)
    }

    /// `(:` seen. Doc comments (`(:~`) tokenize their structure; plain
    /// comments, nesting included, lex as one `Comment` token.
    fn comment_token(&mut self) -> TokenKind {
        self.cursor.bump(); // (
        self.cursor.bump(); // :
        if self.cursor.peek() == Some('~') {
            self.state.push(Mode::DocStart);
            self.state.set_comment_depth(1);
            return TokenKind::CommentStart;
        }
        let mut depth = 1u32;
        while let Some(c) = self.cursor.peek() {
            if c == '(' && self.cursor.peek_second() == Some(':') {
                self.cursor.bump();
                self.cursor.bump();
                depth += 1;
            } else if c == ':' && self.cursor.peek_second() == Some(')') {
                self.cursor.bump();
                self.cursor.bump();
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else {
                self.cursor.bump();
            }
        }
        TokenKind::Comment
    }

    // --- Doc-comment modes (after `(:~`) ---

    fn doc_start_token(&mut self) -> TokenKind {
        debug_assert_eq!(self.cursor.peek(), Some('~'));
        self.cursor.bump();
        self.state.replace(Mode::DocTrim);
        TokenKind::DocCommentMarker
    }

    fn doc_trim_token(&mut self) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        match c {
            ' ' | '\t' => {
                self.cursor.bump_while(|c| c == ' ' || c == '\t');
                TokenKind::Whitespace
            }
            '\r' | '\n' => {
                self.cursor.bump();
                if c == '\r' {
                    self.cursor.eat('\n');
                }
                self.cursor.bump_while(|c| c == ' ' || c == '\t');
                // The `:` gutter, but never the `:)` terminator.
                if self.cursor.peek() == Some(':') && self.cursor.peek_second() != Some(')') {
                    self.cursor.bump();
                }
                TokenKind::DocTrim
            }
            '@' => {
                self.cursor.bump();
                self.state.replace(Mode::DocTag);
                TokenKind::DocTagMarker
            }
            _ => {
                self.state.replace(Mode::DocContents);
                self.doc_contents_token()
            }
        }
    }

    fn doc_contents_token(&mut self) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        if matches!(c, '\r' | '\n') {
            self.state.replace(Mode::DocTrim);
            return self.doc_trim_token();
        }
        if c == '(' && self.cursor.peek_second() == Some(':') {
            self.cursor.bump();
            self.cursor.bump();
            self.state
                .set_comment_depth(self.state.comment_depth().saturating_add(1));
            return TokenKind::DocContents;
        }
        if c == ':' && self.cursor.peek_second() == Some(')') {
            self.cursor.bump();
            self.cursor.bump();
            let depth = self.state.comment_depth().saturating_sub(1);
            self.state.set_comment_depth(depth);
            if depth == 0 {
                self.state.pop();
                return TokenKind::CommentEnd;
            }
            return TokenKind::DocContents;
        }
        // Plain contents run up to a line break or a nesting boundary.
        loop {
            match self.cursor.peek() {
                None | Some('\r' | '\n') => break,
                Some('(') if self.cursor.peek_second() == Some(':') => break,
                Some(':') if self.cursor.peek_second() == Some(')') => break,
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
        TokenKind::DocContents
    }

    fn doc_tag_token(&mut self) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        if !c.is_ascii_alphanumeric() {
            self.state.replace(Mode::DocContents);
            return self.doc_contents_token();
        }
        let start = self.cursor.save();
        self.cursor.bump_while(|c| c.is_ascii_alphanumeric());
        let end = self.cursor.save();
        let next = if &self.cursor.source()[start..end] == "param" {
            Mode::DocParamVar
        } else {
            Mode::DocContents
        };
        self.state.replace(next);
        TokenKind::DocTag
    }

    fn doc_param_var_token(&mut self) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        match c {
            ' ' | '\t' => {
                self.cursor.bump_while(|c| c == ' ' || c == '\t');
                TokenKind::Whitespace
            }
            '$' => {
                self.cursor.bump();
                self.state.replace(Mode::DocParamName);
                TokenKind::DocVariableIndicator
            }
            _ => {
                self.state.replace(Mode::DocContents);
                self.doc_contents_token()
            }
        }
    }

    fn doc_param_name_token(&mut self) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        if is_ncname_start(c) {
            self.cursor.bump();
            self.cursor.bump_while(is_ncname_char);
            self.state.replace(Mode::DocContents);
            TokenKind::NCName
        } else {
            self.state.replace(Mode::DocContents);
            self.doc_contents_token()
        }
    }

    // --- XML constructor modes ---

    fn xml_tag_token(&mut self) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        match c {
            c if is_xml_whitespace(c) => {
                self.cursor.bump_while(is_xml_whitespace);
                TokenKind::Whitespace
            }
            c if is_ncname_start(c) => {
                self.cursor.bump();
                self.cursor.bump_while(is_ncname_char);
                TokenKind::NCName
            }
            ':' => self.single(TokenKind::Colon),
            '=' => self.single(TokenKind::Equals),
            '"' => {
                self.cursor.bump();
                self.state.push(Mode::XmlAttrQuot);
                TokenKind::Quote
            }
            '\'' => {
                self.cursor.bump();
                self.state.push(Mode::XmlAttrApos);
                TokenKind::Apos
            }
            '>' => {
                self.cursor.bump();
                if self.state.mode() == Mode::XmlTag {
                    self.state.replace(Mode::XmlContent);
                } else {
                    self.state.pop();
                }
                TokenKind::TagClose
            }
            '/' if self.cursor.peek_second() == Some('>') => {
                self.cursor.bump();
                self.cursor.bump();
                self.state.pop();
                TokenKind::SelfCloseTagClose
            }
            _ => {
                self.cursor.bump();
                TokenKind::BadCharacter
            }
        }
    }

    fn xml_content_token(&mut self) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        match c {
            '<' => {
                self.cursor.bump();
                match self.cursor.peek() {
                    Some('/') => {
                        self.cursor.bump();
                        self.state.replace(Mode::XmlCloseTag);
                        TokenKind::CloseTagOpen
                    }
                    Some('!') if self.cursor.peek_second() == Some('-') => self.xml_comment(),
                    Some('?') => self.xml_pi(),
                    _ => {
                        self.state.push(Mode::XmlTag);
                        TokenKind::TagOpen
                    }
                }
            }
            '&' => self.entity_reference(),
            '{' => {
                self.cursor.bump();
                if self.cursor.eat('{') {
                    TokenKind::EscapedBrace
                } else {
                    self.state.push(Mode::Default);
                    TokenKind::BraceOpen
                }
            }
            '}' => {
                self.cursor.bump();
                if self.cursor.eat('}') {
                    TokenKind::EscapedBrace
                } else {
                    TokenKind::BraceClose
                }
            }
            _ => {
                self.cursor
                    .bump_while(|c| !matches!(c, '<' | '&' | '{' | '}'));
                TokenKind::ElemContents
            }
        }
    }

    fn xml_attr_token(&mut self, quote: char) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        if c == quote {
            self.cursor.bump();
            if self.cursor.peek() == Some(quote) {
                // XML escape: `""` inside a quoted value.
                self.cursor.bump();
                return TokenKind::AttrContents;
            }
            self.state.pop();
            return if quote == '"' {
                TokenKind::Quote
            } else {
                TokenKind::Apos
            };
        }
        match c {
            '&' => self.entity_reference(),
            '{' => {
                self.cursor.bump();
                if self.cursor.eat('{') {
                    TokenKind::EscapedBrace
                } else {
                    self.state.push(Mode::Default);
                    TokenKind::BraceOpen
                }
            }
            '}' => {
                self.cursor.bump();
                if self.cursor.eat('}') {
                    TokenKind::EscapedBrace
                } else {
                    TokenKind::BraceClose
                }
            }
            '<' => self.single(TokenKind::BadCharacter),
            _ => {
                self.cursor
                    .bump_while(|c| !matches!(c, '&' | '{' | '}' | '<') && c != quote);
                TokenKind::AttrContents
            }
        }
    }

    // --- Attribute value template mode (XSLT) ---

    fn avt_token(&mut self) -> TokenKind {
        let c = self.cursor.peek().expect("checked non-eof");
        match c {
            '{' => {
                self.cursor.bump();
                if self.cursor.eat('{') {
                    TokenKind::EscapedBrace
                } else {
                    self.state.push(Mode::Default);
                    TokenKind::BraceOpen
                }
            }
            '}' => {
                self.cursor.bump();
                if self.cursor.eat('}') {
                    TokenKind::EscapedBrace
                } else {
                    TokenKind::BraceClose
                }
            }
            _ => {
                self.cursor.bump_while(|c| !matches!(c, '{' | '}'));
                TokenKind::AvtContents
            }
        }
    }

    /// XML PredefinedEntityRef and CharRef; partial references lex as
    /// `BadCharacter` without consuming past what was recognized.
    fn entity_reference(&mut self) -> TokenKind {
        self.cursor.bump(); // &
        match self.cursor.peek() {
            Some('#') => {
                self.cursor.bump();
                let hex = self.cursor.eat('x');
                let digits = self.cursor.save();
                self.cursor.bump_while(|c| {
                    if hex {
                        c.is_ascii_hexdigit()
                    } else {
                        c.is_ascii_digit()
                    }
                });
                let has_digits = self.cursor.save() > digits;
                if has_digits && self.cursor.eat(';') {
                    TokenKind::CharRef
                } else {
                    TokenKind::BadCharacter
                }
            }
            Some(c) if is_ncname_start(c) => {
                self.cursor.bump_while(is_ncname_char);
                if self.cursor.eat(';') {
                    TokenKind::EntityRef
                } else {
                    TokenKind::BadCharacter
                }
            }
            _ => TokenKind::BadCharacter,
        }
    }
}

/// Tokenizes a whole source buffer in Default mode.
pub fn lex(source: &str) -> Vec<Token> {
    collect(Lexer::new(source))
}

/// Tokenizes an XSLT attribute value template.
pub fn lex_avt(source: &str) -> Vec<Token> {
    collect(Lexer::new_avt(source))
}

fn collect(mut lexer: Lexer<'_>) -> Vec<Token> {
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

// --- Character classes (XML 1.0 NCName, surrogate-free by construction) ---

pub(crate) fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

pub(crate) fn is_ncname_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

pub(crate) fn is_ncname_char(c: char) -> bool {
    is_ncname_start(c) || c.is_ascii_digit() || matches!(c, '-' | '.' | '\u{B7}')
}

fn is_unrecognized(c: char) -> bool {
    !(is_xml_whitespace(c)
        || is_ncname_start(c)
        || c.is_ascii_digit()
        || matches!(
            c,
            '(' | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | ','
                | ';'
                | '$'
                | '%'
                | '@'
                | '#'
                | '?'
                | '+'
                | '-'
                | '*'
                | '.'
                | '/'
                | '!'
                | '|'
                | '='
                | '<'
                | '>'
                | ':'
                | '"'
                | '\''
        ))
}
