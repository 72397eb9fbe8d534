use indoc::indoc;

use super::*;

fn dump(tokens: &[Token], source: &str) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(token.kind.name());
        out.push(' ');
        out.push_str(&format!("{:?}\n", token_text(source, token)));
    }
    out
}

fn dump_lex(source: &str) -> String {
    dump(&lex(source), source)
}

#[test]
fn keywords_names_and_numbers() {
    insta::assert_snapshot!(dump_lex("for $x in (1, 2.5, 3e0) return $x"), @r#"
    KwFor "for"
    Whitespace " "
    Dollar "$"
    NCName "x"
    Whitespace " "
    KwIn "in"
    Whitespace " "
    ParenOpen "("
    IntegerLiteral "1"
    Comma ","
    Whitespace " "
    DecimalLiteral "2.5"
    Comma ","
    Whitespace " "
    DoubleLiteral "3e0"
    ParenClose ")"
    Whitespace " "
    KwReturn "return"
    Whitespace " "
    Dollar "$"
    NCName "x"
    "#);
}

#[test]
fn leading_dot_decimal_and_bare_exponent() {
    // `1e` has no exponent digits, so the `e` stays a separate name.
    insta::assert_snapshot!(dump_lex(".5 1e .25E-2"), @r#"
    DecimalLiteral ".5"
    Whitespace " "
    IntegerLiteral "1"
    NCName "e"
    Whitespace " "
    DoubleLiteral ".25E-2"
    "#);
}

#[test]
fn multi_char_operators() {
    insta::assert_snapshot!(dump_lex("a << b >> c != d => e || f := g"), @r#"
    NCName "a"
    Whitespace " "
    NodeBefore "<<"
    Whitespace " "
    NCName "b"
    Whitespace " "
    NodeAfter ">>"
    Whitespace " "
    NCName "c"
    Whitespace " "
    NotEquals "!="
    Whitespace " "
    NCName "d"
    Whitespace " "
    Arrow "=>"
    Whitespace " "
    NCName "e"
    Whitespace " "
    PipePipe "||"
    Whitespace " "
    NCName "f"
    Whitespace " "
    ColonEquals ":="
    Whitespace " "
    NCName "g"
    "#);
}

#[test]
fn string_literals_with_doubled_quotes() {
    insta::assert_snapshot!(dump_lex(r#""he said ""hi""" 'don''t'"#), @r#"
    StringLiteral "\"he said \"\"hi\"\"\""
    Whitespace " "
    StringLiteral "'don''t'"
    "#);
}

#[test]
fn unterminated_string_spans_to_eof() {
    let tokens = lex(r#"1 + "oops"#);
    let last = tokens.last().unwrap();
    assert_eq!(last.kind, TokenKind::StringLiteral);
    assert_eq!(usize::from(last.range.end()), r#"1 + "oops"#.len());
}

#[test]
fn nested_comment_is_one_token() {
    insta::assert_snapshot!(dump_lex("1 (: a (: b :) c :) 2"), @r#"
    IntegerLiteral "1"
    Whitespace " "
    Comment "(: a (: b :) c :)"
    Whitespace " "
    IntegerLiteral "2"
    "#);
}

#[test]
fn unterminated_comment_spans_to_eof() {
    insta::assert_snapshot!(dump_lex("1 (: no close"), @r#"
    IntegerLiteral "1"
    Whitespace " "
    Comment "(: no close"
    "#);
}

#[test]
fn doc_comment_fragments() {
    let source = indoc! {"
        (:~ Square.
         : @param $n the number
         :)"};
    insta::assert_snapshot!(dump_lex(source), @r#"
    CommentStart "(:"
    DocCommentMarker "~"
    Whitespace " "
    DocContents "Square."
    DocTrim "\n :"
    Whitespace " "
    DocTagMarker "@"
    DocTag "param"
    Whitespace " "
    DocVariableIndicator "$"
    NCName "n"
    DocContents " the number"
    DocTrim "\n "
    CommentEnd ":)"
    "#);
}

#[test]
fn direct_element_with_enclosed_attr_expr() {
    insta::assert_snapshot!(dump_lex(r#"<a b="c{$d}"/>"#), @r#"
    TagOpen "<"
    NCName "a"
    Whitespace " "
    NCName "b"
    Equals "="
    Quote "\""
    AttrContents "c"
    BraceOpen "{"
    Dollar "$"
    NCName "d"
    BraceClose "}"
    Quote "\""
    SelfCloseTagClose "/>"
    "#);
}

#[test]
fn element_content_with_entity_and_enclosed_expr() {
    insta::assert_snapshot!(dump_lex("<a>x{1}&lt;</a>"), @r#"
    TagOpen "<"
    NCName "a"
    TagClose ">"
    ElemContents "x"
    BraceOpen "{"
    IntegerLiteral "1"
    BraceClose "}"
    EntityRef "&lt;"
    CloseTagOpen "</"
    NCName "a"
    TagClose ">"
    "#);
}

#[test]
fn char_refs_and_partial_entity() {
    insta::assert_snapshot!(dump_lex("<a>&#10;&#x0A;&bad</a>"), @r#"
    TagOpen "<"
    NCName "a"
    TagClose ">"
    CharRef "&#10;"
    CharRef "&#x0A;"
    BadCharacter "&bad"
    CloseTagOpen "</"
    NCName "a"
    TagClose ">"
    "#);
}

#[test]
fn attribute_value_template() {
    let source = "a{{b}}{1 idiv 2}c";
    insta::assert_snapshot!(dump(&lex_avt(source), source), @r#"
    AvtContents "a"
    EscapedBrace "{{"
    AvtContents "b"
    EscapedBrace "}}"
    BraceOpen "{"
    IntegerLiteral "1"
    Whitespace " "
    KwIdiv "idiv"
    Whitespace " "
    IntegerLiteral "2"
    BraceClose "}"
    AvtContents "c"
    "#);
}

#[test]
fn bad_characters_coalesce() {
    insta::assert_snapshot!(dump_lex("1 \u{0001}\u{0002}\u{0003} 2"), @r#"
    IntegerLiteral "1"
    Whitespace " "
    BadCharacter "\u{1}\u{2}\u{3}"
    Whitespace " "
    IntegerLiteral "2"
    "#);
}

#[test]
fn less_than_without_name_is_an_operator() {
    insta::assert_snapshot!(dump_lex("a < 1"), @r#"
    NCName "a"
    Whitespace " "
    LessThan "<"
    Whitespace " "
    IntegerLiteral "1"
    "#);
}

#[test]
fn suppress_tag_forces_operator_reading() {
    let source = "a <b";
    let mut lexer = Lexer::new(source);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::NCName);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Whitespace);
    lexer.set_suppress_tag();
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::LessThan);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::NCName);

    // Greedy reading of the same input opens a tag.
    let kinds: Vec<_> = lex(source).iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        [TokenKind::NCName, TokenKind::Whitespace, TokenKind::TagOpen, TokenKind::NCName]
    );
}

const COVERAGE_SOURCES: &[&str] = &[
    "",
    "for $x in 1 to 10 return $x * 2",
    r#"<out count="{count(//item)}">{ //item/name }</out>"#,
    "(:~ doc\n : @param $x y\n :)\ndeclare function local:f($x) { $x };",
    "1 + \u{0001}\u{0002} (: unterminated",
    "\"unterminated string",
    "<a><b c='d{1}'/></a>",
];

/// Tokens tile the source exactly: no gaps, no overlap, full coverage.
#[test]
fn tokens_cover_the_source() {
    for source in COVERAGE_SOURCES {
        let tokens = lex(source);
        let mut expected = 0usize;
        for token in &tokens {
            assert_eq!(usize::from(token.range.start()), expected, "gap in {source:?}");
            assert!(!token.range.is_empty(), "empty token in {source:?}");
            expected = token.range.end().into();
        }
        assert_eq!(expected, source.len(), "short coverage of {source:?}");
    }
}

/// Resuming from any captured `(offset, state)` checkpoint reproduces
/// the exact remaining token sequence.
#[test]
fn resume_reproduces_the_suffix() {
    for source in COVERAGE_SOURCES {
        let mut lexer = Lexer::new(source);
        let mut checkpoints = vec![(lexer.offset(), lexer.state())];
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token() {
            tokens.push(token);
            checkpoints.push((lexer.offset(), lexer.state()));
        }
        for (i, (offset, state)) in checkpoints.into_iter().enumerate() {
            let mut resumed = Lexer::resume(source, offset, state);
            let mut suffix = Vec::new();
            while let Some(token) = resumed.next_token() {
                suffix.push(token);
            }
            assert_eq!(suffix, tokens[i..], "resume at token {i} of {source:?}");
        }
    }
}
