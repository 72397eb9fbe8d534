use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use indoc::indoc;
use text_size::TextRange;

use crate::tree::NodeKind;
use crate::{Error, Parse, ParseOptions, parse, parse_with};

fn check(source: &str) -> Parse {
    parse(source).unwrap()
}

fn dump(source: &str) -> String {
    check(source).tree.dump()
}

fn kinds(parse: &Parse) -> Vec<NodeKind> {
    let tree = &parse.tree;
    tree.descendants(tree.root())
        .filter_map(|id| tree.node_kind(id))
        .collect()
}

fn messages(parse: &Parse) -> Vec<String> {
    parse
        .diagnostics
        .to_records()
        .into_iter()
        .map(|r| r.message)
        .collect()
}

#[track_caller]
fn check_clean(source: &str) -> Parse {
    let parse = check(source);
    assert!(
        parse.diagnostics.is_empty(),
        "unexpected diagnostics for {source:?}:\n{}",
        parse.diagnostics.render(source)
    );
    parse
}

#[track_caller]
fn assert_has(parse: &Parse, kind: NodeKind) {
    assert!(
        kinds(parse).contains(&kind),
        "no {kind:?} in:\n{}",
        parse.tree.dump()
    );
}

#[test]
fn additive_expression() {
    insta::assert_snapshot!(dump("1 + 2"), @r#"
    Module@0..5
      QueryBody@0..5
        AdditiveExpr@0..5
          Literal@0..1
            IntegerLiteral@0..1 "1"
          Plus@2..3 "+"
          Literal@4..5
            IntegerLiteral@4..5 "2"
    "#);
}

#[test]
fn less_than_before_space_is_comparison() {
    insta::assert_snapshot!(dump("$x < 2"), @r#"
    Module@0..6
      QueryBody@0..6
        ComparisonExpr@0..6
          VarRef@0..2
            Dollar@0..1 "$"
            QName@1..2
              NCName@1..2 "x"
          LessThan@3..4 "<"
          Literal@5..6
            IntegerLiteral@5..6 "2"
    "#);
}

#[test]
fn less_than_before_name_relexes_as_comparison() {
    // The lexer greedily reads `<a` as a tag open; at operator position
    // the parser rewinds it into a plain `<`.
    let parse = check_clean("$x <a");
    insta::assert_snapshot!(parse.tree.dump(), @r#"
    Module@0..5
      QueryBody@0..5
        ComparisonExpr@0..5
          VarRef@0..2
            Dollar@0..1 "$"
            QName@1..2
              NCName@1..2 "x"
          LessThan@3..4 "<"
          AxisStep@4..5
            NameTest@4..5
              QName@4..5
                NCName@4..5 "a"
    "#);
}

#[test]
fn element_constructor_at_expression_start() {
    let parse = check_clean("<a/>");
    insta::assert_snapshot!(parse.tree.dump(), @r#"
    Module@0..4
      QueryBody@0..4
        DirElemConstructor@0..4
          TagOpen@0..1 "<"
          QName@1..2
            NCName@1..2 "a"
          SelfCloseTagClose@2..4 "/>"
    "#);
}

#[test]
fn cast_takes_a_single_type() {
    insta::assert_snapshot!(dump("2 cast as xs:integer"), @r#"
    Module@0..20
      QueryBody@0..20
        CastExpr@0..20
          Literal@0..1
            IntegerLiteral@0..1 "2"
          KwCast@2..6 "cast"
          KwAs@7..9 "as"
          SequenceType@10..20
            AtomicOrUnionType@10..20
              QName@10..20
                NCName@10..12 "xs"
                Colon@12..13 ":"
                NCName@13..20 "integer"
    "#);
}

#[test]
fn function_decl_missing_close_paren_recovers() {
    let source = "declare function f( {}";
    let parse = check(source);
    assert_eq!(
        messages(&parse),
        ["missing closing `)`", "expected `;`"],
        "{}",
        parse.diagnostics.render(source)
    );
    insta::assert_snapshot!(parse.tree.dump(), @r#"
    Module@0..22
      Prolog@0..22
        FunctionDecl@0..22
          KwDeclare@0..7 "declare"
          KwFunction@8..16 "function"
          QName@17..18
            NCName@17..18 "f"
          ParenOpen@18..19 "("
          Missing@19..19 (expected `)`)
          EnclosedExpr@20..22
            BraceOpen@20..21 "{"
            BraceClose@21..22 "}"
          Missing@22..22 (expected `;`)
    "#);
}

#[test]
fn whitespace_around_qname_colon_is_one_error() {
    for source in ["a :b", "a: b"] {
        let parse = check(source);
        let messages = messages(&parse);
        assert_eq!(messages.len(), 1, "{source:?}: {messages:?}");
        assert!(
            messages[0].contains("whitespace is not allowed"),
            "{source:?}: {messages:?}"
        );
        assert_has(&parse, NodeKind::QName);
    }
}

#[test]
fn detached_colon_stays_a_map_separator() {
    let parse = check_clean("map { a : 1 }");
    assert_has(&parse, NodeKind::MapConstructor);
    assert_has(&parse, NodeKind::MapConstructorEntry);
}

#[test]
fn flwor_clauses() {
    let parse = check_clean(
        "for $x allowing empty at $i in (3, 1, 2) \
         let $y := $x + 1 \
         where $y > 1 \
         stable order by $y descending empty least \
         count $c \
         return $i",
    );
    for kind in [
        NodeKind::FlworExpr,
        NodeKind::ForClause,
        NodeKind::ForBinding,
        NodeKind::AllowingEmpty,
        NodeKind::PositionalVar,
        NodeKind::LetClause,
        NodeKind::LetBinding,
        NodeKind::WhereClause,
        NodeKind::OrderByClause,
        NodeKind::OrderSpec,
        NodeKind::CountClause,
        NodeKind::ReturnClause,
    ] {
        assert_has(&parse, kind);
    }
}

#[test]
fn keyword_headed_expressions() {
    let cases: &[(&str, NodeKind)] = &[
        ("if (1) then 2 else 3", NodeKind::IfExpr),
        (
            "switch (1) case 1 case 2 return 10 default return 0",
            NodeKind::SwitchCaseClause,
        ),
        (
            "typeswitch ($x) case $y as xs:string return 1 default return 2",
            NodeKind::CaseClause,
        ),
        ("try { 1 } catch * { 2 }", NodeKind::TryCatchExpr),
        (
            "try { 1 } catch err:FOAR0001 | err:FOAR0002 { 0 }",
            NodeKind::CatchClause,
        ),
        ("some $x in (1, 2) satisfies $x > 1", NodeKind::QuantifiedExpr),
        ("every $x in (1, 2) satisfies $x > 0", NodeKind::QuantifiedBinding),
    ];
    for (source, kind) in cases {
        assert_has(&check_clean(source), *kind);
    }
}

#[test]
fn operator_expressions() {
    let cases: &[(&str, NodeKind)] = &[
        ("1 eq 1 and 2 le 3 or fn:not(4)", NodeKind::OrExpr),
        ("'a' || 'b'", NodeKind::StringConcatExpr),
        ("1 to 5", NodeKind::RangeExpr),
        ("6 idiv 2 mod 2", NodeKind::MultiplicativeExpr),
        ("$a union $b except $c", NodeKind::UnionExpr),
        ("$a intersect $b", NodeKind::IntersectExceptExpr),
        ("1 treat as xs:integer", NodeKind::TreatExpr),
        ("'1' castable as xs:integer", NodeKind::CastableExpr),
        ("-1", NodeKind::UnaryExpr),
        ("(1, 2) ! .", NodeKind::SimpleMapExpr),
        ("1 => f(2)", NodeKind::ArrowExpr),
    ];
    for (source, kind) in cases {
        assert_has(&check_clean(source), *kind);
    }
}

#[test]
fn paths_and_postfix_forms() {
    let cases: &[(&str, NodeKind)] = &[
        ("//x/y[1]", NodeKind::PathExpr),
        ("child::*[@id = '1']", NodeKind::AxisStep),
        ("ancestor-or-self::node()", NodeKind::AnyKindTest),
        ("ns:*", NodeKind::Wildcard),
        ("(1, 2)[. > 1]", NodeKind::Predicate),
        ("$m?key", NodeKind::Lookup),
        ("?*", NodeKind::Lookup),
        ("fn:exists(1)", NodeKind::FunctionCall),
        ("fn:exists#1", NodeKind::NamedFunctionRef),
    ];
    for (source, kind) in cases {
        assert_has(&check_clean(source), *kind);
    }
}

#[test]
fn direct_constructor_with_attributes_and_enclosed_exprs() {
    let parse = check_clean(r#"<a b="x{1}">text{$y}</a>"#);
    assert_has(&parse, NodeKind::DirElemConstructor);
    assert_has(&parse, NodeKind::DirAttribute);
    assert_has(&parse, NodeKind::DirAttributeValue);
    assert_has(&parse, NodeKind::EnclosedExpr);
}

#[test]
fn computed_constructors() {
    let cases: &[(&str, NodeKind)] = &[
        ("document { 1 }", NodeKind::CompDocConstructor),
        ("element foo { 1 }", NodeKind::CompElemConstructor),
        ("element { 'foo' } { 1 }", NodeKind::CompElemConstructor),
        ("attribute id { 1 }", NodeKind::CompAttrConstructor),
        ("text { 'x' }", NodeKind::CompTextConstructor),
        ("comment { 'x' }", NodeKind::CompCommentConstructor),
        ("processing-instruction target { 'x' }", NodeKind::CompPIConstructor),
    ];
    for (source, kind) in cases {
        assert_has(&check_clean(source), *kind);
    }
}

#[test]
fn inline_functions_and_containers() {
    let parse = check_clean("function ($x as xs:integer) as xs:integer { $x + 1 }");
    assert_has(&parse, NodeKind::InlineFunctionExpr);
    assert_has(&parse, NodeKind::ParamList);
    assert_has(&parse, NodeKind::TypeDeclaration);

    assert_has(&check_clean("[1, 2]"), NodeKind::SquareArrayConstructor);
    assert_has(&check_clean("array { 1, 2 }"), NodeKind::CurlyArrayConstructor);
}

#[test]
fn sequence_types() {
    let cases: &[(&str, NodeKind)] = &[
        ("1 instance of item()", NodeKind::AnyItemType),
        ("1 instance of map(*)", NodeKind::MapTest),
        ("1 instance of array(xs:integer)", NodeKind::ArrayTest),
        (
            "1 instance of function(xs:integer) as xs:integer",
            NodeKind::FunctionTest,
        ),
        ("() treat as empty-sequence()", NodeKind::EmptySequenceType),
        ("1 instance of element(foo, xs:untyped)", NodeKind::ElementTest),
        ("1 instance of tuple(a: xs:string, b?: xs:integer)", NodeKind::TupleField),
        ("1 instance of union(xs:date, xs:time)", NodeKind::UnionType),
    ];
    for (source, kind) in cases {
        assert_has(&check_clean(source), *kind);
    }
}

#[test]
fn occurrence_indicator_binds_to_the_type() {
    // The `*` belongs to the type; the detached `+` is additive.
    let parse = check_clean("1 instance of xs:integer* + 2");
    assert_has(&parse, NodeKind::InstanceofExpr);
    assert_has(&parse, NodeKind::AdditiveExpr);

    // Glued on, a second indicator is an error inside the type.
    let parse = check("1 instance of xs:integer*+");
    let messages = messages(&parse);
    assert_eq!(messages.len(), 1, "{messages:?}");
    assert!(messages[0].contains("occurrence indicator"), "{messages:?}");
}

#[test]
fn comparison_chains_are_rejected() {
    let parse = check("1 < 2 < 3");
    assert_eq!(messages(&parse), ["comparison operators cannot be chained"]);
    // Both operators still end up in the tree.
    let count = kinds(&parse)
        .iter()
        .filter(|k| **k == NodeKind::ComparisonExpr)
        .count();
    assert_eq!(count, 2);
}

#[test]
fn mismatched_close_tag_names_the_open_tag() {
    let parse = check("<a></b>");
    assert_eq!(messages(&parse), ["expected `</a>`"]);
    assert_has(&parse, NodeKind::DirElemConstructor);
}

#[test]
fn unterminated_element_reports_once() {
    let source = "<a>text";
    let parse = check(source);
    let records = parse.diagnostics.to_records();
    assert_eq!(records.len(), 1, "{}", parse.diagnostics.render(source));
    assert!(records[0].message.contains("unterminated element"));
}

#[test]
fn unclosed_paren_suppresses_the_cascade() {
    let parse = check("(1, 2");
    assert_eq!(messages(&parse), ["missing closing `)`"]);
    assert_has(&parse, NodeKind::SequenceExpr);
}

#[test]
fn library_module_with_prolog() {
    let source = indoc! {r#"
        xquery version "3.1";
        module namespace m = "urn:example";
        declare namespace x = "urn:x";
        declare variable $m:answer := 42;
        declare %private function m:double($n as xs:integer) as xs:integer { $n * 2 };
    "#};
    let parse = check_clean(source);
    for kind in [
        NodeKind::VersionDecl,
        NodeKind::ModuleDecl,
        NodeKind::Prolog,
        NodeKind::NamespaceDecl,
        NodeKind::VarDecl,
        NodeKind::Annotation,
        NodeKind::FunctionDecl,
        NodeKind::Param,
    ] {
        assert_has(&parse, kind);
    }
}

#[test]
fn main_module_prolog_then_body() {
    let source = indoc! {r#"
        import module namespace t = "urn:t" at "t.xq";
        declare default element namespace "urn:d";
        declare option o:opt "value";
        t:run(1)
    "#};
    let parse = check_clean(source);
    assert_has(&parse, NodeKind::ModuleImport);
    assert_has(&parse, NodeKind::DefaultNamespaceDecl);
    assert_has(&parse, NodeKind::OptionDecl);
    assert_has(&parse, NodeKind::QueryBody);
}

#[test]
fn malformed_inputs_still_cover_the_source() {
    let sources = [
        "",
        "   ",
        ")))",
        "let $x :=",
        "declare variable",
        "<a><b>",
        "1 +",
        "$",
        "1 2 3",
        "for $x in",
        r#"<a b=>"#,
        "(: unterminated",
    ];
    for source in sources {
        let parse = check(source);
        let tree = &parse.tree;
        let end = u32::try_from(source.len()).unwrap();
        assert_eq!(
            tree.range(tree.root()),
            TextRange::new(0.into(), end.into()),
            "root does not cover {source:?}"
        );
        let mut text = String::new();
        for id in tree.descendants(tree.root()) {
            if tree.token_kind(id).is_some() {
                text.push_str(tree.element_text(id));
            }
        }
        assert_eq!(text, source, "leaves do not tile {source:?}");
    }
}

#[test]
fn trailing_trivia_attaches_to_the_root() {
    let parse = check_clean("1 (: done :)");
    let tree = &parse.tree;
    assert_eq!(tree.range(tree.root()), TextRange::new(0.into(), 12.into()));

    // Trivia-only input parses to a bare module.
    let parse = check_clean("(: nothing here :)");
    let tree = &parse.tree;
    assert_eq!(tree.node_kind(tree.root()), Some(NodeKind::Module));
    assert_eq!(tree.range(tree.root()), TextRange::new(0.into(), 18.into()));
}

#[test]
fn cancellation_is_fatal() {
    let source = "1,".repeat(40) + "1";
    let options = ParseOptions {
        cancel: Some(Arc::new(AtomicBool::new(true))),
        recursion_limit: None,
    };
    assert_eq!(parse_with(&source, &options).unwrap_err(), Error::Cancelled);
}

#[test]
fn recursion_limit_is_fatal() {
    let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
    let options = ParseOptions {
        cancel: None,
        recursion_limit: Some(16),
    };
    assert_eq!(
        parse_with(&source, &options).unwrap_err(),
        Error::RecursionLimitExceeded
    );
}
