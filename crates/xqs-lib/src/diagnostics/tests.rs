use text_size::{TextRange, TextSize};

use super::*;

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}

#[test]
fn fallback_and_custom_messages() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ExpectedExpression, range(0, 1))
        .emit();
    diagnostics
        .report(DiagnosticKind::MismatchedCloseTag, range(2, 5))
        .message("a")
        .emit();

    let records = diagnostics.to_records();
    assert_eq!(records[0].message, "expected an expression");
    assert_eq!(records[1].message, "expected `</a>`");
}

#[test]
fn containment_suppresses_cascades() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnclosedTag, range(0, 3))
        .suppression_range(range(0, 20))
        .emit();
    diagnostics
        .report(DiagnosticKind::UnexpectedToken, range(10, 12))
        .emit();
    diagnostics
        .report(DiagnosticKind::UnexpectedToken, range(15, 16))
        .emit();

    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics.to_records().len(), 1);
}

#[test]
fn root_cause_beats_structural_at_same_position() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnclosedParen, range(4, 5))
        .emit();
    diagnostics
        .report(DiagnosticKind::ExpectedExpression, range(4, 5))
        .emit();

    let records = diagnostics.to_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "expected an expression");
}

#[test]
fn renders_through_annotate_snippets() {
    let source = "1 + ";
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ExpectedExpression, range(4, 4))
        .emit();

    let rendered = diagnostics.render(source);
    assert!(rendered.contains("error"), "{rendered}");
    assert!(rendered.contains("expected an expression"), "{rendered}");
}

#[test]
fn conformance_findings_are_warnings() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnsupportedConstruct, range(0, 5))
        .message("Saxon PE 9.8 or later")
        .emit();

    assert!(!diagnostics.has_errors());
    assert!(diagnostics.has_warnings());
    let records = diagnostics.to_records();
    assert_eq!(records[0].message, "requires Saxon PE 9.8 or later");
}
