use serde::Serialize;
use text_size::TextRange;

/// Diagnostic kinds ordered by priority (highest priority first).
///
/// When two diagnostics have overlapping spans, the higher-priority one
/// suppresses the lower-priority one. This prevents cascading error
/// noise: an unclosed constructor produces dozens of downstream
/// unexpected-token errors that all share the same root cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // These cascade through the rest of the file
    UnclosedComment,
    UnclosedString,
    UnclosedTag,
    UnclosedParen,
    UnclosedBrace,
    UnclosedBracket,

    // User omitted something required - root cause errors
    ExpectedExpression,
    ExpectedName,
    ExpectedSequenceType,
    ExpectedAttributeValue,
    ExpectedCasePattern,
    ExpectedTagClose,

    // User wrote something that doesn't belong
    MismatchedCloseTag,
    QNameSeparatorWhitespace,
    PartialEntityRef,
    InvalidOccurrenceIndicator,
    UnexpectedToken,
    BadCharacter,

    // Valid syntax, wrong dialect
    UnsupportedConstruct,
}

impl DiagnosticKind {
    /// Default severity for this kind. Conformance findings are
    /// advisory; everything else is an error.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UnsupportedConstruct => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this kind suppresses `other` when spans overlap.
    ///
    /// Uses enum discriminant ordering: lower position = higher
    /// priority.
    pub fn suppresses(&self, other: &DiagnosticKind) -> bool {
        self < other
    }

    /// Unclosed delimiters and constructors. Suppressed by root-cause
    /// errors starting at the same position.
    pub fn is_structural_error(&self) -> bool {
        matches!(
            self,
            Self::UnclosedComment
                | Self::UnclosedString
                | Self::UnclosedTag
                | Self::UnclosedParen
                | Self::UnclosedBrace
                | Self::UnclosedBracket
        )
    }

    /// Root cause errors - user omitted something required.
    pub fn is_root_cause_error(&self) -> bool {
        matches!(
            self,
            Self::ExpectedExpression
                | Self::ExpectedName
                | Self::ExpectedSequenceType
                | Self::ExpectedAttributeValue
                | Self::ExpectedCasePattern
                | Self::ExpectedTagClose
        )
    }

    /// Base message for this kind, used when no custom message is
    /// provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::UnclosedComment => "unterminated comment",
            Self::UnclosedString => "unterminated string literal",
            Self::UnclosedTag => "unterminated element constructor",
            Self::UnclosedParen => "missing closing `)`",
            Self::UnclosedBrace => "missing closing `}`",
            Self::UnclosedBracket => "missing closing `]`",

            Self::ExpectedExpression => "expected an expression",
            Self::ExpectedName => "expected a name",
            Self::ExpectedSequenceType => "expected a sequence type",
            Self::ExpectedAttributeValue => "expected an attribute value",
            Self::ExpectedCasePattern => "expected a case pattern",
            Self::ExpectedTagClose => "expected `>` or `/>`",

            Self::MismatchedCloseTag => "close tag does not match open tag",
            Self::QNameSeparatorWhitespace => "whitespace is not allowed around `:` in a name",
            Self::PartialEntityRef => "incomplete entity reference",
            Self::InvalidOccurrenceIndicator => "invalid occurrence indicator",
            Self::UnexpectedToken => "unexpected token",
            Self::BadCharacter => "unrecognized character",

            Self::UnsupportedConstruct => "construct is not supported by the target dialect",
        }
    }

    /// Template for custom messages; `{}` is replaced by the
    /// caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::MismatchedCloseTag => "expected `</{}>`".to_string(),
            Self::UnsupportedConstruct => "requires {}".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub(crate) replacement: String,
    pub(crate) description: String,
}

impl Fix {
    pub fn new(replacement: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) range: TextRange,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    /// The range shown to the user (underlined in output).
    pub(crate) range: TextRange,
    /// The range used for suppression logic. Defaults to `range`; the
    /// parser widens it to the enclosing open delimiter so cascading
    /// errors inside an unclosed construct collapse to the root cause.
    pub(crate) suppression_range: TextRange,
    pub(crate) message: String,
    pub(crate) fix: Option<Fix>,
    pub(crate) related: Vec<RelatedInfo>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            suppression_range: range,
            message: message.into(),
            fix: None,
            related: Vec::new(),
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub(crate) fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub(crate) fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub(crate) fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        if let Some(fix) = &self.fix {
            write!(f, " (fix: {})", fix.description)?;
        }
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.range.start()),
                u32::from(related.range.end())
            )?;
        }
        Ok(())
    }
}

/// Serializable projection of a diagnostic for machine consumers.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub start: u32,
    pub end: u32,
    pub message: String,
}
