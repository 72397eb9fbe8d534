//! Grammar productions for XQuery 3.1 (hosting XPath) plus vendor
//! extensions, implemented as `parse_*` extensions of `Parser`.
//!
//! Layout mirrors the grammar: module/prolog structure, the expression
//! precedence chain, path steps, primaries, node constructors, and
//! sequence types. Names (QName assembly and its whitespace rules) are
//! shared by all of them.

mod constructors;
mod exprs;
mod module;
mod names;
mod paths;
mod primary;
mod types;

use crate::lexer::{TokenKind::*, TokenSet};

/// Names: `NCName` plus every keyword (keywords are not reserved).
pub(super) const NAME_FIRST: TokenSet = TokenSet::new(&[NCName]).union(TokenSet::KEYWORDS);

/// Tokens that can start an `ExprSingle`.
pub(super) const EXPR_FIRST: TokenSet = TokenSet::new(&[
    IntegerLiteral,
    DecimalLiteral,
    DoubleLiteral,
    StringLiteral,
    NCName,
    Dollar,
    Percent,
    ParenOpen,
    BracketOpen,
    Dot,
    DotDot,
    Slash,
    SlashSlash,
    At,
    Star,
    Minus,
    Plus,
    QuestionMark,
    TagOpen,
    XmlComment,
    XmlPi,
])
.union(TokenSet::KEYWORDS);

pub(super) const PROLOG_RECOVERY: TokenSet =
    TokenSet::new(&[Semicolon, KwDeclare, KwImport, Eof]);

/// Resynchronization points when an expression goes wrong: separators
/// and closing delimiters of every construct that can contain one.
pub(super) const EXPR_RECOVERY: TokenSet = TokenSet::new(&[
    Comma,
    Semicolon,
    ParenClose,
    BracketClose,
    BraceClose,
    KwReturn,
    KwSatisfies,
    KwThen,
    KwElse,
    KwCase,
    KwDefault,
    Eof,
]);

pub(super) const COMPARISON_OPS: TokenSet = TokenSet::new(&[
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    KwEq,
    KwNe,
    KwLt,
    KwLe,
    KwGt,
    KwGe,
    KwIs,
    NodeBefore,
    NodeAfter,
]);

pub(super) const FORWARD_AXES: TokenSet = TokenSet::new(&[
    KwChild,
    KwDescendant,
    KwAttribute,
    KwSelf,
    KwDescendantOrSelf,
    KwFollowingSibling,
    KwFollowing,
]);

pub(super) const REVERSE_AXES: TokenSet = TokenSet::new(&[
    KwParent,
    KwAncestor,
    KwPrecedingSibling,
    KwPreceding,
    KwAncestorOrSelf,
]);

/// Keywords that start a kind test when followed by `(`.
pub(super) const KIND_TEST_KEYWORDS: TokenSet = TokenSet::new(&[
    KwNode,
    KwText,
    KwComment,
    KwNamespaceNode,
    KwProcessingInstruction,
    KwDocumentNode,
    KwElement,
    KwAttribute,
    KwSchemaElement,
    KwSchemaAttribute,
]);
