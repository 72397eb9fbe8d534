//! Token kinds, the keyword table, and `TokenSet`.
//!
//! One closed enum covers every lexical shape the mode lexer can emit:
//! core expression tokens, XML constructor fragments, doc-comment
//! fragments, and the error kinds. XQuery keywords are not reserved, so
//! every `Kw*` token doubles as an NCName where the grammar expects a
//! name.

use text_size::TextRange;

/// Zero-copy token: kind plus byte range. Text is sliced from the
/// source with [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, range: TextRange) -> Self {
        Self { kind, range }
    }
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[std::ops::Range::<usize>::from(token.range)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum TokenKind {
    // --- Punctuation and operators ---
    ParenOpen = 0,
    ParenClose,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Comma,
    Semicolon,
    Dollar,
    Percent,
    At,
    Dot,
    DotDot,
    Slash,
    SlashSlash,
    Plus,
    Minus,
    Star,
    QuestionMark,
    Bang,
    Pipe,
    PipePipe,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    NodeBefore,
    GreaterThan,
    GreaterThanOrEquals,
    NodeAfter,
    Colon,
    ColonColon,
    ColonEquals,
    Arrow,
    Hash,

    // --- Names and literals ---
    NCName,
    IntegerLiteral,
    DecimalLiteral,
    DoubleLiteral,
    /// Whole string literal including delimiters and doubled-quote
    /// escapes; unterminated strings span to end of input.
    StringLiteral,

    // --- Trivia ---
    Whitespace,
    /// A complete `(: ... :)` comment, nesting included; unterminated
    /// comments span to end of input.
    Comment,

    // --- Doc-comment fragments (trivia) ---
    /// `(:` opening a doc comment.
    CommentStart,
    /// `:)` closing a doc comment.
    CommentEnd,
    /// The `~` marker after `(:`.
    DocCommentMarker,
    /// A run of plain doc-comment content.
    DocContents,
    /// `@` starting a tagged line.
    DocTagMarker,
    /// Tag name after `@` (`param`, `return`, `author`, ...).
    DocTag,
    /// `$` before a `@param` variable name.
    DocVariableIndicator,
    /// Line break plus the trimmed gutter (` * ` style leading `:`).
    DocTrim,

    // --- XML constructor fragments ---
    /// `<` opening a direct element constructor.
    TagOpen,
    /// `</`.
    CloseTagOpen,
    /// `>` ending an open or close tag.
    TagClose,
    /// `/>`.
    SelfCloseTagClose,
    /// `"` or `'` attribute value delimiter.
    Quote,
    Apos,
    /// Literal run inside an attribute value.
    AttrContents,
    /// Character data run inside element content.
    ElemContents,
    /// `&name;` predefined entity reference.
    EntityRef,
    /// `&#10;` / `&#x0A;` character reference.
    CharRef,
    /// `{{` or `}}` in attribute values, element content, or AVTs.
    EscapedBrace,
    /// A complete `<!-- ... -->` constructor.
    XmlComment,
    /// A complete `<? ... ?>` constructor.
    XmlPi,
    /// Literal text run in an attribute value template.
    AvtContents,

    // --- Errors ---
    /// Coalesced run of unrecognized code points. Never aborts the lex.
    BadCharacter,
    /// Synthesized at end of input; never stored in the token vector.
    Eof,

    // --- Keywords (contiguous block, see `is_keyword`) ---
    KwAllowing,
    KwAncestor,
    KwAncestorOrSelf,
    KwAnd,
    KwArray,
    KwAs,
    KwAscending,
    KwAt,
    KwAttribute,
    KwBy,
    KwCase,
    KwCast,
    KwCastable,
    KwCatch,
    KwChild,
    KwCollation,
    KwComment,
    KwContext,
    KwCount,
    KwDeclare,
    KwDefault,
    KwDescendant,
    KwDescendantOrSelf,
    KwDescending,
    KwDiv,
    KwDocument,
    KwDocumentNode,
    KwElement,
    KwElse,
    KwEmpty,
    KwEmptySequence,
    KwEncoding,
    KwEq,
    KwEvery,
    KwExcept,
    KwExternal,
    KwFollowing,
    KwFollowingSibling,
    KwFor,
    KwFunction,
    KwGe,
    KwGreatest,
    KwGt,
    KwIdiv,
    KwIf,
    KwImport,
    KwIn,
    KwInstance,
    KwIntersect,
    KwIs,
    KwItem,
    KwLe,
    KwLeast,
    KwLet,
    KwLt,
    KwMap,
    KwMod,
    KwModule,
    KwNamespace,
    KwNamespaceNode,
    KwNe,
    KwNode,
    KwOf,
    KwOption,
    KwOr,
    KwOrder,
    KwParent,
    KwPreceding,
    KwPrecedingSibling,
    KwProcessingInstruction,
    KwReturn,
    KwSatisfies,
    KwSchema,
    KwSchemaAttribute,
    KwSchemaElement,
    KwSelf,
    KwSome,
    KwStable,
    KwSwitch,
    KwText,
    KwThen,
    KwTo,
    KwTreat,
    KwTry,
    KwTuple,
    KwTypeswitch,
    KwUnion,
    KwVariable,
    KwVersion,
    KwWhere,
    KwXQuery,

    #[doc(hidden)]
    __LAST,
}

use TokenKind::*;

impl TokenKind {
    /// Trivia never participates in the grammar; the parser buffers it
    /// and attaches it at node boundaries.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Whitespace
                | Comment
                | CommentStart
                | CommentEnd
                | DocCommentMarker
                | DocContents
                | DocTagMarker
                | DocTag
                | DocVariableIndicator
                | DocTrim
        )
    }

    #[inline]
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (KwAllowing as u16) && (self as u16) < (__LAST as u16)
    }

    /// Keywords are not reserved: anywhere the grammar expects an
    /// NCName, a keyword token qualifies.
    #[inline]
    pub fn is_ncname(self) -> bool {
        self == NCName || self.is_keyword()
    }

    /// Display name used by the tree dump and token listings.
    pub fn name(self) -> &'static str {
        match self {
            ParenOpen => "ParenOpen",
            ParenClose => "ParenClose",
            BracketOpen => "BracketOpen",
            BracketClose => "BracketClose",
            BraceOpen => "BraceOpen",
            BraceClose => "BraceClose",
            Comma => "Comma",
            Semicolon => "Semicolon",
            Dollar => "Dollar",
            Percent => "Percent",
            At => "At",
            Dot => "Dot",
            DotDot => "DotDot",
            Slash => "Slash",
            SlashSlash => "SlashSlash",
            Plus => "Plus",
            Minus => "Minus",
            Star => "Star",
            QuestionMark => "QuestionMark",
            Bang => "Bang",
            Pipe => "Pipe",
            PipePipe => "PipePipe",
            Equals => "Equals",
            NotEquals => "NotEquals",
            LessThan => "LessThan",
            LessThanOrEquals => "LessThanOrEquals",
            NodeBefore => "NodeBefore",
            GreaterThan => "GreaterThan",
            GreaterThanOrEquals => "GreaterThanOrEquals",
            NodeAfter => "NodeAfter",
            Colon => "Colon",
            ColonColon => "ColonColon",
            ColonEquals => "ColonEquals",
            Arrow => "Arrow",
            Hash => "Hash",
            NCName => "NCName",
            IntegerLiteral => "IntegerLiteral",
            DecimalLiteral => "DecimalLiteral",
            DoubleLiteral => "DoubleLiteral",
            StringLiteral => "StringLiteral",
            Whitespace => "Whitespace",
            Comment => "Comment",
            CommentStart => "CommentStart",
            CommentEnd => "CommentEnd",
            DocCommentMarker => "DocCommentMarker",
            DocContents => "DocContents",
            DocTagMarker => "DocTagMarker",
            DocTag => "DocTag",
            DocVariableIndicator => "DocVariableIndicator",
            DocTrim => "DocTrim",
            TagOpen => "TagOpen",
            CloseTagOpen => "CloseTagOpen",
            TagClose => "TagClose",
            SelfCloseTagClose => "SelfCloseTagClose",
            Quote => "Quote",
            Apos => "Apos",
            AttrContents => "AttrContents",
            ElemContents => "ElemContents",
            EntityRef => "EntityRef",
            CharRef => "CharRef",
            EscapedBrace => "EscapedBrace",
            XmlComment => "XmlComment",
            XmlPi => "XmlPi",
            AvtContents => "AvtContents",
            BadCharacter => "BadCharacter",
            Eof => "Eof",
            KwAllowing => "KwAllowing",
            KwAncestor => "KwAncestor",
            KwAncestorOrSelf => "KwAncestorOrSelf",
            KwAnd => "KwAnd",
            KwArray => "KwArray",
            KwAs => "KwAs",
            KwAscending => "KwAscending",
            KwAt => "KwAt",
            KwAttribute => "KwAttribute",
            KwBy => "KwBy",
            KwCase => "KwCase",
            KwCast => "KwCast",
            KwCastable => "KwCastable",
            KwCatch => "KwCatch",
            KwChild => "KwChild",
            KwCollation => "KwCollation",
            KwComment => "KwComment",
            KwContext => "KwContext",
            KwCount => "KwCount",
            KwDeclare => "KwDeclare",
            KwDefault => "KwDefault",
            KwDescendant => "KwDescendant",
            KwDescendantOrSelf => "KwDescendantOrSelf",
            KwDescending => "KwDescending",
            KwDiv => "KwDiv",
            KwDocument => "KwDocument",
            KwDocumentNode => "KwDocumentNode",
            KwElement => "KwElement",
            KwElse => "KwElse",
            KwEmpty => "KwEmpty",
            KwEmptySequence => "KwEmptySequence",
            KwEncoding => "KwEncoding",
            KwEq => "KwEq",
            KwEvery => "KwEvery",
            KwExcept => "KwExcept",
            KwExternal => "KwExternal",
            KwFollowing => "KwFollowing",
            KwFollowingSibling => "KwFollowingSibling",
            KwFor => "KwFor",
            KwFunction => "KwFunction",
            KwGe => "KwGe",
            KwGreatest => "KwGreatest",
            KwGt => "KwGt",
            KwIdiv => "KwIdiv",
            KwIf => "KwIf",
            KwImport => "KwImport",
            KwIn => "KwIn",
            KwInstance => "KwInstance",
            KwIntersect => "KwIntersect",
            KwIs => "KwIs",
            KwItem => "KwItem",
            KwLe => "KwLe",
            KwLeast => "KwLeast",
            KwLet => "KwLet",
            KwLt => "KwLt",
            KwMap => "KwMap",
            KwMod => "KwMod",
            KwModule => "KwModule",
            KwNamespace => "KwNamespace",
            KwNamespaceNode => "KwNamespaceNode",
            KwNe => "KwNe",
            KwNode => "KwNode",
            KwOf => "KwOf",
            KwOption => "KwOption",
            KwOr => "KwOr",
            KwOrder => "KwOrder",
            KwParent => "KwParent",
            KwPreceding => "KwPreceding",
            KwPrecedingSibling => "KwPrecedingSibling",
            KwProcessingInstruction => "KwProcessingInstruction",
            KwReturn => "KwReturn",
            KwSatisfies => "KwSatisfies",
            KwSchema => "KwSchema",
            KwSchemaAttribute => "KwSchemaAttribute",
            KwSchemaElement => "KwSchemaElement",
            KwSelf => "KwSelf",
            KwSome => "KwSome",
            KwStable => "KwStable",
            KwSwitch => "KwSwitch",
            KwText => "KwText",
            KwThen => "KwThen",
            KwTo => "KwTo",
            KwTreat => "KwTreat",
            KwTry => "KwTry",
            KwTuple => "KwTuple",
            KwTypeswitch => "KwTypeswitch",
            KwUnion => "KwUnion",
            KwVariable => "KwVariable",
            KwVersion => "KwVersion",
            KwWhere => "KwWhere",
            KwXQuery => "KwXQuery",
            __LAST => "__LAST",
        }
    }
}

/// Keyword lookup for a complete NCName. Case-sensitive, longest match
/// is guaranteed by the caller lexing the whole NCName first.
pub fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "allowing" => KwAllowing,
        "ancestor" => KwAncestor,
        "ancestor-or-self" => KwAncestorOrSelf,
        "and" => KwAnd,
        "array" => KwArray,
        "as" => KwAs,
        "ascending" => KwAscending,
        "at" => KwAt,
        "attribute" => KwAttribute,
        "by" => KwBy,
        "case" => KwCase,
        "cast" => KwCast,
        "castable" => KwCastable,
        "catch" => KwCatch,
        "child" => KwChild,
        "collation" => KwCollation,
        "comment" => KwComment,
        "context" => KwContext,
        "count" => KwCount,
        "declare" => KwDeclare,
        "default" => KwDefault,
        "descendant" => KwDescendant,
        "descendant-or-self" => KwDescendantOrSelf,
        "descending" => KwDescending,
        "div" => KwDiv,
        "document" => KwDocument,
        "document-node" => KwDocumentNode,
        "element" => KwElement,
        "else" => KwElse,
        "empty" => KwEmpty,
        "empty-sequence" => KwEmptySequence,
        "encoding" => KwEncoding,
        "eq" => KwEq,
        "every" => KwEvery,
        "except" => KwExcept,
        "external" => KwExternal,
        "following" => KwFollowing,
        "following-sibling" => KwFollowingSibling,
        "for" => KwFor,
        "function" => KwFunction,
        "ge" => KwGe,
        "greatest" => KwGreatest,
        "gt" => KwGt,
        "idiv" => KwIdiv,
        "if" => KwIf,
        "import" => KwImport,
        "in" => KwIn,
        "instance" => KwInstance,
        "intersect" => KwIntersect,
        "is" => KwIs,
        "item" => KwItem,
        "le" => KwLe,
        "least" => KwLeast,
        "let" => KwLet,
        "lt" => KwLt,
        "map" => KwMap,
        "mod" => KwMod,
        "module" => KwModule,
        "namespace" => KwNamespace,
        "namespace-node" => KwNamespaceNode,
        "ne" => KwNe,
        "node" => KwNode,
        "of" => KwOf,
        "option" => KwOption,
        "or" => KwOr,
        "order" => KwOrder,
        "parent" => KwParent,
        "preceding" => KwPreceding,
        "preceding-sibling" => KwPrecedingSibling,
        "processing-instruction" => KwProcessingInstruction,
        "return" => KwReturn,
        "satisfies" => KwSatisfies,
        "schema" => KwSchema,
        "schema-attribute" => KwSchemaAttribute,
        "schema-element" => KwSchemaElement,
        "self" => KwSelf,
        "some" => KwSome,
        "stable" => KwStable,
        "switch" => KwSwitch,
        "text" => KwText,
        "then" => KwThen,
        "to" => KwTo,
        "treat" => KwTreat,
        "try" => KwTry,
        "tuple" => KwTuple,
        "typeswitch" => KwTypeswitch,
        "union" => KwUnion,
        "variable" => KwVariable,
        "version" => KwVersion,
        "where" => KwWhere,
        "xquery" => KwXQuery,
        _ => return None,
    };
    Some(kind)
}

/// 256-bit set of `TokenKind`s for O(1) membership testing.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenSet([u64; 4]);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet([0; 4]);

    /// Every `Kw*` token. Keywords are not reserved, so name positions
    /// accept this whole set alongside `NCName`.
    pub const KEYWORDS: TokenSet = {
        let mut bits = [0u64; 4];
        let mut k = KwAllowing as u16;
        while k < __LAST as u16 {
            bits[(k / 64) as usize] |= 1 << (k % 64);
            k += 1;
        }
        TokenSet(bits)
    };

    pub const fn new(kinds: &[TokenKind]) -> Self {
        let mut bits = [0u64; 4];
        let mut i = 0;
        while i < kinds.len() {
            let kind = kinds[i] as u16;
            assert!(kind < 256, "TokenKind value exceeds TokenSet capacity");
            bits[(kind / 64) as usize] |= 1 << (kind % 64);
            i += 1;
        }
        TokenSet(bits)
    }

    #[inline]
    pub const fn contains(&self, kind: TokenKind) -> bool {
        let kind = kind as u16;
        self.0[(kind / 64) as usize] & (1 << (kind % 64)) != 0
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet([
            self.0[0] | other.0[0],
            self.0[1] | other.0[1],
            self.0[2] | other.0[2],
            self.0[3] | other.0[3],
        ])
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_set();
        let mut raw = 0u16;
        while raw < __LAST as u16 {
            let kind = KINDS_BY_DISCRIMINANT[raw as usize];
            if self.contains(kind) {
                list.entry(&kind);
            }
            raw += 1;
        }
        list.finish()
    }
}

// Lookup used only by TokenSet's Debug impl; keeps transmute out of the
// crate entirely.
const KINDS_BY_DISCRIMINANT: [TokenKind; __LAST as usize] = {
    let mut kinds = [ParenOpen; __LAST as usize];
    let mut i = 0;
    while i < ALL_KINDS.len() {
        kinds[ALL_KINDS[i] as usize] = ALL_KINDS[i];
        i += 1;
    }
    kinds
};

const ALL_KINDS: [TokenKind; __LAST as usize] = [
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    Comma,
    Semicolon,
    Dollar,
    Percent,
    At,
    Dot,
    DotDot,
    Slash,
    SlashSlash,
    Plus,
    Minus,
    Star,
    QuestionMark,
    Bang,
    Pipe,
    PipePipe,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    NodeBefore,
    GreaterThan,
    GreaterThanOrEquals,
    NodeAfter,
    Colon,
    ColonColon,
    ColonEquals,
    Arrow,
    Hash,
    NCName,
    IntegerLiteral,
    DecimalLiteral,
    DoubleLiteral,
    StringLiteral,
    Whitespace,
    Comment,
    CommentStart,
    CommentEnd,
    DocCommentMarker,
    DocContents,
    DocTagMarker,
    DocTag,
    DocVariableIndicator,
    DocTrim,
    TagOpen,
    CloseTagOpen,
    TagClose,
    SelfCloseTagClose,
    Quote,
    Apos,
    AttrContents,
    ElemContents,
    EntityRef,
    CharRef,
    EscapedBrace,
    XmlComment,
    XmlPi,
    AvtContents,
    BadCharacter,
    Eof,
    KwAllowing,
    KwAncestor,
    KwAncestorOrSelf,
    KwAnd,
    KwArray,
    KwAs,
    KwAscending,
    KwAt,
    KwAttribute,
    KwBy,
    KwCase,
    KwCast,
    KwCastable,
    KwCatch,
    KwChild,
    KwCollation,
    KwComment,
    KwContext,
    KwCount,
    KwDeclare,
    KwDefault,
    KwDescendant,
    KwDescendantOrSelf,
    KwDescending,
    KwDiv,
    KwDocument,
    KwDocumentNode,
    KwElement,
    KwElse,
    KwEmpty,
    KwEmptySequence,
    KwEncoding,
    KwEq,
    KwEvery,
    KwExcept,
    KwExternal,
    KwFollowing,
    KwFollowingSibling,
    KwFor,
    KwFunction,
    KwGe,
    KwGreatest,
    KwGt,
    KwIdiv,
    KwIf,
    KwImport,
    KwIn,
    KwInstance,
    KwIntersect,
    KwIs,
    KwItem,
    KwLe,
    KwLeast,
    KwLet,
    KwLt,
    KwMap,
    KwMod,
    KwModule,
    KwNamespace,
    KwNamespaceNode,
    KwNe,
    KwNode,
    KwOf,
    KwOption,
    KwOr,
    KwOrder,
    KwParent,
    KwPreceding,
    KwPrecedingSibling,
    KwProcessingInstruction,
    KwReturn,
    KwSatisfies,
    KwSchema,
    KwSchemaAttribute,
    KwSchemaElement,
    KwSelf,
    KwSome,
    KwStable,
    KwSwitch,
    KwText,
    KwThen,
    KwTo,
    KwTreat,
    KwTry,
    KwTuple,
    KwTypeswitch,
    KwUnion,
    KwVariable,
    KwVersion,
    KwWhere,
    KwXQuery,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_form_a_contiguous_block() {
        // `is_keyword` is a discriminant range check, so the Kw* block
        // must be exactly the tail of the enum.
        for kind in ALL_KINDS {
            assert_eq!(kind.is_keyword(), kind.name().starts_with("Kw"), "{kind:?}");
        }
    }

    #[test]
    fn hyphenated_keywords_resolve() {
        assert_eq!(keyword("document-node"), Some(KwDocumentNode));
        assert_eq!(keyword("empty-sequence"), Some(KwEmptySequence));
        assert_eq!(keyword("instance"), Some(KwInstance));
        assert_eq!(keyword("Instance"), None);
        assert_eq!(keyword("instanceof"), None);
    }

    #[test]
    fn token_set_membership_above_64() {
        const SET: TokenSet = TokenSet::new(&[KwCast, KwTreat, NCName]);
        assert!(SET.contains(KwCast));
        assert!(SET.contains(KwTreat));
        assert!(SET.contains(NCName));
        assert!(!SET.contains(KwAs));
        assert!(!SET.contains(ParenOpen));
    }
}
