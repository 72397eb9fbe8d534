//! Flat arena syntax tree.
//!
//! The tree is lossless: every token, trivia included, appears as a
//! leaf, so concatenating leaf texts in order reproduces the input
//! exactly. Elements live in one `Vec`, laid out breadth-first so each
//! node's children occupy a contiguous index range; parents are plain
//! indices and the whole tree frees in one step.
//!
//! The parser does not build the tree directly. It records a flat event
//! stream (start/finish/token/error) with rust-analyzer-style forward
//! parents for retroactive wrapping, and [`SyntaxTree::build`] replays
//! the events into the arena.

use text_size::{TextRange, TextSize};

use crate::lexer::{Token, TokenKind};

/// Production kinds of interior nodes. Closed set; vendor extensions
/// are ordinary variants checked by the conformance validator rather
/// than grammar branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum NodeKind {
    // Module structure
    Module,
    VersionDecl,
    ModuleDecl,
    Prolog,
    NamespaceDecl,
    DefaultNamespaceDecl,
    ModuleImport,
    SchemaImport,
    Annotation,
    VarDecl,
    FunctionDecl,
    ParamList,
    Param,
    OptionDecl,
    ContextItemDecl,
    QueryBody,

    // Names
    QName,

    // FLWOR
    FlworExpr,
    ForClause,
    ForBinding,
    AllowingEmpty,
    PositionalVar,
    LetClause,
    LetBinding,
    WhereClause,
    OrderByClause,
    OrderSpec,
    CountClause,
    ReturnClause,

    // Branching expressions
    QuantifiedExpr,
    QuantifiedBinding,
    IfExpr,
    SwitchExpr,
    SwitchCaseClause,
    TypeswitchExpr,
    CaseClause,
    TryCatchExpr,
    CatchClause,

    // Operator expressions
    SequenceExpr,
    OrExpr,
    AndExpr,
    ComparisonExpr,
    StringConcatExpr,
    RangeExpr,
    AdditiveExpr,
    MultiplicativeExpr,
    UnionExpr,
    IntersectExceptExpr,
    InstanceofExpr,
    TreatExpr,
    CastableExpr,
    CastExpr,
    ArrowExpr,
    UnaryExpr,
    SimpleMapExpr,

    // Paths
    PathExpr,
    AxisStep,
    NameTest,
    Wildcard,
    Predicate,
    PostfixExpr,
    ArgumentList,
    Argument,
    Lookup,

    // Primaries
    Literal,
    VarRef,
    ParenthesizedExpr,
    ContextItemExpr,
    FunctionCall,
    NamedFunctionRef,
    InlineFunctionExpr,
    MapConstructor,
    MapConstructorEntry,
    SquareArrayConstructor,
    CurlyArrayConstructor,
    EnclosedExpr,

    // Node constructors
    DirElemConstructor,
    DirAttribute,
    DirAttributeValue,
    DirCommentConstructor,
    DirPIConstructor,
    CompDocConstructor,
    CompElemConstructor,
    CompAttrConstructor,
    CompNamespaceConstructor,
    CompTextConstructor,
    CompCommentConstructor,
    CompPIConstructor,

    // Types
    TypeDeclaration,
    SequenceType,
    EmptySequenceType,
    AtomicOrUnionType,
    AnyItemType,
    AnyKindTest,
    DocumentTest,
    TextTest,
    CommentTest,
    NamespaceNodeTest,
    PITest,
    ElementTest,
    AttributeTest,
    SchemaElementTest,
    SchemaAttributeTest,
    FunctionTest,
    MapTest,
    ArrayTest,
    ParenthesizedItemType,
    TupleType,
    TupleField,
    UnionType,

    // Error recovery
    Error,
}

/// Index of an element in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u32);

impl ElementId {
    pub const ROOT: ElementId = ElementId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
enum ElementData {
    Node {
        kind: NodeKind,
        children: std::ops::Range<u32>,
    },
    Token {
        index: u32,
    },
    /// Zero-width pseudo-leaf marking a missing construct.
    Missing {
        message: Box<str>,
    },
}

#[derive(Debug)]
struct Element {
    /// `u32::MAX` for the root.
    parent: u32,
    range: TextRange,
    data: ElementData,
}

/// Parser output events, replayed into the arena by
/// [`SyntaxTree::build`].
#[derive(Debug)]
pub(crate) enum Event {
    /// `forward_parent` points (relative, forward) at a later Start
    /// that must open before this one — the precede/wrap technique.
    Start {
        kind: NodeKind,
        forward_parent: Option<u32>,
    },
    Finish,
    Token {
        index: u32,
    },
    Missing {
        message: String,
        offset: TextSize,
    },
    /// Abandoned marker; ignored.
    Tombstone,
}

/// The arena tree. Owns its text and tokens; elements reference both by
/// index.
#[derive(Debug)]
pub struct SyntaxTree {
    text: String,
    tokens: Vec<Token>,
    elements: Vec<Element>,
}

impl SyntaxTree {
    pub(crate) fn build(source: &str, tokens: Vec<Token>, mut events: Vec<Event>) -> SyntaxTree {
        let mut nested = NestedBuilder::new(&tokens, source.len());

        let mut forward_kinds = Vec::new();
        for i in 0..events.len() {
            match std::mem::replace(&mut events[i], Event::Tombstone) {
                Event::Start {
                    kind,
                    forward_parent,
                } => {
                    forward_kinds.push(kind);
                    let mut idx = i;
                    let mut fp = forward_parent;
                    while let Some(fwd) = fp {
                        idx += fwd as usize;
                        fp = match std::mem::replace(&mut events[idx], Event::Tombstone) {
                            Event::Start {
                                kind,
                                forward_parent,
                            } => {
                                forward_kinds.push(kind);
                                forward_parent
                            }
                            _ => unreachable!("forward parent must be a Start event"),
                        };
                    }
                    for kind in forward_kinds.drain(..).rev() {
                        nested.start_node(kind);
                    }
                }
                Event::Finish => nested.finish_node(),
                Event::Token { index } => nested.token(index),
                Event::Missing { message, offset } => nested.missing(message, offset),
                Event::Tombstone => {}
            }
        }

        let elements = nested.flatten();
        SyntaxTree {
            text: source.to_owned(),
            tokens,
            elements,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> ElementId {
        debug_assert!(!self.elements.is_empty());
        ElementId::ROOT
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn range(&self, id: ElementId) -> TextRange {
        self.elements[id.index()].range
    }

    /// `None` for the root.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.elements[id.index()].parent;
        (parent != u32::MAX).then_some(ElementId(parent))
    }

    /// Interior node kind; `None` for leaves.
    pub fn node_kind(&self, id: ElementId) -> Option<NodeKind> {
        match self.elements[id.index()].data {
            ElementData::Node { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Token leaf kind; `None` for nodes and missing-markers.
    pub fn token_kind(&self, id: ElementId) -> Option<TokenKind> {
        match self.elements[id.index()].data {
            ElementData::Token { index } => Some(self.tokens[index as usize].kind),
            _ => None,
        }
    }

    /// Message of a missing-construct marker leaf.
    pub fn missing_message(&self, id: ElementId) -> Option<&str> {
        match &self.elements[id.index()].data {
            ElementData::Missing { message } => Some(message),
            _ => None,
        }
    }

    /// Source text covered by this element.
    pub fn element_text(&self, id: ElementId) -> &str {
        &self.text[std::ops::Range::<usize>::from(self.range(id))]
    }

    /// Children in source order. Empty for leaves.
    pub fn children(&self, id: ElementId) -> impl ExactSizeIterator<Item = ElementId> + use<> {
        let range = match &self.elements[id.index()].data {
            ElementData::Node { children, .. } => children.clone(),
            _ => 0..0,
        };
        range.map(ElementId)
    }

    /// Depth-first preorder walk from `id`.
    pub fn descendants(&self, id: ElementId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }
}

pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<ElementId>,
}

impl Iterator for Descendants<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let id = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(self.tree.children(id));
        self.stack[start..].reverse();
        Some(id)
    }
}

// --- Event replay: nested scratch tree, then breadth-first flatten ---

#[derive(Debug)]
enum ScratchChild {
    Node(usize),
    Token(u32),
    Missing(Box<str>, TextSize),
}

#[derive(Debug)]
struct ScratchNode {
    kind: NodeKind,
    children: Vec<ScratchChild>,
    range: TextRange,
}

struct NestedBuilder<'t> {
    tokens: &'t [Token],
    nodes: Vec<ScratchNode>,
    /// Indices into `nodes` of the currently open chain.
    open: Vec<usize>,
    /// End of the last token placed, for positioning empty nodes.
    offset: TextSize,
    source_len: usize,
}

impl<'t> NestedBuilder<'t> {
    fn new(tokens: &'t [Token], source_len: usize) -> Self {
        Self {
            tokens,
            nodes: Vec::new(),
            open: Vec::new(),
            offset: TextSize::new(0),
            source_len,
        }
    }

    fn start_node(&mut self, kind: NodeKind) {
        let idx = self.nodes.len();
        self.nodes.push(ScratchNode {
            kind,
            children: Vec::new(),
            range: TextRange::empty(self.offset),
        });
        if let Some(&parent) = self.open.last() {
            self.nodes[parent].children.push(ScratchChild::Node(idx));
        }
        self.open.push(idx);
    }

    fn finish_node(&mut self) {
        let idx = self.open.pop().expect("finish without matching start");
        let range = self.nodes[idx].range;
        if let Some(&parent) = self.open.last() {
            self.nodes[parent].range = cover(self.nodes[parent].range, range);
        }
    }

    fn token(&mut self, index: u32) {
        let range = self.tokens[index as usize].range;
        self.offset = range.end();
        let top = *self.open.last().expect("token outside any node");
        self.nodes[top].children.push(ScratchChild::Token(index));
        self.nodes[top].range = cover(self.nodes[top].range, range);
    }

    fn missing(&mut self, message: String, offset: TextSize) {
        let top = *self.open.last().expect("missing-marker outside any node");
        self.nodes[top]
            .children
            .push(ScratchChild::Missing(message.into_boxed_str(), offset));
        self.nodes[top].range = cover(self.nodes[top].range, TextRange::empty(offset));
    }

    /// Breadth-first layout: popping a node appends all of its children
    /// consecutively, which is exactly the contiguous-range invariant.
    fn flatten(self) -> Vec<Element> {
        assert!(self.open.is_empty(), "unbalanced start/finish events");
        let root_scratch = 0usize;
        debug_assert!(!self.nodes.is_empty(), "parser always produces a root");

        // The root spans the whole input even when empty or all-trivia.
        let root_range = TextRange::new(
            TextSize::new(0),
            TextSize::new(self.source_len as u32),
        );

        let mut elements = Vec::with_capacity(self.nodes.len() * 2);
        elements.push(Element {
            parent: u32::MAX,
            range: root_range,
            data: ElementData::Node {
                kind: self.nodes[root_scratch].kind,
                children: 0..0,
            },
        });

        // Queue of (scratch index, arena index) for nodes whose
        // children still need placing.
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((root_scratch, 0u32));

        while let Some((scratch, arena)) = queue.pop_front() {
            let first = elements.len() as u32;
            for child in &self.nodes[scratch].children {
                let idx = elements.len() as u32;
                match child {
                    ScratchChild::Node(n) => {
                        elements.push(Element {
                            parent: arena,
                            range: self.nodes[*n].range,
                            data: ElementData::Node {
                                kind: self.nodes[*n].kind,
                                children: 0..0,
                            },
                        });
                        queue.push_back((*n, idx));
                    }
                    ScratchChild::Token(t) => {
                        elements.push(Element {
                            parent: arena,
                            range: self.tokens[*t as usize].range,
                            data: ElementData::Token { index: *t },
                        });
                    }
                    ScratchChild::Missing(message, offset) => {
                        elements.push(Element {
                            parent: arena,
                            range: TextRange::empty(*offset),
                            data: ElementData::Missing {
                                message: message.clone(),
                            },
                        });
                    }
                }
            }
            let last = elements.len() as u32;
            match &mut elements[arena as usize].data {
                ElementData::Node { children, .. } => *children = first..last,
                _ => unreachable!("queued element is always a node"),
            }
        }

        elements
    }
}

/// Range union. A fresh node's placeholder range is empty at the end of
/// the last placed token, which is exactly where its first child will
/// start, so the union never stretches a node leftward spuriously.
fn cover(a: TextRange, b: TextRange) -> TextRange {
    TextRange::new(a.start().min(b.start()), a.end().max(b.end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    /// `1 + 2` hand-assembled: Module > AdditiveExpr > (Literal, +, Literal).
    fn sample() -> SyntaxTree {
        let source = "1 + 2";
        let tokens = lex(source);
        let events = vec![
            Event::Start {
                kind: NodeKind::Module,
                forward_parent: None,
            },
            Event::Start {
                kind: NodeKind::AdditiveExpr,
                forward_parent: None,
            },
            Event::Start {
                kind: NodeKind::Literal,
                forward_parent: None,
            },
            Event::Token { index: 0 },
            Event::Finish,
            Event::Token { index: 1 },
            Event::Token { index: 2 },
            Event::Token { index: 3 },
            Event::Start {
                kind: NodeKind::Literal,
                forward_parent: None,
            },
            Event::Token { index: 4 },
            Event::Finish,
            Event::Finish,
            Event::Finish,
        ];
        SyntaxTree::build(source, tokens, events)
    }

    #[test]
    fn children_are_contiguous_and_parented() {
        let tree = sample();
        for id in tree.descendants(tree.root()) {
            let children: Vec<_> = tree.children(id).collect();
            for pair in children.windows(2) {
                assert_eq!(pair[0].index() + 1, pair[1].index());
            }
            for child in children {
                assert_eq!(tree.parent(child), Some(id));
            }
        }
    }

    #[test]
    fn root_covers_whole_input() {
        let tree = sample();
        assert_eq!(tree.range(tree.root()), TextRange::new(0.into(), 5.into()));
    }

    #[test]
    fn leaf_texts_tile_the_source() {
        let tree = sample();
        let mut text = String::new();
        for id in tree.descendants(tree.root()) {
            if tree.token_kind(id).is_some() {
                text.push_str(tree.element_text(id));
            }
        }
        assert_eq!(text, tree.text());
    }

    #[test]
    fn forward_parent_wraps_retroactively() {
        // Events as a parser emits them when `1` turns out to be the
        // left operand of a larger expression: the Literal's
        // forward_parent points at the AdditiveExpr started later.
        let source = "1+2";
        let tokens = lex(source);
        let events = vec![
            Event::Start {
                kind: NodeKind::Module,
                forward_parent: None,
            },
            Event::Start {
                kind: NodeKind::Literal,
                forward_parent: Some(3),
            },
            Event::Token { index: 0 },
            Event::Finish,
            Event::Start {
                kind: NodeKind::AdditiveExpr,
                forward_parent: None,
            },
            Event::Token { index: 1 },
            Event::Start {
                kind: NodeKind::Literal,
                forward_parent: None,
            },
            Event::Token { index: 2 },
            Event::Finish,
            Event::Finish,
            Event::Finish,
        ];
        let tree = SyntaxTree::build(source, tokens, events);

        insta::assert_snapshot!(tree.dump_full(), @r#"
        Module@0..3
          AdditiveExpr@0..3
            Literal@0..1
              IntegerLiteral@0..1 "1"
            Plus@1..2 "+"
            Literal@2..3
              IntegerLiteral@2..3 "2"
        "#);
    }

    #[test]
    fn empty_input_root_is_empty_range() {
        let tree = SyntaxTree::build(
            "",
            Vec::new(),
            vec![
                Event::Start {
                    kind: NodeKind::Module,
                    forward_parent: None,
                },
                Event::Finish,
            ],
        );
        assert_eq!(tree.range(tree.root()), TextRange::empty(0.into()));
        assert_eq!(tree.children(tree.root()).len(), 0);
    }
}
