//! Resumable lexer state, packed into a single `u64`.
//!
//! The editor integration re-lexes only the edited region, resuming from
//! the state captured after the last unaffected token. That makes the
//! state a hard contract: it must encode the full mode stack and every
//! nesting counter, and two equal states at the same offset must produce
//! identical token sequences.
//!
//! # Bit layout
//!
//! ```text
//! bits  0..48   twelve 4-bit mode slots; slot 0 is the bottom of the stack
//! bits 48..52   stack depth (0..=12)
//! bits 52..60   doc-comment nesting depth (number of unmatched `(:`)
//! bits 60..64   reserved, always zero
//! ```
//!
//! `LexerState::default()` (all zeros) is the empty stack, i.e. plain
//! expression tokenizing.

const MODE_BITS: u64 = 4;
const MODE_MASK: u64 = (1 << MODE_BITS) - 1;
const DEPTH_SHIFT: u64 = 48;
const DEPTH_MASK: u64 = 0xF;
const COMMENT_SHIFT: u64 = 52;
const COMMENT_MASK: u64 = 0xFF;

/// Maximum trackable mode-stack depth. Legal nesting is shallow; input
/// nested deeper than this keeps lexing but loses resumability inside
/// the excess nesting.
pub const MAX_MODE_DEPTH: u8 = 12;

/// Base tokenizing modes. Each has a transition function in
/// [`super::Lexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Core expression tokenizing. Also the implicit mode of an empty
    /// stack.
    Default = 0,
    /// Inside `(:~ ... :)`, between structural pieces of a doc comment.
    DocContents = 1,
    /// After `@` in a doc comment, reading the tag name.
    DocTag = 2,
    /// After `@param`, expecting `$name`.
    DocParamVar = 3,
    /// At a doc-comment line break, trimming leading whitespace and the
    /// `:` gutter.
    DocTrim = 4,
    /// Inside an open tag: `<name attr="..." ...`.
    XmlTag = 5,
    /// Inside a closing tag: `</name >`.
    XmlCloseTag = 6,
    /// Between an open tag and its close tag.
    XmlContent = 7,
    /// Double-quoted attribute value in a direct constructor.
    XmlAttrQuot = 8,
    /// Single-quoted attribute value in a direct constructor.
    XmlAttrApos = 9,
    /// XSLT attribute value template text (entry mode for `lex_avt`).
    Avt = 10,
    /// Just after `(:~`, expecting the `~` marker token.
    DocStart = 11,
    /// After `@param $`, reading the variable name.
    DocParamName = 12,
}

impl Mode {
    fn from_bits(bits: u64) -> Mode {
        match bits {
            0 => Mode::Default,
            1 => Mode::DocContents,
            2 => Mode::DocTag,
            3 => Mode::DocParamVar,
            4 => Mode::DocTrim,
            5 => Mode::XmlTag,
            6 => Mode::XmlCloseTag,
            7 => Mode::XmlContent,
            8 => Mode::XmlAttrQuot,
            9 => Mode::XmlAttrApos,
            10 => Mode::Avt,
            11 => Mode::DocStart,
            12 => Mode::DocParamName,
            _ => Mode::Default,
        }
    }
}

/// Opaque checkpoint of the mode lexer. See the module docs for the
/// exact encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct LexerState(u64);

impl LexerState {
    /// State with a single mode pushed, used for non-`Default` entry
    /// points such as attribute value templates.
    pub(crate) fn with_mode(mode: Mode) -> Self {
        let mut state = Self::default();
        state.push(mode);
        state
    }

    /// The raw packed value. Stable across calls; callers may persist it
    /// alongside an offset for incremental re-lexing.
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Rebuilds a state from [`LexerState::raw`]. The value is trusted;
    /// feeding an arbitrary integer produces an arbitrary (but safe)
    /// mode stack.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) fn depth(self) -> u8 {
        ((self.0 >> DEPTH_SHIFT) & DEPTH_MASK) as u8
    }

    /// Mode on top of the stack; `Default` when the stack is empty.
    pub(crate) fn mode(self) -> Mode {
        match self.depth() {
            0 => Mode::Default,
            d => self.slot(d - 1),
        }
    }

    /// Mode underneath the top of the stack, if any.
    pub(crate) fn parent_mode(self) -> Option<Mode> {
        match self.depth() {
            0 | 1 => None,
            d => Some(self.slot(d - 2)),
        }
    }

    fn slot(self, index: u8) -> Mode {
        Mode::from_bits((self.0 >> (u64::from(index) * MODE_BITS)) & MODE_MASK)
    }

    /// Pushes `mode`; reports `false` (and leaves the state untouched)
    /// when the stack is full.
    pub(crate) fn push(&mut self, mode: Mode) -> bool {
        let depth = self.depth();
        if depth >= MAX_MODE_DEPTH {
            return false;
        }
        let shift = u64::from(depth) * MODE_BITS;
        self.0 &= !(MODE_MASK << shift);
        self.0 |= u64::from(mode as u8) << shift;
        self.set_depth(depth + 1);
        true
    }

    pub(crate) fn pop(&mut self) -> Option<Mode> {
        let depth = self.depth();
        if depth == 0 {
            return None;
        }
        let mode = self.slot(depth - 1);
        let shift = u64::from(depth - 1) * MODE_BITS;
        self.0 &= !(MODE_MASK << shift);
        self.set_depth(depth - 1);
        Some(mode)
    }

    /// Replaces the top of the stack without changing the depth.
    pub(crate) fn replace(&mut self, mode: Mode) {
        let popped = self.pop();
        debug_assert!(popped.is_some(), "replace on an empty mode stack");
        self.push(mode);
    }

    fn set_depth(&mut self, depth: u8) {
        self.0 &= !(DEPTH_MASK << DEPTH_SHIFT);
        self.0 |= (u64::from(depth) & DEPTH_MASK) << DEPTH_SHIFT;
    }

    pub(crate) fn comment_depth(self) -> u8 {
        ((self.0 >> COMMENT_SHIFT) & COMMENT_MASK) as u8
    }

    pub(crate) fn set_comment_depth(&mut self, depth: u8) {
        self.0 &= !(COMMENT_MASK << COMMENT_SHIFT);
        self.0 |= u64::from(depth) << COMMENT_SHIFT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_default_mode() {
        let state = LexerState::default();
        assert_eq!(state.mode(), Mode::Default);
        assert_eq!(state.depth(), 0);
        assert_eq!(state.raw(), 0);
    }

    #[test]
    fn push_pop_round_trip() {
        let mut state = LexerState::default();
        assert!(state.push(Mode::XmlTag));
        assert!(state.push(Mode::XmlAttrQuot));
        assert!(state.push(Mode::Default));
        assert_eq!(state.mode(), Mode::Default);
        assert_eq!(state.parent_mode(), Some(Mode::XmlAttrQuot));
        assert_eq!(state.pop(), Some(Mode::Default));
        assert_eq!(state.pop(), Some(Mode::XmlAttrQuot));
        assert_eq!(state.mode(), Mode::XmlTag);
        assert_eq!(state.pop(), Some(Mode::XmlTag));
        assert_eq!(state.pop(), None);
    }

    #[test]
    fn raw_round_trips_full_stack() {
        let mut state = LexerState::default();
        state.push(Mode::XmlContent);
        state.push(Mode::Default);
        state.set_comment_depth(3);
        let restored = LexerState::from_raw(state.raw());
        assert_eq!(restored, state);
        assert_eq!(restored.comment_depth(), 3);
        assert_eq!(restored.mode(), Mode::Default);
    }

    #[test]
    fn push_saturates_at_max_depth() {
        let mut state = LexerState::default();
        for _ in 0..MAX_MODE_DEPTH {
            assert!(state.push(Mode::Default));
        }
        assert!(!state.push(Mode::Default));
        assert_eq!(state.depth(), MAX_MODE_DEPTH);
    }
}
