//! Code-point cursor over the source text.
//!
//! All lexer modes share this scanner. It yields Unicode scalar values
//! (so astral characters are single steps, never two) and reports byte
//! offsets, which is what token ranges are measured in.

use text_size::TextSize;

/// Resettable, markable scanner over `&str`.
///
/// Design roughly follows the rustc lexer cursor: `peek` clones the
/// underlying `Chars` iterator, `bump` consumes one code point.
#[derive(Clone)]
pub struct CodePointCursor<'s> {
    source: &'s str,
    pos: usize,
}

impl<'s> CodePointCursor<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source, pos: 0 }
    }

    /// Cursor starting at `offset`, which must lie on a char boundary.
    pub fn at(source: &'s str, offset: u32) -> Self {
        let pos = offset as usize;
        assert!(source.is_char_boundary(pos), "offset {pos} splits a code point");
        Self { source, pos }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Current byte offset.
    #[inline]
    pub fn offset(&self) -> TextSize {
        TextSize::new(self.pos as u32)
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Code point at the cursor, `None` past the end of the buffer.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    /// Code point one position ahead of the cursor.
    #[inline]
    pub fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advance past one code point. No-op at end of buffer.
    #[inline]
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advance while `predicate` holds.
    pub fn bump_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.bump();
        }
    }

    /// Consume `c` if it is next; reports whether it was.
    #[inline]
    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Mark the current offset for a later [`CodePointCursor::restore`].
    #[inline]
    pub fn save(&self) -> usize {
        self.pos
    }

    /// Rewind to a previously saved offset.
    #[inline]
    pub fn restore(&mut self, saved: usize) {
        debug_assert!(saved <= self.source.len());
        self.pos = saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        let mut cursor = CodePointCursor::new("");
        assert!(cursor.is_eof());
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.bump(), None);
        assert_eq!(cursor.offset(), TextSize::new(0));
    }

    #[test]
    fn astral_code_points_are_single_steps() {
        // U+10000 takes two UTF-16 code units but is one code point.
        let mut cursor = CodePointCursor::new("a\u{10000}b");
        assert_eq!(cursor.bump(), Some('a'));
        assert_eq!(cursor.peek(), Some('\u{10000}'));
        assert_eq!(cursor.bump(), Some('\u{10000}'));
        assert_eq!(cursor.offset(), TextSize::new(5));
        assert_eq!(cursor.bump(), Some('b'));
        assert!(cursor.is_eof());
    }

    #[test]
    fn save_restore_round_trip() {
        let mut cursor = CodePointCursor::new("for $x");
        cursor.bump();
        let mark = cursor.save();
        cursor.bump_while(|c| c != '$');
        assert_eq!(cursor.peek(), Some('$'));
        cursor.restore(mark);
        assert_eq!(cursor.peek(), Some('o'));
    }

    #[test]
    fn peek_second_past_end() {
        let cursor = CodePointCursor::new("x");
        assert_eq!(cursor.peek_second(), None);
    }
}
