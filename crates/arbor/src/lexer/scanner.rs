//! Hook for hand-written tokenizers.
//!
//! Some tokens (quoted strings with doubled-quote escapes, numbers that must
//! not swallow a range operator, indentation) are easier to write by hand
//! than as patterns. A grammar lists them as external tokens and a language
//! binding supplies an [`ExternalScanner`] that recognizes them.

use super::input::SourceReader;

/// A hand-written tokenizer for a grammar's external tokens.
///
/// Scanners are consulted before the built-in lexer whenever the current
/// state accepts at least one external token. Subtree reuse assumes the
/// result of `scan` depends only on the text and `valid`.
pub trait ExternalScanner: Send {
    /// Try to recognize a token at the cursor.
    ///
    /// `valid[i]` says whether the grammar's i-th external token is
    /// acceptable here. On success, return that index; the token ends at the
    /// last [`ScanCursor::mark_end`] (or at the cursor if never marked).
    fn scan(&mut self, cursor: &mut ScanCursor<'_, '_>, valid: &[bool]) -> Option<usize>;

    /// Called before every parse.
    fn reset(&mut self) {}
}

/// The scanner's view of the input.
pub struct ScanCursor<'r, 'a> {
    reader: &'r mut SourceReader<'a>,
    position: usize,
    token_start: usize,
    marked_end: Option<usize>,
    advanced: bool,
}

impl<'r, 'a> ScanCursor<'r, 'a> {
    pub(crate) fn new(reader: &'r mut SourceReader<'a>, position: usize) -> Self {
        Self {
            reader,
            position,
            token_start: position,
            marked_end: None,
            advanced: false,
        }
    }

    /// The next character, or `None` at end of input
    pub fn lookahead(&mut self) -> Option<char> {
        self.reader.char_at(self.position).map(|(c, _)| c)
    }

    /// Consume the lookahead as part of the token
    pub fn advance(&mut self) {
        if let Some((_, width)) = self.reader.char_at(self.position) {
            self.position += width;
            self.advanced = true;
        }
    }

    /// Consume the lookahead as padding. Only meaningful before the first
    /// [`advance`](Self::advance).
    pub fn skip(&mut self) {
        if let Some((_, width)) = self.reader.char_at(self.position) {
            self.position += width;
            if !self.advanced {
                self.token_start = self.position;
            }
        }
    }

    /// End the token at the current position; later advances only look ahead
    pub fn mark_end(&mut self) {
        self.marked_end = Some(self.position);
    }

    pub fn is_eof(&mut self) -> bool {
        self.lookahead().is_none()
    }

    /// Byte offset of the cursor
    pub const fn position(&self) -> usize {
        self.position
    }

    pub(crate) const fn token_start(&self) -> usize {
        self.token_start
    }

    pub(crate) fn token_end(&self) -> usize {
        self.marked_end.unwrap_or(self.position).max(self.token_start)
    }
}
