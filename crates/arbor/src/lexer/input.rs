//! Source text access for the lexer.
//!
//! The parser never needs the whole document in one buffer: it pulls bytes
//! through [`TextInput`], which may hand out the text in arbitrary chunks.

/// A source of document bytes.
pub trait TextInput {
    /// Bytes starting at `offset`. An empty slice means `offset` is at or past
    /// the end of the document.
    fn chunk_at(&mut self, offset: usize) -> &[u8];
}

impl TextInput for &[u8] {
    fn chunk_at(&mut self, offset: usize) -> &[u8] {
        self.get(offset..).unwrap_or_default()
    }
}

impl TextInput for &str {
    fn chunk_at(&mut self, offset: usize) -> &[u8] {
        self.as_bytes().get(offset..).unwrap_or_default()
    }
}

impl TextInput for String {
    fn chunk_at(&mut self, offset: usize) -> &[u8] {
        self.as_bytes().get(offset..).unwrap_or_default()
    }
}

impl TextInput for Vec<u8> {
    fn chunk_at(&mut self, offset: usize) -> &[u8] {
        self.get(offset..).unwrap_or_default()
    }
}

/// Adapts a read callback into a [`TextInput`].
///
/// The callback receives a byte offset and returns the bytes starting there;
/// an empty vector signals end of input.
pub struct ChunkedInput<F> {
    read: F,
    buffer: Vec<u8>,
}

impl<F: FnMut(usize) -> Vec<u8>> ChunkedInput<F> {
    pub const fn new(read: F) -> Self {
        Self {
            read,
            buffer: Vec::new(),
        }
    }
}

impl<F: FnMut(usize) -> Vec<u8>> TextInput for ChunkedInput<F> {
    fn chunk_at(&mut self, offset: usize) -> &[u8] {
        self.buffer = (self.read)(offset);
        &self.buffer
    }
}

/// Cursor over a [`TextInput`] that caches the current chunk and remembers
/// the furthest byte examined.
///
/// The furthest position is exclusive and includes the probe that found the
/// end of input: a token that stops at end of input depends on one byte past
/// it, since appending text could extend it.
pub struct SourceReader<'a> {
    input: &'a mut dyn TextInput,
    chunk_start: usize,
    chunk: Vec<u8>,
    len_hint: Option<usize>,
    max_read: usize,
}

impl<'a> SourceReader<'a> {
    pub fn new(input: &'a mut dyn TextInput) -> Self {
        Self {
            input,
            chunk_start: 0,
            chunk: Vec::new(),
            len_hint: None,
            max_read: 0,
        }
    }

    fn load(&mut self, pos: usize) -> bool {
        if pos >= self.chunk_start && pos < self.chunk_start + self.chunk.len() {
            return true;
        }
        if self.len_hint.is_some_and(|len| pos >= len) {
            return false;
        }
        let chunk = self.input.chunk_at(pos);
        if chunk.is_empty() {
            self.len_hint = Some(self.len_hint.map_or(pos, |len| len.min(pos)));
            return false;
        }
        self.chunk.clear();
        self.chunk.extend_from_slice(chunk);
        self.chunk_start = pos;
        true
    }

    /// Byte at `pos`, recording the read
    pub fn byte_at(&mut self, pos: usize) -> Option<u8> {
        self.max_read = self.max_read.max(pos + 1);
        self.peek_byte(pos)
    }

    /// Byte at `pos` without recording the read
    pub fn peek_byte(&mut self, pos: usize) -> Option<u8> {
        if self.load(pos) {
            Some(self.chunk[pos - self.chunk_start])
        } else {
            None
        }
    }

    /// The character at `pos` and its encoded length. Invalid UTF-8 decodes
    /// to U+FFFD one byte at a time.
    pub fn char_at(&mut self, pos: usize) -> Option<(char, usize)> {
        let first = self.byte_at(pos)?;
        let width = match first {
            0x00..=0x7F => return Some((char::from(first), 1)),
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Some((char::REPLACEMENT_CHARACTER, 1)),
        };
        let mut buf = [first, 0, 0, 0];
        for (i, slot) in buf.iter_mut().enumerate().take(width).skip(1) {
            match self.byte_at(pos + i) {
                Some(byte) if byte & 0xC0 == 0x80 => *slot = byte,
                _ => return Some((char::REPLACEMENT_CHARACTER, 1)),
            }
        }
        std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map_or(Some((char::REPLACEMENT_CHARACTER, 1)), |c| {
                Some((c, width))
            })
    }

    /// Copy of the bytes in `start..end`, without recording the reads
    pub fn bytes(&mut self, start: usize, end: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(end.saturating_sub(start));
        let mut pos = start;
        while pos < end {
            if !self.load(pos) {
                break;
            }
            let offset = pos - self.chunk_start;
            let take = (end - pos).min(self.chunk.len() - offset);
            out.extend_from_slice(&self.chunk[offset..offset + take]);
            pos += take;
        }
        out
    }

    pub fn is_eof(&mut self, pos: usize) -> bool {
        !self.load(pos)
    }

    /// Exclusive bound of every byte examined so far
    pub const fn max_read(&self) -> usize {
        self.max_read
    }

    pub const fn reset_max_read(&mut self, pos: usize) {
        self.max_read = pos;
    }
}
