use super::input::SourceReader;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Token patterns, as emitted by the grammar generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    /// Exact byte sequence
    Literal(CompactString),
    /// One character from a set
    Class(CharSet),
    /// Any character except a newline
    AnyChar,
    /// Patterns in sequence
    Seq(Vec<Pattern>),
    /// Any one of the alternatives
    Choice(Vec<Pattern>),
    /// Repeated pattern (`max` of `None` means unbounded)
    Repeat {
        pattern: Box<Pattern>,
        min: u32,
        max: Option<u32>,
    },
    /// Zero or one occurrence
    Optional(Box<Pattern>),
}

/// A set of character ranges, optionally complemented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharSet {
    ranges: Vec<(char, char)>,
    negated: bool,
}

type Ends = SmallVec<[usize; 4]>;

impl CharSet {
    #[must_use]
    pub const fn new(ranges: Vec<(char, char)>) -> Self {
        Self {
            ranges,
            negated: false,
        }
    }

    #[must_use]
    pub fn chars(chars: &str) -> Self {
        Self::new(chars.chars().map(|c| (c, c)).collect())
    }

    #[must_use]
    pub fn digits() -> Self {
        Self::new(vec![('0', '9')])
    }

    #[must_use]
    pub fn whitespace() -> Self {
        Self::chars(" \t\n\r")
    }

    #[must_use]
    pub fn ident_start() -> Self {
        Self::new(vec![('a', 'z'), ('A', 'Z'), ('_', '_')])
    }

    #[must_use]
    pub fn ident_continue() -> Self {
        Self::new(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')])
    }

    /// The complement of this set
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != self.negated
    }
}

impl Pattern {
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self::Literal(text.into())
    }

    #[must_use]
    pub fn one_or_more(pattern: Self) -> Self {
        Self::Repeat {
            pattern: Box::new(pattern),
            min: 1,
            max: None,
        }
    }

    #[must_use]
    pub fn zero_or_more(pattern: Self) -> Self {
        Self::Repeat {
            pattern: Box::new(pattern),
            min: 0,
            max: None,
        }
    }

    #[must_use]
    pub fn optional(pattern: Self) -> Self {
        Self::Optional(Box::new(pattern))
    }

    /// Whether the pattern can match the empty string
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Literal(text) => text.is_empty(),
            Self::Class(_) | Self::AnyChar => false,
            Self::Seq(parts) => parts.iter().all(Self::is_nullable),
            Self::Choice(alternatives) => alternatives.iter().any(Self::is_nullable),
            Self::Repeat { pattern, min, .. } => *min == 0 || pattern.is_nullable(),
            Self::Optional(_) => true,
        }
    }

    /// The end of the longest match starting at `pos`, if any.
    pub fn longest_match(&self, reader: &mut SourceReader<'_>, pos: usize) -> Option<usize> {
        let mut ends = Ends::new();
        self.match_ends(reader, pos, &mut ends);
        ends.into_iter().max()
    }

    /// Collect every position at which a match starting at `pos` can end.
    fn match_ends(&self, reader: &mut SourceReader<'_>, pos: usize, out: &mut Ends) {
        match self {
            Self::Literal(text) => {
                let matched = text
                    .bytes()
                    .enumerate()
                    .all(|(i, expected)| reader.byte_at(pos + i) == Some(expected));
                if matched {
                    push_unique(out, pos + text.len());
                }
            }
            Self::Class(set) => {
                if let Some((c, width)) = reader.char_at(pos)
                    && set.contains(c)
                {
                    push_unique(out, pos + width);
                }
            }
            Self::AnyChar => {
                if let Some((c, width)) = reader.char_at(pos)
                    && c != '\n'
                {
                    push_unique(out, pos + width);
                }
            }
            Self::Seq(parts) => {
                let mut frontier = Ends::new();
                frontier.push(pos);
                for part in parts {
                    let mut next = Ends::new();
                    for &start in &frontier {
                        part.match_ends(reader, start, &mut next);
                    }
                    if next.is_empty() {
                        return;
                    }
                    frontier = next;
                }
                for end in frontier {
                    push_unique(out, end);
                }
            }
            Self::Choice(alternatives) => {
                for alternative in alternatives {
                    alternative.match_ends(reader, pos, out);
                }
            }
            Self::Optional(pattern) => {
                push_unique(out, pos);
                pattern.match_ends(reader, pos, out);
            }
            Self::Repeat { pattern, min, max } => {
                repeat_ends(pattern, *min, *max, reader, pos, out);
            }
        }
    }
}

fn repeat_ends(
    pattern: &Pattern,
    min: u32,
    max: Option<u32>,
    reader: &mut SourceReader<'_>,
    pos: usize,
    out: &mut Ends,
) {
    if min == 0 {
        push_unique(out, pos);
    }
    let mut seen = Ends::new();
    let mut frontier = Ends::new();
    frontier.push(pos);
    let mut count = 0u32;
    while !frontier.is_empty() && max.is_none_or(|max| count < max) {
        let mut next = Ends::new();
        for &start in &frontier {
            let mut ends = Ends::new();
            pattern.match_ends(reader, start, &mut ends);
            // zero-width iterations make no progress
            for end in ends.into_iter().filter(|&end| end > start) {
                push_unique(&mut next, end);
            }
        }
        count += 1;
        if count >= min {
            next.retain(|end| !seen.contains(end));
            for &end in &next {
                seen.push(end);
                push_unique(out, end);
            }
        }
        frontier = next;
    }
}

fn push_unique(out: &mut Ends, end: usize) {
    if !out.contains(&end) {
        out.push(end);
    }
}
