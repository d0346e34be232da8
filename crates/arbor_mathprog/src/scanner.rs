//! Hand-written tokens of GNU MathProg.
//!
//! Quoted strings escape a quote by doubling it, which a regular pattern
//! cannot express without also accepting unbalanced quotes. Numbers must
//! stop before a `..` range operator, so `1..5` is `1`, `..`, `5` while `1.`
//! alone is still a number.

use arbor::{ExternalScanner, ScanCursor};

/// External token names, in the order the scanner reports them
pub const EXTERNAL_TOKEN_NAMES: [&str; 3] = ["string", "number", "end_of_token"];

const STRING: usize = 0;
const NUMBER: usize = 1;
const END_OF_TOKEN: usize = 2;

/// Scanner for MathProg strings, numbers and word boundaries.
///
/// Stateless: the same text and the same valid set always scan the same
/// way, which is what subtree reuse relies on.
#[derive(Debug, Default, Clone, Copy)]
pub struct MathprogScanner;

impl MathprogScanner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Boxed scanner, usable as a language's scanner factory
    #[must_use]
    pub fn boxed() -> Box<dyn ExternalScanner> {
        Box::new(Self)
    }
}

fn is_valid(valid: &[bool], index: usize) -> bool {
    valid.get(index).copied().unwrap_or(false)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl ExternalScanner for MathprogScanner {
    fn scan(&mut self, cursor: &mut ScanCursor<'_, '_>, valid: &[bool]) -> Option<usize> {
        // zero-width boundary after a keyword
        if is_valid(valid, END_OF_TOKEN) && !cursor.lookahead().is_some_and(is_word_char) {
            return Some(END_OF_TOKEN);
        }

        while cursor.lookahead().is_some_and(char::is_whitespace) {
            cursor.skip();
        }

        match cursor.lookahead() {
            Some(quote @ ('\'' | '"')) => {
                (is_valid(valid, STRING) && scan_string(cursor, quote)).then_some(STRING)
            }
            Some(_) => (is_valid(valid, NUMBER) && scan_number(cursor)).then_some(NUMBER),
            None => None,
        }
    }
}

/// A quoted string starting at the opening `quote`. Unterminated strings do
/// not match.
fn scan_string(cursor: &mut ScanCursor<'_, '_>, quote: char) -> bool {
    cursor.advance();
    loop {
        match cursor.lookahead() {
            None => return false,
            Some(c) if c == quote => {
                cursor.advance();
                if cursor.lookahead() != Some(quote) {
                    cursor.mark_end();
                    return true;
                }
                cursor.advance();
            }
            Some(_) => cursor.advance(),
        }
    }
}

fn scan_digits(cursor: &mut ScanCursor<'_, '_>) -> usize {
    let mut count = 0;
    while cursor.lookahead().is_some_and(|c| c.is_ascii_digit()) {
        cursor.advance();
        count += 1;
    }
    count
}

/// `[+-]? digits? ('.' digits?)? ([eE] [+-]? digits)?` with at least one
/// integer or fraction digit.
fn scan_number(cursor: &mut ScanCursor<'_, '_>) -> bool {
    if matches!(cursor.lookahead(), Some('+' | '-')) {
        cursor.advance();
    }

    let integer = scan_digits(cursor);
    if integer > 0 {
        cursor.mark_end();
    }

    let mut fraction = 0;
    if cursor.lookahead() == Some('.') {
        cursor.advance();
        if cursor.lookahead() == Some('.') {
            // range operator: the number ends before it
            return integer > 0;
        }
        fraction = scan_digits(cursor);
        if integer + fraction > 0 {
            cursor.mark_end();
        }
    }
    if integer + fraction == 0 {
        return false;
    }

    if matches!(cursor.lookahead(), Some('e' | 'E')) {
        cursor.advance();
        if matches!(cursor.lookahead(), Some('+' | '-')) {
            cursor.advance();
        }
        if scan_digits(cursor) == 0 {
            return false;
        }
        cursor.mark_end();
    }
    true
}
