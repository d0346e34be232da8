//! # Lexer
//!
//! Context-aware tokenization driven by the grammar table.
//!
//! The parser asks for one token at a time, passing the parse state it is
//! in. Only token rules valid in that state's lex mode compete (plus the
//! grammar's extras), so the same text can lex differently in different
//! contexts. Among the candidates the longest match wins; on a tie the rule
//! declared first wins.
//!
//! When nothing in the mode matches, every token of the grammar is tried,
//! so that recovery sees `+` rather than raw text where an operand was due.
//!
//! Hidden extras (whitespace) never reach the parser: they are folded into
//! the padding of the next token. Text no rule matches becomes a single
//! error token spanning the whole unmatchable run, so lexing always makes
//! progress.

pub mod input;
pub mod pattern;
pub mod scanner;

pub use input::{ChunkedInput, SourceReader, TextInput};
pub use pattern::{CharSet, Pattern};
pub use scanner::{ExternalScanner, ScanCursor};

use crate::grammar::{GrammarTable, LexMode, StateId, SymbolId};
use crate::syntax::{Point, TextRange, TextSize};
use tracing::trace;

/// A lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: SymbolId,
    /// Hidden extras before the token
    pub padding: TextSize,
    /// The token's own bytes
    pub range: TextRange,
    pub start_point: Point,
    pub end_point: Point,
    /// Exclusive end of the bytes examined while producing this token
    pub lookahead_end: usize,
    /// The state whose lex mode produced this token
    pub lex_state: StateId,
    /// A visible extra (comment)
    pub is_extra: bool,
}

impl Token {
    /// Start of the padding
    #[must_use]
    pub fn padded_start(&self) -> usize {
        (self.range.start() - self.padding).to_usize()
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.range.end().to_usize()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.symbol.is_error()
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.symbol == SymbolId::END
    }

    /// Bytes examined past the token's end
    #[must_use]
    pub fn lookahead_bytes(&self) -> TextSize {
        TextSize::of(self.lookahead_end.saturating_sub(self.end()))
    }
}

/// Table-driven lexer. Borrowed per parse; holds no state of its own.
#[derive(Clone, Copy)]
pub struct Lexer<'t> {
    table: &'t GrammarTable,
    /// Offset at which the scanner may not produce another empty token
    empty_external_at: Option<usize>,
}

impl<'t> Lexer<'t> {
    #[must_use]
    pub const fn new(table: &'t GrammarTable) -> Self {
        Self {
            table,
            empty_external_at: None,
        }
    }

    /// The same lexer, rejecting zero-width external tokens at `offset`.
    /// Non-empty external tokens there are still scanned.
    #[must_use]
    pub const fn without_empty_external_at(self, offset: Option<usize>) -> Self {
        Self {
            empty_external_at: offset,
            ..self
        }
    }

    /// Lex the next token starting at `position` (a token boundary, whose
    /// row/column is `point`) using the lex mode of `state`.
    pub fn next_token<'s>(
        &self,
        reader: &mut SourceReader<'_>,
        mut scanner: Option<&mut (dyn ExternalScanner + 's)>,
        position: usize,
        point: Point,
        state: StateId,
    ) -> Token {
        let mode = self.table.lex_mode(state);
        reader.reset_max_read(position);
        let mut cursor = position;

        loop {
            if state != StateId::RECOVERY
                && mode.has_externals()
                && let Some(scanner) = scanner.as_deref_mut()
                && let Some((symbol, start, end)) = self.scan_external(reader, scanner, mode, cursor)
            {
                if self.table.is_hidden_extra(symbol) && end > start {
                    cursor = end;
                    continue;
                }
                return self.finish(reader, symbol, position, point, start, end, state);
            }

            match self.longest_match(reader, mode, cursor) {
                Some((symbol, end)) if self.table.is_hidden_extra(symbol) => cursor = end,
                Some((symbol, end)) => {
                    return self.finish(reader, symbol, position, point, cursor, end, state);
                }
                None if reader.byte_at(cursor).is_none() => {
                    return self.finish(reader, SymbolId::END, position, point, cursor, cursor, state);
                }
                None => {
                    // nothing in the mode matched: try every token
                    let fallback = self.table.lex_mode(StateId::RECOVERY);
                    if let Some((symbol, end)) = self.longest_match(reader, fallback, cursor) {
                        return self.finish(reader, symbol, position, point, cursor, end, state);
                    }
                    let end = self.unmatchable_run(reader, fallback, cursor);
                    trace!(start = cursor, end, "unrecognized input");
                    return self.finish(reader, SymbolId::ERROR, position, point, cursor, end, state);
                }
            }
        }
    }

    fn scan_external(
        &self,
        reader: &mut SourceReader<'_>,
        scanner: &mut dyn ExternalScanner,
        mode: &LexMode,
        position: usize,
    ) -> Option<(SymbolId, usize, usize)> {
        let valid = mode.valid_externals();
        let mut cursor = ScanCursor::new(reader, position);
        let index = scanner.scan(&mut cursor, valid)?;
        if !valid.get(index).copied().unwrap_or(false) {
            return None;
        }
        let (start, end) = (cursor.token_start(), cursor.token_end());
        if start == end && self.empty_external_at == Some(start) {
            trace!(start, "repeated empty external token rejected");
            return None;
        }
        let symbol = *self.table.externals().get(index)?;
        Some((symbol, start, end))
    }

    /// Longest non-empty match among the mode's tokens and the extras
    fn longest_match(
        &self,
        reader: &mut SourceReader<'_>,
        mode: &LexMode,
        position: usize,
    ) -> Option<(SymbolId, usize)> {
        let mut best: Option<(SymbolId, usize)> = None;
        for (index, rule) in self.table.token_rules().iter().enumerate() {
            if !mode.allows_token(index) && !self.table.is_extra(rule.symbol) {
                continue;
            }
            if let Some(end) = rule.pattern.longest_match(reader, position)
                && end > position
                && best.is_none_or(|(_, best_end)| end > best_end)
            {
                best = Some((rule.symbol, end));
            }
        }
        best
    }

    /// End of the run of characters at which no candidate matches
    fn unmatchable_run(&self, reader: &mut SourceReader<'_>, mode: &LexMode, start: usize) -> usize {
        let mut end = start;
        while let Some((_, width)) = reader.char_at(end) {
            end += width;
            if reader.byte_at(end).is_none() || self.longest_match(reader, mode, end).is_some() {
                break;
            }
        }
        end.max(start + 1)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        reader: &mut SourceReader<'_>,
        symbol: SymbolId,
        position: usize,
        point: Point,
        start: usize,
        end: usize,
        state: StateId,
    ) -> Token {
        let start_point = point.advance(&reader.bytes(position, start));
        let end_point = start_point.advance(&reader.bytes(start, end));
        trace!(symbol = symbol.0, start, end, %state, "lexed token");
        Token {
            symbol,
            padding: TextSize::of(start - position),
            range: TextRange::new(TextSize::of(start), TextSize::of(end)),
            start_point,
            end_point,
            lookahead_end: reader.max_read().max(end),
            lex_state: state,
            is_extra: self.table.is_extra(symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::grammars;

    fn lex_all(table: &GrammarTable, text: &str, state: StateId) -> Vec<(String, &'static str)> {
        let mut input = text;
        let mut reader = SourceReader::new(&mut input);
        let lexer = Lexer::new(table);
        let mut position = 0;
        let mut point = Point::default();
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token(&mut reader, None, position, point, state);
            if token.is_end() {
                return out;
            }
            let name: &'static str = match table.symbol_name(token.symbol) {
                "number" => "number",
                "+" => "+",
                "*" => "*",
                "(" => "(",
                ")" => ")",
                "comment" => "comment",
                "identifier" => "identifier",
                "," => ",",
                "ERROR" => "ERROR",
                _ => "?",
            };
            out.push((text[token.range.as_range()].to_string(), name));
            position = token.end();
            point = token.end_point;
        }
    }

    #[test]
    fn test_recovery_mode_lexes_every_token() {
        let table = grammars::arith_table();
        let tokens = lex_all(&table, "12 + (3*4)", StateId::RECOVERY);
        assert_eq!(
            tokens,
            vec![
                ("12".into(), "number"),
                ("+".into(), "+"),
                ("(".into(), "("),
                ("3".into(), "number"),
                ("*".into(), "*"),
                ("4".into(), "number"),
                (")".into(), ")"),
            ]
        );
    }

    #[test]
    fn test_mode_prefers_its_own_tokens() {
        let table = grammars::arith_table();
        let plus = table.symbol_for_name("+").unwrap();
        // the start state expects an operand; `+` is still lexed as `+`
        // rather than as unrecognized text
        let mut input = "+1";
        let mut reader = SourceReader::new(&mut input);
        let token = Lexer::new(&table).next_token(
            &mut reader,
            None,
            0,
            Point::default(),
            table.start_state(),
        );
        assert_eq!(token.symbol, plus);
        assert_eq!(token.range, TextRange::new(TextSize::from(0), TextSize::from(1)));
        assert_eq!(token.lex_state, table.start_state());
    }

    #[test]
    fn test_padding_and_points() {
        let table = grammars::arith_table();
        let mut input = "  \n 42";
        let mut reader = SourceReader::new(&mut input);
        let token = Lexer::new(&table).next_token(
            &mut reader,
            None,
            0,
            Point::default(),
            StateId::RECOVERY,
        );
        assert_eq!(token.padding, TextSize::from(4));
        assert_eq!(token.range.as_range(), 4..6);
        assert_eq!(token.start_point, Point::new(1, 1));
        assert_eq!(token.end_point, Point::new(1, 3));
        // the number pattern probed end of input
        assert_eq!(token.lookahead_end, 7);
        assert_eq!(token.lookahead_bytes(), TextSize::from(1));
    }

    #[test]
    fn test_unmatchable_run_is_one_token() {
        let table = grammars::arith_table();
        let tokens = lex_all(&table, "1 $$é 2", StateId::RECOVERY);
        assert_eq!(
            tokens,
            vec![
                ("1".into(), "number"),
                ("$$é".into(), "ERROR"),
                ("2".into(), "number"),
            ]
        );
    }

    #[test]
    fn test_visible_extras_are_tokens() {
        let table = grammars::list_table();
        let tokens = lex_all(&table, "a, # note\nb", StateId::RECOVERY);
        assert_eq!(
            tokens,
            vec![
                ("a".into(), "identifier"),
                (",".into(), ","),
                ("# note".into(), "comment"),
                ("b".into(), "identifier"),
            ]
        );
    }

    #[test]
    fn test_end_token_carries_trailing_padding() {
        let table = grammars::arith_table();
        let mut input = "7  ";
        let mut reader = SourceReader::new(&mut input);
        let lexer = Lexer::new(&table);
        let first = lexer.next_token(&mut reader, None, 0, Point::default(), StateId::RECOVERY);
        let end = lexer.next_token(&mut reader, None, first.end(), first.end_point, StateId::RECOVERY);
        assert!(end.is_end());
        assert_eq!(end.padding, TextSize::from(2));
        assert_eq!(end.range, TextRange::empty(TextSize::from(3)));
    }
}
