//! # Error Types
//!
//! Loading a grammar is the only fallible operation in the runtime; it
//! returns [`GrammarLoadError`]. Syntax errors in the parsed text are not
//! failures: they are recorded as [`SyntaxError`] values on the tree, next to
//! the `ERROR` and `MISSING` nodes that recovery produced.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, both types integrate with
//! [`miette`] for rich error reporting with source labels.

use crate::syntax::TextRange;
use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Why a compiled grammar was rejected
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarLoadError {
    #[error("compiled grammar is truncated ({len} bytes)")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::too_short)))]
    TooShort { len: usize },

    #[error("not a compiled grammar (bad magic)")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::bad_magic)))]
    BadMagic,

    #[error("incompatible grammar ABI version {found}; supported {min}..={max}")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(grammar::incompatible_version),
            help("regenerate the grammar with a compatible generator")
        )
    )]
    IncompatibleVersion { found: u32, min: u32, max: u32 },

    #[error("malformed grammar body: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::malformed)))]
    Malformed(#[from] bincode::Error),

    #[error("symbol 0 must be the end-of-input symbol")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::missing_end)))]
    MissingEndSymbol,

    #[error("too many symbols: {count}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::too_many_symbols)))]
    TooManySymbols { count: usize },

    #[error("too many states: {count}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::too_many_states)))]
    TooManyStates { count: usize },

    #[error("{context} references unknown symbol {symbol}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::dangling_symbol)))]
    DanglingSymbol { symbol: u16, context: CompactString },

    #[error("{context} references unknown state {state}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::dangling_state)))]
    DanglingState { state: u16, context: CompactString },

    #[error("{context} references unknown rule {rule}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::dangling_rule)))]
    DanglingRule { rule: u16, context: CompactString },

    #[error("{context} references unknown lex mode {mode}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::dangling_lex_mode)))]
    DanglingLexMode { mode: u16, context: CompactString },

    #[error("{context} references unknown token rule {index}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::dangling_token)))]
    DanglingToken { index: u16, context: CompactString },

    #[error("start state {state} does not exist ({count} states)")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::invalid_start_state)))]
    InvalidStartState { state: u16, count: usize },

    #[error("symbol `{symbol}` cannot be used as {expected} in {context}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::symbol_kind)))]
    SymbolKindMismatch {
        symbol: CompactString,
        expected: &'static str,
        context: CompactString,
    },

    #[error("token `{symbol}` can match the empty string")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::nullable_token)))]
    NullableToken { symbol: CompactString },

    #[error("external token {index} is `{found}`, but the scanner provides `{expected}`")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(grammar::external_mismatch))
    )]
    ExternalScannerMismatch {
        index: usize,
        expected: CompactString,
        found: CompactString,
    },
}

/// A syntax problem found while parsing. The tree still covers the input;
/// these describe where recovery kicked in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum SyntaxError {
    #[error("unexpected `{found}`, expected one of: {}", .expected.join(", "))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(syntax::unexpected_token)))]
    UnexpectedToken {
        #[cfg_attr(feature = "diagnostics", label("unexpected token"))]
        span: TextRange,
        found: CompactString,
        expected: Vec<CompactString>,
    },

    #[error("unexpected end of input, expected one of: {}", .expected.join(", "))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(syntax::unexpected_end)))]
    UnexpectedEnd {
        #[cfg_attr(feature = "diagnostics", label("input ends here"))]
        span: TextRange,
        expected: Vec<CompactString>,
    },

    #[error("unrecognized input")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(syntax::unrecognized)))]
    UnrecognizedInput {
        #[cfg_attr(feature = "diagnostics", label("no token matches here"))]
        span: TextRange,
    },

    #[error("missing `{symbol}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(syntax::missing)))]
    Missing {
        #[cfg_attr(feature = "diagnostics", label("inserted here"))]
        span: TextRange,
        symbol: CompactString,
    },

    #[error("too many errors, the rest of the input was not parsed")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(syntax::too_many_errors)))]
    TooManyErrors {
        #[cfg_attr(feature = "diagnostics", label("skipped from here"))]
        span: TextRange,
    },
}

impl SyntaxError {
    /// Where the error was detected
    #[must_use]
    pub const fn span(&self) -> TextRange {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEnd { span, .. }
            | Self::UnrecognizedInput { span }
            | Self::Missing { span, .. }
            | Self::TooManyErrors { span } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TextSize;

    #[test]
    fn test_syntax_error_display() {
        let error = SyntaxError::UnexpectedToken {
            span: TextRange::new(TextSize::from(4), TextSize::from(5)),
            found: "$".into(),
            expected: vec!["number".into(), "(".into()],
        };
        assert_eq!(error.to_string(), "unexpected `$`, expected one of: number, (");
        assert_eq!(error.span().start(), TextSize::from(4));
    }

    #[test]
    fn test_load_error_display() {
        let error = GrammarLoadError::IncompatibleVersion {
            found: 99,
            min: 1,
            max: 2,
        };
        assert_eq!(
            error.to_string(),
            "incompatible grammar ABI version 99; supported 1..=2"
        );
    }
}
