//! Parser configuration and per-parse statistics.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`Parser`](super::Parser)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ParserConfig {
    /// Recover from syntax errors. When off, the first error wraps the rest
    /// of the input in a single `ERROR` node.
    pub error_recovery: bool,

    /// Maximum number of recoveries before the rest of the input is skipped
    pub max_errors: usize,

    /// Reuse unchanged subtrees of an edited tree when reparsing
    pub reuse_subtrees: bool,

    /// Try inserting a single missing token before falling back to skipping
    pub token_insertion: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            error_recovery: true,
            max_errors: 64,
            reuse_subtrees: true,
            token_insertion: true,
        }
    }
}

/// Counters for the most recent parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ParseStats {
    /// Tokens produced by the lexer, including skipped ones
    pub tokens_lexed: usize,
    /// Interior nodes built (reductions and error nodes)
    pub nodes_created: usize,
    /// Subtrees taken whole from the previous tree
    pub nodes_reused: usize,
    /// Syntax errors recovered from
    pub errors_recovered: usize,
    pub parse_time: Duration,
}
