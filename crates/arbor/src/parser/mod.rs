//! # LR Parser
//!
//! A table-driven shift/reduce parser that always produces a tree.
//!
//! The engine pulls tokens from the [`Lexer`](crate::lexer::Lexer) one at a
//! time, in the lex mode of its current state, and follows the resolved
//! action table. Syntax errors never abort a parse: the recovery machinery
//! inserts a missing token, or wraps the offending input in an `ERROR`
//! node, and parsing continues (see [`ParserConfig`] for the knobs).
//!
//! Given the previous tree of an edited document, the parser reuses every
//! subtree the edit could not have affected instead of rebuilding it.

pub mod config;
mod engine;
#[cfg(feature = "parallel")]
pub mod parallel;
mod recovery;
mod reuse;

pub use config::{ParseStats, ParserConfig};
#[cfg(feature = "parallel")]
pub use parallel::parse_batch;

use crate::grammar::Language;
use crate::lexer::{ExternalScanner, SourceReader, TextInput};
use crate::syntax::Tree;
use engine::ParseRun;
use reuse::ReusableCursor;
use std::time::Instant;
use tracing::{debug, debug_span, warn};

/// Parses text of one language.
///
/// A parser owns its external scanner instance, so it is `Send` but not
/// shared: use one parser per thread.
pub struct Parser {
    language: Language,
    config: ParserConfig,
    scanner: Option<Box<dyn ExternalScanner>>,
    stats: ParseStats,
}

impl Parser {
    /// Create a parser for `language`. Never fails: the table was validated
    /// when the language was loaded.
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self::with_config(language, ParserConfig::default())
    }

    #[must_use]
    pub fn with_config(language: Language, config: ParserConfig) -> Self {
        let scanner = language.create_scanner();
        Self {
            language,
            config,
            scanner,
            stats: ParseStats::default(),
        }
    }

    #[must_use]
    pub const fn language(&self) -> &Language {
        &self.language
    }

    /// Switch languages. The external scanner is replaced too.
    pub fn set_language(&mut self, language: Language) {
        self.scanner = language.create_scanner();
        self.language = language;
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ParserConfig) {
        self.config = config;
    }

    /// Counters for the most recent parse
    #[must_use]
    pub const fn last_stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Parse `text` from scratch
    pub fn parse(&mut self, text: &[u8]) -> Tree {
        let mut input = text;
        self.parse_input(&mut input, None)
    }

    /// Parse the new contents of a document whose previous tree has been
    /// brought up to date with [`Tree::edit`].
    pub fn reparse(&mut self, old_tree: &Tree, text: &[u8]) -> Tree {
        let mut input = text;
        self.parse_input(&mut input, Some(old_tree))
    }

    /// Parse text supplied in chunks, optionally reusing an edited tree.
    ///
    /// An old tree of a different language is ignored.
    pub fn parse_input(&mut self, input: &mut dyn TextInput, old_tree: Option<&Tree>) -> Tree {
        let _span = debug_span!("parse", language = self.language.name()).entered();
        let started = Instant::now();

        if let Some(scanner) = self.scanner.as_mut() {
            scanner.reset();
        }
        let old_tree = old_tree.filter(|tree| {
            let same = tree.language().ptr_eq(&self.language);
            if !same {
                warn!(
                    old = tree.language().name(),
                    new = self.language.name(),
                    "ignoring previous tree of another language"
                );
            }
            same
        });
        let reuse = old_tree
            .filter(|_| self.config.reuse_subtrees)
            .map(|tree| ReusableCursor::new(tree.green()));

        let scanner = self
            .scanner
            .as_mut()
            .map(|scanner| &mut **scanner as &mut dyn ExternalScanner);
        let mut run = ParseRun::new(
            self.language.table(),
            SourceReader::new(input),
            scanner,
            &self.config,
            reuse,
        );
        let root = run.run();
        let ParseRun {
            errors, mut stats, ..
        } = run;
        stats.parse_time = started.elapsed();

        debug!(
            len = root.text_len().to_usize(),
            tokens = stats.tokens_lexed,
            created = stats.nodes_created,
            reused = stats.nodes_reused,
            errors = errors.len(),
            "parse finished"
        );
        self.stats = stats;
        Tree::new(root, self.language.clone(), errors)
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::ChunkedInput;
    use crate::testing::grammars;

    #[test]
    fn test_stats_are_recorded() {
        let mut parser = Parser::new(grammars::sum());
        let tree = parser.parse(b"1+2+3");
        assert!(!tree.has_error());
        let stats = parser.last_stats();
        assert_eq!(stats.nodes_reused, 0);
        assert_eq!(stats.errors_recovered, 0);
        // three numbers, two pluses and the end
        assert_eq!(stats.tokens_lexed, 6);
        assert!(stats.nodes_created >= 5);
    }

    #[test]
    fn test_chunked_input_matches_slice() {
        let text = b"12 + 3 + 456".to_vec();
        let mut parser = Parser::new(grammars::sum());
        let whole = parser.parse(&text);

        let mut chunks = ChunkedInput::new(|offset| {
            text.get(offset..)
                .map(|rest| rest.iter().take(2).copied().collect())
                .unwrap_or_default()
        });
        let chunked = parser.parse_input(&mut chunks, None);
        assert!(whole.same_structure(&chunked));
        assert_eq!(chunked.to_sexp(), whole.to_sexp());
    }

    #[test]
    fn test_tree_of_other_language_is_ignored() {
        let mut parser = Parser::new(grammars::sum());
        let foreign = Parser::new(grammars::arith()).parse(b"1+2");
        let tree = parser.reparse(&foreign, b"1+2");
        assert!(!tree.has_error());
        assert_eq!(parser.last_stats().nodes_reused, 0);
    }

    #[test]
    fn test_recovery_disabled_wraps_rest_in_error() {
        let config = ParserConfig {
            error_recovery: false,
            ..ParserConfig::default()
        };
        let mut parser = Parser::with_config(grammars::arith(), config);
        let tree = parser.parse(b"1+)2");
        assert!(tree.has_error());
        assert_eq!(tree.errors().len(), 1);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root_node().kind(), "ERROR");
    }
}
