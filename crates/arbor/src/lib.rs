//! # Arbor
//!
//! A grammar-driven, incremental LR parsing runtime.
//!
//! ## Overview
//!
//! Arbor loads parse tables produced by an external grammar generator and
//! turns source text into concrete syntax trees. It provides:
//!
//! - **Table loading**: versioned, validated compiled grammars with
//!   conflict resolution by precedence and associativity
//! - **Context-aware lexing**: each parse state lexes only the tokens it can
//!   accept, with optional hand-written external scanners
//! - **Error recovery**: every input produces a tree; problems show up as
//!   `ERROR` nodes, `MISSING` leaves and [`SyntaxError`] records
//! - **Incremental reparsing**: edited trees share untouched subtrees and
//!   the parser reuses them wholesale
//! - **Navigation**: nodes with parent links, cursors, S-expressions
//!
//! ## Quick Start
//!
//! ```rust
//! use arbor::incremental::InputEdit;
//! use arbor::parser::Parser;
//! use arbor::testing::grammars;
//!
//! let mut parser = Parser::new(grammars::sum());
//! let tree = parser.parse(b"1+2+3");
//! assert_eq!(
//!     tree.to_sexp(),
//!     "(sum (sum (sum (num (number))) (num (number))) (num (number)))"
//! );
//!
//! let (edit, text) = InputEdit::replace("1+2+3", 2..3, "9");
//! let new_tree = parser.reparse(&tree.edit(&edit), text.as_bytes());
//! assert!(new_tree.same_structure(&parser.parse(text.as_bytes())));
//! ```
//!
//! ## Feature Flags
//!
//! - `diagnostics`: `miette::Diagnostic` for the error types
//! - `serialize`: serde derives for configuration, statistics and edits
//! - `parallel`: [`parser::parse_batch`] on the rayon thread pool

pub mod error;
pub mod grammar;
pub mod incremental;
pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod testing;

// Re-export commonly used types
pub use error::{GrammarLoadError, SyntaxError};
pub use grammar::{GrammarTable, Language, LanguageRegistry, StateId, SymbolId};
pub use incremental::{IncrementalParser, InputEdit};
pub use lexer::{ExternalScanner, ScanCursor, TextInput};
pub use parser::{ParseStats, Parser, ParserConfig};
pub use syntax::{Node, Point, TextRange, TextSize, Tree, TreeCursor};
