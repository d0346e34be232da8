//! # Grammar Tables
//!
//! The read-only data that drives parsing: symbols, rules, the action and
//! goto tables, and the lexical rules.
//!
//! Tables are produced by an external generator and arrive as bytes
//! ([`format`]). [`GrammarTable::load`] checks the header and version,
//! validates every cross-reference, resolves conflicting actions by
//! precedence, associativity and declaration order, and expands the result
//! into dense matrices. A [`Language`] pairs a table with an optional
//! external scanner; the [`LanguageRegistry`] shares loaded languages across
//! a process.

pub mod action;
pub mod builder;
pub mod format;
pub mod language;
pub mod registry;
pub mod rule;
pub mod symbol;
pub mod table;
mod validate;

pub use action::{Action, resolve_conflict};
pub use builder::GrammarTableBuilder;
pub use format::{
    ABI_VERSION, CompiledGrammar, CompiledLexMode, CompiledState, MIN_COMPATIBLE_ABI_VERSION,
    TokenRule,
};
pub use language::{Language, ScannerFactory};
pub use registry::LanguageRegistry;
pub use rule::{Associativity, Rule, RuleId};
pub use symbol::{StateId, SymbolId, SymbolInfo, SymbolKind};
pub use table::{GrammarTable, LexMode};
