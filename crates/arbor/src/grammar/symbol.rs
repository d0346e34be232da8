use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a grammar symbol in its table.
///
/// Symbol `0` is always the end-of-input marker. [`SymbolId::ERROR`] is a
/// builtin that never appears in a table: the lexer uses it for unrecognized
/// input and the parser for error nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u16);

impl SymbolId {
    /// End of input
    pub const END: Self = Self(0);
    /// Error nodes and unrecognized input
    pub const ERROR: Self = Self(u16::MAX);

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.0 == u16::MAX
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a parse state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(pub u16);

impl StateId {
    /// Selects the permissive lex mode used while recovering from errors
    pub const RECOVERY: Self = Self(u16::MAX);

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// The role a symbol plays in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// The end-of-input marker (symbol 0 only)
    End,
    /// A token produced by the built-in lexer
    Terminal,
    /// A token produced by an external scanner
    External,
    /// A symbol produced by reductions
    NonTerminal,
    /// A name only ever used to rename children through rule aliases
    Alias,
}

impl SymbolKind {
    /// Whether the symbol can be the lookahead of an action
    #[must_use]
    pub const fn is_token(self) -> bool {
        matches!(self, Self::End | Self::Terminal | Self::External)
    }
}

/// Metadata the runtime needs about each symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: CompactString,
    pub kind: SymbolKind,
    /// Hidden symbols are spliced into their parent when rendered
    pub visible: bool,
    /// Named symbols show up in S-expressions; anonymous ones are punctuation
    pub named: bool,
}

impl SymbolInfo {
    #[must_use]
    pub fn new(name: impl Into<CompactString>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visible: true,
            named: true,
        }
    }

    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.named = false;
        self
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}
