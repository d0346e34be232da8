use super::symbol::SymbolId;
use serde::{Deserialize, Serialize};

/// Index of a production rule; smaller ids were declared earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u16);

impl RuleId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// How equal-precedence shift/reduce conflicts on a rule are settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Associativity {
    #[default]
    None,
    /// Reduce first: `a - b - c` groups as `(a - b) - c`
    Left,
    /// Shift first: `a ^ b ^ c` groups as `a ^ (b ^ c)`
    Right,
}

/// A production rule `lhs -> child_count symbols`.
///
/// The right-hand side itself is not needed at runtime: a reduction pops
/// `child_count` structural children off the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub lhs: SymbolId,
    pub child_count: u16,
    pub precedence: i16,
    pub associativity: Associativity,
    /// Per structural child, an optional alias symbol to display instead
    #[serde(default)]
    pub aliases: Vec<Option<SymbolId>>,
}

impl Rule {
    #[must_use]
    pub const fn new(lhs: SymbolId, child_count: u16) -> Self {
        Self {
            lhs,
            child_count,
            precedence: 0,
            associativity: Associativity::None,
            aliases: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_precedence(mut self, precedence: i16) -> Self {
        self.precedence = precedence;
        self
    }

    #[must_use]
    pub const fn left(mut self) -> Self {
        self.associativity = Associativity::Left;
        self
    }

    #[must_use]
    pub const fn right(mut self) -> Self {
        self.associativity = Associativity::Right;
        self
    }

    /// Rename the structural child at `index` to `alias`
    #[must_use]
    pub fn with_alias(mut self, index: usize, alias: SymbolId) -> Self {
        if self.aliases.len() <= index {
            self.aliases.resize(index + 1, None);
        }
        self.aliases[index] = Some(alias);
        self
    }

    #[must_use]
    pub fn alias_at(&self, index: usize) -> Option<SymbolId> {
        self.aliases.get(index).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_builders() {
        let rule = Rule::new(SymbolId(5), 3)
            .with_precedence(2)
            .left()
            .with_alias(2, SymbolId(9));
        assert_eq!(rule.precedence, 2);
        assert_eq!(rule.associativity, Associativity::Left);
        assert_eq!(rule.alias_at(2), Some(SymbolId(9)));
        assert_eq!(rule.alias_at(0), None);
        assert_eq!(rule.alias_at(7), None);
    }
}
