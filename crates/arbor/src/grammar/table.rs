use super::action::{Action, resolve_conflict};
use super::format::{ABI_VERSION, CompiledGrammar, TokenRule};
use super::rule::{Rule, RuleId};
use super::symbol::{StateId, SymbolId, SymbolInfo, SymbolKind};
use super::validate::validate;
use crate::error::GrammarLoadError;
use compact_str::CompactString;
use hashbrown::HashMap;
use tracing::debug;

/// Lexer configuration for one parse state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexMode {
    /// Indexed by token rule
    tokens: Vec<bool>,
    /// Indexed by external token
    externals: Vec<bool>,
}

impl LexMode {
    #[inline]
    #[must_use]
    pub fn allows_token(&self, index: usize) -> bool {
        self.tokens.get(index).copied().unwrap_or(false)
    }

    /// Validity of each external token, in scanner order
    #[must_use]
    pub fn valid_externals(&self) -> &[bool] {
        &self.externals
    }

    #[must_use]
    pub fn has_externals(&self) -> bool {
        self.externals.iter().any(|&valid| valid)
    }
}

/// A validated, immutable parse table.
///
/// Built once per grammar and shared read-only by every parser (it is
/// `Send + Sync`). Actions and gotos live in dense `state x symbol` matrices
/// with conflicts already resolved.
#[derive(Debug)]
pub struct GrammarTable {
    name: CompactString,
    symbols: Vec<SymbolInfo>,
    rules: Vec<Rule>,
    state_count: usize,
    actions: Vec<Option<Action>>,
    gotos: Vec<Option<StateId>>,
    state_modes: Vec<u16>,
    lex_modes: Vec<LexMode>,
    recovery_mode: LexMode,
    token_rules: Vec<TokenRule>,
    extras: Vec<bool>,
    hidden_extras: Vec<bool>,
    externals: Vec<SymbolId>,
    start_state: StateId,
    symbol_by_name: HashMap<CompactString, SymbolId, ahash::RandomState>,
}

impl GrammarTable {
    /// Decode and validate a compiled grammar.
    pub fn load(bytes: &[u8]) -> Result<Self, GrammarLoadError> {
        Self::from_compiled(CompiledGrammar::from_bytes(bytes)?)
    }

    /// Validate an already-decoded grammar and build the runtime table.
    pub fn from_compiled(grammar: CompiledGrammar) -> Result<Self, GrammarLoadError> {
        validate(&grammar)?;

        let symbol_count = grammar.symbols.len();
        let state_count = grammar.states.len();
        let mut actions = vec![None; state_count * symbol_count];
        let mut gotos = vec![None; state_count * symbol_count];
        let mut conflicts = 0usize;

        for (state_index, state) in grammar.states.iter().enumerate() {
            let row = state_index * symbol_count;
            for (symbol, candidates) in &state.actions {
                let Some(action) = resolve_conflict(candidates, &grammar.rules) else {
                    continue;
                };
                if candidates.len() > 1 {
                    conflicts += 1;
                    debug!(
                        grammar = %grammar.name,
                        state = state_index,
                        symbol = %grammar.symbols[symbol.index()].name,
                        candidates = candidates.len(),
                        chosen = ?action,
                        "resolved table conflict"
                    );
                }
                actions[row + symbol.index()] = Some(action);
            }
            for &(symbol, target) in &state.gotos {
                gotos[row + symbol.index()] = Some(target);
            }
        }

        let mode = |tokens: &[u16], externals: &[u16]| {
            let mut mode = LexMode {
                tokens: vec![false; grammar.tokens.len()],
                externals: vec![false; grammar.externals.len()],
            };
            for &token in tokens {
                mode.tokens[usize::from(token)] = true;
            }
            for &external in externals {
                mode.externals[usize::from(external)] = true;
            }
            mode
        };
        let lex_modes: Vec<LexMode> = grammar
            .lex_modes
            .iter()
            .map(|compiled| mode(&compiled.tokens, &compiled.externals))
            .collect();
        let recovery_mode = LexMode {
            tokens: vec![true; grammar.tokens.len()],
            externals: vec![false; grammar.externals.len()],
        };

        let mut extras = vec![false; symbol_count];
        let mut hidden_extras = vec![false; symbol_count];
        for &extra in &grammar.extras {
            extras[extra.index()] = true;
            hidden_extras[extra.index()] = !grammar.symbols[extra.index()].visible;
        }

        let mut symbol_by_name =
            HashMap::with_capacity_and_hasher(symbol_count, ahash::RandomState::new());
        for (index, info) in grammar.symbols.iter().enumerate() {
            if info.kind != SymbolKind::Alias {
                symbol_by_name
                    .entry(info.name.clone())
                    .or_insert(SymbolId(index as u16));
            }
        }

        debug!(
            grammar = %grammar.name,
            symbols = symbol_count,
            states = state_count,
            rules = grammar.rules.len(),
            conflicts,
            abi = ABI_VERSION,
            "loaded grammar table"
        );

        Ok(Self {
            name: grammar.name,
            symbols: grammar.symbols,
            rules: grammar.rules,
            state_count,
            actions,
            gotos,
            state_modes: grammar.states.iter().map(|state| state.lex_mode).collect(),
            lex_modes,
            recovery_mode,
            token_rules: grammar.tokens,
            extras,
            hidden_extras,
            externals: grammar.externals,
            start_state: grammar.start_state,
            symbol_by_name,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub const fn state_count(&self) -> usize {
        self.state_count
    }

    #[must_use]
    pub const fn start_state(&self) -> StateId {
        self.start_state
    }

    #[must_use]
    pub fn symbol(&self, symbol: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(symbol.index())
    }

    /// Display name; `ERROR` for the builtin error symbol
    #[must_use]
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        if symbol.is_error() {
            return "ERROR";
        }
        self.symbol(symbol).map_or("", |info| info.name.as_str())
    }

    /// Look up a symbol by name. Aliases are not indexed.
    #[must_use]
    pub fn symbol_for_name(&self, name: &str) -> Option<SymbolId> {
        self.symbol_by_name.get(name).copied()
    }

    #[must_use]
    pub fn is_named(&self, symbol: SymbolId) -> bool {
        symbol.is_error() || self.symbol(symbol).is_some_and(|info| info.named)
    }

    #[must_use]
    pub fn is_visible(&self, symbol: SymbolId) -> bool {
        symbol.is_error() || self.symbol(symbol).is_some_and(|info| info.visible)
    }

    #[must_use]
    pub fn rule(&self, rule: RuleId) -> Option<&Rule> {
        self.rules.get(rule.index())
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[inline]
    #[must_use]
    pub fn action(&self, state: StateId, symbol: SymbolId) -> Option<Action> {
        if symbol.index() >= self.symbols.len() {
            return None;
        }
        self.actions
            .get(state.index() * self.symbols.len() + symbol.index())
            .copied()
            .flatten()
    }

    #[inline]
    #[must_use]
    pub fn goto(&self, state: StateId, symbol: SymbolId) -> Option<StateId> {
        if symbol.index() >= self.symbols.len() {
            return None;
        }
        self.gotos
            .get(state.index() * self.symbols.len() + symbol.index())
            .copied()
            .flatten()
    }

    /// Terminals with an action in `state`, in symbol order
    #[must_use]
    pub fn expected_symbols(&self, state: StateId) -> Vec<SymbolId> {
        (0..self.symbols.len())
            .map(|index| SymbolId(index as u16))
            .filter(|&symbol| self.action(state, symbol).is_some())
            .collect()
    }

    /// The lex mode used when lexing in `state`; [`StateId::RECOVERY`]
    /// selects the permissive recovery mode.
    #[must_use]
    pub fn lex_mode(&self, state: StateId) -> &LexMode {
        self.state_modes
            .get(state.index())
            .and_then(|&mode| self.lex_modes.get(usize::from(mode)))
            .unwrap_or(&self.recovery_mode)
    }

    #[must_use]
    pub fn token_rules(&self) -> &[TokenRule] {
        &self.token_rules
    }

    #[must_use]
    pub fn externals(&self) -> &[SymbolId] {
        &self.externals
    }

    #[inline]
    #[must_use]
    pub fn is_extra(&self, symbol: SymbolId) -> bool {
        self.extras.get(symbol.index()).copied().unwrap_or(false)
    }

    /// Extras folded into padding instead of appearing in the tree
    #[inline]
    #[must_use]
    pub fn is_hidden_extra(&self, symbol: SymbolId) -> bool {
        self.hidden_extras.get(symbol.index()).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::grammars;

    #[test]
    fn test_table_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GrammarTable>();
    }

    #[test]
    fn test_sum_table_lookup() {
        let table = grammars::sum_table();
        let number = table.symbol_for_name("number").unwrap();
        let sum = table.symbol_for_name("sum").unwrap();
        assert_eq!(table.name(), "sum");
        assert!(matches!(
            table.action(table.start_state(), number),
            Some(Action::Shift { .. })
        ));
        assert!(table.goto(table.start_state(), sum).is_some());
        assert_eq!(table.action(table.start_state(), SymbolId::ERROR), None);
        assert_eq!(table.symbol_name(SymbolId::ERROR), "ERROR");
        assert_eq!(table.expected_symbols(table.start_state()), vec![number]);
    }

    #[test]
    fn test_conflicts_resolved_by_precedence() {
        let table = grammars::arith_table();
        let plus = table.symbol_for_name("+").unwrap();
        let times = table.symbol_for_name("*").unwrap();
        // after `e + e`: reduce on `+` (left associative), shift on `*`
        let after_sum = grammars::ARITH_AFTER_SUM;
        assert!(matches!(table.action(after_sum, plus), Some(Action::Reduce(_))));
        assert!(matches!(table.action(after_sum, times), Some(Action::Shift { .. })));
        // after `e * e`: reduce on both
        let after_product = grammars::ARITH_AFTER_PRODUCT;
        assert!(matches!(table.action(after_product, plus), Some(Action::Reduce(_))));
        assert!(matches!(table.action(after_product, times), Some(Action::Reduce(_))));
    }

    #[test]
    fn test_hidden_extras() {
        let table = grammars::list_table();
        let whitespace = table.symbol_for_name("whitespace").unwrap();
        let comment = table.symbol_for_name("comment").unwrap();
        assert!(table.is_extra(whitespace) && table.is_hidden_extra(whitespace));
        assert!(table.is_extra(comment) && !table.is_hidden_extra(comment));
    }
}
