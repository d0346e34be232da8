use super::action::Action;
use super::format::{CompiledGrammar, CompiledLexMode, CompiledState, TokenRule};
use super::rule::{Rule, RuleId};
use super::symbol::{StateId, SymbolId, SymbolInfo, SymbolKind};
use crate::lexer::Pattern;
use compact_str::CompactString;
use hashbrown::HashMap;

/// Assembles a [`CompiledGrammar`] by hand.
///
/// Grammars normally come out of a table generator; the builder covers the
/// cases where a small table is written directly (tests, fixtures, tools).
/// Lex modes are derived from the actions: a state may lex exactly the
/// tokens it has actions for, plus the extras.
///
/// ```rust
/// use arbor::grammar::{GrammarTable, GrammarTableBuilder, Rule};
/// use arbor::lexer::{CharSet, Pattern};
///
/// let mut b = GrammarTableBuilder::new("digits");
/// let digit = b.terminal("digit", Pattern::Class(CharSet::digits()));
/// let number = b.non_terminal("number");
/// let rule = b.rule(Rule::new(number, 1));
/// let (s0, s1, s2) = (b.state(), b.state(), b.state());
/// b.shift(s0, digit, s1).reduce(s1, &[arbor::grammar::SymbolId::END], rule);
/// b.goto(s0, number, s2).accept(s2);
/// let table = GrammarTable::from_compiled(b.build()).unwrap();
/// assert_eq!(table.state_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct GrammarTableBuilder {
    name: CompactString,
    symbols: Vec<SymbolInfo>,
    rules: Vec<Rule>,
    states: Vec<CompiledState>,
    tokens: Vec<TokenRule>,
    extras: Vec<SymbolId>,
    externals: Vec<SymbolId>,
    start_state: StateId,
}

impl GrammarTableBuilder {
    #[must_use]
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            symbols: vec![SymbolInfo::new("end", SymbolKind::End)],
            rules: Vec::new(),
            states: Vec::new(),
            tokens: Vec::new(),
            extras: Vec::new(),
            externals: Vec::new(),
            start_state: StateId(0),
        }
    }

    /// Register a symbol as-is
    pub fn symbol(&mut self, info: SymbolInfo) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u16);
        self.symbols.push(info);
        id
    }

    /// A named token matched by `pattern`
    pub fn terminal(&mut self, name: &str, pattern: Pattern) -> SymbolId {
        let id = self.symbol(SymbolInfo::new(name, SymbolKind::Terminal));
        self.tokens.push(TokenRule { symbol: id, pattern });
        id
    }

    /// An anonymous token spelled exactly `text`
    pub fn literal(&mut self, text: &str) -> SymbolId {
        let id = self.symbol(SymbolInfo::new(text, SymbolKind::Terminal).anonymous());
        self.tokens.push(TokenRule {
            symbol: id,
            pattern: Pattern::literal(text),
        });
        id
    }

    /// Another pattern producing an existing token
    pub fn token_pattern(&mut self, symbol: SymbolId, pattern: Pattern) -> &mut Self {
        self.tokens.push(TokenRule { symbol, pattern });
        self
    }

    /// A hidden extra: folded into the padding of the following token
    pub fn hidden_extra(&mut self, name: &str, pattern: Pattern) -> SymbolId {
        let id = self.symbol(SymbolInfo::new(name, SymbolKind::Terminal).hidden());
        self.tokens.push(TokenRule { symbol: id, pattern });
        self.extras.push(id);
        id
    }

    /// A visible extra such as a comment: kept in the tree wherever it occurs
    pub fn extra(&mut self, name: &str, pattern: Pattern) -> SymbolId {
        let id = self.terminal(name, pattern);
        self.extras.push(id);
        id
    }

    /// A token produced by the external scanner, in scanner order
    pub fn external(&mut self, name: &str) -> SymbolId {
        let id = self.symbol(SymbolInfo::new(name, SymbolKind::External));
        self.externals.push(id);
        id
    }

    pub fn non_terminal(&mut self, name: &str) -> SymbolId {
        self.symbol(SymbolInfo::new(name, SymbolKind::NonTerminal))
    }

    /// A display name used only through rule aliases
    pub fn alias(&mut self, name: &str, named: bool) -> SymbolId {
        let info = SymbolInfo::new(name, SymbolKind::Alias);
        self.symbol(if named { info } else { info.anonymous() })
    }

    pub fn rule(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.rules.len() as u16);
        self.rules.push(rule);
        id
    }

    /// Append an empty state
    pub fn state(&mut self) -> StateId {
        let id = StateId(self.states.len() as u16);
        self.states.push(CompiledState::default());
        id
    }

    pub fn start(&mut self, state: StateId) -> &mut Self {
        self.start_state = state;
        self
    }

    /// Add a candidate action; several candidates on one cell form a
    /// conflict that is resolved at load time.
    pub fn action(&mut self, state: StateId, symbol: SymbolId, action: Action) -> &mut Self {
        let row = &mut self.states[state.index()].actions;
        if let Some((_, candidates)) = row.iter_mut().find(|(s, _)| *s == symbol) {
            candidates.push(action);
        } else {
            row.push((symbol, vec![action]));
        }
        self
    }

    pub fn shift(&mut self, state: StateId, symbol: SymbolId, target: StateId) -> &mut Self {
        self.action(state, symbol, Action::shift(target))
    }

    /// A shift advancing an item of `rule`, carrying that rule's precedence
    pub fn shift_item(
        &mut self,
        state: StateId,
        symbol: SymbolId,
        target: StateId,
        rule: RuleId,
    ) -> &mut Self {
        let precedence = self.rules[rule.index()].precedence;
        self.action(
            state,
            symbol,
            Action::Shift {
                state: target,
                precedence,
                rule: Some(rule),
            },
        )
    }

    /// Reduce `rule` on each lookahead in `on`
    pub fn reduce(&mut self, state: StateId, on: &[SymbolId], rule: RuleId) -> &mut Self {
        for &symbol in on {
            self.action(state, symbol, Action::Reduce(rule));
        }
        self
    }

    pub fn accept(&mut self, state: StateId) -> &mut Self {
        self.action(state, SymbolId::END, Action::Accept)
    }

    pub fn goto(&mut self, state: StateId, symbol: SymbolId, target: StateId) -> &mut Self {
        self.states[state.index()].gotos.push((symbol, target));
        self
    }

    /// Finish, deriving one lex mode per distinct set of valid tokens.
    #[must_use]
    pub fn build(mut self) -> CompiledGrammar {
        let mut modes: Vec<CompiledLexMode> = Vec::new();
        let mut mode_ids: HashMap<CompiledLexMode, u16, ahash::RandomState> = HashMap::default();
        for state in &mut self.states {
            let has_action = |symbol: SymbolId| state.actions.iter().any(|(s, _)| *s == symbol);
            let mode = CompiledLexMode {
                tokens: (0..self.tokens.len())
                    .filter(|&i| has_action(self.tokens[i].symbol))
                    .map(|i| i as u16)
                    .collect(),
                externals: (0..self.externals.len())
                    .filter(|&i| has_action(self.externals[i]))
                    .map(|i| i as u16)
                    .collect(),
            };
            state.lex_mode = *mode_ids.entry(mode.clone()).or_insert_with(|| {
                modes.push(mode);
                (modes.len() - 1) as u16
            });
        }

        CompiledGrammar {
            name: self.name,
            symbols: self.symbols,
            rules: self.rules,
            states: self.states,
            lex_modes: modes,
            tokens: self.tokens,
            extras: self.extras,
            externals: self.externals,
            start_state: self.start_state,
        }
    }
}
