//! Load-time consistency checks for compiled grammars.
//!
//! Everything the parser indexes at runtime is checked here once, so the hot
//! loop can trust the table.

use super::action::Action;
use super::format::CompiledGrammar;
use super::symbol::{StateId, SymbolId, SymbolKind};
use crate::error::GrammarLoadError;
use compact_str::{CompactString, format_compact};

/// Check every cross-reference in `grammar`.
pub fn validate(grammar: &CompiledGrammar) -> Result<(), GrammarLoadError> {
    let checker = Checker { grammar };
    checker.symbols()?;
    checker.rules()?;
    checker.tokens()?;
    checker.lex_modes()?;
    checker.states()?;
    Ok(())
}

struct Checker<'g> {
    grammar: &'g CompiledGrammar,
}

impl Checker<'_> {
    fn symbols(&self) -> Result<(), GrammarLoadError> {
        let symbols = &self.grammar.symbols;
        if symbols.len() >= usize::from(u16::MAX) {
            return Err(GrammarLoadError::TooManySymbols {
                count: symbols.len(),
            });
        }
        match symbols.first() {
            Some(info) if info.kind == SymbolKind::End => {}
            _ => return Err(GrammarLoadError::MissingEndSymbol),
        }
        if let Some(info) = symbols.iter().skip(1).find(|info| info.kind == SymbolKind::End) {
            return Err(GrammarLoadError::SymbolKindMismatch {
                symbol: info.name.clone(),
                expected: "a regular symbol",
                context: "symbol table".into(),
            });
        }
        for &extra in &self.grammar.extras {
            self.expect_kind(extra, "extra", "an extra", |kind| {
                matches!(kind, SymbolKind::Terminal | SymbolKind::External)
            })?;
        }
        for &external in &self.grammar.externals {
            self.expect_kind(external, "external", "an external token", |kind| {
                kind == SymbolKind::External
            })?;
        }
        Ok(())
    }

    fn rules(&self) -> Result<(), GrammarLoadError> {
        for (index, rule) in self.grammar.rules.iter().enumerate() {
            let context = format_compact!("rule {index}");
            self.expect_kind(rule.lhs, &context, "a rule's left-hand side", |kind| {
                kind == SymbolKind::NonTerminal
            })?;
            for alias in rule.aliases.iter().flatten() {
                self.expect_kind(*alias, &context, "an alias", |kind| kind != SymbolKind::End)?;
            }
        }
        Ok(())
    }

    fn tokens(&self) -> Result<(), GrammarLoadError> {
        for (index, token) in self.grammar.tokens.iter().enumerate() {
            let context = format_compact!("token rule {index}");
            self.expect_kind(token.symbol, &context, "a lexed token", |kind| {
                kind == SymbolKind::Terminal
            })?;
            if token.pattern.is_nullable() {
                return Err(GrammarLoadError::NullableToken {
                    symbol: self.name(token.symbol),
                });
            }
        }
        Ok(())
    }

    fn lex_modes(&self) -> Result<(), GrammarLoadError> {
        for (index, mode) in self.grammar.lex_modes.iter().enumerate() {
            let context = format_compact!("lex mode {index}");
            if let Some(&bad) = mode
                .tokens
                .iter()
                .find(|&&token| usize::from(token) >= self.grammar.tokens.len())
            {
                return Err(GrammarLoadError::DanglingToken {
                    index: bad,
                    context,
                });
            }
            if let Some(&bad) = mode
                .externals
                .iter()
                .find(|&&external| usize::from(external) >= self.grammar.externals.len())
            {
                return Err(GrammarLoadError::DanglingToken {
                    index: bad,
                    context: format_compact!("{context} (external)"),
                });
            }
        }
        Ok(())
    }

    fn states(&self) -> Result<(), GrammarLoadError> {
        let count = self.grammar.states.len();
        if count >= usize::from(u16::MAX) {
            return Err(GrammarLoadError::TooManyStates { count });
        }
        if self.grammar.start_state.index() >= count {
            return Err(GrammarLoadError::InvalidStartState {
                state: self.grammar.start_state.0,
                count,
            });
        }
        for (index, state) in self.grammar.states.iter().enumerate() {
            let context = format_compact!("state {index}");
            if usize::from(state.lex_mode) >= self.grammar.lex_modes.len() {
                return Err(GrammarLoadError::DanglingLexMode {
                    mode: state.lex_mode,
                    context,
                });
            }
            for (symbol, candidates) in &state.actions {
                self.expect_kind(*symbol, &context, "an action lookahead", SymbolKind::is_token)?;
                for action in candidates {
                    self.action(*action, &context)?;
                }
            }
            for &(symbol, target) in &state.gotos {
                self.expect_kind(symbol, &context, "a goto symbol", |kind| {
                    kind == SymbolKind::NonTerminal
                })?;
                self.state_ref(target, &context)?;
            }
        }
        Ok(())
    }

    fn action(&self, action: Action, context: &str) -> Result<(), GrammarLoadError> {
        match action {
            Action::Shift { state, rule, .. } => {
                self.state_ref(state, context)?;
                if let Some(rule) = rule {
                    self.rule_ref(rule.0, context)?;
                }
            }
            Action::Reduce(rule) => self.rule_ref(rule.0, context)?,
            Action::Accept => {}
        }
        Ok(())
    }

    fn state_ref(&self, state: StateId, context: &str) -> Result<(), GrammarLoadError> {
        if state.index() < self.grammar.states.len() {
            Ok(())
        } else {
            Err(GrammarLoadError::DanglingState {
                state: state.0,
                context: context.into(),
            })
        }
    }

    fn rule_ref(&self, rule: u16, context: &str) -> Result<(), GrammarLoadError> {
        if usize::from(rule) < self.grammar.rules.len() {
            Ok(())
        } else {
            Err(GrammarLoadError::DanglingRule {
                rule,
                context: context.into(),
            })
        }
    }

    fn expect_kind(
        &self,
        symbol: SymbolId,
        context: &str,
        expected: &'static str,
        allowed: impl Fn(SymbolKind) -> bool,
    ) -> Result<(), GrammarLoadError> {
        let Some(info) = self.grammar.symbols.get(symbol.index()) else {
            return Err(GrammarLoadError::DanglingSymbol {
                symbol: symbol.0,
                context: context.into(),
            });
        };
        if allowed(info.kind) {
            Ok(())
        } else {
            Err(GrammarLoadError::SymbolKindMismatch {
                symbol: info.name.clone(),
                expected,
                context: context.into(),
            })
        }
    }

    fn name(&self, symbol: SymbolId) -> CompactString {
        self.grammar
            .symbols
            .get(symbol.index())
            .map_or_else(|| format_compact!("{symbol}"), |info| info.name.clone())
    }
}
