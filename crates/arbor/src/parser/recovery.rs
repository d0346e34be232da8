//! Error recovery.
//!
//! When the lookahead has no action, the parser records a [`SyntaxError`]
//! and tries, in order:
//!
//! 1. inserting one missing token, if that lets the lookahead be consumed
//!    (at most once per position);
//! 2. popping stack frames until some state can consume the lookahead,
//!    wrapping the popped frames and any skipped tokens in an `ERROR` node;
//! 3. skipping the lookahead (lexing the next one permissively) and
//!    retrying step 2.
//!
//! At end of input with nothing to synchronize on, the whole stack becomes
//! an `ERROR` root. Every path consumes input or shrinks the stack, so
//! parsing always terminates with a tree.

use super::engine::{Frame, ParseRun, Step};
use crate::error::SyntaxError;
use crate::grammar::{Action, StateId, SymbolId, SymbolKind};
use crate::lexer::Token;
use crate::syntax::{GreenElement, GreenFlags, GreenNode, GreenToken, TextRange, TextSize};
use compact_str::CompactString;
use std::sync::Arc;
use tracing::debug;

/// Reductions simulated per probe before the probe counts as a failure
const SIMULATION_LIMIT: usize = 4096;

impl ParseRun<'_, '_> {
    pub(super) fn recover(&mut self, lookahead: Token) -> Step {
        self.stats.errors_recovered += 1;

        if !self.config.error_recovery {
            self.record_unexpected(&lookahead);
            return Step::Done(self.give_up(lookahead, false));
        }
        if self.stats.errors_recovered > self.config.max_errors {
            return Step::Done(self.give_up(lookahead, true));
        }

        if self.insertion_position != Some(lookahead.padded_start())
            && self.try_insert(&lookahead)
        {
            self.insertion_position = Some(lookahead.padded_start());
            return Step::Continue(lookahead);
        }

        self.record_unexpected(&lookahead);
        self.panic_mode(lookahead)
    }

    /// Pop frames or skip tokens until the lookahead fits
    fn panic_mode(&mut self, lookahead: Token) -> Step {
        let mut skipped: Vec<GreenElement> = Vec::new();
        let mut token = lookahead;

        loop {
            if !token.is_extra
                && let Some(depth) = self.find_sync_depth(token.symbol)
            {
                let mut contents: Vec<GreenElement> = self
                    .stack
                    .drain(depth + 1..)
                    .filter_map(|frame| frame.element)
                    .collect();
                debug!(
                    popped = contents.len(),
                    skipped = skipped.len(),
                    position = token.padded_start(),
                    "recovered by synchronizing"
                );
                contents.append(&mut skipped);
                self.push_error_node(contents);
                return Step::Continue(token);
            }

            if token.is_end() {
                self.push_error_node(std::mem::take(&mut skipped));
                if self.try_insert(&token) {
                    return Step::Continue(token);
                }
                debug!("no synchronization point before end of input");
                return Step::Done(self.error_root(&token));
            }

            skipped.push(skipped_leaf(&token));
            self.consume(&token);
            token = self.lex_in(StateId::RECOVERY);
        }
    }

    /// Stop recovering: wrap the rest of the input in one `ERROR` node and
    /// everything on the stack in an `ERROR` root.
    pub(super) fn give_up(&mut self, lookahead: Token, too_many_errors: bool) -> Arc<GreenNode> {
        if too_many_errors {
            self.errors.push(SyntaxError::TooManyErrors {
                span: TextRange::at(lookahead.range.start(), TextSize::zero()),
            });
        }
        let mut skipped = Vec::new();
        let mut token = lookahead;
        while !token.is_end() {
            skipped.push(skipped_leaf(&token));
            self.consume(&token);
            token = self.lex_in(StateId::RECOVERY);
        }
        self.push_error_node(skipped);
        self.error_root(&token)
    }

    /// Insert the first terminal (in symbol order) after which `lookahead`
    /// can be consumed.
    fn try_insert(&mut self, lookahead: &Token) -> bool {
        if !self.config.token_insertion {
            return false;
        }
        let state = self.top_state();
        let table = self.table;
        let base = self.structural_states(self.stack.len() - 1);
        let candidate = (1..table.symbol_count())
            .filter_map(|index| u16::try_from(index).ok().map(SymbolId))
            .filter(|&symbol| {
                table.symbol(symbol).is_some_and(|info| {
                    matches!(info.kind, SymbolKind::Terminal | SymbolKind::External)
                }) && !table.is_extra(symbol)
            })
            .find_map(|symbol| match table.action(state, symbol) {
                Some(Action::Shift { state: next, .. }) => {
                    let mut states = base.clone();
                    states.push(next);
                    self.can_consume(states, lookahead.symbol)
                        .then_some((symbol, next))
                }
                _ => None,
            });

        let Some((symbol, next)) = candidate else {
            return false;
        };
        let span = TextRange::empty(TextSize::of(self.position));
        debug!(
            symbol = table.symbol_name(symbol),
            position = self.position,
            "inserted missing token"
        );
        self.errors.push(SyntaxError::Missing {
            span,
            symbol: CompactString::from(table.symbol_name(symbol)),
        });
        let leaf = GreenToken::missing(symbol, TextSize::zero());
        let end = self.position;
        self.stack.push(Frame {
            state: next,
            element: Some(leaf.into()),
            end,
        });
        true
    }

    /// The deepest-first search for a frame whose state can consume
    /// `symbol`, starting from the top of the stack.
    fn find_sync_depth(&self, symbol: SymbolId) -> Option<usize> {
        (0..self.stack.len())
            .rev()
            .filter(|&depth| depth == 0 || !self.stack[depth].is_extra())
            .find(|&depth| self.can_consume(self.structural_states(depth), symbol))
    }

    /// States of the non-extra frames up to and including `depth`
    fn structural_states(&self, depth: usize) -> Vec<StateId> {
        self.stack[..=depth]
            .iter()
            .enumerate()
            .filter(|(index, frame)| *index == 0 || !frame.is_extra())
            .map(|(_, frame)| frame.state)
            .collect()
    }

    /// Whether the automaton, starting from `states`, would eventually
    /// shift or accept `symbol`.
    fn can_consume(&self, mut states: Vec<StateId>, symbol: SymbolId) -> bool {
        for _ in 0..SIMULATION_LIMIT {
            let Some(&top) = states.last() else {
                return false;
            };
            match self.table.action(top, symbol) {
                Some(Action::Shift { .. } | Action::Accept) => return true,
                Some(Action::Reduce(rule)) => {
                    let Some(rule) = self.table.rule(rule) else {
                        return false;
                    };
                    let count = usize::from(rule.child_count);
                    if count >= states.len() {
                        return false;
                    }
                    states.truncate(states.len() - count);
                    let Some(&below) = states.last() else {
                        return false;
                    };
                    match self.table.goto(below, rule.lhs) {
                        Some(next) => states.push(next),
                        None => return false,
                    }
                }
                None => return false,
            }
        }
        false
    }

    fn record_unexpected(&mut self, lookahead: &Token) {
        let table = self.table;
        let expected: Vec<CompactString> = table
            .expected_symbols(self.top_state())
            .into_iter()
            .map(|symbol| CompactString::from(table.symbol_name(symbol)))
            .collect();
        let error = if lookahead.is_error() {
            SyntaxError::UnrecognizedInput {
                span: lookahead.range,
            }
        } else if lookahead.is_end() {
            SyntaxError::UnexpectedEnd {
                span: lookahead.range,
                expected,
            }
        } else {
            SyntaxError::UnexpectedToken {
                span: lookahead.range,
                found: CompactString::from(table.symbol_name(lookahead.symbol)),
                expected,
            }
        };
        debug!(%error, "syntax error");
        self.errors.push(error);
    }
}

/// A consumed-but-unparsed token, as it appears inside an `ERROR` node
fn skipped_leaf(token: &Token) -> GreenElement {
    let mut flags = GreenFlags::NONE;
    if token.is_error() {
        flags = flags | GreenFlags::ERROR;
    }
    if token.is_extra {
        flags = flags | GreenFlags::EXTRA;
    }
    GreenToken::new(token.symbol, token.padding, token.range.len())
        .with_lookahead(token.lookahead_bytes())
        .with_flags(flags)
        .into()
}
