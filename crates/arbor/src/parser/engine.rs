use super::config::{ParseStats, ParserConfig};
use super::reuse::ReusableCursor;
use crate::error::SyntaxError;
use crate::grammar::{Action, GrammarTable, RuleId, StateId, SymbolId};
use crate::lexer::{ExternalScanner, Lexer, SourceReader, Token};
use crate::syntax::{GreenElement, GreenFlags, GreenNode, GreenToken, NodeMeta, Point, TextSize};
use std::sync::Arc;
use tracing::{trace, warn};

/// Recoveries allowed at one position before the run gives up
const MAX_STALLED_RECOVERIES: usize = 10_000;

/// Reductions allowed between two shifts beyond the height of the stack;
/// only a cyclic (malformed) table exceeds it
const REDUCTION_SLACK: usize = 100_000;

/// One entry of the parse stack
pub(super) struct Frame {
    pub(super) state: StateId,
    /// `None` only for the bottom frame
    pub(super) element: Option<GreenElement>,
    /// Absolute end offset of `element`
    pub(super) end: usize,
}

impl Frame {
    pub(super) fn is_extra(&self) -> bool {
        self.element.as_ref().is_some_and(GreenElement::is_extra)
    }
}

/// Outcome of one step of the parse loop
pub(super) enum Step {
    Continue(Token),
    Done(Arc<GreenNode>),
}

/// State of a single parse. Created by [`Parser`](super::Parser) for each
/// call and consumed by [`ParseRun::run`].
pub(super) struct ParseRun<'p, 'r> {
    pub(super) table: &'p GrammarTable,
    pub(super) lexer: Lexer<'p>,
    pub(super) reader: SourceReader<'r>,
    pub(super) scanner: Option<&'p mut dyn ExternalScanner>,
    pub(super) config: &'p ParserConfig,
    pub(super) stack: Vec<Frame>,
    /// End of the last consumed token
    pub(super) position: usize,
    pub(super) point: Point,
    /// Lex state to use for the next lookahead, after a subtree was reused
    pub(super) lex_override: Option<StateId>,
    pub(super) reuse: Option<ReusableCursor>,
    /// Padded start of the lookahead at which a token was last inserted
    pub(super) insertion_position: Option<usize>,
    pub(super) empty_external_at: Option<usize>,
    pub(super) errors: Vec<SyntaxError>,
    pub(super) stats: ParseStats,
}

impl<'p, 'r> ParseRun<'p, 'r> {
    pub(super) fn new(
        table: &'p GrammarTable,
        reader: SourceReader<'r>,
        scanner: Option<&'p mut dyn ExternalScanner>,
        config: &'p ParserConfig,
        reuse: Option<ReusableCursor>,
    ) -> Self {
        Self {
            table,
            lexer: Lexer::new(table),
            reader,
            scanner,
            config,
            stack: vec![Frame {
                state: table.start_state(),
                element: None,
                end: 0,
            }],
            position: 0,
            point: Point::default(),
            lex_override: None,
            reuse,
            insertion_position: None,
            empty_external_at: None,
            errors: Vec::new(),
            stats: ParseStats::default(),
        }
    }

    /// Drive the automaton until it accepts or recovery gives up.
    pub(super) fn run(&mut self) -> Arc<GreenNode> {
        let mut lookahead = self.lex();
        let mut stalled = 0usize;
        let mut last_position = self.position;
        let mut reductions = 0usize;
        let mut reduction_budget = self.stack.len() + REDUCTION_SLACK;

        loop {
            if lookahead.is_extra && !lookahead.is_error() {
                self.push_token(&lookahead, self.top_state(), GreenFlags::EXTRA);
                lookahead = self.lex();
                continue;
            }

            let state = self.top_state();
            match self.table.action(state, lookahead.symbol) {
                Some(Action::Shift { state: next, .. }) => {
                    if !self.try_reuse(&lookahead, state) {
                        trace!(symbol = lookahead.symbol.0, %state, %next, "shift");
                        self.push_token(&lookahead, next, GreenFlags::NONE);
                    }
                    lookahead = self.lex();
                    reductions = 0;
                    reduction_budget = self.stack.len() + REDUCTION_SLACK;
                    continue;
                }
                Some(Action::Reduce(rule)) => {
                    reductions += 1;
                    if reductions > reduction_budget {
                        warn!(rule = rule.0, reductions, "reductions without a shift; giving up");
                        return self.give_up(lookahead, true);
                    }
                    if self.reduce(rule, &lookahead) {
                        continue;
                    }
                }
                Some(Action::Accept) => return self.accept(&lookahead),
                None => {}
            }

            // no action, or a reduction without a goto
            if self.position == last_position {
                stalled += 1;
                if stalled > MAX_STALLED_RECOVERIES {
                    warn!(position = self.position, "recovery made no progress; giving up");
                    return self.give_up(lookahead, true);
                }
            } else {
                stalled = 0;
                last_position = self.position;
            }
            match self.recover(lookahead) {
                Step::Continue(token) => lookahead = token,
                Step::Done(root) => return root,
            }
            reductions = 0;
            reduction_budget = self.stack.len() + REDUCTION_SLACK;
        }
    }

    pub(super) fn top_state(&self) -> StateId {
        self.stack
            .last()
            .map_or(self.table.start_state(), |frame| frame.state)
    }

    fn top_end(&self) -> usize {
        self.stack.last().map_or(0, |frame| frame.end)
    }

    /// Lex the next lookahead in the current state's mode
    pub(super) fn lex(&mut self) -> Token {
        let state = self.lex_override.unwrap_or_else(|| self.top_state());
        self.lex_in(state)
    }

    pub(super) fn lex_in(&mut self, state: StateId) -> Token {
        // a zero-width external token may not repeat at the same offset
        let token = self
            .lexer
            .without_empty_external_at(self.empty_external_at)
            .next_token(
                &mut self.reader,
                self.scanner.as_deref_mut(),
                self.position,
                self.point,
                state,
            );
        self.stats.tokens_lexed += 1;
        if token.range.is_empty() && !token.is_end() && !token.is_error() {
            self.empty_external_at = Some(token.range.start().to_usize());
        }
        if !token.is_extra {
            self.lex_override = None;
        }
        token
    }

    /// Push a leaf for `token` and consume it
    pub(super) fn push_token(&mut self, token: &Token, state: StateId, flags: GreenFlags) {
        let mut leaf = GreenToken::new(token.symbol, token.padding, token.range.len())
            .with_lookahead(token.lookahead_bytes());
        if token.is_error() {
            leaf = leaf.with_flags(GreenFlags::ERROR);
        }
        leaf = leaf.with_flags(flags);
        self.stack.push(Frame {
            state,
            element: Some(leaf.into()),
            end: token.end(),
        });
        self.consume(token);
    }

    pub(super) fn consume(&mut self, token: &Token) {
        self.position = token.end();
        self.point = token.end_point;
    }

    /// Pop `rule`'s children, build its node and follow the goto. Returns
    /// `false` when the table has no goto for the result.
    fn reduce(&mut self, rule_id: RuleId, lookahead: &Token) -> bool {
        let Some(rule) = self.table.rule(rule_id) else {
            warn!(rule = rule_id.0, "reduce by unknown rule");
            return false;
        };
        let (lhs, child_count) = (rule.lhs, usize::from(rule.child_count));

        let mut trailing = Vec::new();
        while self.stack.len() > 1 && self.stack.last().is_some_and(Frame::is_extra) {
            trailing.extend(self.stack.pop());
        }

        let mut children = Vec::with_capacity(child_count);
        let mut structural = 0;
        while structural < child_count && self.stack.len() > 1 {
            let Some(frame) = self.stack.pop() else { break };
            if !frame.is_extra() {
                structural += 1;
            }
            children.extend(frame.element);
        }
        children.reverse();

        let parse_state = self.top_state();
        let start = self.top_end();
        // reduced across an error node: not reusable
        let after_error = trailing.iter().any(|frame| {
            frame
                .element
                .as_ref()
                .is_some_and(|element| element.flags().contains(GreenFlags::ERROR))
        });
        let meta = NodeMeta {
            rule: Some(rule_id),
            parse_state,
            lookahead_state: lookahead.lex_state,
            flags: if after_error { GreenFlags::FRAGILE } else { GreenFlags::NONE },
        };
        let node = GreenNode::new(lhs, children, meta);
        let end = start + node.text_len().to_usize();
        let node = node.extend_lookahead(TextSize::of(lookahead.lookahead_end.saturating_sub(end)));
        self.stats.nodes_created += 1;

        let resolved = match self.table.goto(parse_state, lhs) {
            Some(next) => {
                trace!(rule = rule_id.0, %parse_state, %next, "reduce");
                self.stack.push(Frame {
                    state: next,
                    element: Some(node.into()),
                    end,
                });
                true
            }
            None => {
                warn!(rule = rule_id.0, %parse_state, "missing goto after reduce");
                self.push_error_node(vec![node.into()]);
                false
            }
        };

        for frame in trailing.into_iter().rev() {
            self.push_element(frame.element, frame.end);
        }
        resolved
    }

    /// Re-push an element above the current top without changing state
    pub(super) fn push_element(&mut self, element: Option<GreenElement>, end: usize) {
        let state = self.top_state();
        self.stack.push(Frame {
            state,
            element,
            end,
        });
    }

    /// Wrap `contents` in an `ERROR` node and push it as an extra
    pub(super) fn push_error_node(&mut self, contents: Vec<GreenElement>) {
        if contents.is_empty() {
            return;
        }
        let state = self.top_state();
        let meta = NodeMeta {
            rule: None,
            parse_state: state,
            lookahead_state: state,
            flags: GreenFlags::ERROR | GreenFlags::EXTRA,
        };
        let node = GreenNode::new(SymbolId::ERROR, contents, meta);
        let end = self.top_end() + node.text_len().to_usize();
        self.stats.nodes_created += 1;
        self.stack.push(Frame {
            state,
            element: Some(node.into()),
            end,
        });
    }

    /// Try to push a subtree of the previous tree instead of shifting
    /// `lookahead`.
    fn try_reuse(&mut self, lookahead: &Token, state: StateId) -> bool {
        if !self.config.reuse_subtrees || lookahead.is_error() {
            return false;
        }
        let target = lookahead.padded_start();
        let table = self.table;
        let Some(cursor) = self.reuse.as_mut() else {
            return false;
        };

        let (node, next) = loop {
            let Some((element, _)) = cursor.seek(target) else {
                return false;
            };
            let GreenElement::Node(node) = element else {
                return false;
            };
            if let Some(next) = reusable(table, node, lookahead, state) {
                let node = Arc::clone(node);
                cursor.advance();
                break (node, next);
            }
            cursor.descend();
        };

        let end = target + node.text_len().to_usize();
        let text = self.reader.bytes(self.position, end);
        self.point = self.point.advance(&text);
        self.position = end;
        self.lex_override = Some(node.lookahead_state());
        self.stats.nodes_reused += 1;
        trace!(symbol = node.symbol().0, start = target, end, "reused subtree");
        self.stack.push(Frame {
            state: next,
            element: Some(node.into()),
            end,
        });
        true
    }

    /// Build the root once the start symbol is complete.
    fn accept(&mut self, end_token: &Token) -> Arc<GreenNode> {
        let frames: Vec<Frame> = self.stack.drain(1..).collect();
        let structural: Vec<&Frame> = frames.iter().filter(|frame| !frame.is_extra()).collect();
        let start_node = match structural.as_slice() {
            [frame] => frame.element.as_ref().and_then(GreenElement::as_node).cloned(),
            _ => None,
        };
        let Some(start_node) = start_node else {
            warn!("accept without a single start node");
            self.stack.extend(frames);
            return self.error_root(end_token);
        };

        let mut children = Vec::new();
        for frame in frames {
            match frame.element {
                Some(GreenElement::Node(node)) if Arc::ptr_eq(&node, &start_node) => {
                    children.extend(node.children().iter().cloned());
                }
                Some(element) => children.push(element),
                None => {}
            }
        }
        children.push(end_leaf(end_token));
        self.consume(end_token);

        let meta = NodeMeta {
            rule: start_node.rule(),
            parse_state: start_node.parse_state(),
            lookahead_state: end_token.lex_state,
            flags: GreenFlags::ROOT | GreenFlags::FRAGILE,
        };
        GreenNode::with_padding(start_node.symbol(), children, meta, TextSize::zero())
    }

    /// Wrap everything on the stack in an `ERROR` root.
    pub(super) fn error_root(&mut self, end_token: &Token) -> Arc<GreenNode> {
        let mut children: Vec<GreenElement> = self
            .stack
            .drain(1..)
            .filter_map(|frame| frame.element)
            .collect();
        children.push(end_leaf(end_token));
        self.consume(end_token);
        self.stats.nodes_created += 1;
        let meta = NodeMeta {
            rule: None,
            parse_state: self.table.start_state(),
            lookahead_state: end_token.lex_state,
            flags: GreenFlags::ERROR | GreenFlags::ROOT | GreenFlags::FRAGILE,
        };
        GreenNode::with_padding(SymbolId::ERROR, children, meta, TextSize::zero())
    }
}

/// The zero-width end-of-input leaf; it carries the trailing padding.
fn end_leaf(end_token: &Token) -> GreenElement {
    GreenToken::new(SymbolId::END, end_token.padding, TextSize::zero())
        .with_lookahead(end_token.lookahead_bytes())
        .with_flags(GreenFlags::EXTRA)
        .into()
}

/// The goto target if `node` can stand in for parsing from `state` with
/// `lookahead` as its first token.
fn reusable(
    table: &GrammarTable,
    node: &GreenNode,
    lookahead: &Token,
    state: StateId,
) -> Option<StateId> {
    const BLOCKING: [GreenFlags; 5] = [
        GreenFlags::STALE,
        GreenFlags::HAS_ERROR,
        GreenFlags::FRAGILE,
        GreenFlags::EXTRA,
        GreenFlags::ERROR,
    ];
    if BLOCKING.iter().any(|&flag| node.flags().contains(flag))
        || node.size() == TextSize::zero()
        || node.parse_state() != state
        || node.padding() != lookahead.padding
    {
        return None;
    }
    let first = node.first_leaf()?;
    if first.symbol() != lookahead.symbol
        || first.padding() != lookahead.padding
        || first.size() != lookahead.range.len()
    {
        return None;
    }
    table.goto(state, node.symbol())
}
