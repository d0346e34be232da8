use super::rule::{Associativity, Rule, RuleId};
use super::symbol::StateId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A parse action for a (state, lookahead terminal) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Push the lookahead and move to `state`.
    ///
    /// `precedence` and `rule` describe the item being advanced and are only
    /// consulted when the cell holds a conflict.
    Shift {
        state: StateId,
        precedence: i16,
        rule: Option<RuleId>,
    },
    /// Pop the rule's children and push its left-hand side
    Reduce(RuleId),
    /// The start symbol is complete and the lookahead is end of input
    Accept,
}

impl Action {
    /// A shift with no conflict metadata
    #[must_use]
    pub const fn shift(state: StateId) -> Self {
        Self::Shift {
            state,
            precedence: 0,
            rule: None,
        }
    }

    fn precedence(self, rules: &[Rule]) -> i16 {
        match self {
            Self::Shift { precedence, .. } => precedence,
            Self::Reduce(rule) => rules.get(rule.index()).map_or(0, |r| r.precedence),
            Self::Accept => i16::MAX,
        }
    }

    fn rule(self) -> Option<RuleId> {
        match self {
            Self::Shift { rule, .. } => rule,
            Self::Reduce(rule) => Some(rule),
            Self::Accept => None,
        }
    }
}

/// Pick one action out of the candidates listed for a table cell.
///
/// Higher precedence wins. A shift/reduce tie is settled by the reduce
/// rule's associativity, anything left over by declaration order, and an
/// exact tie keeps the candidate listed first. Returns `None` for an empty
/// cell.
#[must_use]
pub fn resolve_conflict(candidates: &[Action], rules: &[Rule]) -> Option<Action> {
    let (&first, rest) = candidates.split_first()?;
    Some(rest.iter().fold(first, |best, &candidate| {
        if beats(candidate, best, rules) {
            candidate
        } else {
            best
        }
    }))
}

/// Whether `a` is strictly preferred over `b`
fn beats(a: Action, b: Action, rules: &[Rule]) -> bool {
    match (a, b) {
        (Action::Accept, Action::Accept) => return false,
        (Action::Accept, _) => return true,
        (_, Action::Accept) => return false,
        _ => {}
    }

    match a.precedence(rules).cmp(&b.precedence(rules)) {
        Ordering::Greater => return true,
        Ordering::Less => return false,
        Ordering::Equal => {}
    }

    let associativity = |rule: RuleId| {
        rules
            .get(rule.index())
            .map_or(Associativity::None, |r| r.associativity)
    };
    match (a, b) {
        (Action::Shift { .. }, Action::Reduce(rule)) => match associativity(rule) {
            Associativity::Right => return true,
            Associativity::Left => return false,
            Associativity::None => {}
        },
        (Action::Reduce(rule), Action::Shift { .. }) => match associativity(rule) {
            Associativity::Left => return true,
            Associativity::Right => return false,
            Associativity::None => {}
        },
        _ => {}
    }

    match (a.rule(), b.rule()) {
        (Some(x), Some(y)) => x < y,
        (Some(_), None) => true,
        _ => false,
    }
}
