//! Small hand-built grammars used by the tests, benchmarks and docs.
//!
//! Each fixture comes in three forms: the [`CompiledGrammar`] (what a
//! generator would emit), the loaded [`GrammarTable`], and a [`Language`].
//! Every call builds a fresh, unshared language.

use crate::grammar::{
    CompiledGrammar, GrammarTable, GrammarTableBuilder, Language, Rule, StateId, SymbolId,
};
use crate::lexer::{CharSet, Pattern};

fn whitespace() -> Pattern {
    Pattern::one_or_more(Pattern::Class(CharSet::whitespace()))
}

fn number() -> Pattern {
    Pattern::one_or_more(Pattern::Class(CharSet::digits()))
}

fn load(grammar: CompiledGrammar) -> GrammarTable {
    let name = grammar.name.clone();
    GrammarTable::from_compiled(grammar)
        .unwrap_or_else(|error| panic!("fixture grammar `{name}` is invalid: {error}"))
}

/// Left-recursive sums of numbers:
///
/// ```text
/// sum -> sum '+' num | num
/// num -> number
/// ```
#[must_use]
pub fn sum_grammar() -> CompiledGrammar {
    let mut b = GrammarTableBuilder::new("sum");
    let number = b.terminal("number", number());
    let plus = b.literal("+");
    b.hidden_extra("whitespace", whitespace());
    let sum = b.non_terminal("sum");
    let num = b.non_terminal("num");

    let add = b.rule(Rule::new(sum, 3));
    let single = b.rule(Rule::new(sum, 1));
    let wrap = b.rule(Rule::new(num, 1));

    let s: Vec<StateId> = (0..6).map(|_| b.state()).collect();
    let follow = [SymbolId::END, plus];
    b.shift(s[0], number, s[3]).goto(s[0], sum, s[1]).goto(s[0], num, s[2]);
    b.accept(s[1]).shift(s[1], plus, s[4]);
    b.reduce(s[2], &follow, single);
    b.reduce(s[3], &follow, wrap);
    b.shift(s[4], number, s[3]).goto(s[4], num, s[5]);
    b.reduce(s[5], &follow, add);
    b.build()
}

#[must_use]
pub fn sum_table() -> GrammarTable {
    load(sum_grammar())
}

#[must_use]
pub fn sum() -> Language {
    Language::new(sum_table())
}

/// State after `expr '+' expr`
pub const ARITH_AFTER_SUM: StateId = StateId(7);
/// State after `expr '*' expr`
pub const ARITH_AFTER_PRODUCT: StateId = StateId(8);

/// Ambiguous arithmetic, disambiguated by precedence and associativity:
///
/// ```text
/// expr -> expr '+' expr   (prec 1, left)
///       | expr '*' expr   (prec 2, left)
///       | '(' expr ')'
///       | number
/// ```
///
/// The operator states carry both a shift and a reduce candidate on `+`
/// and `*`; loading resolves them.
#[must_use]
pub fn arith_grammar() -> CompiledGrammar {
    let mut b = GrammarTableBuilder::new("arith");
    let number = b.terminal("number", number());
    let plus = b.literal("+");
    let times = b.literal("*");
    let open = b.literal("(");
    let close = b.literal(")");
    b.hidden_extra("whitespace", whitespace());
    let expr = b.non_terminal("expr");

    let add = b.rule(Rule::new(expr, 3).with_precedence(1).left());
    let mul = b.rule(Rule::new(expr, 3).with_precedence(2).left());
    let group = b.rule(Rule::new(expr, 3));
    let atom = b.rule(Rule::new(expr, 1));

    let s: Vec<StateId> = (0..10).map(|_| b.state()).collect();
    let follow = [SymbolId::END, plus, times, close];
    for (state, target) in [(s[0], s[1]), (s[3], s[6]), (s[4], s[7]), (s[5], s[8])] {
        b.shift(state, number, s[2])
            .shift(state, open, s[3])
            .goto(state, expr, target);
    }
    b.accept(s[1]).shift(s[1], plus, s[4]).shift(s[1], times, s[5]);
    b.reduce(s[2], &follow, atom);
    b.shift(s[6], close, s[9]).shift(s[6], plus, s[4]).shift(s[6], times, s[5]);
    for (state, rule) in [(s[7], add), (s[8], mul)] {
        b.shift_item(state, plus, s[4], add)
            .shift_item(state, times, s[5], mul)
            .reduce(state, &follow, rule);
    }
    b.reduce(s[9], &follow, group);
    b.build()
}

#[must_use]
pub fn arith_table() -> GrammarTable {
    load(arith_grammar())
}

#[must_use]
pub fn arith() -> Language {
    Language::new(arith_table())
}

/// Comma-separated identifiers with `#` line comments. Identifiers in a
/// list are presented as `item`:
///
/// ```text
/// list -> list ',' identifier     (identifier as item)
///       | identifier              (identifier as item)
/// ```
#[must_use]
pub fn list_grammar() -> CompiledGrammar {
    let mut b = GrammarTableBuilder::new("list");
    let identifier = b.terminal(
        "identifier",
        Pattern::Seq(vec![
            Pattern::Class(CharSet::ident_start()),
            Pattern::zero_or_more(Pattern::Class(CharSet::ident_continue())),
        ]),
    );
    let comma = b.literal(",");
    b.extra(
        "comment",
        Pattern::Seq(vec![Pattern::literal("#"), Pattern::zero_or_more(Pattern::AnyChar)]),
    );
    b.hidden_extra("whitespace", whitespace());
    let list = b.non_terminal("list");
    let item = b.alias("item", true);

    let append = b.rule(Rule::new(list, 3).with_alias(2, item));
    let first = b.rule(Rule::new(list, 1).with_alias(0, item));

    let s: Vec<StateId> = (0..5).map(|_| b.state()).collect();
    let follow = [SymbolId::END, comma];
    b.shift(s[0], identifier, s[2]).goto(s[0], list, s[1]);
    b.accept(s[1]).shift(s[1], comma, s[3]);
    b.reduce(s[2], &follow, first);
    b.shift(s[3], identifier, s[4]);
    b.reduce(s[4], &follow, append);
    b.build()
}

#[must_use]
pub fn list_table() -> GrammarTable {
    load(list_grammar())
}

#[must_use]
pub fn list() -> Language {
    Language::new(list_table())
}
