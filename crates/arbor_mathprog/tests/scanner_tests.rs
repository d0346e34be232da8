//! The MathProg scanner driven through a small grammar with the same
//! external tokens:
//!
//! ```text
//! items -> items item | item
//! item  -> string | number | number '..' number | 'in' end_of_token | identifier
//! ```

use arbor::grammar::{CompiledGrammar, GrammarTable, GrammarTableBuilder, Rule, StateId, SymbolId};
use arbor::incremental::InputEdit;
use arbor::lexer::{CharSet, Pattern};
use arbor::testing::assert_sexp;
use arbor::{GrammarLoadError, Language, LanguageRegistry, Parser, SyntaxError};
use arbor_mathprog::{EXTERNAL_TOKEN_NAMES, LANGUAGE_NAME, MathprogScanner, check_externals};
use proptest::prelude::*;

fn items_grammar(externals: &[&str]) -> CompiledGrammar {
    let mut b = GrammarTableBuilder::new(LANGUAGE_NAME);
    let ext: Vec<SymbolId> = externals.iter().map(|name| b.external(name)).collect();
    let keyword_in = b.literal("in");
    let range = b.literal("..");
    let identifier = b.terminal(
        "identifier",
        Pattern::Seq(vec![
            Pattern::Class(CharSet::ident_start()),
            Pattern::zero_or_more(Pattern::Class(CharSet::ident_continue())),
        ]),
    );
    b.hidden_extra(
        "whitespace",
        Pattern::one_or_more(Pattern::Class(CharSet::whitespace())),
    );
    let items = b.non_terminal("items");
    let item = b.non_terminal("item");
    let (string, number) = (ext[0], ext[1]);

    let append = b.rule(Rule::new(items, 2));
    let first = b.rule(Rule::new(items, 1));
    let quoted = b.rule(Rule::new(item, 1));
    let scalar = b.rule(Rule::new(item, 1));
    let interval = b.rule(Rule::new(item, 3));
    let membership = b.rule(Rule::new(item, 2));
    let name = b.rule(Rule::new(item, 1));

    let s: Vec<StateId> = (0..11).map(|_| b.state()).collect();
    let follow = [SymbolId::END, string, number, keyword_in, identifier];
    for state in [s[0], s[1]] {
        b.shift(state, string, s[4])
            .shift(state, number, s[5])
            .shift(state, keyword_in, s[8])
            .shift(state, identifier, s[10]);
    }
    b.goto(s[0], items, s[1]).goto(s[0], item, s[2]);
    b.accept(s[1]).goto(s[1], item, s[3]);
    b.reduce(s[2], &follow, first);
    b.reduce(s[3], &follow, append);
    b.reduce(s[4], &follow, quoted);
    b.shift(s[5], range, s[6]).reduce(s[5], &follow, scalar);
    b.shift(s[6], number, s[7]);
    b.reduce(s[7], &follow, interval);
    if let Some(&boundary) = ext.get(2) {
        b.shift(s[8], boundary, s[9]);
    }
    b.reduce(s[9], &follow, membership);
    b.reduce(s[10], &follow, name);
    b.build()
}

fn items_table(externals: &[&str]) -> GrammarTable {
    GrammarTable::from_compiled(items_grammar(externals)).unwrap()
}

fn items() -> Language {
    Language::with_scanner(items_table(&EXTERNAL_TOKEN_NAMES), MathprogScanner::boxed)
}

fn parse(text: &str) -> arbor::Tree {
    Parser::new(items()).parse(text.as_bytes())
}

#[test]
fn test_strings_with_doubled_quotes() {
    let tree = parse("'it''s' \"say \"\"hi\"\"\"");
    assert_sexp(&tree, "(items (items (item (string))) (item (string)))");
    let root = tree.root_node();
    let second = root.child(1).unwrap().child(0).unwrap();
    assert_eq!(second.byte_range().as_range(), 8..20);
    assert!(!tree.has_error());
}

#[test]
fn test_unterminated_string_is_an_error() {
    let tree = parse("'abc");
    assert!(tree.has_error());
    assert_eq!(tree.root_node().byte_range().as_range(), 0..4);
}

#[test]
fn test_number_forms() {
    for text in ["42", "-7", "+3.25", "1.", ".5", "6.02e23", "1E-9", "2.5e+3"] {
        let tree = parse(text);
        assert_sexp(&tree, "(items (item (number)))");
        let number = tree.root_node().child(0).unwrap().child(0).unwrap();
        assert_eq!(number.utf8_text(text.as_bytes()).unwrap(), text);
    }
}

#[test]
fn test_number_stops_before_range() {
    let text = "1..5";
    let tree = parse(text);
    assert_sexp(&tree, "(items (item (number) (number)))");
    let item = tree.root_node().child(0).unwrap();
    assert_eq!(item.child(0).unwrap().byte_range().as_range(), 0..1);
    assert_eq!(item.child(1).unwrap().kind(), "..");
    assert_eq!(item.child(2).unwrap().byte_range().as_range(), 3..4);
}

#[test]
fn test_trailing_dot_number_then_number() {
    let tree = parse("1. 2");
    assert_sexp(&tree, "(items (items (item (number))) (item (number)))");
    assert_eq!(tree.root_node().child(0).unwrap().byte_range().as_range(), 0..2);
}

#[test]
fn test_dangling_exponent_does_not_match() {
    assert!(parse("1e").has_error());
    assert!(!parse("1 e").has_error());
}

#[test]
fn test_end_of_token_after_keyword() {
    let tree = parse("in");
    assert_sexp(&tree, "(items (item (end_of_token)))");
    let boundary = tree.root_node().child(0).unwrap().child(1).unwrap();
    assert!(boundary.byte_range().is_empty());
    assert_eq!(boundary.start_byte(), 2);
    // an identifier that merely starts with the keyword
    assert_sexp(&parse("inner"), "(items (item (identifier)))");
}

#[test]
fn test_external_token_after_end_of_token() {
    let tree = parse("in 5");
    assert!(!tree.has_error(), "{:?}", tree.errors());
    assert_sexp(&tree, "(items (items (item (end_of_token))) (item (number)))");
    let number = tree.root_node().child(1).unwrap().child(0).unwrap();
    assert_eq!(number.byte_range().as_range(), 3..4);

    let tree = parse("in 'a'");
    assert!(!tree.has_error(), "{:?}", tree.errors());
    assert_sexp(&tree, "(items (items (item (end_of_token))) (item (string)))");
}

#[test]
fn test_without_scanner_externals_are_errors() {
    let language = Language::new(items_table(&EXTERNAL_TOKEN_NAMES));
    let tree = Parser::new(language).parse(b"'a'");
    assert!(tree.has_error());
    assert!(
        tree.errors()
            .iter()
            .any(|error| matches!(error, SyntaxError::UnrecognizedInput { .. }))
    );
}

#[test]
fn test_reparse_after_editing_number() {
    let mut editor = arbor::IncrementalParser::new(items());
    editor.parse("'a' 1..5 x");
    let tree = editor.replace(5..6, "..").clone();
    assert_eq!(editor.text(), "'a' 1...5 x");
    let fresh = Parser::new(items()).parse(editor.text().as_bytes());
    assert!(tree.same_structure(&fresh));
    assert_eq!(tree.errors(), fresh.errors());
}

#[test]
fn test_check_externals_accepts_prefix() {
    assert!(check_externals(&items_table(&EXTERNAL_TOKEN_NAMES)).is_ok());
    assert!(check_externals(&items_table(&["string", "number"])).is_ok());
}

#[test]
fn test_check_externals_rejects_reordering() {
    let error = check_externals(&items_table(&["number", "string"])).unwrap_err();
    match error {
        GrammarLoadError::ExternalScannerMismatch {
            index,
            expected,
            found,
        } => {
            assert_eq!(index, 0);
            assert_eq!(expected, "string");
            assert_eq!(found, "number");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_language_loads_and_publishes() {
    let bytes = items_grammar(&["string", "number"]).to_bytes().unwrap();
    let language = arbor_mathprog::language(&bytes).unwrap();
    assert!(language.create_scanner().is_some());
    let published = LanguageRegistry::global().get(LANGUAGE_NAME).unwrap();
    assert!(published.ptr_eq(&language));

    let again = arbor_mathprog::language(&bytes).unwrap();
    assert!(again.ptr_eq(&language));

    let tree = Parser::new(language).parse(b"'x' 2..3");
    assert_sexp(&tree, "(items (items (item (string))) (item (number) (number)))");
}

#[test]
fn test_language_rejects_mismatched_externals() {
    let bytes = items_grammar(&["string", "number", "boundary"]).to_bytes().unwrap();
    let result = arbor_mathprog::language(&bytes);
    assert!(matches!(
        result,
        Err(GrammarLoadError::ExternalScannerMismatch { index: 2, .. })
    ));
}

fn number_text() -> impl Strategy<Value = String> {
    (
        prop::option::of(prop::sample::select(vec!["+", "-"])),
        "[0-9]{0,6}",
        prop::option::of("[0-9]{0,4}"),
        prop::option::of(("[eE]", prop::option::of("[+-]"), "[0-9]{1,3}")),
    )
        .prop_filter("needs a digit", |(_, integer, fraction, _)| {
            !integer.is_empty() || fraction.as_ref().is_some_and(|f| !f.is_empty())
        })
        .prop_map(|(sign, integer, fraction, exponent)| {
            let mut text = String::from(sign.unwrap_or(""));
            text.push_str(&integer);
            if let Some(fraction) = fraction {
                text.push('.');
                text.push_str(&fraction);
            }
            if let Some((marker, exponent_sign, digits)) = exponent {
                text.push_str(&marker);
                text.push_str(&exponent_sign.unwrap_or_default());
                text.push_str(&digits);
            }
            text
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_well_formed_numbers_are_one_token(text in number_text()) {
        let tree = parse(&text);
        prop_assert!(!tree.has_error(), "{text}");
        let number = tree.root_node().child(0).unwrap().child(0).unwrap();
        prop_assert_eq!(number.kind(), "number");
        prop_assert_eq!(number.byte_range().as_range(), 0..text.len());
    }

    #[test]
    fn prop_reparse_matches_fresh_parse(
        source in "(in|[0-9a-z.' ]){0,12}",
        start in 0usize..30,
        len in 0usize..5,
        replacement in "(in|[0-9a-z.' ]){0,3}",
    ) {
        let start = start.min(source.len());
        let end = (start + len).min(source.len());

        let mut parser = Parser::new(items());
        let old = parser.parse(source.as_bytes());
        let (edit, text) = InputEdit::replace(&source, start..end, &replacement);
        let reparsed = parser.reparse(&old.edit(&edit), text.as_bytes());
        let fresh = Parser::new(items()).parse(text.as_bytes());

        prop_assert_eq!(reparsed.len(), text.len());
        prop_assert!(
            reparsed.same_structure(&fresh),
            "`{}` -> `{}`\nreparsed {}\nfresh    {}",
            source,
            text,
            reparsed.to_sexp(),
            fresh.to_sexp()
        );
        prop_assert_eq!(reparsed.errors(), fresh.errors());
    }
}
