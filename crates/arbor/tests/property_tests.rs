//! Property-based tests for the parser and incremental reparsing
//!
//! Random inputs (valid, invalid and plain bytes) must always produce a
//! tree covering the input, and reparsing after an edit must agree with a
//! fresh parse of the edited text.

use arbor::incremental::InputEdit;
use arbor::parser::Parser;
use arbor::syntax::{Node, Tree};
use arbor::testing::grammars;
use arbor::Language;
use proptest::prelude::*;

/// Well-formed arithmetic, with random spacing
fn arith_expression() -> impl Strategy<Value = String> {
    let leaf = (0u32..1000).prop_map(|n| n.to_string());
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), "[ ]{0,2}", prop_oneof![Just("+"), Just("*")], "[ ]{0,2}", inner.clone())
                .prop_map(|(lhs, pad1, op, pad2, rhs)| format!("{lhs}{pad1}{op}{pad2}{rhs}")),
            inner.prop_map(|e| format!("({e})")),
        ]
    })
}

/// Text over the arithmetic alphabet, mostly invalid
fn arith_noise() -> impl Strategy<Value = String> {
    "[0-9+*() ]{0,30}"
}

/// Identifier lists with commas, comments and line breaks
fn list_noise() -> impl Strategy<Value = String> {
    "[a-z, #\n]{0,30}"
}

/// Check that every node lies within its parent and siblings are ordered
fn check_ranges(node: &Node<'_>) -> Result<(), TestCaseError> {
    let mut previous_end = node.start_byte();
    for child in node.children() {
        prop_assert!(child.start_byte() >= previous_end, "{child:?} overlaps its sibling");
        prop_assert!(child.end_byte() <= node.end_byte(), "{child:?} escapes {node:?}");
        prop_assert!(child.start_byte() <= child.end_byte());
        previous_end = child.end_byte();
        check_ranges(&child)?;
    }
    Ok(())
}

fn check_tree(tree: &Tree, source: &[u8]) -> Result<(), TestCaseError> {
    prop_assert_eq!(tree.len(), source.len());
    let root = tree.root_node();
    prop_assert_eq!(root.byte_range().as_range(), 0..source.len());
    check_ranges(&root)?;
    for error in tree.errors() {
        prop_assert!(error.span().end().to_usize() <= source.len());
    }
    Ok(())
}

fn languages() -> [Language; 3] {
    [grammars::sum(), grammars::arith(), grammars::list()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn valid_expressions_parse_cleanly(source in arith_expression()) {
        let tree = Parser::new(grammars::arith()).parse(source.as_bytes());
        prop_assert!(!tree.has_error(), "{} -> {}", source, tree.to_sexp());
        check_tree(&tree, source.as_bytes())?;
    }

    #[test]
    fn any_bytes_produce_a_covering_tree(source in proptest::collection::vec(any::<u8>(), 0..64)) {
        for language in languages() {
            let tree = Parser::new(language).parse(&source);
            check_tree(&tree, &source)?;
        }
    }

    #[test]
    fn parsing_is_deterministic(source in arith_noise()) {
        let mut parser = Parser::new(grammars::arith());
        let first = parser.parse(source.as_bytes());
        let second = parser.parse(source.as_bytes());
        prop_assert!(first.same_structure(&second));
        prop_assert_eq!(first.errors(), second.errors());
        prop_assert_eq!(first.to_sexp(), second.to_sexp());
    }

    #[test]
    fn reparse_matches_fresh_parse(
        source in arith_noise(),
        start in 0usize..40,
        len in 0usize..6,
        replacement in "[0-9+*() ]{0,5}",
    ) {
        let start = start.min(source.len());
        let end = (start + len).min(source.len());

        let mut parser = Parser::new(grammars::arith());
        let old = parser.parse(source.as_bytes());
        let (edit, text) = InputEdit::replace(&source, start..end, &replacement);
        let reparsed = parser.reparse(&old.edit(&edit), text.as_bytes());
        let fresh = Parser::new(grammars::arith()).parse(text.as_bytes());

        check_tree(&reparsed, text.as_bytes())?;
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

    #[test]
    fn list_reparse_matches_fresh_parse(
        source in list_noise(),
        start in 0usize..40,
        len in 0usize..6,
        replacement in "[a-z, #\n]{0,5}",
    ) {
        let start = start.min(source.len());
        let end = (start + len).min(source.len());

        let mut parser = Parser::new(grammars::list());
        let old = parser.parse(source.as_bytes());
        let (edit, text) = InputEdit::replace(&source, start..end, &replacement);
        let reparsed = parser.reparse(&old.edit(&edit), text.as_bytes());
        let fresh = Parser::new(grammars::list()).parse(text.as_bytes());

        check_tree(&reparsed, text.as_bytes())?;
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

    #[test]
    fn edits_of_valid_expressions_reuse_work(
        source in arith_expression(),
        digit in 0u8..10,
    ) {
        // replace the last digit: everything before it is reusable
        let Some(position) = source.rfind(|c: char| c.is_ascii_digit()) else {
            return Ok(());
        };
        let mut parser = Parser::new(grammars::arith());
        let old = parser.parse(source.as_bytes());
        let (edit, text) = InputEdit::replace(&source, position..position + 1, &digit.to_string());
        let reparsed = parser.reparse(&old.edit(&edit), text.as_bytes());
        prop_assert!(!reparsed.has_error());
        prop_assert!(reparsed.same_structure(&Parser::new(grammars::arith()).parse(text.as_bytes())));
    }
}
