//! End-to-end parsing of the fixture grammars

use arbor::parser::{Parser, ParserConfig};
use arbor::testing::{assert_sexp, grammars};

#[test]
fn test_nested_sums() {
    let mut parser = Parser::new(grammars::sum());
    let tree = parser.parse(b"1+2+3");
    assert!(!tree.has_error());
    assert_sexp(
        &tree,
        "(sum (sum (sum (num (number))) (num (number))) (num (number)))",
    );
    assert_eq!(tree.root_node().byte_range().as_range(), 0..5);
}

#[test]
fn test_multiplication_binds_tighter() {
    let mut parser = Parser::new(grammars::arith());
    assert_sexp(
        &parser.parse(b"1+2*3"),
        "(expr (expr (number)) (expr (expr (number)) (expr (number))))",
    );
    assert_sexp(
        &parser.parse(b"1*2+3"),
        "(expr (expr (expr (number)) (expr (number))) (expr (number)))",
    );
}

#[test]
fn test_same_precedence_is_left_associative() {
    let mut parser = Parser::new(grammars::arith());
    assert_sexp(
        &parser.parse(b"1+2+3"),
        "(expr (expr (expr (number)) (expr (number))) (expr (number)))",
    );
    assert_sexp(
        &parser.parse(b"1*2*3"),
        "(expr (expr (expr (number)) (expr (number))) (expr (number)))",
    );
}

#[test]
fn test_parentheses_override_precedence() {
    let mut parser = Parser::new(grammars::arith());
    assert_sexp(&parser.parse(b"(1)"), "(expr (expr (number)))");
    let tree = parser.parse(b"(1+2)*3");
    assert!(!tree.has_error());
    assert_sexp(
        &tree,
        "(expr (expr (expr (expr (number)) (expr (number)))) (expr (number)))",
    );
}

#[test]
fn test_whitespace_does_not_change_structure() {
    let mut parser = Parser::new(grammars::arith());
    let dense = parser.parse(b"1+2*3");
    let spaced = parser.parse(b"  1 +\n 2\t*  3  ");
    assert_eq!(dense.to_sexp(), spaced.to_sexp());
    assert!(!spaced.has_error());
}

#[test]
fn test_root_spans_leading_and_trailing_whitespace() {
    let mut parser = Parser::new(grammars::sum());
    let source = b"\n  1 + 2 \n";
    let tree = parser.parse(source);
    assert_eq!(tree.len(), source.len());
    let root = tree.root_node();
    assert_eq!(root.start_byte(), 0);
    assert_eq!(root.end_byte(), source.len());
    // the first visible child starts at its token, after the padding
    assert_eq!(root.child(0).unwrap().start_byte(), 3);
}

#[test]
fn test_empty_input_inserts_missing_operand() {
    let mut parser = Parser::new(grammars::sum());
    let tree = parser.parse(b"");
    assert_eq!(tree.len(), 0);
    assert!(tree.has_error());
    assert_sexp(&tree, "(sum (num (MISSING number)))");
    assert_eq!(tree.errors().len(), 1);
}

#[test]
fn test_comments_are_visible_extras() {
    let mut parser = Parser::new(grammars::list());
    let source = b"a, # c\nb";
    let tree = parser.parse(source);
    assert!(!tree.has_error());
    assert_sexp(&tree, "(list (list (item)) (comment) (item))");

    let comment = tree
        .root_node()
        .children()
        .find(|child| child.kind() == "comment")
        .expect("comment child");
    assert!(comment.is_extra());
    assert!(comment.is_named());
    assert_eq!(comment.utf8_text(source).unwrap(), "# c");
}

#[test]
fn test_aliases_rename_children() {
    let mut parser = Parser::new(grammars::list());
    let source = b"alpha, beta, gamma";
    let tree = parser.parse(source);
    let items: Vec<_> = tree
        .preorder()
        .filter(|node| node.kind() == "item")
        .map(|node| node.utf8_text(source).unwrap().to_owned())
        .collect();
    assert_eq!(items, ["alpha", "beta", "gamma"]);
}

#[test]
fn test_anonymous_tokens_are_hidden_from_sexp() {
    let mut parser = Parser::new(grammars::sum());
    let tree = parser.parse(b"1+2");
    let root = tree.root_node();
    let plus = root.child(1).unwrap();
    assert_eq!(plus.kind(), "+");
    assert!(!plus.is_named());
    assert_eq!(root.child_count(), 3);
    assert_eq!(root.named_child_count(), 2);
    assert!(!tree.to_sexp().contains('+'));
}

#[test]
fn test_parser_is_reusable_across_documents() {
    let mut parser = Parser::new(grammars::arith());
    let first = parser.parse(b"1+2");
    let broken = parser.parse(b"1+");
    let again = parser.parse(b"1+2");
    assert!(broken.has_error());
    assert!(first.same_structure(&again));
    assert!(!again.has_error());
}

#[test]
fn test_switching_language() {
    let mut parser = Parser::new(grammars::sum());
    parser.set_language(grammars::list());
    let tree = parser.parse(b"a, b");
    assert_eq!(tree.language().name(), "list");
    assert_eq!(tree.root_node().kind(), "list");
}

#[test]
fn test_config_roundtrip() {
    let config = ParserConfig {
        max_errors: 3,
        ..ParserConfig::default()
    };
    let mut parser = Parser::with_config(grammars::sum(), config.clone());
    assert_eq!(parser.config(), &config);
    parser.set_config(ParserConfig::default());
    assert_eq!(parser.config().max_errors, ParserConfig::default().max_errors);
}

/// `seq -> 'a' seq | 'a'`: every reduction happens at the end of input
fn right_recursive() -> arbor::Language {
    use arbor::grammar::{GrammarTable, GrammarTableBuilder, Rule, StateId, SymbolId};

    let mut b = GrammarTableBuilder::new("seq");
    let a = b.literal("a");
    let seq = b.non_terminal("seq");
    let pair = b.rule(Rule::new(seq, 2));
    let single = b.rule(Rule::new(seq, 1));
    let s: Vec<StateId> = (0..4).map(|_| b.state()).collect();
    b.shift(s[0], a, s[2]).goto(s[0], seq, s[1]);
    b.accept(s[1]);
    b.shift(s[2], a, s[2])
        .goto(s[2], seq, s[3])
        .reduce(s[2], &[SymbolId::END], single);
    b.reduce(s[3], &[SymbolId::END], pair);
    arbor::Language::new(GrammarTable::from_compiled(b.build()).unwrap())
}

#[test]
fn test_long_right_recursive_input_parses_cleanly() {
    const LEN: usize = 100_010;
    // dropping a chain this deep recurses once per level
    std::thread::Builder::new()
        .stack_size(512 << 20)
        .spawn(|| {
            let text = "a".repeat(LEN);
            let tree = Parser::new(right_recursive()).parse(text.as_bytes());
            assert!(!tree.has_error());
            assert!(tree.errors().is_empty());
            let root = tree.root_node();
            assert_eq!(root.kind(), "seq");
            assert_eq!(root.byte_range().as_range(), 0..LEN);
            assert_eq!(root.child_count(), 2);
        })
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn test_short_right_recursive_input() {
    let tree = Parser::new(right_recursive()).parse(b"aaa");
    assert_sexp(&tree, "(seq (seq (seq)))");
    assert!(Parser::new(right_recursive()).parse(b"").has_error());
}
