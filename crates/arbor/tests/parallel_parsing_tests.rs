//! Parsing on many threads with one shared language

use arbor::grammar::{Language, LanguageRegistry};
use arbor::parser::Parser;
use arbor::testing::grammars;
use std::thread;

fn sources() -> Vec<String> {
    (0..32)
        .map(|i| match i % 4 {
            0 => format!("{i}+{i}*{i}"),
            1 => format!("({i} + 1) * {i}"),
            2 => format!("{i} + + {i}"),
            _ => format!("(({i})"),
        })
        .collect()
}

#[test]
fn test_threads_share_one_language() {
    let registry = LanguageRegistry::new();
    let language = registry.register(grammars::arith());
    let sources = sources();

    let trees: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = sources
            .chunks(8)
            .map(|chunk| {
                let language = registry.get("arith").unwrap();
                scope.spawn(move || {
                    let mut parser = Parser::new(language);
                    chunk
                        .iter()
                        .map(|source| parser.parse(source.as_bytes()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    let mut parser = Parser::new(language.clone());
    for (source, tree) in sources.iter().zip(&trees) {
        assert!(tree.language().ptr_eq(&language));
        assert!(tree.same_structure(&parser.parse(source.as_bytes())), "{source}");
    }
}

#[test]
fn test_trees_move_between_threads() {
    let tree = Parser::new(grammars::sum()).parse(b"1+2");
    let sexp = thread::spawn(move || tree.to_sexp()).join().unwrap();
    assert_eq!(sexp, "(sum (sum (num (number))) (num (number)))");
}

#[cfg(feature = "parallel")]
#[test]
fn test_parse_batch_preserves_order() {
    use arbor::parser::{ParserConfig, parse_batch};

    let language = grammars::arith();
    let sources = sources();
    let trees = parse_batch(&language, &ParserConfig::default(), &sources);
    assert_eq!(trees.len(), sources.len());

    let mut parser = Parser::new(language);
    for (source, tree) in sources.iter().zip(&trees) {
        assert_eq!(tree.len(), source.len());
        assert_eq!(tree.to_sexp(), parser.parse(source.as_bytes()).to_sexp());
    }
}

#[cfg(feature = "parallel")]
#[test]
fn test_parse_batch_honours_config() {
    use arbor::parser::{ParserConfig, parse_batch};

    let config = ParserConfig {
        error_recovery: false,
        ..ParserConfig::default()
    };
    let trees = parse_batch(&grammars::arith(), &config, &["1+", "1+2"]);
    assert_eq!(trees[0].root_node().kind(), "ERROR");
    assert!(!trees[1].has_error());
}

#[test]
fn test_language_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Language>();
    assert_send_sync::<LanguageRegistry>();
}
