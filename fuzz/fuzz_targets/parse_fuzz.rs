#![no_main]
use arbor::parser::Parser;
use arbor::testing::grammars;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for language in [grammars::sum(), grammars::arith(), grammars::list()] {
        let mut parser = Parser::new(language);
        let tree = parser.parse(data);

        // every input yields a tree covering all of it
        let root = tree.root_node();
        assert_eq!(root.start_byte(), 0);
        assert_eq!(root.end_byte(), data.len());
        for range in tree.error_ranges() {
            assert!(range.end().to_usize() <= data.len());
        }
    }
});
