#![no_main]
use arbor::incremental::InputEdit;
use arbor::parser::Parser;
use arbor::testing::grammars;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // first byte picks the grammar, the next two the edited range
    let [selector, from, to, rest @ ..] = data else {
        return;
    };
    let Ok(input) = std::str::from_utf8(rest) else {
        return;
    };
    let language = match selector % 3 {
        0 => grammars::sum(),
        1 => grammars::arith(),
        _ => grammars::list(),
    };

    let (start, end) = (usize::from(*from), usize::from(*to));
    let range = start.min(end)..start.max(end);
    let replacement = ["", "1", "+", "(", ")", " ", "2*3", ",x"][usize::from(*to) % 8];

    let mut parser = Parser::new(language);
    let old = parser.parse(input.as_bytes());
    let (edit, new_text) = InputEdit::replace(input, range, replacement);
    let reparsed = parser.reparse(&old.edit(&edit), new_text.as_bytes());
    let fresh = parser.parse(new_text.as_bytes());

    // incremental and full parses must agree exactly
    assert!(
        reparsed.same_structure(&fresh),
        "reparse diverged:\n{}\n{}",
        reparsed.to_sexp(),
        fresh.to_sexp()
    );
    assert_eq!(reparsed.errors(), fresh.errors());
});
