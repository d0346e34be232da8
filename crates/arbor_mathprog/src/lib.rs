//! # Arbor MathProg
//!
//! GNU MathProg language binding for the arbor runtime.
//!
//! The parse tables come from a grammar generator as a compiled grammar
//! blob; this crate supplies the hand-written [`MathprogScanner`] for the
//! grammar's external tokens and ties the two together as a [`Language`].
//!
//! ```rust,ignore
//! let language = arbor_mathprog::language(include_bytes!("mathprog.arbor"))?;
//! let mut parser = arbor::Parser::new(language);
//! let tree = parser.parse(b"set S := 1..5;");
//! ```

mod scanner;

pub use scanner::{EXTERNAL_TOKEN_NAMES, MathprogScanner};

use arbor::{GrammarLoadError, GrammarTable, Language, LanguageRegistry};
use tracing::{debug, info};

/// Name the language is published under
pub const LANGUAGE_NAME: &str = "mathprog";

/// Load a compiled MathProg grammar, attach the scanner and publish the
/// result in the global registry.
///
/// The grammar's external tokens must be a prefix of
/// [`EXTERNAL_TOKEN_NAMES`]. If a MathProg language is already registered,
/// that one is returned so every caller shares the same tables.
pub fn language(compiled: &[u8]) -> Result<Language, GrammarLoadError> {
    let table = GrammarTable::load(compiled)?;
    check_externals(&table)?;
    debug!(
        grammar = table.name(),
        states = table.state_count(),
        externals = table.externals().len(),
        "loaded mathprog grammar"
    );

    let language = LanguageRegistry::global().get_or_load(LANGUAGE_NAME, || {
        Ok::<_, GrammarLoadError>(Language::with_scanner(table, MathprogScanner::boxed))
    })?;
    info!(language = LANGUAGE_NAME, "mathprog language ready");
    Ok(language)
}

/// The external tokens a table declares must line up with what the scanner
/// reports, by name and position.
pub fn check_externals(table: &GrammarTable) -> Result<(), GrammarLoadError> {
    for (index, &symbol) in table.externals().iter().enumerate() {
        let found = table.symbol_name(symbol);
        let expected = EXTERNAL_TOKEN_NAMES.get(index).copied().unwrap_or("nothing");
        if found != expected {
            return Err(GrammarLoadError::ExternalScannerMismatch {
                index,
                expected: expected.into(),
                found: found.into(),
            });
        }
    }
    Ok(())
}
