//! Batch parsing on the rayon thread pool.

use super::{Parser, ParserConfig};
use crate::grammar::Language;
use crate::syntax::Tree;
use rayon::prelude::*;

/// Parse many independent documents of one language in parallel.
///
/// Each worker gets its own [`Parser`] (and external scanner); the language
/// tables are shared. Trees come back in the order of `sources`.
pub fn parse_batch<S>(language: &Language, config: &ParserConfig, sources: &[S]) -> Vec<Tree>
where
    S: AsRef<[u8]> + Sync,
{
    sources
        .par_iter()
        .map_init(
            || Parser::with_config(language.clone(), config.clone()),
            |parser, source| parser.parse(source.as_ref()),
        )
        .collect()
}
