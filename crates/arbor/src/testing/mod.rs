//! # Testing Utilities
//!
//! Fixture grammars and snapshot helpers shared by the unit tests,
//! integration tests, benchmarks and fuzz targets.
//!
//! ## Fixture Grammars
//!
//! [`grammars`] builds three small tables by hand: left-recursive sums,
//! precedence-resolved arithmetic and comment-bearing lists with aliases.
//! Between them they exercise every table feature the runtime supports.

pub mod grammars;
pub mod snapshot;

pub use snapshot::{SnapshotTester, assert_sexp, render_tree};
