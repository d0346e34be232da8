//! # Snapshot Testing Utilities
//!
//! Compare parse results against stored text snapshots.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arbor::testing::SnapshotTester;
//!
//! let tester = SnapshotTester::new("tests/snapshots");
//! tester.assert_snapshot("nested_sums", &tree, source);
//! ```
//!
//! Run with `UPDATE_SNAPSHOTS=1` to (re)write the stored files.

use crate::syntax::{Node, Tree};
use std::fmt::Write;
use std::path::PathBuf;

/// Snapshot tester for parse trees
pub struct SnapshotTester {
    snapshot_dir: PathBuf,
    update_mode: bool,
}

impl SnapshotTester {
    #[must_use]
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        let update_mode = std::env::var("UPDATE_SNAPSHOTS").is_ok()
            || std::env::var("ARBOR_UPDATE_SNAPSHOTS").is_ok();
        Self {
            snapshot_dir: snapshot_dir.into(),
            update_mode,
        }
    }

    #[must_use]
    pub const fn with_update_mode(mut self, update: bool) -> Self {
        self.update_mode = update;
        self
    }

    /// Assert that a tree, rendered with [`render_tree`], matches the
    /// snapshot
    ///
    /// # Panics
    /// Panics if the snapshot doesn't match (and update mode is disabled)
    pub fn assert_snapshot(&self, name: &str, tree: &Tree, source: &[u8]) {
        self.check_snapshot(name, &render_tree(tree, source));
    }

    fn check_snapshot(&self, name: &str, actual: &str) {
        let path = self.snapshot_dir.join(format!("{name}.snap"));

        if self.update_mode {
            std::fs::create_dir_all(&self.snapshot_dir).ok();
            std::fs::write(&path, actual).expect("Failed to write snapshot");
            return;
        }

        if path.exists() {
            let expected = std::fs::read_to_string(&path).expect("Failed to read snapshot");
            assert!(
                actual == expected,
                "Snapshot mismatch for '{name}':\n\
                --- Expected ---\n{expected}\n\
                --- Actual ---\n{actual}\n\
                \n\
                To update snapshots, run with UPDATE_SNAPSHOTS=1"
            );
        } else {
            panic!(
                "Snapshot '{name}' not found at {}.\n\
                To create it, run with UPDATE_SNAPSHOTS=1",
                path.display()
            );
        }
    }
}

/// The S-expression, the syntax errors and an indented dump of every node
/// with its range and (for leaves) its text.
#[must_use]
pub fn render_tree(tree: &Tree, source: &[u8]) -> String {
    let mut out = String::new();
    writeln!(out, "{}", tree.to_sexp()).ok();
    for error in tree.errors() {
        writeln!(out, "! {} @ {}", error, error.span()).ok();
    }
    write_node(&mut out, &tree.root_node(), source, 0);
    out
}

fn write_node(out: &mut String, node: &Node<'_>, source: &[u8], depth: usize) {
    let indent = "  ".repeat(depth);
    let mut marks = String::new();
    if node.is_extra() {
        marks.push_str(" extra");
    }
    if node.is_missing() {
        marks.push_str(" missing");
    }
    if node.child_count() == 0 {
        let text = String::from_utf8_lossy(source.get(node.byte_range().as_range()).unwrap_or_default());
        writeln!(out, "{indent}{}@{}{marks} {text:?}", node.kind(), node.byte_range()).ok();
        return;
    }
    writeln!(out, "{indent}{}@{}{marks}", node.kind(), node.byte_range()).ok();
    for child in node.children() {
        write_node(out, &child, source, depth + 1);
    }
}

/// Assert that `tree` renders as `expected` in S-expression form
///
/// # Panics
/// Panics with both renderings on mismatch
#[track_caller]
pub fn assert_sexp(tree: &Tree, expected: &str) {
    let actual = tree.to_sexp();
    assert!(
        actual == expected,
        "S-expression mismatch:\n--- Expected ---\n{expected}\n--- Actual ---\n{actual}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::testing::grammars;

    #[test]
    fn test_render_tree() {
        let mut parser = Parser::new(grammars::list());
        let source = b"a, # c\nb";
        let tree = parser.parse(source);
        let rendered = render_tree(&tree, source);
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("(list (list (item)) (comment) (item))"));
        assert_eq!(lines.next(), Some("list@0..8"));
        assert!(rendered.contains("  comment@3..6 extra \"# c\""));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = std::env::temp_dir().join(format!("arbor-snapshots-{}", std::process::id()));
        let mut parser = Parser::new(grammars::sum());
        let tree = parser.parse(b"1+2");
        SnapshotTester::new(&dir)
            .with_update_mode(true)
            .assert_snapshot("sum", &tree, b"1+2");
        SnapshotTester::new(&dir)
            .with_update_mode(false)
            .assert_snapshot("sum", &tree, b"1+2");
        std::fs::remove_dir_all(&dir).ok();
    }
}
