//! # Incremental Parsing
//!
//! Support for re-parsing edited documents.
//!
//! ## Overview
//!
//! An edit is described by an [`InputEdit`]: the byte (and row/column)
//! positions where the replaced text started and ended before the edit, and
//! where the replacement ends after it. Re-parsing takes two steps:
//!
//! 1. [`Tree::edit`] produces a new tree with every element that the edit
//!    touches resized and marked stale. Everything else is shared with the
//!    old tree.
//! 2. [`Parser::reparse`] parses the new text, pushing whole subtrees of the
//!    edited tree where it can instead of re-lexing and re-reducing them.
//!
//! An element is touched when the edit overlaps the bytes it depended on:
//! its own text plus its lookahead, the bytes the lexer examined past its
//! end. A token that ended right before an insertion is touched if the lexer
//! had to peek at the next byte to know where it ended.
//!
//! ## Usage
//!
//! ```rust
//! use arbor::incremental::IncrementalParser;
//! use arbor::testing::grammars;
//!
//! let mut editor = IncrementalParser::new(grammars::sum());
//! editor.parse("1+2+3");
//! editor.replace(2..3, "9");
//! assert_eq!(editor.text(), "1+9+3");
//! assert_eq!(editor.parser().last_stats().nodes_reused, 2);
//! ```

use crate::grammar::Language;
use crate::parser::{ParseStats, Parser, ParserConfig};
use crate::syntax::{GreenElement, GreenNode, Point, TextSize, Tree};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// One contiguous replacement in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl InputEdit {
    /// Change in document length
    #[must_use]
    pub fn delta(&self) -> isize {
        let signed = |len: usize| isize::try_from(len).unwrap_or(isize::MAX);
        if self.new_end_byte >= self.old_end_byte {
            signed(self.new_end_byte - self.old_end_byte)
        } else {
            -signed(self.old_end_byte - self.new_end_byte)
        }
    }

    /// Where a byte offset of the old text lands in the new text. Offsets
    /// inside the replaced range collapse to the end of the replacement.
    #[must_use]
    pub const fn map_offset(&self, offset: usize) -> usize {
        if offset <= self.start_byte {
            offset
        } else if offset <= self.old_end_byte {
            self.new_end_byte
        } else {
            offset - self.old_end_byte + self.new_end_byte
        }
    }

    /// [`InputEdit::map_offset`] for row/column positions
    #[must_use]
    pub const fn edit_point(&self, point: Point) -> Point {
        if point.row < self.start_point.row
            || (point.row == self.start_point.row && point.column <= self.start_point.column)
        {
            return point;
        }
        if point.row < self.old_end_point.row
            || (point.row == self.old_end_point.row && point.column <= self.old_end_point.column)
        {
            return self.new_end_point;
        }
        if point.row == self.old_end_point.row {
            Point::new(
                self.new_end_point.row,
                self.new_end_point.column + (point.column - self.old_end_point.column),
            )
        } else {
            Point::new(point.row - self.old_end_point.row + self.new_end_point.row, point.column)
        }
    }

    /// Replace `range` of `text` with `replacement`, returning the edit and
    /// the new text. The range is clamped to the text and widened to
    /// character boundaries.
    #[must_use]
    pub fn replace(text: &str, range: Range<usize>, replacement: &str) -> (Self, String) {
        let start = floor_boundary(text, range.start);
        let end = ceil_boundary(text, range.end.max(start));
        let start_point = Point::default().advance(&text.as_bytes()[..start]);
        let edit = Self {
            start_byte: start,
            old_end_byte: end,
            new_end_byte: start + replacement.len(),
            start_point,
            old_end_point: start_point.advance(&text.as_bytes()[start..end]),
            new_end_point: start_point.advance(replacement.as_bytes()),
        };

        let mut new_text = String::with_capacity(text.len() - (end - start) + replacement.len());
        new_text.push_str(&text[..start]);
        new_text.push_str(replacement);
        new_text.push_str(&text[end..]);
        (edit, new_text)
    }
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

impl Tree {
    /// The tree as it stands after `edit`, ready to be passed to
    /// [`Parser::reparse`] together with the new text.
    ///
    /// `self` is unchanged. Elements the edit touched are copied with new
    /// extents and marked stale; all others are shared.
    #[must_use]
    pub fn edit(&self, edit: &InputEdit) -> Self {
        let mut touched = 0;
        let root = edit_node(self.green(), 0, edit, &mut touched);
        debug!(
            start = edit.start_byte,
            old_end = edit.old_end_byte,
            new_end = edit.new_end_byte,
            touched,
            "edited tree"
        );
        self.with_root(root)
    }
}

/// Whether the bytes `element` depended on, starting at `offset`, overlap
/// the edit
fn touches(element: &GreenElement, offset: usize, edit: &InputEdit) -> bool {
    let dependency_end = offset + element.text_len().to_usize() + element.lookahead().to_usize();
    dependency_end > edit.start_byte && offset <= edit.old_end_byte
}

fn edit_node(node: &Arc<GreenNode>, offset: usize, edit: &InputEdit, touched: &mut usize) -> Arc<GreenNode> {
    *touched += 1;
    let mut children = Vec::with_capacity(node.children().len());
    let mut child_offset = offset;
    for child in node.children() {
        children.push(edit_element(child, child_offset, edit, touched));
        child_offset += child.text_len().to_usize();
    }
    node.rebuilt(children)
}

fn edit_element(element: &GreenElement, offset: usize, edit: &InputEdit, touched: &mut usize) -> GreenElement {
    if !touches(element, offset, edit) {
        return element.clone();
    }
    match element {
        GreenElement::Node(node) => edit_node(node, offset, edit, touched).into(),
        GreenElement::Token(token) => {
            *touched += 1;
            let start = offset + token.padding().to_usize();
            let end = start + token.size().to_usize();
            let (offset, start, end) = (
                edit.map_offset(offset),
                edit.map_offset(start),
                edit.map_offset(end),
            );
            token
                .resized(TextSize::of(start - offset), TextSize::of(end - start))
                .into()
        }
    }
}

/// Keeps a document, its text and its latest tree together, re-parsing
/// incrementally on every edit.
#[derive(Debug)]
pub struct IncrementalParser {
    parser: Parser,
    text: String,
    tree: Option<Tree>,
}

impl IncrementalParser {
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self::with_config(language, ParserConfig::default())
    }

    #[must_use]
    pub fn with_config(language: Language, config: ParserConfig) -> Self {
        Self {
            parser: Parser::with_config(language, config),
            text: String::new(),
            tree: None,
        }
    }

    /// Replace the whole document and parse it from scratch
    pub fn parse(&mut self, text: impl Into<String>) -> &Tree {
        self.text = text.into();
        let tree = self.parser.parse(self.text.as_bytes());
        self.tree.insert(tree)
    }

    /// Apply an edit whose result is `new_text`, reusing what the edit left
    /// intact
    pub fn edit(&mut self, edit: &InputEdit, new_text: impl Into<String>) -> &Tree {
        self.text = new_text.into();
        let tree = match &self.tree {
            Some(old) => self.parser.reparse(&old.edit(edit), self.text.as_bytes()),
            None => self.parser.parse(self.text.as_bytes()),
        };
        self.tree.insert(tree)
    }

    /// Replace `range` of the current text with `replacement`
    pub fn replace(&mut self, range: Range<usize>, replacement: &str) -> &Tree {
        let (edit, new_text) = InputEdit::replace(&self.text, range, replacement);
        self.edit(&edit, new_text)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    #[must_use]
    pub const fn parser(&self) -> &Parser {
        &self.parser
    }

    #[must_use]
    pub const fn last_stats(&self) -> &ParseStats {
        self.parser.last_stats()
    }
}
