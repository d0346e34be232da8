use super::cursor::{Preorder, TreeCursor};
use super::node::Node;
use crate::error::SyntaxError;
use crate::grammar::Language;
use crate::syntax::{GreenElement, GreenFlags, GreenNode, TextRange, TextSize};
use std::sync::Arc;

/// The result of a parse: an immutable green tree, the language it was
/// parsed with and the syntax errors met along the way.
///
/// Trees are cheap to clone and can be sent across threads. Editing a tree
/// ([`Tree::edit`]) produces a new tree that shares every untouched subtree
/// with the old one.
#[derive(Debug, Clone)]
pub struct Tree {
    root: Arc<GreenNode>,
    language: Language,
    errors: Vec<SyntaxError>,
}

impl Tree {
    pub(crate) fn new(root: Arc<GreenNode>, language: Language, errors: Vec<SyntaxError>) -> Self {
        Self {
            root,
            language,
            errors,
        }
    }

    #[must_use]
    pub fn root_node(&self) -> Node<'_> {
        Node::root(self)
    }

    #[must_use]
    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }

    #[must_use]
    pub fn preorder(&self) -> Preorder<'_> {
        self.root_node().preorder()
    }

    #[must_use]
    pub const fn green(&self) -> &Arc<GreenNode> {
        &self.root
    }

    #[must_use]
    pub const fn language(&self) -> &Language {
        &self.language
    }

    /// Length of the parsed text in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.text_len().to_usize()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.root.flags().contains(GreenFlags::HAS_ERROR)
    }

    #[must_use]
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub(crate) fn with_root(&self, root: Arc<GreenNode>) -> Self {
        Self {
            root,
            language: self.language.clone(),
            errors: self.errors.clone(),
        }
    }

    /// Ranges of the outermost `ERROR` nodes and of inserted tokens, in
    /// document order
    #[must_use]
    pub fn error_ranges(&self) -> Vec<TextRange> {
        let mut ranges = Vec::new();
        let mut cursor = self.walk();
        let mut descend = true;
        loop {
            let node = cursor.node();
            let is_error = node.is_error() || node.is_missing();
            if is_error {
                ranges.push(node.byte_range());
            }
            if descend && !is_error && node.has_error() && cursor.goto_first_child() {
                continue;
            }
            if cursor.goto_next_sibling() {
                descend = true;
                continue;
            }
            if !cursor.goto_parent() {
                return ranges;
            }
            descend = false;
        }
    }

    #[must_use]
    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    /// Whether both trees have the same shape, symbols, extents and error
    /// markers. Reuse bookkeeping is ignored.
    #[must_use]
    pub fn same_structure(&self, other: &Self) -> bool {
        GreenElement::Node(Arc::clone(&self.root))
            .same_structure(&GreenElement::Node(Arc::clone(&other.root)))
    }

    /// Ranges of `self` whose structure differs from `old`, merged and in
    /// document order.
    ///
    /// Children are compared pairwise while both sides have the same symbol
    /// and child count; otherwise the whole element counts as changed.
    #[must_use]
    pub fn changed_ranges(&self, old: &Self) -> Vec<TextRange> {
        let mut ranges = Vec::new();
        diff(
            &GreenElement::Node(Arc::clone(&self.root)),
            &GreenElement::Node(Arc::clone(&old.root)),
            0,
            &mut ranges,
        );
        merge(ranges)
    }
}

fn diff(new: &GreenElement, old: &GreenElement, offset: usize, out: &mut Vec<TextRange>) {
    if new.same_structure(old) {
        return;
    }
    if let (GreenElement::Node(a), GreenElement::Node(b)) = (new, old)
        && a.symbol() == b.symbol()
        && a.children().len() == b.children().len()
    {
        let before = out.len();
        let mut child_offset = offset;
        for (x, y) in a.children().iter().zip(b.children()) {
            diff(x, y, child_offset, out);
            child_offset += x.text_len().to_usize();
        }
        // differing flags with identical children
        if out.len() == before {
            out.push(span(new, offset));
        }
        return;
    }
    out.push(span(new, offset));
}

fn span(element: &GreenElement, offset: usize) -> TextRange {
    let start = TextSize::of(offset) + element.padding();
    TextRange::at(start, element.size())
}

fn merge(mut ranges: Vec<TextRange>) -> Vec<TextRange> {
    ranges.sort_by_key(|range| (range.start(), range.end()));
    let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start() <= last.end() => *last = last.cover(range),
            _ => merged.push(range),
        }
    }
    merged
}
