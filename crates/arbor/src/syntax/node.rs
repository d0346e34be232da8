use super::cursor::{Preorder, TreeCursor};
use super::tree::Tree;
use crate::grammar::SymbolId;
use crate::syntax::{GreenElement, GreenFlags, GreenNode, TextRange, TextSize};
use std::fmt;
use std::rc::Rc;
use std::str::Utf8Error;

/// A positioned view of one element of a [`Tree`].
///
/// Nodes are created on demand while navigating. Each holds a back
/// reference to its parent view so that `parent` and the sibling methods
/// need no search from the root. The back reference is an `Rc` chain of
/// views and never owns tree data: the green elements belong to the tree.
///
/// The zero-width end-of-input leaf is never visible through a `Node`.
#[derive(Clone)]
pub struct Node<'t> {
    tree: &'t Tree,
    data: Rc<NodeData>,
}

struct NodeData {
    element: GreenElement,
    /// Absolute start of the element's padding
    offset: usize,
    /// Index among the parent's children
    index: usize,
    /// Index among the parent's non-extra children
    structural_index: Option<usize>,
    parent: Option<Rc<NodeData>>,
}

impl<'t> Node<'t> {
    pub(crate) fn root(tree: &'t Tree) -> Self {
        Self {
            tree,
            data: Rc::new(NodeData {
                element: GreenElement::Node(tree.green().clone()),
                offset: 0,
                index: 0,
                structural_index: None,
                parent: None,
            }),
        }
    }

    #[must_use]
    pub const fn tree(&self) -> &'t Tree {
        self.tree
    }

    /// The symbol the grammar produced, before aliasing
    #[must_use]
    pub fn grammar_id(&self) -> SymbolId {
        self.data.element.symbol()
    }

    /// The symbol this node is presented as: the alias its parent's rule
    /// gives it, if any, otherwise [`Node::grammar_id`].
    #[must_use]
    pub fn kind_id(&self) -> SymbolId {
        self.alias().unwrap_or_else(|| self.grammar_id())
    }

    fn alias(&self) -> Option<SymbolId> {
        let index = self.data.structural_index?;
        let parent = self.data.parent.as_ref()?;
        let rule = parent.element.as_node()?.rule()?;
        self.tree.language().table().rule(rule)?.alias_at(index)
    }

    #[must_use]
    pub fn kind(&self) -> &'t str {
        self.tree.language().table().symbol_name(self.kind_id())
    }

    /// Named nodes are the ones shown in S-expressions. Unrecognized input
    /// tokens are not named; `ERROR` nodes are.
    #[must_use]
    pub fn is_named(&self) -> bool {
        match &self.data.element {
            GreenElement::Token(token) if token.symbol().is_error() => false,
            _ => self.tree.language().table().is_named(self.kind_id()),
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.tree.language().table().is_visible(self.kind_id())
    }

    #[must_use]
    pub fn is_extra(&self) -> bool {
        self.data.element.is_extra()
    }

    /// An `ERROR` node or a token of unrecognized input
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.grammar_id().is_error()
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.data.element.flags().contains(GreenFlags::MISSING)
    }

    /// Whether this node or any descendant is an error or missing
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.data.element.has_error()
    }

    /// Whether the node is a leaf of the grammar (a token)
    #[must_use]
    pub fn is_token(&self) -> bool {
        matches!(self.data.element, GreenElement::Token(_))
    }

    #[must_use]
    pub fn green(&self) -> &GreenElement {
        &self.data.element
    }

    #[must_use]
    pub fn start_byte(&self) -> usize {
        self.data.offset + self.data.element.padding().to_usize()
    }

    #[must_use]
    pub fn end_byte(&self) -> usize {
        self.data.offset + self.data.element.text_len().to_usize()
    }

    #[must_use]
    pub fn byte_range(&self) -> TextRange {
        TextRange::new(TextSize::of(self.start_byte()), TextSize::of(self.end_byte()))
    }

    /// Number of children, extras included
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.data
            .element
            .as_node()
            .map_or(0, |node| navigable(node).len())
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        let node = self.data.element.as_node()?;
        let children = navigable(node);
        children.get(index)?;

        let mut offset = self.data.offset;
        let mut structural = 0;
        for sibling in &children[..index] {
            offset += sibling.text_len().to_usize();
            if !sibling.is_extra() {
                structural += 1;
            }
        }
        Some(self.make_child(children[index].clone(), index, offset, structural))
    }

    fn make_child(&self, element: GreenElement, index: usize, offset: usize, structural: usize) -> Self {
        let structural_index = (!element.is_extra()).then_some(structural);
        Self {
            tree: self.tree,
            data: Rc::new(NodeData {
                element,
                offset,
                index,
                structural_index,
                parent: Some(Rc::clone(&self.data)),
            }),
        }
    }

    #[must_use]
    pub fn children(&self) -> Children<'t> {
        Children {
            parent: self.clone(),
            index: 0,
            offset: self.data.offset,
            structural: 0,
        }
    }

    #[must_use]
    pub fn named_child_count(&self) -> usize {
        self.children().filter(Node::is_named).count()
    }

    #[must_use]
    pub fn named_child(&self, index: usize) -> Option<Self> {
        self.children().filter(Node::is_named).nth(index)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.data.parent.as_ref().map(|parent| Self {
            tree: self.tree,
            data: Rc::clone(parent),
        })
    }

    #[must_use]
    pub fn next_sibling(&self) -> Option<Self> {
        let parent = self.parent()?;
        let index = self.data.index + 1;
        let element = navigable(parent.data.element.as_node()?).get(index)?.clone();
        let structural = self.data.structural_index.map_or_else(
            || parent.structural_before(self.data.index),
            |index| index + 1,
        );
        Some(parent.make_child(element, index, self.end_byte(), structural))
    }

    #[must_use]
    pub fn prev_sibling(&self) -> Option<Self> {
        let index = self.data.index.checked_sub(1)?;
        self.parent()?.child(index)
    }

    fn structural_before(&self, index: usize) -> usize {
        self.data.element.as_node().map_or(0, |node| {
            node.children()[..index]
                .iter()
                .filter(|child| !child.is_extra())
                .count()
        })
    }

    /// The smallest descendant (or self) whose range contains
    /// `start..end`. Zero-width nodes are only chosen for an empty range at
    /// their position.
    #[must_use]
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Self> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = self.clone();
        'descend: loop {
            for child in node.children() {
                let (child_start, child_end) = (child.start_byte(), child.end_byte());
                if child_start > start {
                    break;
                }
                let empty = child_start == child_end;
                if child_start <= start && end <= child_end && (!empty || start == end) {
                    node = child;
                    continue 'descend;
                }
            }
            return Some(node);
        }
    }

    #[must_use]
    pub fn walk(&self) -> TreeCursor<'t> {
        TreeCursor::new(self.clone())
    }

    /// Depth-first traversal of this node and its descendants
    #[must_use]
    pub fn preorder(&self) -> Preorder<'t> {
        Preorder::new(self.walk())
    }

    /// The node's text. Fails if the range does not fall on character
    /// boundaries, which only happens for unrecognized input.
    pub fn utf8_text<'s>(&self, source: &'s [u8]) -> Result<&'s str, Utf8Error> {
        let end = self.end_byte().min(source.len());
        let start = self.start_byte().min(end);
        std::str::from_utf8(&source[start..end])
    }

    /// Render the subtree as an S-expression of named nodes.
    ///
    /// `ERROR` nodes print as `(ERROR ...)`, inserted tokens as
    /// `(MISSING name)`. Anonymous tokens and hidden nodes print nothing
    /// themselves; the named nodes inside hidden nodes are spliced into
    /// the parent.
    #[must_use]
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        if self.is_missing() {
            open(out);
            out.push_str("MISSING ");
            if self.is_named() {
                out.push_str(self.kind());
            } else {
                out.push('"');
                out.push_str(self.kind());
                out.push('"');
            }
            out.push(')');
            return;
        }
        let shown = self.is_named() && (self.is_error() || self.is_visible());
        if shown {
            open(out);
            out.push_str(self.kind());
        }
        for child in self.children() {
            child.write_sexp(out);
        }
        if shown {
            out.push(')');
        }
    }
}

fn open(out: &mut String) {
    if !out.is_empty() && !out.ends_with('(') {
        out.push(' ');
    }
    out.push('(');
}

/// Children visible to navigation: everything but the end-of-input leaf
fn navigable(node: &GreenNode) -> &[GreenElement] {
    let children = node.children();
    match children.last() {
        Some(GreenElement::Token(token)) if token.symbol() == SymbolId::END => {
            &children[..children.len() - 1]
        }
        _ => children,
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        let same_element = match (&self.data.element, &other.data.element) {
            (GreenElement::Node(a), GreenElement::Node(b)) => std::sync::Arc::ptr_eq(a, b),
            (GreenElement::Token(a), GreenElement::Token(b)) => a == b,
            _ => false,
        };
        std::ptr::eq(self.tree, other.tree) && self.data.offset == other.data.offset && same_element
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.kind(), self.byte_range())
    }
}

/// Iterator over a node's children
pub struct Children<'t> {
    parent: Node<'t>,
    index: usize,
    offset: usize,
    structural: usize,
}

impl<'t> Iterator for Children<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.parent.data.element.as_node()?;
        let element = navigable(node).get(self.index)?;
        let (len, extra) = (element.text_len().to_usize(), element.is_extra());
        let child = self
            .parent
            .make_child(element.clone(), self.index, self.offset, self.structural);
        self.index += 1;
        self.offset += len;
        if !extra {
            self.structural += 1;
        }
        Some(child)
    }
}
