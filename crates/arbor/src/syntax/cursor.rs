//! # Cursor API for Tree Navigation
//!
//! A [`TreeCursor`] is a stateful walker over a subtree. It never moves
//! above the node it was created on, so `goto_parent` at depth 0 fails.
//!
//! ```rust
//! use arbor::parser::Parser;
//! use arbor::testing::grammars;
//!
//! let mut parser = Parser::new(grammars::sum());
//! let tree = parser.parse(b"1+2");
//! let mut cursor = tree.walk();
//! assert!(cursor.goto_first_child());
//! assert_eq!(cursor.node().kind(), "sum");
//! assert!(cursor.goto_next_sibling());
//! assert_eq!(cursor.node().kind(), "+");
//! assert!(cursor.goto_parent());
//! assert_eq!(cursor.depth(), 0);
//! ```

use super::node::Node;

/// A cursor for navigating a syntax tree
#[derive(Debug, Clone)]
pub struct TreeCursor<'t> {
    start: Node<'t>,
    node: Node<'t>,
    depth: usize,
}

impl<'t> TreeCursor<'t> {
    #[must_use]
    pub fn new(node: Node<'t>) -> Self {
        Self {
            start: node.clone(),
            node,
            depth: 0,
        }
    }

    #[must_use]
    pub const fn node(&self) -> &Node<'t> {
        &self.node
    }

    /// Depth below the node the cursor started on
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Go back to the node the cursor started on
    pub fn reset(&mut self) {
        self.node = self.start.clone();
        self.depth = 0;
    }

    pub fn goto_first_child(&mut self) -> bool {
        match self.node.child(0) {
            Some(child) => {
                self.node = child;
                self.depth += 1;
                true
            }
            None => false,
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        match self.node.next_sibling() {
            Some(sibling) => {
                self.node = sibling;
                true
            }
            None => false,
        }
    }

    pub fn goto_previous_sibling(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        match self.node.prev_sibling() {
            Some(sibling) => {
                self.node = sibling;
                true
            }
            None => false,
        }
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        match self.node.parent() {
            Some(parent) => {
                self.node = parent;
                self.depth -= 1;
                true
            }
            None => false,
        }
    }

    /// Move to the first child that ends after `byte` and return its index
    pub fn goto_first_child_for_byte(&mut self, byte: usize) -> Option<usize> {
        let (index, child) = self
            .node
            .children()
            .enumerate()
            .find(|(_, child)| child.end_byte() > byte)?;
        self.node = child;
        self.depth += 1;
        Some(index)
    }
}

/// Depth-first, pre-order traversal of a subtree.
///
/// Lazy: nodes are materialized as the iterator advances. Always finite,
/// since the cursor cannot climb above its starting node.
#[derive(Debug, Clone)]
pub struct Preorder<'t> {
    cursor: TreeCursor<'t>,
    done: bool,
}

impl<'t> Preorder<'t> {
    #[must_use]
    pub const fn new(cursor: TreeCursor<'t>) -> Self {
        Self {
            cursor,
            done: false,
        }
    }

    /// Start over from the first node
    pub fn restart(&mut self) {
        self.cursor.reset();
        self.done = false;
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let node = self.cursor.node().clone();
        if !self.cursor.goto_first_child() {
            while !self.cursor.goto_next_sibling() {
                if !self.cursor.goto_parent() {
                    self.done = true;
                    break;
                }
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::Parser;
    use crate::testing::grammars;

    #[test]
    fn test_cursor_stays_within_subtree() {
        let mut parser = Parser::new(grammars::sum());
        let tree = parser.parse(b"1+2+3");
        let inner = tree.root_node().child(0).unwrap();
        let mut cursor = inner.walk();
        assert!(!cursor.goto_parent());
        assert!(!cursor.goto_next_sibling());
        assert!(cursor.goto_first_child());
        assert_eq!(cursor.depth(), 1);
        assert!(cursor.goto_next_sibling());
        assert!(cursor.goto_previous_sibling());
        cursor.reset();
        assert_eq!(cursor.node(), &inner);
        assert_eq!(cursor.depth(), 0);
    }

    #[test]
    fn test_goto_first_child_for_byte() {
        let mut parser = Parser::new(grammars::sum());
        let tree = parser.parse(b"1+2+3");
        let mut cursor = tree.walk();
        assert_eq!(cursor.goto_first_child_for_byte(4), Some(2));
        assert_eq!(cursor.node().kind(), "num");
        cursor.reset();
        assert_eq!(cursor.goto_first_child_for_byte(3), Some(1));
        assert_eq!(cursor.goto_first_child_for_byte(99), None);
    }

    #[test]
    fn test_preorder_visits_every_node_once() {
        let mut parser = Parser::new(grammars::sum());
        let tree = parser.parse(b"1+2");
        let kinds: Vec<&str> = tree.root_node().preorder().map(|node| node.kind()).collect();
        assert_eq!(kinds, ["sum", "sum", "num", "number", "+", "num", "number"]);

        let mut walk = tree.root_node().preorder();
        assert_eq!(walk.by_ref().count(), 7);
        walk.restart();
        assert_eq!(walk.count(), 7);
    }
}
