use crate::syntax::{GreenElement, GreenNode};
use std::sync::Arc;

/// Walks an edited tree in document order, handing out candidate subtrees
/// for reuse.
///
/// The cursor only moves forward. Nodes are offered at their padded start;
/// a rejected node can be descended into, since its first child starts at
/// the same offset.
pub(crate) struct ReusableCursor {
    stack: Vec<Level>,
}

struct Level {
    parent: Arc<GreenNode>,
    index: usize,
    start: usize,
}

impl ReusableCursor {
    pub(crate) fn new(root: &Arc<GreenNode>) -> Self {
        let mut cursor = Self {
            stack: vec![Level {
                parent: Arc::clone(root),
                index: 0,
                start: 0,
            }],
        };
        if root.children().is_empty() {
            cursor.stack.clear();
        }
        cursor
    }

    /// The element under the cursor and its padded start
    pub(crate) fn current(&self) -> Option<(&GreenElement, usize)> {
        let top = self.stack.last()?;
        top.parent
            .children()
            .get(top.index)
            .map(|element| (element, top.start))
    }

    /// Step past the current element, climbing out of finished nodes
    pub(crate) fn advance(&mut self) {
        while let Some(top) = self.stack.last_mut() {
            if let Some(element) = top.parent.children().get(top.index) {
                top.start += element.text_len().to_usize();
                top.index += 1;
            }
            if top.index < top.parent.children().len() {
                return;
            }
            self.stack.pop();
        }
    }

    /// Move to the first child of the current element, or past it if it
    /// has none
    pub(crate) fn descend(&mut self) {
        let Some((GreenElement::Node(node), start)) = self.current() else {
            self.advance();
            return;
        };
        if node.children().is_empty() {
            self.advance();
            return;
        }
        let level = Level {
            parent: Arc::clone(node),
            index: 0,
            start,
        };
        self.stack.push(level);
    }

    /// Move to the first element that could start at `target`, and return
    /// it if it starts exactly there.
    pub(crate) fn seek(&mut self, target: usize) -> Option<(&GreenElement, usize)> {
        loop {
            let (element, start) = self.current()?;
            let end = start + element.text_len().to_usize();
            if start < target {
                if end <= target {
                    self.advance();
                } else {
                    self.descend();
                }
                continue;
            }
            if start > target {
                return None;
            }
            if element.text_len().to_usize() == 0 {
                self.advance();
                continue;
            }
            break;
        }
        self.current()
    }
}
