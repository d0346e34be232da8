//! # Syntax Trees
//!
//! Two layers, as in most incremental parsers:
//!
//! - the **green** layer ([`GreenNode`], [`GreenToken`]): immutable,
//!   position-independent, shared by `Arc` between a tree and its edited
//!   successors. Every element stores its leading padding and its own size,
//!   so absolute offsets are recovered by summing while walking down.
//! - the **view** layer ([`Node`], [`TreeCursor`]): lightweight handles with
//!   absolute byte ranges and parent links, created while navigating a
//!   [`Tree`].

pub mod cursor;
pub mod green;
pub mod node;
pub mod text;
pub mod tree;

pub use cursor::{Preorder, TreeCursor};
pub use green::{GreenElement, GreenFlags, GreenNode, GreenToken, NodeMeta};
pub use node::{Children, Node};
pub use text::{Point, TextRange, TextSize};
pub use tree::Tree;
