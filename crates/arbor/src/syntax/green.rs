use crate::grammar::{RuleId, StateId, SymbolId};
use crate::syntax::TextSize;
use smallvec::SmallVec;
use std::sync::Arc;

/// Per-element flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GreenFlags(u8);

impl GreenFlags {
    pub const NONE: Self = Self(0);
    /// Allowed anywhere; not a structural child of its parent's rule
    pub const EXTRA: Self = Self(1);
    /// An error node, or a token of unrecognized input
    pub const ERROR: Self = Self(1 << 1);
    /// A zero-width token inserted by error recovery
    pub const MISSING: Self = Self(1 << 2);
    /// This element or one of its descendants is an error
    pub const HAS_ERROR: Self = Self(1 << 3);
    /// Touched by an edit; never reused
    pub const STALE: Self = Self(1 << 4);
    /// Never reused (roots, nodes reduced across an error)
    pub const FRAGILE: Self = Self(1 << 5);
    /// The root of a tree; its padding is always zero
    pub const ROOT: Self = Self(1 << 6);

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for GreenFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Immutable, shareable interior node.
///
/// Every node owns its leading padding (the hidden extras before its first
/// token). `lookahead` is how many bytes past the node's end the lexer
/// examined while the node was being built; an edit in that window can
/// change the node.
#[derive(Debug, Clone)]
pub struct GreenNode {
    symbol: SymbolId,
    padding: TextSize,
    size: TextSize,
    lookahead: TextSize,
    children: GreenChildren,
    rule: Option<RuleId>,
    parse_state: StateId,
    lookahead_state: StateId,
    flags: GreenFlags,
}

/// Children storage optimized for different sizes
///
/// - Empty: No allocation needed
/// - One: Single child stored inline
/// - Inline: Small number of children stored inline (no heap allocation)
/// - Many: Large number of children stored in Arc for sharing
#[derive(Debug, Clone)]
enum GreenChildren {
    Empty,
    One(GreenElement),
    Inline(SmallVec<[GreenElement; 8]>),
    Many(Arc<[GreenElement]>),
}

/// A leaf. Tokens hold no text; slice the source with the node's range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GreenToken {
    symbol: SymbolId,
    padding: TextSize,
    size: TextSize,
    lookahead: TextSize,
    flags: GreenFlags,
}

#[derive(Debug, Clone)]
pub enum GreenElement {
    Node(Arc<GreenNode>),
    Token(GreenToken),
}

/// Parse-time facts recorded on a node for later reuse
#[derive(Debug, Clone, Copy)]
pub struct NodeMeta {
    pub rule: Option<RuleId>,
    /// State on the stack below the node's first child
    pub parse_state: StateId,
    /// State whose lex mode produced the token that followed the node
    pub lookahead_state: StateId,
    pub flags: GreenFlags,
}

impl NodeMeta {
    #[must_use]
    pub const fn new(rule: Option<RuleId>, parse_state: StateId) -> Self {
        Self {
            rule,
            parse_state,
            lookahead_state: parse_state,
            flags: GreenFlags::NONE,
        }
    }
}

/// Threshold for switching from inline to Arc storage
const INLINE_CHILDREN_THRESHOLD: usize = 8;

impl GreenToken {
    #[must_use]
    pub const fn new(symbol: SymbolId, padding: TextSize, size: TextSize) -> Self {
        Self {
            symbol,
            padding,
            size,
            lookahead: TextSize::zero(),
            flags: GreenFlags::NONE,
        }
    }

    /// A zero-width token standing in for a token the input lacks
    #[must_use]
    pub const fn missing(symbol: SymbolId, padding: TextSize) -> Self {
        Self {
            symbol,
            padding,
            size: TextSize::zero(),
            lookahead: TextSize::zero(),
            flags: GreenFlags::MISSING.union(GreenFlags::HAS_ERROR),
        }
    }

    #[must_use]
    pub const fn with_lookahead(mut self, lookahead: TextSize) -> Self {
        self.lookahead = lookahead;
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: GreenFlags) -> Self {
        self.flags = self.flags.union(flags);
        if flags.contains(GreenFlags::ERROR) {
            self.flags = self.flags.union(GreenFlags::HAS_ERROR);
        }
        self
    }

    /// Same token with new extents, marked stale
    #[must_use]
    pub(crate) const fn resized(&self, padding: TextSize, size: TextSize) -> Self {
        Self {
            symbol: self.symbol,
            padding,
            size,
            lookahead: self.lookahead,
            flags: self.flags.union(GreenFlags::STALE),
        }
    }

    #[inline]
    #[must_use]
    pub const fn symbol(&self) -> SymbolId {
        self.symbol
    }

    #[inline]
    #[must_use]
    pub const fn padding(&self) -> TextSize {
        self.padding
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> TextSize {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn lookahead(&self) -> TextSize {
        self.lookahead
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> GreenFlags {
        self.flags
    }
}

impl GreenNode {
    /// Create a new green node. Padding is taken from the first child and
    /// `lookahead` covers whatever the children looked at past the node's
    /// end.
    #[must_use]
    pub fn new(symbol: SymbolId, children: Vec<GreenElement>, meta: NodeMeta) -> Arc<Self> {
        let padding = children.first().map_or(TextSize::zero(), GreenElement::padding);
        let mut total = TextSize::zero();
        let mut dependency_end = TextSize::zero();
        let mut has_error = meta.flags.contains(GreenFlags::ERROR);
        for child in &children {
            total += child.text_len();
            dependency_end = dependency_end.max(total + child.lookahead());
            has_error |= child.has_error();
        }
        let mut flags = meta.flags;
        if has_error {
            flags = flags | GreenFlags::HAS_ERROR;
        }
        Arc::new(Self {
            symbol,
            padding,
            size: total - padding,
            lookahead: dependency_end.saturating_sub(total),
            children: GreenChildren::from_vec(children),
            rule: meta.rule,
            parse_state: meta.parse_state,
            lookahead_state: meta.lookahead_state,
            flags,
        })
    }

    /// Copy of this node over new children, with padding forced to `padding`.
    /// Used for roots, whose padding is always zero.
    #[must_use]
    pub(crate) fn with_padding(symbol: SymbolId, children: Vec<GreenElement>, meta: NodeMeta, padding: TextSize) -> Arc<Self> {
        let node = Self::new(symbol, children, meta);
        let total = node.padding + node.size;
        let mut node = Arc::unwrap_or_clone(node);
        node.padding = padding.min(total);
        node.size = total - node.padding;
        Arc::new(node)
    }

    /// Same node over replacement children, marked stale.
    #[must_use]
    pub(crate) fn rebuilt(&self, children: Vec<GreenElement>) -> Arc<Self> {
        let root_padding = self.flags.contains(GreenFlags::ROOT).then_some(self.padding);
        let meta = NodeMeta {
            rule: self.rule,
            parse_state: self.parse_state,
            lookahead_state: self.lookahead_state,
            flags: self.flags.without(GreenFlags::HAS_ERROR) | GreenFlags::STALE,
        };
        match root_padding {
            Some(padding) => Self::with_padding(self.symbol, children, meta, padding),
            None => Self::new(self.symbol, children, meta),
        }
    }

    /// Extend the lookahead window, e.g. by the token that triggered the
    /// reduction that built this node.
    #[must_use]
    pub(crate) fn extend_lookahead(self: Arc<Self>, lookahead: TextSize) -> Arc<Self> {
        if lookahead <= self.lookahead {
            return self;
        }
        let mut node = Arc::unwrap_or_clone(self);
        node.lookahead = lookahead;
        Arc::new(node)
    }

    #[inline]
    #[must_use]
    pub const fn symbol(&self) -> SymbolId {
        self.symbol
    }

    #[inline]
    #[must_use]
    pub const fn padding(&self) -> TextSize {
        self.padding
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> TextSize {
        self.size
    }

    /// Padding plus size
    #[inline]
    #[must_use]
    pub fn text_len(&self) -> TextSize {
        self.padding + self.size
    }

    #[inline]
    #[must_use]
    pub const fn lookahead(&self) -> TextSize {
        self.lookahead
    }

    #[inline]
    #[must_use]
    pub const fn rule(&self) -> Option<RuleId> {
        self.rule
    }

    #[inline]
    #[must_use]
    pub const fn parse_state(&self) -> StateId {
        self.parse_state
    }

    #[inline]
    #[must_use]
    pub const fn lookahead_state(&self) -> StateId {
        self.lookahead_state
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> GreenFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[GreenElement] {
        match &self.children {
            GreenChildren::Empty => &[],
            GreenChildren::One(child) => std::slice::from_ref(child),
            GreenChildren::Inline(children) => children,
            GreenChildren::Many(children) => children,
        }
    }

    /// The first token of this subtree, if it has any
    #[must_use]
    pub fn first_leaf(&self) -> Option<&GreenToken> {
        let mut node = self;
        loop {
            match node.children().first()? {
                GreenElement::Token(token) => return Some(token),
                GreenElement::Node(child) => node = child,
            }
        }
    }

    /// Number of nodes and tokens in this subtree, itself included
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|child| match child {
                GreenElement::Node(node) => node.descendant_count(),
                GreenElement::Token(_) => 1,
            })
            .sum::<usize>()
    }
}

impl GreenChildren {
    fn from_vec(children: Vec<GreenElement>) -> Self {
        match children.len() {
            0 => Self::Empty,
            1 => children.into_iter().next().map_or(Self::Empty, Self::One),
            2..=INLINE_CHILDREN_THRESHOLD => Self::Inline(children.into_iter().collect()),
            _ => Self::Many(Arc::from(children)),
        }
    }
}

impl GreenElement {
    #[must_use]
    pub fn symbol(&self) -> SymbolId {
        match self {
            Self::Node(node) => node.symbol(),
            Self::Token(token) => token.symbol(),
        }
    }

    #[must_use]
    pub fn padding(&self) -> TextSize {
        match self {
            Self::Node(node) => node.padding(),
            Self::Token(token) => token.padding(),
        }
    }

    #[must_use]
    pub fn size(&self) -> TextSize {
        match self {
            Self::Node(node) => node.size(),
            Self::Token(token) => token.size(),
        }
    }

    #[must_use]
    pub fn text_len(&self) -> TextSize {
        self.padding() + self.size()
    }

    #[must_use]
    pub fn lookahead(&self) -> TextSize {
        match self {
            Self::Node(node) => node.lookahead(),
            Self::Token(token) => token.lookahead(),
        }
    }

    #[must_use]
    pub fn flags(&self) -> GreenFlags {
        match self {
            Self::Node(node) => node.flags(),
            Self::Token(token) => token.flags(),
        }
    }

    #[must_use]
    pub fn is_extra(&self) -> bool {
        self.flags().contains(GreenFlags::EXTRA)
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.flags().contains(GreenFlags::HAS_ERROR)
    }

    #[must_use]
    pub const fn as_node(&self) -> Option<&Arc<GreenNode>> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    /// Mark as extra. Nodes are copied; the original stays untouched.
    #[must_use]
    pub fn into_extra(self) -> Self {
        match self {
            Self::Token(token) => Self::Token(token.with_flags(GreenFlags::EXTRA)),
            Self::Node(node) => {
                let mut node = Arc::unwrap_or_clone(node);
                node.flags = node.flags | GreenFlags::EXTRA;
                Self::Node(Arc::new(node))
            }
        }
    }

    /// Compare shape, symbols, extents and error flags, ignoring reuse
    /// metadata and sharing.
    #[must_use]
    pub fn same_structure(&self, other: &Self) -> bool {
        const SHAPE: GreenFlags = GreenFlags::EXTRA
            .union(GreenFlags::ERROR)
            .union(GreenFlags::MISSING)
            .union(GreenFlags::HAS_ERROR);
        let shape = |flags: GreenFlags| GreenFlags(flags.0 & SHAPE.0);
        if self.symbol() != other.symbol()
            || self.padding() != other.padding()
            || self.size() != other.size()
            || shape(self.flags()) != shape(other.flags())
        {
            return false;
        }
        match (self, other) {
            (Self::Token(_), Self::Token(_)) => true,
            (Self::Node(a), Self::Node(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.children().len() == b.children().len()
                        && a
                            .children()
                            .iter()
                            .zip(b.children())
                            .all(|(x, y)| x.same_structure(y)))
            }
            _ => false,
        }
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        Self::Token(token)
    }
}

impl From<Arc<GreenNode>> for GreenElement {
    fn from(node: Arc<GreenNode>) -> Self {
        Self::Node(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUM: SymbolId = SymbolId(1);
    const PLUS: SymbolId = SymbolId(2);
    const EXPR: SymbolId = SymbolId(5);

    fn token(symbol: SymbolId, padding: u32, size: u32) -> GreenElement {
        GreenToken::new(symbol, TextSize::from(padding), TextSize::from(size)).into()
    }

    fn meta() -> NodeMeta {
        NodeMeta::new(Some(RuleId(0)), StateId(0))
    }

    #[test]
    fn test_node_takes_padding_from_first_child() {
        // " 1 + 2"
        let node = GreenNode::new(
            EXPR,
            vec![token(NUM, 1, 1), token(PLUS, 1, 1), token(NUM, 1, 1)],
            meta(),
        );
        assert_eq!(node.padding(), TextSize::from(1));
        assert_eq!(node.size(), TextSize::from(5));
        assert_eq!(node.text_len(), TextSize::from(6));
        assert_eq!(node.children().len(), 3);
        assert_eq!(node.descendant_count(), 4);
    }

    #[test]
    fn test_lookahead_is_relative_to_node_end() {
        let last = GreenToken::new(NUM, TextSize::zero(), TextSize::from(1))
            .with_lookahead(TextSize::from(2));
        let node = GreenNode::new(EXPR, vec![token(NUM, 0, 1), last.into()], meta());
        assert_eq!(node.lookahead(), TextSize::from(2));

        let inner = GreenToken::new(NUM, TextSize::zero(), TextSize::from(1))
            .with_lookahead(TextSize::from(1));
        let node = GreenNode::new(EXPR, vec![inner.into(), token(PLUS, 0, 3)], meta());
        assert_eq!(node.lookahead(), TextSize::zero());
        let node = node.extend_lookahead(TextSize::from(4));
        assert_eq!(node.lookahead(), TextSize::from(4));
    }

    #[test]
    fn test_error_flag_propagates() {
        let missing = GreenToken::missing(NUM, TextSize::zero());
        let inner = GreenNode::new(EXPR, vec![missing.into()], meta());
        assert!(GreenElement::Node(inner.clone()).has_error());
        let outer = GreenNode::new(EXPR, vec![inner.into(), token(PLUS, 0, 1)], meta());
        assert!(outer.flags().contains(GreenFlags::HAS_ERROR));
        assert!(!outer.flags().contains(GreenFlags::ERROR));
    }

    #[test]
    fn test_children_storage_sizes() {
        let empty = GreenNode::new(EXPR, vec![], meta());
        assert!(empty.children().is_empty());
        assert_eq!(empty.text_len(), TextSize::zero());
        let many: Vec<_> = (0..20).map(|_| token(NUM, 0, 1)).collect();
        let node = GreenNode::new(EXPR, many, meta());
        assert_eq!(node.children().len(), 20);
        assert_eq!(node.size(), TextSize::from(20));
    }

    #[test]
    fn test_rebuilt_is_stale_and_keeps_root_padding() {
        let mut root_meta = meta();
        root_meta.flags = GreenFlags::ROOT | GreenFlags::FRAGILE;
        let root = GreenNode::with_padding(EXPR, vec![token(NUM, 2, 1)], root_meta, TextSize::zero());
        assert_eq!(root.padding(), TextSize::zero());
        assert_eq!(root.size(), TextSize::from(3));
        let rebuilt = root.rebuilt(vec![token(NUM, 2, 4)]);
        assert!(rebuilt.flags().contains(GreenFlags::STALE));
        assert_eq!(rebuilt.padding(), TextSize::zero());
        assert_eq!(rebuilt.size(), TextSize::from(6));
    }

    #[test]
    fn test_same_structure_ignores_metadata() {
        let a = GreenNode::new(EXPR, vec![token(NUM, 0, 1)], meta());
        let b = GreenNode::new(EXPR, vec![token(NUM, 0, 1)], NodeMeta::new(None, StateId(4)));
        let c = GreenNode::new(EXPR, vec![token(NUM, 0, 2)], meta());
        assert!(GreenElement::Node(a.clone()).same_structure(&b.into()));
        assert!(!GreenElement::Node(a).same_structure(&c.into()));
    }
}
