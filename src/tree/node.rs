//! The node store (§3, §4.1).
//!
//! A [`Node`] is a tagged variant, not an inheritance hierarchy: promotion
//! flips a leaf's tag to internal in place. Parents own children exclusively
//! — there are no back-pointers, matching the donor tree's node ownership.

use crate::ciphertext::Ciphertext;

/// A leaf: an unsorted multiset of ciphertexts, capped at `L` outside of a
/// transient post-insert overflow at the root (§3 invariant 4).
#[derive(Debug, Default)]
pub struct LeafNode {
    pub(crate) buffer: Vec<Ciphertext>,
}

/// An internal node: `k` strictly increasing pivots, `k + 1` children, and
/// its own buffer of ciphertexts that arrived since the last flush through
/// it (§3).
#[derive(Debug)]
pub struct InternalNode {
    pub(crate) pivots: Vec<Ciphertext>,
    pub(crate) children: Vec<Node>,
    pub(crate) buffer: Vec<Ciphertext>,
}

/// A node in the POPE tree: either a [`LeafNode`] or an [`InternalNode`].
#[derive(Debug)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    /// A fresh, empty leaf — the shape of a brand-new tree's root, and of
    /// every child created by a promotion.
    pub fn empty_leaf() -> Self {
        Node::Leaf(LeafNode {
            buffer: Vec::new(),
        })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Appends to this node's own buffer. Used by `insert` at the root and
    /// by a flush pushing a ciphertext down into a child's buffer — both
    /// leaves and internal nodes accept arrivals into their buffer.
    pub(crate) fn buffer_append(&mut self, ct: Ciphertext) {
        match self {
            Node::Leaf(leaf) => leaf.buffer.push(ct),
            Node::Internal(internal) => internal.buffer.push(ct),
        }
    }

    pub fn buffer(&self) -> &[Ciphertext] {
        match self {
            Node::Leaf(leaf) => &leaf.buffer,
            Node::Internal(internal) => &internal.buffer,
        }
    }

    pub fn pivots(&self) -> &[Ciphertext] {
        match self {
            Node::Leaf(_) => &[],
            Node::Internal(internal) => &internal.pivots,
        }
    }

    /// The child subtrees, in pivot order. Empty for a leaf.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Leaf(_) => &[],
            Node::Internal(internal) => &internal.children,
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> Option<&mut LeafNode> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    pub(crate) fn as_internal_mut(&mut self) -> Option<&mut InternalNode> {
        match self {
            Node::Internal(internal) => Some(internal),
            Node::Leaf(_) => None,
        }
    }

    /// Replaces a leaf's contents in place with a freshly promoted internal
    /// node. Panics if `self` is already internal — promotion is only ever
    /// driven by the range path, which checks `is_leaf` first, so this is a
    /// caller bug, not a runtime condition callers need to recover from.
    pub(crate) fn promote_leaf_to_internal(&mut self, pivots: Vec<Ciphertext>, children: Vec<Node>) {
        assert!(self.is_leaf(), "promote_leaf_to_internal called on an internal node");
        debug_assert_eq!(
            children.len(),
            pivots.len() + 1,
            "a promoted node must have exactly one more child than pivots"
        );
        *self = Node::Internal(InternalNode {
            pivots,
            children,
            buffer: Vec::new(),
        });
    }
}

/// Gathers every ciphertext stored anywhere in `node`'s subtree: its own
/// buffer, its pivots (if internal), and recursively every child. No oracle
/// calls — used for the "entirely in range" children of Step 2, where the
/// placement invariant already guarantees everything here qualifies.
pub(crate) fn collect_all(node: &Node, out: &mut Vec<Ciphertext>) {
    match node {
        Node::Leaf(leaf) => out.extend(leaf.buffer.iter().cloned()),
        Node::Internal(internal) => {
            out.extend(internal.buffer.iter().cloned());
            out.extend(internal.pivots.iter().cloned());
            for child in &internal.children {
                collect_all(child, out);
            }
        }
    }
}
