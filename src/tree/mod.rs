//! The POPE tree itself (§2, §3): a buffer tree with an O(1), oracle-free
//! insert path and an oracle-driven range path that lazily sorts only the
//! regions of the key space that queries actually touch.

mod node;
mod range;

pub use node::Node;

use std::cmp::Ordering;

use log::trace;

use crate::{
    ciphertext::Ciphertext,
    error::{Error, Result},
    oracle::Oracle,
};

/// A POPE server tree over ciphertexts supplied by the client, backed by an
/// oracle `O` for everything that needs plaintext order.
///
/// Not internally synchronized: per §5, the data structure is sequential,
/// and `&mut self` on both `insert` and `range` is how that single-writer
/// discipline is enforced at compile time.
pub struct PopeTree<O> {
    root: Node,
    fanout: usize,
    oracle: O,
    len: usize,
}

impl<O> PopeTree<O>
where
    O: Oracle,
{
    /// Builds an empty tree with fan-out `fanout` (the leaf cap and max
    /// pivot count `L`, §3).
    pub fn new(fanout: usize, oracle: O) -> Result<Self> {
        if fanout == 0 {
            return Err(Error::InvalidFanout);
        }
        Ok(PopeTree {
            root: Node::empty_leaf(),
            fanout,
            oracle,
            len: 0,
        })
    }

    /// Number of ciphertexts inserted so far. O(1), no oracle calls.
    pub fn size(&self) -> usize {
        self.len
    }

    /// §4.2: appends to the root's buffer. O(1), no oracle calls, never
    /// recurses or rebalances.
    pub fn insert(&mut self, ct: Ciphertext) -> Result<()> {
        if ct.is_empty() {
            return Err(Error::EmptyCiphertext);
        }
        self.root.buffer_append(ct);
        self.len += 1;
        Ok(())
    }

    /// §4.3: the only operation that calls the oracle, and the only one
    /// that can change the tree's shape. Returns every inserted ciphertext
    /// whose plaintext lies in `[low, high]`.
    pub async fn range(&mut self, low: Ciphertext, high: Ciphertext) -> Result<Vec<Ciphertext>> {
        if low.is_empty() || high.is_empty() {
            return Err(Error::EmptyCiphertext);
        }
        if self.len == 0 {
            // Nothing has ever been inserted: answer without touching the
            // oracle at all (§4.3 edge policy, §8 scenario 5).
            return Ok(Vec::new());
        }
        if self.oracle.cmp(&low, &high).await? == Ordering::Greater {
            trace!("range with low > high per oracle: returning empty");
            return Ok(Vec::new());
        }
        range::range_node(&mut self.root, &low, &high, self.fanout, &self.oracle).await
    }

    /// The fan-out parameter this tree was built with.
    pub fn fanout(&self) -> usize {
        self.fanout
    }

    /// Read-only access to the root, mostly useful for tests asserting
    /// structural invariants (P1-P4).
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Read-only access to the oracle, mostly useful for benchmarks that
    /// wrap an oracle in a call counter (§8 P7).
    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}
