//! The comparison oracle capability (§4.4).
//!
//! The tree never holds a key. Everything it knows about plaintext order is
//! learned by asking an [`Oracle`] — a small, external capability taken by
//! reference, the same way the donor storage engine's tree calls through a
//! `Dml` object it does not own. Calls are `async` because a real oracle is
//! expected to live across a network hop; the tree suspends at these points
//! and nowhere else (§5).

use std::cmp::Ordering;

use async_trait::async_trait;
use thiserror::Error;

use crate::ciphertext::Ciphertext;

pub mod local;

pub use local::LocalOracle;

/// Failure talking to the oracle (transport-level, §7.1).
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle request timed out")]
    Timeout,
}

/// Which side of a pivot list a ciphertext falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildLocation {
    /// Strictly between `pivots[i - 1]` and `pivots[i]` (with sentinels at
    /// the ends) — belongs to child `i`.
    Between(usize),
    /// Oracle-equal to `pivots[i]`.
    AtPivot(usize),
}

/// Binary-searches `pivots` (assumed strictly increasing per the oracle) for
/// where `target` falls. O(log k) `cmp` calls.
pub(crate) async fn locate<O: Oracle + ?Sized>(
    pivots: &[Ciphertext],
    target: &Ciphertext,
    oracle: &O,
) -> Result<ChildLocation, OracleError> {
    let mut lo = 0usize;
    let mut hi = pivots.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match oracle.cmp(target, &pivots[mid]).await? {
            Ordering::Equal => return Ok(ChildLocation::AtPivot(mid)),
            Ordering::Less => hi = mid,
            Ordering::Greater => lo = mid + 1,
        }
    }
    Ok(ChildLocation::Between(lo))
}

/// The bucket a buffered ciphertext falls into when partitioned against a
/// node's pivots (§4.3 Step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionBucket {
    /// Goes to `children[i]`.
    Child(usize),
    /// Oracle-equal to `pivots[i]`; routed to `children[i]` as well (the
    /// "either adjacent child, implementer's choice, consistently applied"
    /// policy from §4.3, resolved once here).
    Pivot(usize),
}

impl PartitionBucket {
    /// The child index this bucket resolves to, applying the pivot-routing
    /// policy.
    pub(crate) fn child_index(self) -> usize {
        match self {
            PartitionBucket::Child(i) => i,
            PartitionBucket::Pivot(i) => i,
        }
    }
}

/// A capability that knows the plaintext order of ciphertexts.
///
/// Implementations only ever need to provide [`cmp`](Oracle::cmp); `sort` and
/// `partition` have default implementations built on it, so they exist
/// purely to let an implementation batch round trips when it can.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Plaintext order of `a` and `b`.
    async fn cmp(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ordering, OracleError>;

    /// Returns `items` reordered by ascending plaintext value.
    ///
    /// Default: an oracle-driven merge sort, O(n log n) `cmp` calls.
    async fn sort(&self, items: Vec<Ciphertext>) -> Result<Vec<Ciphertext>, OracleError> {
        merge_sort(self, items).await
    }

    /// For each item, the [`PartitionBucket`] it falls into relative to
    /// `pivots` (assumed strictly increasing). Same order as `items`.
    ///
    /// Default: one binary search per item, O(n log k) `cmp` calls.
    async fn partition(
        &self,
        items: &[Ciphertext],
        pivots: &[Ciphertext],
    ) -> Result<Vec<PartitionBucket>, OracleError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(match locate(pivots, item, self).await? {
                ChildLocation::Between(i) => PartitionBucket::Child(i),
                ChildLocation::AtPivot(i) => PartitionBucket::Pivot(i),
            });
        }
        Ok(out)
    }
}

#[async_recursion::async_recursion]
async fn merge_sort<O: Oracle + ?Sized + 'async_recursion>(
    oracle: &O,
    mut items: Vec<Ciphertext>,
) -> Result<Vec<Ciphertext>, OracleError> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(oracle, items).await?;
    let right = merge_sort(oracle, right).await?;
    merge(oracle, left, right).await
}

async fn merge<O: Oracle + ?Sized>(
    oracle: &O,
    left: Vec<Ciphertext>,
    right: Vec<Ciphertext>,
) -> Result<Vec<Ciphertext>, OracleError> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => {
                if oracle.cmp(l, r).await? == Ordering::Greater {
                    out.push(right.next().unwrap());
                } else {
                    out.push(left.next().unwrap());
                }
            }
            (Some(_), None) => out.push(left.next().unwrap()),
            (None, Some(_)) => out.push(right.next().unwrap()),
            (None, None) => break,
        }
    }
    Ok(out)
}
