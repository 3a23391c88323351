//! A reference, in-process oracle for tests and local experimentation.

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;

use super::{Oracle, OracleError};
use crate::ciphertext::Ciphertext;

/// An [`Oracle`] backed by a plaintext comparator closure held in-process.
///
/// This is explicitly **not** the production oracle: a real deployment's
/// comparison service is co-located with the key holder and reached over the
/// network, which is out of scope for this crate (§1). `LocalOracle` exists
/// so the tree can be exercised in tests and local demos without standing up
/// that service — it is a stand-in for the external collaborator, not an
/// implementation of it.
pub struct LocalOracle<F> {
    compare: F,
}

impl<F> LocalOracle<F>
where
    F: Fn(&Ciphertext, &Ciphertext) -> Ordering + Send + Sync,
{
    /// Builds an oracle from a plaintext comparator over raw ciphertext
    /// bytes (e.g. one that decrypts both sides and compares the result).
    pub fn new(compare: F) -> Self {
        LocalOracle { compare }
    }
}

impl<F> fmt::Debug for LocalOracle<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalOracle").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Oracle for LocalOracle<F>
where
    F: Fn(&Ciphertext, &Ciphertext) -> Ordering + Send + Sync,
{
    async fn cmp(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ordering, OracleError> {
        Ok((self.compare)(a, b))
    }
}
