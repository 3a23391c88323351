//! Crate-wide error type.

use thiserror::Error;

use crate::oracle::OracleError;

/// Everything that can go wrong talking to a [`PopeTree`](crate::tree::PopeTree).
#[derive(Debug, Error)]
pub enum Error {
    /// `insert`/`range` was given an empty ciphertext.
    #[error("ciphertext must not be empty")]
    EmptyCiphertext,

    /// The fan-out parameter `L` passed to `PopeTree::new` was zero.
    #[error("fan-out parameter L must be at least 1")]
    InvalidFanout,

    /// The oracle could not be reached, or timed out.
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),

    /// The oracle returned an answer that contradicts an earlier one (e.g. a
    /// previously installed pivot now compares equal to another pivot).
    #[error("oracle returned inconsistent results: {0}")]
    OracleInconsistent(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
