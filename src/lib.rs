//! Server-side **Partial Order Preserving Encryption (POPE)**.
//!
//! This crate is the encrypted index's server half: a buffer-tree-like data
//! structure that accepts opaque ciphertexts in O(1) and answers encrypted
//! range queries by asking an external [`Oracle`] only the comparisons it
//! actually needs, amortizing that cost over the query workload. The server
//! never holds a key; see the module docs on [`tree`] and [`oracle`] for the
//! two halves of the design.
//!
//! Out of scope, by design (not this crate's job): the ciphertext scheme
//! itself, network framing/auth/transport for a real oracle, persistence,
//! multi-tenant isolation, and concurrent access to one tree.

pub mod ciphertext;
pub mod config;
pub mod error;
pub mod oracle;
pub mod tree;

pub use ciphertext::Ciphertext;
pub use config::Config;
pub use error::{Error, Result};
pub use oracle::{Oracle, OracleError};
pub use tree::PopeTree;

/// Initializes `env_logger` from the environment, if it hasn't been already.
///
/// Library code never calls this itself; it's offered for binaries that
/// embed this crate and want the same one-line logging setup the donor
/// storage engine's `init_env_logger` feature provides.
#[cfg(feature = "init_env_logger")]
pub fn init_env_logger() {
    let _ = env_logger::try_init();
}
