//! The opaque ciphertext type the server shuffles around without ever reading.

use std::fmt;

/// An opaque, server-unreadable ciphertext.
///
/// Equality is byte equality, matching the spec exactly. There is
/// deliberately no `Ord`/`PartialOrd` impl: plaintext order is only knowable
/// through an [`Oracle`](crate::oracle::Oracle), and the type system should
/// make it impossible to accidentally sort or compare ciphertexts any other
/// way.
#[derive(Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Ciphertext(Box<[u8]>);

impl Ciphertext {
    /// Wraps `bytes` as a ciphertext, without interpreting them.
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Ciphertext(bytes.into())
    }

    /// The raw bytes. The server never does anything with these beyond
    /// handing them to the oracle or back to the caller.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Ciphertext {
    fn from(bytes: Vec<u8>) -> Self {
        Ciphertext(bytes.into_boxed_slice())
    }
}

impl From<&[u8]> for Ciphertext {
    fn from(bytes: &[u8]) -> Self {
        Ciphertext(bytes.into())
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Ciphertexts are opaque; print a short hex prefix rather than risk
        // dumping something sensitive-shaped at full length.
        let prefix: Vec<u8> = self.0.iter().take(8).copied().collect();
        write!(f, "Ciphertext({:02x?}{})", prefix, if self.0.len() > 8 { "..." } else { "" })
    }
}
