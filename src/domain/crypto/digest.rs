use std::fmt;

use base64::Engine;
use sha2::{Digest, Sha256};

/// SHA-256 digest of a message.
///
/// Invariant: always exactly [`Sha256Digest::LEN`] bytes.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Sha256Digest([u8; Sha256Digest::LEN]);

impl Sha256Digest {
    pub const LEN: usize = 32;

    /// Hash `message`.
    #[must_use]
    pub fn of(message: &[u8]) -> Self {
        Self(Sha256::digest(message).into())
    }

    /// Wrap digest bytes computed elsewhere.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DigestLengthError> {
        let bytes: [u8; Self::LEN] = bytes.try_into().map_err(|_| DigestLengthError {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Standard base64 form used at the key service boundary.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }
}

impl fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Digest(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("digest length mismatch (expected {expected}, actual {actual})")]
pub struct DigestLengthError {
    pub expected: usize,
    pub actual: usize,
}
