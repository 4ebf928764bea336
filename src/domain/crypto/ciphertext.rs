use std::fmt;

use base64::Engine;

use crate::infra::error::{KmsError, KmsResult};

/// Opaque ciphertext bytes; base64 text at the key service boundary.
#[derive(Clone, Eq, PartialEq)]
pub struct Ciphertext(Box<[u8]>);

impl Ciphertext {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }

    /// Decode standard (padded) base64.
    pub fn from_base64(encoded: &str) -> KmsResult<Self> {
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(Self::new)
            .map_err(|e| KmsError::decode("ciphertext", e))
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext(len={})", self.0.len())
    }
}
