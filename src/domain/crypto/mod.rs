//! Foundational cryptographic domain types.
//!
//! Provides strongly-typed wrappers for the values that cross the key service
//! boundary:
//! - Public keys parsed from PEM/PKIX, as a closed RSA/EC sum type
//! - SHA-256 digests with a fixed length
//! - Ciphertexts and signatures with their base64 transport encoding
//!
//! All of these are immutable once built and are consumed by a single
//! operation.

mod ciphertext;
mod digest;
mod public_key;
mod signature;

pub use ciphertext::Ciphertext;
pub use digest::{DigestLengthError, Sha256Digest};
pub use public_key::{parse_public_key_pem, EcCurve, EcPublicKey, KeyKind, PublicKey};
pub use signature::{EcSignatureValue, RsaPssSignature};
