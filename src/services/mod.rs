//! Service layer module root.
//! Sequences key service calls with the local cryptographic envelope.

pub mod envelope;
pub mod public_key;
pub mod signing;
pub mod verification;

pub use envelope::{decrypt_rsa, decrypt_rsa_bytes, encrypt_oaep_sha256, encrypt_rsa};
pub use public_key::resolve_public_key;
pub use signing::sign_asymmetric;
pub use verification::{
    verify_ecdsa, verify_rsa_pss, verify_signature, verify_signature_ec, verify_signature_rsa,
};
