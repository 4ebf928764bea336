//! Error types for asymmetric key operations.
//!
//! Every variant names the operation that failed and carries the underlying
//! cause as text, so callers can log and re-raise without downcasting.

use thiserror::Error;

use crate::domain::crypto::KeyKind;

/// Result type for asymmetric key operations
pub type KmsResult<T> = Result<T, KmsError>;

/// Error taxonomy for envelope and key service operations
#[derive(Error, Debug, miette::Diagnostic)]
pub enum KmsError {
    #[error("Failed to fetch public key for {key}: {reason}")]
    FetchFailed { key: String, reason: String },

    #[error("Failed to parse public key: {0}")]
    ParseFailed(String),

    #[error("Key type mismatch in {operation}: expected {expected} key, got {actual} key")]
    KeyTypeMismatch {
        operation: &'static str,
        expected: KeyKind,
        actual: KeyKind,
    },

    #[error("Failed to decode {what}: {reason}")]
    DecodeFailed { what: &'static str, reason: String },

    #[error("Encryption failed: {0}")]
    EncryptFailed(String),

    #[error("Decryption request failed for {key}: {reason}")]
    DecryptRequestFailed { key: String, reason: String },

    #[error("Asymmetric sign request failed for {key}: {reason}")]
    SignRequestFailed { key: String, reason: String },

    #[error("Failed to parse signature bytes: {0}")]
    SignatureParseFailed(String),

    /// Carries only the scheme name. A wrong key, a tampered message and a
    /// forged signature are indistinguishable here.
    #[error("{scheme} signature verification failed")]
    VerificationFailed { scheme: &'static str },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl KmsError {
    pub(crate) fn decode(what: &'static str, error: impl std::fmt::Display) -> Self {
        KmsError::DecodeFailed {
            what,
            reason: error.to_string(),
        }
    }

    /// Whether this error is a negative verification outcome rather than a
    /// failure to perform the verification at all.
    #[must_use]
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, KmsError::VerificationFailed { .. })
    }
}

impl From<std::io::Error> for KmsError {
    fn from(error: std::io::Error) -> Self {
        KmsError::IoError(error.to_string())
    }
}
