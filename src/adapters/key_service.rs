//! Key service capability trait.
//!
//! The remote key-management service is consumed through three capabilities
//! and nothing else. Every payload crossing this boundary is text: PEM for
//! public keys, standard base64 for byte strings.
//!
//! Implementations:
//! - [`crate::adapters::remote::client::RemoteKeyService`] talks to the REST API
//! - [`crate::adapters::memory::InMemoryKeyService`] performs the private key
//!   operations locally

use std::fmt;
use std::future::Future;

use crate::domain::types::KeyPath;

/// Asymmetric capabilities of a key-management service.
///
/// Futures must be `Send` so operations can run on any executor thread.
/// Dropping a future cancels the call as far as the implementation allows.
pub trait KeyService: Send + Sync {
    /// Fetch the PEM-encoded PKIX public key of `key`.
    fn get_public_key(
        &self,
        key: &KeyPath,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    /// Decrypt base64 ciphertext with the private half of `key`, returning
    /// base64 plaintext.
    fn asymmetric_decrypt(
        &self,
        key: &KeyPath,
        ciphertext_b64: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    /// Sign a base64 SHA-256 digest with the private half of `key`, returning
    /// the base64 signature in the key's configured scheme.
    fn asymmetric_sign(
        &self,
        key: &KeyPath,
        digest_sha256_b64: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

/// Broad classification of a key service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    NotFound,
    PermissionDenied,
    Unauthenticated,
    InvalidArgument,
    FailedPrecondition,
    Unavailable,
    /// The request never produced a response.
    Transport,
    /// A response arrived but could not be understood.
    MalformedResponse,
    Other,
}

impl ServiceErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceErrorKind::NotFound => "NOT_FOUND",
            ServiceErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ServiceErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ServiceErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ServiceErrorKind::FailedPrecondition => "FAILED_PRECONDITION",
            ServiceErrorKind::Unavailable => "UNAVAILABLE",
            ServiceErrorKind::Transport => "TRANSPORT",
            ServiceErrorKind::MalformedResponse => "MALFORMED_RESPONSE",
            ServiceErrorKind::Other => "UNKNOWN",
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a [`KeyService`] call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    #[must_use]
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(key: &KeyPath) -> Self {
        Self::new(ServiceErrorKind::NotFound, format!("key {key} not found"))
    }
}
