//! Wire format of the key-management REST API.
//!
//! JSON bodies use camelCase field names. Byte strings are standard base64.

use serde::{Deserialize, Serialize};

use crate::adapters::key_service::ServiceErrorKind;

/// Response of `GET {key}/publicKey`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    /// PEM-encoded PKIX public key.
    pub pem: String,
    /// Algorithm configured for the key version, e.g. `RSA_SIGN_PSS_2048_SHA256`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// Resource name of the key version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of `POST {key}:asymmetricDecrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsymmetricDecryptRequest {
    /// Base64-encoded ciphertext.
    pub ciphertext: String,
}

/// Response of `POST {key}:asymmetricDecrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsymmetricDecryptResponse {
    /// Base64-encoded plaintext. Omitted by the service when empty.
    #[serde(default)]
    pub plaintext: String,
}

/// Digest submitted for signing. Only SHA-256 is produced by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    /// Base64-encoded SHA-256 digest.
    pub sha256: String,
}

/// Body of `POST {key}:asymmetricSign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsymmetricSignRequest {
    pub digest: Digest,
}

impl AsymmetricSignRequest {
    #[must_use]
    pub fn sha256(digest_b64: impl Into<String>) -> Self {
        Self {
            digest: Digest {
                sha256: digest_b64.into(),
            },
        }
    }
}

/// Response of `POST {key}:asymmetricSign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsymmetricSignResponse {
    /// Base64-encoded signature.
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Error document returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorStatus {
    /// HTTP status code echoed by the service.
    pub code: u16,
    /// Human-readable error message.
    pub message: String,
    /// Canonical status name for programmatic handling.
    #[serde(default)]
    pub status: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(code: u16, status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorStatus {
                code,
                message: message.into(),
                status: status.into(),
            },
        }
    }
}

/// Canonical status names returned by the service.
pub mod status_codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const FAILED_PRECONDITION: &str = "FAILED_PRECONDITION";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
}

/// Classify a canonical status name.
#[must_use]
pub fn kind_from_status(status: &str) -> Option<ServiceErrorKind> {
    match status {
        status_codes::NOT_FOUND => Some(ServiceErrorKind::NotFound),
        status_codes::PERMISSION_DENIED => Some(ServiceErrorKind::PermissionDenied),
        status_codes::UNAUTHENTICATED => Some(ServiceErrorKind::Unauthenticated),
        status_codes::INVALID_ARGUMENT => Some(ServiceErrorKind::InvalidArgument),
        status_codes::FAILED_PRECONDITION => Some(ServiceErrorKind::FailedPrecondition),
        status_codes::UNAVAILABLE => Some(ServiceErrorKind::Unavailable),
        _ => None,
    }
}

/// Classify a bare HTTP status code.
#[must_use]
pub fn kind_from_http_status(code: u16) -> ServiceErrorKind {
    match code {
        400 => ServiceErrorKind::InvalidArgument,
        401 => ServiceErrorKind::Unauthenticated,
        403 => ServiceErrorKind::PermissionDenied,
        404 => ServiceErrorKind::NotFound,
        412 => ServiceErrorKind::FailedPrecondition,
        503 => ServiceErrorKind::Unavailable,
        _ => ServiceErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_request_shape() {
        let request = AsymmetricSignRequest::sha256("n4bQgYhMfWWaL+qgxVrQFaO/TxsrC4Is0V1sFbDwCgg=");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "digest": { "sha256": "n4bQgYhMfWWaL+qgxVrQFaO/TxsrC4Is0V1sFbDwCgg=" }
            })
        );
    }

    #[test]
    fn test_public_key_response_optional_fields() {
        let response: PublicKeyResponse = serde_json::from_str(
            r#"{"pem":"-----BEGIN PUBLIC KEY-----","algorithm":"EC_SIGN_P256_SHA256","pemCrc32c":"1234"}"#,
        )
        .unwrap();
        assert_eq!(response.algorithm.as_deref(), Some("EC_SIGN_P256_SHA256"));
        assert!(response.name.is_none());

        let response: PublicKeyResponse = serde_json::from_str(r#"{"pem":"x"}"#).unwrap();
        assert!(response.algorithm.is_none());
    }

    #[test]
    fn test_decrypt_response_without_plaintext() {
        let response: AsymmetricDecryptResponse = serde_json::from_str(
            r#"{"plaintextCrc32c":"0","verifiedCiphertextCrc32c":true,"protectionLevel":"SOFTWARE"}"#,
        )
        .unwrap();
        assert_eq!(response.plaintext, "");
    }

    #[test]
    fn test_error_document() {
        let error: ErrorResponse = serde_json::from_str(
            r#"{"error":{"code":403,"message":"denied","status":"PERMISSION_DENIED"}}"#,
        )
        .unwrap();
        assert_eq!(error.error.code, 403);
        assert_eq!(
            kind_from_status(&error.error.status),
            Some(ServiceErrorKind::PermissionDenied)
        );
        assert_eq!(kind_from_status("ABORTED"), None);
        assert_eq!(kind_from_http_status(404), ServiceErrorKind::NotFound);
        assert_eq!(kind_from_http_status(500), ServiceErrorKind::Other);
    }
}
