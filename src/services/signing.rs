//! Digest-and-sign delegation.
//!
//! The message is hashed locally and only the SHA-256 digest is sent. The
//! service holds the private key and decides the signature scheme from the
//! key's configured algorithm.

use crate::adapters::key_service::KeyService;
use crate::domain::crypto::Sha256Digest;
use crate::domain::types::KeyPath;
use crate::infra::error::{KmsError, KmsResult};

/// Sign `message` with the private key at `key`, returning the service's
/// base64 signature unchanged.
///
/// Only a SHA-256 digest is ever submitted; keys whose algorithm requires a
/// different digest (such as `EC_SIGN_P384_SHA384`) reject the request.
///
/// # Errors
/// [`KmsError::SignRequestFailed`] if the service call fails.
pub async fn sign_asymmetric<S: KeyService>(
    service: &S,
    message: &[u8],
    key: &KeyPath,
) -> KmsResult<String> {
    let digest = Sha256Digest::of(message);
    log::debug!("Signing {digest:?} with {key}");

    let signature = service
        .asymmetric_sign(key, &digest.to_base64())
        .await
        .map_err(|e| {
            log::warn!("AsymmetricSign failed for {key}: {e}");
            KmsError::SignRequestFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;

    log::info!("Signed {} byte message with {key}", message.len());
    Ok(signature)
}
