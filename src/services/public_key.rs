//! Public key resolution.
//!
//! Every call fetches and parses the key again. Callers that want to reuse a
//! key across operations should keep the returned [`PublicKey`] themselves.

use crate::adapters::key_service::KeyService;
use crate::domain::crypto::{parse_public_key_pem, PublicKey};
use crate::domain::types::KeyPath;
use crate::infra::error::{KmsError, KmsResult};

/// Fetch the public key of `key` from the service and parse it.
///
/// # Errors
/// [`KmsError::FetchFailed`] if the service call fails, [`KmsError::ParseFailed`]
/// if the returned PEM is not a supported PKIX public key.
pub async fn resolve_public_key<S: KeyService>(service: &S, key: &KeyPath) -> KmsResult<PublicKey> {
    let pem = service.get_public_key(key).await.map_err(|e| {
        log::warn!("GetPublicKey failed for {key}: {e}");
        KmsError::FetchFailed {
            key: key.to_string(),
            reason: e.to_string(),
        }
    })?;

    let public_key = parse_public_key_pem(&pem)?;
    log::debug!("Resolved {} public key for {key}", public_key.kind());
    Ok(public_key)
}
