//! RSA encryption envelope and decryption delegation.
//!
//! Encryption happens locally against the service's public key using
//! RSA-OAEP with SHA-256 for both the digest and MGF1, and no label.
//! Decryption is always delegated to the service.

use base64::Engine;
use rand::{CryptoRng, RngCore};
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

use crate::adapters::key_service::KeyService;
use crate::domain::crypto::Ciphertext;
use crate::domain::types::KeyPath;
use crate::infra::error::{KmsError, KmsResult};
use crate::services::public_key::resolve_public_key;

/// Encrypt `message` under `public_key` with OAEP-SHA256.
///
/// Output differs on every call for the same input; `rng` supplies the
/// padding randomness.
///
/// # Errors
/// [`KmsError::EncryptFailed`] if the message exceeds the OAEP capacity of the
/// key (modulus size minus 66 bytes).
pub fn encrypt_oaep_sha256<R: RngCore + CryptoRng>(
    rng: &mut R,
    public_key: &RsaPublicKey,
    message: &[u8],
) -> KmsResult<Ciphertext> {
    public_key
        .encrypt(rng, Oaep::new::<Sha256>(), message)
        .map(Ciphertext::new)
        .map_err(|e| KmsError::EncryptFailed(e.to_string()))
}

/// Encrypt `message` for the RSA key at `key`, returning base64 ciphertext
/// ready for [`decrypt_rsa`].
///
/// # Errors
/// Key resolution errors, [`KmsError::KeyTypeMismatch`] for EC keys and
/// [`KmsError::EncryptFailed`].
pub async fn encrypt_rsa<S: KeyService, R: RngCore + CryptoRng>(
    service: &S,
    rng: &mut R,
    message: &[u8],
    key: &KeyPath,
) -> KmsResult<String> {
    let public_key = resolve_public_key(service, key)
        .await?
        .into_rsa("encrypt_rsa")?;

    let ciphertext = encrypt_oaep_sha256(rng, &public_key, message)?;
    log::debug!(
        "Encrypted {} byte message into {} byte ciphertext for {key}",
        message.len(),
        ciphertext.len()
    );
    Ok(ciphertext.to_base64())
}

/// Ask the service to decrypt base64 `ciphertext_b64` and return the raw
/// plaintext bytes.
///
/// # Errors
/// [`KmsError::DecryptRequestFailed`] if the service rejects the request
/// (unknown key, permission denied, malformed ciphertext), and
/// [`KmsError::DecodeFailed`] if the returned plaintext is not base64.
pub async fn decrypt_rsa_bytes<S: KeyService>(
    service: &S,
    ciphertext_b64: &str,
    key: &KeyPath,
) -> KmsResult<Vec<u8>> {
    let plaintext_b64 = service
        .asymmetric_decrypt(key, ciphertext_b64)
        .await
        .map_err(|e| {
            log::warn!("AsymmetricDecrypt failed for {key}: {e}");
            KmsError::DecryptRequestFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;

    let plaintext = base64::engine::general_purpose::STANDARD
        .decode(plaintext_b64)
        .map_err(|e| KmsError::decode("plaintext", e))?;

    log::info!("Decrypted {} byte plaintext with {key}", plaintext.len());
    Ok(plaintext)
}

/// Like [`decrypt_rsa_bytes`], interpreting the plaintext as UTF-8 text.
///
/// # Errors
/// As [`decrypt_rsa_bytes`], plus [`KmsError::DecodeFailed`] for non-UTF-8
/// plaintext.
pub async fn decrypt_rsa<S: KeyService>(
    service: &S,
    ciphertext_b64: &str,
    key: &KeyPath,
) -> KmsResult<String> {
    let plaintext = decrypt_rsa_bytes(service, ciphertext_b64, key).await?;
    String::from_utf8(plaintext).map_err(|e| KmsError::decode("plaintext", e))
}
