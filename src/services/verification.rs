//! Signature verification against the service's public keys.
//!
//! Both schemes verify over SHA-256 of the message. Failures are split in
//! three tiers:
//! - the signature text is not base64: [`KmsError::DecodeFailed`]
//! - an EC signature is not a DER `SEQUENCE { INTEGER, INTEGER }`:
//!   [`KmsError::SignatureParseFailed`]
//! - anything the key decides, including out-of-range scalars and wrong
//!   signature lengths: [`KmsError::VerificationFailed`], with no reason
//!
//! Only the last tier depends on the key, and it carries no detail.

use rsa::{Pss, RsaPublicKey};
use sha2::Sha256;

use p256::ecdsa::signature::hazmat::PrehashVerifier;

use crate::adapters::key_service::KeyService;
use crate::domain::crypto::{
    EcPublicKey, EcSignatureValue, PublicKey, RsaPssSignature, Sha256Digest,
};
use crate::domain::types::KeyPath;
use crate::infra::error::{KmsError, KmsResult};
use crate::services::public_key::resolve_public_key;

const RSA_PSS: &str = "RSA-PSS";
const ECDSA: &str = "ECDSA";

/// Check an RSA-PSS signature (SHA-256, salt length 32) over `message`.
pub fn verify_rsa_pss(
    public_key: &RsaPublicKey,
    signature: &RsaPssSignature,
    message: &[u8],
) -> KmsResult<()> {
    let digest = Sha256Digest::of(message);
    public_key
        .verify(
            Pss::new_with_salt::<Sha256>(Sha256Digest::LEN),
            digest.as_bytes(),
            signature.as_slice(),
        )
        .map_err(|_| KmsError::VerificationFailed { scheme: RSA_PSS })
}

/// Check an ECDSA signature over the SHA-256 digest of `message`.
pub fn verify_ecdsa(
    public_key: &EcPublicKey,
    signature: &EcSignatureValue,
    message: &[u8],
) -> KmsResult<()> {
    let failed = || KmsError::VerificationFailed { scheme: ECDSA };
    let digest = Sha256Digest::of(message);
    let width = public_key.curve().field_size();

    let (Some(r), Some(s)) = (signature.r_fixed(width), signature.s_fixed(width)) else {
        return Err(failed());
    };

    match public_key {
        EcPublicKey::P256(key) => {
            let signature = p256::ecdsa::Signature::from_scalars(
                p256::FieldBytes::clone_from_slice(&r),
                p256::FieldBytes::clone_from_slice(&s),
            )
            .map_err(|_| failed())?;
            p256::ecdsa::VerifyingKey::from(key)
                .verify_prehash(digest.as_bytes(), &signature)
                .map_err(|_| failed())
        }
        EcPublicKey::P384(key) => {
            let signature = p384::ecdsa::Signature::from_scalars(
                p384::FieldBytes::clone_from_slice(&r),
                p384::FieldBytes::clone_from_slice(&s),
            )
            .map_err(|_| failed())?;
            p384::ecdsa::VerifyingKey::from(key)
                .verify_prehash(digest.as_bytes(), &signature)
                .map_err(|_| failed())
        }
    }
}

/// Verify a base64 RSA-PSS signature over `message` with the public key of
/// `key`.
///
/// # Errors
/// Key resolution errors, [`KmsError::KeyTypeMismatch`] for EC keys,
/// [`KmsError::DecodeFailed`] and [`KmsError::VerificationFailed`].
pub async fn verify_signature_rsa<S: KeyService>(
    service: &S,
    signature_b64: &str,
    message: &[u8],
    key: &KeyPath,
) -> KmsResult<()> {
    let public_key = resolve_public_key(service, key)
        .await?
        .into_rsa("verify_signature_rsa")?;
    let signature = RsaPssSignature::from_base64(signature_b64)?;

    verify_rsa_pss(&public_key, &signature, message)?;
    log::info!("RSA-PSS signature verified with {key}");
    Ok(())
}

/// Verify a base64, DER-encoded ECDSA signature over `message` with the
/// public key of `key`.
///
/// # Errors
/// Key resolution errors, [`KmsError::KeyTypeMismatch`] for RSA keys,
/// [`KmsError::DecodeFailed`], [`KmsError::SignatureParseFailed`] and
/// [`KmsError::VerificationFailed`].
pub async fn verify_signature_ec<S: KeyService>(
    service: &S,
    signature_b64: &str,
    message: &[u8],
    key: &KeyPath,
) -> KmsResult<()> {
    let public_key = resolve_public_key(service, key)
        .await?
        .into_ec("verify_signature_ec")?;
    let signature = EcSignatureValue::from_der(&decode_signature(signature_b64)?)?;

    verify_ecdsa(&public_key, &signature, message)?;
    log::info!("ECDSA ({}) signature verified with {key}", public_key.curve());
    Ok(())
}

/// Verify with whichever scheme matches the key type of `key`.
///
/// RSA keys are checked as RSA-PSS, EC keys as ECDSA.
pub async fn verify_signature<S: KeyService>(
    service: &S,
    signature_b64: &str,
    message: &[u8],
    key: &KeyPath,
) -> KmsResult<()> {
    match resolve_public_key(service, key).await? {
        PublicKey::Rsa(public_key) => {
            let signature = RsaPssSignature::from_base64(signature_b64)?;
            verify_rsa_pss(&public_key, &signature, message)
        }
        PublicKey::Ec(public_key) => {
            let signature = EcSignatureValue::from_der(&decode_signature(signature_b64)?)?;
            verify_ecdsa(&public_key, &signature, message)
        }
    }
}

fn decode_signature(signature_b64: &str) -> KmsResult<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(signature_b64)
        .map_err(|e| KmsError::decode("signature", e))
}
