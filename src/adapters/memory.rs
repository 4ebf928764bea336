//! In-process key service holding private keys locally.
//!
//! Performs the same private-key operations as the remote service (RSA-OAEP
//! decryption, RSA-PSS and ECDSA signing over a SHA-256 digest) with real
//! cryptography, so the envelope code can be exercised end to end without a
//! network. Intended for tests and offline self-checks, not for protecting
//! production keys.

use std::collections::HashMap;

use base64::Engine;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rsa::{Oaep, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use spki::der::pem::LineEnding;
use spki::EncodePublicKey;

use crate::adapters::key_service::{KeyService, ServiceError, ServiceErrorKind};
use crate::domain::crypto::Sha256Digest;
use crate::domain::types::KeyPath;
use crate::infra::error::{KmsError, KmsResult};

/// Purpose and material of a locally held key.
enum LocalKey {
    RsaDecrypt(RsaPrivateKey),
    RsaSignPss(RsaPrivateKey),
    EcSignP256(p256::ecdsa::SigningKey),
    EcSignP384(p384::ecdsa::SigningKey),
}

impl LocalKey {
    fn purpose(&self) -> &'static str {
        match self {
            LocalKey::RsaDecrypt(_) => "RSA_DECRYPT_OAEP_SHA256",
            LocalKey::RsaSignPss(_) => "RSA_SIGN_PSS_SHA256",
            LocalKey::EcSignP256(_) => "EC_SIGN_P256_SHA256",
            LocalKey::EcSignP384(_) => "EC_SIGN_P384_SHA256",
        }
    }
}

/// [`KeyService`] backed by private keys in memory.
#[derive(Default)]
pub struct InMemoryKeyService {
    keys: HashMap<KeyPath, LocalKey>,
}

impl InMemoryKeyService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an RSA key used for OAEP-SHA256 decryption.
    pub fn add_rsa_decrypt_key(&mut self, key: KeyPath, private_key: RsaPrivateKey) {
        self.keys.insert(key, LocalKey::RsaDecrypt(private_key));
    }

    /// Register an RSA key used for PSS-SHA256 signing.
    pub fn add_rsa_sign_key(&mut self, key: KeyPath, private_key: RsaPrivateKey) {
        self.keys.insert(key, LocalKey::RsaSignPss(private_key));
    }

    /// Register a P-256 ECDSA signing key.
    pub fn add_p256_sign_key(&mut self, key: KeyPath, signing_key: p256::ecdsa::SigningKey) {
        self.keys.insert(key, LocalKey::EcSignP256(signing_key));
    }

    /// Register a P-384 ECDSA signing key.
    pub fn add_p384_sign_key(&mut self, key: KeyPath, signing_key: p384::ecdsa::SigningKey) {
        self.keys.insert(key, LocalKey::EcSignP384(signing_key));
    }

    /// Generate and register an RSA decryption key of `bits` size.
    pub fn generate_rsa_decrypt_key<R: RngCore + CryptoRng>(
        &mut self,
        key: KeyPath,
        bits: usize,
        rng: &mut R,
    ) -> KmsResult<RsaPublicKey> {
        let private_key = generate_rsa(bits, rng)?;
        let public_key = private_key.to_public_key();
        self.add_rsa_decrypt_key(key, private_key);
        Ok(public_key)
    }

    /// Generate and register an RSA-PSS signing key of `bits` size.
    pub fn generate_rsa_sign_key<R: RngCore + CryptoRng>(
        &mut self,
        key: KeyPath,
        bits: usize,
        rng: &mut R,
    ) -> KmsResult<RsaPublicKey> {
        let private_key = generate_rsa(bits, rng)?;
        let public_key = private_key.to_public_key();
        self.add_rsa_sign_key(key, private_key);
        Ok(public_key)
    }

    /// Generate and register a P-256 signing key.
    pub fn generate_p256_sign_key<R: RngCore + CryptoRng>(
        &mut self,
        key: KeyPath,
        rng: &mut R,
    ) -> p256::PublicKey {
        let signing_key = p256::ecdsa::SigningKey::random(rng);
        let public_key = p256::PublicKey::from(signing_key.verifying_key());
        self.add_p256_sign_key(key, signing_key);
        public_key
    }

    /// Generate and register a P-384 signing key.
    pub fn generate_p384_sign_key<R: RngCore + CryptoRng>(
        &mut self,
        key: KeyPath,
        rng: &mut R,
    ) -> p384::PublicKey {
        let signing_key = p384::ecdsa::SigningKey::random(rng);
        let public_key = p384::PublicKey::from(signing_key.verifying_key());
        self.add_p384_sign_key(key, signing_key);
        public_key
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn lookup(&self, key: &KeyPath) -> Result<&LocalKey, ServiceError> {
        self.keys.get(key).ok_or_else(|| ServiceError::not_found(key))
    }

    fn public_key_pem(local: &LocalKey) -> Result<String, spki::Error> {
        match local {
            LocalKey::RsaDecrypt(private_key) | LocalKey::RsaSignPss(private_key) => private_key
                .to_public_key()
                .to_public_key_pem(LineEnding::LF),
            LocalKey::EcSignP256(signing_key) => {
                signing_key.verifying_key().to_public_key_pem(LineEnding::LF)
            }
            LocalKey::EcSignP384(signing_key) => {
                signing_key.verifying_key().to_public_key_pem(LineEnding::LF)
            }
        }
    }

    fn sign_digest(local: &LocalKey, digest: &Sha256Digest) -> Result<Vec<u8>, ServiceError> {
        let signing_failed =
            |e: &dyn std::fmt::Display| ServiceError::new(ServiceErrorKind::Other, e.to_string());

        match local {
            LocalKey::RsaSignPss(private_key) => private_key
                .sign_with_rng(
                    &mut OsRng,
                    Pss::new_with_salt::<Sha256>(Sha256Digest::LEN),
                    digest.as_bytes(),
                )
                .map_err(|e| signing_failed(&e)),
            LocalKey::EcSignP256(signing_key) => {
                let signature: p256::ecdsa::Signature = signing_key
                    .sign_prehash(digest.as_bytes())
                    .map_err(|e| signing_failed(&e))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            LocalKey::EcSignP384(signing_key) => {
                let signature: p384::ecdsa::Signature = signing_key
                    .sign_prehash(digest.as_bytes())
                    .map_err(|e| signing_failed(&e))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            LocalKey::RsaDecrypt(_) => Err(ServiceError::new(
                ServiceErrorKind::FailedPrecondition,
                format!("key purpose {} does not allow signing", local.purpose()),
            )),
        }
    }
}

fn generate_rsa<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> KmsResult<RsaPrivateKey> {
    RsaPrivateKey::new(rng, bits)
        .map_err(|e| KmsError::ValidationError(format!("RSA key generation failed: {e}")))
}

impl KeyService for InMemoryKeyService {
    async fn get_public_key(&self, key: &KeyPath) -> Result<String, ServiceError> {
        let local = self.lookup(key)?;
        Self::public_key_pem(local)
            .map_err(|e| ServiceError::new(ServiceErrorKind::Other, e.to_string()))
    }

    async fn asymmetric_decrypt(
        &self,
        key: &KeyPath,
        ciphertext_b64: &str,
    ) -> Result<String, ServiceError> {
        let LocalKey::RsaDecrypt(private_key) = self.lookup(key)? else {
            return Err(ServiceError::new(
                ServiceErrorKind::FailedPrecondition,
                format!("key {key} is not a decryption key"),
            ));
        };

        let ciphertext = base64::engine::general_purpose::STANDARD
            .decode(ciphertext_b64)
            .map_err(|e| {
                ServiceError::new(
                    ServiceErrorKind::InvalidArgument,
                    format!("ciphertext is not valid base64: {e}"),
                )
            })?;

        let plaintext = private_key
            .decrypt(Oaep::new::<Sha256>(), &ciphertext)
            .map_err(|_| {
                ServiceError::new(ServiceErrorKind::InvalidArgument, "Decryption failed")
            })?;

        Ok(base64::engine::general_purpose::STANDARD.encode(plaintext))
    }

    async fn asymmetric_sign(
        &self,
        key: &KeyPath,
        digest_sha256_b64: &str,
    ) -> Result<String, ServiceError> {
        let local = self.lookup(key)?;

        let digest_bytes = base64::engine::general_purpose::STANDARD
            .decode(digest_sha256_b64)
            .map_err(|e| {
                ServiceError::new(
                    ServiceErrorKind::InvalidArgument,
                    format!("digest is not valid base64: {e}"),
                )
            })?;
        let digest = Sha256Digest::from_slice(&digest_bytes)
            .map_err(|e| ServiceError::new(ServiceErrorKind::InvalidArgument, e.to_string()))?;

        let signature = Self::sign_digest(local, &digest)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(signature))
    }
}
