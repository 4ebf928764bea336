//! KMS Asymmetric Library
//!
//! Local cryptographic envelope around a remote key-management service's
//! asymmetric keys: fetch and parse public keys, RSA-OAEP encrypt locally and
//! decrypt remotely, sign SHA-256 digests remotely, and verify RSA-PSS and
//! ECDSA signatures locally.
//!
//! Private key material never leaves the service. The service is reached
//! through the [`KeyService`] trait, implemented by [`RemoteKeyService`] for
//! the REST API and by [`InMemoryKeyService`] for tests.
//!
//! ```no_run
//! # async fn demo() -> kms_asymmetric::KmsResult<()> {
//! use kms_asymmetric::{
//!     sign_asymmetric, verify_signature_ec, KeyPath, RemoteKeyService, RemoteKeyServiceConfig,
//! };
//!
//! let service = RemoteKeyService::new(RemoteKeyServiceConfig::new("ya29.token"))?;
//! let key = KeyPath::crypto_key_version("my-project", "global", "ring", "ec-signer", "1")?;
//!
//! let signature = sign_asymmetric(&service, b"my message", &key).await?;
//! verify_signature_ec(&service, &signature, b"my message", &key).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

pub use adapters::key_service::{KeyService, ServiceError, ServiceErrorKind};
pub use adapters::memory::InMemoryKeyService;
pub use adapters::remote::client::{RemoteKeyService, RemoteKeyServiceConfig};
pub use domain::crypto::{
    parse_public_key_pem, Ciphertext, EcCurve, EcPublicKey, EcSignatureValue, KeyKind, PublicKey,
    RsaPssSignature, Sha256Digest,
};
pub use domain::types::KeyPath;
pub use infra::config::{ConfigManager, KmsConfiguration};
pub use infra::error::{KmsError, KmsResult};
pub use services::{
    decrypt_rsa, decrypt_rsa_bytes, encrypt_oaep_sha256, encrypt_rsa, resolve_public_key,
    sign_asymmetric, verify_ecdsa, verify_rsa_pss, verify_signature, verify_signature_ec,
    verify_signature_rsa,
};
