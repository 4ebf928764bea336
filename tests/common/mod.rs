//! Shared fixtures for integration tests.
//!
//! Key generation (RSA-2048 in particular) is slow in debug builds, so one
//! set of keys is generated from a fixed seed and shared by every test in a
//! binary.

#![allow(dead_code)]

use std::sync::OnceLock;

use kms_asymmetric::{InMemoryKeyService, KeyPath, KeyService, ServiceError, ServiceErrorKind};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// In-memory service with one key of each supported purpose.
pub struct Fixture {
    pub service: InMemoryKeyService,
    pub rsa_decrypt: KeyPath,
    pub rsa_sign: KeyPath,
    pub ec_p256: KeyPath,
    pub ec_p384: KeyPath,
    /// Second P-256 key, for wrong-key checks.
    pub ec_p256_other: KeyPath,
}

/// Build a crypto key version path in the `test` project.
pub fn key_version(crypto_key: &str) -> KeyPath {
    KeyPath::crypto_key_version("test", "global", "ring", crypto_key, "1")
        .expect("valid key path")
}

/// Keys shared by every test in this binary.
pub fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(0x6b6d_7321);
        let mut service = InMemoryKeyService::new();

        let rsa_decrypt = key_version("rsa-decrypt");
        let rsa_sign = key_version("rsa-sign");
        let ec_p256 = key_version("ec-p256");
        let ec_p384 = key_version("ec-p384");
        let ec_p256_other = key_version("ec-p256-other");

        service
            .generate_rsa_decrypt_key(rsa_decrypt.clone(), 2048, &mut rng)
            .expect("RSA key generation");
        service
            .generate_rsa_sign_key(rsa_sign.clone(), 2048, &mut rng)
            .expect("RSA key generation");
        service.generate_p256_sign_key(ec_p256.clone(), &mut rng);
        service.generate_p384_sign_key(ec_p384.clone(), &mut rng);
        service.generate_p256_sign_key(ec_p256_other.clone(), &mut rng);

        Fixture {
            service,
            rsa_decrypt,
            rsa_sign,
            ec_p256,
            ec_p384,
            ec_p256_other,
        }
    })
}

/// Key service returning canned responses regardless of the key.
pub struct ScriptedService {
    pub public_key: Result<String, ServiceError>,
    pub plaintext: Result<String, ServiceError>,
    pub signature: Result<String, ServiceError>,
}

impl Default for ScriptedService {
    fn default() -> Self {
        let unscripted = || Err(ServiceError::new(ServiceErrorKind::Other, "not scripted"));
        Self {
            public_key: unscripted(),
            plaintext: unscripted(),
            signature: unscripted(),
        }
    }
}

impl ScriptedService {
    pub fn with_public_key(pem: impl Into<String>) -> Self {
        Self {
            public_key: Ok(pem.into()),
            ..Self::default()
        }
    }

    pub fn with_plaintext(plaintext_b64: impl Into<String>) -> Self {
        Self {
            plaintext: Ok(plaintext_b64.into()),
            ..Self::default()
        }
    }
}

impl KeyService for ScriptedService {
    async fn get_public_key(&self, _key: &KeyPath) -> Result<String, ServiceError> {
        self.public_key.clone()
    }

    async fn asymmetric_decrypt(
        &self,
        _key: &KeyPath,
        _ciphertext_b64: &str,
    ) -> Result<String, ServiceError> {
        self.plaintext.clone()
    }

    async fn asymmetric_sign(
        &self,
        _key: &KeyPath,
        _digest_sha256_b64: &str,
    ) -> Result<String, ServiceError> {
        self.signature.clone()
    }
}
