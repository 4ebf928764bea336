//! Public key domain type and PEM/PKIX parsing.

use std::fmt;

use der::Decode;
use rsa::RsaPublicKey;
use spki::{DecodePublicKey, EncodePublicKey, ObjectIdentifier, SubjectPublicKeyInfoRef};

use crate::infra::error::{KmsError, KmsResult};

/// PEM label of a PKIX `SubjectPublicKeyInfo` block.
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// Key family, used to report narrowing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Rsa,
    Ec,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Rsa => f.write_str("RSA"),
            KeyKind::Ec => f.write_str("EC"),
        }
    }
}

/// Named curves accepted for EC keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
}

impl EcCurve {
    /// Size in bytes of a field element (and of each signature scalar).
    #[must_use]
    pub fn field_size(&self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
        }
    }
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcCurve::P256 => f.write_str("P-256"),
            EcCurve::P384 => f.write_str("P-384"),
        }
    }
}

/// EC public key: a curve and a point on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcPublicKey {
    P256(p256::PublicKey),
    /// Signatures are verified over a SHA-256 prehash, so only keys that sign
    /// SHA-256 digests (not `EC_SIGN_P384_SHA384`) verify successfully.
    P384(p384::PublicKey),
}

impl EcPublicKey {
    #[must_use]
    pub fn curve(&self) -> EcCurve {
        match self {
            EcPublicKey::P256(_) => EcCurve::P256,
            EcPublicKey::P384(_) => EcCurve::P384,
        }
    }
}

/// Public key returned by the key service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Ec(EcPublicKey),
}

impl PublicKey {
    /// Parse a DER-encoded PKIX `SubjectPublicKeyInfo`.
    pub fn from_spki_der(der: &[u8]) -> KmsResult<Self> {
        let spki = SubjectPublicKeyInfoRef::from_der(der).map_err(|e| {
            KmsError::ParseFailed(format!("malformed SubjectPublicKeyInfo: {e}"))
        })?;
        let algorithm = spki.algorithm.oid;

        if algorithm == RSA_ENCRYPTION {
            return RsaPublicKey::from_public_key_der(der)
                .map(PublicKey::Rsa)
                .map_err(|e| KmsError::ParseFailed(format!("invalid RSA public key: {e}")));
        }

        if algorithm == EC_PUBLIC_KEY {
            let curve = spki.algorithm.parameters_oid().map_err(|e| {
                KmsError::ParseFailed(format!("EC public key is missing its named curve: {e}"))
            })?;

            let key = if curve == SECP256R1 {
                p256::PublicKey::from_public_key_der(der).map(EcPublicKey::P256)
            } else if curve == SECP384R1 {
                p384::PublicKey::from_public_key_der(der).map(EcPublicKey::P384)
            } else {
                return Err(KmsError::ParseFailed(format!(
                    "unsupported EC curve: {curve}"
                )));
            };

            return key
                .map(PublicKey::Ec)
                .map_err(|e| KmsError::ParseFailed(format!("invalid EC public key: {e}")));
        }

        Err(KmsError::ParseFailed(format!(
            "unsupported public key algorithm: {algorithm}"
        )))
    }

    #[must_use]
    pub fn kind(&self) -> KeyKind {
        match self {
            PublicKey::Rsa(_) => KeyKind::Rsa,
            PublicKey::Ec(_) => KeyKind::Ec,
        }
    }

    /// Narrow to an RSA key, reporting `operation` on mismatch.
    pub fn into_rsa(self, operation: &'static str) -> KmsResult<RsaPublicKey> {
        match self {
            PublicKey::Rsa(key) => Ok(key),
            PublicKey::Ec(_) => Err(KmsError::KeyTypeMismatch {
                operation,
                expected: KeyKind::Rsa,
                actual: KeyKind::Ec,
            }),
        }
    }

    /// Narrow to an EC key, reporting `operation` on mismatch.
    pub fn into_ec(self, operation: &'static str) -> KmsResult<EcPublicKey> {
        match self {
            PublicKey::Ec(key) => Ok(key),
            PublicKey::Rsa(_) => Err(KmsError::KeyTypeMismatch {
                operation,
                expected: KeyKind::Ec,
                actual: KeyKind::Rsa,
            }),
        }
    }

    /// Re-encode as a PEM `PUBLIC KEY` block.
    pub fn to_pem(&self) -> KmsResult<String> {
        let line_ending = spki::der::pem::LineEnding::LF;
        let pem = match self {
            PublicKey::Rsa(key) => key.to_public_key_pem(line_ending),
            PublicKey::Ec(EcPublicKey::P256(key)) => key.to_public_key_pem(line_ending),
            PublicKey::Ec(EcPublicKey::P384(key)) => key.to_public_key_pem(line_ending),
        };
        pem.map_err(|e| KmsError::ParseFailed(format!("failed to encode public key: {e}")))
    }
}

/// Parse the first PEM block of `pem_text` as a PKIX public key.
///
/// Text around the block is ignored. Every failure, including input with no
/// PEM block at all, is reported as [`KmsError::ParseFailed`].
pub fn parse_public_key_pem(pem_text: &str) -> KmsResult<PublicKey> {
    let block = pem::parse(pem_text)
        .map_err(|e| KmsError::ParseFailed(format!("no PEM block found: {e}")))?;

    if block.tag() != PUBLIC_KEY_LABEL {
        return Err(KmsError::ParseFailed(format!(
            "unexpected PEM block label '{}', expected '{PUBLIC_KEY_LABEL}'",
            block.tag()
        )));
    }

    PublicKey::from_spki_der(block.contents())
}
