use std::fmt;

use base64::Engine;
use der::asn1::IntRef;
use der::{Decode, Sequence};

use crate::infra::error::{KmsError, KmsResult};

/// RSA-PSS signature bytes. Opaque until checked against a digest.
#[derive(Clone, Eq, PartialEq)]
pub struct RsaPssSignature(Box<[u8]>);

impl RsaPssSignature {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }

    pub fn from_base64(encoded: &str) -> KmsResult<Self> {
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(Self::new)
            .map_err(|e| KmsError::decode("signature", e))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RsaPssSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPssSignature(len={})", self.0.len())
    }
}

/// `Ecdsa-Sig-Value ::= SEQUENCE { r INTEGER, s INTEGER }`
#[derive(Sequence)]
struct EcdsaSigValue<'a> {
    r: IntRef<'a>,
    s: IntRef<'a>,
}

/// EC signature as its `(R, S)` integer pair.
///
/// Integers are held as DER content octets (big-endian two's complement) so
/// that any value the encoding can express, including negative or oversized
/// ones, survives decoding. Range checks belong to verification.
#[derive(Clone, Eq, PartialEq)]
pub struct EcSignatureValue {
    r: Box<[u8]>,
    s: Box<[u8]>,
}

impl EcSignatureValue {
    /// Decode a DER `SEQUENCE { INTEGER r, INTEGER s }`.
    ///
    /// Trailing bytes after the sequence are rejected.
    pub fn from_der(der: &[u8]) -> KmsResult<Self> {
        let value = EcdsaSigValue::from_der(der)
            .map_err(|e| KmsError::SignatureParseFailed(e.to_string()))?;
        Ok(Self {
            r: value.r.as_bytes().into(),
            s: value.s.as_bytes().into(),
        })
    }

    #[must_use]
    pub fn r(&self) -> &[u8] {
        &self.r
    }

    #[must_use]
    pub fn s(&self) -> &[u8] {
        &self.s
    }

    /// `R` as an unsigned big-endian integer of exactly `width` bytes, or
    /// `None` if it is negative or does not fit.
    #[must_use]
    pub fn r_fixed(&self, width: usize) -> Option<Vec<u8>> {
        fixed_width_unsigned(&self.r, width)
    }

    /// `S` as an unsigned big-endian integer of exactly `width` bytes, or
    /// `None` if it is negative or does not fit.
    #[must_use]
    pub fn s_fixed(&self, width: usize) -> Option<Vec<u8>> {
        fixed_width_unsigned(&self.s, width)
    }
}

impl fmt::Debug for EcSignatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EcSignatureValue(r_len={}, s_len={})",
            self.r.len(),
            self.s.len()
        )
    }
}

fn fixed_width_unsigned(twos_complement: &[u8], width: usize) -> Option<Vec<u8>> {
    if twos_complement.first().is_some_and(|b| b & 0x80 != 0) {
        return None;
    }
    let first_nonzero = twos_complement
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(twos_complement.len());
    let magnitude = &twos_complement[first_nonzero..];
    if magnitude.len() > width {
        return None;
    }
    let mut out = vec![0u8; width - magnitude.len()];
    out.extend_from_slice(magnitude);
    Some(out)
}
