//! Sign-then-verify tests
//!
//! Signatures come from the in-memory key service and are checked locally,
//! including tampered messages, perturbed signature values and malformed
//! inputs.

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::{fixture, ScriptedService};
use kms_asymmetric::{
    resolve_public_key, sign_asymmetric, verify_signature, verify_signature_ec,
    verify_signature_rsa, KeyKind, KeyPath, KmsError,
};
use p256::elliptic_curve::ff::{Field, PrimeField};

/// Decode a base64 P-256 DER signature and hand back its scalars.
fn split_scalars(signature_b64: &str) -> (p256::Scalar, p256::Scalar) {
    let der = STANDARD.decode(signature_b64).unwrap();
    let signature = p256::ecdsa::Signature::from_der(&der).unwrap();
    let (r, s) = signature.split_scalars();
    (*r, *s)
}

fn join_scalars(r: p256::Scalar, s: p256::Scalar) -> String {
    let signature = p256::ecdsa::Signature::from_scalars(r.to_repr(), s.to_repr()).unwrap();
    STANDARD.encode(signature.to_der().as_bytes())
}

mod rsa_pss_tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_then_verify() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"my message", &fx.rsa_sign)
            .await
            .unwrap();

        // 2048-bit key
        assert_eq!(STANDARD.decode(&signature).unwrap().len(), 256);
        verify_signature_rsa(&fx.service, &signature, b"my message", &fx.rsa_sign)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_any_altered_message_byte_fails() {
        let fx = fixture();
        let message = b"my message".to_vec();
        let signature = sign_asymmetric(&fx.service, &message, &fx.rsa_sign)
            .await
            .unwrap();

        for i in 0..message.len() {
            let mut altered = message.clone();
            altered[i] ^= 0x01;
            let err = verify_signature_rsa(&fx.service, &signature, &altered, &fx.rsa_sign)
                .await
                .unwrap_err();
            assert!(
                matches!(err, KmsError::VerificationFailed { scheme: "RSA-PSS" }),
                "byte {i}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_altered_signature_byte_fails() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"my message", &fx.rsa_sign)
            .await
            .unwrap();
        let mut bytes = STANDARD.decode(&signature).unwrap();

        for i in [0usize, 100, 255] {
            bytes[i] ^= 0x80;
            let err = verify_signature_rsa(
                &fx.service,
                &STANDARD.encode(&bytes),
                b"my message",
                &fx.rsa_sign,
            )
            .await
            .unwrap_err();
            assert!(err.is_verification_failure(), "byte {i}: {err}");
            bytes[i] ^= 0x80;
        }
    }
}

mod ecdsa_tests {
    use super::*;

    #[tokio::test]
    async fn test_p256_sign_then_verify() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"test", &fx.ec_p256)
            .await
            .unwrap();
        verify_signature_ec(&fx.service, &signature, b"test", &fx.ec_p256)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_p384_sign_then_verify() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"test", &fx.ec_p384)
            .await
            .unwrap();
        verify_signature_ec(&fx.service, &signature, b"test", &fx.ec_p384)
            .await
            .unwrap();

        let err = verify_signature_ec(&fx.service, &signature, b"tesT", &fx.ec_p384)
            .await
            .unwrap_err();
        assert!(matches!(err, KmsError::VerificationFailed { scheme: "ECDSA" }));
    }

    #[tokio::test]
    async fn test_perturbed_r_or_s_fails() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"test", &fx.ec_p256)
            .await
            .unwrap();
        let (r, s) = split_scalars(&signature);

        let r_plus_one = join_scalars(r + <p256::Scalar as Field>::ONE, s);
        let err = verify_signature_ec(&fx.service, &r_plus_one, b"test", &fx.ec_p256)
            .await
            .unwrap_err();
        assert!(matches!(err, KmsError::VerificationFailed { .. }), "{err}");

        let s_plus_one = join_scalars(r, s + <p256::Scalar as Field>::ONE);
        let err = verify_signature_ec(&fx.service, &s_plus_one, b"test", &fx.ec_p256)
            .await
            .unwrap_err();
        assert!(matches!(err, KmsError::VerificationFailed { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_flipped_last_byte_of_s_fails() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"test", &fx.ec_p256)
            .await
            .unwrap();

        // S is the last INTEGER, so the last DER byte is its low byte
        let mut der = STANDARD.decode(&signature).unwrap();
        let last = der.len() - 1;
        der[last] ^= 0x01;

        let err = verify_signature_ec(&fx.service, &STANDARD.encode(&der), b"test", &fx.ec_p256)
            .await
            .unwrap_err();
        assert!(matches!(err, KmsError::VerificationFailed { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_signature_from_other_key_fails() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"test", &fx.ec_p256_other)
            .await
            .unwrap();

        let err = verify_signature_ec(&fx.service, &signature, b"test", &fx.ec_p256)
            .await
            .unwrap_err();
        assert!(err.is_verification_failure());
    }

    #[tokio::test]
    async fn test_junk_der_is_parse_failure() {
        let fx = fixture();

        for junk in [vec![], vec![0x30], vec![0x04, 0x02, 0x01, 0x01], vec![0xff; 16]] {
            let err = verify_signature_ec(&fx.service, &STANDARD.encode(&junk), b"test", &fx.ec_p256)
                .await
                .unwrap_err();
            assert!(matches!(err, KmsError::SignatureParseFailed(_)), "{junk:?}: {err}");
        }
    }
}

mod malformed_input_tests {
    use super::*;

    #[tokio::test]
    async fn test_non_base64_signature_is_decode_failure() {
        let fx = fixture();

        let err = verify_signature_rsa(&fx.service, "not base64!", b"m", &fx.rsa_sign)
            .await
            .unwrap_err();
        assert!(matches!(err, KmsError::DecodeFailed { what: "signature", .. }));
        assert!(!err.is_verification_failure());

        let err = verify_signature_ec(&fx.service, "%%%", b"m", &fx.ec_p256)
            .await
            .unwrap_err();
        assert!(matches!(err, KmsError::DecodeFailed { what: "signature", .. }));
        assert!(!err.is_verification_failure());
    }

    #[tokio::test]
    async fn test_scheme_must_match_key_type() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"m", &fx.ec_p256).await.unwrap();

        let err = verify_signature_rsa(&fx.service, &signature, b"m", &fx.ec_p256)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KmsError::KeyTypeMismatch {
                expected: KeyKind::Rsa,
                actual: KeyKind::Ec,
                ..
            }
        ));

        let err = verify_signature_ec(&fx.service, &signature, b"m", &fx.rsa_sign)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KmsError::KeyTypeMismatch {
                expected: KeyKind::Ec,
                actual: KeyKind::Rsa,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_pem_is_parse_failure() {
        let key = KeyPath::new("scripted").unwrap();
        let truncated = "-----BEGIN PUBLIC KEY-----\nMFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE\n-----END PUBLIC KEY-----\n";
        let wrong_label = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";

        for pem in ["", "garbage", "-----BEGIN PUBLIC KEY-----\n", truncated, wrong_label] {
            let service = ScriptedService::with_public_key(pem);
            let err = resolve_public_key(&service, &key).await.unwrap_err();
            assert!(matches!(err, KmsError::ParseFailed(_)), "{pem:?}: {err}");

            let err = verify_signature(&service, "AAAA", b"m", &key)
                .await
                .unwrap_err();
            assert!(matches!(err, KmsError::ParseFailed(_)));
        }
    }
}

mod dispatch_tests {
    use super::*;

    #[tokio::test]
    async fn test_verify_signature_picks_scheme_from_key() {
        let fx = fixture();

        for key in [&fx.rsa_sign, &fx.ec_p256, &fx.ec_p384] {
            let signature = sign_asymmetric(&fx.service, b"my message", key).await.unwrap();
            verify_signature(&fx.service, &signature, b"my message", key)
                .await
                .unwrap_or_else(|e| panic!("{key}: {e}"));

            let err = verify_signature(&fx.service, &signature, b"other", key)
                .await
                .unwrap_err();
            assert!(err.is_verification_failure(), "{key}: {err}");
        }
    }

    #[tokio::test]
    async fn test_concurrent_verification() {
        let fx = fixture();
        let signature = sign_asymmetric(&fx.service, b"shared", &fx.ec_p256)
            .await
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let signature = signature.clone();
                tokio::spawn(async move {
                    verify_signature_ec(&fx.service, &signature, b"shared", &fx.ec_p256).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    }
}
