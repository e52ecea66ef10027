// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use hcert_abstractions::{AnchorKey, TrustAnchor};
use hcert_test_utils::{
    build_es256_message, encode_cose_sign1, encode_protected_header, self_signed_p256_cert_and_key, sig_structure,
};
use hcert_validation::{verify_cose_sign1, CoseAlgorithm, VerifyError};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rsa::traits::PublicKeyParts as _;
use signature::{RandomizedSigner as _, SignatureEncoding as _, Signer as _};

fn ec_anchor(point: &[u8], width: usize) -> TrustAnchor {
    TrustAnchor {
        key_id: b"k".to_vec(),
        key: AnchorKey::Ec {
            x: point[1..1 + width].to_vec(),
            y: point[1 + width..].to_vec(),
        },
        certificate_chain: Vec::new(),
    }
}

#[test]
fn verify_es384_succeeds() {
    let sk = p384::ecdsa::SigningKey::from_bytes(&[3u8; 48].into()).unwrap();
    let protected = encode_protected_header(-35, Some(b"k"));
    let signature: p384::ecdsa::Signature = sk.sign(&sig_structure(&protected, b"payload"));
    let cose = encode_cose_sign1(&[18], &protected, &[], Some(b"payload"), &signature.to_bytes());

    let point = sk.verifying_key().to_encoded_point(false);
    let alg = verify_cose_sign1(&cose, &ec_anchor(point.as_bytes(), 48)).unwrap();
    assert_eq!(alg, CoseAlgorithm::ES384);
}

#[test]
fn verify_es512_succeeds() {
    let mut rng = p521::elliptic_curve::rand_core::OsRng;
    let sk = p521::ecdsa::SigningKey::random(&mut rng);
    let protected = encode_protected_header(-36, Some(b"k"));
    let signature: p521::ecdsa::Signature = sk.sign(&sig_structure(&protected, b"payload"));
    let cose = encode_cose_sign1(&[], &protected, &[], Some(b"payload"), &signature.to_bytes());

    let vk = p521::ecdsa::VerifyingKey::from(&sk);
    let point = vk.to_encoded_point(false);
    let alg = verify_cose_sign1(&cose, &ec_anchor(point.as_bytes(), 66)).unwrap();
    assert_eq!(alg, CoseAlgorithm::ES512);
}

fn rsa_key() -> rsa::RsaPrivateKey {
    let mut rng = rand_core::OsRng;
    rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap()
}

fn rsa_anchor(key: &rsa::RsaPrivateKey) -> TrustAnchor {
    TrustAnchor {
        key_id: b"rsa".to_vec(),
        key: AnchorKey::Rsa {
            n: key.n().to_bytes_be(),
            e: key.e().to_bytes_be(),
        },
        certificate_chain: Vec::new(),
    }
}

#[test]
fn verify_rsa_ps256_and_rs256() {
    use rsa::pkcs1v15;
    use rsa::pss;
    use sha2::Sha256;

    let private_key = rsa_key();
    let anchor = rsa_anchor(&private_key);

    let protected = encode_protected_header(-37, Some(b"rsa"));
    let pss_key = pss::BlindedSigningKey::<Sha256>::new(private_key.clone());
    let sig = pss_key.sign_with_rng(&mut rand_core::OsRng, &sig_structure(&protected, b"payload"));
    let cose = encode_cose_sign1(&[18], &protected, &[], Some(b"payload"), &sig.to_vec());
    assert_eq!(verify_cose_sign1(&cose, &anchor).unwrap(), CoseAlgorithm::PS256);

    let protected = encode_protected_header(-257, Some(b"rsa"));
    let pkcs1_key = pkcs1v15::SigningKey::<Sha256>::new(private_key);
    let sig = pkcs1_key.sign(&sig_structure(&protected, b"payload"));
    let cose = encode_cose_sign1(&[18], &protected, &[], Some(b"payload"), &sig.to_vec());
    assert_eq!(verify_cose_sign1(&cose, &anchor).unwrap(), CoseAlgorithm::RS256);

    // An RS256 signature presented as PS256 must not verify.
    let mislabelled = encode_cose_sign1(
        &[18],
        &encode_protected_header(-37, Some(b"rsa")),
        &[],
        Some(b"payload"),
        &sig.to_vec(),
    );
    assert!(matches!(
        verify_cose_sign1(&mislabelled, &anchor),
        Err(VerifyError::BadSignature(_))
    ));
}

#[test]
fn es256_header_against_rsa_anchor_is_mismatch() {
    let anchor = rsa_anchor(&rsa_key());
    let cose = build_es256_message(&hcert_test_utils::test_signing_key(1), Some(b"rsa"), b"payload");
    assert!(matches!(
        verify_cose_sign1(&cose, &anchor),
        Err(VerifyError::AlgorithmMismatch { key_type: "RSA", .. })
    ));
}

#[test]
fn certificate_only_anchor_uses_certificate_key() {
    let (cert_der, sk) = self_signed_p256_cert_and_key("Test DSC");
    let anchor = TrustAnchor {
        key_id: b"cert".to_vec(),
        key: AnchorKey::FromCertificate,
        certificate_chain: vec![cert_der],
    };

    let cose = build_es256_message(&sk, Some(b"cert"), b"payload");
    assert_eq!(verify_cose_sign1(&cose, &anchor).unwrap(), CoseAlgorithm::ES256);

    let other = build_es256_message(&hcert_test_utils::test_signing_key(8), Some(b"cert"), b"payload");
    assert!(matches!(
        verify_cose_sign1(&other, &anchor),
        Err(VerifyError::BadSignature(_))
    ));
}

#[test]
fn certificate_only_anchor_with_garbage_certificate_is_invalid_key() {
    let anchor = TrustAnchor {
        key_id: b"cert".to_vec(),
        key: AnchorKey::FromCertificate,
        certificate_chain: vec![b"not a certificate".to_vec()],
    };
    let cose = build_es256_message(&hcert_test_utils::test_signing_key(1), Some(b"cert"), b"payload");
    assert!(matches!(
        verify_cose_sign1(&cose, &anchor),
        Err(VerifyError::InvalidPublicKey(_))
    ));
}
