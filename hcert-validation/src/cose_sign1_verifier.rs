// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Sign1 signature verification against a trust anchor.
//!
//! The verification key comes from the anchor:
//! - EC affine coordinates (ES256/ES384/ES512)
//! - RSA modulus and exponent (PS256/RS256)
//! - the SubjectPublicKeyInfo of the anchor's signing certificate
//!
//! The curve or padding is taken from the COSE `alg` header when present. When
//! `alg` is absent from both header maps the key material decides.

use hcert_abstractions::{AnchorKey, SignedMessage, TrustAnchor};
use hcert_common::{encode_signature1_sig_structure, parse_signed_message};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePublicKey as _;
use rsa::pkcs1v15;
use rsa::pss;
use rsa::{BigUint, RsaPublicKey};
use serde::Serialize;
use sha2::Sha256;
use signature::Verifier;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[repr(i64)]
pub enum CoseAlgorithm {
    /// ECDSA w/ SHA-256 over P-256.
    ES256 = -7,
    /// ECDSA w/ SHA-384 over P-384.
    ES384 = -35,
    /// ECDSA w/ SHA-512 over P-521.
    ES512 = -36,
    /// RSASSA-PSS w/ SHA-256.
    PS256 = -37,
    /// RSASSA-PKCS1v1.5 w/ SHA-256.
    RS256 = -257,
}

impl CoseAlgorithm {
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            -7 => Some(Self::ES256),
            -35 => Some(Self::ES384),
            -36 => Some(Self::ES512),
            -37 => Some(Self::PS256),
            -257 => Some(Self::RS256),
            _ => None,
        }
    }

    pub fn id(self) -> i64 {
        self as i64
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("failed to parse COSE_Sign1: {0}")]
    Parse(String),

    #[error("unsupported alg: {0}")]
    UnsupportedAlgorithm(i64),

    #[error("alg header {alg:?} does not match the anchor's {key_type} key")]
    AlgorithmMismatch { alg: CoseAlgorithm, key_type: &'static str },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("bad signature: {0}")]
    BadSignature(String),
}

impl VerifyError {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "COSE_PARSE_ERROR",
            Self::UnsupportedAlgorithm(_) => "MISSING_OR_INVALID_ALG",
            Self::AlgorithmMismatch { .. } => "ALG_MISMATCH",
            Self::InvalidPublicKey(_) => "INVALID_PUBLIC_KEY",
            Self::BadSignature(_) => "BAD_SIGNATURE",
        }
    }
}

/// Parse COSE_Sign1 bytes and verify them against `anchor`.
pub fn verify_cose_sign1(cose_sign1: &[u8], anchor: &TrustAnchor) -> Result<CoseAlgorithm, VerifyError> {
    let parsed = parse_signed_message(cose_sign1).map_err(VerifyError::Parse)?;
    verify_signed_message(&parsed, anchor)
}

/// Verify a parsed envelope against `anchor`, returning the algorithm that verified.
///
/// The Sig_structure is built from the protected-header and payload bytes as
/// received; nothing is re-encoded.
pub fn verify_signed_message(msg: &SignedMessage, anchor: &TrustAnchor) -> Result<CoseAlgorithm, VerifyError> {
    let requested = match msg.algorithm_id() {
        Some(id) => Some(CoseAlgorithm::from_id(id).ok_or(VerifyError::UnsupportedAlgorithm(id))?),
        None => None,
    };

    let key = VerificationKey::from_anchor(anchor)?;
    let alg = key.algorithm_for(requested)?;

    let sig_structure = encode_signature1_sig_structure(msg).map_err(VerifyError::Parse)?;
    key.verify(alg, &sig_structure, &msg.signature)?;
    Ok(alg)
}

enum VerificationKey {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
    P521(p521::ecdsa::VerifyingKey),
    Rsa(RsaPublicKey),
}

impl VerificationKey {
    fn from_anchor(anchor: &TrustAnchor) -> Result<Self, VerifyError> {
        match &anchor.key {
            AnchorKey::Ec { x, y } => Self::from_coordinates(x, y),
            AnchorKey::Rsa { n, e } => RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))
                .map(Self::Rsa)
                .map_err(|e| VerifyError::InvalidPublicKey(format!("bad RSA public key: {e}"))),
            AnchorKey::FromCertificate => {
                let der = anchor
                    .signing_certificate_der()
                    .ok_or_else(|| VerifyError::InvalidPublicKey("anchor has no key and no certificate".to_string()))?;
                Self::from_certificate(der)
            }
        }
    }

    /// Curve chosen by coordinate length; leading zero bytes may have been stripped.
    fn from_coordinates(x: &[u8], y: &[u8]) -> Result<Self, VerifyError> {
        let width = x.len().max(y.len());
        match width {
            1..=32 => {
                let point = uncompressed_point(x, y, 32)?;
                p256::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                    .map(Self::P256)
                    .map_err(|e| VerifyError::InvalidPublicKey(format!("bad P-256 public key: {e}")))
            }
            33..=48 => {
                let point = uncompressed_point(x, y, 48)?;
                p384::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                    .map(Self::P384)
                    .map_err(|e| VerifyError::InvalidPublicKey(format!("bad P-384 public key: {e}")))
            }
            49..=66 => {
                let point = uncompressed_point(x, y, 66)?;
                p521::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                    .map(Self::P521)
                    .map_err(|e| VerifyError::InvalidPublicKey(format!("bad P-521 public key: {e}")))
            }
            _ => Err(VerifyError::InvalidPublicKey(format!(
                "EC coordinates of {width} bytes match no supported curve"
            ))),
        }
    }

    fn from_certificate(der: &[u8]) -> Result<Self, VerifyError> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| VerifyError::InvalidPublicKey(format!("invalid signing certificate: {e}")))?;
        // `raw` is the DER encoding of the SPKI structure inside the certificate.
        let spki = cert.tbs_certificate.subject_pki.raw;

        if let Ok(pk) = p256::PublicKey::from_public_key_der(spki) {
            let ep = pk.to_encoded_point(false);
            return p256::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map(Self::P256)
                .map_err(|e| VerifyError::InvalidPublicKey(format!("bad P-256 public key: {e}")));
        }
        if let Ok(pk) = p384::PublicKey::from_public_key_der(spki) {
            let ep = pk.to_encoded_point(false);
            return p384::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map(Self::P384)
                .map_err(|e| VerifyError::InvalidPublicKey(format!("bad P-384 public key: {e}")));
        }
        if let Ok(pk) = p521::PublicKey::from_public_key_der(spki) {
            let ep = pk.to_encoded_point(false);
            return p521::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map(Self::P521)
                .map_err(|e| VerifyError::InvalidPublicKey(format!("bad P-521 public key: {e}")));
        }
        RsaPublicKey::from_public_key_der(spki)
            .map(Self::Rsa)
            .map_err(|_| VerifyError::InvalidPublicKey("unsupported certificate public key type".to_string()))
    }

    fn key_type(&self) -> &'static str {
        match self {
            Self::P256(_) => "P-256",
            Self::P384(_) => "P-384",
            Self::P521(_) => "P-521",
            Self::Rsa(_) => "RSA",
        }
    }

    /// Reconcile the `alg` header with the key; RSA keys default to PS256.
    fn algorithm_for(&self, requested: Option<CoseAlgorithm>) -> Result<CoseAlgorithm, VerifyError> {
        let allowed: &[CoseAlgorithm] = match self {
            Self::P256(_) => &[CoseAlgorithm::ES256],
            Self::P384(_) => &[CoseAlgorithm::ES384],
            Self::P521(_) => &[CoseAlgorithm::ES512],
            Self::Rsa(_) => &[CoseAlgorithm::PS256, CoseAlgorithm::RS256],
        };

        match requested {
            None => Ok(allowed[0]),
            Some(alg) if allowed.contains(&alg) => Ok(alg),
            Some(alg) => Err(VerifyError::AlgorithmMismatch {
                alg,
                key_type: self.key_type(),
            }),
        }
    }

    fn verify(&self, alg: CoseAlgorithm, msg: &[u8], sig: &[u8]) -> Result<(), VerifyError> {
        match self {
            // COSE carries ECDSA signatures as the raw `r || s` concatenation.
            Self::P256(vk) => {
                let signature = p256::ecdsa::Signature::from_slice(sig)
                    .map_err(|e| VerifyError::BadSignature(format!("bad ES256 signature: {e}")))?;
                vk.verify(msg, &signature)
                    .map_err(|_| VerifyError::BadSignature("signature verification failed".to_string()))
            }
            Self::P384(vk) => {
                let signature = p384::ecdsa::Signature::from_slice(sig)
                    .map_err(|e| VerifyError::BadSignature(format!("bad ES384 signature: {e}")))?;
                vk.verify(msg, &signature)
                    .map_err(|_| VerifyError::BadSignature("signature verification failed".to_string()))
            }
            Self::P521(vk) => {
                let signature = p521::ecdsa::Signature::from_slice(sig)
                    .map_err(|e| VerifyError::BadSignature(format!("bad ES512 signature: {e}")))?;
                vk.verify(msg, &signature)
                    .map_err(|_| VerifyError::BadSignature("signature verification failed".to_string()))
            }
            Self::Rsa(key) if alg == CoseAlgorithm::RS256 => {
                let vk = pkcs1v15::VerifyingKey::<Sha256>::new(key.clone());
                let signature = pkcs1v15::Signature::try_from(sig)
                    .map_err(|e| VerifyError::BadSignature(format!("bad RS256 signature bytes: {e}")))?;
                vk.verify(msg, &signature)
                    .map_err(|_| VerifyError::BadSignature("signature verification failed".to_string()))
            }
            Self::Rsa(key) => {
                let vk = pss::VerifyingKey::<Sha256>::new(key.clone());
                let signature = pss::Signature::try_from(sig)
                    .map_err(|e| VerifyError::BadSignature(format!("bad PS256 signature bytes: {e}")))?;
                vk.verify(msg, &signature)
                    .map_err(|_| VerifyError::BadSignature("signature verification failed".to_string()))
            }
        }
    }
}

/// SEC1 `0x04 || x || y` with both coordinates left-padded to `width`.
fn uncompressed_point(x: &[u8], y: &[u8], width: usize) -> Result<Vec<u8>, VerifyError> {
    if x.is_empty() || y.is_empty() || x.len() > width || y.len() > width {
        return Err(VerifyError::InvalidPublicKey(format!(
            "EC coordinates must be 1..={width} bytes"
        )));
    }

    let mut point = Vec::with_capacity(1 + 2 * width);
    point.push(0x04);
    point.resize(1 + width - x.len(), 0);
    point.extend_from_slice(x);
    point.resize(1 + 2 * width - y.len(), 0);
    point.extend_from_slice(y);
    Ok(point)
}
