// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use hcert_abstractions::{encode_key_id, ClaimSet};
use hcert_validation::{CertificateInfo, CoseAlgorithm};
use serde::{Serialize, Serializer};

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecodeErrorKind {
    /// Input lacks the `HC1:` prefix; almost certainly not a health certificate.
    NotRecognizedFormat,
    /// Base45, deflate, CBOR or claim-shape failure.
    MalformedEncoding,
    /// Structurally valid, but carries no key identifier to resolve.
    UnsupportedVariant,
    /// Key identifier present but not in the trust store.
    NotTrusted,
    /// Key resolved; the signature did not verify.
    SignatureInvalid,
}

impl DecodeErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::NotRecognizedFormat => "NOT_RECOGNIZED_FORMAT",
            Self::MalformedEncoding => "MALFORMED_ENCODING",
            Self::UnsupportedVariant => "UNSUPPORTED_VARIANT",
            Self::NotTrusted => "NOT_TRUSTED",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
        }
    }

    /// End-user text; never includes internal detail.
    pub fn display_message(self) -> &'static str {
        match self {
            Self::NotRecognizedFormat => "Scanned code is not a DCC.",
            Self::MalformedEncoding => "The DCC is malformed.",
            Self::UnsupportedVariant => "The DCC does not identify its signing key and cannot be checked.",
            Self::NotTrusted => "The DCC is not signed by a trusted key.",
            Self::SignatureInvalid => "The signature on the DCC is invalid.",
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejection: the kind plus internal detail for logs.
///
/// Serialization carries the kind only.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {detail}")]
pub struct DecodeError {
    kind: DecodeErrorKind,
    #[serde(skip)]
    detail: String,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Who signed a verified certificate.
///
/// Only the pipeline can build one, so `DecodeResult::Verified` cannot be
/// constructed outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignerInfo {
    #[serde(serialize_with = "serialize_key_id")]
    key_id: Vec<u8>,
    algorithm: CoseAlgorithm,
    certificate: Option<CertificateInfo>,
}

impl SignerInfo {
    pub(crate) fn new(key_id: Vec<u8>, algorithm: CoseAlgorithm, certificate: Option<CertificateInfo>) -> Self {
        Self {
            key_id,
            algorithm,
            certificate,
        }
    }

    pub fn key_id(&self) -> &[u8] {
        &self.key_id
    }

    pub fn algorithm(&self) -> CoseAlgorithm {
        self.algorithm
    }

    /// `None` when the anchor published no certificate or it did not parse.
    pub fn certificate(&self) -> Option<&CertificateInfo> {
        self.certificate.as_ref()
    }
}

fn serialize_key_id<S: Serializer>(key_id: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&encode_key_id(key_id))
}

/// Outcome of decoding a token.
///
/// `Rejected` carries claims only when they parsed; the caller may show them
/// with a warning, never as verified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecodeResult {
    Verified {
        claims: ClaimSet,
        signer: SignerInfo,
    },
    Rejected {
        claims: Option<ClaimSet>,
        error: DecodeError,
    },
}

impl DecodeResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    pub fn claims(&self) -> Option<&ClaimSet> {
        match self {
            Self::Verified { claims, .. } => Some(claims),
            Self::Rejected { claims, .. } => claims.as_ref(),
        }
    }

    pub fn signer(&self) -> Option<&SignerInfo> {
        match self {
            Self::Verified { signer, .. } => Some(signer),
            Self::Rejected { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DecodeError> {
        match self {
            Self::Verified { .. } => None,
            Self::Rejected { error, .. } => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<DecodeErrorKind> {
        self.error().map(DecodeError::kind)
    }
}
