// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! End-to-end decode and verification.
//!
//! Stages run strictly in order:
//! prefix → base45 → inflate → envelope → claims → key lookup → signature.
//! A failure before the claims parse rejects without claims; any later failure
//! rejects with the claims exactly as `Verified` would have carried them.

use hcert_abstractions::{ClaimSet, TrustStore};
use hcert_common::{parse_claims, parse_signed_message};
use hcert_validation::{extract_certificate, verify_signed_message};
use tracing::{debug, warn};

use crate::codec::{decode_token_with_max_len, DEFAULT_MAX_INFLATED_LEN};
use crate::result::{DecodeError, DecodeErrorKind, DecodeResult, SignerInfo};

#[derive(Debug, Clone)]
pub struct DecodePipeline {
    max_inflated_len: usize,
}

impl Default for DecodePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodePipeline {
    pub fn new() -> Self {
        Self {
            max_inflated_len: DEFAULT_MAX_INFLATED_LEN,
        }
    }

    /// Bound the inflated envelope size.
    pub fn with_max_inflated_len(mut self, max_inflated_len: usize) -> Self {
        self.max_inflated_len = max_inflated_len;
        self
    }

    /// Decode `token` and verify it against `trust_store`.
    ///
    /// Pure and single-pass: no I/O, and every malformed input ends in
    /// `DecodeResult::Rejected`.
    pub fn decode_and_verify(&self, token: &str, trust_store: &TrustStore) -> DecodeResult {
        let raw = match decode_token_with_max_len(token, self.max_inflated_len) {
            Ok(raw) => raw,
            Err(e) => return reject(None, e),
        };
        debug!(len = raw.len(), "token decoded");

        let msg = match parse_signed_message(&raw) {
            Ok(msg) => msg,
            Err(e) => {
                return reject(
                    None,
                    DecodeError::new(DecodeErrorKind::MalformedEncoding, format!("invalid envelope: {e}")),
                )
            }
        };

        let claims = match parse_claims(&msg.payload) {
            Ok(claims) => claims,
            Err(e) => {
                return reject(
                    None,
                    DecodeError::new(DecodeErrorKind::MalformedEncoding, format!("invalid claims: {e}")),
                )
            }
        };
        debug!(event = claims.certificate.event.key(), "claims parsed");

        let Some(kid) = msg.key_id() else {
            return reject(
                Some(claims),
                DecodeError::new(DecodeErrorKind::UnsupportedVariant, "envelope carries no kid header"),
            );
        };

        let Some(anchor) = trust_store.lookup(kid) else {
            return reject(
                Some(claims),
                DecodeError::new(DecodeErrorKind::NotTrusted, format!("kid {kid:02x?} is not in the trust store")),
            );
        };

        let algorithm = match verify_signed_message(&msg, anchor) {
            Ok(alg) => alg,
            Err(e) => {
                return reject(
                    Some(claims),
                    DecodeError::new(DecodeErrorKind::SignatureInvalid, format!("{}: {e}", e.code())),
                )
            }
        };

        let certificate = match extract_certificate(anchor) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(error = %e, "signing certificate unavailable");
                None
            }
        };

        debug!(?algorithm, "signature verified");
        DecodeResult::Verified {
            claims,
            signer: SignerInfo::new(kid.to_vec(), algorithm, certificate),
        }
    }
}

/// Decode and verify with default settings.
pub fn decode_and_verify(token: &str, trust_store: &TrustStore) -> DecodeResult {
    DecodePipeline::new().decode_and_verify(token, trust_store)
}

fn reject(claims: Option<ClaimSet>, error: DecodeError) -> DecodeResult {
    warn!(kind = error.kind().code(), detail = error.detail(), "HC1 token rejected");
    DecodeResult::Rejected { claims, error }
}
