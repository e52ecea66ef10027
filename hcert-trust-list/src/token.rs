// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Upstream trust-list token decoding.
//!
//! The upstream publishes a compact JWS whose payload groups signing keys by
//! participant: `{"dsc_trust_list": {"SE": {"keys": [{kid, x, y, x5c, ..}]}}}`.
//! The groups are flattened into one document keyed by canonical kid.

use hcert_abstractions::{canonicalize_key_id, decode_base64_lenient, TrustListDocument, TrustListEntry, TrustStore};
use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{TrustListError, TrustListResult};

#[derive(Debug, Deserialize)]
struct UpstreamPayload {
    dsc_trust_list: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct UpstreamGroup {
    keys: Vec<UpstreamKey>,
}

#[derive(Debug, Deserialize)]
struct UpstreamKey {
    kid: String,
    #[serde(default)]
    kty: Option<String>,
    #[serde(default)]
    crv: Option<String>,
    #[serde(default)]
    x: Option<String>,
    #[serde(default)]
    y: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    #[serde(default)]
    x5c: Vec<String>,
}

impl UpstreamKey {
    fn into_entry(self, canonical_kid: String) -> TrustListEntry {
        TrustListEntry {
            kid: Some(canonical_kid),
            kty: self.kty,
            crv: self.crv,
            x: self.x,
            y: self.y,
            n: self.n,
            e: self.e,
            x5c: self.x5c,
        }
    }
}

/// Decode an upstream token into the served document.
///
/// With `signing_key`, the token must be a three-segment JWS whose ES256
/// signature verifies; otherwise the signature segment is ignored. Duplicate
/// kids keep the entry that appears last in the payload.
pub fn parse_trust_list_token(token: &str, signing_key: Option<&VerifyingKey>) -> TrustListResult<TrustListDocument> {
    let malformed = TrustListError::MalformedEncoding;

    let segments = token.trim().split('.').collect::<Vec<_>>();
    if let Some(key) = signing_key {
        verify_jws(&segments, key)?;
    }

    let payload_segment = segments
        .get(1)
        .ok_or_else(|| malformed("token has no payload segment".to_string()))?;
    let payload = decode_base64_lenient(payload_segment)
        .map_err(|e| malformed(format!("payload segment is not base64url: {e}")))?;
    let payload: UpstreamPayload =
        serde_json::from_slice(&payload).map_err(|e| malformed(format!("payload is not a trust list: {e}")))?;

    let mut document = TrustListDocument::new();
    for (participant, group) in &payload.dsc_trust_list {
        let group = UpstreamGroup::deserialize(group)
            .map_err(|e| malformed(format!("group '{participant}' is malformed: {e}")))?;

        for key in group.keys {
            let kid = canonicalize_key_id(&key.kid)
                .map_err(|e| malformed(format!("kid '{}' in group '{participant}' is not base64: {e}", key.kid)))?;
            if document.insert(kid.clone(), key.into_entry(kid.clone())).is_some() {
                warn!(kid = %kid, participant = %participant, "duplicate kid in upstream trust list; keeping the later entry");
            }
        }
    }

    // Everything served must load as a trust store.
    TrustStore::from_document(&document).map_err(|e| malformed(e.to_string()))?;

    debug!(keys = document.len(), "upstream trust list decoded");
    Ok(document)
}

fn verify_jws(segments: &[&str], key: &VerifyingKey) -> TrustListResult<()> {
    let unavailable = |detail: &str| TrustListError::UpstreamUnavailable(format!("upstream signature check failed: {detail}"));

    let [header, payload, signature] = segments else {
        return Err(unavailable("token is not a compact JWS"));
    };
    let signature = decode_base64_lenient(signature).map_err(|_| unavailable("signature is not base64url"))?;
    let signature = Signature::from_slice(&signature).map_err(|_| unavailable("signature is not ES256"))?;

    key.verify(format!("{header}.{payload}").as_bytes(), &signature)
        .map_err(|_| unavailable("signature does not verify"))
}
