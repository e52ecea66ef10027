// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Trust anchors and the immutable trust-store snapshot.
//!
//! A `TrustStore` is built once from a trust-list document and then only read.
//! Refreshing means building a new store and swapping the value; clones share
//! the same snapshot.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::key_id::{decode_base64_lenient, decode_key_id};

/// Trust-list wire document: canonical base64 key identifier → entry.
pub type TrustListDocument = BTreeMap<String, TrustListEntry>;

/// One published key in the trust-list wire format.
///
/// `x`/`y` (EC) or `n`/`e` (RSA) carry the public key; `x5c` carries base64 DER
/// certificates with the signing certificate first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustListEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(default)]
    pub x5c: Vec<String>,
}

/// Public key material of an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorKey {
    /// Affine coordinates of an EC point, big-endian.
    Ec { x: Vec<u8>, y: Vec<u8> },
    /// RSA modulus and public exponent, big-endian.
    Rsa { n: Vec<u8>, e: Vec<u8> },
    /// No raw key was published; use the signing certificate's public key.
    FromCertificate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    pub key_id: Vec<u8>,
    pub key: AnchorKey,
    /// DER certificates, signing certificate first.
    pub certificate_chain: Vec<Vec<u8>>,
}

impl TrustAnchor {
    pub fn signing_certificate_der(&self) -> Option<&[u8]> {
        self.certificate_chain.first().map(Vec::as_slice)
    }

    /// Decode a wire entry published under `encoded_kid`.
    pub fn from_entry(encoded_kid: &str, entry: &TrustListEntry) -> Result<Self, TrustStoreError> {
        let key_id = decode_key_id(encoded_kid).map_err(|e| TrustStoreError::InvalidKeyId {
            kid: encoded_kid.to_string(),
            reason: e.to_string(),
        })?;

        let field = |name: &str, value: &str| {
            decode_base64_lenient(value).map_err(|e| TrustStoreError::InvalidEntry {
                kid: encoded_kid.to_string(),
                reason: format!("{name} is not base64: {e}"),
            })
        };

        let certificate_chain = entry
            .x5c
            .iter()
            .map(|c| field("x5c", c.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let key = match (&entry.x, &entry.y, &entry.n, &entry.e) {
            (Some(x), Some(y), _, _) => AnchorKey::Ec {
                x: field("x", x.as_str())?,
                y: field("y", y.as_str())?,
            },
            (None, None, Some(n), Some(e)) => AnchorKey::Rsa {
                n: field("n", n.as_str())?,
                e: field("e", e.as_str())?,
            },
            (None, None, None, None) if !certificate_chain.is_empty() => AnchorKey::FromCertificate,
            _ => {
                return Err(TrustStoreError::InvalidEntry {
                    kid: encoded_kid.to_string(),
                    reason: "entry carries neither a complete public key nor a certificate".to_string(),
                })
            }
        };

        Ok(Self {
            key_id,
            key,
            certificate_chain,
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrustStoreError {
    #[error("invalid key identifier '{kid}': {reason}")]
    InvalidKeyId { kid: String, reason: String },

    #[error("invalid trust-list entry '{kid}': {reason}")]
    InvalidEntry { kid: String, reason: String },

    #[error("trust list is not a valid document: {0}")]
    InvalidDocument(String),
}

/// Immutable mapping from raw key identifier to trust anchor.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    anchors: Arc<HashMap<Vec<u8>, TrustAnchor>>,
}

impl TrustStore {
    /// An empty store. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from anchors; a later anchor replaces an earlier one with the same key id.
    pub fn from_anchors(anchors: impl IntoIterator<Item = TrustAnchor>) -> Self {
        let anchors = anchors
            .into_iter()
            .map(|a| (a.key_id.clone(), a))
            .collect::<HashMap<_, _>>();
        Self {
            anchors: Arc::new(anchors),
        }
    }

    /// Load the trust-list wire document. Any malformed entry fails the whole load.
    pub fn from_document(document: &TrustListDocument) -> Result<Self, TrustStoreError> {
        let anchors = document
            .iter()
            .map(|(kid, entry)| TrustAnchor::from_entry(kid, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_anchors(anchors))
    }

    /// Parse and load a JSON trust-list document.
    pub fn from_json(json: &[u8]) -> Result<Self, TrustStoreError> {
        let document: TrustListDocument =
            serde_json::from_slice(json).map_err(|e| TrustStoreError::InvalidDocument(e.to_string()))?;
        Self::from_document(&document)
    }

    /// Byte-exact lookup by raw key identifier.
    pub fn lookup(&self, key_id: &[u8]) -> Option<&TrustAnchor> {
        self.anchors.get(key_id)
    }

    /// Lookup by a base64-encoded key identifier (any alphabet, padded or not).
    pub fn lookup_encoded(&self, encoded_kid: &str) -> Option<&TrustAnchor> {
        let raw = decode_key_id(encoded_kid).ok()?;
        self.lookup(&raw)
    }

    /// A new snapshot without `key_id`; `self` is left untouched.
    pub fn without(&self, key_id: &[u8]) -> Self {
        let anchors = self
            .anchors
            .iter()
            .filter(|(k, _)| k.as_slice() != key_id)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<HashMap<_, _>>();
        Self {
            anchors: Arc::new(anchors),
        }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
