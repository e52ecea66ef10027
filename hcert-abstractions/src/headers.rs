// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use crate::cbor::{CborKey, CborValue};

/// `alg` label.
pub const LABEL_ALG: i64 = 1;
/// `kid` label.
pub const LABEL_KID: i64 = 4;

/// One COSE header bucket.
///
/// A protected bucket remembers the bstr contents it was decoded from; those
/// bytes, not a re-encoding, go into the Sig_structure. Unprotected buckets
/// have no raw form.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CoseHeaders {
    raw: Vec<u8>,
    entries: BTreeMap<CborKey, CborValue>,
}

impl CoseHeaders {
    pub fn protected(raw: Vec<u8>, entries: BTreeMap<CborKey, CborValue>) -> Self {
        Self { raw, entries }
    }

    pub fn unprotected(entries: BTreeMap<CborKey, CborValue>) -> Self {
        Self {
            raw: Vec::new(),
            entries,
        }
    }

    /// Received bytes; empty for unprotected headers and for `h''`.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn get(&self, label: i64) -> Option<&CborValue> {
        self.entries.get(&CborKey::Int(label))
    }

    pub fn int(&self, label: i64) -> Option<i64> {
        self.get(label).and_then(CborValue::as_int)
    }

    pub fn bytes(&self, label: i64) -> Option<&[u8]> {
        self.get(label).and_then(CborValue::as_bytes)
    }

    pub fn entries(&self) -> &BTreeMap<CborKey, CborValue> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
