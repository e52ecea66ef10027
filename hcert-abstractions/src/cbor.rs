// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Untyped CBOR data items.
//!
//! Used for header maps and for claim fields the typed model does not name.

use std::collections::BTreeMap;

use serde::Serialize;

/// Map key: COSE and CWT only label with integers or text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum CborKey {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CborValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<CborValue>),
    Map(BTreeMap<CborKey, CborValue>),
}

impl CborValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}
