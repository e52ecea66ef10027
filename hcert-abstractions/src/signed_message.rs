// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Parsed COSE_Sign1 envelope carried inside an HC1 token.

use crate::headers::{CoseHeaders, LABEL_ALG, LABEL_KID};

pub const COSE_SIGN1_TAG: u64 = 18;

/// CWT tag; some issuers wrap the COSE_Sign1 in it.
pub const CWT_TAG: u64 = 61;

pub const SIGNATURE1_CONTEXT: &str = "Signature1";

/// A COSE_Sign1 envelope exactly as received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignedMessage {
    pub protected: CoseHeaders,
    pub unprotected: CoseHeaders,
    /// CWT bstr contents.
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedMessage {
    /// Signer key identifier, protected bucket first.
    ///
    /// `None` when neither bucket has a bstr `kid`.
    pub fn key_id(&self) -> Option<&[u8]> {
        self.protected
            .bytes(LABEL_KID)
            .or_else(|| self.unprotected.bytes(LABEL_KID))
    }

    /// Raw COSE `alg` value, protected bucket first.
    pub fn algorithm_id(&self) -> Option<i64> {
        self.protected
            .int(LABEL_ALG)
            .or_else(|| self.unprotected.int(LABEL_ALG))
    }
}
