// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use hcert_abstractions::{CborKey, CborValue, CoseHeaders, SignedMessage, COSE_SIGN1_TAG, CWT_TAG, SIGNATURE1_CONTEXT};
use minicbor::data::{Tag, Type};
use minicbor::{Decoder, Encoder};

use crate::cbor_value::decode_cbor_map;

/// Parse a COSE_Sign1 envelope as carried in an HC1 token.
///
/// Accepts an optional CWT tag (61) followed by an optional COSE_Sign1 tag (18).
/// A missing `kid` is not an error here; callers decide what to do with it.
pub fn parse_signed_message(input: &[u8]) -> Result<SignedMessage, String> {
    if input.is_empty() {
        return Err("empty input".to_string());
    }

    let mut dec = Decoder::new(input);

    let mut seen_cwt = false;
    let mut seen_sign1 = false;
    while matches!(dec.datatype().map_err(|e| e.to_string())?, Type::Tag) {
        let tag = dec.tag().map_err(|e| format!("failed to read CBOR tag: {e}"))?;
        if tag == Tag::new(CWT_TAG) && !seen_cwt && !seen_sign1 {
            seen_cwt = true;
        } else if tag == Tag::new(COSE_SIGN1_TAG) && !seen_sign1 {
            seen_sign1 = true;
        } else {
            return Err(format!("unexpected CBOR tag {} (expected CWT 61 and/or COSE_Sign1 18)", tag.as_u64()));
        }
    }

    let len = dec
        .array()
        .map_err(|e| format!("top-level item is not an array: {e}"))?
        .ok_or_else(|| "indefinite-length arrays are not supported".to_string())?;

    if len != 4 {
        return Err("array length was not 4".to_string());
    }

    let protected_raw = dec
        .bytes()
        .map_err(|e| format!("failed to read protected headers (bstr): {e}"))?
        .to_vec();
    let protected = decode_protected_headers(&protected_raw)
        .map_err(|e| format!("failed to parse protected headers: {e}"))?;

    let unprotected = decode_cbor_map(&mut dec).map_err(|e| format!("failed to parse unprotected headers: {e}"))?;

    // payload (bstr); detached payloads cannot appear in a QR token
    let payload = match dec.datatype().map_err(|e| e.to_string())? {
        Type::Bytes => dec
            .bytes()
            .map_err(|e| format!("failed to read payload (bstr): {e}"))?
            .to_vec(),
        Type::Null => return Err("detached payload is not supported".to_string()),
        _ => return Err("failed to read payload (bstr)".to_string()),
    };

    let signature = dec
        .bytes()
        .map_err(|e| format!("failed to read signature (bstr): {e}"))?
        .to_vec();

    if dec.position() != input.len() {
        return Err("trailing bytes after COSE_Sign1".to_string());
    }

    Ok(SignedMessage {
        protected: CoseHeaders::protected(protected_raw, protected),
        unprotected: CoseHeaders::unprotected(unprotected),
        payload,
        signature,
    })
}

/// Encode `["Signature1", protected, h'', payload]` from the bytes as received.
pub fn encode_signature1_sig_structure(msg: &SignedMessage) -> Result<Vec<u8>, String> {
    let protected = msg.protected.raw();
    let mut enc = Encoder::new(Vec::with_capacity(32 + protected.len() + msg.payload.len()));
    enc.array(4)
        .and_then(|e| e.str(SIGNATURE1_CONTEXT))
        .and_then(|e| e.bytes(protected))
        .and_then(|e| e.bytes(&[]))
        .and_then(|e| e.bytes(&msg.payload))
        .map_err(|e| e.to_string())?;
    Ok(enc.into_writer())
}

/// `h''` is an empty map; anything else must be exactly one map.
fn decode_protected_headers(raw: &[u8]) -> Result<BTreeMap<CborKey, CborValue>, String> {
    if raw.is_empty() {
        return Ok(BTreeMap::new());
    }
    let mut dec = Decoder::new(raw);
    let map = decode_cbor_map(&mut dec)?;
    if dec.position() != raw.len() {
        return Err("trailing bytes after header map".to_string());
    }
    Ok(map)
}
