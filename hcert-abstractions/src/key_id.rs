// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key-identifier text encoding.
//!
//! Key identifiers are raw bytes everywhere inside the workspace. The trust-list
//! wire format carries them as standard base64 with padding. Upstream authorities
//! are not consistent about the alphabet or padding, so decoding accepts every
//! common variant and re-encoding always yields the canonical form.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

/// Encode raw key-identifier bytes into the canonical wire form.
pub fn encode_key_id(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

/// Decode a key identifier from any base64 variant.
pub fn decode_key_id(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    decode_base64_lenient(encoded)
}

/// Re-encode a key identifier into the canonical wire form.
pub fn canonicalize_key_id(encoded: &str) -> Result<String, base64::DecodeError> {
    decode_key_id(encoded).map(|raw| encode_key_id(&raw))
}

/// Decode base64 in the standard or URL-safe alphabet, padded or not.
pub fn decode_base64_lenient(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let encoded = encoded.trim();
    let url_safe = encoded.contains(['-', '_']);
    let padded = encoded.ends_with('=');

    let engine = match (url_safe, padded) {
        (false, true) => &STANDARD,
        (false, false) => &STANDARD_NO_PAD,
        (true, true) => &URL_SAFE,
        (true, false) => &URL_SAFE_NO_PAD,
    };
    engine.decode(encoded)
}
