// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `HC1:` text token <-> COSE_Sign1 bytes.

use std::io::Write as _;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::result::{DecodeError, DecodeErrorKind};

/// Literal prefix of a version 1 health-certificate token.
pub const HC1_PREFIX: &str = "HC1:";

/// Upper bound on inflated output; real envelopes are a few hundred bytes.
pub const DEFAULT_MAX_INFLATED_LEN: usize = 64 * 1024;

const INFLATE_CHUNK: usize = 4096;

/// Strip the prefix, base45-decode and inflate, with the default output bound.
pub fn decode_token(token: &str) -> Result<Vec<u8>, DecodeError> {
    decode_token_with_max_len(token, DEFAULT_MAX_INFLATED_LEN)
}

pub fn decode_token_with_max_len(token: &str, max_len: usize) -> Result<Vec<u8>, DecodeError> {
    let body = token
        .strip_prefix(HC1_PREFIX)
        .ok_or_else(|| DecodeError::new(DecodeErrorKind::NotRecognizedFormat, "token lacks the HC1: prefix"))?;

    let compressed = base45::decode(body)
        .map_err(|e| DecodeError::new(DecodeErrorKind::MalformedEncoding, format!("invalid base45: {e:?}")))?;

    inflate(&compressed, max_len)
}

/// zlib-compress, base45-encode and prefix COSE_Sign1 bytes.
pub fn encode_token(signed_message: &[u8]) -> Result<String, DecodeError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(signed_message)
        .and_then(|()| encoder.finish())
        .map(|compressed| format!("{HC1_PREFIX}{}", base45::encode(compressed)))
        .map_err(|e| DecodeError::new(DecodeErrorKind::MalformedEncoding, format!("compression failed: {e}")))
}

/// A zlib stream starts with CM=8, CINFO<=7 and a header divisible by 31.
fn has_zlib_header(input: &[u8]) -> bool {
    match input {
        [cmf, flg, ..] => (cmf & 0x0f) == 8 && (cmf >> 4) <= 7 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

enum InflateError {
    TooLarge,
    Corrupt(String),
}

/// Inflate a zlib-wrapped or raw deflate stream.
///
/// A raw stream can begin with bytes that pass the zlib header check, so a
/// corrupt zlib attempt is retried as raw deflate; if that fails too, the
/// zlib error is reported. The stream must end exactly
/// at the end of `input` and produce at most `max_len` bytes.
fn inflate(input: &[u8], max_len: usize) -> Result<Vec<u8>, DecodeError> {
    let result = if has_zlib_header(input) {
        match inflate_stream(input, max_len, true) {
            Err(zlib_err @ InflateError::Corrupt(_)) => inflate_stream(input, max_len, false).map_err(|_| zlib_err),
            zlib => zlib,
        }
    } else {
        inflate_stream(input, max_len, false)
    };

    result.map_err(|e| {
        let detail = match e {
            InflateError::TooLarge => format!("inflated size exceeds {max_len} bytes"),
            InflateError::Corrupt(detail) => detail,
        };
        DecodeError::new(DecodeErrorKind::MalformedEncoding, detail)
    })
}

fn inflate_stream(input: &[u8], max_len: usize, zlib_header: bool) -> Result<Vec<u8>, InflateError> {
    let mut inflater = Decompress::new(zlib_header);
    let mut out = Vec::new();
    // One past the bound, so overflow is observed rather than truncated.
    let limit = max_len.saturating_add(1);

    loop {
        if out.len() == out.capacity() {
            if out.len() > max_len {
                return Err(InflateError::TooLarge);
            }
            out.reserve_exact((limit - out.len()).clamp(1, INFLATE_CHUNK));
        }

        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let consumed = usize::try_from(before_in).map_err(|e| InflateError::Corrupt(e.to_string()))?;

        let status = inflater
            .decompress_vec(&input[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| InflateError::Corrupt(format!("corrupt deflate stream: {e}")))?;

        if out.len() > max_len {
            return Err(InflateError::TooLarge);
        }

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() == before_in && inflater.total_out() == before_out;
                if stalled && out.len() < out.capacity() {
                    return Err(InflateError::Corrupt("truncated deflate stream".to_string()));
                }
            }
        }
    }

    if inflater.total_in() != input.len() as u64 {
        return Err(InflateError::Corrupt("trailing bytes after deflate stream".to_string()));
    }

    Ok(out)
}
