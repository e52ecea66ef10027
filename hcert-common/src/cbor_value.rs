// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Untyped CBOR decoding shared by the header and claim parsers.

use std::collections::BTreeMap;

use hcert_abstractions::{CborKey, CborValue};
use minicbor::data::Type;
use minicbor::Decoder;

/// Deepest array/map/tag nesting accepted anywhere in a token.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Decode one data item. Tags are stripped; indefinite-length items are rejected.
pub fn decode_cbor_value(dec: &mut Decoder<'_>) -> Result<CborValue, String> {
    decode_value(dec, 0)
}

/// Decode one item that must be a definite-length map.
pub fn decode_cbor_map(dec: &mut Decoder<'_>) -> Result<BTreeMap<CborKey, CborValue>, String> {
    if !matches!(dec.datatype().map_err(|e| e.to_string())?, Type::Map) {
        return Err("expected a definite-length map".to_string());
    }
    match decode_value(dec, 0)? {
        CborValue::Map(map) => Ok(map),
        _ => Err("expected a definite-length map".to_string()),
    }
}

fn decode_value(dec: &mut Decoder<'_>, depth: usize) -> Result<CborValue, String> {
    if depth > MAX_NESTING_DEPTH {
        return Err(format!("CBOR nesting exceeds {MAX_NESTING_DEPTH} levels"));
    }

    match dec.datatype().map_err(|e| e.to_string())? {
        Type::Tag => {
            dec.tag().map_err(|e| format!("failed to read CBOR tag: {e}"))?;
            decode_value(dec, depth + 1)
        }
        Type::Null => {
            dec.null().map_err(|e| e.to_string())?;
            Ok(CborValue::Null)
        }
        Type::Undefined => {
            dec.undefined().map_err(|e| e.to_string())?;
            Ok(CborValue::Null)
        }
        Type::Bool => Ok(CborValue::Bool(dec.bool().map_err(|e| e.to_string())?)),
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64 => Ok(CborValue::Int(
            dec.i64().map_err(|e| format!("integer out of range: {e}"))?,
        )),
        Type::F16 => Ok(CborValue::Float(f64::from(dec.f16().map_err(|e| e.to_string())?))),
        Type::F32 => Ok(CborValue::Float(f64::from(dec.f32().map_err(|e| e.to_string())?))),
        Type::F64 => Ok(CborValue::Float(dec.f64().map_err(|e| e.to_string())?)),
        Type::Bytes => Ok(CborValue::Bytes(dec.bytes().map_err(|e| e.to_string())?.to_vec())),
        Type::String => Ok(CborValue::Text(dec.str().map_err(|e| e.to_string())?.to_string())),
        Type::Array => {
            let len = dec
                .array()
                .map_err(|e| format!("failed to read array: {e}"))?
                .ok_or_else(|| "indefinite-length arrays are not supported".to_string())?;
            let mut out = Vec::new();
            for _ in 0..len {
                out.push(decode_value(dec, depth + 1)?);
            }
            Ok(CborValue::Array(out))
        }
        Type::Map => {
            let len = dec
                .map()
                .map_err(|e| format!("failed to read map: {e}"))?
                .ok_or_else(|| "indefinite-length maps are not supported".to_string())?;
            let mut out = BTreeMap::new();
            for _ in 0..len {
                let key = decode_key(dec)?;
                let value = decode_value(dec, depth + 1)?;
                out.insert(key, value);
            }
            Ok(CborValue::Map(out))
        }
        Type::ArrayIndef | Type::MapIndef | Type::BytesIndef | Type::StringIndef => {
            Err("indefinite-length items are not supported".to_string())
        }
        other => Err(format!("unsupported CBOR type: {other:?}")),
    }
}

fn decode_key(dec: &mut Decoder<'_>) -> Result<CborKey, String> {
    match dec.datatype().map_err(|e| e.to_string())? {
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64 => Ok(CborKey::Int(
            dec.i64().map_err(|e| format!("failed to decode integer map key: {e}"))?,
        )),
        Type::String => Ok(CborKey::Text(
            dec.str()
                .map_err(|e| format!("failed to decode text map key: {e}"))?
                .to_string(),
        )),
        other => Err(format!("unsupported map key type: {other:?}")),
    }
}
