// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test-only builders for HC1 scenarios.
//!
//! Nothing here is used by production code. Encoders panic on failure since a
//! failing helper is a broken test, not an input error.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use hcert_abstractions::{encode_key_id, AnchorKey, TrustAnchor, TrustListEntry};
use minicbor::data::Tag;
use minicbor::Encoder;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey as _;
use signature::Signer as _;

/// COSE `alg` value for ES256.
pub const ALG_ES256: i64 = -7;

/// Issuance and expiry stamped into every test payload.
pub const TEST_ISSUED_AT: i64 = 1_620_000_000;
pub const TEST_EXPIRES_AT: i64 = 1_651_536_000;

/// A CBOR item to encode. Map keys are items too, so tests can build
/// non-text or non-int keys when they need to.
#[derive(Clone, Debug)]
pub enum Cbor {
    Int(i64),
    Bool(bool),
    Null,
    Float(f64),
    /// Encoded as a 16-bit float.
    Half(f32),
    Bytes(Vec<u8>),
    Text(&'static str),
    Array(Vec<Cbor>),
    Map(Vec<(Cbor, Cbor)>),
    Tagged(u64, Box<Cbor>),
}

impl Cbor {
    pub fn write(&self, enc: &mut Encoder<Vec<u8>>) {
        let res = match self {
            Cbor::Int(i) => enc.i64(*i).map(drop),
            Cbor::Bool(b) => enc.bool(*b).map(drop),
            Cbor::Null => enc.null().map(drop),
            Cbor::Float(f) => enc.f64(*f).map(drop),
            Cbor::Half(f) => enc.f16(*f).map(drop),
            Cbor::Bytes(b) => enc.bytes(b).map(drop),
            Cbor::Text(s) => enc.str(s).map(drop),
            Cbor::Array(items) => {
                enc.array(items.len() as u64).unwrap();
                items.iter().for_each(|item| item.write(enc));
                Ok(())
            }
            Cbor::Map(entries) => {
                enc.map(entries.len() as u64).unwrap();
                for (k, v) in entries {
                    k.write(enc);
                    v.write(enc);
                }
                Ok(())
            }
            Cbor::Tagged(tag, inner) => {
                enc.tag(Tag::new(*tag)).unwrap();
                inner.write(enc);
                Ok(())
            }
        };
        res.unwrap();
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        let mut enc = Encoder::new(Vec::new());
        self.write(&mut enc);
        enc.into_writer()
    }
}

/// Shorthand for a text-keyed map.
pub fn text_map(entries: Vec<(&'static str, Cbor)>) -> Cbor {
    Cbor::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Cbor::Text(k), v))
            .collect(),
    )
}

/// The Jane Doe vaccination record used across the scenario tests.
pub fn jane_doe_vaccination_record() -> Cbor {
    use Cbor::{Array, Int, Text};

    text_map(vec![
        ("nam", text_map(vec![("gn", Text("Jane")), ("fn", Text("Doe"))])),
        ("dob", Text("1990-01-01")),
        (
            "v",
            Array(vec![text_map(vec![
                ("tg", Text("840539006")),
                ("vp", Text("1119305005")),
                ("mp", Text("EU/1/20/1528")),
                ("ma", Text("ORG-100030215")),
                ("dn", Int(1)),
                ("sd", Int(2)),
                ("dt", Text("2021-05-01")),
                ("co", Text("NL")),
                ("is", Text("Ministry of Health")),
                ("ci", Text("URN:UVCI:01:NL:abc123")),
            ])]),
        ),
    ])
}

/// Wrap an hcert record into a CWT payload: `{1: iss, 4: exp, 6: iat, -260: {1: record}}`.
pub fn cwt_payload(record: Cbor) -> Vec<u8> {
    Cbor::Map(vec![
        (Cbor::Int(1), Cbor::Text("NL")),
        (Cbor::Int(4), Cbor::Int(TEST_EXPIRES_AT)),
        (Cbor::Int(6), Cbor::Int(TEST_ISSUED_AT)),
        (
            Cbor::Int(-260),
            Cbor::Map(vec![(Cbor::Int(1), record)]),
        ),
    ])
    .to_cbor()
}

pub fn jane_doe_payload() -> Vec<u8> {
    cwt_payload(jane_doe_vaccination_record())
}

/// Encode a protected header map `{1: alg, 4: kid}`; `kid` is omitted when `None`.
pub fn encode_protected_header(alg: i64, kid: Option<&[u8]>) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());
    enc.map(if kid.is_some() { 2 } else { 1 }).unwrap();
    enc.i64(1).unwrap();
    enc.i64(alg).unwrap();
    if let Some(kid) = kid {
        enc.i64(4).unwrap();
        enc.bytes(kid).unwrap();
    }
    enc.into_writer()
}

/// Encode a COSE_Sign1 from components, preceded by `tags` in order.
pub fn encode_cose_sign1(
    tags: &[u64],
    protected_bstr_contents: &[u8],
    unprotected_entries: &[(Cbor, Cbor)],
    payload: Option<&[u8]>,
    signature: &[u8],
) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());
    for tag in tags {
        enc.tag(Tag::new(*tag)).unwrap();
    }

    enc.array(4).unwrap();
    enc.bytes(protected_bstr_contents).unwrap();
    enc.map(unprotected_entries.len() as u64).unwrap();
    for (k, v) in unprotected_entries {
        k.write(&mut enc);
        v.write(&mut enc);
    }
    match payload {
        Some(p) => enc.bytes(p).unwrap(),
        None => enc.null().unwrap(),
    };
    enc.bytes(signature).unwrap();

    enc.into_writer()
}

/// `["Signature1", protected, h'', payload]`, encoded independently of the parser under test.
pub fn sig_structure(protected_bstr_contents: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());
    enc.array(4).unwrap();
    enc.str("Signature1").unwrap();
    enc.bytes(protected_bstr_contents).unwrap();
    enc.bytes(&[]).unwrap();
    enc.bytes(payload).unwrap();
    enc.into_writer()
}

/// Deterministic P-256 key; distinct seeds give distinct keys.
pub fn test_signing_key(seed: u8) -> SigningKey {
    assert_ne!(seed, 0, "zero is not a valid P-256 scalar");
    SigningKey::from_bytes(&[seed; 32].into()).unwrap()
}

/// Raw `r || s` ES256 signature over the Sig_structure.
pub fn sign_es256(key: &SigningKey, protected_bstr_contents: &[u8], payload: &[u8]) -> Vec<u8> {
    let sig: Signature = key.sign(&sig_structure(protected_bstr_contents, payload));
    sig.to_bytes().to_vec()
}

/// Options for [`build_es256_message`].
#[derive(Clone, Debug, Default)]
pub struct MessageOptions {
    /// Put the kid in the unprotected map instead of the protected one.
    pub kid_unprotected: bool,
    /// Leading CBOR tags; defaults to none.
    pub tags: Vec<u64>,
}

/// A tagged (18) ES256 COSE_Sign1 with the kid in the protected header.
pub fn build_es256_message(key: &SigningKey, kid: Option<&[u8]>, payload: &[u8]) -> Vec<u8> {
    build_es256_message_with(
        key,
        kid,
        payload,
        &MessageOptions {
            tags: vec![18],
            ..MessageOptions::default()
        },
    )
}

pub fn build_es256_message_with(key: &SigningKey, kid: Option<&[u8]>, payload: &[u8], opts: &MessageOptions) -> Vec<u8> {
    let (protected, unprotected) = match (kid, opts.kid_unprotected) {
        (Some(kid), true) => (
            encode_protected_header(ALG_ES256, None),
            vec![(Cbor::Int(4), Cbor::Bytes(kid.to_vec()))],
        ),
        (kid, _) => (encode_protected_header(ALG_ES256, kid), Vec::new()),
    };
    let signature = sign_es256(key, &protected, payload);
    encode_cose_sign1(&opts.tags, &protected, &unprotected, Some(payload), &signature)
}

/// Affine coordinates of the key's public point.
pub fn p256_coordinates(key: &SigningKey) -> (Vec<u8>, Vec<u8>) {
    let point = key.verifying_key().to_encoded_point(false);
    (
        point.x().expect("uncompressed point").to_vec(),
        point.y().expect("uncompressed point").to_vec(),
    )
}

pub fn p256_anchor(kid: &[u8], key: &SigningKey) -> TrustAnchor {
    let (x, y) = p256_coordinates(key);
    TrustAnchor {
        key_id: kid.to_vec(),
        key: AnchorKey::Ec { x, y },
        certificate_chain: Vec::new(),
    }
}

/// Wire-format entry for a P-256 key, optionally with its certificate.
pub fn p256_trust_list_entry(key: &SigningKey, cert_der: Option<&[u8]>) -> TrustListEntry {
    let (x, y) = p256_coordinates(key);
    TrustListEntry {
        x: Some(STANDARD.encode(x)),
        y: Some(STANDARD.encode(y)),
        x5c: cert_der.map(|c| vec![STANDARD.encode(c)]).unwrap_or_default(),
        ..TrustListEntry::default()
    }
}

/// Self-signed P-256 certificate with the given common name, plus its key.
pub fn self_signed_p256_cert_and_key(common_name: &str) -> (Vec<u8>, SigningKey) {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let mut params = rcgen::CertificateParams::new(vec!["hcert.test".to_string()]).unwrap();
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, common_name);
    let cert = params.self_signed(&key_pair).unwrap();

    // rcgen defaults to P-256 keys.
    let signing_key = SigningKey::from_pkcs8_der(&key_pair.serialize_der()).unwrap();
    (cert.der().to_vec(), signing_key)
}

/// One key object as published inside an upstream `dsc_trust_list` group.
pub fn upstream_key_json(kid: &str, key: &SigningKey, cert_der: Option<&[u8]>) -> serde_json::Value {
    let (x, y) = p256_coordinates(key);
    serde_json::json!({
        "kid": kid,
        "kty": "EC",
        "crv": "P-256",
        "x": URL_SAFE_NO_PAD.encode(x),
        "y": URL_SAFE_NO_PAD.encode(y),
        "x5c": cert_der.map(|c| vec![STANDARD.encode(c)]).unwrap_or_default(),
    })
}

/// Upstream JSON body `{"dsc_trust_list": {CC: {"keys": [...]}}}`, groups in the given order.
pub fn upstream_payload(groups: Vec<(&str, Vec<serde_json::Value>)>) -> serde_json::Value {
    let mut list = serde_json::Map::new();
    for (country, keys) in groups {
        list.insert(country.to_string(), serde_json::json!({ "keys": keys }));
    }
    serde_json::json!({ "iss": "test-authority", "dsc_trust_list": list })
}

/// A compact JWS around `payload` with a placeholder signature.
pub fn unsigned_upstream_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

/// A compact ES256 JWS around `payload`.
pub fn signed_upstream_token(key: &SigningKey, payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    let signing_input = format!("{header}.{body}");
    let sig: Signature = key.sign(signing_input.as_bytes());
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(sig.to_bytes()))
}

/// The canonical wire kid for raw bytes, re-exported for test readability.
pub fn wire_kid(raw: &[u8]) -> String {
    encode_key_id(raw)
}
