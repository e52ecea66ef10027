// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Sign1 envelope parsing as carried in HC1 tokens.

use hcert_abstractions::CborValue;
use hcert_common::{encode_signature1_sig_structure, parse_signed_message};
use hcert_test_utils::{encode_cose_sign1, encode_protected_header, sig_structure, Cbor};
use minicbor::Encoder;

#[test]
fn accepts_untagged_sign1_and_cwt_tags() {
    let protected = encode_protected_header(-7, Some(b"kid-1"));
    for tags in [&[][..], &[18], &[61], &[61, 18]] {
        let cose = encode_cose_sign1(tags, &protected, &[], Some(b"payload"), b"sig");
        let parsed = parse_signed_message(&cose).unwrap_or_else(|e| panic!("tags {tags:?}: {e}"));
        assert_eq!(parsed.payload, b"payload");
        assert_eq!(parsed.signature, b"sig");
        assert_eq!(parsed.key_id(), Some(b"kid-1".as_slice()));
        assert_eq!(parsed.algorithm_id(), Some(-7));
    }
}

#[test]
fn rejects_unexpected_or_misordered_tags() {
    let protected = encode_protected_header(-7, None);
    for tags in [&[999][..], &[18, 61], &[18, 18], &[61, 61]] {
        let cose = encode_cose_sign1(tags, &protected, &[], Some(b"p"), b"s");
        let err = parse_signed_message(&cose).unwrap_err();
        assert!(err.contains("unexpected CBOR tag"), "tags {tags:?}: {err}");
    }
}

#[test]
fn missing_kid_is_not_a_parse_error() {
    let cose = encode_cose_sign1(&[18], &encode_protected_header(-7, None), &[], Some(b"p"), b"s");
    let parsed = parse_signed_message(&cose).unwrap();
    assert_eq!(parsed.key_id(), None);
}

#[test]
fn kid_falls_back_to_unprotected_header() {
    let unprotected = [(Cbor::Int(4), Cbor::Bytes(b"outer".to_vec()))];
    let cose = encode_cose_sign1(&[], &encode_protected_header(-7, None), &unprotected, Some(b"p"), b"s");
    let parsed = parse_signed_message(&cose).unwrap();
    assert_eq!(parsed.key_id(), Some(b"outer".as_slice()));
    assert!(parsed.protected.bytes(4).is_none());
}

#[test]
fn protected_kid_wins_over_unprotected() {
    let unprotected = [(Cbor::Int(4), Cbor::Bytes(b"outer".to_vec()))];
    let cose = encode_cose_sign1(
        &[],
        &encode_protected_header(-7, Some(b"inner")),
        &unprotected,
        Some(b"p"),
        b"s",
    );
    assert_eq!(parse_signed_message(&cose).unwrap().key_id(), Some(b"inner".as_slice()));
}

#[test]
fn text_kid_is_not_treated_as_kid() {
    let unprotected = [(Cbor::Int(4), Cbor::Text("kid"))];
    let cose = encode_cose_sign1(&[], &[], &unprotected, Some(b"p"), b"s");
    let parsed = parse_signed_message(&cose).unwrap();
    assert_eq!(parsed.key_id(), None);
    assert_eq!(
        parsed.unprotected.entries().values().next(),
        Some(&CborValue::Text("kid".to_string()))
    );
}

#[test]
fn empty_protected_bstr_is_empty_map() {
    let cose = encode_cose_sign1(&[], &[], &[], Some(b"p"), &[0u8; 64]);
    let parsed = parse_signed_message(&cose).unwrap();
    assert!(parsed.protected.is_empty());
    assert!(parsed.protected.raw().is_empty());
}

#[test]
fn rejects_detached_payload() {
    let cose = encode_cose_sign1(&[18], &encode_protected_header(-7, None), &[], None, b"s");
    let err = parse_signed_message(&cose).unwrap_err();
    assert!(err.contains("detached"));
}

#[test]
fn rejects_empty_input_and_wrong_shapes() {
    assert!(parse_signed_message(&[]).unwrap_err().contains("empty"));

    let mut three = Vec::new();
    let mut enc = Encoder::new(&mut three);
    enc.array(3).unwrap();
    enc.bytes(&[]).unwrap();
    enc.map(0).unwrap();
    enc.bytes(b"x").unwrap();
    assert!(parse_signed_message(&three).unwrap_err().contains("array length"));

    let mut not_array = Vec::new();
    Encoder::new(&mut not_array).map(0).unwrap();
    assert!(parse_signed_message(&not_array).unwrap_err().contains("not an array"));
}

#[test]
fn rejects_indefinite_length_array() {
    // 0x9f = indefinite-length array
    let err = parse_signed_message(&[0x9f, 0x40, 0xa0, 0x40, 0x40, 0xff]).unwrap_err();
    assert!(err.contains("indefinite"));
}

#[test]
fn rejects_trailing_bytes() {
    let mut cose = encode_cose_sign1(&[], &[], &[], Some(b"p"), b"s");
    cose.push(0x00);
    assert!(parse_signed_message(&cose).unwrap_err().contains("trailing"));
}

#[test]
fn rejects_every_truncation() {
    let cose = encode_cose_sign1(&[18], &encode_protected_header(-7, Some(b"kid")), &[], Some(b"payload"), &[7u8; 64]);
    for len in 0..cose.len() {
        assert!(parse_signed_message(&cose[..len]).is_err(), "prefix of length {len} parsed");
    }
}

#[test]
fn rejects_protected_header_with_trailing_bytes() {
    let mut protected = encode_protected_header(-7, None);
    protected.push(0x01);
    let cose = encode_cose_sign1(&[], &protected, &[], Some(b"p"), b"s");
    assert!(parse_signed_message(&cose).unwrap_err().contains("protected headers"));
}

#[test]
fn rejects_deeply_nested_header_values() {
    let mut value = Cbor::Int(0);
    for _ in 0..40 {
        value = Cbor::Array(vec![value]);
    }
    let unprotected = [(Cbor::Int(99), value)];
    let cose = encode_cose_sign1(&[], &[], &unprotected, Some(b"p"), b"s");
    assert!(parse_signed_message(&cose).unwrap_err().contains("nesting"));
}

#[test]
fn sig_structure_uses_protected_bytes_as_received() {
    // {1: -7} with a non-canonical 2-byte encoding of the label.
    let protected = vec![0xa1, 0x18, 0x01, 0x26];
    let cose = encode_cose_sign1(&[], &protected, &[], Some(b"payload"), b"s");
    let parsed = parse_signed_message(&cose).unwrap();

    assert_eq!(parsed.algorithm_id(), Some(-7));
    assert_eq!(parsed.protected.raw(), protected.as_slice());
    assert_eq!(
        encode_signature1_sig_structure(&parsed).unwrap(),
        sig_structure(&protected, b"payload")
    );
}
