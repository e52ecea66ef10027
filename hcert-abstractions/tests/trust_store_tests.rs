// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hcert_abstractions::{
    encode_key_id, AnchorKey, TrustAnchor, TrustListDocument, TrustListEntry, TrustStore, TrustStoreError,
};

fn ec_entry(x: &[u8], y: &[u8]) -> TrustListEntry {
    TrustListEntry {
        x: Some(STANDARD.encode(x)),
        y: Some(STANDARD.encode(y)),
        x5c: vec![STANDARD.encode(b"cert-der")],
        ..Default::default()
    }
}

fn document(entries: Vec<(&[u8], TrustListEntry)>) -> TrustListDocument {
    entries
        .into_iter()
        .map(|(kid, entry)| (encode_key_id(kid), entry))
        .collect()
}

#[test]
fn empty_store_misses_everything() {
    let store = TrustStore::empty();
    assert!(store.is_empty());
    assert!(store.lookup(b"anything").is_none());
    assert!(store.lookup_encoded("YW55dGhpbmc=").is_none());
}

#[test]
fn from_document_decodes_ec_entries() {
    let store = TrustStore::from_document(&document(vec![(b"kid-1", ec_entry(&[1; 32], &[2; 32]))])).unwrap();

    let anchor = store.lookup(b"kid-1").unwrap();
    assert_eq!(anchor.key_id, b"kid-1");
    assert_eq!(
        anchor.key,
        AnchorKey::Ec {
            x: vec![1; 32],
            y: vec![2; 32]
        }
    );
    assert_eq!(anchor.signing_certificate_der(), Some(b"cert-der".as_slice()));
}

#[test]
fn from_document_decodes_rsa_and_certificate_only_entries() {
    let rsa = TrustListEntry {
        kty: Some("RSA".to_string()),
        n: Some(STANDARD.encode([0xc5; 16])),
        e: Some("AQAB".to_string()),
        ..Default::default()
    };
    let cert_only = TrustListEntry {
        x5c: vec![STANDARD.encode(b"leaf"), STANDARD.encode(b"root")],
        ..Default::default()
    };
    let store = TrustStore::from_document(&document(vec![(b"rsa", rsa), (b"cert", cert_only)])).unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(
        store.lookup(b"rsa").unwrap().key,
        AnchorKey::Rsa {
            n: vec![0xc5; 16],
            e: vec![1, 0, 1]
        }
    );
    let cert = store.lookup(b"cert").unwrap();
    assert_eq!(cert.key, AnchorKey::FromCertificate);
    assert_eq!(cert.certificate_chain, vec![b"leaf".to_vec(), b"root".to_vec()]);
}

#[test]
fn from_document_rejects_partial_keys() {
    let mut entry = ec_entry(&[1; 32], &[2; 32]);
    entry.y = None;
    let err = TrustStore::from_document(&document(vec![(b"kid", entry)])).unwrap_err();
    assert!(matches!(err, TrustStoreError::InvalidEntry { .. }));
}

#[test]
fn from_document_rejects_entries_without_key_material() {
    let err = TrustStore::from_document(&document(vec![(b"kid", TrustListEntry::default())])).unwrap_err();
    assert!(matches!(err, TrustStoreError::InvalidEntry { .. }));
}

#[test]
fn from_document_fails_whole_load_on_one_bad_kid() {
    let mut doc = document(vec![(b"good", ec_entry(&[1; 32], &[2; 32]))]);
    doc.insert("%%%".to_string(), ec_entry(&[3; 32], &[4; 32]));

    let err = TrustStore::from_document(&doc).unwrap_err();
    assert!(matches!(err, TrustStoreError::InvalidKeyId { ref kid, .. } if kid == "%%%"));
}

#[test]
fn lookup_is_byte_exact_and_case_sensitive() {
    let store = TrustStore::from_document(&document(vec![(b"Kid", ec_entry(&[1; 32], &[2; 32]))])).unwrap();
    assert!(store.lookup(b"Kid").is_some());
    assert!(store.lookup(b"kid").is_none());
    assert!(store.lookup(b"Kid\0").is_none());
}

#[test]
fn lookup_encoded_accepts_url_safe_form_of_the_same_bytes() {
    let raw = [0xfb, 0xff, 0x10];
    let store = TrustStore::from_document(&document(vec![(&raw, ec_entry(&[1; 32], &[2; 32]))])).unwrap();

    assert!(store.lookup_encoded("+/8Q").is_some());
    assert!(store.lookup_encoded("-_8Q").is_some());
    assert!(store.lookup_encoded("not base64!").is_none());
}

#[test]
fn without_returns_new_snapshot_and_leaves_original() {
    let store = TrustStore::from_anchors([
        TrustAnchor {
            key_id: b"a".to_vec(),
            key: AnchorKey::FromCertificate,
            certificate_chain: vec![b"c".to_vec()],
        },
        TrustAnchor {
            key_id: b"b".to_vec(),
            key: AnchorKey::FromCertificate,
            certificate_chain: vec![b"c".to_vec()],
        },
    ]);
    let reduced = store.without(b"a");

    assert_eq!(store.len(), 2);
    assert_eq!(reduced.len(), 1);
    assert!(reduced.lookup(b"a").is_none());
    assert!(reduced.lookup(b"b").is_some());
}

#[test]
fn from_json_reads_wire_document() {
    let json = br#"{"a2lkLTE=": {"x": "AQID", "y": "BAUG", "x5c": ["Y2VydA=="]}}"#;
    let store = TrustStore::from_json(json).unwrap();
    let anchor = store.lookup(b"kid-1").unwrap();
    assert_eq!(
        anchor.key,
        AnchorKey::Ec {
            x: vec![1, 2, 3],
            y: vec![4, 5, 6]
        }
    );

    assert!(matches!(
        TrustStore::from_json(b"[1, 2]"),
        Err(TrustStoreError::InvalidDocument(_))
    ));
}

#[test]
fn wire_entry_serializes_without_absent_fields() {
    let json = serde_json::to_value(ec_entry(&[1], &[2])).unwrap();
    assert_eq!(json, serde_json::json!({"x": "AQ==", "y": "Ag==", "x5c": ["Y2VydC1kZXI="]}));
}
