// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared datatypes for the HC1 health-certificate crates.
//!
//! This crate sits below the parser (`hcert-common`), the verifier
//! (`hcert-validation`), the facade (`hcert`) and the trust-list service
//! (`hcert-trust-list`) so they can exchange values without depending on each
//! other. It holds no parsing or cryptographic logic.

pub mod cbor;
pub mod claim_set;
pub mod headers;
pub mod key_id;
pub mod signed_message;
pub mod trust_store;

pub use cbor::{CborKey, CborValue};
pub use claim_set::{
    CertificateEvent, ClaimSet, HealthCertificate, PersonName, RecoveryEntry, TestEntry, VaccinationEntry,
};
pub use headers::{CoseHeaders, LABEL_ALG, LABEL_KID};
pub use key_id::{canonicalize_key_id, decode_base64_lenient, decode_key_id, encode_key_id};
pub use signed_message::{SignedMessage, COSE_SIGN1_TAG, CWT_TAG, SIGNATURE1_CONTEXT};
pub use trust_store::{AnchorKey, TrustAnchor, TrustListDocument, TrustListEntry, TrustStore, TrustStoreError};
