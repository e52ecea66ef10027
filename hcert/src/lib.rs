// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! HC1 health-certificate decoding facade.
//!
//! `decode_and_verify` takes the text scanned from a QR code and a trust-store
//! snapshot and returns either verified claims or a typed rejection. The
//! lower layers (`hcert-common`, `hcert-validation`) are re-exported where a
//! caller needs their types.

mod codec;
mod pipeline;
mod result;

pub use codec::{decode_token, decode_token_with_max_len, encode_token, DEFAULT_MAX_INFLATED_LEN, HC1_PREFIX};
pub use pipeline::{decode_and_verify, DecodePipeline};
pub use result::{DecodeError, DecodeErrorKind, DecodeResult, SignerInfo};

pub use hcert_abstractions::{
    AnchorKey, CertificateEvent, ClaimSet, CborValue, HealthCertificate, PersonName, RecoveryEntry, TestEntry,
    TrustAnchor, TrustListDocument, TrustListEntry, TrustStore, TrustStoreError, VaccinationEntry,
};
pub use hcert_validation::{CertificateInfo, CoseAlgorithm};
