// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod cbor_value;
pub mod claims;
pub mod cose_sign1;

pub use cbor_value::{decode_cbor_map, decode_cbor_value, MAX_NESTING_DEPTH};
pub use claims::{parse_claims, CLAIM_EXPIRES_AT, CLAIM_HCERT, CLAIM_HCERT_V1, CLAIM_ISSUED_AT, CLAIM_ISSUER};
pub use cose_sign1::{encode_signature1_sig_structure, parse_signed_message};
