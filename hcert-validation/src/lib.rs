// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod certificate;
pub mod cose_sign1_verifier;

pub use certificate::{extract_certificate, parse_certificate, CertificateError, CertificateInfo};
pub use cose_sign1_verifier::{verify_cose_sign1, verify_signed_message, CoseAlgorithm, VerifyError};
