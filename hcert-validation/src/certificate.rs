// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signing-certificate metadata for display.
//!
//! This is deliberately independent from signature verification: a certificate
//! that fails to parse says nothing about whether the anchor's key verified.

use hcert_abstractions::TrustAnchor;
use serde::Serialize;
use x509_parser::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub subject_common_name: Option<String>,
    pub issuer: String,
    pub issuer_common_name: Option<String>,
    pub serial_hex: String,
    pub not_before_unix_seconds: i64,
    pub not_after_unix_seconds: i64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    #[error("trust anchor carries no certificate")]
    Missing,

    #[error("x509 parse failed: {0}")]
    Parse(String),
}

/// Parse the anchor's signing certificate (the first `x5c` element).
pub fn extract_certificate(anchor: &TrustAnchor) -> Result<CertificateInfo, CertificateError> {
    let der = anchor.signing_certificate_der().ok_or(CertificateError::Missing)?;
    parse_certificate(der)
}

pub fn parse_certificate(der: &[u8]) -> Result<CertificateInfo, CertificateError> {
    let (rest, cert) = X509Certificate::from_der(der).map_err(|e| CertificateError::Parse(format!("{e:?}")))?;
    if !rest.is_empty() {
        return Err(CertificateError::Parse("trailing bytes after certificate".to_string()));
    }

    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        subject_common_name: common_name(cert.subject()),
        issuer: cert.issuer().to_string(),
        issuer_common_name: common_name(cert.issuer()),
        serial_hex: hex::encode_upper(cert.serial.to_bytes_be()),
        not_before_unix_seconds: cert.validity().not_before.timestamp(),
        not_after_unix_seconds: cert.validity().not_after.timestamp(),
    })
}

fn common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}
