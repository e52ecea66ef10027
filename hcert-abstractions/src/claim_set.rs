// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoded health-certificate claims.
//!
//! The three event kinds (vaccination, test, recovery) are strongly typed.
//! Anything the types do not name is kept in an `extra` map so newer schema
//! versions survive a round through the decoder. Serialization uses the
//! hcert JSON key names so the display layer can consume it unchanged.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cbor::CborValue;

/// The CWT payload: issuer metadata plus the hcert record under `-260 → 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimSet {
    /// CWT `iss` (label 1), usually an ISO 3166 country code.
    #[serde(rename = "iss", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// CWT `iat` (label 6), seconds since the epoch.
    #[serde(rename = "iat", skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    /// CWT `exp` (label 4), seconds since the epoch.
    #[serde(rename = "exp", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(rename = "hcert")]
    pub certificate: HealthCertificate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCertificate {
    #[serde(rename = "ver", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "nam")]
    pub name: PersonName,
    #[serde(rename = "dob", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(flatten)]
    pub event: CertificateEvent,
    #[serde(flatten)]
    pub extra: BTreeMap<String, CborValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonName {
    #[serde(rename = "fn", skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(rename = "fnt", skip_serializing_if = "Option::is_none")]
    pub family_name_standardised: Option<String>,
    #[serde(rename = "gn", skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(rename = "gnt", skip_serializing_if = "Option::is_none")]
    pub given_name_standardised: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, CborValue>,
}

/// Exactly one event group is present in a well-formed certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CertificateEvent {
    #[serde(rename = "v")]
    Vaccination(Vec<VaccinationEntry>),
    #[serde(rename = "t")]
    Test(Vec<TestEntry>),
    #[serde(rename = "r")]
    Recovery(Vec<RecoveryEntry>),
}

impl CertificateEvent {
    /// The hcert key the group was found under (`v`, `t` or `r`).
    pub fn key(&self) -> &'static str {
        match self {
            Self::Vaccination(_) => "v",
            Self::Test(_) => "t",
            Self::Recovery(_) => "r",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VaccinationEntry {
    #[serde(rename = "tg", skip_serializing_if = "Option::is_none")]
    pub disease_agent: Option<String>,
    #[serde(rename = "vp", skip_serializing_if = "Option::is_none")]
    pub vaccine_prophylaxis: Option<String>,
    #[serde(rename = "mp", skip_serializing_if = "Option::is_none")]
    pub medicinal_product: Option<String>,
    #[serde(rename = "ma", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(rename = "dn", skip_serializing_if = "Option::is_none")]
    pub dose_number: Option<i64>,
    #[serde(rename = "sd", skip_serializing_if = "Option::is_none")]
    pub total_doses: Option<i64>,
    #[serde(rename = "dt", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "co", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "is", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(rename = "ci", skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, CborValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestEntry {
    #[serde(rename = "tg", skip_serializing_if = "Option::is_none")]
    pub disease_agent: Option<String>,
    #[serde(rename = "tt", skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,
    #[serde(rename = "nm", skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(rename = "ma", skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(rename = "sc", skip_serializing_if = "Option::is_none")]
    pub sample_collected_at: Option<String>,
    #[serde(rename = "tr", skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(rename = "tc", skip_serializing_if = "Option::is_none")]
    pub testing_centre: Option<String>,
    #[serde(rename = "co", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "is", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(rename = "ci", skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, CborValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecoveryEntry {
    #[serde(rename = "tg", skip_serializing_if = "Option::is_none")]
    pub disease_agent: Option<String>,
    #[serde(rename = "fr", skip_serializing_if = "Option::is_none")]
    pub first_positive_result: Option<String>,
    #[serde(rename = "co", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "is", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(rename = "df", skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(rename = "du", skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(rename = "ci", skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, CborValue>,
}
