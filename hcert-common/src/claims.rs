// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! CWT claims payload → `ClaimSet`.
//!
//! Only the shape is checked: known fields must carry the expected CBOR type
//! and exactly one event group must be present. Values themselves (dates,
//! codes, identifiers) are passed through untouched.

use std::collections::BTreeMap;

use hcert_abstractions::{
    CertificateEvent, CborKey, ClaimSet, CborValue, HealthCertificate, PersonName, RecoveryEntry, TestEntry,
    VaccinationEntry,
};
use minicbor::Decoder;

use crate::cbor_value::decode_cbor_value;

/// CWT `iss`.
pub const CLAIM_ISSUER: i64 = 1;
/// CWT `exp`.
pub const CLAIM_EXPIRES_AT: i64 = 4;
/// CWT `iat`.
pub const CLAIM_ISSUED_AT: i64 = 6;
/// Private-use CWT claim holding the health-certificate container.
pub const CLAIM_HCERT: i64 = -260;
/// Key of the v1 health-certificate record inside [`CLAIM_HCERT`].
pub const CLAIM_HCERT_V1: i64 = 1;

pub fn parse_claims(payload: &[u8]) -> Result<ClaimSet, String> {
    if payload.is_empty() {
        return Err("empty claims payload".to_string());
    }

    let mut dec = Decoder::new(payload);
    let value = decode_cbor_value(&mut dec)?;
    if dec.position() != payload.len() {
        return Err("trailing bytes after claims payload".to_string());
    }

    let CborValue::Map(mut top) = value else {
        return Err("claims payload is not a map".to_string());
    };

    let issuer = match top.remove(&CborKey::Int(CLAIM_ISSUER)) {
        Some(CborValue::Text(s)) => Some(s),
        _ => None,
    };
    let expires_at = lenient_int(top.remove(&CborKey::Int(CLAIM_EXPIRES_AT)));
    let issued_at = lenient_int(top.remove(&CborKey::Int(CLAIM_ISSUED_AT)));

    let CborValue::Map(mut container) = top
        .remove(&CborKey::Int(CLAIM_HCERT))
        .ok_or_else(|| format!("claim {CLAIM_HCERT} is missing"))?
    else {
        return Err(format!("claim {CLAIM_HCERT} is not a map"));
    };

    let record = container
        .remove(&CborKey::Int(CLAIM_HCERT_V1))
        .ok_or_else(|| format!("claim {CLAIM_HCERT} has no record under key {CLAIM_HCERT_V1}"))?;

    Ok(ClaimSet {
        issuer,
        issued_at,
        expires_at,
        certificate: parse_health_certificate(record)?,
    })
}

fn lenient_int(value: Option<CborValue>) -> Option<i64> {
    match value {
        Some(CborValue::Int(i)) => Some(i),
        // Some issuers emit epoch times as floats.
        Some(CborValue::Float(f)) if f.is_finite() => Some(f as i64),
        _ => None,
    }
}

fn parse_health_certificate(record: CborValue) -> Result<HealthCertificate, String> {
    let mut fields = FieldReader::new("hcert", record)?;

    let version = fields.take_text("ver")?;
    let name = match fields.take("nam") {
        Some(nam) => parse_person_name(nam)?,
        None => PersonName::default(),
    };
    let date_of_birth = fields.take_text("dob")?;

    let vaccinations = fields.take_entries("v")?;
    let tests = fields.take_entries("t")?;
    let recoveries = fields.take_entries("r")?;

    let event = match (vaccinations, tests, recoveries) {
        (Some(v), None, None) => CertificateEvent::Vaccination(
            v.into_iter()
                .map(parse_vaccination)
                .collect::<Result<_, _>>()?,
        ),
        (None, Some(t), None) => {
            CertificateEvent::Test(t.into_iter().map(parse_test).collect::<Result<_, _>>()?)
        }
        (None, None, Some(r)) => CertificateEvent::Recovery(
            r.into_iter()
                .map(parse_recovery)
                .collect::<Result<_, _>>()?,
        ),
        (None, None, None) => return Err("hcert record carries no v, t or r group".to_string()),
        _ => return Err("hcert record carries more than one event group".to_string()),
    };

    Ok(HealthCertificate {
        version,
        name,
        date_of_birth,
        event,
        extra: fields.into_extra(),
    })
}

fn parse_person_name(value: CborValue) -> Result<PersonName, String> {
    let mut f = FieldReader::new("nam", value)?;
    Ok(PersonName {
        family_name: f.take_text("fn")?,
        family_name_standardised: f.take_text("fnt")?,
        given_name: f.take_text("gn")?,
        given_name_standardised: f.take_text("gnt")?,
        extra: f.into_extra(),
    })
}

fn parse_vaccination(value: CborValue) -> Result<VaccinationEntry, String> {
    let mut f = FieldReader::new("v", value)?;
    Ok(VaccinationEntry {
        disease_agent: f.take_text("tg")?,
        vaccine_prophylaxis: f.take_text("vp")?,
        medicinal_product: f.take_text("mp")?,
        manufacturer: f.take_text("ma")?,
        dose_number: f.take_int("dn")?,
        total_doses: f.take_int("sd")?,
        date: f.take_text("dt")?,
        country: f.take_text("co")?,
        issuer: f.take_text("is")?,
        certificate_id: f.take_text("ci")?,
        extra: f.into_extra(),
    })
}

fn parse_test(value: CborValue) -> Result<TestEntry, String> {
    let mut f = FieldReader::new("t", value)?;
    Ok(TestEntry {
        disease_agent: f.take_text("tg")?,
        test_type: f.take_text("tt")?,
        test_name: f.take_text("nm")?,
        manufacturer: f.take_text("ma")?,
        sample_collected_at: f.take_text("sc")?,
        result: f.take_text("tr")?,
        testing_centre: f.take_text("tc")?,
        country: f.take_text("co")?,
        issuer: f.take_text("is")?,
        certificate_id: f.take_text("ci")?,
        extra: f.into_extra(),
    })
}

fn parse_recovery(value: CborValue) -> Result<RecoveryEntry, String> {
    let mut f = FieldReader::new("r", value)?;
    Ok(RecoveryEntry {
        disease_agent: f.take_text("tg")?,
        first_positive_result: f.take_text("fr")?,
        country: f.take_text("co")?,
        issuer: f.take_text("is")?,
        valid_from: f.take_text("df")?,
        valid_until: f.take_text("du")?,
        certificate_id: f.take_text("ci")?,
        extra: f.into_extra(),
    })
}

/// Moves typed fields out of a text-keyed map; whatever is left becomes `extra`.
struct FieldReader {
    path: &'static str,
    fields: BTreeMap<String, CborValue>,
}

impl FieldReader {
    fn new(path: &'static str, value: CborValue) -> Result<Self, String> {
        let CborValue::Map(map) = value else {
            return Err(format!("'{path}' is not a map"));
        };

        let fields = map
            .into_iter()
            .map(|(k, v)| match k {
                CborKey::Text(k) => Ok((k, v)),
                CborKey::Int(i) => Err(format!("'{path}' has non-text key {i}")),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self { path, fields })
    }

    /// Null is treated as absent.
    fn take(&mut self, name: &str) -> Option<CborValue> {
        self.fields
            .remove(name)
            .filter(|v| !matches!(v, CborValue::Null))
    }

    fn take_text(&mut self, name: &str) -> Result<Option<String>, String> {
        match self.take(name) {
            None => Ok(None),
            Some(CborValue::Text(s)) => Ok(Some(s)),
            Some(_) => Err(format!("'{}.{name}' is not text", self.path)),
        }
    }

    fn take_int(&mut self, name: &str) -> Result<Option<i64>, String> {
        match self.take(name) {
            None => Ok(None),
            Some(CborValue::Int(i)) => Ok(Some(i)),
            Some(_) => Err(format!("'{}.{name}' is not an integer", self.path)),
        }
    }

    fn take_entries(&mut self, name: &str) -> Result<Option<Vec<CborValue>>, String> {
        match self.take(name) {
            None => Ok(None),
            Some(CborValue::Array(a)) if a.is_empty() => Err(format!("'{}.{name}' is empty", self.path)),
            Some(CborValue::Array(a)) => Ok(Some(a)),
            Some(_) => Err(format!("'{}.{name}' is not an array", self.path)),
        }
    }

    fn into_extra(self) -> BTreeMap<String, CborValue> {
        self.fields
    }
}
