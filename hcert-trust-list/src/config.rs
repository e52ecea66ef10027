// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;
use std::time::Duration;

use p256::ecdsa::VerifyingKey;
use p256::pkcs8::DecodePublicKey as _;

use crate::authority::Authority;

pub const DEFAULT_PROD_URL: &str = "https://dgcg.covidbevis.se/tp/trust-list";
pub const DEFAULT_TEST_URL: &str = "https://dgcg-qa.covidbevis.se/tp/trust-list";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Service settings. The binary fills this from flags and environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub prod_url: String,
    pub test_url: String,
    /// How long a fetched list is served before the next request refetches it.
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
    /// When set, upstream tokens must carry a valid ES256 signature by this key.
    pub prod_signing_key: Option<VerifyingKey>,
    pub test_signing_key: Option<VerifyingKey>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            prod_url: DEFAULT_PROD_URL.to_string(),
            test_url: DEFAULT_TEST_URL.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            prod_signing_key: None,
            test_signing_key: None,
        }
    }
}

impl ServiceConfig {
    pub fn with_urls(mut self, prod_url: impl Into<String>, test_url: impl Into<String>) -> Self {
        self.prod_url = prod_url.into();
        self.test_url = test_url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_signing_key(mut self, authority: Authority, key: VerifyingKey) -> Self {
        match authority {
            Authority::Production => self.prod_signing_key = Some(key),
            Authority::Test => self.test_signing_key = Some(key),
        }
        self
    }

    pub fn url(&self, authority: Authority) -> &str {
        match authority {
            Authority::Production => &self.prod_url,
            Authority::Test => &self.test_url,
        }
    }

    pub fn signing_key(&self, authority: Authority) -> Option<&VerifyingKey> {
        match authority {
            Authority::Production => self.prod_signing_key.as_ref(),
            Authority::Test => self.test_signing_key.as_ref(),
        }
    }
}

/// Read a PEM `PUBLIC KEY` (SubjectPublicKeyInfo) holding a P-256 key.
pub fn load_signing_key_pem(path: &Path) -> anyhow::Result<VerifyingKey> {
    let pem = std::fs::read_to_string(path)?;
    VerifyingKey::from_public_key_pem(&pem)
        .map_err(|e| anyhow::anyhow!("{}: not a P-256 public key: {e}", path.display()))
}
