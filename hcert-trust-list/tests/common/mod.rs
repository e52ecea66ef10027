// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hcert_test_utils::{test_signing_key, unsigned_upstream_token, upstream_key_json, upstream_payload, wire_kid};
use hcert_trust_list::{
    Authority, ServiceConfig, TrustListCache, TrustListError, TrustListResult, TrustListService, TrustListSource,
};
use parking_lot::Mutex;

/// In-memory upstream with per-authority responses and call counters.
#[derive(Default)]
pub struct FakeSource {
    responses: Mutex<HashMap<Authority, TrustListResult<String>>>,
    calls: Mutex<HashMap<Authority, usize>>,
    delay: Duration,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn set(&self, authority: Authority, response: TrustListResult<String>) {
        self.responses.lock().insert(authority, response);
    }

    pub fn calls(&self, authority: Authority) -> usize {
        self.calls.lock().get(&authority).copied().unwrap_or(0)
    }
}

#[async_trait]
impl TrustListSource for FakeSource {
    fn endpoint(&self, authority: Authority) -> String {
        format!("fake://{authority}")
    }

    async fn fetch_token(&self, authority: Authority) -> TrustListResult<String> {
        *self.calls.lock().entry(authority).or_default() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let response = self.responses.lock().get(&authority).cloned();
        response.unwrap_or_else(|| Err(TrustListError::UpstreamUnavailable("no response configured".to_string())))
    }
}

/// Unsigned upstream token publishing one P-256 key under `kid` in group `SE`.
pub fn single_key_token(kid: &[u8], seed: u8) -> String {
    let payload = upstream_payload(vec![(
        "SE",
        vec![upstream_key_json(&wire_kid(kid), &test_signing_key(seed), None)],
    )]);
    unsigned_upstream_token(&payload)
}

pub fn service_with(source: Arc<FakeSource>, ttl: Duration) -> TrustListService {
    let config = ServiceConfig::default().with_cache_ttl(ttl);
    TrustListService::new(source, Arc::new(TrustListCache::new(ttl)), &config)
}
