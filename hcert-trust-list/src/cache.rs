// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-process trust-list cache.
//!
//! Entries are keyed by authority and upstream endpoint and are replaced
//! whole. Each key has its own async slot lock held across
//! check-fetch-store, so concurrent misses for one key share a single fetch
//! while other keys proceed independently. A failed fetch is handed to the
//! callers that queued behind it; it is never served to a later request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hcert_abstractions::TrustListDocument;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::authority::Authority;
use crate::error::{TrustListError, TrustListResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub authority: Authority,
    pub endpoint: String,
}

impl CacheKey {
    pub fn new(authority: Authority, endpoint: impl Into<String>) -> Self {
        Self {
            authority,
            endpoint: endpoint.into(),
        }
    }
}

/// One fetched list: the document plus the exact body served for it.
#[derive(Debug)]
pub struct CachedTrustList {
    document: TrustListDocument,
    body: String,
    fetched_at: Instant,
}

impl CachedTrustList {
    pub fn new(document: TrustListDocument) -> TrustListResult<Self> {
        let body = serde_json::to_string(&document)
            .map_err(|e| TrustListError::MalformedEncoding(format!("failed to serialize document: {e}")))?;
        Ok(Self {
            document,
            body,
            fetched_at: Instant::now(),
        })
    }

    pub fn document(&self) -> &TrustListDocument {
        &self.document
    }

    /// Serialized JSON body.
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Completed fetch attempts, successful or not.
    attempts: AtomicU64,
    state: tokio::sync::Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    entry: Option<Arc<CachedTrustList>>,
    /// Outcome of the latest attempt when it failed.
    last_error: Option<TrustListError>,
}

#[derive(Debug)]
pub struct TrustListCache {
    ttl: Duration,
    slots: Mutex<HashMap<CacheKey, Arc<Slot>>>,
}

impl TrustListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The entry for `key` if it is still fresh.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<CachedTrustList>> {
        let slot = self.slots.lock().get(key).cloned()?;
        let state = slot.state.lock().await;
        state.entry.as_ref().filter(|entry| self.is_fresh(entry)).cloned()
    }

    /// Serve the fresh entry for `key`, or run `fetch` and store its result.
    ///
    /// Callers waiting on the same key observe the outcome of the fetch that
    /// was running when they arrived, success or failure. Errors are not
    /// stored for later requests.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> TrustListResult<Arc<CachedTrustList>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TrustListResult<CachedTrustList>>,
    {
        let slot = self.slot(key);
        let seen = slot.attempts.load(Ordering::Acquire);
        let mut state = slot.state.lock().await;

        if let Some(entry) = state.entry.as_ref().filter(|entry| self.is_fresh(entry)) {
            debug!(authority = %key.authority, "trust list served from cache");
            return Ok(Arc::clone(entry));
        }

        if slot.attempts.load(Ordering::Acquire) != seen {
            if let Some(err) = &state.last_error {
                debug!(authority = %key.authority, error = %err, "sharing failed fetch with waiting caller");
                return Err(err.clone());
            }
        }

        let result = fetch().await;
        slot.attempts.fetch_add(1, Ordering::Release);

        match result {
            Ok(entry) => {
                let entry = Arc::new(entry);
                debug!(authority = %key.authority, keys = entry.document.len(), "trust list cached");
                state.entry = Some(Arc::clone(&entry));
                state.last_error = None;
                Ok(entry)
            }
            Err(err) => {
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drop the entry for `key`; the next request refetches.
    pub async fn invalidate(&self, key: &CacheKey) {
        let slot = self.slots.lock().get(key).cloned();
        if let Some(slot) = slot {
            slot.state.lock().await.entry = None;
        }
    }

    fn slot(&self, key: &CacheKey) -> Arc<Slot> {
        Arc::clone(self.slots.lock().entry(key.clone()).or_default())
    }

    fn is_fresh(&self, entry: &CachedTrustList) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }
}
