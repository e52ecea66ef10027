// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::authority::Authority;
use crate::cache::{CacheKey, CachedTrustList, TrustListCache};
use crate::config::ServiceConfig;
use crate::error::TrustListResult;
use crate::source::TrustListSource;
use crate::token::parse_trust_list_token;

/// Fetch, decode and cache trust lists per authority.
///
/// The cache is injected so tests and embedders own its lifetime.
#[derive(Clone)]
pub struct TrustListService {
    source: Arc<dyn TrustListSource>,
    cache: Arc<TrustListCache>,
    config: Arc<ServiceConfig>,
}

impl TrustListService {
    pub fn new(source: Arc<dyn TrustListSource>, cache: Arc<TrustListCache>, config: &ServiceConfig) -> Self {
        Self {
            source,
            cache,
            config: Arc::new(config.clone()),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// The document for `authority`, fetched at most once per freshness window.
    pub async fn serve(&self, authority: Authority) -> TrustListResult<Arc<CachedTrustList>> {
        let key = CacheKey::new(authority, self.source.endpoint(authority));
        self.cache
            .get_or_fetch(&key, move || async move {
                let token = self.source.fetch_token(authority).await?;
                let document = parse_trust_list_token(&token, self.config.signing_key(authority))?;
                info!(%authority, keys = document.len(), "fetched upstream trust list");
                CachedTrustList::new(document)
            })
            .await
    }
}
