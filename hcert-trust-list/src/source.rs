// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Where upstream trust-list tokens come from.

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::authority::Authority;
use crate::config::ServiceConfig;
use crate::error::{TrustListError, TrustListResult};

/// A provider of raw upstream tokens.
#[async_trait]
pub trait TrustListSource: Send + Sync {
    /// Upstream location for `authority`. Cache entries are keyed by it.
    fn endpoint(&self, authority: Authority) -> String;

    /// Fetch the raw token text. Every failure maps to `UpstreamUnavailable`.
    async fn fetch_token(&self, authority: Authority) -> TrustListResult<String>;
}

/// Fetches tokens over HTTPS with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTrustListSource {
    client: reqwest::Client,
    prod_url: Url,
    test_url: Url,
}

impl HttpTrustListSource {
    pub fn new(config: &ServiceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!("hcert-trust-list/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: reqwest::Client, config: &ServiceConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            prod_url: Url::parse(config.url(Authority::Production))?,
            test_url: Url::parse(config.url(Authority::Test))?,
        })
    }

    fn url(&self, authority: Authority) -> &Url {
        match authority {
            Authority::Production => &self.prod_url,
            Authority::Test => &self.test_url,
        }
    }
}

#[async_trait]
impl TrustListSource for HttpTrustListSource {
    fn endpoint(&self, authority: Authority) -> String {
        self.url(authority).to_string()
    }

    async fn fetch_token(&self, authority: Authority) -> TrustListResult<String> {
        let url = self.url(authority);
        debug!(%authority, %url, "fetching upstream trust list");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(%authority, error = %e, timeout = e.is_timeout(), "upstream request failed");
            TrustListError::UpstreamUnavailable(format!("request to {url} failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%authority, status = status.as_u16(), "upstream answered with an error status");
            return Err(TrustListError::UpstreamUnavailable(format!("{url} answered {status}")));
        }

        response.text().await.map_err(|e| {
            warn!(%authority, error = %e, "failed to read upstream body");
            TrustListError::UpstreamUnavailable(format!("failed to read body from {url}: {e}"))
        })
    }
}
