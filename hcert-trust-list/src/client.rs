// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Consumer side: download a served document into a trust store.

use hcert_abstractions::TrustStore;
use tracing::{debug, warn};

use crate::error::{TrustListError, TrustListResult};

/// Download and load the document at `url`.
///
/// A failed download is an error rather than an empty store, so "no keys" and
/// "could not fetch keys" stay distinguishable.
pub async fn fetch_trust_store(client: &reqwest::Client, url: &str) -> TrustListResult<TrustStore> {
    let response = client.get(url).send().await.map_err(|e| {
        warn!(%url, error = %e, "trust list download failed");
        TrustListError::UpstreamUnavailable(format!("request to {url} failed: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "trust list download returned an error status");
        return Err(TrustListError::UpstreamUnavailable(format!("{url} answered {status}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TrustListError::UpstreamUnavailable(format!("failed to read body from {url}: {e}")))?;

    let store = TrustStore::from_json(&body).map_err(|e| TrustListError::MalformedEncoding(e.to_string()))?;
    debug!(%url, keys = store.len(), "trust store loaded");
    Ok(store)
}
