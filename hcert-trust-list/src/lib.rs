// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Trust-list edge service.
//!
//! Fetches an authority's signed trust-list token, flattens it into the
//! `kid → entry` document that `hcert::TrustStore` loads, caches it per
//! authority, and serves it over HTTP with CORS headers.

mod authority;
mod cache;
mod client;
mod config;
mod error;
mod http;
mod service;
mod source;
mod token;

pub use authority::Authority;
pub use cache::{CacheKey, CachedTrustList, TrustListCache};
pub use client::fetch_trust_store;
pub use config::{
    load_signing_key_pem, ServiceConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_PROD_URL, DEFAULT_TEST_URL,
    DEFAULT_UPSTREAM_TIMEOUT_SECS,
};
pub use error::{TrustListError, TrustListResult};
pub use http::router;
pub use service::TrustListService;
pub use source::{HttpTrustListSource, TrustListSource};
pub use token::parse_trust_list_token;
