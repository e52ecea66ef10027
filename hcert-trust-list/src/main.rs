// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hcert_trust_list::{
    load_signing_key_pem, router, Authority, HttpTrustListSource, ServiceConfig, TrustListCache, TrustListService,
    DEFAULT_CACHE_TTL_SECS, DEFAULT_PROD_URL, DEFAULT_TEST_URL, DEFAULT_UPSTREAM_TIMEOUT_SECS,
};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Serve production and test trust lists for HC1 verifiers.
#[derive(Debug, Parser)]
#[command(name = "hcert-trust-list", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "HCERT_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    #[arg(long, env = "HCERT_PROD_URL", default_value = DEFAULT_PROD_URL)]
    prod_url: String,

    #[arg(long, env = "HCERT_TEST_URL", default_value = DEFAULT_TEST_URL)]
    test_url: String,

    /// Seconds a fetched list is served before refetching.
    #[arg(long, env = "HCERT_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    cache_ttl_secs: u64,

    #[arg(long, env = "HCERT_UPSTREAM_TIMEOUT_SECS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    upstream_timeout_secs: u64,

    /// PEM public key that must have signed production tokens.
    #[arg(long, env = "HCERT_PROD_SIGNING_KEY")]
    prod_signing_key: Option<PathBuf>,

    /// PEM public key that must have signed test tokens.
    #[arg(long, env = "HCERT_TEST_SIGNING_KEY")]
    test_signing_key: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn service_config(&self) -> Result<ServiceConfig> {
        let mut config = ServiceConfig::default()
            .with_urls(&self.prod_url, &self.test_url)
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_secs));
        config.upstream_timeout = Duration::from_secs(self.upstream_timeout_secs);

        if let Some(path) = &self.prod_signing_key {
            config = config.with_signing_key(Authority::Production, load_signing_key_pem(path)?);
        }
        if let Some(path) = &self.test_signing_key {
            config = config.with_signing_key(Authority::Test, load_signing_key_pem(path)?);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.service_config()?;
    let source = HttpTrustListSource::new(&config).context("invalid upstream configuration")?;
    let cache = Arc::new(TrustListCache::new(config.cache_ttl));
    let service = TrustListService::new(Arc::new(source), cache, &config);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(
        addr = %args.bind,
        prod = %config.prod_url,
        test = %config.test_url,
        ttl_secs = config.cache_ttl.as_secs(),
        "trust-list service listening"
    );

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("trust-list service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}
