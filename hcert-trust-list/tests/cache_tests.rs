// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hcert_abstractions::{TrustListDocument, TrustListEntry};
use hcert_trust_list::{Authority, CacheKey, CachedTrustList, TrustListCache, TrustListError};

const TTL: Duration = Duration::from_secs(3600);

fn document_with(kid: &str) -> TrustListDocument {
    let mut document = TrustListDocument::new();
    document.insert(
        kid.to_string(),
        TrustListEntry {
            x5c: vec!["AAAA".to_string()],
            ..TrustListEntry::default()
        },
    );
    document
}

fn prod_key() -> CacheKey {
    CacheKey::new(Authority::Production, "https://prod.example/trust-list")
}

#[tokio::test]
async fn body_is_the_serialized_document() {
    let entry = CachedTrustList::new(document_with("AAE=")).unwrap();
    assert_eq!(entry.body(), serde_json::to_string(entry.document()).unwrap());
    assert_eq!(entry.body(), r#"{"AAE=":{"x5c":["AAAA"]}}"#);
}

#[tokio::test]
async fn miss_then_hit_returns_the_same_entry() {
    let cache = TrustListCache::new(TTL);
    let fetches = AtomicUsize::new(0);
    let counter = &fetches;
    let fetch = move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        CachedTrustList::new(document_with("AAE="))
    };

    assert!(cache.get(&prod_key()).await.is_none());
    let first = cache.get_or_fetch(&prod_key(), fetch).await.unwrap();
    let second = cache.get_or_fetch(&prod_key(), fetch).await.unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &cache.get(&prod_key()).await.unwrap()));
}

#[tokio::test]
async fn errors_are_not_stored() {
    let cache = TrustListCache::new(TTL);

    let err = cache
        .get_or_fetch(&prod_key(), || async {
            Err(TrustListError::UpstreamUnavailable("down".to_string()))
        })
        .await
        .unwrap_err();
    assert_eq!(err, TrustListError::UpstreamUnavailable("down".to_string()));
    assert!(cache.get(&prod_key()).await.is_none());

    let entry = cache
        .get_or_fetch(&prod_key(), || async { CachedTrustList::new(document_with("AAE=")) })
        .await
        .unwrap();
    assert!(entry.document().contains_key("AAE="));
}

#[tokio::test]
async fn keys_differing_in_authority_or_endpoint_are_separate() {
    let cache = TrustListCache::new(TTL);
    let keys = [
        CacheKey::new(Authority::Production, "https://a.example"),
        CacheKey::new(Authority::Test, "https://a.example"),
        CacheKey::new(Authority::Production, "https://b.example"),
    ];

    for (i, key) in keys.iter().enumerate() {
        let kid = format!("AA{i}=");
        cache
            .get_or_fetch(key, move || async move { CachedTrustList::new(document_with(&kid)) })
            .await
            .unwrap();
    }
    for (i, key) in keys.iter().enumerate() {
        let entry = cache.get(key).await.unwrap();
        assert!(entry.document().contains_key(&format!("AA{i}=")));
    }
}

#[tokio::test(start_paused = true)]
async fn entries_expire_after_the_ttl() {
    let cache = TrustListCache::new(TTL);
    let fetches = AtomicUsize::new(0);
    let counter = &fetches;
    let fetch = move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        CachedTrustList::new(document_with("AAE="))
    };

    cache.get_or_fetch(&prod_key(), fetch).await.unwrap();
    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    assert!(cache.get(&prod_key()).await.is_some());
    cache.get_or_fetch(&prod_key(), fetch).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(cache.get(&prod_key()).await.is_none());
    cache.get_or_fetch(&prod_key(), fetch).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidate_forces_a_refetch() {
    let cache = TrustListCache::new(TTL);
    let fetches = AtomicUsize::new(0);
    let counter = &fetches;
    let fetch = move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        CachedTrustList::new(document_with("AAE="))
    };

    cache.get_or_fetch(&prod_key(), fetch).await.unwrap();
    cache.invalidate(&prod_key()).await;
    assert!(cache.get(&prod_key()).await.is_none());
    cache.get_or_fetch(&prod_key(), fetch).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn waiters_get_the_failed_fetch_result_without_refetching() {
    let cache = Arc::new(TrustListCache::new(TTL));
    let fetches = Arc::new(AtomicUsize::new(0));

    let handles = (0..3)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let fetches = Arc::clone(&fetches);
            tokio::spawn(async move {
                cache
                    .get_or_fetch(&prod_key(), move || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Err(TrustListError::UpstreamUnavailable("down".to_string()))
                    })
                    .await
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err, TrustListError::UpstreamUnavailable("down".to_string()));
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(cache.get(&prod_key()).await.is_none());
}
