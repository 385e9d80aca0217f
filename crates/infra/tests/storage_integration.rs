//! Integration tests running the cached-call pipeline over real backends
//!
//! The core crate proves the pipeline against in-file doubles; these tests
//! prove the same behavior over the shipped media, including durability
//! across SQLite reopens and quota behavior on the bounded memory backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fetchcache_common::time::MockClock;
use fetchcache_core::{
    canonical_json, CacheClient, CacheConfig, CallConfig, CanonicalArgs, FnSource, StorageBackend,
};
use fetchcache_domain::{FetchCacheError, Result};
use fetchcache_infra::{MemoryBackend, SqliteBackend};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

fn client_over(backend: Arc<dyn StorageBackend>, clock: MockClock) -> CacheClient<MockClock> {
    CacheClient::with_clock(backend, CacheConfig::with_ttl(Duration::from_secs(60)), clock)
}

type CountedFut = std::pin::Pin<Box<dyn std::future::Future<Output = Result<String>> + Send>>;

fn counted_source(
    calls: Arc<AtomicUsize>,
) -> FnSource<u32, String, impl Fn(u32) -> CountedFut, CountedFut> {
    FnSource::new(move |page: u32| -> CountedFut {
        let calls = Arc::clone(&calls);
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("page-{page}"))
        })
    })
}

/// Verifies cache-hit behavior over the memory backend.
///
/// # Test Steps
/// 1. Call twice with the same argument
/// 2. Verify one fetch and one persisted record pair (entry + override)
#[tokio::test]
async fn test_pipeline_over_memory_backend() {
    let backend = Arc::new(MemoryBackend::new());
    let client = client_over(Arc::clone(&backend) as Arc<dyn StorageBackend>, MockClock::new());

    let calls = Arc::new(AtomicUsize::new(0));
    let cached = client.wrap(
        counted_source(Arc::clone(&calls)),
        CallConfig::new("movies", Duration::from_secs(60)),
    );

    assert_eq!(cached.call(1).await.unwrap(), "page-1");
    assert_eq!(cached.call(1).await.unwrap(), "page-1");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // One envelope record plus one TTL override record.
    assert_eq!(backend.len(), 2);
}

/// Verifies that the bounded memory backend degrades to always-fetch.
///
/// A zero-capacity backend rejects every write; calls still return the
/// fetched value and each call fetches anew.
#[tokio::test]
async fn test_bounded_memory_backend_degrades_to_always_fetch() {
    let backend = Arc::new(MemoryBackend::bounded(0));
    let client = client_over(Arc::clone(&backend) as Arc<dyn StorageBackend>, MockClock::new());

    let calls = Arc::new(AtomicUsize::new(0));
    let cached = client.wrap(
        counted_source(Arc::clone(&calls)),
        CallConfig::new("movies", Duration::from_secs(60)),
    );

    assert_eq!(cached.call(1).await.unwrap(), "page-1");
    assert_eq!(cached.call(1).await.unwrap(), "page-1");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(backend.is_empty());
}

/// Verifies TTL expiry on the full pipeline over SQLite.
#[tokio::test]
async fn test_pipeline_over_sqlite_with_ttl() {
    let clock = MockClock::new();
    let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
    let client = client_over(Arc::clone(&backend) as Arc<dyn StorageBackend>, clock.clone());

    let calls = Arc::new(AtomicUsize::new(0));
    let cached = client.wrap(
        counted_source(Arc::clone(&calls)),
        CallConfig::new("movies", Duration::from_millis(1000)),
    );

    assert_eq!(cached.call(1).await.unwrap(), "page-1");

    clock.advance(Duration::from_millis(500));
    assert_eq!(cached.call(1).await.unwrap(), "page-1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::from_millis(1000));
    assert_eq!(cached.call(1).await.unwrap(), "page-1");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Verifies that cached records persist across process-style restarts.
///
/// # Test Steps
/// 1. Fetch once against a file-backed database, then drop everything
/// 2. Rebuild the backend and client over the same file
/// 3. Verify the next call is served from the durable record, no fetch
#[tokio::test]
async fn test_sqlite_records_serve_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    let clock = MockClock::new();
    let calls = Arc::new(AtomicUsize::new(0));

    {
        let backend = Arc::new(SqliteBackend::open(&path).unwrap());
        let client = client_over(Arc::clone(&backend) as Arc<dyn StorageBackend>, clock.clone());
        let cached = client.wrap(
            counted_source(Arc::clone(&calls)),
            CallConfig::new("movies", Duration::from_secs(60)),
        );
        assert_eq!(cached.call(1).await.unwrap(), "page-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    let backend = Arc::new(SqliteBackend::open(&path).unwrap());
    let client = client_over(Arc::clone(&backend) as Arc<dyn StorageBackend>, clock.clone());
    let cached = client.wrap(
        counted_source(Arc::clone(&calls)),
        CallConfig::new("movies", Duration::from_secs(60)),
    );

    assert_eq!(cached.call(1).await.unwrap(), "page-1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Verifies a typed argument struct canonicalizing through `canonical_json`.
///
/// Two value-equal queries must map to the same record; a different query
/// must fetch independently.
#[tokio::test]
async fn test_typed_arguments_over_sqlite() {
    #[derive(Clone, Serialize, Deserialize)]
    struct Query {
        page: u32,
        country: String,
    }

    impl CanonicalArgs for Query {
        fn canonical(&self) -> Result<Option<String>> {
            canonical_json(self).map(Some)
        }
    }

    let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
    let client = client_over(Arc::clone(&backend) as Arc<dyn StorageBackend>, MockClock::new());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let source = FnSource::new(move |query: Query| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<String, FetchCacheError>(format!("{}-{}", query.country, query.page))
        }
    });
    let cached = client.wrap(source, CallConfig::new("search", Duration::from_secs(60)));

    let us_one = Query { page: 1, country: "us".to_string() };
    assert_eq!(cached.call(us_one.clone()).await.unwrap(), "us-1");
    assert_eq!(cached.call(us_one.clone()).await.unwrap(), "us-1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let us_two = Query { page: 2, country: "us".to_string() };
    assert_eq!(cached.call(us_two).await.unwrap(), "us-2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert_eq!(cached.key_for(&us_one).unwrap(), "search_{\"country\":\"us\",\"page\":1}");
}

/// Verifies background refresh over a real backend.
#[tokio::test]
async fn test_refresh_over_memory_backend() {
    let backend = Arc::new(MemoryBackend::new());
    let client = client_over(Arc::clone(&backend) as Arc<dyn StorageBackend>, MockClock::new());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let source = FnSource::new(move |_: ()| {
        let counter = Arc::clone(&counter);
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            Ok::<String, FetchCacheError>(format!("version-{attempt}"))
        }
    });
    let cached = client.wrap(source, CallConfig::new("feed", Duration::from_secs(60)));

    assert_eq!(cached.call(()).await.unwrap(), "version-0");
    assert_eq!(cached.refresh(()).await, Some("version-1".to_string()));
    assert_eq!(cached.call(()).await.unwrap(), "version-1");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
