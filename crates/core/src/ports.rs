//! Port interfaces for the cache layer
//!
//! `StorageBackend` is the seam between the cache logic and the durable
//! medium: memory, disk, or a remote store all present the same synchronous
//! string-payload surface, which is also where test doubles plug in.
//! `FetchSource` is the async boundary to the wrapped data source.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use fetchcache_domain::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::key::CanonicalArgs;

/// Capability interface over the durable medium
///
/// All operations are synchronous, local calls; the only suspension point in
/// the whole pipeline is awaiting the underlying fetch. Capacity exhaustion
/// surfaces as an error from `set` and is non-fatal to callers.
pub trait StorageBackend: Send + Sync {
    /// Read the raw payload stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous payload
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the payload stored under `key`, if any
    fn delete(&self, key: &str) -> Result<()>;
}

/// Async source of truth wrapped by a cached call
///
/// The wrapped call has identical success/error semantics to `fetch`: its
/// error is propagated to callers unchanged and never cached.
#[async_trait]
pub trait FetchSource: Send + Sync {
    /// Argument type, canonicalized into the cache key
    type Args: CanonicalArgs + Send + Sync;

    /// Fetched payload; serialized through JSON for persistence, so the
    /// value served from cache round-trips the same representation
    type Output: Serialize + DeserializeOwned + Send;

    /// Perform the underlying fetch
    async fn fetch(&self, args: Self::Args) -> Result<Self::Output>;
}

/// Adapter implementing [`FetchSource`] for a plain async closure
///
/// # Example
/// ```
/// use fetchcache_core::FnSource;
/// use fetchcache_domain::FetchCacheError;
///
/// let source = FnSource::new(|page: u32| async move {
///     Ok::<String, FetchCacheError>(format!("payload for page {page}"))
/// });
/// # fn pin<S: fetchcache_core::FetchSource<Args = u32, Output = String>>(_: &S) {}
/// # pin(&source);
/// # let _ = source;
/// ```
pub struct FnSource<A, T, F, Fut> {
    fetch_fn: F,
    _marker: PhantomData<fn(A) -> (T, Fut)>,
}

impl<A, T, F, Fut> FnSource<A, T, F, Fut> {
    /// Wrap an async closure as a fetch source
    pub fn new(fetch_fn: F) -> Self {
        Self { fetch_fn, _marker: PhantomData }
    }
}

#[async_trait]
impl<A, T, F, Fut> FetchSource for FnSource<A, T, F, Fut>
where
    A: CanonicalArgs + Send + Sync,
    T: Serialize + DeserializeOwned + Send,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
{
    type Args = A;
    type Output = T;

    async fn fetch(&self, args: A) -> Result<T> {
        (self.fetch_fn)(args).await
    }
}
