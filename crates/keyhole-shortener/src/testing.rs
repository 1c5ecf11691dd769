//! Test doubles for the coordinator and allocator tests.

use async_trait::async_trait;
use keyhole_core::cache::Result as CacheResult;
use keyhole_core::repository::Result;
use keyhole_core::{
    CacheError, CacheKey, ReadRepository, Repository, ShortKey, StorageError, UrlCache, UrlMapping,
};
use keyhole_generator::Generator;
use keyhole_storage::InMemoryRepository;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Yields a fixed sequence of keys, then repeats the last one.
pub struct ScriptedGenerator {
    keys: Mutex<VecDeque<&'static str>>,
    last: Mutex<&'static str>,
}

impl ScriptedGenerator {
    pub fn new<const N: usize>(keys: [&'static str; N]) -> Self {
        Self {
            keys: Mutex::new(keys.into_iter().collect()),
            last: Mutex::new(keys.last().copied().unwrap_or("zzzzzz")),
        }
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self) -> ShortKey {
        let next = self.keys.lock().unwrap().pop_front();
        let key = match next {
            Some(key) => {
                *self.last.lock().unwrap() = key;
                key
            }
            None => *self.last.lock().unwrap(),
        };
        ShortKey::new_unchecked(key)
    }
}

/// An in-memory store with switches for failure modes.
#[derive(Default)]
pub struct TestRepository {
    inner: InMemoryRepository,
    offline: AtomicBool,
    /// `exists` reports every key as free, as if a racing insert landed
    /// between the check and the insert.
    blind_exists: AtomicBool,
    /// Number of upcoming `find_by_long_url` calls that report nothing.
    hidden_long_url_reads: AtomicUsize,
    /// Delay applied to every call, in milliseconds.
    delay_ms: AtomicU64,
    inserts: AtomicUsize,
}

impl TestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_blind_exists(&self, blind: bool) {
        self.blind_exists.store(blind, Ordering::SeqCst);
    }

    pub fn hide_next_long_url_reads(&self, count: usize) {
        self.hidden_long_url_reads.store(count, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Number of successful inserts.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadRepository for TestRepository {
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<UrlMapping>> {
        self.enter().await?;
        let hidden = self
            .hidden_long_url_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hidden {
            return Ok(None);
        }
        self.inner.find_by_long_url(long_url).await
    }

    async fn find_by_short_key(&self, key: &ShortKey) -> Result<Option<UrlMapping>> {
        self.enter().await?;
        self.inner.find_by_short_key(key).await
    }

    async fn exists(&self, key: &ShortKey) -> Result<bool> {
        self.enter().await?;
        if self.blind_exists.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.exists(key).await
    }

    async fn list_all(&self) -> Result<Vec<UrlMapping>> {
        self.enter().await?;
        self.inner.list_all().await
    }
}

#[async_trait]
impl Repository for TestRepository {
    async fn insert(&self, long_url: &str, key: &ShortKey, title: &str) -> Result<UrlMapping> {
        self.enter().await?;
        let mapping = self.inner.insert(long_url, key, title).await?;
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(mapping)
    }
}

/// A cache whose backend is always down.
pub struct BrokenCache;

#[async_trait]
impl UrlCache for BrokenCache {
    async fn get(&self, _key: &CacheKey) -> CacheResult<Option<UrlMapping>> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &CacheKey, _mapping: &UrlMapping) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

/// A cache that never answers in time.
pub struct StalledCache;

#[async_trait]
impl UrlCache for StalledCache {
    async fn get(&self, _key: &CacheKey) -> CacheResult<Option<UrlMapping>> {
        std::future::pending().await
    }

    async fn set(&self, _key: &CacheKey, _mapping: &UrlMapping) -> CacheResult<()> {
        std::future::pending().await
    }
}
