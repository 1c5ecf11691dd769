use crate::allocator::{KeyAllocator, DEFAULT_MAX_ATTEMPTS};
use crate::lock::KeyedMutex;
use crate::timeout::store_call;
use async_trait::async_trait;
use keyhole_core::{
    CacheKey, EncodeParams, Encoded, Repository, ShortKey, Shortener, ShortenerError, StorageError,
    UrlCache, UrlMapping,
};
use keyhole_generator::Generator;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

/// Settings for a [`ShortenerService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// Base of the URL that serves redirects.
    #[builder(setter(into))]
    pub real_base_url: String,
    /// Base of the URL shown to users.
    #[builder(setter(into))]
    pub display_base_url: String,
    /// Upper bound for every store call.
    #[builder(default = Duration::from_secs(2))]
    pub store_timeout: Duration,
    /// Upper bound for every cache call.
    #[builder(default = Duration::from_millis(200))]
    pub cache_timeout: Duration,
    /// Candidates the allocator tries before reporting an exhausted key space.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

/// A concrete implementation of the [`Shortener`] trait.
///
/// Encode is serialized per long URL: the store check-then-insert and the
/// cache fill run under a lock keyed by the long URL, so concurrent calls
/// for the same URL create one mapping. Calls for other URLs, cache hits and
/// resolves never take that lock.
///
/// The cache is best effort. Cache errors and timeouts are logged and
/// treated as misses. Store errors fail the call.
pub struct ShortenerService<R, C, G> {
    repository: Arc<R>,
    cache: Arc<C>,
    allocator: KeyAllocator<G>,
    locks: KeyedMutex,
    settings: ShortenerSettings,
}

impl<R: Repository, C: UrlCache, G: Generator> ShortenerService<R, C, G> {
    pub fn new(repository: R, cache: C, generator: G, settings: ShortenerSettings) -> Self {
        Self {
            repository: Arc::new(repository),
            cache: Arc::new(cache),
            allocator: KeyAllocator::new(generator, settings.max_attempts),
            locks: KeyedMutex::new(),
            settings,
        }
    }

    /// Returns a reference to the mapping store.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn render(&self, mapping: UrlMapping) -> Encoded {
        Encoded {
            real_url: mapping.short_key.to_url(&self.settings.real_base_url),
            display_url: mapping.short_key.to_url(&self.settings.display_base_url),
            short_key: mapping.short_key,
            title: mapping.title,
        }
    }

    async fn store<T, F>(&self, operation: &'static str, call: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        store_call(self.settings.store_timeout, operation, call).await
    }

    async fn cache_get(&self, key: &CacheKey) -> Option<UrlMapping> {
        match tokio::time::timeout(self.settings.cache_timeout, self.cache.get(key)).await {
            Ok(Ok(hit)) => hit,
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Cache read failed, falling back to store");
                None
            }
            Err(_) => {
                warn!(key = %key, "Cache read timed out, falling back to store");
                None
            }
        }
    }

    async fn cache_set(&self, key: &CacheKey, mapping: &UrlMapping) {
        let timeout = self.settings.cache_timeout;
        match tokio::time::timeout(timeout, self.cache.set(key, mapping)).await {
            Ok(Ok(())) => trace!(key = %key, "Cache filled"),
            Ok(Err(e)) => warn!(key = %key, error = %e, "Cache write failed"),
            Err(_) => warn!(key = %key, "Cache write timed out"),
        }
    }

    /// Allocates a key and inserts the mapping.
    ///
    /// One write conflict is absorbed: a taken short key gets a fresh
    /// allocation, and a long URL inserted by someone else is read back.
    /// A second conflict in the same call is reported as `StoreUnavailable`.
    async fn insert_new(&self, params: &EncodeParams) -> Result<UrlMapping, ShortenerError> {
        let mut conflicted = false;

        loop {
            let key = self
                .allocator
                .allocate(self.repository.as_ref(), self.settings.store_timeout)
                .await?;

            let err = match self
                .store(
                    "insert mapping",
                    self.repository
                        .insert(&params.long_url, &key, &params.title),
                )
                .await
            {
                Ok(mapping) => {
                    info!(short_key = %mapping.short_key, "Created mapping");
                    return Ok(mapping);
                }
                Err(err) => err,
            };

            if !err.is_conflict() {
                return Err(err.into());
            }
            if conflicted {
                warn!(error = %err, "Repeated write conflict while encoding");
                return Err(ShortenerError::StoreUnavailable(format!(
                    "repeated write conflict: {err}"
                )));
            }
            conflicted = true;

            if let StorageError::DuplicateLongUrl(_) = err {
                debug!("Long url inserted concurrently, reading it back");
                let existing = self
                    .store(
                        "find by long url",
                        self.repository.find_by_long_url(&params.long_url),
                    )
                    .await?;
                if let Some(existing) = existing {
                    return Ok(existing);
                }
            } else {
                debug!(short_key = %key, "Short key taken after allocation, retrying");
            }
        }
    }
}

#[async_trait]
impl<R: Repository, C: UrlCache, G: Generator> Shortener for ShortenerService<R, C, G> {
    async fn encode(&self, params: EncodeParams) -> Result<Encoded, ShortenerError> {
        if params.long_url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "long url must not be empty".to_string(),
            ));
        }

        let long_key = CacheKey::long_url(&params.long_url);
        if let Some(mapping) = self.cache_get(&long_key).await {
            debug!(short_key = %mapping.short_key, "Encode served from cache");
            return Ok(self.render(mapping));
        }

        let _guard = self.locks.lock(&params.long_url).await;

        let existing = self
            .store(
                "find by long url",
                self.repository.find_by_long_url(&params.long_url),
            )
            .await?;
        let mapping = match existing {
            Some(mapping) => {
                debug!(short_key = %mapping.short_key, "Long url already mapped");
                mapping
            }
            None => self.insert_new(&params).await?,
        };

        self.cache_set(&long_key, &mapping).await;
        self.cache_set(&CacheKey::short_key(&mapping.short_key), &mapping)
            .await;

        Ok(self.render(mapping))
    }

    async fn resolve(&self, key: &ShortKey) -> Result<String, ShortenerError> {
        let cache_key = CacheKey::short_key(key);
        if let Some(mapping) = self.cache_get(&cache_key).await {
            trace!(short_key = %key, "Resolve served from cache");
            return Ok(mapping.long_url);
        }

        let found = self
            .store("find by short key", self.repository.find_by_short_key(key))
            .await?;
        match found {
            Some(mapping) => {
                self.cache_set(&cache_key, &mapping).await;
                Ok(mapping.long_url)
            }
            None => {
                debug!(short_key = %key, "Short key not found");
                Err(ShortenerError::NotFound(key.to_string()))
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<UrlMapping>, ShortenerError> {
        Ok(self
            .store("list mappings", self.repository.list_all())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BrokenCache, ScriptedGenerator, StalledCache, TestRepository};
    use keyhole_cache::MokaUrlCache;
    use keyhole_core::ReadRepository;
    use keyhole_generator::{Alphabet, RandomGenerator, RandomGeneratorSettings};
    use std::collections::HashSet;

    fn settings() -> ShortenerSettings {
        ShortenerSettings::builder()
            .real_base_url("https://r.kh.io")
            .display_base_url("https://kh.io/")
            .build()
    }

    fn test_service() -> ShortenerService<TestRepository, MokaUrlCache, RandomGenerator> {
        ShortenerService::new(
            TestRepository::new(),
            MokaUrlCache::new(),
            RandomGenerator::default(),
            settings(),
        )
    }

    fn single_key_generator() -> RandomGenerator {
        let settings = RandomGeneratorSettings::builder()
            .alphabet(Alphabet::new("x").unwrap())
            .length(1)
            .build();
        RandomGenerator::new(settings).unwrap()
    }

    #[tokio::test]
    async fn encode_builds_both_urls() {
        let service = test_service();

        let encoded = service
            .encode(EncodeParams::new("https://example.com/a").with_title("A"))
            .await
            .unwrap();

        let key = encoded.short_key.as_str();
        assert_eq!(key.len(), 6);
        assert_eq!(encoded.real_url, format!("https://r.kh.io/{key}"));
        assert_eq!(encoded.display_url, format!("https://kh.io/{key}"));
        assert_eq!(encoded.title, "A");
    }

    #[tokio::test]
    async fn encode_is_idempotent() {
        let service = test_service();

        let first = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();
        for _ in 0..5 {
            let again = service
                .encode(EncodeParams::new("https://example.com/a"))
                .await
                .unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(service.repository().inserts(), 1);
    }

    #[tokio::test]
    async fn encode_reuses_stored_mapping_on_cache_miss() {
        let repo = TestRepository::new();
        repo.insert(
            "https://example.com/a",
            &ShortKey::new_unchecked("abc123"),
            "stored",
        )
        .await
        .unwrap();
        let service = ShortenerService::new(
            repo,
            MokaUrlCache::new(),
            RandomGenerator::default(),
            settings(),
        );

        let encoded = service
            .encode(EncodeParams::new("https://example.com/a").with_title("ignored"))
            .await
            .unwrap();

        assert_eq!(encoded.short_key.as_str(), "abc123");
        assert_eq!(encoded.title, "stored");
        let cached = service
            .cache()
            .get(&CacheKey::long_url("https://example.com/a"))
            .await
            .unwrap();
        assert!(cached.is_some());
    }

    #[tokio::test]
    async fn distinct_urls_get_distinct_keys() {
        let service = test_service();
        let mut keys = HashSet::new();

        for i in 0..200 {
            let encoded = service
                .encode(EncodeParams::new(format!("https://example.com/{i}")))
                .await
                .unwrap();
            assert!(keys.insert(encoded.short_key));
        }
    }

    #[tokio::test]
    async fn resolve_round_trips() {
        let service = test_service();

        let encoded = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();

        let long_url = service.resolve(&encoded.short_key).await.unwrap();
        assert_eq!(long_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn resolve_unknown_key_is_not_found() {
        let service = test_service();

        let err = service
            .resolve(&ShortKey::new_unchecked("zzzzzz"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test]
    async fn resolve_after_encode_is_served_from_cache() {
        let service = test_service();
        let encoded = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();

        service.repository().set_offline(true);

        let long_url = service.resolve(&encoded.short_key).await.unwrap();
        assert_eq!(long_url, "https://example.com/a");
        let again = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();
        assert_eq!(again, encoded);
    }

    #[tokio::test]
    async fn resolve_fills_cache_on_miss() {
        let repo = TestRepository::new();
        let key = ShortKey::new_unchecked("abc123");
        repo.insert("https://example.com/a", &key, "")
            .await
            .unwrap();
        let service = ShortenerService::new(
            repo,
            MokaUrlCache::new(),
            RandomGenerator::default(),
            settings(),
        );

        service.resolve(&key).await.unwrap();
        service.repository().set_offline(true);

        let long_url = service.resolve(&key).await.unwrap();
        assert_eq!(long_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn store_outage_is_not_reported_as_not_found() {
        let service = test_service();
        service.repository().set_offline(true);

        let err = service
            .resolve(&ShortKey::new_unchecked("zzzzzz"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::StoreUnavailable(_)));

        let err = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::StoreUnavailable(_)));
        assert_eq!(service.repository().len(), 0);
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let service = ShortenerService::new(
            TestRepository::new(),
            MokaUrlCache::new(),
            RandomGenerator::default(),
            ShortenerSettings::builder()
                .real_base_url("https://r.kh.io")
                .display_base_url("https://kh.io")
                .store_timeout(Duration::from_millis(20))
                .build(),
        );
        service.repository().set_delay(Duration::from_millis(200));

        let err = service
            .resolve(&ShortKey::new_unchecked("abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn broken_cache_degrades_to_store() {
        let service = ShortenerService::new(
            TestRepository::new(),
            BrokenCache,
            RandomGenerator::default(),
            settings(),
        );

        let first = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();
        let second = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            service.resolve(&first.short_key).await.unwrap(),
            "https://example.com/a"
        );
    }

    #[tokio::test]
    async fn stalled_cache_is_bypassed() {
        let service = ShortenerService::new(
            TestRepository::new(),
            StalledCache,
            RandomGenerator::default(),
            ShortenerSettings::builder()
                .real_base_url("https://r.kh.io")
                .display_base_url("https://kh.io")
                .cache_timeout(Duration::from_millis(10))
                .build(),
        );

        let encoded = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();
        assert_eq!(
            service.resolve(&encoded.short_key).await.unwrap(),
            "https://example.com/a"
        );
    }

    #[tokio::test]
    async fn exhausted_key_space_fails_fast() {
        let repo = TestRepository::new();
        repo.insert("https://taken.example", &ShortKey::new_unchecked("x"), "")
            .await
            .unwrap();
        let service = ShortenerService::new(
            repo,
            MokaUrlCache::new(),
            single_key_generator(),
            settings(),
        );

        let err = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::ExhaustedKeySpace { attempts: 100 }
        ));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn key_taken_after_allocation_is_retried_once() {
        let repo = TestRepository::new();
        repo.insert(
            "https://taken.example",
            &ShortKey::new_unchecked("aaaaaa"),
            "",
        )
        .await
        .unwrap();
        repo.set_blind_exists(true);
        let service = ShortenerService::new(
            repo,
            MokaUrlCache::new(),
            ScriptedGenerator::new(["aaaaaa", "bbbbbb"]),
            settings(),
        );

        let encoded = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();
        assert_eq!(encoded.short_key.as_str(), "bbbbbb");
    }

    #[tokio::test]
    async fn second_conflict_is_store_unavailable() {
        let repo = TestRepository::new();
        repo.insert(
            "https://taken.example",
            &ShortKey::new_unchecked("aaaaaa"),
            "",
        )
        .await
        .unwrap();
        repo.set_blind_exists(true);
        let service = ShortenerService::new(
            repo,
            MokaUrlCache::new(),
            ScriptedGenerator::new(["aaaaaa"]),
            settings(),
        );

        let err = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::StoreUnavailable(_)));
        assert!(service
            .repository()
            .find_by_long_url("https://example.com/a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn long_url_inserted_elsewhere_is_read_back() {
        let repo = TestRepository::new();
        repo.insert(
            "https://example.com/a",
            &ShortKey::new_unchecked("winner"),
            "",
        )
        .await
        .unwrap();
        // The first lookup misses, as if another process inserted right after it.
        repo.hide_next_long_url_reads(1);
        let service = ShortenerService::new(
            repo,
            MokaUrlCache::new(),
            ScriptedGenerator::new(["loser1"]),
            settings(),
        );

        let encoded = service
            .encode(EncodeParams::new("https://example.com/a"))
            .await
            .unwrap();

        assert_eq!(encoded.short_key.as_str(), "winner");
        assert_eq!(service.repository().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_encodes_of_one_url_insert_once() {
        let service = Arc::new(test_service());
        service.repository().set_delay(Duration::from_millis(2));

        let mut handles = Vec::with_capacity(100);
        for _ in 0..100 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .encode(EncodeParams::new("http://example.com/a"))
                    .await
            }));
        }

        let mut keys = HashSet::new();
        for handle in handles {
            keys.insert(handle.await.unwrap().unwrap().short_key);
        }

        assert_eq!(keys.len(), 1);
        assert_eq!(service.repository().len(), 1);
        assert_eq!(service.repository().inserts(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn resolve_does_not_wait_for_encode_lock() {
        let service = Arc::new(test_service());
        let encoded = service
            .encode(EncodeParams::new("https://example.com/b"))
            .await
            .unwrap();

        let _held = service.locks.lock("https://example.com/a").await;

        let resolved = tokio::time::timeout(
            Duration::from_millis(500),
            service.resolve(&encoded.short_key),
        )
        .await
        .expect("resolve must not block on another url's lock")
        .unwrap();
        assert_eq!(resolved, "https://example.com/b");

        let other = tokio::time::timeout(
            Duration::from_millis(500),
            service.encode(EncodeParams::new("https://example.com/c")),
        )
        .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn list_all_in_creation_order() {
        let service = test_service();
        let urls = [
            "https://c.example",
            "https://a.example",
            "https://b.example",
        ];
        for url in urls {
            service.encode(EncodeParams::new(url)).await.unwrap();
        }

        let listed: Vec<_> = service
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.long_url)
            .collect();
        assert_eq!(listed, urls);
    }

    #[tokio::test]
    async fn empty_long_url_is_rejected() {
        let service = test_service();

        let err = service.encode(EncodeParams::new("")).await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
    }
}
