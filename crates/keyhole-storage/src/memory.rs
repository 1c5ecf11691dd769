use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use keyhole_core::repository::{ReadRepository, Repository, Result};
use keyhole_core::{ShortKey, StorageError, UrlMapping};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// A stored mapping tagged with its insertion order.
#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    mapping: UrlMapping,
}

/// In-memory implementation of the Repository trait using DashMap.
///
/// Both uniqueness constraints are enforced on insert: the long URL slot is
/// reserved first, then the short key slot, and both shard locks are held
/// until the row is written. Every insert takes them in that order.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    by_short_key: DashMap<ShortKey, Stored>,
    by_long_url: DashMap<String, ShortKey>,
    next_seq: AtomicU64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored mappings.
    pub fn len(&self) -> usize {
        self.by_short_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_short_key.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<UrlMapping>> {
        // Copy the key out so no guard on `by_long_url` is held while reading
        // `by_short_key`.
        let Some(key) = self.by_long_url.get(long_url).map(|key| key.clone()) else {
            return Ok(None);
        };

        Ok(self
            .by_short_key
            .get(&key)
            .map(|stored| stored.mapping.clone()))
    }

    async fn find_by_short_key(&self, key: &ShortKey) -> Result<Option<UrlMapping>> {
        Ok(self
            .by_short_key
            .get(key)
            .map(|stored| stored.mapping.clone()))
    }

    async fn exists(&self, key: &ShortKey) -> Result<bool> {
        Ok(self.by_short_key.contains_key(key))
    }

    async fn list_all(&self) -> Result<Vec<UrlMapping>> {
        let mut rows: Vec<Stored> = self
            .by_short_key
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|stored| stored.seq);
        Ok(rows.into_iter().map(|stored| stored.mapping).collect())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, long_url: &str, key: &ShortKey, title: &str) -> Result<UrlMapping> {
        let long_slot = match self.by_long_url.entry(long_url.to_owned()) {
            Entry::Occupied(_) => {
                return Err(StorageError::DuplicateLongUrl(long_url.to_owned()));
            }
            Entry::Vacant(slot) => slot,
        };

        let key_slot = match self.by_short_key.entry(key.clone()) {
            Entry::Occupied(_) => return Err(StorageError::DuplicateKey(key.to_string())),
            Entry::Vacant(slot) => slot,
        };

        let mapping = UrlMapping {
            long_url: long_url.to_owned(),
            short_key: key.clone(),
            title: title.to_owned(),
        };
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        // Short key first: a reader that finds the long URL always finds its row.
        key_slot.insert(Stored {
            seq,
            mapping: mapping.clone(),
        });
        long_slot.insert(key.clone());

        trace!(short_key = %key, seq, "Inserted mapping");
        Ok(mapping)
    }
}
