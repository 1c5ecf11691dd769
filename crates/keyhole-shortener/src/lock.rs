use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A table of async mutexes, one per key.
///
/// Holders of different keys never wait on each other. An entry lives only
/// while someone holds or waits for its lock, so the table does not grow
/// with the number of distinct keys ever locked.
#[derive(Debug, Default)]
pub struct KeyedMutex {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the lock for `key` is free and takes it.
    ///
    /// Dropping the returned future while it waits leaves no entry behind.
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        // Cloned under the shard lock, so the release path below never drops
        // an entry someone is about to wait on.
        let mutex = self
            .locks
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let ticket = Ticket {
            table: &self.locks,
            key: key.to_owned(),
            mutex: Some(Arc::clone(&mutex)),
        };
        // Declared after the ticket so a cancelled wait drops it first.
        let acquire = mutex.lock_owned();
        let guard = acquire.await;

        KeyedGuard {
            _guard: guard,
            _ticket: ticket,
        }
    }

    /// Number of keys currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// One reference to a key's mutex, taken while waiting for or holding it.
#[derive(Debug)]
struct Ticket<'a> {
    table: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    mutex: Option<Arc<Mutex<()>>>,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        // Release first, then check; concurrent drops cannot both miss.
        drop(self.mutex.take());
        // Only the table's reference left: nobody holds or waits for this key.
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Holds the lock for one key until dropped.
#[derive(Debug)]
pub struct KeyedGuard<'a> {
    // Fields drop in order: the lock is released before the ticket.
    _guard: OwnedMutexGuard<()>,
    _ticket: Ticket<'a>,
}
