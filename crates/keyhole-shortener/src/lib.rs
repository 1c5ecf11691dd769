//! Key assignment and resolution engine.
//!
//! [`ShortenerService`] coordinates the cache, the mapping store and the
//! [`KeyAllocator`] to implement [`Shortener`](keyhole_core::Shortener).

pub mod allocator;
pub mod lock;
pub mod service;
mod timeout;

#[cfg(test)]
mod testing;

pub use allocator::KeyAllocator;
pub use lock::KeyedMutex;
pub use service::{ShortenerService, ShortenerSettings};
