//! Cache adapters for Keyhole.
//!
//! Every adapter implements [`UrlCache`] over the two namespaced key
//! families defined by [`CacheKey`]; swapping backends needs no other
//! coordination.

pub mod layered;
pub mod moka;
pub mod noop;
pub mod redis;

pub use self::moka::{CacheConfig, MokaUrlCache};
pub use self::redis::RedisUrlCache;
pub use keyhole_core::{CacheError, CacheKey, UrlCache};
pub use layered::LayeredCache;
pub use noop::NoopCache;
