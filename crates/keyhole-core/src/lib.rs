//! Core types and traits for the Keyhole URL shortener.
//!
//! This crate provides the vocabulary shared by the key generator, the
//! storage and cache adapters, the shortening coordinator and the gateway.

pub mod cache;
pub mod error;
pub mod repository;
pub mod shortener;
pub mod shortkey;

pub use cache::{CacheKey, UrlCache};
pub use error::{CacheError, ShortenerError, StorageError};
pub use repository::{ReadRepository, Repository, UrlMapping};
pub use shortener::{EncodeParams, Encoded, Shortener};
pub use shortkey::ShortKey;
