//! Mapping store adapters for Keyhole.

pub mod memory;
pub mod mysql;

pub use keyhole_core::{ReadRepository, Repository, StorageError, UrlMapping};
pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
