pub mod alphabet;
pub mod error;
pub mod random;

pub use alphabet::Alphabet;
pub use error::Error;
pub use random::{RandomGenerator, RandomGeneratorSettings};

use keyhole_core::ShortKey;

/// Trait for generating candidate short keys.
///
/// Implementations are pure generators that don't interact with storage.
/// Candidates are not guaranteed unique; the allocator checks them against
/// the store before use.
pub trait Generator: Send + Sync + 'static {
    /// Produces the next candidate key.
    fn generate(&self) -> ShortKey;
}
