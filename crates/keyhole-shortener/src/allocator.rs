use crate::timeout::store_call;
use keyhole_core::{ReadRepository, ShortKey, ShortenerError};
use keyhole_generator::Generator;
use std::time::Duration;
use tracing::{debug, error};

/// Default cap on candidates tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Finds a short key that is not yet taken in the store.
///
/// Each attempt draws a candidate from the generator and checks it against
/// the store. The check and the later insert are not atomic; a key taken in
/// between is caught by the store's uniqueness constraint on insert.
#[derive(Debug, Clone)]
pub struct KeyAllocator<G> {
    generator: G,
    max_attempts: u32,
}

impl<G: Generator> KeyAllocator<G> {
    pub fn new(generator: G, max_attempts: u32) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns a key that was free in `repository` when checked.
    ///
    /// Fails with `ExhaustedKeySpace` after `max_attempts` taken candidates,
    /// or `StoreUnavailable` if an existence check fails or exceeds `timeout`.
    pub async fn allocate<R: ReadRepository>(
        &self,
        repository: &R,
        timeout: Duration,
    ) -> Result<ShortKey, ShortenerError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.generator.generate();
            let lookup = repository.exists(&candidate);
            let taken = store_call(timeout, "short key lookup", lookup).await?;

            if !taken {
                return Ok(candidate);
            }
            debug!(short_key = %candidate, attempt, "Candidate short key already taken");
        }

        error!(
            attempts = self.max_attempts,
            "No free short key found; widen the alphabet or key length"
        );
        Err(ShortenerError::ExhaustedKeySpace {
            attempts: self.max_attempts,
        })
    }
}
