use crate::alphabet::Alphabet;
use crate::error::Error;
use crate::Generator;
use keyhole_core::ShortKey;
use rand::Rng;
use typed_builder::TypedBuilder;

const DEFAULT_LENGTH: usize = 6;
const MAX_LENGTH: usize = 32;

/// Configures a [`RandomGenerator`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomGeneratorSettings {
    /// Symbols keys are drawn from.
    #[builder(default)]
    pub alphabet: Alphabet,
    /// Number of symbols per key.
    #[builder(default = DEFAULT_LENGTH)]
    pub length: usize,
}

impl Default for RandomGeneratorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Draws fixed-length keys uniformly at random from an alphabet.
///
/// Uses the thread-local, OS-seeded RNG. With the default base62 alphabet and
/// length 6 there are 62^6 (about 56.8 billion) possible keys.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    alphabet: Alphabet,
    length: usize,
}

impl RandomGenerator {
    pub fn new(settings: RandomGeneratorSettings) -> Result<Self, Error> {
        if settings.length == 0 || settings.length > MAX_LENGTH {
            return Err(Error::InvalidLength {
                length: settings.length,
                max: MAX_LENGTH,
            });
        }

        Ok(Self {
            alphabet: settings.alphabet,
            length: settings.length,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of distinct keys this generator can produce, if it fits in a `u128`.
    pub fn key_space(&self) -> Option<u128> {
        let length = u32::try_from(self.length).ok()?;
        (self.alphabet.len() as u128).checked_pow(length)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::base62(),
            length: DEFAULT_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortKey {
        let mut rng = rand::rng();
        let key: String = (0..self.length)
            .map(|_| rng.random_range(0..self.alphabet.len()))
            .map(|index| self.alphabet.symbol(index))
            .collect();
        ShortKey::new_unchecked(key)
    }
}
