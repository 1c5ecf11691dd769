use crate::error::Error;

const BASE62: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// The set of symbols a key is drawn from.
///
/// Symbols are distinct ASCII alphanumerics so every generated key is a
/// valid [`ShortKey`](keyhole_core::ShortKey).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Box<[u8]>,
}

impl Alphabet {
    /// Digits, upper case and lower case letters.
    pub fn base62() -> Self {
        Self {
            symbols: BASE62.as_bytes().into(),
        }
    }

    /// Builds an alphabet from the given symbols.
    pub fn new(symbols: &str) -> Result<Self, Error> {
        if symbols.is_empty() {
            return Err(Error::EmptyAlphabet);
        }

        let mut seen = [false; 128];
        for c in symbols.chars() {
            if !c.is_ascii_alphanumeric() {
                return Err(Error::InvalidSymbol(c));
            }
            let slot = &mut seen[c as usize];
            if *slot {
                return Err(Error::DuplicateSymbol(c));
            }
            *slot = true;
        }

        Ok(Self {
            symbols: symbols.as_bytes().into(),
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns the symbol at `index`.
    pub(crate) fn symbol(&self, index: usize) -> char {
        self.symbols[index] as char
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::base62()
    }
}
