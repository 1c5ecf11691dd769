use thiserror::Error;

/// Errors returned when configuring a generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("alphabet must not be empty")]
    EmptyAlphabet,
    #[error("alphabet may only contain ascii alphanumerics, got {0:?}")]
    InvalidSymbol(char),
    #[error("alphabet contains {0:?} more than once")]
    DuplicateSymbol(char),
    #[error("key length must be between 1 and {max}, got {length}")]
    InvalidLength { length: usize, max: usize },
}
