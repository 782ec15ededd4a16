//! Error types for trie construction and matching.

use thiserror::Error;

/// Errors that can occur while building a trie.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Tokens must contain at least one code unit.
    #[error("empty token")]
    EmptyToken,

    /// Token exceeds the configured maximum length (in code units).
    #[error("token of {len} units exceeds maximum of {max}")]
    TokenTooLong { len: usize, max: usize },

    /// Maximum dictionary size exceeded.
    #[error("maximum tokens exceeded ({0})")]
    TooManyTokens(usize),
}

/// Errors that can occur when matching.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// Match offset lies past the end of the input.
    #[error("offset {offset} out of bounds for input of {len} units")]
    OffsetOutOfBounds { offset: usize, len: usize },
}
