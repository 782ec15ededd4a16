//! Builder configuration.

/// Hard ceiling on token length: every bit position of a token must fit a `u32`.
pub(crate) const TOKEN_LEN_CEILING: usize = (u32::MAX / 16) as usize;

/// Limits applied while collecting tokens into a [`TrieBuilder`](crate::TrieBuilder).
///
/// The trie targets small, hand-curated dictionaries; these limits keep a
/// runaway token source from producing an arbitrarily deep structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of distinct tokens (leaves plus fallback-only entries).
    pub max_tokens: usize,
    /// Maximum token length in 16-bit code units.
    pub max_token_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            max_token_len: 256,
        }
    }
}

impl Config {
    pub fn new(max_tokens: usize, max_token_len: usize) -> Self {
        Self {
            max_tokens,
            max_token_len: max_token_len.min(TOKEN_LEN_CEILING),
        }
    }

    /// Limits large enough for generated dictionaries in tests and benchmarks.
    pub fn permissive() -> Self {
        Self::new(1 << 20, 4096)
    }

    #[inline]
    pub(crate) fn token_len_limit(&self) -> usize {
        self.max_token_len.min(TOKEN_LEN_CEILING)
    }
}
