//! Observation hooks for the matching algorithm.
//!
//! The matcher never logs on its own. Callers that want to see a match unfold
//! pass a [`MatchObserver`] to [`Trie::find_observed`](crate::Trie::find_observed).

use crate::Units;

/// Callbacks invoked at each step of a match. Every method defaults to a no-op.
pub trait MatchObserver {
    /// Descent tested `bit` (relative to the match offset) and followed the
    /// right child if `right`, the left child otherwise.
    fn on_branch(&mut self, _bit: u32, _right: bool) {}

    /// The input ran out before the branch testing `bit` could be decided.
    fn on_exhausted(&mut self, _bit: u32) {}

    /// Descent (and leaf resolution, if needed) settled on `token`.
    fn on_candidate(&mut self, _token: &[u16]) {}

    /// Unit-by-unit verification confirmed `matched_len` leading units.
    fn on_verified(&mut self, _matched_len: usize) {}

    /// Final outcome of the match.
    fn on_result(&mut self, _token: Option<&[u16]>) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {}

/// Observer that emits each step as a `tracing` event at TRACE level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn on_branch(&mut self, bit: u32, right: bool) {
        tracing::trace!(bit, right, "Branch");
    }

    fn on_exhausted(&mut self, bit: u32) {
        tracing::trace!(bit, "Input exhausted before branch");
    }

    fn on_candidate(&mut self, token: &[u16]) {
        tracing::trace!(token = %Units(token), "Candidate leaf");
    }

    fn on_verified(&mut self, matched_len: usize) {
        tracing::trace!(matched_len, "Verified prefix");
    }

    fn on_result(&mut self, token: Option<&[u16]>) {
        match token {
            Some(token) => tracing::trace!(token = %Units(token), "Found"),
            None => tracing::trace!("Not found"),
        }
    }
}
