//! Tie-break weights.
//!
//! When the input runs out before descent reaches a leaf, leaf resolution walks
//! toward the child branch with the smaller weight. The weights are computed
//! bottom-up once, at build time, by a [`TieBreak`] policy.

/// Policy assigning a weight to every node of a trie under construction.
pub trait TieBreak {
    /// Weight of a leaf holding `token`.
    fn leaf(&self, token: &[u16]) -> u32;

    /// Weight of a branch whose children weigh `left` and `right`.
    fn branch(&self, left: u32, right: u32) -> u32;
}

/// Distance (in branches) to the closest leaf. Resolution reaches a leaf in
/// the fewest steps. This is the default policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestLeaf;

impl TieBreak for NearestLeaf {
    fn leaf(&self, _token: &[u16]) -> u32 {
        0
    }

    fn branch(&self, left: u32, right: u32) -> u32 {
        left.min(right).saturating_add(1)
    }
}

/// Number of leaves below the node; resolution favors sparse subtrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeafCount;

impl TieBreak for LeafCount {
    fn leaf(&self, _token: &[u16]) -> u32 {
        1
    }

    fn branch(&self, left: u32, right: u32) -> u32 {
        left.saturating_add(right)
    }
}

/// Length of the shortest token below the node; resolution favors subtrees
/// holding short tokens, which a short input is more likely to confirm.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortestToken;

impl TieBreak for ShortestToken {
    fn leaf(&self, token: &[u16]) -> u32 {
        token.len() as u32
    }

    fn branch(&self, left: u32, right: u32) -> u32 {
        left.min(right)
    }
}
