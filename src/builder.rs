//! Trie construction.
//!
//! Tokens are collected first and the trie is assembled in one pass by
//! [`TrieBuilder::build`]:
//!
//! 1. Every token is linked to its longest registered strict prefix. Following
//!    those links from any token visits all of its registered prefixes,
//!    longest first.
//! 2. Tokens that are a strict prefix of another token live only on fallback
//!    chains. The rest become leaves; no leaf is a prefix of another, so any
//!    two leaves differ at some bit inside both.
//! 3. A set of leaves splits at its crit bit: the lowest bit at which any two
//!    of them differ. All leaves of the set agree below that bit, which keeps
//!    bit positions strictly increasing down every path.

use std::collections::HashMap;

use smallvec::{smallvec, SmallVec};

use crate::config::Config;
use crate::error::BuildError;
use crate::weight::{NearestLeaf, TieBreak};
use crate::{bit_at, first_diff_bit, Branch, Dictionary, Leaf, Node, NodeId, TokenId, Trie};

/// Collects tokens and publishes an immutable [`Trie`].
#[derive(Debug, Clone, Default)]
pub struct TrieBuilder {
    config: Config,
    dict: Dictionary,
    index: HashMap<Vec<u16>, TokenId>,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// A run of leaves still waiting for a node.
#[derive(Clone, Copy)]
struct Pending {
    start: usize,
    end: usize,
    parent: Option<(NodeId, Side)>,
    depth: usize,
}

impl TrieBuilder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            dict: Dictionary::default(),
            index: HashMap::new(),
        }
    }

    /// Number of distinct tokens collected so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dict.len() == 0
    }

    /// Registers `token` (as UTF-16). Re-registering a token returns its
    /// existing id.
    pub fn insert(&mut self, token: &str) -> Result<TokenId, BuildError> {
        let units: SmallVec<[u16; 32]> = token.encode_utf16().collect();
        self.insert_units(&units)
    }

    pub fn insert_units(&mut self, token: &[u16]) -> Result<TokenId, BuildError> {
        if token.is_empty() {
            return Err(BuildError::EmptyToken);
        }
        let max = self.config.token_len_limit();
        if token.len() > max {
            return Err(BuildError::TokenTooLong {
                len: token.len(),
                max,
            });
        }
        if let Some(&id) = self.index.get(token) {
            return Ok(id);
        }
        if self.dict.len() >= self.config.max_tokens {
            return Err(BuildError::TooManyTokens(self.config.max_tokens));
        }

        let id = self.dict.push(token);
        self.index.insert(token.to_vec(), id);
        Ok(id)
    }

    /// Registers every token of `tokens`, stopping at the first error.
    pub fn extend<I, S>(&mut self, tokens: I) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            self.insert(token.as_ref())?;
        }
        Ok(())
    }

    /// Builds the trie with the default [`NearestLeaf`] tie-break policy.
    pub fn build(self) -> Trie {
        self.build_with(&NearestLeaf)
    }

    pub fn build_with<T: TieBreak + ?Sized>(mut self, policy: &T) -> Trie {
        let leaves = self.link_fallbacks();
        let leaf_count = leaves.len();
        let (nodes, depth) = assemble(&self.dict, leaves, policy);
        let root = (!nodes.is_empty()).then_some(NodeId::ROOT);

        self.dict.shrink_to_fit();
        tracing::debug!(
            tokens = self.dict.len(),
            leaves = leaf_count,
            nodes = nodes.len(),
            depth,
            "Built crit-bit trie"
        );

        Trie {
            dict: self.dict,
            nodes,
            root,
            depth,
        }
    }

    /// Points each token at its longest registered strict prefix and returns
    /// the tokens that are nobody's prefix, in id order.
    fn link_fallbacks(&mut self) -> Vec<TokenId> {
        let n = self.dict.len();
        let mut is_prefix = vec![false; n];

        for i in 0..n {
            let id = TokenId::new(i);
            let units = self.dict.units(id);
            let fallback = (1..units.len())
                .rev()
                .find_map(|len| self.index.get(&units[..len]).copied());
            if let Some(fallback) = fallback {
                self.dict.set_fallback(id, fallback);
                is_prefix[fallback.index()] = true;
            }
        }

        (0..n)
            .filter(|&i| !is_prefix[i])
            .map(TokenId::new)
            .collect()
    }
}

/// Lowest bit at which any two of `leaves` differ.
///
/// Differences from the first leaf suffice: if `a` and `b` first differ at
/// `p`, one of them differs from `leaves[0]` at or below `p`.
fn crit_bit(dict: &Dictionary, leaves: &[TokenId]) -> usize {
    let first = dict.units(leaves[0]);
    let bit = leaves[1..]
        .iter()
        .filter_map(|&t| first_diff_bit(first, dict.units(t)))
        .min();
    let Some(bit) = bit else {
        unreachable!("leaf tokens must be prefix-free");
    };
    bit
}

/// Lays out the trie in preorder, returning its nodes and depth.
fn assemble<T: TieBreak + ?Sized>(
    dict: &Dictionary,
    mut leaves: Vec<TokenId>,
    policy: &T,
) -> (Vec<Node>, usize) {
    if leaves.is_empty() {
        return (Vec::new(), 0);
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(2 * leaves.len() - 1);
    let mut depth = 0usize;
    let mut work: SmallVec<[Pending; 32]> = smallvec![Pending {
        start: 0,
        end: leaves.len(),
        parent: None,
        depth: 0,
    }];

    while let Some(p) = work.pop() {
        let id = NodeId::new(nodes.len());
        let run = &mut leaves[p.start..p.end];

        if run.len() == 1 {
            nodes.push(Node::Leaf(Leaf { token: run[0] }));
            depth = depth.max(p.depth);
        } else {
            let bit = crit_bit(dict, run);
            run.sort_by_key(|&t| bit_at(dict.units(t), bit));
            let mid = p.start + run.partition_point(|&t| !bit_at(dict.units(t), bit));
            debug_assert!(mid > p.start && mid < p.end);

            // Children are patched in when they are laid out.
            nodes.push(Node::Branch(Branch {
                bit: bit as u32,
                left: id,
                right: id,
                weight: 0,
            }));
            work.push(Pending {
                start: mid,
                end: p.end,
                parent: Some((id, Side::Right)),
                depth: p.depth + 1,
            });
            work.push(Pending {
                start: p.start,
                end: mid,
                parent: Some((id, Side::Left)),
                depth: p.depth + 1,
            });
        }

        if let Some((parent, side)) = p.parent {
            if let Node::Branch(b) = &mut nodes[parent.index()] {
                match side {
                    Side::Left => b.left = id,
                    Side::Right => b.right = id,
                }
            }
        }
    }

    // Preorder puts children after their parent, so a reverse sweep sees
    // both children's weights before the parent's.
    let mut weights = vec![0u32; nodes.len()];
    for i in (0..nodes.len()).rev() {
        weights[i] = match &mut nodes[i] {
            Node::Leaf(leaf) => policy.leaf(dict.units(leaf.token)),
            Node::Branch(b) => {
                b.weight = policy.branch(weights[b.left.index()], weights[b.right.index()]);
                b.weight
            }
        };
    }

    (nodes, depth)
}
