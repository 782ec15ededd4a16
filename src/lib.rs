//! # critbit-prefix
//!
//! Longest-prefix token matching over a crit-bit (PATRICIA) trie keyed on the
//! bits of 16-bit code units.
//!
//! Internal nodes store only the bit positions at which dictionary tokens first
//! diverge. A query descends by reading single input bits at those positions,
//! lands on a candidate leaf, then verifies it unit by unit and walks the leaf's
//! fallback chain (its registered prefixes, longest first) until an entry is
//! fully confirmed by the input.
//!
//! ## Example
//!
//! ```rust
//! use critbit_prefix::TrieBuilder;
//!
//! let mut builder = TrieBuilder::new();
//! for token in ["free", "freely", "warrior", "warzone"] {
//!     builder.insert(token).unwrap();
//! }
//! let trie = builder.build();
//!
//! assert_eq!(trie.find_str("freely", 0).unwrap().to_string(), "freely");
//! assert_eq!(trie.find_str("freeze", 0).unwrap().to_string(), "free");
//! assert!(trie.find_str("war", 0).is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

mod builder;
mod config;
mod error;
mod observe;
mod scan;
mod weight;

pub use builder::TrieBuilder;
pub use config::Config;
pub use error::{BuildError, MatchError};
pub use observe::{MatchObserver, NoopObserver, TracingObserver};
pub use scan::Scan;
pub use weight::{LeafCount, NearestLeaf, ShortestToken, TieBreak};

use std::fmt::{self, Write as _};

use smallvec::SmallVec;

// =============================================================================
// Bit utilities
// =============================================================================

/// Addressable bits per code unit.
pub const UNIT_BITS: usize = 16;

#[inline]
fn unit_index(bit: usize) -> usize {
    bit >> 4
}

/// Bit index within its unit, where `0` is the LSB.
#[inline]
fn bit_in_unit(bit: usize) -> u32 {
    (bit & 0xF) as u32
}

/// Reads global bit `bit` of `seq`: unit `bit >> 4`, bit `bit & 0xF` counted
/// from the least-significant end.
///
/// # Panics
///
/// Panics if `bit >= bit_len(seq)`.
#[inline]
pub fn bit_at(seq: &[u16], bit: usize) -> bool {
    (seq[unit_index(bit)] >> bit_in_unit(bit)) & 1 != 0
}

/// Total addressable bits of `seq`.
#[inline]
pub fn bit_len(seq: &[u16]) -> usize {
    seq.len() * UNIT_BITS
}

/// First bit at which `a` and `b` disagree, or `None` if one is a prefix of
/// the other.
#[inline]
fn first_diff_bit(a: &[u16], b: &[u16]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .map(|i| i * UNIT_BITS + (a[i] ^ b[i]).trailing_zeros() as usize)
}

#[inline]
fn common_prefix_len(a: &[u16], b: &[u16]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Renders UTF-16 units, replacing unpaired surrogates.
struct Units<'a>(&'a [u16]);

impl fmt::Display for Units<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in char::decode_utf16(self.0.iter().copied()) {
            f.write_char(c.unwrap_or(char::REPLACEMENT_CHARACTER))?;
        }
        Ok(())
    }
}

// =============================================================================
// Token dictionary
// =============================================================================

/// Identifier of a registered token, in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(u32);

impl TokenId {
    #[inline]
    fn new(idx: usize) -> Self {
        debug_assert!(idx <= u32::MAX as usize);
        Self(idx as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    start: u32,
    len: u32,
    /// Longest registered strict prefix of this token.
    fallback: Option<TokenId>,
}

/// Token storage: one contiguous unit pool plus a span per token.
#[derive(Clone, Debug, Default)]
struct Dictionary {
    units: Vec<u16>,
    entries: Vec<Entry>,
}

impl Dictionary {
    fn push(&mut self, token: &[u16]) -> TokenId {
        let id = TokenId::new(self.entries.len());
        self.entries.push(Entry {
            start: self.units.len() as u32,
            len: token.len() as u32,
            fallback: None,
        });
        self.units.extend_from_slice(token);
        id
    }

    #[inline]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn units(&self, id: TokenId) -> &[u16] {
        let e = self.entries[id.index()];
        &self.units[e.start as usize..(e.start + e.len) as usize]
    }

    #[inline]
    fn token_len(&self, id: TokenId) -> usize {
        self.entries[id.index()].len as usize
    }

    #[inline]
    fn fallback(&self, id: TokenId) -> Option<TokenId> {
        self.entries[id.index()].fallback
    }

    fn set_fallback(&mut self, id: TokenId, fallback: TokenId) {
        debug_assert!(self.token_len(fallback) < self.token_len(id));
        self.entries[id.index()].fallback = Some(fallback);
    }

    fn shrink_to_fit(&mut self) {
        self.units.shrink_to_fit();
        self.entries.shrink_to_fit();
    }
}

/// A token resolved by a match or lookup, borrowed from its trie.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Matched<'t> {
    id: TokenId,
    units: &'t [u16],
}

impl<'t> Matched<'t> {
    #[inline]
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// The token's code units.
    #[inline]
    pub fn units(&self) -> &'t [u16] {
        self.units
    }

    /// Length in code units.
    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always `false`: registered tokens are non-empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Display for Matched<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Units(self.units), f)
    }
}

impl fmt::Debug for Matched<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matched({}, {:?})", self.id, Units(self.units).to_string())
    }
}

// =============================================================================
// Node arena
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeId(u32);

impl NodeId {
    const ROOT: NodeId = NodeId(0);

    #[inline]
    fn new(idx: usize) -> Self {
        debug_assert!(idx <= u32::MAX as usize);
        Self(idx as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug)]
struct Branch {
    /// Bit tested, relative to the match offset.
    bit: u32,
    left: NodeId,
    right: NodeId,
    /// Tie-break rank; smaller is preferred when the input runs out.
    weight: u32,
}

#[derive(Clone, Copy, Debug)]
struct Leaf {
    token: TokenId,
}

#[derive(Clone, Copy, Debug)]
enum Node {
    Branch(Branch),
    Leaf(Leaf),
}

// =============================================================================
// Trie
// =============================================================================

/// An immutable crit-bit trie over a token dictionary.
///
/// Built once with [`TrieBuilder`]; every query takes `&self` and allocates
/// nothing, so a `Trie` can be shared freely across threads.
#[derive(Clone)]
pub struct Trie {
    dict: Dictionary,
    /// Preorder: a branch always precedes its children.
    nodes: Vec<Node>,
    root: Option<NodeId>,
    depth: usize,
}

impl Trie {
    /// Number of registered tokens, fallback-only entries included.
    #[inline]
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dict.len() == 0
    }

    /// Number of leaves: tokens that are not a strict prefix of another token.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf(_)))
            .count()
    }

    /// Maximum number of branches on any root-to-leaf path. Descent never
    /// takes more steps than this.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn memory_usage(&self) -> usize {
        self.dict.units.capacity() * std::mem::size_of::<u16>()
            + self.dict.entries.capacity() * std::mem::size_of::<Entry>()
            + self.nodes.capacity() * std::mem::size_of::<Node>()
    }

    /// Looks up a registered token by id.
    pub fn token(&self, id: TokenId) -> Option<Matched<'_>> {
        (id.index() < self.dict.len()).then(|| self.matched(id))
    }

    /// All registered tokens in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Matched<'_>> + '_ {
        (0..self.dict.len()).map(|i| self.matched(TokenId::new(i)))
    }

    /// Leaf tokens in trie order, left to right.
    pub fn leaves(&self) -> Leaves<'_> {
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push(root);
        }
        Leaves { trie: self, stack }
    }

    /// The fallback chain of `id`: the token itself, then each shorter
    /// registered prefix, longest first.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued for this trie.
    pub fn fallbacks(&self, id: TokenId) -> Fallbacks<'_> {
        assert!(id.index() < self.dict.len(), "unknown token id {id}");
        Fallbacks {
            trie: self,
            next: Some(id),
        }
    }

    /// Whether `token` is registered exactly.
    pub fn contains(&self, token: &[u16]) -> bool {
        self.find(token, 0).is_some_and(|m| m.len() == token.len())
    }

    pub fn contains_str(&self, token: &str) -> bool {
        let units: SmallVec<[u16; 64]> = token.encode_utf16().collect();
        self.contains(&units)
    }

    /// Longest registered token that is a prefix of `input[offset..]`.
    ///
    /// # Panics
    ///
    /// Panics if `offset > input.len()`; see [`Trie::try_find`] for a
    /// non-panicking variant.
    pub fn find(&self, input: &[u16], offset: usize) -> Option<Matched<'_>> {
        self.find_observed(input, offset, &mut NoopObserver)
    }

    pub fn try_find(&self, input: &[u16], offset: usize) -> Result<Option<Matched<'_>>, MatchError> {
        if offset > input.len() {
            return Err(MatchError::OffsetOutOfBounds {
                offset,
                len: input.len(),
            });
        }
        Ok(self.find_unchecked(input, offset, &mut NoopObserver))
    }

    /// [`Trie::find`] over a string; `offset` counts UTF-16 code units.
    pub fn find_str(&self, input: &str, offset: usize) -> Option<Matched<'_>> {
        let units: SmallVec<[u16; 64]> = input.encode_utf16().collect();
        self.find(&units, offset)
    }

    /// [`Trie::find`], reporting each step of the match to `observer`.
    pub fn find_observed<O: MatchObserver + ?Sized>(
        &self,
        input: &[u16],
        offset: usize,
        observer: &mut O,
    ) -> Option<Matched<'_>> {
        assert!(
            offset <= input.len(),
            "offset {offset} out of bounds for input of {} units",
            input.len()
        );
        self.find_unchecked(input, offset, observer)
    }

    /// Greedy leftmost-longest scan over `input`; unmatched units are skipped.
    pub fn scan<'t, 'i>(&'t self, input: &'i [u16]) -> Scan<'t, 'i> {
        Scan::new(self, input)
    }

    fn find_unchecked<O: MatchObserver + ?Sized>(
        &self,
        input: &[u16],
        offset: usize,
        observer: &mut O,
    ) -> Option<Matched<'_>> {
        let root = self.root?;
        let stop = self.descend(root, input, offset, observer);
        let candidate = match self.nodes[stop.index()] {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => self.resolve_leaf(stop),
        };
        let found = self.verify(candidate, input, offset, observer);
        observer.on_result(found.map(|m| m.units));
        found
    }

    /// Follows input bits from `root` until a leaf, or until the next branch
    /// tests a bit past the end of the input (that branch is returned).
    fn descend<O: MatchObserver + ?Sized>(
        &self,
        root: NodeId,
        input: &[u16],
        offset: usize,
        observer: &mut O,
    ) -> NodeId {
        let bit_limit = bit_len(input);
        let bit_offset = offset * UNIT_BITS;
        let mut current = root;
        loop {
            match self.nodes[current.index()] {
                Node::Leaf(_) => return current,
                Node::Branch(b) => {
                    let abs = b.bit as usize + bit_offset;
                    if abs >= bit_limit {
                        observer.on_exhausted(b.bit);
                        return current;
                    }
                    let right = bit_at(input, abs);
                    observer.on_branch(b.bit, right);
                    current = if right { b.right } else { b.left };
                }
            }
        }
    }

    /// Moves from `from` toward the nearest leaf: an immediate leaf child wins
    /// (left first), otherwise the lighter child branch (left on ties).
    fn resolve_leaf(&self, from: NodeId) -> Leaf {
        let mut current = from;
        loop {
            let b = match self.nodes[current.index()] {
                Node::Leaf(leaf) => return leaf,
                Node::Branch(b) => b,
            };
            current = match (self.nodes[b.left.index()], self.nodes[b.right.index()]) {
                (Node::Leaf(leaf), _) | (_, Node::Leaf(leaf)) => return leaf,
                (Node::Branch(l), Node::Branch(r)) => {
                    if r.weight < l.weight {
                        b.right
                    } else {
                        b.left
                    }
                }
            };
        }
    }

    /// Confirms `candidate` against the input unit by unit, then returns the
    /// first chain entry no longer than the confirmed prefix.
    fn verify<O: MatchObserver + ?Sized>(
        &self,
        candidate: Leaf,
        input: &[u16],
        offset: usize,
        observer: &mut O,
    ) -> Option<Matched<'_>> {
        let token = self.dict.units(candidate.token);
        observer.on_candidate(token);
        let matched_len = common_prefix_len(&input[offset..], token);
        observer.on_verified(matched_len);
        self.fallbacks(candidate.token)
            .find(|m| m.len() <= matched_len)
    }

    #[inline]
    fn matched(&self, id: TokenId) -> Matched<'_> {
        Matched {
            id,
            units: self.dict.units(id),
        }
    }

    fn leftmost_leaf(&self, mut id: NodeId) -> TokenId {
        loop {
            match self.nodes[id.index()] {
                Node::Leaf(leaf) => return leaf.token,
                Node::Branch(b) => id = b.left,
            }
        }
    }

    fn rightmost_leaf(&self, mut id: NodeId) -> TokenId {
        loop {
            match self.nodes[id.index()] {
                Node::Leaf(leaf) => return leaf.token,
                Node::Branch(b) => id = b.right,
            }
        }
    }
}

/// Renders a subtree as nested `(bit, 'leftmost', 'rightmost')` branches.
struct NodeView<'a> {
    trie: &'a Trie,
    id: NodeId,
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.trie;
        match t.nodes[self.id.index()] {
            Node::Leaf(leaf) => {
                let mut tuple = f.debug_tuple("Leaf");
                for m in t.fallbacks(leaf.token) {
                    tuple.field(&format_args!("{:?}", m.to_string()));
                }
                tuple.finish()
            }
            Node::Branch(b) => f
                .debug_struct("Branch")
                .field(
                    "span",
                    &format_args!(
                        "({}, '{}', '{}')",
                        b.bit,
                        Units(t.dict.units(t.leftmost_leaf(self.id))),
                        Units(t.dict.units(t.rightmost_leaf(self.id)))
                    ),
                )
                .field("weight", &b.weight)
                .field("left", &NodeView { trie: t, id: b.left })
                .field("right", &NodeView { trie: t, id: b.right })
                .finish(),
        }
    }
}

impl fmt::Debug for Trie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Trie");
        s.field("tokens", &self.len()).field("depth", &self.depth);
        match self.root {
            Some(root) => s.field("root", &NodeView { trie: self, id: root }),
            None => s.field("root", &format_args!("None")),
        };
        s.finish()
    }
}

/// Iterator over a token's fallback chain, see [`Trie::fallbacks`].
#[derive(Debug)]
pub struct Fallbacks<'a> {
    trie: &'a Trie,
    next: Option<TokenId>,
}

impl<'a> Iterator for Fallbacks<'a> {
    type Item = Matched<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.trie.dict.fallback(id);
        Some(self.trie.matched(id))
    }
}

/// Iterator over leaf tokens, see [`Trie::leaves`].
#[derive(Debug)]
pub struct Leaves<'a> {
    trie: &'a Trie,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = Matched<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            match self.trie.nodes[id.index()] {
                Node::Leaf(leaf) => return Some(self.trie.matched(leaf.token)),
                Node::Branch(b) => {
                    self.stack.push(b.right);
                    self.stack.push(b.left);
                }
            }
        }
        None
    }
}


#[cfg(test)]
mod proptests;
