use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

fn validate_trie(t: &Trie) {
    let mut leaves: Vec<TokenId> = Vec::new();
    let mut visited = 0usize;
    let mut max_depth = 0usize;

    if let Some(root) = t.root {
        assert_eq!(root, NodeId::ROOT, "root must be the first node");
        // (node, depth, bit of the parent branch)
        let mut stack: Vec<(NodeId, usize, Option<u32>)> = vec![(root, 0, None)];
        while let Some((id, depth, parent_bit)) = stack.pop() {
            visited += 1;
            match t.nodes[id.index()] {
                Node::Leaf(leaf) => {
                    max_depth = max_depth.max(depth);
                    leaves.push(leaf.token);
                }
                Node::Branch(b) => {
                    if let Some(parent_bit) = parent_bit {
                        assert!(b.bit > parent_bit, "bit positions must increase");
                    }
                    assert!(b.left.index() > id.index() && b.right.index() > id.index());

                    let left: Vec<TokenId> = t.leaves_under(b.left);
                    let right: Vec<TokenId> = t.leaves_under(b.right);
                    let bit = b.bit as usize;
                    for &token in left.iter().chain(&right) {
                        let units = t.dict.units(token);
                        assert!(bit < bit_len(units), "branch bit past the end of a leaf");
                        // Every leaf below agrees with the others below `bit`.
                        let first = t.dict.units(left[0]);
                        if let Some(diff) = first_diff_bit(first, units) {
                            assert!(diff >= bit, "leaves below a branch disagree above it");
                        }
                    }
                    assert!(left.iter().all(|&l| !bit_at(t.dict.units(l), bit)));
                    assert!(right.iter().all(|&r| bit_at(t.dict.units(r), bit)));

                    stack.push((b.right, depth + 1, Some(b.bit)));
                    stack.push((b.left, depth + 1, Some(b.bit)));
                }
            }
        }
    }

    assert_eq!(visited, t.nodes.len(), "every node must be reachable once");
    assert_eq!(max_depth, t.depth, "stored depth must match the deepest leaf");

    // Leaves are exactly the tokens that prefix no other token.
    let all: Vec<&[u16]> = (0..t.len()).map(|i| t.dict.units(TokenId::new(i))).collect();
    let mut expected: Vec<TokenId> = (0..t.len())
        .map(TokenId::new)
        .filter(|&id| {
            let u = t.dict.units(id);
            !all.iter().any(|o| o.len() > u.len() && o.starts_with(u))
        })
        .collect();
    leaves.sort();
    expected.sort();
    assert_eq!(leaves, expected, "leaf set must be the prefix-free tokens");

    // Chains are strictly shrinking prefixes covering every registered prefix.
    for i in 0..t.len() {
        let id = TokenId::new(i);
        let chain: Vec<&[u16]> = t.fallbacks(id).map(|m| m.units()).collect();
        for pair in chain.windows(2) {
            assert!(pair[1].len() < pair[0].len());
            assert!(pair[0].starts_with(pair[1]));
        }
        let prefixes = all
            .iter()
            .filter(|o| o.len() < chain[0].len() && chain[0].starts_with(o))
            .count();
        assert_eq!(chain.len(), prefixes + 1, "chain must list every registered prefix");
    }
}

impl Trie {
    fn leaves_under(&self, id: NodeId) -> Vec<TokenId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            match self.nodes[id.index()] {
                Node::Leaf(leaf) => out.push(leaf.token),
                Node::Branch(b) => {
                    stack.push(b.right);
                    stack.push(b.left);
                }
            }
        }
        out
    }
}

/// Longest token of `dict` that is a prefix of `input[offset..]`.
fn oracle<'a>(dict: &'a BTreeSet<Vec<u16>>, input: &[u16], offset: usize) -> Option<&'a [u16]> {
    dict.iter()
        .filter(|t| input[offset..].starts_with(t))
        .max_by_key(|t| t.len())
        .map(Vec::as_slice)
}

fn token_strategy() -> impl Strategy<Value = Vec<u16>> + Clone {
    // A narrow alphabet produces many shared prefixes; the wide one exercises
    // high bits of each unit.
    prop_oneof![
        3 => prop::collection::vec(0x61u16..=0x64, 1..=6),
        1 => prop::collection::vec(any::<u16>(), 1..=4),
    ]
}

fn dict_strategy() -> impl Strategy<Value = BTreeSet<Vec<u16>>> {
    prop::collection::btree_set(token_strategy(), 0..=48)
}

#[derive(Debug, Clone, Arbitrary)]
struct Query {
    #[proptest(strategy = "prop::collection::vec(0x61u16..=0x64, 0..=10)")]
    input: Vec<u16>,
    offset: prop::sample::Index,
}

impl Query {
    fn offset(&self) -> usize {
        self.offset.index(self.input.len() + 1)
    }
}

fn build(dict: &BTreeSet<Vec<u16>>, policy: &dyn TieBreak) -> Trie {
    let mut b = TrieBuilder::with_config(Config::permissive());
    for token in dict {
        b.insert_units(token).unwrap();
    }
    b.build_with(policy)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_structure_is_valid(dict in dict_strategy()) {
        let t = build(&dict, &NearestLeaf);
        prop_assert_eq!(t.len(), dict.len());
        validate_trie(&t);
    }

    #[test]
    fn prop_equivalence_with_oracle(
        dict in dict_strategy(),
        queries in prop::collection::vec(any::<Query>(), 1..=64),
    ) {
        let policies: [&dyn TieBreak; 3] = [&NearestLeaf, &LeafCount, &ShortestToken];
        for policy in policies {
            let t = build(&dict, policy);
            for q in &queries {
                let offset = q.offset();
                let got = t.find(&q.input, offset);
                if let Some(m) = got {
                    // Exactness: the token sits at `offset` in the input.
                    prop_assert_eq!(&q.input[offset..offset + m.len()], m.units());
                }
                prop_assert_eq!(got.map(|m| m.units()), oracle(&dict, &q.input, offset));
            }
        }
    }

    #[test]
    fn prop_registered_tokens_match_themselves(dict in dict_strategy()) {
        let t = build(&dict, &NearestLeaf);
        for token in &dict {
            let m = t.find(token, 0);
            prop_assert_eq!(m.map(|m| m.units()), Some(token.as_slice()));
            prop_assert!(t.contains(token));
        }
    }

    #[test]
    fn prop_exhausted_resolution_is_deterministic(
        dict in dict_strategy(),
        queries in prop::collection::vec(any::<Query>(), 1..=32),
    ) {
        let t = build(&dict, &NearestLeaf);
        for q in &queries {
            let offset = q.offset();
            let first = t.find(&q.input, offset).map(|m| m.id());
            for _ in 0..3 {
                prop_assert_eq!(t.find(&q.input, offset).map(|m| m.id()), first);
            }
        }
    }

    #[test]
    fn prop_offset_at_end_never_matches(dict in dict_strategy(), q in any::<Query>()) {
        let t = build(&dict, &NearestLeaf);
        prop_assert!(t.find(&q.input, q.input.len()).is_none());
        prop_assert!(t.try_find(&q.input, q.input.len() + 1).is_err());
    }

    #[test]
    fn prop_scan_is_oracle_greedy(dict in dict_strategy(), q in any::<Query>()) {
        let t = build(&dict, &NearestLeaf);
        let got: Vec<(usize, &[u16])> = t.scan(&q.input).map(|(at, m)| (at, m.units())).collect();

        let mut expected = Vec::new();
        let mut offset = 0;
        while offset < q.input.len() {
            match oracle(&dict, &q.input, offset) {
                Some(m) => {
                    expected.push((offset, m));
                    offset += m.len();
                }
                None => offset += 1,
            }
        }
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let tokens = ["free", "freely", "freeze", "war", "warrior", "warzone"];
    let inputs = ["freely", "freeze", "freedom", "fre", "war", "warrior", "warzones", "wa", ""];

    let mut reference: Option<Vec<Option<String>>> = None;
    for_each_permutation(&tokens, |perm| {
        let mut b = TrieBuilder::new();
        b.extend(perm).unwrap();
        let t = b.build();
        validate_trie(&t);

        let answers: Vec<Option<String>> = inputs
            .iter()
            .map(|s| t.find_str(s, 0).map(|m| m.to_string()))
            .collect();
        let first = reference.get_or_insert_with(|| answers.clone());
        assert_eq!(&answers, first, "answers must not depend on insert order");
    });

    let expected: Vec<Option<String>> = [
        Some("freely"),
        Some("freeze"),
        Some("free"),
        None,
        Some("war"),
        Some("warrior"),
        Some("warzone"),
        None,
        None,
    ]
    .iter()
    .map(|s| s.map(str::to_string))
    .collect();
    assert_eq!(reference, Some(expected));
}
