//! Greedy scanning of an input against the dictionary.

use crate::{Matched, Trie};

/// Iterator over successive longest matches in an input, see [`Trie::scan`].
///
/// Starting at offset 0, each step reports the longest registered token at the
/// current offset and resumes right after it. Offsets where nothing matches are
/// skipped one unit at a time.
#[derive(Debug, Clone)]
pub struct Scan<'t, 'i> {
    trie: &'t Trie,
    input: &'i [u16],
    offset: usize,
}

impl<'t, 'i> Scan<'t, 'i> {
    pub(crate) fn new(trie: &'t Trie, input: &'i [u16]) -> Self {
        Self {
            trie,
            input,
            offset: 0,
        }
    }

    /// Offset the next match attempt starts from.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'t> Iterator for Scan<'t, '_> {
    /// Start offset of the match and the matched token.
    type Item = (usize, Matched<'t>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.offset < self.input.len() {
            let at = self.offset;
            match self.trie.find(self.input, at) {
                Some(m) => {
                    self.offset += m.len();
                    return Some((at, m));
                }
                None => self.offset += 1,
            }
        }
        None
    }
}
