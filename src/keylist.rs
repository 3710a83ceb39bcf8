// HD wallet core: key derivation, address codecs & gap-limit accounts.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::{self, Debug, Formatter};

use derive::{DeriveError, HdPublicKey, NormalIndex, Xpub};

/// Derives keys at successive normal indexes of some root.
pub trait DeriveChild {
    type Child;

    fn derive_child(&self, index: NormalIndex) -> Result<Self::Child, DeriveError>;
}

impl DeriveChild for Xpub {
    type Child = HdPublicKey;

    fn derive_child(&self, index: NormalIndex) -> Result<HdPublicKey, DeriveError> {
        self.child_pubkey(index).map(|key| HdPublicKey::new(index, key))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum GapLimitError {
    /// gap limit must be at least 1.
    ZeroGapLimit,

    /// key {requested} can't be generated since the next unfilled index is
    /// {next}.
    OutOfSequence {
        requested: NormalIndex,
        next: NormalIndex,
    },

    /// all normal indexes are already used by the list.
    IndexExhausted,

    #[display(inner)]
    #[from]
    Derive(DeriveError),
}

/// Ordered list of keys derived from a single root with a lookahead window of
/// `gap_limit` keys past the last used one.
///
/// Entries always occupy indexes `0..len` without gaps; the list only grows.
pub struct GapLimitList<S: DeriveChild> {
    source: S,
    gap_limit: u32,
    entries: Vec<S::Child>,
}

impl<S: DeriveChild + Debug> Debug for GapLimitList<S>
where S::Child: Debug
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapLimitList")
            .field("source", &self.source)
            .field("gap_limit", &self.gap_limit)
            .field("entries", &self.entries)
            .finish()
    }
}

impl<S: DeriveChild> GapLimitList<S> {
    pub fn new(source: S, gap_limit: u32) -> Result<Self, GapLimitError> {
        if gap_limit == 0 {
            return Err(GapLimitError::ZeroGapLimit);
        }
        Ok(GapLimitList {
            source,
            gap_limit,
            entries: vec![],
        })
    }

    pub fn source(&self) -> &S { &self.source }

    pub fn gap_limit(&self) -> u32 { self.gap_limit }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn entries(&self) -> &[S::Child] { &self.entries }

    pub fn get(&self, index: NormalIndex) -> Option<&S::Child> {
        self.entries.get(index.index() as usize)
    }

    /// Index of the next key to be generated.
    pub fn next_index(&self) -> Result<NormalIndex, GapLimitError> {
        u32::try_from(self.entries.len())
            .ok()
            .and_then(|n| NormalIndex::try_from_index(n).ok())
            .ok_or(GapLimitError::IndexExhausted)
    }

    /// Exclusive end of the window `0..=max_used + gap_limit`.
    fn window_end(&self, max_used: Option<NormalIndex>) -> u64 {
        max_used.map_or(0, |idx| idx.index() as u64 + 1) + self.gap_limit as u64
    }

    /// Derives and appends the key at `index`, which must be the next unfilled
    /// one.
    pub fn generate_key(&mut self, index: NormalIndex) -> Result<&S::Child, GapLimitError> {
        let next = self.next_index()?;
        if index != next {
            return Err(GapLimitError::OutOfSequence {
                requested: index,
                next,
            });
        }
        log::debug!("generating key index {index}");
        let child = self.source.derive_child(index)?;
        self.entries.push(child);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Extends the list so it covers every index up to and including
    /// `max_used + gap_limit`, where `None` stands for no used keys at all.
    ///
    /// Returns the newly generated entries; the slice is empty if the window
    /// was already covered.
    pub fn generate_gap(
        &mut self,
        max_used: Option<NormalIndex>,
    ) -> Result<&[S::Child], GapLimitError> {
        let start = self.entries.len();
        let end = self.window_end(max_used).min(NormalIndex::MAX.index() as u64 + 1);
        for n in start as u64..end {
            // `end` is clamped to the normal range
            let index = NormalIndex::try_from_index(n as u32)
                .map_err(|_| GapLimitError::IndexExhausted)?;
            self.generate_key(index)?;
        }
        Ok(&self.entries[start..])
    }

    /// Detects whether `index` lies past the lookahead window of `max_used`.
    pub fn is_beyond_limit(&self, index: NormalIndex, max_used: Option<NormalIndex>) -> bool {
        index.index() as u64 >= self.window_end(max_used)
    }

    /// Highest index whose entry satisfies `is_used`.
    pub fn max_used(&self, mut is_used: impl FnMut(&S::Child) -> bool) -> Option<NormalIndex> {
        self.entries
            .iter()
            .rposition(|child| is_used(child))
            .and_then(|pos| NormalIndex::try_from_index(pos as u32).ok())
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::*;

    /// Derivation stub returning the index, failing at a single index.
    struct Counter {
        calls: Cell<u32>,
        fail_at: Option<u32>,
    }

    impl Counter {
        fn new() -> Self {
            Counter {
                calls: Cell::new(0),
                fail_at: None,
            }
        }
    }

    impl DeriveChild for Counter {
        type Child = u32;

        fn derive_child(&self, index: NormalIndex) -> Result<u32, DeriveError> {
            self.calls.set(self.calls.get() + 1);
            if Some(index.index()) == self.fail_at {
                return Err(DeriveError::InvalidChild(index.into()));
            }
            Ok(index.index())
        }
    }

    fn idx(n: u32) -> NormalIndex { NormalIndex::try_from_index(n).unwrap() }

    #[test]
    fn zero_gap_limit() {
        assert!(matches!(GapLimitList::new(Counter::new(), 0), Err(GapLimitError::ZeroGapLimit)));
    }

    #[test]
    fn gap_scenario() {
        let mut list = GapLimitList::new(Counter::new(), 5).unwrap();

        assert_eq!(list.generate_gap(None).unwrap(), &[0, 1, 2, 3, 4]);
        assert_eq!(list.len(), 5);

        // nothing new while the window is covered
        assert!(list.generate_gap(None).unwrap().is_empty());
        assert_eq!(list.source().calls.get(), 5);

        assert_eq!(list.generate_gap(Some(idx(2))).unwrap(), &[5, 6, 7]);
        assert_eq!(list.entries(), &[0, 1, 2, 3, 4, 5, 6, 7]);

        assert!(!list.is_beyond_limit(idx(7), Some(idx(2))));
        assert!(list.is_beyond_limit(idx(8), Some(idx(2))));
        assert!(!list.is_beyond_limit(idx(4), None));
        assert!(list.is_beyond_limit(idx(5), None));
    }

    #[test]
    fn window_from_empty() {
        for (max, g) in [(0u32, 1u32), (3, 2), (10, 20)] {
            let mut list = GapLimitList::new(Counter::new(), g).unwrap();
            list.generate_gap(Some(idx(max))).unwrap();
            assert_eq!(list.len() as u32, max + g + 1);
            assert_eq!(list.entries().last(), Some(&(max + g)));
        }
    }

    #[test]
    fn out_of_sequence() {
        let mut list = GapLimitList::new(Counter::new(), 3).unwrap();
        assert_eq!(list.generate_key(idx(0)).unwrap(), &0);
        assert_eq!(list.generate_key(idx(2)).unwrap_err(), GapLimitError::OutOfSequence {
            requested: idx(2),
            next: idx(1),
        });
        assert_eq!(list.get(idx(0)), Some(&0));
        assert_eq!(list.get(idx(1)), None);
    }

    #[test]
    fn max_used() {
        let mut list = GapLimitList::new(Counter::new(), 4).unwrap();
        list.generate_gap(None).unwrap();
        assert_eq!(list.max_used(|_| false), None);
        assert_eq!(list.max_used(|n| *n == 1 || *n == 2), Some(idx(2)));
    }

    #[test]
    fn derivation_failure_keeps_list_contiguous() {
        let mut list = GapLimitList::new(
            Counter {
                calls: Cell::new(0),
                fail_at: Some(3),
            },
            6,
        )
        .unwrap();
        let err = list.generate_gap(None).unwrap_err();
        assert_eq!(err, GapLimitError::Derive(DeriveError::InvalidChild(idx(3).into())));
        assert_eq!(list.entries(), &[0, 1, 2]);
    }
}
