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

use std::num::ParseIntError;
use std::str::FromStr;

/// Constant determining BIP32 boundary for u32 values after which index
/// is treated as hardened
pub const HARDENED_INDEX_BOUNDARY: u32 = 1 << 31;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("provided {what} {invalid} is invalid: it lies outside allowed range {start}..={end}")]
pub struct IndexError {
    pub what: &'static str,
    pub invalid: u32,
    pub start: u32,
    pub end: u32,
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum IndexParseError {
    #[from]
    #[display(inner)]
    Invalid(IndexError),

    #[from]
    /// invalid index string representation - {0}
    Parse(ParseIntError),

    /// expected hardened index value instead of the provided unhardened {0}
    HardenedRequired(String),
}

/// Index for unhardened children derivation; ensures that the inner value
/// is always < 2^31
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Debug, Hash, Default, Display, From)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
#[display(inner)]
pub struct NormalIndex(
    #[from(u8)]
    #[from(u16)]
    u32,
);

impl NormalIndex {
    pub const ZERO: Self = NormalIndex(0);
    pub const ONE: Self = NormalIndex(1);
    pub const MAX: Self = NormalIndex(HARDENED_INDEX_BOUNDARY - 1);

    pub const fn normal(child_number: u16) -> Self { NormalIndex(child_number as u32) }

    /// Constructs index from a value which must lie in range
    /// `0..`[`HARDENED_INDEX_BOUNDARY`].
    pub fn try_from_index(index: u32) -> Result<Self, IndexError> {
        if index >= HARDENED_INDEX_BOUNDARY {
            return Err(IndexError {
                what: "normal index",
                invalid: index,
                start: 0,
                end: HARDENED_INDEX_BOUNDARY - 1,
            });
        }
        Ok(Self(index))
    }

    #[inline]
    pub const fn index(&self) -> u32 { self.0 }

    #[inline]
    pub const fn to_be_bytes(&self) -> [u8; 4] { self.0.to_be_bytes() }

    /// Adds value to the index; fails if the result leaves the normal range.
    #[must_use]
    pub fn checked_add(&self, add: u32) -> Option<Self> {
        self.0.checked_add(add).and_then(|index| Self::try_from_index(index).ok())
    }

    #[must_use]
    pub fn checked_inc(&self) -> Option<Self> { self.checked_add(1) }
}

impl TryFrom<u32> for NormalIndex {
    type Error = IndexError;

    fn try_from(index: u32) -> Result<Self, Self::Error> { Self::try_from_index(index) }
}

impl TryFrom<DerivationIndex> for NormalIndex {
    type Error = IndexError;

    fn try_from(idx: DerivationIndex) -> Result<Self, Self::Error> {
        NormalIndex::try_from_index(idx.index())
    }
}

impl FromStr for NormalIndex {
    type Err = IndexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NormalIndex::try_from_index(u32::from_str(s)?)?)
    }
}

/// Index for hardened children derivation; ensures that the index always >=
/// 2^31.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
#[display("{0}h", alt = "{0}'")]
pub struct HardenedIndex(
    /// The inner index value; always reduced by [`HARDENED_INDEX_BOUNDARY`]
    u32,
);

impl HardenedIndex {
    pub const ZERO: Self = HardenedIndex(0);
    pub const ONE: Self = HardenedIndex(1);

    pub const fn hardened(child_number: u16) -> Self { HardenedIndex(child_number as u32) }

    /// Constructs index from a child number not offset by
    /// [`HARDENED_INDEX_BOUNDARY`].
    pub fn try_from_child_number(child_no: u32) -> Result<Self, IndexError> {
        if child_no >= HARDENED_INDEX_BOUNDARY {
            return Err(IndexError {
                what: "child number",
                invalid: child_no,
                start: 0,
                end: HARDENED_INDEX_BOUNDARY - 1,
            });
        }
        Ok(Self(child_no))
    }

    /// Constructs index from a derivation value which must lie in range
    /// [`HARDENED_INDEX_BOUNDARY`]`..=u32::MAX`.
    pub fn try_from_index(index: u32) -> Result<Self, IndexError> {
        index.checked_sub(HARDENED_INDEX_BOUNDARY).map(Self).ok_or(IndexError {
            what: "hardened index",
            invalid: index,
            start: HARDENED_INDEX_BOUNDARY,
            end: u32::MAX,
        })
    }

    /// Returns hardened index number not offset by [`HARDENED_INDEX_BOUNDARY`]
    /// (i.e. zero-based).
    #[inline]
    pub const fn child_number(&self) -> u32 { self.0 }

    /// Returns hardened index number offset by [`HARDENED_INDEX_BOUNDARY`].
    #[inline]
    pub const fn index(&self) -> u32 { self.0 + HARDENED_INDEX_BOUNDARY }
}

impl FromStr for HardenedIndex {
    type Err = IndexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s
            .strip_suffix(['h', 'H', '\''])
            .ok_or_else(|| IndexParseError::HardenedRequired(s.to_owned()))?;
        Ok(HardenedIndex::try_from_child_number(u32::from_str(s)?)?)
    }
}

/// Child number of either kind.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, From)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(inner)]
pub enum DerivationIndex {
    #[from]
    Normal(NormalIndex),
    #[from]
    Hardened(HardenedIndex),
}

impl From<u32> for DerivationIndex {
    fn from(value: u32) -> Self { Self::from_index(value) }
}

impl DerivationIndex {
    pub const ZERO: Self = DerivationIndex::Normal(NormalIndex::ZERO);

    pub const fn normal(child_number: u16) -> Self {
        Self::Normal(NormalIndex::normal(child_number))
    }

    pub const fn hardened(child_number: u16) -> Self {
        Self::Hardened(HardenedIndex::hardened(child_number))
    }

    pub const fn from_index(value: u32) -> Self {
        if value < HARDENED_INDEX_BOUNDARY {
            DerivationIndex::Normal(NormalIndex(value))
        } else {
            DerivationIndex::Hardened(HardenedIndex(value - HARDENED_INDEX_BOUNDARY))
        }
    }

    /// Value used during derivation, offset by [`HARDENED_INDEX_BOUNDARY`] for
    /// hardened indexes.
    pub const fn index(&self) -> u32 {
        match self {
            DerivationIndex::Normal(idx) => idx.index(),
            DerivationIndex::Hardened(idx) => idx.index(),
        }
    }

    pub const fn is_hardened(&self) -> bool { matches!(self, DerivationIndex::Hardened(_)) }

    pub const fn to_be_bytes(&self) -> [u8; 4] { self.index().to_be_bytes() }
}

impl FromStr for DerivationIndex {
    type Err = IndexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_suffix(['h', 'H', '\'']) {
            Some(_) => HardenedIndex::from_str(s).map(Self::Hardened),
            None => NormalIndex::from_str(s).map(Self::Normal),
        }
    }
}
