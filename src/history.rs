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

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use amplify::hex::{self, FromHex, ToHex};
use amplify::{Bytes32, Wrapper};

/// Transaction id, displayed in hex with the byte order reversed.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref)]
pub struct Txid(
    #[from]
    #[from([u8; 32])]
    Bytes32,
);

impl Txid {
    pub fn from_byte_array(bytes: [u8; 32]) -> Self { Txid(Bytes32::from_byte_array(bytes)) }

    pub fn to_byte_array(&self) -> [u8; 32] { self.0.to_byte_array() }
}

impl Display for Txid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0.to_byte_array();
        bytes.reverse();
        f.write_str(&bytes[..].to_hex())
    }
}

impl FromStr for Txid {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = Vec::<u8>::from_hex(s)?;
        if data.len() != 32 {
            return Err(hex::Error::InvalidLength(32, data.len()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&data);
        bytes.reverse();
        Ok(Txid::from_byte_array(bytes))
    }
}

/// Transaction touching an address, as reported by the history provider.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct HistoryItem {
    pub txid: Txid,
    /// Block height; zero or negative for transactions in the mempool.
    pub height: i64,
}

impl HistoryItem {
    pub fn new(txid: Txid, height: i64) -> Self { HistoryItem { txid, height } }

    pub fn is_confirmed(&self) -> bool { self.height > 0 }
}

/// Ordered transaction history of an address.
///
/// An address with a non-empty history counts as used.
#[derive(Wrapper, Clone, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
pub struct TxHistory(#[from] Vec<HistoryItem>);

impl TxHistory {
    pub fn new() -> Self { TxHistory::default() }

    pub fn is_used(&self) -> bool { !self.0.is_empty() }

    pub fn push(&mut self, item: HistoryItem) { self.0.push(item) }
}

impl FromIterator<HistoryItem> for TxHistory {
    fn from_iter<T: IntoIterator<Item = HistoryItem>>(iter: T) -> Self {
        TxHistory(iter.into_iter().collect())
    }
}
