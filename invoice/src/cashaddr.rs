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

//! CashAddr encoding: `prefix:payload`, where payload is base32 of a version
//! byte followed by the hash, protected with a 40-bit BCH checksum.

use bech32::{u5, FromBase32, ToBase32};

const CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATORS: [u64; 5] =
    [0x98f2bc8e61, 0x79b76d99e2, 0xf33e5fb3c4, 0xae2eabe2a8, 0x1e4f43e470];

const CHECKSUM_LEN: usize = 8;

/// Hash sizes in bytes indexed by the three lowest bits of the version byte.
const HASH_SIZES: [usize; 8] = [20, 24, 28, 32, 40, 48, 56, 64];

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum CashAddrError {
    /// CashAddr string mixes lower and upper case characters.
    MixedCase,

    /// CashAddr string contains invalid character '{0}'.
    InvalidChar(char),

    /// CashAddr prefix '{found}' doesn't match network prefix '{expected}'.
    PrefixMismatch { expected: String, found: String },

    /// CashAddr checksum mismatch.
    InvalidChecksum,

    /// CashAddr payload has invalid length {0}.
    InvalidLength(usize),

    /// invalid CashAddr version byte {0:#04x}.
    InvalidVersion(u8),

    /// invalid CashAddr base32 data - {0}
    #[from]
    Base32(bech32::Error),
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u64 {
    let mut c = 1u64;
    for d in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07_ffff_ffff) << 5) ^ d as u64;
        for (bit, gen) in GENERATORS.iter().enumerate() {
            if c0 & (1 << bit) != 0 {
                c ^= gen;
            }
        }
    }
    c ^ 1
}

fn expand_prefix(prefix: &str) -> impl Iterator<Item = u8> + '_ {
    prefix.bytes().map(|b| b & 0x1f).chain([0u8])
}

/// Encodes 160-bit `hash` of the given address `kind` (0 for P2PKH, 1 for
/// P2SH) under `prefix`. The result is always lowercase and carries the
/// prefix.
pub fn encode(prefix: &str, kind: u8, hash: &[u8; 20]) -> String {
    let prefix = prefix.to_ascii_lowercase();

    let mut payload = Vec::with_capacity(21);
    // size bits are zero for 160-bit hashes
    payload.push(kind << 3);
    payload.extend_from_slice(hash);
    let data: Vec<u8> = payload.to_base32().into_iter().map(u5::to_u8).collect();

    let poly =
        polymod(expand_prefix(&prefix).chain(data.iter().copied()).chain([0u8; CHECKSUM_LEN]));
    let checksum = (0..CHECKSUM_LEN).map(|i| ((poly >> (5 * (7 - i))) & 0x1f) as u8);

    let mut s = prefix.clone();
    s.push(':');
    s.extend(data.into_iter().chain(checksum).map(|d| CHARSET.as_bytes()[d as usize] as char));
    s
}

/// Decodes CashAddr string into the address kind (version byte without the
/// size bits) and the hash.
///
/// The prefix may be omitted; if present it must match `prefix`.
pub fn decode(s: &str, prefix: &str) -> Result<(u8, Vec<u8>), CashAddrError> {
    let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(CashAddrError::MixedCase);
    }

    let expected = prefix.to_ascii_lowercase();
    let lower = s.to_ascii_lowercase();
    let (found, payload) = match lower.split_once(':') {
        Some((found, payload)) => (found, payload),
        None => (expected.as_str(), lower.as_str()),
    };
    if found != expected {
        let found = found.to_owned();
        return Err(CashAddrError::PrefixMismatch { expected, found });
    }

    let data = payload
        .chars()
        .map(|c| CHARSET.find(c).map(|pos| pos as u8).ok_or(CashAddrError::InvalidChar(c)))
        .collect::<Result<Vec<u8>, _>>()?;
    if data.len() <= CHECKSUM_LEN {
        return Err(CashAddrError::InvalidLength(data.len()));
    }
    if polymod(expand_prefix(found).chain(data.iter().copied())) != 0 {
        return Err(CashAddrError::InvalidChecksum);
    }

    let data = data[..data.len() - CHECKSUM_LEN]
        .iter()
        .map(|d| u5::try_from_u8(*d))
        .collect::<Result<Vec<u5>, _>>()?;
    let bytes = Vec::<u8>::from_base32(&data)?;
    let (version, hash) = bytes.split_first().ok_or(CashAddrError::InvalidLength(0))?;
    if version & 0x80 != 0 {
        return Err(CashAddrError::InvalidVersion(*version));
    }
    if hash.len() != HASH_SIZES[(version & 0x07) as usize] {
        return Err(CashAddrError::InvalidLength(hash.len()));
    }
    Ok((version >> 3, hash.to_vec()))
}
