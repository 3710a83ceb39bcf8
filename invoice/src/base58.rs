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

//! Base58Check: base-58 text of `payload ∥ sha256d(payload)[..4]`.

use std::fmt::{self, Formatter};

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum Error {
    /// invalid Base58Check data - {0}
    #[from]
    Decode(bs58::decode::Error),

    /// Base58Check payload has invalid length {0}.
    InvalidLength(usize),
}

/// Encodes `data` with a 4-byte double-SHA256 checksum appended.
pub fn encode_check(data: &[u8]) -> String { bs58::encode(data).with_check().into_string() }

pub fn encode_check_to_fmt(f: &mut Formatter, data: &[u8]) -> fmt::Result {
    f.write_str(&encode_check(data))
}

/// Decodes Base58Check string, verifying and stripping the checksum.
pub fn decode_check(s: &str) -> Result<Vec<u8>, Error> {
    Ok(bs58::decode(s).with_check(None).into_vec()?)
}

/// Decodes Base58Check string and requires the payload to be exactly `len`
/// bytes long.
pub fn decode_check_len(s: &str, len: usize) -> Result<Vec<u8>, Error> {
    let data = decode_check(s)?;
    if data.len() != len {
        return Err(Error::InvalidLength(data.len()));
    }
    Ok(data)
}
