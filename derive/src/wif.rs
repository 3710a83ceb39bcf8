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

//! Wallet import format: Base58Check of `version ∥ secret ∥ [0x01]`, where the
//! trailing byte marks keys whose public key is used in compressed form.

use invoice::{base58, NetworkParams};
use secp256k1::SecretKey;

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum WifError {
    /// wrong Base58 encoding of WIF data - {0}
    #[from]
    Base58(base58::Error),

    /// WIF data has invalid length {0}.
    InvalidLength(usize),

    /// WIF version byte {found:#04x} doesn't match network version {expected:#04x}.
    VersionMismatch { expected: u8, found: u8 },

    /// WIF compression flag must be 0x01, not {0:#04x}.
    InvalidCompressionFlag(u8),

    /// WIF contains invalid secret key.
    InvalidSecretKey,
}

/// Secret key decoded from the wallet import format.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct WifKey {
    pub secret_key: SecretKey,
    pub compressed: bool,
}

pub fn encode(params: &NetworkParams, secret_key: &SecretKey, compressed: bool) -> String {
    let mut data = Vec::with_capacity(34);
    data.push(params.wif_version);
    data.extend(secret_key.secret_bytes());
    if compressed {
        data.push(0x01);
    }
    base58::encode_check(&data)
}

pub fn decode(s: &str, params: &NetworkParams) -> Result<WifKey, WifError> {
    let data = base58::decode_check(s)?;
    let compressed = match data.len() {
        33 => false,
        34 if data[33] == 0x01 => true,
        34 => return Err(WifError::InvalidCompressionFlag(data[33])),
        len => return Err(WifError::InvalidLength(len)),
    };
    if data[0] != params.wif_version {
        return Err(WifError::VersionMismatch {
            expected: params.wif_version,
            found: data[0],
        });
    }
    let secret_key =
        SecretKey::from_slice(&data[1..33]).map_err(|_| WifError::InvalidSecretKey)?;
    Ok(WifKey {
        secret_key,
        compressed,
    })
}
