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

use amplify::hex::ToHex;
use amplify::{Bytes32, Wrapper};
use bitcoin_hashes::{sha256, Hash};

pub mod opcodes {
    pub const OP_DUP: u8 = 0x76;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_CHECKSIG: u8 = 0xac;
    /// Pushes next 20 bytes.
    pub const OP_PUSHBYTES_20: u8 = 0x14;
}

use opcodes::*;

/// Locking script of a transaction output.
#[derive(Wrapper, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, From)]
#[wrapper(Deref)]
pub struct ScriptPubkey(#[from] Vec<u8>);

impl ScriptPubkey {
    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh(hash160: [u8; 20]) -> Self {
        let mut script = Vec::with_capacity(25);
        script.extend([OP_DUP, OP_HASH160, OP_PUSHBYTES_20]);
        script.extend(hash160);
        script.extend([OP_EQUALVERIFY, OP_CHECKSIG]);
        ScriptPubkey(script)
    }

    /// `OP_HASH160 <hash> OP_EQUAL`
    pub fn p2sh(hash160: [u8; 20]) -> Self {
        let mut script = Vec::with_capacity(23);
        script.extend([OP_HASH160, OP_PUSHBYTES_20]);
        script.extend(hash160);
        script.push(OP_EQUAL);
        ScriptPubkey(script)
    }

    /// `<pubkey> OP_CHECKSIG` for a compressed public key.
    pub fn p2pk(pubkey: &[u8; 33]) -> Self { Self::with_checksig(pubkey) }

    /// `<pubkey> OP_CHECKSIG` for an uncompressed public key.
    pub fn p2pk_uncompressed(pubkey: &[u8; 65]) -> Self { Self::with_checksig(pubkey) }

    // both key lengths are below OP_PUSHDATA1, so the length is the push opcode
    fn with_checksig<const LEN: usize>(pubkey: &[u8; LEN]) -> Self {
        let mut script = Vec::with_capacity(LEN + 2);
        script.push(LEN as u8);
        script.extend_from_slice(pubkey);
        script.push(OP_CHECKSIG);
        ScriptPubkey(script)
    }

    pub fn is_p2pkh(&self) -> bool {
        self.0.len() == 25
            && self.0[0..3] == [OP_DUP, OP_HASH160, OP_PUSHBYTES_20]
            && self.0[23..] == [OP_EQUALVERIFY, OP_CHECKSIG]
    }

    pub fn is_p2sh(&self) -> bool {
        self.0.len() == 23 && self.0[0..2] == [OP_HASH160, OP_PUSHBYTES_20] && self.0[22] == OP_EQUAL
    }

    pub fn as_slice(&self) -> &[u8] { &self.0 }

    /// Computes hash under which the script is tracked by the indexing server.
    pub fn script_hash(&self) -> ScriptHash {
        ScriptHash::from_byte_array(sha256::Hash::hash(&self.0).to_byte_array())
    }
}

impl Display for ScriptPubkey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.0[..].to_hex()) }
}

/// Single SHA256 of a locking script, used as a subscription key with the
/// indexing server.
///
/// Like transaction ids, it is displayed in hex with the byte order reversed.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref)]
pub struct ScriptHash(
    #[from]
    #[from([u8; 32])]
    Bytes32,
);

impl ScriptHash {
    pub fn from_byte_array(bytes: [u8; 32]) -> Self { ScriptHash(Bytes32::from_byte_array(bytes)) }

    pub fn to_byte_array(&self) -> [u8; 32] { self.0.to_byte_array() }
}

impl Display for ScriptHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0.to_byte_array();
        bytes.reverse();
        f.write_str(&bytes[..].to_hex())
    }
}
