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

use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use amplify::hex::{self, FromHex, ToHex};
use invoice::{Address, ScriptHash, ScriptPubkey};

use crate::{KeyError, NormalIndex};

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum PubkeyParseError {
    /// public key is not a valid hex string - {0}
    #[from]
    Hex(hex::Error),

    #[display(inner)]
    #[from]
    Key(KeyError),
}

/// Public key in either SEC1 form, remembering which one it was read from.
///
/// The P2PKH address is derived on the first request and cached; the cache
/// doesn't participate in comparison or hashing.
#[derive(Clone)]
pub struct PublicKey {
    inner: secp256k1::PublicKey,
    compressed: bool,
    address: OnceLock<Address>,
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner && self.compressed == other.compressed
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
        self.compressed.hash(state);
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_string()).finish()
    }
}

impl PublicKey {
    fn with(inner: secp256k1::PublicKey, compressed: bool) -> Self {
        PublicKey {
            inner,
            compressed,
            address: OnceLock::new(),
        }
    }

    pub fn compressed(inner: secp256k1::PublicKey) -> Self { Self::with(inner, true) }

    pub fn uncompressed(inner: secp256k1::PublicKey) -> Self { Self::with(inner, false) }

    /// Parses 33-byte (`02`/`03` prefix) or 65-byte (`04` prefix) encoding.
    pub fn from_slice(data: &[u8]) -> Result<Self, KeyError> {
        let compressed = match (data.len(), data.first()) {
            (33, Some(0x02 | 0x03)) => true,
            (65, Some(0x04)) => false,
            _ => return Err(KeyError::InvalidPublicKey),
        };
        let inner =
            secp256k1::PublicKey::from_slice(data).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self::with(inner, compressed))
    }

    pub fn is_compressed(&self) -> bool { self.compressed }

    pub fn as_inner(&self) -> &secp256k1::PublicKey { &self.inner }

    /// Serializes the key in the form it was constructed with.
    pub fn to_vec(&self) -> Vec<u8> {
        match self.compressed {
            true => self.inner.serialize().to_vec(),
            false => self.inner.serialize_uncompressed().to_vec(),
        }
    }

    /// P2PKH address of the serialized key.
    pub fn address(&self) -> Address {
        *self.address.get_or_init(|| Address::from_pubkey(&self.to_vec()))
    }

    pub fn to_p2pkh_script(&self) -> ScriptPubkey { self.address().to_script() }

    /// Pay-to-pubkey script `<pubkey> OP_CHECKSIG`.
    pub fn to_script(&self) -> ScriptPubkey {
        match self.compressed {
            true => ScriptPubkey::p2pk(&self.inner.serialize()),
            false => ScriptPubkey::p2pk_uncompressed(&self.inner.serialize_uncompressed()),
        }
    }

    /// Hash of the pay-to-pubkey script.
    pub fn to_scripthash(&self) -> ScriptHash { self.to_script().script_hash() }
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(inner: secp256k1::PublicKey) -> Self { Self::compressed(inner) }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.to_vec().to_hex()) }
}

impl FromStr for PublicKey {
    type Err = PubkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = Vec::<u8>::from_hex(s)?;
        Ok(PublicKey::from_slice(&data)?)
    }
}

/// Public key tagged with the index it was derived at.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct HdPublicKey {
    pub index: NormalIndex,
    pub key: PublicKey,
}

impl HdPublicKey {
    pub fn new(index: NormalIndex, key: PublicKey) -> Self { HdPublicKey { index, key } }

    pub fn address(&self) -> Address { self.key.address() }
}

#[cfg(test)]
mod test {
    use invoice::{AddressFormat, NetworkParams};

    use super::*;

    const KEY: &str = "0250863ad64a87ae8a2fe83c1af1a8403cb53f53e486d8511dad8a04887e5b2352";

    #[test]
    fn known_address() {
        let pk = PublicKey::from_str(KEY).unwrap();
        assert!(pk.is_compressed());
        assert_eq!(pk.to_string(), KEY);
        assert_eq!(
            pk.address().to_text(AddressFormat::Legacy, &NetworkParams::mainnet()),
            "1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs"
        );
        assert!(pk.to_p2pkh_script().is_p2pkh());
    }

    #[test]
    fn uncompressed_form() {
        let compressed = PublicKey::from_str(KEY).unwrap();
        let full = PublicKey::uncompressed(*compressed.as_inner());
        assert_eq!(full.to_vec().len(), 65);
        assert_eq!(PublicKey::from_slice(&full.to_vec()).unwrap(), full);
        assert_ne!(full, compressed);
        assert_ne!(full.address(), compressed.address());
    }

    #[test]
    fn p2pk_script() {
        let pk = PublicKey::from_str(KEY).unwrap();
        let script = pk.to_script();
        assert_eq!(script.to_string(), format!("21{KEY}ac"));
        assert_eq!(pk.to_scripthash(), script.script_hash());

        let full = PublicKey::uncompressed(*pk.as_inner());
        let script = full.to_script();
        assert_eq!(script.len(), 67);
        assert_eq!(&script[1..66], &full.to_vec()[..]);
    }

    #[test]
    fn invalid_encodings() {
        assert_eq!(
            PublicKey::from_str(&KEY[2..]),
            Err(PubkeyParseError::Key(KeyError::InvalidPublicKey))
        );
        let mut wrong_prefix = KEY.to_owned();
        wrong_prefix.replace_range(..2, "04");
        assert_eq!(
            PublicKey::from_str(&wrong_prefix),
            Err(PubkeyParseError::Key(KeyError::InvalidPublicKey))
        );
        assert!(matches!(PublicKey::from_str("zz"), Err(PubkeyParseError::Hex(_))));
    }
}
