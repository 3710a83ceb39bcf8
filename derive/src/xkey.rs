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

use std::borrow::Borrow;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

use amplify::{ByteArray, Bytes20, Bytes32, Bytes4, Wrapper};
use bitcoin_hashes::{hash160, sha512, Hash, HashEngine, Hmac, HmacEngine};
use invoice::{base58, Address, NetworkParams, XkeyVersions};
use secp256k1::{Scalar, SecretKey, SECP256K1};

use crate::curve::Point;
use crate::{wif, DerivationIndex, HardenedIndex, NormalIndex, PublicKey};

/// Length of the BIP32 binary serialization.
pub const XKEY_LEN: usize = 78;

/// Errors of raw key material validation.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum KeyError {
    /// secret key must be a non-zero scalar below the secp256k1 group order.
    InvalidSecretKey,

    /// public key must be 33 bytes starting with 0x02 or 0x03, or 65 bytes
    /// starting with 0x04, and lie on secp256k1.
    InvalidPublicKey,
}

/// Errors of child key derivation.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum DeriveError {
    /// child key at index {0} is invalid; the caller should skip to the next
    /// index.
    InvalidChild(DerivationIndex),

    /// hardened index {0} can't be derived from a public key.
    HardenedFromPublic(HardenedIndex),

    /// extended key is at the maximal depth and can't have children.
    DepthOverflow,
}

impl DeriveError {
    /// Detects whether the derivation may be retried with another index.
    pub fn is_recoverable(&self) -> bool { matches!(self, DeriveError::InvalidChild(_)) }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum XkeyDecodeError {
    /// wrong length of extended key data ({0}).
    WrongExtendedKeyLength(usize),

    /// provided key is not a standard BIP-32 extended key; unknown version
    /// {0:02x?}.
    UnknownKeyType([u8; 4]),

    /// extended key version {0:02x?} doesn't match the key kind.
    KeyKindMismatch([u8; 4]),

    /// extended pubkey contains invalid public key data.
    InvalidPubkey,

    /// xpriv contains invalid byte for the secret key type ({0:#04x}) which must be set to zero.
    InvalidType(u8),

    /// xpriv contains invalid data with secret key value overflowing over field order.
    InvalidSecretKey,
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
pub enum XkeyParseError {
    /// wrong Base58 encoding of extended key data - {0}
    #[display(doc_comments)]
    #[from]
    Base58(base58::Error),

    #[display(inner)]
    #[from]
    Decode(XkeyDecodeError),
}

/// BIP32 chain code used for hierarchical derivation
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref, RangeOps)]
pub struct ChainCode(Bytes32);

impl AsRef<[u8]> for ChainCode {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

impl From<[u8; 32]> for ChainCode {
    fn from(value: [u8; 32]) -> Self { Self(value.into()) }
}

#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, Display, From)]
#[wrapper(RangeOps, Hex, FromStr)]
#[display(LowerHex)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct XpubFp(
    #[from]
    #[from([u8; 4])]
    Bytes4,
);

impl AsRef<[u8]> for XpubFp {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

impl XpubFp {
    pub const fn master() -> Self { Self(Bytes4::zero()) }
}

/// Full HASH160 of the compressed public key.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, Display, From)]
#[wrapper(RangeOps, Hex, FromStr)]
#[display(LowerHex)]
pub struct XpubId(
    #[from]
    #[from([u8; 20])]
    Bytes20,
);

impl AsRef<[u8]> for XpubId {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

/// Position of an extended key in the tree.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct XkeyMeta {
    pub depth: u8,
    pub parent_fp: XpubFp,
    pub child_number: DerivationIndex,
}

impl XkeyMeta {
    pub const fn master() -> Self {
        XkeyMeta {
            depth: 0,
            parent_fp: XpubFp::master(),
            child_number: DerivationIndex::ZERO,
        }
    }

    fn child(&self, parent_fp: XpubFp, child_number: DerivationIndex) -> Result<Self, DeriveError> {
        Ok(XkeyMeta {
            depth: self.depth.checked_add(1).ok_or(DeriveError::DepthOverflow)?,
            parent_fp,
            child_number,
        })
    }

    fn encode_into(&self, buf: &mut [u8; XKEY_LEN], version: [u8; 4], chain_code: &ChainCode) {
        buf[0..4].copy_from_slice(&version);
        buf[4] = self.depth;
        buf[5..9].copy_from_slice(self.parent_fp.as_ref());
        buf[9..13].copy_from_slice(&self.child_number.to_be_bytes());
        buf[13..45].copy_from_slice(chain_code.as_ref());
    }

    fn decode(data: &[u8]) -> (Self, ChainCode) {
        let mut parent_fp = [0u8; 4];
        parent_fp.copy_from_slice(&data[5..9]);

        let mut child_number = [0u8; 4];
        child_number.copy_from_slice(&data[9..13]);
        let child_number = u32::from_be_bytes(child_number);

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        let meta = XkeyMeta {
            depth: data[4],
            parent_fp: parent_fp.into(),
            child_number: child_number.into(),
        };
        (meta, chain_code.into())
    }
}

fn hmac_sha512(key: &[u8], msg: &[u8]) -> ([u8; 32], ChainCode) {
    let mut engine: HmacEngine<sha512::Hash> = HmacEngine::new(key);
    engine.input(msg);
    let hmac: Hmac<sha512::Hash> = Hmac::from_engine(engine);

    let mut l = [0u8; 32];
    l.copy_from_slice(&hmac[..32]);
    let mut r = [0u8; 32];
    r.copy_from_slice(&hmac[32..]);
    (l, r.into())
}

/// Reads version prefix after checking the data length.
fn read_version(data: &[u8]) -> Result<[u8; 4], XkeyDecodeError> {
    if data.len() != XKEY_LEN {
        return Err(XkeyDecodeError::WrongExtendedKeyLength(data.len()));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&data[0..4]);
    Ok(version)
}

/// Deterministic part of the extended public key.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct XpubCore {
    /// Public key
    pub public_key: secp256k1::PublicKey,
    /// BIP32 chain code used for hierarchical derivation
    pub chain_code: ChainCode,
}

/// Extended public key.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Xpub {
    versions: XkeyVersions,
    meta: XkeyMeta,
    core: XpubCore,
}

impl Xpub {
    pub fn new(versions: XkeyVersions, meta: XkeyMeta, core: XpubCore) -> Self {
        Xpub {
            versions,
            meta,
            core,
        }
    }

    /// Decodes key with the version prefix of one of the known networks.
    pub fn decode(data: impl Borrow<[u8]>) -> Result<Xpub, XkeyDecodeError> {
        let data = data.borrow();
        let version = read_version(data)?;
        let versions =
            XkeyVersions::detect(version).ok_or(XkeyDecodeError::UnknownKeyType(version))?;
        Self::decode_with(data, versions)
    }

    /// Decodes key which must carry the public prefix of `versions`.
    pub fn decode_with(
        data: impl Borrow<[u8]>,
        versions: XkeyVersions,
    ) -> Result<Xpub, XkeyDecodeError> {
        let data = data.borrow();
        let version = read_version(data)?;
        if version == versions.private {
            return Err(XkeyDecodeError::KeyKindMismatch(version));
        } else if version != versions.public {
            return Err(XkeyDecodeError::UnknownKeyType(version));
        }

        let (meta, chain_code) = XkeyMeta::decode(data);
        if data[45] != 0x02 && data[45] != 0x03 {
            return Err(XkeyDecodeError::InvalidPubkey);
        }
        let public_key = secp256k1::PublicKey::from_slice(&data[45..78])
            .map_err(|_| XkeyDecodeError::InvalidPubkey)?;

        Ok(Xpub {
            versions,
            meta,
            core: XpubCore {
                public_key,
                chain_code,
            },
        })
    }

    pub fn encode(&self) -> [u8; XKEY_LEN] {
        let mut ret = [0; XKEY_LEN];
        self.meta.encode_into(&mut ret, self.versions.public, &self.core.chain_code);
        ret[45..78].copy_from_slice(&self.core.public_key.serialize());
        ret
    }

    pub fn versions(&self) -> XkeyVersions { self.versions }

    pub fn depth(&self) -> u8 { self.meta.depth }

    pub fn child_number(&self) -> DerivationIndex { self.meta.child_number }

    pub fn parent_fp(&self) -> XpubFp { self.meta.parent_fp }

    pub fn chain_code(&self) -> ChainCode { self.core.chain_code }

    pub fn public_key(&self) -> secp256k1::PublicKey { self.core.public_key }

    /// Returns the key as a compressed [`PublicKey`].
    pub fn to_pubkey(&self) -> PublicKey { PublicKey::compressed(self.core.public_key) }

    /// Returns P2PKH address of the key.
    pub fn address(&self) -> Address { Address::from_pubkey(&self.core.public_key.serialize()) }

    /// Returns the HASH160 of the compressed public key
    pub fn identifier(&self) -> XpubId {
        let hash = hash160::Hash::hash(&self.core.public_key.serialize());
        XpubId::from_byte_array(hash.to_byte_array())
    }

    pub fn fingerprint(&self) -> XpubFp {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.identifier()[..4]);
        XpubFp::from_byte_array(bytes)
    }

    /// Public->Public child key derivation
    pub fn ckd_pub(&self, idx: impl Into<DerivationIndex>) -> Result<Xpub, DeriveError> {
        let idx = match idx.into() {
            DerivationIndex::Normal(idx) => idx,
            DerivationIndex::Hardened(idx) => return Err(DeriveError::HardenedFromPublic(idx)),
        };
        let meta = self.meta.child(self.fingerprint(), idx.into())?;

        let mut msg = Vec::with_capacity(37);
        msg.extend(self.core.public_key.serialize());
        msg.extend(idx.to_be_bytes());
        let (l, chain_code) = hmac_sha512(self.core.chain_code.as_ref(), &msg);

        let invalid = DeriveError::InvalidChild(idx.into());
        let tweak = Point::mul_generator(l).map_err(|_| invalid)?;
        let public_key =
            tweak.add(Point::Affine(self.core.public_key)).to_public_key().map_err(|_| invalid)?;

        Ok(Xpub {
            versions: self.versions,
            meta,
            core: XpubCore {
                public_key,
                chain_code,
            },
        })
    }

    /// Attempts to derive an extended public key from a path.
    pub fn derive_pub(&self, path: impl AsRef<[NormalIndex]>) -> Result<Xpub, DeriveError> {
        let mut xpub = *self;
        for idx in path.as_ref() {
            xpub = xpub.ckd_pub(*idx)?;
        }
        Ok(xpub)
    }

    /// Derives child public key without keeping the chain code.
    pub fn child_pubkey(&self, idx: NormalIndex) -> Result<PublicKey, DeriveError> {
        self.ckd_pub(idx).map(|xpub| xpub.to_pubkey())
    }
}

impl Display for Xpub {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        base58::encode_check_to_fmt(f, &self.encode())
    }
}

impl FromStr for Xpub {
    type Err = XkeyParseError;

    fn from_str(inp: &str) -> Result<Xpub, XkeyParseError> {
        let data = base58::decode_check(inp)?;
        Ok(Xpub::decode(data)?)
    }
}

/// Deterministic part of the extended private key.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct XprivCore {
    /// Secret key
    pub private_key: SecretKey,
    /// BIP32 chain code used for hierarchical derivation
    pub chain_code: ChainCode,
}

/// Extended private key.
///
/// The public projection is computed on the first request and cached.
#[derive(Clone)]
pub struct Xpriv {
    versions: XkeyVersions,
    meta: XkeyMeta,
    core: XprivCore,
    xpub: OnceLock<Xpub>,
}

impl PartialEq for Xpriv {
    fn eq(&self, other: &Self) -> bool {
        self.versions == other.versions && self.meta == other.meta && self.core == other.core
    }
}

impl Eq for Xpriv {}

impl Debug for Xpriv {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Xpriv")
            .field("versions", &self.versions)
            .field("meta", &self.meta)
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

impl Xpriv {
    pub fn new(versions: XkeyVersions, meta: XkeyMeta, core: XprivCore) -> Self {
        Xpriv {
            versions,
            meta,
            core,
            xpub: OnceLock::new(),
        }
    }

    /// Constructs root key of the tree from the seed bytes.
    pub fn new_master(params: &NetworkParams, seed: &[u8]) -> Result<Xpriv, KeyError> {
        let (l, chain_code) = hmac_sha512(params.seed_key.as_bytes(), seed);
        let private_key = SecretKey::from_slice(&l).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Xpriv::new(params.xkey, XkeyMeta::master(), XprivCore {
            private_key,
            chain_code,
        }))
    }

    /// Decodes key with the version prefix of one of the known networks.
    pub fn decode(data: impl Borrow<[u8]>) -> Result<Xpriv, XkeyDecodeError> {
        let data = data.borrow();
        let version = read_version(data)?;
        let versions =
            XkeyVersions::detect(version).ok_or(XkeyDecodeError::UnknownKeyType(version))?;
        Self::decode_with(data, versions)
    }

    /// Decodes key which must carry the private prefix of `versions`.
    pub fn decode_with(
        data: impl Borrow<[u8]>,
        versions: XkeyVersions,
    ) -> Result<Xpriv, XkeyDecodeError> {
        let data = data.borrow();
        let version = read_version(data)?;
        if version == versions.public {
            return Err(XkeyDecodeError::KeyKindMismatch(version));
        } else if version != versions.private {
            return Err(XkeyDecodeError::UnknownKeyType(version));
        }

        let (meta, chain_code) = XkeyMeta::decode(data);
        if data[45] != 0x00 {
            return Err(XkeyDecodeError::InvalidType(data[45]));
        }
        let private_key =
            SecretKey::from_slice(&data[46..78]).map_err(|_| XkeyDecodeError::InvalidSecretKey)?;

        Ok(Xpriv::new(versions, meta, XprivCore {
            private_key,
            chain_code,
        }))
    }

    pub fn encode(&self) -> [u8; XKEY_LEN] {
        let mut ret = [0; XKEY_LEN];
        self.meta.encode_into(&mut ret, self.versions.private, &self.core.chain_code);
        ret[45] = 0;
        ret[46..78].copy_from_slice(&self.core.private_key.secret_bytes());
        ret
    }

    pub fn versions(&self) -> XkeyVersions { self.versions }

    pub fn depth(&self) -> u8 { self.meta.depth }

    pub fn child_number(&self) -> DerivationIndex { self.meta.child_number }

    pub fn parent_fp(&self) -> XpubFp { self.meta.parent_fp }

    pub fn chain_code(&self) -> ChainCode { self.core.chain_code }

    pub fn secret_key(&self) -> SecretKey { self.core.private_key }

    pub fn fingerprint(&self) -> XpubFp { self.to_xpub().fingerprint() }

    pub fn identifier(&self) -> XpubId { self.to_xpub().identifier() }

    pub fn public_key(&self) -> secp256k1::PublicKey { self.to_xpub().core.public_key }

    pub fn address(&self) -> Address { self.to_xpub().address() }

    pub fn to_xpub(&self) -> Xpub {
        *self.xpub.get_or_init(|| Xpub {
            versions: self.versions,
            meta: self.meta,
            core: XpubCore {
                public_key: self.core.private_key.public_key(SECP256K1),
                chain_code: self.core.chain_code,
            },
        })
    }

    /// Exports the secret key in wallet import format for a compressed public
    /// key.
    pub fn to_wif(&self, params: &NetworkParams) -> String {
        wif::encode(params, &self.core.private_key, true)
    }

    /// Private->Private child key derivation
    pub fn ckd_priv(&self, idx: impl Into<DerivationIndex>) -> Result<Xpriv, DeriveError> {
        let idx = idx.into();
        let meta = self.meta.child(self.fingerprint(), idx)?;

        let mut msg = Vec::with_capacity(37);
        match idx {
            DerivationIndex::Normal(_) => msg.extend(self.public_key().serialize()),
            DerivationIndex::Hardened(_) => {
                msg.push(0u8);
                msg.extend(self.core.private_key.secret_bytes());
            }
        }
        msg.extend(idx.to_be_bytes());
        let (l, chain_code) = hmac_sha512(self.core.chain_code.as_ref(), &msg);

        let invalid = DeriveError::InvalidChild(idx);
        let tweak = Scalar::from_be_bytes(l).map_err(|_| invalid)?;
        let private_key = self.core.private_key.add_tweak(&tweak).map_err(|_| invalid)?;

        Ok(Xpriv::new(self.versions, meta, XprivCore {
            private_key,
            chain_code,
        }))
    }

    /// Attempts to derive an extended private key from a path.
    pub fn derive_priv<I: Into<DerivationIndex> + Copy>(
        &self,
        path: impl AsRef<[I]>,
    ) -> Result<Xpriv, DeriveError> {
        let mut xpriv = self.clone();
        for idx in path.as_ref() {
            xpriv = xpriv.ckd_priv(*idx)?;
        }
        Ok(xpriv)
    }
}

impl Display for Xpriv {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        base58::encode_check_to_fmt(f, &self.encode())
    }
}

impl FromStr for Xpriv {
    type Err = XkeyParseError;

    fn from_str(inp: &str) -> Result<Xpriv, XkeyParseError> {
        let data = base58::decode_check(inp)?;
        Ok(Xpriv::decode(data)?)
    }
}

/// Extended key of either kind.
#[derive(Clone, Eq, PartialEq, Debug, From)]
pub enum ExtendedKey {
    #[from]
    Public(Xpub),
    #[from]
    Private(Xpriv),
}

impl ExtendedKey {
    /// Decodes extended key with a known network prefix, detecting its kind
    /// from the payload.
    pub fn decode(data: impl Borrow<[u8]>) -> Result<Self, XkeyDecodeError> {
        let data = data.borrow();
        read_version(data)?;
        Ok(match data[45] {
            0x00 => ExtendedKey::Private(Xpriv::decode(data)?),
            _ => ExtendedKey::Public(Xpub::decode(data)?),
        })
    }

    pub fn decode_with(
        data: impl Borrow<[u8]>,
        versions: XkeyVersions,
    ) -> Result<Self, XkeyDecodeError> {
        let data = data.borrow();
        read_version(data)?;
        Ok(match data[45] {
            0x00 => ExtendedKey::Private(Xpriv::decode_with(data, versions)?),
            _ => ExtendedKey::Public(Xpub::decode_with(data, versions)?),
        })
    }

    pub fn encode(&self) -> [u8; XKEY_LEN] {
        match self {
            ExtendedKey::Public(xpub) => xpub.encode(),
            ExtendedKey::Private(xpriv) => xpriv.encode(),
        }
    }

    pub fn is_private(&self) -> bool { matches!(self, ExtendedKey::Private(_)) }

    pub fn depth(&self) -> u8 {
        match self {
            ExtendedKey::Public(xpub) => xpub.depth(),
            ExtendedKey::Private(xpriv) => xpriv.depth(),
        }
    }

    pub fn fingerprint(&self) -> XpubFp { self.to_xpub().fingerprint() }

    /// Returns the public projection of the key.
    pub fn to_xpub(&self) -> Xpub {
        match self {
            ExtendedKey::Public(xpub) => *xpub,
            ExtendedKey::Private(xpriv) => xpriv.to_xpub(),
        }
    }

    /// Derives child of the same kind as the key.
    pub fn derive_child(&self, idx: impl Into<DerivationIndex>) -> Result<Self, DeriveError> {
        Ok(match self {
            ExtendedKey::Public(xpub) => ExtendedKey::Public(xpub.ckd_pub(idx)?),
            ExtendedKey::Private(xpriv) => ExtendedKey::Private(xpriv.ckd_priv(idx)?),
        })
    }
}

impl Display for ExtendedKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ExtendedKey::Public(xpub) => Display::fmt(xpub, f),
            ExtendedKey::Private(xpriv) => Display::fmt(xpriv, f),
        }
    }
}

impl FromStr for ExtendedKey {
    type Err = XkeyParseError;

    fn from_str(inp: &str) -> Result<Self, XkeyParseError> {
        let data = base58::decode_check(inp)?;
        Ok(ExtendedKey::decode(data)?)
    }
}

#[cfg(feature = "serde")]
mod _serde {
    use serde_crate::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::*;

    impl Serialize for Xpub {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.to_string())
            } else {
                serializer.serialize_bytes(&self.encode())
            }
        }
    }

    impl<'de> Deserialize<'de> for Xpub {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de> {
            if deserializer.is_human_readable() {
                let s = String::deserialize(deserializer)?;
                Xpub::from_str(&s).map_err(|err| {
                    de::Error::custom(format!("invalid xpub string representation; {err}"))
                })
            } else {
                let v = Vec::<u8>::deserialize(deserializer)?;
                Xpub::decode(v)
                    .map_err(|err| de::Error::custom(format!("invalid xpub bytes; {err}")))
            }
        }
    }
}
