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

//! Address value type and its text formats.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use amplify::hex::ToHex;
use bitcoin_hashes::{hash160, Hash};

use crate::{base58, cashaddr, CashAddrError, NetworkParams, ScriptHash, ScriptPubkey};

/// Legacy addresses are never longer than this; anything longer is parsed as
/// CashAddr.
pub const LEGACY_MAX_LEN: usize = 35;

/// Errors parsing address strings.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum AddressParseError {
    /// wrong Base58 encoding of address data - {0}
    #[from]
    Base58(base58::Error),

    /// wrong CashAddr encoding of address data - {0}
    #[from]
    CashAddr(CashAddrError),

    /// legacy address has an invalid version byte {0:#04x}.
    InvalidAddressVersion(u8),

    /// CashAddr address has unsupported type {0}.
    InvalidCashAddrType(u8),

    /// address contains hash of invalid length {0}.
    InvalidHashLength(usize),

    /// unrecognized address kind string; must be one of `P2PKH`, `P2SH`
    UnrecognizedAddressKind,

    /// unrecognized address format string; must be one of `legacy`, `cashaddr`,
    /// `bitpay`
    UnrecognizedAddressFormat,
}

/// Kind of the locking script an address commits to.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum AddressKind {
    /// Pay-to-public key hash
    #[display("P2PKH")]
    P2pkh,

    /// Pay-to-script hash
    #[display("P2SH")]
    P2sh,
}

impl AddressKind {
    /// Type bits of the CashAddr version byte.
    pub const fn cashaddr_type(self) -> u8 {
        match self {
            AddressKind::P2pkh => 0,
            AddressKind::P2sh => 1,
        }
    }

    pub const fn from_cashaddr_type(ty: u8) -> Option<Self> {
        match ty {
            0 => Some(AddressKind::P2pkh),
            1 => Some(AddressKind::P2sh),
            _ => None,
        }
    }
}

impl FromStr for AddressKind {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[allow(clippy::match_str_case_mismatch)]
        Ok(match s.to_uppercase().as_str() {
            "P2PKH" => AddressKind::P2pkh,
            "P2SH" => AddressKind::P2sh,
            _ => return Err(AddressParseError::UnrecognizedAddressKind),
        })
    }
}

/// Text representation used when rendering an address.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(lowercase)]
pub enum AddressFormat {
    /// Base58Check with the network legacy version bytes.
    Legacy,

    /// Checksummed base32 with the network prefix.
    #[default]
    #[display("cashaddr")]
    CashAddr,

    /// Base58Check with the transitional BitPay version bytes.
    #[display("bitpay")]
    BitPay,
}

impl AddressFormat {
    pub const ALL: [AddressFormat; 3] =
        [AddressFormat::Legacy, AddressFormat::CashAddr, AddressFormat::BitPay];
}

impl FromStr for AddressFormat {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "legacy" => AddressFormat::Legacy,
            "cashaddr" => AddressFormat::CashAddr,
            "bitpay" => AddressFormat::BitPay,
            _ => return Err(AddressParseError::UnrecognizedAddressFormat),
        })
    }
}

/// Address: a 160-bit hash together with the kind of script it locks to.
///
/// The type carries no network information; the network parameters and the
/// text format are provided each time an address is rendered or parsed.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct Address {
    hash160: [u8; 20],
    kind: AddressKind,
}

impl Address {
    pub const fn new(hash160: [u8; 20], kind: AddressKind) -> Self { Address { hash160, kind } }

    pub const fn p2pkh(hash160: [u8; 20]) -> Self { Self::new(hash160, AddressKind::P2pkh) }

    pub const fn p2sh(hash160: [u8; 20]) -> Self { Self::new(hash160, AddressKind::P2sh) }

    /// Constructs P2PKH address of a serialized public key.
    pub fn from_pubkey(pubkey: &[u8]) -> Self {
        Self::p2pkh(hash160::Hash::hash(pubkey).to_byte_array())
    }

    /// Constructs P2SH address of a redeem script.
    pub fn from_redeem_script(script: &[u8]) -> Self {
        Self::p2sh(hash160::Hash::hash(script).to_byte_array())
    }

    /// Constructs address for a given `scriptPubkey`, if the script matches
    /// one of the address templates.
    pub fn from_script(script: &ScriptPubkey) -> Option<Self> {
        let mut hash = [0u8; 20];
        if script.is_p2pkh() {
            hash.copy_from_slice(&script[3..23]);
            Some(Self::p2pkh(hash))
        } else if script.is_p2sh() {
            hash.copy_from_slice(&script[2..22]);
            Some(Self::p2sh(hash))
        } else {
            None
        }
    }

    pub const fn hash160(&self) -> [u8; 20] { self.hash160 }

    pub const fn kind(&self) -> AddressKind { self.kind }

    /// Returns locking script corresponding to the address.
    pub fn to_script(&self) -> ScriptPubkey {
        match self.kind {
            AddressKind::P2pkh => ScriptPubkey::p2pkh(self.hash160),
            AddressKind::P2sh => ScriptPubkey::p2sh(self.hash160),
        }
    }

    /// Returns the hash of the locking script used for history subscriptions.
    pub fn to_scripthash(&self) -> ScriptHash { self.to_script().script_hash() }

    /// Base58Check version byte of the address in a legacy-style format.
    ///
    /// Returns `None` for [`AddressFormat::CashAddr`].
    pub fn legacy_version(&self, format: AddressFormat, params: &NetworkParams) -> Option<u8> {
        Some(match (format, self.kind) {
            (AddressFormat::Legacy, AddressKind::P2pkh) => params.p2pkh_version,
            (AddressFormat::Legacy, AddressKind::P2sh) => params.p2sh_version,
            (AddressFormat::BitPay, AddressKind::P2pkh) => params.bitpay_p2pkh_version,
            (AddressFormat::BitPay, AddressKind::P2sh) => params.bitpay_p2sh_version,
            (AddressFormat::CashAddr, _) => return None,
        })
    }

    /// Returns a [`Display`] adaptor rendering the address in the given format.
    pub fn display<'a>(
        &'a self,
        format: AddressFormat,
        params: &'a NetworkParams,
    ) -> AddressDisplay<'a> {
        AddressDisplay {
            address: self,
            format,
            params,
        }
    }

    pub fn to_text(&self, format: AddressFormat, params: &NetworkParams) -> String {
        self.display(format, params).to_string()
    }

    /// Parses address in any of the supported formats.
    pub fn from_text(s: &str, params: &NetworkParams) -> Result<Self, AddressParseError> {
        Self::parse(s, params).map(|(address, _)| address)
    }

    /// Parses address in any of the supported formats, reporting the format
    /// which was detected.
    pub fn parse(
        s: &str,
        params: &NetworkParams,
    ) -> Result<(Self, AddressFormat), AddressParseError> {
        if s.len() > LEGACY_MAX_LEN {
            let address = Self::parse_cashaddr(s, params)?;
            return Ok((address, AddressFormat::CashAddr));
        }

        let data = base58::decode_check_len(s, 21)?;
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&data[1..]);
        let (kind, format) = match data[0] {
            v if v == params.p2pkh_version => (AddressKind::P2pkh, AddressFormat::Legacy),
            v if v == params.p2sh_version => (AddressKind::P2sh, AddressFormat::Legacy),
            v if v == params.bitpay_p2pkh_version => (AddressKind::P2pkh, AddressFormat::BitPay),
            v if v == params.bitpay_p2sh_version => (AddressKind::P2sh, AddressFormat::BitPay),
            v => return Err(AddressParseError::InvalidAddressVersion(v)),
        };
        Ok((Address::new(hash, kind), format))
    }

    fn parse_cashaddr(s: &str, params: &NetworkParams) -> Result<Self, AddressParseError> {
        let (ty, payload) = cashaddr::decode(s, &params.cashaddr_prefix)?;
        let kind =
            AddressKind::from_cashaddr_type(ty).ok_or(AddressParseError::InvalidCashAddrType(ty))?;
        if payload.len() != 20 {
            return Err(AddressParseError::InvalidHashLength(payload.len()));
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload);
        Ok(Address::new(hash, kind))
    }
}

/// Address rendered in a specific format for a specific network.
#[derive(Copy, Clone, Debug)]
pub struct AddressDisplay<'a> {
    address: &'a Address,
    format: AddressFormat,
    params: &'a NetworkParams,
}

impl Display for AddressDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.address.legacy_version(self.format, self.params) {
            Some(version) => {
                let mut prefixed = [0u8; 21];
                prefixed[0] = version;
                prefixed[1..].copy_from_slice(&self.address.hash160);
                base58::encode_check_to_fmt(f, &prefixed)
            }
            None => f.write_str(&cashaddr::encode(
                &self.params.cashaddr_prefix,
                self.address.kind.cashaddr_type(),
                &self.address.hash160,
            )),
        }
    }
}

impl Display for Address {
    /// Network-independent form: kind and the hex of the hash.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.hash160[..].to_hex())
    }
}

#[cfg(test)]
mod test {
    use amplify::hex::FromHex;

    use super::*;

    fn hash(hex: &str) -> [u8; 20] {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&Vec::<u8>::from_hex(hex).unwrap());
        hash
    }

    #[test]
    fn known_pubkey_address() {
        let pk = Vec::<u8>::from_hex(
            "0250863ad64a87ae8a2fe83c1af1a8403cb53f53e486d8511dad8a04887e5b2352",
        )
        .unwrap();
        let params = NetworkParams::mainnet();
        let addr = Address::from_pubkey(&pk);
        assert_eq!(addr.hash160(), hash("f54a5851e9372b87810a8e60cdd2e7cfd80b6e31"));
        assert_eq!(addr.to_text(AddressFormat::Legacy, &params), "1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs");
        assert_eq!(
            addr.to_text(AddressFormat::CashAddr, &params),
            "bitcoincash:qr655kz3aymjhpupp28xpnwjul8aszmwxywced30gc"
        );
    }

    #[test]
    fn all_formats() {
        let params = NetworkParams::mainnet();
        let h = hash("76a04053bda0a88bda5177b86a15c3b29f559873");
        let pkh = Address::p2pkh(h);
        let sh = Address::p2sh(h);

        assert_eq!(pkh.to_text(AddressFormat::Legacy, &params), "1BpEi6DfDAUFd7GtittLSdBeYJvcoaVggu");
        assert_eq!(sh.to_text(AddressFormat::Legacy, &params), "3CWFddi6m4ndiGyKqzYvsFYagqDLPVMTzC");
        assert_eq!(pkh.to_text(AddressFormat::BitPay, &params), "CTH8H8Zj6DSnXFBKQeDG28ogAS92iS16Bp");
        assert_eq!(sh.to_text(AddressFormat::BitPay, &params), "HHLN6S9BcP1JLSrMhgD5qe57iVEMFMLCBT");
        assert_eq!(
            pkh.to_text(AddressFormat::CashAddr, &params),
            "bitcoincash:qpm2qsznhks23z7629mms6s4cwef74vcwvy22gdx6a"
        );
        assert_eq!(
            sh.to_text(AddressFormat::CashAddr, &params),
            "bitcoincash:ppm2qsznhks23z7629mms6s4cwef74vcwvn0h829pq"
        );
    }

    #[test]
    fn roundtrip_every_format() {
        for params in [NetworkParams::mainnet(), NetworkParams::testnet()] {
            for addr in [Address::p2pkh([0x11; 20]), Address::p2sh([0xEE; 20])] {
                for format in AddressFormat::ALL {
                    let s = addr.to_text(format, &params);
                    assert_eq!(Address::parse(&s, &params), Ok((addr, format)), "{s}");
                }
            }
        }
    }

    #[test]
    fn parse_failures() {
        let params = NetworkParams::mainnet();
        let testnet = NetworkParams::testnet();

        let legacy = Address::p2pkh([1; 20]).to_text(AddressFormat::Legacy, &testnet);
        assert_eq!(
            Address::from_text(&legacy, &params),
            Err(AddressParseError::InvalidAddressVersion(0x6f))
        );

        let cash = Address::p2pkh([1; 20]).to_text(AddressFormat::CashAddr, &testnet);
        assert!(matches!(
            Address::from_text(&cash, &params),
            Err(AddressParseError::CashAddr(CashAddrError::PrefixMismatch { .. }))
        ));

        let short = base58::encode_check(&[0u8; 20]);
        assert_eq!(
            Address::from_text(&short, &params),
            Err(AddressParseError::Base58(base58::Error::InvalidLength(20)))
        );
    }

    #[test]
    fn script_roundtrip() {
        for addr in [Address::p2pkh([7; 20]), Address::p2sh([9; 20])] {
            assert_eq!(Address::from_script(&addr.to_script()), Some(addr));
        }
        assert_eq!(Address::from_script(&ScriptPubkey::p2pk(&[2; 33])), None);
    }

    #[test]
    fn format_names() {
        for format in AddressFormat::ALL {
            assert_eq!(AddressFormat::from_str(&format.to_string()), Ok(format));
        }
        assert_eq!(AddressKind::from_str("p2sh"), Ok(AddressKind::P2sh));
    }
}
