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

use std::str::FromStr;

/// HMAC key used to turn seed bytes into the BIP32 master key. It is the same
/// for all the networks.
pub const BIP32_SEED_KEY: &str = "Bitcoin seed";

/// Four-byte prefixes of the 78-byte BIP32 serialization.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct XkeyVersions {
    /// Prefix of the extended public keys (`xpub`, `tpub`).
    pub public: [u8; 4],
    /// Prefix of the extended private keys (`xprv`, `tprv`).
    pub private: [u8; 4],
}

impl XkeyVersions {
    pub const MAINNET: Self = XkeyVersions {
        public: [0x04, 0x88, 0xB2, 0x1E],
        private: [0x04, 0x88, 0xAD, 0xE4],
    };

    pub const TESTNET: Self = XkeyVersions {
        public: [0x04, 0x35, 0x87, 0xCF],
        private: [0x04, 0x35, 0x83, 0x94],
    };

    /// Finds the version set of a known network containing the given prefix,
    /// either as a public or as a private one.
    pub fn detect(magic: [u8; 4]) -> Option<Self> {
        [Self::MAINNET, Self::TESTNET]
            .into_iter()
            .find(|versions| versions.public == magic || versions.private == magic)
    }
}

/// Network used by the wallet.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(lowercase)]
pub enum Network {
    /// Bitcoin Cash mainnet
    #[display("bitcoincash")]
    Mainnet,

    /// Bitcoin Cash testnet
    Testnet,

    /// Local regtest networks
    Regtest,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Testnet, Network::Regtest];

    /// Detects whether the network is a kind of test network.
    pub fn is_testnet(self) -> bool { self != Self::Mainnet }

    pub fn params(self) -> NetworkParams { NetworkParams::from(self) }
}

impl Default for Network {
    fn default() -> Self { Network::Mainnet }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown network '{0}'")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bitcoincash" | "mainnet" => Network::Mainnet,
            "testnet" | "bchtest" => Network::Testnet,
            "regtest" | "bchreg" => Network::Regtest,
            other => return Err(UnknownNetwork(other.to_owned())),
        })
    }
}

/// Network constants consumed by the key and address codecs.
///
/// The parameters are always passed explicitly; nothing in the library reads
/// them from a global state. Presets are available through [`Network`], and
/// custom sets may be constructed field by field.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct NetworkParams {
    /// Legacy version byte of pay-to-pubkey-hash addresses.
    pub p2pkh_version: u8,
    /// Legacy version byte of pay-to-script-hash addresses.
    pub p2sh_version: u8,
    /// Transitional (BitPay) version byte of pay-to-pubkey-hash addresses.
    pub bitpay_p2pkh_version: u8,
    /// Transitional (BitPay) version byte of pay-to-script-hash addresses.
    pub bitpay_p2sh_version: u8,
    /// Human-readable CashAddr prefix, without the `:` separator.
    pub cashaddr_prefix: String,
    /// Version byte of the wallet import format.
    pub wif_version: u8,
    /// Extended key prefixes.
    pub xkey: XkeyVersions,
    /// HMAC key deriving master key from the seed.
    pub seed_key: String,
}

impl NetworkParams {
    pub fn mainnet() -> Self {
        NetworkParams {
            p2pkh_version: 0x00,
            p2sh_version: 0x05,
            bitpay_p2pkh_version: 0x1c,
            bitpay_p2sh_version: 0x28,
            cashaddr_prefix: s!("bitcoincash"),
            wif_version: 0x80,
            xkey: XkeyVersions::MAINNET,
            seed_key: BIP32_SEED_KEY.to_owned(),
        }
    }

    pub fn testnet() -> Self {
        NetworkParams {
            p2pkh_version: 0x6f,
            p2sh_version: 0xc4,
            bitpay_p2pkh_version: 0x1c,
            bitpay_p2sh_version: 0x28,
            cashaddr_prefix: s!("bchtest"),
            wif_version: 0xef,
            xkey: XkeyVersions::TESTNET,
            seed_key: BIP32_SEED_KEY.to_owned(),
        }
    }

    pub fn regtest() -> Self {
        NetworkParams {
            cashaddr_prefix: s!("bchreg"),
            ..Self::testnet()
        }
    }
}

impl Default for NetworkParams {
    fn default() -> Self { Self::mainnet() }
}

impl From<Network> for NetworkParams {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => NetworkParams::mainnet(),
            Network::Testnet => NetworkParams::testnet(),
            Network::Regtest => NetworkParams::regtest(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn network_names() {
        for network in Network::ALL {
            assert_eq!(Network::from_str(&network.to_string()), Ok(network));
        }
        assert_eq!(Network::from_str("mainnet"), Ok(Network::Mainnet));
        assert_eq!(Network::from_str("dogecoin"), Err(UnknownNetwork(s!("dogecoin"))));
    }

    #[test]
    fn xkey_version_detection() {
        assert_eq!(XkeyVersions::detect([0x04, 0x88, 0xAD, 0xE4]), Some(XkeyVersions::MAINNET));
        assert_eq!(XkeyVersions::detect([0x04, 0x35, 0x87, 0xCF]), Some(XkeyVersions::TESTNET));
        assert_eq!(XkeyVersions::detect([0; 4]), None);
    }

    #[test]
    fn seed_key_is_shared() {
        for network in Network::ALL {
            assert_eq!(network.params().seed_key, "Bitcoin seed");
        }
    }

    #[test]
    fn regtest_differs_by_prefix() {
        let regtest = Network::Regtest.params();
        let testnet = Network::Testnet.params();
        assert_eq!(regtest.cashaddr_prefix, "bchreg");
        assert_eq!(regtest.p2pkh_version, testnet.p2pkh_version);
        assert_eq!(regtest.xkey, testnet.xkey);
    }
}
