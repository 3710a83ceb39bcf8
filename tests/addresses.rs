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

use cashwallet::{
    Address, AddressFormat, AddressKind, AddressParseError, CashAddrError, NetworkParams,
    PublicKey,
};

const PUBKEY: &str = "0250863ad64a87ae8a2fe83c1af1a8403cb53f53e486d8511dad8a04887e5b2352";

// (format, kind, mainnet text)
const MAINNET: [(AddressFormat, AddressKind, &str); 6] = [
    (AddressFormat::Legacy, AddressKind::P2pkh, "1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs"),
    (AddressFormat::BitPay, AddressKind::P2pkh, "CepsBcxrBdRNr5DGRLGSkkUoxzmXLyxAqj"),
    (
        AddressFormat::CashAddr,
        AddressKind::P2pkh,
        "bitcoincash:qr655kz3aymjhpupp28xpnwjul8aszmwxywced30gc",
    ),
    (AddressFormat::Legacy, AddressKind::P2sh, "3Q3zY87DrUmE371Grgc7bsDiVPqpu4mN1f"),
    (AddressFormat::BitPay, AddressKind::P2sh, "HUt6zvYJhnytfGtJiNGGaFkFX3rqph9BC5"),
    (
        AddressFormat::CashAddr,
        AddressKind::P2sh,
        "bitcoincash:pr655kz3aymjhpupp28xpnwjul8aszmwxyeayzkvn9",
    ),
];

fn key_hash() -> [u8; 20] { PublicKey::from_str(PUBKEY).unwrap().address().hash160() }

#[test]
fn pubkey_in_all_formats() {
    let params = NetworkParams::mainnet();
    let hash = key_hash();
    for (format, kind, text) in MAINNET {
        let address = Address::new(hash, kind);
        assert_eq!(address.to_text(format, &params), text);
        assert_eq!(Address::parse(text, &params), Ok((address, format)));
    }
}

#[test]
fn testnet() {
    let params = NetworkParams::testnet();
    let address = Address::p2pkh(key_hash());
    assert_eq!(
        address.to_text(AddressFormat::Legacy, &params),
        "n3svudhm7bt6j3nTT9uu1A57Cs9pKK3iXW"
    );
    assert_eq!(
        address.to_text(AddressFormat::CashAddr, &params),
        "bchtest:qr655kz3aymjhpupp28xpnwjul8aszmwxy22a2nc0y"
    );
    assert_eq!(
        Address::p2sh(key_hash()).to_text(AddressFormat::Legacy, &params),
        "2NFcCbs3FTwGaEtdpXpDzDpCyhk3znhQzzo"
    );
    // BitPay versions are the same on all networks
    assert_eq!(
        address.to_text(AddressFormat::BitPay, &params),
        address.to_text(AddressFormat::BitPay, &NetworkParams::mainnet())
    );
}

#[test]
fn cashaddr_text_variants() {
    let params = NetworkParams::mainnet();
    let address = Address::p2pkh(key_hash());
    let upper = "BITCOINCASH:QR655KZ3AYMJHPUPP28XPNWJUL8ASZMWXYWCED30GC";
    assert_eq!(Address::from_text(upper, &params), Ok(address));
    let bare = "qr655kz3aymjhpupp28xpnwjul8aszmwxywced30gc";
    assert_eq!(Address::from_text(bare, &params), Ok(address));

    assert!(matches!(
        Address::from_text("bitcoincash:qr655kz3aymjhpupp28xpnwjul8aszmwxywced30gC", &params),
        Err(AddressParseError::CashAddr(CashAddrError::MixedCase))
    ));
    assert!(matches!(
        Address::from_text("bitcoincash:qr655kz3aymjhpupp28xpnwjul8aszmwxywced30gq", &params),
        Err(AddressParseError::CashAddr(CashAddrError::InvalidChecksum))
    ));
    assert!(matches!(
        Address::from_text(
            "bchtest:qr655kz3aymjhpupp28xpnwjul8aszmwxy22a2nc0y",
            &NetworkParams::mainnet()
        ),
        Err(AddressParseError::CashAddr(CashAddrError::PrefixMismatch { .. }))
    ));
}

#[test]
fn legacy_wrong_network() {
    assert_eq!(
        Address::from_text("1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs", &NetworkParams::testnet()),
        Err(AddressParseError::InvalidAddressVersion(0x00))
    );
}

#[test]
fn scripts() {
    let address = Address::p2pkh(key_hash());
    let script = address.to_script();
    assert!(script.is_p2pkh());
    assert_eq!(Address::from_script(&script), Some(address));
    assert_eq!(address.to_scripthash(), script.script_hash());

    let p2sh = Address::p2sh(key_hash());
    assert!(p2sh.to_script().is_p2sh());
    assert_ne!(p2sh.to_scripthash(), address.to_scripthash());
}
