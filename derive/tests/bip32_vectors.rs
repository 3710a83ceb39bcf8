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

use amplify::hex::FromHex;
use derive::{
    DerivationIndex, DeriveError, ExtendedKey, HardenedIndex, NetworkParams, NormalIndex, Xpriv,
    Xpub, HARDENED_INDEX_BOUNDARY,
};

fn master(seed: &str) -> Xpriv {
    Xpriv::new_master(&NetworkParams::mainnet(), &Vec::<u8>::from_hex(seed).unwrap()).unwrap()
}

const VECTOR_1: [(&str, &str); 6] = [
    (
        "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi",
        "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8",
    ),
    (
        "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7",
        "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw",
    ),
    (
        "xprv9wTYmMFdV23N2TdNG573QoEsfRrWKQgWeibmLntzniatZvR9BmLnvSxqu53Kw1UmYPxLgboyZQaXwTCg8MSY3H2EU4pWcQDnRnrVA1xe8fs",
        "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ",
    ),
    (
        "xprv9z4pot5VBttmtdRTWfWQmoH1taj2axGVzFqSb8C9xaxKymcFzXBDptWmT7FwuEzG3ryjH4ktypQSAewRiNMjANTtpgP4mLTj34bhnZX7UiM",
        "xpub6D4BDPcP2GT577Vvch3R8wDkScZWzQzMMUm3PWbmWvVJrZwQY4VUNgqFJPMM3No2dFDFGTsxxpG5uJh7n7epu4trkrX7x7DogT5Uv6fcLW5",
    ),
    (
        "xprvA2JDeKCSNNZky6uBCviVfJSKyQ1mDYahRjijr5idH2WwLsEd4Hsb2Tyh8RfQMuPh7f7RtyzTtdrbdqqsunu5Mm3wDvUAKRHSC34sJ7in334",
        "xpub6FHa3pjLCk84BayeJxFW2SP4XRrFd1JYnxeLeU8EqN3vDfZmbqBqaGJAyiLjTAwm6ZLRQUMv1ZACTj37sR62cfN7fe5JnJ7dh8zL4fiyLHV",
    ),
    (
        "xprvA41z7zogVVwxVSgdKUHDy1SKmdb533PjDz7J6N6mV6uS3ze1ai8FHa8kmHScGpWmj4WggLyQjgPie1rFSruoUihUZREPSL39UNdE3BBDu76",
        "xpub6H1LXWLaKsWFhvm6RVpEL9P4KfRZSW7abD2ttkWP3SSQvnyA8FSVqNTEcYFgJS2UaFcxupHiYkro49S8yGasTvXEYBVPamhGW6cFJodrTHy",
    ),
];

#[test]
fn bip32_vector_1() {
    let path = [
        DerivationIndex::hardened(0),
        DerivationIndex::normal(1),
        DerivationIndex::hardened(2),
        DerivationIndex::normal(2),
        DerivationIndex::from(1_000_000_000u32),
    ];

    let mut xpriv = master("000102030405060708090a0b0c0d0e0f");
    for (depth, (xprv_str, xpub_str)) in VECTOR_1.iter().enumerate() {
        if depth > 0 {
            xpriv = xpriv.ckd_priv(path[depth - 1]).unwrap();
        }
        assert_eq!(xpriv.depth() as usize, depth);
        assert_eq!(xpriv.to_string(), *xprv_str);
        assert_eq!(xpriv.to_xpub().to_string(), *xpub_str);
        assert_eq!(Xpriv::from_str(xprv_str).unwrap(), xpriv);
        assert_eq!(Xpub::from_str(xpub_str).unwrap(), xpriv.to_xpub());
    }

    let by_path = master("000102030405060708090a0b0c0d0e0f").derive_priv(path).unwrap();
    assert_eq!(by_path, xpriv);
}

#[test]
fn bip32_vector_2_public_derivation() {
    let xpriv = master(
        "fffcf9f6f3f0edeae7e4e1dedbd8d5d2cfccc9c6c3c0bdbab7b4b1aeaba8a5a29f9c999693908d8a8784817e7b7875726f6c696663605d5a5754514e4b484542",
    );
    let xpub = xpriv.to_xpub();
    assert_eq!(
        xpub.to_string(),
        "xpub661MyMwAqRbcFW31YEwpkMuc5THy2PSt5bDMsktWQcFF8syAmRUapSCGu8ED9W6oDMSgv6Zz8idoc4a6mr8BDzTJY47LJhkJ8UB7WEGuduB"
    );
    assert_eq!(xpub.fingerprint().to_string(), "bd16bee5");

    let child = xpub.ckd_pub(NormalIndex::ZERO).unwrap();
    assert_eq!(
        child.to_string(),
        "xpub69H7F5d8KSRgmmdJg2KhpAK8SR3DjMwAdkxj3ZuxV27CprR9LgpeyGmXUbC6wb7ERfvrnKZjXoUmmDznezpbZb7ap6r1D3tgFxHmwMkQTPH"
    );
    assert_eq!(child.parent_fp(), xpub.fingerprint());
    assert_eq!(xpub.derive_pub([NormalIndex::ZERO]).unwrap(), child);
}

#[test]
fn derivation_is_deterministic() {
    let xpub = master("000102030405060708090a0b0c0d0e0f").to_xpub();
    let idx = NormalIndex::normal(42);
    assert_eq!(xpub.ckd_pub(idx).unwrap(), xpub.ckd_pub(idx).unwrap());
    assert_eq!(xpub.child_pubkey(idx).unwrap(), xpub.ckd_pub(idx).unwrap().to_pubkey());
    assert_ne!(xpub.ckd_pub(idx).unwrap(), xpub.ckd_pub(NormalIndex::normal(43)).unwrap());
}

#[test]
fn public_derivation_rejects_hardened() {
    let xpub = master("000102030405060708090a0b0c0d0e0f").to_xpub();
    let err = xpub.ckd_pub(HARDENED_INDEX_BOUNDARY).unwrap_err();
    assert_eq!(err, DeriveError::HardenedFromPublic(HardenedIndex::ZERO));
    assert!(!err.is_recoverable());
    assert!(xpub.ckd_pub(HARDENED_INDEX_BOUNDARY - 1).is_ok());
}

#[test]
fn extended_key_dispatch() {
    let (xprv, xpub) = VECTOR_1[3];
    let key = ExtendedKey::from_str(xprv).unwrap();
    assert!(key.is_private());
    assert_eq!(key.depth(), 3);
    assert_eq!(key.to_xpub(), Xpub::from_str(xpub).unwrap());

    let key = ExtendedKey::from_str(xpub).unwrap();
    assert!(!key.is_private());
    assert_eq!(key.to_string(), xpub);
    assert_eq!(
        key.derive_child(2u32).unwrap().to_string(),
        ExtendedKey::from_str(VECTOR_1[4].1).unwrap().to_string()
    );
}
