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

//! BIP32 key tree over secp256k1: child indexes, extended keys, their
//! serialization and the wallet import format.

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub mod curve;
mod index;
mod xkey;
mod pubkey;
pub mod wif;

pub use curve::{CurveError, Point};
pub use index::{
    DerivationIndex, HardenedIndex, IndexError, IndexParseError, NormalIndex,
    HARDENED_INDEX_BOUNDARY,
};
pub use invoice::*;
pub use pubkey::{HdPublicKey, PubkeyParseError, PublicKey};
pub use wif::{WifError, WifKey};
pub use xkey::{
    ChainCode, DeriveError, ExtendedKey, KeyError, XkeyDecodeError, XkeyMeta, XkeyParseError,
    Xpriv, XprivCore, Xpub, XpubCore, XpubFp, XpubId, XKEY_LEN,
};
