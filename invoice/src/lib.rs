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

//! Address layer of the wallet: network parameters, Base58Check, locking
//! scripts and the three address text formats (legacy, BitPay, CashAddr).

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub mod base58;
pub mod cashaddr;
mod network;
mod script;
mod address;

pub use address::{
    Address, AddressDisplay, AddressFormat, AddressKind, AddressParseError, LEGACY_MAX_LEN,
};
pub use cashaddr::CashAddrError;
pub use network::{Network, NetworkParams, UnknownNetwork, XkeyVersions, BIP32_SEED_KEY};
pub use script::{opcodes, ScriptHash, ScriptPubkey};
