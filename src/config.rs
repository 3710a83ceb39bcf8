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

use derive::{Network, NetworkParams};

use crate::GapLimitError;

/// Parameters of a watched account.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase", default)
)]
pub struct AccountConfig {
    pub network: Network,
    /// Number of unused receive addresses kept past the last used one.
    pub receive_gap_limit: u32,
    /// Number of unused change addresses kept past the last used one.
    pub change_gap_limit: u32,
}

impl Default for AccountConfig {
    fn default() -> Self {
        AccountConfig {
            network: Network::Mainnet,
            receive_gap_limit: Self::RECEIVE_GAP_LIMIT,
            change_gap_limit: Self::CHANGE_GAP_LIMIT,
        }
    }
}

impl AccountConfig {
    pub const RECEIVE_GAP_LIMIT: u32 = 20;
    pub const CHANGE_GAP_LIMIT: u32 = 6;

    pub fn new(network: Network) -> Self {
        AccountConfig {
            network,
            ..default!()
        }
    }

    pub fn with_gap_limits(mut self, receive: u32, change: u32) -> Self {
        self.receive_gap_limit = receive;
        self.change_gap_limit = change;
        self
    }

    pub fn validate(&self) -> Result<(), GapLimitError> {
        if self.receive_gap_limit == 0 || self.change_gap_limit == 0 {
            return Err(GapLimitError::ZeroGapLimit);
        }
        Ok(())
    }

    pub fn params(&self) -> NetworkParams { self.network.params() }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = AccountConfig::default();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.receive_gap_limit, 20);
        assert_eq!(config.change_gap_limit, 6);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(AccountConfig::new(Network::Testnet).params().cashaddr_prefix, "bchtest");
    }

    #[test]
    fn zero_gap() {
        let config = AccountConfig::default().with_gap_limits(5, 0);
        assert_eq!(config.validate(), Err(GapLimitError::ZeroGapLimit));
    }
}
