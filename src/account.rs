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

//! Account synchronization.
//!
//! An account owns receive and change [`GapLimitList`]s derived from children
//! 0 and 1 of the account key. Once started it subscribes every address with
//! a [`HistoryProvider`] and runs a gap-check task on the tokio runtime. The
//! task is the only writer of the lists: it wakes up on every history update,
//! extends the lists past the highest used index and subscribes the new
//! addresses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use derive::{
    Address, AddressFormat, ExtendedKey, HdPublicKey, NetworkParams, NormalIndex, ScriptHash,
    Xpriv, Xpub,
};
use indexmap::IndexMap;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::{AccountConfig, GapLimitError, GapLimitList, TxHistory};

/// Remote service tracking address histories, such as an Electrum server.
///
/// After a successful subscription the provider is expected to report the
/// address history through [`Account::set_address_history`], now and on every
/// change.
pub trait HistoryProvider: Send + Sync + 'static {
    type Error: std::error::Error;

    fn subscribe(&self, address: &Address, scripthash: &ScriptHash) -> Result<(), Self::Error>;
}

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[display(lowercase)]
pub enum AccountState {
    /// Created; the lookahead window exists, nothing is subscribed.
    Idle,
    /// Initial subscription of all addresses is in progress.
    Subscribing,
    /// Gap-check task is running.
    Watching,
    /// Closed; the task has been stopped.
    Closed,
}

/// Branch of the account key tree.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[display(lowercase)]
pub enum Keychain {
    Receive,
    Change,
}

impl Keychain {
    pub const ALL: [Keychain; 2] = [Keychain::Receive, Keychain::Change];

    /// Child of the account key which is the root of the branch.
    pub const fn index(self) -> NormalIndex {
        match self {
            Keychain::Receive => NormalIndex::ZERO,
            Keychain::Change => NormalIndex::ONE,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum AccountError {
    /// account can be started only from the idle state, while it is {0}.
    NotIdle(AccountState),

    /// gap-check task requires a running tokio runtime.
    NoRuntime,

    #[display(inner)]
    #[from]
    #[from(derive::DeriveError)]
    GapLimit(GapLimitError),
}

struct Shared<P: HistoryProvider> {
    provider: P,
    params: NetworkParams,
    receive: RwLock<GapLimitList<Xpub>>,
    change: RwLock<GapLimitList<Xpub>>,
    history: Mutex<IndexMap<Address, TxHistory>>,
    state: Mutex<AccountState>,
    closed: AtomicBool,
    gap_signal: Notify,
}

impl<P: HistoryProvider> Shared<P> {
    fn list(&self, keychain: Keychain) -> &RwLock<GapLimitList<Xpub>> {
        match keychain {
            Keychain::Receive => &self.receive,
            Keychain::Change => &self.change,
        }
    }

    // A panic while holding a lock can't break the list invariants, since
    // every append completes before the guard is released.
    fn read_list(&self, keychain: Keychain) -> RwLockReadGuard<'_, GapLimitList<Xpub>> {
        self.list(keychain).read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_list(&self, keychain: Keychain) -> RwLockWriteGuard<'_, GapLimitList<Xpub>> {
        self.list(keychain).write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_history(&self) -> MutexGuard<'_, IndexMap<Address, TxHistory>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, AccountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves from `from` to `to`, returning the actual state on mismatch.
    fn transition(&self, from: AccountState, to: AccountState) -> Result<(), AccountState> {
        let mut state = self.lock_state();
        if *state != from {
            return Err(*state);
        }
        log::info!("account state {from} -> {to}");
        *state = to;
        Ok(())
    }

    fn addresses(&self, keychain: Keychain) -> Vec<Address> {
        self.read_list(keychain).entries().iter().map(HdPublicKey::address).collect()
    }

    fn max_used_index(&self, keychain: Keychain) -> Option<NormalIndex> {
        let list = self.read_list(keychain);
        let history = self.lock_history();
        list.max_used(|key| history.get(&key.address()).is_some_and(TxHistory::is_used))
    }

    fn subscribe(&self, address: &Address) {
        let scripthash = address.to_scripthash();
        let text = address.display(AddressFormat::CashAddr, &self.params);
        log::debug!("subscribing to {text} ({scripthash})");
        if let Err(err) = self.provider.subscribe(address, &scripthash) {
            log::warn!("unable to subscribe to {text}: {err}");
        }
    }

    fn gap_check(&self) -> Result<Vec<Address>, AccountError> {
        let mut fresh = vec![];
        let mut failure = None;
        for keychain in Keychain::ALL {
            let max_used = self.max_used_index(keychain);
            let mut list = self.write_list(keychain);
            let start = list.len();
            if let Err(err) = list.generate_gap(max_used) {
                failure.get_or_insert(err);
            }
            fresh.extend(list.entries()[start..].iter().map(HdPublicKey::address));
        }

        if matches!(*self.lock_state(), AccountState::Subscribing | AccountState::Watching) {
            for address in &fresh {
                self.subscribe(address);
            }
        }

        match failure {
            Some(err) => Err(err.into()),
            None => Ok(fresh),
        }
    }

    async fn run(self: Arc<Self>) {
        log::debug!("gap-check task started");
        loop {
            self.gap_signal.notified().await;
            if self.closed.load(Ordering::Acquire) {
                break;
            }
            match self.gap_check() {
                Ok(fresh) if !fresh.is_empty() => {
                    log::debug!("gap check added {} addresses", fresh.len())
                }
                Ok(_) => {}
                Err(err) => log::error!("gap check failed: {err}"),
            }
        }
        log::debug!("gap-check task stopped");
    }
}

/// Watch-only HD account.
pub struct Account<P: HistoryProvider> {
    xpub: Xpub,
    config: AccountConfig,
    shared: Arc<Shared<P>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<P: HistoryProvider> Account<P> {
    /// Creates account from the account-level extended public key and
    /// generates the initial lookahead window of both branches.
    pub fn new(xpub: Xpub, config: AccountConfig, provider: P) -> Result<Self, AccountError> {
        config.validate()?;
        let mut receive =
            GapLimitList::new(xpub.ckd_pub(Keychain::Receive.index())?, config.receive_gap_limit)?;
        let mut change =
            GapLimitList::new(xpub.ckd_pub(Keychain::Change.index())?, config.change_gap_limit)?;
        receive.generate_gap(None)?;
        change.generate_gap(None)?;

        log::info!(
            "account {} ready with {} receive and {} change addresses",
            xpub.fingerprint(),
            receive.len(),
            change.len()
        );

        let shared = Shared {
            provider,
            params: config.params(),
            receive: RwLock::new(receive),
            change: RwLock::new(change),
            history: Mutex::new(IndexMap::new()),
            state: Mutex::new(AccountState::Idle),
            closed: AtomicBool::new(false),
            gap_signal: Notify::new(),
        };
        Ok(Account {
            xpub,
            config,
            shared: Arc::new(shared),
            task: Mutex::new(None),
        })
    }

    pub fn with_xpriv(
        xpriv: &Xpriv,
        config: AccountConfig,
        provider: P,
    ) -> Result<Self, AccountError> {
        Self::new(xpriv.to_xpub(), config, provider)
    }

    pub fn with_key(
        key: &ExtendedKey,
        config: AccountConfig,
        provider: P,
    ) -> Result<Self, AccountError> {
        Self::new(key.to_xpub(), config, provider)
    }

    pub fn xpub(&self) -> Xpub { self.xpub }

    pub fn config(&self) -> &AccountConfig { &self.config }

    pub fn provider(&self) -> &P { &self.shared.provider }

    pub fn state(&self) -> AccountState { *self.shared.lock_state() }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes all addresses and spawns the gap-check task on the current
    /// tokio runtime.
    pub fn start(&self) -> Result<(), AccountError> {
        let runtime = Handle::try_current().map_err(|_| AccountError::NoRuntime)?;
        self.shared
            .transition(AccountState::Idle, AccountState::Subscribing)
            .map_err(AccountError::NotIdle)?;

        let addresses = self.receive_addresses().into_iter().chain(self.change_addresses());
        for address in addresses {
            self.shared.subscribe(&address);
        }

        if let Err(state) =
            self.shared.transition(AccountState::Subscribing, AccountState::Watching)
        {
            log::debug!("account became {state} during subscription");
            return Ok(());
        }
        let handle = runtime.spawn(self.shared.clone().run());
        *self.lock_task() = Some(handle);
        Ok(())
    }

    /// Stops the gap-check task and waits for it to exit.
    pub async fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        *self.shared.lock_state() = AccountState::Closed;
        self.shared.gap_signal.notify_one();

        let task = self.lock_task().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                log::error!("gap-check task terminated abnormally: {err}");
            }
        }
        log::info!("account {} closed", self.xpub.fingerprint());
    }

    /// Records history of an address and wakes the gap-check task.
    pub fn set_address_history(&self, address: Address, history: TxHistory) {
        log::trace!("history of {address} has {} items", history.len());
        self.shared.lock_history().insert(address, history);
        self.shared.gap_signal.notify_one();
    }

    pub fn address_history(&self, address: &Address) -> Option<TxHistory> {
        self.shared.lock_history().get(address).cloned()
    }

    pub fn addresses(&self, keychain: Keychain) -> Vec<Address> { self.shared.addresses(keychain) }

    pub fn receive_addresses(&self) -> Vec<Address> { self.addresses(Keychain::Receive) }

    pub fn change_addresses(&self) -> Vec<Address> { self.addresses(Keychain::Change) }

    /// Addresses of both branches with a non-empty history.
    pub fn used_addresses(&self) -> Vec<Address> {
        let mut addresses = self.receive_addresses();
        addresses.extend(self.change_addresses());
        let history = self.shared.lock_history();
        addresses.retain(|address| history.get(address).is_some_and(TxHistory::is_used));
        addresses
    }

    pub fn max_used_index(&self, keychain: Keychain) -> Option<NormalIndex> {
        self.shared.max_used_index(keychain)
    }

    /// Locates address in the account branches.
    pub fn find(&self, address: &Address) -> Option<(Keychain, NormalIndex)> {
        Keychain::ALL.into_iter().find_map(|keychain| {
            self.shared
                .read_list(keychain)
                .entries()
                .iter()
                .find(|key| key.address() == *address)
                .map(|key| (keychain, key.index))
        })
    }

    pub fn scripthash(&self, address: &Address) -> ScriptHash { address.to_scripthash() }

    /// Runs a single gap-check pass, returning addresses generated by it.
    ///
    /// New addresses are subscribed only once the account is started. Passes
    /// may run concurrently with the gap-check task: each branch is extended
    /// under its write lock, and every new address is returned and subscribed
    /// by exactly one pass.
    pub fn gap_check(&self) -> Result<Vec<Address>, AccountError> { self.shared.gap_check() }
}

impl<P: HistoryProvider> Drop for Account<P> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.gap_signal.notify_one();
    }
}
