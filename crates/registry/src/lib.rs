// Copyright 2025 RISC Zero, Inc.
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

//! Staker registry for delegation pools.
//!
//! The registry tracks which delegator votes how much toward which staker and records, per
//! staker, the pool event log consumed by [delegation_rewards]. It does not move tokens: an unvote
//! returns the amount the caller must transfer back to the delegator.

pub mod listener;

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{B256, I256, U256};
use delegation_rewards::{
    compute_pool_report, DelegatorId, Event, EventKind, PoolRewardsReport, RewardsError, Scheme,
};
use thiserror::Error;

pub use listener::{ListenerId, StakerRegistryListener};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("staker {0} is already registered")]
    AlreadyRegistered(B256),

    #[error("staker {0} is not registered")]
    UnknownStaker(B256),

    #[error("vote value must be positive")]
    ZeroValue,

    #[error("delegator {delegator} has no vote for staker {staker}")]
    NoVote { staker: B256, delegator: DelegatorId },

    #[error("un-vote of {requested} exceeds the {available} voted")]
    ExceedsVote { requested: U256, available: U256 },

    #[error("amount {0} does not fit in an event")]
    AmountTooLarge(U256),

    #[error("block {block_number} is before the last recorded block {last}")]
    OutOfOrder { last: u64, block_number: u64 },

    #[error("block {0} already has its reward recorded")]
    BlockClosed(u64),

    #[error("staker {0} has no votes to reward")]
    NoStake(B256),

    #[error("delegator {delegator} has no rewards to withdraw from staker {staker}")]
    NothingToWithdraw { staker: B256, delegator: DelegatorId },

    #[error("listener {0:?} is not registered")]
    UnknownListener(ListenerId),
}

#[derive(Debug, Clone)]
struct Staker {
    signing_address: B256,
    coinbase_address: B256,
    total_vote: U256,
    // The sum of votes.values() always equals total_vote.
    votes: BTreeMap<DelegatorId, U256>,
    // Delegators credited by a block since their last withdrawal.
    credited: BTreeSet<DelegatorId>,
    events: Vec<Event>,
}

impl Staker {
    fn new(signing_address: B256, coinbase_address: B256) -> Self {
        Self {
            signing_address,
            coinbase_address,
            total_vote: U256::ZERO,
            votes: BTreeMap::new(),
            credited: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    fn check_order(&self, block_number: u64) -> Result<(), RegistryError> {
        let Some(last) = self.events.last() else { return Ok(()) };
        if block_number < last.block_number {
            return Err(RegistryError::OutOfOrder { last: last.block_number, block_number });
        }
        if last.kind == EventKind::Block && block_number == last.block_number {
            return Err(RegistryError::BlockClosed(block_number));
        }
        Ok(())
    }
}

fn to_event_amount(value: U256) -> Result<I256, RegistryError> {
    if value > I256::MAX.into_raw() {
        return Err(RegistryError::AmountTooLarge(value));
    }
    Ok(I256::from_raw(value))
}

/// Owned store of all stakers of a deployment.
#[derive(Default)]
pub struct StakerRegistry {
    stakers: BTreeMap<B256, Staker>,
    listeners: BTreeMap<B256, Vec<(ListenerId, Box<dyn StakerRegistryListener>)>>,
    next_listener: u64,
}

impl StakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `caller` as a staker.
    pub fn register(
        &mut self,
        caller: B256,
        signing_address: B256,
        coinbase_address: B256,
    ) -> Result<(), RegistryError> {
        if self.stakers.contains_key(&caller) {
            return Err(RegistryError::AlreadyRegistered(caller));
        }
        self.stakers.insert(caller, Staker::new(signing_address, coinbase_address));
        tracing::info!(staker = %caller, "registered staker");
        Ok(())
    }

    pub fn is_registered(&self, staker: &B256) -> bool {
        self.stakers.contains_key(staker)
    }

    /// Add `value` to the vote of `caller` for `staker` and record a VOTE event.
    pub fn vote(
        &mut self,
        caller: DelegatorId,
        staker: B256,
        value: U256,
        block_number: u64,
    ) -> Result<(), RegistryError> {
        if value == U256::ZERO {
            return Err(RegistryError::ZeroValue);
        }
        let amount = to_event_amount(value)?;
        let entry = self.staker_mut(&staker)?;
        entry.check_order(block_number)?;

        let vote = entry.votes.get(&caller).copied().unwrap_or(U256::ZERO);
        let new_vote = vote.checked_add(value).ok_or(RegistryError::AmountTooLarge(value))?;
        let new_total =
            entry.total_vote.checked_add(value).ok_or(RegistryError::AmountTooLarge(value))?;
        entry.votes.insert(caller, new_vote);
        entry.total_vote = new_total;
        entry.events.push(Event::vote(caller, block_number, amount));

        tracing::debug!(%staker, delegator = %caller, %value, block_number, "vote");
        Ok(())
    }

    /// Take back `amount` of the vote of `caller` for `staker` and record an UNVOTE event.
    ///
    /// Returns the amount the caller must transfer back to the delegator.
    pub fn unvote(
        &mut self,
        caller: DelegatorId,
        staker: B256,
        amount: U256,
        block_number: u64,
    ) -> Result<U256, RegistryError> {
        let event_amount = to_event_amount(amount)?;
        let entry = self.staker_mut(&staker)?;
        entry.check_order(block_number)?;

        let vote = *entry
            .votes
            .get(&caller)
            .ok_or(RegistryError::NoVote { staker, delegator: caller })?;
        if amount > vote {
            return Err(RegistryError::ExceedsVote { requested: amount, available: vote });
        }

        if amount == vote {
            entry.votes.remove(&caller);
        } else {
            entry.votes.insert(caller, vote - amount);
        }
        entry.total_vote -= amount;
        entry.events.push(Event::unvote(caller, block_number, event_amount));

        tracing::debug!(%staker, delegator = %caller, %amount, block_number, "unvote");
        Ok(amount)
    }

    /// Record the reward of a block produced for `staker`'s pool. Closes the block.
    pub fn record_block_reward(
        &mut self,
        staker: B256,
        block_number: u64,
        reward: U256,
        producer: Option<B256>,
    ) -> Result<(), RegistryError> {
        let amount = to_event_amount(reward)?;
        let entry = self.staker_mut(&staker)?;
        entry.check_order(block_number)?;
        if entry.total_vote == U256::ZERO {
            return Err(RegistryError::NoStake(staker));
        }
        entry.credited.extend(entry.votes.keys().copied());
        entry.events.push(Event::block(producer, block_number, amount));

        tracing::debug!(%staker, %reward, block_number, "block reward");
        Ok(())
    }

    /// Record that `delegator` claims its pending rewards from `staker`'s pool.
    pub fn record_withdraw(
        &mut self,
        staker: B256,
        delegator: DelegatorId,
        block_number: u64,
    ) -> Result<(), RegistryError> {
        let entry = self.staker_mut(&staker)?;
        entry.check_order(block_number)?;
        if !entry.credited.remove(&delegator) {
            return Err(RegistryError::NothingToWithdraw { staker, delegator });
        }
        entry.events.push(Event::withdraw(delegator, block_number));

        tracing::debug!(%staker, %delegator, block_number, "withdraw");
        Ok(())
    }

    /// Total vote of `staker`, zero if it is not registered.
    pub fn vote_of(&self, staker: &B256) -> U256 {
        self.stakers.get(staker).map(|s| s.total_vote).unwrap_or(U256::ZERO)
    }

    /// Vote of `delegator` for `staker`, zero if there is none.
    pub fn vote_by(&self, staker: &B256, delegator: &DelegatorId) -> U256 {
        self.stakers
            .get(staker)
            .and_then(|s| s.votes.get(delegator).copied())
            .unwrap_or(U256::ZERO)
    }

    pub fn signing_address(&self, staker: &B256) -> Option<B256> {
        self.stakers.get(staker).map(|s| s.signing_address)
    }

    pub fn coinbase_address(&self, staker: &B256) -> Option<B256> {
        self.stakers.get(staker).map(|s| s.coinbase_address)
    }

    /// Event log of `staker`'s pool.
    pub fn events(&self, staker: &B256) -> Option<&[Event]> {
        self.stakers.get(staker).map(|s| s.events.as_slice())
    }

    /// Compute the rewards of `staker`'s pool from its event log.
    pub fn pool_rewards(
        &self,
        staker: &B256,
        scheme: Scheme,
    ) -> Result<Option<PoolRewardsReport>, RewardsError> {
        self.events(staker).map(|events| compute_pool_report(scheme, events)).transpose()
    }

    /// Change the signing address of `caller`, which must be a registered staker.
    pub fn set_signing_address(
        &mut self,
        caller: B256,
        new_signing_address: B256,
    ) -> Result<(), RegistryError> {
        self.staker_mut(&caller)?.signing_address = new_signing_address;
        tracing::info!(staker = %caller, signing = %new_signing_address, "signing address changed");
        self.notify(&caller, |listener| {
            listener.on_signing_address_change(caller, new_signing_address)
        });
        Ok(())
    }

    /// Change the coinbase address of `caller`, which must be a registered staker.
    pub fn set_coinbase_address(
        &mut self,
        caller: B256,
        new_coinbase_address: B256,
    ) -> Result<(), RegistryError> {
        self.staker_mut(&caller)?.coinbase_address = new_coinbase_address;
        tracing::info!(staker = %caller, coinbase = %new_coinbase_address, "coinbase address changed");
        self.notify(&caller, |listener| {
            listener.on_coinbase_address_change(caller, new_coinbase_address)
        });
        Ok(())
    }

    /// Register `listener` for changes to `staker`.
    pub fn add_listener(
        &mut self,
        staker: B256,
        mut listener: Box<dyn StakerRegistryListener>,
    ) -> Result<ListenerId, RegistryError> {
        if !self.stakers.contains_key(&staker) {
            return Err(RegistryError::UnknownStaker(staker));
        }
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;

        listener.on_listener_added(staker);
        self.listeners.entry(staker).or_default().push((id, listener));
        Ok(id)
    }

    /// Remove a listener previously added for `staker` and hand it back.
    pub fn remove_listener(
        &mut self,
        staker: B256,
        id: ListenerId,
    ) -> Result<Box<dyn StakerRegistryListener>, RegistryError> {
        let listeners = self.listeners.get_mut(&staker).ok_or(RegistryError::UnknownListener(id))?;
        let position = listeners
            .iter()
            .position(|(listener_id, _)| *listener_id == id)
            .ok_or(RegistryError::UnknownListener(id))?;

        let (_, mut listener) = listeners.remove(position);
        listener.on_listener_removed(staker);
        Ok(listener)
    }

    fn staker_mut(&mut self, staker: &B256) -> Result<&mut Staker, RegistryError> {
        self.stakers.get_mut(staker).ok_or(RegistryError::UnknownStaker(*staker))
    }

    fn notify(&mut self, staker: &B256, mut f: impl FnMut(&mut dyn StakerRegistryListener)) {
        if let Some(listeners) = self.listeners.get_mut(staker) {
            for (_, listener) in listeners.iter_mut() {
                f(listener.as_mut());
            }
        }
    }
}
