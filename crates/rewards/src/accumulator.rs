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

//! Pending and withdrawn reward balances.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::U256;

use crate::{error::StateError, event::DelegatorId, ledger::StakeLedger};

/// Per-delegator reward balances and the pool-wide outstanding total.
///
/// `outstanding_total` is the sum of all block rewards recorded minus the sum of all withdrawals.
#[derive(Debug, Clone, Default)]
pub struct RewardAccumulator {
    pending: BTreeMap<DelegatorId, U256>,
    withdrawn: BTreeMap<DelegatorId, U256>,
    outstanding_total: U256,
}

impl RewardAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `block_reward` across the stakers in `ledger` and credit each share to its pending
    /// balance. Every delegator with stake gets a pending entry, even if its share is zero.
    pub fn credit_block(
        &mut self,
        ledger: &StakeLedger,
        block_reward: U256,
    ) -> Result<(), StateError> {
        let shares = split_pro_rata(ledger, block_reward)?;
        let outstanding_total =
            self.outstanding_total.checked_add(block_reward).ok_or(StateError::ArithmeticOverflow)?;

        // Check every addition before applying any of them.
        let mut updated = Vec::with_capacity(shares.len());
        for (delegator, share) in shares {
            let pending = self.pending_of(&delegator).unwrap_or(U256::ZERO);
            let pending = pending.checked_add(share).ok_or(StateError::ArithmeticOverflow)?;
            tracing::trace!(%delegator, %share, "credited block share");
            updated.push((delegator, pending));
        }

        self.pending.extend(updated);
        self.outstanding_total = outstanding_total;
        Ok(())
    }

    /// Add `block_reward` to the outstanding total without crediting anyone. Used by schemes that
    /// settle individual balances lazily with [Self::credit].
    pub fn record_block(&mut self, block_reward: U256) -> Result<(), StateError> {
        self.outstanding_total =
            self.outstanding_total.checked_add(block_reward).ok_or(StateError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Add `amount` to the pending balance of `delegator`, creating the entry if needed.
    pub fn credit(&mut self, delegator: DelegatorId, amount: U256) -> Result<(), StateError> {
        let pending = self.pending_of(&delegator).unwrap_or(U256::ZERO);
        let pending = pending.checked_add(amount).ok_or(StateError::ArithmeticOverflow)?;
        self.pending.insert(delegator, pending);
        Ok(())
    }

    /// Move the whole pending balance of `delegator` into its withdrawn balance and return the
    /// amount moved.
    pub fn withdraw(&mut self, delegator: DelegatorId) -> Result<U256, StateError> {
        let amount = self.pending_of(&delegator).ok_or(StateError::WithdrawWithoutPending)?;
        let withdrawn = self.withdrawn_of(&delegator).unwrap_or(U256::ZERO);
        let withdrawn = withdrawn.checked_add(amount).ok_or(StateError::ArithmeticOverflow)?;
        // Pending balances are part of the outstanding total, so this cannot underflow.
        let outstanding_total = self.outstanding_total.saturating_sub(amount);

        self.pending.remove(&delegator);
        self.withdrawn.insert(delegator, withdrawn);
        self.outstanding_total = outstanding_total;
        Ok(amount)
    }

    pub fn pending_of(&self, delegator: &DelegatorId) -> Option<U256> {
        self.pending.get(delegator).copied()
    }

    pub fn withdrawn_of(&self, delegator: &DelegatorId) -> Option<U256> {
        self.withdrawn.get(delegator).copied()
    }

    pub fn outstanding_total(&self) -> U256 {
        self.outstanding_total
    }

    /// Rewards earned so far by `delegator`: pending plus withdrawn.
    pub fn total_for(&self, delegator: &DelegatorId) -> U256 {
        let pending = self.pending_of(delegator).unwrap_or(U256::ZERO);
        let withdrawn = self.withdrawn_of(delegator).unwrap_or(U256::ZERO);
        pending.saturating_add(withdrawn)
    }

    /// Earned totals for every delegator that has a pending or withdrawn entry.
    pub fn totals(&self) -> BTreeMap<DelegatorId, U256> {
        let delegators: BTreeSet<&DelegatorId> =
            self.pending.keys().chain(self.withdrawn.keys()).collect();
        delegators.into_iter().map(|delegator| (*delegator, self.total_for(delegator))).collect()
    }

    pub fn pending(&self) -> &BTreeMap<DelegatorId, U256> {
        &self.pending
    }

    pub fn withdrawn(&self) -> &BTreeMap<DelegatorId, U256> {
        &self.withdrawn
    }
}

/// Split `reward` across the stakers of `ledger` in proportion to their stake.
///
/// Uses the largest-remainder method: every delegator first receives the floor of its exact share,
/// then the leftover units (fewer than the number of stakers) go one each to the delegators with the
/// largest remainders, ties broken by ascending identity. The shares always sum to `reward`, and
/// each share is within one unit of the exact proportional amount.
pub fn split_pro_rata(
    ledger: &StakeLedger,
    reward: U256,
) -> Result<BTreeMap<DelegatorId, U256>, StateError> {
    let total_stake = ledger.total_stake();
    if total_stake == U256::ZERO {
        return Err(StateError::BlockWithoutStake);
    }

    let mut shares = BTreeMap::new();
    let mut remainders = Vec::with_capacity(ledger.len());
    let mut distributed = U256::ZERO;
    for (delegator, _) in ledger.iter() {
        let (stake, total) = ledger.stake_ratio(delegator)?;
        let weighted = reward.checked_mul(stake).ok_or(StateError::ArithmeticOverflow)?;
        let share = weighted / total;
        distributed += share;
        shares.insert(*delegator, share);
        remainders.push((weighted % total, *delegator));
    }

    // Largest remainder first; identities ascending on ties.
    remainders.sort_by(|(ra, da), (rb, db)| rb.cmp(ra).then(da.cmp(db)));

    let mut leftover = reward - distributed;
    for (_, delegator) in remainders {
        if leftover == U256::ZERO {
            break;
        }
        if let Some(share) = shares.get_mut(&delegator) {
            *share += U256::from(1);
        }
        leftover -= U256::from(1);
    }

    Ok(shares)
}
