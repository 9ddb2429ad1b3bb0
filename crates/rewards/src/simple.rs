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

//! Rewards manager that splits each block reward across all stakers eagerly.

use std::collections::BTreeMap;

use alloy_primitives::U256;

use crate::{
    accumulator::RewardAccumulator,
    error::{RewardsError, StateError},
    event::{Action, DelegatorId, Event},
    ledger::StakeLedger,
    manager::{replay, RewardsManager},
};

/// Credits every staker's pending balance at each BLOCK event, in proportion to the stake held at
/// that instant. Shares are exact to the unit: see [crate::accumulator::split_pro_rata].
#[derive(Debug, Clone, Default)]
pub struct SimpleRewardsManager {
    ledger: StakeLedger,
    rewards: RewardAccumulator,
    computed: bool,
}

impl SimpleRewardsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    pub fn rewards(&self) -> &RewardAccumulator {
        &self.rewards
    }

    fn apply(&mut self, action: Action) -> Result<(), StateError> {
        match action {
            Action::Vote { delegator, amount } => self.ledger.apply_vote(delegator, amount),
            Action::Unvote { delegator, amount } => self.ledger.apply_unvote(delegator, amount),
            Action::Block { reward } => self.rewards.credit_block(&self.ledger, reward),
            Action::Withdraw { delegator } => self.rewards.withdraw(delegator).map(|_| ()),
        }
    }
}

impl RewardsManager for SimpleRewardsManager {
    fn compute_rewards(
        &mut self,
        events: &[Event],
    ) -> Result<BTreeMap<DelegatorId, U256>, RewardsError> {
        if self.computed {
            return Err(RewardsError::state(0, StateError::AlreadyComputed));
        }
        self.computed = true;

        replay(events, |action| self.apply(action))?;

        let totals = self.rewards.totals();
        tracing::info!(
            events = events.len(),
            delegators = totals.len(),
            outstanding = %self.rewards.outstanding_total(),
            "computed rewards"
        );
        Ok(totals)
    }

    fn stake_of(&self, delegator: &DelegatorId) -> U256 {
        self.ledger.stake_of(delegator)
    }

    fn total_stake(&self) -> U256 {
        self.ledger.total_stake()
    }

    fn pending_of(&self, delegator: &DelegatorId) -> Option<U256> {
        self.rewards.pending_of(delegator)
    }

    fn withdrawn_of(&self, delegator: &DelegatorId) -> Option<U256> {
        self.rewards.withdrawn_of(delegator)
    }

    fn outstanding_rewards(&self) -> U256 {
        self.rewards.outstanding_total()
    }
}
