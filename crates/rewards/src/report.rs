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

//! Summaries of a finished rewards computation.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{
    error::RewardsError,
    event::{DelegatorId, Event, EventKind},
    manager::{RewardsManager, Scheme},
};

/// Rewards of a single delegator at the end of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorRewards {
    pub delegator: DelegatorId,
    /// Stake held at the end of the log
    pub stake: U256,
    /// Rewards not yet withdrawn
    pub pending: U256,
    /// Rewards withdrawn over the whole log
    pub withdrawn: U256,
    /// Pending plus withdrawn
    pub total: U256,
}

/// Result of computing the rewards of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRewardsReport {
    pub scheme: String,
    /// Number of events replayed
    pub events: usize,
    /// Sum of all BLOCK rewards in the log
    pub total_block_rewards: U256,
    /// Sum of all rewards reported, pending and withdrawn
    pub total_distributed: U256,
    /// Block rewards minus withdrawals
    pub outstanding: U256,
    pub total_stake: U256,
    /// Rewards by delegator, ordered by delegator identity
    pub delegators: Vec<DelegatorRewards>,
}

impl PoolRewardsReport {
    /// Rewards that were recorded but not attributed to any delegator because of rounding.
    pub fn undistributed(&self) -> U256 {
        self.total_block_rewards.saturating_sub(self.total_distributed)
    }
}

/// Replay `events` with a fresh manager of the given scheme and summarize the result.
pub fn compute_pool_report(
    scheme: Scheme,
    events: &[Event],
) -> Result<PoolRewardsReport, RewardsError> {
    let mut manager = scheme.manager();
    let totals = manager.compute_rewards(events)?;

    let delegators: Vec<DelegatorRewards> = totals
        .into_iter()
        .map(|(delegator, total)| DelegatorRewards {
            delegator,
            stake: manager.stake_of(&delegator),
            pending: manager.pending_of(&delegator).unwrap_or(U256::ZERO),
            withdrawn: manager.withdrawn_of(&delegator).unwrap_or(U256::ZERO),
            total,
        })
        .collect();

    // Amounts were validated by the computation above.
    let total_block_rewards = events
        .iter()
        .filter(|event| event.kind == EventKind::Block)
        .filter_map(|event| event.amount)
        .fold(U256::ZERO, |acc, amount| acc.saturating_add(amount.into_raw()));
    let total_distributed =
        delegators.iter().fold(U256::ZERO, |acc, d| acc.saturating_add(d.total));

    Ok(PoolRewardsReport {
        scheme: scheme.to_string(),
        events: events.len(),
        total_block_rewards,
        total_distributed,
        outstanding: manager.outstanding_rewards(),
        total_stake: manager.total_stake(),
        delegators,
    })
}
