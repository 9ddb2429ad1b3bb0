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

//! The rewards manager contract shared by all distribution schemes.

use std::{collections::BTreeMap, fmt, str::FromStr};

use alloy_primitives::U256;

use crate::{
    error::{RewardsError, StateError},
    event::{Action, DelegatorId, Event},
    f1::F1RewardsManager,
    simple::SimpleRewardsManager,
};

/// Computes per-delegator rewards from a pool event log.
///
/// A manager is a single-pass fold: [RewardsManager::compute_rewards] may be called once per
/// instance, and fails at the first invalid event leaving the state of the applied prefix in place.
pub trait RewardsManager {
    /// Replay `events` and report the rewards earned (pending plus withdrawn) by every delegator
    /// that was ever credited. Delegators absent from the result earned nothing.
    fn compute_rewards(
        &mut self,
        events: &[Event],
    ) -> Result<BTreeMap<DelegatorId, U256>, RewardsError>;

    /// Current stake of `delegator`, zero when it has none.
    fn stake_of(&self, delegator: &DelegatorId) -> U256;

    fn total_stake(&self) -> U256;

    /// Pending (unwithdrawn) rewards of `delegator`, if it has a pending entry.
    fn pending_of(&self, delegator: &DelegatorId) -> Option<U256>;

    /// Cumulative withdrawn rewards of `delegator`, if it ever withdrew.
    fn withdrawn_of(&self, delegator: &DelegatorId) -> Option<U256>;

    /// Block rewards recorded minus rewards withdrawn.
    fn outstanding_rewards(&self) -> U256;

    /// Rewards earned so far by `delegator`.
    fn total_for(&self, delegator: &DelegatorId) -> U256 {
        let pending = self.pending_of(delegator).unwrap_or(U256::ZERO);
        let withdrawn = self.withdrawn_of(delegator).unwrap_or(U256::ZERO);
        pending.saturating_add(withdrawn)
    }
}

/// Available reward distribution schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Split every block reward across all stakers when the block is seen.
    #[default]
    Simple,
    /// Track cumulative reward ratios and settle delegators lazily.
    F1,
}

impl Scheme {
    pub fn manager(&self) -> Box<dyn RewardsManager + Send> {
        match self {
            Self::Simple => Box::new(SimpleRewardsManager::new()),
            Self::F1 => Box::new(F1RewardsManager::new()),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("simple"),
            Self::F1 => f.write_str("f1"),
        }
    }
}

impl FromStr for Scheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "f1" => Ok(Self::F1),
            other => Err(anyhow::anyhow!("unknown rewards scheme: {other}")),
        }
    }
}

/// Validate each event of `events` against its successor and hand the resulting [Action] to
/// `apply`, stopping at the first failure.
pub(crate) fn replay<F>(events: &[Event], mut apply: F) -> Result<(), RewardsError>
where
    F: FnMut(Action) -> Result<(), StateError>,
{
    for (index, event) in events.iter().enumerate() {
        let action = event.validate(events.get(index + 1)).map_err(|reason| {
            tracing::warn!(index, block = event.block_number, %reason, "rejecting event log");
            RewardsError::input(index, reason)
        })?;

        tracing::debug!(
            index,
            kind = %event.kind,
            block = event.block_number,
            source = ?event.source,
            "applying event"
        );

        apply(action).map_err(|reason| {
            tracing::warn!(index, block = event.block_number, %reason, "event inconsistent with state");
            RewardsError::state(index, reason)
        })?;
    }
    Ok(())
}
