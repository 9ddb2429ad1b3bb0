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

//! Reward accounting for proof-of-stake delegation pools.
//!
//! A pool's history is an ordered log of [Event]s: delegators vote (stake) and unvote, each
//! produced block disburses a reward that is split across the stakers in proportion to their stake
//! at that instant, and delegators withdraw their pending rewards. A [RewardsManager] replays the
//! log once and reports, per delegator, the rewards earned so far (pending plus withdrawn).

// Declare modules
pub mod accumulator;
pub mod error;
pub mod event;
pub mod f1;
pub mod ledger;
pub mod log;
pub mod manager;
pub mod report;
pub mod simple;

// Re-export commonly used types
pub use accumulator::{split_pro_rata, RewardAccumulator};

pub use error::{InputError, RewardsError, StateError};

pub use event::{Action, DelegatorId, Event, EventKind};

pub use f1::{F1RewardsManager, F1_RATIO_PRECISION};

pub use ledger::StakeLedger;

pub use log::{load_event_log, parse_event_log, EventRecord, RawAmount};

pub use manager::{RewardsManager, Scheme};

pub use report::{compute_pool_report, DelegatorRewards, PoolRewardsReport};

pub use simple::SimpleRewardsManager;

pub use alloy_primitives::{I256, U256};

/// Replay `events` with the default (simple) scheme and return the rewards earned per delegator.
pub fn compute_rewards(
    events: &[Event],
) -> Result<std::collections::BTreeMap<DelegatorId, U256>, RewardsError> {
    SimpleRewardsManager::new().compute_rewards(events)
}
