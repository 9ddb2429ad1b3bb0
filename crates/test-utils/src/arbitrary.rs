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

//! Proptest strategies for valid event logs.

use std::collections::{BTreeMap, BTreeSet};

use delegation_rewards::Event;
use proptest::prelude::*;

use crate::{delegator, EventLogBuilder};

/// A pool operation before it is checked against the pool state.
#[derive(Debug, Clone)]
pub enum PoolOp {
    Vote { who: u64, value: i64 },
    Unvote { who: u64, value: i64 },
    Withdraw { who: u64 },
    Block { reward: i64 },
    Skip { blocks: u64 },
}

pub fn pool_op(delegators: u64) -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        3 => (0..delegators, 1i64..10_000).prop_map(|(who, value)| PoolOp::Vote { who, value }),
        2 => (0..delegators, 0i64..10_000).prop_map(|(who, value)| PoolOp::Unvote { who, value }),
        2 => (0..delegators).prop_map(|who| PoolOp::Withdraw { who }),
        3 => (0i64..1_000_000_000).prop_map(|reward| PoolOp::Block { reward }),
        1 => (1u64..5).prop_map(|blocks| PoolOp::Skip { blocks }),
    ]
}

/// Valid event logs of up to `max_ops` operations over `delegators` identities.
pub fn valid_event_log(delegators: u64, max_ops: usize) -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec(pool_op(delegators), 0..max_ops).prop_map(|ops| build_valid_log(&ops))
}

/// Turn `ops` into a valid log: unvotes are clamped to the current stake, and operations that
/// cannot apply (unvote without stake, block without stakers, withdraw without pending rewards)
/// are dropped.
pub fn build_valid_log(ops: &[PoolOp]) -> Vec<Event> {
    let mut stakes: BTreeMap<u64, i64> = BTreeMap::new();
    let mut pending: BTreeSet<u64> = BTreeSet::new();
    let mut builder = EventLogBuilder::default().with_producer(delegator(u64::MAX));

    for op in ops {
        match *op {
            PoolOp::Vote { who, value } => {
                *stakes.entry(who).or_default() += value;
                builder = builder.vote(delegator(who), value);
            }
            PoolOp::Unvote { who, value } => {
                let Some(stake) = stakes.get(&who).copied() else { continue };
                let value = value.min(stake);
                if value == stake {
                    stakes.remove(&who);
                } else {
                    stakes.insert(who, stake - value);
                }
                builder = builder.unvote(delegator(who), value);
            }
            PoolOp::Withdraw { who } => {
                if pending.remove(&who) {
                    builder = builder.withdraw(delegator(who));
                }
            }
            PoolOp::Block { reward } => {
                if !stakes.is_empty() {
                    pending.extend(stakes.keys().copied());
                    builder = builder.block(reward);
                }
            }
            PoolOp::Skip { blocks } => builder = builder.skip(blocks),
        }
    }

    builder.build()
}
