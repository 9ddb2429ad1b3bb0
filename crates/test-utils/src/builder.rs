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

use delegation_rewards::{DelegatorId, Event};

use crate::amount;

/// Builds an event log block by block.
///
/// Stake changes and withdrawals are stamped with the current block number; [Self::block] closes
/// the current block with its reward and moves on to the next one.
#[derive(Debug, Clone)]
pub struct EventLogBuilder {
    block_number: u64,
    producer: Option<DelegatorId>,
    events: Vec<Event>,
}

impl Default for EventLogBuilder {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl EventLogBuilder {
    pub fn starting_at(block_number: u64) -> Self {
        Self { block_number, producer: None, events: Vec::new() }
    }

    /// Producer recorded on subsequent BLOCK events.
    pub fn with_producer(mut self, producer: DelegatorId) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn vote(mut self, delegator: DelegatorId, value: i64) -> Self {
        self.events.push(Event::vote(delegator, self.block_number, amount(value)));
        self
    }

    pub fn unvote(mut self, delegator: DelegatorId, value: i64) -> Self {
        self.events.push(Event::unvote(delegator, self.block_number, amount(value)));
        self
    }

    pub fn withdraw(mut self, delegator: DelegatorId) -> Self {
        self.events.push(Event::withdraw(delegator, self.block_number));
        self
    }

    pub fn block(mut self, reward: i64) -> Self {
        self.events.push(Event::block(self.producer, self.block_number, amount(reward)));
        self.block_number += 1;
        self
    }

    /// Skip ahead `blocks` block numbers without events.
    pub fn skip(mut self, blocks: u64) -> Self {
        self.block_number += blocks;
        self
    }

    pub fn build(self) -> Vec<Event> {
        self.events
    }
}
