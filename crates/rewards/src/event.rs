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

//! Pool event model and per-event validation.

use std::{fmt, str::FromStr};

use alloy_primitives::{B256, I256, U256};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Opaque 32-byte identity of a delegator (or of a block producer).
pub type DelegatorId = B256;

/// Kind of an entry in the pool event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// Stake added by a delegator.
    Vote,
    /// Stake returned to a delegator.
    Unvote,
    /// Reward disbursed for a produced block.
    Block,
    /// Delegator claims its pending rewards.
    Withdraw,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vote => "VOTE",
            Self::Unvote => "UNVOTE",
            Self::Block => "BLOCK",
            Self::Withdraw => "WITHDRAW",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VOTE" => Ok(Self::Vote),
            "UNVOTE" => Ok(Self::Unvote),
            "BLOCK" => Ok(Self::Block),
            "WITHDRAW" => Ok(Self::Withdraw),
            _ => Err(InputError::UnrecognizedKind(s.to_string())),
        }
    }
}

/// A single entry of the pool event log.
///
/// Amounts are signed so that a malformed log can be represented and rejected; a valid log never
/// carries a negative amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// Delegator for VOTE, UNVOTE and WITHDRAW. Block producer (optional) for BLOCK.
    pub source: Option<DelegatorId>,
    pub block_number: u64,
    /// Present for VOTE, UNVOTE and BLOCK. Absent for WITHDRAW.
    pub amount: Option<I256>,
}

impl Event {
    pub fn new(
        kind: EventKind,
        source: Option<DelegatorId>,
        block_number: u64,
        amount: Option<I256>,
    ) -> Self {
        Self { kind, source, block_number, amount }
    }

    pub fn vote(delegator: DelegatorId, block_number: u64, amount: I256) -> Self {
        Self::new(EventKind::Vote, Some(delegator), block_number, Some(amount))
    }

    pub fn unvote(delegator: DelegatorId, block_number: u64, amount: I256) -> Self {
        Self::new(EventKind::Unvote, Some(delegator), block_number, Some(amount))
    }

    pub fn block(producer: Option<DelegatorId>, block_number: u64, reward: I256) -> Self {
        Self::new(EventKind::Block, producer, block_number, Some(reward))
    }

    pub fn withdraw(delegator: DelegatorId, block_number: u64) -> Self {
        Self::new(EventKind::Withdraw, Some(delegator), block_number, None)
    }

    /// Validate this event against the event that follows it in the log and resolve it into an
    /// [Action]. No state is consulted.
    pub fn validate(&self, next: Option<&Event>) -> Result<Action, InputError> {
        if self.amount.is_some_and(|amount| amount.is_negative()) {
            return Err(InputError::NegativeAmount);
        }

        if let Some(next) = next {
            if next.block_number < self.block_number {
                return Err(InputError::NonMonotonicBlockNumber);
            }
            if self.kind == EventKind::Block && next.block_number <= self.block_number {
                return Err(InputError::BlockNotLastInBlock);
            }
        }

        match self.kind {
            EventKind::Vote => {
                Ok(Action::Vote { delegator: self.require_source()?, amount: self.require_amount()? })
            }
            EventKind::Unvote => Ok(Action::Unvote {
                delegator: self.require_source()?,
                amount: self.require_amount()?,
            }),
            EventKind::Block => Ok(Action::Block { reward: self.require_amount()? }),
            EventKind::Withdraw => {
                if self.amount.is_some() {
                    return Err(InputError::WithdrawWithAmount);
                }
                Ok(Action::Withdraw { delegator: self.require_source()? })
            }
        }
    }

    fn require_source(&self) -> Result<DelegatorId, InputError> {
        self.source.ok_or(InputError::MissingSource(self.kind.as_str()))
    }

    // Sign has already been checked, so the raw two's complement value is the magnitude.
    fn require_amount(&self) -> Result<U256, InputError> {
        self.amount.map(I256::into_raw).ok_or(InputError::MissingAmount(self.kind.as_str()))
    }
}

/// A validated event, ready to be applied to the ledger and accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Vote { delegator: DelegatorId, amount: U256 },
    Unvote { delegator: DelegatorId, amount: U256 },
    Block { reward: U256 },
    Withdraw { delegator: DelegatorId },
}
