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

//! Error types returned by the rewards computation.

use thiserror::Error;

/// Reasons an event log is malformed, independent of any accumulated state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("negative amount")]
    NegativeAmount,

    #[error("block numbers not monotonically increasing")]
    NonMonotonicBlockNumber,

    #[error("BLOCK event must be the last event of its block")]
    BlockNotLastInBlock,

    #[error("WITHDRAW event must not carry an amount")]
    WithdrawWithAmount,

    #[error("unrecognized event type: {0}")]
    UnrecognizedKind(String),

    #[error("unrecognized amount: {0}")]
    UnrecognizedAmount(String),

    #[error("{0} event is missing its source")]
    MissingSource(&'static str),

    #[error("{0} event is missing its amount")]
    MissingAmount(&'static str),
}

/// Reasons a well-formed event cannot be applied to the current state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("un-vote without prior stake")]
    UnvoteWithoutStake,

    #[error("un-vote drives stake negative")]
    UnvoteExceedsStake,

    #[error("withdraw with no pending balance")]
    WithdrawWithoutPending,

    #[error("block reward with no stake delegated")]
    BlockWithoutStake,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("rewards already computed by this manager")]
    AlreadyComputed,
}

/// Error aborting a rewards computation at the first invalid event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardsError {
    #[error("invalid input at event {index}: {reason}")]
    InvalidInput { index: usize, reason: InputError },

    #[error("invalid state at event {index}: {reason}")]
    InvalidState { index: usize, reason: StateError },
}

impl RewardsError {
    pub fn input(index: usize, reason: InputError) -> Self {
        Self::InvalidInput { index, reason }
    }

    pub fn state(index: usize, reason: StateError) -> Self {
        Self::InvalidState { index, reason }
    }

    /// Index of the offending event in the log.
    pub fn index(&self) -> usize {
        match self {
            Self::InvalidInput { index, .. } | Self::InvalidState { index, .. } => *index,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}
