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

//! Current stake per delegator and the pool total.

use std::collections::BTreeMap;

use alloy_primitives::U256;

use crate::{error::StateError, event::DelegatorId};

/// Tracks the stake each delegator currently has in the pool.
///
/// `total_stake` always equals the sum of all entries. Entries driven to zero are removed, so every
/// delegator present holds positive stake.
#[derive(Debug, Clone, Default)]
pub struct StakeLedger {
    stakes: BTreeMap<DelegatorId, U256>,
    total_stake: U256,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_vote(&mut self, delegator: DelegatorId, amount: U256) -> Result<(), StateError> {
        let current = self.stake_of(&delegator);
        let new_stake = current.checked_add(amount).ok_or(StateError::ArithmeticOverflow)?;
        let new_total =
            self.total_stake.checked_add(amount).ok_or(StateError::ArithmeticOverflow)?;

        if new_stake > U256::ZERO {
            self.stakes.insert(delegator, new_stake);
        }
        self.total_stake = new_total;
        Ok(())
    }

    pub fn apply_unvote(&mut self, delegator: DelegatorId, amount: U256) -> Result<(), StateError> {
        let current = *self.stakes.get(&delegator).ok_or(StateError::UnvoteWithoutStake)?;
        let new_stake = current.checked_sub(amount).ok_or(StateError::UnvoteExceedsStake)?;

        if new_stake == U256::ZERO {
            self.stakes.remove(&delegator);
        } else {
            self.stakes.insert(delegator, new_stake);
        }
        // Bounded by `current`, which is part of the total.
        self.total_stake -= amount;
        Ok(())
    }

    /// Stake held by `delegator`, zero when it has none.
    pub fn stake_of(&self, delegator: &DelegatorId) -> U256 {
        self.stakes.get(delegator).copied().unwrap_or(U256::ZERO)
    }

    pub fn contains(&self, delegator: &DelegatorId) -> bool {
        self.stakes.contains_key(delegator)
    }

    pub fn total_stake(&self) -> U256 {
        self.total_stake
    }

    /// Delegators with positive stake, in ascending identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&DelegatorId, &U256)> {
        self.stakes.iter()
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    /// Fraction of the pool held by `delegator`, as a `(stake, total_stake)` pair.
    ///
    /// Fails when the pool has no stake, since a block reward cannot be split in that case.
    pub fn stake_ratio(&self, delegator: &DelegatorId) -> Result<(U256, U256), StateError> {
        if self.total_stake == U256::ZERO {
            return Err(StateError::BlockWithoutStake);
        }
        Ok((self.stake_of(delegator), self.total_stake))
    }

    /// Owned copy of the current stakes.
    pub fn snapshot(&self) -> BTreeMap<DelegatorId, U256> {
        self.stakes.clone()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;

    fn id(n: u8) -> DelegatorId {
        B256::with_last_byte(n)
    }

    fn sum(ledger: &StakeLedger) -> U256 {
        ledger.iter().fold(U256::ZERO, |acc, (_, stake)| acc + *stake)
    }

    #[test]
    fn votes_accumulate() {
        let mut ledger = StakeLedger::new();
        ledger.apply_vote(id(1), U256::from(2)).unwrap();
        ledger.apply_vote(id(1), U256::from(2)).unwrap();
        ledger.apply_vote(id(2), U256::from(3)).unwrap();

        assert_eq!(ledger.stake_of(&id(1)), U256::from(4));
        assert_eq!(ledger.total_stake(), U256::from(7));
        assert_eq!(sum(&ledger), ledger.total_stake());
    }

    #[test]
    fn unvote_without_stake_fails() {
        let mut ledger = StakeLedger::new();
        assert_eq!(
            ledger.apply_unvote(id(1), U256::from(1)),
            Err(StateError::UnvoteWithoutStake)
        );
    }

    #[test]
    fn unvote_exceeding_stake_fails_without_mutation() {
        let mut ledger = StakeLedger::new();
        ledger.apply_vote(id(1), U256::from(2)).unwrap();
        assert_eq!(
            ledger.apply_unvote(id(1), U256::from(3)),
            Err(StateError::UnvoteExceedsStake)
        );
        assert_eq!(ledger.stake_of(&id(1)), U256::from(2));
        assert_eq!(ledger.total_stake(), U256::from(2));
    }

    #[test]
    fn full_unvote_removes_entry() {
        let mut ledger = StakeLedger::new();
        ledger.apply_vote(id(1), U256::from(2)).unwrap();
        ledger.apply_vote(id(2), U256::from(3)).unwrap();
        ledger.apply_unvote(id(2), U256::from(3)).unwrap();

        assert!(!ledger.contains(&id(2)));
        assert_eq!(ledger.total_stake(), U256::from(2));
        assert_eq!(sum(&ledger), ledger.total_stake());
        assert_eq!(
            ledger.apply_unvote(id(2), U256::ZERO),
            Err(StateError::UnvoteWithoutStake)
        );
    }

    #[test]
    fn zero_vote_does_not_create_entry() {
        let mut ledger = StakeLedger::new();
        ledger.apply_vote(id(1), U256::ZERO).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn ratio_requires_stake() {
        let ledger = StakeLedger::new();
        assert_eq!(ledger.stake_ratio(&id(1)), Err(StateError::BlockWithoutStake));
    }
}
