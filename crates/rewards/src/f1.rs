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

//! F1 fee distribution: lazy settlement against cumulative reward ratios.
//!
//! Each BLOCK event closes a period and appends the cumulative reward per unit of stake to the
//! period history. A delegator remembers the period in which its stake last changed; when the stake
//! changes again (or the delegator withdraws), the rewards accrued since then are
//! `stake * (ratio[now] - ratio[start]) / F1_RATIO_PRECISION` and are moved into its pending
//! balance. BLOCK events therefore cost O(1) regardless of the number of delegators.
//!
//! Accrued rewards are truncated, so the sum of all reported rewards can fall short of the sum of
//! block rewards by at most one unit per settlement, plus one unit overall while
//! `total_stake * blocks < F1_RATIO_PRECISION`. The shortfall stays in the outstanding total.

use std::collections::BTreeMap;

use alloy_primitives::U256;

use crate::{
    accumulator::RewardAccumulator,
    error::{RewardsError, StateError},
    event::{Action, DelegatorId, Event},
    ledger::StakeLedger,
    manager::{replay, RewardsManager},
};

/// Fixed-point scale of the cumulative reward ratios.
pub const F1_RATIO_PRECISION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Rewards manager using the F1 fee distribution scheme.
#[derive(Debug, Clone)]
pub struct F1RewardsManager {
    ledger: StakeLedger,
    rewards: RewardAccumulator,
    /// Cumulative reward per unit of stake, scaled by [F1_RATIO_PRECISION], at the end of each
    /// period. Period 0 is the empty prefix.
    ratios: Vec<U256>,
    /// Period in which each delegator's stake was last settled.
    start_periods: BTreeMap<DelegatorId, usize>,
    computed: bool,
}

impl Default for F1RewardsManager {
    fn default() -> Self {
        Self {
            ledger: StakeLedger::default(),
            rewards: RewardAccumulator::default(),
            ratios: vec![U256::ZERO],
            start_periods: BTreeMap::new(),
            computed: false,
        }
    }
}

impl F1RewardsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    /// Index of the current (open) period.
    pub fn current_period(&self) -> usize {
        self.ratios.len() - 1
    }

    fn current_ratio(&self) -> U256 {
        self.ratios.last().copied().unwrap_or(U256::ZERO)
    }

    /// Stake of `delegator` and the ratio growth since its last settlement, if any block was
    /// credited to it since then.
    fn accrual(&self, delegator: &DelegatorId) -> Option<(U256, U256)> {
        let stake = self.ledger.stake_of(delegator);
        let start = self.start_periods.get(delegator).copied().unwrap_or(self.current_period());
        if stake == U256::ZERO || start >= self.current_period() {
            return None;
        }
        Some((stake, self.current_ratio() - self.ratios[start]))
    }

    /// Rewards accrued by `delegator` since its last settlement.
    fn accrued(&self, delegator: &DelegatorId) -> Result<Option<U256>, StateError> {
        let Some((stake, delta)) = self.accrual(delegator) else { return Ok(None) };
        let accrued = stake.checked_mul(delta).ok_or(StateError::ArithmeticOverflow)?;
        Ok(Some(accrued / F1_RATIO_PRECISION))
    }

    /// Like [Self::accrued], saturating at `U256::MAX` instead of failing.
    fn accrued_saturating(&self, delegator: &DelegatorId) -> Option<U256> {
        self.accrual(delegator).map(|(stake, delta)| stake.saturating_mul(delta) / F1_RATIO_PRECISION)
    }

    /// Move the accrued rewards of `delegator` into its pending balance and restart its period.
    fn settle(&mut self, delegator: DelegatorId) -> Result<(), StateError> {
        if let Some(accrued) = self.accrued(&delegator)? {
            tracing::trace!(%delegator, %accrued, "settled accrued rewards");
            self.rewards.credit(delegator, accrued)?;
        }
        self.restart_period(delegator);
        Ok(())
    }

    fn restart_period(&mut self, delegator: DelegatorId) {
        if self.ledger.contains(&delegator) {
            let period = self.current_period();
            self.start_periods.insert(delegator, period);
        } else {
            self.start_periods.remove(&delegator);
        }
    }

    fn apply(&mut self, action: Action) -> Result<(), StateError> {
        match action {
            Action::Vote { delegator, amount } => {
                // Check the ledger addition before settling so a failure leaves no trace.
                let stake = self.ledger.stake_of(&delegator);
                if stake.checked_add(amount).is_none()
                    || self.ledger.total_stake().checked_add(amount).is_none()
                {
                    return Err(StateError::ArithmeticOverflow);
                }
                self.settle(delegator)?;
                self.ledger.apply_vote(delegator, amount)?;
                self.restart_period(delegator);
                Ok(())
            }
            Action::Unvote { delegator, amount } => {
                // Validate against the ledger before settling so a failure leaves no trace.
                if !self.ledger.contains(&delegator) {
                    return Err(StateError::UnvoteWithoutStake);
                }
                if self.ledger.stake_of(&delegator) < amount {
                    return Err(StateError::UnvoteExceedsStake);
                }
                self.settle(delegator)?;
                self.ledger.apply_unvote(delegator, amount)?;
                self.restart_period(delegator);
                Ok(())
            }
            Action::Block { reward } => {
                let total_stake = self.ledger.total_stake();
                if total_stake == U256::ZERO {
                    return Err(StateError::BlockWithoutStake);
                }
                let scaled =
                    reward.checked_mul(F1_RATIO_PRECISION).ok_or(StateError::ArithmeticOverflow)?;
                let ratio = self
                    .current_ratio()
                    .checked_add(scaled / total_stake)
                    .ok_or(StateError::ArithmeticOverflow)?;
                self.rewards.record_block(reward)?;
                self.ratios.push(ratio);
                Ok(())
            }
            Action::Withdraw { delegator } => {
                self.settle(delegator)?;
                self.rewards.withdraw(delegator).map(|_| ())
            }
        }
    }

    /// Settle every delegator with stake so pending balances reflect all blocks seen.
    fn settle_all(&mut self) -> Result<(), StateError> {
        let delegators: Vec<DelegatorId> = self.ledger.iter().map(|(d, _)| *d).collect();
        for delegator in delegators {
            self.settle(delegator)?;
        }
        Ok(())
    }
}

impl RewardsManager for F1RewardsManager {
    fn compute_rewards(
        &mut self,
        events: &[Event],
    ) -> Result<BTreeMap<DelegatorId, U256>, RewardsError> {
        if self.computed {
            return Err(RewardsError::state(0, StateError::AlreadyComputed));
        }
        self.computed = true;

        replay(events, |action| self.apply(action))?;
        self.settle_all().map_err(|reason| RewardsError::state(events.len(), reason))?;

        let totals = self.rewards.totals();
        tracing::info!(
            events = events.len(),
            periods = self.current_period(),
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

    /// Settled pending balance plus anything accrued since the last settlement.
    fn pending_of(&self, delegator: &DelegatorId) -> Option<U256> {
        let settled = self.rewards.pending_of(delegator);
        let accrued = self.accrued_saturating(delegator);
        match (settled, accrued) {
            (None, None) => None,
            (settled, accrued) => {
                Some(settled.unwrap_or(U256::ZERO).saturating_add(accrued.unwrap_or(U256::ZERO)))
            }
        }
    }

    fn withdrawn_of(&self, delegator: &DelegatorId) -> Option<U256> {
        self.rewards.withdrawn_of(delegator)
    }

    fn outstanding_rewards(&self) -> U256 {
        self.rewards.outstanding_total()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{B256, I256};

    use super::*;

    fn id(n: u8) -> DelegatorId {
        B256::with_last_byte(n)
    }

    fn amt(n: i64) -> I256 {
        I256::try_from(n).unwrap()
    }

    #[test]
    fn precision_is_ten_to_the_eighteenth() {
        assert_eq!(F1_RATIO_PRECISION, U256::from(10).pow(U256::from(18)));
    }

    #[test]
    fn block_appends_a_period() {
        let events = vec![Event::vote(id(1), 1, amt(4)), Event::block(None, 2, amt(10))];
        let mut manager = F1RewardsManager::new();
        manager.compute_rewards(&events).unwrap();

        assert_eq!(manager.current_period(), 1);
        assert_eq!(manager.ratios[1], U256::from(10) * F1_RATIO_PRECISION / U256::from(4));
    }

    #[test]
    fn unsettled_rewards_are_visible_as_pending() {
        let mut manager = F1RewardsManager::new();
        manager.apply(Action::Vote { delegator: id(1), amount: U256::from(2) }).unwrap();
        manager.apply(Action::Block { reward: U256::from(100) }).unwrap();

        assert_eq!(manager.rewards.pending_of(&id(1)), None);
        assert_eq!(manager.pending_of(&id(1)), Some(U256::from(100)));
    }

    #[test]
    fn failed_unvote_does_not_settle() {
        let mut manager = F1RewardsManager::new();
        manager.apply(Action::Vote { delegator: id(1), amount: U256::from(2) }).unwrap();
        manager.apply(Action::Block { reward: U256::from(100) }).unwrap();

        assert_eq!(
            manager.apply(Action::Unvote { delegator: id(1), amount: U256::from(3) }),
            Err(StateError::UnvoteExceedsStake)
        );
        assert_eq!(manager.rewards.pending_of(&id(1)), None);
        assert_eq!(manager.start_periods[&id(1)], 0);
    }

    #[test]
    fn overflowing_vote_does_not_settle() {
        let mut manager = F1RewardsManager::new();
        manager.apply(Action::Vote { delegator: id(1), amount: U256::from(2) }).unwrap();
        manager.apply(Action::Block { reward: U256::from(100) }).unwrap();

        assert_eq!(
            manager.apply(Action::Vote { delegator: id(1), amount: U256::MAX - U256::from(1) }),
            Err(StateError::ArithmeticOverflow)
        );
        assert_eq!(manager.rewards.pending_of(&id(1)), None);
        assert_eq!(manager.start_periods[&id(1)], 0);
        assert_eq!(manager.stake_of(&id(1)), U256::from(2));
    }

    #[test]
    fn pending_saturates_when_accrual_overflows() {
        let mut manager = F1RewardsManager::new();
        let reward = U256::MAX / F1_RATIO_PRECISION / U256::from(2);
        manager.apply(Action::Vote { delegator: id(1), amount: U256::from(2) }).unwrap();
        for _ in 0..3 {
            manager.apply(Action::Block { reward }).unwrap();
        }

        assert_eq!(manager.accrued(&id(1)), Err(StateError::ArithmeticOverflow));
        assert_eq!(manager.pending_of(&id(1)), Some(U256::MAX / F1_RATIO_PRECISION));
        assert_eq!(
            manager.apply(Action::Withdraw { delegator: id(1) }),
            Err(StateError::ArithmeticOverflow)
        );
    }

    #[test]
    fn withdraw_settles_then_claims() {
        let mut manager = F1RewardsManager::new();
        manager.apply(Action::Vote { delegator: id(1), amount: U256::from(2) }).unwrap();
        assert_eq!(
            manager.apply(Action::Withdraw { delegator: id(1) }),
            Err(StateError::WithdrawWithoutPending)
        );

        manager.apply(Action::Block { reward: U256::from(100) }).unwrap();
        manager.apply(Action::Withdraw { delegator: id(1) }).unwrap();
        assert_eq!(manager.withdrawn_of(&id(1)), Some(U256::from(100)));
        assert_eq!(manager.outstanding_rewards(), U256::ZERO);
        assert_eq!(
            manager.apply(Action::Withdraw { delegator: id(1) }),
            Err(StateError::WithdrawWithoutPending)
        );
    }
}
