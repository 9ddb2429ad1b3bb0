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

use delegation_registry::{RegistryError, StakerRegistry};
use delegation_rewards::{EventKind, Scheme, U256};
use delegation_test_utils::delegator;

fn staker() -> delegation_rewards::DelegatorId {
    delegator(1000)
}

fn registry() -> StakerRegistry {
    let mut registry = StakerRegistry::new();
    registry.register(staker(), delegator(1001), delegator(1002)).unwrap();
    registry
}

#[test]
fn recorded_pool_history_yields_rewards() {
    let mut registry = registry();
    registry.vote(delegator(1), staker(), U256::from(2), 3001).unwrap();
    registry.vote(delegator(2), staker(), U256::from(3), 3003).unwrap();
    registry.record_block_reward(staker(), 3005, U256::from(5000), Some(staker())).unwrap();
    registry.unvote(delegator(2), staker(), U256::from(3), 3006).unwrap();
    registry.record_withdraw(staker(), delegator(2), 3007).unwrap();
    registry.record_block_reward(staker(), 3008, U256::from(5000), Some(staker())).unwrap();

    let kinds: Vec<EventKind> =
        registry.events(&staker()).unwrap().iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Vote,
            EventKind::Vote,
            EventKind::Block,
            EventKind::Unvote,
            EventKind::Withdraw,
            EventKind::Block,
        ]
    );

    for scheme in [Scheme::Simple, Scheme::F1] {
        let report = registry.pool_rewards(&staker(), scheme).unwrap().unwrap();
        assert_eq!(report.total_block_rewards, U256::from(10_000));
        let totals: Vec<(_, _)> =
            report.delegators.iter().map(|entry| (entry.delegator, entry.total)).collect();
        assert_eq!(
            totals,
            vec![(delegator(1), U256::from(7000)), (delegator(2), U256::from(3000))]
        );
    }
}

#[test]
fn unknown_staker_has_no_pool() {
    let registry = registry();
    assert!(registry.pool_rewards(&delegator(5), Scheme::Simple).unwrap().is_none());
    assert_eq!(registry.vote_of(&delegator(5)), U256::ZERO);
}

#[test]
fn rejected_calls_leave_the_log_untouched() {
    let mut registry = registry();
    registry.vote(delegator(1), staker(), U256::from(2), 10).unwrap();

    assert!(matches!(
        registry.unvote(delegator(1), staker(), U256::from(3), 11),
        Err(RegistryError::ExceedsVote { .. })
    ));
    assert!(matches!(
        registry.vote(delegator(2), staker(), U256::from(1), 9),
        Err(RegistryError::OutOfOrder { .. })
    ));

    assert_eq!(registry.events(&staker()).unwrap().len(), 1);
    assert_eq!(registry.vote_of(&staker()), U256::from(2));
}

#[test]
fn block_reward_requires_votes() {
    let mut registry = registry();
    assert_eq!(
        registry.record_block_reward(staker(), 1, U256::from(50), None),
        Err(RegistryError::NoStake(staker()))
    );

    registry.vote(delegator(1), staker(), U256::from(2), 2).unwrap();
    registry.unvote(delegator(1), staker(), U256::from(2), 2).unwrap();
    assert_eq!(
        registry.record_block_reward(staker(), 2, U256::from(50), None),
        Err(RegistryError::NoStake(staker()))
    );

    assert_eq!(registry.events(&staker()).unwrap().len(), 2);
    assert!(registry.pool_rewards(&staker(), Scheme::Simple).unwrap().is_some());
}

#[test]
fn withdraw_requires_a_credited_block() {
    let mut registry = registry();
    registry.vote(delegator(1), staker(), U256::from(2), 1).unwrap();
    assert_eq!(
        registry.record_withdraw(staker(), delegator(1), 1),
        Err(RegistryError::NothingToWithdraw { staker: staker(), delegator: delegator(1) })
    );

    registry.record_block_reward(staker(), 1, U256::from(50), None).unwrap();
    registry.record_withdraw(staker(), delegator(1), 2).unwrap();
    assert_eq!(
        registry.record_withdraw(staker(), delegator(1), 2),
        Err(RegistryError::NothingToWithdraw { staker: staker(), delegator: delegator(1) })
    );
    assert_eq!(
        registry.record_withdraw(staker(), delegator(9), 2),
        Err(RegistryError::NothingToWithdraw { staker: staker(), delegator: delegator(9) })
    );

    // A later block credits the delegator again.
    registry.record_block_reward(staker(), 2, U256::from(30), None).unwrap();
    registry.record_withdraw(staker(), delegator(1), 3).unwrap();

    for scheme in [Scheme::Simple, Scheme::F1] {
        let report = registry.pool_rewards(&staker(), scheme).unwrap().unwrap();
        assert_eq!(report.delegators[0].withdrawn, U256::from(80));
        assert_eq!(report.outstanding, U256::ZERO);
    }
}
