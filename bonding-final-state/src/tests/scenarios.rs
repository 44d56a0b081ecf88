// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{operator, TestNode, UNBONDING_TIME};
use crate::{FinalStateError, Message, MessageOutcome};
use assert_matches::assert_matches;
use bonding_db_exports::PUBKEY_PREFIX;
use bonding_models::{Address, Amount, BlockHeader, ConsensusAddress};
use bonding_signature::KeyPair;
use bonding_slashing::{Evidence, SlashingError};
use bonding_staking_exports::{MockStakingHooks, StakingError, ValidatorUpdate};
use bonding_time::BondingTime;

fn create_validator(name: &str, self_bond: u64) -> (Message, KeyPair) {
    let keypair = KeyPair::generate();
    let message = Message::CreateValidator {
        operator: operator(name),
        consensus_pubkey: keypair.get_public_key(),
        min_self_delegation: Amount::from_raw(1),
        self_bond: Amount::from_raw(self_bond),
    };
    (message, keypair)
}

#[test]
fn test_block_lifecycle() {
    let alice = operator("alice");
    let bob = Address::from_module_name("bob");
    let mut node = TestNode::new(
        vec![(Address::from(alice), 5_000_000), (bob, 2_000_000)],
        Vec::new(),
    );
    let (create, keypair) = create_validator("alice", 1_000_000);

    node.begin(1, 1_000, &[]);
    assert_matches!(
        node.state.deliver(&create),
        Ok(MessageOutcome::ValidatorCreated(_))
    );
    assert_matches!(
        node.state.deliver(&Message::Delegate {
            delegator: bob,
            validator: alice,
            amount: Amount::from_raw(1_000_000),
        }),
        Ok(MessageOutcome::Delegated(_))
    );
    assert_eq!(
        node.state.end_block().unwrap(),
        vec![ValidatorUpdate {
            pub_key: keypair.get_public_key(),
            power: 2,
        }]
    );
    assert_eq!(node.state.commit().unwrap(), 1);
    assert_eq!(node.state.committed_height().unwrap(), 1);
    assert_eq!(node.committed_balance(&Address::from(alice)), 4_000_000);
    assert_eq!(node.committed_balance(&bob), 1_000_000);

    node.begin(2, 2_000, &[]);
    let outcome = node
        .state
        .deliver(&Message::Undelegate {
            delegator: bob,
            validator: alice,
            amount: Amount::from_raw(500_000),
        })
        .unwrap();
    assert_eq!(
        outcome,
        MessageOutcome::Undelegated(BondingTime::from_millis(2_000 + UNBONDING_TIME))
    );
    assert_eq!(
        node.state.end_block().unwrap(),
        vec![ValidatorUpdate {
            pub_key: keypair.get_public_key(),
            power: 1,
        }]
    );
    node.state.commit().unwrap();
    assert_eq!(node.committed_balance(&bob), 1_000_000);

    // the active set recorded at the start of block 2
    let ctx = node.state.committed_context();
    let info = node
        .state
        .staking()
        .get_historical_info(&ctx, 2)
        .unwrap()
        .expect("missing historical info");
    assert_eq!(info.header, BlockHeader::new(2, BondingTime::from_millis(2_000)));
    assert_eq!(info.validators.len(), 1);
    assert_eq!(info.validators[0].operator_address, alice);

    node.begin(3, 2_000 + UNBONDING_TIME, &[]);
    assert!(node.state.end_block().unwrap().is_empty());
    node.state.commit().unwrap();
    assert_eq!(node.committed_balance(&bob), 1_500_000);
}

#[test]
fn test_rejected_message_leaves_no_trace() {
    let alice = operator("alice");
    let bob = Address::from_module_name("bob");
    let mut node = TestNode::new(
        vec![(Address::from(alice), 1_000_000), (bob, 100)],
        Vec::new(),
    );
    let (create, _) = create_validator("alice", 1_000_000);

    node.begin(1, 1_000, &[]);
    node.state.deliver(&create).unwrap();
    let before = node.state.pending_context().unwrap().tx.batch().clone();

    let err = node
        .state
        .deliver(&Message::Delegate {
            delegator: bob,
            validator: alice,
            amount: Amount::from_raw(101),
        })
        .unwrap_err();
    assert_matches!(
        err,
        FinalStateError::StakingError(StakingError::InsufficientFunds(_))
    );
    assert!(!err.is_fatal());
    assert_matches!(
        node.state.deliver(&Message::Delegate {
            delegator: bob,
            validator: alice,
            amount: Amount::zero(),
        }),
        Err(FinalStateError::StakingError(
            StakingError::InvalidDelegationAmount
        ))
    );
    assert_matches!(
        node.state.deliver(&Message::Undelegate {
            delegator: bob,
            validator: alice,
            amount: Amount::from_raw(10),
        }),
        Err(FinalStateError::StakingError(StakingError::NoDelegation))
    );
    assert_matches!(
        node.state.deliver(&create),
        Err(FinalStateError::StakingError(
            StakingError::ValidatorOwnerExists(_)
        ))
    );
    assert_eq!(node.state.pending_context().unwrap().tx.batch(), &before);

    // the block goes on
    node.state.end_block().unwrap();
    node.state.commit().unwrap();
    assert_eq!(node.committed_balance(&bob), 100);
}

#[test]
fn test_fatal_evidence_poisons_the_block() {
    let alice = operator("alice");
    let mut node = TestNode::new(vec![(Address::from(alice), 1_000_000)], Vec::new());
    let (create, keypair) = create_validator("alice", 1_000_000);
    let cons_addr = ConsensusAddress::from_public_key(&keypair.get_public_key());

    node.begin(1, 1_000, &[]);
    node.state.deliver(&create).unwrap();
    node.state.end_block().unwrap();
    node.state.commit().unwrap();

    // an infraction reported in the future cannot be slashed
    let evidence = Evidence {
        consensus_address: cons_addr,
        height: 100,
        time: BondingTime::from_millis(2_000),
        power: 1,
    };
    let err = node
        .state
        .begin_block(
            BlockHeader::new(2, BondingTime::from_millis(2_000)),
            &[evidence],
        )
        .unwrap_err();
    assert!(err.is_fatal());
    assert_matches!(
        node.state.deliver(&Message::Unjail { operator: alice }),
        Err(FinalStateError::BlockPoisoned(_))
    );
    assert_matches!(node.state.end_block(), Err(FinalStateError::BlockPoisoned(_)));
    assert_matches!(node.state.commit(), Err(FinalStateError::BlockPoisoned(_)));
    assert_eq!(node.state.committed_height().unwrap(), 1);

    // the poisoned block was dropped, the height is free again
    node.begin(2, 2_000, &[]);
    let ctx = node.state.pending_context().unwrap();
    let validator = node
        .state
        .staking()
        .must_get_validator(ctx, &alice)
        .unwrap();
    assert_eq!(validator.tokens, Amount::from_raw(1_000_000));
    assert!(!validator.jailed);
    node.state.end_block().unwrap();
    assert_eq!(node.state.commit().unwrap(), 2);
}

#[test]
fn test_double_sign_through_begin_block() {
    let alice = operator("alice");
    let mut node = TestNode::new(vec![(Address::from(alice), 1_000_000)], Vec::new());
    let (create, keypair) = create_validator("alice", 1_000_000);
    let cons_addr = ConsensusAddress::from_public_key(&keypair.get_public_key());

    node.begin(1, 1_000, &[]);
    node.state.deliver(&create).unwrap();
    node.state.end_block().unwrap();
    node.state.commit().unwrap();

    let evidence = Evidence {
        consensus_address: cons_addr,
        height: 1,
        time: BondingTime::from_millis(1_000),
        power: 1,
    };
    node.begin(2, 2_000, &[evidence]);
    {
        let ctx = node.state.pending_context().unwrap();
        let validator = node
            .state
            .staking()
            .must_get_validator(ctx, &alice)
            .unwrap();
        // 5% of one unit of power
        assert_eq!(validator.tokens, Amount::from_raw(950_000));
        assert!(validator.jailed);
        assert!(node.state.slashing().is_tombstoned(ctx, &cons_addr).unwrap());
    }
    let err = node
        .state
        .deliver(&Message::Unjail { operator: alice })
        .unwrap_err();
    assert_matches!(
        err,
        FinalStateError::SlashingError(SlashingError::ValidatorTombstoned)
    );
    assert!(!err.is_fatal());
    assert_eq!(
        node.state.end_block().unwrap(),
        vec![ValidatorUpdate {
            pub_key: keypair.get_public_key(),
            power: 0,
        }]
    );
    node.state.commit().unwrap();
}

#[test]
fn test_block_sequence_errors() {
    let mut node = TestNode::new(Vec::new(), Vec::new());
    assert_matches!(
        node.state.deliver(&Message::Unjail {
            operator: operator("alice"),
        }),
        Err(FinalStateError::NoBlockInProgress)
    );
    assert_matches!(node.state.commit(), Err(FinalStateError::NoBlockInProgress));
    assert_matches!(
        node.state
            .begin_block(BlockHeader::new(0, BondingTime::from_millis(0)), &[]),
        Err(FinalStateError::InvalidBlockHeight(0, 0))
    );

    node.begin(1, 1_000, &[]);
    assert_matches!(
        node.state
            .begin_block(BlockHeader::new(2, BondingTime::from_millis(2_000)), &[]),
        Err(FinalStateError::BlockInProgress(1))
    );
    node.state.abort_block();
    assert!(node.state.pending_context().is_none());
    assert_eq!(node.state.committed_height().unwrap(), 0);

    node.begin(1, 1_000, &[]);
    node.state.commit().unwrap();
    assert_matches!(
        node.state
            .begin_block(BlockHeader::new(1, BondingTime::from_millis(2_000)), &[]),
        Err(FinalStateError::InvalidBlockHeight(1, 1))
    );
}

#[test]
fn test_initial_balances_are_credited_once() {
    let bob = Address::from_module_name("bob");
    let mut node = TestNode::new(vec![(bob, 42)], Vec::new());
    node.begin(1, 1_000, &[]);
    node.state.commit().unwrap();
    node.begin(2, 2_000, &[]);
    node.state.commit().unwrap();
    assert_eq!(node.committed_balance(&bob), 42);
}

#[test]
fn test_extra_hooks_follow_the_slashing_hooks() {
    let mut hooks = MockStakingHooks::new();
    hooks
        .expect_after_validator_created()
        .times(1)
        .returning(|ctx, validator| {
            // the slashing hooks already registered the consensus key
            assert!(ctx
                .tx
                .batch()
                .keys()
                .any(|key| key.starts_with(PUBKEY_PREFIX.as_bytes())));
            assert_eq!(validator.operator_address, operator("alice"));
            Ok(())
        });
    hooks
        .expect_before_delegation_created()
        .times(1)
        .returning(|_, _, _| Ok(()));
    hooks
        .expect_after_delegation_modified()
        .times(1)
        .returning(|_, _, _| Ok(()));

    let alice = operator("alice");
    let mut node = TestNode::new(
        vec![(Address::from(alice), 1_000_000)],
        vec![Box::new(hooks)],
    );
    let (create, _) = create_validator("alice", 1_000_000);
    node.begin(1, 1_000, &[]);
    node.state.deliver(&create).unwrap();
    node.state.commit().unwrap();
}

#[test]
fn test_invalid_staking_limits_are_rejected() {
    let temp_dir = tempfile::TempDir::new().expect("Unable to create a temp folder");
    let db = bonding_db_worker::BondingDB::new(bonding_db_exports::DBConfig {
        path: temp_dir.path().to_path_buf(),
        max_history_length: 10,
    })
    .expect("Unable to open the test database");
    let db = std::sync::Arc::new(parking_lot::RwLock::new(
        Box::new(db) as Box<dyn bonding_db_exports::DBController>
    ));
    let mut config = crate::FinalStateConfig::default();
    config.staking.unbonding_time = BondingTime::from_millis(0);
    assert!(matches!(
        crate::FinalState::new(config, db.clone(), Vec::new()),
        Err(FinalStateError::SettingsError(_))
    ));

    let mut config = crate::FinalStateConfig::default();
    config.staking.max_entries = bonding_staking_exports::MAX_UNBONDING_ENTRIES_LENGTH + 1;
    assert!(matches!(
        crate::FinalState::new(config, db.clone(), Vec::new()),
        Err(FinalStateError::SettingsError(_))
    ));

    let mut config = crate::FinalStateConfig::default();
    config.staking.max_validators = bonding_staking_exports::MAX_HISTORICAL_VALIDATORS_LENGTH + 1;
    assert!(matches!(
        crate::FinalState::new(config, db, Vec::new()),
        Err(FinalStateError::SettingsError(_))
    ));
}

#[test]
fn test_restart_restores_the_last_header() {
    let bob = Address::from_module_name("bob");
    let mut node = TestNode::new(vec![(bob, 1_000)], Vec::new());
    node.restart();
    assert_eq!(
        node.state.committed_context().header,
        BlockHeader::new(0, BondingTime::from_millis(0))
    );

    node.begin(1, 7_000, &[]);
    node.state.end_block().unwrap();
    node.state.commit().unwrap();
    node.restart();
    assert_eq!(
        node.state.committed_context().header,
        BlockHeader::new(1, BondingTime::from_millis(7_000))
    );
    assert_eq!(node.committed_balance(&bob), 1_000);

    // an aborted block leaves the stored header untouched
    node.begin(2, 8_000, &[]);
    node.state.abort_block();
    node.restart();
    assert_eq!(
        node.state.committed_context().block_time(),
        BondingTime::from_millis(7_000)
    );
}
