// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::*;
use crate::{Evidence, SlashingError, DOUBLE_SIGN_JAIL_END_TIME};
use assert_matches::assert_matches;
use bonding_staking_exports::ValidatorUpdate;

/// Validator `name` bonded at height 1 with a 10_000_000 self bond
fn bonded_validator(env: &TestEnv, name: &str) -> (ValidatorAddress, ConsensusAddress) {
    let mut ctx = env.block(1, GENESIS_TIME);
    let (operator, cons_addr) = env.create_validator(&mut ctx, name, 1, 10_000_000);
    assert_eq!(env.staking.end_block(&mut ctx).unwrap().len(), 1);
    env.commit(ctx);
    (operator, cons_addr)
}

fn evidence(cons_addr: ConsensusAddress, height: u64, time: u64) -> Evidence {
    Evidence {
        consensus_address: cons_addr,
        height,
        time: BondingTime::from_millis(time),
        power: 10,
    }
}

#[test]
fn test_double_sign_slashes_jails_and_tombstones() {
    let env = TestEnv::new(true);
    let (operator, cons_addr) = bonded_validator(&env, "validator");

    let mut ctx = env.block(10, GENESIS_TIME + 10_000);
    let info = env
        .slashing
        .get_signing_info(&ctx, &cons_addr)
        .unwrap()
        .unwrap();
    assert_eq!(info.start_height, 1);
    assert!(!info.tombstoned);

    let evidence = evidence(cons_addr, 8, GENESIS_TIME + 8_000);
    env.slashing
        .handle_double_sign(&env.staking, &mut ctx, &evidence)
        .unwrap();
    let validator = env.staking.must_get_validator(&ctx, &operator).unwrap();
    // 5% of 10 units of power
    assert_eq!(validator.tokens, Amount::from_raw(9_500_000));
    assert!(validator.jailed);
    let info = env
        .slashing
        .get_signing_info(&ctx, &cons_addr)
        .unwrap()
        .unwrap();
    assert!(info.tombstoned);
    assert_eq!(info.jailed_until, DOUBLE_SIGN_JAIL_END_TIME);
    assert_eq!(
        env.staking.get_bonded_pool(&ctx).unwrap(),
        Amount::from_raw(9_500_000)
    );

    // the same evidence again changes nothing
    env.slashing
        .handle_double_sign(&env.staking, &mut ctx, &evidence)
        .unwrap();
    let validator = env.staking.must_get_validator(&ctx, &operator).unwrap();
    assert_eq!(validator.tokens, Amount::from_raw(9_500_000));

    // jailed: out of the active set at the end of the block
    let updates = env.staking.end_block(&mut ctx).unwrap();
    assert_eq!(updates.len(), 1);
    assert_matches!(updates[0], ValidatorUpdate { power: 0, .. });

    assert_matches!(
        env.slashing.unjail(&env.staking, &mut ctx, &operator),
        Err(SlashingError::ValidatorTombstoned)
    );
}

#[test]
fn test_double_sign_with_oversized_power_burns_all_tokens() {
    let env = TestEnv::new(true);
    let (operator, cons_addr) = bonded_validator(&env, "validator");

    let mut ctx = env.block(10, GENESIS_TIME + 10_000);
    let evidence = Evidence {
        power: u64::MAX,
        ..evidence(cons_addr, 8, GENESIS_TIME + 8_000)
    };
    env.slashing
        .handle_double_sign(&env.staking, &mut ctx, &evidence)
        .unwrap();
    let validator = env.staking.must_get_validator(&ctx, &operator).unwrap();
    assert!(validator.tokens.is_zero());
    assert!(validator.jailed);
    assert!(env.slashing.is_tombstoned(&ctx, &cons_addr).unwrap());
    assert_eq!(env.staking.get_bonded_pool(&ctx).unwrap(), Amount::zero());
}

#[test]
fn test_stale_evidence_is_ignored() {
    let env = TestEnv::new(true);
    let (operator, cons_addr) = bonded_validator(&env, "validator");

    let mut ctx = env.block(100, GENESIS_TIME + MAX_EVIDENCE_AGE + 1);
    env.slashing
        .handle_double_sign(&env.staking, &mut ctx, &evidence(cons_addr, 1, GENESIS_TIME))
        .unwrap();
    let validator = env.staking.must_get_validator(&ctx, &operator).unwrap();
    assert_eq!(validator.tokens, Amount::from_raw(10_000_000));
    assert!(!validator.jailed);
    assert!(validator.is_bonded());
    assert!(!env.slashing.is_tombstoned(&ctx, &cons_addr).unwrap());
}

#[test]
fn test_uncorrelated_evidence_is_ignored() {
    let env = TestEnv::new(true);
    let mut ctx = env.block(1, GENESIS_TIME);
    // registered but never bonded
    let (operator, cons_addr) = env.create_validator(&mut ctx, "validator", 1, 10_000_000);
    env.slashing
        .handle_double_sign(&env.staking, &mut ctx, &evidence(cons_addr, 1, GENESIS_TIME))
        .unwrap();
    let validator = env.staking.must_get_validator(&ctx, &operator).unwrap();
    assert!(!validator.jailed);
    assert_eq!(validator.tokens, Amount::from_raw(10_000_000));

    let unknown = ConsensusAddress::from_public_key(&KeyPair::generate().get_public_key());
    env.slashing
        .handle_double_sign(&env.staking, &mut ctx, &evidence(unknown, 1, GENESIS_TIME))
        .unwrap();
    assert!(env
        .slashing
        .get_signing_info(&ctx, &unknown)
        .unwrap()
        .is_none());
}

#[test]
fn test_missing_signing_info_is_fatal() {
    let env = TestEnv::new(false);
    let mut ctx = env.block(1, GENESIS_TIME);
    let (operator, cons_addr) = env.create_validator(&mut ctx, "validator", 1, 10_000_000);
    env.staking.end_block(&mut ctx).unwrap();
    let validator = env.staking.must_get_validator(&ctx, &operator).unwrap();
    env.slashing
        .records()
        .add_pubkey(&mut ctx, &validator.consensus_pubkey)
        .unwrap();

    let err = env
        .slashing
        .handle_double_sign(&env.staking, &mut ctx, &evidence(cons_addr, 1, GENESIS_TIME))
        .unwrap_err();
    assert_matches!(err, SlashingError::Invariant(_));
    assert!(err.is_fatal());
}

#[test]
fn test_unjail_checks() {
    let env = TestEnv::new(true);
    let mut ctx = env.block(1, GENESIS_TIME);
    let (operator, _) = env.create_validator(&mut ctx, "validator", 500_000, 1_000_000);
    let delegator = Address::from_module_name("delegator");
    env.delegate(&mut ctx, &delegator, &operator, 1_000_000);
    env.staking.end_block(&mut ctx).unwrap();
    env.commit(ctx);

    let mut ctx = env.block(2, GENESIS_TIME + 1_000);
    assert_matches!(
        env.slashing.unjail(&env.staking, &mut ctx, &operator),
        Err(SlashingError::NotJailed)
    );
    assert_matches!(
        env.slashing.unjail(
            &env.staking,
            &mut ctx,
            &ValidatorAddress::from(Address::from_module_name("unknown"))
        ),
        Err(SlashingError::NoValidator(_))
    );

    // the operator withdraws below its minimum and gets jailed
    let operator_account = Address::from(operator);
    env.staking
        .undelegate(
            &mut ctx,
            &operator_account,
            &operator,
            bonding_models::Dec::from_amount(Amount::from_raw(600_000)),
        )
        .unwrap();
    assert!(env.staking.must_get_validator(&ctx, &operator).unwrap().jailed);
    assert_matches!(
        env.slashing.unjail(&env.staking, &mut ctx, &operator),
        Err(SlashingError::SelfDelegationTooLow(_, _))
    );

    env.delegate(&mut ctx, &operator_account, &operator, 200_000);
    env.slashing
        .unjail(&env.staking, &mut ctx, &operator)
        .unwrap();
    assert!(!env.staking.must_get_validator(&ctx, &operator).unwrap().jailed);

    // without any self delegation
    env.staking
        .undelegate(
            &mut ctx,
            &operator_account,
            &operator,
            bonding_models::Dec::from_amount(Amount::from_raw(600_000)),
        )
        .unwrap();
    assert_matches!(
        env.slashing.unjail(&env.staking, &mut ctx, &operator),
        Err(SlashingError::MissingSelfDelegation)
    );
}

#[test]
fn test_removed_validator_forgets_its_key() {
    let env = TestEnv::new(true);
    let mut ctx = env.block(1, GENESIS_TIME);
    let (operator, cons_addr) = env.create_validator(&mut ctx, "validator", 1, 1_000);
    assert!(env
        .slashing
        .records()
        .get_pubkey(&ctx, &cons_addr)
        .unwrap()
        .is_some());
    env.staking
        .undelegate(
            &mut ctx,
            &Address::from(operator),
            &operator,
            bonding_models::Dec::from_amount(Amount::from_raw(1_000)),
        )
        .unwrap();
    assert!(env.staking.get_validator(&ctx, &operator).unwrap().is_none());
    assert!(env
        .slashing
        .records()
        .get_pubkey(&ctx, &cons_addr)
        .unwrap()
        .is_none());
}
