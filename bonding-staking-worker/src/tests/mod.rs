// Copyright (c) 2022 MASSA LABS <info@massa.net>


use crate::StakingState;
use bonding_db_exports::{DBConfig, DBController, ShareableDBController};
use bonding_db_worker::BondingDB;
use bonding_models::{Address, Amount, BlockHeader, Dec, ValidatorAddress};
use bonding_signature::KeyPair;
use bonding_staking_exports::{ExecutionContext, LedgerBank, StakingConfig};
use bonding_time::BondingTime;
use parking_lot::RwLock;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) const UNBONDING_TIME: u64 = 3 * 24 * 3600 * 1000;
pub(crate) const GENESIS_TIME: u64 = 1_000_000;

pub(crate) fn test_config() -> StakingConfig {
    StakingConfig {
        unbonding_time: BondingTime::from_millis(UNBONDING_TIME),
        max_validators: 2,
        historical_entries: 2,
        ..StakingConfig::default()
    }
}

pub(crate) struct TestStaking {
    _temp_dir: TempDir,
    db: ShareableDBController,
    pub(crate) state: StakingState,
}

impl TestStaking {
    pub(crate) fn new(config: StakingConfig) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let temp_dir = TempDir::new().expect("Unable to create a temp folder");
        let db = BondingDB::new(DBConfig {
            path: temp_dir.path().to_path_buf(),
            max_history_length: 10,
        })
        .expect("Unable to open the test database");
        let db = Arc::new(RwLock::new(Box::new(db) as Box<dyn DBController>));
        Self {
            _temp_dir: temp_dir,
            db,
            state: StakingState::new(config, Box::new(LedgerBank::new())),
        }
    }

    pub(crate) fn block(&self, height: u64, time: u64) -> ExecutionContext {
        ExecutionContext::new(
            BlockHeader::new(height, BondingTime::from_millis(time)),
            self.db.clone(),
        )
    }

    pub(crate) fn commit(&self, ctx: ExecutionContext) {
        let height = ctx.block_height();
        ctx.tx.commit(height).expect("commit failed");
    }

    pub(crate) fn fund(&self, ctx: &mut ExecutionContext, address: &Address, amount: u64) {
        self.state
            .bank
            .mint_coins(ctx, address, Amount::from_raw(amount))
            .expect("mint failed");
    }

    pub(crate) fn balance(&self, ctx: &ExecutionContext, address: &Address) -> u64 {
        self.state.bank.get_balance(ctx, address).unwrap().to_raw()
    }

    pub(crate) fn pools(&self, ctx: &ExecutionContext) -> (u64, u64) {
        (
            self.state.get_bonded_pool(ctx).unwrap().to_raw(),
            self.state.get_not_bonded_pool(ctx).unwrap().to_raw(),
        )
    }

    /// Funds the operator `name` and creates its validator
    pub(crate) fn create_validator(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        min_self_delegation: u64,
        self_bond: u64,
    ) -> (ValidatorAddress, KeyPair) {
        let operator = operator(name);
        let keypair = KeyPair::generate();
        self.fund(ctx, &Address::from(operator), self_bond);
        self.state
            .create_validator(
                ctx,
                operator,
                keypair.get_public_key(),
                Amount::from_raw(min_self_delegation),
                Amount::from_raw(self_bond),
            )
            .expect("validator creation failed");
        (operator, keypair)
    }

    pub(crate) fn delegate(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
        amount: u64,
    ) -> Dec {
        let validator = self.state.must_get_validator(ctx, operator).unwrap();
        self.state
            .delegate(
                ctx,
                *delegator,
                Amount::from_raw(amount),
                bonding_models::BondStatus::Unbonded,
                validator,
                true,
            )
            .expect("delegation failed")
    }
}

pub(crate) fn operator(name: &str) -> ValidatorAddress {
    ValidatorAddress::from(Address::from_module_name(name))
}

pub(crate) fn shares(amount: u64) -> Dec {
    Dec::from_amount(Amount::from_raw(amount))
}
