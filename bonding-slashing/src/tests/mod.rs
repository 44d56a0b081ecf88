// Copyright (c) 2022 MASSA LABS <info@massa.net>

mod scenarios;

use crate::{SlashingConfig, SlashingHooks, SlashingState};
use bonding_db_exports::{DBConfig, DBController, ShareableDBController};
use bonding_db_worker::BondingDB;
use bonding_models::{Address, Amount, BlockHeader, BondStatus, ConsensusAddress, ValidatorAddress};
use bonding_signature::KeyPair;
use bonding_staking_exports::{BankController, ExecutionContext, LedgerBank, StakingConfig};
use bonding_staking_worker::StakingState;
use bonding_time::BondingTime;
use parking_lot::RwLock;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) const GENESIS_TIME: u64 = 1_000_000;
pub(crate) const MAX_EVIDENCE_AGE: u64 = 60_000;

pub(crate) struct TestEnv {
    _temp_dir: TempDir,
    db: ShareableDBController,
    bank: LedgerBank,
    pub(crate) staking: StakingState,
    pub(crate) slashing: SlashingState,
}

impl TestEnv {
    pub(crate) fn new(with_hooks: bool) -> Self {
        let temp_dir = TempDir::new().expect("Unable to create a temp folder");
        let db = BondingDB::new(DBConfig {
            path: temp_dir.path().to_path_buf(),
            max_history_length: 10,
        })
        .expect("Unable to open the test database");
        let db = Arc::new(RwLock::new(Box::new(db) as Box<dyn DBController>));
        let mut staking = StakingState::new(
            StakingConfig {
                max_validators: 10,
                ..StakingConfig::default()
            },
            Box::new(LedgerBank::new()),
        );
        if with_hooks {
            staking
                .set_hooks(Box::new(SlashingHooks::new()))
                .expect("hooks already set");
        }
        let slashing = SlashingState::new(SlashingConfig {
            max_evidence_age: BondingTime::from_millis(MAX_EVIDENCE_AGE),
            ..SlashingConfig::default()
        });
        Self {
            _temp_dir: temp_dir,
            db,
            bank: LedgerBank::new(),
            staking,
            slashing,
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

    pub(crate) fn delegate(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
        amount: u64,
    ) {
        self.bank
            .mint_coins(ctx, delegator, Amount::from_raw(amount))
            .expect("mint failed");
        let validator = self.staking.must_get_validator(ctx, operator).unwrap();
        self.staking
            .delegate(
                ctx,
                *delegator,
                Amount::from_raw(amount),
                BondStatus::Unbonded,
                validator,
                true,
            )
            .expect("delegation failed");
    }

    /// Creates the validator `name`, returns its operator and consensus addresses
    pub(crate) fn create_validator(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        min_self_delegation: u64,
        self_bond: u64,
    ) -> (ValidatorAddress, ConsensusAddress) {
        let operator = ValidatorAddress::from(Address::from_module_name(name));
        let public_key = KeyPair::generate().get_public_key();
        self.bank
            .mint_coins(ctx, &Address::from(operator), Amount::from_raw(self_bond))
            .expect("mint failed");
        self.staking
            .create_validator(
                ctx,
                operator,
                public_key,
                Amount::from_raw(min_self_delegation),
                Amount::from_raw(self_bond),
            )
            .expect("validator creation failed");
        (operator, ConsensusAddress::from_public_key(&public_key))
    }
}
