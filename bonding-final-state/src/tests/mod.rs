// Copyright (c) 2022 MASSA LABS <info@massa.net>

mod scenarios;

use crate::{FinalState, FinalStateConfig, InitialBalance};
use bonding_db_exports::{DBConfig, DBController, ShareableDBController};
use bonding_db_worker::BondingDB;
use bonding_models::{Address, Amount, BlockHeader, ValidatorAddress};
use bonding_slashing::Evidence;
use bonding_staking_exports::{StakingConfig, StakingHooks};
use bonding_time::BondingTime;
use parking_lot::RwLock;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) const UNBONDING_TIME: u64 = 10_000;

pub(crate) struct TestNode {
    _temp_dir: TempDir,
    db: ShareableDBController,
    pub(crate) state: FinalState,
}

impl TestNode {
    pub(crate) fn new(
        initial_balances: Vec<(Address, u64)>,
        extra_hooks: Vec<Box<dyn StakingHooks>>,
    ) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let temp_dir = TempDir::new().expect("Unable to create a temp folder");
        let db = BondingDB::new(DBConfig {
            path: temp_dir.path().to_path_buf(),
            max_history_length: 10,
        })
        .expect("Unable to open the test database");
        let db = Arc::new(RwLock::new(Box::new(db) as Box<dyn DBController>));
        let config = FinalStateConfig {
            staking: StakingConfig {
                unbonding_time: BondingTime::from_millis(UNBONDING_TIME),
                max_validators: 10,
                ..StakingConfig::default()
            },
            initial_balances: initial_balances
                .into_iter()
                .map(|(address, amount)| InitialBalance {
                    address,
                    amount: Amount::from_raw(amount),
                })
                .collect(),
            ..FinalStateConfig::default()
        };
        let state =
            FinalState::new(config, db.clone(), extra_hooks).expect("Unable to create the state");
        Self {
            _temp_dir: temp_dir,
            db,
            state,
        }
    }

    /// Rebuilds the state from the database, as after a restart
    pub(crate) fn restart(&mut self) {
        self.state = FinalState::new(self.state.config.clone(), self.db.clone(), Vec::new())
            .expect("Unable to reload the state");
    }

    pub(crate) fn begin(&mut self, height: u64, time: u64, evidence: &[Evidence]) {
        self.state
            .begin_block(
                BlockHeader::new(height, BondingTime::from_millis(time)),
                evidence,
            )
            .expect("begin block failed");
    }

    pub(crate) fn committed_balance(&self, address: &Address) -> u64 {
        let ctx = self.state.committed_context();
        self.state
            .balance(&ctx, address)
            .expect("balance lookup failed")
            .to_raw()
    }
}

pub(crate) fn operator(name: &str) -> ValidatorAddress {
    ValidatorAddress::from(Address::from_module_name(name))
}
