// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_models::{Address, Amount};
use bonding_slashing::SlashingConfig;
use bonding_staking_exports::StakingConfig;
use serde::{Deserialize, Serialize};

/// balance credited to an account when the state is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialBalance {
    /// credited account
    pub address: Address,
    /// credited amount
    pub amount: Amount,
}

/// final state configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalStateConfig {
    /// staking parameters
    pub staking: StakingConfig,
    /// slashing parameters
    pub slashing: SlashingConfig,
    /// balances minted by the first block
    #[serde(default)]
    pub initial_balances: Vec<InitialBalance>,
}
