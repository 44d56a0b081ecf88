// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_models::Amount;
use bonding_time::BondingTime;
use serde::{Deserialize, Serialize};

/// Largest number of entries an unbonding delegation record can be decoded with.
/// Stored records must stay readable when `max_entries` is lowered.
pub const MAX_UNBONDING_ENTRIES_LENGTH: u32 = u16::MAX as u32;

/// Largest number of validators a historical info record can be decoded with
pub const MAX_HISTORICAL_VALIDATORS_LENGTH: u32 = u16::MAX as u32;

/// staking module configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingConfig {
    /// name of the bond denomination, informational only
    pub bond_denom: String,
    /// delay between an undelegation and its payout
    pub unbonding_time: BondingTime,
    /// size of the active validator set, at most `MAX_HISTORICAL_VALIDATORS_LENGTH`
    pub max_validators: u32,
    /// maximum number of entries of one unbonding delegation,
    /// at most `MAX_UNBONDING_ENTRIES_LENGTH`
    pub max_entries: u32,
    /// number of historical info records kept, 0 disables tracking
    pub historical_entries: u32,
    /// tokens per unit of consensus power
    pub power_reduction: Amount,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            bond_denom: "stake".to_string(),
            // 3 weeks
            unbonding_time: BondingTime::from_millis(21 * 24 * 3600 * 1000),
            max_validators: 100,
            max_entries: 7,
            historical_entries: 10_000,
            power_reduction: Amount::from_raw(1_000_000),
        }
    }
}
