// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_models::Dec;
use bonding_time::BondingTime;
use serde::{Deserialize, Serialize};

/// End of the jail of a double signer: 9999-12-31T23:59:59Z, never reached
pub const DOUBLE_SIGN_JAIL_END_TIME: BondingTime = BondingTime::from_millis(253_402_300_799_000);

/// slashing module configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashingConfig {
    /// evidence older than this, relative to the block time, is dropped
    pub max_evidence_age: BondingTime,
    /// fraction of the stake burned on double signing
    pub slash_fraction_double_sign: Dec,
    /// blocks between a power change and its effect in consensus
    pub validator_update_delay: u64,
}

impl Default for SlashingConfig {
    fn default() -> Self {
        Self {
            // 3 weeks
            max_evidence_age: BondingTime::from_millis(21 * 24 * 3600 * 1000),
            // 5%
            slash_fraction_double_sign: Dec::from_raw(50_000_000_000_000_000),
            validator_update_delay: 1,
        }
    }
}
