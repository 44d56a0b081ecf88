// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_models::ValidatorAddress;
use bonding_staking_exports::StakingError;
use displaydoc::Display;
use thiserror::Error;

/// slashing result
pub type SlashingResult<T, E = SlashingError> = core::result::Result<T, E>;

/// slashing error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum SlashingError {
    /// no validator operated by {0}
    NoValidator(ValidatorAddress),
    /// validator has no self delegation
    MissingSelfDelegation,
    /// self delegation {0} is below the minimum {1} required to unjail
    SelfDelegationTooLow(String, String),
    /// validator is not jailed
    NotJailed,
    /// validator is tombstoned and can never be unjailed
    ValidatorTombstoned,
    /// validator is jailed until {0}
    JailedUntilNotPassed(String),
    /// invariant violation: {0}
    Invariant(String),
    /// staking error: {0}
    StakingError(#[from] StakingError),
}

impl SlashingError {
    /// true when the state can no longer be trusted and the block must be dropped
    pub fn is_fatal(&self) -> bool {
        match self {
            SlashingError::Invariant(_) => true,
            SlashingError::StakingError(err) => err.is_fatal(),
            _ => false,
        }
    }
}
