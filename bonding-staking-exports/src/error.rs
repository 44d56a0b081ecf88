// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_db_exports::DBError;
use bonding_models::{ModelsError, ValidatorAddress};
use bonding_time::TimeError;
use displaydoc::Display;
use thiserror::Error;

/// staking result
pub type StakingResult<T, E = StakingError> = core::result::Result<T, E>;

/// staking error
///
/// Variants up to `InsufficientFunds` are caused by the message being processed and only
/// abort that message. The others denote a broken state and abort the whole block.
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum StakingError {
    /// no validator found with operator {0}
    NoValidator(ValidatorAddress),
    /// validator {0} already exists
    ValidatorOwnerExists(ValidatorAddress),
    /// a validator already uses this consensus public key
    ValidatorPubKeyExists,
    /// minimum self delegation must be a positive amount
    InvalidMinSelfDelegation,
    /// self delegation {0} is below the minimum self delegation {1}
    SelfDelegationBelowMinimum(String, String),
    /// invalid delegation amount
    InvalidDelegationAmount,
    /// validator has no tokens but still has delegator shares, its exchange rate is invalid
    InvalidExchangeRate,
    /// no delegation for (address, validator) tuple
    NoDelegation,
    /// insufficient delegation shares
    InsufficientShares,
    /// invalid shares amount
    BadSharesAmount,
    /// too many unbonding delegation entries for (delegator, validator) tuple
    MaxUnbondingDelegationEntries,
    /// no unbonding delegation found
    NoUnbondingDelegation,
    /// insufficient funds: {0}
    InsufficientFunds(String),
    /// staking invariant violated: {0}
    Invariant(String),
    /// staking hooks have already been set
    HooksAlreadySet,
    /// codec error: {0}
    CodecError(String),
    /// database error: {0}
    DBError(#[from] DBError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// time error: {0}
    TimeError(#[from] TimeError),
}

impl StakingError {
    /// Whether the error must abort the whole block instead of the current message
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StakingError::Invariant(_)
                | StakingError::HooksAlreadySet
                | StakingError::CodecError(_)
                | StakingError::DBError(_)
                | StakingError::ModelsError(_)
                | StakingError::TimeError(_)
        )
    }
}
