// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This file defines all error types for the final state

use bonding_db_exports::DBError;
use bonding_slashing::SlashingError;
use bonding_staking_exports::StakingError;
use displaydoc::Display;
use thiserror::Error;

/// final state result
pub type FinalStateResult<T, E = FinalStateError> = core::result::Result<T, E>;

/// final state error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum FinalStateError {
    /// no block in progress
    NoBlockInProgress,
    /// block {0} is already in progress
    BlockInProgress(u64),
    /// block poisoned by a fatal error: {0}
    BlockPoisoned(String),
    /// block height {0} does not follow the committed height {1}
    InvalidBlockHeight(u64, u64),
    /// staking error: {0}
    StakingError(#[from] StakingError),
    /// slashing error: {0}
    SlashingError(#[from] SlashingError),
    /// database error: {0}
    DBError(#[from] DBError),
    /// settings error: {0}
    SettingsError(String),
}

impl FinalStateError {
    /// Whether the error poisons the block in progress
    pub fn is_fatal(&self) -> bool {
        match self {
            FinalStateError::StakingError(err) => err.is_fatal(),
            FinalStateError::SlashingError(err) => err.is_fatal(),
            FinalStateError::DBError(_) | FinalStateError::BlockPoisoned(_) => true,
            _ => false,
        }
    }
}
