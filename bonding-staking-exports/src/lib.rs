// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Definition and exports of the staking types, errors and interfaces.
//!
//! The state logic lives in `bonding_staking_worker`; this crate holds what the slashing
//! and final state layers need to talk to it: records and their codecs, the configuration,
//! the hooks trait, the bank trait and the block execution context.

#![warn(missing_docs)]

mod bank;
mod config;
mod context;
mod error;
mod hooks;
pub mod keys;
mod types;

pub use bank::{BankController, LedgerBank};
pub use config::{StakingConfig, MAX_HISTORICAL_VALIDATORS_LENGTH, MAX_UNBONDING_ENTRIES_LENGTH};
pub use context::{decode, ExecutionContext};
pub use error::*;
pub use hooks::{MultiStakingHooks, StakingHooks};
pub use types::*;

#[cfg(any(test, feature = "test-exports"))]
pub use hooks::MockStakingHooks;

#[cfg(feature = "test-exports")]
pub mod test_exports;
