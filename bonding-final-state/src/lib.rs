// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! # General description
//!
//! The final state drives the staking and slashing state block by block:
//! * `begin_block` opens the block transaction, punishes the reported double signs and
//!   records the historical info of the block;
//! * `deliver` executes the messages of the block, each one inside a savepoint;
//! * `end_block` updates the active set and pays out what matured;
//! * `commit` writes the whole block atomically, with its height as change id.
//!
//! A fatal error at any step poisons the block: it can only be dropped.
//!
//! # Configuration
//!
//! `FinalStateSettings` loads `base_config/config.toml`, an optional override file and the
//! `BONDING_` environment variables with the `config` crate.

#![warn(missing_docs)]

mod config;
mod error;
mod final_state;
mod message;
mod settings;

pub use config::{FinalStateConfig, InitialBalance};
pub use error::{FinalStateError, FinalStateResult};
pub use final_state::FinalState;
pub use message::{Message, MessageOutcome};
pub use settings::FinalStateSettings;

#[cfg(test)]
mod tests;
