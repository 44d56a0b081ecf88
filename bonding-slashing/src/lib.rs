// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! # General description
//!
//! Slashing of the validators that signed two different blocks at the same height.
//!
//! The consensus layer reports equivocations as `Evidence`. Evidence about an unknown key,
//! older than `max_evidence_age`, or targeting an unbonded or already tombstoned validator
//! is dropped. Otherwise the validator is slashed by `slash_fraction_double_sign`, jailed
//! and tombstoned: it can never be unjailed again.
//!
//! The slashing state keeps a `SigningInfo` per consensus address and the consensus public
//! key registry. Both are maintained through `SlashingHooks`, registered on the staking
//! state.

#![warn(missing_docs)]

mod config;
mod error;
mod evidence;
mod hooks;
mod records;
mod signing_info;
mod state;

pub use config::{SlashingConfig, DOUBLE_SIGN_JAIL_END_TIME};
pub use error::{SlashingError, SlashingResult};
pub use evidence::Evidence;
pub use hooks::SlashingHooks;
pub use records::SlashingRecords;
pub use signing_info::{SigningInfo, SigningInfoDeserializer, SigningInfoSerializer};
pub use state::SlashingState;

#[cfg(test)]
mod tests;
