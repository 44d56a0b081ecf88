// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! # General description
//!
//! The staking state tracks the tokens bonded to each validator and the shares delegators
//! own in them. It is made of:
//! * the validator registry: records, consensus key index and power index;
//! * the delegation ledger: delegations and unbonding delegations;
//! * the unbonding queues: undelegations and validators waiting for their completion time;
//! * the pool accountant: the bonded and not-bonded module accounts.
//!
//! Every operation works on an `ExecutionContext`: nothing reaches the store before the
//! final state commits the block. Errors flagged by `StakingError::is_fatal` mean that the
//! state is broken and the block must be dropped; the others only concern the message.
//!
//! # End of block
//!
//! `end_block` recomputes the active set from the power index, then unbonds the validators
//! and pays out the undelegations whose completion time has passed.

#![warn(missing_docs)]

mod delegation;
mod historical;
mod pool;
mod slash;
mod state;
mod unbonding_queue;
mod validator;
mod validator_set;

pub use state::StakingState;

#[cfg(test)]
mod tests;
