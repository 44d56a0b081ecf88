// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_models::{Address, Amount, Dec, ValidatorAddress};
use bonding_signature::PublicKey;
use bonding_time::BondingTime;
use serde::{Deserialize, Serialize};

/// State transition requested by a transaction of the block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// registers a validator and bonds its self delegation
    CreateValidator {
        /// operator of the new validator, pays the self delegation
        operator: ValidatorAddress,
        /// key signing the blocks
        consensus_pubkey: PublicKey,
        /// self delegation below which the validator gets jailed
        min_self_delegation: Amount,
        /// initial self delegation
        self_bond: Amount,
    },
    /// bonds tokens of `delegator` to `validator`
    Delegate {
        /// delegating account
        delegator: Address,
        /// target validator
        validator: ValidatorAddress,
        /// bonded tokens
        amount: Amount,
    },
    /// starts unbonding `amount` tokens worth of shares
    Undelegate {
        /// delegating account
        delegator: Address,
        /// validator the tokens are bonded to
        validator: ValidatorAddress,
        /// tokens to unbond
        amount: Amount,
    },
    /// lifts the jail of the validator of `operator`
    Unjail {
        /// operator of the jailed validator
        operator: ValidatorAddress,
    },
}

/// Result of a delivered message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// validator created, with the shares issued for the self delegation
    ValidatorCreated(Dec),
    /// shares issued to the delegator
    Delegated(Dec),
    /// time at which the undelegated tokens will be paid out
    Undelegated(BondingTime),
    /// validator unjailed
    Unjailed,
}
