// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Store keys of the staking, slashing and bank records.
//!
//! Every key is a string prefix followed by fixed-width binary fields, so that the byte
//! order of the keys is the order the records must be visited in:
//! * times are big-endian milliseconds, so queue buckets come out chronologically;
//! * the power index stores `u64::MAX - power`, so a forward scan yields the highest power
//!   first, ties broken by operator bytes.

use crate::error::{StakingError, StakingResult};
use bonding_db_exports::{
    Key, BALANCE_PREFIX, DELEGATION_PREFIX, HISTORICAL_INFO_PREFIX, KEY_DESER_ERROR,
    LAST_TOTAL_POWER_KEY, LAST_VALIDATOR_POWER_PREFIX, PUBKEY_PREFIX, SIGNING_INFO_PREFIX,
    UNBONDING_DELEGATION_BY_VAL_PREFIX, UNBONDING_DELEGATION_PREFIX, UNBONDING_QUEUE_PREFIX,
    VALIDATOR_BY_CONS_PREFIX, VALIDATOR_BY_POWER_PREFIX, VALIDATOR_PREFIX,
    VALIDATOR_QUEUE_PREFIX,
};
use bonding_models::{Address, ConsensusAddress, ValidatorAddress, ADDRESS_SIZE_BYTES};
use bonding_time::BondingTime;

const POWER_SIZE_BYTES: usize = 8;

/// `staking/validators/` + operator
pub fn validator_key(operator: &ValidatorAddress) -> Key {
    [VALIDATOR_PREFIX.as_bytes(), &operator.to_bytes()[..]].concat()
}

/// `staking/validators_by_cons/` + consensus address
pub fn validator_by_cons_key(cons_addr: &ConsensusAddress) -> Key {
    [VALIDATOR_BY_CONS_PREFIX.as_bytes(), &cons_addr.to_bytes()[..]].concat()
}

/// `staking/validators_by_power/` + inverted power + operator
pub fn validator_by_power_key(power: u64, operator: &ValidatorAddress) -> Key {
    [
        VALIDATOR_BY_POWER_PREFIX.as_bytes(),
        &(u64::MAX - power).to_be_bytes()[..],
        &operator.to_bytes()[..],
    ]
    .concat()
}

/// `staking/last_validator_power/` + operator
pub fn last_validator_power_key(operator: &ValidatorAddress) -> Key {
    [LAST_VALIDATOR_POWER_PREFIX.as_bytes(), &operator.to_bytes()[..]].concat()
}

/// `staking/last_total_power`
pub fn last_total_power_key() -> Key {
    LAST_TOTAL_POWER_KEY.as_bytes().to_vec()
}

/// `staking/delegations/` + delegator + operator
pub fn delegation_key(delegator: &Address, operator: &ValidatorAddress) -> Key {
    [
        DELEGATION_PREFIX.as_bytes(),
        &delegator.to_bytes()[..],
        &operator.to_bytes()[..],
    ]
    .concat()
}

/// `staking/delegations/` + delegator
pub fn delegator_delegations_prefix(delegator: &Address) -> Key {
    [DELEGATION_PREFIX.as_bytes(), &delegator.to_bytes()[..]].concat()
}

/// `staking/ubds/` + delegator + operator
pub fn unbonding_delegation_key(delegator: &Address, operator: &ValidatorAddress) -> Key {
    [
        UNBONDING_DELEGATION_PREFIX.as_bytes(),
        &delegator.to_bytes()[..],
        &operator.to_bytes()[..],
    ]
    .concat()
}

/// `staking/ubds_by_val/` + operator + delegator
pub fn unbonding_delegation_by_val_key(operator: &ValidatorAddress, delegator: &Address) -> Key {
    [
        UNBONDING_DELEGATION_BY_VAL_PREFIX.as_bytes(),
        &operator.to_bytes()[..],
        &delegator.to_bytes()[..],
    ]
    .concat()
}

/// `staking/ubds_by_val/` + operator
pub fn unbonding_delegations_by_val_prefix(operator: &ValidatorAddress) -> Key {
    [
        UNBONDING_DELEGATION_BY_VAL_PREFIX.as_bytes(),
        &operator.to_bytes()[..],
    ]
    .concat()
}

/// `staking/ubd_queue/` + completion time
pub fn unbonding_queue_key(time: BondingTime) -> Key {
    [UNBONDING_QUEUE_PREFIX.as_bytes(), &time.to_key_bytes()[..]].concat()
}

/// `staking/validator_queue/` + completion time
pub fn validator_queue_key(time: BondingTime) -> Key {
    [VALIDATOR_QUEUE_PREFIX.as_bytes(), &time.to_key_bytes()[..]].concat()
}

/// `staking/historical_info/` + height
pub fn historical_info_key(height: u64) -> Key {
    [HISTORICAL_INFO_PREFIX.as_bytes(), &height.to_be_bytes()[..]].concat()
}

/// `slashing/signing_infos/` + consensus address
pub fn signing_info_key(cons_addr: &ConsensusAddress) -> Key {
    [SIGNING_INFO_PREFIX.as_bytes(), &cons_addr.to_bytes()[..]].concat()
}

/// `slashing/pubkeys/` + consensus address
pub fn pubkey_key(cons_addr: &ConsensusAddress) -> Key {
    [PUBKEY_PREFIX.as_bytes(), &cons_addr.to_bytes()[..]].concat()
}

/// `bank/balances/` + address
pub fn balance_key(address: &Address) -> Key {
    [BALANCE_PREFIX.as_bytes(), &address.to_bytes()[..]].concat()
}

fn key_error(key: &[u8]) -> StakingError {
    StakingError::CodecError(format!("{}: {:?}", KEY_DESER_ERROR, key))
}

/// The address stored in the last `ADDRESS_SIZE_BYTES` bytes of a key
pub fn address_suffix(key: &[u8]) -> StakingResult<Address> {
    let start = key
        .len()
        .checked_sub(ADDRESS_SIZE_BYTES)
        .ok_or_else(|| key_error(key))?;
    Address::from_slice(&key[start..]).map_err(|_| key_error(key))
}

/// Operator of a power index key
pub fn operator_from_power_key(key: &[u8]) -> StakingResult<ValidatorAddress> {
    if key.len() != VALIDATOR_BY_POWER_PREFIX.len() + POWER_SIZE_BYTES + ADDRESS_SIZE_BYTES {
        return Err(key_error(key));
    }
    address_suffix(key).map(ValidatorAddress::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_index_orders_by_decreasing_power() {
        let low = ValidatorAddress::from(Address::from_module_name("a"));
        let high = ValidatorAddress::from(Address::from_module_name("b"));
        assert!(validator_by_power_key(10, &high) < validator_by_power_key(9, &low));
        assert!(validator_by_power_key(0, &high) > validator_by_power_key(1, &low));
        assert_eq!(
            operator_from_power_key(&validator_by_power_key(10, &high)).unwrap(),
            high
        );
    }

    #[test]
    fn test_queue_keys_are_chronological() {
        let early = unbonding_queue_key(BondingTime::from_millis(255));
        let late = unbonding_queue_key(BondingTime::from_millis(256));
        assert!(early < late);
        assert!(late < validator_queue_key(BondingTime::from_millis(0)));
    }

    #[test]
    fn test_historical_keys_follow_heights() {
        assert!(historical_info_key(255) < historical_info_key(256));
        assert!(historical_info_key(u64::MAX).starts_with(HISTORICAL_INFO_PREFIX.as_bytes()));
    }
}
