// Commons
pub const METADATA_CF: &str = "metadata";
pub const STATE_CF: &str = "state";

// Change_id
pub const CHANGE_ID_KEY: &[u8; 1] = b"c";
pub const CHANGE_ID_SER_ERROR: &str = "critical: change_id serialization failed";

// Errors
pub const CF_ERROR: &str = "critical: rocksdb column family operation failed";

// Prefixes
pub const VALIDATOR_PREFIX: &str = "staking/validators/";
pub const VALIDATOR_BY_CONS_PREFIX: &str = "staking/validators_by_cons/";
pub const VALIDATOR_BY_POWER_PREFIX: &str = "staking/validators_by_power/";
pub const LAST_VALIDATOR_POWER_PREFIX: &str = "staking/last_validator_power/";
pub const LAST_TOTAL_POWER_KEY: &str = "staking/last_total_power";
pub const DELEGATION_PREFIX: &str = "staking/delegations/";
pub const UNBONDING_DELEGATION_PREFIX: &str = "staking/ubds/";
pub const UNBONDING_DELEGATION_BY_VAL_PREFIX: &str = "staking/ubds_by_val/";
pub const UNBONDING_QUEUE_PREFIX: &str = "staking/ubd_queue/";
pub const VALIDATOR_QUEUE_PREFIX: &str = "staking/validator_queue/";
pub const HISTORICAL_INFO_PREFIX: &str = "staking/historical_info/";
pub const SIGNING_INFO_PREFIX: &str = "slashing/signing_infos/";
pub const PUBKEY_PREFIX: &str = "slashing/pubkeys/";
pub const BALANCE_PREFIX: &str = "bank/balances/";
pub const LAST_HEADER_KEY: &str = "final_state/last_header";

// Staking
pub const VALIDATOR_DESER_ERROR: &str = "critical: validator deserialization failed";
pub const VALIDATOR_SER_ERROR: &str = "critical: validator serialization failed";
pub const DELEGATION_DESER_ERROR: &str = "critical: delegation deserialization failed";
pub const DELEGATION_SER_ERROR: &str = "critical: delegation serialization failed";
pub const UNBONDING_DELEGATION_DESER_ERROR: &str =
    "critical: unbonding delegation deserialization failed";
pub const UNBONDING_DELEGATION_SER_ERROR: &str =
    "critical: unbonding delegation serialization failed";
pub const QUEUE_DESER_ERROR: &str = "critical: queue bucket deserialization failed";
pub const QUEUE_SER_ERROR: &str = "critical: queue bucket serialization failed";
pub const KEY_DESER_ERROR: &str = "critical: key deserialization failed";

// Slashing
pub const SIGNING_INFO_DESER_ERROR: &str = "critical: signing info deserialization failed";
pub const SIGNING_INFO_SER_ERROR: &str = "critical: signing info serialization failed";

// Bank
pub const BALANCE_DESER_ERROR: &str = "critical: balance deserialization failed";
pub const BALANCE_SER_ERROR: &str = "critical: balance serialization failed";

// Final state
pub const HEADER_DESER_ERROR: &str = "critical: block header deserialization failed";
pub const HEADER_SER_ERROR: &str = "critical: block header serialization failed";
