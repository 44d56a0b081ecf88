// Copyright (c) 2022 MASSA LABS <info@massa.net>

/// Number of fractional decimal digits of a `Dec`
pub const DEC_PRECISION: u32 = 18;

/// Raw value of `Dec::one()`
pub const DEC_DECIMAL_FACTOR: u128 = 1_000_000_000_000_000_000;

/// Module account holding the tokens of bonded validators
pub const BONDED_POOL_NAME: &str = "bonded_tokens_pool";

/// Module account holding unbonded and unbonding tokens
pub const NOT_BONDED_POOL_NAME: &str = "not_bonded_tokens_pool";
