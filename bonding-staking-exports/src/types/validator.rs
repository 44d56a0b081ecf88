// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::{StakingError, StakingResult};
use bonding_models::{
    Amount, AmountDeserializer, AmountSerializer, BondStatus, BondStatusDeserializer,
    BondStatusSerializer, ConsensusAddress, Dec, DecDeserializer, DecSerializer,
    ValidatorAddress, ValidatorAddressDeserializer, ValidatorAddressSerializer,
};
use bonding_serialization::{
    BoolDeserializer, BoolSerializer, Deserializer, SerializeError, Serializer,
    U64VarIntDeserializer, U64VarIntSerializer,
};
use bonding_signature::{PublicKey, PublicKeyDeserializer, PublicKeySerializer};
use bonding_time::{BondingTime, BondingTimeDeserializer, BondingTimeSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// A validator and the pool of tokens delegated to it.
///
/// `tokens / delegator_shares` is the exchange rate between delegator shares and tokens.
/// Slashing lowers `tokens` without touching the shares, so every delegator loses the same
/// proportion of its stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// operator address
    pub operator_address: ValidatorAddress,
    /// consensus public key
    pub consensus_pubkey: PublicKey,
    /// jailed validators are kept out of the active set
    pub jailed: bool,
    /// bonding status
    pub status: BondStatus,
    /// tokens held by the validator, self bond included
    pub tokens: Amount,
    /// total shares issued to delegators
    pub delegator_shares: Dec,
    /// below this self delegation the validator gets jailed
    pub min_self_delegation: Amount,
    /// height at which the validator started unbonding
    pub unbonding_height: u64,
    /// time at which the unbonding completes
    pub unbonding_time: BondingTime,
}

impl Validator {
    /// Fresh unbonded validator without tokens
    pub fn new(
        operator_address: ValidatorAddress,
        consensus_pubkey: PublicKey,
        min_self_delegation: Amount,
    ) -> Self {
        Self {
            operator_address,
            consensus_pubkey,
            jailed: false,
            status: BondStatus::Unbonded,
            tokens: Amount::zero(),
            delegator_shares: Dec::zero(),
            min_self_delegation,
            unbonding_height: 0,
            unbonding_time: BondingTime::from_millis(0),
        }
    }

    /// Consensus address derived from the consensus public key
    pub fn consensus_address(&self) -> ConsensusAddress {
        ConsensusAddress::from_public_key(&self.consensus_pubkey)
    }

    /// true when the validator is in the active set
    pub fn is_bonded(&self) -> bool {
        self.status.is_bonded()
    }

    /// true when the validator is fully unbonded
    pub fn is_unbonded(&self) -> bool {
        self.status.is_unbonded()
    }

    /// true while the unbonding period runs
    pub fn is_unbonding(&self) -> bool {
        self.status == BondStatus::Unbonding
    }

    /// Tokens without shares: delegation is blocked until the validator is emptied
    pub fn invalid_ex_rate(&self) -> bool {
        self.tokens.is_zero() && !self.delegator_shares.is_zero()
    }

    /// Power the validator would have if bonded
    pub fn potential_consensus_power(&self, power_reduction: Amount) -> u64 {
        self.tokens.to_raw() / power_reduction.to_raw().max(1)
    }

    /// Power of the validator in consensus, zero unless bonded
    pub fn consensus_power(&self, power_reduction: Amount) -> u64 {
        if self.is_bonded() {
            self.potential_consensus_power(power_reduction)
        } else {
            0
        }
    }

    /// Tokens backing `shares`, truncated to whole units
    pub fn tokens_from_shares_truncated(&self, shares: Dec) -> StakingResult<Amount> {
        shares
            .mul_amount_quo_floor(self.tokens, self.delegator_shares)
            .ok_or_else(|| {
                StakingError::Invariant(format!(
                    "cannot convert shares {} of validator {} with {} shares",
                    shares, self.operator_address, self.delegator_shares
                ))
            })
    }

    /// Shares worth `amount`, rounded half-up at the last decimal digit
    pub fn shares_from_tokens(&self, amount: Amount) -> StakingResult<Dec> {
        if self.tokens.is_zero() {
            return Err(StakingError::InsufficientShares);
        }
        self.delegator_shares
            .mul_ratio_round(amount, self.tokens)
            .ok_or(StakingError::InsufficientShares)
    }

    /// Shares worth `amount`, truncated at the last decimal digit
    pub fn shares_from_tokens_truncated(&self, amount: Amount) -> StakingResult<Dec> {
        if self.tokens.is_zero() {
            return Err(StakingError::InsufficientShares);
        }
        self.delegator_shares
            .mul_ratio_floor(amount, self.tokens)
            .ok_or(StakingError::InsufficientShares)
    }

    /// Adds tokens and issues the matching shares, returns the issued shares.
    ///
    /// The first delegation issues shares one to one.
    pub fn add_tokens_from_del(&mut self, amount: Amount) -> StakingResult<Dec> {
        let issued_shares = if self.delegator_shares.is_zero() {
            Dec::from_amount(amount)
        } else {
            self.delegator_shares
                .mul_ratio_floor(amount, self.tokens)
                .ok_or_else(|| {
                    StakingError::Invariant(format!(
                        "cannot issue shares on validator {} with zero tokens",
                        self.operator_address
                    ))
                })?
        };
        self.tokens = self.tokens.checked_add(amount).ok_or_else(|| {
            StakingError::Invariant(format!(
                "token overflow on validator {}",
                self.operator_address
            ))
        })?;
        self.delegator_shares = self
            .delegator_shares
            .checked_add(issued_shares)
            .ok_or_else(|| {
                StakingError::Invariant(format!(
                    "share overflow on validator {}",
                    self.operator_address
                ))
            })?;
        Ok(issued_shares)
    }

    /// Burns `shares` and returns the tokens they were worth.
    ///
    /// When the last shares go, every remaining token goes with them.
    pub fn remove_del_shares(&mut self, shares: Dec) -> StakingResult<Amount> {
        let remaining_shares = self.delegator_shares.checked_sub(shares).ok_or_else(|| {
            StakingError::Invariant(format!(
                "removing {} shares from validator {} holding only {}",
                shares, self.operator_address, self.delegator_shares
            ))
        })?;
        let removed_tokens = if remaining_shares.is_zero() {
            self.tokens
        } else {
            self.tokens_from_shares_truncated(shares)?
        };
        self.tokens = self.tokens.checked_sub(removed_tokens).ok_or_else(|| {
            StakingError::Invariant(format!(
                "removing {} tokens from validator {} holding only {}",
                removed_tokens, self.operator_address, self.tokens
            ))
        })?;
        self.delegator_shares = remaining_shares;
        Ok(removed_tokens)
    }

    /// Removes tokens without touching the shares, used when slashing
    pub fn remove_tokens(&mut self, tokens: Amount) -> StakingResult<()> {
        self.tokens = self.tokens.checked_sub(tokens).ok_or_else(|| {
            StakingError::Invariant(format!(
                "removing {} tokens from validator {} holding only {}",
                tokens, self.operator_address, self.tokens
            ))
        })?;
        Ok(())
    }
}

/// Serializer for `Validator`
#[derive(Default, Clone)]
pub struct ValidatorSerializer {
    address_serializer: ValidatorAddressSerializer,
    pubkey_serializer: PublicKeySerializer,
    bool_serializer: BoolSerializer,
    status_serializer: BondStatusSerializer,
    amount_serializer: AmountSerializer,
    dec_serializer: DecSerializer,
    u64_serializer: U64VarIntSerializer,
    time_serializer: BondingTimeSerializer,
}

impl ValidatorSerializer {
    /// Creates a `ValidatorSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: ValidatorAddressSerializer::new(),
            pubkey_serializer: PublicKeySerializer::new(),
            bool_serializer: BoolSerializer::new(),
            status_serializer: BondStatusSerializer::new(),
            amount_serializer: AmountSerializer::new(),
            dec_serializer: DecSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: BondingTimeSerializer::new(),
        }
    }
}

impl Serializer<Validator> for ValidatorSerializer {
    fn serialize(&self, value: &Validator, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer
            .serialize(&value.operator_address, buffer)?;
        self.pubkey_serializer
            .serialize(&value.consensus_pubkey, buffer)?;
        self.bool_serializer.serialize(&value.jailed, buffer)?;
        self.status_serializer.serialize(&value.status, buffer)?;
        self.amount_serializer.serialize(&value.tokens, buffer)?;
        self.dec_serializer
            .serialize(&value.delegator_shares, buffer)?;
        self.amount_serializer
            .serialize(&value.min_self_delegation, buffer)?;
        self.u64_serializer
            .serialize(&value.unbonding_height, buffer)?;
        self.time_serializer.serialize(&value.unbonding_time, buffer)
    }
}

/// Deserializer for `Validator`
#[derive(Clone)]
pub struct ValidatorDeserializer {
    address_deserializer: ValidatorAddressDeserializer,
    pubkey_deserializer: PublicKeyDeserializer,
    bool_deserializer: BoolDeserializer,
    status_deserializer: BondStatusDeserializer,
    amount_deserializer: AmountDeserializer,
    dec_deserializer: DecDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: BondingTimeDeserializer,
}

impl ValidatorDeserializer {
    /// Creates a `ValidatorDeserializer`
    pub fn new() -> Self {
        Self {
            address_deserializer: ValidatorAddressDeserializer::new(),
            pubkey_deserializer: PublicKeyDeserializer::new(),
            bool_deserializer: BoolDeserializer::new(),
            status_deserializer: BondStatusDeserializer::new(),
            amount_deserializer: AmountDeserializer::default(),
            dec_deserializer: DecDeserializer::new(),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: BondingTimeDeserializer::new((
                Included(BondingTime::from_millis(0)),
                Included(BondingTime::max()),
            )),
        }
    }
}

impl Default for ValidatorDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Validator> for ValidatorDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Validator, E> {
        context(
            "Failed Validator deserialization",
            tuple((
                context("Failed operator_address deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed consensus_pubkey deserialization", |input| {
                    self.pubkey_deserializer.deserialize(input)
                }),
                context("Failed jailed deserialization", |input| {
                    self.bool_deserializer.deserialize(input)
                }),
                context("Failed status deserialization", |input| {
                    self.status_deserializer.deserialize(input)
                }),
                context("Failed tokens deserialization", |input| {
                    self.amount_deserializer.deserialize(input)
                }),
                context("Failed delegator_shares deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
                context("Failed min_self_delegation deserialization", |input| {
                    self.amount_deserializer.deserialize(input)
                }),
                context("Failed unbonding_height deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed unbonding_time deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(
                operator_address,
                consensus_pubkey,
                jailed,
                status,
                tokens,
                delegator_shares,
                min_self_delegation,
                unbonding_height,
                unbonding_time,
            )| Validator {
                operator_address,
                consensus_pubkey,
                jailed,
                status,
                tokens,
                delegator_shares,
                min_self_delegation,
                unbonding_height,
                unbonding_time,
            },
        )
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use bonding_models::Address;
    use bonding_serialization::DeserializeError;
    use bonding_signature::KeyPair;
    use std::str::FromStr;

    fn validator() -> Validator {
        let keypair = KeyPair::generate();
        let operator = ValidatorAddress::from(Address::from_public_key(&keypair.get_public_key()));
        Validator::new(operator, keypair.get_public_key(), Amount::from_raw(1))
    }

    #[test]
    fn test_first_delegation_is_one_to_one() {
        let mut validator = validator();
        let shares = validator
            .add_tokens_from_del(Amount::from_raw(1_000_000))
            .unwrap();
        assert_eq!(shares, Dec::from_amount(Amount::from_raw(1_000_000)));
        assert_eq!(validator.tokens, Amount::from_raw(1_000_000));
    }

    #[test]
    fn test_shares_after_slash_are_floored() {
        let mut validator = validator();
        validator.add_tokens_from_del(Amount::from_raw(3)).unwrap();
        // exchange rate 3 shares for 2 tokens
        validator.remove_tokens(Amount::from_raw(1)).unwrap();
        let shares = validator.add_tokens_from_del(Amount::from_raw(1)).unwrap();
        assert_eq!(shares, Dec::from_str("1.5").unwrap());
        let shares = validator.add_tokens_from_del(Amount::from_raw(1)).unwrap();
        // 1 * 4.5 / 3
        assert_eq!(shares, Dec::from_str("1.5").unwrap());
    }

    #[test]
    fn test_removing_last_shares_takes_all_tokens() {
        let mut validator = validator();
        validator.add_tokens_from_del(Amount::from_raw(10)).unwrap();
        validator.remove_tokens(Amount::from_raw(3)).unwrap();
        let half = Dec::from_amount(Amount::from_raw(5));
        assert_eq!(
            validator.remove_del_shares(half).unwrap(),
            Amount::from_raw(3)
        );
        assert_eq!(
            validator.remove_del_shares(half).unwrap(),
            Amount::from_raw(4)
        );
        assert!(validator.tokens.is_zero());
        assert!(validator.delegator_shares.is_zero());
        assert_matches!(
            validator.remove_del_shares(Dec::one()),
            Err(StakingError::Invariant(_))
        );
    }

    #[test]
    fn test_share_conversions_without_tokens() {
        let validator = validator();
        assert_matches!(
            validator.shares_from_tokens(Amount::from_raw(1)),
            Err(StakingError::InsufficientShares)
        );
        assert_matches!(
            validator.shares_from_tokens_truncated(Amount::from_raw(1)),
            Err(StakingError::InsufficientShares)
        );
    }

    #[test]
    fn test_validator_ser_deser() {
        let mut validator = validator();
        validator.add_tokens_from_del(Amount::from_raw(42)).unwrap();
        validator.status = BondStatus::Unbonding;
        validator.unbonding_height = 7;
        validator.unbonding_time = BondingTime::from_millis(1_000);
        let mut buffer = Vec::new();
        ValidatorSerializer::new()
            .serialize(&validator, &mut buffer)
            .unwrap();
        let (rest, deserialized) = ValidatorDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(deserialized, validator);
    }
}
