// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_models::{
    Address, AddressDeserializer, AddressSerializer, Amount, AmountDeserializer,
    AmountSerializer, Dec, DecDeserializer, DecSerializer, ValidatorAddress,
    ValidatorAddressDeserializer, ValidatorAddressSerializer,
};
use bonding_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use bonding_time::{BondingTime, BondingTimeDeserializer, BondingTimeSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Shares owned by a delegator in a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// delegator account
    pub delegator_address: Address,
    /// validator operator
    pub validator_address: ValidatorAddress,
    /// shares owned, never zero in the store
    pub shares: Dec,
}

impl Delegation {
    /// Creates a delegation
    pub fn new(
        delegator_address: Address,
        validator_address: ValidatorAddress,
        shares: Dec,
    ) -> Self {
        Self {
            delegator_address,
            validator_address,
            shares,
        }
    }
}

/// One undelegation waiting for its completion time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegationEntry {
    /// height of the block that created the entry
    pub creation_height: u64,
    /// time at which the balance is paid out
    pub completion_time: BondingTime,
    /// tokens at creation, the base of slashing
    pub initial_balance: Amount,
    /// tokens still to be paid out
    pub balance: Amount,
}

impl UnbondingDelegationEntry {
    /// true once `time` has reached the completion time
    pub fn is_mature(&self, time: BondingTime) -> bool {
        self.completion_time <= time
    }
}

/// Pending undelegations of a delegator from one validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    /// delegator account
    pub delegator_address: Address,
    /// validator operator
    pub validator_address: ValidatorAddress,
    /// entries in creation order
    pub entries: Vec<UnbondingDelegationEntry>,
}

impl UnbondingDelegation {
    /// Empty record for the pair
    pub fn new(delegator_address: Address, validator_address: ValidatorAddress) -> Self {
        Self {
            delegator_address,
            validator_address,
            entries: Vec::new(),
        }
    }

    /// Appends an entry, creation heights only grow so the order is kept
    pub fn add_entry(
        &mut self,
        creation_height: u64,
        completion_time: BondingTime,
        balance: Amount,
    ) {
        self.entries.push(UnbondingDelegationEntry {
            creation_height,
            completion_time,
            initial_balance: balance,
            balance,
        });
    }

    /// true when `max_entries` entries are already pending
    pub fn is_full(&self, max_entries: u32) -> bool {
        self.entries.len() >= max_entries as usize
    }
}

/// (delegator, validator) pair stored in the unbonding queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DVPair {
    /// delegator account
    pub delegator_address: Address,
    /// validator operator
    pub validator_address: ValidatorAddress,
}

/// Serializer for `Delegation`
#[derive(Default, Clone)]
pub struct DelegationSerializer {
    address_serializer: AddressSerializer,
    validator_address_serializer: ValidatorAddressSerializer,
    dec_serializer: DecSerializer,
}

impl DelegationSerializer {
    /// Creates a `DelegationSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            validator_address_serializer: ValidatorAddressSerializer::new(),
            dec_serializer: DecSerializer::new(),
        }
    }
}

impl Serializer<Delegation> for DelegationSerializer {
    fn serialize(&self, value: &Delegation, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer
            .serialize(&value.delegator_address, buffer)?;
        self.validator_address_serializer
            .serialize(&value.validator_address, buffer)?;
        self.dec_serializer.serialize(&value.shares, buffer)
    }
}

/// Deserializer for `Delegation`
#[derive(Default, Clone)]
pub struct DelegationDeserializer {
    address_deserializer: AddressDeserializer,
    validator_address_deserializer: ValidatorAddressDeserializer,
    dec_deserializer: DecDeserializer,
}

impl DelegationDeserializer {
    /// Creates a `DelegationDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            validator_address_deserializer: ValidatorAddressDeserializer::new(),
            dec_deserializer: DecDeserializer::new(),
        }
    }
}

impl Deserializer<Delegation> for DelegationDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Delegation, E> {
        context(
            "Failed Delegation deserialization",
            tuple((
                |input| self.address_deserializer.deserialize(input),
                |input| self.validator_address_deserializer.deserialize(input),
                |input| self.dec_deserializer.deserialize(input),
            )),
        )
        .map(|(delegator_address, validator_address, shares)| Delegation {
            delegator_address,
            validator_address,
            shares,
        })
        .parse(buffer)
    }
}

/// Serializer for `UnbondingDelegation`
#[derive(Default, Clone)]
pub struct UnbondingDelegationSerializer {
    address_serializer: AddressSerializer,
    validator_address_serializer: ValidatorAddressSerializer,
    u64_serializer: U64VarIntSerializer,
    time_serializer: BondingTimeSerializer,
    amount_serializer: AmountSerializer,
}

impl UnbondingDelegationSerializer {
    /// Creates an `UnbondingDelegationSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            validator_address_serializer: ValidatorAddressSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: BondingTimeSerializer::new(),
            amount_serializer: AmountSerializer::new(),
        }
    }
}

impl Serializer<UnbondingDelegation> for UnbondingDelegationSerializer {
    fn serialize(
        &self,
        value: &UnbondingDelegation,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.address_serializer
            .serialize(&value.delegator_address, buffer)?;
        self.validator_address_serializer
            .serialize(&value.validator_address, buffer)?;
        let entries_count: u64 = value.entries.len().try_into().map_err(|err| {
            SerializeError::GeneralError(format!("too many unbonding entries: {}", err))
        })?;
        self.u64_serializer.serialize(&entries_count, buffer)?;
        for entry in &value.entries {
            self.u64_serializer
                .serialize(&entry.creation_height, buffer)?;
            self.time_serializer
                .serialize(&entry.completion_time, buffer)?;
            self.amount_serializer
                .serialize(&entry.initial_balance, buffer)?;
            self.amount_serializer.serialize(&entry.balance, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `UnbondingDelegation`
#[derive(Clone)]
pub struct UnbondingDelegationDeserializer {
    address_deserializer: AddressDeserializer,
    validator_address_deserializer: ValidatorAddressDeserializer,
    length_deserializer: U64VarIntDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: BondingTimeDeserializer,
    amount_deserializer: AmountDeserializer,
}

impl UnbondingDelegationDeserializer {
    /// Creates an `UnbondingDelegationDeserializer`
    ///
    /// Arguments:
    /// * `max_entries`: maximum number of entries accepted in a record
    pub fn new(max_entries: u32) -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            validator_address_deserializer: ValidatorAddressDeserializer::new(),
            length_deserializer: U64VarIntDeserializer::new(
                Included(0),
                Included(max_entries as u64),
            ),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: BondingTimeDeserializer::new((
                Included(BondingTime::from_millis(0)),
                Included(BondingTime::max()),
            )),
            amount_deserializer: AmountDeserializer::default(),
        }
    }
}

impl Deserializer<UnbondingDelegation> for UnbondingDelegationDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], UnbondingDelegation, E> {
        context(
            "Failed UnbondingDelegation deserialization",
            tuple((
                |input| self.address_deserializer.deserialize(input),
                |input| self.validator_address_deserializer.deserialize(input),
                length_count(
                    context("Failed length deserialization", |input| {
                        self.length_deserializer.deserialize(input)
                    }),
                    context(
                        "Failed UnbondingDelegationEntry deserialization",
                        tuple((
                            |input| self.u64_deserializer.deserialize(input),
                            |input| self.time_deserializer.deserialize(input),
                            |input| self.amount_deserializer.deserialize(input),
                            |input| self.amount_deserializer.deserialize(input),
                        )),
                    ),
                ),
            )),
        )
        .map(|(delegator_address, validator_address, entries)| UnbondingDelegation {
            delegator_address,
            validator_address,
            entries: entries
                .into_iter()
                .map(
                    |(creation_height, completion_time, initial_balance, balance)| {
                        UnbondingDelegationEntry {
                            creation_height,
                            completion_time,
                            initial_balance,
                            balance,
                        }
                    },
                )
                .collect(),
        })
        .parse(buffer)
    }
}

/// Serializer for a bucket of the unbonding queue
#[derive(Default, Clone)]
pub struct DVPairsSerializer {
    u64_serializer: U64VarIntSerializer,
    address_serializer: AddressSerializer,
    validator_address_serializer: ValidatorAddressSerializer,
}

impl DVPairsSerializer {
    /// Creates a `DVPairsSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
            address_serializer: AddressSerializer::new(),
            validator_address_serializer: ValidatorAddressSerializer::new(),
        }
    }
}

impl Serializer<Vec<DVPair>> for DVPairsSerializer {
    fn serialize(&self, value: &Vec<DVPair>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let pairs_count: u64 = value.len().try_into().map_err(|err| {
            SerializeError::GeneralError(format!("too many queued pairs: {}", err))
        })?;
        self.u64_serializer.serialize(&pairs_count, buffer)?;
        for pair in value {
            self.address_serializer
                .serialize(&pair.delegator_address, buffer)?;
            self.validator_address_serializer
                .serialize(&pair.validator_address, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for a bucket of the unbonding queue
#[derive(Clone)]
pub struct DVPairsDeserializer {
    u64_deserializer: U64VarIntDeserializer,
    address_deserializer: AddressDeserializer,
    validator_address_deserializer: ValidatorAddressDeserializer,
}

impl DVPairsDeserializer {
    /// Creates a `DVPairsDeserializer`
    pub const fn new() -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            address_deserializer: AddressDeserializer::new(),
            validator_address_deserializer: ValidatorAddressDeserializer::new(),
        }
    }
}

impl Default for DVPairsDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Vec<DVPair>> for DVPairsDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<DVPair>, E> {
        context(
            "Failed DVPairs deserialization",
            length_count(
                context("Failed length deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                tuple((
                    |input| self.address_deserializer.deserialize(input),
                    |input| self.validator_address_deserializer.deserialize(input),
                )),
            ),
        )
        .map(|pairs| {
            pairs
                .into_iter()
                .map(|(delegator_address, validator_address)| DVPair {
                    delegator_address,
                    validator_address,
                })
                .collect()
        })
        .parse(buffer)
    }
}

/// Serializer for a bucket of the validator queue
#[derive(Default, Clone)]
pub struct ValidatorAddressesSerializer {
    u64_serializer: U64VarIntSerializer,
    validator_address_serializer: ValidatorAddressSerializer,
}

impl ValidatorAddressesSerializer {
    /// Creates a `ValidatorAddressesSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
            validator_address_serializer: ValidatorAddressSerializer::new(),
        }
    }
}

impl Serializer<Vec<ValidatorAddress>> for ValidatorAddressesSerializer {
    fn serialize(
        &self,
        value: &Vec<ValidatorAddress>,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        let count: u64 = value.len().try_into().map_err(|err| {
            SerializeError::GeneralError(format!("too many queued validators: {}", err))
        })?;
        self.u64_serializer.serialize(&count, buffer)?;
        for address in value {
            self.validator_address_serializer.serialize(address, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for a bucket of the validator queue
#[derive(Clone)]
pub struct ValidatorAddressesDeserializer {
    u64_deserializer: U64VarIntDeserializer,
    validator_address_deserializer: ValidatorAddressDeserializer,
}

impl ValidatorAddressesDeserializer {
    /// Creates a `ValidatorAddressesDeserializer`
    pub const fn new() -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            validator_address_deserializer: ValidatorAddressDeserializer::new(),
        }
    }
}

impl Default for ValidatorAddressesDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Vec<ValidatorAddress>> for ValidatorAddressesDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<ValidatorAddress>, E> {
        context(
            "Failed ValidatorAddresses deserialization",
            length_count(
                context("Failed length deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                |input| self.validator_address_deserializer.deserialize(input),
            ),
        )
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonding_serialization::DeserializeError;

    fn pair() -> (Address, ValidatorAddress) {
        (
            Address::from_module_name("delegator"),
            ValidatorAddress::from(Address::from_module_name("validator")),
        )
    }

    #[test]
    fn test_unbonding_delegation_entries_limit() {
        let (delegator, validator) = pair();
        let mut ubd = UnbondingDelegation::new(delegator, validator);
        for height in 0..3 {
            ubd.add_entry(
                height,
                BondingTime::from_millis(1000 + height),
                Amount::from_raw(10),
            );
        }
        assert!(ubd.is_full(3));
        assert!(!ubd.is_full(4));

        let mut buffer = Vec::new();
        UnbondingDelegationSerializer::new()
            .serialize(&ubd, &mut buffer)
            .unwrap();
        let (rest, deserialized) = UnbondingDelegationDeserializer::new(3)
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(deserialized, ubd);
        // a record longer than allowed is rejected
        assert!(UnbondingDelegationDeserializer::new(2)
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn test_entry_maturity_is_inclusive() {
        let entry = UnbondingDelegationEntry {
            creation_height: 1,
            completion_time: BondingTime::from_millis(100),
            initial_balance: Amount::from_raw(5),
            balance: Amount::from_raw(5),
        };
        assert!(!entry.is_mature(BondingTime::from_millis(99)));
        assert!(entry.is_mature(BondingTime::from_millis(100)));
    }

    #[test]
    fn test_queue_bucket_keeps_insertion_order() {
        let (delegator, validator) = pair();
        let other = Address::from_module_name("other");
        let bucket = vec![
            DVPair {
                delegator_address: other,
                validator_address: validator,
            },
            DVPair {
                delegator_address: delegator,
                validator_address: validator,
            },
        ];
        let mut buffer = Vec::new();
        DVPairsSerializer::new()
            .serialize(&bucket, &mut buffer)
            .unwrap();
        let (_, deserialized) = DVPairsDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert_eq!(deserialized, bucket);
    }
}
