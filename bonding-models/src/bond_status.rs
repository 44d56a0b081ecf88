// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Bonding status of a validator
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u32)]
pub enum BondStatus {
    /// not in the active set, tokens in the not-bonded pool
    Unbonded = 1,
    /// left the active set, waiting for the unbonding time to elapse
    Unbonding = 2,
    /// in the active set, tokens in the bonded pool
    Bonded = 3,
}

impl BondStatus {
    /// true for `Bonded`
    pub fn is_bonded(&self) -> bool {
        matches!(self, BondStatus::Bonded)
    }

    /// true for `Unbonded`
    pub fn is_unbonded(&self) -> bool {
        matches!(self, BondStatus::Unbonded)
    }
}

impl std::fmt::Display for BondStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BondStatus::Unbonded => write!(f, "unbonded"),
            BondStatus::Unbonding => write!(f, "unbonding"),
            BondStatus::Bonded => write!(f, "bonded"),
        }
    }
}

/// Serializer for `BondStatus`
#[derive(Default, Clone)]
pub struct BondStatusSerializer {
    u32_serializer: U32VarIntSerializer,
}

impl BondStatusSerializer {
    /// Creates a `BondStatusSerializer`
    pub const fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
        }
    }
}

impl Serializer<BondStatus> for BondStatusSerializer {
    fn serialize(&self, value: &BondStatus, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u32_serializer.serialize(&u32::from(*value), buffer)
    }
}

/// Deserializer for `BondStatus`
#[derive(Clone)]
pub struct BondStatusDeserializer {
    u32_deserializer: U32VarIntDeserializer,
}

impl BondStatusDeserializer {
    /// Creates a `BondStatusDeserializer`
    pub const fn new() -> Self {
        Self {
            u32_deserializer: U32VarIntDeserializer::new(Included(1), Included(3)),
        }
    }
}

impl Default for BondStatusDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<BondStatus> for BondStatusDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BondStatus, E> {
        context("Failed BondStatus deserialization", |input: &'a [u8]| {
            let (rest, raw) = self.u32_deserializer.deserialize(input)?;
            let status = BondStatus::try_from(raw).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Verify,
                ))
            })?;
            Ok((rest, status))
        })(buffer)
    }
}
