// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_serialization::{
    BoolDeserializer, BoolSerializer, Deserializer, SerializeError, Serializer,
    U64VarIntDeserializer, U64VarIntSerializer,
};
use bonding_time::{BondingTime, BondingTimeDeserializer, BondingTimeSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Slashing record of a consensus address, created when its validator is first bonded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningInfo {
    /// height at which the validator was first bonded
    pub start_height: u64,
    /// the validator cannot be unjailed before this time
    pub jailed_until: BondingTime,
    /// set after a double sign, never cleared
    pub tombstoned: bool,
}

impl SigningInfo {
    /// Signing info of a validator bonded at `start_height`
    pub fn new(start_height: u64) -> Self {
        Self {
            start_height,
            jailed_until: BondingTime::from_millis(0),
            tombstoned: false,
        }
    }
}

/// Serializer for `SigningInfo`
#[derive(Default, Clone)]
pub struct SigningInfoSerializer {
    u64_serializer: U64VarIntSerializer,
    time_serializer: BondingTimeSerializer,
    bool_serializer: BoolSerializer,
}

impl SigningInfoSerializer {
    /// Creates a `SigningInfoSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: BondingTimeSerializer::new(),
            bool_serializer: BoolSerializer::new(),
        }
    }
}

impl Serializer<SigningInfo> for SigningInfoSerializer {
    fn serialize(&self, value: &SigningInfo, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.start_height, buffer)?;
        self.time_serializer.serialize(&value.jailed_until, buffer)?;
        self.bool_serializer.serialize(&value.tombstoned, buffer)
    }
}

/// Deserializer for `SigningInfo`
#[derive(Clone)]
pub struct SigningInfoDeserializer {
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: BondingTimeDeserializer,
    bool_deserializer: BoolDeserializer,
}

impl SigningInfoDeserializer {
    /// Creates a `SigningInfoDeserializer`
    pub fn new() -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: BondingTimeDeserializer::new((
                Included(BondingTime::from_millis(0)),
                Included(BondingTime::max()),
            )),
            bool_deserializer: BoolDeserializer::new(),
        }
    }
}

impl Default for SigningInfoDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<SigningInfo> for SigningInfoDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], SigningInfo, E> {
        context(
            "Failed SigningInfo deserialization",
            tuple((
                context("Failed start_height deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed jailed_until deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
                context("Failed tombstoned deserialization", |input| {
                    self.bool_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(start_height, jailed_until, tombstoned)| SigningInfo {
            start_height,
            jailed_until,
            tombstoned,
        })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonding_serialization::DeserializeError;

    #[test]
    fn test_signing_info_serde() {
        let info = SigningInfo {
            start_height: 300,
            jailed_until: crate::DOUBLE_SIGN_JAIL_END_TIME,
            tombstoned: true,
        };
        let mut buffer = Vec::new();
        SigningInfoSerializer::new()
            .serialize(&info, &mut buffer)
            .unwrap();
        let (rest, decoded) = SigningInfoDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, info);
        assert!(SigningInfoDeserializer::new()
            .deserialize::<DeserializeError>(&buffer[..buffer.len() - 1])
            .is_err());
    }
}
