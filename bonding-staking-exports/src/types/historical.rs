// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::types::validator::{Validator, ValidatorDeserializer, ValidatorSerializer};
use bonding_models::{BlockHeader, BlockHeaderDeserializer, BlockHeaderSerializer};
use bonding_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Header and active set of a past block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalInfo {
    /// header of the block
    pub header: BlockHeader,
    /// bonded validators, by decreasing power
    pub validators: Vec<Validator>,
}

/// Serializer for `HistoricalInfo`
#[derive(Default, Clone)]
pub struct HistoricalInfoSerializer {
    header_serializer: BlockHeaderSerializer,
    u64_serializer: U64VarIntSerializer,
    validator_serializer: ValidatorSerializer,
}

impl HistoricalInfoSerializer {
    /// Creates a `HistoricalInfoSerializer`
    pub const fn new() -> Self {
        Self {
            header_serializer: BlockHeaderSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            validator_serializer: ValidatorSerializer::new(),
        }
    }
}

impl Serializer<HistoricalInfo> for HistoricalInfoSerializer {
    fn serialize(
        &self,
        value: &HistoricalInfo,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.header_serializer.serialize(&value.header, buffer)?;
        let count: u64 = value.validators.len().try_into().map_err(|err| {
            SerializeError::GeneralError(format!("too many validators: {}", err))
        })?;
        self.u64_serializer.serialize(&count, buffer)?;
        for validator in &value.validators {
            self.validator_serializer.serialize(validator, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `HistoricalInfo`
#[derive(Clone)]
pub struct HistoricalInfoDeserializer {
    header_deserializer: BlockHeaderDeserializer,
    length_deserializer: U64VarIntDeserializer,
    validator_deserializer: ValidatorDeserializer,
}

impl HistoricalInfoDeserializer {
    /// Creates a `HistoricalInfoDeserializer`
    ///
    /// Arguments:
    /// * `max_validators`: size of the active set
    pub fn new(max_validators: u32) -> Self {
        Self {
            header_deserializer: BlockHeaderDeserializer::new(),
            length_deserializer: U64VarIntDeserializer::new(
                Included(0),
                Included(max_validators as u64),
            ),
            validator_deserializer: ValidatorDeserializer::new(),
        }
    }
}

impl Deserializer<HistoricalInfo> for HistoricalInfoDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], HistoricalInfo, E> {
        context(
            "Failed HistoricalInfo deserialization",
            tuple((
                |input| self.header_deserializer.deserialize(input),
                length_count(
                    context("Failed length deserialization", |input| {
                        self.length_deserializer.deserialize(input)
                    }),
                    |input| self.validator_deserializer.deserialize(input),
                ),
            )),
        )
        .map(|(header, validators)| HistoricalInfo { header, validators })
        .parse(buffer)
    }
}
