// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use bonding_time::{BondingTime, BondingTimeDeserializer, BondingTimeSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Deterministic header data of the block being executed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// block height
    pub height: u64,
    /// block time
    pub time: BondingTime,
}

impl BlockHeader {
    /// Creates a header
    pub const fn new(height: u64, time: BondingTime) -> Self {
        Self { height, time }
    }
}

/// Serializer for `BlockHeader`
#[derive(Default, Clone)]
pub struct BlockHeaderSerializer {
    u64_serializer: U64VarIntSerializer,
    time_serializer: BondingTimeSerializer,
}

impl BlockHeaderSerializer {
    /// Creates a `BlockHeaderSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: BondingTimeSerializer::new(),
        }
    }
}

impl Serializer<BlockHeader> for BlockHeaderSerializer {
    fn serialize(&self, value: &BlockHeader, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.height, buffer)?;
        self.time_serializer.serialize(&value.time, buffer)
    }
}

/// Deserializer for `BlockHeader`
#[derive(Clone)]
pub struct BlockHeaderDeserializer {
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: BondingTimeDeserializer,
}

impl BlockHeaderDeserializer {
    /// Creates a `BlockHeaderDeserializer`
    pub fn new() -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: BondingTimeDeserializer::new((
                Included(BondingTime::from_millis(0)),
                Included(BondingTime::max()),
            )),
        }
    }
}

impl Default for BlockHeaderDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<BlockHeader> for BlockHeaderDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BlockHeader, E> {
        context(
            "Failed BlockHeader deserialization",
            tuple((
                context("Failed height deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed time deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(height, time)| BlockHeader { height, time })
        .parse(buffer)
    }
}
