//! Binary encoding primitives shared by every stored record.
//!
//! Values are written with `Serializer` implementations into a byte buffer and read back with
//! the matching `Deserializer`, built on top of `nom` parsers.
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

use displaydoc::Display;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use std::fmt::{Display as FmtDisplay, Formatter};
use std::ops::{Bound, RangeBounds};
use thiserror::Error;
use unsigned_varint::nom as unsigned_nom;

/// Errors raised while encoding a value
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Error type accumulating the parser contexts crossed before a failure.
#[derive(Debug)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], String)>,
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, kind.description().to_string())],
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, kind.description().to_string()));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, ctx.to_string()));
        other
    }
}

impl<'a> FmtDisplay for DeserializeError<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut last_input = None;
        for (input, error) in self.errors.iter() {
            writeln!(f, "{} / Input: {:?}", error, input)?;
            last_input = Some(input.len());
        }
        if let Some(remaining) = last_input {
            write!(f, "{} byte(s) remaining", remaining)?;
        }
        Ok(())
    }
}

/// Trait that define the deserialize method that must be implemented for all types that have
/// to be deserialized.
pub trait Deserializer<T> {
    /// Deserialize a value `T` from a buffer of `u8`.
    ///
    /// ## Parameters
    /// * buffer: the buffer of `u8` to deserialize
    ///
    /// ## Returns
    /// A nom result with the rest of the serialized data and the decoded value.
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Trait that define the serialize method that must be implemented for all types that have
/// to be serialized.
pub trait Serializer<T> {
    /// Serialize a value `T` into a buffer of `u8`.
    ///
    /// ## Parameters
    /// * value: the value to be serialized
    /// * buffer: the buffer that will contain the serialized data
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

macro_rules! gen_varint {
    ($($type:ident, $s:ident, $bs:expr, $ds:ident, $d:expr);*) => {
        $(
            #[doc = " Serializer for "]
            #[doc = $d]
            #[doc = " in a varint form."]
            #[derive(Clone, Default)]
            pub struct $s;

            impl $s {
                #[doc = " Create a basic serializer for "]
                #[doc = $d]
                #[doc = " in a varint form."]
                pub const fn new() -> Self {
                    Self
                }
            }

            impl Serializer<$type> for $s {
                fn serialize(&self, value: &$type, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                    buffer.extend_from_slice(unsigned_varint::encode::$type(*value, &mut $bs));
                    Ok(())
                }
            }

            #[doc = " Deserializer for "]
            #[doc = $d]
            #[doc = " in a varint form."]
            #[derive(Clone)]
            pub struct $ds {
                range: (Bound<$type>, Bound<$type>),
            }

            impl $ds {
                #[doc = " Create a basic deserializer for "]
                #[doc = $d]
                #[doc = " in a varint form, bounded by the given range."]
                pub const fn new(min: Bound<$type>, max: Bound<$type>) -> Self {
                    Self { range: (min, max) }
                }
            }

            impl Deserializer<$type> for $ds {
                fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                    &self,
                    buffer: &'a [u8],
                ) -> IResult<&'a [u8], $type, E> {
                    context(concat!("Failed ", stringify!($type), " deserialization"), |input: &'a [u8]| {
                        let (rest, value) = unsigned_nom::$type(input).map_err(|_: nom::Err<(&[u8], ErrorKind)>| {
                            nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Fail))
                        })?;
                        if !self.range.contains(&value) {
                            return Err(nom::Err::Error(ParseError::from_error_kind(
                                input,
                                ErrorKind::Verify,
                            )));
                        }
                        Ok((rest, value))
                    })(buffer)
                }
            }
        )*
    };
}

gen_varint! {
    u32, U32VarIntSerializer, unsigned_varint::encode::u32_buffer(), U32VarIntDeserializer, "`u32`";
    u64, U64VarIntSerializer, unsigned_varint::encode::u64_buffer(), U64VarIntDeserializer, "`u64`";
    u128, U128VarIntSerializer, unsigned_varint::encode::u128_buffer(), U128VarIntDeserializer, "`u128`"
}

/// Serializer for `bool`, one byte.
#[derive(Clone, Default)]
pub struct BoolSerializer;

impl BoolSerializer {
    /// Creates a `BoolSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<bool> for BoolSerializer {
    fn serialize(&self, value: &bool, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(u8::from(*value));
        Ok(())
    }
}

/// Deserializer for `bool`, rejects any byte other than 0 and 1.
#[derive(Clone, Default)]
pub struct BoolDeserializer;

impl BoolDeserializer {
    /// Creates a `BoolDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<bool> for BoolDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], bool, E> {
        context("Failed bool deserialization", |input: &'a [u8]| {
            match input.first() {
                Some(0) => Ok((&input[1..], false)),
                Some(1) => Ok((&input[1..], true)),
                _ => Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Fail,
                ))),
            }
        })(buffer)
    }
}

/// Serializer for `Option<T>`: a presence byte followed by the value.
#[derive(Clone)]
pub struct OptionSerializer<T, ST>
where
    ST: Serializer<T>,
{
    data_serializer: ST,
    phantom_t: std::marker::PhantomData<T>,
}

impl<T, ST> OptionSerializer<T, ST>
where
    ST: Serializer<T>,
{
    /// Creates a new `OptionSerializer`
    pub fn new(data_serializer: ST) -> Self {
        Self {
            data_serializer,
            phantom_t: std::marker::PhantomData,
        }
    }
}

impl<T, ST> Serializer<Option<T>> for OptionSerializer<T, ST>
where
    ST: Serializer<T>,
{
    fn serialize(&self, value: &Option<T>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        match value {
            Some(data) => {
                buffer.push(b'1');
                self.data_serializer.serialize(data, buffer)?;
            }
            None => {
                buffer.push(b'0');
            }
        };
        Ok(())
    }
}

/// Deserializer for `Option<T>`
#[derive(Clone)]
pub struct OptionDeserializer<T, DT>
where
    DT: Deserializer<T>,
{
    data_deserializer: DT,
    phantom_t: std::marker::PhantomData<T>,
}

impl<T, DT> OptionDeserializer<T, DT>
where
    DT: Deserializer<T>,
{
    /// Creates a new `OptionDeserializer`
    pub const fn new(data_deserializer: DT) -> Self {
        Self {
            data_deserializer,
            phantom_t: std::marker::PhantomData,
        }
    }
}

impl<T, DT> Deserializer<Option<T>> for OptionDeserializer<T, DT>
where
    DT: Deserializer<T>,
{
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Option<T>, E> {
        context("Option<_> deserializer failed", |input: &'a [u8]| {
            match input.first() {
                Some(b'0') => Ok((&input[1..], None)),
                Some(b'1') => self
                    .data_deserializer
                    .deserialize(&input[1..])
                    .map(|(rest, value)| (rest, Some(value))),
                _ => Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Fail,
                ))),
            }
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paste::paste;
    use std::ops::Bound::{Excluded, Included};

    macro_rules! gen_varint_tests {
        ($($type:ident, $s:ident, $ds:ident);*) => {
            $(
                paste! {
                    #[test]
                    fn [<test_ $type _limits>]() {
                        let serializer = $s::new();
                        let deserializer = $ds::new(Included(0), Included($type::MAX));
                        for value in [0, 1, 127, 128, $type::MAX / 2, $type::MAX] {
                            let mut buffer = Vec::new();
                            serializer.serialize(&value, &mut buffer).unwrap();
                            let (rest, decoded) = deserializer
                                .deserialize::<DeserializeError>(&buffer)
                                .unwrap();
                            assert!(rest.is_empty());
                            assert_eq!(decoded, value);
                        }
                    }

                    #[test]
                    fn [<test_ $type _out_of_range>]() {
                        let serializer = $s::new();
                        let deserializer = $ds::new(Included(0), Excluded(10));
                        let mut buffer = Vec::new();
                        serializer.serialize(&10, &mut buffer).unwrap();
                        assert!(deserializer
                            .deserialize::<DeserializeError>(&buffer)
                            .is_err());
                    }
                }
            )*
        };
    }

    gen_varint_tests! {
        u32, U32VarIntSerializer, U32VarIntDeserializer;
        u64, U64VarIntSerializer, U64VarIntDeserializer;
        u128, U128VarIntSerializer, U128VarIntDeserializer
    }

    #[test]
    fn test_truncated_varint_fails() {
        let deserializer = U64VarIntDeserializer::new(Included(0), Included(u64::MAX));
        // continuation bit set on the last byte
        let buffer = [0x80u8, 0x80];
        assert!(deserializer
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn test_option_and_bool() {
        let serializer = OptionSerializer::new(BoolSerializer::new());
        let deserializer = OptionDeserializer::new(BoolDeserializer::new());
        let mut buffer = Vec::new();
        serializer.serialize(&Some(true), &mut buffer).unwrap();
        serializer.serialize(&None, &mut buffer).unwrap();
        let (rest, first) = deserializer
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        let (rest, second) = deserializer.deserialize::<DeserializeError>(rest).unwrap();
        assert!(rest.is_empty());
        assert_eq!(first, Some(true));
        assert_eq!(second, None);
        assert!(BoolDeserializer::new()
            .deserialize::<DeserializeError>(&[2u8])
            .is_err());
    }
}
