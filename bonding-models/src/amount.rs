// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::ModelsError;
use bonding_serialization::{Deserializer, SerializeError, Serializer};
use bonding_serialization::{U64VarIntDeserializer, U64VarIntSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serde::de::Unexpected;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

/// An amount of the bond denomination, in indivisible base units.
/// All operations are checked or saturating: there is never an uncontrolled overflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Default, Hash)]
pub struct Amount(u64);

impl Amount {
    /// Create a zero Amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Obtains the underlying `u64` number of base units
    pub const fn to_raw(&self) -> u64 {
        self.0
    }

    /// Constructs an `Amount` from a number of base units
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Largest representable amount
    pub const fn max() -> Self {
        Self(u64::MAX)
    }

    /// safely add self to another amount, saturating the result on overflow
    #[must_use]
    pub fn saturating_add(self, amount: Amount) -> Self {
        Amount(self.0.saturating_add(amount.0))
    }

    /// safely subtract another amount from self, saturating the result on underflow
    #[must_use]
    pub fn saturating_sub(self, amount: Amount) -> Self {
        Amount(self.0.saturating_sub(amount.0))
    }

    /// returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// safely subtract another amount from self, returning None on underflow
    /// ```
    /// # use bonding_models::Amount;
    /// let res = Amount::from_raw(42).checked_sub(Amount::from_raw(7)).unwrap();
    /// assert_eq!(res, Amount::from_raw(35));
    /// assert!(Amount::from_raw(7).checked_sub(Amount::from_raw(42)).is_none());
    /// ```
    pub fn checked_sub(self, amount: Amount) -> Option<Self> {
        self.0.checked_sub(amount.0).map(Amount)
    }

    /// safely add self to another amount, returning None on overflow
    pub fn checked_add(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).map(Amount)
    }

    /// safely multiply self with a `u64`, saturating the result on overflow
    /// ```
    /// # use bonding_models::Amount;
    /// assert_eq!(Amount::from_raw(6).saturating_mul_u64(7), Amount::from_raw(42));
    /// assert_eq!(Amount::from_raw(2).saturating_mul_u64(u64::MAX), Amount::max());
    /// ```
    #[must_use]
    pub fn saturating_mul_u64(self, factor: u64) -> Self {
        Amount(self.0.saturating_mul(factor))
    }
}

/// display an Amount as its number of base units
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// build an Amount from a base unit count in string form
///
/// ```
/// # use bonding_models::Amount;
/// # use std::str::FromStr;
/// assert_eq!(Amount::from_str("1000000").unwrap(), Amount::from_raw(1_000_000));
/// assert!(Amount::from_str("11.1").is_err());
/// assert!(Amount::from_str("-11").is_err());
/// assert!(Amount::from_str("abc").is_err());
/// ```
impl FromStr for Amount {
    type Err = ModelsError;

    fn from_str(str_amount: &str) -> Result<Self, Self::Err> {
        u64::from_str(str_amount.trim())
            .map(Amount)
            .map_err(|err| ModelsError::AmountParseError(err.to_string()))
    }
}

impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        deserializer.deserialize_str(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> serde::de::Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn visit_str<E>(self, value: &str) -> Result<Amount, E>
    where
        E: serde::de::Error,
    {
        Amount::from_str(value).map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
    }

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "an Amount type representing a number of base units")
    }
}

impl serde::Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Serializer for `Amount`
#[derive(Clone, Default)]
pub struct AmountSerializer {
    u64_serializer: U64VarIntSerializer,
}

impl AmountSerializer {
    /// Create a new `AmountSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<Amount> for AmountSerializer {
    fn serialize(&self, value: &Amount, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `Amount`
#[derive(Clone)]
pub struct AmountDeserializer {
    u64_deserializer: U64VarIntDeserializer,
}

impl AmountDeserializer {
    /// Create a new `AmountDeserializer`
    pub fn new(min_amount: Bound<Amount>, max_amount: Bound<Amount>) -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(
                min_amount.map(|amount| amount.0),
                max_amount.map(|amount| amount.0),
            ),
        }
    }
}

impl Default for AmountDeserializer {
    fn default() -> Self {
        Self::new(Bound::Included(Amount::zero()), Bound::Included(Amount::max()))
    }
}

impl Deserializer<Amount> for AmountDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Amount, E> {
        context("Failed Amount deserialization", |input| {
            self.u64_deserializer.deserialize(input)
        })(buffer)
        .map(|(rest, raw)| (rest, Amount::from_raw(raw)))
    }
}
