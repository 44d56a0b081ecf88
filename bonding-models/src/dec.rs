// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::amount::Amount;
use crate::constants::{DEC_DECIMAL_FACTOR, DEC_PRECISION};
use crate::ModelsError;
use bonding_serialization::{
    Deserializer, SerializeError, Serializer, U128VarIntDeserializer, U128VarIntSerializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use num::BigUint;
use rust_decimal::prelude::{Decimal, ToPrimitive};
use serde::de::Unexpected;
use std::fmt;
use std::ops::Bound::Included;
use std::str::FromStr;

/// Unsigned fixed-point decimal with `DEC_PRECISION` fractional digits.
///
/// Used for delegator shares and for slashing fractions. The raw `u128` value is the decimal
/// multiplied by `DEC_DECIMAL_FACTOR`. Products and quotients go through arbitrary precision
/// intermediates; the only precision loss is the explicit floor or round of each operation.
#[derive(Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Default, Hash)]
pub struct Dec(u128);

/// `floor(a * b / c)`, or rounded half-up, `None` on division by zero or overflow
fn mul_div(a: u128, b: u128, c: u128, round_half_up: bool) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let product = BigUint::from(a) * BigUint::from(b);
    let divisor = BigUint::from(c);
    let mut quotient = &product / &divisor;
    if round_half_up {
        let remainder = &product % &divisor;
        if remainder * 2u32 >= divisor {
            quotient += 1u32;
        }
    }
    u128::try_from(quotient).ok()
}

impl Dec {
    /// Zero
    pub const fn zero() -> Self {
        Dec(0)
    }

    /// One
    pub const fn one() -> Self {
        Dec(DEC_DECIMAL_FACTOR)
    }

    /// Construct from the raw fixed-point value
    pub const fn from_raw(raw: u128) -> Self {
        Dec(raw)
    }

    /// Raw fixed-point value
    pub const fn to_raw(&self) -> u128 {
        self.0
    }

    /// Exact conversion of a whole amount
    /// ```
    /// # use bonding_models::{Amount, Dec};
    /// assert_eq!(Dec::from_amount(Amount::from_raw(3)).to_string(), "3.000000000000000000");
    /// ```
    pub const fn from_amount(amount: Amount) -> Self {
        // u64::MAX * 10^18 < u128::MAX
        Dec(amount.to_raw() as u128 * DEC_DECIMAL_FACTOR)
    }

    /// returns true if the value is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// checked addition
    pub fn checked_add(self, other: Dec) -> Option<Self> {
        self.0.checked_add(other.0).map(Dec)
    }

    /// checked subtraction, `None` on underflow
    pub fn checked_sub(self, other: Dec) -> Option<Self> {
        self.0.checked_sub(other.0).map(Dec)
    }

    /// `self * numerator / denominator`, truncated at the last decimal digit
    /// ```
    /// # use bonding_models::{Amount, Dec};
    /// let third = Dec::one().mul_ratio_floor(Amount::from_raw(2), Amount::from_raw(3)).unwrap();
    /// assert_eq!(third.to_raw(), 666_666_666_666_666_666);
    /// ```
    pub fn mul_ratio_floor(self, numerator: Amount, denominator: Amount) -> Option<Dec> {
        mul_div(
            self.0,
            numerator.to_raw() as u128,
            denominator.to_raw() as u128,
            false,
        )
        .map(Dec)
    }

    /// `self * numerator / denominator`, rounded half-up at the last decimal digit
    /// ```
    /// # use bonding_models::{Amount, Dec};
    /// let third = Dec::one().mul_ratio_round(Amount::from_raw(2), Amount::from_raw(3)).unwrap();
    /// assert_eq!(third.to_raw(), 666_666_666_666_666_667);
    /// ```
    pub fn mul_ratio_round(self, numerator: Amount, denominator: Amount) -> Option<Dec> {
        mul_div(
            self.0,
            numerator.to_raw() as u128,
            denominator.to_raw() as u128,
            true,
        )
        .map(Dec)
    }

    /// `floor(self * amount)` in whole units
    /// ```
    /// # use bonding_models::{Amount, Dec};
    /// # use std::str::FromStr;
    /// let fraction = Dec::from_str("0.05").unwrap();
    /// assert_eq!(fraction.mul_amount_floor(Amount::from_raw(999)), Some(Amount::from_raw(49)));
    /// ```
    pub fn mul_amount_floor(self, amount: Amount) -> Option<Amount> {
        mul_div(self.0, amount.to_raw() as u128, DEC_DECIMAL_FACTOR, false)
            .and_then(|value| u64::try_from(value).ok())
            .map(Amount::from_raw)
    }

    /// `floor(self * amount / divisor)` in whole units
    pub fn mul_amount_quo_floor(self, amount: Amount, divisor: Dec) -> Option<Amount> {
        mul_div(self.0, amount.to_raw() as u128, divisor.0, false)
            .and_then(|value| u64::try_from(value).ok())
            .map(Amount::from_raw)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / DEC_DECIMAL_FACTOR,
            self.0 % DEC_DECIMAL_FACTOR,
            width = DEC_PRECISION as usize
        )
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// build a `Dec` from decimal string form (like "0.05")
///
/// ```
/// # use bonding_models::Dec;
/// # use std::str::FromStr;
/// assert_eq!(Dec::from_str("1").unwrap(), Dec::one());
/// assert!(Dec::from_str("0.0000000000000000001").is_err());
/// assert!(Dec::from_str("-0.5").is_err());
/// ```
impl FromStr for Dec {
    type Err = ModelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let res = Decimal::from_str(s)
            .map_err(|err| ModelsError::DecParseError(err.to_string()))?
            .checked_mul(Decimal::from(DEC_DECIMAL_FACTOR as u64))
            .ok_or_else(|| ModelsError::DecParseError("decimal is too large".to_string()))?;
        if res.is_sign_negative() {
            return Err(ModelsError::DecParseError(
                "decimals cannot be strictly negative".to_string(),
            ));
        }
        if !res.fract().is_zero() {
            return Err(ModelsError::DecParseError(format!(
                "decimals cannot be more precise than 1/{}",
                DEC_DECIMAL_FACTOR
            )));
        }
        res.to_u128()
            .map(Dec)
            .ok_or_else(|| ModelsError::DecParseError("decimal is out of range".to_string()))
    }
}

impl<'de> serde::Deserialize<'de> for Dec {
    fn deserialize<D>(deserializer: D) -> Result<Dec, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        deserializer.deserialize_str(DecVisitor)
    }
}

struct DecVisitor;

impl<'de> serde::de::Visitor<'de> for DecVisitor {
    type Value = Dec;

    fn visit_str<E>(self, value: &str) -> Result<Dec, E>
    where
        E: serde::de::Error,
    {
        Dec::from_str(value).map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
    }

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a non-negative decimal with at most 18 fractional digits")
    }
}

impl serde::Serialize for Dec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Serializer for `Dec`
#[derive(Clone, Default)]
pub struct DecSerializer {
    u128_serializer: U128VarIntSerializer,
}

impl DecSerializer {
    /// Creates a `DecSerializer`
    pub const fn new() -> Self {
        Self {
            u128_serializer: U128VarIntSerializer::new(),
        }
    }
}

impl Serializer<Dec> for DecSerializer {
    fn serialize(&self, value: &Dec, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u128_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `Dec`
#[derive(Clone)]
pub struct DecDeserializer {
    u128_deserializer: U128VarIntDeserializer,
}

impl DecDeserializer {
    /// Creates a `DecDeserializer`
    pub const fn new() -> Self {
        Self {
            u128_deserializer: U128VarIntDeserializer::new(Included(0), Included(u128::MAX)),
        }
    }
}

impl Default for DecDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Dec> for DecDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Dec, E> {
        context("Failed Dec deserialization", |input| {
            self.u128_deserializer.deserialize(input)
        })(buffer)
        .map(|(rest, raw)| (rest, Dec(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let value = Dec::from_str("12.5").unwrap();
        assert_eq!(value.to_string(), "12.500000000000000000");
        assert_eq!(Dec::from_str(&value.to_string()).unwrap(), value);
        assert_eq!(Dec::zero().to_string(), "0.000000000000000000");
    }

    #[test]
    fn test_ratio_division_by_zero() {
        assert!(Dec::one()
            .mul_ratio_floor(Amount::from_raw(1), Amount::zero())
            .is_none());
        assert!(Dec::one()
            .mul_amount_quo_floor(Amount::from_raw(1), Dec::zero())
            .is_none());
    }

    #[test]
    fn test_large_intermediate_products() {
        // shares of 10^12 tokens at 1:1 overflow a u128 once multiplied by 10^12 tokens
        let shares = Dec::from_amount(Amount::from_raw(1_000_000_000_000));
        let tokens = Amount::from_raw(1_000_000_000_000);
        let half = Dec::from_amount(Amount::from_raw(500_000_000_000));
        assert_eq!(
            half.mul_amount_quo_floor(tokens, shares),
            Some(Amount::from_raw(500_000_000_000))
        );
        assert_eq!(
            shares.mul_ratio_floor(Amount::from_raw(3), tokens),
            Some(Dec::from_amount(Amount::from_raw(3)))
        );
    }

    #[test]
    fn test_round_half_up() {
        // 1 * 1 / 2 at the last digit: 0.5 raw units round up
        let tiny = Dec::from_raw(1);
        assert_eq!(
            tiny.mul_ratio_round(Amount::from_raw(1), Amount::from_raw(2)),
            Some(Dec::from_raw(1))
        );
        assert_eq!(
            tiny.mul_ratio_floor(Amount::from_raw(1), Amount::from_raw(2)),
            Some(Dec::zero())
        );
    }
}
