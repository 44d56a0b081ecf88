// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Unsigned time management
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
pub use error::TimeError;
use bonding_serialization::{Deserializer, Serializer, U64VarIntDeserializer, U64VarIntSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

/// Time structure used everywhere.
/// milliseconds since 01/01/1970.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BondingTime(u64);

/// Serializer for `BondingTime`
#[derive(Default, Clone)]
pub struct BondingTimeSerializer {
    u64_serializer: U64VarIntSerializer,
}

impl BondingTimeSerializer {
    /// Creates a `BondingTimeSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<BondingTime> for BondingTimeSerializer {
    /// ```
    /// use bonding_serialization::Serializer;
    /// use bonding_time::{BondingTime, BondingTimeSerializer};
    ///
    /// let time: BondingTime = BondingTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// let serializer = BondingTimeSerializer::new();
    /// serializer.serialize(&time, &mut serialized).unwrap();
    /// ```
    fn serialize(
        &self,
        value: &BondingTime,
        buffer: &mut Vec<u8>,
    ) -> Result<(), bonding_serialization::SerializeError> {
        self.u64_serializer.serialize(&value.to_millis(), buffer)
    }
}

/// Deserializer for `BondingTime`
#[derive(Clone)]
pub struct BondingTimeDeserializer {
    u64_deserializer: U64VarIntDeserializer,
}

impl BondingTimeDeserializer {
    /// Creates a `BondingTimeDeserializer`
    ///
    /// Arguments:
    /// * range: bounds of the time to deserialize
    pub fn new(range: (Bound<BondingTime>, Bound<BondingTime>)) -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(
                range.0.map(|time| time.to_millis()),
                range.1.map(|time| time.to_millis()),
            ),
        }
    }
}

impl Deserializer<BondingTime> for BondingTimeDeserializer {
    /// ```
    /// use std::ops::Bound::Included;
    /// use bonding_serialization::{Serializer, Deserializer, DeserializeError};
    /// use bonding_time::{BondingTime, BondingTimeSerializer, BondingTimeDeserializer};
    ///
    /// let time: BondingTime = BondingTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// let serializer = BondingTimeSerializer::new();
    /// let deserializer = BondingTimeDeserializer::new((Included(BondingTime::from_millis(0)), Included(BondingTime::max())));
    /// serializer.serialize(&time, &mut serialized).unwrap();
    /// let (rest, time_deser) = deserializer.deserialize::<DeserializeError>(&serialized).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(time, time_deser);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BondingTime, E> {
        context("Failed BondingTime deserialization", |input| {
            self.u64_deserializer
                .deserialize(input)
                .map(|(rest, res)| (rest, BondingTime::from_millis(res)))
        })(buffer)
    }
}

impl fmt::Display for BondingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis())
    }
}

impl FromStr for BondingTime {
    type Err = crate::TimeError;

    /// Conversion from `&str`, in milliseconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BondingTime(
            u64::from_str(s).map_err(|_| Self::Err::ConversionError)?,
        ))
    }
}

impl BondingTime {
    /// Conversion from `u64`, representing timestamp in milliseconds.
    /// ```
    /// # use bonding_time::*;
    /// let time : BondingTime = BondingTime::from_millis(42);
    /// ```
    pub const fn from_millis(value: u64) -> Self {
        BondingTime(value)
    }

    /// Smallest time interval
    pub const EPSILON: BondingTime = BondingTime(1);

    /// Size of the fixed-width big-endian key form
    pub const KEY_SIZE_BYTES: usize = 8;

    /// Conversion to `u64`, representing milliseconds.
    /// ```
    /// # use bonding_time::*;
    /// let time : BondingTime = BondingTime::from_millis(42);
    /// let res: u64 = time.to_millis();
    /// assert_eq!(res, 42);
    /// ```
    pub const fn to_millis(&self) -> u64 {
        self.0
    }

    /// Big-endian fixed-width bytes: byte order matches time order, used in store keys.
    /// ```
    /// # use bonding_time::*;
    /// let early = BondingTime::from_millis(255).to_key_bytes();
    /// let late = BondingTime::from_millis(256).to_key_bytes();
    /// assert!(early < late);
    /// ```
    pub const fn to_key_bytes(&self) -> [u8; Self::KEY_SIZE_BYTES] {
        self.0.to_be_bytes()
    }

    /// ```
    /// # use bonding_time::*;
    /// let time_1 : BondingTime = BondingTime::from_millis(42);
    /// let time_2 : BondingTime = BondingTime::from_millis(7);
    /// let res : BondingTime = time_1.saturating_sub(time_2);
    /// assert_eq!(res, BondingTime::from_millis(42-7))
    /// ```
    #[must_use]
    pub fn saturating_sub(self, t: BondingTime) -> Self {
        BondingTime(self.0.saturating_sub(t.0))
    }

    /// ```
    /// # use bonding_time::*;
    /// let time_1 : BondingTime = BondingTime::from_millis(42);
    /// let time_2 : BondingTime = BondingTime::from_millis(7);
    /// let res : BondingTime = time_1.checked_add(time_2).unwrap();
    /// assert_eq!(res, BondingTime::from_millis(42+7))
    /// ```
    pub fn checked_add(self, t: BondingTime) -> Result<Self, TimeError> {
        self.0
            .checked_add(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("addition error".to_string()))
            .map(BondingTime)
    }

    /// ```
    /// # use bonding_time::*;
    /// let bonding_time : BondingTime = BondingTime::from_millis(1_640_995_200_000);
    /// assert_eq!(bonding_time.format_instant(), String::from("2022-01-01T00:00:00Z"))
    /// ```
    pub fn format_instant(&self) -> String {
        OffsetDateTime::from_unix_timestamp((self.to_millis() / 1000) as i64)
            .ok()
            .and_then(|date_time| date_time.format(&Rfc3339).ok())
            .unwrap_or_else(|| format!("{}ms", self.0))
    }

    /// ```
    /// # use bonding_time::*;
    /// let bonding_time : BondingTime = BondingTime::from_utc_ymd_hms(2022, 2, 5, 22, 50, 40).unwrap();
    /// assert_eq!(bonding_time.format_instant(), String::from("2022-02-05T22:50:40Z"))
    /// ```
    pub fn from_utc_ymd_hms(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<BondingTime, TimeError> {
        let month = month.try_into().map_err(|_| TimeError::ConversionError)?;

        let date =
            Date::from_calendar_date(year, month, day).map_err(|_| TimeError::ConversionError)?;

        let date_time = date
            .with_hms(hour, minute, second)
            .map_err(|_| TimeError::ConversionError)?
            .assume_utc();

        let millis = date_time
            .unix_timestamp_nanos()
            .checked_div(1_000_000)
            .ok_or(TimeError::ConversionError)?;
        Ok(BondingTime::from_millis(
            millis.try_into().map_err(|_| TimeError::ConversionError)?,
        ))
    }

    /// Get max BondingTime value
    pub const fn max() -> BondingTime {
        BondingTime::from_millis(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bytes_order() {
        let times = [0u64, 1, 255, 256, 1_640_995_200_000, u64::MAX];
        let keys: Vec<_> = times
            .iter()
            .map(|millis| BondingTime::from_millis(*millis).to_key_bytes())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys[3], [0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn test_far_future_date() {
        let end = BondingTime::from_utc_ymd_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(end.to_millis(), 253_402_300_799_000);
        assert_eq!(end.format_instant(), "9999-12-31T23:59:59Z");
    }

    #[test]
    fn test_checked_add_overflow() {
        assert!(BondingTime::max().checked_add(BondingTime::EPSILON).is_err());
    }
}
