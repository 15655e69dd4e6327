//! Rental window timestamps.
//!
//! Rental times are wall-clock times at the pickup location, so they are kept
//! as [`NaiveDateTime`] with no zone attached.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{Error, Result};

/// Wire format. Years past 9999 carry a leading `+`.
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Accepted input formats, tried in order.
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp submitted for `field`.
///
/// Any year chrono can represent is accepted; an unsigned year longer than
/// four digits is read as positive. Fractional seconds are dropped.
///
/// # Errors
///
/// Returns a validation error if no accepted format matches.
pub fn parse(field: &'static str, value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    let normalized = signed_year(value);
    let parsed = INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .ok_or_else(|| Error::validation(field, format!("is not a valid time: {value:?}")))?;

    parsed
        .with_nanosecond(0)
        .ok_or_else(|| Error::validation(field, format!("is not a valid time: {value:?}")))
}

/// chrono only reads years beyond four digits when they carry a sign.
fn signed_year(value: &str) -> Cow<'_, str> {
    let digits = value.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 4 {
        Cow::Owned(format!("+{value}"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Seconds since the Unix epoch, the stored form.
#[must_use]
pub fn to_seconds(value: &NaiveDateTime) -> i64 {
    value.and_utc().timestamp()
}

/// Inverse of [`to_seconds`]; `None` outside chrono's range.
#[must_use]
pub fn from_seconds(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// Format a timestamp for the wire.
#[must_use]
pub fn format(value: &NaiveDateTime) -> String {
    value.format(FORMAT).to_string()
}

/// Serde adapter for a required timestamp field.
pub mod required {
    use super::{Deserialize, Deserializer, NaiveDateTime, Serializer};

    /// Serialize in [`FORMAT`](super::FORMAT).
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(value))
    }

    /// Deserialize from any accepted input format.
    ///
    /// # Errors
    ///
    /// Fails when the string is not a valid timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse("time", &raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for an optional timestamp field.
pub mod optional {
    use super::{Deserialize, Deserializer, NaiveDateTime, Serializer};

    /// Serialize in [`FORMAT`](super::FORMAT), or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&super::format(value)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from any accepted input format, or `null`.
    ///
    /// # Errors
    ///
    /// Fails when a present string is not a valid timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse("time", &raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
