use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// A non-negative amount of money, held in whole cents.
///
/// Parses decimal strings such as `"184.77"` or `"$0.01"` and serializes back
/// to the same two-decimal string so amounts never pass through a float on
/// the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price {
    cents: i64,
}

impl Price {
    /// Zero.
    pub const FREE: Self = Self { cents: 0 };

    /// Create a price from a number of cents.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative amounts.
    pub fn from_cents(cents: i64) -> Result<Self> {
        if cents < 0 {
            return Err(Error::validation("price", "must not be negative"));
        }
        Ok(Self { cents })
    }

    /// The amount in cents.
    #[must_use]
    pub fn cents(self) -> i64 {
        self.cents
    }

    /// Convert a floating point amount, as submitted in JSON.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative, non-finite or sub-cent amounts.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn from_f64(amount: f64) -> Result<Self> {
        if !amount.is_finite() {
            return Err(Error::validation("price", "is not a number"));
        }
        let scaled = amount * 100.0;
        let cents = scaled.round();
        if (scaled - cents).abs() > 1e-6 {
            return Err(Error::validation("price", "can't have more than two decimals"));
        }
        if cents > i64::MAX as f64 {
            return Err(Error::validation("price", "is too large"));
        }
        Self::from_cents(cents as i64)
    }
}

impl FromStr for Price {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let raw = raw.strip_prefix('$').unwrap_or(raw);
        if raw.starts_with('-') {
            return Err(Error::validation("price", "must not be negative"));
        }

        let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
        let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits(whole) || !digits(fraction) {
            return Err(Error::validation("price", format!("is not a number: {s:?}")));
        }
        if fraction.len() > 2 {
            return Err(Error::validation("price", "can't have more than two decimals"));
        }

        let too_large = || Error::validation("price", "is too large");
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| too_large())?
        };
        let fraction: i64 = format!("{fraction:0<2}").parse().map_err(|_| too_large())?;

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(too_large)
            .and_then(Self::from_cents)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse(),
            Raw::Number(amount) => Self::from_f64(amount),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_decimals() {
        let price: Price = "184.77".parse().unwrap();
        assert_eq!(price.cents(), 18477);
        assert_eq!(price.to_string(), "184.77");
    }

    #[test]
    fn test_parse_single_cent() {
        let price: Price = "0.01".parse().unwrap();
        assert_eq!(price.cents(), 1);
        assert_eq!(price.to_string(), "0.01");
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!("1.5".parse::<Price>().unwrap().cents(), 150);
        assert_eq!("12".parse::<Price>().unwrap().cents(), 1200);
        assert_eq!(".25".parse::<Price>().unwrap().cents(), 25);
        assert_eq!("$3.10".parse::<Price>().unwrap().cents(), 310);
    }

    #[test]
    fn test_parse_rejects_negative() {
        let err = "-1.00".parse::<Price>().unwrap_err();
        assert_eq!(err.to_string(), "price must not be negative");
    }

    #[test]
    fn test_parse_rejects_sub_cent() {
        assert!("1.234".parse::<Price>().is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("abc".parse::<Price>().is_err());
        assert!("".parse::<Price>().is_err());
        assert!(".".parse::<Price>().is_err());
        assert!("1.2.3".parse::<Price>().is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!("999999999999999999999".parse::<Price>().is_err());
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Price::from_f64(184.77).unwrap().cents(), 18477);
        assert_eq!(Price::from_f64(1.53).unwrap().cents(), 153);
        assert!(Price::from_f64(-0.5).is_err());
        assert!(Price::from_f64(f64::NAN).is_err());
        assert!(Price::from_f64(0.001).is_err());
    }

    #[test]
    fn test_serde_accepts_number_and_string() {
        let a: Price = serde_json::from_str("184.77").unwrap();
        let b: Price = serde_json::from_str("\"184.77\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"184.77\"");
    }

    #[test]
    fn test_from_cents_rejects_negative() {
        assert!(Price::from_cents(-1).is_err());
        assert_eq!(Price::from_cents(0).unwrap(), Price::FREE);
    }
}
