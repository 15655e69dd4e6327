//! Field validation for submitted forms.
//!
//! Every helper returns the cleaned value on success, or an
//! [`Error::Validation`](crate::Error::Validation) naming the field.
//!
//! # Example
//!
//! ```
//! use carshare::validation;
//!
//! let plate = validation::license_plate("8def-234").unwrap();
//! assert_eq!(plate, "8DEF234");
//!
//! let err = validation::non_blank("start_location", "   ").unwrap_err();
//! assert_eq!(err.to_string(), "start_location can't be blank");
//! ```

mod patterns;

pub use patterns::FieldPattern;

use crate::error::{Error, Result};

/// Trim a value and reject it if nothing is left.
///
/// # Errors
///
/// Returns a validation error when the value is blank.
pub fn non_blank(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "can't be blank"));
    }
    Ok(trimmed.to_string())
}

/// Reject values longer than `max` characters.
///
/// # Errors
///
/// Returns a validation error when the value is too long.
pub fn max_chars(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::validation(
            field,
            format!("is too long (maximum is {max} characters)"),
        ));
    }
    Ok(())
}

/// Validate a non-blank value against a pattern.
fn shaped(field: &'static str, pattern: &FieldPattern, value: &str) -> Result<String> {
    let value = non_blank(field, value)?;
    if !pattern.matches(&value) {
        return Err(Error::validation(
            field,
            format!("must be {}", pattern.description),
        ));
    }
    Ok(value)
}

/// Validate a username.
///
/// # Errors
///
/// Returns a validation error when the username is blank or malformed.
pub fn username(value: &str) -> Result<String> {
    shaped("username", patterns::username(), value)
}

/// Validate an email address, returning it lower-cased.
///
/// # Errors
///
/// Returns a validation error when the address is blank or malformed.
pub fn email(value: &str) -> Result<String> {
    shaped("email", patterns::email(), value).map(|email| email.to_lowercase())
}

/// Normalize and validate a license plate.
///
/// Spaces and dashes are dropped and letters upper-cased before matching.
///
/// # Errors
///
/// Returns a validation error when the normalized plate is malformed.
pub fn license_plate(value: &str) -> Result<String> {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    shaped("license_plate", patterns::license_plate(), &normalized)
}

/// Earliest model year accepted for a car.
pub const FIRST_CAR_YEAR: i32 = 1886;

/// Validate a car's model year against the current calendar year.
///
/// Next year's models are accepted.
///
/// # Errors
///
/// Returns a validation error when the year is out of range.
pub fn car_year(year: i32, current_year: i32) -> Result<i32> {
    let latest = current_year + 1;
    if !(FIRST_CAR_YEAR..=latest).contains(&year) {
        return Err(Error::validation(
            "year",
            format!("must be between {FIRST_CAR_YEAR} and {latest}"),
        ));
    }
    Ok(year)
}

/// Minimum password length.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Validate a password and its confirmation.
///
/// # Errors
///
/// Returns a validation error when the password is too short or the
/// confirmation differs.
pub fn password(password: &str, confirmation: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(Error::validation(
            "password",
            format!("is too short (minimum is {MIN_PASSWORD_CHARS} characters)"),
        ));
    }
    if password != confirmation {
        return Err(Error::validation(
            "password_confirmation",
            "doesn't match password",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_trims() {
        assert_eq!(non_blank("make", "  Ford ").unwrap(), "Ford");
    }

    #[test]
    fn test_non_blank_rejects_whitespace() {
        let err = non_blank("make", " \t ").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "make can't be blank");
    }

    #[test]
    fn test_max_chars() {
        assert!(max_chars("terms", "abc", 3).is_ok());
        let err = max_chars("terms", "abcd", 3).unwrap_err();
        assert!(err.to_string().contains("maximum is 3"));
    }

    #[test]
    fn test_max_chars_counts_characters_not_bytes() {
        assert!(max_chars("terms", "ééé", 3).is_ok());
    }

    #[test]
    fn test_username() {
        assert_eq!(username(" RickSanchez ").unwrap(), "RickSanchez");
        let err = username("r s").unwrap_err();
        assert!(err.to_string().starts_with("username must be"));
    }

    #[test]
    fn test_email_lowercases() {
        assert_eq!(email("Rick@Sanchez.com").unwrap(), "rick@sanchez.com");
        assert!(email("nope").is_err());
    }

    #[test]
    fn test_license_plate_normalizes() {
        assert_eq!(license_plate("8def 234").unwrap(), "8DEF234");
        assert_eq!(license_plate("ab-12").unwrap(), "AB12");
        assert!(license_plate("!!").is_err());
        assert!(license_plate("").is_err());
    }

    #[test]
    fn test_car_year_bounds() {
        assert_eq!(car_year(2000, 2026).unwrap(), 2000);
        assert_eq!(car_year(2027, 2026).unwrap(), 2027);
        assert!(car_year(2028, 2026).is_err());
        assert!(car_year(1885, 2026).is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(password("foobar", "foobar").is_ok());

        let err = password("foo", "foo").unwrap_err();
        assert!(err.to_string().starts_with("password is too short"));

        let err = password("foobar", "foobaz").unwrap_err();
        assert_eq!(
            err.to_string(),
            "password_confirmation doesn't match password"
        );
    }
}
