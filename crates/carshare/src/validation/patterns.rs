//! Built-in field patterns.
//!
//! Pre-compiled regexes for the free-text fields that have a required shape.

use std::sync::LazyLock;

use regex::Regex;

/// A compiled field pattern.
#[derive(Debug)]
pub struct FieldPattern {
    /// Name of the pattern for identification.
    pub name: &'static str,

    /// Human-readable description of the accepted shape.
    pub description: &'static str,

    /// The compiled regex.
    regex: Regex,
}

impl FieldPattern {
    /// Create a new field pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(name: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            name,
            description,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Check if the whole value matches this pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

static USERNAME: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "username",
        "3 to 32 letters, digits, dots, dashes or underscores",
        r"^[A-Za-z0-9_.-]{3,32}$",
    )
});

static EMAIL: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "email",
        "an address like name@example.com",
        r"^[^@\s]+@[^@\s]+\.[^@\s]+$",
    )
});

static LICENSE_PLATE: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "license_plate",
        "2 to 8 letters or digits",
        r"^[A-Z0-9]{2,8}$",
    )
});

/// Pattern for account usernames.
#[must_use]
pub fn username() -> &'static FieldPattern {
    &USERNAME
}

/// Pattern for email addresses.
#[must_use]
pub fn email() -> &'static FieldPattern {
    &EMAIL
}

/// Pattern for normalized license plates (upper-case, no separators).
#[must_use]
pub fn license_plate() -> &'static FieldPattern {
    &LICENSE_PLATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_are_described() {
        for pattern in [username(), email(), license_plate()] {
            assert!(!pattern.name.is_empty());
            assert!(!pattern.description.is_empty());
        }
    }

    #[test]
    fn test_username_pattern() {
        assert!(username().matches("RickSanchez"));
        assert!(username().matches("morty.smith_c137"));
        assert!(!username().matches("ab"));
        assert!(!username().matches("has space"));
        assert!(!username().matches(&"x".repeat(33)));
    }

    #[test]
    fn test_email_pattern() {
        assert!(email().matches("rick@sanchez.com"));
        assert!(!email().matches("rick@sanchez"));
        assert!(!email().matches("rick sanchez@x.com"));
        assert!(!email().matches("@sanchez.com"));
    }

    #[test]
    fn test_license_plate_pattern() {
        assert!(license_plate().matches("8DEF234"));
        assert!(!license_plate().matches("8def234"));
        assert!(!license_plate().matches("8DEF-234"));
        assert!(!license_plate().matches("A"));
        assert!(!license_plate().matches("ABCDEFGHI"));
    }
}
