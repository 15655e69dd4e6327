use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;
use crate::error::Result;
use crate::validation;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,

    /// Public handle, unique across accounts.
    pub username: String,

    /// Contact address (lower-cased).
    pub email: String,

    /// Argon2id PHC string for the account password.
    #[serde(skip_serializing)]
    pub credential_digest: String,

    /// When the user last signed in.
    pub signed_in_at: Option<DateTime<Utc>>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Sign-up form.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    /// Requested username.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Plain-text password; only its argon2 hash is stored.
    pub password: String,
    /// Must repeat `password`.
    pub password_confirmation: String,
}

impl NewUser {
    /// Build a sign-up form whose confirmation repeats the password.
    #[must_use]
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: password.to_string(),
        }
    }

    /// Validate the form, returning it with cleaned username and email.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first offending field.
    pub fn validated(self) -> Result<Self> {
        let username = validation::username(&self.username)?;
        let email = validation::email(&self.email)?;
        validation::password(&self.password, &self.password_confirmation)?;
        Ok(Self {
            username,
            email,
            ..self
        })
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
