//! Accounts and the acting user.
//!
//! Lifecycle operations never look up "the current user" themselves; callers
//! authenticate here and pass the resulting [`Actor`] explicitly.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{NewUser, User, UserId};
use crate::storage::Storage;

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    /// The acting user's id.
    pub user_id: UserId,
    /// The acting user's username.
    pub username: String,
}

impl Actor {
    /// Create an actor for an already-authenticated user.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.username.clone())
    }
}

/// Hash a password into a salted argon2id PHC string.
///
/// # Errors
///
/// Returns an internal error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
}

/// Check a password against a user's stored hash.
#[must_use]
pub fn verify_password(user: &User, password: &str) -> bool {
    let Ok(stored) = PasswordHash::new(&user.credential_digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &stored)
        .is_ok()
}

/// Create an account.
///
/// # Errors
///
/// Returns a validation error for malformed fields or a taken username.
pub fn register(storage: &Storage, form: NewUser) -> Result<User> {
    let form = form.validated()?;
    if storage.user_by_username(&form.username)?.is_some() {
        return Err(Error::validation("username", "has already been taken"));
    }

    let hash = hash_password(&form.password)?;
    let user = storage.insert_user(&form.username, &form.email, &hash)?;
    info!(user = %user.id, username = %user.username, "Registered user");
    Ok(user)
}

/// Verify credentials and return the matching actor.
///
/// # Errors
///
/// Returns [`Error::Unauthenticated`] for an unknown user or a wrong password.
pub fn authenticate(storage: &Storage, username: &str, password: &str) -> Result<Actor> {
    let Some(user) = storage.user_by_username(username.trim())? else {
        debug!(username, "Unknown username");
        return Err(Error::Unauthenticated);
    };
    if !verify_password(&user, password) {
        debug!(username, "Password mismatch");
        return Err(Error::Unauthenticated);
    }
    Ok(Actor::from(&user))
}

/// Authenticate and record the sign-in time.
///
/// # Errors
///
/// Returns [`Error::Unauthenticated`] on bad credentials, or a storage error.
pub fn sign_in(storage: &Storage, username: &str, password: &str) -> Result<Actor> {
    let actor = authenticate(storage, username, password)?;
    storage.touch_sign_in(actor.user_id, Utc::now())?;
    info!(user = %actor.user_id, "Signed in");
    Ok(actor)
}
