use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, CarId, Price, RentalId, UserId};
use crate::error::{Error, Result};
use crate::validation;

/// Maximum length of the free-text terms.
pub const MAX_TERMS_CHARS: usize = 1000;

/// Maximum length of a pickup or drop-off location.
pub const MAX_LOCATION_CHARS: usize = 200;

/// Where a rental is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    /// Listed and open for reservation; no renter.
    Available,
    /// Reserved by a renter.
    Reserved,
    /// Withdrawn by the owner or the renter. Terminal.
    Canceled,
}

/// A status-changing action on a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// A renter claims an available listing.
    Reserve,
    /// The owner or renter calls it off.
    Cancel,
}

impl Transition {
    /// Verb used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Cancel => "cancel",
        }
    }
}

impl RentalStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Available, Self::Reserved, Self::Canceled];

    /// The status reached by applying `transition`, if it is legal.
    ///
    /// ```text
    /// Available --Reserve--> Reserved
    /// Available --Cancel---> Canceled
    /// Reserved  --Cancel---> Canceled
    /// ```
    #[must_use]
    pub fn apply(self, transition: Transition) -> Option<Self> {
        match (self, transition) {
            (Self::Available, Transition::Reserve) => Some(Self::Reserved),
            (Self::Available | Self::Reserved, Transition::Cancel) => Some(Self::Canceled),
            (Self::Reserved | Self::Canceled, Transition::Reserve)
            | (Self::Canceled, Transition::Cancel) => None,
        }
    }

    /// Whether no transition leaves this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::validation("status", format!("is unknown: {s:?}")))
    }
}

/// A car listed for a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rental {
    /// Unique identifier.
    pub id: RentalId,
    /// The user who listed the rental.
    pub owner_id: UserId,
    /// The user holding the reservation, kept after cancellation.
    pub renter_id: Option<UserId>,
    /// The car being offered.
    pub car_id: CarId,
    /// Pickup location.
    pub start_location: String,
    /// Drop-off location.
    pub end_location: String,
    /// Start of the rental window.
    #[serde(with = "timestamp::required")]
    pub start_time: NaiveDateTime,
    /// End of the rental window, after `start_time`.
    #[serde(with = "timestamp::required")]
    pub end_time: NaiveDateTime,
    /// Asking price for the whole window.
    pub price: Price,
    /// Current lifecycle status.
    pub status: RentalStatus,
    /// Owner's conditions.
    pub terms: String,
    /// When the listing was created.
    pub created_at: DateTime<Utc>,
    /// When the listing last changed.
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    /// Check whether `user` listed this rental.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// Check whether `user` holds (or held) the reservation.
    #[must_use]
    pub fn is_rented_by(&self, user: UserId) -> bool {
        self.renter_id == Some(user)
    }

    /// The editable fields as a form.
    #[must_use]
    pub fn form(&self) -> RentalForm {
        RentalForm {
            car_id: self.car_id,
            start_location: self.start_location.clone(),
            end_location: self.end_location.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            price: self.price,
            terms: self.terms.clone(),
        }
    }
}

/// The owner-editable fields of a rental, as submitted on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalForm {
    /// Car to offer; must belong to the owner.
    pub car_id: CarId,
    /// Pickup location.
    pub start_location: String,
    /// Drop-off location.
    pub end_location: String,
    /// Start of the window.
    #[serde(with = "timestamp::required")]
    pub start_time: NaiveDateTime,
    /// End of the window.
    #[serde(with = "timestamp::required")]
    pub end_time: NaiveDateTime,
    /// Asking price.
    pub price: Price,
    /// Owner's conditions.
    #[serde(default)]
    pub terms: String,
}

impl RentalForm {
    /// Validate field values, returning the form with trimmed text.
    ///
    /// Ownership of the car is checked by the lifecycle manager, not here.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first offending field.
    pub fn validated(self) -> Result<Self> {
        let start_location = validation::non_blank("start_location", &self.start_location)?;
        validation::max_chars("start_location", &start_location, MAX_LOCATION_CHARS)?;
        let end_location = validation::non_blank("end_location", &self.end_location)?;
        validation::max_chars("end_location", &end_location, MAX_LOCATION_CHARS)?;

        if self.end_time <= self.start_time {
            return Err(Error::validation("end_time", "must be after the start time"));
        }

        let terms = self.terms.trim().to_string();
        validation::max_chars("terms", &terms, MAX_TERMS_CHARS)?;

        Ok(Self {
            start_location,
            end_location,
            terms,
            ..self
        })
    }
}

/// A partial update of a rental's editable fields.
///
/// Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalChanges {
    /// Replacement car.
    pub car_id: Option<CarId>,
    /// New pickup location.
    pub start_location: Option<String>,
    /// New drop-off location.
    pub end_location: Option<String>,
    /// New window start.
    #[serde(with = "timestamp::optional")]
    pub start_time: Option<NaiveDateTime>,
    /// New window end.
    #[serde(with = "timestamp::optional")]
    pub end_time: Option<NaiveDateTime>,
    /// New price.
    pub price: Option<Price>,
    /// New terms.
    pub terms: Option<String>,
}

impl RentalChanges {
    /// Check whether nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay these changes on the rental's current fields.
    #[must_use]
    pub fn apply_to(self, rental: &Rental) -> RentalForm {
        let current = rental.form();
        RentalForm {
            car_id: self.car_id.unwrap_or(current.car_id),
            start_location: self.start_location.unwrap_or(current.start_location),
            end_location: self.end_location.unwrap_or(current.end_location),
            start_time: self.start_time.unwrap_or(current.start_time),
            end_time: self.end_time.unwrap_or(current.end_time),
            price: self.price.unwrap_or(current.price),
            terms: self.terms.unwrap_or(current.terms),
        }
    }
}

impl From<RentalForm> for RentalChanges {
    fn from(form: RentalForm) -> Self {
        Self {
            car_id: Some(form.car_id),
            start_location: Some(form.start_location),
            end_location: Some(form.end_location),
            start_time: Some(form.start_time),
            end_time: Some(form.end_time),
            price: Some(form.price),
            terms: Some(form.terms),
        }
    }
}
