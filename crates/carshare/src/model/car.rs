use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CarId, UserId};
use crate::error::Result;
use crate::validation;

/// A vehicle registered by its owner.
///
/// Registration attributes do not change once the car is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    /// Unique identifier.
    pub id: CarId,
    /// The user who registered the car.
    pub owner_id: UserId,
    /// Manufacturer, e.g. "Ford".
    pub make: String,
    /// Model name, e.g. "Mustang".
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Exterior color.
    pub color: String,
    /// Normalized plate (upper-case, no separators).
    pub license_plate: String,
    /// When the car was registered.
    pub created_at: DateTime<Utc>,
}

impl Car {
    /// Check whether `user` owns this car.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// Car registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCar {
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Exterior color.
    pub color: String,
    /// Plate as typed; normalized on validation.
    pub license_plate: String,
}

impl NewCar {
    /// Validate the form against the current calendar year.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first offending field.
    pub fn validated(self, current_year: i32) -> Result<Self> {
        Ok(Self {
            make: validation::non_blank("make", &self.make)?,
            model: validation::non_blank("model", &self.model)?,
            year: validation::car_year(self.year, current_year)?,
            color: validation::non_blank("color", &self.color)?,
            license_plate: validation::license_plate(&self.license_plate)?,
        })
    }
}
