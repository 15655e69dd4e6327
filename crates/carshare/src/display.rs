//! Human-readable text for rentals and cars.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::{Car, Price, Rental, RentalStatus, User};

/// Format of each end of a rental window, e.g. "12:45 AM on Wednesday, Nov. 28".
const WINDOW_FORMAT: &str = "%-I:%M %p on %A, %b. %-d";

/// What a successful rental action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A listing was created.
    Created,
    /// A listing was edited.
    Updated,
    /// A listing was reserved.
    Reserved,
    /// A listing or reservation was canceled.
    Canceled,
    /// A listing was deleted.
    Deleted,
}

impl Outcome {
    /// The confirmation shown to the actor.
    #[must_use]
    pub fn notice(self) -> &'static str {
        match self {
            Self::Created => "Rental was successfully created.",
            Self::Updated => "Rental was successfully updated.",
            Self::Reserved => "Rental was successfully reserved.",
            Self::Canceled => "Rental was successfully canceled.",
            Self::Deleted => "Rental was successfully deleted.",
        }
    }
}

/// Label shown for a status. A reserved rental is "Upcoming" to its parties.
#[must_use]
pub fn status_label(status: RentalStatus) -> &'static str {
    match status {
        RentalStatus::Available => "Available",
        RentalStatus::Reserved => "Upcoming",
        RentalStatus::Canceled => "Canceled",
    }
}

/// "$184.77"
#[must_use]
pub fn price_tag(price: Price) -> String {
    format!("${price}")
}

/// "From 12:45 AM on Wednesday, Nov. 28 until 1:52 AM on Wednesday, Nov. 28"
#[must_use]
pub fn time_window(start: &NaiveDateTime, end: &NaiveDateTime) -> String {
    format!(
        "From {} until {}",
        start.format(WINDOW_FORMAT),
        end.format(WINDOW_FORMAT)
    )
}

/// Label for choosing a car, e.g. "Red, 2000 Ford Mustang".
#[must_use]
pub fn car_option_label(car: &Car) -> String {
    format!("{}, {} {} {}", car.color, car.year, car.make, car.model)
}

/// "Ford Mustang"
#[must_use]
pub fn car_title(car: &Car) -> String {
    format!("{} {}", car.make, car.model)
}

/// Who offers which car, e.g. "Ford Mustang, listed by RickSanchez".
#[must_use]
pub fn listed_by(car: &Car, owner: &User) -> String {
    format!("{}, listed by {}", car_title(car), owner.username)
}

/// One-line summary of a rental for listings.
#[must_use]
pub fn rental_line(rental: &Rental) -> String {
    format!(
        "#{} [{}] {} -> {} {} {}",
        rental.id,
        status_label(rental.status),
        rental.start_location,
        rental.end_location,
        price_tag(rental.price),
        time_window(&rental.start_time, &rental.end_time)
    )
}
