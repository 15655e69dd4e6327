//! Core record types for carshare.
//!
//! Users own cars, cars are listed as rentals, and each rental carries a
//! [`RentalStatus`] that only moves along the transitions in
//! [`RentalStatus::apply`].

mod car;
mod price;
mod rental;
pub mod timestamp;
mod user;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

pub use car::{Car, NewCar};
pub use price::Price;
pub use rental::{Rental, RentalChanges, RentalForm, RentalStatus, Transition};
pub use user::{NewUser, User};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

record_id!(
    /// Identifier of a [`User`].
    UserId
);
record_id!(
    /// Identifier of a [`Car`].
    CarId
);
record_id!(
    /// Identifier of a [`Rental`].
    RentalId
);
