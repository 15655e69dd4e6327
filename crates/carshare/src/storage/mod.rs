//! Storage layer for carshare.
//!
//! This module provides `SQLite`-based persistent storage for users, cars and
//! rentals. Status changes are written with conditional `UPDATE`/`DELETE`
//! statements keyed on the expected status, so the row count tells the
//! caller whether it won.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::lifecycle::RentalStore;
use crate::model::{
    timestamp, Car, CarId, NewCar, Price, Rental, RentalForm, RentalId, RentalStatus, User,
    UserId,
};

const USER_COLUMNS: &str = "id, username, email, credential_digest, signed_in_at, created_at";

const CAR_COLUMNS: &str = "id, owner_id, make, model, year, color, license_plate, created_at";

const RENTAL_COLUMNS: &str = "id, owner_id, renter_id, car_id, start_location, end_location, \
     start_time, end_time, price_cents, status, terms, created_at, updated_at";

/// Storage engine for carshare records.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Accounts with case-insensitive unique usernames
/// - Cars and the rentals listed for them
/// - Compare-and-swap status transitions
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert an account with an already-computed password hash.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the username is taken, or a database
    /// error.
    pub fn insert_user(&self, username: &str, email: &str, digest: &str) -> Result<User> {
        let now = Utc::now();
        let inserted = self.conn.execute(
            "INSERT INTO users (username, email, credential_digest, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![username, email, digest, now.to_rfc3339()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(Error::validation("username", "has already been taken"));
            }
            Err(err) => return Err(err.into()),
        }

        let id = UserId(self.conn.last_insert_rowid());
        debug!(user = %id, "Inserted user");
        self.user(id)?
            .ok_or_else(|| Error::internal(format!("user {id} vanished after insert")))
    }

    /// Look up a user by username, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                [username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Record a sign-in. Returns `false` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn touch_sign_in(&self, id: UserId, at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE users SET signed_in_at = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), id],
        )?;
        Ok(affected > 0)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };
        let by_status = |status: RentalStatus| -> Result<i64> {
            Ok(self.conn.query_row(
                "SELECT COUNT(*) FROM rentals WHERE status = ?1",
                [status],
                |row| row.get(0),
            )?)
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            users: count("SELECT COUNT(*) FROM users")?,
            cars: count("SELECT COUNT(*) FROM cars")?,
            available: by_status(RentalStatus::Available)?,
            reserved: by_status(RentalStatus::Reserved)?,
            canceled: by_status(RentalStatus::Canceled)?,
            db_size_bytes,
        })
    }

    fn rentals_where(&self, filter: &str, user: UserId) -> Result<Vec<Rental>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RENTAL_COLUMNS} FROM rentals WHERE {filter} ORDER BY start_time, id"
        ))?;
        let rentals = stmt
            .query_map([user], row_to_rental)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rentals)
    }
}

impl RentalStore for Storage {
    fn user(&self, id: UserId) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn car(&self, id: CarId) -> Result<Option<Car>> {
        let car = self
            .conn
            .query_row(
                &format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = ?1"),
                [id],
                row_to_car,
            )
            .optional()?;
        Ok(car)
    }

    fn cars_owned_by(&self, owner: UserId) -> Result<Vec<Car>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE owner_id = ?1 ORDER BY id"
        ))?;
        let cars = stmt
            .query_map([owner], row_to_car)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cars)
    }

    fn insert_car(&self, owner: UserId, car: &NewCar) -> Result<Car> {
        self.conn.execute(
            "INSERT INTO cars (owner_id, make, model, year, color, license_plate, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                owner,
                car.make,
                car.model,
                car.year,
                car.color,
                car.license_plate,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let id = CarId(self.conn.last_insert_rowid());
        debug!(car = %id, "Inserted car");
        self.car(id)?
            .ok_or_else(|| Error::internal(format!("car {id} vanished after insert")))
    }

    fn rental(&self, id: RentalId) -> Result<Option<Rental>> {
        let rental = self
            .conn
            .query_row(
                &format!("SELECT {RENTAL_COLUMNS} FROM rentals WHERE id = ?1"),
                [id],
                row_to_rental,
            )
            .optional()?;
        Ok(rental)
    }

    fn rentals_owned_by(&self, owner: UserId) -> Result<Vec<Rental>> {
        self.rentals_where("owner_id = ?1", owner)
    }

    fn rentals_rented_by(&self, renter: UserId) -> Result<Vec<Rental>> {
        self.rentals_where("renter_id = ?1", renter)
    }

    fn available_rentals(&self, limit: usize) -> Result<Vec<Rental>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RENTAL_COLUMNS} FROM rentals WHERE status = ?1 \
             ORDER BY start_time, id LIMIT ?2"
        ))?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let rentals = stmt
            .query_map(params![RentalStatus::Available, limit_i64], row_to_rental)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rentals)
    }

    fn insert_rental(&self, owner: UserId, form: &RentalForm) -> Result<Rental> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO rentals (owner_id, car_id, start_location, end_location, start_time, \
             end_time, price_cents, status, terms, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                owner,
                form.car_id,
                form.start_location,
                form.end_location,
                timestamp::to_seconds(&form.start_time),
                timestamp::to_seconds(&form.end_time),
                form.price.cents(),
                RentalStatus::Available,
                form.terms,
                now,
            ],
        )?;

        let id = RentalId(self.conn.last_insert_rowid());
        debug!(rental = %id, "Inserted rental");
        self.rental(id)?
            .ok_or_else(|| Error::internal(format!("rental {id} vanished after insert")))
    }

    fn update_rental(
        &self,
        id: RentalId,
        expected: RentalStatus,
        form: &RentalForm,
    ) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE rentals SET car_id = ?1, start_location = ?2, end_location = ?3, \
             start_time = ?4, end_time = ?5, price_cents = ?6, terms = ?7, updated_at = ?8 \
             WHERE id = ?9 AND status = ?10",
            params![
                form.car_id,
                form.start_location,
                form.end_location,
                timestamp::to_seconds(&form.start_time),
                timestamp::to_seconds(&form.end_time),
                form.price.cents(),
                form.terms,
                Utc::now().to_rfc3339(),
                id,
                expected,
            ],
        )?;
        Ok(affected > 0)
    }

    fn transition_rental(
        &self,
        id: RentalId,
        expected: RentalStatus,
        next: RentalStatus,
        renter: Option<UserId>,
    ) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE rentals SET status = ?1, renter_id = COALESCE(?2, renter_id), \
             updated_at = ?3 WHERE id = ?4 AND status = ?5",
            params![next, renter, Utc::now().to_rfc3339(), id, expected],
        )?;
        if affected > 0 {
            debug!(rental = %id, from = %expected, to = %next, "Swapped rental status");
        }
        Ok(affected > 0)
    }

    fn delete_rental(&self, id: RentalId, expected: RentalStatus) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM rentals WHERE id = ?1 AND status = ?2",
            params![id, expected],
        )?;
        Ok(affected > 0)
    }
}

impl ToSql for RentalStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RentalStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err: Error| FromSqlError::Other(err.to_string().into()))
    }
}

/// Counts of stored records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Registered accounts.
    pub users: i64,
    /// Registered cars.
    pub cars: i64,
    /// Rentals open for reservation.
    pub available: i64,
    /// Rentals currently reserved.
    pub reserved: i64,
    /// Canceled rentals still on record.
    pub canceled: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

impl StorageStats {
    /// Rentals in any status.
    #[must_use]
    pub fn rentals(&self) -> i64 {
        self.available + self.reserved + self.canceled
    }
}

fn conversion_error(column: usize, kind: Type, message: impl ToString) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, kind, message.to_string().into())
}

fn utc_column(row: &rusqlite::Row, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| conversion_error(column, Type::Text, err))
}

fn naive_column(row: &rusqlite::Row, column: usize) -> rusqlite::Result<NaiveDateTime> {
    let seconds: i64 = row.get(column)?;
    timestamp::from_seconds(seconds).ok_or_else(|| {
        conversion_error(column, Type::Integer, format!("timestamp out of range: {seconds}"))
    })
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let signed_in_at = match row.get::<_, Option<String>>(4)? {
        Some(_) => Some(utc_column(row, 4)?),
        None => None,
    };
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        credential_digest: row.get(3)?,
        signed_in_at,
        created_at: utc_column(row, 5)?,
    })
}

fn row_to_car(row: &rusqlite::Row) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        make: row.get(2)?,
        model: row.get(3)?,
        year: row.get(4)?,
        color: row.get(5)?,
        license_plate: row.get(6)?,
        created_at: utc_column(row, 7)?,
    })
}

fn row_to_rental(row: &rusqlite::Row) -> rusqlite::Result<Rental> {
    let price = Price::from_cents(row.get(8)?)
        .map_err(|err| conversion_error(8, Type::Integer, err))?;
    Ok(Rental {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        renter_id: row.get(2)?,
        car_id: row.get(3)?,
        start_location: row.get(4)?,
        end_location: row.get(5)?,
        start_time: naive_column(row, 6)?,
        end_time: naive_column(row, 7)?,
        price,
        status: row.get(9)?,
        terms: row.get(10)?,
        created_at: utc_column(row, 11)?,
        updated_at: utc_column(row, 12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn seed(storage: &Storage) -> (User, User, Car) {
        let owner = storage.insert_user("rick", "rick@example.com", "aa").unwrap();
        let renter = storage.insert_user("morty", "morty@example.com", "bb").unwrap();
        let car = storage
            .insert_car(
                owner.id,
                &NewCar {
                    make: "Ford".to_string(),
                    model: "Mustang".to_string(),
                    year: 2000,
                    color: "Red".to_string(),
                    license_plate: "8DEF234".to_string(),
                },
            )
            .unwrap();
        (owner, renter, car)
    }

    fn form(car: CarId, start: &str, end: &str) -> RentalForm {
        RentalForm {
            car_id: car,
            start_location: "Los Angeles".to_string(),
            end_location: "San Francisco".to_string(),
            start_time: timestamp::parse("start_time", start).unwrap(),
            end_time: timestamp::parse("end_time", end).unwrap(),
            price: Price::from_cents(18477).unwrap(),
            terms: String::new(),
        }
    }

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_insert_and_get_user() {
        let storage = create_test_storage();
        let user = storage.insert_user("rick", "rick@example.com", "digest").unwrap();

        let retrieved = storage.user(user.id).unwrap().unwrap();
        assert_eq!(retrieved, user);
        assert!(retrieved.signed_in_at.is_none());
    }

    #[test]
    fn test_duplicate_username_is_validation_error() {
        let storage = create_test_storage();
        storage.insert_user("rick", "rick@example.com", "a").unwrap();

        let err = storage.insert_user("RICK", "other@example.com", "b").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_user_by_username_ignores_case() {
        let storage = create_test_storage();
        let user = storage.insert_user("Rick", "rick@example.com", "a").unwrap();

        assert_eq!(storage.user_by_username("rICK").unwrap().unwrap().id, user.id);
        assert!(storage.user_by_username("morty").unwrap().is_none());
    }

    #[test]
    fn test_touch_sign_in() {
        let storage = create_test_storage();
        let user = storage.insert_user("rick", "rick@example.com", "a").unwrap();

        assert!(storage.touch_sign_in(user.id, Utc::now()).unwrap());
        assert!(storage.user(user.id).unwrap().unwrap().signed_in_at.is_some());
        assert!(!storage.touch_sign_in(UserId(999), Utc::now()).unwrap());
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.user(UserId(99999)).unwrap().is_none());
        assert!(storage.car(CarId(99999)).unwrap().is_none());
        assert!(storage.rental(RentalId(99999)).unwrap().is_none());
    }

    #[test]
    fn test_insert_car_requires_existing_owner() {
        let storage = create_test_storage();
        let car = NewCar {
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2010,
            color: "Blue".to_string(),
            license_plate: "ABC123".to_string(),
        };
        assert!(storage.insert_car(UserId(999), &car).is_err());
    }

    #[test]
    fn test_cars_owned_by() {
        let storage = create_test_storage();
        let (owner, renter, car) = seed(&storage);

        assert_eq!(storage.cars_owned_by(owner.id).unwrap(), vec![car]);
        assert!(storage.cars_owned_by(renter.id).unwrap().is_empty());
    }

    #[test]
    fn test_insert_rental_round_trips_fields() {
        let storage = create_test_storage();
        let (owner, _, car) = seed(&storage);
        let form = form(car.id, "2018-11-28 00:45:02", "2018-11-28 01:52:44");

        let rental = storage.insert_rental(owner.id, &form).unwrap();
        assert_eq!(rental.status, RentalStatus::Available);
        assert_eq!(rental.renter_id, None);
        assert_eq!(rental.form(), form);
        assert_eq!(storage.rental(rental.id).unwrap().unwrap(), rental);
    }

    #[test]
    fn test_transition_swaps_only_expected_status() {
        let storage = create_test_storage();
        let (owner, renter, car) = seed(&storage);
        let rental = storage
            .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
            .unwrap();

        assert!(storage
            .transition_rental(
                rental.id,
                RentalStatus::Available,
                RentalStatus::Reserved,
                Some(renter.id)
            )
            .unwrap());
        assert!(!storage
            .transition_rental(
                rental.id,
                RentalStatus::Available,
                RentalStatus::Reserved,
                Some(owner.id)
            )
            .unwrap());

        let stored = storage.rental(rental.id).unwrap().unwrap();
        assert_eq!(stored.status, RentalStatus::Reserved);
        assert_eq!(stored.renter_id, Some(renter.id));
    }

    #[test]
    fn test_transition_without_renter_keeps_renter() {
        let storage = create_test_storage();
        let (owner, renter, car) = seed(&storage);
        let rental = storage
            .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
            .unwrap();
        storage
            .transition_rental(
                rental.id,
                RentalStatus::Available,
                RentalStatus::Reserved,
                Some(renter.id),
            )
            .unwrap();

        assert!(storage
            .transition_rental(rental.id, RentalStatus::Reserved, RentalStatus::Canceled, None)
            .unwrap());
        let stored = storage.rental(rental.id).unwrap().unwrap();
        assert_eq!(stored.status, RentalStatus::Canceled);
        assert_eq!(stored.renter_id, Some(renter.id));
    }

    #[test]
    fn test_schema_rejects_reserved_without_renter() {
        let storage = create_test_storage();
        let (owner, _, car) = seed(&storage);
        let rental = storage
            .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
            .unwrap();

        let result = storage.transition_rental(
            rental.id,
            RentalStatus::Available,
            RentalStatus::Reserved,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_rejects_owner_as_renter() {
        let storage = create_test_storage();
        let (owner, _, car) = seed(&storage);
        let rental = storage
            .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
            .unwrap();

        let result = storage.transition_rental(
            rental.id,
            RentalStatus::Available,
            RentalStatus::Reserved,
            Some(owner.id),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_update_rental_checks_status() {
        let storage = create_test_storage();
        let (owner, _, car) = seed(&storage);
        let rental = storage
            .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
            .unwrap();
        let mut changed = rental.form();
        changed.end_location = "St. Paul".to_string();

        assert!(!storage
            .update_rental(rental.id, RentalStatus::Reserved, &changed)
            .unwrap());
        assert!(storage
            .update_rental(rental.id, RentalStatus::Available, &changed)
            .unwrap());
        assert_eq!(
            storage.rental(rental.id).unwrap().unwrap().end_location,
            "St. Paul"
        );
    }

    #[test]
    fn test_delete_rental_checks_status() {
        let storage = create_test_storage();
        let (owner, _, car) = seed(&storage);
        let rental = storage
            .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
            .unwrap();

        assert!(!storage.delete_rental(rental.id, RentalStatus::Canceled).unwrap());
        assert!(storage.delete_rental(rental.id, RentalStatus::Available).unwrap());
        assert!(storage.rental(rental.id).unwrap().is_none());
        assert!(!storage.delete_rental(rental.id, RentalStatus::Available).unwrap());
    }

    #[test]
    fn test_available_rentals_sorted_and_limited() {
        let storage = create_test_storage();
        let (owner, renter, car) = seed(&storage);
        let later = storage
            .insert_rental(owner.id, &form(car.id, "2030-03-01 10:00", "2030-03-02 10:00"))
            .unwrap();
        let sooner = storage
            .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
            .unwrap();
        let taken = storage
            .insert_rental(owner.id, &form(car.id, "2029-01-01 10:00", "2029-01-02 10:00"))
            .unwrap();
        storage
            .transition_rental(
                taken.id,
                RentalStatus::Available,
                RentalStatus::Reserved,
                Some(renter.id),
            )
            .unwrap();

        let ids: Vec<_> = storage
            .available_rentals(10)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![sooner.id, later.id]);
        assert_eq!(storage.available_rentals(1).unwrap().len(), 1);
        assert!(storage.available_rentals(0).unwrap().is_empty());

        assert_eq!(storage.rentals_rented_by(renter.id).unwrap()[0].id, taken.id);
        assert_eq!(storage.rentals_owned_by(owner.id).unwrap().len(), 3);
    }

    #[test]
    fn test_available_rentals_sort_past_year_9999() {
        let storage = create_test_storage();
        let (owner, _, car) = seed(&storage);
        let far = storage
            .insert_rental(
                owner.id,
                &form(car.id, "10000-01-01 00:00", "210294-10-18 20:20:37"),
            )
            .unwrap();
        let near = storage
            .insert_rental(owner.id, &form(car.id, "9999-12-31 10:00", "9999-12-31 11:00"))
            .unwrap();

        let ids: Vec<_> = storage
            .available_rentals(10)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![near.id, far.id]);
        assert_eq!(
            timestamp::format(&storage.rental(far.id).unwrap().unwrap().end_time),
            "+210294-10-18T20:20:37"
        );
    }

    #[test]
    fn test_corrupt_status_is_conversion_error() {
        let storage = create_test_storage();
        let (owner, _, car) = seed(&storage);
        let rental = storage
            .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
            .unwrap();
        storage
            .conn
            .execute_batch("PRAGMA ignore_check_constraints = ON;")
            .unwrap();
        storage
            .conn
            .execute(
                "UPDATE rentals SET status = 'upcoming' WHERE id = ?1",
                [rental.id],
            )
            .unwrap();

        assert!(storage.rental(rental.id).is_err());
    }

    #[test]
    fn test_stats_counts_by_status() {
        let storage = create_test_storage();
        let (owner, renter, car) = seed(&storage);
        for _ in 0..2 {
            storage
                .insert_rental(owner.id, &form(car.id, "2030-01-01 10:00", "2030-01-02 10:00"))
                .unwrap();
        }
        storage
            .transition_rental(
                RentalId(1),
                RentalStatus::Available,
                RentalStatus::Reserved,
                Some(renter.id),
            )
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.users, 2);
        assert_eq!(stats.cars, 1);
        assert_eq!(stats.available, 1);
        assert_eq!(stats.reserved, 1);
        assert_eq!(stats.canceled, 0);
        assert_eq!(stats.rentals(), 2);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = std::env::temp_dir();
        let nested_path = temp_dir.join(format!(
            "carshare_test_{}/nested/db.sqlite",
            std::process::id()
        ));

        if let Some(parent) = nested_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());
        assert_eq!(storage.path(), nested_path);
        seed(&storage);
        assert!(storage.stats().unwrap().db_size_bytes > 0);

        drop(storage);
        if let Some(parent) = nested_path.parent() {
            let _ = std::fs::remove_dir_all(parent.parent().unwrap());
        }
    }

    #[test]
    fn test_reopen_keeps_records() {
        let db_path = std::env::temp_dir().join(format!(
            "carshare_reopen_test_{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&db_path);

        let storage = Storage::open(&db_path).unwrap();
        let (owner, _, _) = seed(&storage);
        drop(storage);

        let storage = Storage::open(&db_path).unwrap();
        assert_eq!(storage.user(owner.id).unwrap().unwrap().username, "rick");

        drop(storage);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }
}
