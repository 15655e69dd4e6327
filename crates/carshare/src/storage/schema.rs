//! `SQLite` schema definitions for carshare.
//!
//! Table constraints restate the record invariants so a buggy caller cannot
//! persist an inconsistent rental.

/// SQL statement to create the users table.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email TEXT NOT NULL,
    credential_digest TEXT NOT NULL,
    signed_in_at TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the cars table.
pub const CREATE_CARS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS cars (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    make TEXT NOT NULL,
    model TEXT NOT NULL,
    year INTEGER NOT NULL,
    color TEXT NOT NULL,
    license_plate TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the rentals table.
pub const CREATE_RENTALS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rentals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    renter_id INTEGER REFERENCES users(id),
    car_id INTEGER NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
    start_location TEXT NOT NULL,
    end_location TEXT NOT NULL,
    start_time INTEGER NOT NULL,
    end_time INTEGER NOT NULL,
    price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
    status TEXT NOT NULL CHECK (status IN ('available', 'reserved', 'canceled')),
    terms TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (end_time > start_time),
    CHECK (renter_id IS NULL OR renter_id <> owner_id),
    CHECK (status <> 'available' OR renter_id IS NULL),
    CHECK (status <> 'reserved' OR renter_id IS NOT NULL)
)
";

/// SQL statement to create an index on the car owner.
pub const CREATE_CAR_OWNER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_cars_owner ON cars(owner_id)
";

/// SQL statement to create an index on the rental owner.
pub const CREATE_RENTAL_OWNER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rentals_owner ON rentals(owner_id)
";

/// SQL statement to create an index on the renter.
pub const CREATE_RENTAL_RENTER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rentals_renter ON rentals(renter_id)
";

/// SQL statement to create an index for browsing open listings.
pub const CREATE_RENTAL_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rentals_status_start ON rentals(status, start_time)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_CARS_TABLE,
    CREATE_RENTALS_TABLE,
    CREATE_CAR_OWNER_INDEX,
    CREATE_RENTAL_OWNER_INDEX,
    CREATE_RENTAL_RENTER_INDEX,
    CREATE_RENTAL_STATUS_INDEX,
    CREATE_METADATA_TABLE,
];
