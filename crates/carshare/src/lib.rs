//! `carshare` - Peer-to-peer car rental listings
//!
//! Owners register cars and list them for a time window at a price; other
//! users reserve open listings; either party can cancel. The
//! [`lifecycle::RentalManager`] is the only code that changes a rental's
//! status, and it does so with compare-and-swap writes through
//! [`lifecycle::RentalStore`].
//!
//! ```no_run
//! use carshare::identity;
//! use carshare::lifecycle::{LifecyclePolicy, RentalManager};
//! use carshare::Storage;
//!
//! # fn main() -> carshare::Result<()> {
//! let storage = Storage::open("carshare.db")?;
//! let renter = identity::sign_in(&storage, "morty", "foobar")?;
//! let manager = RentalManager::new(&storage, LifecyclePolicy::default());
//! if let Some(rental) = manager.browse(10)?.first() {
//!     manager.reserve(rental.id, &renter)?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod server;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use identity::Actor;
pub use lifecycle::{LifecyclePolicy, RentalManager, RentalStore};
pub use logging::init_logging;
pub use model::{Rental, RentalStatus};
pub use storage::{Storage, StorageStats};
