//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::error::Result;
use crate::model::{timestamp, CarId, NewCar, RentalChanges, RentalForm};

/// Account commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create an account; the password comes from --password
    Register {
        /// Username to register
        username: String,

        /// Contact email address
        #[arg(short, long)]
        email: String,
    },

    /// Show your cars, listings and reservations
    Overview {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Car commands.
#[derive(Debug, Subcommand)]
pub enum CarCommand {
    /// Register one of your cars
    Add(CarArgs),

    /// List your cars
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Car registration arguments.
#[derive(Debug, Clone, Args)]
pub struct CarArgs {
    /// Manufacturer, e.g. Ford
    #[arg(long)]
    pub make: String,

    /// Model, e.g. Mustang
    #[arg(long)]
    pub model: String,

    /// Model year
    #[arg(long)]
    pub year: i32,

    /// Exterior color
    #[arg(long)]
    pub color: String,

    /// License plate
    #[arg(long)]
    pub plate: String,
}

impl From<CarArgs> for NewCar {
    fn from(args: CarArgs) -> Self {
        Self {
            make: args.make,
            model: args.model,
            year: args.year,
            color: args.color,
            license_plate: args.plate,
        }
    }
}

/// Rental commands.
#[derive(Debug, Subcommand)]
pub enum RentalCommand {
    /// List one of your cars for a time window
    New(NewRentalArgs),

    /// Change a listing you own
    Edit {
        /// Rental id
        id: i64,

        /// Fields to change
        #[command(flatten)]
        changes: EditRentalArgs,
    },

    /// Show one rental
    Show {
        /// Rental id
        id: i64,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Browse open listings, soonest first
    List {
        /// Maximum number of listings (defaults to listing.page_size)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Reserve an open listing
    Rent {
        /// Rental id
        id: i64,
    },

    /// Cancel a listing or your reservation
    Cancel {
        /// Rental id
        id: i64,
    },

    /// Delete a listing you own
    Delete {
        /// Rental id
        id: i64,
    },
}

/// Arguments for a new listing.
#[derive(Debug, Clone, Args)]
pub struct NewRentalArgs {
    /// Id of the car to list
    #[arg(long)]
    pub car: i64,

    /// Pickup location
    #[arg(long = "from")]
    pub start_location: String,

    /// Drop-off location
    #[arg(long = "to")]
    pub end_location: String,

    /// Window start, e.g. "2030-11-28 09:00"
    #[arg(long)]
    pub start: String,

    /// Window end
    #[arg(long)]
    pub end: String,

    /// Price for the whole window, e.g. 184.77
    #[arg(long)]
    pub price: String,

    /// Conditions for the renter
    #[arg(long, default_value = "")]
    pub terms: String,
}

impl NewRentalArgs {
    /// Parse the raw arguments into a form.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unparseable time or price.
    pub fn into_form(self) -> Result<RentalForm> {
        Ok(RentalForm {
            car_id: CarId(self.car),
            start_location: self.start_location,
            end_location: self.end_location,
            start_time: timestamp::parse("start_time", &self.start)?,
            end_time: timestamp::parse("end_time", &self.end)?,
            price: self.price.parse()?,
            terms: self.terms,
        })
    }
}

/// Fields to change on a listing; omitted ones are kept.
#[derive(Debug, Clone, Args)]
pub struct EditRentalArgs {
    /// New car id
    #[arg(long)]
    pub car: Option<i64>,

    /// New pickup location
    #[arg(long = "from")]
    pub start_location: Option<String>,

    /// New drop-off location
    #[arg(long = "to")]
    pub end_location: Option<String>,

    /// New window start
    #[arg(long)]
    pub start: Option<String>,

    /// New window end
    #[arg(long)]
    pub end: Option<String>,

    /// New price
    #[arg(long)]
    pub price: Option<String>,

    /// New terms
    #[arg(long)]
    pub terms: Option<String>,
}

impl EditRentalArgs {
    /// Parse the raw arguments into a partial update.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unparseable time or price.
    pub fn into_changes(self) -> Result<RentalChanges> {
        Ok(RentalChanges {
            car_id: self.car.map(CarId),
            start_location: self.start_location,
            end_location: self.end_location,
            start_time: self
                .start
                .map(|s| timestamp::parse("start_time", &s))
                .transpose()?,
            end_time: self
                .end
                .map(|s| timestamp::parse("end_time", &s))
                .transpose()?,
            price: self.price.map(|p| p.parse()).transpose()?,
            terms: self.terms,
        })
    }
}

/// Server arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Override server.bind
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
