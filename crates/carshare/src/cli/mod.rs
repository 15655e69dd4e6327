//! Command-line interface for carshare.
//!
//! This module provides the CLI structure for the `carshare` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CarArgs, CarCommand, ConfigCommand, EditRentalArgs, NewRentalArgs, RentalCommand,
    ServeCommand, StatusCommand, UserCommand,
};

use crate::error::{Error, Result};
use crate::logging::Verbosity;

/// carshare - List your car, rent someone else's
///
/// Peer-to-peer car rental listings: owners list cars for a time window,
/// renters reserve them, and either side can cancel.
#[derive(Debug, Parser)]
#[command(name = "carshare")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Username to act as
    #[arg(short, long, global = true, env = "CARSHARE_USER")]
    pub user: Option<String>,

    /// Password for --user
    #[arg(long, global = true, env = "CARSHARE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Manage your cars
    #[command(subcommand)]
    Car(CarCommand),

    /// List, reserve and cancel rentals
    #[command(subcommand)]
    Rental(RentalCommand),

    /// Serve the JSON API
    Serve(ServeCommand),

    /// Show database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// The `--user` and `--password` pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] if either is missing.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) => Ok((user, password)),
            _ => Err(Error::Unauthenticated),
        }
    }

    /// The `--password` value alone, for registration.
    ///
    /// # Errors
    ///
    /// Returns a validation error if it is missing.
    pub fn password(&self) -> Result<&str> {
        self.password
            .as_deref()
            .ok_or_else(|| Error::validation("password", "is required (--password)"))
    }
}
