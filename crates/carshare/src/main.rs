//! `carshare` - CLI for peer-to-peer car rentals
//!
//! This binary lists, reserves and cancels rentals against the local
//! database, or serves the same operations as a JSON API.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::error;

use carshare::cli::{
    CarCommand, Cli, Command, ConfigCommand, RentalCommand, ServeCommand, UserCommand,
};
use carshare::display::{self, Outcome};
use carshare::identity::{self, Actor};
use carshare::lifecycle::{RentalManager, RentalStore};
use carshare::model::{NewUser, Rental, RentalId};
use carshare::{init_logging, server, Config, Error, Result, Storage};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !err.is_user_facing() {
                error!("{err}");
            }
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load_from(cli.config.clone())?;

    match &cli.command {
        Command::User(cmd) => handle_user(&cli, &config, cmd),
        Command::Car(cmd) => handle_car(&cli, &config, cmd),
        Command::Rental(cmd) => handle_rental(&cli, &config, cmd),
        Command::Serve(cmd) => handle_serve(config, cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Open storage and sign in as `--user`.
fn session(cli: &Cli, config: &Config) -> Result<(Storage, Actor)> {
    let (username, password) = cli.credentials()?;
    let storage = Storage::open(config.database_path())?;
    let actor = identity::sign_in(&storage, username, password)?;
    Ok((storage, actor))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_user(cli: &Cli, config: &Config, cmd: &UserCommand) -> Result<()> {
    match cmd {
        UserCommand::Register { username, email } => {
            let storage = Storage::open(config.database_path())?;
            let user = identity::register(
                &storage,
                NewUser::new(username, email, cli.password()?),
            )?;
            println!("Registered {} (id {}).", user.username, user.id);
        }
        UserCommand::Overview { json } => {
            let (storage, actor) = session(cli, config)?;
            let overview = RentalManager::new(&storage, config.policy).overview(actor.user_id)?;
            if *json {
                return print_json(&overview);
            }
            println!("{} <{}>", overview.user.username, overview.user.email);
            println!();
            println!("Cars:");
            for car in &overview.cars {
                println!("  #{} {}", car.id, display::car_option_label(car));
            }
            println!("Listings:");
            for rental in &overview.listings {
                println!("  {}", display::rental_line(rental));
            }
            println!("Reservations:");
            for rental in &overview.reservations {
                println!("  {}", display::rental_line(rental));
            }
        }
    }
    Ok(())
}

fn handle_car(cli: &Cli, config: &Config, cmd: &CarCommand) -> Result<()> {
    let (storage, actor) = session(cli, config)?;
    let manager = RentalManager::new(&storage, config.policy);

    match cmd {
        CarCommand::Add(args) => {
            let car = manager.register_car(&actor, args.clone().into())?;
            println!("Registered #{} {}.", car.id, display::car_option_label(&car));
        }
        CarCommand::List { json } => {
            let cars = manager.cars_for(&actor)?;
            if *json {
                return print_json(&cars);
            }
            if cars.is_empty() {
                println!("No cars registered.");
            }
            for car in &cars {
                println!("#{} {} ({})", car.id, display::car_option_label(car), car.license_plate);
            }
        }
    }
    Ok(())
}

fn handle_rental(cli: &Cli, config: &Config, cmd: &RentalCommand) -> Result<()> {
    // Reading listings needs no account.
    match cmd {
        RentalCommand::Show { id, json } => {
            let storage = Storage::open(config.database_path())?;
            let rental = RentalManager::new(&storage, config.policy).show(RentalId(*id))?;
            return if *json {
                print_json(&rental)
            } else {
                print_rental(&storage, &rental)
            };
        }
        RentalCommand::List { limit, json } => {
            let storage = Storage::open(config.database_path())?;
            let limit = limit.unwrap_or(config.listing.page_size);
            let rentals = RentalManager::new(&storage, config.policy).browse(limit)?;
            if *json {
                return print_json(&rentals);
            }
            if rentals.is_empty() {
                println!("No rentals available.");
            }
            for rental in &rentals {
                println!("{}", display::rental_line(rental));
            }
            return Ok(());
        }
        _ => {}
    }

    let (storage, actor) = session(cli, config)?;
    let manager = RentalManager::new(&storage, config.policy);
    let (rental, outcome) = match cmd {
        RentalCommand::New(args) => (
            manager.create(&actor, args.clone().into_form()?)?,
            Outcome::Created,
        ),
        RentalCommand::Edit { id, changes } => (
            manager.update(RentalId(*id), &actor, changes.clone().into_changes()?)?,
            Outcome::Updated,
        ),
        RentalCommand::Rent { id } => (manager.reserve(RentalId(*id), &actor)?, Outcome::Reserved),
        RentalCommand::Cancel { id } => (manager.cancel(RentalId(*id), &actor)?, Outcome::Canceled),
        RentalCommand::Delete { id } => (manager.delete(RentalId(*id), &actor)?, Outcome::Deleted),
        RentalCommand::Show { .. } | RentalCommand::List { .. } => {
            return Err(Error::internal("read commands handled above"));
        }
    };

    println!("{}", outcome.notice());
    print_rental(&storage, &rental)
}

fn print_rental(storage: &Storage, rental: &Rental) -> Result<()> {
    println!("Rental #{}  [{}]", rental.id, display::status_label(rental.status));
    let car = storage.car(rental.car_id)?;
    let owner = storage.user(rental.owner_id)?;
    if let (Some(car), Some(owner)) = (car, owner) {
        println!("  {}", display::listed_by(&car, &owner));
    }
    println!("  {} -> {}", rental.start_location, rental.end_location);
    println!("  {}", display::time_window(&rental.start_time, &rental.end_time));
    println!("  Price: {}", display::price_tag(rental.price));
    if !rental.terms.is_empty() {
        println!("  Terms: {}", rental.terms);
    }
    Ok(())
}

fn handle_serve(mut config: Config, cmd: &ServeCommand) -> Result<()> {
    if let Some(bind) = &cmd.bind {
        config.server.bind.clone_from(bind);
        config.validate()?;
    }
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(&config))
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let storage = Storage::open(config.database_path())?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "stats": stats,
            "policy": config.policy,
        });
        return print_json(&status);
    }

    println!("carshare status");
    println!("---------------");
    println!("Database:      {}", storage.path().display());
    println!("Size:          {} bytes", stats.db_size_bytes);
    println!("Users:         {}", stats.users);
    println!("Cars:          {}", stats.cars);
    println!(
        "Rentals:       {} ({} available, {} reserved, {} canceled)",
        stats.rentals(),
        stats.available,
        stats.reserved,
        stats.canceled
    );
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                return print_json(config);
            }
            println!("Current Configuration");
            println!("=====================");
            println!();
            println!("[Storage]");
            println!("  Database path:           {}", config.database_path().display());
            println!();
            println!("[Policy]");
            println!("  Delete requires cancel:  {}", config.policy.delete_requires_cancel);
            println!("  Edit after cancel:       {}", config.policy.allow_edit_after_cancel);
            println!();
            println!("[Server]");
            println!("  Bind:                    {}", config.server.bind);
            println!();
            println!("[Listing]");
            println!("  Page size:               {}", config.listing.page_size);
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.clone().unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
