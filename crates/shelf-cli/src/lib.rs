//! # shelf-cli
//!
//! Command-line interface for a local Shelf book-rental registry.
//!
//! Provides commands for:
//! - Funding accounts and checking balances
//! - Listing and browsing books
//! - Renting, returning and quoting settlements
//!
//! # Architecture
//!
//! Each invocation loads a JSON state file, applies one command to an
//! in-process registry and ledger, and writes the state back.
//!
//! ```text
//! ┌───────────┐   load / save    ┌──────────────────┐
//! │ shelf-cli │◄────────────────►│ shelf-state.json │
//! └─────┬─────┘                  └──────────────────┘
//!       │ calls
//!       ▼
//! ┌────────────────┐   transfers   ┌────────────────┐
//! │ shelf-registry │──────────────►│  shelf-token   │
//! └────────────────┘               └────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod state;

pub use cli::{BooksArgs, Cli, Commands, Format, ListArgs};
pub use error::CliError;
pub use output::OutputFormat;
pub use state::{Session, ShelfState};

use std::io::Write;

use shelf_registry::RegistryConfig;

use commands::{AccountCommand, BookCommand, RentalCommand};

/// Run one parsed command, writing its output to `writer`.
///
/// # Errors
///
/// Returns an error if configuration or state cannot be loaded, or if the
/// command fails.
pub fn run<W: Write>(cli: Cli, writer: &mut W) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => RegistryConfig::from_json_file(path)?,
        None => RegistryConfig::default(),
    };
    let format = OutputFormat::new(cli.format);
    let mut session = Session::open(&cli.state, config)?;

    match cli.command {
        Commands::Fund { who, amount } => {
            AccountCommand::new(&mut session).fund(writer, &format, &who, &amount)?;
        }
        Commands::Balance { who } => {
            AccountCommand::new(&mut session).balance(writer, &format, &who)?;
        }
        Commands::Treasury => {
            AccountCommand::new(&mut session).treasury(writer, &format)?;
        }
        Commands::List(args) => {
            BookCommand::new(&mut session).list(writer, &format, &args)?;
        }
        Commands::Show { id } => {
            BookCommand::new(&mut session).show(writer, &format, id)?;
        }
        Commands::Books(args) => {
            BookCommand::new(&mut session).books(writer, &format, &args)?;
        }
        Commands::Rent { who, id, pay, at } => {
            RentalCommand::new(&mut session).rent(writer, &format, &who, id, &pay, at)?;
        }
        Commands::Return { who, id, extra, at } => {
            RentalCommand::new(&mut session).return_book(writer, &format, &who, id, extra.as_deref(), at)?;
        }
        Commands::Quote { id, at } => {
            RentalCommand::new(&mut session).quote(writer, &format, id, at)?;
        }
    }

    Ok(())
}
