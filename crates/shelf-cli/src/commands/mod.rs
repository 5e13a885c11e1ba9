//! CLI command implementations.
//!
//! Each submodule implements a group of CLI commands:
//! - [`account`] - Faucet funding, balances and the registry treasury
//! - [`book`] - Listing and browsing books
//! - [`rental`] - Renting, returning and settlement quotes

pub mod account;
pub mod book;
pub mod rental;

pub use account::AccountCommand;
pub use book::BookCommand;
pub use rental::RentalCommand;

use shelf_registry::{Clock, SystemClock, Timestamp};
use shelf_token::Amount;

use crate::error::CliError;

/// Parse an ETH amount argument.
fn parse_amount(field: &str, text: &str) -> Result<Amount, CliError> {
    Amount::parse(text).map_err(|e| CliError::InvalidArgument(format!("{field}: {e}")))
}

/// The `--at` override, or the wall clock.
fn timestamp_or_now(at: Option<u64>) -> Timestamp {
    at.map_or_else(|| SystemClock.now(), Timestamp::from_unix_secs)
}
