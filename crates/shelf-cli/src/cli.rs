//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Shelf - rent books from your neighbours, settle by the minute.
#[derive(Parser, Debug, Clone)]
#[command(name = "shelf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// State file holding listings and balances.
    #[arg(short, long, env = "SHELF_STATE", default_value = "shelf-state.json")]
    pub state: PathBuf,

    /// Registry configuration file (JSON).
    #[arg(short, long, env = "SHELF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Credit an account from the faucet.
    Fund {
        /// Account name or base58 address.
        who: String,
        /// Amount in ETH, e.g. `0.5`.
        amount: String,
    },

    /// Show an account balance.
    Balance {
        /// Account name or base58 address.
        who: String,
    },

    /// List a book for rent.
    List(ListArgs),

    /// Rent a book.
    Rent {
        /// Renting account.
        #[arg(long = "as", value_name = "WHO")]
        who: String,
        /// Book id.
        id: u64,
        /// Payment attached, in ETH. Must cover one minute plus the deposit.
        #[arg(long)]
        pay: String,
        /// Rental start as Unix seconds. Defaults to now.
        #[arg(long)]
        at: Option<u64>,
    },

    /// Return a rented book and settle.
    Return {
        /// Returning account.
        #[arg(long = "as", value_name = "WHO")]
        who: String,
        /// Book id.
        id: u64,
        /// Extra payment in ETH, needed when rent exceeds the deposit.
        #[arg(long)]
        extra: Option<String>,
        /// Return time as Unix seconds. Defaults to now.
        #[arg(long)]
        at: Option<u64>,
    },

    /// Show one book.
    Show {
        /// Book id.
        id: u64,
    },

    /// List books.
    Books(BooksArgs),

    /// Preview the settlement for returning a book.
    Quote {
        /// Book id.
        id: u64,
        /// Return time as Unix seconds. Defaults to now.
        #[arg(long)]
        at: Option<u64>,
    },

    /// Show value held by the registry.
    Treasury,
}

/// Arguments for the list command.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Listing account.
    #[arg(long = "as", value_name = "WHO")]
    pub who: String,

    /// Book title.
    #[arg(long)]
    pub title: String,

    /// Book author.
    #[arg(long)]
    pub author: String,

    /// Description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Cover image reference.
    #[arg(long, default_value = "")]
    pub cover: String,

    /// Contact email.
    #[arg(long, default_value = "")]
    pub email: String,

    /// Rent per minute in ETH.
    #[arg(long)]
    pub price: String,

    /// Deposit in ETH.
    #[arg(long)]
    pub deposit: String,
}

/// Filters for the books command.
#[derive(Args, Debug, Clone, Default)]
pub struct BooksArgs {
    /// Only books owned by this account.
    #[arg(long)]
    pub owner: Option<String>,

    /// Only books rented by this account.
    #[arg(long, conflicts_with = "owner")]
    pub renter: Option<String>,

    /// Only books open for rent.
    #[arg(long, conflicts_with_all = ["owner", "renter"])]
    pub available: bool,
}
