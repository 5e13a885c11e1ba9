//! # shelf-token
//!
//! Payment substrate for the Shelf book-rental registry.
//!
//! This crate provides:
//! - Fixed-point amounts of the native asset (no floating point)
//! - Account addresses, including the zero-address sentinel
//! - Transfer batches and the [`PaymentRail`] seam the registry pays through
//! - An in-memory ledger that simulates chain balances and receive hooks
//!
//! ## Asset Details
//!
//! - **Symbol**: ETH (chain-native asset)
//! - **Decimals**: 18 (1 ETH = 10^18 base units)
//!
//! ## Example
//!
//! ```rust
//! use shelf_token::{Address, Amount, InMemoryLedger, PaymentRail, Transfer, TransferKind};
//!
//! # fn example() -> shelf_token::Result<()> {
//! let ledger = InMemoryLedger::new();
//! let alice = Address::derive("alice");
//! let bob = Address::derive("bob");
//! ledger.fund(&alice, Amount::parse("1")?)?;
//!
//! let batch = [Transfer::new(TransferKind::OwnerPayment, alice.clone(), bob.clone(), Amount::parse("0.25")?)];
//! ledger.execute(&batch)?;
//! assert_eq!(ledger.balance(&bob), Amount::parse("0.25")?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod amount;
pub mod error;
pub mod ledger;
pub mod transfer;

pub use address::Address;
pub use amount::Amount;
pub use error::{Result, TokenError};
pub use ledger::{InMemoryLedger, LedgerSnapshot, Recipient};
pub use transfer::{PaymentRail, Transfer, TransferId, TransferKind, TransferReceipt};

/// Native asset symbol.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Native asset decimals.
pub const NATIVE_DECIMALS: u32 = 18;

/// One whole coin in base units.
pub const BASE_UNITS_PER_COIN: u128 = 1_000_000_000_000_000_000;
