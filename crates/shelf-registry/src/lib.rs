//! # shelf-registry
//!
//! Book rental registry with escrowed deposits and per-minute billing.
//!
//! This crate provides:
//!
//! - An append-only listing store
//! - Escrow accounting for rent, refunds and shortfalls
//! - Rent and return settlement that refuses reentrant calls
//! - Committed-only event publishing
//! - A call-context facade matching the contract ABI
//!
//! ## Example
//!
//! ```rust
//! use shelf_registry::{NewListing, RegistryConfig, RentalRegistry, Timestamp};
//! use shelf_token::{Address, Amount, InMemoryLedger};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = Arc::new(InMemoryLedger::new());
//! let registry = RentalRegistry::new(RegistryConfig::default(), Arc::clone(&ledger))?;
//! let (owner, renter) = (Address::derive("owner"), Address::derive("renter"));
//! ledger.fund(&renter, Amount::parse("1")?)?;
//!
//! let id = registry.create_listing(
//!     NewListing {
//!         title: "Dune".into(),
//!         author: "Frank Herbert".into(),
//!         price_per_minute: Amount::parse("0.01")?,
//!         deposit: Amount::parse("0.1")?,
//!         ..NewListing::default()
//!     },
//!     &owner,
//! )?;
//! registry.rent_item(id, &renter, Amount::parse("0.11")?, Timestamp::from_unix_secs(0))?;
//! let receipt = registry.return_item(id, &renter, Amount::ZERO, Timestamp::from_unix_secs(180))?;
//! assert_eq!(receipt.payout.renter_refund, Amount::parse("0.07")?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod contract;
pub mod error;
pub mod escrow;
pub mod events;
pub mod guard;
pub mod registry;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{ConfigError, RegistryConfig};
pub use contract::{BookRentalContract, BookSummary, BookView, CallContext};
pub use error::{ErrorKind, RentalError, Result};
pub use escrow::{Payout, Settlement};
pub use events::{EventRecord, EventSink, MemoryEventSink, NoopEventSink, RegistryEvent, TracingEventSink};
pub use guard::TransferGuard;
pub use registry::{RegistrySnapshot, RentReceipt, RentalRegistry, ReturnQuote, ReturnReceipt, Treasury};
pub use store::{Book, BookId, ListingStore, NewListing, Occupancy};
