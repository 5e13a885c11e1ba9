//! Error types for registry operations.
//!
//! Every failure aborts the whole operation with no partial mutation. The
//! `Display` text mirrors the contract's revert reasons; [`ErrorKind`] is the
//! stable code callers should match on.

use crate::clock::Timestamp;
use crate::store::BookId;
use serde::{Deserialize, Serialize};
use shelf_token::{Address, Amount, TokenError};
use std::fmt;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RentalError>;

/// Errors that can occur in registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RentalError {
    /// A listing field failed validation.
    #[error("{reason}")]
    InvalidInput {
        /// Offending field.
        field: &'static str,
        /// Revert reason.
        reason: String,
    },

    /// No listing with this id.
    #[error("Invalid book ID: {id}")]
    NotFound {
        /// Requested id.
        id: BookId,
    },

    /// The listing is currently rented.
    #[error("Book is not available")]
    NotAvailable {
        /// Listing id.
        id: BookId,
    },

    /// The owner tried to rent their own listing.
    #[error("Cannot rent your own book")]
    SelfRental {
        /// Listing id.
        id: BookId,
    },

    /// Attached value does not cover price plus deposit.
    #[error("Insufficient payment: required {required}, provided {provided}")]
    InsufficientPayment {
        /// Minimum payment.
        required: Amount,
        /// Value attached.
        provided: Amount,
    },

    /// Return attempted on a listing that is not rented.
    #[error("Book is not currently rented")]
    NotRented {
        /// Listing id.
        id: BookId,
    },

    /// Return attempted by someone other than the renter.
    #[error("Only renter can return the book")]
    NotRenter {
        /// Listing id.
        id: BookId,
        /// Who tried.
        caller: Address,
    },

    /// Rent owed exceeds the deposit and the caller did not cover the gap.
    #[error("Insufficient extra payment: required {required}, provided {provided}")]
    InsufficientExtraPayment {
        /// Extra value due.
        required: Amount,
        /// Extra value attached.
        provided: Amount,
    },

    /// An outbound transfer failed; the operation was rolled back.
    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] TokenError),

    /// A registry operation was invoked while another was in flight on the
    /// same call stack.
    #[error("Reentrant call rejected")]
    Reentrant,

    /// The supplied clock reading precedes the rental start.
    #[error("Clock went backwards: rental started at {start}, now is {now}")]
    ClockRegression {
        /// Rental start.
        start: Timestamp,
        /// Supplied time.
        now: Timestamp,
    },

    /// Monetary arithmetic overflowed or underflowed.
    #[error("Arithmetic overflow in {operation}")]
    Arithmetic {
        /// Which computation failed.
        operation: &'static str,
    },
}

impl RentalError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Create an arithmetic error.
    #[must_use]
    pub const fn arithmetic(operation: &'static str) -> Self {
        Self::Arithmetic { operation }
    }

    /// The stable category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotAvailable { .. } => ErrorKind::NotAvailable,
            Self::SelfRental { .. } => ErrorKind::SelfRental,
            Self::InsufficientPayment { .. } => ErrorKind::InsufficientPayment,
            Self::NotRented { .. } => ErrorKind::NotRented,
            Self::NotRenter { .. } => ErrorKind::NotRenter,
            Self::InsufficientExtraPayment { .. } => ErrorKind::InsufficientExtraPayment,
            Self::TransferFailed(_) => ErrorKind::TransferFailed,
            Self::Reentrant => ErrorKind::Reentrant,
            Self::ClockRegression { .. } => ErrorKind::ClockRegression,
            Self::Arithmetic { .. } => ErrorKind::Arithmetic,
        }
    }
}

/// Stable error categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad listing fields.
    InvalidInput,
    /// Unknown book id (`InvalidBookId` at the contract boundary).
    NotFound,
    /// Listing already rented.
    NotAvailable,
    /// Owner renting own listing.
    SelfRental,
    /// Rent payment too small.
    InsufficientPayment,
    /// Listing not rented.
    NotRented,
    /// Caller is not the renter.
    NotRenter,
    /// Return payment too small.
    InsufficientExtraPayment,
    /// Outbound transfer failed.
    TransferFailed,
    /// Nested call during a transfer.
    Reentrant,
    /// Clock reading earlier than rental start.
    ClockRegression,
    /// Overflow or underflow.
    Arithmetic,
}

impl ErrorKind {
    /// Returns the reason code for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "invalid_book_id",
            Self::NotAvailable => "not_available",
            Self::SelfRental => "self_rental",
            Self::InsufficientPayment => "insufficient_payment",
            Self::NotRented => "not_rented",
            Self::NotRenter => "not_renter",
            Self::InsufficientExtraPayment => "insufficient_extra_payment",
            Self::TransferFailed => "transfer_failed",
            Self::Reentrant => "reentrant_call",
            Self::ClockRegression => "clock_regression",
            Self::Arithmetic => "arithmetic_overflow",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
