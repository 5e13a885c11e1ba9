//! Error types for payment operations.

use crate::address::Address;
use crate::amount::Amount;
use thiserror::Error;

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors that can occur while moving value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Invalid amount literal or value.
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },

    /// Invalid address format.
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// Description of the address error.
        message: String,
    },

    /// Sender cannot cover the transfer.
    #[error("insufficient balance for {address}: have {have}, need {need}")]
    InsufficientBalance {
        /// Account being debited.
        address: Address,
        /// Current balance.
        have: Amount,
        /// Required balance.
        need: Amount,
    },

    /// Crediting the recipient would overflow its balance.
    #[error("balance overflow crediting {address}")]
    Overflow {
        /// Account being credited.
        address: Address,
    },

    /// The receiving account refused the value.
    #[error("transfer rejected by {recipient}: {reason}")]
    Rejected {
        /// Account whose receive hook refused.
        recipient: Address,
        /// Reason reported by the hook.
        reason: String,
    },
}

impl TokenError {
    /// Create an invalid amount error.
    #[must_use]
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }
}
