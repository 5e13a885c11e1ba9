//! CLI error types.

use std::fmt;

use shelf_registry::{ConfigError, RentalError};
use shelf_token::TokenError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(ConfigError),
    /// State file unreadable or malformed.
    State(String),
    /// The registry reverted the operation.
    Registry(RentalError),
    /// A ledger operation failed.
    Token(TokenError),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl CliError {
    /// Stable reason code for scripting.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::State(_) => "state",
            Self::Registry(e) => e.kind().as_str(),
            Self::Token(TokenError::InsufficientBalance { .. }) => "insufficient_funds",
            Self::Token(_) => "token",
            Self::Format(_) => "format",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Io(_) => "io",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::State(msg) => write!(f, "state error: {msg}"),
            Self::Registry(RentalError::TransferFailed(TokenError::InsufficientBalance { have, need, .. })) => {
                write!(f, "insufficient funds: have {have}, need {need}")
            }
            Self::Registry(e) => write!(f, "transaction reverted: {e}"),
            Self::Token(e) => write!(f, "ledger error: {e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Token(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<RentalError> for CliError {
    fn from(err: RentalError) -> Self {
        Self::Registry(err)
    }
}

impl From<TokenError> for CliError {
    fn from(err: TokenError) -> Self {
        Self::Token(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_registry::BookId;
    use shelf_token::{Address, Amount};

    #[test]
    fn cli_error_display_reverted() {
        let err = CliError::from(RentalError::NotAvailable { id: BookId::new(2) });
        assert_eq!(err.to_string(), "transaction reverted: Book is not available");
        assert_eq!(err.reason(), "not_available");
    }

    #[test]
    fn cli_error_display_insufficient_funds() {
        let err = CliError::from(RentalError::TransferFailed(TokenError::InsufficientBalance {
            address: Address::derive("broke"),
            have: Amount::ZERO,
            need: Amount::from_base_units(110_000_000_000_000_000),
        }));
        assert_eq!(err.to_string(), "insufficient funds: have 0 ETH, need 0.11 ETH");
        assert_eq!(err.reason(), "transfer_failed");
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
        assert_eq!(cli_err.reason(), "io");
    }
}
