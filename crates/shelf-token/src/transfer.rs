//! Transfer types and the payment rail seam.

use crate::address::Address;
use crate::amount::Amount;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique transfer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(String);

impl TransferId {
    /// Create a new random transfer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("xfer-{}", Uuid::new_v4()))
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why value is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Value attached to a call, moving from the caller into the registry.
    EscrowDeposit,
    /// Overpayment returned to the renter at rent time.
    ExcessRefund,
    /// Rent paid out to the listing owner at return time.
    OwnerPayment,
    /// Unused deposit (plus any surplus) returned to the renter.
    RenterRefund,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EscrowDeposit => write!(f, "escrow_deposit"),
            Self::ExcessRefund => write!(f, "excess_refund"),
            Self::OwnerPayment => write!(f, "owner_payment"),
            Self::RenterRefund => write!(f, "renter_refund"),
        }
    }
}

/// A single value movement inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Purpose of the transfer.
    pub kind: TransferKind,
    /// Account debited.
    pub from: Address,
    /// Account credited.
    pub to: Address,
    /// Amount moved.
    pub amount: Amount,
}

impl Transfer {
    /// Create a new transfer.
    #[must_use]
    pub const fn new(kind: TransferKind, from: Address, to: Address, amount: Amount) -> Self {
        Self {
            kind,
            from,
            to,
            amount,
        }
    }
}

/// Proof that a transfer landed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Receipt identifier.
    pub id: TransferId,
    /// The executed transfer.
    pub transfer: Transfer,
    /// When the batch containing it committed.
    pub executed_at: DateTime<Utc>,
}

/// Moves value on behalf of the registry.
///
/// A batch is all-or-nothing: either every transfer lands and a receipt is
/// returned for each, or no balance changes at all and an error is returned.
/// Implementations may run recipient code while executing, so callers must
/// have finalized their own state before submitting a batch.
pub trait PaymentRail: Send + Sync {
    /// Executes a batch of transfers atomically.
    fn execute(&self, batch: &[Transfer]) -> Result<Vec<TransferReceipt>>;
}

impl<T: PaymentRail + ?Sized> PaymentRail for Arc<T> {
    fn execute(&self, batch: &[Transfer]) -> Result<Vec<TransferReceipt>> {
        (**self).execute(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_id_unique() {
        let id1 = TransferId::new();
        let id2 = TransferId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("xfer-"));
    }

    #[test]
    fn test_transfer_kind_display() {
        assert_eq!(TransferKind::EscrowDeposit.to_string(), "escrow_deposit");
        assert_eq!(TransferKind::OwnerPayment.to_string(), "owner_payment");
    }

    #[test]
    fn test_transfer_serialization() {
        let transfer = Transfer::new(
            TransferKind::RenterRefund,
            Address::derive("registry"),
            Address::derive("renter"),
            Amount::from_base_units(70),
        );
        let json = serde_json::to_string(&transfer).expect("serialize");
        assert!(json.contains("\"renter_refund\""));
        let parsed: Transfer = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, transfer);
    }
}
