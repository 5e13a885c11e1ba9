//! Escrow accounting.
//!
//! Pure functions that turn a listing's price, its deposit and the elapsed
//! rental time into the split between owner and renter.
//!
//! # Arithmetic
//!
//! All amounts are integer base units. Every operation is checked; an
//! overflow surfaces as [`RentalError::Arithmetic`] instead of wrapping.
//!
//! ## Billing
//!
//! Rent accrues per whole elapsed period (a minute by default), rounded
//! down, with a floor of one period:
//!
//! - returned after 59 seconds: 1 minute
//! - returned after 3 minutes 40 seconds: 3 minutes
//! - returned after 12 minutes: 12 minutes

use crate::clock::Timestamp;
use crate::error::{RentalError, Result};
use serde::{Deserialize, Serialize};
use shelf_token::Amount;

/// Seconds in one billing minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Payment required to start a rental: the first minute plus the deposit.
pub fn minimum_payment(price_per_minute: Amount, deposit: Amount) -> Result<Amount> {
    price_per_minute
        .checked_add(deposit)
        .ok_or(RentalError::arithmetic("minimum_payment"))
}

/// Whole minutes between `start` and `now`, never less than one.
///
/// The registry bills through this under the default configuration and
/// through [`elapsed_periods`] otherwise.
pub fn elapsed_minutes(start: Timestamp, now: Timestamp) -> Result<u64> {
    elapsed_periods(start, now, SECONDS_PER_MINUTE, 1)
}

/// Whole billing periods between `start` and `now`, never less than
/// `minimum`.
///
/// Fails with [`RentalError::ClockRegression`] if `now` precedes `start`.
pub fn elapsed_periods(start: Timestamp, now: Timestamp, period_secs: u64, minimum: u64) -> Result<u64> {
    let elapsed = now
        .checked_since(start)
        .ok_or(RentalError::ClockRegression { start, now })?;
    let periods = elapsed
        .checked_div(period_secs)
        .ok_or(RentalError::arithmetic("elapsed_periods"))?;
    Ok(periods.max(minimum))
}

/// Outcome of settling a rental against its deposit.
///
/// At most one of `refund_to_renter` and `extra_due_from_renter` is
/// non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Price times elapsed minutes.
    pub rent_owed: Amount,
    /// Unused deposit.
    pub refund_to_renter: Amount,
    /// Rent not covered by the deposit.
    pub extra_due_from_renter: Amount,
}

/// Split the deposit for a rental that ran `elapsed` minutes.
pub fn compute_settlement(price_per_minute: Amount, deposit: Amount, elapsed: u64) -> Result<Settlement> {
    let rent_owed = price_per_minute
        .checked_mul(elapsed)
        .ok_or(RentalError::arithmetic("rent_owed"))?;

    let settlement = match deposit.checked_sub(rent_owed) {
        Some(refund) => Settlement {
            rent_owed,
            refund_to_renter: refund,
            extra_due_from_renter: Amount::ZERO,
        },
        None => Settlement {
            rent_owed,
            refund_to_renter: Amount::ZERO,
            // rent_owed > deposit here
            extra_due_from_renter: rent_owed.saturating_sub(deposit),
        },
    };
    Ok(settlement)
}

/// Outbound amounts for a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Paid to the listing owner.
    pub owner_payment: Amount,
    /// Paid back to the renter, including any overpaid extra.
    pub renter_refund: Amount,
}

impl Settlement {
    /// Whether the renter must attach extra value to return.
    #[must_use]
    pub const fn requires_extra(&self) -> bool {
        !self.extra_due_from_renter.is_zero()
    }

    /// Resolve the payout given the extra value the renter attached.
    ///
    /// Extra beyond what is due is folded into the renter refund.
    pub fn payout_with(&self, extra_payment: Amount) -> Result<Payout> {
        let surplus = extra_payment.checked_sub(self.extra_due_from_renter).ok_or(
            RentalError::InsufficientExtraPayment {
                required: self.extra_due_from_renter,
                provided: extra_payment,
            },
        )?;
        let renter_refund = self
            .refund_to_renter
            .checked_add(surplus)
            .ok_or(RentalError::arithmetic("renter_refund"))?;
        Ok(Payout {
            owner_payment: self.rent_owed,
            renter_refund,
        })
    }
}
