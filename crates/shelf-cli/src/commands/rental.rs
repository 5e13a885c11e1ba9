//! Rental commands: rent, return and settlement quotes.

use std::io::Write;

use shelf_registry::BookId;
use shelf_token::Amount;

use super::{parse_amount, timestamp_or_now};
use crate::error::CliError;
use crate::output::{OutputFormat, QuoteOutput, RentOutput, ReturnOutput};
use crate::state::Session;

/// Rental command executor.
pub struct RentalCommand<'a> {
    session: &'a mut Session,
}

impl<'a> RentalCommand<'a> {
    /// Create a new rental command.
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    /// Rent book `id` as `who`, attaching `pay`, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is invalid or the registry reverts.
    pub fn rent<W: Write>(
        &mut self,
        writer: &mut W,
        format: &OutputFormat,
        who: &str,
        id: u64,
        pay: &str,
        at: Option<u64>,
    ) -> Result<(), CliError> {
        let paid = parse_amount("--pay", pay)?;
        let renter = self.session.resolve(who)?;
        let receipt = self
            .session
            .registry()
            .rent_item(BookId::new(id), &renter, paid, timestamp_or_now(at))?;
        self.session.save()?;

        let output = RentOutput {
            id,
            renter: self.session.name_of(&receipt.renter),
            escrowed: receipt.escrowed.to_decimal_string(),
            excess_refund: receipt.excess_refund.to_decimal_string(),
            started_at: receipt.started_at.as_unix_secs(),
        };
        format.write(writer, &output)
    }

    /// Return book `id` as `who`, attaching `extra`, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is invalid or the registry reverts.
    pub fn return_book<W: Write>(
        &mut self,
        writer: &mut W,
        format: &OutputFormat,
        who: &str,
        id: u64,
        extra: Option<&str>,
        at: Option<u64>,
    ) -> Result<(), CliError> {
        let extra = extra.map_or(Ok(Amount::ZERO), |text| parse_amount("--extra", text))?;
        let renter = self.session.resolve(who)?;
        let receipt = self
            .session
            .registry()
            .return_item(BookId::new(id), &renter, extra, timestamp_or_now(at))?;
        self.session.save()?;

        let output = ReturnOutput {
            id,
            renter: self.session.name_of(&receipt.renter),
            minutes: receipt.elapsed_periods,
            owner_payment: receipt.payout.owner_payment.to_decimal_string(),
            refund: receipt.payout.renter_refund.to_decimal_string(),
        };
        format.write(writer, &output)
    }

    /// Preview returning book `id` at `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the book is unknown or not rented.
    pub fn quote<W: Write>(&self, writer: &mut W, format: &OutputFormat, id: u64, at: Option<u64>) -> Result<(), CliError> {
        let quote = self
            .session
            .registry()
            .quote_return(BookId::new(id), timestamp_or_now(at))?;
        let output = QuoteOutput {
            id,
            minutes: quote.elapsed_periods,
            rent_owed: quote.settlement.rent_owed.to_decimal_string(),
            refund: quote.settlement.refund_to_renter.to_decimal_string(),
            extra_due: quote.settlement.extra_due_from_renter.to_decimal_string(),
        };
        format.write(writer, &output)
    }
}
