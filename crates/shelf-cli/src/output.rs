//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Amounts are
//! rendered as decimal ETH strings in both.

use std::io::Write;

use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// One row of the book list.
#[derive(Debug, Clone, Serialize)]
pub struct BookRow {
    /// Book id.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Rent per minute, ETH.
    pub price_per_minute: String,
    /// Deposit, ETH.
    pub deposit: String,
    /// Owner name or short address.
    pub owner: String,
    /// "available" or "rented".
    pub status: String,
}

/// List of books for display.
#[derive(Debug, Clone, Serialize)]
pub struct BookList {
    /// Books in id order.
    pub books: Vec<BookRow>,
}

impl TableDisplay for BookList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.books.is_empty() {
            writeln!(writer, "No books listed")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:>4}  {:<24}  {:<18}  {:>10}  {:>10}  {:<12}  {:<9}",
            "ID", "TITLE", "AUTHOR", "PRICE/MIN", "DEPOSIT", "OWNER", "STATUS"
        )?;
        writeln!(writer, "{}", "─".repeat(99))?;

        for book in &self.books {
            writeln!(
                writer,
                "{:>4}  {:<24}  {:<18}  {:>10}  {:>10}  {:<12}  {:<9}",
                book.id,
                truncate(&book.title, 24),
                truncate(&book.author, 18),
                book.price_per_minute,
                book.deposit,
                truncate(&book.owner, 12),
                book.status
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} book(s)", self.books.len())?;
        Ok(())
    }
}

/// Detailed book information.
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    /// Book id.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Description.
    pub description: String,
    /// Cover image reference.
    pub cover_image: String,
    /// Contact email.
    pub email: String,
    /// Rent per minute, ETH.
    pub price_per_minute: String,
    /// Deposit, ETH.
    pub deposit: String,
    /// Owner address.
    pub owner: String,
    /// Renter address, or the zero address.
    pub renter: String,
    /// Rental start, Unix seconds, or zero.
    pub rental_start_time: u64,
    /// Whether the book can be rented.
    pub is_available: bool,
}

impl TableDisplay for BookDetail {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Book #{}: {}", self.id, self.title)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Author:           {}", self.author)?;
        if !self.description.is_empty() {
            writeln!(writer, "Description:      {}", self.description)?;
        }
        if !self.cover_image.is_empty() {
            writeln!(writer, "Cover:            {}", self.cover_image)?;
        }
        if !self.email.is_empty() {
            writeln!(writer, "Contact:          {}", self.email)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Price/minute:     {} ETH", self.price_per_minute)?;
        writeln!(writer, "Deposit:          {} ETH", self.deposit)?;
        writeln!(writer, "Owner:            {}", self.owner)?;
        writeln!(writer)?;
        if self.is_available {
            writeln!(writer, "Status:           available")?;
        } else {
            writeln!(writer, "Status:           rented")?;
            writeln!(writer, "Renter:           {}", self.renter)?;
            writeln!(writer, "Since:            {}", self.rental_start_time)?;
        }
        Ok(())
    }
}

/// Result of renting a book.
#[derive(Debug, Clone, Serialize)]
pub struct RentOutput {
    /// Book id.
    pub id: u64,
    /// Renter.
    pub renter: String,
    /// Escrowed, ETH.
    pub escrowed: String,
    /// Overpayment refunded, ETH.
    pub excess_refund: String,
    /// Rental start, Unix seconds.
    pub started_at: u64,
}

impl TableDisplay for RentOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ Book #{} rented by {}", self.id, self.renter)?;
        writeln!(writer, "  Escrowed:       {} ETH", self.escrowed)?;
        if self.excess_refund != "0" {
            writeln!(writer, "  Refunded:       {} ETH", self.excess_refund)?;
        }
        Ok(())
    }
}

/// Result of returning a book.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnOutput {
    /// Book id.
    pub id: u64,
    /// Former renter.
    pub renter: String,
    /// Minutes billed.
    pub minutes: u64,
    /// Paid to the owner, ETH.
    pub owner_payment: String,
    /// Refunded to the renter, ETH.
    pub refund: String,
}

impl TableDisplay for ReturnOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ Book #{} returned by {}", self.id, self.renter)?;
        writeln!(writer, "  Minutes billed: {}", self.minutes)?;
        writeln!(writer, "  Owner paid:     {} ETH", self.owner_payment)?;
        writeln!(writer, "  Refund:         {} ETH", self.refund)?;
        Ok(())
    }
}

/// Settlement preview.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteOutput {
    /// Book id.
    pub id: u64,
    /// Minutes that would be billed.
    pub minutes: u64,
    /// Rent owed, ETH.
    pub rent_owed: String,
    /// Deposit refund, ETH.
    pub refund: String,
    /// Extra payment required, ETH.
    pub extra_due: String,
}

impl TableDisplay for QuoteOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Return quote for book #{}", self.id)?;
        writeln!(writer, "  Minutes:        {}", self.minutes)?;
        writeln!(writer, "  Rent owed:      {} ETH", self.rent_owed)?;
        writeln!(writer, "  Refund:         {} ETH", self.refund)?;
        writeln!(writer, "  Extra due:      {} ETH", self.extra_due)?;
        Ok(())
    }
}

/// Account balance.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceOutput {
    /// Account name or short address.
    pub account: String,
    /// Full address.
    pub address: String,
    /// Balance, ETH.
    pub balance: String,
}

impl TableDisplay for BalanceOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{:<16} {} ETH", self.account, self.balance)?;
        writeln!(writer, "  {}", self.address)?;
        Ok(())
    }
}

/// Registry treasury.
#[derive(Debug, Clone, Serialize)]
pub struct TreasuryOutput {
    /// Registry address.
    pub address: String,
    /// Held for active rentals, ETH.
    pub escrowed: String,
    /// Kept from settled rentals, ETH.
    pub retained: String,
    /// Ledger balance of the registry account, ETH.
    pub balance: String,
}

impl TableDisplay for TreasuryOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Registry Treasury")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Address:          {}", self.address)?;
        writeln!(writer, "Escrowed:         {} ETH", self.escrowed)?;
        writeln!(writer, "Retained:         {} ETH", self.retained)?;
        writeln!(writer, "Ledger balance:   {} ETH", self.balance)?;
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
