//! Account commands: faucet funding, balances and the registry treasury.

use std::io::Write;

use tracing::info;

use super::parse_amount;
use crate::error::CliError;
use crate::output::{BalanceOutput, Message, OutputFormat, TreasuryOutput};
use crate::state::Session;

/// Account command executor.
pub struct AccountCommand<'a> {
    session: &'a mut Session,
}

impl<'a> AccountCommand<'a> {
    /// Create a new account command.
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    /// Credit `who` with `amount` and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is invalid or the balance overflows.
    pub fn fund<W: Write>(&mut self, writer: &mut W, format: &OutputFormat, who: &str, amount: &str) -> Result<(), CliError> {
        let amount = parse_amount("amount", amount)?;
        let address = self.session.resolve(who)?;
        self.session.ledger().fund(&address, amount)?;
        self.session.save()?;
        info!(account = %address, %amount, "account funded");

        let balance = self.session.ledger().balance(&address);
        format.write(
            writer,
            &Message::success(format!("Funded {who} with {amount} (balance {balance})")),
        )
    }

    /// Show the balance of `who`.
    ///
    /// # Errors
    ///
    /// Returns an error if `who` is empty or writing fails.
    pub fn balance<W: Write>(&self, writer: &mut W, format: &OutputFormat, who: &str) -> Result<(), CliError> {
        let address = self.session.lookup(who)?;
        let output = BalanceOutput {
            account: self.session.name_of(&address),
            address: address.as_base58(),
            balance: self.session.ledger().balance(&address).to_decimal_string(),
        };
        format.write(writer, &output)
    }

    /// Show what the registry holds.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn treasury<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let registry = self.session.registry();
        let treasury = registry.treasury();
        let output = TreasuryOutput {
            address: registry.address().as_base58(),
            escrowed: treasury.escrowed.to_decimal_string(),
            retained: treasury.retained.to_decimal_string(),
            balance: self.session.ledger().balance(registry.address()).to_decimal_string(),
        };
        format.write(writer, &output)
    }
}
