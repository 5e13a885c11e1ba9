//! Contract-style entry points.
//!
//! [`BookRentalContract`] exposes the registry the way a wallet front end
//! calls it: the caller and attached value come from a [`CallContext`], the
//! time comes from a [`Clock`], and queries return flat views where "no
//! renter" is the zero address and "not rented" is time zero.

use crate::clock::{Clock, Timestamp};
use crate::error::{RentalError, Result};
use crate::registry::{RentReceipt, RentalRegistry, ReturnReceipt};
use crate::store::{Book, BookId, NewListing};
use serde::{Deserialize, Serialize};
use shelf_token::{Address, Amount, PaymentRail};

/// Who is calling and what value they attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Calling account.
    pub caller: Address,
    /// Value attached to the call.
    pub value: Amount,
}

impl CallContext {
    /// A call with no attached value.
    #[must_use]
    pub const fn new(caller: Address) -> Self {
        Self {
            caller,
            value: Amount::ZERO,
        }
    }

    /// Attach value.
    #[must_use]
    pub const fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// Full listing view, field for field what `getBook` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Description.
    pub description: String,
    /// Cover image reference.
    pub cover_image: String,
    /// Owner contact.
    pub email: String,
    /// Rent per minute.
    pub price_per_minute: Amount,
    /// Deposit.
    pub deposit: Amount,
    /// Owner.
    pub owner: Address,
    /// Renter, or the zero address.
    pub renter: Address,
    /// Rental start, or zero.
    pub rental_start_time: Timestamp,
    /// Whether the book can be rented.
    pub is_available: bool,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            description: book.description.clone(),
            cover_image: book.cover_image.clone(),
            email: book.contact_email.clone(),
            price_per_minute: book.price_per_minute,
            deposit: book.deposit,
            owner: book.owner.clone(),
            renter: book.renter().cloned().unwrap_or(Address::ZERO),
            rental_start_time: book.rental_start_time().unwrap_or(Timestamp::ZERO),
            is_available: book.is_available(),
        }
    }
}

/// Narrow listing view for clients built against the title-only ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    /// Title.
    pub title: String,
    /// Rent per minute.
    pub price_per_minute: Amount,
    /// Deposit.
    pub deposit: Amount,
    /// Owner.
    pub owner: Address,
    /// Renter, or the zero address.
    pub renter: Address,
    /// Rental start, or zero.
    pub rental_start_time: Timestamp,
    /// Whether the book can be rented.
    pub is_available: bool,
}

impl From<BookView> for BookSummary {
    fn from(view: BookView) -> Self {
        Self {
            title: view.title,
            price_per_minute: view.price_per_minute,
            deposit: view.deposit,
            owner: view.owner,
            renter: view.renter,
            rental_start_time: view.rental_start_time,
            is_available: view.is_available,
        }
    }
}

/// The registry behind a call-context interface.
#[derive(Debug)]
pub struct BookRentalContract<R, C> {
    registry: RentalRegistry<R>,
    clock: C,
}

impl<R: PaymentRail, C: Clock> BookRentalContract<R, C> {
    /// Wrap a registry.
    pub const fn new(registry: RentalRegistry<R>, clock: C) -> Self {
        Self { registry, clock }
    }

    /// The underlying registry.
    pub const fn registry(&self) -> &RentalRegistry<R> {
        &self.registry
    }

    /// The clock in use.
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// `listItem`. The caller becomes the owner. Listing takes no payment.
    pub fn list_item(&self, ctx: &CallContext, listing: NewListing) -> Result<BookId> {
        if !ctx.value.is_zero() {
            return Err(RentalError::invalid_input("value", "listItem does not accept payment"));
        }
        self.registry.create_listing(listing, &ctx.caller)
    }

    /// `rentItem`, paying with the attached value.
    pub fn rent_item(&self, ctx: &CallContext, id: BookId) -> Result<RentReceipt> {
        self.registry
            .rent_item(id, &ctx.caller, ctx.value, self.clock.now())
    }

    /// `returnItem`, with the attached value as extra payment.
    pub fn return_item(&self, ctx: &CallContext, id: BookId) -> Result<ReturnReceipt> {
        self.registry
            .return_item(id, &ctx.caller, ctx.value, self.clock.now())
    }

    /// `getBook`.
    pub fn get_book(&self, id: BookId) -> Result<BookView> {
        self.registry.get_listing(id).map(|book| BookView::from(&book))
    }

    /// `getBook` in the narrow projection.
    pub fn get_book_summary(&self, id: BookId) -> Result<BookSummary> {
        self.get_book(id).map(BookSummary::from)
    }

    /// `getBookCount`.
    pub fn get_book_count(&self) -> u64 {
        self.registry.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RegistryConfig;
    use shelf_token::InMemoryLedger;
    use std::sync::Arc;

    fn eth(text: &str) -> Amount {
        Amount::parse(text).expect("valid amount")
    }

    fn contract() -> (
        BookRentalContract<Arc<InMemoryLedger>, Arc<ManualClock>>,
        Arc<InMemoryLedger>,
        Arc<ManualClock>,
    ) {
        let ledger = Arc::new(InMemoryLedger::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(1_700_000_000)));
        let registry = RentalRegistry::new(RegistryConfig::default(), Arc::clone(&ledger)).expect("registry");
        (
            BookRentalContract::new(registry, Arc::clone(&clock)),
            ledger,
            clock,
        )
    }

    fn dune() -> NewListing {
        NewListing {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            description: "Desert planet".to_string(),
            cover_image: "ipfs://dune".to_string(),
            contact_email: "paul@example.com".to_string(),
            price_per_minute: eth("0.01"),
            deposit: eth("0.1"),
        }
    }

    #[test]
    fn test_get_book_of_new_listing_uses_sentinels() {
        let (contract, _, _) = contract();
        let owner = Address::derive("owner");
        let id = contract.list_item(&CallContext::new(owner.clone()), dune()).expect("list");

        let view = contract.get_book(id).expect("view");
        assert_eq!(view.owner, owner);
        assert_eq!(view.renter, Address::ZERO);
        assert_eq!(view.rental_start_time, Timestamp::ZERO);
        assert!(view.is_available);
        assert_eq!(view.email, "paul@example.com");
        assert_eq!(contract.get_book_count(), 1);
    }

    #[test]
    fn test_list_item_rejects_attached_value() {
        let (contract, _, _) = contract();
        let ctx = CallContext::new(Address::derive("owner")).with_value(eth("1"));
        assert!(matches!(
            contract.list_item(&ctx, dune()),
            Err(RentalError::InvalidInput { field: "value", .. })
        ));
        assert_eq!(contract.get_book_count(), 0);
    }

    #[test]
    fn test_rent_and_return_with_clock() {
        let (contract, ledger, clock) = contract();
        let owner = Address::derive("owner");
        let renter = Address::derive("renter");
        ledger.fund(&renter, eth("1")).expect("fund");
        let id = contract.list_item(&CallContext::new(owner.clone()), dune()).expect("list");

        contract
            .rent_item(&CallContext::new(renter.clone()).with_value(eth("0.11")), id)
            .expect("rent");
        let view = contract.get_book(id).expect("view");
        assert_eq!(view.renter, renter);
        assert_eq!(view.rental_start_time, clock.now());
        assert!(!view.is_available);

        clock.advance_minutes(3);
        let receipt = contract
            .return_item(&CallContext::new(renter.clone()), id)
            .expect("return");

        assert_eq!(receipt.payout.renter_refund, eth("0.07"));
        assert_eq!(ledger.balance(&owner), eth("0.03"));
        assert_eq!(contract.get_book(id).expect("view").renter, Address::ZERO);
    }

    #[test]
    fn test_return_value_counts_as_extra() {
        let (contract, ledger, clock) = contract();
        let renter = Address::derive("renter");
        ledger.fund(&renter, eth("1")).expect("fund");
        let id = contract
            .list_item(&CallContext::new(Address::derive("owner")), dune())
            .expect("list");
        contract
            .rent_item(&CallContext::new(renter.clone()).with_value(eth("0.11")), id)
            .expect("rent");

        clock.advance_minutes(12);
        assert!(matches!(
            contract.return_item(&CallContext::new(renter.clone()), id),
            Err(RentalError::InsufficientExtraPayment { .. })
        ));
        let receipt = contract
            .return_item(&CallContext::new(renter).with_value(eth("0.02")), id)
            .expect("return");
        assert_eq!(receipt.payout.owner_payment, eth("0.12"));
    }

    #[test]
    fn test_invalid_book_id() {
        let (contract, _, _) = contract();
        let err = contract.get_book(BookId::new(3)).expect_err("missing");
        assert_eq!(err.to_string(), "Invalid book ID: 3");
        assert_eq!(err.kind().as_str(), "invalid_book_id");
    }

    #[test]
    fn test_summary_projection() {
        let (contract, _, _) = contract();
        let id = contract
            .list_item(&CallContext::new(Address::derive("owner")), dune())
            .expect("list");

        let summary = contract.get_book_summary(id).expect("summary");
        assert_eq!(summary.title, "Dune");
        assert_eq!(summary.deposit, eth("0.1"));
        let json = serde_json::to_value(&summary).expect("json");
        assert!(json.get("pricePerMinute").is_some());
        assert!(json.get("author").is_none());
    }
}
