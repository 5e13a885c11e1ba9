//! The rental registry.
//!
//! [`RentalRegistry`] ties the listing store, the escrow math and a
//! [`PaymentRail`] together. Each mutation runs in three phases inside a
//! [`TransferGuard`] section:
//!
//! 1. checks against the current state, which may fail with no effect
//! 2. effects on the listing and treasury, with an undo record kept
//! 3. one all-or-nothing transfer batch on the rail
//!
//! If the batch fails the undo record is restored and the operation fails
//! with [`RentalError::TransferFailed`]. Events are published only once the
//! batch has landed.

use crate::clock::Timestamp;
use crate::config::{ConfigError, RegistryConfig};
use crate::error::{RentalError, Result};
use crate::escrow::{self, Payout, Settlement};
use crate::events::{EventSink, RegistryEvent, Sequencer, TracingEventSink};
use crate::guard::{Entered, TransferGuard};
use crate::store::{Book, BookId, ListingStore, NewListing, Occupancy};
use serde::{Deserialize, Serialize};
use shelf_token::{Address, Amount, PaymentRail, Transfer, TransferKind, TransferReceipt};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Value held by the registry account on behalf of the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    /// Price plus deposit of every active rental.
    pub escrowed: Amount,
    /// Prepaid first minutes kept from settled rentals.
    pub retained: Amount,
}

impl Treasury {
    /// Everything the registry account should hold.
    #[must_use]
    pub const fn total(&self) -> Option<Amount> {
        self.escrowed.checked_add(self.retained)
    }
}

/// Persistable registry state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Every listing.
    pub listings: ListingStore,
    /// Treasury balances.
    pub treasury: Treasury,
    /// Sequence number the next event will carry.
    #[serde(default)]
    pub next_event_sequence: u64,
}

/// Result of a successful rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentReceipt {
    /// Listing rented.
    pub book_id: BookId,
    /// New renter.
    pub renter: Address,
    /// Rental start.
    pub started_at: Timestamp,
    /// Price plus deposit now held in escrow.
    pub escrowed: Amount,
    /// Overpayment sent straight back.
    pub excess_refund: Amount,
    /// Transfers executed.
    pub transfers: Vec<TransferReceipt>,
}

/// Result of a successful return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    /// Listing returned.
    pub book_id: BookId,
    /// Former renter.
    pub renter: Address,
    /// Listing owner.
    pub owner: Address,
    /// Billing periods charged.
    pub elapsed_periods: u64,
    /// Deposit split.
    pub settlement: Settlement,
    /// Amounts paid out.
    pub payout: Payout,
    /// Transfers executed.
    pub transfers: Vec<TransferReceipt>,
}

/// Preview of what returning a rental now would cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnQuote {
    /// Listing.
    pub book_id: BookId,
    /// Current renter.
    pub renter: Address,
    /// Rental start.
    pub started_at: Timestamp,
    /// Time the quote was computed for.
    pub quoted_at: Timestamp,
    /// Billing periods that would be charged.
    pub elapsed_periods: u64,
    /// Deposit split at `quoted_at`.
    pub settlement: Settlement,
}

#[derive(Debug, Default)]
struct State {
    store: ListingStore,
    treasury: Treasury,
}

/// State to put back if the transfer batch fails.
struct Undo {
    book: Book,
    treasury: Treasury,
}

/// A book rental registry settling through `R`.
pub struct RentalRegistry<R> {
    config: RegistryConfig,
    address: Address,
    guard: TransferGuard<State>,
    rail: R,
    sink: Arc<dyn EventSink>,
    sequencer: Sequencer,
}

impl<R: PaymentRail> RentalRegistry<R> {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig, rail: R) -> std::result::Result<Self, ConfigError> {
        Self::from_snapshot(config, rail, RegistrySnapshot::default())
    }

    /// Recreate a registry from a snapshot.
    ///
    /// Listing ids must run from zero without gaps, and the escrowed
    /// treasury must equal price plus deposit summed over rented listings.
    pub fn from_snapshot(
        config: RegistryConfig,
        rail: R,
        snapshot: RegistrySnapshot,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        if !snapshot.listings.ids_are_sequential() {
            return Err(ConfigError::Invalid(
                "snapshot listing ids are not sequential".to_string(),
            ));
        }
        let held = snapshot
            .listings
            .iter()
            .filter(|book| !book.is_available())
            .try_fold(Amount::ZERO, |total, book| {
                escrow::minimum_payment(book.price_per_minute, book.deposit)
                    .ok()
                    .and_then(|held| total.checked_add(held))
            });
        if held != Some(snapshot.treasury.escrowed) {
            return Err(ConfigError::Invalid(format!(
                "snapshot escrow {} does not match active rentals",
                snapshot.treasury.escrowed
            )));
        }
        let address = config.resolved_address();
        debug!(
            registry = %address,
            listings = snapshot.listings.count(),
            "registry loaded"
        );
        Ok(Self {
            config,
            address,
            guard: TransferGuard::new(State {
                store: snapshot.listings,
                treasury: snapshot.treasury,
            }),
            rail,
            sink: Arc::new(TracingEventSink::new()),
            sequencer: Sequencer::starting_at(snapshot.next_event_sequence),
        })
    }

    /// Replace the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The account that holds escrow.
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Active configuration.
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The payment rail.
    pub const fn rail(&self) -> &R {
        &self.rail
    }

    /// List a book. `owner` becomes the listing's owner.
    pub fn create_listing(&self, listing: NewListing, owner: &Address) -> Result<BookId> {
        let title = listing.title.clone();
        let author = listing.author.clone();
        let section = self.enter("create_listing", None)?;

        let id = section
            .with_mut(|state| state.store.create(listing, owner.clone()))
            .inspect_err(|e| reverted("create_listing", None, e))?;

        self.publish(vec![RegistryEvent::ItemListed {
            book_id: id,
            title,
            author,
            owner: owner.clone(),
        }]);
        info!(book_id = %id, owner = %owner, "book listed");
        Ok(id)
    }

    /// Rent a book, attaching `paid` from `caller`.
    ///
    /// `paid` must cover one minute plus the deposit; any excess goes back
    /// to `caller` in the same batch.
    pub fn rent_item(&self, id: BookId, caller: &Address, paid: Amount, now: Timestamp) -> Result<RentReceipt> {
        let section = self.enter("rent_item", Some(id))?;
        self.rent_in(&section, id, caller, paid, now)
            .inspect_err(|e| reverted("rent_item", Some(id), e))
    }

    fn rent_in(
        &self,
        section: &Entered<'_, State>,
        id: BookId,
        caller: &Address,
        paid: Amount,
        now: Timestamp,
    ) -> Result<RentReceipt> {
        let (undo, required) = section.with(|state| -> Result<(Undo, Amount)> {
            let book = state.store.get(id)?;
            if !book.is_available() {
                return Err(RentalError::NotAvailable { id });
            }
            if &book.owner == caller {
                return Err(RentalError::SelfRental { id });
            }
            let required = escrow::minimum_payment(book.price_per_minute, book.deposit)?;
            if paid < required {
                return Err(RentalError::InsufficientPayment {
                    required,
                    provided: paid,
                });
            }
            let undo = Undo {
                book: book.clone(),
                treasury: state.treasury,
            };
            Ok((undo, required))
        })?;
        let excess = paid
            .checked_sub(required)
            .ok_or(RentalError::arithmetic("excess_refund"))?;
        let escrowed = undo
            .treasury
            .escrowed
            .checked_add(required)
            .ok_or(RentalError::arithmetic("escrowed"))?;

        section.with_mut(|state| -> Result<()> {
            state.store.get_mut(id)?.mark_rented(caller.clone(), now);
            state.treasury.escrowed = escrowed;
            Ok(())
        })?;

        let mut batch = vec![Transfer::new(
            TransferKind::EscrowDeposit,
            caller.clone(),
            self.address.clone(),
            paid,
        )];
        if !excess.is_zero() {
            batch.push(Transfer::new(
                TransferKind::ExcessRefund,
                self.address.clone(),
                caller.clone(),
                excess,
            ));
        }
        let transfers = self.commit(section, &batch, undo)?;

        let mut events = vec![RegistryEvent::ItemRented {
            book_id: id,
            renter: caller.clone(),
        }];
        if !excess.is_zero() {
            events.push(RegistryEvent::RefundSent {
                to: caller.clone(),
                amount: excess,
            });
        }
        self.publish(events);

        info!(
            book_id = %id,
            renter = %caller,
            escrowed = %required,
            excess_refund = %excess,
            "book rented"
        );
        Ok(RentReceipt {
            book_id: id,
            renter: caller.clone(),
            started_at: now,
            escrowed: required,
            excess_refund: excess,
            transfers,
        })
    }

    /// Return a rented book, attaching `extra_payment` from `caller`.
    ///
    /// The owner is paid the rent owed. The renter gets back the unused
    /// deposit plus whatever extra exceeded the amount due.
    pub fn return_item(
        &self,
        id: BookId,
        caller: &Address,
        extra_payment: Amount,
        now: Timestamp,
    ) -> Result<ReturnReceipt> {
        let section = self.enter("return_item", Some(id))?;
        self.return_in(&section, id, caller, extra_payment, now)
            .inspect_err(|e| reverted("return_item", Some(id), e))
    }

    fn return_in(
        &self,
        section: &Entered<'_, State>,
        id: BookId,
        caller: &Address,
        extra_payment: Amount,
        now: Timestamp,
    ) -> Result<ReturnReceipt> {
        let (undo, quote, held) = section.with(|state| -> Result<(Undo, ReturnQuote, Amount)> {
            let book = state.store.get(id)?;
            let quote = self.quote_for(book, now)?;
            if &quote.renter != caller {
                return Err(RentalError::NotRenter {
                    id,
                    caller: caller.clone(),
                });
            }
            let held = escrow::minimum_payment(book.price_per_minute, book.deposit)?;
            let undo = Undo {
                book: book.clone(),
                treasury: state.treasury,
            };
            Ok((undo, quote, held))
        })?;
        let payout = quote.settlement.payout_with(extra_payment)?;
        let owner = undo.book.owner.clone();

        let inflow = held
            .checked_add(extra_payment)
            .ok_or(RentalError::arithmetic("return_inflow"))?;
        let outflow = payout
            .owner_payment
            .checked_add(payout.renter_refund)
            .ok_or(RentalError::arithmetic("return_outflow"))?;
        let kept = inflow
            .checked_sub(outflow)
            .ok_or(RentalError::arithmetic("retained"))?;
        let treasury = Treasury {
            escrowed: undo
                .treasury
                .escrowed
                .checked_sub(held)
                .ok_or(RentalError::arithmetic("escrowed"))?,
            retained: undo
                .treasury
                .retained
                .checked_add(kept)
                .ok_or(RentalError::arithmetic("retained"))?,
        };

        section.with_mut(|state| -> Result<()> {
            state.store.get_mut(id)?.mark_returned();
            state.treasury = treasury;
            Ok(())
        })?;

        let mut batch = Vec::with_capacity(3);
        if !extra_payment.is_zero() {
            batch.push(Transfer::new(
                TransferKind::EscrowDeposit,
                caller.clone(),
                self.address.clone(),
                extra_payment,
            ));
        }
        if !payout.owner_payment.is_zero() {
            batch.push(Transfer::new(
                TransferKind::OwnerPayment,
                self.address.clone(),
                owner.clone(),
                payout.owner_payment,
            ));
        }
        if !payout.renter_refund.is_zero() {
            batch.push(Transfer::new(
                TransferKind::RenterRefund,
                self.address.clone(),
                caller.clone(),
                payout.renter_refund,
            ));
        }
        let transfers = self.commit(section, &batch, undo)?;

        let mut events = vec![
            RegistryEvent::ItemReturned {
                book_id: id,
                renter: caller.clone(),
                refund_amount: payout.renter_refund,
            },
            RegistryEvent::PaymentSent {
                to: owner.clone(),
                amount: payout.owner_payment,
            },
        ];
        if !payout.renter_refund.is_zero() {
            events.push(RegistryEvent::RefundSent {
                to: caller.clone(),
                amount: payout.renter_refund,
            });
        }
        self.publish(events);

        info!(
            book_id = %id,
            renter = %caller,
            owner = %owner,
            minutes = quote.elapsed_periods,
            owner_payment = %payout.owner_payment,
            refund = %payout.renter_refund,
            "book returned"
        );
        Ok(ReturnReceipt {
            book_id: id,
            renter: caller.clone(),
            owner,
            elapsed_periods: quote.elapsed_periods,
            settlement: quote.settlement,
            payout,
            transfers,
        })
    }

    /// What returning the rental at `now` would settle to. Mutates nothing.
    pub fn quote_return(&self, id: BookId, now: Timestamp) -> Result<ReturnQuote> {
        self.guard
            .read(|state| state.store.get(id).and_then(|book| self.quote_for(book, now)))
    }

    fn quote_for(&self, book: &Book, now: Timestamp) -> Result<ReturnQuote> {
        let Occupancy::Rented { renter, since } = book.occupancy() else {
            return Err(RentalError::NotRented { id: book.id });
        };
        let elapsed_periods = if self.config.bills_per_minute() {
            escrow::elapsed_minutes(*since, now)?
        } else {
            escrow::elapsed_periods(
                *since,
                now,
                self.config.billing_period_secs,
                self.config.minimum_billable_periods,
            )?
        };
        let settlement = escrow::compute_settlement(book.price_per_minute, book.deposit, elapsed_periods)?;
        Ok(ReturnQuote {
            book_id: book.id,
            renter: renter.clone(),
            started_at: *since,
            quoted_at: now,
            elapsed_periods,
            settlement,
        })
    }

    /// A listing by id.
    pub fn get_listing(&self, id: BookId) -> Result<Book> {
        self.guard.read(|state| state.store.get(id).cloned())
    }

    /// Number of listings ever created.
    pub fn count(&self) -> u64 {
        self.guard.read(|state| state.store.count())
    }

    /// Every listing, in id order.
    pub fn listings(&self) -> Vec<Book> {
        self.filtered(|_| true)
    }

    /// Listings owned by `owner`.
    pub fn listings_owned_by(&self, owner: &Address) -> Vec<Book> {
        self.filtered(|book| &book.owner == owner)
    }

    /// Listings currently rented by `renter`.
    pub fn rentals_of(&self, renter: &Address) -> Vec<Book> {
        self.filtered(|book| book.renter() == Some(renter))
    }

    /// Listings open for rent.
    pub fn available_listings(&self) -> Vec<Book> {
        self.filtered(Book::is_available)
    }

    fn filtered(&self, keep: impl Fn(&Book) -> bool) -> Vec<Book> {
        self.guard
            .read(|state| state.store.iter().filter(|book| keep(book)).cloned().collect())
    }

    /// Current treasury balances.
    pub fn treasury(&self) -> Treasury {
        self.guard.read(|state| state.treasury)
    }

    /// Capture state for persistence.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.guard.read(|state| RegistrySnapshot {
            listings: state.store.clone(),
            treasury: state.treasury,
            next_event_sequence: self.sequencer.peek(),
        })
    }

    fn enter(&self, operation: &'static str, id: Option<BookId>) -> Result<Entered<'_, State>> {
        self.guard.enter().inspect_err(|e| reverted(operation, id, e))
    }

    fn commit(
        &self,
        section: &Entered<'_, State>,
        batch: &[Transfer],
        undo: Undo,
    ) -> Result<Vec<TransferReceipt>> {
        match self.rail.execute(batch) {
            Ok(receipts) => Ok(receipts),
            Err(e) => {
                section.with_mut(|state| {
                    state.store.restore(undo.book);
                    state.treasury = undo.treasury;
                });
                Err(RentalError::TransferFailed(e))
            }
        }
    }

    /// Publishes while the section is still held so the event stream
    /// follows commit order.
    fn publish(&self, events: Vec<RegistryEvent>) {
        for event in events {
            self.sink.publish(&self.sequencer.record(event));
        }
    }
}

fn reverted(operation: &'static str, id: Option<BookId>, error: &RentalError) {
    warn!(
        operation,
        book_id = ?id,
        reason = error.kind().as_str(),
        error = %error,
        "registry operation reverted"
    );
}

impl<R> fmt::Debug for RentalRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RentalRegistry")
            .field("address", &self.address)
            .field("config", &self.config)
            .field("next_event_sequence", &self.sequencer.peek())
            .finish_non_exhaustive()
    }
}
