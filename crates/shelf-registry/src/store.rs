//! Listing store.
//!
//! An append-only table of book listings indexed by sequential id. Ids are
//! never reused and listings are never deleted; only the occupancy of a
//! listing changes after creation.

use crate::clock::Timestamp;
use crate::error::{RentalError, Result};
use serde::{Deserialize, Serialize};
use shelf_token::{Address, Amount};
use std::fmt;

/// Sequential listing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(u64);

impl BookId {
    /// Create from a raw index.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw index.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BookId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Who, if anyone, holds a listing.
///
/// Encoding occupancy as one enum keeps "available" and "has a renter"
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Occupancy {
    /// Open for rent.
    Available,
    /// Rented out.
    Rented {
        /// Current renter.
        renter: Address,
        /// When the rental began.
        since: Timestamp,
    },
}

/// Fields supplied by an owner when listing a book.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewListing {
    /// Book title. Required.
    pub title: String,
    /// Book author. Required.
    pub author: String,
    /// Free-form description.
    pub description: String,
    /// Content-storage reference for the cover image. Stored verbatim.
    pub cover_image: String,
    /// Owner contact address.
    pub contact_email: String,
    /// Rent per minute. Must be positive.
    pub price_per_minute: Amount,
    /// Escrowed deposit. Must be at least one minute of rent.
    pub deposit: Amount,
}

impl NewListing {
    /// Check the listing rules.
    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(RentalError::invalid_input("title", "Title cannot be empty"));
        }
        if self.author.is_empty() {
            return Err(RentalError::invalid_input("author", "Author cannot be empty"));
        }
        if self.price_per_minute.is_zero() {
            return Err(RentalError::invalid_input(
                "price_per_minute",
                "Price must be greater than 0",
            ));
        }
        if self.deposit < self.price_per_minute {
            return Err(RentalError::invalid_input(
                "deposit",
                "Deposit must be greater than or equal to price",
            ));
        }
        Ok(())
    }
}

/// A listed book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Listing id.
    pub id: BookId,
    /// Book title.
    pub title: String,
    /// Book author.
    pub author: String,
    /// Description.
    pub description: String,
    /// Cover image reference.
    pub cover_image: String,
    /// Owner contact.
    pub contact_email: String,
    /// Rent per minute.
    pub price_per_minute: Amount,
    /// Escrowed deposit.
    pub deposit: Amount,
    /// Lister.
    pub owner: Address,
    occupancy: Occupancy,
}

impl Book {
    fn from_listing(id: BookId, listing: NewListing, owner: Address) -> Self {
        Self {
            id,
            title: listing.title,
            author: listing.author,
            description: listing.description,
            cover_image: listing.cover_image,
            contact_email: listing.contact_email,
            price_per_minute: listing.price_per_minute,
            deposit: listing.deposit,
            owner,
            occupancy: Occupancy::Available,
        }
    }

    /// Current occupancy.
    #[must_use]
    pub const fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// True when nobody holds the book.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.occupancy, Occupancy::Available)
    }

    /// Current renter, if any.
    #[must_use]
    pub const fn renter(&self) -> Option<&Address> {
        match &self.occupancy {
            Occupancy::Available => None,
            Occupancy::Rented { renter, .. } => Some(renter),
        }
    }

    /// When the current rental began, if any.
    #[must_use]
    pub const fn rental_start_time(&self) -> Option<Timestamp> {
        match &self.occupancy {
            Occupancy::Available => None,
            Occupancy::Rented { since, .. } => Some(*since),
        }
    }

    pub(crate) fn mark_rented(&mut self, renter: Address, since: Timestamp) {
        self.occupancy = Occupancy::Rented { renter, since };
    }

    pub(crate) fn mark_returned(&mut self) {
        self.occupancy = Occupancy::Available;
    }
}

/// Append-only listing table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStore {
    books: Vec<Book>,
}

impl ListingStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self { books: Vec::new() }
    }

    /// Validate and append a listing, returning its id.
    pub fn create(&mut self, listing: NewListing, owner: Address) -> Result<BookId> {
        listing.validate()?;
        let id = BookId::new(self.count());
        self.books.push(Book::from_listing(id, listing, owner));
        Ok(id)
    }

    /// Look up a listing.
    pub fn get(&self, id: BookId) -> Result<&Book> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.books.get(index))
            .ok_or(RentalError::NotFound { id })
    }

    pub(crate) fn get_mut(&mut self, id: BookId) -> Result<&mut Book> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.books.get_mut(index))
            .ok_or(RentalError::NotFound { id })
    }

    /// Put back a previously captured copy of a listing (rollback).
    pub(crate) fn restore(&mut self, book: Book) {
        if let Ok(slot) = self.get_mut(book.id) {
            *slot = book;
        }
    }

    /// Number of listings ever created.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.books.len() as u64
    }

    /// All listings in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.iter()
    }

    /// Whether every listing sits at the index its id names.
    pub(crate) fn ids_are_sequential(&self) -> bool {
        self.books
            .iter()
            .enumerate()
            .all(|(index, book)| book.id.get() == index as u64)
    }
}
