//! Book commands: listing and browsing.

use std::io::Write;

use shelf_registry::{Book, BookId, BookView, NewListing};
use shelf_token::Address;

use super::parse_amount;
use crate::cli::{BooksArgs, ListArgs};
use crate::error::CliError;
use crate::output::{BookDetail, BookList, BookRow, Message, OutputFormat};
use crate::state::Session;

/// Book command executor.
pub struct BookCommand<'a> {
    session: &'a mut Session,
}

impl<'a> BookCommand<'a> {
    /// Create a new book command.
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    /// List a new book and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is invalid or the registry rejects
    /// the listing.
    pub fn list<W: Write>(&mut self, writer: &mut W, format: &OutputFormat, args: &ListArgs) -> Result<(), CliError> {
        let listing = NewListing {
            title: args.title.clone(),
            author: args.author.clone(),
            description: args.description.clone(),
            cover_image: args.cover.clone(),
            contact_email: args.email.clone(),
            price_per_minute: parse_amount("--price", &args.price)?,
            deposit: parse_amount("--deposit", &args.deposit)?,
        };
        let owner = self.session.resolve(&args.who)?;
        let id = self.session.registry().create_listing(listing, &owner)?;
        self.session.save()?;

        format.write(
            writer,
            &Message::success(format!("Listed \"{}\" as book #{id}", args.title)),
        )
    }

    /// Show one book.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown or writing fails.
    pub fn show<W: Write>(&self, writer: &mut W, format: &OutputFormat, id: u64) -> Result<(), CliError> {
        let book = self.session.registry().get_listing(BookId::new(id))?;
        let view = BookView::from(&book);
        let detail = BookDetail {
            id,
            title: view.title,
            author: view.author,
            description: view.description,
            cover_image: view.cover_image,
            email: view.email,
            price_per_minute: view.price_per_minute.to_decimal_string(),
            deposit: view.deposit.to_decimal_string(),
            owner: self.display_address(&view.owner, format),
            renter: self.display_address(&view.renter, format),
            rental_start_time: view.rental_start_time.as_unix_secs(),
            is_available: view.is_available,
        };
        format.write(writer, &detail)
    }

    /// List books, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if a filter account is empty or writing fails.
    pub fn books<W: Write>(&self, writer: &mut W, format: &OutputFormat, args: &BooksArgs) -> Result<(), CliError> {
        let registry = self.session.registry();
        let books = if let Some(owner) = &args.owner {
            registry.listings_owned_by(&self.session.lookup(owner)?)
        } else if let Some(renter) = &args.renter {
            registry.rentals_of(&self.session.lookup(renter)?)
        } else if args.available {
            registry.available_listings()
        } else {
            registry.listings()
        };

        let list = BookList {
            books: books.iter().map(|book| self.row(book)).collect(),
        };
        format.write(writer, &list)
    }

    fn row(&self, book: &Book) -> BookRow {
        BookRow {
            id: book.id.get(),
            title: book.title.clone(),
            author: book.author.clone(),
            price_per_minute: book.price_per_minute.to_decimal_string(),
            deposit: book.deposit.to_decimal_string(),
            owner: self.session.name_of(&book.owner),
            status: if book.is_available() { "available" } else { "rented" }.to_string(),
        }
    }

    /// Full base58 for JSON, names for tables.
    fn display_address(&self, address: &Address, format: &OutputFormat) -> String {
        if format.is_json() {
            address.as_base58()
        } else {
            self.session.name_of(address)
        }
    }
}
