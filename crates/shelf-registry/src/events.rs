//! Registry events and sinks.
//!
//! Events describe committed state changes for off-chain observers. The
//! registry buffers the events of an operation and hands them to its
//! [`EventSink`] only after the operation commits, so a reverted operation
//! publishes nothing.

use crate::store::BookId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shelf_token::{Address, Amount};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// A committed registry state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A book was listed.
    ItemListed {
        /// New listing id.
        book_id: BookId,
        /// Title.
        title: String,
        /// Author.
        author: String,
        /// Lister.
        owner: Address,
    },
    /// A book was rented.
    ItemRented {
        /// Listing id.
        book_id: BookId,
        /// Renter.
        renter: Address,
    },
    /// A book was returned and settled.
    ItemReturned {
        /// Listing id.
        book_id: BookId,
        /// Renter.
        renter: Address,
        /// Total refunded to the renter.
        refund_amount: Amount,
    },
    /// Value was refunded.
    RefundSent {
        /// Recipient.
        to: Address,
        /// Amount refunded.
        amount: Amount,
    },
    /// Rent was paid out.
    PaymentSent {
        /// Recipient.
        to: Address,
        /// Amount paid.
        amount: Amount,
    },
}

impl RegistryEvent {
    /// Short name of the event.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::ItemListed { .. } => "item_listed",
            Self::ItemRented { .. } => "item_rented",
            Self::ItemReturned { .. } => "item_returned",
            Self::RefundSent { .. } => "refund_sent",
            Self::PaymentSent { .. } => "payment_sent",
        }
    }

    /// The listing this event concerns, if any.
    #[must_use]
    pub const fn book_id(&self) -> Option<BookId> {
        match self {
            Self::ItemListed { book_id, .. }
            | Self::ItemRented { book_id, .. }
            | Self::ItemReturned { book_id, .. } => Some(*book_id),
            Self::RefundSent { .. } | Self::PaymentSent { .. } => None,
        }
    }
}

impl fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

/// A published event with its envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event id.
    pub event_id: Uuid,
    /// Position in the registry's event stream.
    pub sequence: u64,
    /// Wall-clock time the event was published.
    pub recorded_at: DateTime<Utc>,
    /// The event.
    #[serde(flatten)]
    pub event: RegistryEvent,
}

impl EventRecord {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Assigns sequence numbers to events.
#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    next: AtomicU64,
}

impl Sequencer {
    pub(crate) fn starting_at(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
        }
    }

    pub(crate) fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    pub(crate) fn record(&self, event: RegistryEvent) -> EventRecord {
        EventRecord {
            event_id: Uuid::new_v4(),
            sequence: self.next.fetch_add(1, Ordering::SeqCst),
            recorded_at: Utc::now(),
            event,
        }
    }
}

/// Destination for published events.
pub trait EventSink: Send + Sync {
    /// Publish one event.
    fn publish(&self, record: &EventRecord);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn publish(&self, record: &EventRecord) {
        (**self).publish(record);
    }
}

/// Sink that writes events through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink {
    prefix: Option<String>,
}

impl TracingEventSink {
    /// Create a sink with the default prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with a custom message prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl EventSink for TracingEventSink {
    fn publish(&self, record: &EventRecord) {
        let event_type = record.event.event_type();
        let json = record.to_json().unwrap_or_else(|_| "{}".to_string());
        let prefix = self.prefix.as_deref().unwrap_or("EVENT");

        tracing::info!(
            target: "shelf_registry::events",
            event_id = %record.event_id,
            sequence = record.sequence,
            %event_type,
            event_json = %json,
            "[{prefix}] {event_type}"
        );
    }
}

/// Sink that keeps every event in memory, in publish order.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemoryEventSink {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record published so far.
    #[must_use]
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    /// Every event published so far, without envelopes.
    #[must_use]
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.records.lock().iter().map(|r| r.event.clone()).collect()
    }

    /// Number of events published.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, record: &EventRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _record: &EventRecord) {}
}
