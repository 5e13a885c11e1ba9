//! Integration tests for hostile payment recipients.
//!
//! An attacker account registers a receive hook on the ledger. When the
//! registry pays it, the hook calls straight back into the registry, trying
//! to settle the same rental twice or grab the book mid-settlement.

use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use shelf_registry::{BookId, NewListing, RegistryConfig, RentalError, RentalRegistry, Timestamp};
use shelf_token::{Address, Amount, InMemoryLedger, PaymentRail, Recipient, Transfer, TransferKind};

// ============================================================================
// Helper Functions
// ============================================================================

type Registry = RentalRegistry<Arc<InMemoryLedger>>;

const T0: u64 = 1_700_000_000;

fn eth(text: &str) -> Amount {
    Amount::parse(text).expect("valid amount")
}

fn at_minute(minutes: u64) -> Timestamp {
    Timestamp::from_unix_secs(T0 + minutes * 60)
}

fn listing() -> NewListing {
    NewListing {
        title: "Neuromancer".to_string(),
        author: "William Gibson".to_string(),
        price_per_minute: eth("0.01"),
        deposit: eth("0.1"),
        ..NewListing::default()
    }
}

/// What the hook does with the outcome of its nested calls.
#[derive(Clone, Copy)]
enum OnReject {
    /// Accept the payment anyway.
    Swallow,
    /// Refuse the payment, reverting the outer operation.
    Propagate,
}

/// Receive hook that re-enters the registry.
struct Attacker {
    me: Address,
    registry: OnceLock<Weak<Registry>>,
    target: Mutex<Option<(BookId, Timestamp)>>,
    mode: OnReject,
    nested: Mutex<Vec<Result<(), RentalError>>>,
    seen_available: Mutex<Vec<bool>>,
}

impl Attacker {
    fn new(me: Address, mode: OnReject) -> Self {
        Self {
            me,
            registry: OnceLock::new(),
            target: Mutex::new(None),
            mode,
            nested: Mutex::new(Vec::new()),
            seen_available: Mutex::new(Vec::new()),
        }
    }

    fn aim(&self, id: BookId, now: Timestamp) {
        *self.target.lock() = Some((id, now));
    }
}

impl Recipient for Attacker {
    fn on_receive(&self, _transfer: &Transfer) -> Result<(), String> {
        let Some(registry) = self.registry.get().and_then(Weak::upgrade) else {
            return Ok(());
        };
        let Some((id, now)) = *self.target.lock() else {
            return Ok(());
        };

        // Reads are allowed mid-transfer.
        if let Ok(book) = registry.get_listing(id) {
            self.seen_available.lock().push(book.is_available());
        }

        let second_return = registry.return_item(id, &self.me, Amount::ZERO, now).map(|_| ());
        let grab = registry.rent_item(id, &self.me, eth("0.11"), now).map(|_| ());
        let rejected = second_return.is_err() || grab.is_err();
        self.nested.lock().extend([second_return, grab]);

        match self.mode {
            OnReject::Propagate if rejected => Err("reentry blocked".to_string()),
            _ => Ok(()),
        }
    }
}

struct Scene {
    ledger: Arc<InMemoryLedger>,
    registry: Arc<Registry>,
    attacker: Arc<Attacker>,
    owner: Address,
    id: BookId,
}

fn scene(mode: OnReject) -> Scene {
    let ledger = Arc::new(InMemoryLedger::new());
    let registry = Arc::new(RentalRegistry::new(RegistryConfig::default(), Arc::clone(&ledger)).expect("registry"));
    let owner = Address::derive("owner");
    let me = Address::derive("attacker");
    ledger.fund(&me, eth("5")).expect("fund attacker");

    let attacker = Arc::new(Attacker::new(me.clone(), mode));
    attacker
        .registry
        .set(Arc::downgrade(&registry))
        .expect("registry set once");
    ledger.register_recipient(me, attacker.clone());

    let id = registry.create_listing(listing(), &owner).expect("list");
    Scene {
        ledger,
        registry,
        attacker,
        owner,
        id,
    }
}

// ============================================================================
// Return-time reentry
// ============================================================================

#[test]
fn nested_calls_during_refund_are_rejected() {
    let s = scene(OnReject::Swallow);
    let me = s.attacker.me.clone();
    s.registry
        .rent_item(s.id, &me, eth("0.11"), at_minute(0))
        .expect("rent");
    s.attacker.aim(s.id, at_minute(3));

    let receipt = s
        .registry
        .return_item(s.id, &me, Amount::ZERO, at_minute(3))
        .expect("outer return");

    assert_eq!(receipt.payout.renter_refund, eth("0.07"));
    assert_eq!(
        *s.attacker.nested.lock(),
        vec![Err(RentalError::Reentrant), Err(RentalError::Reentrant)]
    );
}

#[test]
fn swallowed_reentry_settles_exactly_once() {
    let s = scene(OnReject::Swallow);
    let me = s.attacker.me.clone();
    s.registry
        .rent_item(s.id, &me, eth("0.11"), at_minute(0))
        .expect("rent");
    s.attacker.aim(s.id, at_minute(3));

    s.registry
        .return_item(s.id, &me, Amount::ZERO, at_minute(3))
        .expect("outer return");

    // 5 - 0.11 + 0.07: one refund, not two
    assert_eq!(s.ledger.balance(&me), eth("4.96"));
    assert_eq!(s.ledger.balance(&s.owner), eth("0.03"));
    assert_eq!(s.ledger.balance(s.registry.address()), eth("0.01"));
    assert!(s.registry.get_listing(s.id).expect("book").is_available());
    assert_eq!(s.registry.treasury().escrowed, Amount::ZERO);
}

#[test]
fn state_is_final_before_the_refund_lands() {
    let s = scene(OnReject::Swallow);
    let me = s.attacker.me.clone();
    s.registry
        .rent_item(s.id, &me, eth("0.11"), at_minute(0))
        .expect("rent");
    s.attacker.aim(s.id, at_minute(3));

    s.registry
        .return_item(s.id, &me, Amount::ZERO, at_minute(3))
        .expect("outer return");

    assert_eq!(*s.attacker.seen_available.lock(), vec![true]);
}

#[test]
fn propagated_rejection_reverts_the_whole_return() {
    let s = scene(OnReject::Propagate);
    let me = s.attacker.me.clone();
    s.registry
        .rent_item(s.id, &me, eth("0.11"), at_minute(0))
        .expect("rent");
    s.attacker.aim(s.id, at_minute(3));
    let treasury = s.registry.treasury();

    let err = s
        .registry
        .return_item(s.id, &me, Amount::ZERO, at_minute(3))
        .expect_err("hook refused refund");

    assert!(matches!(err, RentalError::TransferFailed(_)));
    let book = s.registry.get_listing(s.id).expect("book");
    assert_eq!(book.renter(), Some(&me));
    assert_eq!(book.rental_start_time(), Some(at_minute(0)));
    assert_eq!(s.registry.treasury(), treasury);
    assert_eq!(s.ledger.balance(&me), eth("4.89"));
    assert_eq!(s.ledger.balance(&s.owner), Amount::ZERO);
    assert_eq!(s.ledger.balance(s.registry.address()), eth("0.11"));
}

// ============================================================================
// Rent-time reentry
// ============================================================================

#[test]
fn excess_refund_hook_cannot_double_rent_or_return() {
    let s = scene(OnReject::Swallow);
    let me = s.attacker.me.clone();
    s.attacker.aim(s.id, at_minute(0));

    let receipt = s
        .registry
        .rent_item(s.id, &me, eth("1"), at_minute(0))
        .expect("outer rent");

    assert_eq!(receipt.excess_refund, eth("0.89"));
    assert_eq!(
        *s.attacker.nested.lock(),
        vec![Err(RentalError::Reentrant), Err(RentalError::Reentrant)]
    );
    // The hook saw the book already taken.
    assert_eq!(*s.attacker.seen_available.lock(), vec![false]);
    assert_eq!(s.ledger.balance(&me), eth("4.89"));
    assert_eq!(s.registry.treasury().escrowed, eth("0.11"));
}

#[test]
fn registry_is_usable_after_rejected_reentry() {
    let s = scene(OnReject::Propagate);
    let me = s.attacker.me.clone();
    s.registry
        .rent_item(s.id, &me, eth("0.11"), at_minute(0))
        .expect("rent");
    s.attacker.aim(s.id, at_minute(3));
    s.registry
        .return_item(s.id, &me, Amount::ZERO, at_minute(3))
        .expect_err("reverted");

    // Stand down and settle normally.
    *s.attacker.target.lock() = None;
    let receipt = s
        .registry
        .return_item(s.id, &me, Amount::ZERO, at_minute(4))
        .expect("clean return");
    assert_eq!(receipt.payout.owner_payment, eth("0.04"));
    assert_eq!(s.ledger.balance(&me), eth("4.95"));
}

// ============================================================================
// Value moved out before refusing
// ============================================================================

/// Receive hook that passes the refund on to an accomplice and then refuses
/// it, hoping the refusal reverts the return but not the forward.
struct Siphon {
    ledger: OnceLock<Weak<InMemoryLedger>>,
    accomplice: Address,
}

impl Recipient for Siphon {
    fn on_receive(&self, transfer: &Transfer) -> Result<(), String> {
        if transfer.kind != TransferKind::RenterRefund {
            return Ok(());
        }
        let Some(ledger) = self.ledger.get().and_then(Weak::upgrade) else {
            return Ok(());
        };
        ledger
            .execute(&[Transfer::new(
                TransferKind::OwnerPayment,
                transfer.to.clone(),
                self.accomplice.clone(),
                transfer.amount,
            )])
            .map_err(|e| e.to_string())?;
        Err("refuse".to_string())
    }
}

#[test]
fn forwarding_then_refusing_cannot_drain_escrow() {
    let s = scene(OnReject::Swallow);
    let me = s.attacker.me.clone();
    let accomplice = Address::derive("accomplice");
    s.registry
        .rent_item(s.id, &me, eth("0.11"), at_minute(0))
        .expect("rent");

    let siphon = Arc::new(Siphon {
        ledger: OnceLock::new(),
        accomplice: accomplice.clone(),
    });
    siphon
        .ledger
        .set(Arc::downgrade(&s.ledger))
        .expect("ledger set once");
    s.ledger.register_recipient(me.clone(), siphon);
    let supply = s.ledger.total_supply().expect("supply");

    for _ in 0..3 {
        let err = s
            .registry
            .return_item(s.id, &me, Amount::ZERO, at_minute(1))
            .expect_err("refund refused");
        assert!(matches!(err, RentalError::TransferFailed(_)));
    }

    assert_eq!(s.ledger.total_supply().expect("supply"), supply);
    assert_eq!(s.ledger.balance(&accomplice), Amount::ZERO);
    assert_eq!(s.ledger.balance(&me), eth("4.89"));
    assert_eq!(s.ledger.balance(&s.owner), Amount::ZERO);
    assert_eq!(s.ledger.balance(s.registry.address()), eth("0.11"));
    assert_eq!(s.registry.treasury().total(), Some(eth("0.11")));
    assert_eq!(s.registry.get_listing(s.id).expect("book").renter(), Some(&me));
}
