//! Integration tests for concurrent callers.
//!
//! Operations on one registry are serialized: racing renters see exactly one
//! winner and the treasury never drifts from the registry's ledger balance.

use std::sync::{Arc, Barrier};
use std::thread;

use shelf_registry::{BookId, NewListing, RegistryConfig, RentalError, RentalRegistry, Timestamp};
use shelf_token::{Address, Amount, InMemoryLedger};

// ============================================================================
// Helper Functions
// ============================================================================

const THREADS: usize = 8;

fn eth(text: &str) -> Amount {
    Amount::parse(text).expect("valid amount")
}

fn listing(title: &str) -> NewListing {
    NewListing {
        title: title.to_string(),
        author: "Ursula K. Le Guin".to_string(),
        price_per_minute: eth("0.01"),
        deposit: eth("0.1"),
        ..NewListing::default()
    }
}

fn setup() -> (Arc<InMemoryLedger>, Arc<RentalRegistry<Arc<InMemoryLedger>>>) {
    let ledger = Arc::new(InMemoryLedger::new());
    let registry = RentalRegistry::new(RegistryConfig::default(), Arc::clone(&ledger)).expect("registry");
    (ledger, Arc::new(registry))
}

fn renter(n: usize) -> Address {
    Address::derive(&format!("renter-{n}"))
}

// ============================================================================
// Races
// ============================================================================

#[test]
fn racing_renters_produce_one_winner() {
    let (ledger, registry) = setup();
    let id = registry
        .create_listing(listing("The Dispossessed"), &Address::derive("owner"))
        .expect("list");
    for n in 0..THREADS {
        ledger.fund(&renter(n), eth("1")).expect("fund");
    }

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.rent_item(id, &renter(n), eth("0.11"), Timestamp::from_unix_secs(0))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().expect("thread")).collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(e) = result {
            assert_eq!(e, &RentalError::NotAvailable { id });
        }
    }

    let winner = winners[0].renter.clone();
    let book = registry.get_listing(id).expect("book");
    assert_eq!(book.renter(), Some(&winner));
    assert_eq!(ledger.balance(registry.address()), eth("0.11"));
    assert_eq!(ledger.balance(&winner), eth("0.89"));
}

#[test]
fn concurrent_listings_get_unique_sequential_ids() {
    let (_ledger, registry) = setup();
    let per_thread = 25;

    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let owner = Address::derive(&format!("owner-{n}"));
                (0..per_thread)
                    .map(|i| {
                        registry
                            .create_listing(listing(&format!("Volume {n}-{i}")), &owner)
                            .expect("list")
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<BookId> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("thread"))
        .collect();
    ids.sort_unstable_by_key(|id| id.get());

    let expected: Vec<_> = (0..(THREADS * per_thread) as u64).map(BookId::new).collect();
    assert_eq!(ids, expected);
    assert_eq!(registry.count(), (THREADS * per_thread) as u64);
}

#[test]
fn treasury_tracks_ledger_under_concurrent_cycles() {
    let (ledger, registry) = setup();
    let owner = Address::derive("owner");
    let ids: Vec<_> = (0..THREADS)
        .map(|n| {
            registry
                .create_listing(listing(&format!("Earthsea {n}")), &owner)
                .expect("list")
        })
        .collect();
    for n in 0..THREADS {
        ledger.fund(&renter(n), eth("10")).expect("fund");
    }

    let handles: Vec<_> = ids
        .into_iter()
        .enumerate()
        .map(|(n, id)| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let who = renter(n);
                for round in 0..5_u64 {
                    let start = round * 3_600;
                    registry
                        .rent_item(id, &who, eth("0.11"), Timestamp::from_unix_secs(start))
                        .expect("rent");
                    registry
                        .return_item(id, &who, Amount::ZERO, Timestamp::from_unix_secs(start + 180))
                        .expect("return");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    let treasury = registry.treasury();
    assert_eq!(treasury.escrowed, Amount::ZERO);
    // One prepaid minute kept per rental.
    assert_eq!(treasury.retained, eth("0.4"));
    assert_eq!(treasury.total(), Some(ledger.balance(registry.address())));
    assert_eq!(ledger.balance(&owner), eth("1.2"));
    assert_eq!(registry.available_listings().len(), THREADS);
}
