//! Single-flight guard around registry state.
//!
//! Every mutating operation runs inside an [`Entered`] section. Sections are
//! serialized across threads. A second section opened on the same thread
//! while one is active (a payment recipient calling back into the registry
//! mid-transfer) is refused with [`RentalError::Reentrant`].
//!
//! Mutable access is confined to [`Entered::with_mut`] closures. Callers must
//! not hand control to external code from inside one; external calls happen
//! between closures, while the section stays entered.

use crate::error::{RentalError, Result};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::{Cell, RefCell};
use std::fmt;

struct Slot<T> {
    state: RefCell<T>,
    entered: Cell<bool>,
}

/// Owns registry state and arbitrates access to it.
pub struct TransferGuard<T> {
    slot: ReentrantMutex<Slot<T>>,
}

impl<T> TransferGuard<T> {
    /// Wrap `state`.
    pub fn new(state: T) -> Self {
        Self {
            slot: ReentrantMutex::new(Slot {
                state: RefCell::new(state),
                entered: Cell::new(false),
            }),
        }
    }

    /// Open a mutation section.
    ///
    /// Blocks while another thread holds a section. Fails immediately if
    /// this thread already holds one.
    ///
    /// Only same-thread nesting is detected. Code running inside a section
    /// that hands a registry call to another thread and waits for it never
    /// returns: the other thread blocks here until the section closes.
    pub fn enter(&self) -> Result<Entered<'_, T>> {
        let slot = self.slot.lock();
        if slot.entered.get() {
            return Err(RentalError::Reentrant);
        }
        slot.entered.set(true);
        Ok(Entered { slot })
    }

    /// Whether the current thread is inside a mutation section.
    ///
    /// Always false when called from a thread that does not hold the guard,
    /// since it waits for the section to close first.
    pub fn is_entered(&self) -> bool {
        self.slot.lock().entered.get()
    }

    /// Run a read-only query.
    ///
    /// Allowed from inside a section, so a recipient hook can inspect the
    /// registry while a transfer to it is in flight.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let slot = self.slot.lock();
        // No RefMut outlives a with_mut closure, so this borrow cannot clash.
        let state = slot.state.borrow();
        f(&state)
    }

    /// Consume the guard and return the state.
    pub fn into_inner(self) -> T {
        self.slot.into_inner().state.into_inner()
    }
}

impl<T: fmt::Debug> fmt::Debug for TransferGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot.try_lock() {
            Some(slot) => f
                .debug_struct("TransferGuard")
                .field("entered", &slot.entered.get())
                .finish_non_exhaustive(),
            None => f.write_str("TransferGuard { <locked> }"),
        }
    }
}

/// An open mutation section. Closes on drop.
pub struct Entered<'a, T> {
    slot: ReentrantMutexGuard<'a, Slot<T>>,
}

impl<T> Entered<'_, T> {
    /// Mutate the state.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut state = self.slot.state.borrow_mut();
        f(&mut state)
    }

    /// Read the state.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let state = self.slot.state.borrow();
        f(&state)
    }
}

impl<T> Drop for Entered<'_, T> {
    fn drop(&mut self) {
        self.slot.entered.set(false);
    }
}
