//! In-memory simulated chain ledger.
//!
//! Holds account balances and executes transfer batches atomically. Accounts
//! may register a [`Recipient`] hook that runs whenever they are credited,
//! which is how contract-like counterparties (including hostile ones) get a
//! chance to call back into whoever is paying them.
//!
//! # Rollback
//!
//! A batch holds the ledger from its first debit until its last hook
//! returns. Every account it touches has its pre-batch balance journaled,
//! and so does every account touched by a nested batch or faucet call made
//! from one of its hooks. A failed batch puts each journaled balance back
//! exactly, so value a hook moved elsewhere before refusing is recovered
//! too.

use crate::address::Address;
use crate::amount::Amount;
use crate::error::{Result, TokenError};
use crate::transfer::{PaymentRail, Transfer, TransferId, TransferReceipt};
use chrono::Utc;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Code that runs when an account receives value.
///
/// Returning an error refuses the transfer, which rolls back the whole
/// batch it arrived in, including anything the hook itself moved.
///
/// Hooks run on the paying thread while the ledger is held for the batch.
/// Calls made from that thread (nested transfers, balance reads, calls back
/// into the payer) proceed normally. Calls made from any other thread wait
/// until the batch finishes, so a hook must not block on another thread that
/// touches this ledger or the payer.
pub trait Recipient: Send + Sync {
    /// Called after the transfer has been credited.
    fn on_receive(&self, transfer: &Transfer) -> std::result::Result<(), String>;
}

/// Serializable balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Balance per account.
    pub balances: BTreeMap<Address, Amount>,
}

/// Balances as they stood before a batch, and the receipts it issued.
#[derive(Default)]
struct Frame {
    before: HashMap<Address, Option<Amount>>,
    receipts: Vec<TransferReceipt>,
}

impl Frame {
    fn note(&mut self, balances: &HashMap<Address, Amount>, address: &Address) {
        self.before
            .entry(address.clone())
            .or_insert_with(|| balances.get(address).copied());
    }

    /// Fold a committed nested batch into its parent. The parent's own
    /// entries are older and win.
    fn absorb(&mut self, nested: Self) {
        for (address, before) in nested.before {
            self.before.entry(address).or_insert(before);
        }
        self.receipts.extend(nested.receipts);
    }
}

/// Simulated chain ledger.
pub struct InMemoryLedger {
    journal: ReentrantMutex<RefCell<Vec<Frame>>>,
    balances: Mutex<HashMap<Address, Amount>>,
    recipients: RwLock<HashMap<Address, Arc<dyn Recipient>>>,
    receipts: Mutex<Vec<TransferReceipt>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            journal: ReentrantMutex::new(RefCell::new(Vec::new())),
            balances: Mutex::new(HashMap::new()),
            recipients: RwLock::new(HashMap::new()),
            receipts: Mutex::new(Vec::new()),
        }
    }

    /// Restore balances from a snapshot. Recipient hooks are not persisted.
    #[must_use]
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let ledger = Self::new();
        ledger.balances.lock().extend(snapshot.balances);
        ledger
    }

    /// Capture current balances.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        let _journal = self.journal.lock();
        let balances = self.balances.lock();
        LedgerSnapshot {
            balances: balances
                .iter()
                .filter(|(_, amount)| !amount.is_zero())
                .map(|(address, amount)| (address.clone(), *amount))
                .collect(),
        }
    }

    /// Balance of an address (zero if never seen).
    #[must_use]
    pub fn balance(&self, address: &Address) -> Amount {
        let _journal = self.journal.lock();
        self.balances.lock().get(address).copied().unwrap_or(Amount::ZERO)
    }

    /// Sum of every balance.
    ///
    /// # Errors
    ///
    /// Returns error if the total does not fit in an [`Amount`].
    pub fn total_supply(&self) -> Result<Amount> {
        let _journal = self.journal.lock();
        self.balances
            .lock()
            .iter()
            .try_fold(Amount::ZERO, |total, (address, amount)| {
                total.checked_add(*amount).ok_or_else(|| TokenError::Overflow {
                    address: address.clone(),
                })
            })
    }

    /// Mint value into an account (faucet for simulations and tests).
    ///
    /// Minting from inside a hook is journaled with the batch that ran the
    /// hook.
    ///
    /// # Errors
    ///
    /// Returns error if the balance would overflow.
    pub fn fund(&self, address: &Address, amount: Amount) -> Result<()> {
        let journal = self.journal.lock();
        let mut balances = self.balances.lock();
        if let Some(frame) = journal.borrow_mut().last_mut() {
            frame.note(&balances, address);
        }
        let entry = balances.entry(address.clone()).or_insert(Amount::ZERO);
        *entry = entry.checked_add(amount).ok_or_else(|| TokenError::Overflow {
            address: address.clone(),
        })?;
        info!(address = %address, amount = %amount, "account funded");
        Ok(())
    }

    /// Install a receive hook for an address, replacing any previous one.
    pub fn register_recipient(&self, address: Address, recipient: Arc<dyn Recipient>) {
        self.recipients.write().insert(address, recipient);
    }

    /// Remove the receive hook for an address.
    pub fn unregister_recipient(&self, address: &Address) {
        self.recipients.write().remove(address);
    }

    /// Every committed receipt, oldest first.
    #[must_use]
    pub fn receipts(&self) -> Vec<TransferReceipt> {
        self.receipts.lock().clone()
    }

    fn apply(balances: &mut HashMap<Address, Amount>, transfer: &Transfer) -> Result<()> {
        let have = balances.get(&transfer.from).copied().unwrap_or(Amount::ZERO);
        let remaining = have
            .checked_sub(transfer.amount)
            .ok_or_else(|| TokenError::InsufficientBalance {
                address: transfer.from.clone(),
                have,
                need: transfer.amount,
            })?;
        let credited = balances
            .get(&transfer.to)
            .copied()
            .unwrap_or(Amount::ZERO)
            .checked_add(transfer.amount);

        // Self-transfers only need the balance check above.
        if transfer.from == transfer.to {
            return Ok(());
        }
        let credited = credited.ok_or_else(|| TokenError::Overflow {
            address: transfer.to.clone(),
        })?;
        balances.insert(transfer.from.clone(), remaining);
        balances.insert(transfer.to.clone(), credited);
        Ok(())
    }

    /// Debit and credit the batch, then run hooks. The caller owns the
    /// frame and rolls it back on error.
    fn run(&self, journal: &RefCell<Vec<Frame>>, batch: &[Transfer]) -> Result<Vec<TransferReceipt>> {
        {
            let mut balances = self.balances.lock();
            let mut frames = journal.borrow_mut();
            for transfer in batch {
                if let Some(frame) = frames.last_mut() {
                    frame.note(&balances, &transfer.from);
                    frame.note(&balances, &transfer.to);
                }
                if let Err(e) = Self::apply(&mut balances, transfer) {
                    warn!(error = %e, kind = %transfer.kind, "transfer batch aborted");
                    return Err(e);
                }
            }
        }

        // Neither the balance lock nor the journal borrow is held here: a
        // recipient may read balances or start nested batches.
        for transfer in batch {
            let hook = self.recipients.read().get(&transfer.to).cloned();
            if let Some(hook) = hook {
                if let Err(reason) = hook.on_receive(transfer) {
                    warn!(
                        recipient = %transfer.to,
                        reason = %reason,
                        "recipient refused transfer, batch rolled back"
                    );
                    return Err(TokenError::Rejected {
                        recipient: transfer.to.clone(),
                        reason,
                    });
                }
            }
        }

        let executed_at = Utc::now();
        Ok(batch
            .iter()
            .map(|transfer| TransferReceipt {
                id: TransferId::new(),
                transfer: transfer.clone(),
                executed_at,
            })
            .collect())
    }

    fn restore(&self, frame: Frame) {
        let mut balances = self.balances.lock();
        for (address, before) in frame.before {
            match before {
                Some(amount) => balances.insert(address, amount),
                None => balances.remove(&address),
            };
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentRail for InMemoryLedger {
    fn execute(&self, batch: &[Transfer]) -> Result<Vec<TransferReceipt>> {
        let journal = self.journal.lock();
        journal.borrow_mut().push(Frame::default());
        let outcome = self.run(&journal, batch);
        let mut frame = journal.borrow_mut().pop().unwrap_or_default();

        match outcome {
            Ok(receipts) => {
                frame.receipts.extend(receipts.iter().cloned());
                let mut frames = journal.borrow_mut();
                match frames.last_mut() {
                    Some(parent) => parent.absorb(frame),
                    None => self.receipts.lock().extend(frame.receipts),
                }
                debug!(transfers = batch.len(), nested = !frames.is_empty(), "transfer batch committed");
                Ok(receipts)
            }
            Err(e) => {
                self.restore(frame);
                Err(e)
            }
        }
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("accounts", &self.balances.lock().len())
            .field("recipients", &self.recipients.read().len())
            .finish_non_exhaustive()
    }
}
