//! Persistent CLI state.
//!
//! The registry snapshot and ledger balances live in one JSON file. Writes
//! go to a temp file in the same directory and are renamed into place, so a
//! crash never leaves a half-written state file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shelf_registry::{RegistryConfig, RegistrySnapshot, RentalRegistry};
use shelf_token::{Address, InMemoryLedger, LedgerSnapshot};
use tracing::debug;

use crate::error::CliError;

/// Everything the CLI persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfState {
    /// Listings and treasury.
    pub registry: RegistrySnapshot,
    /// Account balances.
    pub ledger: LedgerSnapshot,
    /// Account names used with `--as`.
    #[serde(default)]
    pub accounts: BTreeMap<String, Address>,
}

impl ShelfState {
    /// Load from `path`. A missing file is an empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| CliError::State(format!("{}: {e}", path.display())))
    }

    /// Write to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::State(format!("serialization failed: {e}")))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| CliError::Io(e.error))?;
        debug!(path = %path.display(), "state saved");
        Ok(())
    }
}

/// A registry and ledger opened from a state file.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    ledger: Arc<InMemoryLedger>,
    registry: RentalRegistry<Arc<InMemoryLedger>>,
    accounts: BTreeMap<String, Address>,
}

impl Session {
    /// Open the state at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded or the configuration
    /// is invalid.
    pub fn open(path: &Path, config: RegistryConfig) -> Result<Self, CliError> {
        let state = ShelfState::load(path)?;
        let ledger = Arc::new(InMemoryLedger::from_snapshot(state.ledger));
        let registry = RentalRegistry::from_snapshot(config, Arc::clone(&ledger), state.registry)?;
        Ok(Self {
            path: path.to_path_buf(),
            ledger,
            registry,
            accounts: state.accounts,
        })
    }

    /// The registry.
    pub const fn registry(&self) -> &RentalRegistry<Arc<InMemoryLedger>> {
        &self.registry
    }

    /// The ledger.
    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Resolve an account argument, remembering names.
    ///
    /// A base58 string that decodes to an address is used as-is. Anything
    /// else is treated as a name and mapped to a derived address.
    ///
    /// # Errors
    ///
    /// Returns an error if `who` is empty.
    pub fn resolve(&mut self, who: &str) -> Result<Address, CliError> {
        let address = Self::parse_account(who)?;
        if Address::from_base58(who).is_err() {
            self.accounts.insert(who.to_string(), address.clone());
        }
        Ok(address)
    }

    /// Resolve an account argument without remembering it.
    ///
    /// # Errors
    ///
    /// Returns an error if `who` is empty.
    pub fn lookup(&self, who: &str) -> Result<Address, CliError> {
        Self::parse_account(who)
    }

    fn parse_account(who: &str) -> Result<Address, CliError> {
        let who = who.trim();
        if who.is_empty() {
            return Err(CliError::InvalidArgument("account cannot be empty".into()));
        }
        Ok(Address::from_base58(who).unwrap_or_else(|_| Address::derive(who)))
    }

    /// Display name for an address: its remembered name, else the short form.
    pub fn name_of(&self, address: &Address) -> String {
        if address.is_zero() {
            return "-".to_string();
        }
        if address == self.registry.address() {
            return "registry".to_string();
        }
        self.accounts
            .iter()
            .find(|(_, known)| *known == address)
            .map_or_else(|| address.short(), |(name, _)| name.clone())
    }

    /// Persist the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn save(&self) -> Result<(), CliError> {
        ShelfState {
            registry: self.registry.snapshot(),
            ledger: self.ledger.snapshot(),
            accounts: self.accounts.clone(),
        }
        .save(&self.path)
    }
}
