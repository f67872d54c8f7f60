use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use roomtab_core::account::{PersonalAccount, PublicAccount, normalize_name};
use roomtab_core::ledger::{Ledger, LedgerError};
use roomtab_core::split::{
    self, ElectricBill, ElectricOutcome, Share, SharedUtility, SplitError, SplitRule,
};
use tracing::debug;

/// One interactive billing session over a ledger file.
///
/// Owns the loaded document, the tracked roster and the dirty flag; command
/// handlers receive this context explicitly instead of sharing globals.
pub struct Session {
    ledger: Ledger,
    path: PathBuf,
    roster: BTreeSet<String>,
    dirty: bool,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let ledger = Ledger::load(path)?;
        debug!(
            "Loaded ledger from {} with {} catalog users",
            path.display(),
            ledger.catalog.len()
        );
        Ok(Self {
            ledger,
            path: path.to_path_buf(),
            roster: BTreeSet::new(),
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Attaches a catalog user to the tracked roster, returning the
    /// normalized name.
    pub fn attach_user(&mut self, name: &str) -> Result<String, LedgerError> {
        let key = normalize_name(name);
        self.ledger.user(&key)?;
        self.roster.insert(key.clone());
        Ok(key)
    }

    /// Tracked users, in stable name order.
    pub fn roster_names(&self) -> Vec<String> {
        self.roster.iter().cloned().collect()
    }

    /// Every user known to the ledger file, tracked or not.
    pub fn catalog_names(&self) -> Vec<String> {
        self.ledger.user_names()
    }

    pub fn shared_bill(
        &mut self,
        utility: SharedUtility,
        total: f64,
        rule: &SplitRule,
    ) -> Result<Vec<Share>, SplitError> {
        let shares = split::apply_shared_bill(
            &mut self.ledger.public,
            &mut self.ledger.catalog,
            &self.roster,
            utility,
            total,
            rule,
        )?;
        self.dirty = true;
        Ok(shares)
    }

    pub fn electric_bill(
        &mut self,
        bill: &ElectricBill,
        rule: &SplitRule,
    ) -> Result<ElectricOutcome, SplitError> {
        let outcome = split::apply_electric_bill(
            &mut self.ledger.public,
            &mut self.ledger.catalog,
            &self.roster,
            bill,
            rule,
        )?;
        self.dirty = true;
        Ok(outcome)
    }

    /// Tracked users with their current records, for display.
    pub fn tracked_accounts(&self) -> Vec<(String, &PersonalAccount)> {
        self.roster
            .iter()
            .filter_map(|name| {
                self.ledger
                    .catalog
                    .get(name)
                    .map(|account| (name.clone(), account))
            })
            .collect()
    }

    pub fn public(&self) -> &PublicAccount {
        &self.ledger.public
    }

    /// Persists the whole document, untracked catalog users included.
    pub fn save(&mut self) -> Result<(), LedgerError> {
        self.ledger.save(&self.path)?;
        self.dirty = false;
        debug!("Ledger saved to {}", self.path.display());
        Ok(())
    }
}
