use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{LedgerError, Result};
use crate::{Ledger, SealedBlock, Transaction};

/// Thread-safe handle to one [`Ledger`]. Each call takes the lock once, so a
/// whole mining cycle (build, search, admit, clear) runs against a tip no
/// other caller can move.
#[derive(Clone, Debug, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Queue a record; returns the pending count after the append.
    pub fn add_new_transaction(&self, record: impl Into<Transaction>) -> Result<usize> {
        let mut ledger = self.lock()?;
        ledger.add_new_transaction(record);
        Ok(ledger.pending().len())
    }

    pub fn mine(&self) -> Result<u64> {
        self.lock()?.mine()
    }

    pub fn check_chain_validity(&self) -> Result<bool> {
        Ok(self.lock()?.check_chain_validity())
    }

    pub fn verify_chain(&self) -> Result<()> {
        self.lock()?.verify_chain()
    }

    /// Snapshot of the sealed chain.
    pub fn chain(&self) -> Result<Vec<SealedBlock>> {
        Ok(self.lock()?.chain().to_vec())
    }

    pub fn pending(&self) -> Result<Vec<Transaction>> {
        Ok(self.lock()?.pending().to_vec())
    }

    pub fn tip(&self) -> Result<SealedBlock> {
        Ok(self.lock()?.last_block().clone())
    }

    /// Run `f` with read access under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> Result<R> {
        Ok(f(&*self.lock()?))
    }
}
