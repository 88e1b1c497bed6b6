use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::Result;

use super::{ReadStore, WriteStore};

/// The state of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// The unit of work is accepting operations.
    Active,
    /// The buffered writes were applied to the base store.
    Committed,
    /// The buffered writes were discarded.
    RolledBack,
}

/// A buffered unit of work over a [`WriteStore`].
///
/// Writes land in a pending overlay and become visible to reads issued
/// through the transaction, so an operation always sees its own earlier
/// writes. Nothing reaches the base store until [`commit`](Self::commit);
/// [`rollback`](Self::rollback) or dropping the transaction discards the
/// overlay. A hard failure inside an operation therefore aborts the whole
/// unit of work with no partial mutation observable afterwards.
#[derive(Debug)]
pub struct Transaction<'s, S: WriteStore> {
    base: &'s mut S,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    state: TxState,
}

impl<'s, S: WriteStore> Transaction<'s, S> {
    /// Opens a unit of work over `base`.
    pub fn begin(base: &'s mut S) -> Self {
        debug!("unit of work started");
        Self {
            base,
            pending: BTreeMap::new(),
            state: TxState::Active,
        }
    }

    /// Current state.
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Number of buffered writes.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Applies the buffered writes to the base store.
    pub fn commit(mut self) -> Result<()> {
        let writes = self.pending.len();
        for (key, entry) in std::mem::take(&mut self.pending) {
            match entry {
                Some(value) => self.base.put(&key, &value)?,
                None => self.base.delete(&key)?,
            }
        }
        self.state = TxState::Committed;
        info!(pending_writes = writes, "unit of work committed");
        Ok(())
    }

    /// Discards the buffered writes.
    pub fn rollback(mut self) {
        let writes = self.pending.len();
        self.pending.clear();
        self.state = TxState::RolledBack;
        warn!(discarded_writes = writes, "unit of work rolled back");
    }
}

impl<S: WriteStore> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if self.state == TxState::Active {
            debug!(
                discarded_writes = self.pending.len(),
                "unit of work dropped without commit; writes discarded"
            );
        }
    }
}

impl<S: WriteStore> ReadStore for Transaction<'_, S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(Some(value)) => Ok(Some(value.clone())),
            Some(None) => Ok(None),
            None => self.base.get(key),
        }
    }
}

impl<S: WriteStore> WriteStore for Transaction<'_, S> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }
}

/// Runs `op` inside a fresh unit of work, committing on `Ok` and discarding
/// every buffered write on `Err`.
pub fn with_unit<S, T, F>(store: &mut S, op: F) -> Result<T>
where
    S: WriteStore,
    F: FnOnce(&mut Transaction<'_, S>) -> Result<T>,
{
    let mut tx = Transaction::begin(store);
    match op(&mut tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            tx.rollback();
            Err(err)
        }
    }
}
