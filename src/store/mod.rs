//! Storage backend contract and the buffered unit of work.
//!
//! Two traits model the two access modes: [`ReadStore`] is the read-only
//! handle, [`WriteStore`] the read-write one. Collections never hold a
//! storage handle; every operation takes one explicitly.

mod memory;
mod transaction;

pub use memory::MemoryStore;
pub use transaction::{with_unit, Transaction, TxState};

use crate::error::Result;

/// Read-only access to a key-value backend.
pub trait ReadStore {
    /// Returns the bytes stored under `key`, or `None` when absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
}

/// Read-write access to a key-value backend. Last write wins until deleted.
pub trait WriteStore: ReadStore {
    /// Stores `value` under `key`, replacing any previous bytes.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;
    /// Removes `key`; removing an absent key is a no-op.
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}
