//! The three persistent collections and their shared key plumbing.
//!
//! Every instance namespaces its storage under one caller-chosen prefix
//! byte: a handful of scalar slots (anchors, count) live at two-byte keys,
//! and the node table is a sub-namespace keyed by node identifier. Prefixes
//! must not collide across instances sharing a backend; that contract is the
//! caller's.

mod double;
mod single;
mod tree;

pub use double::DoubleLinkedList;
pub use single::SingleLinkedList;
pub use tree::{BinaryTree, Comparator, NaturalOrder};

use smallvec::SmallVec;

use crate::codec::{decode_count, encode_count};
use crate::error::{Result, StoreError};
use crate::model::{DuplicatePolicy, NodeId};
use crate::store::{ReadStore, WriteStore};

pub(crate) type KeyBuf = SmallVec<[u8; 24]>;

pub(crate) fn slot_key(prefix: u8, slot: u8) -> [u8; 2] {
    [prefix, slot]
}

pub(crate) fn node_key(prefix: u8, slot: u8, id: &NodeId) -> KeyBuf {
    let mut key = KeyBuf::with_capacity(2 + id.as_bytes().len());
    key.push(prefix);
    key.push(slot);
    key.extend_from_slice(id.as_bytes());
    key
}

pub(crate) fn read_anchor(store: &impl ReadStore, key: [u8; 2]) -> Result<Option<NodeId>> {
    match store.get(&key)? {
        None => Ok(None),
        Some(bytes) if bytes.is_empty() => {
            Err(StoreError::Corruption("empty anchor slot".into()))
        }
        Some(bytes) => Ok(Some(NodeId::from(bytes))),
    }
}

pub(crate) fn write_anchor(store: &mut impl WriteStore, key: [u8; 2], id: &NodeId) -> Result<()> {
    store.put(&key, id.as_bytes())
}

/// Absent count slot reads as zero.
pub(crate) fn read_count(store: &impl ReadStore, key: [u8; 2]) -> Result<u64> {
    match store.get(&key)? {
        None => Ok(0),
        Some(bytes) => decode_count(&bytes),
    }
}

pub(crate) fn increase_count(store: &mut impl WriteStore, key: [u8; 2]) -> Result<()> {
    let count = read_count(store, key)?;
    store.put(&key, &encode_count(count + 1))
}

pub(crate) fn decrease_count(store: &mut impl WriteStore, key: [u8; 2]) -> Result<()> {
    let count = read_count(store, key)?;
    if count == 0 {
        return Err(StoreError::Corruption("count underflow".into()));
    }
    store.put(&key, &encode_count(count - 1))
}

pub(crate) fn ensure_insertable(
    store: &impl ReadStore,
    node_key: &[u8],
    id: &NodeId,
    policy: DuplicatePolicy,
) -> Result<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidArgument("identifier must be non-empty"));
    }
    if policy == DuplicatePolicy::Reject && store.get(node_key)?.is_some() {
        return Err(StoreError::DuplicateId(id.clone()));
    }
    Ok(())
}
