//! Persistent, externally-identified linked collections over a key-value
//! store.
//!
//! Three structures share one design pattern: an identifier-keyed node
//! table, a few scalar anchor slots, and a count, all namespaced under a
//! caller-chosen prefix byte. Nothing is cached between calls; every
//! operation reconstructs exactly the neighborhood of nodes it needs from
//! storage, mutates it, and persists the result.
//!
//! Mutations are meant to run inside a [`Transaction`]: a hard failure
//! (removal target absent, unknown identifier, identifier reuse) propagates
//! as an error and the unit of work discards every buffered write, so no
//! partially mutated structure is ever observable.
//!
//! ```
//! use linkstore::{with_unit, MemoryStore, NodeId, SingleLinkedList};
//!
//! let mut store = MemoryStore::new();
//! let list = SingleLinkedList::<i64>::new(0x00);
//! with_unit(&mut store, |tx| {
//!     list.add_first(tx, NodeId::from("a"), &1)?;
//!     list.add_last(tx, NodeId::from("b"), &2)
//! })?;
//! assert_eq!(list.count(&store)?, 2);
//! # Ok::<(), linkstore::StoreError>(())
//! ```

#![warn(missing_docs)]

/// Binary record codec and the [`StoredValue`] value seam.
pub mod codec;
/// The singly linked list, doubly linked list, and binary search tree.
pub mod collections;
/// Failure taxonomy.
pub mod error;
/// Identifiers and insertion policies.
pub mod model;
/// Storage backend contract, in-memory backend, and the unit of work.
pub mod store;

pub use codec::StoredValue;
pub use collections::{BinaryTree, Comparator, DoubleLinkedList, NaturalOrder, SingleLinkedList};
pub use error::{Result, StoreError};
pub use model::{DuplicatePolicy, NodeId};
pub use store::{with_unit, MemoryStore, ReadStore, Transaction, TxState, WriteStore};
