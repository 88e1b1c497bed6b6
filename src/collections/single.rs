use std::marker::PhantomData;

use tracing::debug;

use crate::codec::{write_opt_id, write_value, Cursor, StoredValue};
use crate::error::{Result, StoreError};
use crate::model::{DuplicatePolicy, NodeId};
use crate::store::{ReadStore, WriteStore};

use super::{
    decrease_count, ensure_insertable, increase_count, node_key, read_anchor, read_count,
    slot_key, write_anchor, KeyBuf,
};

const SLOT_FIRST: u8 = 0x00;
const SLOT_NODES: u8 = 0x01;
const SLOT_COUNT: u8 = 0x02;

struct ListNode<T> {
    value: T,
    next: Option<NodeId>,
}

fn encode_record<T: StoredValue>(value: &T, next: Option<&NodeId>) -> Vec<u8> {
    let mut buf = Vec::new();
    write_opt_id(&mut buf, next);
    write_value(&mut buf, value);
    buf
}

impl<T: StoredValue> ListNode<T> {
    fn encode(&self) -> Vec<u8> {
        encode_record(&self.value, self.next.as_ref())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let next = cursor.read_opt_id()?;
        let value = cursor.read_value()?;
        cursor.ensure_consumed()?;
        Ok(Self { value, next })
    }
}

/// Persistent forward-only linked list with caller-supplied node
/// identifiers.
///
/// The instance itself is just a prefix and a policy; all state lives in the
/// storage backend and every operation takes an explicit storage handle.
pub struct SingleLinkedList<T> {
    prefix: u8,
    duplicates: DuplicatePolicy,
    _values: PhantomData<T>,
}

impl<T: StoredValue> SingleLinkedList<T> {
    /// Creates a handle over the instance namespaced by `prefix`.
    pub fn new(prefix: u8) -> Self {
        Self {
            prefix,
            duplicates: DuplicatePolicy::default(),
            _values: PhantomData,
        }
    }

    /// Sets the identifier-reuse policy for inserts.
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    fn first_key(&self) -> [u8; 2] {
        slot_key(self.prefix, SLOT_FIRST)
    }

    fn count_key(&self) -> [u8; 2] {
        slot_key(self.prefix, SLOT_COUNT)
    }

    fn node_key(&self, id: &NodeId) -> KeyBuf {
        node_key(self.prefix, SLOT_NODES, id)
    }

    fn load(&self, store: &impl ReadStore, id: &NodeId) -> Result<ListNode<T>> {
        match store.get(&self.node_key(id))? {
            Some(bytes) => ListNode::decode(&bytes),
            None => Err(StoreError::UnknownId(id.clone())),
        }
    }

    fn store_node(
        &self,
        store: &mut impl WriteStore,
        id: &NodeId,
        node: &ListNode<T>,
    ) -> Result<()> {
        store.put(&self.node_key(id), &node.encode())
    }

    /// Identifier of the head node, or `None` when the list is empty.
    pub fn first_id(&self, store: &impl ReadStore) -> Result<Option<NodeId>> {
        read_anchor(store, self.first_key())
    }

    /// Identifier of the node after `id`, or `None` at the tail.
    pub fn next_id(&self, store: &impl ReadStore, id: &NodeId) -> Result<Option<NodeId>> {
        Ok(self.load(store, id)?.next)
    }

    /// Value stored under `id`.
    pub fn value(&self, store: &impl ReadStore, id: &NodeId) -> Result<T> {
        Ok(self.load(store, id)?.value)
    }

    /// Value of the head node, or `None` when the list is empty.
    pub fn first_value(&self, store: &impl ReadStore) -> Result<Option<T>> {
        match self.first_id(store)? {
            None => Ok(None),
            Some(id) => Ok(Some(self.load(store, &id)?.value)),
        }
    }

    /// Value of the node after `id`, or `None` at the tail.
    pub fn next_value(&self, store: &impl ReadStore, id: &NodeId) -> Result<Option<T>> {
        match self.next_id(store, id)? {
            None => Ok(None),
            Some(next) => Ok(Some(self.load(store, &next)?.value)),
        }
    }

    /// Number of nodes in the list.
    pub fn count(&self, store: &impl ReadStore) -> Result<u64> {
        read_count(store, self.count_key())
    }

    /// Inserts a new head node.
    pub fn add_first(&self, store: &mut impl WriteStore, id: NodeId, value: &T) -> Result<()> {
        ensure_insertable(store, &self.node_key(&id), &id, self.duplicates)?;
        let next = self.first_id(store)?;
        write_anchor(store, self.first_key(), &id)?;
        store.put(&self.node_key(&id), &encode_record(value, next.as_ref()))?;
        increase_count(store, self.count_key())
    }

    /// Appends a new tail node, walking the chain from the head.
    pub fn add_last(&self, store: &mut impl WriteStore, id: NodeId, value: &T) -> Result<()> {
        let first_id = match self.first_id(store)? {
            None => return self.add_first(store, id, value),
            Some(first_id) => first_id,
        };
        ensure_insertable(store, &self.node_key(&id), &id, self.duplicates)?;
        let mut tail_id = first_id;
        let mut tail = self.load(store, &tail_id)?;
        while let Some(next_id) = tail.next.clone() {
            tail_id = next_id;
            tail = self.load(store, &tail_id)?;
        }
        tail.next = Some(id.clone());
        self.store_node(store, &tail_id, &tail)?;
        store.put(&self.node_key(&id), &encode_record(value, None))?;
        increase_count(store, self.count_key())
    }

    /// Splices a new node in directly after `parent`.
    pub fn add_after(
        &self,
        store: &mut impl WriteStore,
        parent: &NodeId,
        id: NodeId,
        value: &T,
    ) -> Result<()> {
        ensure_insertable(store, &self.node_key(&id), &id, self.duplicates)?;
        let mut parent_node = self.load(store, parent)?;
        let next = parent_node.next.replace(id.clone());
        store.put(&self.node_key(&id), &encode_record(value, next.as_ref()))?;
        self.store_node(store, parent, &parent_node)?;
        increase_count(store, self.count_key())
    }

    /// Removes the head node. Removing the only node drops the anchor and
    /// count entries entirely.
    pub fn remove_first(&self, store: &mut impl WriteStore) -> Result<()> {
        let first_id = self.first_id(store)?.ok_or(StoreError::ValueNotFound)?;
        let first = self.load(store, &first_id)?;
        store.delete(&self.node_key(&first_id))?;
        match first.next {
            None => {
                store.delete(&self.first_key())?;
                store.delete(&self.count_key())
            }
            Some(next_id) => {
                write_anchor(store, self.first_key(), &next_id)?;
                decrease_count(store, self.count_key())
            }
        }
    }

    /// Removes the tail node.
    pub fn remove_last(&self, store: &mut impl WriteStore) -> Result<()> {
        let first_id = self.first_id(store)?.ok_or(StoreError::ValueNotFound)?;
        let mut parent_id = first_id;
        let mut parent = self.load(store, &parent_id)?;
        let mut current_id = match parent.next.clone() {
            None => return self.remove_first(store),
            Some(id) => id,
        };
        loop {
            let current = self.load(store, &current_id)?;
            match current.next.clone() {
                None => {
                    store.delete(&self.node_key(&current_id))?;
                    parent.next = None;
                    self.store_node(store, &parent_id, &parent)?;
                    return decrease_count(store, self.count_key());
                }
                Some(next_id) => {
                    parent_id = current_id;
                    parent = current;
                    current_id = next_id;
                }
            }
        }
    }

    /// Removes the node stored under `id`. Fails the unit of work with
    /// [`StoreError::ValueNotFound`] when `id` is not in the list.
    pub fn remove_by_id(&self, store: &mut impl WriteStore, id: &NodeId) -> Result<()> {
        let first_id = self.first_id(store)?.ok_or(StoreError::ValueNotFound)?;
        if *id == first_id {
            return self.remove_first(store);
        }
        let mut parent_id = first_id;
        let mut parent = self.load(store, &parent_id)?;
        while let Some(current_id) = parent.next.clone() {
            let current = self.load(store, &current_id)?;
            if current_id == *id {
                parent.next = current.next;
                store.delete(&self.node_key(&current_id))?;
                self.store_node(store, &parent_id, &parent)?;
                return decrease_count(store, self.count_key());
            }
            parent_id = current_id;
            parent = current;
        }
        Err(StoreError::ValueNotFound)
    }

    /// Removes the first node holding `value`. Fails the unit of work with
    /// [`StoreError::ValueNotFound`] when no node holds it.
    pub fn remove_by_value(&self, store: &mut impl WriteStore, value: &T) -> Result<()>
    where
        T: PartialEq,
    {
        let first_id = self.first_id(store)?.ok_or(StoreError::ValueNotFound)?;
        let first = self.load(store, &first_id)?;
        if first.value == *value {
            return self.remove_first(store);
        }
        let mut parent_id = first_id;
        let mut parent = first;
        while let Some(current_id) = parent.next.clone() {
            let current = self.load(store, &current_id)?;
            if current.value == *value {
                parent.next = current.next;
                store.delete(&self.node_key(&current_id))?;
                self.store_node(store, &parent_id, &parent)?;
                return decrease_count(store, self.count_key());
            }
            parent_id = current_id;
            parent = current;
        }
        Err(StoreError::ValueNotFound)
    }

    /// Identifier of the first node holding `value`, or `None`.
    pub fn find(&self, store: &impl ReadStore, value: &T) -> Result<Option<NodeId>>
    where
        T: PartialEq,
    {
        let mut cursor = self.first_id(store)?;
        while let Some(id) = cursor {
            let node = self.load(store, &id)?;
            if node.value == *value {
                return Ok(Some(id));
            }
            cursor = node.next;
        }
        Ok(None)
    }

    /// Destroys every node and drops the anchor and count entries.
    pub fn clear(&self, store: &mut impl WriteStore) -> Result<()> {
        debug!(prefix = self.prefix, "clearing single linked list");
        let mut cursor = self.first_id(store)?;
        store.delete(&self.first_key())?;
        while let Some(id) = cursor {
            let node = self.load(store, &id)?;
            store.delete(&self.node_key(&id))?;
            cursor = node.next;
        }
        store.delete(&self.count_key())
    }
}
