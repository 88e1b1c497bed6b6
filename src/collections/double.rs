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
const SLOT_LAST: u8 = 0x01;
const SLOT_NODES: u8 = 0x02;
const SLOT_COUNT: u8 = 0x03;

struct DoubleNode<T> {
    value: T,
    next: Option<NodeId>,
    prev: Option<NodeId>,
}

fn encode_record<T: StoredValue>(
    value: &T,
    next: Option<&NodeId>,
    prev: Option<&NodeId>,
) -> Vec<u8> {
    let mut buf = Vec::new();
    write_opt_id(&mut buf, next);
    write_opt_id(&mut buf, prev);
    write_value(&mut buf, value);
    buf
}

impl<T: StoredValue> DoubleNode<T> {
    fn encode(&self) -> Vec<u8> {
        encode_record(&self.value, self.next.as_ref(), self.prev.as_ref())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let next = cursor.read_opt_id()?;
        let prev = cursor.read_opt_id()?;
        let value = cursor.read_value()?;
        cursor.ensure_consumed()?;
        Ok(Self { value, next, prev })
    }
}

/// Persistent bidirectional linked list with independent `first`/`last`
/// anchors.
///
/// Invariant maintained across every operation: for adjacent nodes `A`, `B`,
/// `A.next = B` iff `B.prev = A`.
pub struct DoubleLinkedList<T> {
    prefix: u8,
    duplicates: DuplicatePolicy,
    _values: PhantomData<T>,
}

impl<T: StoredValue> DoubleLinkedList<T> {
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

    fn last_key(&self) -> [u8; 2] {
        slot_key(self.prefix, SLOT_LAST)
    }

    fn count_key(&self) -> [u8; 2] {
        slot_key(self.prefix, SLOT_COUNT)
    }

    fn node_key(&self, id: &NodeId) -> KeyBuf {
        node_key(self.prefix, SLOT_NODES, id)
    }

    fn load(&self, store: &impl ReadStore, id: &NodeId) -> Result<DoubleNode<T>> {
        match store.get(&self.node_key(id))? {
            Some(bytes) => DoubleNode::decode(&bytes),
            None => Err(StoreError::UnknownId(id.clone())),
        }
    }

    fn store_node(
        &self,
        store: &mut impl WriteStore,
        id: &NodeId,
        node: &DoubleNode<T>,
    ) -> Result<()> {
        store.put(&self.node_key(id), &node.encode())
    }

    /// Identifier of the head node, or `None` when the list is empty.
    pub fn first_id(&self, store: &impl ReadStore) -> Result<Option<NodeId>> {
        read_anchor(store, self.first_key())
    }

    /// Identifier of the tail node, or `None` when the list is empty.
    pub fn last_id(&self, store: &impl ReadStore) -> Result<Option<NodeId>> {
        read_anchor(store, self.last_key())
    }

    /// Identifier of the node after `id`, or `None` at the tail.
    pub fn next_id(&self, store: &impl ReadStore, id: &NodeId) -> Result<Option<NodeId>> {
        Ok(self.load(store, id)?.next)
    }

    /// Identifier of the node before `id`, or `None` at the head.
    pub fn prev_id(&self, store: &impl ReadStore, id: &NodeId) -> Result<Option<NodeId>> {
        Ok(self.load(store, id)?.prev)
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

    /// Value of the tail node, or `None` when the list is empty.
    pub fn last_value(&self, store: &impl ReadStore) -> Result<Option<T>> {
        match self.last_id(store)? {
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

    /// Value of the node before `id`, or `None` at the head.
    pub fn prev_value(&self, store: &impl ReadStore, id: &NodeId) -> Result<Option<T>> {
        match self.prev_id(store, id)? {
            None => Ok(None),
            Some(prev) => Ok(Some(self.load(store, &prev)?.value)),
        }
    }

    /// Number of nodes in the list.
    pub fn count(&self, store: &impl ReadStore) -> Result<u64> {
        read_count(store, self.count_key())
    }

    /// Inserts a new head node, fixing the former head's back-pointer and
    /// the `last` anchor when the list was empty.
    pub fn add_first(&self, store: &mut impl WriteStore, id: NodeId, value: &T) -> Result<()> {
        ensure_insertable(store, &self.node_key(&id), &id, self.duplicates)?;
        let old_first = self.first_id(store)?;
        write_anchor(store, self.first_key(), &id)?;
        if old_first.is_none() {
            write_anchor(store, self.last_key(), &id)?;
        }
        store.put(
            &self.node_key(&id),
            &encode_record(value, old_first.as_ref(), None),
        )?;
        if let Some(old_id) = old_first {
            let mut old = self.load(store, &old_id)?;
            old.prev = Some(id.clone());
            self.store_node(store, &old_id, &old)?;
        }
        increase_count(store, self.count_key())
    }

    /// Appends a new tail node, fixing the former tail's forward pointer and
    /// the `first` anchor when the list was empty.
    pub fn add_last(&self, store: &mut impl WriteStore, id: NodeId, value: &T) -> Result<()> {
        ensure_insertable(store, &self.node_key(&id), &id, self.duplicates)?;
        let old_last = self.last_id(store)?;
        write_anchor(store, self.last_key(), &id)?;
        if old_last.is_none() {
            write_anchor(store, self.first_key(), &id)?;
        }
        store.put(
            &self.node_key(&id),
            &encode_record(value, None, old_last.as_ref()),
        )?;
        if let Some(old_id) = old_last {
            let mut old = self.load(store, &old_id)?;
            old.next = Some(id.clone());
            self.store_node(store, &old_id, &old)?;
        }
        increase_count(store, self.count_key())
    }

    /// Splices a new node in directly after `parent`. A `None` parent
    /// degrades to [`add_first`](Self::add_first); splicing after the tail
    /// moves the `last` anchor.
    pub fn add_after(
        &self,
        store: &mut impl WriteStore,
        parent: Option<&NodeId>,
        id: NodeId,
        value: &T,
    ) -> Result<()> {
        let parent_id = match parent {
            None => return self.add_first(store, id, value),
            Some(parent_id) => parent_id.clone(),
        };
        ensure_insertable(store, &self.node_key(&id), &id, self.duplicates)?;
        let mut parent_node = self.load(store, &parent_id)?;
        match parent_node.next.clone() {
            None => {
                parent_node.next = Some(id.clone());
                self.store_node(store, &parent_id, &parent_node)?;
                store.put(
                    &self.node_key(&id),
                    &encode_record(value, None, Some(&parent_id)),
                )?;
                write_anchor(store, self.last_key(), &id)?;
            }
            Some(child_id) => {
                let mut child = self.load(store, &child_id)?;
                parent_node.next = Some(id.clone());
                child.prev = Some(id.clone());
                store.put(
                    &self.node_key(&id),
                    &encode_record(value, Some(&child_id), Some(&parent_id)),
                )?;
                self.store_node(store, &parent_id, &parent_node)?;
                self.store_node(store, &child_id, &child)?;
            }
        }
        increase_count(store, self.count_key())
    }

    /// Splices a new node in directly before `child`. A `None` child
    /// degrades to [`add_first`](Self::add_first); splicing before the head
    /// moves the `first` anchor.
    pub fn add_before(
        &self,
        store: &mut impl WriteStore,
        child: Option<&NodeId>,
        id: NodeId,
        value: &T,
    ) -> Result<()> {
        let child_id = match child {
            None => return self.add_first(store, id, value),
            Some(child_id) => child_id.clone(),
        };
        ensure_insertable(store, &self.node_key(&id), &id, self.duplicates)?;
        let mut child_node = self.load(store, &child_id)?;
        match child_node.prev.clone() {
            None => {
                child_node.prev = Some(id.clone());
                self.store_node(store, &child_id, &child_node)?;
                store.put(
                    &self.node_key(&id),
                    &encode_record(value, Some(&child_id), None),
                )?;
                write_anchor(store, self.first_key(), &id)?;
            }
            Some(parent_id) => {
                let mut parent = self.load(store, &parent_id)?;
                parent.next = Some(id.clone());
                child_node.prev = Some(id.clone());
                store.put(
                    &self.node_key(&id),
                    &encode_record(value, Some(&child_id), Some(&parent_id)),
                )?;
                self.store_node(store, &parent_id, &parent)?;
                self.store_node(store, &child_id, &child_node)?;
            }
        }
        increase_count(store, self.count_key())
    }

    /// Removes the head node. Removing the only node drops both anchors and
    /// the count entry.
    pub fn remove_first(&self, store: &mut impl WriteStore) -> Result<()> {
        let first_id = self.first_id(store)?.ok_or(StoreError::ValueNotFound)?;
        let first = self.load(store, &first_id)?;
        store.delete(&self.node_key(&first_id))?;
        match first.next {
            None => {
                store.delete(&self.first_key())?;
                store.delete(&self.last_key())?;
                store.delete(&self.count_key())
            }
            Some(next_id) => {
                write_anchor(store, self.first_key(), &next_id)?;
                let mut next = self.load(store, &next_id)?;
                next.prev = None;
                self.store_node(store, &next_id, &next)?;
                decrease_count(store, self.count_key())
            }
        }
    }

    /// Removes the tail node. Removing the only node drops both anchors and
    /// the count entry.
    pub fn remove_last(&self, store: &mut impl WriteStore) -> Result<()> {
        let last_id = self.last_id(store)?.ok_or(StoreError::ValueNotFound)?;
        let last = self.load(store, &last_id)?;
        store.delete(&self.node_key(&last_id))?;
        match last.prev {
            None => {
                store.delete(&self.first_key())?;
                store.delete(&self.last_key())?;
                store.delete(&self.count_key())
            }
            Some(prev_id) => {
                write_anchor(store, self.last_key(), &prev_id)?;
                let mut prev = self.load(store, &prev_id)?;
                prev.next = None;
                self.store_node(store, &prev_id, &prev)?;
                decrease_count(store, self.count_key())
            }
        }
    }

    /// Removes the node stored under `id`, repairing both neighbors'
    /// pointers. Boundary nodes delegate to
    /// [`remove_first`](Self::remove_first)/[`remove_last`](Self::remove_last).
    /// Fails the unit of work with [`StoreError::ValueNotFound`] when `id`
    /// is not in the list.
    pub fn remove_by_id(&self, store: &mut impl WriteStore, id: &NodeId) -> Result<()> {
        if self.first_id(store)?.as_ref() == Some(id) {
            return self.remove_first(store);
        }
        if self.last_id(store)?.as_ref() == Some(id) {
            return self.remove_last(store);
        }
        let current = match store.get(&self.node_key(id))? {
            Some(bytes) => DoubleNode::<T>::decode(&bytes)?,
            None => return Err(StoreError::ValueNotFound),
        };
        // Interior node: both neighbors exist.
        let parent_id = current
            .prev
            .ok_or_else(|| StoreError::Corruption("interior node missing prev pointer".into()))?;
        let child_id = current
            .next
            .ok_or_else(|| StoreError::Corruption("interior node missing next pointer".into()))?;
        let mut parent = self.load(store, &parent_id)?;
        let mut child = self.load(store, &child_id)?;
        parent.next = Some(child_id.clone());
        child.prev = Some(parent_id.clone());
        store.delete(&self.node_key(id))?;
        self.store_node(store, &parent_id, &parent)?;
        self.store_node(store, &child_id, &child)?;
        decrease_count(store, self.count_key())
    }

    /// Removes the first node holding `value`, scanning from the head.
    /// Fails the unit of work with [`StoreError::ValueNotFound`] when no
    /// node holds it.
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
                match current.next {
                    None => {
                        parent.next = None;
                        self.store_node(store, &parent_id, &parent)?;
                        write_anchor(store, self.last_key(), &parent_id)?;
                    }
                    Some(child_id) => {
                        let mut child = self.load(store, &child_id)?;
                        parent.next = Some(child_id.clone());
                        child.prev = Some(parent_id.clone());
                        self.store_node(store, &parent_id, &parent)?;
                        self.store_node(store, &child_id, &child)?;
                    }
                }
                store.delete(&self.node_key(&current_id))?;
                return decrease_count(store, self.count_key());
            }
            parent_id = current_id;
            parent = current;
        }
        Err(StoreError::ValueNotFound)
    }

    /// Identifier of the first node holding `value`, scanning forward from
    /// the head.
    pub fn find_first(&self, store: &impl ReadStore, value: &T) -> Result<Option<NodeId>>
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

    /// Identifier of the last node holding `value`, scanning backward from
    /// the tail.
    pub fn find_last(&self, store: &impl ReadStore, value: &T) -> Result<Option<NodeId>>
    where
        T: PartialEq,
    {
        let mut cursor = self.last_id(store)?;
        while let Some(id) = cursor {
            let node = self.load(store, &id)?;
            if node.value == *value {
                return Ok(Some(id));
            }
            cursor = node.prev;
        }
        Ok(None)
    }

    /// Destroys every node and drops the anchors and count entries.
    pub fn clear(&self, store: &mut impl WriteStore) -> Result<()> {
        debug!(prefix = self.prefix, "clearing double linked list");
        let mut cursor = self.first_id(store)?;
        store.delete(&self.first_key())?;
        store.delete(&self.last_key())?;
        while let Some(id) = cursor {
            let node = self.load(store, &id)?;
            store.delete(&self.node_key(&id))?;
            cursor = node.next;
        }
        store.delete(&self.count_key())
    }
}
