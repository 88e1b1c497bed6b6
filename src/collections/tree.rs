use std::cmp::Ordering;
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

const SLOT_ROOT: u8 = 0x00;
const SLOT_NODES: u8 = 0x01;
const SLOT_COUNT: u8 = 0x02;

/// Caller-supplied total order over tree values.
///
/// Must be reflexive on equal values, antisymmetric, and transitive; the
/// tree trusts it for placement, search, and the no-duplicates rule. Any
/// `Fn(&T, &T) -> Ordering` closure implements it, as does
/// [`NaturalOrder`] for `T: Ord`.
pub trait Comparator<T> {
    /// Compares `a` against `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Orders values by their `Ord` implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

struct TreeNode<T> {
    value: T,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

fn encode_record<T: StoredValue>(
    value: &T,
    left: Option<&NodeId>,
    right: Option<&NodeId>,
) -> Vec<u8> {
    let mut buf = Vec::new();
    write_opt_id(&mut buf, left);
    write_opt_id(&mut buf, right);
    write_value(&mut buf, value);
    buf
}

impl<T: StoredValue> TreeNode<T> {
    fn encode(&self) -> Vec<u8> {
        encode_record(&self.value, self.left.as_ref(), self.right.as_ref())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let left = cursor.read_opt_id()?;
        let right = cursor.read_opt_id()?;
        let value = cursor.read_value()?;
        cursor.ensure_consumed()?;
        Ok(Self { value, left, right })
    }
}

/// Persistent unbalanced binary search tree ordered by a caller-supplied
/// comparator. Duplicate values are rejected, never stored.
///
/// Height is unbounded (no rebalancing), so traversals and clearing use
/// explicit stacks rather than recursion.
pub struct BinaryTree<T, C = NaturalOrder> {
    prefix: u8,
    comparator: C,
    duplicates: DuplicatePolicy,
    _values: PhantomData<T>,
}

impl<T: StoredValue + Ord> BinaryTree<T, NaturalOrder> {
    /// Creates a handle ordering values by their `Ord` implementation.
    pub fn new(prefix: u8) -> Self {
        Self::with_comparator(prefix, NaturalOrder)
    }
}

impl<T: StoredValue, C: Comparator<T>> BinaryTree<T, C> {
    /// Creates a handle over the instance namespaced by `prefix`, ordering
    /// values by `comparator`.
    pub fn with_comparator(prefix: u8, comparator: C) -> Self {
        Self {
            prefix,
            comparator,
            duplicates: DuplicatePolicy::default(),
            _values: PhantomData,
        }
    }

    /// Sets the identifier-reuse policy for inserts.
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    fn root_key(&self) -> [u8; 2] {
        slot_key(self.prefix, SLOT_ROOT)
    }

    fn count_key(&self) -> [u8; 2] {
        slot_key(self.prefix, SLOT_COUNT)
    }

    fn node_key(&self, id: &NodeId) -> KeyBuf {
        node_key(self.prefix, SLOT_NODES, id)
    }

    fn load(&self, store: &impl ReadStore, id: &NodeId) -> Result<TreeNode<T>> {
        match store.get(&self.node_key(id))? {
            Some(bytes) => TreeNode::decode(&bytes),
            None => Err(StoreError::UnknownId(id.clone())),
        }
    }

    /// Identifier of the root node, or `None` when the tree is empty.
    pub fn root_id(&self, store: &impl ReadStore) -> Result<Option<NodeId>> {
        read_anchor(store, self.root_key())
    }

    /// Value of the root node, or `None` when the tree is empty.
    pub fn root_value(&self, store: &impl ReadStore) -> Result<Option<T>> {
        match self.root_id(store)? {
            None => Ok(None),
            Some(id) => Ok(Some(self.load(store, &id)?.value)),
        }
    }

    /// Number of nodes in the tree.
    pub fn count(&self, store: &impl ReadStore) -> Result<u64> {
        read_count(store, self.count_key())
    }

    /// Inserts `value` under `id`. Returns `Ok(false)` without touching the
    /// tree when an equal value is already present; `Ok(true)` when the node
    /// was attached.
    pub fn insert(&self, store: &mut impl WriteStore, id: NodeId, value: &T) -> Result<bool> {
        ensure_insertable(store, &self.node_key(&id), &id, self.duplicates)?;
        let root_id = match self.root_id(store)? {
            None => {
                write_anchor(store, self.root_key(), &id)?;
                store.put(&self.node_key(&id), &encode_record(value, None, None))?;
                increase_count(store, self.count_key())?;
                return Ok(true);
            }
            Some(root_id) => root_id,
        };
        let mut current_id = root_id;
        let mut current = self.load(store, &current_id)?;
        loop {
            let slot = match self.comparator.compare(value, &current.value) {
                Ordering::Equal => return Ok(false),
                Ordering::Greater => &mut current.right,
                Ordering::Less => &mut current.left,
            };
            match slot.clone() {
                Some(next_id) => {
                    current_id = next_id;
                    current = self.load(store, &current_id)?;
                }
                None => {
                    *slot = Some(id.clone());
                    break;
                }
            }
        }
        store.put(&self.node_key(&current_id), &current.encode())?;
        store.put(&self.node_key(&id), &encode_record(value, None, None))?;
        increase_count(store, self.count_key())?;
        Ok(true)
    }

    /// Removes the node holding `value`. Fails the unit of work with
    /// [`StoreError::ValueNotFound`] when no node holds it.
    pub fn remove_by_value(&self, store: &mut impl WriteStore, value: &T) -> Result<()> {
        let root_id = self.root_id(store)?.ok_or(StoreError::ValueNotFound)?;
        let mut parent: Option<(NodeId, TreeNode<T>)> = None;
        let mut current_id = root_id;
        let mut current = self.load(store, &current_id)?;
        loop {
            let step = match self.comparator.compare(value, &current.value) {
                Ordering::Equal => break,
                Ordering::Greater => current.right.clone(),
                Ordering::Less => current.left.clone(),
            };
            match step {
                None => return Err(StoreError::ValueNotFound),
                Some(next_id) => {
                    parent = Some((current_id, current));
                    current_id = next_id;
                    current = self.load(store, &current_id)?;
                }
            }
        }
        self.unlink(store, parent, current_id, current)
    }

    /// Removes the node stored under `id` by looking up its value. Fails the
    /// unit of work with [`StoreError::ValueNotFound`] when `id` is not in
    /// the tree.
    pub fn remove_by_id(&self, store: &mut impl WriteStore, id: &NodeId) -> Result<()> {
        let node = match store.get(&self.node_key(id))? {
            Some(bytes) => TreeNode::<T>::decode(&bytes)?,
            None => return Err(StoreError::ValueNotFound),
        };
        self.remove_by_value(store, &node.value)
    }

    /// Detaches `target` from the tree through one mutually exclusive case
    /// split over (root vs non-root) x (zero/one/two children). The root and
    /// non-root paths differ only in how the vacated slot is rewritten: the
    /// root anchor versus the parent's child pointer.
    fn unlink(
        &self,
        store: &mut impl WriteStore,
        parent: Option<(NodeId, TreeNode<T>)>,
        target_id: NodeId,
        target: TreeNode<T>,
    ) -> Result<()> {
        let replacement = match (target.left.clone(), target.right.clone()) {
            // Leaf: nothing replaces it.
            (None, None) => None,
            // One child: splice it into the vacated slot.
            (Some(child_id), None) | (None, Some(child_id)) => Some(child_id),
            // Two children: promote the maximum of the left subtree.
            (Some(left_id), Some(right_id)) => {
                let mut promoted_parent: Option<(NodeId, TreeNode<T>)> = None;
                let mut promoted_id = left_id.clone();
                let mut promoted = self.load(store, &promoted_id)?;
                while let Some(next_id) = promoted.right.clone() {
                    promoted_parent = Some((promoted_id, promoted));
                    promoted_id = next_id;
                    promoted = self.load(store, &promoted_id)?;
                }
                match promoted_parent {
                    Some((pp_id, mut pp)) => {
                        // Detach the maximum; its left child takes its place,
                        // and it inherits the deleted node's left subtree.
                        pp.right = promoted.left.take();
                        store.put(&self.node_key(&pp_id), &pp.encode())?;
                        promoted.left = Some(left_id);
                    }
                    None => {
                        // The left child itself is the maximum; it keeps its
                        // own left subtree in place.
                    }
                }
                promoted.right = Some(right_id);
                store.put(&self.node_key(&promoted_id), &promoted.encode())?;
                Some(promoted_id)
            }
        };

        match parent {
            None => match replacement {
                None => {
                    // Removing the only node empties the tree: node, anchor,
                    // and count entries all go away.
                    store.delete(&self.node_key(&target_id))?;
                    store.delete(&self.root_key())?;
                    return store.delete(&self.count_key());
                }
                Some(new_root) => write_anchor(store, self.root_key(), &new_root)?,
            },
            Some((parent_id, mut parent_node)) => {
                if parent_node.left.as_ref() == Some(&target_id) {
                    parent_node.left = replacement;
                } else {
                    parent_node.right = replacement;
                }
                store.put(&self.node_key(&parent_id), &parent_node.encode())?;
            }
        }
        store.delete(&self.node_key(&target_id))?;
        decrease_count(store, self.count_key())
    }

    /// Minimum value under the comparator, or `None` when the tree is empty.
    pub fn first(&self, store: &impl ReadStore) -> Result<Option<T>> {
        let mut current = match self.root_id(store)? {
            None => return Ok(None),
            Some(id) => self.load(store, &id)?,
        };
        while let Some(next_id) = current.left.clone() {
            current = self.load(store, &next_id)?;
        }
        Ok(Some(current.value))
    }

    /// Maximum value under the comparator, or `None` when the tree is empty.
    pub fn last(&self, store: &impl ReadStore) -> Result<Option<T>> {
        let mut current = match self.root_id(store)? {
            None => return Ok(None),
            Some(id) => self.load(store, &id)?,
        };
        while let Some(next_id) = current.right.clone() {
            current = self.load(store, &next_id)?;
        }
        Ok(Some(current.value))
    }

    /// Values in pre-order (node, left subtree, right subtree).
    pub fn to_pre_order(&self, store: &impl ReadStore) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        if let Some(root_id) = self.root_id(store)? {
            stack.push(root_id);
        }
        while let Some(id) = stack.pop() {
            let node = self.load(store, &id)?;
            if let Some(right_id) = node.right {
                stack.push(right_id);
            }
            if let Some(left_id) = node.left {
                stack.push(left_id);
            }
            out.push(node.value);
        }
        Ok(out)
    }

    /// Values in order (left subtree, node, right subtree); non-decreasing
    /// under the comparator.
    pub fn to_in_order(&self, store: &impl ReadStore) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut stack: Vec<TreeNode<T>> = Vec::new();
        let mut cursor = self.root_id(store)?;
        loop {
            while let Some(id) = cursor {
                let node = self.load(store, &id)?;
                cursor = node.left.clone();
                stack.push(node);
            }
            match stack.pop() {
                None => break,
                Some(node) => {
                    cursor = node.right.clone();
                    out.push(node.value);
                }
            }
        }
        Ok(out)
    }

    /// Values in post-order (left subtree, right subtree, node).
    pub fn to_post_order(&self, store: &impl ReadStore) -> Result<Vec<T>> {
        // Walk (node, right, left), then reverse into (left, right, node).
        let mut visited = Vec::new();
        let mut stack = Vec::new();
        if let Some(root_id) = self.root_id(store)? {
            stack.push(root_id);
        }
        while let Some(id) = stack.pop() {
            let node = self.load(store, &id)?;
            if let Some(left_id) = node.left {
                stack.push(left_id);
            }
            if let Some(right_id) = node.right {
                stack.push(right_id);
            }
            visited.push(node.value);
        }
        visited.reverse();
        Ok(visited)
    }

    /// Destroys every node and drops the anchor and count entries.
    pub fn clear(&self, store: &mut impl WriteStore) -> Result<()> {
        debug!(prefix = self.prefix, "clearing binary tree");
        let mut stack = Vec::new();
        if let Some(root_id) = self.root_id(store)? {
            stack.push(root_id);
        }
        store.delete(&self.root_key())?;
        while let Some(id) = stack.pop() {
            let node = self.load(store, &id)?;
            if let Some(left_id) = node.left {
                stack.push(left_id);
            }
            if let Some(right_id) = node.right {
                stack.push(right_id);
            }
            store.delete(&self.node_key(&id))?;
        }
        store.delete(&self.count_key())
    }
}
