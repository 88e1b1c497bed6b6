#![allow(missing_docs)]

use linkstore::{
    with_unit, BinaryTree, MemoryStore, NodeId, ReadStore, Result, SingleLinkedList, StoreError,
    Transaction, TxState, WriteStore,
};

fn id(name: &str) -> NodeId {
    NodeId::from(name)
}

#[test]
fn writes_are_visible_to_later_reads_in_the_same_unit() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = SingleLinkedList::<i64>::new(0x00);

    with_unit(&mut store, |tx| {
        list.add_first(tx, id("A"), &1)?;
        // The node written moments ago must be readable through the same
        // transaction even though nothing has been committed yet.
        assert_eq!(list.value(tx, &id("A"))?, 1);
        assert_eq!(list.find(tx, &1)?, Some(id("A")));
        list.add_after(tx, &id("A"), id("B"), &2)?;
        assert_eq!(list.next_id(tx, &id("A"))?, Some(id("B")));
        Ok(())
    })?;

    assert_eq!(list.count(&store)?, 2);
    Ok(())
}

#[test]
fn nothing_reaches_the_base_store_before_commit() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = SingleLinkedList::<i64>::new(0x00);

    let mut tx = Transaction::begin(&mut store);
    list.add_first(&mut tx, id("A"), &1)?;
    assert_eq!(tx.state(), TxState::Active);
    assert!(tx.pending_writes() > 0);
    tx.commit()?;

    assert_eq!(list.count(&store)?, 1);
    Ok(())
}

#[test]
fn rollback_discards_buffered_writes() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = SingleLinkedList::<i64>::new(0x00);

    let mut tx = Transaction::begin(&mut store);
    list.add_first(&mut tx, id("A"), &1)?;
    list.add_last(&mut tx, id("B"), &2)?;
    tx.rollback();

    assert!(store.is_empty());
    assert_eq!(list.count(&store)?, 0);
    Ok(())
}

#[test]
fn dropping_an_active_unit_discards_it() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = SingleLinkedList::<i64>::new(0x00);

    {
        let mut tx = Transaction::begin(&mut store);
        list.add_first(&mut tx, id("A"), &1)?;
    }
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn hard_failure_discards_the_whole_unit_across_structures() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = SingleLinkedList::<i64>::new(0x00);
    let tree = BinaryTree::<i64>::new(0x01);

    with_unit(&mut store, |tx| {
        list.add_first(tx, id("A"), &1)?;
        assert!(tree.insert(tx, id("T1"), &10)?);
        Ok(())
    })?;
    let keys_before = store.len();

    // One unit touches both structures, then hits a hard failure; every
    // buffered write in it must be discarded, not just the tree's.
    let err = with_unit(&mut store, |tx| {
        list.add_last(tx, id("B"), &2)?;
        assert!(tree.insert(tx, id("T2"), &20)?);
        tree.remove_by_value(tx, &999)
    })
    .unwrap_err();
    assert!(matches!(err, StoreError::ValueNotFound));

    assert_eq!(store.len(), keys_before);
    assert_eq!(list.count(&store)?, 1);
    assert_eq!(tree.count(&store)?, 1);
    assert_eq!(list.find(&store, &2)?, None);
    assert_eq!(tree.to_in_order(&store)?, vec![10]);
    Ok(())
}

#[test]
fn recoverable_duplicate_insert_does_not_abort_the_unit() -> Result<()> {
    let mut store = MemoryStore::new();
    let tree = BinaryTree::<i64>::new(0x00);

    // A duplicate value is a boolean result, not a hard failure: the rest of
    // the unit commits.
    with_unit(&mut store, |tx| {
        assert!(tree.insert(tx, id("A"), &5)?);
        assert!(!tree.insert(tx, id("B"), &5)?);
        assert!(tree.insert(tx, id("C"), &6)?);
        Ok(())
    })?;

    assert_eq!(tree.count(&store)?, 2);
    assert_eq!(tree.to_in_order(&store)?, vec![5, 6]);
    Ok(())
}

#[test]
fn transaction_delete_shadows_base_entries() -> Result<()> {
    let mut store = MemoryStore::new();
    store.put(b"k", b"v")?;

    let mut tx = Transaction::begin(&mut store);
    tx.delete(b"k")?;
    assert_eq!(tx.get(b"k")?, None);
    tx.rollback();
    assert_eq!(store.get(b"k")?, Some(b"v".to_vec()));
    Ok(())
}

#[test]
fn instances_with_distinct_prefixes_do_not_interfere() -> Result<()> {
    let mut store = MemoryStore::new();
    let left = SingleLinkedList::<i64>::new(0x10);
    let right = SingleLinkedList::<i64>::new(0x20);

    with_unit(&mut store, |tx| {
        left.add_first(tx, id("A"), &1)?;
        right.add_first(tx, id("A"), &2)
    })?;

    // Same identifier, different namespaces.
    assert_eq!(left.value(&store, &id("A"))?, 1);
    assert_eq!(right.value(&store, &id("A"))?, 2);

    with_unit(&mut store, |tx| left.clear(tx))?;
    assert_eq!(left.count(&store)?, 0);
    assert_eq!(right.count(&store)?, 1);
    Ok(())
}
