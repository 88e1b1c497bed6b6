#![allow(missing_docs)]

use linkstore::{with_unit, DoubleLinkedList, MemoryStore, NodeId, Result, StoreError};

fn id(name: &str) -> NodeId {
    NodeId::from(name)
}

fn forward_ids(list: &DoubleLinkedList<i64>, store: &MemoryStore) -> Result<Vec<NodeId>> {
    let mut ids = Vec::new();
    let mut cursor = list.first_id(store)?;
    while let Some(node_id) = cursor {
        cursor = list.next_id(store, &node_id)?;
        ids.push(node_id);
    }
    Ok(ids)
}

fn backward_ids(list: &DoubleLinkedList<i64>, store: &MemoryStore) -> Result<Vec<NodeId>> {
    let mut ids = Vec::new();
    let mut cursor = list.last_id(store)?;
    while let Some(node_id) = cursor {
        cursor = list.prev_id(store, &node_id)?;
        ids.push(node_id);
    }
    Ok(ids)
}

/// Walks the chain from both ends and checks that `next`/`prev` are mutual
/// inverses at every adjacency.
fn assert_chain(
    list: &DoubleLinkedList<i64>,
    store: &MemoryStore,
    expected: &[NodeId],
) -> Result<()> {
    let forward = forward_ids(list, store)?;
    assert_eq!(forward, expected);
    let mut backward = backward_ids(list, store)?;
    backward.reverse();
    assert_eq!(backward, expected);
    for pair in expected.windows(2) {
        assert_eq!(list.next_id(store, &pair[0])?.as_ref(), Some(&pair[1]));
        assert_eq!(list.prev_id(store, &pair[1])?.as_ref(), Some(&pair[0]));
    }
    assert_eq!(list.count(store)?, expected.len() as u64);
    Ok(())
}

#[test]
fn insertion_maintains_both_anchors_and_back_pointers() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = DoubleLinkedList::<i64>::new(0x00);

    with_unit(&mut store, |tx| {
        list.add_first(tx, id("B"), &2)?;
        list.add_first(tx, id("A"), &1)?;
        list.add_last(tx, id("D"), &4)?;
        list.add_after(tx, Some(&id("B")), id("C"), &3)
    })?;

    assert_chain(&list, &store, &[id("A"), id("B"), id("C"), id("D")])?;
    assert_eq!(list.first_value(&store)?, Some(1));
    assert_eq!(list.last_value(&store)?, Some(4));
    assert_eq!(list.next_value(&store, &id("B"))?, Some(3));
    assert_eq!(list.prev_value(&store, &id("B"))?, Some(1));
    Ok(())
}

#[test]
fn add_after_tail_and_add_before_head_move_the_anchors() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = DoubleLinkedList::<i64>::new(0x00);

    with_unit(&mut store, |tx| list.add_first(tx, id("M"), &0))?;
    with_unit(&mut store, |tx| list.add_after(tx, Some(&id("M")), id("T"), &1))?;
    with_unit(&mut store, |tx| {
        list.add_before(tx, Some(&id("M")), id("H"), &-1)
    })?;

    assert_chain(&list, &store, &[id("H"), id("M"), id("T")])?;
    assert_eq!(list.first_id(&store)?, Some(id("H")));
    assert_eq!(list.last_id(&store)?, Some(id("T")));
    Ok(())
}

#[test]
fn absent_reference_degrades_to_add_first() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = DoubleLinkedList::<i64>::new(0x00);

    with_unit(&mut store, |tx| list.add_after(tx, None, id("A"), &1))?;
    with_unit(&mut store, |tx| list.add_before(tx, None, id("B"), &2))?;
    assert_chain(&list, &store, &[id("B"), id("A")])?;

    // A named but unknown reference is still a hard failure.
    let err = with_unit(&mut store, |tx| {
        list.add_after(tx, Some(&id("nope")), id("C"), &3)
    })
    .unwrap_err();
    assert!(matches!(err, StoreError::UnknownId(_)));
    Ok(())
}

#[test]
fn remove_by_id_handles_boundaries_and_interior() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = DoubleLinkedList::<i64>::new(0x00);

    with_unit(&mut store, |tx| {
        for (name, value) in [("A", 1), ("B", 2), ("C", 3), ("D", 4), ("E", 5)] {
            list.add_last(tx, id(name), &value)?;
        }
        Ok(())
    })?;

    with_unit(&mut store, |tx| list.remove_by_id(tx, &id("C")))?;
    assert_chain(&list, &store, &[id("A"), id("B"), id("D"), id("E")])?;

    with_unit(&mut store, |tx| list.remove_by_id(tx, &id("A")))?;
    assert_chain(&list, &store, &[id("B"), id("D"), id("E")])?;

    with_unit(&mut store, |tx| list.remove_by_id(tx, &id("E")))?;
    assert_chain(&list, &store, &[id("B"), id("D")])?;

    let err = with_unit(&mut store, |tx| list.remove_by_id(tx, &id("C"))).unwrap_err();
    assert!(matches!(err, StoreError::ValueNotFound));
    assert_chain(&list, &store, &[id("B"), id("D")])?;
    Ok(())
}

#[test]
fn remove_by_value_repairs_neighbors_and_anchors() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = DoubleLinkedList::<i64>::new(0x00);

    with_unit(&mut store, |tx| {
        for (name, value) in [("A", 1), ("B", 2), ("C", 3)] {
            list.add_last(tx, id(name), &value)?;
        }
        Ok(())
    })?;

    // Interior removal.
    with_unit(&mut store, |tx| list.remove_by_value(tx, &2))?;
    assert_chain(&list, &store, &[id("A"), id("C")])?;

    // Tail removal must move the last anchor.
    with_unit(&mut store, |tx| list.remove_by_value(tx, &3))?;
    assert_chain(&list, &store, &[id("A")])?;
    assert_eq!(list.last_id(&store)?, Some(id("A")));

    let err = with_unit(&mut store, |tx| list.remove_by_value(tx, &9)).unwrap_err();
    assert!(matches!(err, StoreError::ValueNotFound));

    // Head removal of the only node empties the structure entirely.
    with_unit(&mut store, |tx| list.remove_by_value(tx, &1))?;
    assert_eq!(list.count(&store)?, 0);
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn removing_only_node_drops_all_keys() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = DoubleLinkedList::<i64>::new(0x00);

    with_unit(&mut store, |tx| list.add_last(tx, id("X"), &1))?;
    with_unit(&mut store, |tx| list.remove_last(tx))?;
    assert!(store.is_empty());
    assert_eq!(list.first_id(&store)?, None);
    assert_eq!(list.last_id(&store)?, None);

    with_unit(&mut store, |tx| list.add_first(tx, id("Y"), &2))?;
    with_unit(&mut store, |tx| list.remove_first(tx))?;
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn find_scans_from_either_end() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = DoubleLinkedList::<i64>::new(0x00);

    with_unit(&mut store, |tx| {
        for (name, value) in [("A", 7), ("B", 8), ("C", 7)] {
            list.add_last(tx, id(name), &value)?;
        }
        Ok(())
    })?;

    assert_eq!(list.find_first(&store, &7)?, Some(id("A")));
    assert_eq!(list.find_last(&store, &7)?, Some(id("C")));
    assert_eq!(list.find_first(&store, &8)?, Some(id("B")));
    assert_eq!(list.find_last(&store, &9)?, None);
    Ok(())
}

#[test]
fn clear_destroys_every_node() -> Result<()> {
    let mut store = MemoryStore::new();
    let list = DoubleLinkedList::<String>::new(0x2A);

    with_unit(&mut store, |tx| {
        list.add_last(tx, id("a"), &String::from("one"))?;
        list.add_last(tx, id("b"), &String::from("two"))?;
        list.add_last(tx, id("c"), &String::from("three"))
    })?;

    with_unit(&mut store, |tx| list.clear(tx))?;
    assert!(store.is_empty());
    assert_eq!(list.count(&store)?, 0);

    with_unit(&mut store, |tx| list.add_first(tx, id("a"), &String::from("anew")))?;
    assert_eq!(list.count(&store)?, 1);
    assert_eq!(list.first_value(&store)?, Some(String::from("anew")));
    assert_eq!(list.last_id(&store)?, Some(id("a")));
    Ok(())
}
