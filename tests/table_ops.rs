//! Integration tests for identifier table operations.
//!
//! These exercise realistic runtime-metadata scenarios end to end: building
//! a table past the compact/hashed conversion threshold, deleting and
//! rewriting entries mid-iteration, and duplicating collector-managed
//! tables.

use std::cell::RefCell;
use std::rc::Rc;

use idtable::prelude::*;

fn id(raw: u32) -> Ident {
    Ident::new(raw)
}

/// A method-table-sized workload: insert, overwrite, delete, then a
/// replace pass — the full lifecycle of a table owned by one class.
#[test]
fn method_table_lifecycle() {
    // Insert identifiers 1..=50 with values "v1".."v50"; this crosses the
    // small-table threshold partway through.
    let mut table = IdTable::new();
    for i in 1..=50u32 {
        assert!(!table.insert(id(i), format!("v{i}")));
    }
    assert_eq!(table.len(), 50);

    // Every pre-conversion entry survives the migration.
    for i in 1..=50u32 {
        assert_eq!(table.lookup(id(i)).map(String::as_str), Some(&*format!("v{i}")));
    }

    // Re-inserting overwrites in place and reports the prior entry.
    assert!(table.insert(id(50), "v50b".to_string()));
    assert_eq!(table.len(), 50);
    assert_eq!(table.lookup(id(50)).map(String::as_str), Some("v50b"));
    assert!(table.insert(id(50), "v50".to_string()));

    table.delete(id(10));
    table.delete(id(20));
    table.delete(id(30));
    assert_eq!(table.len(), 47);
    assert_eq!(table.lookup(id(20)), None);

    // Uppercase the values of surviving odd identifiers in one pass,
    // computing the replacement only for entries that ask for it.
    let mut replaced = 0;
    table.foreach_values_with_replace(
        |value| {
            let n: u32 = value[1..].parse().unwrap();
            if n % 2 == 1 {
                ForeachResult::Replace
            } else {
                ForeachResult::Continue
            }
        },
        |value| {
            replaced += 1;
            *value = value.to_uppercase();
        },
    );
    assert_eq!(replaced, 25);

    for i in 1..=50u32 {
        match (i % 2, i) {
            (_, 10 | 20 | 30) => assert_eq!(table.lookup(id(i)), None),
            (1, _) => {
                assert_eq!(table.lookup(id(i)).map(String::as_str), Some(&*format!("V{i}")));
            }
            _ => {
                assert_eq!(table.lookup(id(i)).map(String::as_str), Some(&*format!("v{i}")));
            }
        }
    }
}

/// Size is exactly inserts of distinct identifiers minus deletions,
/// across an arbitrary interleaving.
#[test]
fn size_tracks_distinct_inserts_minus_deletes() {
    let mut table = IdTable::new();
    let mut live = 0usize;
    for step in 0..500u32 {
        let key = id(step % 37);
        if step % 3 == 0 {
            if table.delete(key) {
                live -= 1;
            }
        } else if !table.insert(key, step) {
            live += 1;
        }
        assert_eq!(table.len(), live);
    }
}

#[test]
fn foreach_delete_empties_table_without_revisits() {
    let mut table = IdTable::new();
    for i in 0..200u32 {
        table.insert(id(i), i);
    }
    let mut visits = 0;
    table.foreach(|_, _| {
        visits += 1;
        ForeachResult::Delete
    });
    assert_eq!(visits, 200);
    assert_eq!(table.len(), 0);
}

#[test]
fn foreach_stop_visits_exactly_k_entries() {
    for k in [1usize, 4, 25] {
        let mut table = IdTable::new();
        for i in 0..50u32 {
            table.insert(id(i), i);
        }
        let mut visited = 0;
        table.foreach(|_, _| {
            visited += 1;
            if visited == k {
                ForeachResult::Stop
            } else {
                ForeachResult::Continue
            }
        });
        assert_eq!(visited, k);
    }
}

/// Deleting mid-pass must not disturb the rest of the pass in either
/// representation.
#[test]
fn foreach_mixed_directives() {
    for count in [6u32, 120] {
        let mut table = IdTable::new();
        for i in 0..count {
            table.insert(id(i), i);
        }
        let mut seen = Vec::new();
        table.foreach(|entry_id, _| {
            seen.push(entry_id.value());
            if entry_id.value() % 3 == 0 {
                ForeachResult::Delete
            } else {
                ForeachResult::Continue
            }
        });

        seen.sort_unstable();
        assert_eq!(seen, (0..count).collect::<Vec<_>>(), "count {count}");
        assert_eq!(table.len(), (count - count.div_ceil(3)) as usize);
        for i in 0..count {
            let expected = if i % 3 == 0 { None } else { Some(i) };
            assert_eq!(table.lookup(id(i)).copied(), expected);
        }
    }
}

/// An instance-variable table an owner discards with values that need
/// explicit teardown.
#[test]
fn clear_with_runs_destructor_on_every_value() {
    let mut table = IdTable::new();
    for i in 0..25u32 {
        table.insert(id(i), format!("ivar{i}"));
    }
    let mut dropped = Vec::new();
    table.clear_with(|entry_id, value| dropped.push((entry_id.value(), value)));

    assert!(table.is_empty());
    assert_eq!(dropped.len(), 25);
    dropped.sort_unstable();
    for (i, (key, value)) in dropped.iter().enumerate() {
        assert_eq!(*key as usize, i);
        assert_eq!(value, &format!("ivar{i}"));
    }

    // The cleared table is immediately reusable.
    table.insert(id(1), "fresh".to_string());
    assert_eq!(table.len(), 1);
}

/// Write barrier shared between a managed table and its duplicate.
#[derive(Clone, Default)]
struct CountingBarrier {
    count: Rc<RefCell<usize>>,
}

impl<V> WriteBarrier<V> for CountingBarrier {
    fn record(&self, _value: &V) {
        *self.count.borrow_mut() += 1;
    }
}

#[test]
fn managed_dup_copies_entries_and_stays_independent() {
    let barrier = CountingBarrier::default();
    let count = Rc::clone(&barrier.count);

    let mut original = ManagedIdTable::new(barrier, 0);
    for i in 1..=12u32 {
        original.insert(id(i), u64::from(i) * 10);
    }
    assert_eq!(*count.borrow(), 12);

    let mut copy = original.dup();
    // The copy is built through the insert path, so its barrier observed
    // every copied value.
    assert_eq!(*count.borrow(), 24);
    assert_eq!(copy.len(), 12);
    for i in 1..=12u32 {
        assert_eq!(copy.lookup(id(i)), Some(&(u64::from(i) * 10)));
    }

    // Mutating the copy leaves the original untouched, and vice versa.
    copy.delete(id(1));
    copy.insert(id(100), 1);
    original.insert(id(2), 999);

    assert_eq!(original.len(), 12);
    assert_eq!(original.lookup(id(1)), Some(&10));
    assert_eq!(original.lookup(id(100)), None);
    assert_eq!(copy.len(), 12);
    assert_eq!(copy.lookup(id(2)), Some(&20));
}

#[test]
fn managed_trace_reaches_every_stored_reference() {
    let mut table = ManagedIdTable::new(NullBarrier, 32);
    for i in 0..64u32 {
        table.insert(id(i), u64::from(i) | 0x8000_0000_0000_0000);
    }
    table.delete(id(63));

    let mut marked = Vec::new();
    table.trace(&mut |value: &u64| marked.push(*value & 0xFFFF));
    marked.sort_unstable();
    assert_eq!(marked, (0..63).collect::<Vec<u64>>());
}

#[test]
fn managed_object_downcast_checks_descriptor() {
    static IVAR_TABLE_TYPE: TypeDescriptor = TypeDescriptor::new("IvarTable");

    let default_typed = ManagedIdTable::<u64, _>::new(NullBarrier, 0);
    let custom_typed = ManagedIdTable::<u64, _>::create(&IVAR_TABLE_TYPE, NullBarrier, 0);

    let objects: [&dyn ManagedObject; 2] = [&default_typed, &custom_typed];

    assert!(ManagedIdTable::<u64, NullBarrier>::from_object(objects[0]).is_ok());
    let err = ManagedIdTable::<u64, NullBarrier>::from_object(objects[1]).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { found: "IvarTable", .. }));
}

#[test]
fn memsize_reflects_representation() {
    let compact: IdTable<u64> = IdTable::with_capacity(4);
    let mut hashed: IdTable<u64> = IdTable::with_capacity(4);
    for i in 0..100u32 {
        hashed.insert(id(i), 0);
    }
    assert!(hashed.memsize() > compact.memsize());

    let managed = ManagedIdTable::<u64, _>::new(NullBarrier, 0);
    assert!(managed.memsize() >= compact.memsize());
}
