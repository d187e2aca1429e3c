//! Concurrency tests: many writers, swapping readers, and DDL quiescence.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use sample_store::{Admission, SampleConfig, TableOptions, TableRegistry, Value};

fn registry() -> Arc<TableRegistry> {
    Arc::new(TableRegistry::new(SampleConfig::default()).expect("valid config"))
}

#[test]
fn test_capacity_never_exceeded_under_concurrent_writes() {
    let registry = registry();
    let limit = 50;
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let workers: Vec<_> = (0..threads)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut handle = registry
                    .open_with("t", TableOptions::new(2, 1, limit))
                    .unwrap();
                barrier.wait();
                for i in 0..1000 {
                    let id = (t * 1000 + i) as i64;
                    handle
                        .write_row(&[Value::from(id), Value::from("payload")])
                        .unwrap();
                    assert!(handle.table().len() <= limit as usize);
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }

    let table = registry.lookup("t").unwrap();
    assert!(table.len() <= limit as usize);

    let stats = registry.stats().snapshot();
    assert_eq!(stats.sampled, 8000);
    assert_eq!(stats.inserted as usize, table.len());
    assert_eq!(
        stats.inserted + stats.discarded_full + stats.discarded_contended,
        stats.sampled
    );
}

#[test]
fn test_swap_delivers_each_row_at_most_once() {
    let registry = registry();
    let writers = 4;
    let per_writer = 2000_i64;
    let done = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut handle = registry
                    .open_with("t", TableOptions::new(1, 1, 1_000_000))
                    .unwrap();
                let mut stored = 0;
                for i in 0..per_writer {
                    let id = w * per_writer + i;
                    if handle.write_row(&[Value::from(id)]).unwrap() == Admission::Inserted {
                        stored += 1;
                    }
                }
                stored
            })
        })
        .collect();

    let reader = {
        let registry = Arc::clone(&registry);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let handle = registry
                .open_with("t", TableOptions::new(1, 1, 1_000_000))
                .unwrap();
            let mut seen = Vec::new();
            loop {
                let finished = done.load(Ordering::Acquire);
                for r in handle.scan() {
                    seen.push(r.unwrap()[0].as_int().unwrap());
                }
                if finished {
                    break;
                }
                thread::yield_now();
            }
            seen
        })
    };

    let stored: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    done.store(true, Ordering::Release);
    let seen = reader.join().unwrap();

    let unique: HashSet<i64> = seen.iter().copied().collect();
    assert_eq!(unique.len(), seen.len(), "a row was delivered twice");
    // With no writers left, the final pass drained everything stored.
    assert_eq!(seen.len() as i64, stored);
}

#[test]
fn test_delete_waits_for_open_handles() {
    let registry = registry();
    let handle = registry.open("t", 1).unwrap();

    let (tx, rx) = mpsc::channel();
    let deleter = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let dropped = registry.delete("t").unwrap();
            tx.send(dropped).unwrap();
        })
    };

    // Still blocked while the handle is open.
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert!(registry.contains("t"));

    handle.close();
    assert!(rx.recv_timeout(Duration::from_secs(10)).unwrap());
    deleter.join().unwrap();
    assert!(!registry.contains("t"));
}

#[test]
fn test_rename_waits_for_open_handles() {
    let registry = registry();
    let first = registry.open("a", 1).unwrap();
    let original = Arc::clone(first.table());
    first.close();

    let second = registry.open("a", 1).unwrap();

    let (tx, rx) = mpsc::channel();
    let renamer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let renamed = registry.rename("a", "b").unwrap();
            tx.send(renamed).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert!(registry.contains("a"));

    second.close();
    assert!(rx.recv_timeout(Duration::from_secs(10)).unwrap());
    renamer.join().unwrap();

    assert!(Arc::ptr_eq(&registry.lookup("b").unwrap(), &original));

    // The old name is free again and yields a distinct table.
    let fresh = registry.open("a", 1).unwrap();
    assert!(!Arc::ptr_eq(fresh.table(), &original));
}

#[test]
fn test_handle_rename_waits_for_other_handles() {
    let registry = registry();
    let renaming = registry.open("a", 1).unwrap();
    let other = registry.open("a", 1).unwrap();

    let (tx, rx) = mpsc::channel();
    let renamer = thread::spawn(move || {
        let renamed = renaming.rename("b").unwrap();
        tx.send(renamed).unwrap();
        renaming
    });

    // The renaming handle does not count itself, but `other` still blocks it.
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert!(registry.contains("a"));

    drop(other);
    assert!(rx.recv_timeout(Duration::from_secs(10)).unwrap());

    let renaming = renamer.join().unwrap();
    assert_eq!(renaming.name(), "b");
    assert_eq!(renaming.table().users(), 1);
    assert!(!registry.contains("a"));
}

#[test]
fn test_rename_to_same_name_waits_for_open_handles() {
    let registry = registry();
    let handle = registry.open("a", 1).unwrap();

    let (tx, rx) = mpsc::channel();
    let renamer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let renamed = registry.rename("a", "a").unwrap();
            tx.send(renamed).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    handle.close();
    assert!(rx.recv_timeout(Duration::from_secs(10)).unwrap());
    renamer.join().unwrap();
    assert!(registry.contains("a"));
    assert_eq!(registry.lookup("a").unwrap().users(), 0);
}

#[test]
fn test_open_during_drop_gets_fresh_table() {
    let registry = registry();
    let holder = registry.open("t", 1).unwrap();
    let original = Arc::clone(holder.table());

    let deleter = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.delete("t").unwrap())
    };

    // Wait until the drop has started.
    while !original.is_dropping() {
        thread::sleep(Duration::from_millis(1));
    }

    let opener = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let handle = registry.open("t", 1).unwrap();
            Arc::clone(handle.table())
        })
    };

    thread::sleep(Duration::from_millis(50));
    holder.close();

    assert!(deleter.join().unwrap());
    let reopened = opener.join().unwrap();
    assert!(!Arc::ptr_eq(&reopened, &original));
    assert!(!reopened.is_dropping());
}

#[test]
fn test_concurrent_deletes_drop_once() {
    let registry = registry();
    registry.open("t", 1).unwrap().close();

    let results: Vec<bool> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.delete("t").unwrap())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|dropped| **dropped).count(), 1);
    assert!(registry.is_empty());
}
