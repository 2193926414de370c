// Concurrent access tests for luamdb
// These tests share stores and the handle registry across threads

use luamdb::{HandleRegistry, Options, Store, WriteFlags};
use std::convert::Infallible;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn shared_store(dir: &TempDir) -> Arc<Store> {
    let options = Options::new().map_size(64 * 1024 * 1024).no_sync(true);
    Arc::new(Store::open(dir.path().join("db"), options).unwrap())
}

/// Writers on separate threads never lose each other's records
#[test]
fn test_concurrent_writers() {
    let dir = TempDir::new().unwrap();
    let store = shared_store(&dir);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..250 {
                    let key = format!("t{}_key{:04}", t, i);
                    store
                        .put(key.as_bytes(), key.as_bytes(), WriteFlags::default())
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let count = store
        .reduce(0usize, |_, _, acc| Ok::<_, Infallible>(acc + 1))
        .unwrap();
    assert_eq!(count, 1000);
}

/// Readers see either nothing or the full value, never a torn write
#[test]
fn test_readers_during_writes() {
    let dir = TempDir::new().unwrap();
    let store = shared_store(&dir);
    store.put(b"counter", b"0", WriteFlags::default()).unwrap();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 1..=200u32 {
                store
                    .put(b"counter", i.to_string().as_bytes(), WriteFlags::default())
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut last = 0u32;
                for _ in 0..200 {
                    let value = store.get(b"counter").unwrap().unwrap();
                    let n: u32 = std::str::from_utf8(&value).unwrap().parse().unwrap();
                    assert!(n >= last);
                    last = n;
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.get(b"counter").unwrap(), Some(b"200".to_vec()));
}

/// A traversal keeps its snapshot while another thread writes
#[test]
fn test_traversal_snapshot_isolation() {
    let dir = TempDir::new().unwrap();
    let store = shared_store(&dir);
    for i in 0..100 {
        let key = format!("key{:03}", i);
        store.put(key.as_bytes(), b"v", WriteFlags::default()).unwrap();
    }

    let (tx, rx) = std::sync::mpsc::channel::<()>();
    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            rx.recv().unwrap();
            for i in 100..200 {
                let key = format!("key{:03}", i);
                store.put(key.as_bytes(), b"v", WriteFlags::default()).unwrap();
            }
        })
    };

    let mut seen = 0;
    let mut signal = Some(tx);
    store
        .each(|_, _| {
            if let Some(tx) = signal.take() {
                tx.send(()).unwrap();
            }
            seen += 1;
            Ok::<_, Infallible>(())
        })
        .unwrap();
    writer.join().unwrap();

    assert_eq!(seen, 100);
    let total = store
        .reduce(0usize, |_, _, acc| Ok::<_, Infallible>(acc + 1))
        .unwrap();
    assert_eq!(total, 200);
}

/// Handles registered from many threads are unique and resolvable
#[test]
fn test_registry_across_threads() {
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(HandleRegistry::new());

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let path = dir.path().join(format!("db{}", t));
            thread::spawn(move || {
                let handle = registry.register(Store::open(&path, Options::default()).unwrap());
                registry
                    .resolve(handle)
                    .unwrap()
                    .put(b"owner", t.to_string().as_bytes(), WriteFlags::default())
                    .unwrap();
                handle
            })
        })
        .collect();

    let mut handles: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    handles.sort();
    handles.dedup();
    assert_eq!(handles.len(), 4);
    assert_eq!(registry.len(), 4);

    for handle in handles {
        assert!(registry.resolve(handle).unwrap().get(b"owner").unwrap().is_some());
        registry.destroy(handle).unwrap();
    }
    assert!(registry.is_empty());
}

/// Closing a store while another thread holds it only fails later calls
#[test]
fn test_close_while_shared() {
    let dir = TempDir::new().unwrap();
    let store = shared_store(&dir);
    store.put(b"k", b"v", WriteFlags::default()).unwrap();

    let other = Arc::clone(&store);
    thread::spawn(move || other.close()).join().unwrap();

    assert!(store.is_closed());
    assert!(store.get(b"k").is_err());
}
