// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-thread tests for the sync_rwlock crate, run against the build-time backend.
#![cfg(not(target_arch = "wasm32"))]

use crate::{RwLock, from_try};
use r#continue::continuation;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test_executors::async_test]
async fn test_rwlock_concurrent_increment() {
    let rwlock = Arc::new(RwLock::new(0));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let rwlock = Arc::clone(&rwlock);
            let (c, r) = continuation();
            thread::spawn(move || {
                for _ in 0..100 {
                    *rwlock.write().unwrap() += 1;
                }
                c.send(());
            });
            r
        })
        .collect();

    for h in handles {
        h.await;
    }
    assert_eq!(rwlock.with_read(|v| *v).unwrap(), 1000);
}

#[test_executors::async_test]
async fn test_rwlock_readers_never_see_torn_writes() {
    // Writers keep both halves equal; a reader seeing them differ saw a torn write.
    let rwlock = Arc::new(RwLock::new((0u64, 0u64)));
    let mut receivers = Vec::new();

    for _ in 0..2 {
        let rwlock = Arc::clone(&rwlock);
        let (c, r) = continuation();
        thread::spawn(move || {
            for _ in 0..500 {
                let mut guard = rwlock.write().unwrap();
                guard.0 += 1;
                thread::yield_now();
                guard.1 += 1;
            }
            c.send(true);
        });
        receivers.push(r);
    }
    for _ in 0..4 {
        let rwlock = Arc::clone(&rwlock);
        let (c, r) = continuation();
        thread::spawn(move || {
            let mut consistent = true;
            for _ in 0..500 {
                let guard = rwlock.read().unwrap();
                consistent &= guard.0 == guard.1;
            }
            c.send(consistent);
        });
        receivers.push(r);
    }

    for r in receivers {
        assert!(r.await);
    }
    assert_eq!(*rwlock.read().unwrap(), (1000, 1000));
}

#[test_executors::async_test]
async fn test_rwlock_try_read_during_write() {
    let rwlock = Arc::new(RwLock::new(42));
    let guard = rwlock.write().unwrap();

    let rwlock_clone = Arc::clone(&rwlock);
    let (c, r) = continuation();
    thread::spawn(move || {
        c.send(from_try(rwlock_clone.try_read()).is_err());
    });
    assert!(r.await, "try_read succeeded while a writer held the lock");
    drop(guard);

    let rwlock_clone = Arc::clone(&rwlock);
    let (c, r) = continuation();
    thread::spawn(move || {
        c.send(from_try(rwlock_clone.try_read()).map(|g| *g).ok());
    });
    assert_eq!(r.await, Some(42));
}

#[test_executors::async_test]
async fn test_rwlock_read_blocks_until_write_released() {
    let rwlock = Arc::new(RwLock::new(String::from("before")));
    let mut guard = rwlock.write().unwrap();

    let rwlock_clone = Arc::clone(&rwlock);
    let (c, r) = continuation();
    thread::spawn(move || {
        let start = Instant::now();
        let value = rwlock_clone.read().unwrap().clone();
        c.send((value, start.elapsed()));
    });

    thread::sleep(Duration::from_millis(50));
    *guard = String::from("after");
    drop(guard);

    let (value, waited) = r.await;
    assert_eq!(value, "after");
    assert!(waited >= Duration::from_millis(25), "reader waited {waited:?}");
}

#[test_executors::async_test]
async fn test_rwlock_many_readers_one_writer() {
    let rwlock = Arc::new(RwLock::new(Vec::<u32>::new()));
    let writer = {
        let rwlock = Arc::clone(&rwlock);
        let (c, r) = continuation();
        thread::spawn(move || {
            for i in 0..100 {
                rwlock.with_write(|v| v.push(i)).unwrap();
            }
            c.send(());
        });
        r
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let rwlock = Arc::clone(&rwlock);
            let (c, r) = continuation();
            thread::spawn(move || {
                let mut last = 0;
                let mut monotonic = true;
                for _ in 0..200 {
                    let len = rwlock.with_read(|v| v.len()).unwrap();
                    monotonic &= len >= last;
                    last = len;
                }
                c.send(monotonic);
            });
            r
        })
        .collect();

    writer.await;
    for r in readers {
        assert!(r.await, "a reader saw the vector shrink");
    }
    assert_eq!(rwlock.with_read(|v| v.len()).unwrap(), 100);
}
