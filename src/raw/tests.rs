// SPDX-License-Identifier: MIT OR Apache-2.0
use super::*;
use crate::test_support::init_test_logging;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn fresh_lock_is_unlocked() {
    let lock: RawRwLock = RawRwLock::new();
    assert!(!lock.is_locked());
    assert!(!lock.is_locked_exclusive());
    assert_eq!(lock.reader_count(), 0);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn holder_mirror_tracks_readers_and_writer() {
    let lock: RawRwLock = RawRwLock::new();
    lock.acquire_read().unwrap();
    lock.acquire_read().unwrap();
    assert_eq!(lock.reader_count(), 2);
    assert!(lock.is_locked());
    assert!(!lock.is_locked_exclusive());

    lock.release_read().unwrap();
    lock.release_read().unwrap();
    assert!(!lock.is_locked());

    lock.acquire_write().unwrap();
    assert!(lock.is_locked_exclusive());
    assert_eq!(lock.reader_count(), 0);
    lock.release_write().unwrap();
    assert!(!lock.is_locked());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn failed_try_leaves_mirror_alone() {
    let lock: RawRwLock = RawRwLock::new();
    lock.acquire_write().unwrap();
    assert!(lock.try_acquire_read().is_err());
    assert!(lock.try_acquire_write().is_err());
    assert_eq!(lock.reader_count(), 0);
    assert!(lock.is_locked_exclusive());
    lock.release_write().unwrap();
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn extra_release_after_balanced_use_is_misuse() {
    init_test_logging();
    let lock: RawRwLock = RawRwLock::new();
    lock.acquire_read().unwrap();
    lock.release_read().unwrap();
    let err = lock.release_read().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Misuse);
    assert!(!lock.is_locked());
}

#[cfg(feature = "rich-errors")]
#[test]
fn misuse_carries_context() {
    let lock: RawRwLock = RawRwLock::new();
    let err = lock.release_write().unwrap_err();
    assert_eq!(err.code(), None);
    assert_eq!(err.context(), "the write lock is not held");
}

#[cfg(all(feature = "rich-errors", not(target_arch = "wasm32")))]
#[test]
fn foreign_release_names_the_other_thread() {
    let lock: std::sync::Arc<RawRwLock> = std::sync::Arc::new(RawRwLock::new());
    lock.acquire_write().unwrap();
    let lock_clone = std::sync::Arc::clone(&lock);
    let err = std::thread::spawn(move || lock_clone.release_write().unwrap_err())
        .join()
        .unwrap();
    assert_eq!(err.context(), "the write lock is held by another thread");
    lock.release_write().unwrap();
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn destroy_unlocked_is_ok() {
    let lock: RawRwLock = RawRwLock::new();
    lock.acquire_write().unwrap();
    lock.release_write().unwrap();
    lock.destroy().unwrap();
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn destroy_held_is_misuse() {
    init_test_logging();
    let lock: RawRwLock = RawRwLock::new();
    lock.acquire_read().unwrap();
    let err = lock.destroy().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Misuse);

    let lock: RawRwLock = RawRwLock::new();
    lock.acquire_write().unwrap();
    assert_eq!(lock.destroy().unwrap_err().kind(), ErrorKind::Misuse);
}

#[test]
fn dropping_held_lock_does_not_panic() {
    init_test_logging();
    let lock: RawRwLock = RawRwLock::new();
    lock.acquire_write().unwrap();
    drop(lock);
}

#[test]
fn debug_shows_state() {
    let lock: RawRwLock = RawRwLock::new();
    lock.acquire_read().unwrap();
    let shown = format!("{lock:?}");
    assert!(shown.contains("RawRwLock"), "{shown}");
    assert!(shown.contains("readers: 1"), "{shown}");
    assert!(shown.contains("writer: false"), "{shown}");
    lock.release_read().unwrap();
}

#[test]
fn default_matches_new() {
    let lock: RawRwLock = RawRwLock::default();
    assert_eq!(lock.backend_kind(), crate::CONFIG.backend);
    assert!(!lock.is_locked());
}

#[cfg(feature = "extension")]
mod extension {
    use super::*;
    use crate::backend::FallbackBackend;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn downgrade_keeps_writers_out<B: DowngradeBackend + 'static>() {
        let lock = Arc::new(RawRwLock::<B>::with_backend());
        lock.acquire_write().unwrap();
        lock.downgrade_write_to_read().unwrap();
        assert!(!lock.is_locked_exclusive());
        assert_eq!(lock.reader_count(), 1);

        // the caller is a reader now: writers stay out, other readers may join
        assert_eq!(
            lock.try_acquire_write().unwrap_err().kind(),
            ErrorKind::WouldBlock
        );
        let (tx, rx) = mpsc::channel();
        let lock_clone = Arc::clone(&lock);
        thread::spawn(move || {
            let joined = lock_clone.try_acquire_read().is_ok();
            if joined {
                lock_clone.release_read().unwrap();
            }
            tx.send(joined).unwrap();
        });
        assert!(rx.recv().unwrap());

        lock.release_read().unwrap();
        assert!(!lock.is_locked());
        lock.try_acquire_write().unwrap();
        lock.release_write().unwrap();
    }

    fn downgrade_without_write_is_misuse<B: DowngradeBackend + 'static>() {
        init_test_logging();
        let lock = RawRwLock::<B>::with_backend();
        assert_eq!(
            lock.downgrade_write_to_read().unwrap_err().kind(),
            ErrorKind::Misuse
        );
        lock.acquire_read().unwrap();
        assert_eq!(
            lock.downgrade_write_to_read().unwrap_err().kind(),
            ErrorKind::Misuse
        );
        assert_eq!(lock.reader_count(), 1);
        lock.release_read().unwrap();

        // only the writer itself may downgrade
        lock.acquire_write().unwrap();
        let lock = Arc::new(lock);
        let lock_clone = Arc::clone(&lock);
        let foreign = thread::spawn(move || {
            lock_clone.downgrade_write_to_read().map_err(|e| e.kind())
        })
        .join()
        .unwrap();
        assert_eq!(foreign, Err(ErrorKind::Misuse));
        assert!(lock.is_locked_exclusive());
        lock.downgrade_write_to_read().unwrap();
        lock.release_read().unwrap();
        assert!(!lock.is_locked());
    }

    // A downgrade that released and re-acquired would let the other thread's
    // `try_acquire_write` in while `held` is set.
    fn downgrade_is_atomic_against_other_writers<B: DowngradeBackend + 'static>() {
        let lock = Arc::new(RawRwLock::<B>::with_backend());
        let held = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));

        let contender = {
            let lock = Arc::clone(&lock);
            let held = Arc::clone(&held);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut intrusions = 0;
                while !stop.load(Ordering::SeqCst) {
                    if lock.try_acquire_write().is_ok() {
                        if held.load(Ordering::SeqCst) {
                            intrusions += 1;
                        }
                        lock.release_write().unwrap();
                    }
                    thread::yield_now();
                }
                intrusions
            })
        };

        for _ in 0..500 {
            lock.acquire_write().unwrap();
            held.store(true, Ordering::SeqCst);
            lock.downgrade_write_to_read().unwrap();
            thread::yield_now();
            held.store(false, Ordering::SeqCst);
            lock.release_read().unwrap();
        }
        stop.store(true, Ordering::SeqCst);
        assert_eq!(contender.join().unwrap(), 0, "a writer got in during a downgrade");
        assert!(!lock.is_locked());
    }

    fn timed_acquisition<B: TimedBackend + 'static>() {
        let lock = Arc::new(RawRwLock::<B>::with_backend());
        lock.acquire_write().unwrap();
        assert_eq!(
            lock.acquire_read_for(Duration::from_millis(10))
                .unwrap_err()
                .kind(),
            ErrorKind::WouldBlock
        );
        assert_eq!(
            lock.acquire_write_for(Duration::from_millis(10))
                .unwrap_err()
                .kind(),
            ErrorKind::WouldBlock
        );
        assert_eq!(lock.reader_count(), 0);

        lock.release_write().unwrap();

        // a writer on another thread lets go while this one waits
        let (tx, rx) = mpsc::channel();
        let lock_clone = Arc::clone(&lock);
        let writer = thread::spawn(move || {
            lock_clone.acquire_write().unwrap();
            tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(20));
            lock_clone.release_write().unwrap();
        });
        rx.recv().unwrap();
        lock.acquire_read_for(Duration::from_secs(10)).unwrap();
        writer.join().unwrap();
        assert_eq!(lock.reader_count(), 1);
        lock.release_read().unwrap();
        lock.acquire_write_for(Duration::from_secs(10)).unwrap();
        lock.release_write().unwrap();
    }

    #[test]
    fn fallback_downgrade() {
        downgrade_keeps_writers_out::<FallbackBackend>();
        downgrade_without_write_is_misuse::<FallbackBackend>();
    }

    #[test]
    fn fallback_downgrade_is_atomic() {
        downgrade_is_atomic_against_other_writers::<FallbackBackend>();
    }

    #[test]
    fn fallback_timed() {
        timed_acquisition::<FallbackBackend>();
    }

    #[cfg(not(all(target_arch = "wasm32", not(target_feature = "atomics"))))]
    #[test]
    fn shared_lock_downgrade() {
        use crate::backend::SharedLockBackend;
        downgrade_keeps_writers_out::<SharedLockBackend>();
        downgrade_without_write_is_misuse::<SharedLockBackend>();
    }

    #[cfg(not(all(target_arch = "wasm32", not(target_feature = "atomics"))))]
    #[test]
    fn shared_lock_downgrade_is_atomic() {
        downgrade_is_atomic_against_other_writers::<crate::backend::SharedLockBackend>();
    }

    #[cfg(not(all(target_arch = "wasm32", not(target_feature = "atomics"))))]
    #[test]
    fn shared_lock_timed() {
        timed_acquisition::<crate::backend::SharedLockBackend>();
    }

    #[cfg(unix)]
    #[test]
    fn pthread_raw_codes() {
        use crate::backend::PthreadBackend;

        let lock = RawRwLock::<PthreadBackend>::with_backend();
        lock.try_acquire_write_code().unwrap();
        assert!(lock.is_locked_exclusive());
        assert_eq!(lock.try_acquire_read_code(), Err(libc::EBUSY));
        assert_eq!(lock.try_acquire_write_code(), Err(libc::EBUSY));
        lock.release_write().unwrap();

        lock.try_acquire_read_code().unwrap();
        assert_eq!(lock.reader_count(), 1);
        lock.release_read().unwrap();
    }
}
