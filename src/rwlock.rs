// SPDX-License-Identifier: MIT OR Apache-2.0
//! A data-carrying reader-writer lock with RAII guards.
//!
//! [`RwLock<T>`](RwLock) pairs a [`RawRwLock`](crate::RawRwLock) with the value it
//! protects. The value is only reachable through a [`ReadGuard`](crate::ReadGuard)
//! (shared `&T`) or a [`WriteGuard`](crate::WriteGuard) (`&mut T`), and each guard
//! releases its lock when dropped, so acquisitions and releases cannot get out of step.
//!
//! Every method reports failure through the crate's error types instead of panicking:
//! blocking acquisitions return a [`LockResult`](crate::LockResult) and non-blocking
//! ones a [`TryLockResult`](crate::TryLockResult), whose shape depends on the
//! `optional-result` feature.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use sync_rwlock::RwLock;
//!
//! let rwlock = RwLock::new(42);
//!
//! // Multiple readers can access simultaneously
//! let guard1 = rwlock.read().unwrap();
//! let guard2 = rwlock.read().unwrap();
//! assert_eq!(*guard1, 42);
//! assert_eq!(*guard2, 42);
//! drop(guard1);
//! drop(guard2);
//!
//! // Writer gets exclusive access
//! let mut guard = rwlock.write().unwrap();
//! *guard = 100;
//! drop(guard);
//!
//! assert_eq!(rwlock.with_read(|v| *v).unwrap(), 100);
//! ```
//!
//! ## Try Lock
//!
//! ```
//! use sync_rwlock::{RwLock, from_try};
//!
//! let rwlock = RwLock::new("data");
//!
//! let guard = rwlock.read().unwrap();
//!
//! // Write lock is refused while a reader is active
//! let refused = from_try(rwlock.try_write()).unwrap_err();
//! assert_eq!(refused.kind(), sync_rwlock::ErrorKind::WouldBlock);
//!
//! drop(guard);
//! assert!(from_try(rwlock.try_write()).is_ok());
//! ```
//!
//! ## Thread-Safe Sharing with Multiple Readers
//!
//! ```
//! # // std::thread::spawn panics on wasm32
//! # if cfg!(target_arch = "wasm32") { return; }
//! use sync_rwlock::RwLock;
//! use std::sync::Arc;
//! # use std::thread;
//!
//! let rwlock = Arc::new(RwLock::new(vec![1, 2, 3, 4, 5]));
//! let mut handles = vec![];
//!
//! for _ in 0..3 {
//!     let rwlock = Arc::clone(&rwlock);
//!     handles.push(thread::spawn(move || {
//!         rwlock.with_read(|data| data.iter().sum::<i32>()).unwrap()
//!     }));
//! }
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap(), 15);
//! }
//! ```

mod inner;
mod read;
mod write;


pub use inner::RwLock;
