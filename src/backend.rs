// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lock backends and the capability traits they implement.
//!
//! A backend is the object that actually coordinates threads. Three are provided:
//!
//! - [`PthreadBackend`]: POSIX `pthread_rwlock_t` (unix only)
//! - [`SharedLockBackend`]: `parking_lot`'s raw reader-writer lock
//! - [`FallbackBackend`]: a `Mutex` + `Condvar` pair that compiles everywhere
//!
//! The lock types are generic over [`Backend`] and default to [`Selected`], the backend
//! chosen at build time. There is no dynamic dispatch: each lock is monomorphized for
//! its backend.
//!
//! With the `extension` feature, backends may additionally implement
//! [`DowngradeBackend`], [`TimedBackend`] or [`RawCodeBackend`]. The matching lock
//! methods only exist for backends that implement them, so calling an extension the
//! backend does not support is a compile error.
//!
//! # Recursive read locks
//!
//! No backend supports a thread acquiring a read lock it already holds. On
//! [`SharedLockBackend`] and [`FallbackBackend`] a nested read deadlocks as soon as a
//! writer is waiting. [`PthreadBackend`] usually tolerates it, but POSIX does not
//! guarantee it. This precondition is not checked.

use crate::config::BackendKind;
use crate::error::LockResult;

pub mod fallback;
#[cfg(unix)]
pub mod pthread;
#[cfg(not(all(target_arch = "wasm32", not(target_feature = "atomics"))))]
pub mod shared;


pub use fallback::FallbackBackend;
#[cfg(unix)]
pub use pthread::PthreadBackend;
#[cfg(not(all(target_arch = "wasm32", not(target_feature = "atomics"))))]
pub use shared::SharedLockBackend;

cfg_if::cfg_if! {
    if #[cfg(sync_rwlock_backend = "pthread")] {
        /// The backend chosen at build time.
        pub type Selected = PthreadBackend;
    } else if #[cfg(sync_rwlock_backend = "shared")] {
        /// The backend chosen at build time.
        pub type Selected = SharedLockBackend;
    } else {
        /// The backend chosen at build time.
        pub type Selected = FallbackBackend;
    }
}

/// The operations every backend provides.
///
/// # Safety
///
/// Implementations must uphold the reader-writer invariant: while `acquire_write` or
/// `try_write` holds, no other read or write acquisition succeeds, and while any
/// read is held no write acquisition succeeds. A failed acquisition must leave the
/// backend exactly as it was.
pub unsafe trait Backend: Send + Sync + Sized {
    /// Which backend this is.
    const KIND: BackendKind;

    /// Creates the underlying primitive.
    fn create() -> LockResult<Self>;

    /// Blocks until no writer holds the lock, then takes a shared lock.
    fn acquire_read(&self) -> LockResult<()>;

    /// Blocks until the lock is free, then takes it exclusively.
    fn acquire_write(&self) -> LockResult<()>;

    /// Takes a shared lock if that is possible right now; `WouldBlock` otherwise.
    fn try_read(&self) -> LockResult<()>;

    /// Takes the exclusive lock if it is free right now; `WouldBlock` otherwise.
    fn try_write(&self) -> LockResult<()>;

    /// Releases a shared lock.
    ///
    /// # Safety
    ///
    /// The caller must hold a shared lock acquired through this backend.
    unsafe fn release_read(&self) -> LockResult<()>;

    /// Releases the exclusive lock.
    ///
    /// # Safety
    ///
    /// The caller must hold the exclusive lock.
    unsafe fn release_write(&self) -> LockResult<()>;

    /// Tears the primitive down. Only called while the lock is not held.
    fn destroy(self) -> LockResult<()> {
        Ok(())
    }
}

/// Atomic conversion of a held write lock into a read lock.
///
/// # Safety
///
/// No other thread may acquire the write lock, nor observe the lock unlocked, between
/// the exclusive and the shared state.
#[cfg(feature = "extension")]
pub unsafe trait DowngradeBackend: Backend {
    /// Converts the caller's write lock into a read lock.
    ///
    /// # Safety
    ///
    /// The caller must hold the exclusive lock.
    unsafe fn downgrade(&self) -> LockResult<()>;
}

/// Acquisition with a timeout.
///
/// On expiry the methods return `WouldBlock` and the lock is left untouched.
#[cfg(feature = "extension")]
pub trait TimedBackend: Backend {
    /// Like [`Backend::acquire_read`], giving up after `timeout`.
    fn acquire_read_for(&self, timeout: std::time::Duration) -> LockResult<()>;

    /// Like [`Backend::acquire_write`], giving up after `timeout`.
    fn acquire_write_for(&self, timeout: std::time::Duration) -> LockResult<()>;
}

/// Non-blocking acquisition reporting the raw platform return code.
#[cfg(feature = "extension")]
pub trait RawCodeBackend: Backend {
    /// [`Backend::try_read`], with the unclassified platform error on failure.
    fn try_read_code(&self) -> Result<(), i32>;

    /// [`Backend::try_write`], with the unclassified platform error on failure.
    fn try_write_code(&self) -> Result<(), i32>;
}
