// SPDX-License-Identifier: MIT OR Apache-2.0
//! Backend over a native shared-lock primitive (`parking_lot::RawRwLock`).
//!
//! # Nested read locks deadlock
//!
//! **A thread that already holds a read lock must not acquire another read lock on the
//! same instance.** The primitive is task-fair: once a writer is waiting, new readers
//! queue behind it, and it keeps no per-thread recursion count. A nested read then
//! waits for the writer, which waits for the outer read: deadlock. This is not
//! detected; the non-blocking acquisitions report `WouldBlock` in the same situation.

use super::Backend;
use crate::config::BackendKind;
use crate::error::{ErrorKind, LockResult, error};
use parking_lot::lock_api::RawRwLock as _;

/// A reader-writer lock backed by `parking_lot`'s raw lock.
pub struct SharedLockBackend {
    inner: parking_lot::RawRwLock,
}

impl std::fmt::Debug for SharedLockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLockBackend")
            .field("locked", &self.inner.is_locked())
            .finish()
    }
}

unsafe impl Backend for SharedLockBackend {
    const KIND: BackendKind = BackendKind::SharedLock;

    fn create() -> LockResult<Self> {
        Ok(SharedLockBackend {
            inner: <parking_lot::RawRwLock as parking_lot::lock_api::RawRwLock>::INIT,
        })
    }

    fn acquire_read(&self) -> LockResult<()> {
        self.inner.lock_shared();
        Ok(())
    }

    fn acquire_write(&self) -> LockResult<()> {
        self.inner.lock_exclusive();
        Ok(())
    }

    fn try_read(&self) -> LockResult<()> {
        if self.inner.try_lock_shared() {
            Ok(())
        } else {
            Err(error(ErrorKind::WouldBlock, "try_lock_shared"))
        }
    }

    fn try_write(&self) -> LockResult<()> {
        if self.inner.try_lock_exclusive() {
            Ok(())
        } else {
            Err(error(ErrorKind::WouldBlock, "try_lock_exclusive"))
        }
    }

    unsafe fn release_read(&self) -> LockResult<()> {
        // SAFETY: the caller holds a shared lock.
        unsafe { self.inner.unlock_shared() };
        Ok(())
    }

    unsafe fn release_write(&self) -> LockResult<()> {
        // SAFETY: the caller holds the exclusive lock.
        unsafe { self.inner.unlock_exclusive() };
        Ok(())
    }
}

#[cfg(feature = "extension")]
unsafe impl super::DowngradeBackend for SharedLockBackend {
    unsafe fn downgrade(&self) -> LockResult<()> {
        use parking_lot::lock_api::RawRwLockDowngrade as _;
        // SAFETY: the caller holds the exclusive lock.
        unsafe { self.inner.downgrade() };
        Ok(())
    }
}

#[cfg(feature = "extension")]
impl super::TimedBackend for SharedLockBackend {
    fn acquire_read_for(&self, timeout: std::time::Duration) -> LockResult<()> {
        use parking_lot::lock_api::RawRwLockTimed as _;
        if self.inner.try_lock_shared_for(timeout) {
            Ok(())
        } else {
            Err(error(ErrorKind::WouldBlock, "try_lock_shared_for"))
        }
    }

    fn acquire_write_for(&self, timeout: std::time::Duration) -> LockResult<()> {
        use parking_lot::lock_api::RawRwLockTimed as _;
        if self.inner.try_lock_exclusive_for(timeout) {
            Ok(())
        } else {
            Err(error(ErrorKind::WouldBlock, "try_lock_exclusive_for"))
        }
    }
}
