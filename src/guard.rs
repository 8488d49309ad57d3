// SPDX-License-Identifier: MIT OR Apache-2.0
//! Guard types for [`RwLock`].
//!
//! A guard proves that its lock is held in the matching mode and releases it when
//! dropped. Guards are `!Send`: the pthread backend requires that the thread that
//! acquired a lock is the one that releases it.

use crate::backend::{Backend, Selected};
use crate::rwlock::RwLock;
use std::marker::PhantomData;

#[cfg(feature = "extension")]
use crate::backend::DowngradeBackend;
#[cfg(feature = "extension")]
use crate::error::LockError;

/// A guard that provides read-only access to the data protected by an [`RwLock`].
///
/// This guard is created by the read locking methods on [`RwLock`]. When the guard
/// is dropped, the read lock is released, allowing writers to acquire the lock once no
/// other readers are active.
///
/// # Examples
///
/// ```
/// use sync_rwlock::RwLock;
///
/// let rwlock = RwLock::new(vec![1, 2, 3]);
///
/// {
///     let guard1 = rwlock.read().unwrap();
///     let guard2 = rwlock.read().unwrap();
///
///     // Both guards can read simultaneously
///     assert_eq!(guard1.len(), 3);
///     assert_eq!(guard2[0], 1);
/// } // Both guards dropped, read locks released
/// ```
#[must_use = "if unused the lock is released immediately"]
pub struct ReadGuard<'a, T, B: Backend = Selected> {
    lock: &'a RwLock<T, B>,
    _not_send: PhantomData<*const ()>,
}

/// A guard that provides exclusive read-write access to the data protected by an
/// [`RwLock`].
///
/// Only one `WriteGuard` can exist at a time for a given `RwLock`.
///
/// # Examples
///
/// ```
/// use sync_rwlock::RwLock;
///
/// let rwlock = RwLock::new(String::from("hello"));
///
/// {
///     let mut guard = rwlock.write().unwrap();
///     guard.push_str(", world!");
///     assert_eq!(&*guard, "hello, world!");
/// } // Guard dropped, write lock released
/// ```
#[must_use = "if unused the lock is released immediately"]
pub struct WriteGuard<'a, T, B: Backend = Selected> {
    lock: &'a RwLock<T, B>,
    _not_send: PhantomData<*const ()>,
}

// Sharing a guard only shares `&T`.
unsafe impl<T: Sync, B: Backend> Sync for ReadGuard<'_, T, B> {}
unsafe impl<T: Sync, B: Backend> Sync for WriteGuard<'_, T, B> {}

impl<'a, T, B: Backend> ReadGuard<'a, T, B> {
    /// The caller must have just acquired a read lock on `lock`.
    pub(crate) fn new(lock: &'a RwLock<T, B>) -> Self {
        ReadGuard {
            lock,
            _not_send: PhantomData,
        }
    }
}

impl<'a, T, B: Backend> WriteGuard<'a, T, B> {
    /// The caller must have just acquired the write lock on `lock`.
    pub(crate) fn new(lock: &'a RwLock<T, B>) -> Self {
        WriteGuard {
            lock,
            _not_send: PhantomData,
        }
    }
}

#[cfg(feature = "extension")]
impl<'a, T, B: DowngradeBackend> WriteGuard<'a, T, B> {
    /// Atomically turns this write guard into a read guard.
    ///
    /// No other writer can get in between. On failure the write guard is handed back
    /// together with the error, so the lock is still held exactly as before.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_rwlock::{RwLock, WriteGuard, backend::FallbackBackend};
    ///
    /// let lock: RwLock<i32, FallbackBackend> = RwLock::with_backend(1);
    /// let mut guard = lock.write().unwrap();
    /// *guard += 1;
    /// let guard = WriteGuard::downgrade(guard).map_err(|(_, e)| e).unwrap();
    /// assert_eq!(*guard, 2);
    /// ```
    pub fn downgrade(this: Self) -> Result<ReadGuard<'a, T, B>, (Self, LockError)> {
        match this.lock.raw.downgrade_write_to_read() {
            Ok(()) => {
                let lock = this.lock;
                // the read lock now belongs to the new guard
                std::mem::forget(this);
                Ok(ReadGuard::new(lock))
            }
            Err(e) => Err((this, e)),
        }
    }
}

impl<T, B: Backend> std::ops::Deref for ReadGuard<'_, T, B> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: a read lock is held for the guard's lifetime, so no `&mut T` exists.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T, B: Backend> std::ops::Deref for WriteGuard<'_, T, B> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the write lock is held for the guard's lifetime.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T, B: Backend> std::ops::DerefMut for WriteGuard<'_, T, B> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the write lock is held, and `&mut self` makes this the only access.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T, B: Backend> Drop for ReadGuard<'_, T, B> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.raw.release_read() {
            tracing::error!(error = %e, "failed to release read guard");
        }
    }
}

impl<T, B: Backend> Drop for WriteGuard<'_, T, B> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.raw.release_write() {
            tracing::error!(error = %e, "failed to release write guard");
        }
    }
}

// ================================================================================================
// Boilerplate trait implementations
// ================================================================================================

impl<T, B: Backend> AsRef<T> for ReadGuard<'_, T, B> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T, B: Backend> AsRef<T> for WriteGuard<'_, T, B> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T, B: Backend> AsMut<T> for WriteGuard<'_, T, B> {
    fn as_mut(&mut self) -> &mut T {
        &mut *self
    }
}

impl<T: std::fmt::Debug, B: Backend> std::fmt::Debug for ReadGuard<'_, T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadGuard")
            .field("data", &**self)
            .finish_non_exhaustive()
    }
}

impl<T: std::fmt::Debug, B: Backend> std::fmt::Debug for WriteGuard<'_, T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteGuard")
            .field("data", &**self)
            .finish_non_exhaustive()
    }
}

impl<T: std::fmt::Display, B: Backend> std::fmt::Display for ReadGuard<'_, T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&**self, f)
    }
}

impl<T: std::fmt::Display, B: Backend> std::fmt::Display for WriteGuard<'_, T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&**self, f)
    }
}
