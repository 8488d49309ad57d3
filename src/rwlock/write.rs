// SPDX-License-Identifier: MIT OR Apache-2.0
use super::inner::RwLock;
use crate::backend::Backend;
use crate::error::{LockResult, TryLockResult, into_try};
use crate::guard::WriteGuard;

#[cfg(feature = "extension")]
use crate::backend::TimedBackend;

impl<T, B: Backend> RwLock<T, B> {
    /// Attempts to acquire the write lock without blocking.
    ///
    /// Fails with contention if any reader or writer holds the lock.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_rwlock::{RwLock, from_try};
    ///
    /// let rwlock = RwLock::new(0);
    /// {
    ///     let mut guard = from_try(rwlock.try_write()).unwrap();
    ///     *guard = 42;
    /// }
    ///
    /// let _reader = rwlock.read().unwrap();
    /// assert!(from_try(rwlock.try_write()).is_err());
    /// ```
    pub fn try_write(&self) -> TryLockResult<WriteGuard<'_, T, B>> {
        into_try(self.raw.try_acquire_write().map(|()| WriteGuard::new(self)))
    }

    /// Acquires the write lock, blocking until every reader and writer has left.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_rwlock::RwLock;
    ///
    /// let rwlock = RwLock::new(String::new());
    /// rwlock.write().unwrap().push_str("hello");
    /// assert_eq!(*rwlock.read().unwrap(), "hello");
    /// ```
    pub fn write(&self) -> LockResult<WriteGuard<'_, T, B>> {
        self.raw.acquire_write()?;
        Ok(WriteGuard::new(self))
    }

    /// Runs `f` with exclusive access to the data and returns its result.
    pub fn with_write<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> LockResult<R> {
        let mut guard = self.write()?;
        Ok(f(&mut *guard))
    }
}

#[cfg(feature = "extension")]
impl<T, B: TimedBackend> RwLock<T, B> {
    /// Acquires the write lock, giving up after `timeout`.
    ///
    /// A timeout is contention, and is reported like it in [`TryLockResult`].
    pub fn write_for(
        &self,
        timeout: std::time::Duration,
    ) -> TryLockResult<WriteGuard<'_, T, B>> {
        into_try(
            self.raw
                .acquire_write_for(timeout)
                .map(|()| WriteGuard::new(self)),
        )
    }
}
