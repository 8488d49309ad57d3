// SPDX-License-Identifier: MIT OR Apache-2.0
use super::inner::RwLock;
use crate::backend::Backend;
use crate::error::{LockResult, TryLockResult, into_try};
use crate::guard::ReadGuard;

#[cfg(feature = "extension")]
use crate::backend::TimedBackend;

impl<T, B: Backend> RwLock<T, B> {
    /// Attempts to acquire a read lock without blocking.
    ///
    /// Contention is reported in the configured [`TryLockResult`] shape: `Ok(None)`
    /// with the `optional-result` feature, an [`ErrorKind::WouldBlock`] error
    /// without it.
    ///
    /// [`ErrorKind::WouldBlock`]: crate::ErrorKind::WouldBlock
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_rwlock::{RwLock, from_try};
    ///
    /// let rwlock = RwLock::new("data");
    ///
    /// // Multiple readers can acquire locks
    /// let guard1 = from_try(rwlock.try_read()).unwrap();
    /// let guard2 = from_try(rwlock.try_read()).unwrap();
    /// assert_eq!(*guard1, "data");
    /// assert_eq!(*guard2, "data");
    /// ```
    ///
    /// ## Writer Blocks Readers
    ///
    /// ```
    /// use sync_rwlock::{ErrorKind, RwLock, from_try};
    ///
    /// let rwlock = RwLock::new(0);
    /// let _writer = rwlock.write().unwrap();
    ///
    /// let refused = from_try(rwlock.try_read()).unwrap_err();
    /// assert_eq!(refused.kind(), ErrorKind::WouldBlock);
    /// ```
    pub fn try_read(&self) -> TryLockResult<ReadGuard<'_, T, B>> {
        into_try(self.raw.try_acquire_read().map(|()| ReadGuard::new(self)))
    }

    /// Acquires a read lock, blocking while a writer holds (or, on writer-preferring
    /// backends, waits for) the lock.
    ///
    /// The calling thread must not already hold a read lock on this `RwLock`; see
    /// [recursive read locks](crate::backend#recursive-read-locks).
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_rwlock::RwLock;
    ///
    /// let rwlock = RwLock::new(vec![1, 2, 3]);
    /// let guard = rwlock.read().unwrap();
    /// assert_eq!(guard.len(), 3);
    /// ```
    pub fn read(&self) -> LockResult<ReadGuard<'_, T, B>> {
        self.raw.acquire_read()?;
        Ok(ReadGuard::new(self))
    }

    /// Runs `f` with shared access to the data and returns its result.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_rwlock::RwLock;
    ///
    /// let rwlock = RwLock::new(vec![1, 2, 3]);
    /// let sum = rwlock.with_read(|v| v.iter().sum::<i32>()).unwrap();
    /// assert_eq!(sum, 6);
    /// ```
    pub fn with_read<R, F: FnOnce(&T) -> R>(&self, f: F) -> LockResult<R> {
        let guard = self.read()?;
        Ok(f(&*guard))
    }
}

#[cfg(feature = "extension")]
impl<T, B: TimedBackend> RwLock<T, B> {
    /// Acquires a read lock, giving up after `timeout`.
    ///
    /// A timeout is contention, and is reported like it in [`TryLockResult`].
    pub fn read_for(&self, timeout: std::time::Duration) -> TryLockResult<ReadGuard<'_, T, B>> {
        into_try(
            self.raw
                .acquire_read_for(timeout)
                .map(|()| ReadGuard::new(self)),
        )
    }
}
