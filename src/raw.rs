// SPDX-License-Identifier: MIT OR Apache-2.0
//! The lock facade: explicit acquire and release calls, no guards.
//!
//! [`RawRwLock`] is the type to use when lock and unlock cannot be tied to a scope, for
//! example when they happen in different callbacks. For ordinary code prefer
//! [`RwLock`](crate::RwLock), whose guards make an unmatched release impossible.
//!
//! # Misuse detection
//!
//! The facade keeps a count of current holders next to the backend, and remembers which
//! thread holds the write lock. A release that does not match any acquisition in that
//! mode (a `release_read` with no readers, a `release_write` with no writer) is refused
//! with [`ErrorKind::Misuse`] before the backend is touched, and so is a `release_write`
//! or downgrade from a thread other than the writer. The state other threads see is
//! never corrupted. The facade cannot tell *which* thread holds a read lock: releasing a
//! read lock that another thread acquired is an unchecked precondition.
//!
//! # Examples
//!
//! ```
//! use sync_rwlock::{ErrorKind, RawRwLock};
//!
//! let lock: RawRwLock = RawRwLock::new();
//!
//! lock.acquire_read().unwrap();
//! lock.try_acquire_read().unwrap();
//! assert_eq!(lock.reader_count(), 2);
//!
//! // readers keep writers out
//! let err = lock.try_acquire_write().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::WouldBlock);
//!
//! lock.release_read().unwrap();
//! lock.release_read().unwrap();
//! lock.try_acquire_write().unwrap();
//! lock.release_write().unwrap();
//! ```

use crate::backend::{Backend, Selected};
use crate::config::BackendKind;
use crate::error::{ErrorKind, LockError, LockResult, error};
use std::mem::ManuallyDrop;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};

#[cfg(feature = "extension")]
use crate::backend::{DowngradeBackend, RawCodeBackend, TimedBackend};

#[cfg(test)]
mod tests;

pub(crate) const WRITER: usize = 1 << (usize::BITS - 1);
pub(crate) const READERS: usize = WRITER - 1;

/// A reader-writer lock with explicit acquire and release operations.
///
/// The type parameter picks the backend; it defaults to the one selected at build time
/// (see [`config`](crate::config)). At any instant the lock is unlocked, shared by one
/// or more readers, or held by exactly one writer.
///
/// Every operation returns a [`LockResult`]. Nothing is retried internally: a
/// non-blocking attempt that meets contention returns [`ErrorKind::WouldBlock`] and
/// leaves the lock untouched.
///
/// # Recursive reads
///
/// A thread must not take a read lock it already holds. See the
/// [backend documentation](crate::backend#recursive-read-locks).
pub struct RawRwLock<B: Backend = Selected> {
    // Taken only by `teardown`, and only when the lock is free.
    backend: ManuallyDrop<B>,
    // WRITER bit plus the number of readers.
    holders: AtomicUsize,
    // `thread_token()` of the write holder, 0 when there is none.
    writer: AtomicUsize,
}

impl RawRwLock {
    /// Creates an unlocked lock on the build-time backend.
    ///
    /// # Panics
    ///
    /// Panics if the backend primitive cannot be created. Use [`try_new`](Self::try_new)
    /// to handle that case.
    pub fn new() -> Self {
        RawRwLock::with_backend()
    }

    /// Creates an unlocked lock on the build-time backend, reporting a backend that
    /// cannot be created.
    pub fn try_new() -> LockResult<Self> {
        RawRwLock::try_with_backend()
    }
}

impl<B: Backend> RawRwLock<B> {
    /// Creates an unlocked lock on backend `B`.
    ///
    /// # Panics
    ///
    /// Panics if the backend primitive cannot be created.
    pub fn with_backend() -> Self {
        match Self::try_with_backend() {
            Ok(lock) => lock,
            Err(e) => panic!("failed to create {} lock: {e}", B::KIND),
        }
    }

    /// Creates an unlocked lock on backend `B`, reporting a backend that cannot be
    /// created.
    pub fn try_with_backend() -> LockResult<Self> {
        let backend = B::create().inspect_err(|e| report("create", e))?;
        tracing::trace!(backend = %B::KIND, "lock created");
        Ok(RawRwLock {
            backend: ManuallyDrop::new(backend),
            holders: AtomicUsize::new(0),
            writer: AtomicUsize::new(0),
        })
    }

    /// The backend this lock was compiled against.
    #[inline]
    pub const fn backend_kind(&self) -> BackendKind {
        B::KIND
    }

    /// Blocks until no writer holds the lock, then takes a shared lock.
    pub fn acquire_read(&self) -> LockResult<()> {
        self.backend
            .acquire_read()
            .inspect_err(|e| report("acquire_read", e))?;
        self.add_reader();
        Ok(())
    }

    /// Blocks until the lock is free, then takes it exclusively.
    pub fn acquire_write(&self) -> LockResult<()> {
        self.backend
            .acquire_write()
            .inspect_err(|e| report("acquire_write", e))?;
        self.add_writer();
        Ok(())
    }

    /// Takes a shared lock if that is possible right now. Never blocks.
    ///
    /// Writer-preferring backends also refuse while a writer is waiting.
    pub fn try_acquire_read(&self) -> LockResult<()> {
        self.backend
            .try_read()
            .inspect_err(|e| report("try_acquire_read", e))?;
        self.add_reader();
        Ok(())
    }

    /// Takes the exclusive lock if nobody holds the lock. Never blocks.
    pub fn try_acquire_write(&self) -> LockResult<()> {
        self.backend
            .try_write()
            .inspect_err(|e| report("try_acquire_write", e))?;
        self.add_writer();
        Ok(())
    }

    /// Releases a shared lock held by the caller.
    ///
    /// Returns [`ErrorKind::Misuse`] when no read lock is held.
    pub fn release_read(&self) -> LockResult<()> {
        let claimed = self
            .holders
            .fetch_update(AcqRel, Acquire, |h| (h & READERS != 0).then(|| h - 1));
        if claimed.is_err() {
            return Err(misuse("release_read", "release_read without a read lock held"));
        }
        // SAFETY: a registered reader exists, so the backend holds a shared lock.
        unsafe { self.backend.release_read() }.inspect_err(|e| {
            report("release_read", e);
            self.holders.fetch_add(1, AcqRel);
        })
    }

    /// Releases the exclusive lock held by the caller.
    ///
    /// Returns [`ErrorKind::Misuse`] when the lock is not write-locked, or when it is
    /// write-locked by another thread.
    pub fn release_write(&self) -> LockResult<()> {
        self.check_writer("release_write")?;
        // Only the holder gets here, so nobody races these two steps.
        self.writer.store(0, Release);
        self.holders.fetch_sub(WRITER, AcqRel);
        // SAFETY: the caller holds the write lock, so the backend is write-locked.
        unsafe { self.backend.release_write() }.inspect_err(|e| {
            report("release_write", e);
            self.add_writer();
        })
    }

    /// Whether any reader or writer holds the lock.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.holders.load(Acquire) != 0
    }

    /// Whether a writer holds the lock.
    #[inline]
    pub fn is_locked_exclusive(&self) -> bool {
        self.holders.load(Acquire) & WRITER != 0
    }

    /// Number of read locks currently held.
    #[inline]
    pub fn reader_count(&self) -> usize {
        self.holders.load(Acquire) & READERS
    }

    /// Tears the lock down, reporting what `Drop` can only log.
    ///
    /// Destroying a held lock is [`ErrorKind::Misuse`]; in that case the backend
    /// primitive is leaked rather than destroyed underneath its holders.
    pub fn destroy(self) -> LockResult<()> {
        let mut this = ManuallyDrop::new(self);
        this.teardown().inspect_err(|e| report("destroy", e))
    }

    fn teardown(&mut self) -> LockResult<()> {
        let holders = *self.holders.get_mut();
        if holders != 0 {
            return Err(error(ErrorKind::Misuse, "destroying a held lock"));
        }
        // SAFETY: called once, from `destroy` or `drop`; `backend` is not used afterwards.
        let backend = unsafe { ManuallyDrop::take(&mut self.backend) };
        backend.destroy()
    }

    fn add_writer(&self) {
        self.writer.store(thread_token(), Release);
        self.holders.fetch_add(WRITER, AcqRel);
    }

    fn check_writer(&self, op: &'static str) -> LockResult<()> {
        if !self.is_locked_exclusive() {
            return Err(misuse(op, "the write lock is not held"));
        }
        if self.writer.load(Acquire) != thread_token() {
            return Err(misuse(op, "the write lock is held by another thread"));
        }
        Ok(())
    }

    #[inline]
    fn add_reader(&self) {
        let previous = self.holders.fetch_add(1, AcqRel);
        assert!(previous & READERS != READERS, "too many readers");
    }
}

#[cfg(feature = "extension")]
impl<B: DowngradeBackend> RawRwLock<B> {
    /// Atomically turns the caller's write lock into a read lock.
    ///
    /// No other thread can acquire the write lock, or observe the lock unlocked, during
    /// the transition. Readers waiting for the writer may be admitted afterwards.
    ///
    /// Returns [`ErrorKind::Misuse`] when the caller does not hold the write lock.
    pub fn downgrade_write_to_read(&self) -> LockResult<()> {
        self.check_writer("downgrade")?;
        // SAFETY: the caller holds the write lock, so the backend is write-locked.
        unsafe { self.backend.downgrade() }.inspect_err(|e| report("downgrade", e))?;
        self.writer.store(0, Release);
        // clear the writer bit and count the caller as a reader in one step
        self.holders.fetch_sub(WRITER - 1, AcqRel);
        Ok(())
    }
}

#[cfg(feature = "extension")]
impl<B: TimedBackend> RawRwLock<B> {
    /// Like [`acquire_read`](Self::acquire_read), but gives up after `timeout` with
    /// [`ErrorKind::WouldBlock`].
    pub fn acquire_read_for(&self, timeout: std::time::Duration) -> LockResult<()> {
        self.backend
            .acquire_read_for(timeout)
            .inspect_err(|e| report("acquire_read_for", e))?;
        self.add_reader();
        Ok(())
    }

    /// Like [`acquire_write`](Self::acquire_write), but gives up after `timeout` with
    /// [`ErrorKind::WouldBlock`].
    pub fn acquire_write_for(&self, timeout: std::time::Duration) -> LockResult<()> {
        self.backend
            .acquire_write_for(timeout)
            .inspect_err(|e| report("acquire_write_for", e))?;
        self.add_writer();
        Ok(())
    }
}

#[cfg(feature = "extension")]
impl<B: RawCodeBackend> RawRwLock<B> {
    /// [`try_acquire_read`](Self::try_acquire_read), returning the platform's own
    /// return code on failure.
    pub fn try_acquire_read_code(&self) -> Result<(), i32> {
        self.backend.try_read_code()?;
        self.add_reader();
        Ok(())
    }

    /// [`try_acquire_write`](Self::try_acquire_write), returning the platform's own
    /// return code on failure.
    pub fn try_acquire_write_code(&self) -> Result<(), i32> {
        self.backend.try_write_code()?;
        self.add_writer();
        Ok(())
    }
}

impl<B: Backend> Drop for RawRwLock<B> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::error!(backend = %B::KIND, error = %e, "lock dropped in an invalid state");
        }
    }
}

impl<B: Backend> Default for RawRwLock<B> {
    fn default() -> Self {
        RawRwLock::with_backend()
    }
}

impl<B: Backend> std::fmt::Debug for RawRwLock<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let holders = self.holders.load(Acquire);
        f.debug_struct("RawRwLock")
            .field("backend", &B::KIND)
            .field("writer", &(holders & WRITER != 0))
            .field("readers", &(holders & READERS))
            .finish()
    }
}

// Nonzero and unique per thread for the life of the process.
fn thread_token() -> usize {
    static NEXT: AtomicUsize = AtomicUsize::new(1);
    std::thread_local! {
        static TOKEN: usize = NEXT.fetch_add(1, Relaxed);
    }
    TOKEN.with(|token| *token)
}

fn misuse(op: &'static str, context: &'static str) -> LockError {
    let e = error(ErrorKind::Misuse, context);
    report(op, &e);
    e
}

// Contention is routine and only traced; the rest is worth a warning.
fn report(op: &'static str, e: &LockError) {
    match e.kind() {
        ErrorKind::WouldBlock => tracing::trace!(op, "lock contended"),
        ErrorKind::ResourceExhausted | ErrorKind::Misuse => {
            tracing::warn!(op, error = %e, "lock operation failed")
        }
    }
}
