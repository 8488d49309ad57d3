// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::backend::{Backend, Selected};
use crate::error::{LockResult, from_try};
use crate::raw::RawRwLock;
use std::cell::UnsafeCell;
use std::fmt::{Debug, Display};

/// A reader-writer lock protecting a value of type `T`.
///
/// This lock allows multiple readers to access the data simultaneously, but only
/// one writer at a time. Writers get exclusive access: no readers or other writers
/// can access the data while a write lock is held.
///
/// Acquisition comes in three flavors:
/// - **`read` / `write`**: block until the lock is acquired
/// - **`try_read` / `try_write`**: never block
/// - **`with_read` / `with_write`**: run a closure under the lock
///
/// With the `extension` feature, backends that support it add `read_for` / `write_for`
/// and [`WriteGuard::downgrade`](crate::WriteGuard::downgrade).
///
/// # Examples
///
/// ```
/// use sync_rwlock::RwLock;
///
/// let rwlock = RwLock::new(0i32);
///
/// {
///     let reader1 = rwlock.read().unwrap();
///     let reader2 = rwlock.read().unwrap();
///     assert_eq!(*reader1, *reader2);
/// } // Both read locks released here
///
/// rwlock.with_write(|v| *v += 1).unwrap();
/// assert_eq!(rwlock.into_inner(), 1);
/// ```
pub struct RwLock<T, B: Backend = Selected> {
    pub(crate) raw: RawRwLock<B>,
    pub(crate) data: UnsafeCell<T>,
}

// Readers on several threads share `&T`, and a writer may move a `T` in from any thread.
unsafe impl<T: Send, B: Backend> Send for RwLock<T, B> {}
unsafe impl<T: Send + Sync, B: Backend> Sync for RwLock<T, B> {}

impl<T> RwLock<T> {
    /// Creates a new read-write lock with the given initial value, on the build-time
    /// backend.
    ///
    /// # Panics
    ///
    /// Panics if the backend primitive cannot be created; see [`try_new`](Self::try_new).
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_rwlock::RwLock;
    ///
    /// let rwlock = RwLock::new(42);
    /// assert_eq!(*rwlock.read().unwrap(), 42);
    /// ```
    pub fn new(value: T) -> RwLock<T> {
        RwLock::with_backend(value)
    }

    /// Creates a new read-write lock, reporting a backend that cannot be created.
    pub fn try_new(value: T) -> LockResult<RwLock<T>> {
        RwLock::try_with_backend(value)
    }
}

impl<T, B: Backend> RwLock<T, B> {
    /// Creates a new read-write lock on backend `B`.
    ///
    /// # Panics
    ///
    /// Panics if the backend primitive cannot be created.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_rwlock::{RwLock, backend::FallbackBackend};
    ///
    /// let rwlock = RwLock::<_, FallbackBackend>::with_backend("portable");
    /// assert_eq!(*rwlock.read().unwrap(), "portable");
    /// ```
    pub fn with_backend(value: T) -> RwLock<T, B> {
        RwLock {
            raw: RawRwLock::with_backend(),
            data: UnsafeCell::new(value),
        }
    }

    /// Creates a new read-write lock on backend `B`, reporting a backend that cannot
    /// be created.
    pub fn try_with_backend(value: T) -> LockResult<RwLock<T, B>> {
        Ok(RwLock {
            raw: RawRwLock::try_with_backend()?,
            data: UnsafeCell::new(value),
        })
    }

    /// Consumes the lock and returns the protected value.
    pub fn into_inner(self) -> T {
        let RwLock { raw, data } = self;
        drop(raw);
        data.into_inner()
    }

    /// Mutable access without locking; the borrow checker proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Whether any guard currently holds the lock.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl<T, B: Backend> From<T> for RwLock<T, B> {
    fn from(value: T) -> Self {
        RwLock::with_backend(value)
    }
}

impl<T: Default, B: Backend> Default for RwLock<T, B> {
    fn default() -> Self {
        RwLock::with_backend(T::default())
    }
}

impl<T: Debug, B: Backend> Debug for RwLock<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("RwLock");
        d.field("backend", &B::KIND);
        match from_try(self.try_read()) {
            Ok(guard) => d.field("data", &&*guard),
            Err(_) => d.field("data", &format_args!("<locked>")),
        };
        d.finish()
    }
}

impl<T: Display, B: Backend> Display for RwLock<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match from_try(self.try_read()) {
            Ok(guard) => Display::fmt(&*guard, f),
            Err(_) => write!(f, "RwLock {{ <locked> }}"),
        }
    }
}
