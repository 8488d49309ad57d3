// SPDX-License-Identifier: MIT OR Apache-2.0
//! Backend over the POSIX `pthread_rwlock_t`.
//!
//! Reader/writer fairness is whatever the platform's implementation provides. Most
//! implementations let a thread take a second read lock it already holds, but POSIX
//! does not promise it, so callers must not rely on it.

use super::Backend;
use crate::config::BackendKind;
use crate::error::{LockResult, os_error};
use std::cell::UnsafeCell;

/// A reader-writer lock backed by `pthread_rwlock_t`.
///
/// The native object is boxed: a pthread rwlock must not move once it has been
/// initialised.
pub struct PthreadBackend {
    inner: Box<UnsafeCell<libc::pthread_rwlock_t>>,
}

// SAFETY: pthread rwlocks are designed to be shared between threads.
unsafe impl Send for PthreadBackend {}
unsafe impl Sync for PthreadBackend {}

impl PthreadBackend {
    #[inline]
    fn raw(&self) -> *mut libc::pthread_rwlock_t {
        self.inner.get()
    }

    #[inline]
    fn check(code: libc::c_int, context: &'static str) -> LockResult<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(os_error(code, context))
        }
    }
}

impl std::fmt::Debug for PthreadBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PthreadBackend").finish_non_exhaustive()
    }
}

unsafe impl Backend for PthreadBackend {
    const KIND: BackendKind = BackendKind::Pthread;

    fn create() -> LockResult<Self> {
        let inner = Box::new(UnsafeCell::new(libc::PTHREAD_RWLOCK_INITIALIZER));
        // SAFETY: the pointer is valid and the object has not been used yet.
        let r = unsafe { libc::pthread_rwlock_init(inner.get(), std::ptr::null()) };
        Self::check(r, "pthread_rwlock_init")?;
        Ok(PthreadBackend { inner })
    }

    fn acquire_read(&self) -> LockResult<()> {
        // SAFETY: initialised in `create`, never moved.
        Self::check(
            unsafe { libc::pthread_rwlock_rdlock(self.raw()) },
            "pthread_rwlock_rdlock",
        )
    }

    fn acquire_write(&self) -> LockResult<()> {
        Self::check(
            unsafe { libc::pthread_rwlock_wrlock(self.raw()) },
            "pthread_rwlock_wrlock",
        )
    }

    fn try_read(&self) -> LockResult<()> {
        Self::check(
            unsafe { libc::pthread_rwlock_tryrdlock(self.raw()) },
            "pthread_rwlock_tryrdlock",
        )
    }

    fn try_write(&self) -> LockResult<()> {
        Self::check(
            unsafe { libc::pthread_rwlock_trywrlock(self.raw()) },
            "pthread_rwlock_trywrlock",
        )
    }

    unsafe fn release_read(&self) -> LockResult<()> {
        Self::check(
            unsafe { libc::pthread_rwlock_unlock(self.raw()) },
            "pthread_rwlock_unlock",
        )
    }

    unsafe fn release_write(&self) -> LockResult<()> {
        Self::check(
            unsafe { libc::pthread_rwlock_unlock(self.raw()) },
            "pthread_rwlock_unlock",
        )
    }

    fn destroy(self) -> LockResult<()> {
        // SAFETY: the facade only destroys an unlocked backend.
        let r = unsafe { libc::pthread_rwlock_destroy(self.raw()) };
        Self::check(r, "pthread_rwlock_destroy")
    }
}

#[cfg(feature = "extension")]
impl super::RawCodeBackend for PthreadBackend {
    fn try_read_code(&self) -> Result<(), i32> {
        match unsafe { libc::pthread_rwlock_tryrdlock(self.raw()) } {
            0 => Ok(()),
            code => Err(code),
        }
    }

    fn try_write_code(&self) -> Result<(), i32> {
        match unsafe { libc::pthread_rwlock_trywrlock(self.raw()) } {
            0 => Ok(()),
            code => Err(code),
        }
    }
}
