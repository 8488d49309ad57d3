// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error and result types shared by every backend.
//!
//! Every locking operation reports a [`LockResult`]. Callers can always tell apart:
//!
//! - **Acquired**: the `Ok` value
//! - [`ErrorKind::WouldBlock`]: a non-blocking (or timed) attempt found the lock contended
//! - [`ErrorKind::ResourceExhausted`]: the underlying primitive could not be created or operated
//! - [`ErrorKind::Misuse`]: the caller broke the locking contract, e.g. an unmatched release
//!
//! With the `rich-errors` feature (default) [`LockError`] is a structured error that also
//! carries the platform code and the operation that failed. Without it, `LockError` is
//! simply an alias of [`ErrorKind`]. Both shapes expose [`kind`](ErrorKind::kind), so code
//! that matches on the kind compiles either way.
//!
//! # Examples
//!
//! ```
//! use sync_rwlock::{ErrorKind, RawRwLock};
//!
//! let lock: RawRwLock = RawRwLock::new();
//! let err = lock.release_read().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Misuse);
//! ```

use std::fmt;

/// Classification of a failed lock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The lock could not be acquired without waiting.
    ///
    /// Expected and recoverable; retrying is the caller's business.
    WouldBlock,
    /// The OS primitive could not be created or ran out of a resource (e.g. the
    /// maximum number of readers).
    ResourceExhausted,
    /// Contract violation: releasing a lock that is not held, destroying a held
    /// lock, or a recursive acquisition the backend refuses.
    Misuse,
}

impl ErrorKind {
    /// Returns `self`, so `ErrorKind` and the structured `LockError` share one accessor.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        *self
    }

    /// Returns a short lowercase description.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::WouldBlock => "lock would block",
            ErrorKind::ResourceExhausted => "lock resources exhausted",
            ErrorKind::Misuse => "lock misuse",
        }
    }

    /// Classifies a nonzero platform error code.
    ///
    /// On unix the POSIX rwlock codes are recognised; anything unknown is treated as
    /// `ResourceExhausted`, since the primitive could not be operated.
    pub fn from_code(code: i32) -> ErrorKind {
        #[cfg(unix)]
        {
            match code {
                libc::EBUSY => ErrorKind::WouldBlock,
                libc::EAGAIN | libc::ENOMEM => ErrorKind::ResourceExhausted,
                libc::EDEADLK | libc::EPERM | libc::EINVAL => ErrorKind::Misuse,
                _ => ErrorKind::ResourceExhausted,
            }
        }
        #[cfg(not(unix))]
        {
            let _ = code;
            ErrorKind::ResourceExhausted
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ErrorKind {}

impl From<ErrorKind> for std::io::ErrorKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::WouldBlock => std::io::ErrorKind::WouldBlock,
            ErrorKind::ResourceExhausted => std::io::ErrorKind::OutOfMemory,
            ErrorKind::Misuse => std::io::ErrorKind::InvalidInput,
        }
    }
}

#[cfg(feature = "rich-errors")]
mod rich {
    use super::ErrorKind;

    /// A failed lock operation.
    ///
    /// Carries the [`ErrorKind`], the raw platform code when one exists (pthread
    /// backend), and a static description of the operation that failed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
    #[error("{context}: {kind}{}", .code.map(|c| format!(" (os error {c})")).unwrap_or_default())]
    pub struct LockError {
        kind: ErrorKind,
        code: Option<i32>,
        context: &'static str,
    }

    impl LockError {
        /// Creates an error without a platform code.
        pub const fn new(kind: ErrorKind, context: &'static str) -> LockError {
            LockError {
                kind,
                code: None,
                context,
            }
        }

        /// Creates an error from a nonzero platform code, classifying it.
        pub fn from_code(code: i32, context: &'static str) -> LockError {
            LockError {
                kind: ErrorKind::from_code(code),
                code: Some(code),
                context,
            }
        }

        /// The classification of this error.
        #[inline]
        pub const fn kind(&self) -> ErrorKind {
            self.kind
        }

        /// The platform error code, if the backend reported one.
        #[inline]
        pub const fn code(&self) -> Option<i32> {
            self.code
        }

        /// The operation that failed.
        #[inline]
        pub const fn context(&self) -> &'static str {
            self.context
        }
    }

    impl From<ErrorKind> for LockError {
        fn from(kind: ErrorKind) -> Self {
            LockError::new(kind, kind.as_str())
        }
    }

    impl From<LockError> for std::io::Error {
        fn from(err: LockError) -> Self {
            match err.code {
                Some(code) => std::io::Error::from_raw_os_error(code),
                None => std::io::Error::new(err.kind.into(), err),
            }
        }
    }
}

#[cfg(feature = "rich-errors")]
pub use rich::LockError;

/// A failed lock operation.
///
/// Without the `rich-errors` feature this is the bare classification.
#[cfg(not(feature = "rich-errors"))]
pub type LockError = ErrorKind;

#[cfg(not(feature = "rich-errors"))]
impl ErrorKind {
    /// Mirrors the structured constructor; the context is dropped.
    #[inline]
    pub const fn new(kind: ErrorKind, _context: &'static str) -> ErrorKind {
        kind
    }

    /// The platform code is not retained in the minimal error shape.
    #[inline]
    pub const fn code(&self) -> Option<i32> {
        None
    }
}

#[cfg(not(feature = "rich-errors"))]
impl From<ErrorKind> for std::io::Error {
    fn from(kind: ErrorKind) -> Self {
        std::io::Error::new(kind.into(), kind)
    }
}

/// Builds a [`LockError`] from a nonzero platform code in either error shape.
#[inline]
pub(crate) fn os_error(code: i32, context: &'static str) -> LockError {
    #[cfg(feature = "rich-errors")]
    {
        LockError::from_code(code, context)
    }
    #[cfg(not(feature = "rich-errors"))]
    {
        let _ = context;
        ErrorKind::from_code(code)
    }
}

/// Builds a [`LockError`] of the given kind in either error shape.
#[inline]
pub(crate) const fn error(kind: ErrorKind, context: &'static str) -> LockError {
    LockError::new(kind, context)
}

/// Result of every lock operation; `Ok` means the lock was acquired (or released).
pub type LockResult<T> = Result<T, LockError>;

/// Result of a non-blocking acquisition that yields a guard.
///
/// With the `optional-result` feature (default) contention is `Ok(None)` and `Err` is
/// reserved for real failures. Without it, contention is reported as an error of kind
/// [`ErrorKind::WouldBlock`].
#[cfg(feature = "optional-result")]
pub type TryLockResult<G> = Result<Option<G>, LockError>;

/// Result of a non-blocking acquisition that yields a guard.
///
/// Without the `optional-result` feature contention is the
/// [`ErrorKind::WouldBlock`] error.
#[cfg(not(feature = "optional-result"))]
pub type TryLockResult<G> = Result<G, LockError>;

/// Converts an acquisition result into the configured [`TryLockResult`] shape.
pub fn into_try<G>(result: LockResult<G>) -> TryLockResult<G> {
    #[cfg(feature = "optional-result")]
    {
        match result {
            Ok(guard) => Ok(Some(guard)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
    #[cfg(not(feature = "optional-result"))]
    {
        result
    }
}

/// The configured [`TryLockResult`] shape for a contended acquisition.
pub fn contended<G>() -> TryLockResult<G> {
    into_try(Err(error(ErrorKind::WouldBlock, "lock contended")))
}

/// Collapses a [`TryLockResult`] back into the uniform [`LockResult`] shape.
///
/// Handy for code that has to compile with and without `optional-result`.
pub fn from_try<G>(result: TryLockResult<G>) -> LockResult<G> {
    #[cfg(feature = "optional-result")]
    {
        match result {
            Ok(Some(guard)) => Ok(guard),
            Ok(None) => Err(error(ErrorKind::WouldBlock, "lock contended")),
            Err(e) => Err(e),
        }
    }
    #[cfg(not(feature = "optional-result"))]
    {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_available_in_every_shape() {
        let e: LockError = error(ErrorKind::Misuse, "release_read");
        assert_eq!(e.kind(), ErrorKind::Misuse);
        assert_eq!(e.code(), None);
    }

    #[cfg(unix)]
    #[test]
    fn posix_codes_are_classified() {
        assert_eq!(ErrorKind::from_code(libc::EBUSY), ErrorKind::WouldBlock);
        assert_eq!(ErrorKind::from_code(libc::EAGAIN), ErrorKind::ResourceExhausted);
        assert_eq!(ErrorKind::from_code(libc::ENOMEM), ErrorKind::ResourceExhausted);
        assert_eq!(ErrorKind::from_code(libc::EDEADLK), ErrorKind::Misuse);
        assert_eq!(ErrorKind::from_code(libc::EPERM), ErrorKind::Misuse);
    }

    #[cfg(all(unix, feature = "rich-errors"))]
    #[test]
    fn rich_error_keeps_code_and_context() {
        let e = os_error(libc::EAGAIN, "pthread_rwlock_rdlock");
        assert_eq!(e.kind(), ErrorKind::ResourceExhausted);
        assert_eq!(e.code(), Some(libc::EAGAIN));
        assert_eq!(e.context(), "pthread_rwlock_rdlock");
        let msg = e.to_string();
        assert!(msg.starts_with("pthread_rwlock_rdlock: lock resources exhausted"), "{msg}");

        let io: std::io::Error = e.into();
        assert_eq!(io.raw_os_error(), Some(libc::EAGAIN));
    }

    #[test]
    fn try_shapes_round_trip_contention() {
        let refused: LockResult<u8> = Err(error(ErrorKind::WouldBlock, "try_read"));
        let shaped = into_try(refused);
        #[cfg(feature = "optional-result")]
        assert!(matches!(shaped, Ok(None)));
        let back = from_try(shaped);
        assert_eq!(back.unwrap_err().kind(), ErrorKind::WouldBlock);

        let sentinel = from_try(contended::<u8>());
        assert_eq!(sentinel.unwrap_err().kind(), ErrorKind::WouldBlock);

        let failed: LockResult<u8> = Err(error(ErrorKind::ResourceExhausted, "read"));
        assert_eq!(
            into_try(failed).unwrap_err().kind(),
            ErrorKind::ResourceExhausted
        );
    }
}
