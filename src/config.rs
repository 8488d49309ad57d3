// SPDX-License-Identifier: MIT OR Apache-2.0
//! Build-time capability configuration.
//!
//! Everything here is fixed when the crate is compiled: `build.rs` picks the backend
//! (from the `pthread` / `shared-lock` / `fallback` features or the
//! `SYNC_RWLOCK_BACKEND` environment variable) and the remaining switches are Cargo
//! features. [`CONFIG`] reports the result; it is a constant, never runtime state.
//!
//! ```
//! use sync_rwlock::config::{BackendKind, CONFIG};
//!
//! println!("compiled against the {} backend", CONFIG.backend);
//! assert_eq!(CONFIG.extension, cfg!(feature = "extension"));
//! # let _ = BackendKind::Fallback;
//! ```

use std::fmt;
use std::str::FromStr;

/// The three lock backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// POSIX `pthread_rwlock_t`.
    Pthread,
    /// `parking_lot`'s raw reader-writer lock.
    SharedLock,
    /// Mutex plus condition variable, writer preferring.
    Fallback,
}

impl BackendKind {
    /// The name used by the Cargo feature and `SYNC_RWLOCK_BACKEND`.
    pub const fn name(&self) -> &'static str {
        match self {
            BackendKind::Pthread => "pthread",
            BackendKind::SharedLock => "shared-lock",
            BackendKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackend(pub String);

impl fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown backend `{}`; expected pthread, shared-lock or fallback",
            self.0
        )
    }
}

impl std::error::Error for UnknownBackend {}

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pthread" => Ok(BackendKind::Pthread),
            "shared-lock" => Ok(BackendKind::SharedLock),
            "fallback" => Ok(BackendKind::Fallback),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// The capability switches this crate was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityConfig {
    /// Backend behind [`Selected`](crate::backend::Selected).
    pub backend: BackendKind,
    /// Whether the extension operation set is compiled in.
    pub extension: bool,
    /// Whether [`LockError`](crate::LockError) is the structured error.
    pub rich_errors: bool,
    /// Whether [`TryLockResult`](crate::TryLockResult) is `Option` shaped.
    pub optional_result: bool,
}

impl CapabilityConfig {
    /// The configuration of this build.
    #[inline]
    pub const fn current() -> &'static CapabilityConfig {
        &CONFIG
    }
}

impl fmt::Display for CapabilityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "backend={} extension={} rich-errors={} optional-result={}",
            self.backend, self.extension, self.rich_errors, self.optional_result
        )
    }
}

cfg_if::cfg_if! {
    if #[cfg(sync_rwlock_backend = "pthread")] {
        const SELECTED_BACKEND: BackendKind = BackendKind::Pthread;
    } else if #[cfg(sync_rwlock_backend = "shared")] {
        const SELECTED_BACKEND: BackendKind = BackendKind::SharedLock;
    } else {
        const SELECTED_BACKEND: BackendKind = BackendKind::Fallback;
    }
}

/// The capability configuration resolved at build time.
pub const CONFIG: CapabilityConfig = CapabilityConfig {
    backend: SELECTED_BACKEND,
    extension: cfg!(feature = "extension"),
    rich_errors: cfg!(feature = "rich-errors"),
    optional_result: cfg!(feature = "optional-result"),
};
