//! A portable reader-writer lock with a backend chosen at build time.
//!
//! The same API runs on top of one of three backends:
//!
//! - **pthread**: POSIX `pthread_rwlock_t` (unix)
//! - **shared-lock**: a native shared-lock primitive (`parking_lot`)
//! - **fallback**: a writer-preferring `Mutex` + `Condvar` lock that compiles everywhere
//!
//! Pick one with the `pthread`, `shared-lock` or `fallback` cargo feature, or with the
//! `SYNC_RWLOCK_BACKEND` environment variable at build time. Without a selection the
//! build script takes pthread on unix, shared-lock on other targets with threads, and
//! the fallback everywhere else. A selection the target cannot satisfy fails the build.
//! [`CONFIG`] reports what was chosen.
//!
//! Two layers are provided:
//!
//! - [`RawRwLock`]: explicit `acquire_*`/`release_*` calls, for lock and unlock that
//!   cannot share a scope
//! - [`RwLock<T>`](RwLock): owns the protected value and hands out RAII guards
//!
//! Every operation returns a [`LockResult`]. The `rich-errors` feature (default) makes
//! [`LockError`] carry the platform code and the failing operation; without it
//! `LockError` is just the [`ErrorKind`]. The `optional-result` feature (default)
//! reports contention of `try_*` acquisitions as `Ok(None)`.
//!
//! With the `extension` feature, backends that support it also offer downgrade,
//! timed acquisition and raw platform codes; see [`backend`].
//!
//! # Examples
//!
//! ```
//! use sync_rwlock::{CONFIG, RwLock};
//!
//! let lock = RwLock::new(5);
//! {
//!     let r1 = lock.read().unwrap();
//!     let r2 = lock.read().unwrap();
//!     assert_eq!(*r1 + *r2, 10);
//! }
//! *lock.write().unwrap() += 1;
//! assert_eq!(*lock.read().unwrap(), 6);
//!
//! println!("running on {}", CONFIG);
//! ```

pub mod backend;
pub mod config;
pub mod error;
mod guard;
mod raw;
pub mod rwlock;
mod wasm_support;

#[cfg(test)]
mod sync_tests;
#[cfg(test)]
mod test_support;

pub use config::{BackendKind, CONFIG, CapabilityConfig};
pub use error::{
    ErrorKind, LockError, LockResult, TryLockResult, contended, from_try, into_try,
};
pub use guard::{ReadGuard, WriteGuard};
pub use raw::RawRwLock;
pub use rwlock::RwLock;

#[cfg(all(sync_rwlock_backend = "pthread", not(unix)))]
compile_error!("the pthread backend needs a unix target");

#[cfg(all(
    sync_rwlock_backend = "shared",
    target_arch = "wasm32",
    not(target_feature = "atomics")
))]
compile_error!("the shared-lock backend needs a target with threads");
