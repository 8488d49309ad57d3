// SPDX-License-Identifier: MIT OR Apache-2.0
//! Portable backend built from a mutex and a condition variable.
//!
//! This is the backend of last resort: it only needs `std::sync::{Mutex, Condvar}` and
//! therefore compiles on every target.
//!
//! # Writer preference
//!
//! A reader is admitted only while no writer holds the lock **and no writer is
//! waiting**. A writer that starts waiting therefore stops the inflow of new readers and
//! is admitted as soon as the readers already inside have left, however many threads
//! keep trying to read. The price is that a thread must not take a nested read lock:
//! with a writer queued, the inner read waits for the writer, which waits for the outer
//! read.
//!
//! # Platform Behavior
//!
//! - **Native**: waits on the condition variable
//! - **WASM with `Atomics.wait`**: waits on the condition variable
//! - **WASM without `Atomics.wait`**: spins on `try_lock` for the state and re-checks it in
//!   a spin loop instead of waiting (e.g. browser main thread)

use super::Backend;
use crate::config::BackendKind;
use crate::error::{ErrorKind, LockResult, error};
use crate::wasm_support::can_block;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, TryLockError};

#[cfg(all(feature = "extension", not(target_arch = "wasm32")))]
use std::time::Instant;
#[cfg(all(feature = "extension", target_arch = "wasm32"))]
use web_time::Instant;

#[derive(Debug, Default)]
struct State {
    readers: u32,
    writer_active: bool,
    waiting_writers: u32,
}

impl State {
    #[inline]
    fn read_admissible(&self) -> bool {
        !self.writer_active && self.waiting_writers == 0
    }

    #[inline]
    fn write_admissible(&self) -> bool {
        self.readers == 0 && !self.writer_active
    }

    fn add_reader(&mut self) -> LockResult<()> {
        self.readers = self
            .readers
            .checked_add(1)
            .ok_or(error(ErrorKind::ResourceExhausted, "too many readers"))?;
        Ok(())
    }

    fn add_waiting_writer(&mut self) -> LockResult<()> {
        self.waiting_writers = self
            .waiting_writers
            .checked_add(1)
            .ok_or(error(ErrorKind::ResourceExhausted, "too many waiting writers"))?;
        Ok(())
    }
}

/// A writer-preferring reader-writer lock over `Mutex<State>` + `Condvar`.
#[derive(Debug, Default)]
pub struct FallbackBackend {
    state: Mutex<State>,
    changed: Condvar,
}

impl FallbackBackend {
    // The state is only ever mutated in whole steps, so a poisoned mutex still guards a
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        if !can_block() {
            return self.lock_spin();
        }
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // A contended `Mutex::lock` waits with `memory.atomic.wait32`, which traps where
    // `Atomics.wait` is unavailable.
    fn lock_spin(&self) -> MutexGuard<'_, State> {
        loop {
            match self.state.try_lock() {
                Ok(guard) => return guard,
                Err(TryLockError::Poisoned(poisoned)) => return poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => std::hint::spin_loop(),
            }
        }
    }

    fn wait<'a>(&'a self, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        if !can_block() {
            drop(guard);
            std::hint::spin_loop();
            return self.lock();
        }
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(feature = "extension")]
    fn wait_until<'a>(
        &'a self,
        guard: MutexGuard<'a, State>,
        deadline: Instant,
    ) -> MutexGuard<'a, State> {
        if !can_block() {
            drop(guard);
            std::hint::spin_loop();
            return self.lock();
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.changed.wait_timeout(guard, remaining) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }

    fn wake_all(&self) {
        self.changed.notify_all();
    }
}

unsafe impl Backend for FallbackBackend {
    const KIND: BackendKind = BackendKind::Fallback;

    fn create() -> LockResult<Self> {
        Ok(FallbackBackend::default())
    }

    fn acquire_read(&self) -> LockResult<()> {
        let mut state = self.lock();
        while !state.read_admissible() {
            tracing::trace!(
                writer_active = state.writer_active,
                waiting_writers = state.waiting_writers,
                "reader waiting"
            );
            state = self.wait(state);
        }
        state.add_reader()
    }

    fn acquire_write(&self) -> LockResult<()> {
        let mut state = self.lock();
        if state.write_admissible() {
            state.writer_active = true;
            return Ok(());
        }
        state.add_waiting_writer()?;
        while !state.write_admissible() {
            tracing::trace!(readers = state.readers, "writer waiting");
            state = self.wait(state);
        }
        state.waiting_writers -= 1;
        state.writer_active = true;
        Ok(())
    }

    fn try_read(&self) -> LockResult<()> {
        let mut state = self.lock();
        if state.read_admissible() {
            state.add_reader()
        } else {
            Err(error(ErrorKind::WouldBlock, "try_read"))
        }
    }

    fn try_write(&self) -> LockResult<()> {
        let mut state = self.lock();
        if state.write_admissible() {
            state.writer_active = true;
            Ok(())
        } else {
            Err(error(ErrorKind::WouldBlock, "try_write"))
        }
    }

    unsafe fn release_read(&self) -> LockResult<()> {
        let mut state = self.lock();
        if state.readers == 0 {
            return Err(error(ErrorKind::Misuse, "release_read without a reader"));
        }
        state.readers -= 1;
        let wake = state.readers == 0 && state.waiting_writers > 0;
        drop(state);
        if wake {
            self.wake_all();
        }
        Ok(())
    }

    unsafe fn release_write(&self) -> LockResult<()> {
        let mut state = self.lock();
        if !state.writer_active {
            return Err(error(ErrorKind::Misuse, "release_write without a writer"));
        }
        state.writer_active = false;
        drop(state);
        self.wake_all();
        Ok(())
    }
}

#[cfg(feature = "extension")]
unsafe impl super::DowngradeBackend for FallbackBackend {
    unsafe fn downgrade(&self) -> LockResult<()> {
        let mut state = self.lock();
        if !state.writer_active {
            return Err(error(ErrorKind::Misuse, "downgrade without a writer"));
        }
        // Both fields change under the same mutex hold, so nobody sees the lock free.
        state.writer_active = false;
        state.readers += 1;
        drop(state);
        self.wake_all();
        Ok(())
    }
}

#[cfg(feature = "extension")]
impl super::TimedBackend for FallbackBackend {
    fn acquire_read_for(&self, timeout: std::time::Duration) -> LockResult<()> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        while !state.read_admissible() {
            state = match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    return Err(error(ErrorKind::WouldBlock, "read timed out"));
                }
                Some(deadline) => self.wait_until(state, deadline),
                None => self.wait(state),
            };
        }
        state.add_reader()
    }

    fn acquire_write_for(&self, timeout: std::time::Duration) -> LockResult<()> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        if state.write_admissible() {
            state.writer_active = true;
            return Ok(());
        }
        state.add_waiting_writer()?;
        while !state.write_admissible() {
            state = match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    // Readers may be parked behind this writer only.
                    state.waiting_writers -= 1;
                    drop(state);
                    self.wake_all();
                    return Err(error(ErrorKind::WouldBlock, "write timed out"));
                }
                Some(deadline) => self.wait_until(state, deadline),
                None => self.wait(state),
            };
        }
        state.waiting_writers -= 1;
        state.writer_active = true;
        Ok(())
    }
}
