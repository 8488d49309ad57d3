// SPDX-License-Identifier: MIT OR Apache-2.0
//! Whether the calling thread is allowed to block.
//!
//! Browser main threads reject `Atomics.wait`, which is what a condition variable wait
//! compiles down to on wasm. The fallback backend asks [`can_block`] before waiting and
//! re-checks its state in a spin loop when blocking is refused. Native threads can
//! always block.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(inline_js = "
export function _srw_probeAtomicsWait() {
    if (typeof SharedArrayBuffer === 'undefined') return false;
    if (typeof Atomics === 'undefined' || typeof Atomics.wait !== 'function') return false;

    try {
        const cell = new Int32Array(new SharedArrayBuffer(4));
        const outcome = Atomics.wait(cell, 0, 0, 0);
        return outcome === 'timed-out' || outcome === 'not-equal';
    } catch (_) {
        return false;
    }
}
")]
extern "C" {
    fn _srw_probeAtomicsWait() -> bool;
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    // The answer cannot change for the lifetime of a thread.
    static CAN_BLOCK: std::cell::OnceCell<bool> = const { std::cell::OnceCell::new() };
}

/// Whether the calling thread may block on a condition variable.
#[cfg(target_arch = "wasm32")]
pub(crate) fn can_block() -> bool {
    CAN_BLOCK.with(|cell| *cell.get_or_init(_srw_probeAtomicsWait))
}

/// Whether the calling thread may block on a condition variable.
#[cfg(not(target_arch = "wasm32"))]
#[inline(always)]
pub(crate) const fn can_block() -> bool {
    true
}
