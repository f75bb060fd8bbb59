//! Native stack growth for recursive code.
//!
//! The compiler descends once per nested expression and the interpreter
//! re-enters itself for every call and every required file. Both go
//! through [`ensure_sufficient_stack`], which moves onto a freshly
//! allocated segment when the current one runs low. Input nesting and call
//! depth are then bounded by the explicit limits those crates enforce, not
//! by the size of the thread's stack.

/// Grow when less than this much of the current segment is left.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first switching to a new stack segment if the current one is
/// nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// wasm32 has no stack switching; `f` runs in place.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
