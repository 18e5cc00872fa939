//! Stack growth for the recursive passes.
//!
//! Parsing, resolution and evaluation all recurse once per nesting level of
//! the program, and evaluation additionally once per Lox call. Each of those
//! entry points runs through [`ensure_sufficient_stack`], which moves onto a
//! freshly allocated segment when the current one runs low.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
