//! Resource ceilings that bound the work a single execution can do.
//!
//! Hard compile-time limits with a small struct wrapping them so call sites
//! read as named quantities rather than bare numeric literals, plus a
//! documented default so tests can construct a [`ResourceLimits`] with a
//! tiny ceiling to exercise a guard deterministically without touching the
//! production defaults.

/// Maximum number of concurrently active call activations.
pub const MAX_STACK_LEN: usize = 16;

/// Maximum number of activations (live or completed) a single execution may
/// create in total.
pub const MAX_FRAME_COUNT: usize = 512;

/// Maximum number of iterations a single loop instance may run.
pub const ITERATION_LIMIT: usize = 1000;

/// The resource ceilings in force for one execution.
///
/// These are compile-time constants of the language, not configurable by
/// the caller; [`ResourceLimits`] exists purely as an internal testability
/// seam so unit tests can construct a [`crate::frame::Context`] with a tiny
/// `max_frame_count` and assert that the stack-limit guard trips, without
/// having to write a program that actually creates 512 frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_stack_len: usize,
    pub max_frame_count: usize,
    pub iteration_limit: usize,
}

impl ResourceLimits {
    pub const DEFAULT: Self = Self {
        max_stack_len: MAX_STACK_LEN,
        max_frame_count: MAX_FRAME_COUNT,
        iteration_limit: ITERATION_LIMIT,
    };
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
