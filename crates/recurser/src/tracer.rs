//! Execution tracing: a trait with no-op default methods so a
//! [`NoopTracer`] compiles away to nothing via monomorphization, plus
//! concrete tracers for debugging. This has no bearing on interpreter
//! semantics or the call tree's contents — it exists purely to make the
//! evaluator observable while developing against it.

use crate::{error::ExecError, frame::FrameId};

/// Hook points into the evaluator's call handling.
pub trait CallTracer {
    /// Called immediately after a new frame is pushed.
    #[inline(always)]
    fn on_call_push(&mut self, _frame_id: FrameId, _depth: usize) {}

    /// Called immediately after a frame is popped.
    #[inline(always)]
    fn on_call_return(&mut self, _frame_id: FrameId, _depth: usize) {}

    /// Called when a resource guard (stack, frame count, or iteration
    /// limit) is about to abort execution.
    #[inline(always)]
    fn on_guard_trip(&mut self, _err: &ExecError) {}
}

/// Zero-cost default tracer: every hook is an empty inlined no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl CallTracer for NoopTracer {}

/// Prints a human-readable call/return/guard-trip log to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrTracer;

impl CallTracer for StderrTracer {
    fn on_call_push(&mut self, frame_id: FrameId, depth: usize) {
        eprintln!("{:indent$}-> call #{frame_id:?}", "", indent = depth * 2);
    }

    fn on_call_return(&mut self, frame_id: FrameId, depth: usize) {
        eprintln!("{:indent$}<- return #{frame_id:?}", "", indent = depth * 2);
    }

    fn on_guard_trip(&mut self, err: &ExecError) {
        eprintln!("guard tripped: {err}");
    }
}

/// Records every event for later inspection (post-mortem or deterministic
/// replay of a run).
#[derive(Debug, Default, Clone)]
pub struct RecordingTracer {
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Call { frame_id: FrameId, depth: usize },
    Return { frame_id: FrameId, depth: usize },
    GuardTrip(ExecError),
}

impl CallTracer for RecordingTracer {
    fn on_call_push(&mut self, frame_id: FrameId, depth: usize) {
        self.events.push(TraceEvent::Call { frame_id, depth });
    }

    fn on_call_return(&mut self, frame_id: FrameId, depth: usize) {
        self.events.push(TraceEvent::Return { frame_id, depth });
    }

    fn on_guard_trip(&mut self, err: &ExecError) {
        self.events.push(TraceEvent::GuardTrip(err.clone()));
    }
}
