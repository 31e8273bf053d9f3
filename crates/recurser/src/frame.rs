//! Activation frames and the execution [`Context`] that owns the call tree.
//!
//! Frames are stored in a flat arena (`Context::frames`) indexed by
//! [`FrameId`], an "owned arena + integer-indexed references" idiom rather
//! than `Rc<RefCell<_>>` back-pointers. `parent` is just another `FrameId`,
//! so there is no possibility of a reference cycle: a frame can only ever
//! point at a frame created before it.

use std::collections::HashMap;

use crate::{ast::FunctionDef, value::Value};

/// Index into a [`Context`]'s frame arena. The first frame created has id 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct FrameId(u32);

impl FrameId {
    fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

/// One function-call activation.
#[derive(Debug, Clone)]
pub struct Frame {
    pub frame_id: FrameId,
    pub args: Vec<Value>,
    pub values: HashMap<String, Value>,
    pub retval: Option<Value>,
    pub parent: Option<FrameId>,
    pub children: Vec<FrameId>,
}

impl Frame {
    fn new(frame_id: FrameId, args: Vec<Value>, parent: Option<FrameId>) -> Self {
        Self {
            frame_id,
            values: HashMap::new(),
            args,
            retval: None,
            parent,
            children: Vec::new(),
        }
    }
}

/// The call tree's serialisable shape, consumed by the HTTP collaborator as
/// `{ args, retval, count, children }`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CallNode {
    pub args: Vec<Value>,
    pub retval: Option<Value>,
    pub count: u32,
    pub children: Vec<CallNode>,
}

/// All execution state for one run of a [`crate::ast::Program`].
///
/// A `Context` must not be reused across concurrent executions: execution is
/// strictly single-threaded and synchronous, one `Context` per execution.
#[derive(Debug, Default)]
pub struct Context {
    pub(crate) fundef: Option<FunctionDef>,
    frames: Vec<Frame>,
    root_frame: Option<FrameId>,
    stack: Vec<FrameId>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.index()]
    }

    pub fn frame_mut(&mut self, id: FrameId) -> &mut Frame {
        &mut self.frames[id.index()]
    }

    pub fn active_frame_id(&self) -> Option<FrameId> {
        self.stack.last().copied()
    }

    pub fn root_frame_id(&self) -> Option<FrameId> {
        self.root_frame
    }

    /// Reads a binding from the active frame's locals.
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        let id = self.active_frame_id()?;
        self.frame(id).values.get(name)
    }

    /// Writes a binding into the active frame's locals, creating the slot on
    /// first assignment.
    pub fn set_value(&mut self, name: &str, value: Value) {
        let id = self.active_frame_id().expect("set_value called with no active frame");
        self.frame_mut(id).values.insert(name.to_owned(), value);
    }

    /// Creates a new frame for a call with the given argument values, wires
    /// it into the parent/child graph, and pushes it onto the active stack.
    ///
    /// Returns the new frame's id. The caller is responsible for checking
    /// resource guards *before* calling this (see
    /// [`crate::interpreter::Evaluator::call`]): this method always
    /// succeeds.
    pub(crate) fn push_frame(&mut self, args: Vec<Value>, param_names: &[String]) -> FrameId {
        let frame_id = FrameId(u32::try_from(self.frames.len() + 1).expect("frame count exceeds u32"));
        let parent = self.active_frame_id();
        let mut frame = Frame::new(frame_id, args.clone(), parent);
        for (name, value) in param_names.iter().zip(args) {
            frame.values.insert(name.clone(), value);
        }
        self.frames.push(frame);

        if self.root_frame.is_none() {
            self.root_frame = Some(frame_id);
        } else if let Some(parent_id) = parent {
            self.frame_mut(parent_id).children.push(frame_id);
        }
        self.stack.push(frame_id);
        frame_id
    }

    /// Pops the active frame, recording its return value (if any).
    pub(crate) fn pop_frame(&mut self, retval: Option<Value>) {
        let id = self.stack.pop().expect("pop_frame called with empty stack");
        self.frame_mut(id).retval = retval;
    }

    /// Converts the root frame into the wire-format call tree.
    ///
    /// # Panics
    /// Panics if no call has completed yet (`root_frame` unset); callers
    /// should only invoke this after a successful
    /// [`crate::ast::Program::execute`].
    #[must_use]
    pub fn root_call_node(&self) -> CallNode {
        self.call_node(self.root_frame.expect("root_call_node called before any call executed"))
    }

    fn call_node(&self, id: FrameId) -> CallNode {
        let frame = self.frame(id);
        CallNode {
            args: frame.args.clone(),
            retval: frame.retval.clone(),
            count: frame.frame_id.0,
            children: frame.children.iter().map(|&child| self.call_node(child)).collect(),
        }
    }
}
