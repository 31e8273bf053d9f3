//! The tree-walking evaluator.
//!
//! Every statement- and block-executing function returns a [`Flow`] rather
//! than using exceptions to unwind a `return`: loops and blocks fast-path
//! on `Flow::Returning`, preferring explicit control-flow results over
//! panics in the hot execution path.
//!
//! A call's result is `Option<Value>` rather than `Value` throughout this
//! module: a function that falls through its block without hitting
//! `return` has no usable value (see the module doc on
//! [`crate::value::Value`]). That `None` is allowed to flow freely as long
//! as nothing tries to *use* it — as an operand, an index, an assignment
//! right-hand side, or a builtin argument. [`require_value`] is the single
//! point where a missing value becomes an [`ExecError`].

use crate::{
    ast::*,
    error::{ExecError, ExecResult},
    frame::Context,
    resource::ResourceLimits,
    span::CodeLoc,
    tracer::{CallTracer, NoopTracer},
    value::Value,
};

/// The result of executing a statement or block: either control fell
/// through normally, or a `return` unwound to the enclosing call.
enum Flow {
    Normal,
    Returning(Option<Value>),
}

fn require_value(value: Option<Value>, loc: CodeLoc) -> ExecResult<Value> {
    value.ok_or_else(|| ExecError::parse(loc, "function call produced no value here".to_owned()))
}

impl Program {
    /// Executes this program against a fresh or reused [`Context`], using
    /// the default (no-op) tracer and the production resource limits.
    ///
    /// Returns the value of the top-level call, or `None` if the function
    /// fell through without `return`. On success, `context.root_call_node()`
    /// is the call tree.
    pub fn execute(&self, context: &mut Context) -> ExecResult<Option<Value>> {
        Evaluator::new(NoopTracer).execute(self, context)
    }
}

/// Drives execution of a [`Program`] against a [`Context`], observed
/// through a [`CallTracer`].
pub struct Evaluator<Tr: CallTracer = NoopTracer> {
    limits: ResourceLimits,
    tracer: Tr,
}

impl<Tr: CallTracer> Evaluator<Tr> {
    #[must_use]
    pub fn new(tracer: Tr) -> Self {
        Self { limits: ResourceLimits::default(), tracer }
    }

    #[must_use]
    pub fn with_limits(limits: ResourceLimits, tracer: Tr) -> Self {
        Self { limits, tracer }
    }

    pub fn execute(&mut self, program: &Program, context: &mut Context) -> ExecResult<Option<Value>> {
        context.fundef = Some(program.fundef.clone());
        self.eval_main_call(&program.main_call, &program.fundef, context)
    }

    // ---- calls ----------------------------------------------------------

    fn eval_main_call(
        &mut self,
        call: &MainCall,
        fundef: &FunctionDef,
        context: &mut Context,
    ) -> ExecResult<Option<Value>> {
        // Arguments are evaluated in the CALLER's frame, left to right,
        // before the new frame exists.
        let mut args = Vec::with_capacity(call.args.len());
        for summand in &call.args {
            args.push(require_value(self.eval_summand(summand, context)?, call.loc)?);
        }

        if context.stack_depth() >= self.limits.max_stack_len
            || context.frame_count() + 1 >= self.limits.max_frame_count
        {
            let err = ExecError::Stack;
            self.tracer.on_guard_trip(&err);
            return Err(err);
        }

        let param_names: Vec<String> = fundef.parameters.iter().map(|p| p.name.clone()).collect();
        let frame_id = context.push_frame(args, &param_names);
        self.tracer.on_call_push(frame_id, context.stack_depth());

        let flow = self.eval_block(&fundef.block, context)?;
        let retval = match flow {
            Flow::Returning(value) => value,
            Flow::Normal => None,
        };
        context.pop_frame(retval.clone());
        self.tracer.on_call_return(frame_id, context.stack_depth());
        Ok(retval)
    }

    fn eval_function_call(&mut self, call: &FunctionCall, context: &mut Context) -> ExecResult<Value> {
        let mut args = Vec::with_capacity(call.args.len());
        for summand in &call.args {
            args.push(require_value(self.eval_summand(summand, context)?, call.loc)?);
        }
        eval_builtin(call.builtin_name, args, call.loc)
    }

    fn eval_method_call(&mut self, call: &MethodCall, context: &mut Context) -> ExecResult<Value> {
        if call.receiver.array_index.is_some() {
            return Err(ExecError::parse(
                call.receiver.loc,
                "method call receiver must be a plain identifier".to_owned(),
            ));
        }
        let receiver_value = context
            .get_value(&call.receiver.name)
            .cloned()
            .ok_or_else(|| ExecError::parse(call.receiver.loc, format!("Undefined: {}", call.receiver.name)))?;

        let mut args = Vec::with_capacity(call.inner.args.len() + 1);
        args.push(receiver_value);
        for summand in &call.inner.args {
            args.push(require_value(self.eval_summand(summand, context)?, call.inner.loc)?);
        }
        let result = eval_builtin(call.inner.builtin_name, args, call.inner.loc)?;
        context.set_value(&call.receiver.name, result.clone());
        Ok(result)
    }

    // ---- statements -------------------------------------------------------

    fn eval_block(&mut self, block: &Block, context: &mut Context) -> ExecResult<Flow> {
        for statement in &block.statements {
            match self.eval_statement(statement, context)? {
                Flow::Normal => {}
                returning => return Ok(returning),
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_statement(&mut self, statement: &Statement, context: &mut Context) -> ExecResult<Flow> {
        match statement {
            Statement::Loop(loop_stmt) => self.eval_loop(loop_stmt, context),
            Statement::If(if_stmt) => self.eval_if(if_stmt, context),
            Statement::Simple(simple) => self.eval_simple_stmt(simple, context),
        }
    }

    fn eval_simple_stmt(&mut self, stmt: &SimpleStmt, context: &mut Context) -> ExecResult<Flow> {
        match stmt {
            SimpleStmt::Assignment(assignment) => {
                self.eval_assignment(assignment, context)?;
                Ok(Flow::Normal)
            }
            SimpleStmt::Return(ret) => {
                let value = self.eval_test(&ret.expr, context)?;
                Ok(Flow::Returning(value))
            }
            SimpleStmt::Expression(test) => {
                // A bare expression statement's value, if any, is discarded.
                self.eval_test(test, context)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn eval_if(&mut self, stmt: &If, context: &mut Context) -> ExecResult<Flow> {
        if self.eval_or_condition(&stmt.condition, context)? {
            self.eval_block(&stmt.then_block, context)
        } else if let Some(else_block) = &stmt.else_block {
            self.eval_block(else_block, context)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn eval_loop(&mut self, stmt: &Loop, context: &mut Context) -> ExecResult<Flow> {
        self.eval_assignment(&stmt.init, context)?;
        let mut iterations: usize = 0;
        loop {
            if iterations > self.limits.iteration_limit {
                let err = ExecError::Iteration;
                self.tracer.on_guard_trip(&err);
                return Err(err);
            }
            if !self.eval_or_condition(&stmt.condition, context)? {
                return Ok(Flow::Normal);
            }
            let body_flow = self.eval_block(&stmt.body, context)?;
            // The post-assignment runs even on the iteration that returns,
            // matching the reference interpreter's loop semantics.
            self.eval_assignment(&stmt.post, context)?;
            if let Flow::Returning(value) = body_flow {
                return Ok(Flow::Returning(value));
            }
            iterations += 1;
        }
    }

    fn eval_assignment(&mut self, assignment: &Assignment, context: &mut Context) -> ExecResult<()> {
        let rhs = require_value(self.eval_summand(&assignment.rhs, context)?, assignment.loc)?;
        match &assignment.target.array_index {
            None => {
                context.set_value(&assignment.target.name, rhs);
            }
            Some(index_summand) => {
                let index_value = require_value(self.eval_summand(index_summand, context)?, assignment.loc)?;
                let name = &assignment.target.name;
                let current = context
                    .get_value(name)
                    .cloned()
                    .ok_or_else(|| ExecError::parse(assignment.loc, format!("Undefined: {name}")))?;
                let Value::Array(mut items) = current else {
                    return Err(ExecError::parse(
                        assignment.loc,
                        format!("cannot index-assign into a {}", current.type_name()),
                    ));
                };
                let index = resolve_subscript_index(&index_value, items.len(), assignment.loc)?;
                items[index] = rhs;
                context.set_value(name, Value::Array(items));
            }
        }
        Ok(())
    }

    // ---- logical expressions ----------------------------------------------

    fn eval_or_condition(&mut self, or_cond: &OrCondition, context: &mut Context) -> ExecResult<bool> {
        for and_cond in &or_cond.and_conditions {
            if self.eval_and_condition(and_cond, context)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn eval_and_condition(&mut self, and_cond: &AndCondition, context: &mut Context) -> ExecResult<bool> {
        for condition in &and_cond.conditions {
            if !self.eval_condition(condition, context)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn eval_condition(&mut self, condition: &Condition, context: &mut Context) -> ExecResult<bool> {
        match condition {
            Condition::Test(test) => {
                let loc = test.lhs.loc;
                Ok(require_value(self.eval_test(test, context)?, loc)?.truthy())
            }
            Condition::Parenthesised(or_cond) => self.eval_or_condition(or_cond, context),
        }
    }

    fn eval_test(&mut self, test: &Test, context: &mut Context) -> ExecResult<Option<Value>> {
        let lhs = self.eval_summand(&test.lhs, context)?;
        match &test.rel {
            None => Ok(lhs),
            Some((op, rhs_summand)) => {
                let loc = test.lhs.loc;
                let lhs = require_value(lhs, loc)?;
                let rhs = require_value(self.eval_summand(rhs_summand, context)?, rhs_summand.loc)?;
                Ok(Some(lhs.apply_rel(*op, &rhs, loc)?))
            }
        }
    }

    // ---- arithmetic expressions --------------------------------------------

    fn eval_summand(&mut self, summand: &Summand, context: &mut Context) -> ExecResult<Option<Value>> {
        let mut acc = self.eval_factor(&summand.first, context)?;
        for (op, factor) in &summand.rest {
            let rhs = self.eval_factor(factor, context)?;
            let lhs_value = require_value(acc, summand.loc)?;
            let rhs_value = require_value(rhs, summand.loc)?;
            acc = Some(lhs_value.apply_add(*op, &rhs_value, summand.loc)?);
        }
        Ok(acc)
    }

    fn eval_factor(&mut self, factor: &Factor, context: &mut Context) -> ExecResult<Option<Value>> {
        let mut acc = self.eval_term(&factor.first, context)?;
        for (op, term) in &factor.rest {
            let rhs = self.eval_term(term, context)?;
            let lhs_value = require_value(acc, factor.loc)?;
            let rhs_value = require_value(rhs, factor.loc)?;
            acc = Some(lhs_value.apply_mul(*op, &rhs_value, factor.loc)?);
        }
        Ok(acc)
    }

    fn eval_term(&mut self, term: &Term, context: &mut Context) -> ExecResult<Option<Value>> {
        match term {
            Term::Parenthesised(summand) => self.eval_summand(summand, context),
            Term::Atom(atom) => self.eval_atom(atom, context),
            Term::Negate(loc, inner) => {
                let value = require_value(self.eval_term(inner, context)?, *loc)?;
                match value {
                    Value::Number(n) => Ok(Some(Value::Number(-n))),
                    other => Err(ExecError::parse(*loc, format!("cannot negate a {}", other.type_name()))),
                }
            }
        }
    }

    fn eval_atom(&mut self, atom: &Atom, context: &mut Context) -> ExecResult<Option<Value>> {
        match atom {
            Atom::Number(n) => Ok(Some(Value::Number(n.value))),
            Atom::String(s) => Ok(Some(Value::String(s.value.clone()))),
            Atom::Array(array) => {
                let mut items = Vec::with_capacity(array.elements.len());
                for element in &array.elements {
                    items.push(require_value(self.eval_summand(element, context)?, array.loc)?);
                }
                Ok(Some(Value::Array(items)))
            }
            Atom::Identifier(identifier) => self.eval_identifier(identifier, context).map(Some),
            Atom::FunctionCall(call) => self.eval_function_call(call, context).map(Some),
            Atom::MethodCall(call) => self.eval_method_call(call, context).map(Some),
            Atom::MainCall(call) => {
                let fundef = context.fundef.clone().expect("MainCall evaluated before FunctionDef");
                self.eval_main_call(call, &fundef, context)
            }
        }
    }

    fn eval_identifier(&mut self, identifier: &Identifier, context: &mut Context) -> ExecResult<Value> {
        let base = context
            .get_value(&identifier.name)
            .cloned()
            .ok_or_else(|| ExecError::parse(identifier.loc, format!("Undefined: {}", identifier.name)))?;

        let Some(index_summand) = &identifier.array_index else {
            return Ok(base);
        };
        let index_value = require_value(self.eval_summand(index_summand, context)?, identifier.loc)?;
        match &base {
            Value::Array(items) => {
                let index = resolve_subscript_index(&index_value, items.len(), identifier.loc)?;
                Ok(items[index].clone())
            }
            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let index = resolve_subscript_index(&index_value, chars.len(), identifier.loc)?;
                Ok(Value::String(chars[index].to_string()))
            }
            Value::Number(_) => Err(ExecError::parse(identifier.loc, "cannot index a number".to_owned())),
        }
    }
}

/// Resolves an index into a sequence of length `len` the way the native
/// subscript operator the language's indexing is grounded on does: a
/// negative value counts back from the end (`-1` is the last element)
/// before the bounds check is applied. Used for plain reads (`a[i]`) and
/// index-assignment (`a[i] = v`); `insert`'s position argument is a
/// separate, clamping resolution (see [`number_to_index`]).
fn resolve_subscript_index(value: &Value, len: usize, loc: CodeLoc) -> ExecResult<usize> {
    let n = value
        .as_number()
        .ok_or_else(|| ExecError::parse(loc, format!("array index must be a number, found {}", value.type_name())))?;
    let n = n as i64;
    let resolved = if n < 0 { n + len as i64 } else { n };
    if resolved < 0 || resolved as usize >= len {
        return Err(ExecError::parse(loc, format!("array index {n} out of range (len {len})")));
    }
    Ok(resolved as usize)
}

/// Resolves `insert`'s position argument: negative values are rejected
/// rather than wrapped, since the original's slice-splice semantics this is
/// grounded on never resolve a negative `index` through Python-style
/// wraparound at this call site (`identval[:index] + middle +
/// identval[index:]` with a negative `index` slices from the end in a way
/// that doesn't correspond to any single "insert before position N" the
/// way a resolved non-negative index does).
fn number_to_index(value: &Value, loc: CodeLoc) -> ExecResult<usize> {
    let n = value
        .as_number()
        .ok_or_else(|| ExecError::parse(loc, format!("array index must be a number, found {}", value.type_name())))?;
    if n < 0.0 {
        return Err(ExecError::parse(loc, format!("array index {n} must not be negative")));
    }
    Ok(n as usize)
}

fn eval_builtin(name: &'static str, args: Vec<Value>, loc: CodeLoc) -> ExecResult<Value> {
    match name {
        "len" => {
            let [x] = take_args(args, loc, "len")?;
            match x {
                Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
                Value::Array(items) => Ok(Value::Number(items.len() as f64)),
                Value::Number(_) => Err(ExecError::parse(loc, "len() requires a string or array".to_owned())),
            }
        }
        "append" => {
            let [x, y] = take_args(args, loc, "append")?;
            match (x, y) {
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
                (Value::Array(mut items), y) => {
                    items.push(y);
                    Ok(Value::Array(items))
                }
                (x, _) => Err(ExecError::parse(loc, format!("append() does not support {}", x.type_name()))),
            }
        }
        "insert" => {
            let [x, i, v] = take_args(args, loc, "insert")?;
            let index = number_to_index(&i, loc)?;
            match (x, v) {
                (Value::String(s), Value::String(v)) => {
                    let clamped = index.min(s.chars().count());
                    let mut chars: Vec<char> = s.chars().collect();
                    let insertion: Vec<char> = v.chars().collect();
                    chars.splice(clamped..clamped, insertion);
                    Ok(Value::String(chars.into_iter().collect()))
                }
                (Value::Array(mut items), v) => {
                    let clamped = index.min(items.len());
                    items.insert(clamped, v);
                    Ok(Value::Array(items))
                }
                (x, _) => Err(ExecError::parse(loc, format!("insert() does not support {}", x.type_name()))),
            }
        }
        "replace" => {
            let [x, a, b] = take_args(args, loc, "replace")?;
            match (x, a, b) {
                (Value::String(s), Value::String(a), Value::String(b)) => Ok(Value::String(s.replace(&a, &b))),
                _ => Err(ExecError::parse(loc, "replace() requires three strings".to_owned())),
            }
        }
        other => Err(ExecError::parse(loc, format!("unknown builtin `{other}`"))),
    }
}

fn take_args<const N: usize>(args: Vec<Value>, loc: CodeLoc, name: &str) -> ExecResult<[Value; N]> {
    let got = args.len();
    args.try_into()
        .map_err(|_| ExecError::parse(loc, format!("{name}() takes exactly {N} argument(s), got {got}")))
}
