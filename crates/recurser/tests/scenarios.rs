//! End-to-end scenarios: parse a program, execute it, and check both the
//! returned value and the shape of the resulting call tree.

use pretty_assertions::assert_eq;
use recurser::{
    error::ExecError,
    frame::{CallNode, Context},
    parse,
    value::Value,
};

fn run(source: &str) -> Result<(Option<Value>, CallNode), ExecError> {
    let program = parse(source).expect("source should parse");
    let mut context = Context::new();
    let value = program.execute(&mut context)?;
    Ok((value, context.root_call_node()))
}

fn count_nodes(node: &CallNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

fn frame_ids_preorder(node: &CallNode, out: &mut Vec<u32>) {
    out.push(node.count);
    for child in &node.children {
        frame_ids_preorder(child, out);
    }
}

#[test]
fn fibonacci_recursion_produces_fifteen_frames() {
    let source = r"
        fun(n) {
            if (n < 2) {
                return n;
            } else {
                return fun(n - 1) + fun(n - 2);
            }
        }
        fun(5);
    ";
    let (value, tree) = run(source).expect("fibonacci should succeed");
    assert_eq!(value, Some(Value::Number(5.0)));
    assert_eq!(count_nodes(&tree), 15);

    let mut ids = Vec::new();
    frame_ids_preorder(&tree, &mut ids);
    for window in ids.windows(2) {
        assert!(window[0] < window[1], "frame ids must strictly increase in pre-order: {ids:?}");
    }
}

#[test]
fn string_concatenation_via_plus() {
    let source = r#"
        fun(a, b) {
            return a + b;
        }
        fun("foo", "bar");
    "#;
    let (value, _) = run(source).expect("string concat should succeed");
    assert_eq!(value, Some(Value::String("foobar".to_owned())));
}

#[test]
fn mixing_string_and_number_is_a_type_error() {
    let source = r#"
        fun(a, b) {
            return a + b;
        }
        fun("foo", 1);
    "#;
    let err = run(source).expect_err("mixed-type addition should fail");
    assert!(matches!(err, ExecError::Parse(_)));
}

#[test]
fn loop_returns_final_counter() {
    let source = r"
        fun(n) {
            for (i = 0; i < n; i = i + 1) {
            }
            return i;
        }
        fun(10);
    ";
    let (value, _) = run(source).expect("loop should succeed");
    assert_eq!(value, Some(Value::Number(10.0)));
}

#[test]
fn excessive_loop_iterations_hit_the_iteration_limit() {
    let source = r"
        fun(n) {
            for (i = 0; i < n; i = i + 1) {
            }
            return i;
        }
        fun(5000);
    ";
    let err = run(source).expect_err("loop should exceed the iteration limit");
    assert_eq!(err, ExecError::Iteration);
}

#[test]
fn unbounded_self_recursion_hits_the_stack_limit() {
    let source = r"
        fun(n) {
            return fun(n);
        }
        fun(1);
    ";
    let err = run(source).expect_err("unbounded recursion should hit the stack guard");
    assert_eq!(err, ExecError::Stack);
}

#[test]
fn array_builtin_method_chain_produces_expected_array() {
    let source = r"
        fun(a) {
            a.append(1);
            a.append(2);
            a.insert(0, 9);
            return a;
        }
        fun([]);
    ";
    let (value, _) = run(source).expect("array builtin chain should succeed");
    assert_eq!(value, Some(Value::Array(vec![Value::Number(9.0), Value::Number(1.0), Value::Number(2.0)])));
}

#[test]
fn leaf_frames_have_no_children() {
    let source = r"
        fun(n) {
            if (n < 2) {
                return n;
            } else {
                return fun(n - 1) + fun(n - 2);
            }
        }
        fun(3);
    ";
    let (_, tree) = run(source).expect("should succeed");
    let mut stack = vec![&tree];
    let mut saw_leaf = false;
    while let Some(node) = stack.pop() {
        if node.children.is_empty() {
            saw_leaf = true;
        }
        stack.extend(node.children.iter());
    }
    assert!(saw_leaf, "expected at least one leaf frame");
}

#[test]
fn empty_params_and_empty_array_literal() {
    let source = r"
        fun() {
            return [];
        }
        fun();
    ";
    let (value, tree) = run(source).expect("should succeed");
    assert_eq!(value, Some(Value::Array(vec![])));
    assert!(tree.args.is_empty());
}

#[test]
fn undefined_identifier_is_a_parse_error() {
    let source = r"
        fun(n) {
            return missing;
        }
        fun(1);
    ";
    let err = run(source).expect_err("undefined identifier should fail");
    let (_, _, message) = err.envelope();
    assert!(message.contains("Undefined"), "message was: {message}");
}

#[test]
fn method_call_receiver_must_be_a_plain_identifier() {
    let source = r"
        fun(a) {
            a[0].append(1);
            return a;
        }
        fun([[]]);
    ";
    let err = run(source).expect_err("indexed receiver should be rejected");
    assert!(matches!(err, ExecError::Parse(_)));
}

#[test]
fn negative_index_reads_from_the_end_of_an_array() {
    let source = r"
        fun(a) {
            return a[-1];
        }
        fun([1, 2, 3]);
    ";
    let (value, _) = run(source).expect("negative index should resolve from the end");
    assert_eq!(value, Some(Value::Number(3.0)));
}

#[test]
fn negative_index_reads_from_the_end_of_a_string() {
    let source = r#"
        fun(s) {
            return s[-2];
        }
        fun("abc");
    "#;
    let (value, _) = run(source).expect("negative index should resolve from the end");
    assert_eq!(value, Some(Value::String("b".to_owned())));
}

#[test]
fn negative_index_assigns_from_the_end_of_an_array() {
    let source = r"
        fun(a) {
            a[-1] = 9;
            return a;
        }
        fun([1, 2, 3]);
    ";
    let (value, _) = run(source).expect("negative index-assignment should resolve from the end");
    assert_eq!(value, Some(Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(9.0)])));
}

#[test]
fn negative_index_past_the_start_is_out_of_range() {
    let source = r"
        fun(a) {
            return a[-4];
        }
        fun([1, 2, 3]);
    ";
    let err = run(source).expect_err("wraparound past the start should still be out of range");
    assert!(matches!(err, ExecError::Parse(_)));
}
