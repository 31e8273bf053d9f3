//! The runtime value model: a small tagged union dispatched by `match`,
//! without the heap-arena indirection a larger object graph would need.

use std::fmt;

use crate::{
    ast::{AddOp, MulOp, RelOp},
    error::ExecError,
    span::CodeLoc,
};

/// A runtime value: a number, a string, or an array of values.
///
/// NOTE: there is no `Null`/`Unit` variant here. A function that falls
/// through without `return` produces no `Value` at all (see
/// [`crate::interpreter`]); the type system enforces that such a result can
/// never flow into a binary operator or an assignment undetected.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
        }
    }

    /// Truthiness: non-zero numbers, non-empty strings, non-empty arrays.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Array(items) => !items.is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    fn type_mismatch(op: &str, lhs: &Value, rhs: &Value, loc: CodeLoc) -> ExecError {
        ExecError::parse(
            loc,
            format!(
                "unsupported operand types for {op}: '{}' and '{}'",
                lhs.type_name(),
                rhs.type_name()
            ),
        )
    }

    /// Applies an additive/multiplicative operator. Numbers combine
    /// arithmetically; `+` additionally concatenates two strings. Any other
    /// tag combination is a type error attached to `loc`.
    pub fn apply_add(&self, op: AddOp, rhs: &Value, loc: CodeLoc) -> Result<Value, ExecError> {
        match (op, self, rhs) {
            (AddOp::Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (AddOp::Sub, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
            (AddOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => Err(Self::type_mismatch(if op == AddOp::Add { "+" } else { "-" }, self, rhs, loc)),
        }
    }

    pub fn apply_mul(&self, op: MulOp, rhs: &Value, loc: CodeLoc) -> Result<Value, ExecError> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => match op {
                MulOp::Mul => Ok(Value::Number(a * b)),
                MulOp::Div => {
                    if *b == 0.0 {
                        Err(ExecError::parse(loc, "division by zero".to_owned()))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }
            },
            _ => Err(Self::type_mismatch(if op == MulOp::Mul { "*" } else { "/" }, self, rhs, loc)),
        }
    }

    /// Applies a relational operator, producing a `Number` 0/1 result.
    ///
    /// `==`/`!=` compare same-typed scalars (and, for arrays, structural
    /// equality); `<`/`<=`/`>`/`>=` require two numbers.
    pub fn apply_rel(&self, op: RelOp, rhs: &Value, loc: CodeLoc) -> Result<Value, ExecError> {
        let result = match op {
            RelOp::Eq | RelOp::NotEq => {
                let eq = match (self, rhs) {
                    (Value::Number(a), Value::Number(b)) => a == b,
                    (Value::String(a), Value::String(b)) => a == b,
                    (Value::Array(a), Value::Array(b)) => a == b,
                    _ => {
                        return Err(Self::type_mismatch(
                            if op == RelOp::Eq { "==" } else { "!=" },
                            self,
                            rhs,
                            loc,
                        ));
                    }
                };
                if op == RelOp::Eq { eq } else { !eq }
            }
            RelOp::Lt | RelOp::LtEq | RelOp::Gt | RelOp::GtEq => {
                let (Value::Number(a), Value::Number(b)) = (self, rhs) else {
                    let sym = match op {
                        RelOp::Lt => "<",
                        RelOp::LtEq => "<=",
                        RelOp::Gt => ">",
                        RelOp::GtEq => ">=",
                        RelOp::Eq | RelOp::NotEq => unreachable!(),
                    };
                    return Err(Self::type_mismatch(sym, self, rhs, loc));
                };
                match op {
                    RelOp::Lt => a < b,
                    RelOp::LtEq => a <= b,
                    RelOp::Gt => a > b,
                    RelOp::GtEq => a >= b,
                    RelOp::Eq | RelOp::NotEq => unreachable!(),
                }
            }
        };
        Ok(Value::Number(if result { 1.0 } else { 0.0 }))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_add() {
        let loc = CodeLoc::default();
        assert_eq!(
            Value::Number(2.0).apply_add(AddOp::Add, &Value::Number(3.0), loc).unwrap(),
            Value::Number(5.0)
        );
    }

    #[test]
    fn strings_concatenate_on_plus() {
        let loc = CodeLoc::default();
        assert_eq!(
            Value::String("a".into()).apply_add(AddOp::Add, &Value::String("b".into()), loc).unwrap(),
            Value::String("ab".into())
        );
    }

    #[test]
    fn mixed_types_are_a_type_error() {
        let loc = CodeLoc::default();
        assert!(Value::String("a".into()).apply_add(AddOp::Add, &Value::Number(1.0), loc).is_err());
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let loc = CodeLoc::default();
        assert!(Value::Number(1.0).apply_mul(MulOp::Div, &Value::Number(0.0), loc).is_err());
    }

    #[test]
    fn truthiness_matches_spec() {
        assert!(!Value::Number(0.0).truthy());
        assert!(Value::Number(1.0).truthy());
        assert!(!Value::String(String::new()).truthy());
        assert!(Value::String("a".into()).truthy());
        assert!(!Value::Array(vec![]).truthy());
    }
}
