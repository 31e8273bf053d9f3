//! The crate's error surface: three distinguished failure kinds unified
//! behind one [`ExecError`] enum.
//!
//! Hand-written variants with manual `Display`/`Error` impls and `From`
//! conversions for ergonomic `?`-propagation, rather than a derive-macro
//! crate such as `thiserror`.

use std::fmt;

use crate::span::CodeLoc;

/// A grammar violation or runtime evaluation failure (undefined identifier,
/// type mismatch, bad index, division by zero, builtin arity mismatch).
///
/// Runtime failures reuse this same envelope as parse-time failures so that
/// a caller only ever has to handle one shape of "something about the
/// source was wrong" error.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParseError {
    pub loc: CodeLoc,
    pub message: String,
}

impl ParseError {
    #[must_use]
    pub fn new(loc: CodeLoc, message: String) -> Self {
        Self { loc, message }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.loc, self.message)
    }
}

impl std::error::Error for ParseError {}

/// The three distinguished failure kinds the interpreter can raise.
///
/// `Stack` and `Iteration` carry the synthetic `(1, 0)` location convention
/// rather than a precise source position, because the violation is a
/// property of the whole execution (too much recursion, too many loop
/// iterations) rather than of one offending token.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ExecError {
    /// Grammar violation or runtime type/name/arity error.
    Parse(ParseError),
    /// Stack depth or total frame count exceeded.
    Stack,
    /// A single loop instance exceeded its iteration cap.
    Iteration,
}

impl ExecError {
    #[must_use]
    pub fn parse(loc: CodeLoc, message: impl Into<String>) -> Self {
        Self::Parse(ParseError::new(loc, message.into()))
    }

    /// Returns the `(lineno, col, message)` triple the HTTP collaborator's
    /// error envelope expects, regardless of which variant this is.
    #[must_use]
    pub fn envelope(&self) -> (u32, u32, String) {
        match self {
            Self::Parse(err) => (err.loc.line, err.loc.col, err.message.clone()),
            Self::Stack => (
                CodeLoc::SYNTHETIC.line,
                CodeLoc::SYNTHETIC.col,
                "stack limit exceeded".to_owned(),
            ),
            Self::Iteration => (
                CodeLoc::SYNTHETIC.line,
                CodeLoc::SYNTHETIC.col,
                "iteration limit exceeded".to_owned(),
            ),
        }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Stack => write!(f, "{}: stack limit exceeded", CodeLoc::SYNTHETIC),
            Self::Iteration => write!(f, "{}: iteration limit exceeded", CodeLoc::SYNTHETIC),
        }
    }
}

impl std::error::Error for ExecError {}

impl From<ParseError> for ExecError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type ExecResult<T> = Result<T, ExecError>;
