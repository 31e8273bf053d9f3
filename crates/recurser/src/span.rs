//! Source locations attached to tokens and AST nodes.

use std::fmt;

/// A 1-indexed line/column position in the source text.
///
/// Line and column both start at 1, and a synthetic `(1, 0)` location is
/// used for errors that have no precise source position (resource-limit
/// violations in particular).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CodeLoc {
    pub line: u32,
    pub col: u32,
}

impl CodeLoc {
    pub const START: Self = Self { line: 1, col: 1 };

    /// The synthetic location used for resource-limit errors, which have no
    /// single offending token.
    pub const SYNTHETIC: Self = Self { line: 1, col: 0 };

    #[must_use]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Default for CodeLoc {
    fn default() -> Self {
        Self::START
    }
}
