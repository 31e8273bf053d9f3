//! Abstract syntax tree produced by [`crate::parser::parse`].
//!
//! Every node that can be the site of a runtime failure (identifiers,
//! numbers, calls, operators) carries its [`CodeLoc`] so the evaluator can
//! attach a precise source position to the [`crate::error::ExecError`] it
//! raises.

use crate::span::CodeLoc;

/// A complete program: exactly one function definition plus the single
/// top-level call that invokes it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Program {
    pub fundef: FunctionDef,
    pub main_call: MainCall,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionDef {
    pub parameters: Vec<Identifier>,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Statement {
    Loop(Loop),
    If(If),
    Simple(SimpleStmt),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SimpleStmt {
    Assignment(Assignment),
    Return(Return),
    Expression(Test),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assignment {
    pub target: Identifier,
    pub rhs: Summand,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Return {
    pub expr: Test,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct If {
    pub condition: OrCondition,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Loop {
    pub init: Assignment,
    pub condition: OrCondition,
    pub post: Assignment,
    pub body: Block,
    pub loc: CodeLoc,
}

/// `a || b || ...`: true if any and-condition is true (short-circuits).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrCondition {
    pub and_conditions: Vec<AndCondition>,
}

/// `a && b && ...`: true only if every condition is true (short-circuits).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AndCondition {
    pub conditions: Vec<Condition>,
}

/// Either a bare test/expression or a parenthesised `OrCondition`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Condition {
    Test(Test),
    Parenthesised(Box<OrCondition>),
}

/// A summand optionally compared with a relational operator: the only place
/// relational operators are permitted in the grammar.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Test {
    pub lhs: Summand,
    pub rel: Option<(RelOp, Summand)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RelOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AddOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MulOp {
    Mul,
    Div,
}

/// Additive precedence tier: `factor (+/- factor)*`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Summand {
    pub first: Factor,
    pub rest: Vec<(AddOp, Factor)>,
    pub loc: CodeLoc,
}

/// Multiplicative precedence tier: `term (* /  term)*`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Factor {
    pub first: Term,
    pub rest: Vec<(MulOp, Term)>,
    pub loc: CodeLoc,
}

/// Atomic precedence tier: a single value, a parenthesised summand, or a
/// unary-negated term.
///
/// Negation is its own tier rather than a `Number` literal detail: the
/// lexer never folds a `-` sign into a number token, so `n-1` tokenizes as
/// `n`, `-`, `1` regardless of whether `-` is read as the subtraction
/// operator or as this production, and the two are disambiguated purely by
/// grammar position (`summand`'s repetition loop only ever looks for `-` as
/// an infix operator between two already-parsed factors).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Term {
    Atom(Box<Atom>),
    Parenthesised(Box<Summand>),
    Negate(CodeLoc, Box<Term>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Atom {
    Number(Number),
    String(StringLit),
    Array(ArrayLit),
    MethodCall(MethodCall),
    Identifier(Identifier),
    FunctionCall(FunctionCall),
    MainCall(MainCall),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Number {
    pub value: f64,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StringLit {
    pub value: String,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrayLit {
    pub elements: Vec<Summand>,
    pub loc: CodeLoc,
}

/// `name` or `name[index]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Identifier {
    pub name: String,
    pub array_index: Option<Box<Summand>>,
    pub loc: CodeLoc,
}

/// A call to one of the fixed set of built-ins (`len`, `append`, `insert`,
/// `replace`), never to a user-defined name.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionCall {
    pub builtin_name: &'static str,
    pub args: Vec<Summand>,
    pub loc: CodeLoc,
}

/// `receiver.builtin(args...)`, sugar for `receiver = builtin(receiver, args...)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MethodCall {
    pub receiver: Identifier,
    pub inner: FunctionCall,
}

/// The single top-level invocation of the one user-defined function.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MainCall {
    pub args: Vec<Summand>,
    pub loc: CodeLoc,
}
