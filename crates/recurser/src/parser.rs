//! Recursive-descent, precedence-climbing parser.
//!
//! The grammar is mutually recursive (summand <-> function-call <->
//! method-call <-> or-condition <-> block <-> loop). Rather than relying on
//! `Forward`-style placeholders, a recursive descent parser expresses
//! forward references simply as ordinary function calls: every production
//! is a method on [`Parser`], and mutual recursion falls out of the call
//! graph for free.
//!
//! Two points in the grammar commit once a keyword has been seen and do
//! not backtrack past it: after `for` sees `(`, and after `else` sees `{`.
//! Diagnostics raised past those points point at the offending construct
//! rather than at an earlier, already-resolved ambiguity. Every other
//! alternative (in particular, disambiguating a parenthesised arithmetic
//! summand from a parenthesised logical condition) backtracks freely: we
//! save the token position, try the arithmetic interpretation, and fall
//! back to the logical one only if that attempt produced a genuine syntax
//! error.

use crate::{
    ast::*,
    error::{ParseError, ParseResult},
    lexer::{Token, TokenKind, lex},
    span::CodeLoc,
};

/// Parses `source` into a [`Program`].
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let program = parser.parse_program()?;
    parser.expect_eof()?;
    Ok(program)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        // The lexer always appends a trailing `Eof` token, so this never runs
        // past the end of `tokens`.
        &self.tokens[self.pos]
    }

    fn loc(&self) -> CodeLoc {
        self.current().loc
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("expected {kind}")))
        }
    }

    /// Like [`Self::expect`], but used at the two points in the grammar that
    /// commit: the message names the enclosing construct so the diagnostic
    /// doesn't read as a generic token mismatch.
    fn expect_committed(&mut self, kind: TokenKind, construct: &str) -> ParseResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("expected {kind} in {construct}")))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::new(self.loc(), format!("{expected}, found {}", self.current().kind))
    }

    fn expect_eof(&mut self) -> ParseResult<()> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("expected end of input"))
        }
    }

    fn identifier_name(&mut self) -> ParseResult<(String, CodeLoc)> {
        let loc = self.loc();
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok((name, loc))
            }
            _ => Err(self.unexpected("expected identifier")),
        }
    }

    // ---- top level -------------------------------------------------

    fn parse_program(&mut self) -> ParseResult<Program> {
        let fundef = self.parse_fundef()?;
        let main_call = self.parse_main_call()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Program { fundef, main_call })
    }

    fn parse_fundef(&mut self) -> ParseResult<FunctionDef> {
        self.expect(TokenKind::Fun)?;
        self.expect(TokenKind::LParen)?;
        let mut parameters = Vec::new();
        if !self.check(&TokenKind::RParen) {
            parameters.push(self.parse_identifier()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                parameters.push(self.parse_identifier()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let block = self.parse_block()?;
        self.expect(TokenKind::RBrace)?;
        Ok(FunctionDef { parameters, block })
    }

    fn parse_main_call(&mut self) -> ParseResult<MainCall> {
        let loc = self.loc();
        self.expect(TokenKind::Fun)?;
        self.expect(TokenKind::LParen)?;
        let args = self.parse_summand_list(&TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(MainCall { args, loc })
    }

    // ---- statements -------------------------------------------------

    fn parse_block(&mut self) -> ParseResult<Block> {
        let mut statements = Vec::new();
        loop {
            match &self.current().kind {
                TokenKind::RBrace | TokenKind::Eof => break,
                _ => statements.push(self.parse_statement()?),
            }
        }
        Ok(Block { statements })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match &self.current().kind {
            TokenKind::For => Ok(Statement::Loop(self.parse_loop()?)),
            TokenKind::If => Ok(Statement::If(self.parse_if()?)),
            _ => Ok(Statement::Simple(self.parse_simple_stmt()?)),
        }
    }

    fn parse_simple_stmt(&mut self) -> ParseResult<SimpleStmt> {
        let stmt = if self.check(&TokenKind::Return) {
            SimpleStmt::Return(self.parse_return()?)
        } else if self.looks_like_assignment() {
            SimpleStmt::Assignment(self.parse_assignment()?)
        } else {
            SimpleStmt::Expression(self.parse_test()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(stmt)
    }

    /// An assignment starts with an identifier (optionally indexed)
    /// followed by `=`. Anything else starting with an identifier (a bare
    /// call, a method call used as a statement) is an expression instead.
    fn looks_like_assignment(&self) -> bool {
        let TokenKind::Identifier(_) = &self.current().kind else {
            return false;
        };
        let mut i = self.pos + 1;
        if self.tokens[i].kind == TokenKind::LBracket {
            // Skip a balanced `[ ... ]` without re-parsing the summand inside.
            let mut depth = 1;
            i += 1;
            while depth > 0 {
                match self.tokens.get(i).map(|t| &t.kind) {
                    Some(TokenKind::LBracket) => depth += 1,
                    Some(TokenKind::RBracket) => depth -= 1,
                    Some(TokenKind::Eof) | None => return false,
                    _ => {}
                }
                i += 1;
            }
        }
        matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::Assign))
    }

    fn parse_assignment(&mut self) -> ParseResult<Assignment> {
        let loc = self.loc();
        let target = self.parse_identifier()?;
        self.expect(TokenKind::Assign)?;
        let rhs = self.parse_summand()?;
        Ok(Assignment { target, rhs, loc })
    }

    fn parse_return(&mut self) -> ParseResult<Return> {
        self.expect(TokenKind::Return)?;
        Ok(Return { expr: self.parse_test()? })
    }

    fn parse_if(&mut self) -> ParseResult<If> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_or_condition()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let then_block = self.parse_block()?;
        self.expect(TokenKind::RBrace)?;
        let else_block = if self.check(&TokenKind::Else) {
            self.advance();
            self.expect_committed(TokenKind::LBrace, "else clause")?;
            let block = self.parse_block()?;
            self.expect(TokenKind::RBrace)?;
            Some(block)
        } else {
            None
        };
        Ok(If { condition, then_block, else_block })
    }

    fn parse_loop(&mut self) -> ParseResult<Loop> {
        let loc = self.loc();
        self.expect(TokenKind::For)?;
        self.expect_committed(TokenKind::LParen, "for loop header")?;
        let init = self.parse_assignment()?;
        self.expect(TokenKind::Semicolon)?;
        let condition = self.parse_or_condition()?;
        self.expect(TokenKind::Semicolon)?;
        let post = self.parse_assignment()?;
        self.expect_committed(TokenKind::RParen, "for loop header")?;
        self.expect(TokenKind::LBrace)?;
        let body = self.parse_block()?;
        self.expect(TokenKind::RBrace)?;
        Ok(Loop { init, condition, post, body, loc })
    }

    // ---- logical expressions -----------------------------------------

    fn parse_or_condition(&mut self) -> ParseResult<OrCondition> {
        let mut and_conditions = vec![self.parse_and_condition()?];
        while self.check(&TokenKind::OrOr) {
            self.advance();
            and_conditions.push(self.parse_and_condition()?);
        }
        Ok(OrCondition { and_conditions })
    }

    fn parse_and_condition(&mut self) -> ParseResult<AndCondition> {
        let mut conditions = vec![self.parse_condition()?];
        while self.check(&TokenKind::AndAnd) {
            self.advance();
            conditions.push(self.parse_condition()?);
        }
        Ok(AndCondition { conditions })
    }

    fn parse_condition(&mut self) -> ParseResult<Condition> {
        let checkpoint = self.pos;
        match self.parse_test() {
            Ok(test) => Ok(Condition::Test(test)),
            Err(_) => {
                self.pos = checkpoint;
                self.expect(TokenKind::LParen)?;
                let or_cond = self.parse_or_condition()?;
                self.expect(TokenKind::RParen)?;
                Ok(Condition::Parenthesised(Box::new(or_cond)))
            }
        }
    }

    fn parse_test(&mut self) -> ParseResult<Test> {
        let lhs = self.parse_summand()?;
        let rel = match &self.current().kind {
            TokenKind::EqEq => Some(RelOp::Eq),
            TokenKind::NotEq => Some(RelOp::NotEq),
            TokenKind::Lt => Some(RelOp::Lt),
            TokenKind::LtEq => Some(RelOp::LtEq),
            TokenKind::Gt => Some(RelOp::Gt),
            TokenKind::GtEq => Some(RelOp::GtEq),
            _ => None,
        };
        let rel = match rel {
            Some(op) => {
                self.advance();
                Some((op, self.parse_summand()?))
            }
            None => None,
        };
        Ok(Test { lhs, rel })
    }

    // ---- arithmetic expressions ---------------------------------------

    fn parse_summand_list(&mut self, terminator: &TokenKind) -> ParseResult<Vec<Summand>> {
        let mut items = Vec::new();
        if !self.check(terminator) {
            items.push(self.parse_summand()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                items.push(self.parse_summand()?);
            }
        }
        Ok(items)
    }

    fn parse_summand(&mut self) -> ParseResult<Summand> {
        let loc = self.loc();
        let first = self.parse_factor()?;
        let mut rest = Vec::new();
        loop {
            let op = match &self.current().kind {
                TokenKind::Plus => AddOp::Add,
                TokenKind::Minus => AddOp::Sub,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_factor()?));
        }
        Ok(Summand { first, rest, loc })
    }

    fn parse_factor(&mut self) -> ParseResult<Factor> {
        let loc = self.loc();
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        loop {
            let op = match &self.current().kind {
                TokenKind::Star => MulOp::Mul,
                TokenKind::Slash => MulOp::Div,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_term()?));
        }
        Ok(Factor { first, rest, loc })
    }

    fn parse_term(&mut self) -> ParseResult<Term> {
        if self.check(&TokenKind::Minus) {
            let loc = self.loc();
            self.advance();
            let inner = self.parse_term()?;
            Ok(Term::Negate(loc, Box::new(inner)))
        } else if self.check(&TokenKind::LParen) {
            self.advance();
            let summand = self.parse_summand()?;
            self.expect(TokenKind::RParen)?;
            Ok(Term::Parenthesised(Box::new(summand)))
        } else {
            Ok(Term::Atom(Box::new(self.parse_atom()?)))
        }
    }

    fn parse_atom(&mut self) -> ParseResult<Atom> {
        match &self.current().kind {
            TokenKind::Number(n) => {
                let value = *n;
                let loc = self.loc();
                self.advance();
                Ok(Atom::Number(Number { value, loc }))
            }
            TokenKind::String(s) => {
                let value = s.clone();
                let loc = self.loc();
                self.advance();
                Ok(Atom::String(StringLit { value, loc }))
            }
            TokenKind::LBracket => Ok(Atom::Array(self.parse_array()?)),
            TokenKind::Builtin(_) => Ok(Atom::FunctionCall(self.parse_function_call()?)),
            TokenKind::Fun => Ok(Atom::MainCall(self.parse_main_call()?)),
            TokenKind::Identifier(_) => {
                let receiver = self.parse_identifier()?;
                if self.check(&TokenKind::Dot) {
                    self.advance();
                    let inner = self.parse_function_call()?;
                    Ok(Atom::MethodCall(MethodCall { receiver, inner }))
                } else {
                    Ok(Atom::Identifier(receiver))
                }
            }
            _ => Err(self.unexpected("expected a value")),
        }
    }

    fn parse_array(&mut self) -> ParseResult<ArrayLit> {
        let loc = self.loc();
        self.expect(TokenKind::LBracket)?;
        let elements = self.parse_summand_list(&TokenKind::RBracket)?;
        self.expect(TokenKind::RBracket)?;
        Ok(ArrayLit { elements, loc })
    }

    fn parse_identifier(&mut self) -> ParseResult<Identifier> {
        let (name, loc) = self.identifier_name()?;
        let array_index = if self.check(&TokenKind::LBracket) {
            self.advance();
            let index = self.parse_summand()?;
            self.expect(TokenKind::RBracket)?;
            Some(Box::new(index))
        } else {
            None
        };
        Ok(Identifier { name, array_index, loc })
    }

    fn parse_function_call(&mut self) -> ParseResult<FunctionCall> {
        let loc = self.loc();
        let builtin_name = match &self.current().kind {
            TokenKind::Builtin(name) => *name,
            _ => return Err(self.unexpected("expected a builtin function name")),
        };
        self.advance();
        self.expect(TokenKind::LParen)?;
        let args = self.parse_summand_list(&TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(FunctionCall { builtin_name, args, loc })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_program() {
        let program = parse("fun() { return 1; } fun();").unwrap();
        assert!(program.fundef.parameters.is_empty());
        assert_eq!(program.main_call.args.len(), 0);
    }

    #[test]
    fn parses_recursive_fibonacci() {
        let src = "fun(n) { if (n <= 1) { return n; } return fun(n-1) + fun(n-2); } fun(5);";
        let program = parse(src).unwrap();
        assert_eq!(program.fundef.parameters.len(), 1);
        assert_eq!(program.fundef.block.statements.len(), 2);
    }

    #[test]
    fn parenthesised_logical_condition_disambiguates_from_arithmetic() {
        let src = "fun(a, b) { if ((a == 1) && (b == 2)) { return 1; } return 0; } fun(1, 2);";
        parse(src).unwrap();
    }

    #[test]
    fn rejects_nested_array_indexing() {
        let src = "fun(a) { return a[0][1]; } fun([[1,2]]);";
        assert!(parse(src).is_err());
    }

    #[test]
    fn rejects_trailing_garbage_after_program() {
        let src = "fun() { return 1; } fun(); garbage";
        assert!(parse(src).is_err());
    }

    #[test]
    fn for_header_mismatch_is_a_committed_error() {
        let src = "fun() { for (i = 0 i < 1; i = i + 1) {} } fun();";
        let err = parse(src).unwrap_err();
        assert!(err.message.contains("for loop header"));
    }

    #[test]
    fn else_without_brace_is_a_committed_error() {
        let src = "fun() { if (1) {} else return 1; } fun();";
        let err = parse(src).unwrap_err();
        assert!(err.message.contains("else clause"));
    }

    #[test]
    fn parses_method_call_chain() {
        let src = r#"fun() { x = []; x.append(1); x.insert(0, 9); return x; } fun();"#;
        let program = parse(src).unwrap();
        assert_eq!(program.fundef.block.statements.len(), 3);
    }

    #[test]
    fn structural_round_trip_is_deterministic() {
        let src = "fun(n) { return fun(n); } fun(1);";
        assert_eq!(parse(src).unwrap(), parse(src).unwrap());
    }
}
