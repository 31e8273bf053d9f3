//! Lexical analysis: turns source text into a stream of spanned [`Token`]s.
//!
//! Whitespace is insignificant. C-style `/* ... */`, C++-style `// ...`, and
//! shell-style `# ...` comments are all recognised and skipped wherever they
//! appear, including between two tokens that would otherwise be adjacent.

use std::fmt;

use crate::{
    error::ParseError,
    span::CodeLoc,
};

/// Reserved keywords. These may never be used as identifiers.
pub const KEYWORDS: &[&str] = &["if", "else", "return", "for", "fun"];

/// Reserved built-in function names. These may never be used as identifiers.
pub const BUILTINS: &[&str] = &["len", "append", "insert", "replace"];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Number(f64),
    String(String),

    If,
    Else,
    Return,
    For,
    Fun,

    Builtin(&'static str),

    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(name) => write!(f, "identifier `{name}`"),
            Self::Number(n) => write!(f, "number `{n}`"),
            Self::String(s) => write!(f, "string {s:?}"),
            Self::If => write!(f, "`if`"),
            Self::Else => write!(f, "`else`"),
            Self::Return => write!(f, "`return`"),
            Self::For => write!(f, "`for`"),
            Self::Fun => write!(f, "`fun`"),
            Self::Builtin(name) => write!(f, "`{name}`"),
            Self::Plus => write!(f, "`+`"),
            Self::Minus => write!(f, "`-`"),
            Self::Star => write!(f, "`*`"),
            Self::Slash => write!(f, "`/`"),
            Self::Assign => write!(f, "`=`"),
            Self::EqEq => write!(f, "`==`"),
            Self::NotEq => write!(f, "`!=`"),
            Self::Lt => write!(f, "`<`"),
            Self::LtEq => write!(f, "`<=`"),
            Self::Gt => write!(f, "`>`"),
            Self::GtEq => write!(f, "`>=`"),
            Self::AndAnd => write!(f, "`&&`"),
            Self::OrOr => write!(f, "`||`"),
            Self::LParen => write!(f, "`(`"),
            Self::RParen => write!(f, "`)`"),
            Self::LBrace => write!(f, "`{{`"),
            Self::RBrace => write!(f, "`}}`"),
            Self::LBracket => write!(f, "`[`"),
            Self::RBracket => write!(f, "`]`"),
            Self::Comma => write!(f, "`,`"),
            Self::Semicolon => write!(f, "`;`"),
            Self::Dot => write!(f, "`.`"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: CodeLoc,
}

/// Tokenizes `source`, returning every token plus a trailing `Eof` sentinel.
pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn loc(&self) -> CodeLoc {
        CodeLoc::new(self.line, self.col)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some(_), _) => {
                                self.advance();
                            }
                            (None, _) => break,
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let loc = self.loc();
            let Some(c) = self.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, loc });
                return Ok(tokens);
            };

            let kind = match c {
                '(' => { self.advance(); TokenKind::LParen }
                ')' => { self.advance(); TokenKind::RParen }
                '{' => { self.advance(); TokenKind::LBrace }
                '}' => { self.advance(); TokenKind::RBrace }
                '[' => { self.advance(); TokenKind::LBracket }
                ']' => { self.advance(); TokenKind::RBracket }
                ',' => { self.advance(); TokenKind::Comma }
                ';' => { self.advance(); TokenKind::Semicolon }
                '.' => { self.advance(); TokenKind::Dot }
                '+' => { self.advance(); TokenKind::Plus }
                '*' => { self.advance(); TokenKind::Star }
                '/' => { self.advance(); TokenKind::Slash }
                '=' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::EqEq
                    } else {
                        TokenKind::Assign
                    }
                }
                '!' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::NotEq
                    } else {
                        return Err(ParseError::new(loc, "unexpected character `!`".to_owned()));
                    }
                }
                '<' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::LtEq
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::GtEq
                    } else {
                        TokenKind::Gt
                    }
                }
                '&' => {
                    self.advance();
                    if self.peek() == Some('&') {
                        self.advance();
                        TokenKind::AndAnd
                    } else {
                        return Err(ParseError::new(loc, "unexpected character `&`".to_owned()));
                    }
                }
                '|' => {
                    self.advance();
                    if self.peek() == Some('|') {
                        self.advance();
                        TokenKind::OrOr
                    } else {
                        return Err(ParseError::new(loc, "unexpected character `|`".to_owned()));
                    }
                }
                '"' => self.lex_string(loc)?,
                '-' => { self.advance(); TokenKind::Minus }
                c if c.is_ascii_digit() => self.lex_number(),
                c if c.is_alphabetic() || c == '_' => self.lex_word(),
                c => return Err(ParseError::new(loc, format!("unexpected character `{c}`"))),
            };

            tokens.push(Token { kind, loc });
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        // The lexical grammar guarantees a well-formed float literal here.
        TokenKind::Number(text.parse().expect("lexed number must parse as f64"))
    }

    fn lex_string(&mut self, loc: CodeLoc) -> Result<TokenKind, ParseError> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(TokenKind::String(s)),
                Some(c) => s.push(c),
                None => return Err(ParseError::new(loc, "unterminated string literal".to_owned())),
            }
        }
    }

    fn lex_word(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match text.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "return" => TokenKind::Return,
            "for" => TokenKind::For,
            "fun" => TokenKind::Fun,
            "len" => TokenKind::Builtin("len"),
            "append" => TokenKind::Builtin("append"),
            "insert" => TokenKind::Builtin("insert"),
            "replace" => TokenKind::Builtin("replace"),
            _ => TokenKind::Identifier(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("if else return for fun len append insert replace x"),
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Return,
                TokenKind::For,
                TokenKind::Fun,
                TokenKind::Builtin("len"),
                TokenKind::Builtin("append"),
                TokenKind::Builtin("insert"),
                TokenKind::Builtin("replace"),
                TokenKind::Identifier("x".to_owned()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(
            kinds("5 3.25"),
            vec![TokenKind::Number(5.0), TokenKind::Number(3.25), TokenKind::Eof]
        );
    }

    #[test]
    fn minus_is_never_folded_into_a_number_literal() {
        // Tokenization alone can't know whether `-` is subtraction or
        // negation; that's resolved by the parser, not here.
        assert_eq!(
            kinds("n-1"),
            vec![
                TokenKind::Identifier("n".to_owned()),
                TokenKind::Minus,
                TokenKind::Number(1.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_strings() {
        assert_eq!(
            kinds(r#""hello world""#),
            vec![TokenKind::String("hello world".to_owned()), TokenKind::Eof]
        );
    }

    #[test]
    fn skips_all_comment_styles() {
        let source = "// line\n# shell\n/* block */ x";
        assert_eq!(kinds(source), vec![TokenKind::Identifier("x".to_owned()), TokenKind::Eof]);
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = lex("x\ny").unwrap();
        assert_eq!(tokens[0].loc, CodeLoc::new(1, 1));
        assert_eq!(tokens[1].loc, CodeLoc::new(2, 1));
    }

    #[test]
    fn rejects_unknown_characters() {
        assert!(lex("x ~ y").is_err());
    }
}
