//! Token values produced by the scanner. Tokens are value-like and freely
//! cloned; each carries its original spelling and location.

use core_diag::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    EndOfInput,
    EndOfLine,
    /// `#include`, `#define`, `#if`, ... — spelling includes the `#`.
    Directive,
    Identifier,
    Integer,
    String,
    LParen,
    RParen,
    LBrace,
    RBrace,
    /// One of `+ - < > [ ] . ,` outside directives and expressions.
    BFInstr,
    /// Expression operator, e.g. `+`, `<<`, `&&`.
    Operator,
    /// Scan failure; the parser aborts when it reaches one.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Only meaningful for `Integer` tokens.
    pub int_value: i32,
    pub loc: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            kind,
            text: text.into(),
            int_value: 0,
            loc,
        }
    }

    pub fn make_bf(instr: char, loc: SourceLocation) -> Self {
        Self::new(TokenKind::BFInstr, instr.to_string(), loc)
    }

    pub fn make_int(value: i32, loc: SourceLocation) -> Self {
        Self {
            kind: TokenKind::Integer,
            text: value.to_string(),
            int_value: value,
            loc,
        }
    }

    pub fn end_of_input() -> Self {
        Self::new(TokenKind::EndOfInput, "", SourceLocation::none())
    }

    /// Commas show up as `Operator` inside expressions and as `BFInstr` at
    /// statement level, so argument collection matches on spelling.
    pub fn is_comma(&self) -> bool {
        self.text == ","
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, TokenKind::EndOfLine | TokenKind::EndOfInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_int_keeps_spelling_and_value() {
        let t = Token::make_int(42, SourceLocation::none());
        assert_eq!(t.kind, TokenKind::Integer);
        assert_eq!(t.text, "42");
        assert_eq!(t.int_value, 42);
    }

    #[test]
    fn comma_matches_by_text() {
        let bf = Token::make_bf(',', SourceLocation::none());
        let op = Token::new(TokenKind::Operator, ",", SourceLocation::none());
        assert!(bf.is_comma());
        assert!(op.is_comma());
        assert!(!Token::make_bf('+', SourceLocation::none()).is_comma());
    }
}
