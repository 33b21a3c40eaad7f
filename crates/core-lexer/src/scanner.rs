//! Character-level scanner. One call scans one logical line; the directive
//! and expression-depth state bits are line scoped.

use crate::token::{Token, TokenKind};
use core_diag::{ErrorReporter, SourceLocation};
use std::sync::Arc;

const BF_INSTRS: &[u8] = b"+-<>[].,";
const SINGLE_OPS: &[u8] = b"+-*/%&|^~!<>=,";
const DOUBLE_OPS: &[&str] = &["==", "!=", "<=", ">=", "&&", "||", "<<", ">>"];

#[derive(Debug, Default)]
pub struct TokenScanner;

impl TokenScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan `text` and append the resulting tokens, ending with `EndOfLine`.
    pub fn scan_line(
        &self,
        text: &str,
        filename: &Arc<str>,
        line_num: u32,
        tokens: &mut Vec<Token>,
        diags: &mut ErrorReporter,
    ) {
        let bytes = text.as_bytes();
        let start_count = tokens.len();
        let mut in_directive = false;
        let mut expr_depth = 0usize;
        let mut i = 0usize;

        let loc_at =
            |col: usize| SourceLocation::new(Arc::clone(filename), line_num, col as u32 + 1);

        while i < bytes.len() {
            let c = bytes[i];
            if c.is_ascii_whitespace() {
                i += 1;
                continue;
            }

            let start = i;
            let loc = loc_at(start);

            // Directive: '#' followed by letters, as the first token of the line.
            if tokens.len() == start_count
                && c == b'#'
                && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic)
            {
                in_directive = true;
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                    i += 1;
                }
                tokens.push(Token::new(TokenKind::Directive, &text[start..i], loc));
                continue;
            }

            if c.is_ascii_alphabetic() || c == b'_' {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token::new(TokenKind::Identifier, &text[start..i], loc));
                continue;
            }

            if c.is_ascii_digit() {
                let mut value: i32 = 0;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    value = value
                        .wrapping_mul(10)
                        .wrapping_add((bytes[i] - b'0') as i32);
                    i += 1;
                }
                tokens.push(Token::make_int(value, loc));
                continue;
            }

            if c == b'"' {
                i += 1;
                let str_start = i;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                if i >= bytes.len() {
                    diags.error(loc.clone(), "unterminated string literal");
                    tokens.push(Token::new(TokenKind::Error, "", loc));
                    break;
                }
                tokens.push(Token::new(TokenKind::String, &text[str_start..i], loc));
                i += 1; // closing quote
                continue;
            }

            if c == b'\'' && bytes.get(i + 2) == Some(&b'\'') {
                tokens.push(Token::make_int(bytes[i + 1] as i32, loc));
                i += 3;
                continue;
            }

            if c == b'(' {
                expr_depth += 1;
                tokens.push(Token::new(TokenKind::LParen, "(", loc));
                i += 1;
                continue;
            }

            if c == b')' {
                expr_depth = expr_depth.saturating_sub(1);
                tokens.push(Token::new(TokenKind::RParen, ")", loc));
                i += 1;
                continue;
            }

            if c == b'{' {
                tokens.push(Token::new(TokenKind::LBrace, "{", loc));
                i += 1;
                continue;
            }

            if c == b'}' {
                tokens.push(Token::new(TokenKind::RBrace, "}", loc));
                i += 1;
                continue;
            }

            if !in_directive && expr_depth == 0 && BF_INSTRS.contains(&c) {
                tokens.push(Token::make_bf(c as char, loc));
                i += 1;
                continue;
            }

            if in_directive || expr_depth > 0 {
                if i + 1 < bytes.len()
                    && let Some(op) = DOUBLE_OPS
                        .iter()
                        .find(|op| op.as_bytes() == &bytes[i..i + 2])
                {
                    tokens.push(Token::new(TokenKind::Operator, *op, loc));
                    i += 2;
                    continue;
                }
                if SINGLE_OPS.contains(&c) {
                    tokens.push(Token::new(
                        TokenKind::Operator,
                        (c as char).to_string(),
                        loc,
                    ));
                    i += 1;
                    continue;
                }
            }

            diags.error(
                loc.clone(),
                format!("invalid character '{}'", c as char),
            );
            tokens.push(Token::new(TokenKind::Error, "", loc));
            break;
        }

        tokens.push(Token::new(
            TokenKind::EndOfLine,
            "",
            loc_at(bytes.len()),
        ));
    }

    /// Tokenise a detached string, e.g. synthesised built-in source. Each
    /// line of the string contributes its own `EndOfLine`.
    pub fn scan_string(
        &self,
        text: &str,
        filename: &str,
        diags: &mut ErrorReporter,
    ) -> Vec<Token> {
        let name: Arc<str> = Arc::from(filename);
        let mut tokens = Vec::new();
        let mut any = false;
        for (idx, line) in text.lines().enumerate() {
            any = true;
            self.scan_line(line, &name, idx as u32 + 1, &mut tokens, diags);
        }
        if !any {
            self.scan_line("", &name, 1, &mut tokens, diags);
        }
        tokens
    }
}
