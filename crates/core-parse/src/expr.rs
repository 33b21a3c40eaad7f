//! Constant-expression evaluation over captured token slices.
//!
//! A recursive-descent evaluator with C precedence, 32-bit signed
//! wrap-around semantics, serving both `#if`/`#elsif` conditions (undefined
//! identifiers read as 0) and built-in argument lists (undefined identifiers
//! are errors). Identifiers resolve through the macro table: an object-like
//! macro's body is itself evaluated as an expression, guarded against
//! circular references. The address helpers `global`, `temp`, `arg`, `local`
//! and `local_temp` appear as function calls and read the tape model.

use crate::table::MacroTable;
use core_diag::ErrorReporter;
use core_lexer::{Token, TokenKind};
use core_tape::BfOutput;
use std::collections::HashSet;

const FUNCTION_NAMES: &[&str] = &["global", "temp", "arg", "local", "local_temp"];

pub fn is_function_name(name: &str) -> bool {
    FUNCTION_NAMES.contains(&name)
}

/// Everything an evaluation needs besides the tokens themselves.
pub struct ExprContext<'a> {
    pub table: &'a MacroTable,
    pub tape: &'a BfOutput,
    pub diags: &'a mut ErrorReporter,
    /// `#if` mode treats undefined identifiers as 0; built-in argument mode
    /// reports them.
    pub undefined_as_zero: bool,
}

/// Evaluate a token slice as a complete expression.
pub fn eval(tokens: &[Token], ctx: &mut ExprContext<'_>) -> i32 {
    let mut guard = HashSet::new();
    Eval::new(tokens, ctx, &mut guard).parse_expression()
}

struct Eval<'t, 'c, 'x> {
    tokens: &'t [Token],
    pos: usize,
    ctx: &'c mut ExprContext<'x>,
    guard: &'c mut HashSet<String>,
    eoi: Token,
}

impl<'t, 'c, 'x> Eval<'t, 'c, 'x> {
    fn new(
        tokens: &'t [Token],
        ctx: &'c mut ExprContext<'x>,
        guard: &'c mut HashSet<String>,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            ctx,
            guard,
            eoi: Token::end_of_input(),
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eoi)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Current token's spelling when it is an operator, else `""`.
    fn op(&self) -> &str {
        let tok = self.current();
        if tok.kind == TokenKind::Operator {
            &tok.text
        } else {
            ""
        }
    }

    fn parse_expression(&mut self) -> i32 {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> i32 {
        let mut left = self.parse_logical_and();
        while self.op() == "||" {
            self.advance();
            let right = self.parse_logical_and();
            left = i32::from(left != 0 || right != 0);
        }
        left
    }

    fn parse_logical_and(&mut self) -> i32 {
        let mut left = self.parse_bitwise_or();
        while self.op() == "&&" {
            self.advance();
            let right = self.parse_bitwise_or();
            left = i32::from(left != 0 && right != 0);
        }
        left
    }

    fn parse_bitwise_or(&mut self) -> i32 {
        let mut left = self.parse_bitwise_xor();
        while self.op() == "|" {
            self.advance();
            left |= self.parse_bitwise_xor();
        }
        left
    }

    fn parse_bitwise_xor(&mut self) -> i32 {
        let mut left = self.parse_bitwise_and();
        while self.op() == "^" {
            self.advance();
            left ^= self.parse_bitwise_and();
        }
        left
    }

    fn parse_bitwise_and(&mut self) -> i32 {
        let mut left = self.parse_equality();
        while self.op() == "&" {
            self.advance();
            left &= self.parse_equality();
        }
        left
    }

    fn parse_equality(&mut self) -> i32 {
        let mut left = self.parse_relational();
        loop {
            let op = self.op();
            if op != "==" && op != "!=" {
                break;
            }
            let eq = op == "==";
            self.advance();
            let right = self.parse_relational();
            left = i32::from(if eq { left == right } else { left != right });
        }
        left
    }

    fn parse_relational(&mut self) -> i32 {
        let mut left = self.parse_shift();
        loop {
            let op = match self.op() {
                op @ ("<" | "<=" | ">" | ">=") => op.to_string(),
                _ => break,
            };
            self.advance();
            let right = self.parse_shift();
            left = i32::from(match op.as_str() {
                "<" => left < right,
                "<=" => left <= right,
                ">" => left > right,
                _ => left >= right,
            });
        }
        left
    }

    fn parse_shift(&mut self) -> i32 {
        let mut left = self.parse_additive();
        loop {
            let op = match self.op() {
                op @ ("<<" | ">>") => op.to_string(),
                _ => break,
            };
            self.advance();
            let right = self.parse_additive();
            if right < 0 {
                self.ctx
                    .diags
                    .error(self.current().loc.clone(), "negative shift count");
                continue;
            }
            left = if op == "<<" {
                left.wrapping_shl(right as u32)
            } else {
                left.wrapping_shr(right as u32)
            };
        }
        left
    }

    fn parse_additive(&mut self) -> i32 {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.op() {
                op @ ("+" | "-") => op.to_string(),
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative();
            left = if op == "+" {
                left.wrapping_add(right)
            } else {
                left.wrapping_sub(right)
            };
        }
        left
    }

    fn parse_multiplicative(&mut self) -> i32 {
        let mut left = self.parse_unary();
        loop {
            let op = match self.op() {
                op @ ("*" | "/" | "%") => op.to_string(),
                _ => break,
            };
            self.advance();
            let right = self.parse_unary();
            left = match op.as_str() {
                "*" => left.wrapping_mul(right),
                "/" => {
                    if right == 0 {
                        self.ctx
                            .diags
                            .error(self.current().loc.clone(), "division by zero");
                        0
                    } else {
                        left.wrapping_div(right)
                    }
                }
                _ => {
                    if right == 0 {
                        self.ctx
                            .diags
                            .error(self.current().loc.clone(), "modulo by zero");
                        0
                    } else {
                        left.wrapping_rem(right)
                    }
                }
            };
        }
        left
    }

    fn parse_unary(&mut self) -> i32 {
        let tok = self.current().clone();

        if tok.kind == TokenKind::Identifier && tok.text == "defined" {
            return self.parse_defined();
        }

        if tok.kind == TokenKind::Operator {
            match tok.text.as_str() {
                "!" => {
                    self.advance();
                    return i32::from(self.parse_unary() == 0);
                }
                "+" => {
                    self.advance();
                    return self.parse_unary();
                }
                "-" => {
                    self.advance();
                    return self.parse_unary().wrapping_neg();
                }
                "~" => {
                    self.advance();
                    return !self.parse_unary();
                }
                _ => {}
            }
        }

        self.parse_primary()
    }

    fn parse_defined(&mut self) -> i32 {
        self.advance(); // 'defined'

        let paren = self.current().kind == TokenKind::LParen;
        if paren {
            self.advance();
        }

        if self.current().kind != TokenKind::Identifier {
            self.ctx.diags.error(
                self.current().loc.clone(),
                "expected identifier after defined",
            );
            return 0;
        }
        let is_def = self.ctx.table.lookup(&self.current().text).is_some();
        self.advance();

        if paren {
            if self.current().kind != TokenKind::RParen {
                self.ctx
                    .diags
                    .error(self.current().loc.clone(), "expected ')'");
            } else {
                self.advance();
            }
        }

        i32::from(is_def)
    }

    fn parse_primary(&mut self) -> i32 {
        let tok = self.current().clone();

        match tok.kind {
            TokenKind::Integer => {
                self.advance();
                tok.int_value
            }
            TokenKind::Identifier if is_function_name(&tok.text) => self.parse_address_call(tok),
            TokenKind::Identifier => {
                let value = self.value_of_identifier(&tok);
                self.advance();
                value
            }
            TokenKind::LParen => {
                self.advance();
                let value = self.parse_expression();
                if self.current().kind != TokenKind::RParen {
                    self.ctx
                        .diags
                        .error(self.current().loc.clone(), "expected ')'");
                } else {
                    self.advance();
                }
                value
            }
            _ => {
                self.ctx
                    .diags
                    .error(tok.loc.clone(), "unexpected token in expression");
                self.advance();
                0
            }
        }
    }

    fn parse_address_call(&mut self, func_tok: Token) -> i32 {
        self.advance(); // function name

        if self.current().kind != TokenKind::LParen {
            self.ctx.diags.error(
                self.current().loc.clone(),
                format!("expected '(' after function name '{}'", func_tok.text),
            );
            return 0;
        }
        self.advance();
        let arg = self.parse_expression();
        if self.current().kind != TokenKind::RParen {
            self.ctx
                .diags
                .error(self.current().loc.clone(), "expected ')'");
        } else {
            self.advance();
        }

        match func_tok.text.as_str() {
            "global" => self.ctx.tape.global_address(&func_tok, arg, self.ctx.diags),
            "temp" => self.ctx.tape.temp_address(&func_tok, arg, self.ctx.diags),
            "arg" => self.ctx.tape.frame_arg_address(&func_tok, arg, self.ctx.diags),
            "local" => self
                .ctx
                .tape
                .frame_local_address(&func_tok, arg, self.ctx.diags),
            _ => self
                .ctx
                .tape
                .frame_temp_address(&func_tok, arg, self.ctx.diags),
        }
    }

    fn value_of_identifier(&mut self, tok: &Token) -> i32 {
        let name = &tok.text;
        let mac = match self.ctx.table.lookup(name) {
            Some(mac) => mac.clone(),
            None => {
                if self.ctx.undefined_as_zero {
                    return 0;
                }
                self.ctx
                    .diags
                    .error(tok.loc.clone(), format!("macro '{name}' is not defined"));
                return 0;
            }
        };

        if !mac.params.is_empty() {
            self.ctx.diags.error(
                tok.loc.clone(),
                format!("macro '{name}' is not an object-like macro"),
            );
            self.ctx
                .diags
                .note(mac.loc.clone(), format!("macro '{name}' defined here"));
            return 0;
        }

        if self.guard.contains(name) {
            self.ctx.diags.error(
                mac.loc.clone(),
                "circular macro expansion in expression",
            );
            return 0;
        }

        self.guard.insert(name.clone());
        let value = Eval::new(&mac.body, &mut *self.ctx, &mut *self.guard).parse_expression();
        self.guard.remove(&tok.text);
        value
    }
}
