//! Macro expansion: the built-in/user-macro decision, call argument
//! collection and body substitution.
//!
//! The decision table for an identifier: built-ins win over everything, then
//! user macros, then the identifier falls through to the statement parser.
//! A macro currently being expanded cannot be re-entered as itself; the
//! guard entry lives exactly as long as the macro's expansion frame.

use crate::builtins;
use crate::parser::Parser;
use crate::table::Macro;
use core_lexer::{Token, TokenKind};
use tracing::trace;

impl Parser {
    /// Try to expand the current token. On return the current token is the
    /// next token to process: the first token of a pushed expansion, or the
    /// token following a call that pushed nothing.
    pub(crate) fn try_expand(&mut self) -> bool {
        if self.current.kind != TokenKind::Identifier {
            return false;
        }

        let name = self.current.text.clone();

        if let Some(handler) = builtins::lookup(&name) {
            let tok = self.current.clone();
            trace!(target: "expand", builtin = %name, "expand_builtin");
            handler(self, &tok);
            return true;
        }

        let Some(mac) = self.table.lookup(&name).cloned() else {
            return false;
        };

        if self.expanding.contains(&name) {
            self.diags.error(
                self.current.loc.clone(),
                format!("macro '{name}' expands to itself"),
            );
            self.advance();
            return true;
        }

        let call_loc = self.current.loc.clone();
        let Some(args) = self.collect_args(&name, mac.params.len()) else {
            return true; // syntax error already reported
        };

        if args.len() != mac.params.len() {
            self.diags.error(
                call_loc,
                format!(
                    "macro '{name}' expects {} argument{}",
                    mac.params.len(),
                    if mac.params.len() == 1 { "" } else { "s" }
                ),
            );
            return true;
        }

        trace!(target: "expand", macro_name = %name, args = args.len(), "expand_macro");
        let expanded = substitute_body(&mac, &args);
        self.expanding.insert(name.clone());
        self.push_expansion(&name, expanded);
        true
    }

    /// Collect call arguments for a name expecting `arity` parameters. The
    /// name is consumed; for `arity == 0` no parentheses are expected.
    /// Arguments are separated by top-level commas; nested parentheses of
    /// any depth are balanced inside an argument. Reaching end of line or
    /// input mid-list is an error. On error the rest of the line is consumed
    /// and `None` is returned.
    pub(crate) fn collect_args(&mut self, name: &str, arity: usize) -> Option<Vec<Vec<Token>>> {
        if arity == 0 {
            self.advance(); // just the name, no argument list
            return Some(Vec::new());
        }

        self.advance(); // name

        if self.current.kind != TokenKind::LParen {
            self.diags.error(
                self.current.loc.clone(),
                format!("expected '(' after macro name '{name}'"),
            );
            self.skip_to_end_of_line();
            return None;
        }
        self.advance();

        if self.current.kind == TokenKind::RParen {
            self.advance();
            return Some(Vec::new()); // `()`: empty list, caller checks arity
        }

        let mut args = Vec::with_capacity(arity);
        for i in 0..arity {
            let mut arg_tokens = Vec::new();
            let mut paren_depth = 0usize;

            loop {
                if self.current.is_end() {
                    self.diags.error(
                        self.current.loc.clone(),
                        format!("unterminated macro argument list for '{name}'"),
                    );
                    self.skip_to_end_of_line();
                    return None;
                }

                if paren_depth == 0
                    && (self.current.is_comma() || self.current.kind == TokenKind::RParen)
                {
                    break;
                }

                match self.current.kind {
                    TokenKind::LParen => paren_depth += 1,
                    TokenKind::RParen => paren_depth -= 1,
                    _ => {}
                }

                arg_tokens.push(self.current.clone());
                self.advance();
            }

            args.push(arg_tokens);

            if i + 1 == arity {
                break;
            }

            if !self.current.is_comma() {
                self.diags.error(
                    self.current.loc.clone(),
                    "expected ',' in macro argument list",
                );
                self.skip_to_end_of_line();
                return None;
            }
            self.advance();
        }

        if self.current.kind != TokenKind::RParen {
            self.diags.error(
                self.current.loc.clone(),
                format!(
                    "expected ')' at end of macro call, found '{}'",
                    self.current.text
                ),
            );
            self.skip_to_end_of_line();
            return None;
        }
        self.advance();
        Some(args)
    }

    /// Built-in arguments, expression flavour: each argument is evaluated
    /// with undefined identifiers treated as errors.
    pub(crate) fn parse_expr_args(&mut self, tok: &Token, count: usize) -> Option<Vec<i32>> {
        let args = self.collect_args(&tok.text, count)?;
        if args.len() != count {
            self.diags.error(
                tok.loc.clone(),
                format!(
                    "macro '{}' expects {count} argument{}",
                    tok.text,
                    if count == 1 { "" } else { "s" }
                ),
            );
            return None;
        }
        let values = args
            .iter()
            .map(|arg| self.eval_tokens(arg, /*undefined_as_zero=*/ false))
            .collect();
        Some(values)
    }

    /// Built-in arguments, identifier flavour: exactly one bare identifier.
    pub(crate) fn parse_ident_arg(&mut self, tok: &Token) -> Option<String> {
        let args = self.collect_args(&tok.text, 1)?;
        match args.as_slice() {
            [arg] if arg.len() == 1 && arg[0].kind == TokenKind::Identifier => {
                Some(arg[0].text.clone())
            }
            _ => {
                self.diags.error(
                    tok.loc.clone(),
                    format!("macro '{}' expects one identifier", tok.text),
                );
                None
            }
        }
    }

    /// Built-in arguments, string flavour: exactly one string literal. The
    /// scanner has already removed the quotes.
    pub(crate) fn parse_string_arg(&mut self, tok: &Token) -> Option<String> {
        let args = self.collect_args(&tok.text, 1)?;
        match args.as_slice() {
            [arg] if arg.len() == 1 && arg[0].kind == TokenKind::String => {
                Some(arg[0].text.clone())
            }
            _ => {
                self.diags.error(
                    tok.loc.clone(),
                    format!("macro '{}' expects one string", tok.text),
                );
                None
            }
        }
    }
}

/// Walk the body; body tokens spelling a parameter name are replaced by a
/// splice of the corresponding argument's tokens, everything else is copied
/// verbatim.
pub(crate) fn substitute_body(mac: &Macro, args: &[Vec<Token>]) -> Vec<Token> {
    let mut result = Vec::with_capacity(mac.body.len());
    for tok in &mac.body {
        if tok.kind == TokenKind::Identifier
            && let Some(i) = mac.params.iter().position(|p| *p == tok.text)
        {
            result.extend(args[i].iter().cloned());
            continue;
        }
        result.push(tok.clone());
    }
    result
}
