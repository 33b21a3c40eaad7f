//! The parser driver: the main token loop, directive dispatch, BF statement
//! handling, loop and brace scopes, and the expansion stack.
//!
//! The parser always consumes from the topmost expansion frame, falling
//! through to the lexer when all frames are exhausted, so macro expansion is
//! strictly left-to-right and innermost-first in the emitted stream. Pushing
//! a frame re-queues the token the parser had already loaded, which keeps
//! the call site's continuation intact.

use crate::builtins;
use crate::expr::{self, ExprContext};
use crate::table::{Macro, MacroTable};
use core_diag::{ErrorReporter, SourceLocation};
use core_lexer::{Lexer, Token, TokenKind, TokenScanner};
use core_tape::BfOutput;
use std::collections::HashSet;
use tracing::{debug, trace};

pub(crate) struct ExpansionFrame {
    pub name: String,
    pub tokens: Vec<Token>,
    pub index: usize,
}

struct LoopFrame {
    loc: SourceLocation,
    tape_ptr_at_start: i32,
}

struct BraceFrame {
    loc: SourceLocation,
    tape_ptr_at_start: i32,
}

struct IfState {
    branch_taken: bool,
    in_else: bool,
    loc: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StructKind {
    If,
    Else,
    While,
    Repeat,
}

/// One open `if`/`while`/`repeat` built-in construct.
pub(crate) struct StructLevel {
    pub kind: StructKind,
    pub loc: SourceLocation,
    pub temp_if: String,
    pub temp_else: String,
    pub cond: i32,
}

pub struct Parser {
    lexer: Lexer,
    scanner: TokenScanner,
    pub(crate) diags: ErrorReporter,
    pub(crate) table: MacroTable,
    pub(crate) output: BfOutput,
    expansion_stack: Vec<ExpansionFrame>,
    loop_stack: Vec<LoopFrame>,
    brace_stack: Vec<BraceFrame>,
    if_stack: Vec<IfState>,
    pub(crate) expanding: HashSet<String>,
    pub(crate) struct_stack: Vec<StructLevel>,
    temp_counter: u32,
    pub(crate) current: Token,
}

/// Directive keywords, built-in names and address helpers may not be defined
/// or undefined as macros.
pub fn is_reserved_keyword(name: &str) -> bool {
    matches!(
        name,
        "if" | "else" | "endif" | "elsif" | "include" | "define" | "undef" | "end"
    ) || builtins::is_builtin_name(name)
        || expr::is_function_name(name)
}

impl Parser {
    pub fn new(lexer: Lexer, diags: ErrorReporter) -> Self {
        Self {
            lexer,
            scanner: TokenScanner::new(),
            diags,
            table: MacroTable::new(),
            output: BfOutput::new(),
            expansion_stack: Vec::new(),
            loop_stack: Vec::new(),
            brace_stack: Vec::new(),
            if_stack: Vec::new(),
            expanding: HashSet::new(),
            struct_stack: Vec::new(),
            temp_counter: 0,
            current: Token::end_of_input(),
        }
    }

    pub fn lexer_mut(&mut self) -> &mut Lexer {
        &mut self.lexer
    }

    pub fn diags(&self) -> &ErrorReporter {
        &self.diags
    }

    pub fn table_mut(&mut self) -> &mut MacroTable {
        &mut self.table
    }

    pub fn table_and_diags_mut(&mut self) -> (&mut MacroTable, &mut ErrorReporter) {
        (&mut self.table, &mut self.diags)
    }

    pub fn diags_mut(&mut self) -> &mut ErrorReporter {
        &mut self.diags
    }

    pub fn output(&self) -> &BfOutput {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut BfOutput {
        &mut self.output
    }

    /// Run the whole pipeline. Returns the rendered Brainfuck on success and
    /// `None` when any error was reported.
    pub fn run(&mut self) -> Option<String> {
        self.advance();
        if !self.parse() {
            return None;
        }
        self.output.optimize_tape_movements();
        Some(self.output.render())
    }

    fn parse(&mut self) -> bool {
        loop {
            match self.current.kind {
                TokenKind::EndOfInput => break,
                TokenKind::EndOfLine => self.advance(),
                TokenKind::Error => return false,
                TokenKind::Directive => self.parse_directive(),
                _ => self.parse_statements(),
            }
        }

        self.output.check_loops(&mut self.diags);
        self.check_struct_stack();

        let open_ifs: Vec<_> = self.if_stack.iter().map(|s| s.loc.clone()).collect();
        for loc in open_ifs {
            self.diags.error(loc, "unterminated #if (missing #endif)");
        }
        let open_braces: Vec<_> = self.brace_stack.iter().map(|b| b.loc.clone()).collect();
        for loc in open_braces {
            self.diags.error(loc, "unmatched '{'");
        }

        !self.diags.has_errors()
    }

    fn check_struct_stack(&mut self) {
        let open: Vec<_> = self
            .struct_stack
            .iter()
            .map(|level| (level.kind, level.loc.clone()))
            .collect();
        for (kind, loc) in open {
            let message = match kind {
                StructKind::If => "if without matching endif",
                StructKind::Else => "else without matching endif",
                StructKind::While => "while without matching endwhile",
                StructKind::Repeat => "repeat without matching endrepeat",
            };
            self.diags.error(loc, message);
        }
    }

    // ---- token flow ----

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn advance(&mut self) {
        // Pop exhausted frames, releasing their recursion-guard entries.
        while let Some(frame) = self.expansion_stack.last() {
            if frame.index < frame.tokens.len() {
                break;
            }
            let frame = self.expansion_stack.pop().expect("frame just observed");
            if !frame.name.is_empty() {
                self.expanding.remove(&frame.name);
            }
        }

        if let Some(frame) = self.expansion_stack.last_mut() {
            self.current = frame.tokens[frame.index].clone();
            frame.index += 1;
            return;
        }

        self.current = self.lexer.get(&mut self.diags);
    }

    pub fn peek(&mut self, offset: usize) -> Token {
        let mut remaining = offset;
        for frame in self.expansion_stack.iter().rev() {
            let available = frame.tokens.len().saturating_sub(frame.index);
            if remaining < available {
                return frame.tokens[frame.index + remaining].clone();
            }
            remaining -= available;
        }
        self.lexer.peek(remaining, &mut self.diags)
    }

    /// Push a token list as an expansion frame. The parser's pending current
    /// token is re-queued beneath the frame, and the first frame token is
    /// loaded as the new current token.
    pub(crate) fn push_expansion(&mut self, name: &str, tokens: Vec<Token>) {
        trace!(
            target: "expand",
            frame = name,
            len = tokens.len(),
            depth = self.expansion_stack.len() + 1,
            "push_expansion"
        );
        let pending = std::mem::replace(&mut self.current, Token::end_of_input());
        self.expansion_stack.push(ExpansionFrame {
            name: String::new(),
            tokens: vec![pending],
            index: 0,
        });
        self.expansion_stack.push(ExpansionFrame {
            name: name.to_string(),
            tokens,
            index: 0,
        });
        self.advance();
    }

    /// Scan synthesised preprocessor source under a pseudo-filename and push
    /// it as an expansion frame. This is how every built-in emits its code.
    pub(crate) fn expand_source(&mut self, pseudo_filename: &str, source: &str) {
        let tokens = self
            .scanner
            .scan_string(source, pseudo_filename, &mut self.diags);
        self.push_expansion(pseudo_filename, tokens);
    }

    pub(crate) fn make_temp_name(&mut self, suffix: &str) -> String {
        self.temp_counter += 1;
        format!("_T{}_{}", self.temp_counter, suffix)
    }

    /// Evaluate a detached token list as a constant expression.
    pub(crate) fn eval_tokens(&mut self, tokens: &[Token], undefined_as_zero: bool) -> i32 {
        let mut ctx = ExprContext {
            table: &self.table,
            tape: &self.output,
            diags: &mut self.diags,
            undefined_as_zero,
        };
        expr::eval(tokens, &mut ctx)
    }

    pub(crate) fn skip_to_end_of_line(&mut self) {
        while !self.current.is_end() {
            self.advance();
        }
    }

    fn collect_to_end_of_line(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while !self.current.is_end() {
            tokens.push(self.current.clone());
            self.advance();
        }
        tokens
    }

    // ---- directives ----

    fn parse_directive(&mut self) {
        let directive = self.current.clone();
        self.advance();

        match directive.text.as_str() {
            "#include" => {
                self.parse_include();
                self.expect_line_end(&directive);
            }
            "#define" => {
                self.parse_define();
                self.expect_line_end(&directive);
            }
            "#undef" => {
                self.parse_undef();
                self.expect_line_end(&directive);
            }
            "#if" => self.parse_if(&directive),
            "#elsif" => self.parse_elsif(&directive),
            "#else" => self.parse_else(&directive),
            "#endif" => {
                self.parse_endif(&directive);
                self.expect_line_end(&directive);
            }
            "#end" => {
                self.diags
                    .error(directive.loc.clone(), "#end without matching #define");
                self.skip_to_end_of_line();
            }
            _ => {
                self.diags.error(
                    directive.loc.clone(),
                    format!("unknown directive: '{}'", directive.text),
                );
                self.skip_to_end_of_line();
            }
        }
    }

    fn expect_line_end(&mut self, directive: &Token) {
        if !self.current.is_end() {
            self.diags.error(
                self.current.loc.clone(),
                format!(
                    "unexpected token after {}: '{}'",
                    directive.text, self.current.text
                ),
            );
            self.skip_to_end_of_line();
        }
    }

    fn parse_include(&mut self) {
        if self.current.kind != TokenKind::String {
            self.diags.error(
                self.current.loc.clone(),
                "expected string literal after #include",
            );
            self.skip_to_end_of_line();
            return;
        }

        let filename = self.current.text.clone();
        let loc = self.current.loc.clone();
        self.advance();

        debug!(target: "parser", file = %filename, "include");
        if let Err(err) = self.lexer.files_mut().push_file(&filename) {
            self.diags.error(loc, err.to_string());
        }
    }

    fn parse_define(&mut self) {
        if self.current.kind != TokenKind::Identifier {
            self.diags
                .error(self.current.loc.clone(), "expected macro name");
            self.skip_to_end_of_line();
            return;
        }

        let name = self.current.text.clone();
        let name_loc = self.current.loc.clone();
        self.advance();

        if is_reserved_keyword(&name) {
            self.diags.error(
                name_loc,
                format!("cannot define macro '{name}': reserved name"),
            );
            self.skip_to_end_of_line();
            return;
        }

        let mut params = Vec::new();
        let body;

        if self.current.kind == TokenKind::LParen {
            // function-like: parameter list, then body until #end
            self.advance();
            if self.current.kind != TokenKind::RParen {
                loop {
                    if self.current.kind != TokenKind::Identifier {
                        self.diags
                            .error(self.current.loc.clone(), "expected parameter name");
                        self.skip_to_end_of_line();
                        return;
                    }
                    params.push(self.current.text.clone());
                    self.advance();

                    if self.current.kind == TokenKind::RParen {
                        break;
                    }
                    if !self.current.is_comma() {
                        self.diags
                            .error(self.current.loc.clone(), "expected ',' or ')'");
                        self.skip_to_end_of_line();
                        return;
                    }
                    self.advance();
                }
            }
            self.advance(); // ')'

            body = match self.collect_body_until_end(&name, &name_loc) {
                Some(body) => body,
                None => return,
            };
        } else if self.current.loc.line == name_loc.line
            && self.current.loc.filename == name_loc.filename
            && !matches!(self.current.kind, TokenKind::EndOfInput)
            && self.current.kind != TokenKind::EndOfLine
        {
            // single-line object-like: rest of the defining line
            let mut tokens = Vec::new();
            while !self.current.is_end() {
                tokens.push(self.current.clone());
                self.advance();
            }
            body = tokens;
        } else {
            // multi-line object-like: body runs to #end
            body = match self.collect_body_until_end(&name, &name_loc) {
                Some(body) => body,
                None => return,
            };
        }

        for i in 0..params.len() {
            for j in i + 1..params.len() {
                if params[i] == params[j] {
                    self.diags.error(
                        name_loc.clone(),
                        format!("duplicate parameter name '{}' in macro '{name}'", params[i]),
                    );
                    return;
                }
            }
        }

        if body.iter().any(|t| t.kind == TokenKind::Directive) {
            self.diags.error(
                name_loc,
                format!("macro '{name}' contains a directive, which is not allowed"),
            );
            return;
        }

        debug!(target: "parser", macro_name = %name, params = params.len(), body = body.len(), "define");
        self.table.define(
            Macro {
                name,
                params,
                body,
                loc: name_loc,
            },
            &mut self.diags,
        );
    }

    /// Capture body tokens up to a terminating `#end`, which is consumed.
    fn collect_body_until_end(
        &mut self,
        name: &str,
        name_loc: &SourceLocation,
    ) -> Option<Vec<Token>> {
        let mut body = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::EndOfInput => {
                    self.diags.error(
                        name_loc.clone(),
                        format!("unterminated macro '{name}': missing #end"),
                    );
                    return None;
                }
                TokenKind::Directive if self.current.text == "#end" => {
                    self.advance();
                    // strip a trailing end-of-line so expansion does not end
                    // a statement line prematurely
                    while body.last().is_some_and(|t: &Token| t.kind == TokenKind::EndOfLine) {
                        body.pop();
                    }
                    return Some(body);
                }
                _ => {
                    body.push(self.current.clone());
                    self.advance();
                }
            }
        }
    }

    fn parse_undef(&mut self) {
        if self.current.kind != TokenKind::Identifier {
            self.diags
                .error(self.current.loc.clone(), "expected macro name");
            return;
        }
        let name = self.current.text.clone();
        if is_reserved_keyword(&name) {
            self.diags.error(
                self.current.loc.clone(),
                format!("cannot undefine reserved name '{name}'"),
            );
            self.advance();
            return;
        }
        self.table.undef(&name);
        self.advance();
    }

    fn parse_if(&mut self, directive: &Token) {
        let cond_tokens = self.collect_to_end_of_line();
        let value = self.eval_tokens(&cond_tokens, /*undefined_as_zero=*/ true);
        let taken = value != 0;

        self.if_stack.push(IfState {
            branch_taken: taken,
            in_else: false,
            loc: directive.loc.clone(),
        });

        if !taken {
            self.skip_until_else_or_endif();
        }
    }

    fn parse_elsif(&mut self, directive: &Token) {
        let Some((in_else, branch_taken)) =
            self.if_stack.last().map(|s| (s.in_else, s.branch_taken))
        else {
            self.diags
                .error(directive.loc.clone(), "#elsif without matching #if");
            self.skip_to_end_of_line();
            return;
        };

        if in_else {
            self.diags
                .error(directive.loc.clone(), "#elsif after #else");
            self.skip_to_end_of_line();
            return;
        }

        if branch_taken {
            // a previous branch already ran; skip this one without evaluating
            self.skip_until_else_or_endif();
            return;
        }

        let cond_tokens = self.collect_to_end_of_line();
        let value = self.eval_tokens(&cond_tokens, true);
        if value != 0 {
            if let Some(top) = self.if_stack.last_mut() {
                top.branch_taken = true;
            }
        } else {
            self.skip_until_else_or_endif();
        }
    }

    fn parse_else(&mut self, directive: &Token) {
        let Some(top) = self.if_stack.last_mut() else {
            self.diags
                .error(directive.loc.clone(), "#else without matching #if");
            return;
        };

        if top.in_else {
            self.diags
                .error(directive.loc.clone(), "multiple #else in the same #if");
            return;
        }
        top.in_else = true;

        let already_taken = top.branch_taken;
        top.branch_taken = true;
        if already_taken {
            self.skip_until_endif();
        }
    }

    fn parse_endif(&mut self, directive: &Token) {
        if self.if_stack.pop().is_none() {
            self.diags
                .error(directive.loc.clone(), "#endif without matching #if");
        }
    }

    /// Skip a false branch. Tokens are not expanded; only directives matter,
    /// and nested `#if` blocks are counted so their branch directives are
    /// ignored. Stops with the terminating directive as the current token.
    fn skip_until_else_or_endif(&mut self) {
        self.skip_branch(true);
    }

    fn skip_until_endif(&mut self) {
        self.skip_branch(false);
    }

    fn skip_branch(&mut self, stop_at_else: bool) {
        let mut depth = 0usize;
        loop {
            self.advance();
            match self.current.kind {
                TokenKind::EndOfInput => return,
                TokenKind::Directive => {}
                _ => continue,
            }
            match self.current.text.as_str() {
                "#if" => depth += 1,
                "#endif" => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                "#else" | "#elsif" if stop_at_else && depth == 0 => return,
                _ => {}
            }
        }
    }

    // ---- statements ----

    fn parse_statements(&mut self) {
        while !matches!(
            self.current.kind,
            TokenKind::EndOfLine | TokenKind::EndOfInput | TokenKind::Error
        ) {
            self.parse_statement();
        }
    }

    fn parse_statement(&mut self) {
        // Expand macros until the current token is not an expandable name.
        while self.try_expand() {}

        match self.current.kind {
            TokenKind::BFInstr => self.parse_bfinstr(),
            TokenKind::LBrace => self.parse_left_brace(),
            TokenKind::RBrace => self.parse_right_brace(),
            TokenKind::Identifier => {
                self.diags.error(
                    self.current.loc.clone(),
                    format!("unknown identifier '{}'", self.current.text),
                );
                self.advance();
            }
            TokenKind::EndOfLine | TokenKind::EndOfInput | TokenKind::Error => {}
            _ => {
                self.diags.error(
                    self.current.loc.clone(),
                    format!("unexpected token in statement: '{}'", self.current.text),
                );
                self.advance();
            }
        }
    }

    fn parse_bfinstr(&mut self) {
        let tok = self.current.clone();
        self.advance();

        match tok.text.as_str() {
            "+" | "-" => self.parse_bf_plus_minus(&tok),
            "<" | ">" => self.parse_bf_left_right(&tok),
            "[" => self.parse_bf_loop_start(&tok),
            "]" => self.parse_bf_loop_end(&tok),
            "." | "," => self.emit_count(&tok, 1),
            _ => self.diags.error(
                tok.loc.clone(),
                format!("invalid Brainfuck instruction: '{}'", tok.text),
            ),
        }
    }

    /// `+`/`-` with an optional repeat count; a negative count inverts the
    /// opcode.
    fn parse_bf_plus_minus(&mut self, tok: &Token) {
        let count = self.parse_bf_int_arg().unwrap_or(1);
        self.emit_count(tok, count);
    }

    /// `<`/`>` with an optional *target position* argument: emits whatever
    /// run reaches the target from the current pointer.
    fn parse_bf_left_right(&mut self, tok: &Token) {
        let count = match self.parse_bf_int_arg() {
            Some(pos) => {
                if tok.text == ">" {
                    pos - self.output.tape_ptr()
                } else {
                    self.output.tape_ptr() - pos
                }
            }
            None => 1,
        };
        self.emit_count(tok, count);
    }

    fn parse_bf_loop_start(&mut self, tok: &Token) {
        let mut pos = self.output.tape_ptr();
        if let Some(target) = self.parse_bf_int_arg() {
            self.emit_count(&Token::make_bf('>', tok.loc.clone()), target - pos);
            pos = target;
        }
        self.loop_stack.push(LoopFrame {
            loc: tok.loc.clone(),
            tape_ptr_at_start: pos,
        });
        self.emit_count(tok, 1);
    }

    fn parse_bf_loop_end(&mut self, tok: &Token) {
        let Some(frame) = self.loop_stack.pop() else {
            self.diags
                .error(tok.loc.clone(), "unmatched ']' instruction");
            return;
        };
        if frame.tape_ptr_at_start != self.output.tape_ptr() {
            self.diags.error(
                tok.loc.clone(),
                format!(
                    "tape pointer mismatch at ']' instruction (expected {}, got {})",
                    frame.tape_ptr_at_start,
                    self.output.tape_ptr()
                ),
            );
            self.diags
                .note(frame.loc.clone(), "corresponding '[' instruction here");
        }
        self.emit_count(tok, 1);
    }

    /// `{` checkpoints the tape pointer; nothing is emitted.
    fn parse_left_brace(&mut self) {
        self.brace_stack.push(BraceFrame {
            loc: self.current.loc.clone(),
            tape_ptr_at_start: self.output.tape_ptr(),
        });
        self.advance();
    }

    /// `}` walks the pointer back to the position checkpointed at `{`.
    fn parse_right_brace(&mut self) {
        let tok = self.current.clone();
        let Some(frame) = self.brace_stack.pop() else {
            self.diags.error(tok.loc.clone(), "unmatched '}'");
            self.advance();
            return;
        };
        let delta = frame.tape_ptr_at_start - self.output.tape_ptr();
        self.emit_count(&Token::make_bf('>', tok.loc.clone()), delta);
        self.advance();
    }

    pub(crate) fn emit_count(&mut self, tok: &Token, count: i32) {
        let mut op = tok.text.chars().next().unwrap_or('+');
        if count < 0 {
            op = match op {
                '<' => '>',
                '>' => '<',
                '+' => '-',
                '-' => '+',
                other => {
                    self.diags.error(
                        tok.loc.clone(),
                        format!("cannot invert Brainfuck instruction: '{other}'"),
                    );
                    return;
                }
            };
        }
        for _ in 0..count.unsigned_abs() {
            self.output
                .put(Token::make_bf(op, tok.loc.clone()), &mut self.diags);
        }
    }

    /// Optional integer argument after a BF instruction: a literal, an
    /// identifier evaluated as an expression, or a parenthesised expression.
    fn parse_bf_int_arg(&mut self) -> Option<i32> {
        match self.current.kind {
            TokenKind::Integer => {
                let value = self.current.int_value;
                self.advance();
                Some(value)
            }
            TokenKind::Identifier => {
                let tokens = vec![self.current.clone()];
                let value = self.eval_tokens(&tokens, false);
                self.advance();
                Some(value)
            }
            TokenKind::LParen => {
                let tokens = self.collect_paren_expression();
                Some(self.eval_tokens(&tokens, false))
            }
            _ => None,
        }
    }

    /// Collect a parenthesised expression and whatever continues it. After
    /// the initial group, operator tokens may follow (they were scanned
    /// inside a macro call's parentheses), each introducing another operand;
    /// anything else ends the expression.
    fn collect_paren_expression(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.collect_group(&mut tokens);

        loop {
            if self.current.kind != TokenKind::Operator {
                break;
            }
            // binary operator, then any run of unary operators
            while self.current.kind == TokenKind::Operator {
                tokens.push(self.current.clone());
                self.advance();
            }
            match self.current.kind {
                TokenKind::Integer => {
                    tokens.push(self.current.clone());
                    self.advance();
                }
                TokenKind::Identifier => {
                    let callable = expr::is_function_name(&self.current.text)
                        || self.current.text == "defined";
                    tokens.push(self.current.clone());
                    self.advance();
                    if callable && self.current.kind == TokenKind::LParen {
                        self.collect_group(&mut tokens);
                    }
                }
                TokenKind::LParen => self.collect_group(&mut tokens),
                _ => break, // malformed; evaluation reports it
            }
        }
        tokens
    }

    /// Collect one `( … )` group including the delimiters, balancing nested
    /// parens.
    fn collect_group(&mut self, tokens: &mut Vec<Token>) {
        tokens.push(self.current.clone());
        let mut depth = 1usize;
        self.advance();
        while depth > 0 {
            if self.current.is_end() {
                self.diags
                    .error(self.current.loc.clone(), "expected ')'");
                return;
            }
            match self.current.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            tokens.push(self.current.clone());
            self.advance();
        }
    }
}
