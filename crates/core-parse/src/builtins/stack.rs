//! Stack built-ins: every push reserves a two-cell slot below the stack
//! pointer regardless of width, so pushes and pops pair up byte- and
//! word-sized values freely.

use crate::parser::Parser;
use core_lexer::Token;

pub(super) fn push8(p: &mut Parser, tok: &Token) {
    push_cell(p, tok, "copy8", "(push8)");
}

pub(super) fn push16(p: &mut Parser, tok: &Token) {
    push_cell(p, tok, "copy16", "(push16)");
}

fn push_cell(p: &mut Parser, tok: &Token, copy_op: &str, pseudo: &str) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let source = vals[0];
    let target = p.output.alloc_stack(&tok.loc, 2, &mut p.diags);
    p.expand_source(pseudo, &format!("{copy_op}({source}, {target}) "));
}

pub(super) fn push8i(p: &mut Parser, tok: &Token) {
    push_immediate(p, tok, "set8", "(push8i)");
}

pub(super) fn push16i(p: &mut Parser, tok: &Token) {
    push_immediate(p, tok, "set16", "(push16i)");
}

fn push_immediate(p: &mut Parser, tok: &Token, set_op: &str, pseudo: &str) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let value = vals[0];
    let target = p.output.alloc_stack(&tok.loc, 2, &mut p.diags);
    p.expand_source(pseudo, &format!("{set_op}({target}, {value}) "));
}

pub(super) fn pop8(p: &mut Parser, tok: &Token) {
    pop_cell(p, tok, "move8", "(pop8)");
}

pub(super) fn pop16(p: &mut Parser, tok: &Token) {
    pop_cell(p, tok, "move16", "(pop16)");
}

fn pop_cell(p: &mut Parser, tok: &Token, move_op: &str, pseudo: &str) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let target = vals[0];
    let source = p.output.stack_ptr();
    p.output.free_stack(&tok.loc, 2, &mut p.diags);
    p.expand_source(pseudo, &format!("{move_op}({source}, {target}) "));
}
