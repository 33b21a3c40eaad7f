//! Control-flow built-ins. Each construct brackets user code between two
//! expansion fragments and keeps its compile-time state on the struct stack.
//!
//! `if` materialises taken/not-taken flag cells: the branch body sits inside
//! a `[`…`]` loop entered at the flag, with the flag decremented at the
//! close so the loop runs at most once. `while` re-evaluates its condition
//! cell at the loop tail. `repeat` loops directly on a decrementing count
//! cell. The closers (`else`, `endif`, `endwhile`, `endrepeat`) take no
//! argument list and consume their own name.

use crate::parser::{Parser, StructKind, StructLevel};
use core_lexer::Token;

pub(super) fn if_open(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let cond = vals[0];

    let temp_if = p.make_temp_name("temp_if");
    let temp_else = p.make_temp_name("temp_else");

    p.expand_source(
        "(if)",
        &format!(
            "{{ alloc_cell8({temp_if}) \
               alloc_cell8({temp_else}) \
               copy8({cond}, {temp_else}) \
               not8({temp_else}) \
               copy8({temp_else}, {temp_if}) \
               not8({temp_if}) \
               >{temp_if} \
               [ {{"
        ),
    );
    p.struct_stack.push(StructLevel {
        kind: StructKind::If,
        loc: tok.loc.clone(),
        temp_if,
        temp_else,
        cond,
    });
}

pub(super) fn if_else(p: &mut Parser, tok: &Token) {
    p.advance(); // consume 'else'

    let Some(level) = p.struct_stack.last_mut() else {
        p.diags
            .error(tok.loc.clone(), "else without matching if");
        return;
    };
    if level.kind != StructKind::If {
        p.diags
            .error(tok.loc.clone(), "else without matching if");
        return;
    }
    level.kind = StructKind::Else;
    let temp_else = level.temp_else.clone();

    p.expand_source(
        "(else)",
        &format!("}} - ] >{temp_else} [ {{"),
    );
}

pub(super) fn if_end(p: &mut Parser, tok: &Token) {
    p.advance(); // consume 'endif'

    let matches_if = p
        .struct_stack
        .last()
        .is_some_and(|level| matches!(level.kind, StructKind::If | StructKind::Else));
    if !matches_if {
        p.diags
            .error(tok.loc.clone(), "endif without matching if");
        return;
    }
    let level = p.struct_stack.pop().expect("struct level just observed");

    p.expand_source(
        "(endif)",
        &format!(
            "}} - ] \
             free_cell8({}) \
             free_cell8({}) \
             }}",
            level.temp_if, level.temp_else
        ),
    );
}

pub(super) fn while_open(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let cond = vals[0];
    let temp_if = p.make_temp_name("temp_while");

    p.expand_source(
        "(while)",
        &format!(
            "{{ alloc_cell8({temp_if}) \
               copy8({cond}, {temp_if}) \
               not8({temp_if}) \
               not8({temp_if}) \
               >{temp_if} \
               [ {{"
        ),
    );
    p.struct_stack.push(StructLevel {
        kind: StructKind::While,
        loc: tok.loc.clone(),
        temp_if,
        temp_else: String::new(),
        cond,
    });
}

pub(super) fn while_end(p: &mut Parser, tok: &Token) {
    p.advance(); // consume 'endwhile'

    let matches_while = p
        .struct_stack
        .last()
        .is_some_and(|level| level.kind == StructKind::While);
    if !matches_while {
        p.diags
            .error(tok.loc.clone(), "endwhile without matching while");
        return;
    }
    let level = p.struct_stack.pop().expect("struct level just observed");

    p.expand_source(
        "(endwhile)",
        &format!(
            "}} \
             copy8({cond}, {t}) \
             not8({t}) \
             not8({t}) \
             >{t} \
             ] \
             free_cell8({t}) \
             }}",
            cond = level.cond,
            t = level.temp_if
        ),
    );
}

pub(super) fn repeat_open(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let count = vals[0];

    p.expand_source("(repeat)", &format!("{{ >{count} [ {{"));
    p.struct_stack.push(StructLevel {
        kind: StructKind::Repeat,
        loc: tok.loc.clone(),
        temp_if: String::new(),
        temp_else: String::new(),
        cond: count,
    });
}

pub(super) fn repeat_end(p: &mut Parser, tok: &Token) {
    p.advance(); // consume 'endrepeat'

    let matches_repeat = p
        .struct_stack
        .last()
        .is_some_and(|level| level.kind == StructKind::Repeat);
    if !matches_repeat {
        p.diags
            .error(tok.loc.clone(), "endrepeat without matching repeat");
        return;
    }
    p.struct_stack.pop();

    p.expand_source("(endrepeat)", " } - ] }");
}
