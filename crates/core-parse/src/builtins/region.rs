//! Region and frame built-ins. The globals and temps areas are one-shot
//! heap sub-allocations addressed by 16-bit index through the `global(n)` /
//! `temp(n)` expression helpers. Frames are pure compile-time bookkeeping:
//! entering or leaving one emits no code, it only moves the stack pointer
//! that `arg(n)` / `local(n)` / `local_temp(n)` resolve against.

use crate::parser::Parser;
use core_lexer::Token;

pub(super) fn alloc_global16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let count16 = vals[0];
    let addr = p.output.alloc_global(tok, count16, &mut p.diags);
    p.expand_source("(alloc_global16)", &clear_memory_area(addr, count16));
}

pub(super) fn free_global16(p: &mut Parser, tok: &Token) {
    p.advance(); // consume the name; no argument list
    p.output.free_global(&tok.loc, &mut p.diags);
}

pub(super) fn alloc_temp16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let count16 = vals[0];
    let addr = p.output.alloc_temp(tok, count16, &mut p.diags);
    p.expand_source("(alloc_temp16)", &clear_memory_area(addr, count16));
}

pub(super) fn free_temp16(p: &mut Parser, tok: &Token) {
    p.advance();
    p.output.free_temp(&tok.loc, &mut p.diags);
}

pub(super) fn enter_frame16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    p.output.enter_frame(tok, vals[0], vals[1], &mut p.diags);
}

pub(super) fn leave_frame16(p: &mut Parser, tok: &Token) {
    p.advance();
    p.output.leave_frame(tok, &mut p.diags);
}

pub(super) fn frame_alloc_temp16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    p.output.frame_alloc_temp(tok, vals[0], &mut p.diags);
}

/// Zero a run of 16-bit cells with a `[-] >` sweep.
fn clear_memory_area(addr: i32, count16: i32) -> String {
    let mut code = format!("{{ >{addr} ");
    for _ in 0..count16 * 2 {
        code.push_str("[-] > ");
    }
    code.push('}');
    code
}
