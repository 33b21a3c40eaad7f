//! Shift built-ins. Shifts count down a copy of the shift-amount cell; each
//! step halves (repeated subtraction of two) or doubles (self-add) the
//! operand.

use crate::parser::Parser;
use core_lexer::Token;

pub(super) fn shr8(p: &mut Parser, tok: &Token) {
    shr(p, tok, 8);
}

pub(super) fn shr16(p: &mut Parser, tok: &Token) {
    shr(p, tok, 16);
}

/// `a := a >> b`: per step, count how many 2s fit (the halved value) and
/// replace `a` with it.
fn shr(p: &mut Parser, tok: &Token, width: u32) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_half = p.make_temp_name("t_half");
    let t_cmp = p.make_temp_name("t_cmp");
    let t_one = p.make_temp_name("t_one");
    let t_two = p.make_temp_name("t_two");
    let t_count = p.make_temp_name("t_count");
    let x = width;
    p.expand_source(
        &format!("(shr{x})"),
        &format!(
            "{{ alloc_cell{x}({t_half}) \
               alloc_cell{x}({t_cmp}) \
               alloc_cell{x}({t_one}) >{t_one} + \
               alloc_cell{x}({t_two}) >{t_two} ++ \
               alloc_cell{x}({t_count}) \
               copy{x}({b}, {t_count}) \
               repeat({t_count}) \
                 copy{x}({a}, {t_cmp}) \
                 ge{x}({t_cmp}, {t_two}) \
                 while({t_cmp}) \
                   sub{x}({a}, {t_two}) \
                   add{x}({t_half}, {t_one}) \
                   copy{x}({a}, {t_cmp}) \
                   ge{x}({t_cmp}, {t_two}) \
                 endwhile \
                 move{x}({t_half}, {a}) \
               endrepeat \
               free_cell{x}({t_half}) \
               free_cell{x}({t_cmp}) \
               free_cell{x}({t_one}) \
               free_cell{x}({t_two}) \
               free_cell{x}({t_count}) \
             }}"
        ),
    );
}

pub(super) fn shl8(p: &mut Parser, tok: &Token) {
    shl(p, tok, 8);
}

pub(super) fn shl16(p: &mut Parser, tok: &Token) {
    shl(p, tok, 16);
}

/// `a := a << b` by adding `a` to itself `b` times.
fn shl(p: &mut Parser, tok: &Token, width: u32) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_val = p.make_temp_name("t_dup");
    let t_count = p.make_temp_name("t_count");
    let x = width;
    p.expand_source(
        &format!("(shl{x})"),
        &format!(
            "{{ alloc_cell{x}({t_val}) \
               alloc_cell{x}({t_count}) \
               copy{x}({b}, {t_count}) \
               repeat({t_count}) \
                 copy{x}({a}, {t_val}) \
                 add{x}({a}, {t_val}) \
               endrepeat \
               free_cell{x}({t_val}) \
               free_cell{x}({t_count}) \
             }}"
        ),
    );
}
