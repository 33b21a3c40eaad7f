//! Byte and word memory built-ins: zeroing, constant loads, destructive
//! moves and copies through a scratch cell.

use crate::parser::Parser;
use core_lexer::Token;

pub(super) fn clear8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let a = vals[0];
    p.expand_source("(clear8)", &format!("{{ >{a} [-] }}"));
}

pub(super) fn clear16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let a = vals[0];
    let hi = a + 1;
    p.expand_source("(clear16)", &format!("{{ >{a} [-] >{hi} [-] }}"));
}

pub(super) fn set8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let a = vals[0];
    let b = vals[1] & 0xFF;
    p.expand_source("(set8)", &format!("{{ >{a} [-] +{b} }}"));
}

pub(super) fn set16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let a = vals[0];
    let hi = a + 1;
    let b_low = vals[1] & 0xFF;
    let b_high = (vals[1] >> 8) & 0xFF;
    p.expand_source(
        "(set16)",
        &format!("{{ >{a} [-] +{b_low} >{hi} [-] +{b_high} }}"),
    );
}

/// `b := a`, destroying `a` (the classic move loop).
pub(super) fn move8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source(
        "(move8)",
        &format!("{{ >{b} [-] >{a} [ - >{b} + >{a} ] }}"),
    );
}

pub(super) fn move16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source(
        "(move16)",
        &format!("move8({a}, {b}) move8({}, {}) ", a + 1, b + 1),
    );
}

/// `b := a`, preserving `a` by bouncing through a scratch cell.
pub(super) fn copy8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t = p.make_temp_name("t_copy");
    p.expand_source(
        "(copy8)",
        &format!(
            "{{ alloc_cell8({t}) \
               >{b} [-] \
               >{a} [ - >{b} + >{t} + >{a} ] \
               >{t} [ - >{a} + >{t} ] \
               free_cell8({t}) }}"
        ),
    );
}

pub(super) fn copy16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source(
        "(copy16)",
        &format!("copy8({a}, {b}) copy8({}, {}) ", a + 1, b + 1),
    );
}
