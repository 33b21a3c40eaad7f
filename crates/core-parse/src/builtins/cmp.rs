//! Comparison built-ins. All write 0/1 into the first operand. The 8-bit
//! orderings run the simultaneous-countdown idiom (decrement both copies
//! while both are non-zero, then look at which one survived); the 16-bit
//! forms compare high bytes first and fall back to the low bytes on a tie;
//! the signed forms dispatch on the sign bits (differing signs mean the
//! negative operand is smaller).

use crate::parser::Parser;
use core_lexer::Token;

/// `a := (a == b)`: subtract, then logical not.
pub(super) fn eq8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source("(eq8)", &format!("sub8({a}, {b}) not8({a}) "));
}

pub(super) fn eq16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t1 = p.make_temp_name("t_lo");
    let t2 = p.make_temp_name("t_hi");
    p.expand_source(
        "(eq16)",
        &format!(
            "{{ alloc_cell8({t1}) \
               alloc_cell8({t2}) \
               copy8({a}, {t1}) \
               eq8({t1}, {b}) \
               copy8({}, {t2}) \
               eq8({t2}, {}) \
               and8({t1}, {t2}) \
               if({t1}) \
                 set16({a}, 1) \
               else \
                 clear16({a}) \
               endif \
               free_cell8({t1}) \
               free_cell8({t2}) \
             }}",
            a + 1,
            b + 1
        ),
    );
}

pub(super) fn ne8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source("(ne8)", &format!("eq8({a}, {b}) not8({a}) "));
}

pub(super) fn ne16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source("(ne16)", &format!("eq16({a}, {b}) not16({a}) "));
}

pub(super) fn lt8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_a = p.make_temp_name("t_a");
    let t_b = p.make_temp_name("t_b");
    let t_both = p.make_temp_name("t_both");
    let t_lt = p.make_temp_name("t_lt");
    p.expand_source(
        "(lt8)",
        &format!(
            "{{ alloc_cell8({t_a}) \
               alloc_cell8({t_b}) \
               alloc_cell8({t_both}) \
               alloc_cell8({t_lt}) \
               copy8({a}, {t_a}) \
               copy8({b}, {t_b}) \
               copy8({t_a}, {t_both}) \
               and8({t_both}, {t_b}) \
               while({t_both}) \
                 >{t_a} - \
                 >{t_b} - \
                 copy8({t_a}, {t_both}) \
                 and8({t_both}, {t_b}) \
               endwhile \
               clear8({a}) \
               copy8({t_a}, {t_lt}) \
               not8({t_lt}) \
               and8({t_lt}, {t_b}) \
               if({t_lt}) \
                 >{a} + \
               endif \
               free_cell8({t_a}) \
               free_cell8({t_b}) \
               free_cell8({t_both}) \
               free_cell8({t_lt}) \
             }}"
        ),
    );
}

pub(super) fn lt16(p: &mut Parser, tok: &Token) {
    cmp16(p, tok, "lt16", "lt8");
}

pub(super) fn gt8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_a = p.make_temp_name("t_a");
    let t_b = p.make_temp_name("t_b");
    let t_both = p.make_temp_name("t_both");
    let t_gt = p.make_temp_name("t_gt");
    p.expand_source(
        "(gt8)",
        &format!(
            "{{ alloc_cell8({t_a}) \
               alloc_cell8({t_b}) \
               alloc_cell8({t_both}) \
               alloc_cell8({t_gt}) \
               copy8({a}, {t_a}) \
               copy8({b}, {t_b}) \
               copy8({t_a}, {t_both}) \
               and8({t_both}, {t_b}) \
               while({t_both}) \
                 >{t_a} - \
                 >{t_b} - \
                 copy8({t_a}, {t_both}) \
                 and8({t_both}, {t_b}) \
               endwhile \
               clear8({a}) \
               copy8({t_b}, {t_gt}) \
               not8({t_gt}) \
               and8({t_gt}, {t_a}) \
               if({t_gt}) \
                 >{a} + \
               endif \
               free_cell8({t_a}) \
               free_cell8({t_b}) \
               free_cell8({t_both}) \
               free_cell8({t_gt}) \
             }}"
        ),
    );
}

pub(super) fn gt16(p: &mut Parser, tok: &Token) {
    cmp16(p, tok, "gt16", "gt8");
}

/// `a <= b` is `!(a > b)`.
pub(super) fn le8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source("(le8)", &format!("gt8({a}, {b}) not8({a}) "));
}

pub(super) fn le16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source("(le16)", &format!("gt16({a}, {b}) not16({a}) "));
}

/// `a >= b` is `!(a < b)`.
pub(super) fn ge8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source("(ge8)", &format!("lt8({a}, {b}) not8({a}) "));
}

pub(super) fn ge16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    p.expand_source("(ge16)", &format!("lt16({a}, {b}) not16({a}) "));
}

pub(super) fn slt8(p: &mut Parser, tok: &Token) {
    signed_cmp(p, tok, 8, "lt8", SignedPick::SignOfA)
}

pub(super) fn slt16(p: &mut Parser, tok: &Token) {
    signed_cmp(p, tok, 16, "lt16", SignedPick::SignOfA)
}

pub(super) fn sgt8(p: &mut Parser, tok: &Token) {
    signed_cmp(p, tok, 8, "gt8", SignedPick::SignOfB)
}

pub(super) fn sgt16(p: &mut Parser, tok: &Token) {
    signed_cmp(p, tok, 16, "gt16", SignedPick::SignOfB)
}

pub(super) fn sle8(p: &mut Parser, tok: &Token) {
    signed_cmp(p, tok, 8, "le8", SignedPick::SignOfA)
}

pub(super) fn sle16(p: &mut Parser, tok: &Token) {
    signed_cmp(p, tok, 16, "le16", SignedPick::SignOfA)
}

pub(super) fn sge8(p: &mut Parser, tok: &Token) {
    signed_cmp(p, tok, 8, "ge8", SignedPick::SignOfB)
}

pub(super) fn sge16(p: &mut Parser, tok: &Token) {
    signed_cmp(p, tok, 16, "ge16", SignedPick::SignOfB)
}

/// High bytes decide unless equal, then the low bytes do.
fn cmp16(p: &mut Parser, tok: &Token, name: &str, op8: &str) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t1 = p.make_temp_name("t_ord");
    let t2 = p.make_temp_name("t_eqhi");
    p.expand_source(
        &format!("({name})"),
        &format!(
            "{{ alloc_cell8({t1}) \
               alloc_cell8({t2}) \
               copy8({ahi}, {t1}) \
               {op8}({t1}, {bhi}) \
               copy8({ahi}, {t2}) \
               eq8({t2}, {bhi}) \
               if({t2}) \
                 copy8({a}, {t1}) \
                 {op8}({t1}, {b}) \
               endif \
               if({t1}) \
                 set16({a}, 1) \
               else \
                 clear16({a}) \
               endif \
               free_cell8({t1}) \
               free_cell8({t2}) \
             }}",
            ahi = a + 1,
            bhi = b + 1,
        ),
    );
}

/// Which sign bit is the answer when the operand signs differ: for `<`-like
/// orderings a negative `a` wins, for `>`-like orderings a negative `b`
/// does.
enum SignedPick {
    SignOfA,
    SignOfB,
}

fn signed_cmp(p: &mut Parser, tok: &Token, width: u32, unsigned_op: &str, pick: SignedPick) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_sa = p.make_temp_name("t_sign_a");
    let t_sb = p.make_temp_name("t_sign_b");
    let t_diff = p.make_temp_name("t_diff");
    let x = width;
    let picked = match pick {
        SignedPick::SignOfA => &t_sa,
        SignedPick::SignOfB => &t_sb,
    };
    p.expand_source(
        &format!("(s{unsigned_op})"),
        &format!(
            "{{ alloc_cell{x}({t_sa}) \
               alloc_cell{x}({t_sb}) \
               alloc_cell{x}({t_diff}) \
               copy{x}({a}, {t_sa}) \
               sign{x}({t_sa}) \
               copy{x}({b}, {t_sb}) \
               sign{x}({t_sb}) \
               copy{x}({t_sa}, {t_diff}) \
               xor{x}({t_diff}, {t_sb}) \
               if({t_diff}) \
                 copy{x}({picked}, {a}) \
               else \
                 {unsigned_op}({a}, {b}) \
               endif \
               free_cell{x}({t_sa}) \
               free_cell{x}({t_sb}) \
               free_cell{x}({t_diff}) \
             }}"
        ),
    );
}
