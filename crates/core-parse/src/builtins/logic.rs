//! Boolean built-ins. All of them normalise their result to 0 or 1;
//! `not` is the primitive the others lean on (`!!x` booleanises).

use crate::parser::Parser;
use core_lexer::Token;

/// `a := !a` — maps 0 to 1 and anything else to 0. Runs a countdown loop
/// with a one-shot flag cell so the decrement of the result happens at most
/// once.
pub(super) fn not8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let x = vals[0];
    let t = p.make_temp_name("t_count");
    let f = p.make_temp_name("t_flag");
    p.expand_source(
        "(not8)",
        &format!(
            "{{ alloc_cell8({t}) \
               alloc_cell8({f}) \
               move8({x}, {t}) \
               >{x} + \
               >{f} + \
               >{t} \
               [ - \
                 >{f} [ - >{x} - >{f} ] \
                 >{t} \
               ] \
               free_cell8({t}) \
               free_cell8({f}) \
             }}"
        ),
    );
}

/// 16-bit logical not: 1 exactly when both bytes are zero.
pub(super) fn not16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let a = vals[0];
    let t1 = p.make_temp_name("t_lo");
    let t2 = p.make_temp_name("t_hi");
    p.expand_source(
        "(not16)",
        &format!(
            "{{ alloc_cell8({t1}) \
               alloc_cell8({t2}) \
               copy8({a}, {t1}) \
               not8({t1}) \
               copy8({}, {t2}) \
               not8({t2}) \
               and8({t1}, {t2}) \
               if({t1}) \
                 set16({a}, 1) \
               else \
                 clear16({a}) \
               endif \
               free_cell8({t1}) \
               free_cell8({t2}) \
             }}",
            a + 1
        ),
    );
}

/// `a := bool(a) AND bool(b)`; `b` is preserved.
pub(super) fn and8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_a = p.make_temp_name("t_a");
    let t_b = p.make_temp_name("t_b");
    let t_r = p.make_temp_name("t_r");
    p.expand_source(
        "(and8)",
        &format!(
            "{{ alloc_cell8({t_a}) \
               alloc_cell8({t_b}) \
               alloc_cell8({t_r}) \
               move8({a}, {t_a}) \
               not8({t_a}) \
               not8({t_a}) \
               copy8({b}, {t_b}) \
               not8({t_b}) \
               not8({t_b}) \
               >{t_a} [ - move8({t_b}, {t_r}) ] \
               move8({t_r}, {a}) \
               free_cell8({t_a}) \
               free_cell8({t_b}) \
               free_cell8({t_r}) \
             }}"
        ),
    );
}

/// 16-bit and: both operands truthy (either byte non-zero).
pub(super) fn and16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t1 = p.make_temp_name("t_a");
    let t2 = p.make_temp_name("t_b");
    p.expand_source(
        "(and16)",
        &format!(
            "{{ alloc_cell8({t1}) \
               alloc_cell8({t2}) \
               copy8({a}, {t1}) \
               or8({t1}, {}) \
               copy8({b}, {t2}) \
               or8({t2}, {}) \
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

/// `a := bool(a) OR bool(b)`: booleanise both, add, booleanise the sum.
pub(super) fn or8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_a = p.make_temp_name("t_a");
    let t_b = p.make_temp_name("t_b");
    let t_r = p.make_temp_name("t_r");
    p.expand_source(
        "(or8)",
        &format!(
            "{{ alloc_cell8({t_a}) \
               alloc_cell8({t_b}) \
               alloc_cell8({t_r}) \
               move8({a}, {t_a}) \
               not8({t_a}) \
               not8({t_a}) \
               copy8({b}, {t_b}) \
               not8({t_b}) \
               not8({t_b}) \
               >{t_a} [ - >{t_r} + >{t_a} ] \
               >{t_b} [ - >{t_r} + >{t_b} ] \
               not8({t_r}) \
               not8({t_r}) \
               move8({t_r}, {a}) \
               free_cell8({t_a}) \
               free_cell8({t_b}) \
               free_cell8({t_r}) \
             }}"
        ),
    );
}

pub(super) fn or16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t = p.make_temp_name("t_any");
    p.expand_source(
        "(or16)",
        &format!(
            "{{ alloc_cell8({t}) \
               copy8({a}, {t}) \
               or8({t}, {}) \
               or8({t}, {b}) \
               or8({t}, {}) \
               if({t}) \
                 set16({a}, 1) \
               else \
                 clear16({a}) \
               endif \
               free_cell8({t}) \
             }}",
            a + 1,
            b + 1
        ),
    );
}

/// xor via `(a OR b) AND NOT(a AND b)`.
pub(super) fn xor8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t1 = p.make_temp_name("t_or");
    let t2 = p.make_temp_name("t_and");
    p.expand_source(
        "(xor8)",
        &format!(
            "{{ alloc_cell8({t1}) \
               alloc_cell8({t2}) \
               copy8({a}, {t1}) \
               or8({t1}, {b}) \
               copy8({a}, {t2}) \
               and8({t2}, {b}) \
               not8({t2}) \
               copy8({t1}, {a}) \
               and8({a}, {t2}) \
               free_cell8({t1}) \
               free_cell8({t2}) \
             }}"
        ),
    );
}

pub(super) fn xor16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t1 = p.make_temp_name("t_or");
    let t2 = p.make_temp_name("t_and");
    p.expand_source(
        "(xor16)",
        &format!(
            "{{ alloc_cell16({t1}) \
               alloc_cell16({t2}) \
               copy16({a}, {t1}) \
               or16({t1}, {b}) \
               copy16({a}, {t2}) \
               and16({t2}, {b}) \
               not16({t2}) \
               and16({t1}, {t2}) \
               if({t1}) \
                 set16({a}, 1) \
               else \
                 clear16({a}) \
               endif \
               free_cell16({t1}) \
               free_cell16({t2}) \
             }}"
        ),
    );
}
