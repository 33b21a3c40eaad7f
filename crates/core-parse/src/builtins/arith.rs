//! Arithmetic built-ins. 8-bit addition and subtraction are the move-loop
//! primitives; the 16-bit forms detect carry/borrow by comparing the new low
//! byte with a saved copy. Multiplication is shift-and-add, division is long
//! division (bit-serial at 8 bits, scaling subtraction at 16 bits to dodge
//! overflow). Signed forms strip signs, run the unsigned operation, and
//! patch the sign back in.

use crate::parser::Parser;
use core_lexer::Token;

/// `a := a + b`, `b` preserved.
pub(super) fn add8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t = p.make_temp_name("t_add");
    p.expand_source(
        "(add8)",
        &format!(
            "{{ alloc_cell8({t}) \
               copy8({b}, {t}) \
               >{t} [ - >{a} + >{t} ] \
               free_cell8({t}) \
             }}"
        ),
    );
}

/// 16-bit add: add low bytes, carry = (new low < old low), then add high
/// bytes and the carry.
pub(super) fn add16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_old = p.make_temp_name("t_old");
    let t_carry = p.make_temp_name("t_carry");
    p.expand_source(
        "(add16)",
        &format!(
            "{{ alloc_cell8({t_old}) \
               alloc_cell8({t_carry}) \
               copy8({a}, {t_old}) \
               add8({a}, {b}) \
               copy8({a}, {t_carry}) \
               lt8({t_carry}, {t_old}) \
               add8({}, {}) \
               add8({}, {t_carry}) \
               free_cell8({t_old}) \
               free_cell8({t_carry}) \
             }}",
            a + 1,
            b + 1,
            a + 1
        ),
    );
}

/// `a := a - b`, `b` preserved.
pub(super) fn sub8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t = p.make_temp_name("t_sub");
    p.expand_source(
        "(sub8)",
        &format!(
            "{{ alloc_cell8({t}) \
               copy8({b}, {t}) \
               >{t} [ - >{a} - >{t} ] \
               free_cell8({t}) \
             }}"
        ),
    );
}

/// 16-bit subtract: borrow = (new low > old low).
pub(super) fn sub16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_old = p.make_temp_name("t_old");
    let t_borrow = p.make_temp_name("t_borrow");
    p.expand_source(
        "(sub16)",
        &format!(
            "{{ alloc_cell8({t_old}) \
               alloc_cell8({t_borrow}) \
               copy8({a}, {t_old}) \
               sub8({a}, {b}) \
               copy8({a}, {t_borrow}) \
               gt8({t_borrow}, {t_old}) \
               sub8({}, {}) \
               sub8({}, {t_borrow}) \
               free_cell8({t_old}) \
               free_cell8({t_borrow}) \
             }}",
            a + 1,
            b + 1,
            a + 1
        ),
    );
}

/// Two's-complement negate: `a := 0 - a`.
pub(super) fn neg8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let a = vals[0];
    let t = p.make_temp_name("t_zero");
    p.expand_source(
        "(neg8)",
        &format!(
            "{{ alloc_cell8({t}) \
               sub8({t}, {a}) \
               move8({t}, {a}) \
               free_cell8({t}) \
             }}"
        ),
    );
}

pub(super) fn neg16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let a = vals[0];
    let t = p.make_temp_name("t_zero");
    p.expand_source(
        "(neg16)",
        &format!(
            "{{ alloc_cell16({t}) \
               sub16({t}, {a}) \
               move16({t}, {a}) \
               free_cell16({t}) \
             }}"
        ),
    );
}

/// `a := (a >= 128)` — the sign bit as 0/1.
pub(super) fn sign8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let x = vals[0];
    let t = p.make_temp_name("t_msb");
    p.expand_source(
        "(sign8)",
        &format!(
            "{{ alloc_cell8({t}) \
               set8({t}, 128) \
               ge8({x}, {t}) \
               free_cell8({t}) \
             }}"
        ),
    );
}

pub(super) fn sign16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let x = vals[0];
    let t = p.make_temp_name("t_msb");
    p.expand_source(
        "(sign16)",
        &format!(
            "{{ alloc_cell16({t}) \
               set16({t}, 32768) \
               ge16({x}, {t}) \
               free_cell16({t}) \
             }}"
        ),
    );
}

pub(super) fn abs8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let x = vals[0];
    let t = p.make_temp_name("t_neg");
    p.expand_source(
        "(abs8)",
        &format!(
            "{{ alloc_cell8({t}) \
               copy8({x}, {t}) \
               sign8({t}) \
               if({t}) \
                 neg8({x}) \
               endif \
               free_cell8({t}) \
             }}"
        ),
    );
}

pub(super) fn abs16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let x = vals[0];
    let t = p.make_temp_name("t_neg");
    p.expand_source(
        "(abs16)",
        &format!(
            "{{ alloc_cell16({t}) \
               copy16({x}, {t}) \
               sign16({t}) \
               if({t}) \
                 neg16({x}) \
               endif \
               free_cell16({t}) \
             }}"
        ),
    );
}

/// Shift-and-add multiply: while the multiplier is non-zero, add the
/// multiplicand when the low bit is set, then halve/double.
pub(super) fn mul8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_res = p.make_temp_name("t_res");
    let t_b = p.make_temp_name("t_mul");
    let t_tmp = p.make_temp_name("t_bit");
    let t_one = p.make_temp_name("t_one");
    let t_two = p.make_temp_name("t_two");
    p.expand_source(
        "(mul8)",
        &format!(
            "{{ alloc_cell8({t_res}) \
               alloc_cell8({t_b}) \
               alloc_cell8({t_tmp}) \
               alloc_cell8({t_one}) >{t_one} + \
               alloc_cell8({t_two}) >{t_two} ++ \
               copy8({b}, {t_b}) \
               while({t_b}) \
                 copy8({t_b}, {t_tmp}) \
                 mod8({t_tmp}, {t_two}) \
                 if({t_tmp}) \
                   add8({t_res}, {a}) \
                 endif \
                 shr8({t_b}, {t_one}) \
                 shl8({a}, {t_one}) \
               endwhile \
               move8({t_res}, {a}) \
               free_cell8({t_res}) \
               free_cell8({t_b}) \
               free_cell8({t_tmp}) \
               free_cell8({t_one}) \
               free_cell8({t_two}) \
             }}"
        ),
    );
}

pub(super) fn mul16(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_acc = p.make_temp_name("t_acc");
    let t_mul = p.make_temp_name("t_mul");
    let t_mcand = p.make_temp_name("t_mcand");
    let t_tmp = p.make_temp_name("t_bit");
    let t_one = p.make_temp_name("t_one");
    let t_two = p.make_temp_name("t_two");
    p.expand_source(
        "(mul16)",
        &format!(
            "{{ alloc_cell16({t_acc}) \
               alloc_cell16({t_mul}) \
               alloc_cell16({t_mcand}) \
               alloc_cell16({t_tmp}) \
               alloc_cell16({t_one}) >{t_one} + \
               alloc_cell16({t_two}) >{t_two} ++ \
               clear16({t_acc}) \
               copy16({a}, {t_mcand}) \
               copy16({b}, {t_mul}) \
               copy16({t_mul}, {t_tmp}) \
               ge16({t_tmp}, {t_one}) \
               while({t_tmp}) \
                 copy16({t_mul}, {t_tmp}) \
                 mod16({t_tmp}, {t_two}) \
                 if({t_tmp}) \
                   add16({t_acc}, {t_mcand}) \
                 endif \
                 shr16({t_mul}, {t_one}) \
                 shl16({t_mcand}, {t_one}) \
                 copy16({t_mul}, {t_tmp}) \
                 ge16({t_tmp}, {t_one}) \
               endwhile \
               move16({t_acc}, {a}) \
               free_cell16({t_acc}) \
               free_cell16({t_mul}) \
               free_cell16({t_mcand}) \
               free_cell16({t_tmp}) \
               free_cell16({t_one}) \
               free_cell16({t_two}) \
             }}"
        ),
    );
}

pub(super) fn smul8(p: &mut Parser, tok: &Token) {
    smul(p, tok, 8);
}

pub(super) fn smul16(p: &mut Parser, tok: &Token) {
    smul(p, tok, 16);
}

/// Signed multiply: final sign is `sign(a) XOR sign(b)`, magnitudes run
/// through the unsigned multiply.
fn smul(p: &mut Parser, tok: &Token, width: u32) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_sa = p.make_temp_name("t_sign_a");
    let t_sb = p.make_temp_name("t_sign_b");
    let t_sign = p.make_temp_name("t_sign");
    let t_b = p.make_temp_name("t_mag_b");
    let x = width;
    p.expand_source(
        &format!("(smul{x})"),
        &format!(
            "{{ alloc_cell{x}({t_sa}) \
               alloc_cell{x}({t_sb}) \
               alloc_cell{x}({t_sign}) \
               alloc_cell{x}({t_b}) \
               copy{x}({a}, {t_sa}) \
               sign{x}({t_sa}) \
               copy{x}({b}, {t_sb}) \
               sign{x}({t_sb}) \
               copy{x}({t_sa}, {t_sign}) \
               xor{x}({t_sign}, {t_sb}) \
               abs{x}({a}) \
               copy{x}({b}, {t_b}) \
               abs{x}({t_b}) \
               mul{x}({a}, {t_b}) \
               if({t_sign}) \
                 neg{x}({a}) \
               endif \
               free_cell{x}({t_sa}) \
               free_cell{x}({t_sb}) \
               free_cell{x}({t_sign}) \
               free_cell{x}({t_b}) \
             }}"
        ),
    );
}

pub(super) fn div8(p: &mut Parser, tok: &Token) {
    div_mod8(p, tok, false);
}

pub(super) fn mod8(p: &mut Parser, tok: &Token) {
    div_mod8(p, tok, true);
}

pub(super) fn div16(p: &mut Parser, tok: &Token) {
    div_mod16(p, tok, false);
}

pub(super) fn mod16(p: &mut Parser, tok: &Token) {
    div_mod16(p, tok, true);
}

pub(super) fn sdiv8(p: &mut Parser, tok: &Token) {
    sdiv_smod(p, tok, 8, false);
}

pub(super) fn smod8(p: &mut Parser, tok: &Token) {
    sdiv_smod(p, tok, 8, true);
}

pub(super) fn sdiv16(p: &mut Parser, tok: &Token) {
    sdiv_smod(p, tok, 16, false);
}

pub(super) fn smod16(p: &mut Parser, tok: &Token) {
    sdiv_smod(p, tok, 16, true);
}

/// Restoring long division over 8 bits: for each of the 8 bit positions,
/// shift the next dividend bit into the remainder and subtract the divisor
/// when it fits. Division by zero leaves `a` untouched.
fn div_mod8(p: &mut Parser, tok: &Token, return_remainder: bool) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_quot = p.make_temp_name("t_quot");
    let t_rem = p.make_temp_name("t_rem");
    let t_bit = p.make_temp_name("t_bit");
    let t_tmp = p.make_temp_name("t_cmp");
    let t_one = p.make_temp_name("t_one");
    let t_seven = p.make_temp_name("t_seven");
    let t_eight = p.make_temp_name("t_eight");
    let move_target = if return_remainder { &t_rem } else { &t_quot };
    let pseudo = if return_remainder { "(mod8)" } else { "(div8)" };
    p.expand_source(
        pseudo,
        &format!(
            "{{ alloc_cell8({t_quot}) \
               alloc_cell8({t_rem}) \
               alloc_cell8({t_bit}) \
               alloc_cell8({t_tmp}) \
               alloc_cell8({t_one}) >{t_one} + \
               alloc_cell8({t_seven}) >{t_seven} +7 \
               alloc_cell8({t_eight}) >{t_eight} +8 \
               if({b}) \
                 repeat({t_eight}) \
                   copy8({a}, {t_bit}) \
                   shr8({t_bit}, {t_seven}) \
                   shl8({a}, {t_one}) \
                   shl8({t_rem}, {t_one}) \
                   add8({t_rem}, {t_bit}) \
                   copy8({t_rem}, {t_tmp}) \
                   ge8({t_tmp}, {b}) \
                   if({t_tmp}) \
                     sub8({t_rem}, {b}) \
                     shl8({t_quot}, {t_one}) \
                     add8({t_quot}, {t_one}) \
                   else \
                     shl8({t_quot}, {t_one}) \
                   endif \
                 endrepeat \
                 move8({move_target}, {a}) \
               endif \
               free_cell8({t_quot}) \
               free_cell8({t_rem}) \
               free_cell8({t_bit}) \
               free_cell8({t_tmp}) \
               free_cell8({t_one}) \
               free_cell8({t_seven}) \
               free_cell8({t_eight}) \
             }}"
        ),
    );
}

/// 16-bit division by repeated scaled subtraction: grow `scale = b << k`
/// while it still fits the working value (with an overflow guard on the
/// doubling), subtract the largest chunk, accumulate `bit` into the
/// quotient, repeat while `work >= b`.
fn div_mod16(p: &mut Parser, tok: &Token, return_remainder: bool) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_work = p.make_temp_name("t_work");
    let t_quot = p.make_temp_name("t_quot");
    let t_scale = p.make_temp_name("t_scale");
    let t_bit = p.make_temp_name("t_bit");
    let t_tmp = p.make_temp_name("t_cmp");
    let t_cond = p.make_temp_name("t_cond");
    let t_guard = p.make_temp_name("t_guard");
    let t_one = p.make_temp_name("t_one");
    let move_target = if return_remainder { &t_work } else { &t_quot };
    let pseudo = if return_remainder { "(mod16)" } else { "(div16)" };
    p.expand_source(
        pseudo,
        &format!(
            "{{ alloc_cell16({t_work}) \
               alloc_cell16({t_quot}) \
               alloc_cell16({t_scale}) \
               alloc_cell16({t_bit}) \
               alloc_cell16({t_tmp}) \
               alloc_cell16({t_cond}) \
               alloc_cell16({t_guard}) \
               alloc_cell16({t_one}) set16({t_one}, 1) \
               copy16({b}, {t_cond}) \
               ge16({t_cond}, {t_one}) \
               if({t_cond}) \
                 copy16({a}, {t_work}) \
                 copy16({t_work}, {t_cond}) \
                 ge16({t_cond}, {b}) \
                 while({t_cond}) \
                   copy16({b}, {t_scale}) \
                   clear16({t_bit}) \
                   add16({t_bit}, {t_one}) \
                   copy16({t_scale}, {t_tmp}) \
                   shl16({t_tmp}, {t_one}) \
                   copy16({t_work}, {t_cond}) \
                   ge16({t_cond}, {t_tmp}) \
                   copy16({t_tmp}, {t_guard}) \
                   gt16({t_guard}, {t_scale}) \
                   and16({t_cond}, {t_guard}) \
                   while({t_cond}) \
                     shl16({t_scale}, {t_one}) \
                     shl16({t_bit}, {t_one}) \
                     copy16({t_scale}, {t_tmp}) \
                     shl16({t_tmp}, {t_one}) \
                     copy16({t_work}, {t_cond}) \
                     ge16({t_cond}, {t_tmp}) \
                     copy16({t_tmp}, {t_guard}) \
                     gt16({t_guard}, {t_scale}) \
                     and16({t_cond}, {t_guard}) \
                   endwhile \
                   sub16({t_work}, {t_scale}) \
                   add16({t_quot}, {t_bit}) \
                   copy16({t_work}, {t_cond}) \
                   ge16({t_cond}, {b}) \
                 endwhile \
                 move16({move_target}, {a}) \
               endif \
               free_cell16({t_work}) \
               free_cell16({t_quot}) \
               free_cell16({t_scale}) \
               free_cell16({t_bit}) \
               free_cell16({t_tmp}) \
               free_cell16({t_cond}) \
               free_cell16({t_guard}) \
               free_cell16({t_one}) \
             }}"
        ),
    );
}

/// Signed division and remainder. Quotient sign is `sign(a) XOR sign(b)`;
/// remainder takes the sign of the dividend (C semantics).
fn sdiv_smod(p: &mut Parser, tok: &Token, width: u32, return_remainder: bool) {
    let Some(vals) = p.parse_expr_args(tok, 2) else {
        return;
    };
    let (a, b) = (vals[0], vals[1]);
    let t_sa = p.make_temp_name("t_sign_a");
    let t_sb = p.make_temp_name("t_sign_b");
    let t_sign = p.make_temp_name("t_sign");
    let t_b = p.make_temp_name("t_mag_b");
    let x = width;

    let final_sign = if return_remainder {
        format!("copy{x}({t_sa}, {t_sign}) ")
    } else {
        format!("copy{x}({t_sa}, {t_sign}) xor{x}({t_sign}, {t_sb}) ")
    };
    let operation = if return_remainder {
        format!("mod{x}")
    } else {
        format!("div{x}")
    };
    let pseudo = if return_remainder {
        format!("(smod{x})")
    } else {
        format!("(sdiv{x})")
    };

    p.expand_source(
        &pseudo,
        &format!(
            "{{ alloc_cell{x}({t_sa}) \
               alloc_cell{x}({t_sb}) \
               alloc_cell{x}({t_sign}) \
               alloc_cell{x}({t_b}) \
               copy{x}({a}, {t_sa}) \
               sign{x}({t_sa}) \
               copy{x}({b}, {t_sb}) \
               sign{x}({t_sb}) \
               {final_sign}\
               abs{x}({a}) \
               copy{x}({b}, {t_b}) \
               abs{x}({t_b}) \
               {operation}({a}, {t_b}) \
               if({t_sign}) \
                 neg{x}({a}) \
               endif \
               free_cell{x}({t_sa}) \
               free_cell{x}({t_sb}) \
               free_cell{x}({t_sign}) \
               free_cell{x}({t_b}) \
             }}"
        ),
    );
}
