//! Built-in synthesisers executed on the reference interpreter: the emitted
//! Brainfuck must actually compute the operation on a real tape machine.
//!
//! Cells allocate from tape address 0 upward in call order, so the first
//! `alloc_cell8(a)` is tape[0], a following `alloc_cell8(b)` is tape[1], and
//! 16-bit cells occupy two consecutive cells low byte first.

mod common;

use common::{compile_and_run, compile_err};

#[test]
fn set_and_clear() {
    let run = compile_and_run("alloc_cell8(a) set8(a, 200) clear8(a)");
    assert_eq!(run.tape[0], 0);

    let run = compile_and_run("alloc_cell16(a) set16(a, 4660)"); // 0x1234
    assert_eq!((run.tape[0], run.tape[1]), (0x34, 0x12));
}

#[test]
fn move_destroys_source() {
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 9) move8(a, b)");
    assert_eq!((run.tape[0], run.tape[1]), (0, 9));
}

#[test]
fn copy_preserves_source() {
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 9) copy8(a, b)");
    assert_eq!((run.tape[0], run.tape[1]), (9, 9));
}

#[test]
fn not_is_boolean_normalising() {
    let run = compile_and_run("alloc_cell8(a) set8(a, 37) not8(a)");
    assert_eq!(run.tape[0], 0);
    let run = compile_and_run("alloc_cell8(a) not8(a)");
    assert_eq!(run.tape[0], 1);
}

#[test]
fn and_or_xor_truth_table() {
    for (x, y, and, or, xor) in [
        (0, 0, 0, 0, 0),
        (0, 7, 0, 1, 1),
        (5, 0, 0, 1, 1),
        (5, 7, 1, 1, 0),
    ] {
        let src = |op: &str| {
            format!(
                "alloc_cell8(a) alloc_cell8(b) set8(a, {x}) set8(b, {y}) {op}(a, b)"
            )
        };
        assert_eq!(compile_and_run(&src("and8")).tape[0], and, "and8({x},{y})");
        assert_eq!(compile_and_run(&src("or8")).tape[0], or, "or8({x},{y})");
        assert_eq!(compile_and_run(&src("xor8")).tape[0], xor, "xor8({x},{y})");
    }
}

#[test]
fn add_and_sub_wrap() {
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 250) set8(b, 10) add8(a, b)");
    assert_eq!(run.tape[0], 4);
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 3) set8(b, 5) sub8(a, b)");
    assert_eq!(run.tape[0], 254);
}

#[test]
fn sixteen_bit_sub_borrows() {
    let run = compile_and_run(
        "alloc_cell16(a) alloc_cell16(b) set16(a, 256) set16(b, 1) sub16(a, b)",
    );
    assert_eq!((run.tape[0], run.tape[1]), (255, 0));
}

#[test]
fn neg_abs_sign() {
    // -15 is 241 in two's complement
    let run = compile_and_run("alloc_cell8(a) set8(a, 15) neg8(a)");
    assert_eq!(run.tape[0], 241);
    let run = compile_and_run("alloc_cell8(a) set8(a, 241) abs8(a)");
    assert_eq!(run.tape[0], 15);
    let run = compile_and_run("alloc_cell8(a) set8(a, 241) sign8(a)");
    assert_eq!(run.tape[0], 1);
    let run = compile_and_run("alloc_cell8(a) set8(a, 15) sign8(a)");
    assert_eq!(run.tape[0], 0);
}

#[test]
fn multiplication() {
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 7) set8(b, 6) mul8(a, b)");
    assert_eq!(run.tape[0], 42);

    // signed: (-3) * 5 = -15 -> 241
    let run = compile_and_run(
        "alloc_cell8(a) alloc_cell8(b) set8(a, 253) set8(b, 5) smul8(a, b)",
    );
    assert_eq!(run.tape[0], 241);
}

#[test]
fn division_and_modulo() {
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 45) set8(b, 7) div8(a, b)");
    assert_eq!(run.tape[0], 6);
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 45) set8(b, 7) mod8(a, b)");
    assert_eq!(run.tape[0], 3);
    // division by zero leaves the dividend untouched
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 45) div8(a, b)");
    assert_eq!(run.tape[0], 45);
}

#[test]
fn signed_division() {
    // -15 / 4 = -3 (truncating), -15 % 4 = -3
    let run = compile_and_run(
        "alloc_cell8(a) alloc_cell8(b) set8(a, 241) set8(b, 4) sdiv8(a, b)",
    );
    assert_eq!(run.tape[0] as i8, -3);
    let run = compile_and_run(
        "alloc_cell8(a) alloc_cell8(b) set8(a, 241) set8(b, 4) smod8(a, b)",
    );
    assert_eq!(run.tape[0] as i8, -3);
}

#[test]
fn unsigned_comparisons() {
    for (x, y, lt, gt, eq, le, ge) in [
        (3u8, 5u8, 1, 0, 0, 1, 0),
        (5, 3, 0, 1, 0, 0, 1),
        (4, 4, 0, 0, 1, 1, 1),
        (0, 0, 0, 0, 1, 1, 1),
    ] {
        let src = |op: &str| {
            format!(
                "alloc_cell8(a) alloc_cell8(b) set8(a, {x}) set8(b, {y}) {op}(a, b)"
            )
        };
        assert_eq!(compile_and_run(&src("lt8")).tape[0], lt, "lt8({x},{y})");
        assert_eq!(compile_and_run(&src("gt8")).tape[0], gt, "gt8({x},{y})");
        assert_eq!(compile_and_run(&src("eq8")).tape[0], eq, "eq8({x},{y})");
        assert_eq!(compile_and_run(&src("le8")).tape[0], le, "le8({x},{y})");
        assert_eq!(compile_and_run(&src("ge8")).tape[0], ge, "ge8({x},{y})");
    }
}

#[test]
fn signed_comparisons_dispatch_on_sign() {
    // -1 (255) < 1 signed, but > unsigned
    let run = compile_and_run(
        "alloc_cell8(a) alloc_cell8(b) set8(a, 255) set8(b, 1) slt8(a, b)",
    );
    assert_eq!(run.tape[0], 1);
    let run = compile_and_run(
        "alloc_cell8(a) alloc_cell8(b) set8(a, 255) set8(b, 1) lt8(a, b)",
    );
    assert_eq!(run.tape[0], 0);
    // same sign falls back to the unsigned ordering
    let run = compile_and_run(
        "alloc_cell8(a) alloc_cell8(b) set8(a, 250) set8(b, 254) slt8(a, b)",
    );
    assert_eq!(run.tape[0], 1); // -6 < -2
}

#[test]
fn sixteen_bit_comparison_checks_high_byte_first() {
    let run = compile_and_run(
        "alloc_cell16(a) alloc_cell16(b) set16(a, 300) set16(b, 260) gt16(a, b)",
    );
    assert_eq!((run.tape[0], run.tape[1]), (1, 0));
    let run = compile_and_run(
        "alloc_cell16(a) alloc_cell16(b) set16(a, 513) set16(b, 514) lt16(a, b)",
    );
    assert_eq!((run.tape[0], run.tape[1]), (1, 0));
}

#[test]
fn shifts() {
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 3) set8(b, 2) shl8(a, b)");
    assert_eq!(run.tape[0], 12);
    let run = compile_and_run("alloc_cell8(a) alloc_cell8(b) set8(a, 200) set8(b, 3) shr8(a, b)");
    assert_eq!(run.tape[0], 25);
}

#[test]
fn if_else_branches() {
    let taken = "alloc_cell8(c) alloc_cell8(r) set8(c, 1) \
                 if(c) set8(r, 65) else set8(r, 66) endif \
                 print_char8(r)";
    assert_eq!(compile_and_run(taken).output, b"A");

    let not_taken = "alloc_cell8(c) alloc_cell8(r) \
                     if(c) set8(r, 65) else set8(r, 66) endif \
                     print_char8(r)";
    assert_eq!(compile_and_run(not_taken).output, b"B");
}

#[test]
fn if_without_else() {
    let run = compile_and_run(
        "alloc_cell8(c) alloc_cell8(r) if(c) set8(r, 1) endif",
    );
    assert_eq!(run.tape[1], 0);
}

#[test]
fn while_reevaluates_condition() {
    // r := 2^n by repeated doubling
    let run = compile_and_run(
        "alloc_cell8(n) alloc_cell8(r) alloc_cell8(one) \
         set8(n, 4) set8(r, 1) set8(one, 1) \
         while(n) \
           copy8(r, one) \
           add8(r, one) \
           set8(one, 1) \
           sub8(n, one) \
         endwhile",
    );
    assert_eq!(run.tape[1], 16);
}

#[test]
fn repeat_counts_down_its_cell() {
    let run = compile_and_run(
        "alloc_cell8(n) alloc_cell8(r) set8(n, 3) \
         repeat(n) >(r) + <0 endrepeat",
    );
    assert_eq!(run.tape[1], 3);
    // the count cell is consumed
    assert_eq!(run.tape[0], 0);
}

#[test]
fn structural_mismatches_report() {
    let (_, messages) = compile_err("alloc_cell8(c) if(c) +");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("if without matching endif")),
        "{messages:?}"
    );

    let (_, messages) = compile_err("endwhile");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("endwhile without matching while")),
        "{messages:?}"
    );
}

#[test]
fn stack_push_pop_round_trip() {
    let run = compile_and_run(
        "alloc_cell8(a) alloc_cell8(b) set8(a, 42) \
         push8(a) clear8(a) pop8(b)",
    );
    assert_eq!((run.tape[0], run.tape[1]), (0, 42));
}

#[test]
fn push_immediate_and_pop16() {
    let run = compile_and_run("alloc_cell16(a) push16i(777) pop16(a)");
    assert_eq!((run.tape[0], run.tape[1]), (9, 3)); // 777 = 3*256 + 9
}

#[test]
fn globals_region_addressing() {
    let run = compile_and_run(
        "alloc_global16(3) \
         alloc_cell8(v) set8(v, 5) \
         copy8(v, global(2)) \
         free_cell8(v) free_global16",
    );
    // globals base allocates first at address 0; global(2) = base + 4
    assert_eq!(run.tape[4], 5);
}

#[test]
fn frame_addressing() {
    let run = compile_and_run(
        "enter_frame16(1, 1) \
         alloc_cell8(v) set8(v, 7) \
         copy8(v, arg(0)) \
         copy8(v, local(0)) \
         frame_alloc_temp16(1) \
         copy8(v, local_temp(0)) \
         free_cell8(v) \
         leave_frame16",
    );
    // frame starts at the default stack base 1000
    assert_eq!(run.tape[998], 7, "arg(0)");
    assert_eq!(run.tape[996], 7, "local(0)");
    assert_eq!(run.tape[994], 7, "local_temp(0)");
}

#[test]
fn frame_misuse_reports() {
    let (_, messages) = compile_err("leave_frame16");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("leave_frame16 without matching enter_frame16")),
        "{messages:?}"
    );

    let (_, messages) = compile_err(
        "enter_frame16(1, 0) alloc_cell8(v) copy8(v, arg(1)) free_cell8(v) leave_frame16",
    );
    assert!(
        messages
            .iter()
            .any(|m| m.contains("argument index 1 out of range")),
        "{messages:?}"
    );
}

#[test]
fn print_string_and_newline() {
    let run = compile_and_run("print_string(\"Hi!\") print_newline");
    assert_eq!(run.output, b"Hi!\n");
}

#[test]
fn print_decimal_unsigned() {
    let run = compile_and_run("alloc_cell8(a) set8(a, 0) print_cell8(a)");
    assert_eq!(run.output, b"0 ");
    let run = compile_and_run("alloc_cell8(a) set8(a, 255) print_cell8(a)");
    assert_eq!(run.output, b"255 ");
}

#[test]
fn print_decimal_signed() {
    let run = compile_and_run("alloc_cell8(a) set8(a, 214) print_cell8s(a)");
    assert_eq!(run.output, b"-42 ");
    let run = compile_and_run("alloc_cell8(a) set8(a, 42) print_cell8s(a)");
    assert_eq!(run.output, b"42 ");
}

#[test]
fn print_decimal_sixteen_bit() {
    let run = compile_and_run("alloc_cell16(a) set16(a, 1000) print_cell16(a)");
    assert_eq!(run.output, b"1000 ");
}

#[test]
fn alloc_reuses_freed_cells_first_fit() {
    // x at 0, y at 1; free x, then z lands back on 0
    let run = compile_and_run(
        "alloc_cell8(x) alloc_cell8(y) set8(y, 1) \
         free_cell8(x) \
         alloc_cell8(z) set8(z, 9)",
    );
    assert_eq!((run.tape[0], run.tape[1]), (9, 1));
}

#[test]
fn double_free_reports() {
    let (_, messages) = compile_err("alloc_cell8(x) free_cell8(x) free_cell8(x)");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("free_cell8: macro 'x' is not defined")),
        "{messages:?}"
    );
}

#[test]
fn alloc_binding_collision_reports() {
    let (_, messages) = compile_err("alloc_cell8(x) alloc_cell8(x)");
    assert!(
        messages.iter().any(|m| m.contains("macro 'x' redefined")),
        "{messages:?}"
    );
}
