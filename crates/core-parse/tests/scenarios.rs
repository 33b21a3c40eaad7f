//! End-to-end pipeline scenarios, executed on the reference interpreter
//! where the expected observable is runtime behaviour.

mod common;

use common::{bf_payload, compile, compile_and_run, compile_err, compile_ok, run_bf};
use core_parse::Preprocessor;

#[test]
fn interpreter_smoke() {
    // print 'A' (65 = 5 * 13)
    let run = run_bf("+++++[>+++++++++++++<-]>.");
    assert_eq!(run.output, b"A");
}

#[test]
fn hello_byte_via_builtins() {
    // S1: allocate, set, print, free; 'H' lands on stdout and the tape ends
    // fully zeroed.
    let run = compile_and_run("alloc_cell8(c) set8(c, 72) print_char8(c) free_cell8(c)");
    assert_eq!(run.output, b"H");
    assert!(
        run.tape.iter().all(|&cell| cell == 0),
        "tape not restored: {:?}",
        run.tape
    );
}

#[test]
fn object_macro_as_repeat_count() {
    // S2: the macro body is an expression; `+N` repeats the instruction.
    let output = compile_ok("#define N 3+4\n+N");
    assert_eq!(bf_payload(&output), "+++++++");
}

#[test]
fn conditional_compilation_with_predefine() {
    // S3 with -DFLAG
    let src = "#if defined(FLAG)\n+\n#else\n-\n#endif";

    let mut pp = Preprocessor::silent();
    pp.define_macro("FLAG", 1);
    pp.push_source("test.bfpp", src);
    let output = pp.run().expect("clean run");
    assert_eq!(bf_payload(&output), "+");

    // and without
    let output = compile_ok(src);
    assert_eq!(bf_payload(&output), "-");
}

#[test]
fn sixteen_bit_add_carries() {
    // S4: 255 + 1 = 256 -> low 0, high 1 (little endian at addr(a)).
    let run = compile_and_run(
        "alloc_cell16(a) alloc_cell16(b) set16(a, 255) set16(b, 1) add16(a, b)",
    );
    assert_eq!(run.tape[0], 0, "low byte of a");
    assert_eq!(run.tape[1], 1, "high byte of a");
    // b is preserved
    assert_eq!(run.tape[2], 1);
    assert_eq!(run.tape[3], 0);
}

#[test]
fn macro_redefinition_reports_and_suppresses_output() {
    // S5
    let (output, messages) = compile_err("#define X 1\n#define X 2");
    assert!(output.is_none());
    assert!(
        messages
            .iter()
            .any(|m| m.contains("test.bfpp:2:") && m.contains("error: macro 'X' redefined")),
        "{messages:?}"
    );
    assert!(
        messages
            .iter()
            .any(|m| m.contains("test.bfpp:1:") && m.contains("note: previous definition was here")),
        "{messages:?}"
    );
}

#[test]
fn include_loop_is_detected() {
    // S6: a includes b includes a.
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.bfpp");
    let b = dir.path().join("b.bfpp");
    std::fs::write(&a, format!("#include \"{}\"\n+", b.display())).unwrap();
    std::fs::write(&b, format!("#include \"{}\"\n-", a.display())).unwrap();

    let mut pp = Preprocessor::silent();
    assert!(pp.push_file(a.to_str().unwrap()));
    let output = pp.run();
    assert!(output.is_none());
    assert!(
        pp.diagnostics()
            .iter()
            .any(|d| d.message.contains("#include loop")),
        "{:#?}",
        pp.diagnostics()
    );
}

#[test]
fn include_splices_file_content() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join("lib.bfpp");
    std::fs::write(&lib, "#define THREE 3\n").unwrap();

    let mut pp = Preprocessor::silent();
    pp.push_source(
        "main.bfpp",
        format!("#include \"{}\"\n+THREE", lib.display()),
    );
    let output = pp.run().expect("clean run");
    assert!(!pp.has_errors(), "{:#?}", pp.diagnostics());
    assert_eq!(bf_payload(&output), "+++");
}

#[test]
fn pure_brainfuck_round_trips() {
    // A program without directives or identifiers passes through unchanged
    // (modulo layout).
    let src = "++[>+<-]>.";
    let output = compile_ok(src);
    assert_eq!(bf_payload(&output), src);
}

#[test]
fn emitted_programs_are_loop_balanced_and_underflow_free() {
    // run_bf asserts balance and underflow internally; exercise a program
    // that leans on every structural built-in at once.
    let run = compile_and_run(
        "alloc_cell8(n) alloc_cell8(sum) \
         set8(n, 5) \
         while(n) \
           add8(sum, n) \
           alloc_cell8(one) set8(one, 1) \
           sub8(n, one) \
           free_cell8(one) \
         endwhile \
         print_cell8(sum) \
         free_cell8(n) free_cell8(sum)",
    );
    assert_eq!(run.output, b"15 ");
}

#[test]
fn plus_with_zero_count_emits_nothing() {
    let output = compile_ok("+0");
    assert_eq!(bf_payload(&output), "");
}

#[test]
fn negative_count_inverts_opcode() {
    let output = compile_ok("+(0-3)");
    assert_eq!(bf_payload(&output), "---");
}

#[test]
fn move_to_current_position_emits_nothing() {
    let output = compile_ok(">5 >5 <0 <0");
    // the second >5 and second <0 are no-ops; net movement cancels entirely
    assert_eq!(bf_payload(&output), "");
}

#[test]
fn alloc_free_round_trip_restores_allocator_state() {
    // alloc then free: X is gone from the macro table (using it afterwards
    // is an unknown-identifier error) and the heap high-water returns to 0.
    let (output, messages) = compile_err("alloc_cell8(X) free_cell8(X) +X");
    assert!(output.is_none());
    assert!(
        messages.iter().any(|m| m.contains("'X' is not defined")),
        "{messages:?}"
    );

    let (_, pp) = compile("alloc_cell8(X) free_cell8(X)");
    assert_eq!(pp.heap_size(), 0);
}

#[test]
fn stdin_style_reader_input() {
    let mut pp = Preprocessor::silent();
    pp.push_reader("<stdin>", std::io::Cursor::new("+3".as_bytes().to_vec()));
    let output = pp.run().expect("clean run");
    assert_eq!(bf_payload(&output), "+++");
}
