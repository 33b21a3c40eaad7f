#![allow(dead_code)] // Shared across several integration test binaries; each uses a subset.

use core_parse::Preprocessor;

/// Run the whole pipeline over an in-memory source.
pub fn compile(src: &str) -> (Option<String>, Preprocessor) {
    let mut pp = Preprocessor::silent();
    pp.push_source("test.bfpp", src);
    let output = pp.run();
    (output, pp)
}

/// Compile and insist on a clean run.
pub fn compile_ok(src: &str) -> String {
    let (output, pp) = compile(src);
    assert!(
        !pp.has_errors(),
        "unexpected diagnostics for {src:?}: {:#?}",
        pp.diagnostics()
    );
    output.expect("no output despite clean diagnostics")
}

/// Compile expecting at least one error; returns the diagnostic messages.
pub fn compile_err(src: &str) -> (Option<String>, Vec<String>) {
    let (output, pp) = compile(src);
    assert!(pp.has_errors(), "expected diagnostics for {src:?}");
    let messages = pp
        .diagnostics()
        .iter()
        .map(|d| d.to_string())
        .collect();
    (output, messages)
}

/// Just the eight BF instruction characters of a rendering.
pub fn bf_payload(text: &str) -> String {
    text.chars().filter(|c| "+-<>[].,".contains(*c)).collect()
}

pub struct BfRun {
    pub output: Vec<u8>,
    pub tape: Vec<u8>,
    pub steps: u64,
}

const STEP_LIMIT: u64 = 200_000_000;

/// Reference interpreter: unbounded zero-initialised tape of wrapping byte
/// cells, `,` reads 0 (no input). Panics on pointer underflow or unbalanced
/// loops, which doubles as the output-validity check.
pub fn run_bf(program: &str) -> BfRun {
    let code: Vec<u8> = program
        .bytes()
        .filter(|b| b"+-<>[].,".contains(b))
        .collect();

    // match brackets up front
    let mut jumps = vec![0usize; code.len()];
    let mut stack = Vec::new();
    for (i, &op) in code.iter().enumerate() {
        match op {
            b'[' => stack.push(i),
            b']' => {
                let open = stack.pop().expect("unmatched ']' in emitted program");
                jumps[open] = i;
                jumps[i] = open;
            }
            _ => {}
        }
    }
    assert!(stack.is_empty(), "unmatched '[' in emitted program");

    let mut tape = vec![0u8; 16];
    let mut ptr = 0usize;
    let mut pc = 0usize;
    let mut output = Vec::new();
    let mut steps = 0u64;

    while pc < code.len() {
        steps += 1;
        assert!(steps < STEP_LIMIT, "interpreter step limit exceeded");
        match code[pc] {
            b'>' => {
                ptr += 1;
                if ptr >= tape.len() {
                    tape.resize(ptr + 16, 0);
                }
            }
            b'<' => {
                assert!(ptr > 0, "tape pointer underflow at pc {pc}");
                ptr -= 1;
            }
            b'+' => tape[ptr] = tape[ptr].wrapping_add(1),
            b'-' => tape[ptr] = tape[ptr].wrapping_sub(1),
            b'.' => output.push(tape[ptr]),
            b',' => tape[ptr] = 0,
            b'[' => {
                if tape[ptr] == 0 {
                    pc = jumps[pc];
                }
            }
            b']' => {
                if tape[ptr] != 0 {
                    pc = jumps[pc];
                }
            }
            _ => unreachable!(),
        }
        pc += 1;
    }

    BfRun {
        output,
        tape,
        steps,
    }
}

/// Compile, execute, and hand back the machine state.
pub fn compile_and_run(src: &str) -> BfRun {
    run_bf(&compile_ok(src))
}
