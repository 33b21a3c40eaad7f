use core_parse::Preprocessor;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

// A program that leans on the expensive paths: nested expansions, 16-bit
// arithmetic composition and decimal printing.
const PROGRAM: &str = "\
#define COUNT 12
alloc_cell16(acc) alloc_cell16(step)
set16(step, 3)
alloc_cell8(n) set8(n, COUNT)
while(n)
  add16(acc, step)
  alloc_cell8(one) set8(one, 1)
  sub8(n, one)
  free_cell8(one)
endwhile
print_cell16(acc)
free_cell8(n)
free_cell16(acc) free_cell16(step)
";

fn preprocess_program(c: &mut Criterion) {
    c.bench_function("preprocess_16bit_loop", |b| {
        b.iter(|| {
            let mut pp = Preprocessor::silent();
            pp.push_source("bench.bfpp", black_box(PROGRAM));
            let output = pp.run();
            assert!(output.is_some());
            black_box(output)
        })
    });
}

fn scan_heavy(c: &mut Criterion) {
    let flat: String = "+>-<".repeat(4000);
    c.bench_function("preprocess_flat_instructions", |b| {
        b.iter(|| {
            let mut pp = Preprocessor::silent();
            pp.push_source("flat.bfpp", black_box(flat.as_str()));
            black_box(pp.run())
        })
    });
}

criterion_group!(benches, preprocess_program, scan_heavy);
criterion_main!(benches);
