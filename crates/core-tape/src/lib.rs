//! Abstract tape model and Brainfuck output buffer.
//!
//! The tape is a single byte-addressed array shared by three regions: a heap
//! growing upward from cell 0 (first-fit free list with coalescing), a stack
//! growing downward from a configurable base (default 1000) carrying
//! call-frame records, and one-shot globals/temps areas sub-allocated from
//! the heap. `BfOutput` is the only writer of BF instructions and is the
//! source of truth for the virtual tape pointer.

mod alloc;
mod frame;
mod output;

pub use alloc::HeapAlloc;
pub use frame::StackFrame;
pub use output::BfOutput;
