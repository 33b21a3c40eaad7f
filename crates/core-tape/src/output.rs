//! The Brainfuck output buffer and the abstract tape it targets.
//!
//! `put` accepts one BF instruction token at a time, tracking the virtual
//! tape pointer (`>`/`<`), guarding against pointer underflow and recording
//! `[`/`]` for balance. The same type owns the tape address model: the heap
//! allocator, the downward stack with its frame records, and the one-shot
//! globals and temps regions. Rendering and the tape-movement coalescing
//! pass live here too, at the end of the pipeline.

use crate::alloc::HeapAlloc;
use crate::frame::StackFrame;
use core_diag::{ErrorReporter, SourceLocation};
use core_lexer::{Token, TokenKind};
use tracing::trace;

const DEFAULT_STACK_BASE: i32 = 1000;
const WRAP_COLUMN: usize = 80;

pub struct BfOutput {
    tape_ptr: i32,
    heap: HeapAlloc,
    stack_base: i32,
    stack_ptr: i32,
    min_stack_ptr: i32,
    global_region: Option<(i32, i32)>, // (base address, count16)
    temp_region: Option<(i32, i32)>,
    frame_stack: Vec<StackFrame>,
    loop_stack: Vec<SourceLocation>,
    out: Vec<Token>,
}

impl Default for BfOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl BfOutput {
    pub fn new() -> Self {
        Self {
            tape_ptr: 0,
            heap: HeapAlloc::new(),
            stack_base: DEFAULT_STACK_BASE,
            stack_ptr: DEFAULT_STACK_BASE,
            min_stack_ptr: DEFAULT_STACK_BASE,
            global_region: None,
            temp_region: None,
            frame_stack: Vec::new(),
            loop_stack: Vec::new(),
            out: Vec::new(),
        }
    }

    /// Append one BF instruction, validating it against the virtual tape.
    /// An unmatched `]` is reported and dropped.
    pub fn put(&mut self, tok: Token, diags: &mut ErrorReporter) {
        if tok.kind != TokenKind::BFInstr {
            diags.error(
                tok.loc,
                format!("non-BF instruction token in output: '{}'", tok.text),
            );
            return;
        }

        match tok.text.as_str() {
            ">" => self.tape_ptr += 1,
            "<" => {
                if self.tape_ptr == 0 {
                    diags.error(tok.loc, "tape pointer moved to negative position");
                    return;
                }
                self.tape_ptr -= 1;
            }
            "[" => self.loop_stack.push(tok.loc.clone()),
            "]" => {
                if self.loop_stack.pop().is_none() {
                    diags.error(tok.loc, "unmatched ']' instruction");
                    return;
                }
            }
            _ => {}
        }

        self.out.push(tok);
    }

    /// Report every `[` still open at end of input.
    pub fn check_loops(&self, diags: &mut ErrorReporter) {
        for loc in &self.loop_stack {
            diags.error(loc.clone(), "unmatched '[' instruction");
        }
    }

    pub fn tape_ptr(&self) -> i32 {
        self.tape_ptr
    }

    pub fn instr_count(&self) -> usize {
        self.out.len()
    }

    // ---- heap ----

    pub fn alloc_cells(&mut self, count: i32) -> i32 {
        let addr = self.heap.alloc(count);
        trace!(target: "tape.alloc", addr, count, heap_high = self.heap.heap_high(), "alloc_cells");
        addr
    }

    pub fn free_cells(&mut self, loc: &SourceLocation, addr: i32, diags: &mut ErrorReporter) {
        match self.heap.free(addr) {
            Some(count) => {
                trace!(target: "tape.alloc", addr, count, heap_high = self.heap.heap_high(), "free_cells");
            }
            None => diags.error(
                loc.clone(),
                format!("attempt to free unknown allocation at address {addr}"),
            ),
        }
    }

    pub fn heap_size(&self) -> i32 {
        self.heap.heap_high()
    }

    pub fn heap_free_list(&self) -> &[(i32, i32)] {
        self.heap.free_list()
    }

    pub fn live_allocations(&self) -> usize {
        self.heap.live_allocations()
    }

    // ---- globals / temps regions ----

    pub fn alloc_global(&mut self, tok: &Token, count16: i32, diags: &mut ErrorReporter) -> i32 {
        Self::alloc_region(
            &mut self.heap,
            &mut self.global_region,
            "global",
            tok,
            count16,
            diags,
        )
    }

    pub fn free_global(&mut self, loc: &SourceLocation, diags: &mut ErrorReporter) {
        Self::free_region(&mut self.heap, &mut self.global_region, "global", loc, diags);
    }

    pub fn global_address(&self, tok: &Token, n: i32, diags: &mut ErrorReporter) -> i32 {
        Self::region_address(&self.global_region, "global", tok, n, diags)
    }

    pub fn alloc_temp(&mut self, tok: &Token, count16: i32, diags: &mut ErrorReporter) -> i32 {
        Self::alloc_region(
            &mut self.heap,
            &mut self.temp_region,
            "temp",
            tok,
            count16,
            diags,
        )
    }

    pub fn free_temp(&mut self, loc: &SourceLocation, diags: &mut ErrorReporter) {
        Self::free_region(&mut self.heap, &mut self.temp_region, "temp", loc, diags);
    }

    pub fn temp_address(&self, tok: &Token, n: i32, diags: &mut ErrorReporter) -> i32 {
        Self::region_address(&self.temp_region, "temp", tok, n, diags)
    }

    fn alloc_region(
        heap: &mut HeapAlloc,
        region: &mut Option<(i32, i32)>,
        name: &str,
        tok: &Token,
        count16: i32,
        diags: &mut ErrorReporter,
    ) -> i32 {
        if let Some((addr, _)) = *region {
            diags.error(tok.loc.clone(), format!("{name} area already allocated"));
            return addr;
        }
        if count16 <= 0 {
            diags.error(tok.loc.clone(), format!("invalid {name} area size {count16}"));
            return 0;
        }
        let addr = heap.alloc(2 * count16);
        trace!(target: "tape.alloc", region = name, addr, count16, "alloc_region");
        *region = Some((addr, count16));
        addr
    }

    fn free_region(
        heap: &mut HeapAlloc,
        region: &mut Option<(i32, i32)>,
        name: &str,
        loc: &SourceLocation,
        diags: &mut ErrorReporter,
    ) {
        match region.take() {
            Some((addr, _)) => {
                heap.free(addr);
                trace!(target: "tape.alloc", region = name, addr, "free_region");
            }
            None => diags.error(loc.clone(), format!("{name} area not allocated")),
        }
    }

    fn region_address(
        region: &Option<(i32, i32)>,
        name: &str,
        tok: &Token,
        n: i32,
        diags: &mut ErrorReporter,
    ) -> i32 {
        match *region {
            None => {
                diags.error(tok.loc.clone(), format!("{name} area not allocated"));
                0
            }
            Some((_, count16)) if n < 0 || n >= count16 => {
                diags.error(
                    tok.loc.clone(),
                    format!("{name} index {n} out of range (area holds {count16})"),
                );
                0
            }
            Some((addr, _)) => addr + 2 * n,
        }
    }

    // ---- stack ----

    pub fn set_stack_base(&mut self, base: i32) {
        self.stack_base = base;
        self.stack_ptr = base;
        self.min_stack_ptr = base;
    }

    pub fn stack_ptr(&self) -> i32 {
        self.stack_ptr
    }

    pub fn max_stack_depth(&self) -> i32 {
        self.stack_base - self.min_stack_ptr
    }

    /// Reserve `count` cells below the stack pointer; returns the new (low)
    /// address of the reservation.
    pub fn alloc_stack(&mut self, loc: &SourceLocation, count: i32, diags: &mut ErrorReporter) -> i32 {
        let new_sp = self.stack_ptr - count;
        if new_sp < 0 {
            diags.error(loc.clone(), "stack exhausted");
            return self.stack_ptr;
        }
        self.stack_ptr = new_sp;
        self.min_stack_ptr = self.min_stack_ptr.min(new_sp);
        trace!(target: "tape.stack", stack_ptr = new_sp, count, "alloc_stack");
        new_sp
    }

    pub fn free_stack(&mut self, loc: &SourceLocation, count: i32, diags: &mut ErrorReporter) {
        self.stack_ptr += count;
        if self.stack_ptr > self.stack_base {
            diags.error(loc.clone(), "stack underflow");
            self.stack_ptr = self.stack_base;
        }
        trace!(target: "tape.stack", stack_ptr = self.stack_ptr, count, "free_stack");
    }

    // ---- frames ----

    pub fn enter_frame(&mut self, tok: &Token, args16: i32, locals16: i32, diags: &mut ErrorReporter) {
        if args16 < 0 || locals16 < 0 {
            diags.error(tok.loc.clone(), "negative frame size");
            return;
        }
        let frame = StackFrame::new(tok.loc.clone(), self.stack_ptr, args16, locals16);
        self.alloc_stack(&tok.loc, 2 * (args16 + locals16), diags);
        trace!(
            target: "tape.frame",
            start = frame.start_stack_ptr,
            args16,
            locals16,
            depth = self.frame_stack.len() + 1,
            "enter_frame"
        );
        self.frame_stack.push(frame);
    }

    pub fn leave_frame(&mut self, tok: &Token, diags: &mut ErrorReporter) {
        match self.frame_stack.pop() {
            Some(frame) => {
                self.free_stack(&tok.loc, frame.size(), diags);
                trace!(
                    target: "tape.frame",
                    start = frame.start_stack_ptr,
                    depth = self.frame_stack.len(),
                    "leave_frame"
                );
            }
            None => diags.error(
                tok.loc.clone(),
                "leave_frame16 without matching enter_frame16",
            ),
        }
    }

    pub fn frame_alloc_temp(&mut self, tok: &Token, temps16: i32, diags: &mut ErrorReporter) {
        if temps16 <= 0 {
            diags.error(tok.loc.clone(), format!("invalid frame temp count {temps16}"));
            return;
        }
        if self.frame_stack.is_empty() {
            diags.error(
                tok.loc.clone(),
                "frame_alloc_temp16 without matching enter_frame16",
            );
            return;
        }
        self.alloc_stack(&tok.loc, 2 * temps16, diags);
        if let Some(top) = self.frame_stack.last_mut() {
            top.num_temps16 += temps16;
        }
    }

    pub fn frame_arg_address(&self, tok: &Token, n: i32, diags: &mut ErrorReporter) -> i32 {
        self.frame_address(tok, n, diags, "argument", StackFrame::arg_address)
    }

    pub fn frame_local_address(&self, tok: &Token, n: i32, diags: &mut ErrorReporter) -> i32 {
        self.frame_address(tok, n, diags, "local", StackFrame::local_address)
    }

    pub fn frame_temp_address(&self, tok: &Token, n: i32, diags: &mut ErrorReporter) -> i32 {
        self.frame_address(tok, n, diags, "frame temp", StackFrame::temp_address)
    }

    fn frame_address(
        &self,
        tok: &Token,
        n: i32,
        diags: &mut ErrorReporter,
        what: &str,
        select: fn(&StackFrame, i32) -> Option<i32>,
    ) -> i32 {
        let Some(frame) = self.frame_stack.last() else {
            diags.error(tok.loc.clone(), format!("{what} reference outside any frame"));
            return 0;
        };
        match select(frame, n) {
            Some(addr) => addr,
            None => {
                diags.error(tok.loc.clone(), format!("{what} index {n} out of range"));
                0
            }
        }
    }

    // ---- finishing passes ----

    /// Fold runs of `<`/`>` between non-movement instructions into their net
    /// displacement. Runs that cancel vanish entirely. Idempotent.
    pub fn optimize_tape_movements(&mut self) {
        let mut optimized: Vec<Token> = Vec::with_capacity(self.out.len());
        let mut net: i32 = 0;

        let flush = |optimized: &mut Vec<Token>, net: &mut i32, loc: &SourceLocation| {
            let (instr, count) = if *net >= 0 { ('>', *net) } else { ('<', -*net) };
            for _ in 0..count {
                optimized.push(Token::make_bf(instr, loc.clone()));
            }
            *net = 0;
        };

        for tok in std::mem::take(&mut self.out) {
            match tok.text.as_str() {
                ">" => net += 1,
                "<" => net -= 1,
                _ => {
                    flush(&mut optimized, &mut net, &tok.loc);
                    optimized.push(tok);
                }
            }
        }
        flush(&mut optimized, &mut net, &SourceLocation::none());
        self.out = optimized;
    }

    /// Lay the instruction stream out for reading: blank lines follow source
    /// line numbers, `[` opens an indented block on its own line, `]` closes
    /// it, and long runs wrap at the 80th column.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut line_num: u32 = 1;
        let mut indent: usize = 0;
        let mut col: usize = 0; // 0 means at start of an output line

        let newline = |out: &mut String, line_num: &mut u32, col: &mut usize| {
            out.push('\n');
            *line_num += 1;
            *col = 0;
        };

        for tok in &self.out {
            while line_num < tok.loc.line {
                newline(&mut out, &mut line_num, &mut col);
            }

            match tok.text.as_str() {
                "[" => {
                    if col > 0 {
                        newline(&mut out, &mut line_num, &mut col);
                    }
                    out.push_str(&"  ".repeat(indent));
                    out.push('[');
                    newline(&mut out, &mut line_num, &mut col);
                    indent += 1;
                }
                "]" => {
                    if col > 0 {
                        newline(&mut out, &mut line_num, &mut col);
                    }
                    indent = indent.saturating_sub(1);
                    out.push_str(&"  ".repeat(indent));
                    out.push(']');
                    newline(&mut out, &mut line_num, &mut col);
                }
                text => {
                    let pad = indent * 2;
                    if col == 0 {
                        out.push_str(&"  ".repeat(indent));
                        col = pad;
                    } else if col + text.len() > WRAP_COLUMN {
                        newline(&mut out, &mut line_num, &mut col);
                        out.push_str(&"  ".repeat(indent));
                        col = pad;
                    }
                    out.push_str(text);
                    col += text.len();
                }
            }
        }

        if col > 0 {
            out.push('\n');
        }
        out
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
