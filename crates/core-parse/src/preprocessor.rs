//! The preprocessor facade: wires the file stack, lexer and parser together
//! and exposes the handful of knobs the command line needs.

use crate::parser::{Parser, is_reserved_keyword};
use crate::table::Macro;
use core_diag::{Diagnostic, ErrorReporter, SourceLocation};
use core_lexer::{Lexer, Token, is_identifier};
use core_source::FileStack;
use std::io::Read;
use tracing::info;

pub struct Preprocessor {
    parser: Parser,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    /// Preprocessor that echoes diagnostics to stderr as they are reported.
    pub fn new() -> Self {
        Self::with_reporter(ErrorReporter::new())
    }

    /// Preprocessor that only records diagnostics; used by tests.
    pub fn silent() -> Self {
        Self::with_reporter(ErrorReporter::silent())
    }

    pub fn with_reporter(diags: ErrorReporter) -> Self {
        Self {
            parser: Parser::new(Lexer::new(FileStack::new()), diags),
        }
    }

    /// Queue a file as an input source. A failure is reported as a
    /// diagnostic and leaves the pipeline runnable (it will produce no
    /// output).
    pub fn push_file(&mut self, filename: &str) -> bool {
        let result = self.parser.lexer_mut().files_mut().push_file(filename);
        match result {
            Ok(()) => true,
            Err(err) => {
                let loc = SourceLocation::new(filename, 0, 0);
                self.parser.diags_mut().error(loc, err.to_string());
                false
            }
        }
    }

    /// Queue an in-memory source under a virtual name.
    pub fn push_source(&mut self, virtual_name: &str, text: impl Into<String>) {
        self.parser
            .lexer_mut()
            .files_mut()
            .push_source(virtual_name, text);
    }

    /// Queue an arbitrary reader, e.g. stdin as `<stdin>`.
    pub fn push_reader(&mut self, virtual_name: &str, reader: impl Read + 'static) {
        self.parser
            .lexer_mut()
            .files_mut()
            .push_reader(virtual_name, reader);
    }

    /// Predefine an object-like macro with an integer body (the `-D` flag).
    pub fn define_macro(&mut self, name: &str, value: i32) -> bool {
        let loc = SourceLocation::new("<command-line>", 0, 0);
        if !is_identifier(name) {
            self.parser
                .diags_mut()
                .error(loc, format!("invalid macro name: {name}"));
            return false;
        }
        if is_reserved_keyword(name) {
            self.parser
                .diags_mut()
                .error(loc, format!("cannot define macro '{name}': reserved name"));
            return false;
        }
        let mac = Macro {
            name: name.to_string(),
            params: vec![],
            body: vec![Token::make_int(value, loc.clone())],
            loc,
        };
        let (table, diags) = self.parser.table_and_diags_mut();
        table.define(mac, diags)
    }

    /// Move the base of the downward-growing tape stack (default 1000).
    /// Only meaningful before `run`.
    pub fn set_stack_base(&mut self, base: i32) {
        self.parser.output_mut().set_stack_base(base);
    }

    /// Run the pipeline to completion. `Some(output)` only when no error
    /// was reported.
    pub fn run(&mut self) -> Option<String> {
        let result = self.parser.run();
        info!(
            target: "preprocess",
            errors = self.error_count(),
            heap_size = self.heap_size(),
            max_stack_depth = self.max_stack_depth(),
            "finished"
        );
        result
    }

    pub fn has_errors(&self) -> bool {
        self.parser.diags().has_errors()
    }

    pub fn error_count(&self) -> u32 {
        self.parser.diags().error_count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.parser.diags().diagnostics()
    }

    /// High-water mark of the tape heap.
    pub fn heap_size(&self) -> i32 {
        self.parser.output().heap_size()
    }

    /// Deepest extent of the tape stack below its base.
    pub fn max_stack_depth(&self) -> i32 {
        self.parser.output().max_stack_depth()
    }
}
