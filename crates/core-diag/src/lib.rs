//! Source locations and diagnostic reporting.
//!
//! Diagnostics are accumulated, never thrown: the parser reports and keeps
//! going, and the caller inspects the error count at the end to pick an exit
//! status. Rendering follows the conventional `file:line:col: kind: message`
//! shape so editors can jump to locations.

use std::fmt;
use std::sync::Arc;

/// A position in some input source. Attached to every token and diagnostic;
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub filename: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
        }
    }

    /// Placeholder location for synthesised tokens with no source position.
    pub fn none() -> Self {
        Self {
            filename: Arc::from(""),
            line: 0,
            column: 0,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub loc: SourceLocation,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.loc, self.severity.as_str(), self.message)
    }
}

/// Collects diagnostics and counts errors. Warnings and notes are
/// informational; only errors affect the final status. Notes must follow the
/// diagnostic they annotate, which callers arrange by reporting them
/// back-to-back.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: u32,
    print: bool,
}

impl ErrorReporter {
    /// Reporter that echoes each diagnostic to stderr as it arrives.
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            print: true,
        }
    }

    /// Reporter that only records; used by tests that assert on messages.
    pub fn silent() -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            print: false,
        }
    }

    pub fn error(&mut self, loc: SourceLocation, message: impl Into<String>) {
        self.report(loc, Severity::Error, message.into());
    }

    pub fn warning(&mut self, loc: SourceLocation, message: impl Into<String>) {
        self.report(loc, Severity::Warning, message.into());
    }

    pub fn note(&mut self, loc: SourceLocation, message: impl Into<String>) {
        self.report(loc, Severity::Note, message.into());
    }

    fn report(&mut self, loc: SourceLocation, severity: Severity, message: String) {
        let diag = Diagnostic {
            loc,
            severity,
            message,
        };
        tracing::debug!(target: "diag", severity = severity.as_str(), %diag, "reported");
        if self.print {
            eprintln!("{diag}");
        }
        if severity == Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn reset(&mut self) {
        self.diagnostics.clear();
        self.error_count = 0;
    }
}
