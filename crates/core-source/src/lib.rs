//! Input sources for the preprocessor: a pushable stack of files, stdin and
//! in-memory strings.
//!
//! `#include` pushes a new source on top; line reads always come from the
//! topmost source and exhausted sources are popped transparently, so the
//! included file's lines are delivered before the parent's remaining lines.
//! Line terminators may be `\n` or `\r\n`; the final line may lack one.

use core_diag::SourceLocation;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("cannot open file")]
    CannotOpen(#[source] std::io::Error),
    #[error("#include loop detected for '{0}'")]
    IncludeLoop(String),
}

/// One line of input, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub text: String,
    pub filename: Arc<str>,
    pub line_num: u32,
}

/// A single open input source with a cursor for line numbering.
pub struct InputFile {
    filename: Arc<str>,
    reader: Box<dyn BufRead>,
    line_num: u32,
}

impl InputFile {
    fn new(filename: impl Into<Arc<str>>, reader: Box<dyn BufRead>) -> Self {
        Self {
            filename: filename.into(),
            reader,
            line_num: 1,
        }
    }

    pub fn filename(&self) -> &Arc<str> {
        &self.filename
    }

    pub fn line_num(&self) -> u32 {
        self.line_num
    }

    /// Read the next line, stripping the terminator. Returns `None` at end of
    /// input; a trailing line without a newline is still returned.
    pub fn getline(&mut self) -> Option<SourceLine> {
        let mut raw = Vec::new();
        match self.reader.read_until(b'\n', &mut raw) {
            Ok(0) => None,
            Ok(_) => {
                if raw.last() == Some(&b'\n') {
                    raw.pop();
                }
                if raw.last() == Some(&b'\r') {
                    raw.pop();
                }
                let line = SourceLine {
                    text: String::from_utf8_lossy(&raw).into_owned(),
                    filename: Arc::clone(&self.filename),
                    line_num: self.line_num,
                };
                self.line_num += 1;
                Some(line)
            }
            Err(err) => {
                debug!(target: "source", file = %self.filename, ?err, "read_error");
                None
            }
        }
    }
}

impl std::fmt::Debug for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputFile")
            .field("filename", &self.filename)
            .field("line_num", &self.line_num)
            .finish_non_exhaustive()
    }
}

/// Stack of input sources. `getline` reads from the top, popping exhausted
/// sources until one yields a line or the stack runs dry.
#[derive(Debug, Default)]
pub struct FileStack {
    stack: Vec<InputFile>,
}

impl FileStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a file by name. Fails if the file cannot be opened or if the same
    /// name is already open somewhere on the stack (an `#include` cycle).
    pub fn push_file(&mut self, filename: &str) -> Result<(), OpenError> {
        if self.stack.iter().any(|f| f.filename.as_ref() == filename) {
            return Err(OpenError::IncludeLoop(filename.to_string()));
        }
        let file = File::open(filename).map_err(OpenError::CannotOpen)?;
        debug!(target: "source", file = filename, depth = self.stack.len() + 1, "push_file");
        self.stack
            .push(InputFile::new(filename, Box::new(BufReader::new(file))));
        Ok(())
    }

    /// Push an in-memory source under a virtual name, e.g. `<stdin>`.
    pub fn push_source(&mut self, virtual_name: &str, text: impl Into<String>) {
        debug!(target: "source", file = virtual_name, depth = self.stack.len() + 1, "push_source");
        let cursor = std::io::Cursor::new(text.into());
        self.stack
            .push(InputFile::new(virtual_name, Box::new(BufReader::new(cursor))));
    }

    /// Push an arbitrary reader (used for stdin).
    pub fn push_reader(&mut self, virtual_name: &str, reader: impl Read + 'static) {
        debug!(target: "source", file = virtual_name, depth = self.stack.len() + 1, "push_reader");
        self.stack
            .push(InputFile::new(virtual_name, Box::new(BufReader::new(reader))));
    }

    pub fn pop(&mut self) {
        if let Some(f) = self.stack.pop() {
            debug!(target: "source", file = %f.filename(), depth = self.stack.len(), "pop_file");
        }
    }

    pub fn getline(&mut self) -> Option<SourceLine> {
        while let Some(top) = self.stack.last_mut() {
            if let Some(line) = top.getline() {
                return Some(line);
            }
            self.pop();
        }
        None
    }

    /// Name of the current topmost source, for end-of-input locations.
    pub fn filename(&self) -> Arc<str> {
        self.stack
            .last()
            .map(|f| Arc::clone(f.filename()))
            .unwrap_or_else(|| Arc::from(""))
    }

    pub fn line_num(&self) -> u32 {
        self.stack.last().map(|f| f.line_num()).unwrap_or(0)
    }

    /// Location describing the current read position.
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.filename(), self.line_num(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_lines_and_pops_exhausted_sources() {
        let mut stack = FileStack::new();
        stack.push_source("outer", "one\ntwo");
        stack.push_source("inner", "alpha\n");

        let l = stack.getline().unwrap();
        assert_eq!((l.text.as_str(), l.line_num), ("alpha", 1));
        assert_eq!(l.filename.as_ref(), "inner");

        let l = stack.getline().unwrap();
        assert_eq!((l.text.as_str(), l.filename.as_ref()), ("one", "outer"));
        let l = stack.getline().unwrap();
        assert_eq!((l.text.as_str(), l.line_num), ("two", 2));
        assert!(stack.getline().is_none());
    }

    #[test]
    fn strips_crlf() {
        let mut stack = FileStack::new();
        stack.push_source("f", "a\r\nb\n");
        assert_eq!(stack.getline().unwrap().text, "a");
        assert_eq!(stack.getline().unwrap().text, "b");
    }

    #[test]
    fn last_line_without_newline() {
        let mut stack = FileStack::new();
        stack.push_source("f", "tail");
        assert_eq!(stack.getline().unwrap().text, "tail");
        assert!(stack.getline().is_none());
    }

    #[test]
    fn detects_include_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("self.bfpp");
        write!(std::fs::File::create(&path).unwrap(), "+").unwrap();
        let name = path.to_str().unwrap();

        let mut stack = FileStack::new();
        stack.push_file(name).unwrap();
        let err = stack.push_file(name).unwrap_err();
        assert!(matches!(err, OpenError::IncludeLoop(_)));
    }

    #[test]
    fn missing_file_is_cannot_open() {
        let mut stack = FileStack::new();
        let err = stack.push_file("no/such/file.bfpp").unwrap_err();
        assert!(matches!(err, OpenError::CannotOpen(_)));
    }
}
