//! Lexing for the preprocessor source language.
//!
//! The pipeline is line oriented: the comment stripper produces logical lines
//! with `//` and `/* */` removed (block comments may span lines, neither form
//! applies inside string literals), and the scanner converts each logical
//! line into tokens. Two state bits drive the scanner, both scoped to one
//! line: `in_directive` is set when the first token of the line is a `#`
//! directive, and `expr_depth` counts unmatched `(`. Outside both, the eight
//! characters `+ - < > [ ] . ,` are Brainfuck instructions; inside either,
//! they and the rest of the C operator set are expression operators.

mod scanner;
mod token;

pub use scanner::TokenScanner;
pub use token::{Token, TokenKind};

use core_diag::{ErrorReporter, SourceLocation};
use core_source::{FileStack, SourceLine};

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn is_integer(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Removes comments from raw lines, outside string literals. Block comment
/// state survives across lines and across file boundaries.
#[derive(Debug, Default)]
pub struct CommentStripper {
    in_block_comment: bool,
    block_comment_start: Option<SourceLocation>,
}

impl CommentStripper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn getline(&mut self, files: &mut FileStack) -> Option<SourceLine> {
        let mut line = files.getline()?;
        line.text = self.strip(&line);
        Some(line)
    }

    /// Location of a block comment left open at end of input, if any.
    pub fn unterminated_comment(&self) -> Option<&SourceLocation> {
        if self.in_block_comment {
            self.block_comment_start.as_ref()
        } else {
            None
        }
    }

    fn strip(&mut self, line: &SourceLine) -> String {
        let bytes = line.text.as_bytes();
        let mut clean = String::with_capacity(bytes.len());
        let mut in_string = false;
        let mut i = 0;

        while i < bytes.len() {
            let c = bytes[i] as char;

            if self.in_block_comment {
                if c == '*' && bytes.get(i + 1) == Some(&b'/') {
                    self.in_block_comment = false;
                    self.block_comment_start = None;
                    i += 1; // consume '/'
                }
                i += 1;
                continue;
            }

            if !in_string {
                if c == '"' {
                    in_string = true;
                    clean.push(c);
                } else if c == '/' && bytes.get(i + 1) == Some(&b'/') {
                    break; // line comment: drop rest of line
                } else if c == '/' && bytes.get(i + 1) == Some(&b'*') {
                    self.in_block_comment = true;
                    self.block_comment_start = Some(SourceLocation::new(
                        std::sync::Arc::clone(&line.filename),
                        line.line_num,
                        i as u32 + 1,
                    ));
                    i += 1; // consume '*'
                } else {
                    clean.push(c);
                }
            } else {
                clean.push(c);
                if c == '"' {
                    in_string = false;
                }
            }
            i += 1;
        }

        clean
    }
}

/// Line-buffered token source with arbitrary look-ahead. The buffer grows
/// lazily as `peek` reaches past its end and is compacted once enough tokens
/// have been consumed.
pub struct Lexer {
    files: FileStack,
    stripper: CommentStripper,
    scanner: TokenScanner,
    tokens: Vec<Token>,
    pos: usize,
    reported_open_comment: bool,
}

const COMPACT_THRESHOLD: usize = 100;

impl Lexer {
    pub fn new(files: FileStack) -> Self {
        Self {
            files,
            stripper: CommentStripper::new(),
            scanner: TokenScanner::new(),
            tokens: Vec::new(),
            pos: 0,
            reported_open_comment: false,
        }
    }

    pub fn files_mut(&mut self) -> &mut FileStack {
        &mut self.files
    }

    pub fn get(&mut self, diags: &mut ErrorReporter) -> Token {
        while self.pos >= self.tokens.len() {
            if self.pos > COMPACT_THRESHOLD {
                self.tokens.drain(..self.pos);
                self.pos = 0;
            }
            if !self.refill(diags) {
                return self.end_of_input(diags);
            }
        }
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        tok
    }

    pub fn peek(&mut self, offset: usize, diags: &mut ErrorReporter) -> Token {
        while self.pos + offset >= self.tokens.len() {
            if !self.refill(diags) {
                return self.end_of_input(diags);
            }
        }
        self.tokens[self.pos + offset].clone()
    }

    fn refill(&mut self, diags: &mut ErrorReporter) -> bool {
        match self.stripper.getline(&mut self.files) {
            Some(line) => {
                tracing::trace!(
                    target: "lexer",
                    file = %line.filename,
                    line = line.line_num,
                    "scan_line"
                );
                self.scanner.scan_line(
                    &line.text,
                    &line.filename,
                    line.line_num,
                    &mut self.tokens,
                    diags,
                );
                true
            }
            None => false,
        }
    }

    fn end_of_input(&mut self, diags: &mut ErrorReporter) -> Token {
        if !self.reported_open_comment
            && let Some(loc) = self.stripper.unterminated_comment()
        {
            self.reported_open_comment = true;
            diags.error(loc.clone(), "unterminated block comment");
        }
        Token::new(TokenKind::EndOfInput, "", self.files.location())
    }
}
