//! The two error categories `interpret` can surface, and the three-way
//! result they report through (`INTERPRET_OK` / `_COMPILE_ERROR` /
//! `_RUNTIME_ERROR`).

use std::fmt;

/// Where, relative to the offending token, a compile error was raised —
/// used to pick between "at '<lexeme>'", "at EOF", and nothing (an
/// `ERROR`-kind token's message already names what went wrong).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLocation {
    Token,
    Eof,
    ScanError,
}

/// One compile-time diagnostic, formatted exactly as
/// `[line:col] Error [at '<lexeme>'|at EOF]: <message>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub line: i32,
    pub column: i32,
    pub where_: ErrorLocation,
    pub lexeme: String,
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] Error", self.line, self.column)?;
        match self.where_ {
            ErrorLocation::Eof => write!(f, " at EOF")?,
            ErrorLocation::ScanError => {}
            ErrorLocation::Token => write!(f, " at '{}'", self.lexeme)?,
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// A runtime error: type mismatch, division by zero, undefined global,
/// or stack/validation failure. Reported as the message followed by
/// `[line N] in script`, after which the VM resets its stack.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub message: String,
    pub line: i32,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        write!(f, "[line {}] in script", self.line)
    }
}

impl std::error::Error for RuntimeError {}

/// The outcome of `interpret`. The API is total: every call returns one
/// of these, never panics or propagates an exception across the crate
/// boundary (out-of-memory aside, which is fatal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}
