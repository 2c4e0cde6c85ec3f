use std::fmt;

use thiserror::Error;

/// Classification of a halting condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A value had the wrong shape for the requested operation.
    Type,
    /// A slot lookup found no binding.
    Key,
    /// A child lookup was out of range.
    Index,
    /// The tokenizer could not produce a node.
    Lexer,
    /// The token stream matched no grammar rule.
    Syntax,
    /// A constructor precondition failed.
    Assertion,
}

/// A fatal condition with enough context to diagnose without re-running.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: Option<usize>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            notes: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Unified error type for the node machine.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VmError {
    /// The diagnostic kind, if this error came from the core rather than from I/O.
    pub fn kind(&self) -> Option<DiagnosticKind> {
        match self {
            VmError::Diagnostic(diag) => Some(diag.kind),
            VmError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VmError>;
