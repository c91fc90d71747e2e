//! Diagnostic module - error reporting infrastructure.
//!
//! A [`Diagnostic`] is one user-facing error: a kind, the source line it
//! points at, and a pre-rendered message. Diagnostics accumulate within a
//! phase; the driver checks the handler between phases and aborts the
//! pipeline as soon as any phase has reported.
//!
//! User-facing rendering is fixed:
//!
//! ```text
//! Error in line {line}: {message}
//! ```
//!
//! # Examples
//!
//! ```
//! use cpq_util::{Diagnostic, Handler};
//!
//! let handler = Handler::new();
//! handler.emit(Diagnostic::symbol_undefined(3, "x"));
//!
//! assert!(handler.has_errors());
//! assert_eq!(
//!     handler.diagnostics()[0].to_string(),
//!     "Error in line 3: Undefined reference to symbol x"
//! );
//! ```

use std::cell::RefCell;
use std::fmt;

/// The category of a diagnostic, one per error-producing phase concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A character sequence the scanner could not match (lexing).
    InvalidToken,
    /// A token the grammar does not allow at this point (parsing).
    UnexpectedToken,
    /// A name declared twice (symbol collection).
    SymbolRedefinition,
    /// A name used but never declared (IR synthesis).
    SymbolUndefined,
    /// A type or control-flow rule violation (IR synthesis).
    Semantic,
}

/// A single compiler error with its source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Diagnostic category.
    pub kind: DiagnosticKind,
    /// 1-based source line the error points at.
    pub line: u32,
    /// Rendered message, without the `Error in line` prefix.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic from its parts.
    pub fn new(kind: DiagnosticKind, line: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    /// An unmatched character sequence in the source.
    pub fn invalid_token(line: u32, lexeme: &str) -> Self {
        Self::new(
            DiagnosticKind::InvalidToken,
            line,
            format!("Invalid token {lexeme}"),
        )
    }

    /// A token the grammar does not allow here.
    pub fn unexpected_token(line: u32, found: &str, expected: &str) -> Self {
        Self::new(
            DiagnosticKind::UnexpectedToken,
            line,
            format!("Unexpected token {found}, should be {expected}"),
        )
    }

    /// A name declared a second time; `origin` is the first declaration line.
    pub fn symbol_redefinition(line: u32, name: &str, origin: u32) -> Self {
        Self::new(
            DiagnosticKind::SymbolRedefinition,
            line,
            format!("Symbol {name} already defined in line {origin}"),
        )
    }

    /// A name used without a declaration.
    pub fn symbol_undefined(line: u32, name: &str) -> Self {
        Self::new(
            DiagnosticKind::SymbolUndefined,
            line,
            format!("Undefined reference to symbol {name}"),
        )
    }

    /// A semantic rule violation with a ready-made message.
    pub fn semantic(line: u32, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Semantic, line, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in line {}: {}", self.line, self.message)
    }
}

/// Handler for collecting diagnostics across the pipeline.
///
/// Phases hold `&Handler` and emit through interior mutability, so a single
/// handler can thread through lexer, parser, symbol builder, and IR
/// synthesizer without mutable-borrow gymnastics. The handler is not
/// thread-safe; a compilation is strictly single-threaded.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new, empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Whether any diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.borrow().is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    /// Snapshot of all recorded diagnostics, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drain the recorded diagnostics, leaving the handler empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }
}
