//! cpq-lex - Lexical Analyzer
//!
//! ============================================================================
//! LEXICAL ANALYSIS
//! ============================================================================
//!
//! The lexer transforms CPL source text into a stream of tokens. It is a
//! longest-match scanner driven by an ordered table of (regex, action)
//! rules:
//!
//! - At each cursor position every rule is tried against the unread
//!   remainder of the source.
//! - The rule producing the longest match wins; ties go to the earlier
//!   rule in the table. Keywords are registered before the identifier
//!   rule, so `break` is a keyword while `breaker` (a longer identifier
//!   match) is an `ID`.
//! - The winning rule's action either discards the lexeme (whitespace,
//!   newlines, block comments), marks it invalid (the single-character
//!   catch-all registered last), or produces a typed token.
//!
//! Newlines increment the line counter wherever they appear in a matched
//! lexeme, including inside block comments, so every token carries an
//! accurate 1-based source line.
//!
//! Invalid characters are *retained* in the returned stream as
//! [`TokenKind::Invalid`] tokens. The driver reports them as diagnostics
//! and hands the parser the filtered stream.
//!
//! # Example
//!
//! ```
//! use cpq_lex::{Lexer, TokenKind};
//!
//! let tokens = Lexer::new("a = 3;").tokenize();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
//! assert_eq!(
//!     kinds,
//!     vec![TokenKind::Id, TokenKind::Assign, TokenKind::Num, TokenKind::Semicolon]
//! );
//! ```

mod scanner;
mod token;

pub use scanner::Lexer;
pub use token::{Token, TokenKind};
