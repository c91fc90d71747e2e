//! Token definitions for the CPL language.

use cpq_util::Ty;
use std::fmt;

/// The kind of a lexed token.
///
/// Operator classes (`Relop`, `Addop`, `Mulop`) carry their operator text
/// in the token's lexeme; `Cast` carries its target type as a payload
/// because the target is consumed as a type, not as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Break,
    Case,
    Default,
    Else,
    If,
    Input,
    Output,
    Switch,
    While,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Assign,

    // Operator classes
    Relop,
    Addop,
    Mulop,
    Or,
    And,
    Not,

    /// `static_cast<int>` / `static_cast<float>`, with the target type.
    Cast(Ty),

    // Names, literals, type keywords
    Id,
    Num,
    Int,
    Float,

    /// A character no rule matched; retained for diagnostics.
    Invalid,
}

impl TokenKind {
    /// Human-readable form used in syntax error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Break => "'break'",
            TokenKind::Case => "'case'",
            TokenKind::Default => "'default'",
            TokenKind::Else => "'else'",
            TokenKind::If => "'if'",
            TokenKind::Input => "'input'",
            TokenKind::Output => "'output'",
            TokenKind::Switch => "'switch'",
            TokenKind::While => "'while'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Assign => "'='",
            TokenKind::Relop => "RELOP",
            TokenKind::Addop => "ADDOP",
            TokenKind::Mulop => "MULOP",
            TokenKind::Or => "'||'",
            TokenKind::And => "'&&'",
            TokenKind::Not => "'!'",
            TokenKind::Cast(_) => "CAST",
            TokenKind::Id => "ID",
            TokenKind::Num => "NUM",
            TokenKind::Int => "'int'",
            TokenKind::Float => "'float'",
            TokenKind::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A lexed token: kind, original text, and 1-based source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// Whether this token is the invalid-character catch-all.
    pub fn is_invalid(&self) -> bool {
        self.kind == TokenKind::Invalid
    }

    /// The type of a `Num` literal, derived from its lexeme: a decimal
    /// point makes it a float, otherwise it is an integer.
    pub fn num_ty(&self) -> Ty {
        debug_assert_eq!(self.kind, TokenKind::Num);
        if self.lexeme.contains('.') {
            Ty::Float
        } else {
            Ty::Int
        }
    }
}
