//! cpq-par - Parser Driver
//!
//! ============================================================================
//! PARSING
//! ============================================================================
//!
//! The parser consumes the filtered token stream (invalid tokens already
//! reported and removed by the driver) and produces a concrete parse tree
//! rooted at the `start` production, or records a single `UnexpectedToken`
//! diagnostic and produces nothing.
//!
//! The tree deliberately stays *concrete*: terminal tokens (parentheses,
//! keywords, separators) are kept in child position so that every node's
//! children line up index-for-index with its grammar production. The IR
//! synthesizer indexes into these shapes directly, the same way it would
//! index into the output of a generated LALR parser. The grammar:
//!
//! ```text
//! start           -> declarations stmt_block
//! declarations    -> declarations declaration | epsilon
//! declaration     -> type idlist ';'
//! type            -> 'int' | 'float'
//! idlist          -> idlist ',' ID | ID
//! stmt_block      -> '{' stmtlist '}'
//! stmtlist        -> stmtlist stmt | epsilon
//! stmt            -> assignment_stmt | input_stmt | output_stmt | if_stmt
//!                  | while_stmt | switch_stmt | break_stmt | stmt_block
//! assignment_stmt -> ID '=' expression ';'
//! input_stmt      -> 'input' '(' ID ')' ';'
//! output_stmt     -> 'output' '(' expression ')' ';'
//! if_stmt         -> 'if' '(' boolexpr ')' stmt 'else' stmt
//! while_stmt      -> 'while' '(' boolexpr ')' stmt
//! switch_stmt     -> 'switch' '(' expression ')' '{' caselist
//!                    'default' ':' stmtlist '}'
//! caselist        -> caselist 'case' NUM ':' stmtlist | epsilon
//! break_stmt      -> 'break' ';'
//! boolexpr        -> boolexpr '||' boolterm | boolterm
//! boolterm        -> boolterm '&&' boolfactor | boolfactor
//! boolfactor      -> '!' '(' boolexpr ')' | expression RELOP expression
//! expression      -> expression ADDOP term | term
//! term            -> term MULOP factor | factor
//! factor          -> '(' expression ')' | CAST '(' expression ')' | ID | NUM
//! ```
//!
//! Left-recursive productions are parsed iteratively but the emitted tree
//! keeps the left-leaning two-level shape the grammar describes.

mod parser;
mod tree;

pub use parser::parse;
pub use tree::{ParseChild, ParseNode, Production};
