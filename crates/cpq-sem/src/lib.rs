//! cpq-sem - Symbol Table Construction
//!
//! ============================================================================
//! SYMBOL COLLECTION
//! ============================================================================
//!
//! CPL has a single flat global frame: all variables are declared before
//! the statement block, and every name is visible everywhere. Symbol
//! collection therefore reduces to one walk over the `declaration`
//! subtrees:
//!
//! - `type` names the declared type for the whole declaration.
//! - `idlist` contributes the declared names, in source order.
//! - Each name is inserted as `(name, type, line)`; a name that already
//!   exists produces a `SymbolRedefinition` diagnostic pointing back at
//!   the original declaration line, and the first definition stays.
//!
//! The declared type and collected names are locals of the per-declaration
//! visit, so state can never leak from one declaration into the next.
//!
//! Lookups happen later, during IR synthesis; a miss there is a
//! `SymbolUndefined` diagnostic emitted by the caller.

use cpq_lex::{Token, TokenKind};
use cpq_par::{ParseNode, Production};
use cpq_util::{Diagnostic, Handler, Ty};
use indexmap::IndexMap;

/// A declared variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: Ty,
    /// Line of the declaring identifier.
    pub line: u32,
}

/// The program's flat symbol table, in declaration order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a symbol. On a name collision the table is unchanged and
    /// the original symbol's declaration line is returned.
    pub fn insert(&mut self, name: &str, ty: Ty, line: u32) -> Result<(), u32> {
        if let Some(existing) = self.symbols.get(name) {
            return Err(existing.line);
        }
        self.symbols.insert(
            name.to_owned(),
            Symbol {
                name: name.to_owned(),
                ty,
                line,
            },
        );
        Ok(())
    }

    /// Looks up a declared name.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// Walks the parse tree and collects every declared variable.
///
/// Redefinitions are reported to `handler`; the table keeps the first
/// definition of each name.
pub fn build_symbol_table(root: &ParseNode, handler: &Handler) -> SymbolTable {
    let mut table = SymbolTable::new();
    collect(root, &mut table, handler);
    table
}

fn collect(node: &ParseNode, table: &mut SymbolTable, handler: &Handler) {
    if node.is(Production::Declaration) {
        declare(node, table, handler);
        return;
    }
    for child in &node.children {
        if let Some(child) = child.as_node() {
            collect(child, table, handler);
        }
    }
}

/// Handles one `declaration -> type idlist ';'` node.
fn declare(node: &ParseNode, table: &mut SymbolTable, handler: &Handler) {
    let ty = declared_ty(node.node(0));

    let mut ids = Vec::new();
    collect_ids(node.node(1), &mut ids);

    for id in ids {
        if let Err(origin) = table.insert(&id.lexeme, ty, id.line) {
            handler.emit(Diagnostic::symbol_redefinition(id.line, &id.lexeme, origin));
        }
    }
}

fn declared_ty(type_node: &ParseNode) -> Ty {
    match type_node.token(0).kind {
        TokenKind::Int => Ty::Int,
        TokenKind::Float => Ty::Float,
        ref other => panic!("type node holds {other:?}"),
    }
}

/// Flattens a left-recursive `idlist` into source order.
fn collect_ids<'a>(idlist: &'a ParseNode, out: &mut Vec<&'a Token>) {
    for child in &idlist.children {
        match child {
            cpq_par::ParseChild::Node(inner) => collect_ids(inner, out),
            cpq_par::ParseChild::Token(token) if token.kind == TokenKind::Id => out.push(token),
            cpq_par::ParseChild::Token(_) => {}
        }
    }
}
