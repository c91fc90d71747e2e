//! cpq-drv - Compiler Driver
//!
//! ============================================================================
//! PIPELINE ORCHESTRATION
//! ============================================================================
//!
//! The driver wires the phase crates into the one-shot pipeline:
//!
//! ```text
//! Source (.cpl)
//!      |
//!      v
//! [cpq-lex]  tokens (invalid tokens reported, then filtered)
//!      |
//!      v
//! [cpq-par]  parse tree
//!      |
//!      v
//! [cpq-sem]  symbol table
//!      |
//!      v
//! [cpq-ir]   labeled quads
//!      |
//!      v
//! [cpq-gen]  resolved quad program (.qud)
//! ```
//!
//! Errors short-circuit: a phase that reports any diagnostic stops the
//! pipeline before the next phase runs, so a `.qud` file is only ever
//! written for a program every phase accepted.
//!
//! The CLI surface is deliberately small: `cpq <path-to-source>` compiles
//! one file and writes `<basename>.qud` next to it. Failed compilations
//! print their diagnostics and still exit 0; only usage mistakes and
//! internal errors exit non-zero. Both the emitted file and the error
//! printout end with the fixed signature line, so downstream tooling can
//! rely on a non-empty trailer either way.

use std::fs;
use std::path::Path;

use anyhow::Context;
use cpq_ir::Quad;
use cpq_lex::Lexer;
use cpq_util::{Diagnostic, Handler};
use thiserror::Error;

/// Fixed trailing tag, printed after diagnostics and appended to every
/// emitted `.qud` file.
pub const SIGNATURE: &str = "cpq quad compiler";

/// Why a compilation produced no program.
#[derive(Debug, Error)]
pub enum CompileError {
    /// User errors, in emission order.
    #[error("compilation failed with {} error(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    /// A broken compiler invariant; never caused by user input.
    #[error("internal compiler error: {0}")]
    Internal(#[from] cpq_gen::ResolveError),
}

/// Compiles CPL source text into a resolved quad program.
pub fn compile(source: &str) -> Result<Vec<Quad>, CompileError> {
    let handler = Handler::new();

    // Phase 1: lexing. Invalid tokens become diagnostics and are removed
    // from the stream the parser sees.
    let tokens = Lexer::new(source).tokenize();
    for token in tokens.iter().filter(|t| t.is_invalid()) {
        handler.emit(Diagnostic::invalid_token(token.line, &token.lexeme));
    }
    if handler.has_errors() {
        return Err(CompileError::Diagnostics(handler.take()));
    }
    let tokens: Vec<_> = tokens.into_iter().filter(|t| !t.is_invalid()).collect();

    // Phase 2: parsing.
    let Some(tree) = cpq_par::parse(&tokens, &handler) else {
        return Err(CompileError::Diagnostics(handler.take()));
    };

    // Phase 3: symbol collection.
    let table = cpq_sem::build_symbol_table(&tree, &handler);
    if handler.has_errors() {
        return Err(CompileError::Diagnostics(handler.take()));
    }

    // Phase 4: IR synthesis.
    let ir = cpq_ir::lower_program(&tree, &table, &handler);
    if handler.has_errors() {
        return Err(CompileError::Diagnostics(handler.take()));
    }

    // Phase 5: label resolution.
    Ok(cpq_gen::resolve(ir)?)
}

/// Compiles the file at `source_path`, writing `<basename>.qud` on
/// success and printing diagnostics on failure.
///
/// Returns `Err` only for I/O problems and internal errors; failed
/// compilations are a normal outcome here.
pub fn run(source_path: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(source_path)
        .with_context(|| format!("failed to read {}", source_path.display()))?;

    match compile(&source) {
        Ok(quads) => {
            let output_path = source_path.with_extension("qud");
            let mut output = cpq_gen::render_program(&quads);
            output.push_str(SIGNATURE);
            output.push('\n');
            fs::write(&output_path, output)
                .with_context(|| format!("failed to write {}", output_path.display()))?;
            Ok(())
        }
        Err(CompileError::Diagnostics(diagnostics)) => {
            for diagnostic in &diagnostics {
                println!("{diagnostic}");
            }
            println!("{SIGNATURE}");
            Ok(())
        }
        Err(internal @ CompileError::Internal(_)) => Err(internal.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(source: &str) -> Vec<String> {
        compile(source)
            .expect("compilation should succeed")
            .iter()
            .map(|q| q.to_string())
            .collect()
    }

    fn errors(source: &str) -> Vec<Diagnostic> {
        match compile(source) {
            Err(CompileError::Diagnostics(diagnostics)) => diagnostics,
            other => panic!("expected diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_tokens_stop_the_pipeline() {
        let diagnostics = errors("int a;\n{ a = 3 @ 4; }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].to_string(),
            "Error in line 2: Invalid token @"
        );
    }

    #[test]
    fn test_syntax_error_stops_before_symbols() {
        let diagnostics = errors("int a\n{ }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Unexpected token {, should be ';'"
        );
    }

    #[test]
    fn test_symbol_error_stops_before_ir() {
        let diagnostics = errors("int a;\nint a;\n{ }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Symbol a already defined in line 1");
    }

    #[test]
    fn test_semantic_errors_accumulate_within_the_phase() {
        let diagnostics = errors("int a;\nfloat b;\n{ a = b;\nbreak; }");
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["cannot assign float to int", "break outside while/switch"]
        );
    }

    #[test]
    fn test_successful_compile_ends_with_halt() {
        let program = lines("int a;\n{ input(a); output(a); }");
        assert_eq!(program, vec!["IINP a", "IPRT a", "HALT"]);
    }
}
