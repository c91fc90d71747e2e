//! cpq-gen - Label Resolution and Final Emission
//!
//! ============================================================================
//! LABEL RESOLUTION
//! ============================================================================
//!
//! The IR leaves cpq-ir with `label` pseudo-instructions and symbolic
//! jump targets. This crate performs the classic two-pass backpatch:
//!
//! 1. Walk the sequence keeping a running 1-based instruction index.
//!    A `label L` records `L -> current index` and is erased; every other
//!    instruction is appended and bumps the index.
//! 2. Walk the output rewriting every `JUMP L` / `JMPZ L v` operand to
//!    the recorded index.
//!
//! Afterwards the program is label-free and every jump operand is an
//! absolute index in `[1, N]`. Violations of that contract - a jump to a
//! label nothing defined, a label defined twice, or a break placeholder
//! that survived lowering - are compiler bugs, not user errors, and
//! surface as [`ResolveError`] rather than diagnostics.

use cpq_ir::{Instr, LabelId, Opcode, Quad};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Internal-invariant failures during label resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("jump to undefined label {0}")]
    UndefinedLabel(LabelId),

    #[error("label {0} defined twice")]
    DuplicateLabel(LabelId),

    #[error("unbound break reached label resolution")]
    UnboundBreak,
}

/// Resolves symbolic labels into absolute 1-based instruction indices.
pub fn resolve(ir: Vec<Instr>) -> Result<Vec<Quad>, ResolveError> {
    let mut labels: FxHashMap<LabelId, usize> = FxHashMap::default();
    let mut pending = Vec::with_capacity(ir.len());

    for instr in ir {
        match instr {
            Instr::Label(label) => {
                if labels.insert(label, pending.len() + 1).is_some() {
                    return Err(ResolveError::DuplicateLabel(label));
                }
            }
            other => pending.push(other),
        }
    }

    let lookup = |label: LabelId| -> Result<usize, ResolveError> {
        if label == LabelId::UNBOUND {
            return Err(ResolveError::UnboundBreak);
        }
        labels
            .get(&label)
            .copied()
            .ok_or(ResolveError::UndefinedLabel(label))
    };

    pending
        .into_iter()
        .map(|instr| match instr {
            Instr::Op(quad) => Ok(quad),
            Instr::Jump { target } => {
                let index = lookup(target)?;
                Ok(Quad::new(Opcode::Jump, index.to_string(), "", ""))
            }
            Instr::JumpZero { target, value } => {
                let index = lookup(target)?;
                Ok(Quad::new(Opcode::Jmpz, index.to_string(), value, ""))
            }
            Instr::Label(label) => Err(ResolveError::DuplicateLabel(label)),
        })
        .collect()
}

/// Renders a resolved program, one quad per line with a trailing newline.
pub fn render_program(quads: &[Quad]) -> String {
    let mut out = String::new();
    for quad in quads {
        out.push_str(&quad.to_string());
        out.push('\n');
    }
    out
}
