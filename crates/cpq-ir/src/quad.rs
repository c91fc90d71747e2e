//! Quad instructions, opcodes, and symbolic labels.

use cpq_util::Ty;
use std::fmt;

/// A typed opcode of the quad machine.
///
/// The type tag is folded into the mnemonic: `I*` opcodes operate on
/// integers, `R*` opcodes on floats ("reals"). `JUMP`/`JMPZ`/`HALT` are
/// untyped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Iasn,
    Rasn,
    Iinp,
    Rinp,
    Iprt,
    Rprt,
    Ieql,
    Reql,
    Inql,
    Rnql,
    Ilss,
    Rlss,
    Igrt,
    Rgrt,
    Iadd,
    Radd,
    Isub,
    Rsub,
    Imlt,
    Rmlt,
    Idiv,
    Rdiv,
    /// float -> int conversion
    Rtoi,
    /// int -> float conversion
    Itor,
    Jump,
    Jmpz,
    Halt,
}

impl Opcode {
    /// The emitted mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Iasn => "IASN",
            Opcode::Rasn => "RASN",
            Opcode::Iinp => "IINP",
            Opcode::Rinp => "RINP",
            Opcode::Iprt => "IPRT",
            Opcode::Rprt => "RPRT",
            Opcode::Ieql => "IEQL",
            Opcode::Reql => "REQL",
            Opcode::Inql => "INQL",
            Opcode::Rnql => "RNQL",
            Opcode::Ilss => "ILSS",
            Opcode::Rlss => "RLSS",
            Opcode::Igrt => "IGRT",
            Opcode::Rgrt => "RGRT",
            Opcode::Iadd => "IADD",
            Opcode::Radd => "RADD",
            Opcode::Isub => "ISUB",
            Opcode::Rsub => "RSUB",
            Opcode::Imlt => "IMLT",
            Opcode::Rmlt => "RMLT",
            Opcode::Idiv => "IDIV",
            Opcode::Rdiv => "RDIV",
            Opcode::Rtoi => "RTOI",
            Opcode::Itor => "ITOR",
            Opcode::Jump => "JUMP",
            Opcode::Jmpz => "JMPZ",
            Opcode::Halt => "HALT",
        }
    }

    /// Opcode for a binary operator applied at the given type.
    ///
    /// Covers the arithmetic and relational operator texts the grammar can
    /// produce. Any other operator here is a table bug, not a user error,
    /// so it panics.
    pub fn for_op(op: &str, ty: Ty) -> Opcode {
        match (op, ty) {
            ("==", Ty::Int) => Opcode::Ieql,
            ("==", Ty::Float) => Opcode::Reql,
            ("!=", Ty::Int) => Opcode::Inql,
            ("!=", Ty::Float) => Opcode::Rnql,
            ("<", Ty::Int) => Opcode::Ilss,
            ("<", Ty::Float) => Opcode::Rlss,
            (">", Ty::Int) => Opcode::Igrt,
            (">", Ty::Float) => Opcode::Rgrt,
            ("+", Ty::Int) => Opcode::Iadd,
            ("+", Ty::Float) => Opcode::Radd,
            ("-", Ty::Int) => Opcode::Isub,
            ("-", Ty::Float) => Opcode::Rsub,
            ("*", Ty::Int) => Opcode::Imlt,
            ("*", Ty::Float) => Opcode::Rmlt,
            ("/", Ty::Int) => Opcode::Idiv,
            ("/", Ty::Float) => Opcode::Rdiv,
            _ => panic!("no opcode for operator {op:?} at type {ty}"),
        }
    }

    /// Assignment opcode for the target type.
    pub fn assign(ty: Ty) -> Opcode {
        match ty {
            Ty::Int => Opcode::Iasn,
            Ty::Float => Opcode::Rasn,
        }
    }

    /// `input(...)` opcode for the target type.
    pub fn input(ty: Ty) -> Opcode {
        match ty {
            Ty::Int => Opcode::Iinp,
            Ty::Float => Opcode::Rinp,
        }
    }

    /// `output(...)` opcode for the operand type.
    pub fn output(ty: Ty) -> Opcode {
        match ty {
            Ty::Int => Opcode::Iprt,
            Ty::Float => Opcode::Rprt,
        }
    }

    /// Conversion opcode *to* the given type.
    pub fn cast(to: Ty) -> Opcode {
        match to {
            Ty::Int => Opcode::Rtoi,
            Ty::Float => Opcode::Itor,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A symbolic label, unique per allocation site within one compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LabelId(pub u32);

impl LabelId {
    /// Placeholder target of a `break` that no `while`/`switch` has
    /// claimed yet. Must never survive to label resolution.
    pub const UNBOUND: LabelId = LabelId(u32::MAX);
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_L{}", self.0)
    }
}

/// One three-address instruction. Unused operand slots stay empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quad {
    pub op: Opcode,
    pub dest: String,
    pub src1: String,
    pub src2: String,
}

impl Quad {
    pub fn new(
        op: Opcode,
        dest: impl Into<String>,
        src1: impl Into<String>,
        src2: impl Into<String>,
    ) -> Self {
        Self {
            op,
            dest: dest.into(),
            src1: src1.into(),
            src2: src2.into(),
        }
    }
}

impl fmt::Display for Quad {
    /// Renders `MNEMONIC dest src1 src2` with trailing blanks trimmed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = format!("{} {} {} {}", self.op, self.dest, self.src1, self.src2);
        f.write_str(line.trim_end())
    }
}

/// An instruction of the intermediate program: either a finished quad or
/// one of the label-addressed pseudo-instructions that cpq-gen erases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    Op(Quad),
    /// Defines `label` at the next emitted instruction index.
    Label(LabelId),
    Jump {
        target: LabelId,
    },
    JumpZero {
        target: LabelId,
        value: String,
    },
}
