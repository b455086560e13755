//! Three-address instruction set.
//!
//! One variant per instruction kind; the payload shape belongs to the
//! variant. Virtual registers and labels are per-function, monotonically
//! increasing integer ids.

use std::collections::BTreeMap;
use std::fmt;

use crate::cfg::BlockId;

/// A virtual register id, printed `v<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reg(pub u32);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A label id, printed `l<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// Arithmetic opcode of a binary instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        };
        write!(f, "{s}")
    }
}

/// A versioned variable name produced by SSA renaming.
///
/// Displayed as the concatenation of base and version (`x0`, `x1`, …) so
/// dumps show distinct spellings for distinct definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SsaName {
    /// Unversioned variable name.
    pub base: String,
    /// Version number; each `(base, version)` pair is defined exactly once.
    pub version: usize,
}

impl SsaName {
    #[must_use]
    pub fn new(base: impl Into<String>, version: usize) -> Self {
        Self {
            base: base.into(),
            version,
        }
    }
}

impl fmt::Display for SsaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.version)
    }
}

/// A φ pseudo-instruction at a control-flow merge.
///
/// The incoming map starts empty and is written by each *predecessor*
/// while that predecessor is renamed, keyed by the predecessor's block
/// id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiNode {
    /// Unversioned variable the φ merges.
    pub result: String,

    /// Versioned result name, set during renaming.
    pub result_versioned: Option<SsaName>,

    /// Incoming value per predecessor block.
    pub operands: BTreeMap<BlockId, SsaName>,
}

impl PhiNode {
    /// Create a φ with an empty incoming map.
    #[must_use]
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            result_versioned: None,
            operands: BTreeMap::new(),
        }
    }

    /// Record the value flowing in from a predecessor.
    pub fn add_operand(&mut self, predecessor: BlockId, name: SsaName) {
        self.operands.insert(predecessor, name);
    }

    /// Number of incoming operands.
    #[must_use]
    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }
}

impl fmt::Display for PhiNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result_versioned {
            Some(versioned) => write!(f, "{versioned} = phi(")?,
            None => write!(f, "{} = phi(", self.result)?,
        }
        let mut first = true;
        for (block, name) in &self.operands {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{block}: {name}")?;
            first = false;
        }
        write!(f, ")")
    }
}

/// A three-address instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Load an immediate into a register.
    Const { dst: Reg, value: i64 },

    /// Read the current value of a named variable.
    Load {
        name: String,
        dst: Reg,
        versioned: Option<SsaName>,
    },

    /// Define a named variable from a register.
    Store {
        name: String,
        src: Reg,
        versioned: Option<SsaName>,
    },

    /// Re-assign a named variable from a register. Renamed exactly like
    /// `Store`.
    Assign {
        name: String,
        src: Reg,
        versioned: Option<SsaName>,
    },

    /// Arithmetic on two registers.
    Binary {
        op: BinaryOp,
        lhs: Reg,
        rhs: Reg,
        dst: Reg,
    },

    /// Jump target marker.
    Label { label: Label },

    /// Unconditional jump.
    Jump { target: Label },

    /// Jump to `target` when `cond` is zero, otherwise fall through.
    JumpIfFalse { cond: Reg, target: Label },

    /// SSA merge point.
    Phi(PhiNode),
}

impl Instruction {
    /// Whether this instruction transfers control.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. } | Instruction::JumpIfFalse { .. }
        )
    }

    /// The label this instruction branches to, if any.
    #[must_use]
    pub fn branch_target(&self) -> Option<Label> {
        match self {
            Instruction::Jump { target } => Some(*target),
            Instruction::JumpIfFalse { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// The variable name this instruction defines, for `Store`/`Assign`.
    ///
    /// φ definitions are handled separately by the rename pass.
    #[must_use]
    pub fn assigned_name(&self) -> Option<&str> {
        match self {
            Instruction::Store { name, .. } | Instruction::Assign { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Const { dst, value } => write!(f, "{dst} = const {value}"),
            Instruction::Load {
                name,
                dst,
                versioned,
            } => match versioned {
                Some(v) => write!(f, "{dst} = load {v}"),
                None => write!(f, "{dst} = load {name}"),
            },
            Instruction::Store {
                name,
                src,
                versioned,
            } => match versioned {
                Some(v) => write!(f, "store {v}, {src}"),
                None => write!(f, "store {name}, {src}"),
            },
            Instruction::Assign {
                name,
                src,
                versioned,
            } => match versioned {
                Some(v) => write!(f, "assign {v}, {src}"),
                None => write!(f, "assign {name}, {src}"),
            },
            Instruction::Binary { op, lhs, rhs, dst } => {
                write!(f, "{dst} = {op} {lhs}, {rhs}")
            }
            Instruction::Label { label } => write!(f, "{label}:"),
            Instruction::Jump { target } => write!(f, "jump {target}"),
            Instruction::JumpIfFalse { cond, target } => {
                write!(f, "jump_if_false {cond}, {target}")
            }
            Instruction::Phi(phi) => write!(f, "{phi}"),
        }
    }
}
