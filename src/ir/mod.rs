//! Three-address intermediate representation.
//!
//! The IR generator walks the typed AST and emits a flat instruction
//! sequence per function, using fresh virtual registers and fresh
//! labels. Everything downstream (CFG, dominators, SSA) operates on
//! these instruction buffers.

pub mod function;
pub mod instruction;
pub mod lower;

pub use function::{Function, Program};
pub use instruction::{BinaryOp, Instruction, Label, PhiNode, Reg, SsaName};
pub use lower::lower_program;
