//! CFG construction from a function's instruction list.
//!
//! Three phases: leader selection, block materialisation, edge wiring.

use crate::common::errors::CfgError;
use crate::ir::function::Function;
use crate::ir::instruction::{Instruction, Label};

use super::block::{BasicBlock, BlockId};
use super::graph::Cfg;

/// Build the control-flow graph of a function.
pub fn build(func: &Function) -> Result<Cfg, CfgError> {
    let leaders = find_leaders(func)?;
    let blocks = materialise_blocks(func, &leaders);
    let mut cfg = Cfg::from_blocks(blocks);
    wire_edges(func, &mut cfg)?;
    Ok(cfg)
}

/// Select the instructions that start a basic block.
///
/// An instruction is a leader when it is the first instruction, when it
/// follows a branch, or when it is a `Label` already referenced by some
/// earlier branch. References are accumulated during the same pass, so a
/// label whose only references come later does not become a leader.
fn find_leaders(func: &Function) -> Result<Vec<usize>, CfgError> {
    if func.insts.is_empty() {
        return Err(CfgError::EmptyFunction {
            function: func.name.clone(),
        });
    }

    let mut referenced: Vec<Label> = Vec::new();
    let mut leaders = Vec::new();

    for (i, inst) in func.insts.iter().enumerate() {
        let after_branch = i > 0 && func.insts[i - 1].is_branch();
        let referenced_label = matches!(inst, Instruction::Label { label } if referenced.contains(label));

        if i == 0 || after_branch || referenced_label {
            leaders.push(i);
        }

        if let Some(target) = inst.branch_target() {
            referenced.push(target);
        }
    }

    Ok(leaders)
}

/// Build one block per leader; block `i` spans from its leader to the
/// next leader (or the end of the function).
fn materialise_blocks(func: &Function, leaders: &[usize]) -> Vec<BasicBlock> {
    leaders
        .iter()
        .enumerate()
        .map(|(i, &begin)| {
            let end = leaders.get(i + 1).copied().unwrap_or(func.insts.len());
            let label = match func.insts[begin] {
                Instruction::Label { label } => Some(label),
                _ => None,
            };
            BasicBlock::new(BlockId(i), begin, end, label)
        })
        .collect()
}

/// Wire edges based on each block's last instruction.
fn wire_edges(func: &Function, cfg: &mut Cfg) -> Result<(), CfgError> {
    let block_count = cfg.block_count();

    for i in 0..block_count {
        let id = BlockId(i);
        let last = &func.insts[cfg.block(id).end - 1];

        match last {
            Instruction::Jump { target } => {
                let to = resolve_label(cfg, func, *target)?;
                cfg.add_edge(id, to);
            }
            Instruction::JumpIfFalse { target, .. } => {
                let to = resolve_label(cfg, func, *target)?;
                cfg.add_edge(id, to);
                if i + 1 < block_count {
                    cfg.add_edge(id, BlockId(i + 1));
                }
            }
            _ => {
                if i + 1 < block_count {
                    cfg.add_edge(id, BlockId(i + 1));
                }
            }
        }
    }

    Ok(())
}

fn resolve_label(cfg: &Cfg, func: &Function, label: Label) -> Result<BlockId, CfgError> {
    cfg.block_by_label(label)
        .ok_or_else(|| CfgError::UnresolvedLabel {
            label: label.0,
            function: func.name.clone(),
        })
}
