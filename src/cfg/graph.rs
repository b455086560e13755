//! The control-flow graph arena.
//!
//! Each function owns a `Vec<BasicBlock>`; every edge is a block index.
//! This avoids cyclic ownership and pairs with the bitset dominator
//! representation, where block ids index bits.

use std::fmt::Write;

use crate::common::errors::CfgError;
use crate::ir::instruction::Label;

use super::block::{BasicBlock, BlockId};

/// A function's control-flow graph. Block 0 is the entry block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cfg {
    blocks: Vec<BasicBlock>,
}

impl Cfg {
    /// Build a CFG from materialised blocks. Edges are added afterwards.
    pub fn from_blocks(blocks: Vec<BasicBlock>) -> Self {
        Self { blocks }
    }

    /// All blocks, in id order.
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Mutable access to all blocks.
    pub fn blocks_mut(&mut self) -> &mut [BasicBlock] {
        &mut self.blocks
    }

    /// Number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Get a block by id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    /// Get a mutable block by id.
    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    /// The entry block.
    #[must_use]
    pub fn entry(&self) -> &BasicBlock {
        &self.blocks[BlockId::ENTRY.index()]
    }

    /// Add an edge, maintaining both adjacency sides.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.index()].successors.push(to);
        self.blocks[to.index()].predecessors.push(from);
    }

    /// Find the block whose entry label is `label`.
    #[must_use]
    pub fn block_by_label(&self, label: Label) -> Option<BlockId> {
        self.blocks
            .iter()
            .find(|b| b.label == Some(label))
            .map(|b| b.id)
    }

    /// Find the block containing instruction `index`.
    #[must_use]
    pub fn block_at(&self, index: usize) -> Option<BlockId> {
        self.blocks
            .iter()
            .find(|b| b.contains(index))
            .map(|b| b.id)
    }

    /// Which blocks are reachable from the entry block.
    #[must_use]
    pub fn reachable(&self) -> Vec<bool> {
        let mut reachable = vec![false; self.blocks.len()];
        if self.blocks.is_empty() {
            return reachable;
        }

        let mut stack = vec![BlockId::ENTRY];
        reachable[BlockId::ENTRY.index()] = true;
        while let Some(id) = stack.pop() {
            for &succ in &self.blocks[id.index()].successors {
                if !reachable[succ.index()] {
                    reachable[succ.index()] = true;
                    stack.push(succ);
                }
            }
        }
        reachable
    }

    /// Check structural invariants: ids equal indices, the block windows
    /// partition `0..insts_n` in order, and pred/succ lists mirror each
    /// other.
    pub fn validate(&self, insts_n: usize) -> Result<(), CfgError> {
        let mut cursor = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            if block.id.index() != index {
                return Err(malformed(format!("block at index {index} has id {}", block.id)));
            }
            if block.begin != cursor {
                return Err(malformed(format!(
                    "{} starts at {} but previous block ended at {cursor}",
                    block.id, block.begin
                )));
            }
            if block.end <= block.begin {
                return Err(malformed(format!("{} has an empty window", block.id)));
            }
            cursor = block.end;
        }
        if cursor != insts_n {
            return Err(malformed(format!(
                "blocks cover 0..{cursor} but the function has {insts_n} instructions"
            )));
        }

        for block in &self.blocks {
            for &succ in &block.successors {
                let back = &self.blocks[succ.index()].predecessors;
                let forward_n = block.successors.iter().filter(|&&s| s == succ).count();
                let back_n = back.iter().filter(|&&p| p == block.id).count();
                if forward_n != back_n {
                    return Err(malformed(format!("asymmetric edge {} -> {succ}", block.id)));
                }
            }
            for &pred in &block.predecessors {
                if !self.blocks[pred.index()].successors.contains(&block.id) {
                    return Err(malformed(format!("asymmetric edge {pred} -> {}", block.id)));
                }
            }
        }

        Ok(())
    }

    /// Render the CFG dump: per block, its id, predecessors, successors.
    pub fn dump(&self) -> String {
        let mut out = String::from("========== CFG ==========\n");
        for block in &self.blocks {
            let _ = writeln!(out, "Block {}", block.id.index());
            let _ = writeln!(out, "  Predecessors: {}", format_ids(&block.predecessors));
            let _ = writeln!(out, "  Successors:   {}", format_ids(&block.successors));
            out.push_str("--------------------------\n");
        }
        out.push_str("==========================\n");
        out
    }

    /// Render the dominance-frontier dump: per block, its frontier list.
    pub fn dump_frontiers(&self) -> String {
        let mut out = String::from("========== Dominance Frontiers ==========\n");
        for block in &self.blocks {
            let _ = writeln!(
                out,
                "Block {} dominance frontier: {}",
                block.id.index(),
                format_ids(&block.frontier)
            );
        }
        out.push_str("=========================================\n");
        out
    }
}

fn malformed(reason: String) -> CfgError {
    CfgError::Malformed { reason }
}

fn format_ids(ids: &[BlockId]) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter()
        .map(|id| id.index().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
