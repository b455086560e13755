//! Dominator analysis.
//!
//! Computes, per block, the bitset of dominating blocks via an iterative
//! data-flow fixed point, derives immediate dominators, hangs the
//! dominator tree off the blocks, and fills each block's dominance
//! frontier by walking predecessors up the idom chain.

use std::fmt::Write;

use crate::cfg::{BlockId, Cfg};
use crate::common::errors::SsaError;

use super::bitset::BlockSet;

/// Dominator state for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dominance {
    /// Per block, the set of blocks dominating it (itself included).
    pub dom: Vec<BlockSet>,

    /// Per block, its immediate dominator; `None` for the entry block
    /// and for blocks the idom search cannot place.
    pub idom: Vec<Option<BlockId>>,
}

impl Dominance {
    /// Run dominator analysis over a CFG.
    ///
    /// Also populates each block's `dom_children` and `frontier` lists
    /// (clearing any previous run's results first, so re-running yields
    /// identical state).
    pub fn compute(cfg: &mut Cfg) -> Result<Dominance, SsaError> {
        let n = cfg.block_count();
        if n == 0 {
            return Ok(Dominance {
                dom: Vec::new(),
                idom: Vec::new(),
            });
        }

        let dom = Self::fixed_point(cfg)?;

        let idom: Vec<Option<BlockId>> = (0..n)
            .map(|b| Self::find_idom(&dom, BlockId(b), n))
            .collect();

        // Every reachable non-entry block must have an immediate
        // dominator; a miss is a bug, not bad input.
        let reachable = cfg.reachable();
        for b in 1..n {
            if reachable[b] && idom[b].is_none() {
                return Err(SsaError::MissingIdom { block: b });
            }
        }

        let dominance = Dominance { dom, idom };
        dominance.build_tree(cfg);
        dominance.fill_frontiers(cfg);
        Ok(dominance)
    }

    /// The iterative dominator fixed point.
    ///
    /// `dom[entry] = {entry}`; every other block starts at the universe
    /// set and is repeatedly narrowed to the intersection of its
    /// predecessors' sets plus itself, until nothing changes.
    fn fixed_point(cfg: &Cfg) -> Result<Vec<BlockSet>, SsaError> {
        let n = cfg.block_count();
        let mut dom: Vec<BlockSet> = (0..n)
            .map(|i| {
                if i == BlockId::ENTRY.index() {
                    BlockSet::singleton(n, BlockId::ENTRY)
                } else {
                    BlockSet::universe(n)
                }
            })
            .collect();

        // The lattice is monotone: each productive sweep clears at least
        // one bit, so n*n + 1 sweeps always suffice.
        let max_sweeps = n * n + 1;
        let mut sweeps = 0;

        let mut changed = true;
        while changed {
            changed = false;
            sweeps += 1;
            if sweeps > max_sweeps {
                return Err(SsaError::FixpointDiverged { sweeps: max_sweeps });
            }

            for i in 1..n {
                let mut new = BlockSet::universe(n);
                for &pred in &cfg.block(BlockId(i)).predecessors {
                    new.intersect_with(&dom[pred.index()]);
                }
                new.insert(BlockId(i));

                if new != dom[i] {
                    dom[i] = new;
                    changed = true;
                }
            }
        }

        Ok(dom)
    }

    /// The immediate dominator of `b`: the unique dominator `a != b`
    /// such that no other dominator of `b` is strictly dominated by `a`.
    fn find_idom(dom: &[BlockSet], b: BlockId, n: usize) -> Option<BlockId> {
        if b == BlockId::ENTRY {
            return None;
        }

        for a in (0..n).map(BlockId) {
            if a == b || !dom[b.index()].contains(a) {
                continue;
            }

            let has_between = dom[b.index()]
                .iter()
                .any(|c| c != a && c != b && dom[c.index()].contains(a));

            if !has_between {
                return Some(a);
            }
        }

        None
    }

    /// Hang each block off its immediate dominator.
    fn build_tree(&self, cfg: &mut Cfg) {
        for block in cfg.blocks_mut() {
            block.dom_children.clear();
        }
        for b in 0..self.idom.len() {
            if let Some(parent) = self.idom[b] {
                cfg.block_mut(parent).dom_children.push(BlockId(b));
            }
        }
    }

    /// Fill dominance frontiers.
    ///
    /// Only merge points (two or more predecessors) leak dominance: for
    /// each predecessor, walk up the idom chain until the merge block's
    /// own idom and record the merge block on every block passed.
    fn fill_frontiers(&self, cfg: &mut Cfg) {
        for block in cfg.blocks_mut() {
            block.frontier.clear();
        }

        let n = cfg.block_count();
        for b in (0..n).map(BlockId) {
            let preds = cfg.block(b).predecessors.clone();
            if preds.len() < 2 {
                continue;
            }

            let stop = self.idom[b.index()];
            for pred in preds {
                let mut runner = Some(pred);
                // idom chains through unreachable blocks can cycle; the
                // chain of a reachable block never exceeds n steps.
                let mut fuel = n;
                while runner != stop {
                    let Some(r) = runner else { break };
                    if fuel == 0 {
                        break;
                    }
                    fuel -= 1;
                    cfg.block_mut(r).frontier.push(b);
                    runner = self.idom[r.index()];
                }
            }
        }
    }

    /// Whether `a` dominates `b` (reflexive).
    #[must_use]
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.dom[b.index()].contains(a)
    }

    /// Whether `a` strictly dominates `b`.
    #[must_use]
    pub fn strictly_dominates(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Render the dominator dump: per block, the dominating set and the
    /// idom id (or "none").
    pub fn dump(&self) -> String {
        let mut out = String::from("========== Dominators ==========\n");
        for (b, dom) in self.dom.iter().enumerate() {
            let doms = dom
                .iter()
                .map(|id| id.index().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let idom = match self.idom[b] {
                Some(id) => id.index().to_string(),
                None => "none".to_string(),
            };
            let _ = writeln!(out, "Block {b} dominated by: {doms}  idom: {idom}");
        }
        out.push_str("================================\n");
        out
    }
}
