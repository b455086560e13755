//! SSA construction: φ insertion and renaming.
//!
//! Phase 1 places a φ for every assigned variable at the iterated
//! dominance frontier of its definition sites. Phase 2 renames every
//! definition and use by walking the dominator tree with per-variable
//! version stacks.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::cfg::{BlockId, Cfg};
use crate::ir::function::Function;
use crate::ir::instruction::{Instruction, PhiNode, SsaName};

/// Per-variable rename state: the stack of live versions plus the
/// monotonically increasing counter for fresh versions.
#[derive(Debug, Default)]
struct VarStack {
    versions: Vec<SsaName>,
    counter: usize,
}

/// The rename stacks, keyed by unversioned variable name.
#[derive(Debug, Default)]
struct RenameStacks {
    stacks: IndexMap<String, VarStack>,
}

impl RenameStacks {
    /// Mint the next version of `name` and push it.
    fn push_fresh(&mut self, name: &str) -> SsaName {
        let stack = self.stacks.entry(name.to_string()).or_default();
        let fresh = SsaName::new(name, stack.counter);
        stack.counter += 1;
        stack.versions.push(fresh.clone());
        fresh
    }

    /// The live version of `name`, if any definition dominates here.
    fn top(&self, name: &str) -> Option<&SsaName> {
        self.stacks.get(name).and_then(|s| s.versions.last())
    }

    /// Undo one definition of `name`.
    fn pop(&mut self, name: &str) {
        if let Some(stack) = self.stacks.get_mut(name) {
            stack.versions.pop();
        }
    }

    /// Whether every stack has been fully unwound.
    fn is_balanced(&self) -> bool {
        self.stacks.values().all(|s| s.versions.is_empty())
    }
}

/// Builder converting one function into SSA form in place.
pub struct SsaBuilder<'a> {
    func: &'a mut Function,
    cfg: &'a mut Cfg,
}

enum Frame {
    Enter(BlockId),
    Exit(Vec<String>),
}

impl<'a> SsaBuilder<'a> {
    pub fn new(func: &'a mut Function, cfg: &'a mut Cfg) -> Self {
        Self { func, cfg }
    }

    /// Insert φ nodes and rename all definitions and uses.
    pub fn run(mut self) {
        let defsites = self.collect_defsites();
        self.insert_phi_nodes(&defsites);
        let stacks = self.rename();
        debug_assert!(stacks.is_balanced());
    }

    /// Per variable, the set of blocks containing a `Store` or `Assign`
    /// of it.
    fn collect_defsites(&self) -> IndexMap<String, BTreeSet<BlockId>> {
        let mut defsites: IndexMap<String, BTreeSet<BlockId>> = IndexMap::new();
        for block in self.cfg.blocks() {
            for i in block.window() {
                if let Some(name) = self.func.insts[i].assigned_name() {
                    defsites.entry(name.to_string()).or_default().insert(block.id);
                }
            }
        }
        defsites
    }

    /// Worklist φ placement over the iterated dominance frontier.
    fn insert_phi_nodes(&mut self, defsites: &IndexMap<String, BTreeSet<BlockId>>) {
        let n = self.cfg.block_count();

        for (name, sites) in defsites {
            let mut inserted = vec![false; n];
            let mut worklist: Vec<BlockId> = sites.iter().copied().collect();

            while let Some(block) = worklist.pop() {
                let frontier = self.cfg.block(block).frontier.clone();
                for df in frontier {
                    if inserted[df.index()] {
                        continue;
                    }
                    inserted[df.index()] = true;

                    self.insert_phi(name, df);

                    // a φ is itself a definition; keep iterating unless
                    // the block already defined the variable
                    if !sites.contains(&df) {
                        worklist.push(df);
                    }
                }
            }
        }
    }

    /// Insert a φ at the head of `block` and shift every window at or
    /// past the insertion point.
    fn insert_phi(&mut self, name: &str, block: BlockId) {
        let at = self.cfg.block(block).begin;
        self.func.insert_at(at, Instruction::Phi(PhiNode::new(name)));

        for blk in self.cfg.blocks_mut() {
            if blk.begin > at {
                blk.begin += 1;
            }
            if blk.end > at {
                blk.end += 1;
            }
        }
    }

    /// Rename definitions and uses over the dominator tree.
    ///
    /// The traversal is an explicit enter/exit frame stack rather than
    /// native recursion; the exit frame carries the block's "defined
    /// here" list so each push is popped exactly once.
    fn rename(&mut self) -> RenameStacks {
        let mut stacks = RenameStacks::default();
        if self.cfg.block_count() == 0 {
            return stacks;
        }

        let mut frames = vec![Frame::Enter(BlockId::ENTRY)];
        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Enter(block) => {
                    let defined = self.rename_block(block, &mut stacks);
                    frames.push(Frame::Exit(defined));

                    let children = &self.cfg.block(block).dom_children;
                    for &child in children.iter().rev() {
                        frames.push(Frame::Enter(child));
                    }
                }
                Frame::Exit(defined) => {
                    for name in &defined {
                        stacks.pop(name);
                    }
                }
            }
        }

        stacks
    }

    /// Rename one block's φ results, body, and successor φ operands.
    fn rename_block(&mut self, block: BlockId, stacks: &mut RenameStacks) -> Vec<String> {
        let window = self.cfg.block(block).window();
        let mut defined = Vec::new();

        // φ results first, so loads in the same block see the merged
        // version
        for i in window.clone() {
            if let Instruction::Phi(phi) = &mut self.func.insts[i] {
                let fresh = stacks.push_fresh(&phi.result);
                defined.push(phi.result.clone());
                phi.result_versioned = Some(fresh);
            }
        }

        for i in window {
            match &mut self.func.insts[i] {
                Instruction::Load {
                    name, versioned, ..
                } => {
                    if let Some(top) = stacks.top(name) {
                        *versioned = Some(top.clone());
                    }
                }
                Instruction::Store {
                    name, versioned, ..
                }
                | Instruction::Assign {
                    name, versioned, ..
                } => {
                    let fresh = stacks.push_fresh(name);
                    defined.push(name.clone());
                    *versioned = Some(fresh);
                }
                _ => {}
            }
        }

        // write this block's live versions into the successors' φs
        let successors = self.cfg.block(block).successors.clone();
        for succ in successors {
            let succ_window = self.cfg.block(succ).window();
            for i in succ_window {
                if let Instruction::Phi(phi) = &mut self.func.insts[i] {
                    if let Some(top) = stacks.top(&phi.result) {
                        phi.add_operand(block, top.clone());
                    }
                }
            }
        }

        defined
    }
}

/// Convert a function to SSA form. The CFG must already carry the
/// dominator-tree children and dominance frontiers computed by
/// [`Dominance::compute`](super::dominance::Dominance::compute).
pub fn build(func: &mut Function, cfg: &mut Cfg) {
    SsaBuilder::new(func, cfg).run();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg;
    use crate::ssa::dominance::Dominance;

    fn emit_const_store(func: &mut Function, name: &str, value: i64) {
        let dst = func.fresh_reg();
        func.emit(Instruction::Const { dst, value });
        func.emit(Instruction::Store {
            name: name.to_string(),
            src: dst,
            versioned: None,
        });
    }

    fn build_ssa(func: &mut Function) -> Cfg {
        let mut cfg = cfg::build(func).unwrap();
        Dominance::compute(&mut cfg).unwrap();
        build(func, &mut cfg);
        cfg
    }

    fn phis_in<'f>(func: &'f Function, cfg: &Cfg, block: BlockId) -> Vec<&'f PhiNode> {
        cfg.block(block)
            .window()
            .filter_map(|i| match &func.insts[i] {
                Instruction::Phi(phi) => Some(phi),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_straight_line_versions() {
        let mut func = Function::new("f", 0);
        emit_const_store(&mut func, "x", 1);
        emit_const_store(&mut func, "y", 2);
        emit_const_store(&mut func, "x", 3);

        let cfg = build_ssa(&mut func);
        assert_eq!(cfg.block_count(), 1);

        let versions: Vec<String> = func
            .insts
            .iter()
            .filter_map(|inst| match inst {
                Instruction::Store { versioned, .. } => {
                    Some(versioned.as_ref().unwrap().to_string())
                }
                _ => None,
            })
            .collect();
        assert_eq!(versions, vec!["x0", "y0", "x1"]);
    }

    #[test]
    fn test_load_reads_latest_version() {
        let mut func = Function::new("f", 0);
        emit_const_store(&mut func, "x", 1);
        emit_const_store(&mut func, "x", 2);
        let dst = func.fresh_reg();
        func.emit(Instruction::Load {
            name: "x".to_string(),
            dst,
            versioned: None,
        });

        build_ssa(&mut func);

        let Instruction::Load { versioned, .. } = func.insts.last().unwrap() else {
            panic!("expected trailing load");
        };
        assert_eq!(versioned.as_ref().unwrap().to_string(), "x1");
    }

    #[test]
    fn test_load_without_definition_stays_unversioned() {
        let mut func = Function::new("f", 0);
        let dst = func.fresh_reg();
        func.emit(Instruction::Load {
            name: "ghost".to_string(),
            dst,
            versioned: None,
        });

        build_ssa(&mut func);

        let Instruction::Load { versioned, .. } = &func.insts[0] else {
            panic!();
        };
        assert!(versioned.is_none());
    }

    #[test]
    fn test_assign_renames_like_store() {
        let mut func = Function::new("f", 0);
        let dst = func.fresh_reg();
        func.emit(Instruction::Const { dst, value: 1 });
        func.emit(Instruction::Store {
            name: "x".to_string(),
            src: dst,
            versioned: None,
        });
        func.emit(Instruction::Assign {
            name: "x".to_string(),
            src: dst,
            versioned: None,
        });

        build_ssa(&mut func);

        let Instruction::Assign { versioned, .. } = &func.insts[2] else {
            panic!();
        };
        assert_eq!(versioned.as_ref().unwrap().to_string(), "x1");
    }

    #[test]
    fn test_diamond_inserts_phi_and_wires_arms() {
        // if/else diamond over x, merging at the end label
        let mut func = Function::new("f", 0);
        let l_end = func.fresh_label();
        let l_else = func.fresh_label();

        emit_const_store(&mut func, "x", 1);
        let cond = func.fresh_reg();
        func.emit(Instruction::Load {
            name: "c".to_string(),
            dst: cond,
            versioned: None,
        });
        func.emit(Instruction::JumpIfFalse {
            cond,
            target: l_else,
        });
        emit_const_store(&mut func, "x", 2);
        func.emit(Instruction::Jump { target: l_end });
        func.emit(Instruction::Label { label: l_else });
        emit_const_store(&mut func, "x", 3);
        func.emit(Instruction::Label { label: l_end });
        let loaded = func.fresh_reg();
        func.emit(Instruction::Load {
            name: "x".to_string(),
            dst: loaded,
            versioned: None,
        });

        let cfg = build_ssa(&mut func);
        assert_eq!(cfg.block_count(), 4);

        let join = BlockId(3);
        let phis = phis_in(&func, &cfg, join);
        assert_eq!(phis.len(), 1);
        let phi = phis[0];

        assert_eq!(phi.result, "x");
        assert_eq!(phi.result_versioned.as_ref().unwrap().to_string(), "x3");
        assert_eq!(phi.operand_count(), 2);
        assert_eq!(phi.operands[&BlockId(1)].to_string(), "x1");
        assert_eq!(phi.operands[&BlockId(2)].to_string(), "x2");

        // the load after the merge reads the φ result
        let Instruction::Load { versioned, .. } = func.insts.last().unwrap() else {
            panic!();
        };
        assert_eq!(versioned.as_ref().unwrap().to_string(), "x3");
    }

    #[test]
    fn test_phi_insertion_shifts_windows() {
        let mut func = Function::new("f", 0);
        let l_end = func.fresh_label();
        let l_else = func.fresh_label();
        emit_const_store(&mut func, "x", 1);
        let cond = func.fresh_reg();
        func.emit(Instruction::Load {
            name: "c".to_string(),
            dst: cond,
            versioned: None,
        });
        func.emit(Instruction::JumpIfFalse {
            cond,
            target: l_else,
        });
        emit_const_store(&mut func, "x", 2);
        func.emit(Instruction::Jump { target: l_end });
        func.emit(Instruction::Label { label: l_else });
        emit_const_store(&mut func, "x", 3);
        func.emit(Instruction::Label { label: l_end });

        let before = cfg::build(&func).unwrap();
        let join_before = before.block(BlockId(3)).window();

        let cfg = build_ssa(&mut func);
        let join_after = cfg.block(BlockId(3)).window();

        // the φ lands at the join's begin; only its end grows
        assert_eq!(join_after.start, join_before.start);
        assert_eq!(join_after.end, join_before.end + 1);
        assert!(matches!(
            func.insts[join_after.start],
            Instruction::Phi(_)
        ));

        // earlier blocks are untouched
        assert_eq!(cfg.block(BlockId(0)).window(), before.block(BlockId(0)).window());

        // the windows still partition the grown instruction array
        assert!(cfg.validate(func.insts.len()).is_ok());
    }

    #[test]
    fn test_loop_merge_phi() {
        // 0: store i, jump into header; header merges entry and latch
        let mut func = Function::new("f", 0);
        let l_header = func.fresh_label();
        emit_const_store(&mut func, "i", 0);
        func.emit(Instruction::Jump { target: l_header });
        func.emit(Instruction::Label { label: l_header });
        let dst = func.fresh_reg();
        func.emit(Instruction::Load {
            name: "i".to_string(),
            dst,
            versioned: None,
        });
        emit_const_store(&mut func, "i", 1);
        func.emit(Instruction::Jump { target: l_header });

        let cfg = build_ssa(&mut func);
        assert_eq!(cfg.block_count(), 2);

        let header = BlockId(1);
        assert_eq!(
            cfg.block(header).predecessors,
            vec![BlockId(0), BlockId(1)]
        );

        let phis = phis_in(&func, &cfg, header);
        assert_eq!(phis.len(), 1);
        let phi = phis[0];
        assert_eq!(phi.result, "i");
        // entry brings i0; the latch (the header block itself) brings
        // its redefinition
        assert_eq!(phi.operands[&BlockId(0)].to_string(), "i0");
        assert_eq!(phi.operands[&BlockId(1)].to_string(), "i2");
        // the load between φ and redefinition reads the φ result
        let load_versioned = func
            .insts
            .iter()
            .find_map(|inst| match inst {
                Instruction::Load { name, versioned, .. } if name == "i" => versioned.clone(),
                _ => None,
            })
            .unwrap();
        assert_eq!(load_versioned.to_string(), "i1");
    }

    #[test]
    fn test_rename_stacks_balance() {
        let mut func = Function::new("f", 0);
        let l_end = func.fresh_label();
        let l_else = func.fresh_label();
        emit_const_store(&mut func, "x", 1);
        let cond = func.fresh_reg();
        func.emit(Instruction::Load {
            name: "c".to_string(),
            dst: cond,
            versioned: None,
        });
        func.emit(Instruction::JumpIfFalse {
            cond,
            target: l_else,
        });
        emit_const_store(&mut func, "x", 2);
        func.emit(Instruction::Jump { target: l_end });
        func.emit(Instruction::Label { label: l_else });
        emit_const_store(&mut func, "x", 3);
        func.emit(Instruction::Label { label: l_end });

        let mut cfg = cfg::build(&func).unwrap();
        Dominance::compute(&mut cfg).unwrap();

        let mut builder = SsaBuilder::new(&mut func, &mut cfg);
        let defsites = builder.collect_defsites();
        builder.insert_phi_nodes(&defsites);
        let stacks = builder.rename();

        assert!(stacks.is_balanced());
        // counters persist after unwinding: x got x0, x1, x2 and the φ x3
        assert_eq!(stacks.stacks.get("x").unwrap().counter, 4);
    }

    #[test]
    fn test_single_definition_property() {
        let mut func = Function::new("f", 0);
        let l_end = func.fresh_label();
        let l_else = func.fresh_label();
        emit_const_store(&mut func, "x", 1);
        let cond = func.fresh_reg();
        func.emit(Instruction::Load {
            name: "c".to_string(),
            dst: cond,
            versioned: None,
        });
        func.emit(Instruction::JumpIfFalse {
            cond,
            target: l_else,
        });
        emit_const_store(&mut func, "x", 2);
        func.emit(Instruction::Jump { target: l_end });
        func.emit(Instruction::Label { label: l_else });
        emit_const_store(&mut func, "x", 3);
        func.emit(Instruction::Label { label: l_end });

        build_ssa(&mut func);

        let mut defined = std::collections::HashSet::new();
        for inst in &func.insts {
            let versioned = match inst {
                Instruction::Store { versioned, .. } | Instruction::Assign { versioned, .. } => {
                    versioned.clone()
                }
                Instruction::Phi(phi) => phi.result_versioned.clone(),
                _ => None,
            };
            if let Some(name) = versioned {
                assert!(defined.insert(name.to_string()), "duplicate definition");
            }
        }
        assert!(defined.contains("x0"));
        assert!(defined.contains("x3"));
    }
}
