//! Graphviz DOT export of a CFG, for visual debugging.

use std::fmt::Write;

use crate::ir::function::Function;

use super::graph::Cfg;

/// Render the CFG as a Graphviz digraph. Each node lists the block's
/// instructions; the entry block is drawn as an ellipse.
pub fn to_dot(cfg: &Cfg, func: &Function) -> String {
    let mut dot = String::from("digraph cfg {\n");
    dot.push_str("    rankdir=TB;\n");
    dot.push_str("    node [shape=rectangle, fontname=\"monospace\"];\n\n");

    for block in cfg.blocks() {
        let mut body = String::new();
        for i in block.window() {
            let _ = write!(body, "{}\\l", func.insts[i]);
        }
        let shape = if block.id.index() == 0 {
            ", shape=ellipse"
        } else {
            ""
        };
        let _ = writeln!(
            dot,
            "    {} [label=\"{}:\\l{body}\"{shape}];",
            block.id.index(),
            block.id
        );
    }

    dot.push('\n');
    for block in cfg.blocks() {
        for succ in &block.successors {
            let _ = writeln!(dot, "    {} -> {};", block.id.index(), succ.index());
        }
    }

    dot.push_str("}\n");
    dot
}
