//! The per-function middle-end pipeline.
//!
//! IR functions are compiled independently: CFG construction, dominator
//! analysis, then SSA conversion, each completing before the next
//! begins. Functions share no mutable state, so the `parallel` feature
//! may farm them out to a rayon worker pool.

use tracing::{debug, debug_span, warn};

use crate::cfg::{self, Cfg};
use crate::common::config::AnalysisConfig;
use crate::common::errors::{CfgError, CompilerResult};
use crate::ir::function::{Function, Program};
use crate::ssa::{self, Dominance};

/// The middle-end results for one function.
#[derive(Debug, Clone)]
pub struct FunctionAnalysis {
    /// The function's control-flow graph, with dominator-tree children
    /// and dominance frontiers filled in.
    pub cfg: Cfg,

    /// Dominator bitsets and immediate dominators.
    pub dominance: Dominance,
}

/// Run CFG construction, dominator analysis and SSA conversion on one
/// function.
///
/// Returns `None` for empty functions, which are skipped rather than
/// failing the compilation.
pub fn middle_end(
    func: &mut Function,
    config: &AnalysisConfig,
) -> CompilerResult<Option<FunctionAnalysis>> {
    let _span = debug_span!("middle_end", function = %func.name).entered();

    let mut cfg = match cfg::build(func) {
        Ok(cfg) => cfg,
        Err(err @ CfgError::EmptyFunction { .. }) => {
            warn!("{err}, skipping");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    debug!(blocks = cfg.block_count(), "CFG built");

    if config.validate_cfg {
        cfg.validate(func.insts.len())?;
    }

    let dominance = Dominance::compute(&mut cfg)?;
    debug!("dominators computed");

    ssa::builder::build(func, &mut cfg);
    debug!(insts = func.insts.len(), "SSA form built");

    if config.validate_cfg {
        // φ insertion grew the instruction array; the shifted windows
        // must still partition it
        cfg.validate(func.insts.len())?;
    }

    Ok(Some(FunctionAnalysis { cfg, dominance }))
}

/// Run the middle-end over every function of a program.
///
/// The result vector is parallel to `program.functions`; skipped
/// (empty) functions hold `None`.
#[cfg(not(feature = "parallel"))]
pub fn run_middle_end(
    program: &mut Program,
    config: &AnalysisConfig,
) -> CompilerResult<Vec<Option<FunctionAnalysis>>> {
    program
        .functions
        .iter_mut()
        .map(|func| middle_end(func, config))
        .collect()
}

/// Run the middle-end over every function of a program, farming the
/// independent per-function compilations out to rayon.
#[cfg(feature = "parallel")]
pub fn run_middle_end(
    program: &mut Program,
    config: &AnalysisConfig,
) -> CompilerResult<Vec<Option<FunctionAnalysis>>> {
    use rayon::prelude::*;

    program
        .functions
        .par_iter_mut()
        .map(|func| middle_end(func, config))
        .collect()
}
