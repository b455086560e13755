//! # Slate compiler middle-end
//!
//! Compiles a small typed imperative language down to SSA-form
//! three-address IR.
//!
//! ## Architecture overview
//!
//! The compiler is a straight pipeline:
//!
//! ```text
//! Source → Lexer → Parser → Sema → IR gen → CFG → Dominators → SSA
//!            ↓        ↓       ↓       ↓       ↓        ↓         ↓
//!          tokens    AST    scopes  3-addr  blocks  idom/DF   φ + rename
//! ```
//!
//! The frontend (lexing, parsing, scope checks) is deliberately small;
//! the middle-end carries the weight: basic-block partitioning, the
//! iterative dominator fixed point over word-packed bitsets, dominance
//! frontiers, and pruned-style φ insertion with dominator-tree renaming.
//!
//! ## Quick start
//!
//! ```rust
//! use slatec::{Compiler, CompilerConfig};
//!
//! let compiler = Compiler::new(CompilerConfig::default());
//! let compilation = compiler
//!     .compile_source("f():i32 { x:i32 = 1; if c { x:i32 = 2; } y:i32 = x; }")
//!     .unwrap();
//!
//! // every store now carries a versioned name, and merge points carry φs
//! println!("{}", compilation.program.dump());
//! ```

pub mod cfg;
pub mod common;
pub mod frontend;
pub mod ir;
pub mod pipeline;
pub mod ssa;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export main types for convenience
pub use common::{
    config::{CompilerConfig, ConfigLoader},
    errors::{CompilerError, CompilerResult},
};
pub use pipeline::FunctionAnalysis;

use frontend::ast::Ast;
use frontend::token::Token;
use ir::function::Program;

/// Main compiler facade providing the high-level API.
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    /// Create a new compiler with the given configuration.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile source text down to SSA-form IR.
    ///
    /// Returns every intermediate artifact so callers (and tests) can
    /// inspect the token stream, the AST, the SSA program and the
    /// per-function CFG/dominator state.
    pub fn compile_source(&self, source: &str) -> CompilerResult<Compilation> {
        let tokens = frontend::lexer::lex(source)?;

        let ast = frontend::parser::parse(&tokens)?;

        frontend::sema::analyze(&ast)?;

        let mut program = ir::lower::lower_program(&ast)?;

        let analyses = pipeline::run_middle_end(&mut program, &self.config.analysis)?;

        Ok(Compilation {
            tokens,
            ast,
            program,
            analyses,
        })
    }
}

/// Complete compilation result.
#[derive(Debug)]
pub struct Compilation {
    /// The token stream.
    pub tokens: Vec<Token>,

    /// The parsed program.
    pub ast: Ast,

    /// The IR program, in SSA form.
    pub program: Program,

    /// Per-function middle-end results, parallel to
    /// `program.functions`; `None` for skipped empty functions.
    pub analyses: Vec<Option<FunctionAnalysis>>,
}
