//! Command-line interface for the Slate compiler.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use colored::Colorize;

use crate::cfg::dot;
use crate::common::config::{CompilerConfig, OutputConfig};
use crate::frontend::token;
use crate::{Compilation, Compiler};

/// Compile a Slate source file down to SSA-form IR.
#[derive(Debug, Parser)]
#[command(author, version, about = "Slate compiler middle-end", long_about = None)]
pub struct Cli {
    /// Source file to compile.
    pub file: PathBuf,

    /// Raise log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print an intermediate artifact (repeatable).
    #[arg(long, value_enum)]
    pub dump: Vec<DumpKind>,

    /// Print every intermediate artifact.
    #[arg(long)]
    pub dump_all: bool,

    /// Result rendering.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Optional TOML configuration file.
    #[arg(long, env = "SLATEC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Intermediate artifacts selectable with `--dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpKind {
    Tokens,
    Ast,
    Ir,
    Cfg,
    Dominators,
    Frontiers,
    Dot,
}

/// Result rendering formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl Cli {
    /// Execute the compilation described by the arguments.
    pub fn run(&self) -> anyhow::Result<()> {
        let mut config = match &self.config {
            Some(path) => CompilerConfig::load_from_file(path)?,
            None => CompilerConfig::default(),
        };
        self.apply_dump_flags(&mut config.output);

        let source = std::fs::read_to_string(&self.file)
            .with_context(|| format!("cannot read {}", self.file.display()))?;

        let compiler = Compiler::new(config.clone());
        let compilation = compiler.compile_source(&source)?;

        self.print_dumps(&config.output, &compilation);

        match self.format {
            OutputFormat::Text => self.print_text_summary(&compilation),
            OutputFormat::Json => self.print_json_summary(&compilation)?,
        }

        Ok(())
    }

    fn apply_dump_flags(&self, output: &mut OutputConfig) {
        if self.dump_all {
            *output = OutputConfig::all();
            return;
        }
        for kind in &self.dump {
            match kind {
                DumpKind::Tokens => output.print_tokens = true,
                DumpKind::Ast => output.print_ast = true,
                DumpKind::Ir => output.print_ir = true,
                DumpKind::Cfg => output.print_cfg = true,
                DumpKind::Dominators => output.print_dominators = true,
                DumpKind::Frontiers => output.print_frontiers = true,
                DumpKind::Dot => output.print_dot = true,
            }
        }
    }

    fn print_dumps(&self, output: &OutputConfig, compilation: &Compilation) {
        if output.print_tokens {
            print!("{}", token::dump(&compilation.tokens));
        }
        if output.print_ast {
            print!("{}", compilation.ast.dump());
        }
        if output.print_ir {
            print!("{}", compilation.program.dump());
        }

        for (func, analysis) in compilation
            .program
            .functions
            .iter()
            .zip(&compilation.analyses)
        {
            let Some(analysis) = analysis else { continue };
            if output.print_cfg || output.print_dominators || output.print_frontiers {
                println!("{}", format!("--- function {} ---", func.name).bold());
            }
            if output.print_cfg {
                print!("{}", analysis.cfg.dump());
            }
            if output.print_dominators {
                print!("{}", analysis.dominance.dump());
            }
            if output.print_frontiers {
                print!("{}", analysis.cfg.dump_frontiers());
            }
            if output.print_dot {
                print!("{}", dot::to_dot(&analysis.cfg, func));
            }
        }
    }

    fn print_text_summary(&self, compilation: &Compilation) {
        for (func, analysis) in compilation
            .program
            .functions
            .iter()
            .zip(&compilation.analyses)
        {
            match analysis {
                Some(analysis) => {
                    let phis = func
                        .insts
                        .iter()
                        .filter(|inst| matches!(inst, crate::ir::Instruction::Phi(_)))
                        .count();
                    println!(
                        "{}: {} instructions, {} blocks, {} phis",
                        func.name.green(),
                        func.insts.len(),
                        analysis.cfg.block_count(),
                        phis
                    );
                }
                None => println!("{}: empty, skipped", func.name.yellow()),
            }
        }
    }

    fn print_json_summary(&self, compilation: &Compilation) -> anyhow::Result<()> {
        let functions: Vec<serde_json::Value> = compilation
            .program
            .functions
            .iter()
            .zip(&compilation.analyses)
            .map(|(func, analysis)| {
                let instructions: Vec<String> =
                    func.insts.iter().map(|inst| inst.to_string()).collect();
                serde_json::json!({
                    "name": func.name,
                    "index": func.index,
                    "skipped": analysis.is_none(),
                    "blocks": analysis.as_ref().map(|a| a.cfg.block_count()),
                    "instructions": instructions,
                })
            })
            .collect();

        let summary = serde_json::json!({ "functions": functions });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}
