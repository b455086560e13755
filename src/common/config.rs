//! Configuration system for the Slate compiler.

use serde::{Deserialize, Serialize};

use crate::common::errors::ConfigError;

/// Main compiler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Analysis configuration.
    pub analysis: AnalysisConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

impl CompilerConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        ConfigLoader::load_from_file(path)
    }
}

/// Analysis pass configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Validate CFG structure (partition, edge symmetry) after construction.
    pub validate_cfg: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { validate_cfg: true }
    }
}

/// Intermediate-artifact printing configuration.
///
/// These map one-to-one onto the textual dumps used for tests and
/// diagnostics: token stream, AST, three-address IR, CFG, dominator sets
/// and dominance frontiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print the token dump.
    pub print_tokens: bool,

    /// Print the AST dump.
    pub print_ast: bool,

    /// Print the IR dump (before and after SSA construction).
    pub print_ir: bool,

    /// Print the CFG dump.
    pub print_cfg: bool,

    /// Print the dominator dump.
    pub print_dominators: bool,

    /// Print the dominance-frontier dump.
    pub print_frontiers: bool,

    /// Print a Graphviz DOT rendering of each CFG.
    pub print_dot: bool,
}

impl OutputConfig {
    /// Enable every artifact dump.
    pub fn all() -> Self {
        Self {
            print_tokens: true,
            print_ast: true,
            print_ir: true,
            print_cfg: true,
            print_dominators: true,
            print_frontiers: true,
            print_dot: true,
        }
    }

    /// Whether any artifact dump is enabled.
    pub fn any(&self) -> bool {
        self.print_tokens
            || self.print_ast
            || self.print_ir
            || self.print_cfg
            || self.print_dominators
            || self.print_frontiers
            || self.print_dot
    }
}

/// Configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &std::path::Path) -> Result<CompilerConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        })?;
        Self::load_from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn load_from_str(content: &str) -> Result<CompilerConfig, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
