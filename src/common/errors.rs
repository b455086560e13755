//! Error types and handling for the Slate compiler.
//!
//! Every phase has its own error enum; all of them nest under
//! [`CompilerError`]. Errors are fatal to the current compilation — there
//! is no partial-success contract. A caller compiling multiple programs
//! may catch per-program and continue.

use thiserror::Error;

/// Main result type for compiler operations.
pub type CompilerResult<T> = Result<T, CompilerError>;

/// Main error type encompassing all compiler errors.
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("lowering error: {0}")]
    Lowering(#[from] LoweringError),

    #[error("CFG error: {0}")]
    Cfg(#[from] CfgError),

    #[error("SSA error: {0}")]
    Ssa(#[from] SsaError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Tokenization errors.
#[derive(Error, Debug)]
pub enum LexError {
    #[error("unexpected character '{ch}' at byte offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("identifier exceeds {limit} bytes")]
    IdentifierTooLong { limit: usize },
}

/// Syntax errors from the recursive-descent parser.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("expected {expected}, got '{found}'")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("'{keyword}' is reserved and not yet supported")]
    ReservedKeyword { keyword: String },
}

/// Scope-resolution errors.
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("variable '{name}' is already declared in this scope")]
    DuplicateDeclaration { name: String },

    #[error("function '{name}' is already defined")]
    DuplicateFunction { name: String },
}

/// AST-to-IR lowering errors.
#[derive(Error, Debug)]
pub enum LoweringError {
    #[error("invalid operator '{token}', expected +, -, * or /")]
    InvalidOperator { token: String },

    #[error("expression produced no value in {context}")]
    MissingOperand { context: &'static str },
}

/// CFG construction errors.
#[derive(Error, Debug)]
pub enum CfgError {
    /// The function has no instructions; higher layers skip it.
    #[error("empty function '{function}'")]
    EmptyFunction { function: String },

    #[error("unresolved label l{label} in function '{function}'")]
    UnresolvedLabel { label: u32, function: String },

    #[error("malformed CFG: {reason}")]
    Malformed { reason: String },
}

/// Dominator/SSA construction errors. These indicate bugs, not bad input.
#[derive(Error, Debug)]
pub enum SsaError {
    #[error("no immediate dominator found for reachable block bb{block}")]
    MissingIdom { block: usize },

    #[error("dominator fixed point did not converge within {sweeps} sweeps")]
    FixpointDiverged { sweeps: usize },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CompilerError {
    /// Create an internal error with a custom message.
    pub fn internal<T: Into<String>>(msg: T) -> Self {
        CompilerError::Internal(msg.into())
    }

    /// The pipeline phase the error originated in.
    pub fn phase(&self) -> &'static str {
        match self {
            CompilerError::Lex(_) => "lex",
            CompilerError::Parse(_) => "parse",
            CompilerError::Semantic(_) => "sema",
            CompilerError::Lowering(_) => "lower",
            CompilerError::Cfg(_) => "cfg",
            CompilerError::Ssa(_) => "ssa",
            CompilerError::Config(_) => "config",
            CompilerError::Io(_) => "io",
            CompilerError::Internal(_) => "internal",
        }
    }
}
