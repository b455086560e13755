//! Static single assignment construction.
//!
//! Dominator analysis over word-packed bitsets, dominance frontiers,
//! φ insertion at the iterated frontier of each variable's definition
//! sites, and renaming via a dominator-tree walk with per-variable
//! version stacks.

pub mod bitset;
pub mod builder;
pub mod dominance;

pub use bitset::BlockSet;
pub use builder::SsaBuilder;
pub use dominance::Dominance;
