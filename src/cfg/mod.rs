//! Control-flow graph construction and queries.
//!
//! Partitions each function's instruction list into basic blocks and
//! links predecessor/successor edges. Blocks are stored in an arena and
//! referenced by index, which keeps ownership flat and makes block ids
//! usable as bit positions in the dominator sets.

mod block;
mod builder;
pub mod dot;
mod graph;

pub use block::{BasicBlock, BlockId};
pub use builder::build;
pub use graph::Cfg;
