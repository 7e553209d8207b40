// src/bsp/mod.rs
pub mod bsp_builder;
pub mod bsp_level;
pub mod bsp_line;
pub mod bsp_node;
pub mod bsp_procedural;
pub mod debug_viz;

pub use bsp_builder::{BspTreeBuilder, SplitScoreData, SplitScoreWeights};
pub use bsp_level::cook;
pub use bsp_line::{BspLine, LineSide};
pub use bsp_node::{BspNode, NodeId, NodeKind, Sector};

/// Distances within this of a line count as on it.
pub const EPSILON: f32 = 1.0e-3;
