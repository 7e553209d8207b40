// src/utils/mod.rs
pub mod geometry;
pub mod util;

pub use geometry::{BoundingBox, Mat2, Transform2D, Vec2};
