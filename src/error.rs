// src/error.rs

use thiserror::Error;

/// Failures while partitioning walls into a BSP tree.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    /// No wall in a non-convex leaf separates any other wall from it. For a closed,
    /// non-degenerate wall loop this cannot happen; the tree is abandoned.
    #[error("bsp tree build failed: no split found for a non-convex sector of {lines} lines")]
    NoSplitFound { lines: usize },

    #[error("bsp tree build failed: no input lines")]
    EmptyInput,
}

/// Failures while importing, compiling, reading or writing a level.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid magic: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: String, found: String },

    #[error("unsupported compiled map version {0}")]
    UnsupportedVersion(u32),

    #[error("{table} index {index} out of range")]
    BadIndex { table: &'static str, index: u32 },

    #[error("level {0} not found")]
    LevelNotFound(String),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Failures while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures while loading textures from disk.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("texture decode error: {0}")]
    Image(#[from] image::ImageError),
}
