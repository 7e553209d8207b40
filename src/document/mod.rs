// src/document/mod.rs
mod wad;

pub use self::wad::{is_level_marker, write_wad, LevelInfo, LumpEntry, WadDocument};
