// src/map/mod.rs
pub mod level;
pub mod linedef;
pub mod sector;
pub mod sidedef;
pub mod texture_name;
pub mod thing;
pub mod vertex;

pub use level::SourceLevel;
pub use linedef::LineDef;
pub use sector::Sector;
pub use sidedef::SideDef;
pub use texture_name::TextureName;
pub use thing::Thing;
pub use vertex::Vertex;

/// Side index stored for a missing linedef side (`0xFFFF` on disk).
pub const NO_SIDE: i32 = -1;
