// src/compiled/mod.rs
//! The render-ready form of a level: flat tables plus a flattened BSP.

mod io;

use crate::error::MapError;
use crate::render::texture::TextureId;
use crate::utils::Vec2;

pub use self::io::{FMAP_MAGIC, FMAP_VERSION};

/// Tag bit marking a child reference as a sub-sector index.
pub const SUBSECTOR_BIT: u32 = 1 << 31;
/// Raw child reference meaning "no child".
pub const NO_CHILD: u32 = u32::MAX;
/// Back side index of a one-sided linedef.
pub const NO_SIDE: u32 = u32::MAX;

/// Linedef flag: the line has two sides.
pub const LINE_TWO_SIDED: u32 = 1;

/// A child of a compiled node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Node(u32),
    SubSector(u32),
    None,
}

impl Child {
    pub fn from_raw(raw: u32) -> Self {
        if raw == NO_CHILD {
            Child::None
        } else if raw & SUBSECTOR_BIT != 0 {
            Child::SubSector(raw & !SUBSECTOR_BIT)
        } else {
            Child::Node(raw)
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Child::Node(index) => index,
            Child::SubSector(index) => index | SUBSECTOR_BIT,
            Child::None => NO_CHILD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineDef {
    pub from: u32,
    pub to: u32,
    pub flags: u32,
    /// Front side, then back side or [`NO_SIDE`].
    pub sides: [u32; 2],
}

impl LineDef {
    pub fn is_two_sided(&self) -> bool {
        self.sides[1] != NO_SIDE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideDef {
    pub mid: TextureId,
    pub upper: TextureId,
    pub lower: TextureId,
    pub sector: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    pub floor_texture: TextureId,
    pub ceiling_texture: TextureId,
    pub floor_height: f32,
    pub ceiling_height: f32,
    /// 0..=1.
    pub light: f32,
}

/// A piece of one linedef side bounding a sub-sector, from vertex `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSeg {
    pub linedef: u32,
    pub from: u32,
    pub to: u32,
    /// 0 for the linedef's front side, 1 for its back side.
    pub side: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubSector {
    pub sector: u32,
    pub first_seg: u32,
    pub num_segs: u32,
}

/// Points with `dot(normal, p) >= distance` belong to `children[0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub normal: Vec2,
    pub distance: f32,
    pub children: [Child; 2],
}

impl Node {
    pub fn side(&self, p: Vec2) -> usize {
        if self.normal.dot(p) >= self.distance {
            0
        } else {
            1
        }
    }
}

/// Immutable tables produced by [`cook`](crate::bsp::cook) or read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMap {
    pub vertices: Vec<Vec2>,
    pub linedefs: Vec<LineDef>,
    pub sidedefs: Vec<SideDef>,
    pub sectors: Vec<Sector>,
    pub linesegs: Vec<LineSeg>,
    pub subsectors: Vec<SubSector>,
    pub nodes: Vec<Node>,
    /// Where traversal starts: node 0 for a split level, the only sub-sector otherwise.
    pub root: Child,
}

impl Default for CompiledMap {
    fn default() -> Self {
        CompiledMap {
            vertices: Vec::new(),
            linedefs: Vec::new(),
            sidedefs: Vec::new(),
            sectors: Vec::new(),
            linesegs: Vec::new(),
            subsectors: Vec::new(),
            nodes: Vec::new(),
            root: Child::None,
        }
    }
}

impl CompiledMap {
    /// Sub-sector containing `p`, found by descending from the root.
    pub fn locate_subsector(&self, p: Vec2) -> Option<u32> {
        let mut child = self.root;
        loop {
            match child {
                Child::SubSector(index) => return Some(index),
                Child::None => return None,
                Child::Node(index) => {
                    let node = self.nodes.get(index as usize)?;
                    child = node.children[node.side(p)];
                }
            }
        }
    }

    /// Sector owning the sub-sector that contains `p`.
    pub fn sector_at(&self, p: Vec2) -> Option<&Sector> {
        let subsector = self.subsectors.get(self.locate_subsector(p)? as usize)?;
        self.sectors.get(subsector.sector as usize)
    }

    pub fn subsector_segs(&self, subsector: &SubSector) -> &[LineSeg] {
        let first = subsector.first_seg as usize;
        &self.linesegs[first..first + subsector.num_segs as usize]
    }

    /// The sector a seg faces, and for two-sided lines the sector behind it.
    pub fn seg_sectors(&self, seg: &LineSeg) -> (&Sector, Option<&Sector>) {
        let linedef = &self.linedefs[seg.linedef as usize];
        let side = seg.side as usize;
        let front = &self.sectors[self.sidedefs[linedef.sides[side] as usize].sector as usize];
        let back = if linedef.is_two_sided() {
            let back_side = linedef.sides[1 - side];
            Some(&self.sectors[self.sidedefs[back_side as usize].sector as usize])
        } else {
            None
        };
        (front, back)
    }

    /// Every texture the map refers to, without duplicates or [`TextureId::NONE`].
    pub fn texture_ids(&self) -> Vec<TextureId> {
        let mut ids: Vec<TextureId> = self
            .sidedefs
            .iter()
            .flat_map(|s| [s.mid, s.upper, s.lower])
            .chain(
                self.sectors
                    .iter()
                    .flat_map(|s| [s.floor_texture, s.ceiling_texture]),
            )
            .filter(|id| !id.is_none())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Checks every cross-table reference.
    pub fn validate(&self) -> Result<(), MapError> {
        fn check(table: &'static str, index: u32, len: usize) -> Result<(), MapError> {
            if (index as usize) < len {
                Ok(())
            } else {
                Err(MapError::BadIndex { table, index })
            }
        }

        for linedef in &self.linedefs {
            check("vertices", linedef.from, self.vertices.len())?;
            check("vertices", linedef.to, self.vertices.len())?;
            check("sidedefs", linedef.sides[0], self.sidedefs.len())?;
            if linedef.is_two_sided() {
                check("sidedefs", linedef.sides[1], self.sidedefs.len())?;
            }
        }
        for sidedef in &self.sidedefs {
            check("sectors", sidedef.sector, self.sectors.len())?;
        }
        for seg in &self.linesegs {
            check("linedefs", seg.linedef, self.linedefs.len())?;
            check("vertices", seg.from, self.vertices.len())?;
            check("vertices", seg.to, self.vertices.len())?;
            let linedef = &self.linedefs[seg.linedef as usize];
            if seg.side > 1 || (seg.side == 1 && !linedef.is_two_sided()) {
                return Err(MapError::BadIndex {
                    table: "sides",
                    index: seg.side,
                });
            }
        }
        for subsector in &self.subsectors {
            check("sectors", subsector.sector, self.sectors.len())?;
            let end = subsector.first_seg as u64 + subsector.num_segs as u64;
            if end > self.linesegs.len() as u64 {
                return Err(MapError::BadIndex {
                    table: "linesegs",
                    index: subsector.first_seg,
                });
            }
        }
        for child in self.nodes.iter().flat_map(|n| n.children).chain([self.root]) {
            match child {
                Child::Node(index) => check("nodes", index, self.nodes.len())?,
                Child::SubSector(index) => check("subsectors", index, self.subsectors.len())?,
                Child::None => {}
            }
        }
        Ok(())
    }
}
