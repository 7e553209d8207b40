// src/bsp/bsp_level.rs
//! Compiles a [`SourceLevel`] into a render-ready [`CompiledMap`].

use std::collections::HashMap;

use log::{debug, info};

use crate::bsp::bsp_builder::{BspTreeBuilder, SplitScoreWeights};
use crate::bsp::bsp_line::BspLine;
use crate::bsp::bsp_node::{NodeId, NodeKind};
use crate::compiled::{
    self, Child, CompiledMap, LineDef, LineSeg, Node, SideDef, SubSector, LINE_TWO_SIDED,
};
use crate::error::MapError;
use crate::map::SourceLevel;
use crate::render::texture::TextureId;
use crate::utils::Vec2;

/// Map units per world unit.
pub const MAP_SCALE: f32 = 32.0;
/// Vertex positions are snapped to this many steps per world unit.
pub const QUANTIZE_STEPS: f32 = 1024.0;

/// Converts map units to world units, truncating the magnitude to a 1/1024 grid.
pub fn quantize(raw_x: i32, raw_y: i32) -> Vec2 {
    let snap = |v: i32| {
        let world = v as f32 / MAP_SCALE;
        let steps = (world.abs() * QUANTIZE_STEPS).floor();
        steps.copysign(world) / QUANTIZE_STEPS
    };
    Vec2::new(snap(raw_x), snap(raw_y))
}

/// Exact-match vertex deduplication on bit patterns.
#[derive(Default)]
struct VertexPool {
    vertices: Vec<Vec2>,
    lookup: HashMap<(u32, u32), u32>,
}

impl VertexPool {
    fn add(&mut self, v: Vec2) -> u32 {
        let key = (v.x.to_bits(), v.y.to_bits());
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.vertices.len() as u32;
        self.vertices.push(v);
        self.lookup.insert(key, index);
        index
    }
}

fn bad(table: &'static str, index: impl TryInto<u32>) -> MapError {
    MapError::BadIndex {
        table,
        index: index.try_into().unwrap_or(u32::MAX),
    }
}

/// Checks every vertex, sidedef and sector reference of `level`.
pub fn validate(level: &SourceLevel) -> Result<(), MapError> {
    for linedef in &level.linedefs {
        for vertex in [linedef.start, linedef.end] {
            if vertex >= level.vertices.len() {
                return Err(bad("vertices", vertex));
            }
        }
        if linedef.right < 0 || linedef.right as usize >= level.sidedefs.len() {
            return Err(bad("sidedefs", linedef.right as u32));
        }
        if linedef.has_back() && (linedef.left < 0 || linedef.left as usize >= level.sidedefs.len()) {
            return Err(bad("sidedefs", linedef.left as u32));
        }
    }
    for sidedef in &level.sidedefs {
        if sidedef.sector < 0 || sidedef.sector as usize >= level.sectors.len() {
            return Err(bad("sectors", sidedef.sector as u32));
        }
    }
    Ok(())
}

/// One wall per linedef side: the linedef itself for the front, reversed for the back.
/// Normals point into the sector each side faces. Zero-length linedefs are skipped.
pub fn source_lines(level: &SourceLevel) -> Vec<BspLine> {
    let vertices: Vec<Vec2> = level
        .vertices
        .iter()
        .map(|v| quantize(v.raw_x, v.raw_y))
        .collect();

    let mut lines = Vec::with_capacity(level.linedefs.len() * 2);
    for (index, linedef) in level.linedefs.iter().enumerate() {
        let from = vertices[linedef.start];
        let to = vertices[linedef.end];
        if from == to {
            debug!("Skipping zero-length linedef {}", index);
            continue;
        }

        lines.push(BspLine::new(from, to).with_source(index, true));
        if linedef.has_back() {
            lines.push(BspLine::new(to, from).with_source(index, false));
        }
    }
    lines
}

/// Builds the BSP for `level` and flattens everything into a [`CompiledMap`].
pub fn cook(level: &SourceLevel, weights: &SplitScoreWeights) -> Result<CompiledMap, MapError> {
    validate(level)?;

    let mut builder = BspTreeBuilder::new(*weights);
    builder.init(&source_lines(level))?;
    builder.build()?;

    let mut pool = VertexPool::default();
    let mut map = CompiledMap::default();

    for src in &level.linedefs {
        let from = pool.add(quantize(level.vertices[src.start].raw_x, level.vertices[src.start].raw_y));
        let to = pool.add(quantize(level.vertices[src.end].raw_x, level.vertices[src.end].raw_y));
        map.linedefs.push(LineDef {
            from,
            to,
            flags: if src.has_back() { LINE_TWO_SIDED } else { 0 },
            sides: [
                src.right as u32,
                if src.has_back() { src.left as u32 } else { compiled::NO_SIDE },
            ],
        });
    }

    map.sidedefs = level
        .sidedefs
        .iter()
        .map(|src| SideDef {
            mid: TextureId::from_name(src.mid_tex.as_str()),
            upper: TextureId::from_name(src.upper_tex.as_str()),
            lower: TextureId::from_name(src.lower_tex.as_str()),
            sector: src.sector as u32,
        })
        .collect();

    map.sectors = level
        .sectors
        .iter()
        .map(|src| compiled::Sector {
            floor_texture: TextureId::from_name(src.floor_tex.as_str()),
            ceiling_texture: TextureId::from_name(src.ceiling_tex.as_str()),
            floor_height: src.floor_height as f32 / MAP_SCALE,
            ceiling_height: src.ceiling_height as f32 / MAP_SCALE,
            light: src.light as f32 / 255.0,
        })
        .collect();

    map.root = emit(&builder, BspTreeBuilder::ROOT, &mut map, &mut pool);
    map.vertices = pool.vertices;

    info!(
        "Cooked level: {} vertices, {} linedefs, {} sectors, {} segs, {} subsectors, {} nodes",
        map.vertices.len(),
        map.linedefs.len(),
        map.sectors.len(),
        map.linesegs.len(),
        map.subsectors.len(),
        map.nodes.len()
    );
    Ok(map)
}

/// Emits node `id` depth-first, front child first, returning its child reference.
fn emit(builder: &BspTreeBuilder, id: NodeId, map: &mut CompiledMap, pool: &mut VertexPool) -> Child {
    match &builder.node(id).kind {
        NodeKind::Leaf(sector) => {
            let first_seg = map.linesegs.len() as u32;
            for line in &sector.lines {
                map.linesegs.push(LineSeg {
                    linedef: line.linedef as u32,
                    from: pool.add(line.a),
                    to: pool.add(line.b),
                    side: if line.front { 0 } else { 1 },
                });
            }

            let owner = sector
                .lines
                .first()
                .map(|line| {
                    let linedef = &map.linedefs[line.linedef];
                    let side = linedef.sides[if line.front { 0 } else { 1 }];
                    map.sidedefs[side as usize].sector
                })
                .unwrap_or(0);

            map.subsectors.push(SubSector {
                sector: owner,
                first_seg,
                num_segs: sector.lines.len() as u32,
            });
            Child::SubSector(map.subsectors.len() as u32 - 1)
        }
        NodeKind::Internal { split, front, back } => {
            let index = map.nodes.len();
            map.nodes.push(Node {
                normal: split.n,
                distance: split.n.dot(split.a),
                children: [Child::None, Child::None],
            });
            let front = emit(builder, *front, map, pool);
            let back = emit(builder, *back, map, pool);
            map.nodes[index].children = [front, back];
            Child::Node(index as u32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{LineDef as SourceLineDef, Sector, SideDef as SourceSideDef, NO_SIDE};
    use assert_approx_eq::assert_approx_eq;

    /// Adds a closed clockwise loop of one-sided walls facing `sector`.
    fn add_room(level: &mut SourceLevel, corners: &[(i32, i32)], sector: usize) {
        let side = level.add_sidedef(SourceSideDef::solid("STARTAN3", sector as i32));
        let ids: Vec<usize> = corners.iter().map(|&(x, y)| level.add_vertex(x, y)).collect();
        for i in 0..ids.len() {
            level.add_linedef(SourceLineDef::new(ids[i], ids[(i + 1) % ids.len()], side as i32, NO_SIDE));
        }
    }

    fn l_room() -> SourceLevel {
        let mut level = SourceLevel::new();
        let sector = level.add_sector(Sector::new(0, 128, "FLAT1", "CEIL1", 255));
        add_room(
            &mut level,
            &[(0, 0), (0, 64), (32, 64), (32, 32), (64, 32), (64, 0)],
            sector,
        );
        level
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(32, -64), Vec2::new(1.0, -2.0));
        let q = quantize(1, -1);
        assert_approx_eq!(q.x, 32.0 / 1024.0, 1e-7);
        assert_approx_eq!(q.y, -32.0 / 1024.0, 1e-7);
        let odd = quantize(-7, 0);
        assert!(odd.x <= -7.0 / 32.0 + 1e-6 && odd.x > -7.0 / 32.0 - 1.0 / 1024.0);
    }

    #[test]
    fn test_vertex_pool_dedupes() {
        let mut pool = VertexPool::default();
        let a = pool.add(Vec2::new(1.0, 2.0));
        let b = pool.add(Vec2::new(3.0, 2.0));
        assert_eq!(pool.add(Vec2::new(1.0, 2.0)), a);
        assert_ne!(a, b);
        assert_eq!(pool.vertices.len(), 2);
    }

    #[test]
    fn test_convex_room_compiles_to_single_subsector() {
        let mut level = SourceLevel::new();
        let sector = level.add_sector(Sector::new(16, 128, "FLAT1", "CEIL1", 255));
        add_room(&mut level, &[(0, 0), (0, 64), (64, 64), (64, 0)], sector);

        let map = cook(&level, &SplitScoreWeights::default()).unwrap();
        assert!(map.nodes.is_empty());
        assert_eq!(map.root, Child::SubSector(0));
        assert_eq!(map.subsectors.len(), 1);
        assert_eq!(map.linesegs.len(), 4);
        assert_eq!(map.vertices.len(), 4);
        assert_approx_eq!(map.sectors[0].floor_height, 0.5, 1e-6);
        assert_approx_eq!(map.sectors[0].light, 1.0, 1e-6);
        assert_eq!(map.sidedefs[0].mid, TextureId::from_name("STARTAN3"));
        assert_eq!(map.sidedefs[0].upper, TextureId::NONE);
        assert!(map.validate().is_ok());
    }

    #[test]
    fn test_l_room_compiles_to_two_subsectors() {
        let map = cook(&l_room(), &SplitScoreWeights::default()).unwrap();
        assert_eq!(map.nodes.len(), 1);
        assert_eq!(map.root, Child::Node(0));
        assert_eq!(map.subsectors.len(), 2);
        // The bottom wall is cut in two by the split.
        assert_eq!(map.linesegs.len(), 7);
        assert!(map.validate().is_ok());

        let upper = map.locate_subsector(Vec2::new(0.5, 1.5));
        let lower = map.locate_subsector(Vec2::new(1.5, 0.5));
        assert!(upper.is_some() && lower.is_some());
        assert_ne!(upper, lower);
        assert!(map.sector_at(Vec2::new(0.5, 0.5)).is_some());
    }

    #[test]
    fn test_two_sided_line_gets_both_segs() {
        let mut level = SourceLevel::new();
        let low = level.add_sector(Sector::new(0, 128, "FLAT1", "CEIL1", 200));
        let high = level.add_sector(Sector::new(32, 128, "FLAT2", "CEIL1", 200));
        let wall_low = level.add_sidedef(SourceSideDef::solid("WALL", low as i32)) as i32;
        let wall_high = level.add_sidedef(SourceSideDef::solid("WALL", high as i32)) as i32;
        let step_low = level.add_sidedef(SourceSideDef::portal("STEP", low as i32)) as i32;
        let step_high = level.add_sidedef(SourceSideDef::portal("STEP", high as i32)) as i32;

        let v: Vec<usize> = [(0, 0), (0, 64), (64, 64), (128, 64), (128, 0), (64, 0)]
            .iter()
            .map(|&(x, y)| level.add_vertex(x, y))
            .collect();
        level.add_linedef(SourceLineDef::new(v[0], v[1], wall_low, NO_SIDE));
        level.add_linedef(SourceLineDef::new(v[1], v[2], wall_low, NO_SIDE));
        level.add_linedef(SourceLineDef::new(v[2], v[3], wall_high, NO_SIDE));
        level.add_linedef(SourceLineDef::new(v[3], v[4], wall_high, NO_SIDE));
        level.add_linedef(SourceLineDef::new(v[4], v[5], wall_high, NO_SIDE));
        level.add_linedef(SourceLineDef::new(v[5], v[0], wall_low, NO_SIDE));
        // Front faces the low room (x < 64).
        level.add_linedef(SourceLineDef::new(v[2], v[5], step_low, step_high));

        assert_eq!(source_lines(&level).len(), 8);
        let map = cook(&level, &SplitScoreWeights::default()).unwrap();
        assert!(map.linedefs[6].is_two_sided());
        assert_eq!(map.linedefs[6].flags, LINE_TWO_SIDED);

        let low_floor = map.sector_at(Vec2::new(1.0, 1.0)).unwrap().floor_height;
        let high_floor = map.sector_at(Vec2::new(3.0, 1.0)).unwrap().floor_height;
        assert_approx_eq!(low_floor, 0.0, 1e-6);
        assert_approx_eq!(high_floor, 1.0, 1e-6);
    }

    #[test]
    fn test_bad_references_are_rejected() {
        let mut level = l_room();
        level.linedefs[2].end = 99;
        assert!(matches!(
            cook(&level, &SplitScoreWeights::default()),
            Err(MapError::BadIndex { table: "vertices", index: 99 })
        ));

        let mut level = l_room();
        level.sidedefs[0].sector = 3;
        assert!(matches!(
            cook(&level, &SplitScoreWeights::default()),
            Err(MapError::BadIndex { table: "sectors", index: 3 })
        ));

        assert!(matches!(
            cook(&SourceLevel::new(), &SplitScoreWeights::default()),
            Err(MapError::Build(_))
        ));
    }
}
