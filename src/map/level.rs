// src/map/level.rs

use rayon::prelude::*;
use std::io::{self, Cursor};

use crate::map::thing::PLAYER1_START;
use crate::map::{LineDef, Sector, SideDef, Thing, Vertex};

/// The editable form of one level: the five classic record tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceLevel {
    pub things: Vec<Thing>,
    pub vertices: Vec<Vertex>,
    pub linedefs: Vec<LineDef>,
    pub sidedefs: Vec<SideDef>,
    pub sectors: Vec<Sector>,
}

impl SourceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, x: i32, y: i32) -> usize {
        self.vertices.push(Vertex::new(x, y));
        self.vertices.len() - 1
    }

    pub fn add_sector(&mut self, sector: Sector) -> usize {
        self.sectors.push(sector);
        self.sectors.len() - 1
    }

    pub fn add_sidedef(&mut self, sidedef: SideDef) -> usize {
        self.sidedefs.push(sidedef);
        self.sidedefs.len() - 1
    }

    pub fn add_linedef(&mut self, linedef: LineDef) -> usize {
        self.linedefs.push(linedef);
        self.linedefs.len() - 1
    }

    /// The first player 1 start, if any.
    pub fn player_start(&self) -> Option<&Thing> {
        self.things.iter().find(|t| t.thing_type == PLAYER1_START)
    }

    pub fn is_empty(&self) -> bool {
        self.linedefs.is_empty()
    }

    /// Order-independent checksum over every record, summed in parallel per table.
    pub fn checksum(&self) -> u32 {
        let things: u32 = self
            .things
            .par_iter()
            .map(|t| crc_of(&[t.raw_x, t.raw_y, t.angle, t.thing_type, t.options]))
            .reduce(|| 0, u32::wrapping_add);
        let vertices: u32 = self
            .vertices
            .par_iter()
            .map(|v| crc_of(&[v.raw_x, v.raw_y]))
            .reduce(|| 0, u32::wrapping_add);
        let linedefs: u32 = self
            .linedefs
            .par_iter()
            .map(|l| {
                crc_of(&[
                    l.start as i32,
                    l.end as i32,
                    l.flags,
                    l.line_type,
                    l.tag,
                    l.right,
                    l.left,
                ])
            })
            .reduce(|| 0, u32::wrapping_add);
        let sidedefs: u32 = self
            .sidedefs
            .par_iter()
            .map(|s| {
                crc_of(&[s.x_offset, s.y_offset, s.sector])
                    .wrapping_add(crc_of_name(s.upper_tex.as_str()))
                    .wrapping_add(crc_of_name(s.lower_tex.as_str()))
                    .wrapping_add(crc_of_name(s.mid_tex.as_str()))
            })
            .reduce(|| 0, u32::wrapping_add);
        let sectors: u32 = self
            .sectors
            .par_iter()
            .map(|s| {
                crc_of(&[s.floor_height, s.ceiling_height, s.light, s.r#type, s.tag])
                    .wrapping_add(crc_of_name(s.floor_tex.as_str()))
                    .wrapping_add(crc_of_name(s.ceiling_tex.as_str()))
            })
            .reduce(|| 0, u32::wrapping_add);

        things
            .wrapping_add(vertices)
            .wrapping_add(linedefs)
            .wrapping_add(sidedefs)
            .wrapping_add(sectors)
    }

    /// Serializes the tables into `(lump name, bytes)` pairs in classic level order.
    pub fn to_lumps(&self) -> io::Result<Vec<(&'static str, Vec<u8>)>> {
        let mut things = Cursor::new(Vec::new());
        for thing in &self.things {
            thing.to_wad(&mut things)?;
        }
        let mut linedefs = Cursor::new(Vec::new());
        for linedef in &self.linedefs {
            linedef.to_wad(&mut linedefs)?;
        }
        let mut sidedefs = Cursor::new(Vec::new());
        for sidedef in &self.sidedefs {
            sidedef.to_wad(&mut sidedefs)?;
        }
        let mut vertices = Cursor::new(Vec::new());
        for vertex in &self.vertices {
            vertex.to_wad(&mut vertices)?;
        }
        let mut sectors = Cursor::new(Vec::new());
        for sector in &self.sectors {
            sector.to_wad(&mut sectors)?;
        }

        Ok(vec![
            ("THINGS", things.into_inner()),
            ("LINEDEFS", linedefs.into_inner()),
            ("SIDEDEFS", sidedefs.into_inner()),
            ("VERTEXES", vertices.into_inner()),
            ("SECTORS", sectors.into_inner()),
        ])
    }
}

fn crc_of(values: &[i32]) -> u32 {
    values
        .iter()
        .fold(0u32, |crc, &v| crc.wrapping_add(v as u32))
}

fn crc_of_name(name: &str) -> u32 {
    name.bytes().fold(0u32, |crc, b| crc.wrapping_add(b as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::NO_SIDE;

    fn triangle() -> SourceLevel {
        let mut level = SourceLevel::new();
        let sector = level.add_sector(Sector::new(0, 128, "FLAT1", "CEIL1", 200));
        let side = level.add_sidedef(SideDef::solid("WALL", sector as i32));
        let a = level.add_vertex(0, 0);
        let b = level.add_vertex(0, 64);
        let c = level.add_vertex(64, 0);
        for (from, to) in [(a, b), (b, c), (c, a)] {
            level.add_linedef(LineDef::new(from, to, side as i32, NO_SIDE));
        }
        level
    }

    #[test]
    fn test_checksum_tracks_changes() {
        let mut level = triangle();
        let before = level.checksum();
        assert_eq!(before, triangle().checksum());

        level.vertices[1].raw_y = 65;
        assert_ne!(level.checksum(), before);
    }

    #[test]
    fn test_lump_sizes() {
        let lumps = triangle().to_lumps().unwrap();
        let size = |name: &str| lumps.iter().find(|(n, _)| *n == name).map(|(_, d)| d.len());
        assert_eq!(size("VERTEXES"), Some(3 * 4));
        assert_eq!(size("LINEDEFS"), Some(3 * 14));
        assert_eq!(size("SIDEDEFS"), Some(30));
        assert_eq!(size("SECTORS"), Some(26));
        assert_eq!(size("THINGS"), Some(0));
    }
}
