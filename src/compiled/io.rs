// src/compiled/io.rs
//! Binary `FMAP` container: magic, version, then each table as a count plus
//! little-endian records, then the root reference.

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use log::info;
use std::io::{Read, Write};

use super::{Child, CompiledMap, LineDef, LineSeg, Node, Sector, SideDef, SubSector};
use crate::error::MapError;
use crate::render::texture::TextureId;
use crate::utils::Vec2;

pub const FMAP_MAGIC: &[u8; 4] = b"FMAP";
pub const FMAP_VERSION: u32 = 1;

fn write_table<W: Write, T>(
    writer: &mut W,
    items: &[T],
    mut write: impl FnMut(&mut W, &T) -> std::io::Result<()>,
) -> std::io::Result<()> {
    writer.write_u32::<LE>(items.len() as u32)?;
    for item in items {
        write(writer, item)?;
    }
    Ok(())
}

fn read_table<R: Read, T>(
    reader: &mut R,
    mut read: impl FnMut(&mut R) -> std::io::Result<T>,
) -> std::io::Result<Vec<T>> {
    let count = reader.read_u32::<LE>()? as usize;
    // Cap the up-front reservation; a corrupt count fails on the first short read.
    let mut items = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        items.push(read(reader)?);
    }
    Ok(items)
}

fn read_texture<R: Read>(reader: &mut R) -> std::io::Result<TextureId> {
    Ok(TextureId(reader.read_u64::<LE>()?))
}

fn read_vec2<R: Read>(reader: &mut R) -> std::io::Result<Vec2> {
    Ok(Vec2::new(reader.read_f32::<LE>()?, reader.read_f32::<LE>()?))
}

impl CompiledMap {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), MapError> {
        writer.write_all(FMAP_MAGIC)?;
        writer.write_u32::<LE>(FMAP_VERSION)?;

        write_table(writer, &self.vertices, |w, v| {
            w.write_f32::<LE>(v.x)?;
            w.write_f32::<LE>(v.y)
        })?;
        write_table(writer, &self.linedefs, |w, l| {
            w.write_u32::<LE>(l.from)?;
            w.write_u32::<LE>(l.to)?;
            w.write_u32::<LE>(l.flags)?;
            w.write_u32::<LE>(l.sides[0])?;
            w.write_u32::<LE>(l.sides[1])
        })?;
        write_table(writer, &self.sidedefs, |w, s| {
            w.write_u64::<LE>(s.mid.0)?;
            w.write_u64::<LE>(s.upper.0)?;
            w.write_u64::<LE>(s.lower.0)?;
            w.write_u32::<LE>(s.sector)
        })?;
        write_table(writer, &self.sectors, |w, s| {
            w.write_u64::<LE>(s.floor_texture.0)?;
            w.write_u64::<LE>(s.ceiling_texture.0)?;
            w.write_f32::<LE>(s.floor_height)?;
            w.write_f32::<LE>(s.ceiling_height)?;
            w.write_f32::<LE>(s.light)
        })?;
        write_table(writer, &self.linesegs, |w, s| {
            w.write_u32::<LE>(s.linedef)?;
            w.write_u32::<LE>(s.from)?;
            w.write_u32::<LE>(s.to)?;
            w.write_u32::<LE>(s.side)
        })?;
        write_table(writer, &self.subsectors, |w, s| {
            w.write_u32::<LE>(s.sector)?;
            w.write_u32::<LE>(s.first_seg)?;
            w.write_u32::<LE>(s.num_segs)
        })?;
        write_table(writer, &self.nodes, |w, n| {
            w.write_f32::<LE>(n.normal.x)?;
            w.write_f32::<LE>(n.normal.y)?;
            w.write_f32::<LE>(n.distance)?;
            w.write_u32::<LE>(n.children[0].to_raw())?;
            w.write_u32::<LE>(n.children[1].to_raw())
        })?;
        writer.write_u32::<LE>(self.root.to_raw())?;
        Ok(())
    }

    /// Reads and validates a map written by [`write_to`](Self::write_to).
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, MapError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != FMAP_MAGIC {
            return Err(MapError::InvalidMagic {
                expected: String::from_utf8_lossy(FMAP_MAGIC).into_owned(),
                found: String::from_utf8_lossy(&magic).into_owned(),
            });
        }
        let version = reader.read_u32::<LE>()?;
        if version != FMAP_VERSION {
            return Err(MapError::UnsupportedVersion(version));
        }

        let vertices = read_table(reader, read_vec2)?;
        let linedefs = read_table(reader, |r| {
            Ok(LineDef {
                from: r.read_u32::<LE>()?,
                to: r.read_u32::<LE>()?,
                flags: r.read_u32::<LE>()?,
                sides: [r.read_u32::<LE>()?, r.read_u32::<LE>()?],
            })
        })?;
        let sidedefs = read_table(reader, |r| {
            Ok(SideDef {
                mid: read_texture(r)?,
                upper: read_texture(r)?,
                lower: read_texture(r)?,
                sector: r.read_u32::<LE>()?,
            })
        })?;
        let sectors = read_table(reader, |r| {
            Ok(Sector {
                floor_texture: read_texture(r)?,
                ceiling_texture: read_texture(r)?,
                floor_height: r.read_f32::<LE>()?,
                ceiling_height: r.read_f32::<LE>()?,
                light: r.read_f32::<LE>()?,
            })
        })?;
        let linesegs = read_table(reader, |r| {
            Ok(LineSeg {
                linedef: r.read_u32::<LE>()?,
                from: r.read_u32::<LE>()?,
                to: r.read_u32::<LE>()?,
                side: r.read_u32::<LE>()?,
            })
        })?;
        let subsectors = read_table(reader, |r| {
            Ok(SubSector {
                sector: r.read_u32::<LE>()?,
                first_seg: r.read_u32::<LE>()?,
                num_segs: r.read_u32::<LE>()?,
            })
        })?;
        let nodes = read_table(reader, |r| {
            Ok(Node {
                normal: read_vec2(r)?,
                distance: r.read_f32::<LE>()?,
                children: [
                    Child::from_raw(r.read_u32::<LE>()?),
                    Child::from_raw(r.read_u32::<LE>()?),
                ],
            })
        })?;
        let root = Child::from_raw(reader.read_u32::<LE>()?);

        let map = CompiledMap {
            vertices,
            linedefs,
            sidedefs,
            sectors,
            linesegs,
            subsectors,
            nodes,
            root,
        };
        map.validate()?;

        info!(
            "Read compiled map: {} vertices, {} segs, {} subsectors, {} nodes",
            map.vertices.len(),
            map.linesegs.len(),
            map.subsectors.len(),
            map.nodes.len()
        );
        Ok(map)
    }
}
