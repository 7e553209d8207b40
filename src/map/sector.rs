// src/map/sector.rs

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{self, Read, Write};

use crate::map::TextureName;

/// A source-level sector (26 bytes on disk).
///
/// ```text
/// offset  field           type
/// ------  --------------  -------
///  0-1    floor_height    i16
///  2-3    ceiling_height  i16
///  4-11   floor_tex       [u8; 8]
/// 12-19   ceiling_tex     [u8; 8]
/// 20-21   light           i16
/// 22-23   special type    i16
/// 24-25   tag             i16
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub floor_height: i32,
    pub ceiling_height: i32,
    pub floor_tex: TextureName,
    pub ceiling_tex: TextureName,
    /// 0-255.
    pub light: i32,
    pub r#type: i32,
    pub tag: i32,
}

impl Sector {
    pub fn new(floor_height: i32, ceiling_height: i32, floor_tex: &str, ceiling_tex: &str, light: i32) -> Self {
        Sector {
            floor_height,
            ceiling_height,
            floor_tex: TextureName::new(floor_tex),
            ceiling_tex: TextureName::new(ceiling_tex),
            light,
            r#type: 0,
            tag: 0,
        }
    }

    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Sector {
            floor_height: reader.read_i16::<LE>()? as i32,
            ceiling_height: reader.read_i16::<LE>()? as i32,
            floor_tex: TextureName::from_wad(reader)?,
            ceiling_tex: TextureName::from_wad(reader)?,
            light: reader.read_i16::<LE>()? as i32,
            r#type: reader.read_i16::<LE>()? as i32,
            tag: reader.read_i16::<LE>()? as i32,
        })
    }

    pub fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.floor_height as i16)?;
        writer.write_i16::<LE>(self.ceiling_height as i16)?;
        self.floor_tex.to_wad(writer)?;
        self.ceiling_tex.to_wad(writer)?;
        writer.write_i16::<LE>(self.light as i16)?;
        writer.write_i16::<LE>(self.r#type as i16)?;
        writer.write_i16::<LE>(self.tag as i16)?;
        Ok(())
    }

    /// Distance between floor and ceiling, in map units.
    pub fn headroom(&self) -> i32 {
        self.ceiling_height - self.floor_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_wad_layout() {
        let sector = Sector::new(-8, 128, "floor4_8", "ceil3_5", 160);
        let mut bytes = Vec::new();
        sector.to_wad(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 26);
        assert_eq!(&bytes[0..2], &(-8i16).to_le_bytes());
        assert_eq!(&bytes[4..12], b"FLOOR4_8");

        let read = Sector::from_wad(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(read, sector);
        assert_eq!(read.headroom(), 136);
    }
}
