// src/map/sidedef.rs

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{self, Read, Write};

use crate::map::TextureName;

/// One side of a linedef (30 bytes on disk).
///
/// ```text
/// offset  field       type
/// ------  ----------  -------
///  0-1    x_offset    i16
///  2-3    y_offset    i16
///  4-11   upper_tex   [u8; 8]
/// 12-19   lower_tex   [u8; 8]
/// 20-27   mid_tex     [u8; 8]
/// 28-29   sector      i16
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SideDef {
    pub x_offset: i32,
    pub y_offset: i32,
    /// Drawn above a lower neighbouring ceiling.
    pub upper_tex: TextureName,
    /// Drawn below a higher neighbouring floor.
    pub lower_tex: TextureName,
    /// The wall itself on one-sided lines.
    pub mid_tex: TextureName,
    /// Index of the sector this side faces.
    pub sector: i32,
}

impl SideDef {
    /// A one-sided wall with only a middle texture.
    pub fn solid(mid_tex: &str, sector: i32) -> Self {
        SideDef {
            x_offset: 0,
            y_offset: 0,
            upper_tex: TextureName::none(),
            lower_tex: TextureName::none(),
            mid_tex: TextureName::new(mid_tex),
            sector,
        }
    }

    /// A side of a two-sided line, textured on its upper and lower steps.
    pub fn portal(step_tex: &str, sector: i32) -> Self {
        SideDef {
            x_offset: 0,
            y_offset: 0,
            upper_tex: TextureName::new(step_tex),
            lower_tex: TextureName::new(step_tex),
            mid_tex: TextureName::none(),
            sector,
        }
    }

    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(SideDef {
            x_offset: reader.read_i16::<LE>()? as i32,
            y_offset: reader.read_i16::<LE>()? as i32,
            upper_tex: TextureName::from_wad(reader)?,
            lower_tex: TextureName::from_wad(reader)?,
            mid_tex: TextureName::from_wad(reader)?,
            sector: reader.read_i16::<LE>()? as i32,
        })
    }

    pub fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LE>(self.x_offset as i16)?;
        writer.write_i16::<LE>(self.y_offset as i16)?;
        self.upper_tex.to_wad(writer)?;
        self.lower_tex.to_wad(writer)?;
        self.mid_tex.to_wad(writer)?;
        writer.write_i16::<LE>(self.sector as i16)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_wad_layout() {
        let side = SideDef::solid("startan3", 2);
        let mut bytes = Vec::new();
        side.to_wad(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 30);
        assert_eq!(&bytes[20..28], b"STARTAN3");
        assert_eq!(&bytes[28..30], &[2, 0]);

        let read = SideDef::from_wad(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(read, side);
        assert!(read.upper_tex.is_none());
    }
}
