// src/map/linedef.rs
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{self, Read, Write};

use crate::map::NO_SIDE;

/// Linedef flag: the line has a usable back side.
pub const FLAG_TWO_SIDED: i32 = 0x0004;

/// A wall between two vertices (14 bytes on disk).
///
/// `right` is the front sidedef and is required; `left` is the back sidedef or
/// [`NO_SIDE`].
#[derive(Debug, Clone, PartialEq)]
pub struct LineDef {
    pub start: usize,
    pub end: usize,
    pub flags: i32,
    pub line_type: i32,
    pub tag: i32,
    pub right: i32,
    pub left: i32,
}

impl LineDef {
    pub fn new(start: usize, end: usize, right: i32, left: i32) -> Self {
        LineDef {
            start,
            end,
            flags: if left == NO_SIDE { 0 } else { FLAG_TWO_SIDED },
            line_type: 0,
            tag: 0,
            right,
            left,
        }
    }

    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(LineDef {
            start: reader.read_u16::<LE>()? as usize,
            end: reader.read_u16::<LE>()? as usize,
            flags: reader.read_i16::<LE>()? as i32,
            line_type: reader.read_i16::<LE>()? as i32,
            tag: reader.read_i16::<LE>()? as i32,
            right: reader.read_i16::<LE>()? as i32,
            left: reader.read_i16::<LE>()? as i32,
        })
    }

    pub fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LE>(self.start as u16)?;
        writer.write_u16::<LE>(self.end as u16)?;
        writer.write_i16::<LE>(self.flags as i16)?;
        writer.write_i16::<LE>(self.line_type as i16)?;
        writer.write_i16::<LE>(self.tag as i16)?;
        writer.write_i16::<LE>(self.right as i16)?;
        writer.write_i16::<LE>(self.left as i16)?;
        Ok(())
    }

    pub fn has_back(&self) -> bool {
        self.left != NO_SIDE
    }
}
