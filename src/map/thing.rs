// src/map/thing.rs
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{self, Read, Write};

/// Thing type of the player 1 start.
pub const PLAYER1_START: i32 = 1;

/// A placed object (10 bytes on disk). `angle` is in degrees, counter-clockwise from east.
#[derive(Debug, Clone, PartialEq)]
pub struct Thing {
    pub raw_x: i32,
    pub raw_y: i32,
    pub angle: i32,
    pub thing_type: i32,
    pub options: i32,
}

impl Thing {
    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Thing {
            raw_x: reader.read_i16::<LE>()? as i32,
            raw_y: reader.read_i16::<LE>()? as i32,
            angle: reader.read_i16::<LE>()? as i32,
            thing_type: reader.read_i16::<LE>()? as i32,
            options: reader.read_i16::<LE>()? as i32,
        })
    }

    pub fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for value in [self.raw_x, self.raw_y, self.angle, self.thing_type, self.options] {
            writer.write_i16::<LE>(value as i16)?;
        }
        Ok(())
    }
}
