// src/map/texture_name.rs

use std::fmt;
use std::io::{self, Read, Write};

/// An up-to-8-character texture or flat name as stored in a WAD.
///
/// Names are uppercased and stripped of trailing NUL padding on read, and NUL padded
/// on write. `-` and the empty name mean "no texture".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TextureName(String);

impl TextureName {
    pub const LEN: usize = 8;

    pub fn new(name: &str) -> Self {
        TextureName(name.chars().take(Self::LEN).collect::<String>().to_uppercase())
    }

    pub fn none() -> Self {
        TextureName("-".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty() || self.0 == "-"
    }

    pub fn from_wad<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::LEN];
        reader.read_exact(&mut buf)?;

        let end = buf.iter().position(|&c| c == 0).unwrap_or(Self::LEN);
        let raw: String = buf[..end].iter().map(|&c| c as char).collect();
        Ok(TextureName(raw.trim_end().to_uppercase()))
    }

    pub fn to_wad<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0u8; Self::LEN];
        for (slot, byte) in buf.iter_mut().zip(self.0.bytes()) {
            *slot = byte;
        }
        writer.write_all(&buf)
    }
}

impl From<&str> for TextureName {
    fn from(name: &str) -> Self {
        TextureName::new(name)
    }
}

impl fmt::Display for TextureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_trims_padding() {
        let mut cursor = Cursor::new(b"flat5\0\0\0".to_vec());
        let name = TextureName::from_wad(&mut cursor).unwrap();
        assert_eq!(name.as_str(), "FLAT5");
        assert!(!name.is_none());
    }

    #[test]
    fn test_write_pads_and_truncates() {
        let mut out = Vec::new();
        TextureName::new("startan3x").to_wad(&mut out).unwrap();
        assert_eq!(&out, b"STARTAN3");

        out.clear();
        TextureName::new("-").to_wad(&mut out).unwrap();
        assert_eq!(&out, b"-\0\0\0\0\0\0\0");
    }

    #[test]
    fn test_none_names() {
        assert!(TextureName::none().is_none());
        assert!(TextureName::default().is_none());
    }
}
