// src/document/wad.rs

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use log::{debug, info, warn};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::str;

use crate::error::MapError;
use crate::map::{LineDef, Sector, SideDef, SourceLevel, Thing, Vertex};

const HEADER_SIZE: usize = 12;
const FILELUMP_SIZE: usize = 16; // 4 bytes (filepos) + 4 bytes (size) + 8 bytes (name)

/// A single lump entry from the WAD directory.
#[derive(Debug, Clone, PartialEq)]
pub struct LumpEntry {
    pub offset: u32,
    pub size: u32,
    pub name: String,
}

/// A level marker and the lumps that follow it.
#[derive(Debug, Clone)]
pub struct LevelInfo {
    pub name: String,
    pub lump_indices: Vec<usize>,
}

/// An in-memory WAD file: raw bytes, lump directory and level grouping.
#[derive(Debug, Default)]
pub struct WadDocument {
    data: Vec<u8>,
    directory: Vec<LumpEntry>,
    levels: Vec<LevelInfo>,
}

impl WadDocument {
    /// Reads a whole IWAD or PWAD. Lumps pointing outside the file are skipped.
    pub fn load<R: Read + Seek>(reader: &mut R) -> Result<Self, MapError> {
        reader.seek(SeekFrom::Start(0))?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let total_size = data.len() as u64;

        let mut cursor = Cursor::new(&data);

        // --- Header ---
        let mut header_buf = [0u8; HEADER_SIZE];
        cursor.read_exact(&mut header_buf)?;
        let ident = &header_buf[0..4];
        if ident != b"IWAD" && ident != b"PWAD" {
            return Err(MapError::InvalidMagic {
                expected: "IWAD or PWAD".to_string(),
                found: String::from_utf8_lossy(ident).into_owned(),
            });
        }
        let num_lumps = (&header_buf[4..8]).read_u32::<LE>()? as usize;
        let infotableofs = (&header_buf[8..12]).read_u32::<LE>()? as u64;
        let dir_size = (num_lumps * FILELUMP_SIZE) as u64;
        if infotableofs + dir_size > total_size {
            return Err(MapError::BadIndex {
                table: "directory",
                index: infotableofs as u32,
            });
        }

        // --- Directory ---
        cursor.seek(SeekFrom::Start(infotableofs))?;
        let mut directory = Vec::with_capacity(num_lumps);
        for _ in 0..num_lumps {
            let offset = cursor.read_u32::<LE>()?;
            let size = cursor.read_u32::<LE>()?;
            let mut name_bytes = [0u8; 8];
            cursor.read_exact(&mut name_bytes)?;
            let name = str::from_utf8(&name_bytes)
                .unwrap_or("")
                .trim_end_matches('\0')
                .trim_end()
                .to_uppercase();

            if offset as u64 + size as u64 > total_size {
                warn!(
                    "Lump '{}' has invalid offset/size ({}+{} > {}), skipping",
                    name, offset, size, total_size
                );
                continue;
            }
            directory.push(LumpEntry { offset, size, name });
        }

        let levels = Self::group_levels(&directory);
        info!(
            "Loaded WAD: {} lumps, {} levels",
            directory.len(),
            levels.len()
        );

        Ok(WadDocument {
            data,
            directory,
            levels,
        })
    }

    /// Groups lumps from the directory into levels based on markers (e.g. "MAP01" or "E1M1").
    fn group_levels(directory: &[LumpEntry]) -> Vec<LevelInfo> {
        let mut levels = Vec::new();
        let mut current_level: Option<LevelInfo> = None;
        for (i, entry) in directory.iter().enumerate() {
            if is_level_marker(&entry.name) {
                if let Some(level) = current_level.take() {
                    levels.push(level);
                }
                current_level = Some(LevelInfo {
                    name: entry.name.clone(),
                    lump_indices: Vec::new(),
                });
            } else if let Some(level) = current_level.as_mut() {
                level.lump_indices.push(i);
            }
        }
        levels.extend(current_level);
        levels
    }

    pub fn directory(&self) -> &[LumpEntry] {
        &self.directory
    }

    pub fn level_names(&self) -> Vec<String> {
        self.levels.iter().map(|level| level.name.clone()).collect()
    }

    pub fn lump(&self, entry: &LumpEntry) -> &[u8] {
        let start = entry.offset as usize;
        &self.data[start..start + entry.size as usize]
    }

    /// Parses the record lumps of level `name` (case-insensitive).
    pub fn load_level(&self, name: &str) -> Result<SourceLevel, MapError> {
        let info = self
            .levels
            .iter()
            .find(|level| level.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| MapError::LevelNotFound(name.to_string()))?;

        let mut level = SourceLevel::new();
        for &index in &info.lump_indices {
            let entry = &self.directory[index];
            let bytes = self.lump(entry);
            match entry.name.as_str() {
                "THINGS" => level.things = read_records(bytes, 10, Thing::from_wad)?,
                "VERTEXES" => level.vertices = read_records(bytes, 4, Vertex::from_wad)?,
                "LINEDEFS" => level.linedefs = read_records(bytes, 14, LineDef::from_wad)?,
                "SIDEDEFS" => level.sidedefs = read_records(bytes, 30, SideDef::from_wad)?,
                "SECTORS" => level.sectors = read_records(bytes, 26, Sector::from_wad)?,
                _ => {}
            }
        }

        debug!(
            "Level {}: {} vertices, {} linedefs, {} sidedefs, {} sectors, {} things",
            info.name,
            level.vertices.len(),
            level.linedefs.len(),
            level.sidedefs.len(),
            level.sectors.len(),
            level.things.len()
        );
        Ok(level)
    }
}

/// Returns true if the lump name is a level marker (`ExMy` or `MAPxx`).
pub fn is_level_marker(name: &str) -> bool {
    let upper = name.trim().to_uppercase();
    let bytes = upper.as_bytes();
    if upper.starts_with("MAP") && upper.len() == 5 {
        bytes[3..5].iter().all(u8::is_ascii_digit)
    } else if upper.len() == 4 && bytes[0] == b'E' && bytes[2] == b'M' {
        bytes[1].is_ascii_digit() && bytes[3].is_ascii_digit()
    } else {
        false
    }
}

fn read_records<'a, T>(
    bytes: &'a [u8],
    record_size: usize,
    read: impl Fn(&mut Cursor<&'a [u8]>) -> std::io::Result<T>,
) -> Result<Vec<T>, MapError> {
    let count = bytes.len() / record_size;
    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(read(&mut cursor)?);
    }
    Ok(records)
}

/// Writes a PWAD holding `levels`, each as a marker followed by its five record lumps.
pub fn write_wad<W: Write>(writer: &mut W, levels: &[(&str, &SourceLevel)]) -> Result<(), MapError> {
    let mut lumps: Vec<(String, Vec<u8>)> = Vec::new();
    for (name, level) in levels {
        lumps.push((name.to_uppercase(), Vec::new()));
        for (lump_name, bytes) in level.to_lumps()? {
            lumps.push((lump_name.to_string(), bytes));
        }
    }

    let data_size: usize = lumps.iter().map(|(_, bytes)| bytes.len()).sum();
    writer.write_all(b"PWAD")?;
    writer.write_u32::<LE>(lumps.len() as u32)?;
    writer.write_u32::<LE>((HEADER_SIZE + data_size) as u32)?;

    for (_, bytes) in &lumps {
        writer.write_all(bytes)?;
    }

    let mut offset = HEADER_SIZE as u32;
    for (name, bytes) in &lumps {
        writer.write_u32::<LE>(offset)?;
        writer.write_u32::<LE>(bytes.len() as u32)?;
        let mut name_buf = [0u8; 8];
        for (slot, byte) in name_buf.iter_mut().zip(name.bytes()) {
            *slot = byte;
        }
        writer.write_all(&name_buf)?;
        offset += bytes.len() as u32;
    }
    Ok(())
}
