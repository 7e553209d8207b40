// src/render/texture.rs

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::error::TextureError;
use crate::render::framebuffer::Pixel;

/// A texture name packed into a `u64`: up to eight uppercase ASCII bytes, little-endian,
/// zero padded. `0` means "no texture".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl TextureId {
    pub const NONE: TextureId = TextureId(0);

    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name == "-" {
            return TextureId::NONE;
        }

        let mut bytes = [0u8; 8];
        for (slot, b) in bytes.iter_mut().zip(name.bytes()) {
            *slot = b.to_ascii_uppercase();
        }
        TextureId(u64::from_le_bytes(bytes))
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn name(self) -> String {
        self.0
            .to_le_bytes()
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("-")
        } else {
            f.write_str(&self.name())
        }
    }
}

/// A row-major RGB image.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl Texture {
    /// Returns `None` unless `pixels` holds exactly `width * height` entries and both
    /// dimensions are non-zero.
    pub fn new(width: usize, height: usize, pixels: Vec<Pixel>) -> Option<Self> {
        (width > 0 && height > 0 && pixels.len() == width * height).then_some(Texture {
            width,
            height,
            pixels,
        })
    }

    /// A `size` x `size` two-colour checkerboard with `cell`-pixel squares.
    pub fn checkerboard(size: usize, cell: usize, a: Pixel, b: Pixel) -> Self {
        let size = size.max(1);
        let cell = cell.max(1);
        let pixels = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (x / cell + y / cell) % 2 == 0 {
                    a
                } else {
                    b
                }
            })
            .collect();
        Texture {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Texel at integer coordinates, wrapping in both directions.
    pub fn sample(&self, u: i32, v: i32) -> Pixel {
        let x = u.rem_euclid(self.width as i32) as usize;
        let y = v.rem_euclid(self.height as i32) as usize;
        self.pixels[y * self.width + x]
    }
}

/// Texture lookup by id. Missing ids are reported once each.
#[derive(Debug, Default)]
pub struct TextureManager {
    textures: HashMap<TextureId, Texture>,
    reported_missing: Mutex<HashSet<TextureId>>,
}

impl TextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, texture: Texture) -> TextureId {
        let id = TextureId::from_name(name);
        self.textures.insert(id, texture);
        id
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// `None` for [`TextureId::NONE`] and for ids that were never loaded.
    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        if id.is_none() {
            return None;
        }

        let texture = self.textures.get(&id);
        if texture.is_none() && self.reported_missing.lock().insert(id) {
            warn!("Missing texture {}", id);
        }
        texture
    }

    /// Inserts a checkerboard for each id in `ids` that has no texture yet, tinted by
    /// the id so different names stay distinguishable. Returns how many were added.
    pub fn fill_missing(&mut self, ids: impl IntoIterator<Item = TextureId>) -> usize {
        let mut added = 0;
        for id in ids {
            if id.is_none() || self.contains(id) {
                continue;
            }
            let [r, g, b, ..] = (id.0.wrapping_mul(0x9e37_79b9_7f4a_7c15) >> 8).to_le_bytes();
            let tint = Pixel::new(r | 0x40, g | 0x40, b | 0x40);
            self.textures
                .insert(id, Texture::checkerboard(16, 4, tint, tint * 0.5));
            added += 1;
        }
        if added > 0 {
            debug!("Generated {} placeholder textures", added);
        }
        added
    }

    /// Loads every PNG, BMP and JPEG in `dir`, named by file stem. Files that fail to
    /// decode are skipped. Returns how many textures were added.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, TextureError> {
        let dir = dir.as_ref();
        let mut loaded = 0;

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "bmp" | "jpg" | "jpeg"))
                .unwrap_or(false);
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !supported {
                continue;
            }

            let image = match image::open(&path) {
                Ok(image) => image.to_rgb8(),
                Err(err) => {
                    warn!("Skipping texture {:?}: {}", path, err);
                    continue;
                }
            };
            let (width, height) = image.dimensions();
            let pixels = image
                .pixels()
                .map(|p| Pixel::new(p[0], p[1], p[2]))
                .collect();
            if let Some(texture) = Texture::new(width as usize, height as usize, pixels) {
                self.insert(stem, texture);
                loaded += 1;
            }
        }

        info!("Loaded {} textures from {:?}", loaded, dir);
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_id_packing() {
        let id = TextureId::from_name("startan3");
        assert_eq!(id, TextureId::from_name("STARTAN3"));
        assert_eq!(id.name(), "STARTAN3");
        assert_eq!(id.0 & 0xff, b'S' as u64);
        assert_eq!(TextureId::from_name("-"), TextureId::NONE);
        assert_eq!(TextureId::from_name(""), TextureId::NONE);
        assert_eq!(TextureId::from_name("LONGERTHAN8"), TextureId::from_name("LONGERTH"));
        assert_eq!(TextureId::NONE.to_string(), "-");
    }

    #[test]
    fn test_checkerboard_and_wrapping() {
        let tex = Texture::checkerboard(4, 2, Pixel::WHITE, Pixel::BLACK);
        assert_eq!(tex.sample(0, 0), Pixel::WHITE);
        assert_eq!(tex.sample(2, 0), Pixel::BLACK);
        assert_eq!(tex.sample(2, 2), Pixel::WHITE);
        assert_eq!(tex.sample(-1, 0), tex.sample(3, 0));
        assert_eq!(tex.sample(4, 5), tex.sample(0, 1));
    }

    #[test]
    fn test_texture_rejects_bad_sizes() {
        assert!(Texture::new(2, 2, vec![Pixel::BLACK; 3]).is_none());
        assert!(Texture::new(0, 0, Vec::new()).is_none());
    }

    #[test]
    fn test_manager_lookup() {
        let mut manager = TextureManager::new();
        let id = manager.insert("FLAT1", Texture::checkerboard(8, 4, Pixel::RED, Pixel::GREEN));
        assert!(manager.get(id).is_some());
        assert!(manager.get(TextureId::NONE).is_none());
        assert!(manager.get(TextureId::from_name("NOPE")).is_none());
        assert!(manager.get(TextureId::from_name("NOPE")).is_none());
        assert_eq!(manager.reported_missing.lock().len(), 1);
    }

    #[test]
    fn test_fill_missing_placeholders() {
        let mut manager = TextureManager::new();
        let wall = manager.insert("WALL", Texture::checkerboard(2, 1, Pixel::RED, Pixel::RED));
        let ids = [wall, TextureId::NONE, TextureId::from_name("FLAT1"), TextureId::from_name("FLAT1")];
        assert_eq!(manager.fill_missing(ids), 1);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.get(wall).unwrap().sample(0, 0), Pixel::RED);
        assert_eq!(manager.get(TextureId::from_name("FLAT1")).unwrap().width(), 16);
        assert!(!manager.contains(TextureId::NONE));
    }

    #[test]
    fn test_load_dir() {
        let dir = std::env::temp_dir().join(format!("rust_fist_textures_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let img = image::RgbImage::from_pixel(4, 2, image::Rgb([10, 20, 30]));
        img.save(dir.join("wall1.png")).unwrap();
        fs::write(dir.join("notes.txt"), "not a texture").unwrap();

        let mut manager = TextureManager::new();
        assert_eq!(manager.load_dir(&dir).unwrap(), 1);
        let tex = manager.get(TextureId::from_name("WALL1")).unwrap();
        assert_eq!((tex.width(), tex.height()), (4, 2));
        assert_eq!(tex.sample(1, 1), Pixel::new(10, 20, 30));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_dir_skips_undecodable_files() {
        let dir = std::env::temp_dir().join(format!("rust_fist_bad_textures_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["a", "b", "c", "d"] {
            image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]))
                .save(dir.join(format!("{}.png", name)))
                .unwrap();
        }
        fs::write(dir.join("broken.png"), b"definitely not a png").unwrap();

        let mut manager = TextureManager::new();
        assert_eq!(manager.load_dir(&dir).unwrap(), 4);
        for name in ["A", "B", "C", "D"] {
            assert!(manager.contains(TextureId::from_name(name)));
        }
        assert!(!manager.contains(TextureId::from_name("BROKEN")));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let mut manager = TextureManager::new();
        let missing = std::env::temp_dir().join("rust_fist_no_such_texture_dir");
        assert!(manager.load_dir(missing).is_err());
    }
}
