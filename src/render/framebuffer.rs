// src/render/framebuffer.rs

use std::ops::Mul;
use std::path::Path;

use image::{ImageBuffer, ImageResult, Rgb, RgbImage};

/// An opaque 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::new(0, 0, 0);
    pub const WHITE: Pixel = Pixel::new(255, 255, 255);
    pub const GREY: Pixel = Pixel::new(96, 96, 96);
    pub const RED: Pixel = Pixel::new(220, 40, 40);
    pub const GREEN: Pixel = Pixel::new(40, 200, 80);
    pub const YELLOW: Pixel = Pixel::new(240, 200, 20);
    /// Flat colour for floors and ceilings with no texture.
    pub const MAGENTA: Pixel = Pixel::new(255, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Pixel { r, g, b }
    }
}

impl Mul<f32> for Pixel {
    type Output = Pixel;

    /// Scales brightness, saturating at white.
    fn mul(self, s: f32) -> Pixel {
        let scale = |c: u8| (c as f32 * s).clamp(0.0, 255.0) as u8;
        Pixel::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Row-major pixel buffer the renderer draws into.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        FrameBuffer {
            width,
            height,
            pixels: vec![Pixel::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, Pixel::BLACK);
    }

    pub fn clear(&mut self, colour: Pixel) {
        self.pixels.fill(colour);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Pixel> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Writes one pixel; out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i32, y: i32, colour: Pixel) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = colour;
        }
    }

    /// Mutable view of row `y`.
    pub fn row_mut(&mut self, y: usize) -> &mut [Pixel] {
        let start = y * self.width;
        &mut self.pixels[start..start + self.width]
    }

    /// Bresenham line between two points, inclusive, clipped per pixel.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, colour: Pixel) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.set(x, y, colour);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Fills rows `y1..y2` of column `x`.
    pub fn draw_column(&mut self, x: i32, y1: i32, y2: i32, colour: Pixel) {
        for y in y1.max(0)..y2.min(self.height as i32) {
            self.set(x, y, colour);
        }
    }

    /// Fills columns `x1..x2` of row `y`.
    pub fn draw_span(&mut self, y: i32, x1: i32, x2: i32, colour: Pixel) {
        if y < 0 || y as usize >= self.height {
            return;
        }
        let x1 = x1.clamp(0, self.width as i32) as usize;
        let x2 = x2.clamp(0, self.width as i32) as usize;
        if x1 < x2 {
            self.row_mut(y as usize)[x1..x2].fill(colour);
        }
    }

    pub fn to_image(&self) -> RgbImage {
        ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
            let p = self.pixels[y as usize * self.width + x as usize];
            Rgb([p.r, p.g, p.b])
        })
    }

    /// Writes the buffer as an image; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        self.to_image().save(path)
    }
}
