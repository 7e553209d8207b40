// src/render/mod.rs
//! Front-to-back sector renderer.
//!
//! Walls are drawn column by column while the BSP is walked near to far. A
//! [`SolidSpans`] list rejects columns already covered by a nearer solid wall, and the
//! per-column ceiling/floor clips keep two-sided walls behind their openings. Floors
//! and ceilings are only recorded into visplanes during the walk and filled row by
//! row once every wall is down.

pub mod framebuffer;
pub mod solid;
pub mod texture;
pub mod visplane;

use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;

use crate::compiled::{Child, CompiledMap, LineSeg, Node};
use crate::config::{Config, RenderSettings};
use crate::utils::util::clamp;
use crate::utils::{Transform2D, Vec2};
use crate::viewer::ThingPos;

pub use framebuffer::{FrameBuffer, Pixel};
pub use solid::{SolidSpans, Span};
pub use texture::{Texture, TextureId, TextureManager};
pub use visplane::{PlaneKey, VisPlane, VisPlanePool};

/// Segments narrower than this on screen are skipped.
const MIN_SCREEN_WIDTH: f32 = 1.0e-4;

/// Counters for the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub subsectors: usize,
    /// Segments with at least one visible column.
    pub segs: usize,
    /// Wall column pieces written.
    pub columns: usize,
    /// Visplanes filled.
    pub planes: usize,
}

/// Everything one frame reads, plus the target.
struct Frame<'a> {
    viewer: &'a ThingPos,
    map: &'a CompiledMap,
    textures: &'a TextureManager,
    fb: &'a mut FrameBuffer,
}

/// A projected segment endpoint.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    inv_depth: f32,
    u_over_depth: f32,
}

/// What a wall column needs besides its rows.
#[derive(Debug, Clone, Copy)]
struct ColumnSample {
    x: i32,
    dist: f32,
    u: f32,
    fade_offset: f32,
    light: f32,
}

/// Texture coordinate stepped in whole and fractional parts kept apart, so long spans
/// accumulate no rounding drift.
#[derive(Debug, Clone, Copy)]
struct TexelStepper {
    whole: i32,
    frac: f32,
    step_whole: i32,
    step_frac: f32,
}

impl TexelStepper {
    fn new(start: f32, step: f32) -> Self {
        let start_whole = start.floor();
        let step_whole = step.floor();
        TexelStepper {
            whole: start_whole as i32,
            frac: start - start_whole,
            step_whole: step_whole as i32,
            step_frac: step - step_whole,
        }
    }

    fn texel(&self) -> i32 {
        self.whole
    }

    fn advance(&mut self) {
        self.whole = self.whole.wrapping_add(self.step_whole);
        self.frac += self.step_frac;
        if self.frac >= 1.0 {
            self.frac -= 1.0;
            self.whole = self.whole.wrapping_add(1);
        }
    }
}

/// Texture u at both ends of a wall, shifted by a whole number so the smaller end sits
/// in `[0, 1)`.
fn wall_u(u_start: f32, u_end: f32) -> (f32, f32) {
    let base = u_start.min(u_end).trunc();
    let (mut start, mut end) = (u_start - base, u_end - base);
    if start.min(end) < 0.0 {
        start += 1.0;
        end += 1.0;
    }
    (start, end)
}

/// First pixel row whose centre lies at or below screen row `y`.
fn pixel_row(y: f32) -> i32 {
    (y - 0.5).ceil() as i32
}

pub struct Render3D {
    config: Arc<RwLock<Config>>,
    config_dirty: bool,
    settings: RenderSettings,
    view_distance: f32,

    width: usize,
    height: usize,
    aspect: f32,

    /// First open row per column.
    ceiling_clip: Vec<i32>,
    /// One past the last open row per column.
    floor_clip: Vec<i32>,
    solid: SolidSpans,
    visplanes: VisPlanePool,
    visible: Vec<Span>,

    world_to_view: Transform2D,
    ceiling_plane: Option<usize>,
    floor_plane: Option<usize>,
    stats: FrameStats,
}

impl Render3D {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        let settings = RenderSettings::default();
        Render3D {
            config,
            config_dirty: true,
            view_distance: settings.view_distance(),
            settings,
            width: 0,
            height: 0,
            aspect: 1.0,
            ceiling_clip: Vec::new(),
            floor_clip: Vec::new(),
            solid: SolidSpans::new(0),
            visplanes: VisPlanePool::new(0),
            visible: Vec::new(),
            world_to_view: Transform2D::default(),
            ceiling_plane: None,
            floor_plane: None,
            stats: FrameStats::default(),
        }
    }

    /// Settings are re-read from the shared config before the next frame.
    pub fn reload_config(&mut self) {
        self.config_dirty = true;
    }

    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn view_distance(&self) -> f32 {
        self.view_distance
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn solid_spans(&self) -> &SolidSpans {
        &self.solid
    }

    pub fn visplanes(&self) -> &VisPlanePool {
        &self.visplanes
    }

    fn apply_config(&mut self) {
        self.settings = RenderSettings::from_config(&mut self.config.write());
        self.view_distance = self.settings.view_distance();
        self.config_dirty = false;
        info!(
            "Render settings: fov {} deg, fade distance {}, {} texels/unit, near clip {}",
            self.settings.fov_y,
            self.settings.max_fade_dist,
            self.settings.tex_scale,
            self.settings.near_clip
        );
    }

    fn resize(&mut self, width: usize, height: usize) {
        debug!("Render target resized to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.aspect = width as f32 / height.max(1) as f32;
        self.ceiling_clip = vec![0; width];
        self.floor_clip = vec![height as i32; width];
        self.solid.reset(width);
        self.visplanes.resize(width);
    }

    fn begin_frame(&mut self, viewer: &ThingPos) {
        self.stats = FrameStats::default();
        self.ceiling_clip.fill(0);
        self.floor_clip.fill(self.height as i32);
        self.solid.reset(self.width);
        self.visplanes.clear();
        self.world_to_view = viewer.transform().inverse();
        self.ceiling_plane = None;
        self.floor_plane = None;
    }

    /// Draws one frame of `map` seen from `viewer` into `fb`.
    ///
    /// Pixels no wall or plane covers are left untouched.
    pub fn draw_3d(
        &mut self,
        viewer: &ThingPos,
        map: &CompiledMap,
        textures: &TextureManager,
        fb: &mut FrameBuffer,
    ) {
        if self.config_dirty {
            self.apply_config();
        }
        if fb.width() != self.width || fb.height() != self.height {
            self.resize(fb.width(), fb.height());
        }
        if self.width == 0 || self.height == 0 {
            return;
        }

        self.begin_frame(viewer);
        let mut frame = Frame {
            viewer,
            map,
            textures,
            fb,
        };
        self.draw_node(&mut frame, map.root);
        for index in 0..self.visplanes.len() {
            self.draw_plane(&mut frame, index);
        }
    }

    fn draw_node(&mut self, frame: &mut Frame, child: Child) {
        match child {
            Child::None => {}
            Child::SubSector(index) => self.draw_subsector(frame, index as usize),
            Child::Node(index) => {
                let node = frame.map.nodes[index as usize];
                let near = node.side(frame.viewer.p);
                self.draw_node(frame, node.children[near]);
                if !self.cull_node(frame.viewer, &node, 1 - near) {
                    self.draw_node(frame, node.children[1 - near]);
                }
            }
        }
    }

    /// Whether the far child of `node` can be skipped. Nothing is culled.
    fn cull_node(&self, _viewer: &ThingPos, _node: &Node, _child: usize) -> bool {
        false
    }

    fn draw_subsector(&mut self, frame: &mut Frame, index: usize) {
        let map = frame.map;
        let subsector = &map.subsectors[index];
        let sector = &map.sectors[subsector.sector as usize];
        let eye = frame.viewer.h;

        self.ceiling_plane = if sector.ceiling_height > eye {
            Some(self.visplanes.find(PlaneKey {
                texture: sector.ceiling_texture,
                height: sector.ceiling_height,
                light: sector.light,
            }))
        } else {
            None
        };
        self.floor_plane = if sector.floor_height < eye {
            Some(self.visplanes.find(PlaneKey {
                texture: sector.floor_texture,
                height: sector.floor_height,
                light: sector.light,
            }))
        } else {
            None
        };

        for seg in map.subsector_segs(subsector) {
            self.draw_line(frame, seg);
        }
        self.stats.subsectors += 1;
    }

    fn project(&self, view: Vec2, u: f32) -> ScreenVertex {
        let inv_depth = 1.0 / view.y;
        let half_width = self.width as f32 * 0.5;
        ScreenVertex {
            x: half_width + (self.view_distance * view.x * inv_depth / self.aspect) * half_width,
            inv_depth,
            u_over_depth: u * inv_depth,
        }
    }

    fn draw_line(&mut self, frame: &mut Frame, seg: &LineSeg) {
        let map = frame.map;
        let textures = frame.textures;
        let eye = frame.viewer.h;
        let a = map.vertices[seg.from as usize];
        let b = map.vertices[seg.to as usize];
        let dir = b - a;

        // Walls face their right-hand side; anything seen from behind is skipped.
        if (a - frame.viewer.p).dot(dir.perp()) >= 0.0 {
            return;
        }

        let along = dir.normalize();
        let (mut u_a, mut u_b) = wall_u(along.dot(a), along.dot(b));

        let near = self.settings.near_clip;
        let mut view_a = self.world_to_view.apply(a);
        let mut view_b = self.world_to_view.apply(b);
        if view_a.y < near && view_b.y < near {
            return;
        }
        if view_a.y < near {
            let t = (near - view_a.y) / (view_b.y - view_a.y);
            view_a = view_a + (view_b - view_a) * t;
            u_a += (u_b - u_a) * t;
        } else if view_b.y < near {
            let t = (near - view_b.y) / (view_a.y - view_b.y);
            view_b = view_b + (view_a - view_b) * t;
            u_b += (u_a - u_b) * t;
        }

        let mut left = self.project(view_a, u_a);
        let mut right = self.project(view_b, u_b);
        if right.x < left.x {
            std::mem::swap(&mut left, &mut right);
        }
        let screen_width = right.x - left.x;
        if !(screen_width > MIN_SCREEN_WIDTH) {
            return;
        }

        let first = ((left.x + 0.5).floor() as i32).max(0);
        let last = ((right.x + 0.5).floor() as i32).min(self.width as i32) - 1;
        if first > last {
            return;
        }

        let mut ranges = std::mem::take(&mut self.visible);
        self.solid.visible_ranges(first, last, &mut ranges);
        if ranges.is_empty() {
            self.visible = ranges;
            return;
        }

        let linedef = &map.linedefs[seg.linedef as usize];
        let sidedef = &map.sidedefs[linedef.sides[seg.side as usize] as usize];
        let (front, back) = map.seg_sectors(seg);

        let solid = back.map_or(true, |back| {
            back.ceiling_height <= front.floor_height || back.floor_height >= front.ceiling_height
        });
        let mark_ceiling = back.map_or(true, |back| {
            solid
                || back.ceiling_height != front.ceiling_height
                || back.ceiling_texture != front.ceiling_texture
                || back.light != front.light
        });
        let mark_floor = back.map_or(true, |back| {
            solid
                || back.floor_height != front.floor_height
                || back.floor_texture != front.floor_texture
                || back.light != front.light
        });
        let upper = back
            .filter(|back| back.ceiling_height < front.ceiling_height)
            .map(|back| back.ceiling_height.max(front.floor_height));
        let lower = back
            .filter(|back| back.floor_height > front.floor_height)
            .map(|back| back.floor_height.min(front.ceiling_height));

        let mid_texture = if back.is_none() {
            textures.get(sidedef.mid)
        } else {
            None
        };
        let upper_texture = upper.and_then(|_| textures.get(sidedef.upper));
        let lower_texture = lower.and_then(|_| textures.get(sidedef.lower));

        let fade_offset = if a.x == b.x {
            20.0
        } else if a.y == b.y {
            10.0
        } else {
            0.0
        };

        if mark_ceiling {
            if let Some(plane) = self.ceiling_plane {
                self.ceiling_plane = Some(self.visplanes.check(plane, first, last));
            }
        }
        if mark_floor {
            if let Some(plane) = self.floor_plane {
                self.floor_plane = Some(self.visplanes.check(plane, first, last));
            }
        }

        self.stats.segs += 1;
        let half_height = self.height as f32 * 0.5;
        for range in &ranges {
            for x in range.first..=range.last {
                let column = x as usize;
                let (top, bottom) = (self.ceiling_clip[column], self.floor_clip[column]);
                if top >= bottom {
                    continue;
                }

                let t = (x as f32 + 0.5 - left.x) / screen_width;
                let inv_depth = left.inv_depth + (right.inv_depth - left.inv_depth) * t;
                let u_over_depth = left.u_over_depth + (right.u_over_depth - left.u_over_depth) * t;
                let dist = 1.0 / inv_depth;
                let scale = self.view_distance * inv_depth * half_height;
                let row = |height: f32| half_height - (height - eye) * scale;

                let ceiling_row = row(front.ceiling_height);
                let floor_row = row(front.floor_height);
                let ceiling_y = pixel_row(ceiling_row);
                let floor_y = pixel_row(floor_row);

                if mark_ceiling {
                    if let Some(plane) = self.ceiling_plane {
                        self.visplanes.mark(plane, x, top, ceiling_y.min(bottom) - 1);
                    }
                }
                if mark_floor {
                    if let Some(plane) = self.floor_plane {
                        self.visplanes.mark(plane, x, floor_y.max(top), bottom - 1);
                    }
                }

                let sample = ColumnSample {
                    x,
                    dist,
                    u: u_over_depth * dist,
                    fade_offset,
                    light: front.light,
                };

                if back.is_none() {
                    self.draw_column(frame.fb, &sample, ceiling_row, ceiling_y, floor_y, mid_texture);
                    self.ceiling_clip[column] = bottom;
                    continue;
                }

                let mut new_top = top;
                let mut new_bottom = bottom;
                if let Some(height) = upper {
                    let y = pixel_row(row(height));
                    self.draw_column(frame.fb, &sample, ceiling_row, ceiling_y, y, upper_texture);
                    new_top = y.clamp(top, bottom);
                } else if mark_ceiling {
                    new_top = ceiling_y.clamp(top, bottom);
                }
                if let Some(height) = lower {
                    let lower_row = row(height);
                    let y = pixel_row(lower_row);
                    self.draw_column(frame.fb, &sample, lower_row, y, floor_y, lower_texture);
                    new_bottom = y.clamp(top, bottom);
                } else if mark_floor {
                    new_bottom = floor_y.clamp(top, bottom);
                }

                if solid {
                    self.ceiling_clip[column] = bottom;
                } else {
                    self.ceiling_clip[column] = new_top;
                    self.floor_clip[column] = new_bottom;
                }
            }
        }

        if solid {
            self.solid.mark_solid(first, last);
        }
        self.visible = ranges;
    }

    /// Draws rows `y1..y2` of one wall column, clipped to the column's open rows.
    /// `origin_row` is the screen row where texture v is zero.
    fn draw_column(
        &mut self,
        fb: &mut FrameBuffer,
        sample: &ColumnSample,
        origin_row: f32,
        y1: i32,
        y2: i32,
        texture: Option<&Texture>,
    ) {
        let column = sample.x as usize;
        let y1 = y1.max(self.ceiling_clip[column]);
        let y2 = y2.min(self.floor_clip[column]);
        if y1 >= y2 {
            return;
        }
        self.stats.columns += 1;

        let settings = &self.settings;
        match texture {
            Some(texture) => {
                let fade = sample.fade_offset / 255.0
                    + clamp(1.0 - sample.dist / settings.max_fade_dist, 0.0, 0.8) * sample.light;
                let dv = 2.0 * sample.dist / (self.view_distance * self.height as f32) * settings.tex_scale;
                let texel_u = (sample.u * settings.tex_scale).floor() as i32;
                let mut v = (y1 as f32 + 0.5 - origin_row) * dv;
                for y in y1..y2 {
                    fb.set(sample.x, y, texture.sample(texel_u, v.floor() as i32) * fade);
                    v += dv;
                }
            }
            None => {
                let range = (settings.max_fade_dist - self.view_distance).max(f32::EPSILON);
                let nearness = 1.0 - clamp((sample.dist - self.view_distance) / range, 0.0, 1.0);
                let shade = (sample.fade_offset + 235.0 * nearness) as u8;
                fb.draw_column(sample.x, y1, y2, Pixel::new(shade, 0, shade));
            }
        }
    }

    /// Fills one visplane row by row, back-projecting each row to its floor distance.
    fn draw_plane(&mut self, frame: &mut Frame, index: usize) {
        let plane = self.visplanes.get(index);
        if plane.is_empty() {
            return;
        }
        self.stats.planes += 1;

        let viewer = frame.viewer;
        let texture = frame.textures.get(plane.key.texture);
        let (sin_f, cos_f) = viewer.f.sin_cos();
        let forward = Vec2::new(cos_f, sin_f);
        let right = Vec2::new(sin_f, -cos_f);
        let height = plane.key.height - viewer.h;
        let (width, screen_height) = (self.width as f32, self.height as f32);
        let view_distance = self.view_distance;
        let tex_scale = self.settings.tex_scale;

        for y in plane.min_y..=plane.max_y {
            let norm_y = (screen_height - 2.0 * y as f32 - 1.0) / screen_height;
            let dist = view_distance * height / norm_y;
            if !(dist > 0.0) || !dist.is_finite() {
                continue;
            }

            let pixel_scale = 2.0 * dist / (view_distance * screen_height);
            let centre = viewer.p + forward * dist;
            let step = right * pixel_scale;
            let fade = clamp(1.0 - dist / self.settings.max_fade_dist, 0.0, 1.0) * plane.key.light;

            for (x1, x2) in plane.row_runs(y) {
                let Some(texture) = texture else {
                    frame.fb.draw_span(y, x1, x2, Pixel::MAGENTA);
                    continue;
                };
                let start = centre + right * (pixel_scale * (x1 as f32 + 0.5 - width * 0.5));
                let mut u = TexelStepper::new(start.x * tex_scale, step.x * tex_scale);
                let mut v = TexelStepper::new(start.y * tex_scale, step.y * tex_scale);
                let row = frame.fb.row_mut(y as usize);
                for pixel in &mut row[x1 as usize..x2 as usize] {
                    *pixel = texture.sample(u.texel(), v.texel()) * fade;
                    u.advance();
                    v.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::bsp_procedural::demo_level;
    use crate::bsp::{cook, SplitScoreWeights};
    use crate::compiled::{LineDef, Sector, SideDef, SubSector, NO_SIDE};
    use assert_approx_eq::assert_approx_eq;
    use std::f32::consts::FRAC_PI_2;

    const BACKGROUND: Pixel = Pixel::new(1, 2, 3);

    fn renderer() -> Render3D {
        Render3D::new(Arc::new(RwLock::new(Config::new("unused.json"))))
    }

    /// A closed 8x8 square room with a single sub-sector.
    fn square_room() -> CompiledMap {
        let corners = [(0.0, 0.0), (0.0, 8.0), (8.0, 8.0), (8.0, 0.0)];
        let mut map = CompiledMap {
            vertices: corners.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            sidedefs: vec![SideDef {
                mid: TextureId::from_name("WALL"),
                upper: TextureId::NONE,
                lower: TextureId::NONE,
                sector: 0,
            }],
            sectors: vec![Sector {
                floor_texture: TextureId::from_name("FLOOR"),
                ceiling_texture: TextureId::from_name("CEIL"),
                floor_height: 0.0,
                ceiling_height: 3.0,
                light: 1.0,
            }],
            subsectors: vec![SubSector {
                sector: 0,
                first_seg: 0,
                num_segs: 4,
            }],
            root: Child::SubSector(0),
            ..CompiledMap::default()
        };
        for i in 0..4u32 {
            map.linedefs.push(LineDef {
                from: i,
                to: (i + 1) % 4,
                flags: 0,
                sides: [0, NO_SIDE],
            });
            map.linesegs.push(LineSeg {
                linedef: i,
                from: i,
                to: (i + 1) % 4,
                side: 0,
            });
        }
        map
    }

    fn textures() -> TextureManager {
        let mut textures = TextureManager::new();
        for (name, colour) in [
            ("WALL", Pixel::RED),
            ("FLOOR", Pixel::GREEN),
            ("CEIL", Pixel::YELLOW),
        ] {
            textures.insert(name, Texture::checkerboard(8, 4, colour, Pixel::WHITE));
        }
        textures
    }

    #[test]
    fn test_texel_stepper_matches_floor() {
        let mut stepper = TexelStepper::new(-3.25, 0.3);
        for n in 0..200 {
            let exact = (-3.25f64 + 0.3f64 * n as f64).floor() as i32;
            assert!((stepper.texel() - exact).abs() <= 1, "step {}", n);
            stepper.advance();
        }
        let mut backwards = TexelStepper::new(2.0, -0.5);
        let seen: Vec<i32> = (0..6)
            .map(|_| {
                let t = backwards.texel();
                backwards.advance();
                t
            })
            .collect();
        assert_eq!(seen, vec![2, 1, 1, 0, 0, -1]);
    }

    #[test]
    fn test_wall_u_normalises() {
        let (a, b) = wall_u(12.25, 14.25);
        assert_approx_eq!(a, 0.25, 1e-5);
        assert_approx_eq!(b, 2.25, 1e-5);

        let (a, b) = wall_u(-3.5, -5.5);
        assert!(a.min(b) >= 0.0 && a.min(b) < 1.0);
        assert_approx_eq!(a - b, 2.0, 1e-5);
    }

    #[test]
    fn test_closed_room_fills_screen() {
        let map = square_room();
        let viewer = ThingPos::new(Vec2::new(4.0, 4.0), FRAC_PI_2, 1.5);
        let mut fb = FrameBuffer::new(64, 48);
        fb.clear(BACKGROUND);

        let mut render = renderer();
        render.draw_3d(&viewer, &map, &textures(), &mut fb);

        assert!(render.solid_spans().is_full());
        assert!(fb.pixels().iter().all(|&p| p != BACKGROUND));
        let stats = render.stats();
        assert_eq!(stats.subsectors, 1);
        assert!(stats.segs >= 1 && stats.segs <= 3);
        assert_eq!(stats.planes, 2);
    }

    #[test]
    fn test_untextured_fallback_colours() {
        let map = square_room();
        let viewer = ThingPos::new(Vec2::new(4.0, 4.0), 0.0, 1.5);
        let mut fb = FrameBuffer::new(32, 32);
        fb.clear(BACKGROUND);

        let mut render = renderer();
        render.draw_3d(&viewer, &map, &TextureManager::new(), &mut fb);

        // Flats fall back to magenta; walls to a grey-free purple ramp.
        assert_eq!(fb.get(16, 0), Some(Pixel::MAGENTA));
        assert_eq!(fb.get(16, 31), Some(Pixel::MAGENTA));
        let wall = fb.get(16, 16).unwrap();
        assert_eq!(wall.g, 0);
        assert_eq!(wall.r, wall.b);
        assert!(wall.r > 0);
    }

    #[test]
    fn test_covered_segment_draws_nothing() {
        let map = square_room();
        let viewer = ThingPos::new(Vec2::new(4.0, 4.0), FRAC_PI_2, 1.5);
        let textures = textures();
        let mut fb = FrameBuffer::new(40, 30);
        let mut render = renderer();
        render.draw_3d(&viewer, &map, &textures, &mut fb);

        let spans = render.solid_spans().spans().to_vec();
        let before = render.stats();
        let mut frame = Frame {
            viewer: &viewer,
            map: &map,
            textures: &textures,
            fb: &mut fb,
        };
        // The far wall, already drawn and fully covered.
        render.draw_line(&mut frame, &map.linesegs[1]);

        assert_eq!(render.stats(), before);
        assert_eq!(render.solid_spans().spans(), spans.as_slice());
    }

    #[test]
    fn test_back_facing_and_behind_segments_are_skipped() {
        let map = square_room();
        let textures = textures();
        let mut fb = FrameBuffer::new(40, 30);
        let mut render = renderer();

        // South of the room, facing away: the south wall is seen from behind and
        // everything else is behind the viewer.
        let viewer = ThingPos::new(Vec2::new(4.0, -4.0), 3.0 * FRAC_PI_2, 1.5);
        render.draw_3d(&viewer, &map, &textures, &mut fb);
        let spans = render.solid_spans().spans().to_vec();
        assert_eq!(spans.len(), 2);
        assert_eq!(render.stats().columns, 0);
    }

    #[test]
    fn test_visplane_keys_open_once() {
        let level = demo_level();
        let map = cook(&level, &SplitScoreWeights::default()).unwrap();
        let start = level.player_start().unwrap();
        let viewer = ThingPos::new(
            crate::bsp::bsp_level::quantize(start.raw_x, start.raw_y),
            0.0,
            1.5,
        );
        let mut fb = FrameBuffer::new(80, 60);
        let mut render = renderer();
        render.draw_3d(&viewer, &map, &TextureManager::new(), &mut fb);

        let planes = render.visplanes().planes();
        for (i, a) in planes.iter().enumerate() {
            let same_key_open = planes[i + 1..]
                .iter()
                .filter(|b| a.open && b.open && a.key == b.key)
                .count();
            assert_eq!(same_key_open, 0);
        }
        assert!(render.stats().planes >= 2);
        assert!(render.stats().subsectors >= 2);
    }

    #[test]
    fn test_resize_and_reload() {
        let map = square_room();
        let viewer = ThingPos::new(Vec2::new(4.0, 4.0), 0.0, 1.5);
        let textures = textures();
        let mut render = renderer();

        let mut small = FrameBuffer::new(16, 12);
        render.draw_3d(&viewer, &map, &textures, &mut small);
        let mut large = FrameBuffer::new(48, 36);
        large.clear(BACKGROUND);
        render.draw_3d(&viewer, &map, &textures, &mut large);
        assert!(large.pixels().iter().all(|&p| p != BACKGROUND));

        assert_approx_eq!(render.view_distance(), 1.0, 1e-5);
        render.config().write().set_f32("render.fovy", 60.0);
        render.reload_config();
        render.draw_3d(&viewer, &map, &textures, &mut large);
        assert_approx_eq!(render.settings().fov_y, 60.0, 1e-6);
        assert_approx_eq!(render.view_distance(), 3f32.sqrt(), 1e-4);
    }

    #[test]
    fn test_wall_columns_are_symmetric_facing_a_wall() {
        let map = square_room();
        // Facing the middle of the east wall from the room centre.
        let viewer = ThingPos::new(Vec2::new(4.0, 4.0), 0.0, 1.5);
        let mut fb = FrameBuffer::new(32, 32);
        fb.clear(BACKGROUND);
        let mut render = renderer();
        render.draw_3d(&viewer, &map, &TextureManager::new(), &mut fb);

        let wall_rows = |x: usize| {
            (0..32)
                .filter(|&y| fb.get(x, y).map_or(false, |p| p != Pixel::MAGENTA))
                .count()
        };
        assert_eq!(wall_rows(16), wall_rows(15));
        assert!(wall_rows(16) > 0 && wall_rows(16) < 32);
    }
}
