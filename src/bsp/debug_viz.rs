// src/bsp/debug_viz.rs
//! Top-down picture of a builder's current state.

use crate::bsp::bsp_builder::BspTreeBuilder;
use crate::bsp::bsp_line::BspLine;
use crate::bsp::bsp_node::{NodeId, NodeKind};
use crate::render::framebuffer::{FrameBuffer, Pixel};
use crate::utils::{BoundingBox, Vec2};

/// How far splits are extended before being clipped to their region.
const SPLIT_EXTENT: f32 = 10_000.0;
/// Length of a wall's normal tick, in pixels.
const NORMAL_TICK: f32 = 4.0;

const GRID_COLOUR: Pixel = Pixel::new(32, 32, 40);

/// Maps world space onto a framebuffer, +Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopDownView {
    pub center: Vec2,
    /// Pixels per world unit.
    pub zoom: f32,
    /// Grid spacing in world units, if a grid is wanted.
    pub grid: Option<f32>,
}

impl Default for TopDownView {
    fn default() -> Self {
        TopDownView {
            center: Vec2::ZERO,
            zoom: 1.0,
            grid: None,
        }
    }
}

impl TopDownView {
    pub fn new(center: Vec2, zoom: f32) -> Self {
        TopDownView {
            center,
            zoom,
            grid: None,
        }
    }

    /// Frames `bounds` inside a `width` x `height` target with a small margin.
    pub fn fit(bounds: &BoundingBox, width: usize, height: usize) -> Self {
        if bounds.is_empty() {
            return TopDownView::default();
        }
        let size = bounds.maxs - bounds.mins;
        let zoom_x = width as f32 / size.x.max(f32::EPSILON);
        let zoom_y = height as f32 / size.y.max(f32::EPSILON);
        TopDownView::new(bounds.center(), zoom_x.min(zoom_y) * 0.9)
    }

    /// Frames every wall the builder holds.
    pub fn fit_builder(builder: &BspTreeBuilder, width: usize, height: usize) -> Self {
        let bounds = builder
            .nodes()
            .iter()
            .filter_map(|node| node.sector())
            .fold(BoundingBox::new_empty(), |acc, sector| {
                BoundingBox::merge(&acc, &sector.bounds)
            });
        TopDownView::fit(&bounds, width, height)
    }

    pub fn with_grid(mut self, spacing: f32) -> Self {
        self.grid = (spacing > 0.0).then_some(spacing);
        self
    }

    pub fn world_to_screen(&self, p: Vec2, width: usize, height: usize) -> Vec2 {
        let offset = (p - self.center) * self.zoom;
        Vec2::new(width as f32 * 0.5 + offset.x, height as f32 * 0.5 - offset.y)
    }

    pub fn screen_to_world(&self, s: Vec2, width: usize, height: usize) -> Vec2 {
        let offset = Vec2::new(s.x - width as f32 * 0.5, height as f32 * 0.5 - s.y);
        self.center + offset / self.zoom
    }
}

/// Liang-Barsky clip of `a`-`b` against `[0, width) x [0, height)`.
fn clip_to_screen(a: Vec2, b: Vec2, width: f32, height: f32) -> Option<(Vec2, Vec2)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    let edges = [
        (-d.x, a.x),
        (d.x, width - 1.0 - a.x),
        (-d.y, a.y),
        (d.y, height - 1.0 - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}

fn draw_world_line(fb: &mut FrameBuffer, view: &TopDownView, a: Vec2, b: Vec2, colour: Pixel) {
    let (width, height) = (fb.width(), fb.height());
    let sa = view.world_to_screen(a, width, height);
    let sb = view.world_to_screen(b, width, height);
    if let Some((ca, cb)) = clip_to_screen(sa, sb, width as f32, height as f32) {
        fb.draw_line(
            ca.x.round() as i32,
            ca.y.round() as i32,
            cb.x.round() as i32,
            cb.y.round() as i32,
            colour,
        );
    }
}

fn draw_wall(fb: &mut FrameBuffer, view: &TopDownView, line: &BspLine, colour: Pixel) {
    draw_world_line(fb, view, line.a, line.b, colour);
    let mid = (line.a + line.b) * 0.5;
    draw_world_line(fb, view, mid, mid + line.n * (NORMAL_TICK / view.zoom), colour);
}

fn draw_grid(fb: &mut FrameBuffer, view: &TopDownView, spacing: f32) {
    let (width, height) = (fb.width(), fb.height());
    let min = view.screen_to_world(Vec2::new(0.0, height as f32), width, height);
    let max = view.screen_to_world(Vec2::new(width as f32, 0.0), width, height);
    // Skip grids too dense to read.
    if spacing * view.zoom < 4.0 {
        return;
    }

    let mut x = (min.x / spacing).floor() * spacing;
    while x <= max.x {
        draw_world_line(fb, view, Vec2::new(x, min.y), Vec2::new(x, max.y), GRID_COLOUR);
        x += spacing;
    }
    let mut y = (min.y / spacing).floor() * spacing;
    while y <= max.y {
        draw_world_line(fb, view, Vec2::new(min.x, y), Vec2::new(max.x, y), GRID_COLOUR);
        y += spacing;
    }
}

/// Draws the builder's splits clipped to their regions (grey), every leaf's walls with
/// normal ticks (green once convex, red while not) and `highlight`'s walls (yellow).
pub fn draw_builder(
    builder: &BspTreeBuilder,
    fb: &mut FrameBuffer,
    view: &TopDownView,
    highlight: Option<NodeId>,
) {
    if let Some(spacing) = view.grid {
        draw_grid(fb, view, spacing);
    }

    for (index, node) in builder.nodes().iter().enumerate() {
        if let NodeKind::Internal { .. } = node.kind {
            if let Some(line) = builder.split_line_extent(NodeId(index), SPLIT_EXTENT) {
                draw_world_line(fb, view, line.a, line.b, Pixel::GREY);
            }
        }
    }

    for node in builder.nodes() {
        if let Some(sector) = node.sector() {
            let colour = if sector.convex() { Pixel::GREEN } else { Pixel::RED };
            for line in &sector.lines {
                draw_wall(fb, view, line, colour);
            }
        }
    }

    let highlighted = highlight
        .and_then(|id| builder.nodes().get(id.0))
        .and_then(|node| node.sector());
    if let Some(sector) = highlighted {
        for line in &sector.lines {
            draw_wall(fb, view, line, Pixel::YELLOW);
        }
    }
}
