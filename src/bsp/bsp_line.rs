// src/bsp/bsp_line.rs
// Directed wall segments and the half-space tests the builder is made of.

use crate::bsp::EPSILON;
use crate::utils::Vec2;

/// Which half-space of a splitting line something lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSide {
    Front,
    /// On the line (points) or straddling it (segments).
    On,
    Back,
}

impl LineSide {
    pub fn as_i32(self) -> i32 {
        match self {
            LineSide::Front => 1,
            LineSide::On => 0,
            LineSide::Back => -1,
        }
    }
}

/// A directed wall segment from `a` to `b` with unit normal `n`.
///
/// The front half-space is the side `n` points into. `linedef` and `front` record which
/// source linedef side the segment came from; hand-built segments may leave them zeroed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BspLine {
    pub a: Vec2,
    pub b: Vec2,
    pub n: Vec2,
    pub linedef: usize,
    pub front: bool,
}

impl BspLine {
    /// A segment whose normal is the right-hand perpendicular of `b - a`.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        BspLine {
            a,
            b,
            n: (b - a).normalize().perp(),
            linedef: 0,
            front: true,
        }
    }

    pub fn with_normal(a: Vec2, b: Vec2, n: Vec2) -> Self {
        BspLine {
            a,
            b,
            n,
            linedef: 0,
            front: true,
        }
    }

    pub fn with_source(mut self, linedef: usize, front: bool) -> Self {
        self.linedef = linedef;
        self.front = front;
        self
    }

    /// Signed distance of `p` from the infinite line through this segment.
    pub fn distance(&self, p: Vec2) -> f32 {
        p.dot(self.n) - self.a.dot(self.n)
    }

    pub fn length(&self) -> f32 {
        self.a.distance_to(self.b)
    }

    /// True when the normal is parallel to an axis.
    pub fn is_axis_aligned(&self) -> bool {
        self.n.x.abs() < 1.0e-6 || self.n.y.abs() < 1.0e-6
    }

    /// Same segment extended `extent` units past both ends.
    pub fn extended(&self, extent: f32) -> BspLine {
        let dir = (self.b - self.a).normalize();
        BspLine {
            a: self.a - dir * extent,
            b: self.b + dir * extent,
            ..*self
        }
    }
}

/// Classifies `p` against `split`, treating distances within [`EPSILON`] as on the line.
pub fn side_of_point(split: &BspLine, p: Vec2) -> LineSide {
    let d = split.distance(p);
    if d.abs() <= EPSILON {
        LineSide::On
    } else if d > 0.0 {
        LineSide::Front
    } else {
        LineSide::Back
    }
}

/// Classifies a whole segment against `split`.
///
/// Segments touching the line with one endpoint count as on the side of the other. A
/// segment lying on the line is in front when it faces the same way as `split`, behind
/// when it faces the opposite way. `On` means the segment straddles the line.
pub fn side_of_line(split: &BspLine, line: &BspLine) -> LineSide {
    let sa = side_of_point(split, line.a);
    let sb = side_of_point(split, line.b);

    match (sa, sb) {
        (LineSide::On, LineSide::On) => {
            if split.n.dot(line.n) < 0.0 {
                LineSide::Back
            } else {
                LineSide::Front
            }
        }
        (LineSide::Front | LineSide::On, LineSide::Front | LineSide::On) => LineSide::Front,
        (LineSide::Back | LineSide::On, LineSide::Back | LineSide::On) => LineSide::Back,
        _ => LineSide::On,
    }
}

/// Cuts `line` where it crosses `split`, returning `(front, back)` pieces.
///
/// Returns `None` when the endpoints are not strictly on opposite sides. Both pieces keep
/// the direction, normal and source of the original and share the intersection point.
pub fn split(split: &BspLine, line: &BspLine) -> Option<(BspLine, BspLine)> {
    let d0 = split.distance(line.a);
    let d1 = split.distance(line.b);

    if (d0 >= 0.0 && d1 >= 0.0) || (d0 <= 0.0 && d1 <= 0.0) {
        return None;
    }

    let t = d0 / (d0 - d1);
    let p = line.a + (line.b - line.a) * t;
    let head = BspLine { b: p, ..*line };
    let tail = BspLine { a: p, ..*line };

    if d0 > 0.0 {
        Some((head, tail))
    } else {
        Some((tail, head))
    }
}
