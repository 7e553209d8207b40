// src/utils/geometry.rs

use std::ops::{Add, Div, Mul, Neg, Sub};

/// A 2D vector / point in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z of the 3D cross product).
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Unit vector in the same direction. A zero vector is returned unchanged.
    pub fn normalize(self) -> Vec2 {
        let length = self.length();
        if length == 0.0 {
            return self;
        }
        self / length
    }

    /// Right-hand perpendicular: `(y, -x)`.
    pub fn perp(self) -> Vec2 {
        Vec2::new(self.y, -self.x)
    }

    pub fn distance_to(self, other: Vec2) -> f32 {
        (other - self).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, s: f32) -> Vec2 {
        Vec2::new(self.x / s, self.y / s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Column-major 2x2 matrix: `x` and `y` are the images of the basis vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat2 {
    pub x: Vec2,
    pub y: Vec2,
}

impl Default for Mat2 {
    fn default() -> Self {
        Mat2 {
            x: Vec2::new(1.0, 0.0),
            y: Vec2::new(0.0, 1.0),
        }
    }
}

impl Mat2 {
    pub fn transpose(&self) -> Mat2 {
        Mat2 {
            x: Vec2::new(self.x.x, self.y.x),
            y: Vec2::new(self.x.y, self.y.y),
        }
    }
}

impl Mul<Vec2> for Mat2 {
    type Output = Vec2;
    fn mul(self, v: Vec2) -> Vec2 {
        Vec2::new(
            Vec2::new(self.x.x, self.y.x).dot(v),
            Vec2::new(self.x.y, self.y.y).dot(v),
        )
    }
}

/// Rigid 2D transform: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform2D {
    pub m: Mat2,
    pub p: Vec2,
}

impl Transform2D {
    /// Camera-to-world transform for a viewer at `p` facing `facing` radians from +X.
    ///
    /// Camera space has +Y forward and +X to the right.
    pub fn from_camera(p: Vec2, facing: f32) -> Self {
        let (sin_facing, cos_facing) = facing.sin_cos();
        Transform2D {
            m: Mat2 {
                x: Vec2::new(sin_facing, -cos_facing),
                y: Vec2::new(cos_facing, sin_facing),
            },
            p,
        }
    }

    /// Inverse of a rigid transform (transpose the rotation, rotate back the translation).
    pub fn inverse(&self) -> Self {
        let m = self.m.transpose();
        Transform2D { m, p: -(m * self.p) }
    }

    pub fn apply(&self, point: Vec2) -> Vec2 {
        self.m * point + self.p
    }
}

/// Axis-aligned bounding box. The default box is empty (inverted infinities).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub mins: Vec2,
    pub maxs: Vec2,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::new_empty()
    }
}

impl BoundingBox {
    pub fn new_empty() -> Self {
        BoundingBox {
            mins: Vec2::new(f32::MAX, f32::MAX),
            maxs: Vec2::new(-f32::MAX, -f32::MAX),
        }
    }

    pub fn new(mins: Vec2, maxs: Vec2) -> Self {
        BoundingBox { mins, maxs }
    }

    pub fn is_empty(&self) -> bool {
        self.maxs.x < self.mins.x || self.maxs.y < self.mins.y
    }

    /// Area, or zero for an empty or degenerate box.
    pub fn area(&self) -> f32 {
        if self.maxs.x > self.mins.x && self.maxs.y > self.mins.y {
            let extents = self.maxs - self.mins;
            extents.x * extents.y
        } else {
            0.0
        }
    }

    /// Expand to include `p`.
    pub fn grow(&mut self, p: Vec2) {
        self.mins.x = self.mins.x.min(p.x);
        self.mins.y = self.mins.y.min(p.y);
        self.maxs.x = self.maxs.x.max(p.x);
        self.maxs.y = self.maxs.y.max(p.y);
    }

    pub fn merge(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
        BoundingBox {
            mins: Vec2::new(a.mins.x.min(b.mins.x), a.mins.y.min(b.mins.y)),
            maxs: Vec2::new(a.maxs.x.max(b.maxs.x), a.maxs.y.max(b.maxs.y)),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.mins.x && p.x <= self.maxs.x && p.y >= self.mins.y && p.y <= self.maxs.y
    }

    pub fn center(&self) -> Vec2 {
        (self.mins + self.maxs) * 0.5
    }
}
