//! # Utility Module
//!
//! Small numeric helpers shared by the builder, the renderer and the viewer.

use std::f32::consts::PI;

/// Clamps a value between a minimum and maximum.
///
/// # Examples
///
/// ```
/// use rust_fist::utils::util::clamp;
///
/// assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
/// assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
/// assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
/// ```
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

pub fn deg_to_rad(deg: f32) -> f32 {
    deg * (PI / 180.0)
}

pub fn rad_to_deg(rad: f32) -> f32 {
    rad * (180.0 / PI)
}

/// Wraps an angle in radians into `[0, 2π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(2.0 * PI);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    if wrapped >= 2.0 * PI {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_clamp_within_bounds() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
    }

    #[test]
    fn test_clamp_below_bounds() {
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_clamp_above_bounds() {
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_angle_conversions() {
        assert_approx_eq!(deg_to_rad(180.0), PI, 1e-6);
        assert_approx_eq!(rad_to_deg(PI / 2.0), 90.0, 1e-4);
    }

    #[test]
    fn test_wrap_angle() {
        assert_approx_eq!(wrap_angle(-PI / 2.0), 1.5 * PI, 1e-5);
        assert_approx_eq!(wrap_angle(5.0 * PI), PI, 1e-4);
        assert!(wrap_angle(-1e-9) < 2.0 * PI);
    }
}
