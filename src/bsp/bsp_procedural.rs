// src/bsp/bsp_procedural.rs

use std::f32::consts::TAU;

use log::debug;
use rand::Rng;

use crate::bsp::bsp_line::BspLine;
use crate::bsp::bsp_level::MAP_SCALE;
use crate::map::thing::PLAYER1_START;
use crate::map::{LineDef, Sector, SideDef, SourceLevel, Thing, NO_SIDE};
use crate::utils::Vec2;

/// Shape parameters for [`random_room`], in world units.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub min_vertices: usize,
    pub max_vertices: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    pub center: Vec2,
}

impl Default for RoomConfig {
    fn default() -> Self {
        RoomConfig {
            min_vertices: 5,
            max_vertices: 12,
            min_radius: 2.0,
            max_radius: 6.0,
            center: Vec2::ZERO,
        }
    }
}

/// Corners of a random star-shaped room, in clockwise order.
fn room_corners<R: Rng + ?Sized>(rng: &mut R, config: &RoomConfig) -> Vec<Vec2> {
    let max_vertices = config.max_vertices.max(config.min_vertices).max(3);
    let count = rng.random_range(config.min_vertices.max(3)..=max_vertices);
    let slot = TAU / count as f32;
    let max_radius = config.max_radius.max(config.min_radius);
    let start = rng.random_range(0.0..TAU);

    (0..count)
        .map(|i| {
            // Jitter stays inside the slot so angles remain strictly decreasing.
            let angle = start - slot * (i as f32 + rng.random_range(0.0..0.6));
            let radius = rng.random_range(config.min_radius..=max_radius);
            let (sin, cos) = angle.sin_cos();
            config.center + Vec2::new(cos, sin) * radius
        })
        .collect()
}

/// A closed, usually non-convex loop of walls facing inward.
pub fn random_room<R: Rng + ?Sized>(rng: &mut R, config: &RoomConfig) -> Vec<BspLine> {
    let corners = room_corners(rng, config);
    let lines: Vec<BspLine> = corners
        .iter()
        .zip(corners.iter().cycle().skip(1))
        .enumerate()
        .map(|(i, (&a, &b))| BspLine::new(a, b).with_source(i, true))
        .collect();
    debug!("Generated room with {} walls", lines.len());
    lines
}

/// A random room as a one-sector source level with the player at its centre.
pub fn room_level<R: Rng + ?Sized>(rng: &mut R, config: &RoomConfig) -> SourceLevel {
    let mut level = SourceLevel::new();
    let sector = level.add_sector(Sector::new(0, 128, "FLAT1", "CEIL1", 192)) as i32;
    let side = level.add_sidedef(SideDef::solid("STARTAN3", sector)) as i32;

    let ids: Vec<usize> = room_corners(rng, config)
        .into_iter()
        .map(|c| {
            let x = (c.x * MAP_SCALE).round() as i32;
            let y = (c.y * MAP_SCALE).round() as i32;
            level.add_vertex(x, y)
        })
        .collect();
    for (i, &start) in ids.iter().enumerate() {
        level.add_linedef(LineDef::new(start, ids[(i + 1) % ids.len()], side, NO_SIDE));
    }

    level.things.push(Thing {
        raw_x: (config.center.x * MAP_SCALE) as i32,
        raw_y: (config.center.y * MAP_SCALE) as i32,
        angle: 90,
        thing_type: PLAYER1_START,
        options: 7,
    });
    level
}

/// The built-in level: a hall with a pillar, opening east onto a raised alcove.
///
/// ```text
///  (0,256) +-----------------+ (256,256)
///          |                 |
///          |                 +-------+ (384,192)
///          |      [#]        .  step |
///          |  P>             +-------+ (384,64)
///          |                 |
///    (0,0) +-----------------+ (256,0)
/// ```
pub fn demo_level() -> SourceLevel {
    let mut level = SourceLevel::new();
    let hall = level.add_sector(Sector::new(0, 128, "FLAT1", "CEIL1", 208)) as i32;
    let alcove = level.add_sector(Sector::new(32, 112, "FLAT2", "CEIL1", 160)) as i32;

    let hall_wall = level.add_sidedef(SideDef::solid("STARTAN3", hall)) as i32;
    let pillar_wall = level.add_sidedef(SideDef::solid("SUPPORT2", hall)) as i32;
    let alcove_wall = level.add_sidedef(SideDef::solid("STARTAN3", alcove)) as i32;
    let hall_step = level.add_sidedef(SideDef::portal("STEP1", hall)) as i32;
    let alcove_step = level.add_sidedef(SideDef::portal("STEP1", alcove)) as i32;

    fn add_walls(level: &mut SourceLevel, corners: &[(i32, i32)], side: i32) {
        let ids: Vec<usize> = corners.iter().map(|&(x, y)| level.add_vertex(x, y)).collect();
        for pair in ids.windows(2) {
            level.add_linedef(LineDef::new(pair[0], pair[1], side, NO_SIDE));
        }
    }

    // Clockwise, so every wall faces into its room.
    add_walls(
        &mut level,
        &[(256, 64), (256, 0), (0, 0), (0, 256), (256, 256), (256, 192)],
        hall_wall,
    );
    add_walls(
        &mut level,
        &[(256, 192), (384, 192), (384, 64), (256, 64)],
        alcove_wall,
    );
    // Counter-clockwise, so the pillar faces out into the hall.
    add_walls(
        &mut level,
        &[(96, 96), (128, 96), (128, 128), (96, 128), (96, 96)],
        pillar_wall,
    );

    let top = level.add_vertex(256, 192);
    let bottom = level.add_vertex(256, 64);
    level.add_linedef(LineDef::new(top, bottom, hall_step, alcove_step));

    level.things.push(Thing {
        raw_x: 48,
        raw_y: 160,
        angle: 0,
        thing_type: PLAYER1_START,
        options: 7,
    });
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::bsp_line::{side_of_point, LineSide};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_room_is_closed_and_inward_facing() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = RoomConfig {
            center: Vec2::new(10.0, -4.0),
            ..RoomConfig::default()
        };
        for _ in 0..20 {
            let lines = random_room(&mut rng, &config);
            assert!(lines.len() >= config.min_vertices && lines.len() <= config.max_vertices);
            for (i, line) in lines.iter().enumerate() {
                assert_eq!(line.b, lines[(i + 1) % lines.len()].a);
                assert!(line.length() > 0.0);
                assert_eq!(side_of_point(line, config.center), LineSide::Front);
            }
        }
    }

    #[test]
    fn test_same_seed_same_room() {
        let a = random_room(&mut StdRng::seed_from_u64(9), &RoomConfig::default());
        let b = random_room(&mut StdRng::seed_from_u64(9), &RoomConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_room_level_has_player() {
        let level = room_level(&mut StdRng::seed_from_u64(3), &RoomConfig::default());
        assert_eq!(level.sectors.len(), 1);
        assert_eq!(level.linedefs.len(), level.vertices.len());
        assert!(level.player_start().is_some());
    }

    #[test]
    fn test_demo_level_layout() {
        let level = demo_level();
        assert_eq!(level.sectors.len(), 2);
        assert_eq!(level.linedefs.len(), 13);
        assert_eq!(level.linedefs.iter().filter(|l| l.has_back()).count(), 1);
        let start = level.player_start().unwrap();
        assert_eq!((start.raw_x, start.raw_y), (48, 160));
    }
}
