// src/viewer.rs

use log::debug;

use crate::bsp::bsp_level::quantize;
use crate::compiled::CompiledMap;
use crate::config::Config;
use crate::map::Thing;
use crate::utils::util::{deg_to_rad, rad_to_deg, wrap_angle};
use crate::utils::{Transform2D, Vec2};

/// Viewer pose: position, facing in radians counter-clockwise from +X, and eye height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThingPos {
    pub p: Vec2,
    pub f: f32,
    pub h: f32,
}

impl ThingPos {
    pub fn new(p: Vec2, f: f32, h: f32) -> Self {
        ThingPos { p, f, h }
    }

    /// Unit vector along the facing.
    pub fn forward(&self) -> Vec2 {
        let (sin, cos) = self.f.sin_cos();
        Vec2::new(cos, sin)
    }

    /// Camera-to-world transform of this pose.
    pub fn transform(&self) -> Transform2D {
        Transform2D::from_camera(self.p, self.f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSettings {
    /// World units per second.
    pub move_speed: f32,
    /// Degrees per second.
    pub turn_speed: f32,
    /// Eye height above the floor, in world units.
    pub eye_height: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        PlayerSettings {
            move_speed: 5.0,
            turn_speed: 360.0,
            eye_height: 1.5,
        }
    }
}

impl PlayerSettings {
    pub fn from_config(config: &mut Config) -> Self {
        let defaults = PlayerSettings::default();
        PlayerSettings {
            move_speed: config.get_f32("game.move_speed", defaults.move_speed),
            turn_speed: config.get_f32("game.turn_speed", defaults.turn_speed),
            eye_height: config.get_f32("game.eye_height", defaults.eye_height),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub t: ThingPos,
    pub settings: PlayerSettings,
}

impl Player {
    pub fn new(t: ThingPos, settings: PlayerSettings) -> Self {
        Player { t, settings }
    }

    /// Places a player on a level's start thing, standing on the floor below it.
    pub fn spawn(map: &CompiledMap, start: &Thing, settings: PlayerSettings) -> Self {
        let p = quantize(start.raw_x, start.raw_y);
        let f = wrap_angle(deg_to_rad(start.angle as f32));
        let h = map
            .sector_at(p)
            .map_or(settings.eye_height, |s| s.floor_height + settings.eye_height);
        debug!(
            "Player spawned at ({}, {}) facing {:.0} degrees, eye {}",
            p.x,
            p.y,
            rad_to_deg(f),
            h
        );
        Player::new(ThingPos::new(p, f, h), settings)
    }

    pub fn pos(&self) -> &ThingPos {
        &self.t
    }

    /// Puts the eye back above the floor under the player. Outside every sector the
    /// height is left as it is.
    pub fn update_eye_height(&mut self, map: &CompiledMap) {
        if let Some(sector) = map.sector_at(self.t.p) {
            self.t.h = sector.floor_height + self.settings.eye_height;
        }
    }

    /// Moves relative to the view: `movement.x` strafes right, `movement.y` goes forward.
    pub fn move_by(&mut self, movement: Vec2, delta: f32) {
        let step = self.t.transform().m * movement * (self.settings.move_speed * delta);
        self.t.p = self.t.p + step;
    }

    /// Turns left for positive `amount`, keeping the facing in `[0, 2π)`.
    pub fn turn(&mut self, amount: f32, delta: f32) {
        let angle = deg_to_rad(self.settings.turn_speed) * amount * delta;
        self.t.f = wrap_angle(self.t.f + angle);
    }
}
