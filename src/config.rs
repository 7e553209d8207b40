// src/config.rs
//! Key/value settings store.
//!
//! Values live as JSON in a flat object. Reading a key that is not present inserts the
//! default, so a subsequent [`Config::save`] records every setting the program consulted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::utils::util::deg_to_rad;

pub const DEFAULT_CONFIG_PATH: &str = "res/config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    values: BTreeMap<String, Value>,

    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// An empty configuration bound to `path` (nothing is read).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Config {
            values: BTreeMap::new(),
            path: path.into(),
        }
    }

    /// Loads `path`. A missing file yields an empty configuration bound to `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Config::new(path);
        config.reload()?;
        Ok(config)
    }

    /// Re-reads the bound file, replacing every value. A missing file clears nothing.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let parsed: Config = serde_json::from_str(&text)?;
                self.values = parsed.values;
                info!("Loaded {} config values from {:?}", self.values.len(), self.path);
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", self.path);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Writes all values, keys sorted, as pretty JSON.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Numeric value for `key`, inserting `default` when absent. Values stored as
    /// strings are parsed, matching hand-edited files.
    pub fn get_f32(&mut self, key: &str, default: f32) -> f32 {
        match self.values.get(key) {
            Some(Value::Number(n)) => n.as_f64().map(|v| v as f32).unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            Some(_) => default,
            None => {
                self.values.insert(key.to_string(), Value::from(default as f64));
                default
            }
        }
    }

    /// String value for `key`, inserting `default` when absent.
    pub fn get_str(&mut self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                self.values
                    .insert(key.to_string(), Value::String(default.to_string()));
                default.to_string()
            }
        }
    }

    pub fn set_f32(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), Value::from(value as f64));
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// `value` clamped into `[min, max]`, with a warning when it had to move. NaN becomes `min`.
fn limited(key: &str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != value {
        warn!("{} = {} is out of range, using {}", key, value, clamped);
    }
    clamped
}

/// Renderer settings resolved from a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    /// Distance at which wall and flat brightness reaches its floor.
    pub max_fade_dist: f32,
    /// Texels per world unit.
    pub tex_scale: f32,
    /// Minimum view-space depth of projected geometry.
    pub near_clip: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            fov_y: 90.0,
            max_fade_dist: 50.0,
            tex_scale: 32.0,
            near_clip: 0.1,
        }
    }
}

impl RenderSettings {
    /// Smallest near-clip distance; at or below zero points behind the eye would project.
    pub const MIN_NEAR_CLIP: f32 = 1.0e-3;
    /// Field of view limits in degrees, keeping the view distance finite and positive.
    pub const MIN_FOV_Y: f32 = 1.0;
    pub const MAX_FOV_Y: f32 = 179.0;

    pub fn from_config(config: &mut Config) -> Self {
        let defaults = RenderSettings::default();
        RenderSettings {
            fov_y: limited(
                "render.fovy",
                config.get_f32("render.fovy", defaults.fov_y),
                Self::MIN_FOV_Y,
                Self::MAX_FOV_Y,
            ),
            max_fade_dist: config.get_f32("render.fade_dist", defaults.max_fade_dist),
            tex_scale: config.get_f32("render.tex_scale", defaults.tex_scale),
            near_clip: limited(
                "render.near_clip",
                config.get_f32("render.near_clip", defaults.near_clip),
                Self::MIN_NEAR_CLIP,
                f32::MAX,
            ),
        }
    }

    /// Projection scale: screen half-height per unit of height/depth.
    pub fn view_distance(&self) -> f32 {
        1.0 / (deg_to_rad(self.fov_y) * 0.5).tan()
    }
}
