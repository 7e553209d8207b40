#![warn(non_snake_case)]
//! # rust_fist
//!
//! Headless driver. Loads a level (a WAD map when one is configured, the built-in demo
//! level otherwise), compiles its BSP, renders one frame from the player start and
//! writes it as an image.
//!
//! ```text
//! rust_fist [--config <path>] [--top-down] [--fmap <path>] [output.png]
//! ```

use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use parking_lot::RwLock;

use rust_fist::bsp::bsp_level::{self, quantize};
use rust_fist::bsp::bsp_procedural::demo_level;
use rust_fist::bsp::debug_viz::{draw_builder, TopDownView};
use rust_fist::bsp::{cook, BspTreeBuilder, SplitScoreWeights};
use rust_fist::compiled::CompiledMap;
use rust_fist::config::{Config, DEFAULT_CONFIG_PATH};
use rust_fist::document::WadDocument;
use rust_fist::error::MapError;
use rust_fist::map::SourceLevel;
use rust_fist::render::{FrameBuffer, Pixel, Render3D, TextureManager};
use rust_fist::utils::util::deg_to_rad;
use rust_fist::utils::Vec2;
use rust_fist::viewer::{Player, PlayerSettings, ThingPos};

#[derive(Debug, Parser)]
#[command(name = "rust_fist")]
#[command(about = "Cook a level and render one frame of it to an image")]
struct Options {
    /// Settings file (created with defaults if missing)
    #[arg(long, value_name = "PATH")]
    config: Option<String>,
    /// Draw the BSP builder's top-down view instead of the 3D frame
    #[arg(long)]
    top_down: bool,
    /// Also write the cooked map in FMAP format
    #[arg(long, value_name = "PATH")]
    fmap: Option<String>,
    /// Output image (defaults to `render.output`)
    output: Option<String>,
}

fn read_wad_level(path: &str, name: &str) -> Result<SourceLevel, MapError> {
    let mut reader = BufReader::new(File::open(path)?);
    WadDocument::load(&mut reader)?.load_level(name)
}

/// The configured WAD level, or the demo level when none is configured or it fails to load.
fn load_level(config: &mut Config) -> SourceLevel {
    let wad_path = config.get_str("game.wadfile", "");
    let map_name = config.get_str("game.map", "E1M1");
    if wad_path.is_empty() {
        info!("No WAD configured, using the demo level");
        return demo_level();
    }

    match read_wad_level(&wad_path, &map_name) {
        Ok(level) => {
            info!("Loaded {} from {}", map_name, wad_path);
            level
        }
        Err(err) => {
            warn!("Could not load {} from {}: {}; using the demo level", map_name, wad_path, err);
            demo_level()
        }
    }
}

fn load_textures(config: &mut Config, map: &CompiledMap) -> TextureManager {
    let mut textures = TextureManager::new();
    let dir = config.get_str("game.textures", "");
    if !dir.is_empty() {
        if let Err(err) = textures.load_dir(&dir) {
            warn!("Could not load textures from {}: {}", dir, err);
        }
    }
    textures.fill_missing(map.texture_ids());
    textures
}

/// The configured spawn point if there is one, else the level's player 1 start.
fn spawn_player(config: &mut Config, level: &SourceLevel, map: &CompiledMap) -> Player {
    let settings = PlayerSettings::from_config(config);
    if config.contains("game.spawn_x") && config.contains("game.spawn_y") {
        let raw_x = config.get_f32("game.spawn_x", 0.0) as i32;
        let raw_y = config.get_f32("game.spawn_y", 0.0) as i32;
        let angle = deg_to_rad(config.get_f32("game.spawn_angle", 0.0));
        let mut player = Player::new(
            ThingPos::new(quantize(raw_x, raw_y), angle, settings.eye_height),
            settings,
        );
        player.update_eye_height(map);
        return player;
    }

    match level.player_start() {
        Some(start) => Player::spawn(map, start, settings),
        None => {
            warn!("Level has no player start, spawning at the origin");
            let mut player = Player::new(ThingPos::new(Vec2::ZERO, 0.0, settings.eye_height), settings);
            player.update_eye_height(map);
            player
        }
    }
}

fn draw_top_down(
    level: &SourceLevel,
    player: &Player,
    weights: SplitScoreWeights,
    fb: &mut FrameBuffer,
) -> Result<(), Box<dyn Error>> {
    bsp_level::validate(level)?;
    let mut builder = BspTreeBuilder::new(weights);
    builder.init(&bsp_level::source_lines(level))?;
    builder.build()?;

    let view = TopDownView::fit_builder(&builder, fb.width(), fb.height()).with_grid(2.0);
    let highlight = builder.leaf_at(player.pos().p);
    draw_builder(&builder, fb, &view, highlight);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let options = Options::parse();
    info!("rust_fist starting...");

    let config_path = options
        .config
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Arc::new(RwLock::new(Config::load(&config_path)?));

    let (level, map, player, textures, weights, width, height, output) = {
        let mut config = config.write();
        let level = load_level(&mut config);
        let weights = SplitScoreWeights::from_config(&mut config);
        let map = cook(&level, &weights)?;
        let player = spawn_player(&mut config, &level, &map);
        let textures = load_textures(&mut config, &map);
        let width = config.get_f32("render.width", 320.0).max(1.0) as usize;
        let height = config.get_f32("render.height", 200.0).max(1.0) as usize;
        let output = options
            .output
            .clone()
            .unwrap_or_else(|| config.get_str("render.output", "frame.png"));
        (level, map, player, textures, weights, width, height, output)
    };

    if let Some(path) = &options.fmap {
        let mut writer = BufWriter::new(File::create(path)?);
        map.write_to(&mut writer)?;
        info!("Wrote compiled map to {}", path);
    }

    let mut fb = FrameBuffer::new(width, height);
    fb.clear(Pixel::BLACK);
    if options.top_down {
        draw_top_down(&level, &player, weights, &mut fb)?;
    } else {
        let mut render = Render3D::new(Arc::clone(&config));
        render.draw_3d(player.pos(), &map, &textures, &mut fb);
        let stats = render.stats();
        info!(
            "Frame: {} subsectors, {} segs, {} columns, {} planes",
            stats.subsectors, stats.segs, stats.columns, stats.planes
        );
    }
    fb.save(&output)?;
    info!("Wrote {}", output);

    {
        let config = config.read();
        if !config.path().exists() {
            config.save()?;
            info!("Saved default settings to {:?}", config.path());
        }
    }

    info!("rust_fist exiting.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_options_definition() {
        Options::command().debug_assert();
    }

    #[test]
    fn test_parse_options() {
        let options =
            Options::try_parse_from(["rust_fist", "--top-down", "--config", "a.json", "out.png"]).unwrap();
        assert!(options.top_down);
        assert_eq!(options.config.as_deref(), Some("a.json"));
        assert_eq!(options.output.as_deref(), Some("out.png"));
        assert!(options.fmap.is_none());

        let options = Options::try_parse_from(["rust_fist", "--fmap", "level.fmap"]).unwrap();
        assert_eq!(options.fmap.as_deref(), Some("level.fmap"));
        assert!(!options.top_down);
        assert!(options.output.is_none());
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Options::try_parse_from(["rust_fist", "--bogus"]).is_err());
        assert!(Options::try_parse_from(["rust_fist", "a.png", "b.png"]).is_err());
        assert!(Options::try_parse_from(["rust_fist", "--config"]).is_err());
        let help = Options::try_parse_from(["rust_fist", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
