// src/config.rs - runtime settings for both binaries
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use image::Rgba;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera_index: u32,
    pub listen_addr: String,
    pub asset_dir: PathBuf,
    /// Command line of the hand-landmark helper process. `null` (or a
    /// command that fails to start) selects the built-in simulated hand.
    pub detector_command: Option<String>,
    pub jpeg_quality: u8,
    pub board: BoardConfig,
    pub navigator: NavigatorConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_index: 0,
            listen_addr: "127.0.0.1:5000".to_string(),
            asset_dir: PathBuf::from("static"),
            detector_command: Some("python3 scripts/hand_daemon.py".to_string()),
            jpeg_quality: 80,
            board: BoardConfig::default(),
            navigator: NavigatorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub zoom_step: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub pinch_threshold: f32,
    pub eraser_radius: f32,
    pub stroke_width: f32,
    pub stroke_rgb: [u8; 3],
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            zoom_step: 0.05,
            min_zoom: 0.5,
            max_zoom: 2.0,
            pinch_threshold: crate::gesture::DEFAULT_PINCH_THRESHOLD,
            eraser_radius: 40.0,
            stroke_width: 5.0,
            stroke_rgb: [0, 0, 255],
        }
    }
}

impl BoardConfig {
    pub fn stroke_color(&self) -> Rgba<u8> {
        let [r, g, b] = self.stroke_rgb;
        Rgba([r, g, b, 255])
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub hold_time_ms: u64,
    pub cooldown_frames: u32,
    pub eraser_radius: f32,
    pub raster_dpi: u32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            hold_time_ms: 500,
            cooldown_frames: 10,
            eraser_radius: 40.0,
            raster_dpi: 150,
        }
    }
}

impl NavigatorConfig {
    pub fn hold_time(&self) -> Duration {
        Duration::from_millis(self.hold_time_ms)
    }
}

/// Load settings from a JSON file, or fall back to the defaults when no
/// path is given.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read settings file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("malformed settings file {}", path.display()))
        }
        None => Ok(Settings::default()),
    }
}
