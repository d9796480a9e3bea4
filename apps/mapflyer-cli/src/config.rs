//! Flyer configuration and secrets
//!
//! Two YAML files: `flyer.yaml` describes the event (title, links, map
//! geometry), `secrets.yaml` holds the map API key and stays out of
//! version control.

use std::fs;
use std::path::Path;

use anyhow::Context;
use mapflyer_render::CropMargins;
use serde::{Deserialize, Serialize};

/// Event description loaded from `flyer.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlyerConfig {
    /// Flyer title, also used as the output file name
    pub title: String,
    /// Date/time line under the title
    #[serde(default)]
    pub subtitle: String,
    /// Additional info lines under the subtitle
    #[serde(default)]
    pub info_lines: Vec<String>,
    /// Link rendered as the top-right QR code
    #[serde(default)]
    pub info_link: String,
    /// Event short link printed next to the map with its own QR code
    #[serde(default)]
    pub short_link: String,
    /// Address drawn bold in the list, if present
    #[serde(default)]
    pub highlight: Option<String>,
    #[serde(default)]
    pub map: MapConfig,
}

impl FlyerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(s).context("Failed to parse YAML configuration")
    }
}

/// Static-map request geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Requested map width in pixels (fetched at 2x scale)
    #[serde(default = "default_map_width")]
    pub width: u32,
    #[serde(default = "default_map_height")]
    pub height: u32,
    /// Optional "lat,lon" center; when absent the markers set the viewport
    #[serde(default)]
    pub center: Option<String>,
    #[serde(default)]
    pub zoom: Option<u32>,
    /// Pixels trimmed from the fetched (2x) image, top margin cuts the
    /// attribution strip
    #[serde(default = "default_crop_left")]
    pub crop_left: u32,
    #[serde(default = "default_crop_top")]
    pub crop_top: u32,
    #[serde(default = "default_crop_right")]
    pub crop_right: u32,
    #[serde(default = "default_crop_bottom")]
    pub crop_bottom: u32,
}

impl MapConfig {
    pub fn crop_margins(&self) -> CropMargins {
        CropMargins {
            left: self.crop_left,
            top: self.crop_top,
            right: self.crop_right,
            bottom: self.crop_bottom,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_map_width(),
            height: default_map_height(),
            center: None,
            zoom: None,
            crop_left: default_crop_left(),
            crop_top: default_crop_top(),
            crop_right: default_crop_right(),
            crop_bottom: default_crop_bottom(),
        }
    }
}

fn default_map_width() -> u32 {
    640
}

fn default_map_height() -> u32 {
    440
}

fn default_crop_left() -> u32 {
    150
}

fn default_crop_top() -> u32 {
    100
}

fn default_crop_right() -> u32 {
    150
}

fn default_crop_bottom() -> u32 {
    70
}

/// API credentials loaded from `secrets.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Secrets {
    pub api_key: String,
}

impl Secrets {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read secrets file: {}", path.display()))?;
        serde_yaml::from_str(&content).context("Failed to parse YAML secrets")
    }
}
