use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::drag::{SCROLL_INTERVAL_MS, SCROLL_STEP};
use crate::engine::geometry::ElementOptions;
use crate::engine::scale::{DEFAULT_GAP, DEFAULT_ZOOM_FACTOR};
use crate::error::{Result, TimelineError};

const CONFIG_FILE: &str = "timeline.json";

/// User-tunable settings of the timeline, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub row_height: f32,
    pub minimum_gap: f64,
    pub maximum_gap: f64,
    /// Draw baselines above the actual bar instead of below.
    pub baseline_above: bool,
    pub edit_enabled: bool,
    pub autoscroll_step: f32,
    pub autoscroll_interval_ms: u64,
    pub zoom_factor: f64,
    pub elements: ElementOptions,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            row_height: 30.0,
            minimum_gap: DEFAULT_GAP,
            maximum_gap: DEFAULT_GAP,
            baseline_above: false,
            edit_enabled: true,
            autoscroll_step: SCROLL_STEP,
            autoscroll_interval_ms: SCROLL_INTERVAL_MS,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            elements: ElementOptions::default(),
        }
    }
}

impl TimelineConfig {
    /// Where [`TimelineConfig::load`] looks for the config file.
    pub fn default_path() -> PathBuf {
        match directories::ProjectDirs::from("", "", "GanttTimeline") {
            Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
            None => PathBuf::from(".").join(CONFIG_FILE),
        }
    }

    /// Loads the user config, falling back to defaults when it is missing or
    /// cannot be parsed.
    pub fn load() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("ignoring config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| TimelineError::io(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| TimelineError::io(dir, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| TimelineError::io(path, e))
    }
}
