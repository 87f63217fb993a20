//! # Configuration Management
//!
//! Loads runtime configuration from `matrix-config.toml`: panel geometry,
//! frame pacing, the night-dimming window, and the forecast location.
//! A missing or invalid file falls back to the built-in defaults so the
//! display always comes up.

use embedded_graphics::prelude::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration loaded from matrix-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Panel geometry and render pacing
    pub display: DisplayConfig,
    /// Overnight dimming window and brightness levels
    pub night: NightConfig,
    /// Forecast location and refresh cadence
    pub weather: WeatherConfig,
}

/// Panel geometry and render pacing.
///
/// The physical display is a grid of identical modules; the logical pixel
/// size is derived, never configured directly. Buy all modules in one batch:
/// mixed controller revisions behave differently.
#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Chained module columns
    pub modules_wide: u32,
    /// Chained module rows
    pub modules_tall: u32,
    /// Pixel width of a single module
    pub module_width: u32,
    /// Pixel height of a single module
    pub module_height: u32,
    /// Render loop target frame rate
    pub target_fps: u32,
    /// Pixel height of one text band (two bands stack per 32px module)
    pub font_fit_height: u32,
    /// Seconds each pattern stays on screen before rotating
    pub pattern_seconds: f32,
}

impl DisplayConfig {
    /// Full logical pixel size across all chained modules.
    pub fn image_size(&self) -> Size {
        Size::new(
            self.modules_wide * self.module_width,
            self.modules_tall * self.module_height,
        )
    }
}

/// Overnight dimming window.
#[derive(Debug, Deserialize, Serialize)]
pub struct NightConfig {
    /// Hour (0-23) the display returns to day brightness
    pub morning_hour: u32,
    /// Hour (0-23) the display dims for the night
    pub night_hour: u32,
    /// Daytime brightness percent (0-100)
    pub day_brightness: u8,
    /// Overnight brightness percent (0-100)
    pub night_brightness: u8,
}

/// Forecast location and refresh cadence.
#[derive(Debug, Deserialize, Serialize)]
pub struct WeatherConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Minutes between forecast refresh attempts
    pub refresh_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            display: DisplayConfig {
                modules_wide: 1,
                modules_tall: 1,
                module_width: 64,
                module_height: 32,
                target_fps: 60,
                font_fit_height: 16,
                pattern_seconds: 300.0,
            },
            night: NightConfig {
                morning_hour: 6,
                night_hour: 21,
                day_brightness: 100,
                night_brightness: 40,
            },
            weather: WeatherConfig {
                // Garner, NC
                latitude: 35.71,
                longitude: -78.61,
                refresh_minutes: 30,
            },
        }
    }
}

impl Config {
    /// Load configuration from matrix-config.toml in the working directory.
    /// Falls back to the default configuration if the file doesn't exist or
    /// is invalid.
    pub fn load() -> Self {
        Self::load_from_path("matrix-config.toml")
    }

    /// Load configuration from the specified path, with the same fallback.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Invalid config file format: {}", e);
                    eprintln!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                eprintln!("Info: No config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save the current configuration to matrix-config.toml.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("matrix-config.toml", contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.display.target_fps, 60);
        assert_eq!(config.display.image_size(), Size::new(64, 32));
        assert_eq!(config.night.morning_hour, 6);
        assert_eq!(config.night.night_hour, 21);
        assert_eq!(config.weather.refresh_minutes, 30);
    }

    #[test]
    fn test_chained_modules_grow_the_image() {
        let mut config = Config::default();
        config.display.modules_wide = 3;
        config.display.modules_tall = 2;
        assert_eq!(config.display.image_size(), Size::new(192, 64));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.display.module_width, parsed.display.module_width);
        assert_eq!(config.weather.latitude, parsed.weather.latitude);
        assert_eq!(config.night.night_brightness, parsed.night.night_brightness);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.display.target_fps, 60);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix-config.toml");
        fs::write(&path, "display = \"not a table\"").unwrap();
        let config = Config::load_from_path(&path);
        assert_eq!(config.display.module_height, 32);
    }
}
