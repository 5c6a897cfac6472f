//! Application settings.
//!
//! Settings are read once into an immutable [`Settings`] value. Reloading
//! produces a new value; nothing is shared or mutated in place.

use crate::error::{Result, RollError, RosterError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Colour scheme for a window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    /// Follow the system setting.
    Sys,
}

/// Button style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    #[default]
    Classic,
    Retro,
    Modern,
    Tech,
}

/// Theme section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    /// Main window theme.
    pub main: ThemeMode,
    /// Compact always-on-top window theme.
    pub simple: ThemeMode,
    pub style: ButtonStyle,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            main: ThemeMode::Light,
            simple: ThemeMode::Dark,
            style: ButtonStyle::Classic,
        }
    }
}

/// Compact window section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleModeSettings {
    pub width: u32,
    pub height: u32,
    /// Background alpha, 0-255.
    pub opacity: u8,
    pub bg_color: String,
}

impl Default for SimpleModeSettings {
    fn default() -> Self {
        Self {
            width: 320,
            height: 220,
            opacity: 200,
            bg_color: "#323232".to_string(),
        }
    }
}

/// Roll timing, in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollConfig {
    /// Delay before the first tick.
    pub min_speed: u64,
    /// Delay at which the roll stops.
    pub max_speed: u64,
    /// Added to the delay after every tick.
    pub step: u64,
    /// Nominal roll length shown by front ends. Termination depends on
    /// the speeds only.
    pub duration: u64,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            min_speed: 50,
            max_speed: 200,
            step: 10,
            duration: 3000,
        }
    }
}

impl RollConfig {
    /// Reject timings that would never terminate or never tick.
    pub fn validate(&self) -> std::result::Result<(), RollError> {
        if self.step == 0 {
            return Err(RollError::InvalidConfig("step must be positive".into()));
        }
        if self.min_speed == 0 {
            return Err(RollError::InvalidConfig("min_speed must be positive".into()));
        }
        Ok(())
    }

    /// Number of ticks a roll takes, the final one included.
    pub fn expected_ticks(&self) -> u64 {
        if self.min_speed >= self.max_speed {
            1
        } else {
            (self.max_speed - self.min_speed).div_ceil(self.step.max(1)) + 1
        }
    }
}

/// All user settings, as stored in `config.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: ThemeSettings,
    pub simple_mode: SimpleModeSettings,
    pub random: RollConfig,
}

impl Settings {
    /// Load settings, failing on a missing, malformed or invalid file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let settings: Settings = serde_json::from_slice(&bytes)
            .map_err(|e| RosterError::InvalidConfig(e.to_string()))?;
        settings
            .random
            .validate()
            .map_err(|e| RosterError::InvalidConfig(e.to_string()))?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unusable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No settings file, using defaults");
            return Self::default();
        }

        match Self::load(path) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "Loaded settings");
                settings
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring settings file");
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.theme.main, ThemeMode::Light);
        assert_eq!(settings.theme.simple, ThemeMode::Dark);
        assert_eq!(settings.random.min_speed, 50);
        assert_eq!(settings.random.max_speed, 200);
        assert_eq!(settings.random.step, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"theme": {"main": "dark", "style": "tech"}, "random": {"max_speed": 400}}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.theme.main, ThemeMode::Dark);
        assert_eq!(settings.theme.simple, ThemeMode::Dark);
        assert_eq!(settings.theme.style, ButtonStyle::Tech);
        assert_eq!(settings.random.min_speed, 50);
        assert_eq!(settings.random.max_speed, 400);
        assert_eq!(settings.simple_mode, SimpleModeSettings::default());
    }

    #[test]
    fn test_invalid_roll_config_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"random": {"step": 0}}"#).unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(RosterError::InvalidConfig(_))
        ));
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(Settings::load_or_default(&path), Settings::default());
        assert_eq!(
            Settings::load_or_default(dir.path().join("missing.json")),
            Settings::default()
        );
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut settings = Settings::default();
        settings.theme.style = ButtonStyle::Retro;
        settings.random.max_speed = 500;
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_expected_ticks() {
        assert_eq!(RollConfig::default().expected_ticks(), 16);

        let uneven = RollConfig {
            min_speed: 50,
            max_speed: 200,
            step: 7,
            ..Default::default()
        };
        assert_eq!(uneven.expected_ticks(), 23);

        let inverted = RollConfig {
            min_speed: 300,
            max_speed: 200,
            ..Default::default()
        };
        assert_eq!(inverted.expected_ticks(), 1);
    }
}
