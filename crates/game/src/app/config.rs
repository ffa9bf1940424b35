use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::{EngineSettings, LoopConfig, RoomSettings};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path} at {at}: {source}")]
    Parse {
        path: PathBuf,
        at: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config {path}: {field} {message}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tilerun".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Contents of `assets/game.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) window: WindowConfig,
    pub(crate) max_render_fps: Option<u32>,
    pub(crate) gravity: f32,
    pub(crate) player_lifetime_seconds: f32,
    pub(crate) intro_seconds: f32,
    pub(crate) credits_seconds: f32,
    pub(crate) show_minimap: bool,
    /// File names under `assets/levels`, played in order.
    pub(crate) levels: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let room = RoomSettings::default();
        let engine = EngineSettings::default();
        Self {
            window: WindowConfig::default(),
            max_render_fps: Some(60),
            gravity: room.gravity,
            player_lifetime_seconds: room.player_lifetime.as_secs_f32(),
            intro_seconds: engine.intro_duration.as_secs_f32(),
            credits_seconds: engine.credits_duration.as_secs_f32(),
            show_minimap: engine.show_minimap,
            levels: Vec::new(),
        }
    }
}

impl GameConfig {
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(path, &raw)?;
        config.validate(path)?;
        Ok(config)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let at = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                at: if at.is_empty() { ".".to_string() } else { at },
                source: error.into_inner(),
            }
        })
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, message: &str| ConfigError::Invalid {
            path: path.to_path_buf(),
            field,
            message: message.to_string(),
        };
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window", "must have a non-zero size"));
        }
        if !self.gravity.is_finite() || self.gravity <= 0.0 {
            return Err(invalid("gravity", "must be a positive number"));
        }
        if !self.player_lifetime_seconds.is_finite() || self.player_lifetime_seconds <= 0.0 {
            return Err(invalid("player_lifetime_seconds", "must be a positive number"));
        }
        for (field, value) in [
            ("intro_seconds", self.intro_seconds),
            ("credits_seconds", self.credits_seconds),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must not be negative"));
            }
        }
        if self.levels.is_empty() {
            return Err(invalid("levels", "must list at least one level file"));
        }
        if let Some(name) = self.levels.iter().find(|name| name.trim().is_empty()) {
            return Err(invalid("levels", &format!("contains a blank entry {name:?}")));
        }
        Ok(())
    }

    pub(crate) fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            room: RoomSettings {
                gravity: self.gravity,
                player_lifetime: Duration::from_secs_f32(self.player_lifetime_seconds),
            },
            intro_duration: Duration::from_secs_f32(self.intro_seconds),
            credits_duration: Duration::from_secs_f32(self.credits_seconds),
            show_minimap: self.show_minimap,
        }
    }

    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.window.title.clone(),
            window_width: self.window.width,
            window_height: self.window.height,
            max_render_fps: self.max_render_fps,
            ..LoopConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(raw: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("game.json");
        fs::write(&path, raw).expect("write config");
        (dir, path)
    }

    #[test]
    fn loads_full_config() {
        let (_dir, path) = write_config(
            r#"{
                "window": { "title": "Test", "width": 640, "height": 480 },
                "max_render_fps": 30,
                "gravity": 0.5,
                "player_lifetime_seconds": 12.5,
                "intro_seconds": 1.0,
                "credits_seconds": 2.0,
                "show_minimap": true,
                "levels": ["a.tmx", "b.tmx"]
            }"#,
        );
        let config = GameConfig::load(&path).expect("config");

        assert_eq!(config.window.title, "Test");
        assert_eq!(config.levels, vec!["a.tmx".to_string(), "b.tmx".to_string()]);
        let settings = config.engine_settings();
        assert_eq!(settings.room.gravity, 0.5);
        assert_eq!(settings.room.player_lifetime, Duration::from_millis(12_500));
        assert_eq!(settings.intro_duration, Duration::from_secs(1));
        assert!(settings.show_minimap);
        let loop_config = config.loop_config();
        assert_eq!(loop_config.window_width, 640);
        assert_eq!(loop_config.max_render_fps, Some(30));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let (_dir, path) = write_config(r#"{ "levels": ["only.tmx"] }"#);
        let config = GameConfig::load(&path).expect("config");
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.engine_settings(), EngineSettings::default());
    }

    #[test]
    fn parse_error_reports_json_path() {
        let (_dir, path) =
            write_config(r#"{ "window": { "title": "x", "width": "wide", "height": 1 } }"#);
        let err = GameConfig::load(&path).expect_err("bad width");
        match err {
            ConfigError::Parse { at, .. } => assert_eq!(at, "window.width"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let (_dir, path) = write_config(r#"{ "levels": ["a.tmx"], "gravityy": 1.0 }"#);
        assert!(matches!(
            GameConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn empty_level_list_is_invalid() {
        let (_dir, path) = write_config(r#"{ "levels": [] }"#);
        match GameConfig::load(&path).expect_err("no levels") {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "levels"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_positive_gravity_is_invalid() {
        let (_dir, path) = write_config(r#"{ "levels": ["a.tmx"], "gravity": 0.0 }"#);
        match GameConfig::load(&path).expect_err("zero gravity") {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "gravity"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            GameConfig::load(&dir.path().join("absent.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
