use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub(crate) const SETTINGS_ENV_VAR: &str = "ESCAPE_ROOM_SETTINGS";
pub(crate) const SETTINGS_FILE_NAME: &str = "escape_room.json";

/// Tunables for one run. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameSettings {
    pub(crate) window_title: String,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) target_tps: u32,
    pub(crate) max_render_fps: Option<u32>,
    pub(crate) start_level: u32,
    pub(crate) interact_cooldown_secs: f64,
    pub(crate) hint_delay_secs: f64,
    pub(crate) message_duration_secs: f32,
    pub(crate) message_size: u16,
    pub(crate) player_speed_px: i32,
    pub(crate) walk_top_limit_px: i32,
    /// Relative paths resolve against the project root.
    pub(crate) rooms_file: Option<PathBuf>,
    pub(crate) rng_seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            window_title: "Escape Room".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_render_fps: None,
            start_level: 1,
            interact_cooldown_secs: 0.5,
            hint_delay_secs: 10.0,
            message_duration_secs: 2.0,
            message_size: 32,
            player_speed_px: 10,
            walk_top_limit_px: 200,
            rooms_file: None,
            rng_seed: None,
        }
    }
}

impl GameSettings {
    fn validate(&self, path: &Path) -> Result<(), SettingsError> {
        let invalid = |field: &'static str, reason: &str| SettingsError::Invalid {
            path: path.to_path_buf(),
            field,
            reason: reason.to_string(),
        };
        if self.target_tps == 0 {
            return Err(invalid("target_tps", "must be at least 1"));
        }
        if self.start_level == 0 {
            return Err(invalid("start_level", "levels are numbered from 1"));
        }
        if self.player_speed_px <= 0 {
            return Err(invalid("player_speed_px", "must be positive"));
        }
        if !(self.message_duration_secs.is_finite() && self.message_duration_secs > 0.0) {
            return Err(invalid("message_duration_secs", "must be a positive number"));
        }
        if !(self.interact_cooldown_secs.is_finite() && self.interact_cooldown_secs >= 0.0) {
            return Err(invalid("interact_cooldown_secs", "must not be negative"));
        }
        if !(self.hint_delay_secs.is_finite() && self.hint_delay_secs >= 0.0) {
            return Err(invalid("hint_delay_secs", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path} at `{json_path}`: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid settings file {path}: `{field}` {reason}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        reason: String,
    },
}

/// Settings plus the file they came from, if any.
#[derive(Debug, Clone)]
pub(crate) struct LoadedSettings {
    pub(crate) settings: GameSettings,
    pub(crate) source: Option<PathBuf>,
}

pub(crate) fn load_settings(root: &Path) -> Result<LoadedSettings, SettingsError> {
    let Some(path) = settings_path(env::var_os(SETTINGS_ENV_VAR), root) else {
        return Ok(LoadedSettings {
            settings: GameSettings::default(),
            source: None,
        });
    };
    let settings = load_settings_file(&path)?;
    Ok(LoadedSettings {
        settings,
        source: Some(path),
    })
}

/// An explicit env path always wins, even when the file is missing.
fn settings_path(env_value: Option<OsString>, root: &Path) -> Option<PathBuf> {
    if let Some(value) = env_value.filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(value));
    }
    let default_path = root.join(SETTINGS_FILE_NAME);
    default_path.is_file().then_some(default_path)
}

pub(crate) fn load_settings_file(path: &Path) -> Result<GameSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&raw, path)
}

fn parse_settings(raw: &str, path: &Path) -> Result<GameSettings, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let settings: GameSettings =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            SettingsError::Parse {
                path: path.to_path_buf(),
                json_path: error.path().to_string(),
                source: error.into_inner(),
            }
        })?;
    settings.validate(path)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<GameSettings, SettingsError> {
        parse_settings(raw, Path::new("test.json"))
    }

    #[test]
    fn empty_object_yields_defaults() {
        let settings = parse("{}").expect("parse");
        assert_eq!(settings, GameSettings::default());
        assert_eq!(settings.interact_cooldown_secs, 0.5);
        assert_eq!(settings.hint_delay_secs, 10.0);
        assert_eq!(settings.player_speed_px, 10);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let settings = parse(r#"{ "start_level": 3, "rng_seed": 42, "rooms_file": "rooms.xml" }"#)
            .expect("parse");
        assert_eq!(settings.start_level, 3);
        assert_eq!(settings.rng_seed, Some(42));
        assert_eq!(settings.rooms_file, Some(PathBuf::from("rooms.xml")));
        assert_eq!(settings.window_title, "Escape Room");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let error = parse(r#"{ "start_levle": 2 }"#).expect_err("unknown field");
        assert!(matches!(error, SettingsError::Parse { .. }));
        assert!(error.to_string().contains("start_levle"));
    }

    #[test]
    fn type_error_reports_json_path() {
        let error = parse(r#"{ "message_size": "big" }"#).expect_err("type error");
        match error {
            SettingsError::Parse { json_path, .. } => assert_eq!(json_path, "message_size"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_start_level_is_invalid() {
        let error = parse(r#"{ "start_level": 0 }"#).expect_err("invalid");
        assert!(matches!(
            error,
            SettingsError::Invalid {
                field: "start_level",
                ..
            }
        ));
    }

    #[test]
    fn default_file_under_root_is_picked_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(settings_path(None, dir.path()), None);

        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{ "hint_delay_secs": 3.5 }"#).expect("write");
        assert_eq!(settings_path(None, dir.path()), Some(path.clone()));

        let settings = load_settings_file(&path).expect("load");
        assert_eq!(settings.hint_delay_secs, 3.5);
    }

    #[test]
    fn env_path_wins_over_root_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(SETTINGS_FILE_NAME), "{}").expect("write");
        let custom = dir.path().join("custom.json");

        let picked = settings_path(Some(custom.clone().into_os_string()), dir.path());
        assert_eq!(picked, Some(custom.clone()));

        let error = load_settings_file(&custom).expect_err("missing file");
        assert!(matches!(error, SettingsError::Read { .. }));
    }
}
