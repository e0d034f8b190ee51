use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::content::{ContentError, RoomCatalog};
use super::gameplay::{self, LevelError};
use super::settings::{self, GameSettings, SettingsError};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("invalid starting level: {0}")]
    Level(#[from] LevelError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Escape Room Startup ===");

    let paths = resolve_app_paths()?;
    let loaded = settings::load_settings(&paths.root)?;
    info!(
        root = %paths.root.display(),
        settings = %loaded
            .source
            .as_deref()
            .map_or_else(|| "defaults".to_string(), |path| path.display().to_string()),
        "settings_loaded"
    );
    let settings = loaded.settings;

    let catalog = match &settings.rooms_file {
        Some(file) => RoomCatalog::load(&paths.root.join(file))?,
        None => RoomCatalog::builtin()?,
    };
    info!(rooms = catalog.len(), "room_catalog_loaded");

    let config = loop_config(&settings, paths.sprites_dir);
    let scene = gameplay::build_scene(catalog, &settings, config.logical_viewport())?;

    Ok(AppWiring { config, scene })
}

fn loop_config(settings: &GameSettings, sprites_dir: std::path::PathBuf) -> LoopConfig {
    LoopConfig {
        window_title: settings.window_title.clone(),
        window_width: settings.window_width,
        window_height: settings.window_height,
        target_tps: settings.target_tps,
        max_render_fps: settings.max_render_fps,
        sprites_dir,
        ..LoopConfig::default()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn loop_config_takes_window_settings_and_keeps_loop_defaults() {
        let settings = GameSettings {
            window_title: "Attic".to_string(),
            window_width: 800,
            window_height: 450,
            target_tps: 30,
            max_render_fps: Some(120),
            ..GameSettings::default()
        };
        let config = loop_config(&settings, PathBuf::from("/tmp/sprites"));

        assert_eq!(config.window_title, "Attic");
        assert_eq!((config.window_width, config.window_height), (800, 450));
        assert_eq!(config.target_tps, 30);
        assert_eq!(config.max_render_fps, Some(120));
        assert_eq!(config.sprites_dir, PathBuf::from("/tmp/sprites"));
        assert_eq!(config.max_ticks_per_frame, LoopConfig::default().max_ticks_per_frame);
        assert_eq!((config.logical_width, config.logical_height), (1920, 1080));
    }

    #[test]
    fn out_of_range_start_level_fails_scene_construction() {
        let settings = GameSettings {
            start_level: 9,
            ..GameSettings::default()
        };
        let catalog = RoomCatalog::builtin().expect("builtin rooms");
        let config = loop_config(&settings, PathBuf::from("sprites"));

        let error = gameplay::build_scene(catalog, &settings, config.logical_viewport())
            .err()
            .expect("unknown level");
        assert_eq!(error, LevelError::UnknownLevel { level_id: 9 });
    }
}
