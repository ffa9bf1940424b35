use std::path::PathBuf;

use engine::{resolve_app_paths, Engine, LoopConfig, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::catalog::LevelCatalog;
use super::config::{ConfigError, GameConfig};

const HEADLESS_FLAG: &str = "--headless";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunMode {
    Windowed,
    Headless { frames: u64 },
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("level file not found: {0}")]
    MissingLevel(PathBuf),
    #[error("invalid arguments: {0}")]
    Arguments(String),
}

pub(crate) struct AppWiring {
    pub(crate) mode: RunMode,
    pub(crate) config: LoopConfig,
    pub(crate) engine: Engine,
}

pub(crate) fn build_app(
    args: impl IntoIterator<Item = String>,
) -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Tilerun Startup ===");

    let mode = parse_run_mode(args)?;
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        levels_dir = %app_paths.levels_dir.display(),
        config = %app_paths.config_path.display(),
        "startup"
    );

    let game_config = GameConfig::load(&app_paths.config_path)?;
    let catalog = LevelCatalog::new(&app_paths.levels_dir, &game_config.levels);
    if let Some(missing) = catalog.missing_files().into_iter().next() {
        return Err(BootstrapError::MissingLevel(missing));
    }
    info!(levels = catalog.len(), mode = ?mode, "level_catalog_ready");

    let engine = Engine::new(Box::new(catalog), game_config.engine_settings());
    Ok(AppWiring {
        mode,
        config: game_config.loop_config(),
        engine,
    })
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

fn parse_run_mode(args: impl IntoIterator<Item = String>) -> Result<RunMode, BootstrapError> {
    let mut args = args.into_iter();
    let mut mode = RunMode::Windowed;
    while let Some(arg) = args.next() {
        if arg != HEADLESS_FLAG {
            return Err(BootstrapError::Arguments(format!("unknown argument '{arg}'")));
        }
        let frames = args.next().ok_or_else(|| {
            BootstrapError::Arguments(format!("{HEADLESS_FLAG} needs a frame count"))
        })?;
        let frames = frames.parse::<u64>().map_err(|_| {
            BootstrapError::Arguments(format!(
                "{HEADLESS_FLAG} frame count '{frames}' is not a number"
            ))
        })?;
        mode = RunMode::Headless { frames };
    }
    Ok(mode)
}
