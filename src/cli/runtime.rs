use std::path::{Path, PathBuf};

use agent_core::PilotConfig;
use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Project-local config, relative to the working directory.
pub const LOCAL_CONFIG: &str = "config/pagepilot.yaml";

pub fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.context("Failed to install tracing subscriber")?;

    Ok(())
}

pub struct LoadedConfig {
    pub config: PilotConfig,
    /// `None` when no file was found and defaults are in use
    pub path: Option<PathBuf>,
}

/// Pick the config file: explicit path, then `./config/pagepilot.yaml`,
/// then `<config dir>/pagepilot/config.yaml`.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    working_dir: &Path,
    user_config_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = working_dir.join(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }
    user_config_dir
        .map(|dir| dir.join("pagepilot").join("config.yaml"))
        .filter(|path| path.exists())
}

pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let working_dir = std::env::current_dir().context("Failed to read working directory")?;
    let Some(path) = resolve_config_path(explicit, &working_dir, dirs::config_dir()) else {
        warn!("Config file not found, using defaults");
        return Ok(LoadedConfig {
            config: PilotConfig::default(),
            path: None,
        });
    };

    let config = PilotConfig::load(&path)
        .with_context(|| format!("Failed to load config file {}", path.display()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(LoadedConfig {
        config,
        path: Some(path),
    })
}
