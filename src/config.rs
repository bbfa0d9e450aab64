use crate::error::AppError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SERVICE_NAME: &str = "provider-meter";

fn app_home_dir() -> Result<PathBuf, AppError> {
    if let Ok(custom) = std::env::var("PROVIDER_METER_HOME") {
        return Ok(PathBuf::from(custom));
    }

    if let Some(dirs) = ProjectDirs::from("com", "providermeter", SERVICE_NAME) {
        let candidate = dirs.data_local_dir().to_path_buf();
        if fs::create_dir_all(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    let cwd = std::env::current_dir()?;
    Ok(cwd.join(".provider-meter"))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub snapshot_dir: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
}

pub fn config_dir() -> Result<PathBuf, AppError> {
    Ok(app_home_dir()?.join("config"))
}

pub fn data_dir() -> Result<PathBuf, AppError> {
    Ok(app_home_dir()?.join("data"))
}

pub fn config_path() -> Result<PathBuf, AppError> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn default_snapshot_dir() -> Result<PathBuf, AppError> {
    Ok(data_dir()?.join("snapshots"))
}

/// CLI flag wins over config; the fallback is `<home>/data/snapshots`.
pub fn resolve_snapshot_dir(
    cfg: &AppConfig,
    override_dir: Option<PathBuf>,
) -> Result<PathBuf, AppError> {
    if let Some(dir) = override_dir {
        return Ok(dir);
    }
    match &cfg.snapshot_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_snapshot_dir(),
    }
}

/// Reports land next to the snapshots they were derived from unless
/// redirected by config or flag.
pub fn resolve_report_dir(
    cfg: &AppConfig,
    override_dir: Option<PathBuf>,
    snapshot_dir: &Path,
) -> Result<PathBuf, AppError> {
    if let Some(dir) = override_dir {
        return Ok(dir);
    }
    match &cfg.report_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(snapshot_dir.join("reports")),
    }
}

pub fn ensure_dirs() -> Result<(), AppError> {
    fs::create_dir_all(config_dir()?)?;
    fs::create_dir_all(data_dir()?)?;
    Ok(())
}

pub fn load_config() -> Result<AppConfig, AppError> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(&path)?;
    Ok(toml::from_str(&raw)?)
}

pub fn save_config(config: &AppConfig) -> Result<(), AppError> {
    ensure_dirs()?;
    let path = config_path()?;
    let raw = toml::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}

pub fn ensure_initialized() -> Result<(), AppError> {
    ensure_dirs()?;
    let cfg_path = config_path()?;
    if !Path::new(&cfg_path).exists() {
        save_config(&AppConfig::default())?;
    }
    Ok(())
}
