use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid week '{0}' (expected YYYY-Wnn)")]
    InvalidWeek(String),

    #[error("insufficient snapshots: {0}")]
    InsufficientData(String),

    #[error("malformed snapshot {path}: {source}")]
    MalformedSnapshot {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}
