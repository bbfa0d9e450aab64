use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Provider slugs the collector polls. Snapshots may still contain others;
/// the report run flags those instead of rejecting them.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "cerebras",
    "cohere",
    "fal-ai",
    "featherless-ai",
    "fireworks-ai",
    "groq",
    "hf-inference",
    "hyperbolic",
    "nebius",
    "novita",
    "nscale",
    "ovhcloud",
    "publicai",
    "replicate",
    "sambanova",
    "scaleway",
    "together",
    "wavespeed",
    "zai-org",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Live,
    Error,
    Staging,
    Unknown,
}

impl EntryStatus {
    pub fn code(self) -> &'static str {
        match self {
            EntryStatus::Live => "l",
            EntryStatus::Error => "e",
            EntryStatus::Staging => "s",
            EntryStatus::Unknown => "?",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "l" => EntryStatus::Live,
            "e" => EntryStatus::Error,
            "s" => EntryStatus::Staging,
            _ => EntryStatus::Unknown,
        }
    }
}

/// One (model, provider) observation. Stored on disk as a fixed-order array;
/// `WireEntry` is that array shape, used only at the file boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireEntry", into = "WireEntry")]
pub struct SnapshotEntry {
    pub model: String,
    pub provider: String,
    pub status: EntryStatus,
    pub tokens_per_second: Option<f64>,
    pub first_token_latency_ms: Option<f64>,
    pub input_price_per_token: Option<f64>,
    pub output_price_per_token: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireEntry(
    String,
    String,
    String,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

impl From<WireEntry> for SnapshotEntry {
    fn from(wire: WireEntry) -> Self {
        Self {
            model: wire.0,
            provider: wire.1,
            status: EntryStatus::from_code(&wire.2),
            tokens_per_second: wire.3,
            first_token_latency_ms: wire.4,
            input_price_per_token: wire.5,
            output_price_per_token: wire.6,
        }
    }
}

impl From<SnapshotEntry> for WireEntry {
    fn from(entry: SnapshotEntry) -> Self {
        Self(
            entry.model,
            entry.provider,
            entry.status.code().to_string(),
            entry.tokens_per_second,
            entry.first_token_latency_ms,
            entry.input_price_per_token,
            entry.output_price_per_token,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "ts")]
    pub captured_at: DateTime<Utc>,
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(rename = "n")]
    pub entry_count: usize,
    #[serde(rename = "d")]
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| AppError::MalformedSnapshot {
            path: path.to_path_buf(),
            source,
        })
    }
}
