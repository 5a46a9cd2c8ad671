//! Configuration parsing for the dispatcher.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wbt_config::TrainerParams;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub trainer: TrainerParams,
}

/// Dispatcher-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Directory holding candidate motion `.npz` files.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Directory the trainer writes per-run directories into.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    /// Checkpoint filename whose presence marks a run as complete.
    #[serde(default = "default_checkpoint_file")]
    pub checkpoint_file: String,
    /// Directory for captured trainer stdout/stderr.
    #[serde(default = "default_dispatch_log_dir")]
    pub dispatch_log_dir: PathBuf,
    /// Worker processes spawned per GPU. More than one oversubscribes the
    /// GPU; nothing coordinates memory between them.
    #[serde(default = "default_workers_per_gpu")]
    pub workers_per_gpu: usize,
    /// Delete incomplete run directories before re-queueing their motions.
    #[serde(default)]
    pub delete_incomplete: bool,
}

fn default_root_dir() -> PathBuf {
    "./motions".into()
}

fn default_logs_dir() -> PathBuf {
    "./logs/rsl_rl/g1_flat".into()
}

fn default_checkpoint_file() -> String {
    "model_29999.pt".into()
}

fn default_dispatch_log_dir() -> PathBuf {
    "./logs/dispatch".into()
}

fn default_workers_per_gpu() -> usize {
    2
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            logs_dir: default_logs_dir(),
            checkpoint_file: default_checkpoint_file(),
            dispatch_log_dir: default_dispatch_log_dir(),
            workers_per_gpu: default_workers_per_gpu(),
            delete_incomplete: false,
        }
    }
}

impl DispatchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::debug!(
                "config file {} not found, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}
