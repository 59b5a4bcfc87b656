//! Configuration loading and config file resolution
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `STORYBOARD_CONFIG` environment variable
//! 3. `<config_dir>/storyboard/storyboard.toml` when it exists
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable config file never aborts startup: the loader logs a
//! warning and falls back to compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "STORYBOARD_CONFIG";

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "storyboard.toml";

/// Complete TOML configuration
///
/// Every section is optional in the file; absent keys take compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Remote collaborator endpoints
    pub services: ServicesConfig,
    /// Direct (simulated) generation settings
    pub generation: GenerationConfig,
    /// Remote image polling settings
    pub polling: PollingConfig,
    /// Scene review settings
    pub review: ReviewConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Base URLs of the remote collaborators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Scene splitter API base URL (documents, jobs, scenes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_splitter_url: Option<String>,
    /// Image generator base URL (generated scene images)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_generator_url: Option<String>,
}

/// Direct generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on concurrently generating scenes
    pub max_parallel: usize,
    /// Lower bound of the simulated per-scene latency
    pub min_latency_ms: u64,
    /// Upper bound of the simulated per-scene latency
    pub max_latency_ms: u64,
    /// Scenes whose number is a multiple of this value fail (0 disables)
    pub fail_every: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_parallel: 3,
            min_latency_ms: 1200,
            max_latency_ms: 3600,
            fail_every: 7,
        }
    }
}

/// Remote image polling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between poll passes
    pub interval_ms: u64,
    /// Upper bound on concurrent image fetches within one pass
    pub concurrency: usize,
    /// Requested lifetime of signed image URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_expires_seconds: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            concurrency: 4,
            image_expires_seconds: None,
        }
    }
}

/// Scene review settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Scenes with fewer sentences than this are queued for merging
    pub short_scene_threshold: usize,
    /// Scenes per page in the projected list
    pub page_size: usize,
    /// Scene count requested when segmenting a local story
    pub target_scene_count: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            short_scene_threshold: 3,
            page_size: 8,
            target_scene_count: 12,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Platform config file location (`~/.config/storyboard/storyboard.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("storyboard").join(CONFIG_FILE_NAME))
}

/// Resolve which config file to read, if any
///
/// CLI argument and environment variable are returned even when the file does
/// not exist so the loader can warn about it; the platform default is only
/// returned when present.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration with graceful degradation
///
/// Never fails: unreadable or malformed files produce a warning and defaults.
pub fn load_config(cli_arg: Option<&Path>) -> TomlConfig {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using compiled defaults");
        return TomlConfig::default();
    };

    match load_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Config file {} unusable ({}), using compiled defaults", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
