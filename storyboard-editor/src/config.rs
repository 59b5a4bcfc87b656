//! Service endpoint resolution for storyboard-editor
//!
//! Base URLs resolve with ENV → TOML → compiled default priority.

use storyboard_common::config::TomlConfig;
use tracing::{info, warn};

pub const SPLITTER_URL_ENV: &str = "STORYBOARD_SPLITTER_URL";
pub const IMAGE_URL_ENV: &str = "STORYBOARD_IMAGE_URL";

pub const DEFAULT_SPLITTER_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_IMAGE_URL: &str = "http://localhost:8001";

/// Resolved base URLs of the remote collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub scene_splitter_url: String,
    pub image_generator_url: String,
}

impl ServiceEndpoints {
    pub fn resolve(toml_config: &TomlConfig) -> Self {
        Self {
            scene_splitter_url: resolve_url(
                "scene splitter",
                SPLITTER_URL_ENV,
                toml_config.services.scene_splitter_url.as_deref(),
                DEFAULT_SPLITTER_URL,
            ),
            image_generator_url: resolve_url(
                "image generator",
                IMAGE_URL_ENV,
                toml_config.services.image_generator_url.as_deref(),
                DEFAULT_IMAGE_URL,
            ),
        }
    }
}

/// Resolve one URL from environment, TOML or default
pub fn resolve_url(
    service: &str,
    env_var: &str,
    toml_value: Option<&str>,
    default: &str,
) -> String {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_url(v));
    let toml_value = toml_value.filter(|v| is_valid_url(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} URL set in both environment and TOML; using environment",
            service
        );
    }

    if let Some(url) = env_value {
        info!(service, url = %url, "Service URL loaded from environment variable");
        return url;
    }
    if let Some(url) = toml_value {
        info!(service, url = %url, "Service URL loaded from TOML config");
        return url.to_string();
    }
    default.to_string()
}

/// Non-empty, non-whitespace
pub fn is_valid_url(url: &str) -> bool {
    !url.trim().is_empty()
}
