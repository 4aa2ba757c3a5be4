//! Configuration schema for Tarmac
//!
//! Configuration is stored at `~/.config/tarmac/config.toml`, optionally
//! refined by a project-local `tarmac.toml`. File values only adjust the
//! built-in default tier; explicit arguments and environment variables
//! always win (see `ResolvedConfig`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline defaults
    pub pipeline: PipelineConfig,

    /// Container engine settings
    pub engine: EngineConfig,

    /// Artifact export settings
    pub artifacts: ArtifactsConfig,
}

/// Pipeline defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Flutter toolchain version pinning the base image tag
    pub flutter_version: String,

    /// Build output type: "apk" or "appbundle"
    pub output_type: String,

    /// Build release artifacts by default
    pub release: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flutter_version: "3.13.1".to_string(),
            output_type: "apk".to_string(),
            release: true,
        }
    }
}

/// Container engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Image repository; the Flutter version becomes the tag
    pub image_repository: String,

    /// Keep job containers after completion instead of removing them
    pub keep_containers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            image_repository: "ghcr.io/cirruslabs/flutter".to_string(),
            keep_containers: false,
        }
    }
}

/// Artifact export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Host directory artifacts are exported into
    pub dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
