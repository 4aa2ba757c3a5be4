//! Configuration management for Tarmac
//!
//! Per-job settings resolve through a fixed precedence, applied identically
//! for every job: explicit caller argument, then process environment, then
//! default (config file value, else built-in). Resolution happens once per
//! invocation; jobs receive a `ResolvedConfig` value and never read the
//! environment themselves.

pub mod schema;

pub use schema::Config;

use crate::error::{TarmacError, TarmacResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment override for the Flutter toolchain version
pub const FLUTTER_VERSION_ENV: &str = "FLUTTER_VERSION";
/// Environment override for the build output type
pub const BUILD_OUTPUT_TYPE_ENV: &str = "BUILD_OUTPUT_TYPE";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tarmac")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from(".tarmac"))
            .join("tarmac")
    }

    /// Directory holding materialized job contexts
    pub fn contexts_dir() -> PathBuf {
        Self::state_dir().join("contexts")
    }

    /// Find a project-local `tarmac.toml`, walking up from `start`
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            let candidate = d.join("tarmac.toml");
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = d.parent();
        }
        None
    }

    /// Load configuration, preferring a project-local file over the global one
    ///
    /// A missing file is not an error; built-in defaults apply.
    pub async fn load(&self, local: Option<&Path>) -> TarmacResult<Config> {
        if let Some(path) = local {
            debug!("Loading local config: {}", path.display());
            return self.load_from_file(path).await;
        }

        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> TarmacResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| TarmacError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| TarmacError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> TarmacResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            TarmacError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> TarmacResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TarmacError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure all state directories exist
    pub async fn ensure_state_dirs() -> TarmacResult<()> {
        let dirs = [Self::state_dir(), Self::contexts_dir()];

        for dir in &dirs {
            fs::create_dir_all(dir).await.map_err(|e| {
                TarmacError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit caller-supplied settings, usually from CLI flags
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub flutter_version: Option<String>,
    pub output_type: Option<String>,
    pub release: Option<bool>,
    pub artifacts_dir: Option<PathBuf>,
    pub keep_containers: bool,
}

/// Settings a job receives, fully resolved
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Flutter toolchain version, also the image tag
    pub flutter_version: String,
    /// Requested build output type (parsed by the build job)
    pub output_type: String,
    /// Build release artifacts
    pub release: bool,
    /// Image repository the version tag is appended to
    pub image_repository: String,
    /// Host directory artifacts are exported into
    pub artifacts_dir: PathBuf,
    /// Keep job containers after completion
    pub keep_containers: bool,
}

impl ResolvedConfig {
    /// Apply the precedence explicit > environment > default
    pub fn resolve(overrides: &Overrides, config: &Config) -> Self {
        let flutter_version = resolve_setting(
            overrides.flutter_version.clone(),
            FLUTTER_VERSION_ENV,
            &config.pipeline.flutter_version,
        );
        let output_type = resolve_setting(
            overrides.output_type.clone(),
            BUILD_OUTPUT_TYPE_ENV,
            &config.pipeline.output_type,
        );

        Self {
            flutter_version,
            output_type,
            release: overrides.release.unwrap_or(config.pipeline.release),
            image_repository: config.engine.image_repository.clone(),
            artifacts_dir: overrides
                .artifacts_dir
                .clone()
                .unwrap_or_else(|| config.artifacts.dir.clone()),
            keep_containers: overrides.keep_containers || config.engine.keep_containers,
        }
    }

    /// The pinned base image for job containers
    pub fn image(&self) -> String {
        format!("{}:{}", self.image_repository, self.flutter_version)
    }
}

/// One setting through the precedence chain
fn resolve_setting(explicit: Option<String>, env_key: &str, default: &str) -> String {
    if let Some(value) = explicit {
        return value;
    }
    if let Ok(value) = std::env::var(env_key) {
        if !value.is_empty() {
            return value;
        }
    }
    default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load(None).await.unwrap();
        assert_eq!(config.pipeline.flutter_version, "3.13.1");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.pipeline.flutter_version = "3.16.0".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load(None).await.unwrap();

        assert_eq!(loaded.pipeline.flutter_version, "3.16.0");
    }

    #[tokio::test]
    async fn local_config_preferred() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        let local = temp.path().join("tarmac.toml");
        tokio::fs::write(&global, "[pipeline]\nflutter_version = \"3.10.0\"\n")
            .await
            .unwrap();
        tokio::fs::write(&local, "[pipeline]\nflutter_version = \"3.16.0\"\n")
            .await
            .unwrap();

        let manager = ConfigManager::with_path(global);
        let config = manager.load(Some(&local)).await.unwrap();
        assert_eq!(config.pipeline.flutter_version, "3.16.0");
    }

    #[test]
    fn find_local_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("app").join("lib");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("tarmac.toml"), "").unwrap();

        let found = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(found, temp.path().join("tarmac.toml"));
    }

    #[test]
    #[serial]
    fn env_overrides_default() {
        std::env::remove_var(FLUTTER_VERSION_ENV);
        let config = Config::default();
        let resolved = ResolvedConfig::resolve(&Overrides::default(), &config);
        assert_eq!(resolved.flutter_version, "3.13.1");

        std::env::set_var(FLUTTER_VERSION_ENV, "3.16.0");
        let resolved = ResolvedConfig::resolve(&Overrides::default(), &config);
        assert_eq!(resolved.flutter_version, "3.16.0");

        std::env::remove_var(FLUTTER_VERSION_ENV);
    }

    #[test]
    #[serial]
    fn explicit_overrides_env() {
        std::env::set_var(FLUTTER_VERSION_ENV, "3.16.0");
        let config = Config::default();
        let overrides = Overrides {
            flutter_version: Some("3.19.2".to_string()),
            ..Overrides::default()
        };

        let resolved = ResolvedConfig::resolve(&overrides, &config);
        assert_eq!(resolved.flutter_version, "3.19.2");

        std::env::remove_var(FLUTTER_VERSION_ENV);
    }

    #[test]
    #[serial]
    fn output_type_precedence() {
        std::env::remove_var(BUILD_OUTPUT_TYPE_ENV);
        let config = Config::default();

        let resolved = ResolvedConfig::resolve(&Overrides::default(), &config);
        assert_eq!(resolved.output_type, "apk");

        std::env::set_var(BUILD_OUTPUT_TYPE_ENV, "appbundle");
        let resolved = ResolvedConfig::resolve(&Overrides::default(), &config);
        assert_eq!(resolved.output_type, "appbundle");

        let overrides = Overrides {
            output_type: Some("apk".to_string()),
            ..Overrides::default()
        };
        let resolved = ResolvedConfig::resolve(&overrides, &config);
        assert_eq!(resolved.output_type, "apk");

        std::env::remove_var(BUILD_OUTPUT_TYPE_ENV);
    }

    #[test]
    #[serial]
    fn image_combines_repository_and_version() {
        std::env::remove_var(FLUTTER_VERSION_ENV);
        let config = Config::default();
        let resolved = ResolvedConfig::resolve(&Overrides::default(), &config);
        assert_eq!(resolved.image(), "ghcr.io/cirruslabs/flutter:3.13.1");
    }
}
