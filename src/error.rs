//! Error types for Tarmac
//!
//! All modules use `TarmacResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Tarmac operations
pub type TarmacResult<T> = Result<T, TarmacError>;

/// All errors that can occur in Tarmac
#[derive(Error, Debug)]
pub enum TarmacError {
    // Environment errors
    #[error("Podman not found. Install it with your package manager, e.g.: dnf install podman")]
    PodmanNotFound,

    #[error("Podman rootless setup incomplete: {reason}")]
    PodmanRootlessSetup { reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown build output type: {0}. Expected \"apk\" or \"appbundle\"")]
    UnknownOutputType(String),

    // Context errors
    #[error("Source context not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Invalid source context {path}: {reason}")]
    ContextInvalid { path: PathBuf, reason: String },

    // Job errors
    #[error("Unknown job: {0}. Run `tarmac jobs` to list available jobs")]
    UnknownJob(String),

    #[error("Failed to install {tool} in container: {reason}")]
    ToolInstall { tool: String, reason: String },

    #[error("Step `{step}` failed with exit code {code}")]
    StepFailed { step: String, code: i32 },

    #[error("Test run failed with exit code {code}; exported reports are available for inspection")]
    TestsFailed { code: i32 },

    // Artifact errors
    #[error("Declared output {path} missing after job `{job}` completed")]
    ArtifactMissing { job: String, path: String },

    #[error("Failed to export {path}: {reason}")]
    ExportFailed { path: String, reason: String },

    // Container errors
    #[error("Container failed to start: {0}")]
    ContainerStart(String),

    #[error("Image pull failed: {image}: {reason}")]
    ImagePull { image: String, reason: String },

    #[error("Failed to create cache volume {name}: {reason}")]
    CacheVolumeCreate { name: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TarmacError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PodmanNotFound => Some("Install podman, then run: tarmac status"),
            Self::PodmanRootlessSetup { .. } => Some("Run: podman system migrate"),
            Self::UnknownJob(_) => Some("Run: tarmac jobs"),
            Self::UnknownOutputType(_) => Some("Pass --output-type apk or --output-type appbundle"),
            _ => None,
        }
    }
}
