//! Persistent cache volumes shared across pipeline runs
//!
//! Caches are keyed by a small fixed set of logical names; the same name
//! always resolves to the same engine volume, so dependency downloads and
//! Gradle state survive between invocations. Volumes are created on first
//! reference and never destroyed by the pipeline; no job may assume
//! exclusive access to one.

use std::collections::HashMap;
use std::fmt;

/// Dart/Flutter package manager cache (`~/.pub-cache`)
pub const PUB_CACHE: &str = "pub-cache";
/// Gradle build-tool state (`android/.gradle`)
pub const ANDROID_GRADLE: &str = "android-gradle";
/// Compiled-artifact cache (`build/`)
pub const ANDROID_BUILD: &str = "android-build";

/// Volume label keys used to mark pipeline-owned volumes
pub mod labels {
    /// Marks a volume as a tarmac cache
    pub const TARMAC_CACHE: &str = "io.tarmac.cache";
    /// The logical cache name
    pub const NAME: &str = "io.tarmac.cache.name";
}

/// Handle to a name-keyed persistent cache volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVolume {
    /// Logical cache name
    pub name: String,
}

impl CacheVolume {
    /// The engine-level volume name for this cache
    pub fn volume_name(&self) -> String {
        format!("tarmac-{}", self.name)
    }

    /// Labels applied when the engine creates the volume
    pub fn volume_labels(&self) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert(labels::TARMAC_CACHE.to_string(), "true".to_string());
        labels.insert(labels::NAME.to_string(), self.name.clone());
        labels
    }
}

impl fmt::Display for CacheVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Resolve a logical cache name to its persistent volume handle
///
/// Same name, same volume; the name-to-purpose mapping is fixed at design
/// time and shared by every job that references it.
pub fn volume(name: &str) -> CacheVolume {
    CacheVolume {
        name: name.to_string(),
    }
}

/// A cache volume paired with its fixed in-container mount path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMount {
    /// The persistent volume
    pub volume: CacheVolume,
    /// Mount path inside the job container
    pub container_path: String,
}

impl CacheMount {
    pub fn new(name: &str, container_path: &str) -> Self {
        Self {
            volume: volume(name),
            container_path: container_path.to_string(),
        }
    }

    /// Render the engine mount argument (`volume:path`)
    pub fn volume_arg(&self) -> String {
        format!("{}:{}", self.volume.volume_name(), self.container_path)
    }
}
