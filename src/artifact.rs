//! Artifact identity and export records
//!
//! Every job produces exactly one primary artifact. An artifact exists in two
//! representations derived from the same bytes: an exported copy on the host
//! and an opaque content identity usable by downstream consumers without
//! re-reading the export.

use crate::error::{TarmacError, TarmacResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Opaque stable reference to a job output
///
/// `sha256:<hex>` for files and directories, `container:<id>` for the
/// dev job's prepared environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Identity of a container environment rather than a filesystem object
    pub fn container(id: &str) -> Self {
        Self(format!("container:{id}"))
    }

    fn sha256(digest: &[u8]) -> Self {
        Self(format!("sha256:{}", hex::encode(digest)))
    }

    /// The underlying reference string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The result of extracting a job's declared output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Content identity of the primary output
    pub id: ArtifactId,
    /// Host paths the output was exported to (empty for the dev environment)
    pub exported: Vec<PathBuf>,
}

impl Artifact {
    /// An artifact with no host export (the dev job's environment)
    pub fn environment(container_id: &str) -> Self {
        Self {
            id: ArtifactId::container(container_id),
            exported: Vec::new(),
        }
    }
}

/// Compute the content identity of an exported file or directory
///
/// Directories hash the sorted sequence of (relative path, content hash)
/// pairs so the identity is independent of traversal order.
pub fn content_id(path: &Path) -> TarmacResult<ArtifactId> {
    let meta = fs::metadata(path)
        .map_err(|e| TarmacError::io(format!("reading metadata for {}", path.display()), e))?;

    if meta.is_dir() {
        let mut hasher = Sha256::new();
        let mut entries = Vec::new();
        collect_files(path, path, &mut entries)?;
        entries.sort();
        for rel in entries {
            hasher.update(rel.as_bytes());
            hasher.update([0u8]);
            let digest = hash_file(&path.join(&rel))?;
            hasher.update(digest);
        }
        Ok(ArtifactId::sha256(&hasher.finalize()))
    } else {
        Ok(ArtifactId::sha256(&hash_file(path)?))
    }
}

fn hash_file(path: &Path) -> TarmacResult<[u8; 32]> {
    let contents = fs::read(path)
        .map_err(|e| TarmacError::io(format!("reading {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hasher.finalize().into())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> TarmacResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| TarmacError::io(format!("reading directory {}", dir.display()), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| TarmacError::io("reading directory entry", e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel = path
                .strip_prefix(root)
                .map_err(|_| TarmacError::Internal("path outside artifact root".to_string()))?;
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_id_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xml");
        fs::write(&path, b"<testsuite/>").unwrap();

        let a = content_id(&path).unwrap();
        let b = content_id(&path).unwrap();

        assert_eq!(a, b);
        assert!(a.as_str().starts_with("sha256:"));
    }

    #[test]
    fn file_id_tracks_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xml");

        fs::write(&path, b"one").unwrap();
        let a = content_id(&path).unwrap();

        fs::write(&path, b"two").unwrap();
        let b = content_id(&path).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn directory_id_independent_of_creation_order() {
        let make = |names: &[&str]| {
            let dir = TempDir::new().unwrap();
            for name in names {
                fs::write(dir.path().join(name), name.as_bytes()).unwrap();
            }
            (content_id(dir.path()).unwrap(), dir)
        };

        let (a, _da) = make(&["index.html", "lcov.info"]);
        let (b, _db) = make(&["lcov.info", "index.html"]);

        assert_eq!(a, b);
    }

    #[test]
    fn directory_id_sees_nested_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib").join("main.dart.html"), b"x").unwrap();
        let a = content_id(dir.path()).unwrap();

        fs::write(dir.path().join("lib").join("main.dart.html"), b"y").unwrap();
        let b = content_id(dir.path()).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn container_id_display() {
        let id = ArtifactId::container("3f9a1c");
        assert_eq!(id.to_string(), "container:3f9a1c");
    }

    #[test]
    fn missing_path_errors() {
        assert!(content_id(Path::new("/nonexistent/artifact")).is_err());
    }
}
