//! Source context resolution
//!
//! A build context is the exclusion-filtered source tree made visible to a
//! job's container. Resolution validates the source path up front; the
//! filtered copy is only produced when the engine mounts the context, so no
//! data moves eagerly.

use crate::error::{TarmacError, TarmacResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Paths never copied into a job container, relative to the context root.
///
/// Build output, Gradle state and tool-local directories are either rebuilt
/// inside the container or supplied through cache volumes; copying them in
/// would shadow the mounted caches.
pub const EXCLUDE: &[&str] = &[
    "build",
    "android/app/build",
    "android/.gradle",
    ".devbox",
    ".tarmac",
];

/// A directory tree reference bound to the fixed exclusion list
#[derive(Debug, Clone)]
pub struct BuildContext {
    root: PathBuf,
    exclude: &'static [&'static str],
}

impl BuildContext {
    /// Resolve a source location into a mountable context
    ///
    /// Defaults to the current directory. Fails before any container exists
    /// if the path does not exist, is unreadable, or is not a directory.
    pub fn resolve(src: Option<&Path>) -> TarmacResult<Self> {
        let raw = src.unwrap_or_else(|| Path::new("."));
        let root = raw
            .canonicalize()
            .map_err(|_| TarmacError::ContextNotFound(raw.to_path_buf()))?;

        let meta = fs::metadata(&root).map_err(|e| TarmacError::ContextInvalid {
            path: root.clone(),
            reason: e.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(TarmacError::ContextInvalid {
                path: root,
                reason: "not a directory".to_string(),
            });
        }

        debug!("Resolved context: {}", root.display());
        Ok(Self {
            root,
            exclude: EXCLUDE,
        })
    }

    /// The resolved source root on the host
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a context-relative path falls under an excluded prefix
    pub fn is_excluded(&self, rel: &Path) -> bool {
        self.exclude
            .iter()
            .any(|pattern| rel.starts_with(Path::new(pattern)))
    }

    /// Copy the filtered tree into `dest`, returning the number of files copied
    ///
    /// Called by the engine when the context is mounted. The exclusion list is
    /// applied here, per invocation, so no excluded file is ever visible
    /// inside a container.
    pub fn materialize_into(&self, dest: &Path) -> TarmacResult<usize> {
        fs::create_dir_all(dest)
            .map_err(|e| TarmacError::io(format!("creating {}", dest.display()), e))?;

        let mut copied = 0;
        let root = self.root.clone();
        self.copy_tree(&root, dest, Path::new(""), &mut copied)?;
        debug!("Materialized {} files into {}", copied, dest.display());
        Ok(copied)
    }

    fn copy_tree(
        &self,
        src: &Path,
        dest: &Path,
        rel: &Path,
        copied: &mut usize,
    ) -> TarmacResult<()> {
        let entries = fs::read_dir(src)
            .map_err(|e| TarmacError::io(format!("reading directory {}", src.display()), e))?;

        for entry in entries {
            let entry = entry.map_err(|e| TarmacError::io("reading directory entry", e))?;
            let name = entry.file_name();
            let rel_path = rel.join(&name);

            if self.is_excluded(&rel_path) {
                debug!("Excluding {}", rel_path.display());
                continue;
            }

            let src_path = entry.path();
            let dest_path = dest.join(&name);
            let file_type = entry
                .file_type()
                .map_err(|e| TarmacError::io("reading file type", e))?;

            if file_type.is_dir() {
                fs::create_dir_all(&dest_path)
                    .map_err(|e| TarmacError::io(format!("creating {}", dest_path.display()), e))?;
                self.copy_tree(&src_path, &dest_path, &rel_path, copied)?;
            } else if file_type.is_file() {
                fs::copy(&src_path, &dest_path).map_err(|e| {
                    TarmacError::io(format!("copying {}", src_path.display()), e)
                })?;
                *copied += 1;
            }
            // Symlinks and specials are dropped; the container has no use for them
        }
        Ok(())
    }
}
