//! Container engine abstraction
//!
//! The pipeline consumes the container engine as a narrow capability:
//! build from an image, mount caches and the context directory, execute
//! steps, read output, export declared paths, and hand back a content
//! identity. Everything podman-specific lives behind the trait.

mod podman;

pub use podman::PodmanEngine;

use crate::artifact::ArtifactId;
use crate::cache::{CacheMount, CacheVolume};
use crate::context::BuildContext;
use crate::error::TarmacResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Max number of output lines to include in step error messages.
const STEP_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of step output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `STEP_ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn step_error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > STEP_ERROR_TAIL_LINES {
        lines[total - STEP_ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}

/// What a step failure should be reported as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Installs a prerequisite tool; failure reports as a tool-install error
    Install,
    /// Runs build/test/analysis work; failure reports as a step failure
    Run,
}

/// One shell command in a job's ordered step sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Short human-readable label used in logs and errors
    pub label: String,
    /// Command argv passed to the container
    pub argv: Vec<String>,
    /// Failure classification
    pub kind: StepKind,
}

impl Step {
    /// A plain argv step
    pub fn run(label: &str, argv: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            argv: argv.iter().map(|s| s.to_string()).collect(),
            kind: StepKind::Run,
        }
    }

    /// A shell step (`sh -c <script>`) for pipes and redirections
    pub fn sh(label: &str, script: &str) -> Self {
        Self {
            label: label.to_string(),
            argv: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            kind: StepKind::Run,
        }
    }

    /// A tool-installation step
    pub fn install(label: &str, argv: &[&str]) -> Self {
        Self {
            kind: StepKind::Install,
            ..Self::run(label, argv)
        }
    }
}

/// Captured result of a single step execution
///
/// A non-zero exit is data, not an engine error; the job decides how to
/// report it.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl StepOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Everything the engine needs to assemble a job container
///
/// Mount order is part of the contract: cache volumes first, then the
/// exclusion-filtered context directory.
#[derive(Debug, Clone)]
pub struct ContainerPlan {
    /// Job name, used for labels and diagnostics
    pub job: &'static str,
    /// Base image identity
    pub image: String,
    /// Working directory for steps
    pub workdir: String,
    /// Cache volume mounts, in mount order
    pub cache_mounts: Vec<CacheMount>,
    /// The source context to materialize and mount
    pub context: BuildContext,
    /// In-container mount path of the context
    pub context_path: String,
    /// Environment variables set on the container
    pub env: Vec<(String, String)>,
    /// Ordered execution steps
    pub steps: Vec<Step>,
}

/// Handle to a prepared job container
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    /// Engine container ID
    pub id: String,
    /// Job that owns the container
    pub job: String,
    /// Step working directory
    pub workdir: String,
    /// Host directory holding the materialized context, removed on teardown
    pub staging: Option<PathBuf>,
}

/// Abstract container engine interface
///
/// Implementations execute one job container at a time; the orchestrator
/// never runs jobs concurrently, so no engine-side locking is assumed.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Check if the engine is usable on this system
    async fn is_available(&self) -> TarmacResult<bool>;

    /// Ensure the engine is ready, with an actionable error when it is not
    async fn ensure_ready(&self) -> TarmacResult<()>;

    /// Create the named cache volume if it does not exist yet
    async fn ensure_volume(&self, volume: &CacheVolume) -> TarmacResult<()>;

    /// Pull the image if needed, materialize the context, create and start
    /// the job container with its mounts and environment
    async fn prepare(&self, plan: &ContainerPlan) -> TarmacResult<ContainerHandle>;

    /// Execute one step inside the container, capturing output and exit code
    async fn exec_step(&self, handle: &ContainerHandle, step: &Step)
        -> TarmacResult<StepOutput>;

    /// Copy a file or directory out of the container onto the host
    async fn export(
        &self,
        handle: &ContainerHandle,
        container_path: &str,
        host_path: &Path,
    ) -> TarmacResult<()>;

    /// Stable content identity for an exported path
    async fn content_id(&self, host_path: &Path) -> TarmacResult<ArtifactId>;

    /// Tear down the container and its staged context
    async fn remove(&self, handle: &ContainerHandle) -> TarmacResult<()>;

    /// Human-readable engine name for display
    fn engine_name(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording engine double for orchestrator and job tests

    use super::*;
    use crate::artifact;
    use crate::error::TarmacError;
    use std::fs;
    use std::sync::Mutex;

    /// In-memory engine that records calls and fabricates exports
    #[derive(Default)]
    pub struct MockEngine {
        /// Jobs that got a prepared container, in order
        pub prepared: Mutex<Vec<String>>,
        /// (job, step label) pairs in execution order
        pub steps: Mutex<Vec<(String, String)>>,
        /// Volume names ensured, in order
        pub volumes: Mutex<Vec<String>>,
        /// Container IDs removed
        pub removed: Mutex<Vec<String>>,
        /// Job whose Run steps should exit non-zero
        pub fail_job: Option<&'static str>,
    }

    impl MockEngine {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(job: &'static str) -> Self {
            Self {
                fail_job: Some(job),
                ..Self::default()
            }
        }

        pub fn prepared_jobs(&self) -> Vec<String> {
            self.prepared.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContainerEngine for MockEngine {
        async fn is_available(&self) -> TarmacResult<bool> {
            Ok(true)
        }

        async fn ensure_ready(&self) -> TarmacResult<()> {
            Ok(())
        }

        async fn ensure_volume(&self, volume: &CacheVolume) -> TarmacResult<()> {
            self.volumes.lock().unwrap().push(volume.volume_name());
            Ok(())
        }

        async fn prepare(&self, plan: &ContainerPlan) -> TarmacResult<ContainerHandle> {
            let mut prepared = self.prepared.lock().unwrap();
            prepared.push(plan.job.to_string());
            Ok(ContainerHandle {
                id: format!("mock-{}-{}", plan.job, prepared.len()),
                job: plan.job.to_string(),
                workdir: plan.workdir.clone(),
                staging: None,
            })
        }

        async fn exec_step(
            &self,
            handle: &ContainerHandle,
            step: &Step,
        ) -> TarmacResult<StepOutput> {
            self.steps
                .lock()
                .unwrap()
                .push((handle.job.clone(), step.label.clone()));

            let fail = self.fail_job == Some(handle.job.as_str()) && step.kind == StepKind::Run;
            Ok(StepOutput {
                exit_code: if fail { 1 } else { 0 },
                stdout: String::new(),
                stderr: String::new(),
            })
        }

        async fn export(
            &self,
            handle: &ContainerHandle,
            container_path: &str,
            host_path: &Path,
        ) -> TarmacResult<()> {
            if let Some(parent) = host_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| TarmacError::io("creating export parent", e))?;
            }
            fs::write(host_path, format!("{}:{}", handle.job, container_path))
                .map_err(|e| TarmacError::io("writing mock export", e))?;
            Ok(())
        }

        async fn content_id(&self, host_path: &Path) -> TarmacResult<ArtifactId> {
            artifact::content_id(host_path)
        }

        async fn remove(&self, handle: &ContainerHandle) -> TarmacResult<()> {
            self.removed.lock().unwrap().push(handle.id.clone());
            Ok(())
        }

        fn engine_name(&self) -> &'static str {
            "Mock"
        }
    }
}
