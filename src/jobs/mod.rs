//! Pipeline job definitions and registry
//!
//! Each job is a pure plan constructor plus a thin async runner that
//! delegates to the container engine. The registry is a static table fixed
//! at compile time; dispatch is by exact name only.

pub mod build;
pub mod dev;
pub mod quality;

use crate::artifact::Artifact;
use crate::config::ResolvedConfig;
use crate::context::BuildContext;
use crate::engine::{
    step_error_output, ContainerEngine, ContainerHandle, ContainerPlan, Step, StepKind, StepOutput,
};
use crate::error::{TarmacError, TarmacResult};
use std::fmt;
use tracing::warn;

/// The named jobs the pipeline can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Quality,
    Test,
    Build,
    Dev,
}

impl Job {
    /// The registry name of this job
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quality => "code-quality",
            Self::Test => "test",
            Self::Build => "build",
            Self::Dev => "dev",
        }
    }

    /// Run this job against the engine, returning its primary artifact
    pub async fn run(
        &self,
        engine: &dyn ContainerEngine,
        ctx: &BuildContext,
        cfg: &ResolvedConfig,
    ) -> TarmacResult<Artifact> {
        match self {
            Self::Quality => quality::run(engine, ctx, cfg).await,
            Self::Test => test::run(engine, ctx, cfg).await,
            Self::Build => build::run(engine, ctx, cfg).await,
            Self::Dev => dev::run(engine, ctx, cfg).await,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Registry entry: name, job and human-readable description
#[derive(Debug, Clone, Copy)]
pub struct JobEntry {
    pub job: Job,
    pub name: &'static str,
    pub description: &'static str,
}

/// The job registry, constructed once and immutable thereafter
///
/// Names and descriptions stay in lock-step: one description per job name
/// and vice versa.
pub const JOBS: &[JobEntry] = &[
    JobEntry {
        job: Job::Quality,
        name: "code-quality",
        description: "Run code quality checks",
    },
    JobEntry {
        job: Job::Test,
        name: "test",
        description: "Run tests with coverage",
    },
    JobEntry {
        job: Job::Build,
        name: "build",
        description: "Build the application",
    },
    JobEntry {
        job: Job::Dev,
        name: "dev",
        description: "Prepare a Flutter container environment",
    },
];

/// Look up a job by its exact registry name
///
/// Unknown names are a hard error, never a silent skip.
pub fn lookup(name: &str) -> TarmacResult<Job> {
    JOBS.iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.job)
        .ok_or_else(|| TarmacError::UnknownJob(name.to_string()))
}

/// The static description for a job
pub fn describe(job: Job) -> &'static str {
    JOBS.iter()
        .find(|entry| entry.job == job)
        .map(|entry| entry.description)
        .unwrap_or_default()
}

/// Ensure cache volumes exist, then prepare the job container
pub(crate) async fn start(
    engine: &dyn ContainerEngine,
    plan: &ContainerPlan,
) -> TarmacResult<ContainerHandle> {
    for mount in &plan.cache_mounts {
        engine.ensure_volume(&mount.volume).await?;
    }
    engine.prepare(plan).await
}

/// Execute one step, mapping a non-zero exit to its failure class
pub(crate) async fn run_step(
    engine: &dyn ContainerEngine,
    handle: &ContainerHandle,
    step: &Step,
) -> TarmacResult<StepOutput> {
    let output = engine.exec_step(handle, step).await?;
    if output.success() {
        return Ok(output);
    }

    Err(step_failure(step, &output))
}

/// Failure classification for a step that exited non-zero
pub(crate) fn step_failure(step: &Step, output: &StepOutput) -> TarmacError {
    match step.kind {
        StepKind::Install => TarmacError::ToolInstall {
            tool: step.label.clone(),
            reason: step_error_output(&output.stdout, &output.stderr),
        },
        StepKind::Run => TarmacError::StepFailed {
            step: step.label.clone(),
            code: output.exit_code,
        },
    }
}

/// Best-effort container teardown after a job body completes
pub(crate) async fn teardown(engine: &dyn ContainerEngine, handle: &ContainerHandle) {
    if let Err(e) = engine.remove(handle).await {
        warn!("Failed to remove container {}: {}", handle.id, e);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_every_registered_job() {
        for entry in JOBS {
            let job = lookup(entry.name).unwrap();
            assert_eq!(job, entry.job);
        }
    }

    #[test]
    fn lookup_rejects_unknown_names() {
        let err = lookup("deploy").unwrap_err();
        assert!(matches!(err, TarmacError::UnknownJob(_)));
    }

    #[test]
    fn lookup_is_exact_match_only() {
        assert!(lookup("Code-Quality").is_err());
        assert!(lookup("code").is_err());
        assert!(lookup("").is_err());
    }

    #[test]
    fn every_job_has_a_nonempty_description() {
        for entry in JOBS {
            assert!(!entry.description.is_empty());
            assert_eq!(describe(entry.job), entry.description);
        }
    }

    #[test]
    fn names_and_jobs_are_unique() {
        for (i, a) in JOBS.iter().enumerate() {
            for b in &JOBS[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.job, b.job);
                assert_ne!(a.description, b.description);
            }
        }
    }

    #[test]
    fn job_display_matches_registry_name() {
        assert_eq!(Job::Quality.to_string(), "code-quality");
        assert_eq!(Job::Dev.to_string(), "dev");
    }
}
