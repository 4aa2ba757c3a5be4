//! Pipeline orchestration
//!
//! Jobs execute one at a time, steps within a job one at a time. Shared
//! cache volumes are safe exactly because nothing here runs concurrently;
//! a failure is terminal for the invocation and nothing is retried.

use crate::artifact::Artifact;
use crate::config::ResolvedConfig;
use crate::context::BuildContext;
use crate::engine::ContainerEngine;
use crate::error::TarmacResult;
use crate::jobs::{self, Job};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Jobs run by a full-mode invocation, in order
pub const FULL_PIPELINE: &[Job] = &[Job::Quality, Job::Test, Job::Build];

/// Outcome of one completed job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Registry name of the job
    pub job: String,
    /// The job's primary artifact
    pub artifact: Artifact,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Run the pipeline in full or selective mode
///
/// With no names, runs code-quality, test and build in that order, aborting
/// on the first failure. With names, runs exactly the named jobs in caller
/// order; an unknown name aborts before any later job is attempted, leaving
/// earlier jobs completed.
pub async fn run_pipeline(
    engine: &dyn ContainerEngine,
    ctx: &BuildContext,
    cfg: &ResolvedConfig,
    names: &[String],
) -> TarmacResult<Vec<JobReport>> {
    let mut reports = Vec::new();
    let mut engine_ready = false;

    if names.is_empty() {
        info!("Running full pipeline");
        for job in FULL_PIPELINE {
            ensure_ready_once(engine, &mut engine_ready).await?;
            reports.push(run_job(engine, ctx, cfg, *job).await?);
        }
    } else {
        for name in names {
            // Lookup precedes any engine work so an unknown name fails
            // without touching a container
            let job = jobs::lookup(name)?;
            ensure_ready_once(engine, &mut engine_ready).await?;
            reports.push(run_job(engine, ctx, cfg, job).await?);
        }
    }

    Ok(reports)
}

async fn ensure_ready_once(
    engine: &dyn ContainerEngine,
    ready: &mut bool,
) -> TarmacResult<()> {
    if !*ready {
        engine.ensure_ready().await?;
        *ready = true;
    }
    Ok(())
}

async fn run_job(
    engine: &dyn ContainerEngine,
    ctx: &BuildContext,
    cfg: &ResolvedConfig,
    job: Job,
) -> TarmacResult<JobReport> {
    info!("Starting job: {}", job);
    let started_at = Utc::now();

    let artifact = job.run(engine, ctx, cfg).await?;

    let finished_at = Utc::now();
    info!("Job {} finished: {}", job, artifact.id);

    Ok(JobReport {
        job: job.name().to_string(),
        artifact,
        started_at,
        finished_at,
    })
}
