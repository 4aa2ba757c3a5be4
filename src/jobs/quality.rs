//! Code quality job
//!
//! Installs dart_code_metrics into the pub cache, analyzes `lib/` and
//! exports a CodeClimate-format report.

use crate::artifact::Artifact;
use crate::cache::{CacheMount, PUB_CACHE};
use crate::config::ResolvedConfig;
use crate::context::BuildContext;
use crate::engine::{ContainerEngine, ContainerHandle, ContainerPlan, Step};
use crate::error::TarmacResult;

/// Exported report file name, recognized by GitLab's code-quality widget
pub const REPORT_FILE: &str = "gl-code-quality-report.json";

/// Assemble the container plan for the quality job
pub fn plan(ctx: &BuildContext, cfg: &ResolvedConfig) -> ContainerPlan {
    ContainerPlan {
        job: "code-quality",
        image: cfg.image(),
        workdir: "/app".to_string(),
        cache_mounts: vec![CacheMount::new(PUB_CACHE, "/root/.pub-cache")],
        context: ctx.clone(),
        context_path: "/app".to_string(),
        env: vec![("PUB_CACHE".to_string(), "/root/.pub-cache".to_string())],
        steps: vec![
            Step::install(
                "activate dart_code_metrics",
                &["flutter", "pub", "global", "activate", "dart_code_metrics"],
            ),
            Step::sh(
                "analyze sources",
                "$HOME/.pub-cache/bin/metrics lib -r codeclimate > gl-code-quality-report.json",
            ),
        ],
    }
}

/// Run code quality checks
pub async fn run(
    engine: &dyn ContainerEngine,
    ctx: &BuildContext,
    cfg: &ResolvedConfig,
) -> TarmacResult<Artifact> {
    let plan = plan(ctx, cfg);
    let handle = super::start(engine, &plan).await?;
    let result = execute(engine, &handle, &plan, cfg).await;
    super::teardown(engine, &handle).await;
    result
}

async fn execute(
    engine: &dyn ContainerEngine,
    handle: &ContainerHandle,
    plan: &ContainerPlan,
    cfg: &ResolvedConfig,
) -> TarmacResult<Artifact> {
    // A non-zero analysis exit fails the job; no artifact is produced
    for step in &plan.steps {
        super::run_step(engine, handle, step).await?;
    }

    let dest = cfg.artifacts_dir.join(REPORT_FILE);
    engine
        .export(handle, "/app/gl-code-quality-report.json", &dest)
        .await?;
    let id = engine.content_id(&dest).await?;

    Ok(Artifact {
        id,
        exported: vec![dest],
    })
}
