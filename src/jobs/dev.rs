//! Dev job
//!
//! Prepares a container with the same mounts as the build job but issues no
//! build command. The artifact is the environment itself, left running for
//! interactive or follow-up use.

use crate::artifact::Artifact;
use crate::cache::{CacheMount, ANDROID_BUILD, ANDROID_GRADLE, PUB_CACHE};
use crate::config::ResolvedConfig;
use crate::context::BuildContext;
use crate::engine::{ContainerEngine, ContainerPlan};
use crate::error::TarmacResult;
use tracing::info;

/// Assemble the container plan for the dev environment
pub fn plan(ctx: &BuildContext, cfg: &ResolvedConfig) -> ContainerPlan {
    ContainerPlan {
        job: "dev",
        image: cfg.image(),
        workdir: "/app".to_string(),
        cache_mounts: vec![
            CacheMount::new(PUB_CACHE, "/root/.pub-cache"),
            CacheMount::new(ANDROID_GRADLE, "/app/android/.gradle"),
            CacheMount::new(ANDROID_BUILD, "/app/build"),
        ],
        context: ctx.clone(),
        context_path: "/app".to_string(),
        env: vec![("PUB_CACHE".to_string(), "/root/.pub-cache".to_string())],
        steps: vec![],
    }
}

/// Prepare a ready-to-use Flutter environment
pub async fn run(
    engine: &dyn ContainerEngine,
    ctx: &BuildContext,
    cfg: &ResolvedConfig,
) -> TarmacResult<Artifact> {
    let plan = plan(ctx, cfg);
    let handle = super::start(engine, &plan).await?;

    // The container is the artifact; it stays up for the caller
    info!("Dev environment ready: {}", handle.id);
    Ok(Artifact::environment(&handle.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MockEngine;
    use crate::jobs::fixtures;

    #[test]
    fn plan_matches_build_mounts_without_steps() {
        let (dir, ctx) = fixtures::context();
        let cfg = fixtures::config(dir.path());
        let plan = plan(&ctx, &cfg);

        assert_eq!(plan.cache_mounts.len(), 3);
        assert!(plan.steps.is_empty());
    }

    #[tokio::test]
    async fn run_returns_environment_identity_and_keeps_container() {
        let (dir, ctx) = fixtures::context();
        let cfg = fixtures::config(dir.path());
        let engine = MockEngine::new();

        let artifact = run(&engine, &ctx, &cfg).await.unwrap();

        assert!(artifact.id.as_str().starts_with("container:"));
        assert!(artifact.exported.is_empty());
        // The environment is the artifact; nothing is removed
        assert!(engine.removed.lock().unwrap().is_empty());
    }
}
