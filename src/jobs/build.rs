//! Build job
//!
//! Invokes the platform build with two extra cache volumes (Gradle state
//! and build output) so repeated builds reuse prior compilation work, then
//! extracts the single output file named by the output-layout table.

use crate::artifact::Artifact;
use crate::cache::{CacheMount, ANDROID_BUILD, ANDROID_GRADLE, PUB_CACHE};
use crate::config::ResolvedConfig;
use crate::context::BuildContext;
use crate::engine::{ContainerEngine, ContainerHandle, ContainerPlan, Step};
use crate::error::{TarmacError, TarmacResult};
use std::str::FromStr;

/// Root the build output tree is copied to before extraction
const EXTRACTION_ROOT: &str = "/outputs";

/// Supported build output types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Apk,
    AppBundle,
}

impl OutputKind {
    /// The argument passed to `flutter build`
    pub fn build_arg(&self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::AppBundle => "appbundle",
        }
    }
}

impl FromStr for OutputKind {
    type Err = TarmacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apk" => Ok(Self::Apk),
            "appbundle" => Ok(Self::AppBundle),
            other => Err(TarmacError::UnknownOutputType(other.to_string())),
        }
    }
}

/// One row of the output-layout table
///
/// The build tool's output naming is convention, not contract; keeping the
/// mapping as data makes a layout change a table edit instead of a string
/// surgery.
#[derive(Debug, Clone, Copy)]
struct OutputLayout {
    kind: OutputKind,
    release: bool,
    subdir: &'static str,
    file: &'static str,
}

const OUTPUT_LAYOUTS: &[OutputLayout] = &[
    OutputLayout {
        kind: OutputKind::Apk,
        release: true,
        subdir: "apk/release",
        file: "app-release.apk",
    },
    OutputLayout {
        kind: OutputKind::Apk,
        release: false,
        subdir: "apk/debug",
        file: "app-debug.apk",
    },
    OutputLayout {
        kind: OutputKind::AppBundle,
        release: true,
        subdir: "bundle/release",
        file: "app-release.aab",
    },
    OutputLayout {
        kind: OutputKind::AppBundle,
        release: false,
        subdir: "bundle/debug",
        file: "app-debug.aab",
    },
];

fn layout(kind: OutputKind, release: bool) -> &'static OutputLayout {
    OUTPUT_LAYOUTS
        .iter()
        .find(|l| l.kind == kind && l.release == release)
        .expect("layout table covers all kind/release combinations")
}

/// The in-container path of the build output file
pub fn artifact_path(kind: OutputKind, release: bool) -> String {
    let layout = layout(kind, release);
    format!("{}/{}/{}", EXTRACTION_ROOT, layout.subdir, layout.file)
}

/// The exported file name for the build output
pub fn artifact_file_name(kind: OutputKind, release: bool) -> &'static str {
    layout(kind, release).file
}

/// Assemble the container plan for the build job
pub fn plan(ctx: &BuildContext, cfg: &ResolvedConfig, kind: OutputKind) -> ContainerPlan {
    let mut build_argv = vec!["flutter", "build", kind.build_arg()];
    if cfg.release {
        build_argv.push("--release");
    }

    ContainerPlan {
        job: "build",
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
        steps: vec![
            Step::run("flutter build", &build_argv),
            Step::run(
                "collect outputs",
                &["cp", "-r", "build/app/outputs", EXTRACTION_ROOT],
            ),
        ],
    }
}

/// Build the application
pub async fn run(
    engine: &dyn ContainerEngine,
    ctx: &BuildContext,
    cfg: &ResolvedConfig,
) -> TarmacResult<Artifact> {
    let kind = OutputKind::from_str(&cfg.output_type)?;
    let plan = plan(ctx, cfg, kind);
    let handle = super::start(engine, &plan).await?;
    let result = execute(engine, &handle, &plan, cfg, kind).await;
    super::teardown(engine, &handle).await;
    result
}

async fn execute(
    engine: &dyn ContainerEngine,
    handle: &ContainerHandle,
    plan: &ContainerPlan,
    cfg: &ResolvedConfig,
    kind: OutputKind,
) -> TarmacResult<Artifact> {
    for step in &plan.steps {
        super::run_step(engine, handle, step).await?;
    }

    // A missing path here is a layout mismatch between the expected and
    // actual tool output, reported apart from a failed build command
    let source = artifact_path(kind, cfg.release);
    let dest = cfg.artifacts_dir.join(artifact_file_name(kind, cfg.release));
    engine.export(handle, &source, &dest).await?;
    let id = engine.content_id(&dest).await?;

    Ok(Artifact {
        id,
        exported: vec![dest],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MockEngine;
    use crate::jobs::fixtures;

    #[test]
    fn artifact_paths_cover_all_combinations() {
        assert_eq!(
            artifact_path(OutputKind::Apk, true),
            "/outputs/apk/release/app-release.apk"
        );
        assert_eq!(
            artifact_path(OutputKind::Apk, false),
            "/outputs/apk/debug/app-debug.apk"
        );
        assert_eq!(
            artifact_path(OutputKind::AppBundle, true),
            "/outputs/bundle/release/app-release.aab"
        );
        assert_eq!(
            artifact_path(OutputKind::AppBundle, false),
            "/outputs/bundle/debug/app-debug.aab"
        );
    }

    #[test]
    fn artifact_paths_are_distinct() {
        let paths = [
            artifact_path(OutputKind::Apk, true),
            artifact_path(OutputKind::Apk, false),
            artifact_path(OutputKind::AppBundle, true),
            artifact_path(OutputKind::AppBundle, false),
        ];
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn output_kind_parsing() {
        assert_eq!(OutputKind::from_str("apk").unwrap(), OutputKind::Apk);
        assert_eq!(
            OutputKind::from_str("appbundle").unwrap(),
            OutputKind::AppBundle
        );
        assert!(matches!(
            OutputKind::from_str("ipa").unwrap_err(),
            TarmacError::UnknownOutputType(_)
        ));
    }

    #[test]
    fn plan_mounts_three_caches_in_order() {
        let (dir, ctx) = fixtures::context();
        let cfg = fixtures::config(dir.path());
        let plan = plan(&ctx, &cfg, OutputKind::Apk);

        let args: Vec<String> = plan.cache_mounts.iter().map(|m| m.volume_arg()).collect();
        assert_eq!(
            args,
            vec![
                "tarmac-pub-cache:/root/.pub-cache",
                "tarmac-android-gradle:/app/android/.gradle",
                "tarmac-android-build:/app/build",
            ]
        );
    }

    #[test]
    fn plan_release_flag() {
        let (dir, ctx) = fixtures::context();
        let mut cfg = fixtures::config(dir.path());

        let release = plan(&ctx, &cfg, OutputKind::Apk);
        assert_eq!(
            release.steps[0].argv,
            vec!["flutter", "build", "apk", "--release"]
        );

        cfg.release = false;
        let debug = plan(&ctx, &cfg, OutputKind::AppBundle);
        assert_eq!(debug.steps[0].argv, vec!["flutter", "build", "appbundle"]);
    }

    #[tokio::test]
    async fn run_exports_release_apk() {
        let (dir, ctx) = fixtures::context();
        let cfg = fixtures::config(dir.path());
        let engine = MockEngine::new();

        let artifact = run(&engine, &ctx, &cfg).await.unwrap();

        assert_eq!(artifact.exported.len(), 1);
        assert!(artifact.exported[0].ends_with("app-release.apk"));
        assert!(artifact.id.as_str().starts_with("sha256:"));
    }

    #[tokio::test]
    async fn run_rejects_unknown_output_type() {
        let (dir, ctx) = fixtures::context();
        let mut cfg = fixtures::config(dir.path());
        cfg.output_type = "ipa".to_string();
        let engine = MockEngine::new();

        let err = run(&engine, &ctx, &cfg).await.unwrap_err();

        assert!(matches!(err, TarmacError::UnknownOutputType(_)));
        // Rejected before any container work
        assert!(engine.prepared_jobs().is_empty());
    }
}
