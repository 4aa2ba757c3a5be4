//! Run command - execute the pipeline

use crate::cli::args::RunArgs;
use crate::config::{Config, ConfigManager, Overrides, ResolvedConfig};
use crate::context::BuildContext;
use crate::engine::PodmanEngine;
use crate::error::TarmacResult;
use crate::pipeline::{self, JobReport};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> TarmacResult<()> {
    // Settings resolve once, here, with the same precedence for every job
    let overrides = Overrides {
        flutter_version: args.flutter_version.clone(),
        output_type: args.output_type.clone(),
        release: if args.debug { Some(false) } else { None },
        artifacts_dir: args.artifacts_dir.clone(),
        keep_containers: args.keep,
    };
    let cfg = ResolvedConfig::resolve(&overrides, config);
    debug!("Resolved image: {}", cfg.image());

    // Context validation is a setup failure, surfaced before any container
    let ctx = BuildContext::resolve(args.project.as_deref())?;
    debug!("Source context: {}", ctx.root().display());

    ConfigManager::ensure_state_dirs().await?;

    let engine = PodmanEngine::new(cfg.keep_containers);

    let pb = create_progress_bar(&describe_invocation(&args.jobs));
    let result = pipeline::run_pipeline(&engine, &ctx, &cfg, &args.jobs).await;
    pb.finish_and_clear();

    let reports = result?;
    print_summary(&reports);

    Ok(())
}

fn describe_invocation(jobs: &[String]) -> String {
    if jobs.is_empty() {
        "Running full pipeline...".to_string()
    } else {
        format!("Running jobs: {}...", jobs.join(", "))
    }
}

fn print_summary(reports: &[JobReport]) {
    for report in reports {
        let elapsed = (report.finished_at - report.started_at).num_seconds();
        println!(
            "{} {:<14} {} {}",
            style("✓").green(),
            style(&report.job).cyan(),
            report.artifact.id,
            style(format!("({}s)", elapsed)).dim()
        );
        for path in &report.artifact.exported {
            println!("    exported: {}", path.display());
        }
    }
    println!(
        "{} {} job(s) completed",
        style("✓").green().bold(),
        reports.len()
    );
}

fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
