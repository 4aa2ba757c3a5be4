//! Gitlab command - generate the declarative CI description

use crate::cli::args::GitlabArgs;
use crate::config::{Config, Overrides, ResolvedConfig};
use crate::error::{TarmacError, TarmacResult};
use crate::gitlab;
use console::style;
use tokio::fs;

/// Execute the gitlab command
pub async fn execute(args: GitlabArgs, config: &Config) -> TarmacResult<()> {
    if args.output.exists() && !args.force {
        return Err(TarmacError::ExportFailed {
            path: args.output.display().to_string(),
            reason: "file exists (use --force to overwrite)".to_string(),
        });
    }

    // Same resolution path as the runner, so the generated file pins the
    // same image the containers would use
    let cfg = ResolvedConfig::resolve(&Overrides::default(), config);
    let yaml = gitlab::default_pipeline(&cfg).render();

    fs::write(&args.output, yaml)
        .await
        .map_err(|e| TarmacError::io(format!("writing {}", args.output.display()), e))?;

    println!(
        "{} Wrote {}",
        style("✓").green(),
        style(args.output.display()).cyan()
    );

    Ok(())
}
