//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Tarmac - Container CI pipeline for Flutter apps
///
/// Builds and verifies a Flutter application inside reproducible podman
/// containers with persistent dependency caches.
#[derive(Parser, Debug)]
#[command(name = "tarmac")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TARMAC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local tarmac.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline, or only the named jobs
    Run(RunArgs),

    /// List the jobs the pipeline can run
    Jobs(JobsArgs),

    /// Generate a .gitlab-ci.yml restating the pipeline jobs
    Gitlab(GitlabArgs),

    /// Check engine health and cache volumes
    Status,

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Jobs to run, in order (all of code-quality, test, build when empty)
    pub jobs: Vec<String>,

    /// Source directory to build (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Flutter toolchain version pinning the container image
    #[arg(long)]
    pub flutter_version: Option<String>,

    /// Build output type: apk or appbundle
    #[arg(long)]
    pub output_type: Option<String>,

    /// Build debug artifacts instead of release
    #[arg(long)]
    pub debug: bool,

    /// Directory artifacts are exported into
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Keep job containers after completion
    #[arg(long)]
    pub keep: bool,
}

/// Arguments for the jobs command
#[derive(Parser, Debug)]
pub struct JobsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the gitlab command
#[derive(Parser, Debug)]
pub struct GitlabArgs {
    /// Output file path
    #[arg(short, long, default_value = ".gitlab-ci.yml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

/// Output format for list-style commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
