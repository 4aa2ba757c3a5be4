//! Completions command - generate shell completions

use crate::cli::args::{Cli, CompletionsArgs};
use crate::error::TarmacResult;
use clap::CommandFactory;
use clap_complete::generate;

/// Execute the completions command
pub fn execute(args: CompletionsArgs) -> TarmacResult<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "tarmac", &mut std::io::stdout());
    Ok(())
}
