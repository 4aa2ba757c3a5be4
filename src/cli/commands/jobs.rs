//! Jobs command - list the job registry

use crate::cli::args::{JobsArgs, OutputFormat};
use crate::error::TarmacResult;
use crate::jobs::JOBS;
use console::style;
use serde_json::json;

/// Execute the jobs command
pub fn execute(args: JobsArgs) -> TarmacResult<()> {
    match args.format {
        OutputFormat::Table => print_table(),
        OutputFormat::Json => print_json()?,
        OutputFormat::Plain => print_plain(),
    }
    Ok(())
}

fn print_table() {
    println!(
        "{:<14} {:<40}",
        style("NAME").bold(),
        style("DESCRIPTION").bold()
    );
    println!("{}", "-".repeat(54));
    for entry in JOBS {
        println!("{:<14} {:<40}", entry.name, entry.description);
    }
}

fn print_json() -> TarmacResult<()> {
    let jobs: Vec<_> = JOBS
        .iter()
        .map(|entry| {
            json!({
                "name": entry.name,
                "description": entry.description,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}

fn print_plain() {
    for entry in JOBS {
        println!("{}", entry.name);
    }
}
