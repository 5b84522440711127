use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};

#[derive(Parser)]
#[command(name = "manhour-sheet")]
#[command(about = "Turns monthly timesheet CSV exports into cleaned, company-reconciled TSV sheets")]
#[command(version)]
struct Cli {
    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for each source CSV (`..yy.m.csv`)
    Run {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Only rebuild the normalized organization table in DIR
    OrgTable {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn render(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = if report.ok { "ok" } else { "failed" };
    println!("{}: {status}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

/// Returns whether the command completed without issues.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Run { inputs } => commands::run::run(&commands::run::RunOptions { inputs })?,
        Commands::OrgTable { dir } => {
            commands::org_table::run(&commands::org_table::OrgTableOptions { dir })?
        }
    };

    render(&report, cli.json)?;
    Ok(report.ok)
}
