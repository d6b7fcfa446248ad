//! fieldcheck CLI - Main Entry Point
//!
//! Lints page configurations, lists the field specs they produce and renders
//! saved verdict reports. Driving a live page is left to whoever owns the
//! browser session.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{fields, lint, report};

/// fieldcheck - form field validation tooling
#[derive(Parser)]
#[command(name = "fieldcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate page configuration files
    Lint(lint::LintArgs),

    /// List the field specs a page configuration produces
    Fields(fields::FieldsArgs),

    /// Render a saved page report
    Report(report::ReportArgs),

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let passed = match cli.command {
        Commands::Lint(args) => lint::execute(args, cli.format)?,
        Commands::Fields(args) => fields::execute(args, cli.format)?,
        Commands::Report(args) => report::execute(args, cli.format)?,
        Commands::Version => {
            println!("fieldcheck {}", fieldcheck_common::VERSION);
            true
        }
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
