use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use finauto::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ReportArgs {
    /// Input CSV, overrides data.input_path
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Report file, overrides reporting.report_path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip chart generation
    #[arg(long)]
    no_charts: bool,

    /// Email the report using the email settings
    #[arg(long)]
    email: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Clean and analyze the dataset, then write the report
    Report(ReportArgs),
    /// Display summary tables for the dataset
    Summary {
        /// Input CSV, overrides data.input_path
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

impl From<Commands> for finauto::AppCommand {
    fn from(cmd: Commands) -> finauto::AppCommand {
        match cmd {
            Commands::Report(args) => finauto::AppCommand::Report(finauto::ReportOptions {
                input: args.input,
                output: args.output,
                no_charts: args.no_charts,
                email: args.email,
            }),
            Commands::Summary { input } => finauto::AppCommand::Summary { input },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => finauto::cli::setup::setup_at_path(path),
            None => finauto::cli::setup::setup(),
        },
        Some(cmd) => finauto::run_command(cmd.into(), cli.config_path.as_deref()),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
