pub mod cli;
pub mod core;
pub mod report;
pub mod transport;

pub use cli::report::ReportOptions;

use crate::core::config::AppConfig;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    /// Run the full pipeline and write the report.
    Report(ReportOptions),
    /// Print summary tables for a dataset.
    Summary { input: Option<PathBuf> },
}

pub fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("finauto starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Report(options) => cli::report::run(&options, &config),
        AppCommand::Summary { input } => {
            let input = input.unwrap_or_else(|| config.data.input_path.clone());
            cli::summary::run(&input, &config)
        }
    }
}
