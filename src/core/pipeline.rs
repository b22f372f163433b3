//! Load, clean and analyze in one pass.
use crate::core::analytics::{AnalysisResult, Analyzer};
use crate::core::cleaner::{Cleaner, CleaningStats};
use crate::core::config::AppConfig;
use crate::core::error::Result;
use crate::core::loader::Loader;
use crate::core::record::Record;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub struct PipelineOutput {
    pub records: Vec<Record>,
    pub cleaning: CleaningStats,
    pub analysis: AnalysisResult,
}

/// Runs Loader, Cleaner and Analyzer over `input` using the settings in `config`.
///
/// `update_callback` is invoked with a short stage label after each stage completes.
pub fn run_pipeline(
    input: &Path,
    config: &AppConfig,
    update_callback: &dyn Fn(&str),
) -> Result<PipelineOutput> {
    let dataset = Loader::new(config.data.date_format.as_str()).load_path(input)?;
    update_callback("loaded");

    let (records, cleaning) = Cleaner::default()
        .with_outlier_threshold(config.analysis.outlier_threshold)
        .clean_with_stats(&dataset)?;
    update_callback("cleaned");

    let analysis = Analyzer::new(&records)
        .with_min_data_points(config.analysis.min_data_points)
        .with_expected_categories(&config.analysis.categories)
        .analyze()?;
    update_callback("analyzed");

    info!(
        "Processed {} records from {}",
        records.len(),
        input.display()
    );
    Ok(PipelineOutput {
        records,
        cleaning,
        analysis,
    })
}
