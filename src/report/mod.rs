//! Markdown report and chart generation.
pub mod chart;

use crate::core::analytics::{AnalysisResult, monthly_totals};
use crate::core::error::{PipelineError, Result};
use crate::core::helpers::{format_currency, format_percentage};
use crate::core::record::Record;
use chart::Series;
use chrono::{Local, NaiveDate};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

pub const TRENDS_CHART: &str = "trends.svg";
pub const CATEGORY_CHART: &str = "category_performance.svg";

const REVENUE_COLOR: &str = "#1f77b4";
const PROFIT_COLOR: &str = "#ff7f0e";
const CATEGORY_COLOR: &str = "#2ca02c";

/// Files written by one report run.
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub report_path: PathBuf,
    pub trends_chart: Option<PathBuf>,
    pub category_chart: Option<PathBuf>,
}

/// Chart links embedded in the markdown, relative to the report file.
#[derive(Debug, Default)]
struct ChartLinks {
    trends: Option<String>,
    categories: Option<String>,
}

pub struct ReportGenerator<'a> {
    records: &'a [Record],
    analysis: &'a AnalysisResult,
    report_date: NaiveDate,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(records: &'a [Record], analysis: &'a AnalysisResult) -> Self {
        ReportGenerator {
            records,
            analysis,
            report_date: Local::now().date_naive(),
        }
    }

    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = date;
        self
    }

    /// Writes the markdown report to `output_path` and, when `charts_dir` is
    /// given, the trend and category charts into that directory.
    pub fn generate(&self, output_path: &Path, charts_dir: Option<&Path>) -> Result<ReportArtifacts> {
        self.validate()?;

        let report_dir = output_path.parent().unwrap_or(Path::new(""));
        create_dir(report_dir)?;

        let mut artifacts = ReportArtifacts {
            report_path: output_path.to_path_buf(),
            trends_chart: None,
            category_chart: None,
        };
        let mut links = ChartLinks::default();

        if let Some(dir) = charts_dir {
            create_dir(dir)?;

            let trends = dir.join(TRENDS_CHART);
            write_file(&trends, &self.trends_svg())?;
            links.trends = Some(link_from(report_dir, &trends));
            artifacts.trends_chart = Some(trends);

            let categories = dir.join(CATEGORY_CHART);
            write_file(&categories, &self.category_svg())?;
            links.categories = Some(link_from(report_dir, &categories));
            artifacts.category_chart = Some(categories);
            debug!("Charts written to {}", dir.display());
        }

        write_file(output_path, &self.render_markdown(&links))?;
        info!("Report written to {}", output_path.display());
        Ok(artifacts)
    }

    /// Ensures the results describe exactly the categories present in the records.
    fn validate(&self) -> Result<()> {
        let in_data: BTreeSet<&str> = self.records.iter().map(|r| r.category.as_str()).collect();
        let in_results: BTreeSet<&str> = self.analysis.categories.keys().map(String::as_str).collect();

        if in_data != in_results {
            let missing: Vec<&str> = in_data.difference(&in_results).copied().collect();
            let extra: Vec<&str> = in_results.difference(&in_data).copied().collect();
            return Err(PipelineError::IncompatibleResults(format!(
                "categories missing from results: [{}]; categories without records: [{}]",
                missing.join(", "),
                extra.join(", ")
            )));
        }
        Ok(())
    }

    fn trends_svg(&self) -> String {
        let (revenue, profit) = monthly_totals(self.records);
        let labels: Vec<String> = revenue.iter().map(|p| p.month.format("%Y-%m").to_string()).collect();
        chart::line_chart(
            "Monthly Revenue and Profit Trends",
            "Amount ($)",
            &labels,
            &[
                Series {
                    label: "Revenue",
                    color: REVENUE_COLOR,
                    values: revenue.iter().map(|p| p.value).collect(),
                },
                Series {
                    label: "Profit",
                    color: PROFIT_COLOR,
                    values: profit.iter().map(|p| p.value).collect(),
                },
            ],
        )
    }

    fn category_svg(&self) -> String {
        let (labels, values): (Vec<String>, Vec<f64>) = self
            .analysis
            .categories
            .iter()
            .map(|(name, m)| (name.clone(), m.profit))
            .unzip();
        chart::bar_chart("Profit by Category", "Total Profit ($)", &labels, &values, CATEGORY_COLOR)
    }

    fn render_markdown(&self, links: &ChartLinks) -> String {
        let summary = &self.analysis.summary;
        let trends = &self.analysis.trends;

        let mut report = format!(
            "# Financial Analysis Report\nGenerated on: {}\n\n",
            self.report_date.format("%Y-%m-%d")
        );

        report.push_str("## Summary Metrics\n");
        report.push_str(&format!("- Total Revenue: {}\n", format_currency(summary.total_revenue)));
        report.push_str(&format!("- Total Expenses: {}\n", format_currency(summary.total_expenses)));
        report.push_str(&format!("- Total Profit: {}\n", format_currency(summary.total_profit)));
        report.push_str(&format!(
            "- Average Profit Margin: {}\n",
            format_percentage(summary.average_profit_margin)
        ));
        report.push_str(&format!("- Revenue Growth: {}\n", format_percentage(summary.revenue_growth)));
        report.push_str(&format!("- Profit Growth: {}\n", format_percentage(summary.profit_growth)));

        report.push_str("\n## Trend Analysis\n");
        report.push_str(&format!("- Revenue Trend: {}\n", trends.revenue_trend));
        report.push_str(&format!("- Profit Trend: {}\n", trends.profit_trend));
        if let Some(link) = &links.trends {
            report.push_str(&format!("\n![Monthly Revenue and Profit Trends]({link})\n"));
        }

        report.push_str("\n## Category Performance\n");
        if let Some(link) = &links.categories {
            report.push_str(&format!("\n![Profit by Category]({link})\n"));
        }
        for (category, metrics) in &self.analysis.categories {
            report.push_str(&format!("\n### {category}\n"));
            report.push_str(&format!("- Revenue: {}\n", format_currency(metrics.revenue)));
            report.push_str(&format!("- Profit: {}\n", format_currency(metrics.profit)));
            report.push_str(&format!(
                "- Average Profit Margin: {}\n",
                format_percentage(metrics.profit_margin)
            ));
        }

        report
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| PipelineError::io(path, e))
}

/// Path of `target` relative to the directory `base`, with forward slashes for
/// markdown. Falls back to the absolute target when no relative path exists.
fn link_from(base: &Path, target: &Path) -> String {
    let base = if base.as_os_str().is_empty() { Path::new(".") } else { base };
    let relative = match (std::path::absolute(base), std::path::absolute(target)) {
        (Ok(base), Ok(target)) => relative_path(&base, &target).unwrap_or(target),
        _ => target.to_path_buf(),
    };
    relative.to_string_lossy().replace('\\', "/")
}

fn relative_path(base: &Path, target: &Path) -> Option<PathBuf> {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();
    let common = base.iter().zip(&target).take_while(|(a, b)| a == b).count();
    if common == 0 {
        return None;
    }

    let mut path = PathBuf::new();
    for component in &base[common..] {
        match component {
            Component::Normal(_) => path.push(".."),
            Component::CurDir => {}
            _ => return None,
        }
    }
    for component in &target[common..] {
        path.push(component.as_os_str());
    }
    Some(path)
}
