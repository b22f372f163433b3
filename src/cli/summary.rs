use super::ui;
use crate::core::analytics::AnalysisResult;
use crate::core::cleaner::CleaningStats;
use crate::core::config::AppConfig;
use crate::core::helpers::{date_range, format_currency, format_percentage};
use crate::core::pipeline::{PipelineOutput, run_pipeline};
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::path::Path;

impl AnalysisResult {
    pub fn display_as_table(&self) -> String {
        let summary = &self.summary;

        let mut totals = ui::new_styled_table();
        totals.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
        totals.add_row(vec![
            Cell::new("Total Revenue"),
            ui::amount_cell(format_currency(summary.total_revenue)),
        ]);
        totals.add_row(vec![
            Cell::new("Total Expenses"),
            ui::amount_cell(format_currency(summary.total_expenses)),
        ]);
        totals.add_row(vec![
            Cell::new("Total Profit"),
            ui::amount_cell(format_currency(summary.total_profit)),
        ]);
        totals.add_row(vec![
            Cell::new("Average Profit Margin"),
            ui::amount_cell(format_percentage(summary.average_profit_margin)),
        ]);
        totals.add_row(vec![Cell::new("Revenue Growth"), ui::change_cell(summary.revenue_growth)]);
        totals.add_row(vec![Cell::new("Profit Growth"), ui::change_cell(summary.profit_growth)]);
        totals.add_row(vec![Cell::new("Revenue Trend"), ui::trend_cell(self.trends.revenue_trend)]);
        totals.add_row(vec![Cell::new("Profit Trend"), ui::trend_cell(self.trends.profit_trend)]);

        let mut categories = ui::new_styled_table();
        categories.set_header(vec![
            ui::header_cell("Category"),
            ui::header_cell("Revenue"),
            ui::header_cell("Profit"),
            ui::header_cell("Margin (%)"),
        ]);
        for (name, metrics) in &self.categories {
            categories.add_row(vec![
                Cell::new(name),
                ui::amount_cell(format_currency(metrics.revenue)),
                ui::amount_cell(format_currency(metrics.profit)),
                ui::change_cell(metrics.profit_margin),
            ]);
        }

        let mut output = format!("{}\n\n", ui::style_text("Summary Metrics", ui::StyleType::Title));
        output.push_str(&totals.to_string());
        output.push_str(&format!(
            "\n\n{}\n\n",
            ui::style_text("Category Performance", ui::StyleType::Title)
        ));
        output.push_str(&categories.to_string());
        output
    }
}

impl CleaningStats {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Column"),
            ui::header_cell("Imputed"),
            ui::header_cell("Clipped"),
        ]);
        table.add_row(vec![
            Cell::new("revenue"),
            ui::amount_cell(self.imputed_revenue.to_string()),
            ui::amount_cell(self.clipped_revenue.to_string()),
        ]);
        table.add_row(vec![
            Cell::new("expenses"),
            ui::amount_cell(self.imputed_expenses.to_string()),
            ui::amount_cell(self.clipped_expenses.to_string()),
        ]);
        table.add_row(vec![
            Cell::new("category"),
            ui::amount_cell(self.imputed_category.to_string()),
            ui::amount_cell("-".to_string()),
        ]);

        let mut output = format!("{}\n\n", ui::style_text("Data Cleaning", ui::StyleType::Title));
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{} {}",
            ui::style_text("Rows:", ui::StyleType::TotalLabel),
            ui::style_text(&self.rows.to_string(), ui::StyleType::TotalValue)
        ));
        if self.extreme_values > 0 {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("{} extreme values found before clipping", self.extreme_values),
                    ui::StyleType::Error
                )
            ));
        }
        output
    }
}

/// Runs the pipeline behind a progress bar, then returns its output.
pub(crate) fn run_with_progress(input: &Path, config: &AppConfig) -> Result<PipelineOutput> {
    let pb = ui::new_progress_bar(3);
    pb.set_message("Loading data...");
    let result = run_pipeline(input, config, &|stage: &str| {
        pb.inc(1);
        pb.set_message(match stage {
            "loaded" => "Cleaning data...",
            "cleaned" => "Analyzing...",
            _ => "Done",
        });
    });
    pb.finish_and_clear();
    result.with_context(|| format!("Failed to process {}", input.display()))
}

pub fn run(input: &Path, config: &AppConfig) -> Result<()> {
    let output = run_with_progress(input, config)?;

    if let Some(range) = date_range(&output.records) {
        println!(
            "{}",
            ui::style_text(
                &format!("{} to {}", range.start_date, range.end_date),
                ui::StyleType::Subtle
            )
        );
    }
    println!("{}", output.cleaning.display_as_table());
    ui::print_separator();
    println!("{}", output.analysis.display_as_table());
    Ok(())
}
