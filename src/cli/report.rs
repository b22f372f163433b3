use super::{summary, ui};
use crate::core::cleaner::write_csv;
use crate::core::config::AppConfig;
use crate::core::helpers::{save_to_json, setup_directories};
use crate::core::mailer::{ReportEmail, send_report_or_log};
use crate::report::{ReportArtifacts, ReportGenerator};
use crate::transport::SmtpMailer;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable holding the SMTP password.
pub const SMTP_PASSWORD_ENV: &str = "FINAUTO_SMTP_PASSWORD";

/// Overrides for a single `report` run. `None` falls back to the config.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub no_charts: bool,
    pub email: bool,
}

pub fn run(options: &ReportOptions, config: &AppConfig) -> Result<()> {
    let input = options.input.as_ref().unwrap_or(&config.data.input_path);
    let output = summary::run_with_progress(input, config)?;

    let processed = &config.data.output_path;
    if let Some(parent) = processed.parent().filter(|p| !p.as_os_str().is_empty()) {
        setup_directories(&[parent])
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    write_csv(&output.records, processed)
        .with_context(|| format!("Failed to write processed data to {}", processed.display()))?;
    debug!("Processed data written to {}", processed.display());

    let report_path = options.output.as_ref().unwrap_or(&config.reporting.report_path);
    let charts_dir = (config.reporting.include_charts && !options.no_charts)
        .then_some(config.reporting.charts_dir.as_path());
    let artifacts = ReportGenerator::new(&output.records, &output.analysis)
        .generate(report_path, charts_dir)
        .context("Failed to generate report")?;

    let json_path = report_path.with_extension("json");
    save_to_json(&output.analysis, &json_path)
        .with_context(|| format!("Failed to save analysis to {}", json_path.display()))?;

    print_artifacts(&artifacts, processed, &json_path);

    if options.email {
        send_email(config, &artifacts.report_path)?;
    }
    Ok(())
}

fn print_artifacts(artifacts: &ReportArtifacts, processed: &Path, json_path: &Path) {
    println!(
        "{} {}",
        ui::style_text("Report:", ui::StyleType::TotalLabel),
        ui::style_text(&artifacts.report_path.display().to_string(), ui::StyleType::TotalValue)
    );
    for chart in artifacts.trends_chart.iter().chain(&artifacts.category_chart) {
        println!(
            "{} {}",
            ui::style_text("Chart:", ui::StyleType::TotalLabel),
            chart.display()
        );
    }
    println!(
        "{}",
        ui::style_text(
            &format!("Processed data: {}, analysis: {}", processed.display(), json_path.display()),
            ui::StyleType::Subtle
        )
    );
}

/// Emails the report. A failed delivery is reported but does not fail the run.
fn send_email(config: &AppConfig, report_path: &Path) -> Result<()> {
    let email = &config.email;
    if email.sender_email.is_empty() || email.recipient_email.is_empty() {
        anyhow::bail!("Email requested but sender_email and recipient_email are not both configured");
    }
    let password = std::env::var(SMTP_PASSWORD_ENV).unwrap_or_else(|_| {
        warn!("{SMTP_PASSWORD_ENV} is not set, sending without a password");
        String::new()
    });

    let mailer = SmtpMailer::new(email.smtp_server.as_str(), email.smtp_port).with_password(password);
    let message = ReportEmail::new(
        email.sender_email.as_str(),
        email.recipient_email.as_str(),
        format!("Financial Analysis Report - {}", Local::now().format("%Y-%m-%d")),
        report_path,
    );

    if send_report_or_log(&mailer, &message) {
        info!("Report emailed to {}", email.recipient_email);
        println!("Report emailed to {}", email.recipient_email);
    } else {
        eprintln!(
            "{}",
            ui::style_text("Failed to email the report, see log for details", ui::StyleType::Error)
        );
    }
    Ok(())
}
