use finauto::core::config::AppConfig;
use finauto::{AppCommand, ReportOptions, run_command};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use std::fs;
    use std::path::{Path, PathBuf};

    pub const SAMPLE_CSV: &str = "date,revenue,expenses,category
2023-01-05,1000,800,Sales
2023-01-20,1200,900,Services
2023-02-03,,850,Sales
2023-02-17,1300,950,Consulting
2023-03-02,1250,,Services
2023-03-19,50000,900,Sales
2023-04-08,1400,1000,
2023-04-22,1350,980,Consulting
";

    /// Writes the sample CSV and a config whose paths all live under `dir`.
    pub fn write_fixture(dir: &Path, include_charts: bool) -> (PathBuf, PathBuf) {
        let input = dir.join("raw").join("financial_data.csv");
        fs::create_dir_all(input.parent().unwrap()).unwrap();
        fs::write(&input, SAMPLE_CSV).unwrap();

        let config = dir.join("config.yaml");
        let yaml = format!(
            r#"
data:
  input_path: "{input}"
  output_path: "{processed}"
analysis:
  min_data_points: 5
reporting:
  report_path: "{report}"
  charts_dir: "{charts}"
  include_charts: {include_charts}
"#,
            input = input.display(),
            processed = dir.join("processed").join("processed_data.csv").display(),
            report = dir.join("reports").join("financial_insights.md").display(),
            charts = dir.join("reports").join("charts").display(),
        );
        fs::write(&config, yaml).unwrap();
        (input, config)
    }
}

fn config_arg(path: &Path) -> Option<&str> {
    path.to_str()
}

#[test_log::test]
fn test_full_report_flow() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let (_, config_path) = test_utils::write_fixture(dir.path(), true);

    run_command(
        AppCommand::Report(ReportOptions::default()),
        config_arg(&config_path),
    )?;

    let reports = dir.path().join("reports");
    let report = fs::read_to_string(reports.join("financial_insights.md"))?;
    info!(%report, "Generated report");
    assert!(report.starts_with("# Financial Analysis Report"));
    assert!(report.contains("Total Revenue"));
    for category in ["### Consulting", "### Sales", "### Services"] {
        assert!(report.contains(category), "missing {category}");
    }
    assert!(report.contains("(charts/trends.svg)"));
    assert!(reports.join("charts").join("trends.svg").exists());
    assert!(reports.join("charts").join("category_performance.svg").exists());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(reports.join("financial_insights.json"))?)?;
    assert!(json["summary"]["total_revenue"].as_f64().is_some());
    assert_eq!(json["categories"].as_object().map(|c| c.len()), Some(3));

    let processed = fs::read_to_string(dir.path().join("processed").join("processed_data.csv"))?;
    let mut lines = processed.lines();
    let header = lines.next().unwrap_or_default();
    assert!(header.contains("profit"));
    assert!(header.contains("profit_margin"));
    assert_eq!(lines.count(), 8);
    assert!(!processed.contains("50000"), "outlier should be clipped");
    Ok(())
}

#[test_log::test]
fn test_report_overrides_and_no_charts() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let (input, config_path) = test_utils::write_fixture(dir.path(), true);
    let output = dir.path().join("custom").join("q1.md");

    run_command(
        AppCommand::Report(ReportOptions {
            input: Some(input),
            output: Some(output.clone()),
            no_charts: true,
            email: false,
        }),
        config_arg(&config_path),
    )?;

    assert!(output.exists());
    assert!(dir.path().join("custom").join("q1.json").exists());
    assert!(!dir.path().join("reports").join("charts").exists());
    assert!(!fs::read_to_string(&output)?.contains("!["));
    Ok(())
}

#[test_log::test]
fn test_summary_command() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let (input, config_path) = test_utils::write_fixture(dir.path(), false);

    run_command(AppCommand::Summary { input: Some(input) }, config_arg(&config_path))?;

    // Summary only prints; nothing is written.
    assert!(!dir.path().join("reports").exists());
    assert!(!dir.path().join("processed").exists());
    Ok(())
}

#[test_log::test]
fn test_missing_columns_fail() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let (input, config_path) = test_utils::write_fixture(dir.path(), false);
    fs::write(&input, "date,revenue,category\n2023-01-05,1000,Sales\n")?;

    let err = run_command(
        AppCommand::Report(ReportOptions::default()),
        config_arg(&config_path),
    )
    .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Missing required columns: expenses"), "{message}");
    assert!(!dir.path().join("reports").exists());
    Ok(())
}

#[test_log::test]
fn test_email_without_addresses_fails() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let (_, config_path) = test_utils::write_fixture(dir.path(), false);

    let result = run_command(
        AppCommand::Report(ReportOptions {
            email: true,
            ..ReportOptions::default()
        }),
        config_arg(&config_path),
    );

    assert!(result.is_err());
    // The report is still written before the email step.
    assert!(dir.path().join("reports").join("financial_insights.md").exists());
    Ok(())
}

#[test]
fn test_missing_config_path_fails() {
    let result = run_command(
        AppCommand::Summary { input: None },
        Some("/no/such/finauto/config.yaml"),
    );
    assert!(result.is_err());
    assert!(AppConfig::load_from_path("/no/such/finauto/config.yaml").is_err());
}
