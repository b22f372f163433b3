use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub date_format: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            input_path: PathBuf::from("data/raw/financial_data_2023.csv"),
            output_path: PathBuf::from("data/processed/processed_data.csv"),
            date_format: crate::core::loader::DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Z-score beyond which values are reported as extreme before clipping.
    pub outlier_threshold: f64,
    pub min_data_points: usize,
    pub categories: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            outlier_threshold: 3.0,
            min_data_points: 30,
            categories: vec![
                "Sales".to_string(),
                "Services".to_string(),
                "Consulting".to_string(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReportingConfig {
    pub report_path: PathBuf,
    pub charts_dir: PathBuf,
    pub include_charts: bool,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        ReportingConfig {
            report_path: PathBuf::from("reports/financial_insights.md"),
            charts_dir: PathBuf::from("reports/charts"),
            include_charts: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub recipient_email: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender_email: String::new(),
            recipient_email: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
    pub reporting: ReportingConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    /// Loads the config at the default location, or the defaults when no file exists.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "finauto", "finauto")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
