//! Formatting, file and validation helpers shared across the crate.

use crate::core::error::{PipelineError, Result};
use crate::core::record::Record;
use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;
use std::{fs, io};
use tracing::{debug, error, info};

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("email pattern is valid"))
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `old_value` to `new_value`, relative to `|old_value|`.
///
/// Returns `0.0` when `old_value` is zero.
pub fn calculate_growth_rate(old_value: f64, new_value: f64) -> f64 {
    if old_value == 0.0 {
        return 0.0;
    }
    round2((new_value - old_value) / old_value.abs() * 100.0)
}

/// Formats a value as `$1,234.56`.
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Earliest and latest dates in the records, or `None` when there are none.
pub fn date_range(records: &[Record]) -> Option<DateRange> {
    let start_date = records.iter().map(|r| r.date).min()?;
    let end_date = records.iter().map(|r| r.date).max()?;
    Some(DateRange {
        start_date,
        end_date,
    })
}

/// Writes `data` as pretty-printed JSON.
pub fn save_to_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(data)?;
    fs::write(path, content).map_err(|e| PipelineError::io(path, e))?;
    info!("Data saved to {}", path.display());
    Ok(())
}

/// Reads a JSON document. Any failure is logged and yields an empty object.
pub fn load_from_json(path: &Path) -> serde_json::Value {
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).map_err(|e| e.to_string()));
    match parsed {
        Ok(value) => value,
        Err(e) => {
            error!("Error loading JSON from {}: {e}", path.display());
            serde_json::Value::Object(serde_json::Map::new())
        }
    }
}

/// Local timestamp suitable for file names, e.g. `20230101_134500`.
pub fn create_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn validate_email(email: &str) -> bool {
    email_re().is_match(email)
}

/// Creates each directory (and its parents) when missing.
pub fn setup_directories<P: AsRef<Path>>(dirs: &[P]) -> io::Result<()> {
    for dir in dirs {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            info!("Created directory: {}", dir.display());
        } else {
            debug!("Directory exists: {}", dir.display());
        }
    }
    Ok(())
}
