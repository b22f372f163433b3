//! Imputation, outlier clipping and derived profit fields.
use crate::core::error::{PipelineError, Result};
use crate::core::record::{RawRecord, Record};
use crate::core::stats;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
pub const FALLBACK_CATEGORY: &str = "Uncategorized";

/// Counters describing what a cleaning pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub rows: usize,
    pub imputed_revenue: usize,
    pub imputed_expenses: usize,
    pub imputed_category: usize,
    pub clipped_revenue: usize,
    pub clipped_expenses: usize,
    /// Values further than the z-score threshold from the column mean, before clipping.
    pub extreme_values: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fences {
    lower: f64,
    upper: f64,
}

impl Fences {
    fn clip(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }
}

/// Cleans a dataset without modifying the caller's copy.
#[derive(Debug, Clone)]
pub struct Cleaner {
    iqr_multiplier: f64,
    outlier_threshold: Option<f64>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Cleaner {
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            outlier_threshold: None,
        }
    }
}

impl Cleaner {
    /// Reports values beyond `threshold` standard deviations as extreme.
    /// Clipping is unaffected and always uses the IQR fences.
    pub fn with_outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = Some(threshold);
        self
    }

    pub fn clean(&self, dataset: &[RawRecord]) -> Result<Vec<Record>> {
        self.clean_with_stats(dataset).map(|(records, _)| records)
    }

    pub fn clean_with_stats(&self, dataset: &[RawRecord]) -> Result<(Vec<Record>, CleaningStats)> {
        if dataset.is_empty() {
            return Err(PipelineError::EmptyDataset(
                "cannot clean a dataset with no records".to_string(),
            ));
        }
        let mut cleaning = CleaningStats {
            rows: dataset.len(),
            ..Default::default()
        };

        let (revenue, imputed) = fill_median(dataset.iter().map(|r| r.revenue), "revenue")?;
        cleaning.imputed_revenue = imputed;
        let (expenses, imputed) = fill_median(dataset.iter().map(|r| r.expenses), "expenses")?;
        cleaning.imputed_expenses = imputed;
        let (categories, imputed) = fill_mode(dataset.iter().map(|r| r.category.as_deref()));
        cleaning.imputed_category = imputed;

        cleaning.extreme_values = self.count_extreme(&revenue) + self.count_extreme(&expenses);
        if cleaning.extreme_values > 0 {
            warn!(
                "{} values lie beyond the outlier threshold and will be clipped",
                cleaning.extreme_values
            );
        }

        let (revenue, clipped) = self.clip_column(revenue);
        cleaning.clipped_revenue = clipped;
        let (expenses, clipped) = self.clip_column(expenses);
        cleaning.clipped_expenses = clipped;

        let records = dataset
            .iter()
            .zip(revenue)
            .zip(expenses)
            .zip(categories)
            .map(|(((raw, revenue), expenses), category)| {
                Record::new(raw.date, revenue, expenses, category)
            })
            .collect();

        debug!(?cleaning, "Cleaned dataset");
        Ok((records, cleaning))
    }

    fn fences(&self, values: &[f64]) -> Option<Fences> {
        let (q1, q3) = stats::quartiles(values)?;
        let iqr = q3 - q1;
        Some(Fences {
            lower: q1 - self.iqr_multiplier * iqr,
            upper: q3 + self.iqr_multiplier * iqr,
        })
    }

    fn clip_column(&self, values: Vec<f64>) -> (Vec<f64>, usize) {
        let Some(fences) = self.fences(&values) else {
            return (values, 0);
        };
        let mut clipped = 0;
        let values = values
            .into_iter()
            .map(|v| {
                let c = fences.clip(v);
                if c != v {
                    clipped += 1;
                }
                c
            })
            .collect();
        (values, clipped)
    }

    fn count_extreme(&self, values: &[f64]) -> usize {
        let Some(threshold) = self.outlier_threshold else {
            return 0;
        };
        match (stats::mean(values), stats::std_dev(values)) {
            (Some(mean), Some(sd)) if sd > 0.0 => values
                .iter()
                .filter(|v| ((*v - mean) / sd).abs() > threshold)
                .count(),
            _ => 0,
        }
    }
}

fn fill_median(
    column: impl Iterator<Item = Option<f64>> + Clone,
    name: &str,
) -> Result<(Vec<f64>, usize)> {
    let present: Vec<f64> = column.clone().flatten().collect();
    let median = stats::median(&present).ok_or_else(|| {
        PipelineError::EmptyDataset(format!("column {name} has no values to impute from"))
    })?;

    let mut imputed = 0;
    let filled = column
        .map(|v| {
            v.unwrap_or_else(|| {
                imputed += 1;
                median
            })
        })
        .collect();
    Ok((filled, imputed))
}

fn fill_mode<'a>(column: impl Iterator<Item = Option<&'a str>> + Clone) -> (Vec<String>, usize) {
    let mode = stats::mode(column.clone().flatten()).unwrap_or(FALLBACK_CATEGORY);

    let mut imputed = 0;
    let filled = column
        .map(|c| match c {
            Some(c) => c.to_string(),
            None => {
                imputed += 1;
                mode.to_string()
            }
        })
        .collect();
    (filled, imputed)
}

/// Writes cleaned records, including the derived columns, as CSV.
pub fn write_csv(records: &[Record], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    debug!("Wrote {} cleaned records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(day: u32, revenue: Option<f64>, expenses: Option<f64>, category: Option<&str>) -> RawRecord {
        RawRecord {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            revenue,
            expenses,
            category: category.map(str::to_string),
        }
    }

    fn to_raw(records: &[Record]) -> Vec<RawRecord> {
        records.iter().map(RawRecord::from).collect()
    }

    fn noisy_dataset() -> Vec<RawRecord> {
        vec![
            raw(1, Some(1000.0), Some(800.0), Some("Sales")),
            raw(2, Some(1200.0), None, Some("Services")),
            raw(3, None, Some(850.0), None),
            raw(4, Some(1300.0), Some(950.0), Some("Sales")),
            raw(5, Some(50000.0), Some(900.0), Some("Services")),
            raw(6, Some(1100.0), Some(20.0), Some("Consulting")),
            raw(7, Some(0.0), Some(870.0), Some("Sales")),
            raw(8, Some(1250.0), Some(910.0), Some("Services")),
        ]
    }

    #[test]
    fn test_missing_values_are_filled() -> anyhow::Result<()> {
        let dataset = vec![
            raw(1, Some(1000.0), Some(800.0), Some("Sales")),
            raw(2, None, Some(1500.0), None),
        ];
        let (cleaned, cleaning) = Cleaner::default().clean_with_stats(&dataset)?;
        assert_eq!(cleaned[1].revenue, 1000.0);
        assert_eq!(cleaned[1].category, "Sales");
        assert_eq!(cleaning.imputed_revenue, 1);
        assert_eq!(cleaning.imputed_category, 1);
        assert_eq!(cleaning.imputed_expenses, 0);
        Ok(())
    }

    #[test]
    fn test_clean_does_not_touch_input() -> anyhow::Result<()> {
        let dataset = noisy_dataset();
        let before = dataset.clone();
        Cleaner::default().clean(&dataset)?;
        assert_eq!(dataset, before);
        Ok(())
    }

    #[test]
    fn test_values_within_fences_after_clean() -> anyhow::Result<()> {
        let cleaner = Cleaner::default();
        let cleaned = cleaner.clean(&noisy_dataset())?;

        for column in [
            cleaned.iter().map(|r| r.revenue).collect::<Vec<_>>(),
            cleaned.iter().map(|r| r.expenses).collect::<Vec<_>>(),
        ] {
            let fences = cleaner.fences(&column).unwrap();
            assert!(column.iter().all(|v| *v >= fences.lower && *v <= fences.upper));
        }
        assert!(cleaned.iter().all(|r| !r.category.is_empty()));
        Ok(())
    }

    #[test]
    fn test_outliers_are_clipped() -> anyhow::Result<()> {
        let (cleaned, cleaning) = Cleaner::default().clean_with_stats(&noisy_dataset())?;
        // Revenue sorted: 0, 1000, 1100, 1200, 1200, 1250, 1300, 50000 -> Q1 1000, Q3 1300.
        assert_eq!(cleaned[4].revenue, 1750.0);
        assert_eq!(cleaned[6].revenue, 550.0);
        assert_eq!(cleaning.clipped_revenue, 2);
        assert!(cleaning.clipped_expenses >= 1);
        Ok(())
    }

    #[test]
    fn test_profit_is_recomputed() -> anyhow::Result<()> {
        let cleaned = Cleaner::default().clean(&noisy_dataset())?;
        for r in &cleaned {
            assert_eq!(r.profit, r.revenue - r.expenses);
        }
        Ok(())
    }

    #[test]
    fn test_cleaning_is_idempotent() -> anyhow::Result<()> {
        let cleaner = Cleaner::default();
        let once = cleaner.clean(&noisy_dataset())?;
        let twice = cleaner.clean(&to_raw(&once))?;
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn test_category_mode_tie_break() -> anyhow::Result<()> {
        let dataset = vec![
            raw(1, Some(1.0), Some(1.0), Some("Services")),
            raw(2, Some(1.0), Some(1.0), Some("Sales")),
            raw(3, Some(1.0), Some(1.0), None),
        ];
        let cleaned = Cleaner::default().clean(&dataset)?;
        assert_eq!(cleaned[2].category, "Sales");
        Ok(())
    }

    #[test]
    fn test_no_categories_uses_fallback() -> anyhow::Result<()> {
        let dataset = vec![raw(1, Some(1.0), Some(1.0), None)];
        let cleaned = Cleaner::default().clean(&dataset)?;
        assert_eq!(cleaned[0].category, FALLBACK_CATEGORY);
        Ok(())
    }

    #[test]
    fn test_empty_inputs_fail() {
        assert!(matches!(
            Cleaner::default().clean(&[]),
            Err(PipelineError::EmptyDataset(_))
        ));
        let all_missing = vec![raw(1, None, Some(1.0), Some("Sales"))];
        assert!(matches!(
            Cleaner::default().clean(&all_missing),
            Err(PipelineError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_extreme_values_are_counted() -> anyhow::Result<()> {
        let (_, cleaning) = Cleaner::default()
            .with_outlier_threshold(2.0)
            .clean_with_stats(&noisy_dataset())?;
        assert!(cleaning.extreme_values >= 1);

        let (_, cleaning) = Cleaner::default().clean_with_stats(&noisy_dataset())?;
        assert_eq!(cleaning.extreme_values, 0);
        Ok(())
    }

    #[test]
    fn test_write_csv() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("processed").join("out.csv");
        let cleaned = Cleaner::default().clean(&noisy_dataset())?;
        write_csv(&cleaned, &path)?;
        let content = std::fs::read_to_string(&path)?;
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("date,revenue,expenses,category,profit,profit_margin")
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("2023-01-01,"));
        assert!(first.contains(",Sales,"));
        assert_eq!(lines.count(), cleaned.len() - 1);
        Ok(())
    }
}
