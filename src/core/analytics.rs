//! Summary, trend and category metrics over a cleaned dataset.
use crate::core::error::{PipelineError, Result};
use crate::core::helpers::round2;
use crate::core::record::Record;
use crate::core::stats;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use tracing::{debug, warn};

/// Slopes smaller than this in magnitude are treated as flat.
const SLOPE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
}

impl Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TrendDirection::Upward => "upward",
                TrendDirection::Downward => "downward",
                TrendDirection::Stable => "stable",
            }
        )
    }
}

impl TrendDirection {
    /// Direction of the least squares line through `values` in order.
    pub fn from_series(values: &[f64]) -> Self {
        match stats::ols_slope(values) {
            Some(slope) if slope > SLOPE_EPSILON => TrendDirection::Upward,
            Some(slope) if slope < -SLOPE_EPSILON => TrendDirection::Downward,
            _ => TrendDirection::Stable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_profit: f64,
    pub average_profit_margin: f64,
    pub revenue_growth: f64,
    pub profit_growth: f64,
}

/// Total of a metric over one calendar month. `month` is the first day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub monthly_revenue: Vec<MonthlyPoint>,
    pub monthly_profit: Vec<MonthlyPoint>,
    pub revenue_trend: TrendDirection,
    pub profit_trend: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    pub revenue: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

/// Everything the report needs from one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: SummaryMetrics,
    pub trends: TrendAnalysis,
    pub categories: BTreeMap<String, CategoryMetrics>,
}

/// Monthly totals of revenue and profit, one entry per month from the earliest
/// to the latest record date. Months without records are zero.
pub fn monthly_totals(records: &[Record]) -> (Vec<MonthlyPoint>, Vec<MonthlyPoint>) {
    let mut buckets: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for r in records {
        let entry = buckets.entry(month_start(r.date)).or_default();
        entry.0 += r.revenue;
        entry.1 += r.profit;
    }

    let (Some(first), Some(last)) = (
        buckets.keys().next().copied(),
        buckets.keys().next_back().copied(),
    ) else {
        return (Vec::new(), Vec::new());
    };

    let mut revenue = Vec::new();
    let mut profit = Vec::new();
    let mut month = first;
    while month <= last {
        let (r, p) = buckets.get(&month).copied().unwrap_or_default();
        revenue.push(MonthlyPoint { month, value: r });
        profit.push(MonthlyPoint { month, value: p });
        match month.checked_add_months(Months::new(1)) {
            Some(next) => month = next,
            None => break,
        }
    }
    (revenue, profit)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `(last - first) / first * 100` rounded to two decimals; zero when `first` is zero.
fn growth(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return 0.0;
    }
    round2((last - first) / first * 100.0)
}

/// Computes an [`AnalysisResult`] over cleaned records in their given order.
pub struct Analyzer<'a> {
    records: &'a [Record],
    min_data_points: usize,
    expected_categories: Vec<String>,
}

impl<'a> Analyzer<'a> {
    pub fn new(records: &'a [Record]) -> Self {
        Analyzer {
            records,
            min_data_points: 0,
            expected_categories: Vec::new(),
        }
    }

    /// Warn when fewer records than this are analyzed.
    pub fn with_min_data_points(mut self, min: usize) -> Self {
        self.min_data_points = min;
        self
    }

    /// Warn about categories outside this list. An empty list disables the check.
    pub fn with_expected_categories(mut self, categories: &[String]) -> Self {
        self.expected_categories = categories.to_vec();
        self
    }

    pub fn analyze(&self) -> Result<AnalysisResult> {
        if self.records.is_empty() {
            return Err(PipelineError::EmptyDataset(
                "cannot analyze a dataset with no records".to_string(),
            ));
        }
        if self.records.len() < self.min_data_points {
            warn!(
                "Only {} records available, results may be unreliable (minimum {})",
                self.records.len(),
                self.min_data_points
            );
        }

        let result = AnalysisResult {
            summary: self.summary_metrics()?,
            trends: self.trend_analysis(),
            categories: self.category_analysis(),
        };
        self.check_categories(&result.categories);
        debug!(
            "Analyzed {} records across {} categories",
            self.records.len(),
            result.categories.len()
        );
        Ok(result)
    }

    fn summary_metrics(&self) -> Result<SummaryMetrics> {
        let (Some(first), Some(last)) = (self.records.first(), self.records.last()) else {
            return Err(PipelineError::EmptyDataset(
                "growth is undefined without records".to_string(),
            ));
        };
        let margins: Vec<f64> = self.records.iter().map(|r| r.profit_margin).collect();

        Ok(SummaryMetrics {
            total_revenue: self.records.iter().map(|r| r.revenue).sum(),
            total_expenses: self.records.iter().map(|r| r.expenses).sum(),
            total_profit: self.records.iter().map(|r| r.profit).sum(),
            average_profit_margin: stats::mean(&margins).unwrap_or_default(),
            revenue_growth: growth(first.revenue, last.revenue),
            profit_growth: growth(first.profit, last.profit),
        })
    }

    fn trend_analysis(&self) -> TrendAnalysis {
        let (monthly_revenue, monthly_profit) = monthly_totals(self.records);
        let values = |points: &[MonthlyPoint]| points.iter().map(|p| p.value).collect::<Vec<_>>();

        TrendAnalysis {
            revenue_trend: TrendDirection::from_series(&values(monthly_revenue.as_slice())),
            profit_trend: TrendDirection::from_series(&values(monthly_profit.as_slice())),
            monthly_revenue,
            monthly_profit,
        }
    }

    fn category_analysis(&self) -> BTreeMap<String, CategoryMetrics> {
        let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
        for r in self.records {
            groups.entry(r.category.as_str()).or_default().push(r);
        }

        groups
            .into_iter()
            .map(|(category, rows)| {
                let margins: Vec<f64> = rows.iter().map(|r| r.profit_margin).collect();
                let metrics = CategoryMetrics {
                    revenue: round2(rows.iter().map(|r| r.revenue).sum()),
                    profit: round2(rows.iter().map(|r| r.profit).sum()),
                    profit_margin: round2(stats::mean(&margins).unwrap_or_default()),
                };
                (category.to_string(), metrics)
            })
            .collect()
    }

    fn check_categories(&self, categories: &BTreeMap<String, CategoryMetrics>) {
        if self.expected_categories.is_empty() {
            return;
        }
        let expected: BTreeSet<&str> = self.expected_categories.iter().map(String::as_str).collect();
        for category in categories.keys() {
            if !expected.contains(category.as_str()) {
                warn!("Category {category:?} is not in the configured category list");
            }
        }
    }
}
