//! Financial record types shared by the pipeline stages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A row as read from the input file. Empty cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub revenue: Option<f64>,
    pub expenses: Option<f64>,
    pub category: Option<String>,
}

/// A cleaned row with its derived profit fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub revenue: f64,
    pub expenses: f64,
    pub category: String,
    pub profit: f64,
    pub profit_margin: f64,
}

impl Record {
    /// Builds a record and derives `profit` and `profit_margin`.
    ///
    /// The margin is a percentage rounded to two decimals. A record with zero
    /// revenue has a margin of `0.0`.
    pub fn new(date: NaiveDate, revenue: f64, expenses: f64, category: impl Into<String>) -> Self {
        let profit = revenue - expenses;
        let profit_margin = if revenue == 0.0 {
            0.0
        } else {
            crate::core::helpers::round2(profit / revenue * 100.0)
        };
        Record {
            date,
            revenue,
            expenses,
            category: category.into(),
            profit,
            profit_margin,
        }
    }
}

impl From<&Record> for RawRecord {
    fn from(record: &Record) -> Self {
        RawRecord {
            date: record.date,
            revenue: Some(record.revenue),
            expenses: Some(record.expenses),
            category: Some(record.category.clone()),
        }
    }
}

/// Records in load order, before cleaning.
pub type Dataset = Vec<RawRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    #[test]
    fn test_record_derives_profit_and_margin() {
        let r = Record::new(day(1), 1000.0, 800.0, "Sales");
        assert_eq!(r.profit, 200.0);
        assert_eq!(r.profit_margin, 20.0);
    }

    #[test]
    fn test_margin_is_rounded() {
        let r = Record::new(day(1), 3000.0, 2000.0, "Sales");
        assert_eq!(r.profit_margin, 33.33);
    }

    #[test]
    fn test_zero_revenue_margin() {
        let r = Record::new(day(1), 0.0, 150.0, "Services");
        assert_eq!(r.profit, -150.0);
        assert_eq!(r.profit_margin, 0.0);
    }

    #[test]
    fn test_raw_from_record() {
        let r = Record::new(day(2), 10.0, 5.0, "Consulting");
        let raw = RawRecord::from(&r);
        assert_eq!(raw.revenue, Some(10.0));
        assert_eq!(raw.expenses, Some(5.0));
        assert_eq!(raw.category.as_deref(), Some("Consulting"));
    }
}
