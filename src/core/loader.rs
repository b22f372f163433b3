//! Reads financial records from delimited text files.
use crate::core::error::{PipelineError, Result};
use crate::core::record::{Dataset, RawRecord};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const REQUIRED_COLUMNS: [&str; 4] = ["date", "revenue", "expenses", "category"];
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Column positions of the required fields within a header row.
struct ColumnIndex {
    date: usize,
    revenue: usize,
    expenses: usize,
    category: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&c| position(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns(missing));
        }

        // Every position was checked above.
        let idx = |name: &str| position(name).unwrap_or_default();
        Ok(ColumnIndex {
            date: idx("date"),
            revenue: idx("revenue"),
            expenses: idx("expenses"),
            category: idx("category"),
        })
    }
}

/// Loads raw records and validates the required schema.
#[derive(Debug, Clone)]
pub struct Loader {
    date_format: String,
    delimiter: u8,
}

impl Default for Loader {
    fn default() -> Self {
        Loader::new(DEFAULT_DATE_FORMAT)
    }
}

impl Loader {
    pub fn new(date_format: impl Into<String>) -> Self {
        Loader {
            date_format: date_format.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        debug!("Loading records from {}", path.display());
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        self.load_reader(file)
    }

    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .from_reader(reader);

        let columns = ColumnIndex::from_headers(rdr.headers()?)?;

        let mut dataset = Vec::new();
        for row in rdr.records() {
            let row = row.map_err(row_error)?;
            let line = row.position().map_or(0, |p| p.line());
            dataset.push(self.parse_row(&row, &columns, line)?);
        }

        debug!("Loaded {} records", dataset.len());
        Ok(dataset)
    }

    fn parse_row(&self, row: &StringRecord, columns: &ColumnIndex, line: u64) -> Result<RawRecord> {
        let field = |i: usize| row.get(i).unwrap_or("");

        Ok(RawRecord {
            date: self.parse_date(field(columns.date), line)?,
            revenue: parse_amount(field(columns.revenue), "revenue", line)?,
            expenses: parse_amount(field(columns.expenses), "expenses", line)?,
            category: Some(field(columns.category))
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }

    fn parse_date(&self, value: &str, line: u64) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value, &self.date_format)
            .or_else(|e| {
                // Formats with a time component only parse as a datetime.
                NaiveDateTime::parse_from_str(value, &self.date_format)
                    .map(|dt| dt.date())
                    .map_err(|_| e)
            })
            .map_err(|e| PipelineError::Parse {
                line,
                column: "date".to_string(),
                value: value.to_string(),
                reason: format!("expected format {}: {e}", self.date_format),
            })
    }
}

/// Ragged and non-UTF-8 rows become `Parse` errors carrying their line.
fn row_error(err: csv::Error) -> PipelineError {
    let line = err.position().map_or(0, |p| p.line());
    match err.kind() {
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => PipelineError::Parse {
            line,
            column: "row".to_string(),
            value: format!("{len} fields"),
            reason: format!("expected {expected_len} fields"),
        },
        csv::ErrorKind::Utf8 { err: utf8, .. } => PipelineError::Parse {
            line,
            column: "row".to_string(),
            value: format!("field {}", utf8.field() + 1),
            reason: "invalid UTF-8".to_string(),
        },
        _ => PipelineError::Csv(err),
    }
}

fn parse_amount(value: &str, column: &str, line: u64) -> Result<Option<f64>> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let parse_err = |reason: String| PipelineError::Parse {
        line,
        column: column.to_string(),
        value: value.to_string(),
        reason,
    };
    let amount: f64 = value.parse().map_err(|e| parse_err(format!("{e}")))?;
    if !amount.is_finite() {
        return Err(parse_err("amount must be finite".to_string()));
    }
    if amount < 0.0 {
        return Err(parse_err("amount must not be negative".to_string()));
    }
    Ok(Some(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_two_rows_from_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("test_data.csv");
        fs::write(
            &path,
            "date,revenue,expenses,category\n\
             2023-01-01,1000,800,Sales\n\
             2023-01-02,2000,1500,Services\n",
        )?;

        let dataset = Loader::default().load_path(&path)?;
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset[0].date,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        );
        assert_eq!(dataset[1].revenue, Some(2000.0));
        assert_eq!(dataset[1].category.as_deref(), Some("Services"));
        Ok(())
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let data = "date,revenue\n2023-01-01,1000\n";
        let err = Loader::default().load_reader(data.as_bytes()).unwrap_err();
        match err {
            PipelineError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["expenses".to_string(), "category".to_string()]);
            }
            other => panic!("Expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_cells_are_none() -> anyhow::Result<()> {
        let data = "date,revenue,expenses,category\n2023-01-01,,800,\n2023-01-02,NaN,900,Sales\n";
        let dataset = Loader::default().load_reader(data.as_bytes())?;
        assert_eq!(dataset[0].revenue, None);
        assert_eq!(dataset[0].expenses, Some(800.0));
        assert_eq!(dataset[0].category, None);
        assert_eq!(dataset[1].revenue, None);
        Ok(())
    }

    #[test]
    fn test_malformed_date_reports_line() {
        let data = "date,revenue,expenses,category\n2023-01-01,1,1,Sales\n01/02/2023,1,1,Sales\n";
        let err = Loader::default().load_reader(data.as_bytes()).unwrap_err();
        match err {
            PipelineError::Parse { line, column, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "date");
                assert_eq!(value, "01/02/2023");
            }
            other => panic!("Expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_date_format_and_delimiter() -> anyhow::Result<()> {
        let data = "date;revenue;expenses;category\n02/01/2023;10.5;3;Consulting\n";
        let dataset = Loader::new("%d/%m/%Y")
            .with_delimiter(b';')
            .load_reader(data.as_bytes())?;
        assert_eq!(
            dataset[0].date,
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
        );
        assert_eq!(dataset[0].revenue, Some(10.5));
        Ok(())
    }

    #[test]
    fn test_datetime_format() -> anyhow::Result<()> {
        let data = "date,revenue,expenses,category\n2023-01-05 10:30:00,1,1,Sales\n";
        let dataset = Loader::new("%Y-%m-%d %H:%M:%S").load_reader(data.as_bytes())?;
        assert_eq!(
            dataset[0].date,
            NaiveDate::from_ymd_opt(2023, 1, 5).unwrap()
        );
        Ok(())
    }

    #[test]
    fn test_non_numeric_and_negative_amounts_fail() {
        let bad = "date,revenue,expenses,category\n2023-01-01,abc,1,Sales\n";
        assert!(matches!(
            Loader::default().load_reader(bad.as_bytes()),
            Err(PipelineError::Parse { .. })
        ));

        let negative = "date,revenue,expenses,category\n2023-01-01,10,-1,Sales\n";
        assert!(matches!(
            Loader::default().load_reader(negative.as_bytes()),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn test_extra_columns_are_ignored() -> anyhow::Result<()> {
        let data = "category,profit,date,expenses,revenue\nSales,999,2023-01-01,5,10\n";
        let dataset = Loader::default().load_reader(data.as_bytes())?;
        assert_eq!(dataset[0].revenue, Some(10.0));
        assert_eq!(dataset[0].expenses, Some(5.0));
        Ok(())
    }

    #[test]
    fn test_ragged_row_reports_line() {
        let data = "date,revenue,expenses,category\n2023-01-01,1,1,Sales\n2023-01-02,1,1\n";
        let err = Loader::default().load_reader(data.as_bytes()).unwrap_err();
        match err {
            PipelineError::Parse { line, value, reason, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "3 fields");
                assert_eq!(reason, "expected 4 fields");
            }
            other => panic!("Expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_row_is_parse_error() {
        let data: &[u8] = b"date,revenue,expenses,category\n2023-01-01,1,1,Sal\xffes\n";
        let err = Loader::default().load_reader(data).unwrap_err();
        match err {
            PipelineError::Parse { column, reason, .. } => {
                assert_eq!(column, "row");
                assert_eq!(reason, "invalid UTF-8");
            }
            other => panic!("Expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Loader::default().load_path("/no/such/file.csv").unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
