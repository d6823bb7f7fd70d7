//! Column profiling over a bounded row sample.
//!
//! Cost is `O(sample_size × columns)` no matter how many rows the table has;
//! only `total_rows`/`total_columns` look at the whole table.

use crate::config::ProfilerConfig;
use crate::table::NormalizedTable;
use crate::ExplorerResult;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_SAMPLE_SIZE: usize = 100;
pub const DEFAULT_TYPE_THRESHOLD: f64 = 0.8;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    Numeric,
    Date,
    Text,
    /// No non-empty value in the sample.
    Empty,
}

impl InferredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::Numeric => "numeric",
            InferredType::Date => "date",
            InferredType::Text => "text",
            InferredType::Empty => "empty",
        }
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: InferredType,
    /// Absent or empty cells of this column within the sample.
    pub null_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub total_rows: usize,
    pub total_columns: usize,
    pub sampled_rows: usize,
    /// Absent or empty cells within the sample, summed over all columns.
    pub null_count: usize,
    pub column_profiles: Vec<ColumnProfile>,
}

impl Profile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.column_profiles.iter().find(|c| c.name == name)
    }

    /// Share of non-null cells, rounded to a whole percent. The null count
    /// comes from the sample while the cell count covers the whole table, so
    /// this over-reports completeness for tables larger than the sample.
    /// `None` for a table without cells.
    pub fn completeness_percent(&self) -> Option<u8> {
        let cells = self.total_rows * self.total_columns;
        if cells == 0 {
            return None;
        }
        let filled = cells.saturating_sub(self.null_count) as f64;
        Some((filled / cells as f64 * 100.0).round() as u8)
    }
}

/// Profiles tables with a fixed sample size and type thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Profiler {
    config: ProfilerConfig,
}

impl Profiler {
    pub fn new(config: ProfilerConfig) -> ExplorerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    pub fn profile(&self, table: &NormalizedTable) -> Profile {
        let sample = &table.rows()[..table.row_count().min(self.config.sample_size)];

        let column_profiles: Vec<ColumnProfile> = table
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<&str> = sample
                    .iter()
                    .filter_map(|row| row.cell(idx))
                    .filter(|v| !v.is_empty())
                    .collect();
                ColumnProfile {
                    name: name.clone(),
                    inferred_type: self.infer_type(&values),
                    null_count: sample.len() - values.len(),
                }
            })
            .collect();

        let null_count = column_profiles.iter().map(|c| c.null_count).sum();
        tracing::trace!(
            sampled = sample.len(),
            total = table.row_count(),
            null_count,
            "profiled table"
        );

        Profile {
            total_rows: table.row_count(),
            total_columns: table.columns().len(),
            sampled_rows: sample.len(),
            null_count,
            column_profiles,
        }
    }

    /// `values` are the non-empty sampled cells of one column. Numeric is
    /// checked before date, so a column of bare years is numeric.
    fn infer_type(&self, values: &[&str]) -> InferredType {
        if values.is_empty() {
            return InferredType::Empty;
        }
        let total = values.len() as f64;
        let ratio =
            |pred: fn(&str) -> bool| values.iter().filter(|v| pred(v)).count() as f64 / total;

        if ratio(is_numeric) > self.config.numeric_threshold {
            InferredType::Numeric
        } else if ratio(is_date) > self.config.date_threshold {
            InferredType::Date
        } else {
            InferredType::Text
        }
    }
}

/// Profile `table` with default thresholds, sampling `sample_size` leading rows.
pub fn profile(table: &NormalizedTable, sample_size: usize) -> ExplorerResult<Profile> {
    let profiler = Profiler::new(ProfilerConfig {
        sample_size,
        ..ProfilerConfig::default()
    })?;
    Ok(profiler.profile(table))
}

/// Whole trimmed text is a finite number; partial parses don't count.
fn is_numeric(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && v.parse::<f64>().map_or(false, f64::is_finite)
}

fn is_date(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() {
        return false;
    }
    is_year(v)
        || is_year_month(v)
        || DateTime::parse_from_rfc3339(v).is_ok()
        || DateTime::parse_from_rfc2822(v).is_ok()
        || DATE_FORMATS
            .iter()
            .any(|f| NaiveDate::parse_from_str(v, f).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(v, f).is_ok())
}

fn is_year(v: &str) -> bool {
    v.len() == 4 && v.bytes().all(|b| b.is_ascii_digit())
}

// YYYY-MM
fn is_year_month(v: &str) -> bool {
    v.len() == 7
        && v.as_bytes()[4] == b'-'
        && NaiveDate::parse_from_str(&format!("{v}-01"), "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_requires_full_parse() {
        assert!(is_numeric("42"));
        assert!(is_numeric(" -3.5e2 "));
        assert!(!is_numeric("12abc"));
        assert!(!is_numeric("inf"));
        assert!(!is_numeric("NaN"));
        assert!(!is_numeric("   "));
    }

    #[test]
    fn date_formats() {
        for v in [
            "2024-03-01",
            "2024/03/01",
            "03/15/2024",
            "15/03/2024",
            "2024-03-01T10:20:30Z",
            "2024-03-01 10:20:30",
            "Tue, 1 Jul 2003 10:52:37 +0200",
            "March 5, 2024",
            "1999",
            "2024-03",
        ] {
            assert!(is_date(v), "{v} should parse as a date");
        }
        for v in ["red", "42", "2024-13-45", "12:30"] {
            assert!(!is_date(v), "{v} should not parse as a date");
        }
    }
}
