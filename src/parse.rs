use crate::quoted::read_quoted;
use crate::table::{NormalizedTable, Record};
use crate::{ExplorerError, ExplorerResult};
use memchr::memchr_iter;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Column name used for JSON values that are not objects.
pub const SYNTHETIC_COLUMN: &str = "value";

/// Upload format, chosen from the file name suffix only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    /// Case-insensitive suffix match; anything else is `UnsupportedFormat`.
    pub fn from_file_name(name: &str) -> ExplorerResult<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(Format::Csv)
        } else if lower.ends_with(".json") {
            Ok(Format::Json)
        } else {
            let extension = Path::new(&lower)
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            Err(ExplorerError::UnsupportedFormat { extension })
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Csv => "CSV",
            Format::Json => "JSON",
        })
    }
}

/// How CSV text is split into fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvDialect {
    /// Split lines on `\n` and fields on `,`. Quotes are not understood, so
    /// a quoted field containing a comma is split in two.
    #[default]
    Naive,
    /// RFC 4180 style: quoted fields may contain commas and newlines.
    Quoted,
}

impl FromStr for CsvDialect {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" => Ok(CsvDialect::Naive),
            "quoted" => Ok(CsvDialect::Quoted),
            other => Err(ExplorerError::InvalidArgument(format!(
                "unknown CSV dialect '{other}' (expected naive or quoted)"
            ))),
        }
    }
}

/// Parse an upload with the default (naive) CSV dialect.
pub fn parse(file_name: &str, raw_text: &str) -> ExplorerResult<NormalizedTable> {
    parse_with(file_name, raw_text, CsvDialect::default())
}

pub fn parse_with(
    file_name: &str,
    raw_text: &str,
    dialect: CsvDialect,
) -> ExplorerResult<NormalizedTable> {
    let format = Format::from_file_name(file_name)?;
    let table = match (format, dialect) {
        (Format::Csv, CsvDialect::Naive) => parse_csv_naive(raw_text)?,
        (Format::Csv, CsvDialect::Quoted) => parse_csv_quoted(raw_text)?,
        (Format::Json, _) => parse_json(raw_text)?,
    };
    tracing::debug!(
        %format,
        ?dialect,
        columns = table.columns().len(),
        rows = table.row_count(),
        "parsed {file_name}"
    );
    Ok(table)
}

/// Split `text` on every `sep` byte. Always yields at least one piece.
fn split_on(text: &str, sep: u8) -> impl Iterator<Item = &str> {
    let mut start = 0usize;
    memchr_iter(sep, text.as_bytes())
        .map(Some)
        .chain(std::iter::once(None))
        .map(move |end| {
            let end = end.unwrap_or(text.len());
            let piece = &text[start..end];
            start = end + 1;
            piece
        })
}

/// Later duplicates get `_1`, `_2`, ... appended.
fn unique_columns<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let mut candidate = name.clone();
            let mut counter = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{name}_{counter}");
                counter += 1;
            }
            candidate
        })
        .collect()
}

/// Zip fields against a header of `width` columns: pad with `""`, drop extras.
fn fit_to_width<'a, I>(fields: I, width: usize) -> Record
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fields = fields.into_iter();
    Record::from_cells(
        (0..width)
            .map(|_| Some(fields.next().unwrap_or_default().to_string()))
            .collect(),
    )
}

fn parse_csv_naive(text: &str) -> ExplorerResult<NormalizedTable> {
    let mut lines = split_on(text, b'\n').filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| ExplorerError::MalformedInput {
            format: Format::Csv,
            message: "no header row".into(),
        })?;

    let columns = unique_columns(split_on(header, b',').map(|h| h.trim().to_string()));
    let width = columns.len();
    let rows = lines
        .map(|line| fit_to_width(split_on(line, b',').map(str::trim), width))
        .collect();

    Ok(NormalizedTable::new(columns, rows))
}

fn parse_csv_quoted(text: &str) -> ExplorerResult<NormalizedTable> {
    // In-memory reader never pends, so blocking on it is immediate.
    let (header, records) = futures::executor::block_on(read_quoted(text))?;
    let columns = unique_columns(header);
    let width = columns.len();
    let rows = records
        .iter()
        .map(|fields| fit_to_width(fields.iter().map(String::as_str), width))
        .collect();

    Ok(NormalizedTable::new(columns, rows))
}

/// Cell text for a JSON value; `null` is absent.
fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => Some(nested.to_string()),
    }
}

/// Accumulates JSON rows; the column set is fixed by the first record except
/// for the synthetic column, which is appended on first use.
struct JsonRows {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Record>,
}

impl JsonRows {
    fn new(columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, item: Value) {
        let mut record = Record::with_width(self.columns.len());
        match item {
            Value::Object(map) => {
                for (key, value) in map {
                    if let Some(&idx) = self.index.get(&key) {
                        record.set(idx, stringify(value));
                    }
                }
            }
            scalar => {
                let idx = self.synthetic_index();
                record.set(idx, stringify(scalar));
            }
        }
        self.rows.push(record);
    }

    fn synthetic_index(&mut self) -> usize {
        if let Some(&idx) = self.index.get(SYNTHETIC_COLUMN) {
            return idx;
        }
        let idx = self.columns.len();
        self.columns.push(SYNTHETIC_COLUMN.to_string());
        self.index.insert(SYNTHETIC_COLUMN.to_string(), idx);
        idx
    }

    fn finish(self) -> NormalizedTable {
        let width = self.columns.len();
        let rows = self
            .rows
            .into_iter()
            .map(|mut r| {
                r.pad_to(width);
                r
            })
            .collect();
        NormalizedTable::new(self.columns, rows)
    }
}

fn parse_json(text: &str) -> ExplorerResult<NormalizedTable> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ExplorerError::MalformedInput {
            format: Format::Json,
            message: e.to_string(),
        })?;

    let table = match value {
        Value::Array(items) => {
            let columns = match items.first() {
                Some(Value::Object(first)) => first.keys().cloned().collect(),
                _ => Vec::new(),
            };
            let mut rows = JsonRows::new(columns);
            for item in items {
                rows.push(item);
            }
            rows.finish()
        }
        Value::Object(map) => {
            let mut rows = JsonRows::new(map.keys().cloned().collect());
            rows.push(Value::Object(map));
            rows.finish()
        }
        scalar => {
            let mut rows = JsonRows::new(Vec::new());
            rows.push(scalar);
            rows.finish()
        }
    };
    Ok(table)
}
