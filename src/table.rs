use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One parsed row. Cells are stored positionally, parallel to
/// [`NormalizedTable::columns`]; `None` means the source had no value
/// (missing key or JSON `null`), `Some("")` is an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    cells: Vec<Option<String>>,
}

impl Record {
    pub(crate) fn with_width(width: usize) -> Self {
        Self {
            cells: vec![None; width],
        }
    }

    pub(crate) fn from_cells(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    pub(crate) fn set(&mut self, idx: usize, value: Option<String>) {
        if idx >= self.cells.len() {
            self.cells.resize(idx + 1, None);
        }
        self.cells[idx] = value;
    }

    pub(crate) fn pad_to(&mut self, width: usize) {
        if self.cells.len() < width {
            self.cells.resize(width, None);
        }
    }

    /// Cell at column position `idx`; `None` when absent.
    pub fn cell(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).and_then(|c| c.as_deref())
    }

    /// Number of cells that carry a value (empty strings included).
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the cell is absent or an empty string.
    pub fn is_blank(&self, idx: usize) -> bool {
        self.cell(idx).map_or(true, str::is_empty)
    }
}

/// Parsed upload: ordered unique column names and the rows in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl NormalizedTable {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in row `row`, if both exist and the cell is present.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.cell(idx)
    }

    /// A row as `(column, value)` pairs, skipping absent cells.
    pub fn entries(&self, row: usize) -> impl Iterator<Item = (&str, &str)> + '_ {
        let record = self.rows.get(row);
        self.columns
            .iter()
            .enumerate()
            .filter_map(move |(i, name)| Some((name.as_str(), record?.cell(i)?)))
    }

    /// Leading window of the table as shown on the preview screen.
    pub fn preview(&self, max_rows: usize, max_columns: usize) -> Preview {
        let width = self.columns.len().min(max_columns);
        let rows = self
            .rows
            .iter()
            .take(max_rows)
            .map(|r| (0..width).map(|i| r.cell(i).map(str::to_owned)).collect())
            .collect();
        Preview {
            columns: self.columns[..width].to_vec(),
            rows,
            hidden_rows: self.rows.len().saturating_sub(max_rows),
            hidden_columns: self.columns.len() - width,
        }
    }
}

/// Rows serialize as objects keyed by column name, in column order.
struct RowView<'a> {
    columns: &'a [String],
    record: &'a Record,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.record.len()))?;
        for (i, name) in self.columns.iter().enumerate() {
            if let Some(value) = self.record.cell(i) {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

impl Serialize for NormalizedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Shape<'a> {
            columns: &'a [String],
            rows: Vec<RowView<'a>>,
        }
        Shape {
            columns: &self.columns,
            rows: self
                .rows
                .iter()
                .map(|record| RowView {
                    columns: &self.columns,
                    record,
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

/// First rows/columns of a table plus how much was cut off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub hidden_rows: usize,
    pub hidden_columns: usize,
}
