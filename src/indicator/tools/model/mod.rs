use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::indicator::tools::error::ToolError;

/// Remote statistics source a run pulls indicators from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKind {
    /// WHO Global Health Observatory, Athena API.
    WhoAthena,
    /// The DHS Program indicator data API.
    DhsProgram,
}

impl ApiKind {
    /// Label shown to users when choosing a source.
    pub fn label(&self) -> &'static str {
        match self {
            ApiKind::WhoAthena => "WHO Athena",
            ApiKind::DhsProgram => "DHS Program",
        }
    }

    /// Short name used inside status messages.
    pub fn short_name(&self) -> &'static str {
        match self {
            ApiKind::WhoAthena => "Athena",
            ApiKind::DhsProgram => "DHS",
        }
    }

    /// Top-level response field holding the records array.
    pub fn records_field(&self) -> &'static str {
        match self {
            ApiKind::WhoAthena => "fact",
            ApiKind::DhsProgram => "Data",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApiKind {
    type Err = ToolError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "WHO Athena" => Ok(ApiKind::WhoAthena),
            "DHS Program" => Ok(ApiKind::DhsProgram),
            other => Err(ToolError::UnknownApiKind(other.to_string())),
        }
    }
}

/// A single cell of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Plain string value.
    Text(String),
    /// Floating point number.
    Number(f64),
    /// Boolean value.
    Bool(bool),
    /// Missing value.
    Null,
}

impl CellValue {
    /// Builds a cell from a JSON scalar. Arrays and objects are kept as their
    /// JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(value) => CellValue::Bool(*value),
            Value::Number(number) => number
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(number.to_string())),
            Value::String(value) => CellValue::Text(value.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Text form used for join keys. `Null` has none.
    pub fn as_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_text()),
        }
    }

    /// Coerces the cell to text; `Null` becomes the empty string.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Bool(value) => value.to_string(),
            CellValue::Null => String::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Ordered mapping from column name to value for a single record.
///
/// Insertion order is kept; inserting an existing column replaces its value
/// without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field value.
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for Row {
    type Item = (String, CellValue);
    type IntoIter = std::vec::IntoIter<(String, CellValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// Rectangular table with named columns. Every row holds exactly one cell per
/// column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Creates an empty table with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from records. Columns are the union of the record keys
    /// in order of first appearance; missing cells are `Null`.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.columns() {
                if !columns.iter().any(|existing| existing == column) {
                    columns.push(column.to_string());
                }
            }
        }

        let cells = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or(CellValue::Null))
                    .collect()
            })
            .collect();

        Self {
            columns,
            rows: cells,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Appends a row, padding with `Null` or truncating to the header width.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Null);
        self.rows.push(cells);
    }

    /// Returns the cell at `row` in the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }

    /// Returns the given row as an ordered record.
    pub fn row(&self, index: usize) -> Option<Row> {
        let cells = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect(),
        )
    }

    /// Applies `f` to every cell of the named column. Returns `false` when the
    /// column does not exist.
    pub fn map_column<F>(&mut self, column: &str, mut f: F) -> bool
    where
        F: FnMut(&CellValue) -> CellValue,
    {
        let Some(index) = self.column_index(column) else {
            return false;
        };
        for cells in &mut self.rows {
            cells[index] = f(&cells[index]);
        }
        true
    }

    /// Removes a column and its cells. Returns `false` when absent.
    pub fn drop_column(&mut self, column: &str) -> bool {
        let Some(index) = self.column_index(column) else {
            return false;
        };
        self.columns.remove(index);
        for cells in &mut self.rows {
            cells.remove(index);
        }
        true
    }

    /// Moves `column` so it sits directly after `anchor`. Leaves the table
    /// untouched and returns `false` if either column is missing.
    pub fn move_column_after(&mut self, column: &str, anchor: &str) -> bool {
        if column == anchor {
            return false;
        }
        let (Some(from), Some(anchor_index)) = (self.column_index(column), self.column_index(anchor))
        else {
            return false;
        };
        // Removing `column` first shifts the anchor left when it came after.
        let to = if from < anchor_index {
            anchor_index
        } else {
            anchor_index + 1
        };

        let name = self.columns.remove(from);
        self.columns.insert(to, name);
        for cells in &mut self.rows {
            let cell = cells.remove(from);
            cells.insert(to, cell);
        }
        true
    }

    /// Consumes the table and returns its header and rows.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<CellValue>>) {
        (self.columns, self.rows)
    }

    /// Builds a table from a header and rows, padding each row to the header
    /// width.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = Table::new(columns);
        for cells in rows {
            table.push_row(cells);
        }
        table
    }
}
