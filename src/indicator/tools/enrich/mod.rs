//! Left joins against the static lookup workbooks.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::indicator::tools::error::{Result, ToolError};
use crate::indicator::tools::io::excel_read;
use crate::indicator::tools::model::{CellValue, Table};

pub const COUNTRY_COLUMN: &str = "COUNTRY";
pub const ISO_CODE_COLUMN: &str = "ISO_Code";
pub const GHO_COLUMN: &str = "GHO";
pub const INDICATOR_CODE_COLUMN: &str = "IndicatorCode";

/// Two-column projection of a lookup workbook.
///
/// Entries keep file order and duplicates; a key listed twice fans out to two
/// joined rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    key_column: String,
    value_column: String,
    entries: Vec<(Option<String>, CellValue)>,
}

impl LookupTable {
    pub fn new(key_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            value_column: value_column.into(),
            entries: Vec::new(),
        }
    }

    /// Country name to ISO code lookup.
    pub fn country() -> Self {
        Self::new(COUNTRY_COLUMN, ISO_CODE_COLUMN)
    }

    /// Indicator display name to canonical code lookup.
    pub fn indicator() -> Self {
        Self::new(GHO_COLUMN, INDICATOR_CODE_COLUMN)
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: CellValue) -> Self {
        self.entries.push((Some(key.into()), value));
        self
    }

    /// Loads the first worksheet of `path`, projected to the key and value
    /// columns of this lookup.
    pub fn load(mut self, path: &Path) -> Result<Self> {
        let table = excel_read::read_table(path)?;
        let (Some(key_idx), Some(value_idx)) = (
            table.column_index(&self.key_column),
            table.column_index(&self.value_column),
        ) else {
            return Err(ToolError::InvalidWorkbook(format!(
                "lookup '{}' must contain '{}' and '{}' columns",
                path.display(),
                self.key_column,
                self.value_column
            )));
        };

        self.entries = table
            .rows()
            .iter()
            .map(|cells| (cells[key_idx].as_key(), cells[value_idx].clone()))
            .collect();
        debug!(
            path = %path.display(),
            entries = self.entries.len(),
            "lookup loaded"
        );
        Ok(self)
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn index(&self) -> HashMap<&str, Vec<&CellValue>> {
        let mut index: HashMap<&str, Vec<&CellValue>> = HashMap::new();
        for (key, value) in &self.entries {
            if let Some(key) = key {
                index.entry(key.as_str()).or_default().push(value);
            }
        }
        index
    }
}

/// Checks that a lookup workbook exists before any join is attempted.
pub fn require_lookup_file(kind: &'static str, path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ToolError::LookupFileMissing {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Left joins `table` with `lookup` on the lookup's key column.
///
/// Every input row is kept. Unmatched rows get `Null` in the value column and
/// duplicate lookup keys produce one output row per match. The value column is
/// appended, replacing an existing column of the same name. When the key
/// column is absent from `table` it is returned unchanged.
pub fn left_join(mut table: Table, lookup: &LookupTable) -> Table {
    if !table.has_column(lookup.key_column()) {
        warn!(
            key = lookup.key_column(),
            "join key column missing, skipping lookup"
        );
        return table;
    }

    if table.drop_column(lookup.value_column()) {
        warn!(
            column = lookup.value_column(),
            "replacing existing column with lookup values"
        );
    }
    let Some(key_idx) = table.column_index(lookup.key_column()) else {
        return table;
    };

    let index = lookup.index();
    let (mut columns, rows) = table.into_parts();
    columns.push(lookup.value_column().to_string());

    let mut joined: Vec<Vec<CellValue>> = Vec::with_capacity(rows.len());
    let mut unmatched = 0usize;
    for cells in rows {
        let matches = cells[key_idx]
            .as_key()
            .and_then(|key| index.get(key.as_str()));
        match matches {
            Some(values) => {
                for value in values {
                    let mut out = cells.clone();
                    out.push((*value).clone());
                    joined.push(out);
                }
            }
            None => {
                unmatched += 1;
                let mut out = cells;
                out.push(CellValue::Null);
                joined.push(out);
            }
        }
    }

    debug!(
        key = lookup.key_column(),
        rows = joined.len(),
        unmatched,
        "lookup joined"
    );
    Table::from_parts(columns, joined)
}

/// Attaches `ISO_Code` and `IndicatorCode` and places each right after its
/// join key.
pub fn enrich(table: Table, countries: &LookupTable, indicators: &LookupTable) -> Table {
    let input_rows = table.row_count();
    let table = left_join(table, countries);
    let mut table = left_join(table, indicators);

    table.move_column_after(countries.value_column(), countries.key_column());
    table.move_column_after(indicators.value_column(), indicators.key_column());

    info!(input_rows, output_rows = table.row_count(), "table enriched");
    table
}
