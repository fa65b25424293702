//! Flattening of API records into tables.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::indicator::tools::error::{Result, ToolError};
use crate::indicator::tools::model::{ApiKind, CellValue, Row, Table};

/// Path segment Athena nests dimension fields under.
pub const DIMENSION_SEGMENT: &str = "dim";
/// Column carrying the observation value.
pub const VALUE_COLUMN: &str = "Value";

static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\[.*\]").expect("annotation pattern is valid"));

/// Converts the fetched records into a table, one row per record, in input
/// order.
///
/// Athena records have nested objects flattened into dotted column names and
/// the `dim` segment removed afterwards. DHS records are already flat and are
/// mapped field by field.
pub fn normalize(api: ApiKind, records: &[Value]) -> Result<Table> {
    let mut rows = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let Value::Object(fields) = record else {
            return Err(ToolError::UnexpectedRecord { index });
        };

        let row: Row = match api {
            ApiKind::WhoAthena => {
                let mut flat = Row::new();
                flatten_object(None, fields, &mut flat);
                flat.into_iter()
                    .map(|(column, value)| (strip_dimension_prefix(&column), value))
                    .collect()
            }
            ApiKind::DhsProgram => fields
                .iter()
                .map(|(key, value)| (key.clone(), CellValue::from_json(value)))
                .collect(),
        };
        rows.push(row);
    }

    let table = Table::from_rows(rows);
    debug!(
        rows = table.row_count(),
        columns = table.columns().len(),
        "records normalized"
    );
    Ok(table)
}

/// Removes every non-final `dim` segment from a dotted column name, so
/// `dim.COUNTRY` becomes `COUNTRY`. Applying it twice gives the same result.
pub fn strip_dimension_prefix(column: &str) -> String {
    let segments: Vec<&str> = column.split('.').collect();
    let last = segments.len() - 1;
    segments
        .iter()
        .enumerate()
        .filter(|(idx, segment)| *idx == last || **segment != DIMENSION_SEGMENT)
        .map(|(_, segment)| *segment)
        .collect::<Vec<_>>()
        .join(".")
}

/// Strips bracketed annotations such as `12 [10-14]` down to `12` in the
/// `Value` column, coercing every cell to text.
///
/// Returns `false` and leaves the table untouched when there is no `Value`
/// column.
pub fn clean_value_column(table: &mut Table) -> bool {
    let cleaned = table.map_column(VALUE_COLUMN, |cell| {
        let text = cell.to_text();
        CellValue::Text(ANNOTATION.replace_all(&text, "").trim().to_string())
    });
    if !cleaned {
        warn!("no 'Value' column found for cleaning");
    }
    cleaned
}

fn flatten_object(prefix: Option<&str>, fields: &Map<String, Value>, row: &mut Row) {
    for (key, value) in fields {
        let column = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => {
                flatten_object(Some(&column), nested, row);
            }
            other => row.insert(column, CellValue::from_json(other)),
        }
    }
}
