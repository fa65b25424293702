use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::indicator::tools::error::{Result, ToolError};
use crate::indicator::tools::model::{CellValue, Table};

/// Reads the first worksheet of a workbook into a table, using the first row
/// as the header.
///
/// Blank header cells are named `Unnamed: {index}` so every column stays
/// addressable.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            ToolError::InvalidWorkbook(format!("'{}' contains no worksheet", path.display()))
        })?
        .map_err(ToolError::from)?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell_to_value(cell) {
                CellValue::Null => format!("Unnamed: {idx}"),
                value => value.to_text(),
            })
            .collect(),
        None => return Ok(Table::default()),
    };

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(cell_to_value).collect());
    }
    Ok(table)
}

/// Reads a single named column from the first worksheet of a workbook.
pub fn read_column(path: &Path, column: &str) -> Result<Vec<CellValue>> {
    let table = read_table(path)?;
    let index = table.column_index(column).ok_or_else(|| {
        ToolError::InvalidWorkbook(format!(
            "'{}' must contain an '{column}' column",
            path.display()
        ))
    })?;
    Ok(table
        .rows()
        .iter()
        .map(|cells| cells[index].clone())
        .collect())
}

fn cell_to_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::Empty => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}
