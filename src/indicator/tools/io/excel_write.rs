use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rust_xlsxwriter::{TableColumn, Workbook};
use tracing::debug;

use crate::indicator::tools::error::Result;
use crate::indicator::tools::model::{CellValue, Table};

/// Writes the table as a single sheet to the given path, replacing any
/// existing file and creating the parent directory when needed.
pub fn write_table(path: &Path, sheet_name: &str, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut workbook_writer = Workbook::new();
    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col_idx, header) in table.columns().iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let excel_col = col_idx as u16;
            match cell {
                CellValue::Text(value) => {
                    worksheet.write_string(excel_row, excel_col, value)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number(excel_row, excel_col, *value)?;
                }
                CellValue::Bool(value) => {
                    worksheet.write_boolean(excel_row, excel_col, *value)?;
                }
                CellValue::Null => {}
            }
        }
    }

    if !table.columns().is_empty() && table.row_count() > 0 {
        let col_end = (table.columns().len() as u16).saturating_sub(1);
        let row_end = table.row_count() as u32;
        if has_table_headers(table.columns()) {
            let headers: Vec<TableColumn> = table
                .columns()
                .iter()
                .map(|header| TableColumn::new().set_header(header))
                .collect();
            let mut excel_table = rust_xlsxwriter::Table::new();
            excel_table.set_autofilter(true).set_columns(&headers);
            worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
        } else {
            // Excel tables reject blank or case-insensitively repeated headers.
            worksheet.autofilter(0, 0, row_end, col_end)?;
        }
    }

    workbook_writer.save(path)?;
    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.columns().len(),
        "table written"
    );
    Ok(())
}

fn has_table_headers(columns: &[String]) -> bool {
    let mut seen = HashSet::new();
    columns
        .iter()
        .all(|header| !header.trim().is_empty() && seen.insert(header.to_lowercase()))
}
