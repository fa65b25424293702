#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use indicator_tools::config::ProcessorConfig;
use indicator_tools::io::excel_write;
use indicator_tools::io::http::{HttpClient, HttpResponse};
use indicator_tools::model::{CellValue, Table};
use indicator_tools::Result;
use url::Url;

/// HTTP client that answers every request with a canned response and keeps
/// the requested URLs.
pub struct FakeClient {
    status: u16,
    body: String,
    pub requests: RefCell<Vec<Url>>,
}

impl FakeClient {
    pub fn ok(body: serde_json::Value) -> Self {
        Self::with_status(200, body.to_string())
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Url {
        self.requests
            .borrow()
            .last()
            .cloned()
            .expect("a request was sent")
    }
}

impl HttpClient for FakeClient {
    fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(url.clone());
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn text_table(columns: &[&str], rows: &[&[&str]]) -> Table {
    Table::from_parts(
        columns.iter().map(|column| column.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
            .collect(),
    )
}

pub fn write_workbook(path: &Path, columns: &[&str], rows: &[&[&str]]) {
    excel_write::write_table(path, "Sheet1", &text_table(columns, rows)).expect("fixture written");
}

/// Configuration rooted in `root`, with both lookup workbooks written.
pub fn config_in(root: &Path) -> ProcessorConfig {
    let data = root.join("data");
    let config = ProcessorConfig {
        athena_base_url: "http://athena.test/api/GHO".to_string(),
        dhs_base_url: "http://dhs.test/rest/dhs/data".to_string(),
        athena_catalog_path: data.join("athena.xlsx"),
        dhs_catalog_path: data.join("dhs.xlsx"),
        country_lookup_path: data.join("countries.xlsx"),
        indicator_lookup_path: data.join("indicators.xlsx"),
        athena_output_dir: root.join("out").join("WHO_Athena"),
        dhs_output_dir: root.join("out").join("DHS_Program"),
        ..ProcessorConfig::default()
    };

    write_workbook(
        &config.country_lookup_path,
        &["COUNTRY", "ISO_Code"],
        &[&["Kenya", "KEN"], &["Uganda", "UGA"]],
    );
    write_workbook(
        &config.indicator_lookup_path,
        &["GHO", "IndicatorCode"],
        &[&["Life expectancy at birth (years)", "WHOSIS_000001"]],
    );
    config
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("directory listed")
        .map(|entry| entry.expect("entry").path())
        .collect();
    files.sort();
    files
}
