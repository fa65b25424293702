use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::indicator::tools::error::{Result, ToolError};
use crate::indicator::tools::model::ApiKind;

pub const DEFAULT_ATHENA_BASE_URL: &str = "http://apps.who.int/gho/athena/api/GHO";
pub const DEFAULT_DHS_BASE_URL: &str = "http://api.dhsprogram.com/rest/dhs/data";
/// Column holding indicator identifiers in the catalog workbooks.
pub const DEFAULT_CATALOG_COLUMN: &str = "indicatorIds";

/// Process configuration: endpoints, local input files and output folders.
///
/// Every field has a default, so a JSON file only needs to list overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    pub athena_base_url: String,
    pub dhs_base_url: String,
    pub athena_catalog_path: PathBuf,
    pub dhs_catalog_path: PathBuf,
    pub catalog_column: String,
    pub country_lookup_path: PathBuf,
    pub indicator_lookup_path: PathBuf,
    pub athena_output_dir: PathBuf,
    pub dhs_output_dir: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            athena_base_url: DEFAULT_ATHENA_BASE_URL.to_string(),
            dhs_base_url: DEFAULT_DHS_BASE_URL.to_string(),
            athena_catalog_path: PathBuf::from("data/master_query2.xlsx"),
            dhs_catalog_path: PathBuf::from("data/master_query.xlsx"),
            catalog_column: DEFAULT_CATALOG_COLUMN.to_string(),
            country_lookup_path: PathBuf::from("data/GHO-CountryName-ISO-Matching.xlsx"),
            indicator_lookup_path: PathBuf::from("data/GHO-Indicator-list.xlsx"),
            athena_output_dir: PathBuf::from("output/WHO_Athena"),
            dhs_output_dir: PathBuf::from("output/DHS_Program"),
            request_timeout_secs: 60,
        }
    }
}

impl ProcessorConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn base_url(&self, api: ApiKind) -> &str {
        match api {
            ApiKind::WhoAthena => &self.athena_base_url,
            ApiKind::DhsProgram => &self.dhs_base_url,
        }
    }

    pub fn catalog_path(&self, api: ApiKind) -> &Path {
        match api {
            ApiKind::WhoAthena => &self.athena_catalog_path,
            ApiKind::DhsProgram => &self.dhs_catalog_path,
        }
    }

    pub fn output_dir(&self, api: ApiKind) -> &Path {
        match api {
            ApiKind::WhoAthena => &self.athena_output_dir,
            ApiKind::DhsProgram => &self.dhs_output_dir,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
