//! Indicator catalogs used to populate selection lists.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, warn};

use crate::indicator::tools::config::ProcessorConfig;
use crate::indicator::tools::error::{Result, ToolError};
use crate::indicator::tools::io::excel_read;
use crate::indicator::tools::model::ApiKind;

/// Reads `column` from the first worksheet of `path` into a sorted list of
/// unique identifiers. Empty cells are skipped; other values are kept as
/// written.
pub fn load_indicators(path: &Path, column: &str) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let cells = excel_read::read_column(path, column)?;
    let unique: BTreeSet<String> = cells
        .iter()
        .filter_map(|cell| cell.as_key())
        .filter(|id| !id.is_empty())
        .collect();
    Ok(unique.into_iter().collect())
}

/// Both catalogs plus any problem met while loading them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorCatalogs {
    pub athena: Vec<String>,
    pub dhs: Vec<String>,
    pub warnings: Vec<String>,
}

impl IndicatorCatalogs {
    /// Loads the catalog of each API. A catalog that cannot be read is left
    /// empty and reported in `warnings` rather than failing the load.
    pub fn load(config: &ProcessorConfig) -> Self {
        let mut catalogs = IndicatorCatalogs::default();
        catalogs.athena = catalogs.load_one(config, ApiKind::WhoAthena);
        catalogs.dhs = catalogs.load_one(config, ApiKind::DhsProgram);
        catalogs
    }

    pub fn for_api(&self, api: ApiKind) -> &[String] {
        match api {
            ApiKind::WhoAthena => &self.athena,
            ApiKind::DhsProgram => &self.dhs,
        }
    }

    fn load_one(&mut self, config: &ProcessorConfig, api: ApiKind) -> Vec<String> {
        let path = config.catalog_path(api);
        let indicators = match load_indicators(path, &config.catalog_column) {
            Ok(indicators) => indicators,
            Err(ToolError::MissingInput(path)) => {
                self.warn(format!(
                    "Indicator file not found at {}",
                    path.display()
                ));
                Vec::new()
            }
            Err(error) => {
                self.warn(format!(
                    "An error occurred while loading indicators from {}: {error}",
                    path.display()
                ));
                Vec::new()
            }
        };

        if indicators.is_empty() {
            self.warn(format!(
                "No {} indicators loaded. Please check {}.",
                api.short_name(),
                path.display()
            ));
        } else {
            info!(api = %api, count = indicators.len(), "indicator catalog loaded");
        }
        indicators
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}
