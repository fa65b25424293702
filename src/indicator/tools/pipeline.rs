use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::indicator::tools::config::ProcessorConfig;
use crate::indicator::tools::enrich::{self, LookupTable};
use crate::indicator::tools::error::Result;
use crate::indicator::tools::fetch;
use crate::indicator::tools::flatten;
use crate::indicator::tools::io::excel_read;
use crate::indicator::tools::io::excel_write;
use crate::indicator::tools::io::http::{HttpClient, ReqwestClient};
use crate::indicator::tools::model::{ApiKind, Table};
use crate::indicator::tools::progress::{ProgressObserver, Stage, StageEvent, notify};

/// Sheet name used for the combined raw data workbooks.
pub const COMBINED_SHEET: &str = "CombinedData";
/// Sheet name used for the cleaned and final workbooks.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// Output files of a run. Names only depend on the API and the date, so a
/// second run on the same day overwrites the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub combined: PathBuf,
    pub cleaned: Option<PathBuf>,
    pub final_output: PathBuf,
}

impl ArtifactPaths {
    pub fn for_run(api: ApiKind, output_dir: &Path, date: NaiveDate) -> Self {
        let date = date.format("%Y-%m-%d");
        match api {
            ApiKind::WhoAthena => Self {
                combined: output_dir.join(format!("WHO_Athena_Combined_{date}.xlsx")),
                cleaned: Some(output_dir.join(format!("WHO_Athena_Combined_{date}_Cleaned.xlsx"))),
                final_output: output_dir.join(format!("GHO_Athena_Cleaned_{date}.xlsx")),
            },
            ApiKind::DhsProgram => {
                let combined = output_dir.join(format!("DHS_Program_Combined_{date}.xlsx"));
                Self {
                    combined: combined.clone(),
                    cleaned: None,
                    final_output: combined,
                }
            }
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The run produced an artifact.
    Done { artifact: PathBuf, message: String },
    /// The run stopped at the first error; no artifact is exposed.
    Failed { message: String },
}

impl ProcessOutcome {
    pub fn artifact(&self) -> Option<&Path> {
        match self {
            ProcessOutcome::Done { artifact, .. } => Some(artifact),
            ProcessOutcome::Failed { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProcessOutcome::Done { message, .. } | ProcessOutcome::Failed { message } => message,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ProcessOutcome::Done { .. })
    }

    /// Splits the outcome into the downloadable file and the status text.
    pub fn into_parts(self) -> (Option<PathBuf>, String) {
        match self {
            ProcessOutcome::Done { artifact, message } => (Some(artifact), message),
            ProcessOutcome::Failed { message } => (None, message),
        }
    }
}

/// Runs the fetch, normalize, enrich and persist stages for one selection.
pub struct Processor<C> {
    config: ProcessorConfig,
    client: C,
    date: Option<NaiveDate>,
}

impl Processor<ReqwestClient> {
    /// Builds a processor backed by a `reqwest` client using the configured
    /// timeout.
    pub fn from_config(config: ProcessorConfig) -> Result<Self> {
        let client = ReqwestClient::new(config.request_timeout())?;
        Ok(Self::new(config, client))
    }
}

impl<C: HttpClient> Processor<C> {
    pub fn new(config: ProcessorConfig, client: C) -> Self {
        Self {
            config,
            client,
            date: None,
        }
    }

    /// Pins the date used to name output files. Without it every run uses
    /// the local date at the time it starts.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn artifact_paths(&self, api: ApiKind) -> ArtifactPaths {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        ArtifactPaths::for_run(api, self.config.output_dir(api), date)
    }

    /// Dispatches on the API label and converts every failure into a
    /// `Failed` outcome.
    #[instrument(level = "info", skip(self, indicator_ids, observer), fields(indicators = indicator_ids.len()))]
    pub fn unified_data_processor(
        &self,
        api_label: &str,
        indicator_ids: &[String],
        observer: &dyn ProgressObserver,
    ) -> ProcessOutcome {
        let result = catch_unwind(AssertUnwindSafe(|| {
            ApiKind::from_str(api_label).and_then(|api| self.run(api, indicator_ids, observer))
        }));
        let result = match result {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "run panicked");
                return ProcessOutcome::Failed {
                    message: format!("An unexpected error occurred: {message}"),
                };
            }
        };
        match result {
            Ok(artifact) => {
                let message = format!(
                    "Processing complete. Final data saved to: {}",
                    artifact.display()
                );
                ProcessOutcome::Done { artifact, message }
            }
            Err(error) => {
                error!(%error, "run failed");
                ProcessOutcome::Failed {
                    message: error.status_message(),
                }
            }
        }
    }

    /// Runs the pipeline for `api` and returns the artifact path.
    pub fn run(
        &self,
        api: ApiKind,
        indicator_ids: &[String],
        observer: &dyn ProgressObserver,
    ) -> Result<PathBuf> {
        match api {
            ApiKind::WhoAthena => self.process_athena(indicator_ids, observer),
            ApiKind::DhsProgram => self.process_dhs(indicator_ids, observer),
        }
    }

    /// Athena: fetch, persist the combined table, clean `Value`, join the
    /// lookups and persist the final table.
    #[instrument(level = "info", skip_all, fields(indicators = indicator_ids.len()))]
    pub fn process_athena(
        &self,
        indicator_ids: &[String],
        observer: &dyn ProgressObserver,
    ) -> Result<PathBuf> {
        let api = ApiKind::WhoAthena;
        let paths = self.artifact_paths(api);

        let records = self.fetch(api, indicator_ids, observer)?;

        notify(
            observer,
            StageEvent::new(Stage::Normalizing, 0.3, "Saving initial combined data..."),
        );
        let combined = flatten::normalize(api, &records)?;
        excel_write::write_table(&paths.combined, COMBINED_SHEET, &combined)?;

        notify(
            observer,
            StageEvent::new(Stage::Cleaning, 0.5, "Cleaning 'Value' column..."),
        );
        let mut cleaned = excel_read::read_table(&paths.combined)?;
        flatten::clean_value_column(&mut cleaned);
        let cleaned_path = paths.cleaned.as_deref().unwrap_or(paths.combined.as_path());
        excel_write::write_table(cleaned_path, DEFAULT_SHEET, &cleaned)?;

        notify(
            observer,
            StageEvent::new(Stage::Enriching, 0.7, "Merging with lookup data..."),
        );
        let enriched = self.enrich(cleaned)?;

        notify(
            observer,
            StageEvent::new(Stage::Persisting, 0.9, "Saving final data..."),
        );
        excel_write::write_table(&paths.final_output, DEFAULT_SHEET, &enriched)?;

        self.finish(observer, paths.final_output)
    }

    /// DHS: fetch, normalize and persist the combined table.
    #[instrument(level = "info", skip_all, fields(indicators = indicator_ids.len()))]
    pub fn process_dhs(
        &self,
        indicator_ids: &[String],
        observer: &dyn ProgressObserver,
    ) -> Result<PathBuf> {
        let api = ApiKind::DhsProgram;
        let paths = self.artifact_paths(api);

        let records = self.fetch(api, indicator_ids, observer)?;

        notify(
            observer,
            StageEvent::new(Stage::Normalizing, 0.4, "Normalizing records..."),
        );
        let table = flatten::normalize(api, &records)?;

        notify(
            observer,
            StageEvent::new(Stage::Persisting, 0.7, "Saving combined data..."),
        );
        excel_write::write_table(&paths.final_output, COMBINED_SHEET, &table)?;

        self.finish(observer, paths.final_output)
    }

    fn fetch(
        &self,
        api: ApiKind,
        indicator_ids: &[String],
        observer: &dyn ProgressObserver,
    ) -> Result<Vec<Value>> {
        notify(
            observer,
            StageEvent::new(
                Stage::Fetching,
                0.1,
                format!("Fetching data from {api} API..."),
            ),
        );
        fetch::fetch_records(&self.client, api, self.config.base_url(api), indicator_ids)
    }

    fn enrich(&self, table: Table) -> Result<Table> {
        let country_path = &self.config.country_lookup_path;
        let indicator_path = &self.config.indicator_lookup_path;
        enrich::require_lookup_file("Country", country_path)?;
        enrich::require_lookup_file("Indicator", indicator_path)?;

        let countries = LookupTable::country().load(country_path)?;
        let indicators = LookupTable::indicator().load(indicator_path)?;
        Ok(enrich::enrich(table, &countries, &indicators))
    }

    fn finish(&self, observer: &dyn ProgressObserver, artifact: PathBuf) -> Result<PathBuf> {
        notify(
            observer,
            StageEvent::new(Stage::Done, 1.0, "Processing complete!"),
        );
        info!(artifact = %artifact.display(), "run complete");
        Ok(artifact)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during processing".to_string()
    }
}
