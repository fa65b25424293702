use std::path::PathBuf;

use thiserror::Error;

use crate::indicator::tools::model::ApiKind;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool fetches, transforms, or persists indicator data.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Raised when a run is started without any indicator selected.
    #[error("Error: No {} indicators selected. Please choose at least one indicator.", .api.short_name())]
    EmptySelection { api: ApiKind },

    /// Raised when the API label is neither of the supported sources.
    #[error("Invalid API selection.")]
    UnknownApiKind(String),

    /// Raised when the remote API answers with a non-success status.
    #[error("Error: API request failed with status code {status}\nResponse: {body}")]
    HttpError { status: u16, body: String },

    /// Raised when the records field is absent from the response payload.
    #[error("{}", missing_field_message(.api))]
    MissingDataField { api: ApiKind },

    /// Raised when the DHS `Data` field is present but empty.
    #[error("Warning: API response contains no data for the provided indicator IDs.")]
    EmptyDataset,

    /// Raised when a lookup workbook cannot be found at its configured path.
    #[error("Error: {kind} lookup file not found at {}. Please upload it.", .path.display())]
    LookupFileMissing { kind: &'static str, path: PathBuf },

    /// Raised when a fetched record is not a JSON object.
    #[error("record {index} in the API response is not a JSON object")]
    UnexpectedRecord { index: usize },

    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the HTTP client.
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Raised when an endpoint URL cannot be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Raised when an endpoint URL cannot carry path segments.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    /// Renders the message shown to the user when a run fails.
    ///
    /// Domain failures are reported verbatim; anything else is wrapped as an
    /// unexpected error.
    pub fn status_message(&self) -> String {
        match self {
            ToolError::EmptySelection { .. }
            | ToolError::UnknownApiKind(_)
            | ToolError::HttpError { .. }
            | ToolError::MissingDataField { .. }
            | ToolError::EmptyDataset
            | ToolError::LookupFileMissing { .. } => self.to_string(),
            other => format!("An unexpected error occurred: {other}"),
        }
    }
}

fn missing_field_message(api: &ApiKind) -> &'static str {
    match api {
        ApiKind::WhoAthena => {
            "Error: No 'fact' data found in the API response for selected indicators. Check if indicators are valid or data exists."
        }
        ApiKind::DhsProgram => {
            "Error: No 'Data' field found in the API response or the field is empty. Check if indicators are valid or data exists."
        }
    }
}
