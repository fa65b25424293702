use tracing_subscriber::EnvFilter;

use crate::indicator::tools::error::{Result, ToolError};

/// Installs the global `fmt` subscriber. `RUST_LOG` wins over `verbosity`
/// when set.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "indicator_tools=info",
        1 => "indicator_tools=debug",
        _ => "indicator_tools=trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|error| ToolError::Logging(error.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}
