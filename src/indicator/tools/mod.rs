pub mod catalog;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod io;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod progress;

pub use error::{Result, ToolError};
