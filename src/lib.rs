//! Core library for the indicator-tools command line application.
//!
//! The library exposes the pipeline that fetches public-health indicators
//! from the WHO Athena or DHS Program APIs and turns them into spreadsheets.
//! Responsibilities stay narrow: IO adapters live under
//! [`indicator::tools::io`], table types inside [`indicator::tools::model`],
//! JSON flattening in [`indicator::tools::flatten`], lookup joins in
//! [`indicator::tools::enrich`], and the staged orchestration under
//! [`indicator::tools::pipeline`].

pub mod indicator;

pub use indicator::tools::{
    Result, ToolError, catalog, config, enrich, error, fetch, flatten, io, logging, model,
    pipeline, progress,
};
