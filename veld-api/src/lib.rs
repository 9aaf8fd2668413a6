//! Veld API - Batch weaving orchestration
//!
//! Provides:
//! - Directory weaving on a worker pool (`weave_directory`)
//! - Configuration abstraction (`RunConfig`)
//! - Batch-level errors (`OrchestratorError`) and reports (`WeaveReport`)
//!
//! Per-file failures never escape as `Err`; they are `Error` entries in the
//! report, in file enumeration order.

use std::path::Path;

pub mod batch;
pub mod config;
pub mod error;
pub mod report;

pub use batch::{weave_directory, TIMEOUT_MESSAGE};
pub use config::RunConfig;
pub use error::OrchestratorError;
pub use report::WeaveReport;

// Re-export config and core types
pub use veld_config::{Stage, WeaverConfig};
pub use veld_core::{WeaveStatus, Weaver, WeavingResult};

/// Weave a classes directory on the native file system with default settings
pub fn weave(classes_dir: &Path) -> Result<Vec<WeavingResult>, OrchestratorError> {
    weave_directory(classes_dir, &RunConfig::default()).map(WeaveReport::into_results)
}

/// Weave a single in-memory module
pub fn weave_one(bytes: &[u8]) -> WeavingResult {
    Weaver::new().weave_one(bytes)
}
