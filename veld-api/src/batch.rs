//! Directory weaving
//!
//! Enumerates module files, weaves each one on a rayon pool, persists the
//! modified ones and collects results in enumeration order. A failure on one
//! file is recorded in its result and never stops the rest of the batch; a
//! sub-directory that cannot be listed is reported the same way.

use crate::config::RunConfig;
use crate::error::OrchestratorError;
use crate::report::WeaveReport;
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use veld_core::{Weaver, WeavingResult};
use veld_vfs::{ListEntry, ListOptions};

/// Message of results for files not started before the batch deadline
pub const TIMEOUT_MESSAGE: &str = "batch timeout exceeded";

/// Weave every module file under `dir`.
///
/// Only directory-level failures are returned as `Err`; an empty directory
/// yields an empty report.
pub fn weave_directory(dir: &Path, config: &RunConfig) -> Result<WeaveReport, OrchestratorError> {
    let started = Instant::now();
    let options = ListOptions {
        recursive: config.weaver.recursive,
        extension: Some(config.weaver.extension.clone()),
    };

    let entries = config
        .vfs
        .list_files(dir, &options)
        .map_err(|e| OrchestratorError::from_listing(dir.to_path_buf(), e))?;

    info!(
        target: "veld::batch",
        dir = %dir.display(),
        entries = entries.len(),
        recursive = options.recursive,
        dry_run = config.weaver.dry_run,
        "weaving directory"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.weaver.jobs.unwrap_or(0))
        .thread_name(|i| format!("veld-weaver-{}", i))
        .build()
        .map_err(|e| OrchestratorError::ThreadPool(e.to_string()))?;

    let deadline = config
        .weaver
        .timeout_secs
        .map(|secs| started + Duration::from_secs(secs));
    let weaver = Weaver::new();

    // 有序集合：par_iter().collect() 保持枚举顺序
    let results: Vec<WeavingResult> = pool.install(|| {
        entries
            .par_iter()
            .map(|entry| match entry {
                ListEntry::File(path) => weave_file(path, &weaver, config, deadline),
                ListEntry::Unreadable { path, error } => {
                    file_error(path, format!("cannot list directory: {}", error))
                }
            })
            .collect()
    });

    let report = WeaveReport::new(results, started.elapsed());
    info!(
        target: "veld::batch",
        modified = report.modified,
        unchanged = report.unchanged,
        errors = report.errors,
        elapsed_ms = report.elapsed_ms,
        "batch finished"
    );
    Ok(report)
}

/// Weave and persist one file. Every failure becomes an `Error` result
/// whose identity is the file path.
fn weave_file(
    path: &Path,
    weaver: &Weaver,
    config: &RunConfig,
    deadline: Option<Instant>,
) -> WeavingResult {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        warn!(target: "veld::batch", path = %path.display(), "deadline passed, skipping file");
        return file_error(path, TIMEOUT_MESSAGE);
    }

    let bytes = match config.vfs.read_file(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(target: "veld::persist", path = %path.display(), error = %e, "read failed");
            return file_error(path, format!("read failed: {}", e));
        }
    };

    let result = weaver.weave_one(&bytes);
    if let Some(message) = result.error_message() {
        warn!(target: "veld::batch", path = %path.display(), error = %message, "weaving failed");
        return file_error(path, message);
    }

    if !config.weaver.dry_run {
        if let Some(bytecode) = result.bytecode() {
            if let Err(e) = config.vfs.write_file(path, bytecode) {
                warn!(target: "veld::persist", path = %path.display(), error = %e, "write failed");
                return file_error(path, format!("write failed: {}", e));
            }
            debug!(
                target: "veld::persist",
                path = %path.display(),
                bytes = bytecode.len(),
                "wrote woven module"
            );
        }
    }

    result.with_path(path)
}

fn file_error(path: &Path, message: impl Into<String>) -> WeavingResult {
    WeavingResult::error(path.display().to_string(), message).with_path(path)
}
