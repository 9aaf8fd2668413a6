//! Batch report

use serde::Serialize;
use std::time::Duration;
use veld_core::{WeaveStatus, WeavingResult};

/// Ordered per-file results of one batch, with summary counts
#[derive(Debug, Clone, Serialize)]
pub struct WeaveReport {
    pub modified: usize,
    pub unchanged: usize,
    pub errors: usize,
    pub accessors_added: usize,
    pub elapsed_ms: u64,
    pub results: Vec<WeavingResult>,
}

impl WeaveReport {
    pub fn new(results: Vec<WeavingResult>, elapsed: Duration) -> Self {
        let count = |status: WeaveStatus| {
            results.iter().filter(|r| r.status() == status).count()
        };
        Self {
            modified: count(WeaveStatus::Modified),
            unchanged: count(WeaveStatus::Unchanged),
            errors: count(WeaveStatus::Error),
            accessors_added: results.iter().map(|r| r.added_accessors().len()).sum(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            results,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn into_results(self) -> Vec<WeavingResult> {
        self.results
    }

    /// One-line summary, e.g. `3 files: 1 modified, 1 unchanged, 1 errors (+2 accessors) in 12ms`
    pub fn summary(&self) -> String {
        format!(
            "{} files: {} modified, {} unchanged, {} errors (+{} accessors) in {}ms",
            self.results.len(),
            self.modified,
            self.unchanged,
            self.errors,
            self.accessors_added,
            self.elapsed_ms
        )
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeaveReport {
        WeaveReport::new(
            vec![
                WeavingResult::modified(
                    "A",
                    vec!["__inject_set_x".into(), "__inject_set_y".into()],
                    vec![0xCA],
                ),
                WeavingResult::unchanged("B"),
                WeavingResult::error("/classes/C.class", "bad magic"),
            ],
            Duration::from_millis(12),
        )
    }

    #[test]
    fn test_counts() {
        let report = sample();
        assert_eq!(
            (report.modified, report.unchanged, report.errors),
            (1, 1, 1)
        );
        assert_eq!(report.accessors_added, 2);
        assert!(report.has_errors());
        assert_eq!(
            report.summary(),
            "3 files: 1 modified, 1 unchanged, 1 errors (+2 accessors) in 12ms"
        );
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["modified"], 1);
        assert_eq!(json["elapsed_ms"], 12);
        assert_eq!(json["results"][2]["status"], "error");
        assert_eq!(json["results"][2]["error"], "bad magic");
        assert!(json["results"][0].get("bytecode").is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = WeaveReport::new(Vec::new(), Duration::ZERO);
        assert!(!report.has_errors());
        assert_eq!(report.accessors_added, 0);
    }
}
