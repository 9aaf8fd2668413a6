//! Veld Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Veld crates.

use serde::Deserialize;

/// Default file extension of compiled modules
pub const DEFAULT_EXTENSION: &str = "class";

/// Configuration for a weaving batch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WeaverConfig {
    /// Walk sub-directories of the classes directory
    pub recursive: bool,
    /// Extension (without dot) of the files to weave
    pub extension: String,
    /// Worker count; `None` uses the available parallelism
    pub jobs: Option<usize>,
    /// Global deadline for the whole batch, in seconds
    pub timeout_secs: Option<u64>,
    /// Write to a temporary file and rename over the target
    pub atomic_writes: bool,
    /// Report what would change without touching any file
    pub dry_run: bool,
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            extension: DEFAULT_EXTENSION.to_string(),
            jobs: None,
            timeout_secs: None,
            atomic_writes: true,
            dry_run: false,
        }
    }
}

/// Weaving stage, used for stage-specific log filtering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Scan,
    Synth,
    Encode,
    Persist,
    Batch,
}

impl Stage {
    /// All stages, in pipeline order
    pub const ALL: [Stage; 6] = [
        Stage::Decode,
        Stage::Scan,
        Stage::Synth,
        Stage::Encode,
        Stage::Persist,
        Stage::Batch,
    ];

    /// Get the string name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Scan => "scan",
            Stage::Synth => "synth",
            Stage::Encode => "encode",
            Stage::Persist => "persist",
            Stage::Batch => "batch",
        }
    }

    /// Get the log target name for this stage
    pub fn target(&self) -> String {
        format!("veld::{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weaver_config() {
        let cfg = WeaverConfig::default();
        assert!(cfg.recursive);
        assert_eq!(cfg.extension, "class");
        assert_eq!(cfg.jobs, None);
        assert_eq!(cfg.timeout_secs, None);
        assert!(cfg.atomic_writes);
        assert!(!cfg.dry_run);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: WeaverConfig =
            serde_json::from_str(r#"{ "recursive": false, "jobs": 4 }"#).unwrap();
        assert!(!cfg.recursive);
        assert_eq!(cfg.jobs, Some(4));
        assert_eq!(cfg.extension, "class");
        assert!(cfg.atomic_writes);
    }

    #[test]
    fn test_stage_as_str() {
        assert_eq!(Stage::Decode.as_str(), "decode");
        assert_eq!(Stage::Persist.target(), "veld::persist");
        assert_eq!(Stage::ALL.len(), 6);
    }
}
