//! CLI 配置
//!
//! 配置文件（weaver.json）与命令行参数的合并，以及分阶段日志级别

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use veld_config::{Stage, WeaverConfig};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "weaver.json";

/// Log target for CLI events
pub const CLI_TARGET: &str = "veld::cli";

/// weaver.json 结构
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Weaving options at the top level
    #[serde(flatten)]
    pub weaver: WeaverConfig,
    /// Logging options
    pub log: LogSection,
}

/// weaver.json 的 `log` 字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// 全局日志级别: "off", "error", "warn", "info", "debug", "trace"
    pub level: Option<String>,
    /// 按阶段覆盖，例如 `{ "decode": "debug" }`
    pub stages: BTreeMap<String, String>,
}

/// Read `path`, or `weaver.json` if it exists, or fall back to defaults
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, String> {
    let path = match path {
        Some(p) => p,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
        None => return Ok(ConfigFile::default()),
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse config '{}': {}", path.display(), e))
}

/// Reject settings the batch cannot run with
pub fn validate(weaver: &WeaverConfig) -> Result<(), String> {
    if weaver.extension.is_empty() {
        return Err("'extension' must not be empty".to_string());
    }
    if weaver.jobs == Some(0) {
        return Err("'jobs' must be at least 1".to_string());
    }
    Ok(())
}

/// Command-line overrides applied on top of the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub no_recursive: bool,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub in_place: bool,
    pub dry_run: bool,
}

impl Overrides {
    pub fn apply(&self, mut weaver: WeaverConfig) -> WeaverConfig {
        if self.no_recursive {
            weaver.recursive = false;
        }
        if self.jobs.is_some() {
            weaver.jobs = self.jobs;
        }
        if self.timeout_secs.is_some() {
            weaver.timeout_secs = self.timeout_secs;
        }
        if self.in_place {
            weaver.atomic_writes = false;
        }
        if self.dry_run {
            weaver.dry_run = true;
        }
        weaver
    }
}

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: LevelFilter,
    pub decode: Option<LevelFilter>,
    pub scan: Option<LevelFilter>,
    pub synth: Option<LevelFilter>,
    pub encode: Option<LevelFilter>,
    pub persist: Option<LevelFilter>,
    pub batch: Option<LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: LevelFilter::INFO,
            decode: None,
            scan: None,
            synth: None,
            encode: None,
            persist: None,
            batch: None,
        }
    }
}

impl LogConfig {
    /// Build from the config file section; `cli_level` replaces the global level
    pub fn resolve(section: &LogSection, cli_level: Option<&str>) -> Result<Self, String> {
        let mut config = Self::default();
        if let Some(level) = cli_level.or(section.level.as_deref()) {
            config.global = parse_level(level)?;
        }

        for (stage_name, level) in &section.stages {
            let stage = Stage::ALL
                .into_iter()
                .find(|s| s.as_str() == stage_name)
                .ok_or_else(|| format!("unknown log stage '{}'", stage_name))?;
            let level = Some(parse_level(level)?);
            match stage {
                Stage::Decode => config.decode = level,
                Stage::Scan => config.scan = level,
                Stage::Synth => config.synth = level,
                Stage::Encode => config.encode = level,
                Stage::Persist => config.persist = level,
                Stage::Batch => config.batch = level,
            }
        }
        Ok(config)
    }

    /// Get log level for a specific stage
    pub fn level_for(&self, stage: Stage) -> LevelFilter {
        let specific = match stage {
            Stage::Decode => self.decode,
            Stage::Scan => self.scan,
            Stage::Synth => self.synth,
            Stage::Encode => self.encode,
            Stage::Persist => self.persist,
            Stage::Batch => self.batch,
        };
        specific.unwrap_or(self.global)
    }

    /// Per-target filter for the subscriber
    pub fn targets(&self) -> Targets {
        Stage::ALL
            .into_iter()
            .fold(Targets::new().with_default(self.global), |targets, stage| {
                targets.with_target(stage.target(), self.level_for(stage))
            })
            .with_target(CLI_TARGET, self.global)
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(level).map_err(|_| format!("invalid log level '{}'", level))
}
