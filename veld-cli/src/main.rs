//! Veld Weaver CLI - Command line interface
//!
//! Weaves a directory of compiled classes in place; options come from
//! weaver.json and are overridden by command-line flags.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

mod config;
mod logging;

use crate::config::{load_config, validate, LogConfig, Overrides, CLI_TARGET};
use crate::logging::{init_with_file, LogFormat};
use veld_api::{weave_directory, RunConfig, WeaveReport};

/// Every file was woven or left unchanged
const EXIT_OK: i32 = 0;
/// Bad configuration or the directory itself could not be processed
const EXIT_FAILURE: i32 = 1;
/// At least one file ended in an error
const EXIT_FILE_ERRORS: i32 = 2;

/// 报告输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// 每个文件一行，末尾一行汇总
    Text,
    /// 完整报告（JSON）
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "veld-weaver",
    about = "Adds injection accessors to compiled classes",
    version
)]
struct Cli {
    /// Directory containing the compiled classes
    #[arg(value_name = "CLASSES_DIR")]
    classes_dir: PathBuf,

    /// Configuration file (default: ./weaver.json when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only weave files directly inside CLASSES_DIR
    #[arg(long)]
    no_recursive: bool,

    /// Number of worker threads
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Deadline for the whole batch, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Overwrite files directly instead of temp file + rename
    #[arg(long)]
    in_place: bool,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Global log level (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            no_recursive: self.no_recursive,
            jobs: self.jobs,
            timeout_secs: self.timeout,
            in_place: self.in_place,
            dry_run: self.dry_run,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let file_config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let log_config = match LogConfig::resolve(&file_config.log, cli.log_level.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };
    if let Err(e) = init_with_file(&log_config, cli.log_format, cli.log_file.as_deref()) {
        eprintln!("Error: {}", e);
        process::exit(EXIT_FAILURE);
    }

    let weaver = cli.overrides().apply(file_config.weaver);
    if let Err(e) = validate(&weaver) {
        eprintln!("Error: {}", e);
        process::exit(EXIT_FAILURE);
    }
    info!(
        target: CLI_TARGET,
        dir = %cli.classes_dir.display(),
        recursive = weaver.recursive,
        dry_run = weaver.dry_run,
        "weaving classes"
    );

    let report = match weave_directory(&cli.classes_dir, &RunConfig::new(weaver)) {
        Ok(r) => r,
        Err(e) => {
            error!(target: CLI_TARGET, error = %e, "batch failed");
            eprintln!("Error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    if let Err(e) = print_report(&report, cli.format) {
        eprintln!("Error: {}", e);
        process::exit(EXIT_FAILURE);
    }
    process::exit(exit_code(&report));
}

fn print_report(report: &WeaveReport, format: OutputFormat) -> Result<(), String> {
    match format {
        OutputFormat::Text => {
            for result in &report.results {
                println!("{}", result);
            }
            println!("{}", report.summary());
        }
        OutputFormat::Json => {
            let json = report
                .to_json()
                .map_err(|e| format!("failed to serialize report: {}", e))?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn exit_code(report: &WeaveReport) -> i32 {
    if report.has_errors() {
        EXIT_FILE_ERRORS
    } else {
        EXIT_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;
    use veld_api::WeavingResult;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["veld-weaver", "target/classes"]).unwrap();
        assert_eq!(cli.classes_dir, Path::new("target/classes"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert!(cli.config.is_none());

        let weaver = cli.overrides().apply(Default::default());
        assert_eq!(weaver, veld_api::WeaverConfig::default());
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "veld-weaver",
            "out",
            "--no-recursive",
            "--jobs",
            "4",
            "--timeout",
            "60",
            "--dry-run",
            "--format",
            "json",
            "--log-format",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));

        let weaver = cli.overrides().apply(Default::default());
        assert!(!weaver.recursive);
        assert_eq!(weaver.jobs, Some(4));
        assert_eq!(weaver.timeout_secs, Some(60));
        assert!(weaver.dry_run);
        assert!(weaver.atomic_writes);
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["veld-weaver", "out", "--jobs", "many"]).is_err());
        assert!(Cli::try_parse_from(["veld-weaver"]).is_err());
        assert!(Cli::try_parse_from(["veld-weaver", "out", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let clean = WeaveReport::new(
            vec![WeavingResult::unchanged("A")],
            Duration::from_millis(1),
        );
        assert_eq!(exit_code(&clean), EXIT_OK);

        let failed = WeaveReport::new(
            vec![
                WeavingResult::unchanged("A"),
                WeavingResult::error("B", "malformed module: bad magic"),
            ],
            Duration::from_millis(1),
        );
        assert_eq!(exit_code(&failed), EXIT_FILE_ERRORS);
    }
}
