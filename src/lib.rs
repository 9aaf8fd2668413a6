//! Veld - build-time accessor weaver for compiled classes
//!
//! Adds a public synthetic setter `__inject_set_<field>` to every private
//! instance field carrying an injection marker, so a dependency injection
//! runtime can populate the field without reflection.
//!
//! # Architecture
//!
//! ```text
//! veld-config/  - Configuration data structures
//! veld-vfs/     - File system abstraction (native, in-memory)
//! veld-core/    - Class file codec, field scanner, accessor synthesis (no IO)
//! veld-api/     - Batch orchestration on a worker pool
//! veld-cli/     - `veld-weaver` command line tool
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use veld_workspace::{weave, WeaveStatus};
//!
//! for result in weave("target/classes".as_ref())? {
//!     if result.status() == WeaveStatus::Modified {
//!         println!("{}", result);
//!     }
//! }
//! ```

// 重导出常用类型
pub use veld_api::{
    weave, weave_directory, weave_one, OrchestratorError, RunConfig, Stage, WeaveReport,
    WeaveStatus, Weaver, WeaverConfig, WeavingResult,
};
pub use veld_core::{WeaveError, ACCESSOR_PREFIX, INJECTION_MARKERS, UNKNOWN_MODULE};
