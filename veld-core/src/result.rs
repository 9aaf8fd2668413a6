//! Per-module weaving outcome

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome classification of one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaveStatus {
    Unchanged,
    Modified,
    Error,
}

impl WeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeaveStatus::Unchanged => "unchanged",
            WeaveStatus::Modified => "modified",
            WeaveStatus::Error => "error",
        }
    }
}

impl fmt::Display for WeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of weaving one module.
///
/// Exactly one status per result. `Modified` always carries at least one
/// added accessor and the re-encoded bytes; `Error` always carries a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeavingResult {
    module_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    status: WeaveStatus,
    added_accessors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip)]
    bytecode: Option<Vec<u8>>,
}

impl WeavingResult {
    pub fn unchanged(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            path: None,
            status: WeaveStatus::Unchanged,
            added_accessors: Vec::new(),
            error: None,
            bytecode: None,
        }
    }

    /// `added_accessors` must not be empty
    pub fn modified(
        module_name: impl Into<String>,
        added_accessors: Vec<String>,
        bytecode: Vec<u8>,
    ) -> Self {
        debug_assert!(!added_accessors.is_empty());
        Self {
            module_name: module_name.into(),
            path: None,
            status: WeaveStatus::Modified,
            added_accessors,
            error: None,
            bytecode: Some(bytecode),
        }
    }

    pub fn error(module_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            path: None,
            status: WeaveStatus::Error,
            added_accessors: Vec::new(),
            error: Some(message.into()),
            bytecode: None,
        }
    }

    /// Attach the source file of this module
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Internal class name; file path for errors raised by a batch
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn status(&self) -> WeaveStatus {
        self.status
    }

    pub fn added_accessors(&self) -> &[String] {
        &self.added_accessors
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Re-encoded bytes, present only for `Modified`
    pub fn bytecode(&self) -> Option<&[u8]> {
        self.bytecode.as_deref()
    }

    pub fn into_bytecode(self) -> Option<Vec<u8>> {
        self.bytecode
    }

    pub fn is_modified(&self) -> bool {
        self.status == WeaveStatus::Modified
    }

    pub fn is_error(&self) -> bool {
        self.status == WeaveStatus::Error
    }
}

impl fmt::Display for WeavingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.module_name)?;
        match self.status {
            WeaveStatus::Modified => write!(f, " (+{})", self.added_accessors.join(", +")),
            WeaveStatus::Error => write!(f, ": {}", self.error.as_deref().unwrap_or("")),
            WeaveStatus::Unchanged => Ok(()),
        }
    }
}
