//! API 层配置
//!
//! RunConfig 组合纯数据的 WeaverConfig 与文件系统后端

use std::sync::Arc;
use veld_config::WeaverConfig;
use veld_vfs::{NativeFileSystem, VirtualFileSystem, WriteMode};

/// Batch configuration
#[derive(Clone)]
pub struct RunConfig {
    /// Weaving options
    pub weaver: WeaverConfig,
    /// File system the batch reads from and writes to
    pub vfs: Arc<dyn VirtualFileSystem>,
}

impl RunConfig {
    /// Native file system, with the write mode taken from `weaver.atomic_writes`
    pub fn new(weaver: WeaverConfig) -> Self {
        let mode = if weaver.atomic_writes {
            WriteMode::Atomic
        } else {
            WriteMode::InPlace
        };
        Self {
            weaver,
            vfs: Arc::new(NativeFileSystem::with_write_mode(mode)),
        }
    }

    /// Explicit file system backend
    pub fn with_vfs(weaver: WeaverConfig, vfs: Arc<dyn VirtualFileSystem>) -> Self {
        Self { weaver, vfs }
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("weaver", &self.weaver)
            .finish_non_exhaustive()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(WeaverConfig::default())
    }
}
