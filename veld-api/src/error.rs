//! API 错误类型
//!
//! 只有目录级失败会作为 `Err` 返回；单个文件的失败记录在 `WeavingResult` 中。

use std::path::PathBuf;
use thiserror::Error;
use veld_vfs::VfsError;

/// Batch-level failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// 目标目录不存在
    #[error("classes directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// 目标路径不是目录
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// 目录遍历失败
    #[error("cannot list {}: {source}", path.display())]
    Enumerate {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    /// 线程池创建失败
    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),
}

impl OrchestratorError {
    /// Map a listing failure on `dir`
    pub(crate) fn from_listing(dir: PathBuf, err: VfsError) -> Self {
        match err {
            VfsError::NotFound { .. } => OrchestratorError::DirectoryNotFound(dir),
            VfsError::NotADirectory { .. } => OrchestratorError::NotADirectory(dir),
            source => OrchestratorError::Enumerate { path: dir, source },
        }
    }
}
