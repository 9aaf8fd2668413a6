//! VirtualFileSystem trait definition

use crate::error::{VfsError, VfsResult};
use std::path::{Path, PathBuf};

/// Options for enumerating files below a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Descend into sub-directories
    pub recursive: bool,
    /// Only return files with this extension (without dot)
    pub extension: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            extension: None,
        }
    }
}

impl ListOptions {
    /// Recursive listing filtered by extension
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            recursive: true,
            extension: Some(extension.into()),
        }
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    /// A file matching the listing options
    File(PathBuf),
    /// An entry below the listed directory that could not be read; whatever
    /// it contains is unknown
    Unreadable { path: PathBuf, error: VfsError },
}

impl ListEntry {
    pub fn path(&self) -> &Path {
        match self {
            ListEntry::File(path) | ListEntry::Unreadable { path, .. } => path,
        }
    }
}

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling the weaver
/// from specific file system implementations.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Replace file contents
    ///
    /// Creates the file if it doesn't exist. Implementations state whether
    /// a failed write keeps the previous contents; `NativeFileSystem` does so
    /// only in `WriteMode::Atomic`.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// List files below `dir`, sorted by path
    ///
    /// Sub-directories that cannot be read are returned as
    /// `ListEntry::Unreadable` in their sorted position, never skipped.
    ///
    /// # Returns
    /// The entries, or VfsError when `dir` itself is missing, not a directory
    /// or unreadable
    fn list_files(&self, dir: &Path, options: &ListOptions) -> VfsResult<Vec<ListEntry>>;
}
