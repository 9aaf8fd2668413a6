//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::r#trait::{ListEntry, ListOptions};
use crate::{has_extension, VirtualFileSystem};
use std::io::Write;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// How `write_file` replaces an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Write a sibling temporary file, then rename it over the target
    Atomic,
    /// Truncate and rewrite the target directly; a failed write may leave
    /// the target truncated
    InPlace,
}

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access.
///
/// # Example
/// ```
/// use veld_vfs::{NativeFileSystem, VirtualFileSystem, WriteMode};
/// use std::path::Path;
///
/// let fs = NativeFileSystem::with_write_mode(WriteMode::Atomic);
/// assert!(!fs.exists(Path::new("/definitely/not/here.class")));
/// ```
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    write_mode: WriteMode,
}

impl NativeFileSystem {
    /// Create a new native file system with atomic writes.
    pub fn new() -> Self {
        Self::with_write_mode(WriteMode::Atomic)
    }

    /// Create a new native file system with the given write mode.
    pub fn with_write_mode(write_mode: WriteMode) -> Self {
        Self { write_mode }
    }

    /// Get the write mode
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| VfsError::from_io(path, &e))?;

        // 临时文件默认 0600，沿用原文件权限
        if let Ok(meta) = std::fs::metadata(path) {
            std::fs::set_permissions(tmp.path(), meta.permissions())
                .map_err(|e| VfsError::from_io(path, &e))?;
        }

        tmp.write_all(content)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| VfsError::from_io(path, &e))?;

        tmp.persist(path)
            .map_err(|e| VfsError::from_io(path, &e.error))?;
        Ok(())
    }
}

impl Default for NativeFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| VfsError::from_io(path, &e))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        match self.write_mode {
            WriteMode::Atomic => self.write_atomic(path, content),
            WriteMode::InPlace => {
                std::fs::write(path, content).map_err(|e| VfsError::from_io(path, &e))
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path, options: &ListOptions) -> VfsResult<Vec<ListEntry>> {
        if !dir.exists() {
            return Err(VfsError::NotFound {
                path: dir.display().to_string(),
            });
        }
        if !dir.is_dir() {
            return Err(VfsError::NotADirectory {
                path: dir.display().to_string(),
            });
        }

        let max_depth = if options.recursive { usize::MAX } else { 1 };
        let mut entries = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    let error = match e.io_error() {
                        Some(io) => VfsError::from_io(&path, io),
                        None => VfsError::Io {
                            path: path.display().to_string(),
                            message: e.to_string(),
                        },
                    };
                    if path == dir {
                        return Err(error);
                    }
                    warn!(
                        target: "veld::batch",
                        path = %path.display(),
                        error = %error,
                        "unreadable directory entry"
                    );
                    entries.push(ListEntry::Unreadable { path, error });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if let Some(ext) = &options.extension {
                if !has_extension(path, ext) {
                    continue;
                }
            }
            entries.push(ListEntry::File(path.to_path_buf()));
        }

        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }
}
