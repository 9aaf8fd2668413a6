//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::r#trait::{ListEntry, ListOptions};
use crate::{has_extension, VirtualFileSystem};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    read_only: BTreeSet<String>,
    unlistable: BTreeSet<String>,
}

/// An in-memory file system implementation.
///
/// All files are stored in memory using a `BTreeMap`, making it suitable
/// for testing and scenarios where disk access is not desired. Directories
/// exist implicitly as prefixes of stored file paths.
///
/// # Example
/// ```
/// use veld_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.class"), b"hello").unwrap();
/// let content = fs.read_file(Path::new("/test.class")).unwrap();
/// assert_eq!(content, b"hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        if let Ok(mut state) = fs.state.write() {
            for (path, content) in files {
                let key = Self::normalize_path(Path::new(path.as_ref()));
                state.files.insert(key, content);
            }
        }
        fs
    }

    /// Reject future writes to `path` with `PermissionDenied`
    pub fn set_read_only(&self, path: &Path) {
        if let Ok(mut state) = self.state.write() {
            state.read_only.insert(Self::normalize_path(path));
        }
    }

    /// Make listings fail to open directory `path` with `PermissionDenied`
    pub fn set_unlistable(&self, path: &Path) {
        if let Ok(mut state) = self.state.write() {
            state.unlistable.insert(Self::normalize_path(path));
        }
    }

    /// Normalize a path string for internal storage.
    /// Uses forward slashes consistently and drops a trailing slash.
    fn normalize_path(path: &Path) -> String {
        let s = path.to_string_lossy().replace('\\', "/");
        match s.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => s,
        }
    }

    fn dir_prefix(dir: &Path) -> String {
        let dir = Self::normalize_path(dir);
        if dir.ends_with('/') {
            dir
        } else {
            format!("{}/", dir)
        }
    }

    fn lock_error() -> VfsError {
        VfsError::Io {
            path: String::new(),
            message: "lock poisoned".to_string(),
        }
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = Self::normalize_path(path);
        let state = self.state.read().map_err(|_| Self::lock_error())?;

        state
            .files
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = Self::normalize_path(path);
        let mut state = self.state.write().map_err(|_| Self::lock_error())?;

        if state.read_only.contains(&normalized) {
            return Err(VfsError::PermissionDenied { path: normalized });
        }
        state.files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        match self.state.read() {
            Ok(state) => state.files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let prefix = Self::dir_prefix(path);
        match self.state.read() {
            Ok(state) => state.files.keys().any(|k| k.starts_with(&prefix)),
            Err(_) => false,
        }
    }

    fn list_files(&self, dir: &Path, options: &ListOptions) -> VfsResult<Vec<ListEntry>> {
        if self.is_file(dir) {
            return Err(VfsError::NotADirectory {
                path: Self::normalize_path(dir),
            });
        }
        if !self.is_dir(dir) {
            return Err(VfsError::NotFound {
                path: Self::normalize_path(dir),
            });
        }

        let prefix = Self::dir_prefix(dir);
        let state = self.state.read().map_err(|_| Self::lock_error())?;

        if state
            .unlistable
            .iter()
            .any(|locked| prefix.starts_with(&Self::dir_prefix(Path::new(locked))))
        {
            return Err(VfsError::PermissionDenied {
                path: Self::normalize_path(dir),
            });
        }

        let mut entries = Vec::new();
        let mut reported = BTreeSet::new();
        for key in state.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if !options.recursive && rest.contains('/') {
                continue;
            }

            let locked = state
                .unlistable
                .iter()
                .find(|locked| key.starts_with(&Self::dir_prefix(Path::new(locked.as_str()))));
            if let Some(locked) = locked {
                if reported.insert(locked.clone()) {
                    entries.push(ListEntry::Unreadable {
                        path: PathBuf::from(locked),
                        error: VfsError::PermissionDenied {
                            path: locked.clone(),
                        },
                    });
                }
                continue;
            }

            let path = PathBuf::from(key);
            match &options.extension {
                Some(ext) if !has_extension(&path, ext) => {}
                _ => entries.push(ListEntry::File(path)),
            }
        }

        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }
}
