//! Veld Virtual File System
//!
//! A file system abstraction with a native backend (used by the weaver
//! binary) and an in-memory backend (used by tests and embedders).
//!
//! # Usage
//! ```rust,ignore
//! use veld_vfs::{ListOptions, MemoryFileSystem, VirtualFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/classes/A.class"), b"\xCA\xFE\xBA\xBE").unwrap();
//! let entries = fs.list_files(Path::new("/classes"), &ListOptions::default()).unwrap();
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::{NativeFileSystem, WriteMode};
pub use r#trait::{ListEntry, ListOptions, VirtualFileSystem};

/// Check whether `path` carries the given extension (without dot)
pub(crate) fn has_extension(path: &std::path::Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == extension)
}
