//! 测试辅助工具
//!
//! 在临时目录中生成 class 文件并运行织入

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use veld_core::scanner::{JAVAX_INJECT, VELD_INJECT};
use veld_core::testing::{ClassFixture, ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};

/// Classes directory laid out like a build output
pub struct ClassesDir {
    dir: TempDir,
}

impl ClassesDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `bytes` at `relative`, creating parent directories
    pub fn put(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create package dir");
        }
        fs::write(&path, bytes).expect("write class file");
        path
    }

    pub fn read(&self, relative: &str) -> Vec<u8> {
        fs::read(self.dir.path().join(relative)).expect("read class file")
    }
}

/// `com/example/Widget`: one injectable field, one public field
pub fn widget() -> Vec<u8> {
    ClassFixture::new("com/example/Widget")
        .annotated_field(ACC_PRIVATE, "count", "I", &[VELD_INJECT])
        .annotated_field(ACC_PUBLIC, "label", "Ljava/lang/String;", &[VELD_INJECT])
        .source_file("Widget.java")
        .build()
}

/// `com/example/Repository`: wide, reference and static fields
pub fn repository() -> Vec<u8> {
    ClassFixture::new("com/example/Repository")
        .annotated_field(ACC_PRIVATE, "timeout", "J", &[JAVAX_INJECT])
        .annotated_field(ACC_PRIVATE, "ratio", "D", &[VELD_INJECT])
        .annotated_field(ACC_PRIVATE, "names", "[Ljava/lang/String;", &[VELD_INJECT])
        .annotated_field(ACC_PRIVATE | ACC_STATIC, "shared", "I", &[VELD_INJECT])
        .value_field(ACC_PRIVATE, "url", "Ljava/lang/String;", "${db.url}")
        .method(ACC_PUBLIC, "find", "(I)V")
        .build()
}

/// A class without any injection marker
pub fn plain() -> Vec<u8> {
    ClassFixture::new("com/example/Plain")
        .field(ACC_PRIVATE, "count", "I")
        .method(ACC_PUBLIC, "run", "()V")
        .build()
}
