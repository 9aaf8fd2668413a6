//! 集成测试 - 端到端目录织入

mod common;

use common::{plain, repository, widget, ClassesDir};
use std::sync::Arc;
use veld_core::classfile::read_class;
use veld_vfs::{NativeFileSystem, WriteMode};
use veld_workspace::{
    weave, weave_directory, OrchestratorError, RunConfig, WeaveStatus, WeaverConfig,
};

fn accessors_of(bytes: &[u8]) -> Vec<(String, String)> {
    let module = read_class(bytes).unwrap();
    module
        .methods()
        .iter()
        .filter(|m| m.name().starts_with(veld_workspace::ACCESSOR_PREFIX))
        .map(|m| (m.name().to_string(), m.descriptor().to_string()))
        .collect()
}

#[test]
fn test_weave_build_output() {
    let classes = ClassesDir::new();
    classes.put("com/example/Widget.class", &widget());
    classes.put("com/example/Repository.class", &repository());
    classes.put("com/example/Plain.class", &plain());
    classes.put("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n");

    let results = weave(classes.path()).unwrap();
    assert_eq!(results.len(), 3);

    let modified: Vec<_> = results
        .iter()
        .filter(|r| r.status() == WeaveStatus::Modified)
        .map(|r| r.module_name())
        .collect();
    assert_eq!(modified.len(), 2);
    assert!(modified.contains(&"com/example/Widget"));
    assert!(modified.contains(&"com/example/Repository"));

    assert_eq!(
        accessors_of(&classes.read("com/example/Repository.class")),
        vec![
            ("__inject_set_timeout".to_string(), "(J)V".to_string()),
            ("__inject_set_ratio".to_string(), "(D)V".to_string()),
            (
                "__inject_set_names".to_string(),
                "([Ljava/lang/String;)V".to_string()
            ),
            (
                "__inject_set_url".to_string(),
                "(Ljava/lang/String;)V".to_string()
            ),
        ]
    );
    assert_eq!(classes.read("com/example/Plain.class"), plain());
    assert_eq!(classes.read("META-INF/MANIFEST.MF"), b"Manifest-Version: 1.0\n");
}

#[test]
fn test_woven_bytes_on_disk_match_result() {
    let classes = ClassesDir::new();
    classes.put("Widget.class", &widget());

    let config = RunConfig::new(WeaverConfig {
        dry_run: true,
        ..WeaverConfig::default()
    });
    let report = weave_directory(classes.path(), &config).unwrap();
    let woven = report.into_results().remove(0).into_bytecode().unwrap();
    assert_eq!(classes.read("Widget.class"), widget());

    weave(classes.path()).unwrap();
    assert_eq!(classes.read("Widget.class"), woven);
}

#[test]
fn test_second_run_is_noop() {
    let classes = ClassesDir::new();
    classes.put("com/example/Widget.class", &widget());
    classes.put("com/example/Repository.class", &repository());

    weave(classes.path()).unwrap();
    let after_first = (
        classes.read("com/example/Widget.class"),
        classes.read("com/example/Repository.class"),
    );

    let second = weave(classes.path()).unwrap();
    assert!(second.iter().all(|r| r.status() == WeaveStatus::Unchanged));
    assert_eq!(classes.read("com/example/Widget.class"), after_first.0);
    assert_eq!(classes.read("com/example/Repository.class"), after_first.1);
}

#[test]
fn test_corrupt_file_does_not_stop_batch() {
    let classes = ClassesDir::new();
    let mut truncated = widget();
    truncated.truncate(truncated.len() / 2);
    let broken = classes.put("a/Broken.class", &truncated);
    classes.put("b/Widget.class", &widget());

    let results = weave(classes.path()).unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].status(), WeaveStatus::Error);
    assert_eq!(results[0].path(), Some(broken.as_path()));
    assert!(results[0].error_message().unwrap().contains("malformed"));
    assert_eq!(classes.read("a/Broken.class"), truncated);

    assert_eq!(results[1].status(), WeaveStatus::Modified);
}

#[test]
fn test_in_place_and_atomic_writes_agree() {
    let atomic = ClassesDir::new();
    let in_place = ClassesDir::new();
    atomic.put("Repository.class", &repository());
    in_place.put("Repository.class", &repository());

    weave(atomic.path()).unwrap();
    let config = RunConfig::with_vfs(
        WeaverConfig {
            atomic_writes: false,
            ..WeaverConfig::default()
        },
        Arc::new(NativeFileSystem::with_write_mode(WriteMode::InPlace)),
    );
    weave_directory(in_place.path(), &config).unwrap();

    assert_eq!(
        atomic.read("Repository.class"),
        in_place.read("Repository.class")
    );
}

#[cfg(unix)]
#[test]
fn test_atomic_write_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let classes = ClassesDir::new();
    let path = classes.put("Widget.class", &widget());
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

    weave(classes.path()).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o640);
    assert_ne!(classes.read("Widget.class"), widget());
}

#[test]
fn test_not_a_directory() {
    let classes = ClassesDir::new();
    let file = classes.put("Widget.class", &widget());

    assert_eq!(
        weave(&file).unwrap_err(),
        OrchestratorError::NotADirectory(file.clone())
    );
}

#[cfg(unix)]
fn set_mode(path: &std::path::Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_package_is_reported() {
    let classes = ClassesDir::new();
    classes.put("com/example/Widget.class", &widget());
    classes.put("com/locked/Service.class", &repository());
    let locked = classes.path().join("com/locked");
    set_mode(&locked, 0o000);

    // permissions do not apply to root
    if std::fs::read_dir(&locked).is_ok() {
        set_mode(&locked, 0o755);
        return;
    }

    let results = weave(classes.path());
    set_mode(&locked, 0o755);
    let results = results.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status(), WeaveStatus::Modified);
    assert_eq!(results[1].status(), WeaveStatus::Error);
    assert_eq!(results[1].path(), Some(locked.as_path()));
    assert!(results[1]
        .error_message()
        .unwrap()
        .starts_with("cannot list directory"));
    assert_eq!(classes.read("com/locked/Service.class"), repository());
}

#[cfg(unix)]
#[test]
fn test_failed_atomic_write_is_error_and_keeps_file() {
    let classes = ClassesDir::new();
    let path = classes.put("pkg/Widget.class", &widget());
    let package = classes.path().join("pkg");
    set_mode(&package, 0o555);

    if std::fs::write(package.join("writable-check"), b"").is_ok() {
        set_mode(&package, 0o755);
        return;
    }

    let results = weave(classes.path());
    set_mode(&package, 0o755);
    let results = results.unwrap();

    assert_eq!(results[0].status(), WeaveStatus::Error);
    assert_eq!(results[0].path(), Some(path.as_path()));
    assert!(results[0].error_message().unwrap().starts_with("write failed"));
    assert_eq!(classes.read("pkg/Widget.class"), widget());
}
