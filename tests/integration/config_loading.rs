use workbench::config::{ConfigLoader, WorkbenchConfig};
use workbench::sync::{ArchiveCompression, Visibility};

#[test]
fn test_workspace_file_and_environment_overlay() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::write(
        workspace.path().join("workbench.toml"),
        r#"
        [archive]
        project_name = "demo"
        compression = "stored"

        [git]
        default_visibility = "public"
        "#,
    )
    .unwrap();

    std::env::set_var("WORKBENCH__GIT__DEFAULT_COMMIT_MESSAGE", "from env");
    let loaded = ConfigLoader::load(workspace.path());
    std::env::remove_var("WORKBENCH__GIT__DEFAULT_COMMIT_MESSAGE");
    let config = loaded.unwrap();

    assert_eq!(config.archive.project_name, "demo");
    assert_eq!(config.archive.compression, ArchiveCompression::Stored);
    assert_eq!(config.git.default_visibility, Visibility::Public);
    assert_eq!(config.git.default_commit_message, "from env");
    assert!(config.sync.include_unsaved_buffers);
}

#[test]
fn test_load_from_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        r#"
        [documents]
        max_open_documents = 4

        [sync]
        project_root = "/home/project"
        "#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();

    assert_eq!(config.documents.max_open_documents, 4);
    assert_eq!(config.documents.history_limit, 20);
    assert_eq!(config.sync.project_root, "/home/project");
    assert_eq!(config.logging, WorkbenchConfig::default().logging);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ConfigLoader::load_from_file(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_explicit_file_wins_and_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
        [sync]
        project_root = "relative/root"
        "#,
    )
    .unwrap();

    let err = ConfigLoader::resolve(dir.path(), Some(&path)).unwrap_err();
    assert!(err.to_string().contains("sync.project_root"));
}
