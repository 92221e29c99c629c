use crate::support::{
    load, p, record_events, workbench, workbench_with, workbench_with_files, FakeTransport,
    MemoryTarget,
};
use std::io::{Cursor, Read};
use std::sync::Arc;
use workbench::sync::{
    ArchiveEntry, GitCredentials, PushRequest, SyncKind, SyncOperation, Visibility,
};
use workbench::tree::{FileChange, FileContent, FileNode, SetMode};
use workbench::{SyncError, WorkbenchEvent};
use zip::ZipArchive;

fn creds() -> GitCredentials {
    GitCredentials::new("octocat", "token")
}

#[tokio::test]
async fn test_partial_directory_sync_reports_counts() {
    let wb = workbench_with_files(&[("/a.txt", "1"), ("/b.txt", "2")]);
    let target = MemoryTarget::rejecting_writes(&["b.txt"]);

    let err = wb.sync_to_directory(&target).await.unwrap_err();

    match err {
        SyncError::PartialSyncFailure {
            succeeded,
            failed,
            first_error,
        } => {
            assert_eq!((succeeded, failed), (1, 1));
            assert!(first_error.contains("b.txt"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(target.file("a.txt").as_deref(), Some("1"));
    assert!(!wb.is_syncing());
}

#[tokio::test]
async fn test_failed_directory_fails_files_below_it() {
    let wb = workbench_with_files(&[
        ("/assets/logo.svg", "<svg/>"),
        ("/assets/icons/x.svg", "<svg/>"),
        ("/index.html", "<html/>"),
    ]);
    let target = MemoryTarget::rejecting_directories(&["assets"]);

    let err = wb.sync_to_directory(&target).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::PartialSyncFailure {
            succeeded: 1,
            failed: 2,
            ..
        }
    ));
    assert!(target.directories.lock().is_empty());
    assert_eq!(target.file("index.html").as_deref(), Some("<html/>"));
}

#[tokio::test]
async fn test_directory_sync_writes_tree_and_unsaved_buffers() {
    let wb = workbench_with_files(&[("/src/app.js", "saved"), ("/README.md", "# hi")]);
    wb.create_folder(&p("/empty")).unwrap();
    wb.open(&p("/src/app.js")).unwrap();
    wb.set_content(&p("/src/app.js"), "unsaved").unwrap();
    let target = MemoryTarget::default();

    let report = wb.sync_to_directory(&target).await.unwrap();

    assert_eq!(report.files_written, 2);
    assert_eq!(report.directories_created, 2);
    assert_eq!(target.file("src/app.js").as_deref(), Some("unsaved"));
    assert!(target.directories.lock().contains("empty"));
    // Syncing never saves
    assert!(wb.document(&p("/src/app.js")).unwrap().is_dirty);
}

#[tokio::test]
async fn test_sync_to_filesystem_directory() {
    let wb = workbench_with_files(&[("/src/main.rs", "fn main() {}")]);
    let dir = tempfile::tempdir().unwrap();

    let report = wb
        .sync_to_directory(&workbench::sync::FsDirectoryTarget::new(dir.path()))
        .await
        .unwrap();

    assert_eq!(report.files_written, 1);
    let written = std::fs::read_to_string(dir.path().join("src/main.rs")).unwrap();
    assert_eq!(written, "fn main() {}");
}

#[tokio::test]
async fn test_empty_tree_exports_valid_empty_archive() {
    let wb = workbench();

    let export = wb.export_archive().await.unwrap();

    assert_eq!(export.entry_count, 0);
    let archive = ZipArchive::new(Cursor::new(export.bytes)).unwrap();
    assert_eq!(archive.len(), 0);
}

#[tokio::test]
async fn test_archive_uses_saved_content_and_keeps_binary() {
    let wb = workbench();
    wb.set_files(
        vec![
            FileNode::file(p("/index.js"), "saved"),
            FileNode::file(
                p("/img/logo.png"),
                workbench::tree::FileContent::Binary(vec![0x89, 0x00, 0xff]),
            ),
        ],
        SetMode::Replace,
    )
    .unwrap();
    wb.open(&p("/index.js")).unwrap();
    wb.set_content(&p("/index.js"), "draft").unwrap();

    let export = wb.export_archive().await.unwrap();
    let mut archive = ZipArchive::new(Cursor::new(export.bytes)).unwrap();

    let mut text = String::new();
    archive
        .by_name("index.js")
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, "saved");
    let mut binary = Vec::new();
    archive
        .by_name("img/logo.png")
        .unwrap()
        .read_to_end(&mut binary)
        .unwrap();
    assert_eq!(binary, vec![0x89, 0x00, 0xff]);
    assert!(archive.by_name("img/").unwrap().is_dir());
}

#[tokio::test]
async fn test_sync_rejected_while_push_in_flight() {
    let (transport, entered, release) = FakeTransport::gated();
    let transport = Arc::new(transport);
    let wb = Arc::new(workbench_with(Arc::clone(&transport)));
    load(&wb, &[("/a.txt", "1")]);

    let pushing = Arc::clone(&wb);
    let push = tokio::spawn(async move {
        pushing
            .push_to_remote(PushRequest::new("proj", creds()))
            .await
    });
    entered.notified().await;

    assert!(wb.is_syncing());
    assert!(matches!(wb.sync_operation(), SyncOperation::GitPush(_)));
    let target = MemoryTarget::default();
    let err = wb.sync_to_directory(&target).await.unwrap_err();
    assert_eq!(
        err,
        SyncError::Busy {
            in_flight: SyncKind::GitPush
        }
    );
    assert!(target.files.lock().is_empty());
    assert!(matches!(
        wb.export_archive().await,
        Err(SyncError::Busy { .. })
    ));

    release.notify_one();
    let url = push.await.unwrap().unwrap();
    assert_eq!(url, "https://git.example/proj");
    assert!(!wb.is_syncing());

    // Slot is free again
    wb.sync_to_directory(&target).await.unwrap();
    assert_eq!(target.file("a.txt").as_deref(), Some("1"));
}

#[tokio::test]
async fn test_push_uses_content_from_when_it_started() {
    let (transport, entered, release) = FakeTransport::gated();
    let transport = Arc::new(transport);
    let wb = Arc::new(workbench_with(Arc::clone(&transport)));
    load(&wb, &[("/a.txt", "1"), ("/b.txt", "b")]);
    let path = p("/b.txt");
    wb.open(&path).unwrap();

    let pushing = Arc::clone(&wb);
    let push = tokio::spawn(async move {
        pushing
            .push_to_remote(PushRequest::new("proj", creds()))
            .await
    });
    entered.notified().await;

    // Edits and runner writes keep flowing while the push is parked
    wb.apply_file_change(&p("/a.txt"), FileChange::Write("2".into()))
        .unwrap();
    wb.set_content(&path, "edited").unwrap();
    wb.save(&path).unwrap();
    let events = record_events(&wb);

    release.notify_one();
    push.await.unwrap().unwrap();

    let pushes = transport.pushes.lock();
    assert_eq!(
        pushes[0].entries,
        vec![
            ArchiveEntry::File {
                path: "a.txt".to_string(),
                bytes: b"1".to_vec(),
                is_binary: false,
            },
            ArchiveEntry::File {
                path: "b.txt".to_string(),
                bytes: b"b".to_vec(),
                is_binary: false,
            },
        ]
    );

    // The push itself never writes back into the tree
    let text = |raw: &str| wb.file(raw).unwrap().as_file().unwrap().content.clone();
    assert_eq!(text("/a.txt"), FileContent::from("2"));
    assert_eq!(text("/b.txt"), FileContent::from("edited"));
    assert!(!events
        .lock()
        .iter()
        .any(|e| matches!(e, WorkbenchEvent::FilesChanged { .. })));
}

#[tokio::test]
async fn test_second_push_reuses_linked_remote() {
    let transport = Arc::new(FakeTransport::default());
    let wb = workbench_with(Arc::clone(&transport));
    load(&wb, &[("/a.txt", "1")]);
    let events = record_events(&wb);

    let first = wb
        .push_to_remote(PushRequest {
            repo_name: "proj".to_string(),
            commit_message: None,
            credentials: creds(),
            visibility: Some(Visibility::Private),
        })
        .await
        .unwrap();
    assert_eq!(first, "https://git.example/proj");

    let second = wb
        .push_to_remote(PushRequest {
            commit_message: Some("Update".to_string()),
            ..PushRequest::new("proj", creds())
        })
        .await
        .unwrap();

    assert_eq!(second, first);
    assert_eq!(
        *transport.ensure_calls.lock(),
        vec![("proj".to_string(), Visibility::Private)]
    );
    let pushes = transport.pushes.lock();
    assert_eq!(pushes.len(), 2);
    assert_eq!(pushes[0].message, "Initial commit");
    assert_eq!(pushes[1].message, "Update");
    assert_eq!(
        pushes[0].entries,
        vec![ArchiveEntry::File {
            path: "a.txt".to_string(),
            bytes: b"1".to_vec(),
            is_binary: false
        }]
    );

    let linked = wb.linked_remote().unwrap();
    assert_eq!(linked.url, first);
    let linked_events = events
        .lock()
        .iter()
        .filter(|e| matches!(e, WorkbenchEvent::RemoteLinked { .. }))
        .count();
    assert_eq!(linked_events, 1);
}

#[tokio::test]
async fn test_push_errors_surface_distinctly() {
    let transport = Arc::new(FakeTransport::failing(SyncError::AuthenticationFailure(
        "Bad credentials".to_string(),
    )));
    let wb = workbench_with(Arc::clone(&transport));
    let events = record_events(&wb);

    let err = wb
        .push_to_remote(PushRequest::new("proj", creds()))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::AuthenticationFailure(_)));
    assert!(wb.linked_remote().is_none());
    assert!(!wb.is_syncing());
    assert_eq!(
        events.lock().last(),
        Some(&WorkbenchEvent::SyncFinished {
            kind: SyncKind::GitPush,
            success: false,
            message: err.to_string(),
        })
    );
}

#[tokio::test]
async fn test_blank_credentials_never_reach_transport() {
    let transport = Arc::new(FakeTransport::default());
    let wb = workbench_with(Arc::clone(&transport));

    let err = wb
        .push_to_remote(PushRequest::new("proj", GitCredentials::new("octocat", " ")))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::AuthenticationFailure(_)));
    assert!(transport.ensure_calls.lock().is_empty());
    assert!(transport.pushes.lock().is_empty());
}
