use crate::support::{load, p, record_events, workbench, workbench_with_files};
use workbench::document::{SaveOutcome, ScrollPosition};
use workbench::tree::{FileChange, FileContent, FileNode, SetMode};
use workbench::{DocumentError, WorkbenchEvent};

#[test]
fn test_edit_then_save_advances_baseline() {
    let wb = workbench_with_files(&[("/src/app.js", "a")]);
    let path = p("/src/app.js");

    wb.open(&path).unwrap();
    wb.set_content(&path, "b").unwrap();
    assert!(wb.document(&path).unwrap().is_dirty);
    assert_eq!(wb.unsaved_paths(), vec![path.clone()]);

    assert!(matches!(wb.save(&path).unwrap(), SaveOutcome::Saved(_)));

    let doc = wb.document(&path).unwrap();
    assert!(!doc.is_dirty);
    assert_eq!(doc.value, "b");
    assert!(wb.unsaved_paths().is_empty());
    let saved = wb.file("/src/app.js").unwrap();
    assert_eq!(saved.as_file().unwrap().content, FileContent::from("b"));
}

#[test]
fn test_reset_after_save_is_noop() {
    let wb = workbench_with_files(&[("/a.txt", "one")]);
    let path = p("/a.txt");
    wb.open(&path).unwrap();
    wb.set_content(&path, "two").unwrap();
    wb.save(&path).unwrap();

    assert!(!wb.reset(&path));
    let doc = wb.document(&path).unwrap();
    assert_eq!(doc.value, "two");
    assert!(!doc.is_dirty);
}

#[test]
fn test_reset_restores_last_baseline_not_intermediate_edit() {
    let wb = workbench_with_files(&[("/a.txt", "base")]);
    let path = p("/a.txt");
    wb.open(&path).unwrap();
    wb.set_content(&path, "edit 1").unwrap();
    wb.set_content(&path, "edit 2").unwrap();

    assert!(wb.reset(&path));
    assert_eq!(wb.document(&path).unwrap().value, "base");
    assert!(wb.unsaved_paths().is_empty());
}

#[test]
fn test_save_after_external_delete_fails() {
    let wb = workbench_with_files(&[("/a.txt", "x"), ("/b.txt", "y")]);
    let path = p("/a.txt");
    wb.open(&path).unwrap();
    wb.set_content(&path, "edited").unwrap();

    // The retired document cannot be saved afterwards
    wb.apply_file_change(&path, FileChange::Delete).unwrap();
    assert!(matches!(wb.save(&path), Err(DocumentError::PathNotFound(_))));
    assert!(wb.unsaved_paths().is_empty());
}

#[test]
fn test_external_change_refreshes_clean_and_keeps_dirty() {
    let wb = workbench_with_files(&[("/clean.txt", "c1"), ("/dirty.txt", "d1")]);
    wb.open(&p("/clean.txt")).unwrap();
    wb.open(&p("/dirty.txt")).unwrap();
    wb.set_content(&p("/dirty.txt"), "mine").unwrap();

    wb.apply_file_change(&p("/clean.txt"), FileChange::Write("c2".into()))
        .unwrap();
    wb.apply_file_change(&p("/dirty.txt"), FileChange::Write("theirs".into()))
        .unwrap();

    assert_eq!(wb.document(&p("/clean.txt")).unwrap().value, "c2");
    let dirty = wb.document(&p("/dirty.txt")).unwrap();
    assert_eq!(dirty.value, "mine");
    assert!(dirty.is_dirty);
}

#[test]
fn test_reset_after_external_change_matches_tree() {
    let wb = workbench_with_files(&[("/a.txt", "d1")]);
    let path = p("/a.txt");
    wb.open(&path).unwrap();
    wb.set_content(&path, "mine").unwrap();
    wb.apply_file_change(&path, FileChange::Write("theirs".into()))
        .unwrap();

    assert!(wb.reset(&path));
    let doc = wb.document(&path).unwrap();
    assert_eq!(doc.value, "theirs");
    assert!(!doc.is_dirty);
    assert!(wb.unsaved_paths().is_empty());
    assert_eq!(
        wb.file("/a.txt").unwrap().as_file().unwrap().content,
        FileContent::from("theirs")
    );
}

#[test]
fn test_external_write_matching_buffer_reports_clean() {
    let wb = workbench_with_files(&[("/a.txt", "1")]);
    let path = p("/a.txt");
    wb.open(&path).unwrap();
    wb.set_content(&path, "2").unwrap();

    let events = record_events(&wb);
    wb.apply_file_change(&path, FileChange::Write("2".into()))
        .unwrap();

    assert!(!wb.document(&path).unwrap().is_dirty);
    assert!(events.lock().contains(&WorkbenchEvent::DirtyChanged {
        path: path.clone(),
        dirty: false
    }));
}

#[test]
fn test_runner_batches_leave_locked_files_alone() {
    let wb = workbench_with_files(&[("/a.txt", "1"), ("/b.txt", "2")]);
    let path = p("/a.txt");
    wb.set_locked(&path, true).unwrap();

    wb.set_files(vec![FileNode::file(path.clone(), "runner")], SetMode::Merge)
        .unwrap();
    assert_eq!(
        wb.file("/a.txt").unwrap().as_file().unwrap().content,
        FileContent::from("1")
    );

    let change = wb
        .set_files(vec![FileNode::file(path.clone(), "replaced")], SetMode::Replace)
        .unwrap();
    assert_eq!(change.removed, vec![p("/b.txt")]);
    let node = wb.file("/a.txt").unwrap();
    let entry = node.as_file().unwrap();
    assert_eq!(entry.content, FileContent::from("1"));
    assert!(entry.locked);
}

#[test]
fn test_locked_file_rejects_save() {
    let wb = workbench_with_files(&[("/locked.txt", "x")]);
    let path = p("/locked.txt");
    wb.open(&path).unwrap();
    wb.set_content(&path, "y").unwrap();
    wb.set_locked(&path, true).unwrap();

    assert_eq!(
        wb.save(&path),
        Err(DocumentError::FileLocked("/locked.txt".to_string()))
    );
    assert!(wb.document(&path).unwrap().is_dirty);
}

#[test]
fn test_binary_document_is_read_only() {
    let wb = workbench();
    wb.set_files(
        vec![FileNode::file(
            p("/logo.png"),
            FileContent::Binary(vec![0x89, 0x50, 0x00]),
        )],
        SetMode::Replace,
    )
    .unwrap();
    let path = p("/logo.png");
    let view = wb.open(&path).unwrap();
    assert!(view.is_binary);
    assert!(matches!(
        wb.set_content(&path, "text"),
        Err(DocumentError::BinaryDocument(_))
    ));
}

#[test]
fn test_save_all_and_history() {
    let wb = workbench_with_files(&[("/a.txt", "a"), ("/b.txt", "b")]);
    for (path, text) in [("/a.txt", "a2"), ("/b.txt", "b2")] {
        wb.open(&p(path)).unwrap();
        wb.set_content(&p(path), text).unwrap();
    }

    assert!(wb.save_all().is_empty());
    assert!(wb.unsaved_paths().is_empty());

    wb.set_content(&p("/a.txt"), "a3").unwrap();
    wb.save(&p("/a.txt")).unwrap();
    let history = wb.history(&p("/a.txt"));
    assert_eq!(history.len(), 2);

    wb.restore_version(&p("/a.txt"), 0).unwrap();
    let doc = wb.document(&p("/a.txt")).unwrap();
    assert_eq!(doc.value, history[0].content);
    assert!(doc.is_dirty);
}

#[test]
fn test_scroll_does_not_dirty() {
    let wb = workbench_with_files(&[("/a.txt", "a")]);
    wb.select_file(Some(p("/a.txt"))).unwrap();
    wb.set_current_scroll_position(ScrollPosition::new(10, 2))
        .unwrap();

    let doc = wb.current_document().unwrap();
    assert_eq!(doc.scroll, ScrollPosition::new(10, 2));
    assert!(!doc.is_dirty);
}

#[test]
fn test_dirty_events_fire_on_transitions_only() {
    let wb = workbench_with_files(&[("/a.txt", "a")]);
    let path = p("/a.txt");
    wb.open(&path).unwrap();
    let events = record_events(&wb);

    wb.set_content(&path, "b").unwrap();
    wb.set_content(&path, "c").unwrap();
    wb.set_content(&path, "a").unwrap();

    let dirty: Vec<bool> = events
        .lock()
        .iter()
        .filter_map(|e| match e {
            WorkbenchEvent::DirtyChanged { dirty, .. } => Some(*dirty),
            _ => None,
        })
        .collect();
    assert_eq!(dirty, vec![true, false]);
}

#[test]
fn test_current_document_requires_selection() {
    let wb = workbench();
    load(&wb, &[("/a.txt", "a")]);
    assert!(matches!(
        wb.save_current(),
        Err(DocumentError::PathNotFound(_))
    ));
}
