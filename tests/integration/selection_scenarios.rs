use crate::support::{p, record_events, workbench_with_files};
use workbench::selection::{PreviewTarget, View};
use workbench::tree::FileChange;
use workbench::WorkbenchEvent;

fn preview(port: u16) -> PreviewTarget {
    PreviewTarget {
        port,
        url: format!("http://localhost:{}", port),
    }
}

#[test]
fn test_deleting_selected_file_clears_selection_and_retires_document() {
    let wb = workbench_with_files(&[("/src/app.js", "a"), ("/src/util.js", "u")]);
    wb.select_file(Some(p("/src/app.js"))).unwrap();
    assert!(wb.current_document().is_some());

    wb.apply_file_change(&p("/src/app.js"), FileChange::Delete)
        .unwrap();

    assert_eq!(wb.selection().selected_file, None);
    assert!(wb.document(&p("/src/app.js")).is_none());
    assert!(wb.current_document().is_none());
}

#[test]
fn test_removing_parent_folder_clears_selection() {
    let wb = workbench_with_files(&[("/src/app.js", "a")]);
    wb.select_file(Some(p("/src/app.js"))).unwrap();

    wb.apply_file_change(&p("/src"), FileChange::Delete).unwrap();

    assert_eq!(wb.selection().selected_file, None);
}

#[test]
fn test_first_preview_switches_view_once() {
    let wb = workbench_with_files(&[("/index.html", "<p>hi</p>")]);
    assert_eq!(wb.selection().current_view, View::Code);

    assert!(wb.add_preview(preview(5173)));
    assert_eq!(wb.selection().current_view, View::Preview);

    wb.set_view(View::Code);
    wb.add_preview(preview(3000));
    wb.apply_file_change(&p("/index.html"), FileChange::Write("<p>x</p>".into()))
        .unwrap();
    assert_eq!(wb.selection().current_view, View::Code);

    wb.remove_preview(5173);
    wb.remove_preview(3000);
    wb.add_preview(preview(5173));
    assert_eq!(wb.selection().current_view, View::Preview);
}

#[test]
fn test_reveal_file_forces_code_view() {
    let wb = workbench_with_files(&[("/a.txt", "a")]);
    wb.add_preview(preview(8080));
    assert_eq!(wb.selection().current_view, View::Preview);

    wb.reveal_file(&p("/a.txt")).unwrap();

    let selection = wb.selection();
    assert_eq!(selection.current_view, View::Code);
    assert_eq!(selection.selected_file, Some(p("/a.txt")));
}

#[test]
fn test_panel_flags_emit_on_change() {
    let wb = workbench_with_files(&[]);
    let events = record_events(&wb);

    assert!(wb.toggle_terminal(true));
    assert!(!wb.toggle_terminal(true));
    assert!(wb.set_workbench_visible(true));

    assert_eq!(
        *events.lock(),
        vec![
            WorkbenchEvent::TerminalToggled { visible: true },
            WorkbenchEvent::WorkbenchVisibilityChanged { visible: true },
        ]
    );
    assert!(wb.selection().terminal_visible);
}

#[test]
fn test_mutation_events_in_tree_document_selection_order() {
    let wb = workbench_with_files(&[("/a.txt", "a")]);
    wb.select_file(Some(p("/a.txt"))).unwrap();
    let events = record_events(&wb);

    wb.apply_file_change(&p("/a.txt"), FileChange::Delete).unwrap();

    let kinds: Vec<&'static str> = events
        .lock()
        .iter()
        .map(|e| match e {
            WorkbenchEvent::FilesChanged { .. } => "tree",
            WorkbenchEvent::DocumentRetired { .. } => "document",
            WorkbenchEvent::SelectionChanged { .. } => "selection",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["tree", "document", "selection"]);
}
