//! Integration tests: editing session against a real template.

use lrt_core::parser::parse_document;
use lrt_core::{ElementRole, LayoutConfig, Margins, Value};
use lrt_editor::sync::{Cell, Change, Column, EditError, Mutation, Session};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const TEMPLATE: &str = include_str!("fixtures/templatePages.lua");

fn transform(session: &Session, page: usize, child: usize, key: &str) -> f64 {
    session
        .document()
        .table()
        .unwrap()
        .get_f64(&format!("pages/{page}/1/children/{child}/transform/{key}"))
        .unwrap()
}

fn recorder(session: &mut Session) -> Rc<RefCell<Vec<Change>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    session.subscribe(move |c: &Change| sink.borrow_mut().push(c.clone()));
    seen
}

// ─── Table model ────────────────────────────────────────────────────────

#[test]
fn rows_list_photos_then_texts() {
    let session = Session::from_text(TEMPLATE).unwrap();
    assert_eq!(session.pages().len(), 2);
    assert_eq!(session.row_count(1), 3);
    let roles: Vec<_> = (0..3)
        .map(|row| session.cell(1, row, Column::Role).unwrap())
        .collect();
    assert_eq!(
        roles,
        [
            Cell::Role(ElementRole::Photo),
            Cell::Role(ElementRole::Photo),
            Cell::Role(ElementRole::Text),
        ]
    );
    assert_eq!(session.cell(1, 2, Column::Y), Some(Cell::Number(497.3)));
    assert_eq!(session.row_count(2), 1);
}

#[test]
fn editable_columns() {
    let editable: Vec<_> = Column::ALL
        .iter()
        .filter(|c| c.is_editable())
        .map(|c| c.name())
        .collect();
    assert_eq!(editable, ["x", "y", "width", "height"]);
}

// ─── Field edits ────────────────────────────────────────────────────────

#[test]
fn edit_y_writes_back_to_document() {
    let mut session = Session::from_text(TEMPLATE).unwrap();
    let seen = recorder(&mut session);

    let change = session
        .apply(Mutation::SetField {
            page: 1,
            row: 2,
            column: Column::Y,
            value: 500.0,
        })
        .unwrap();

    assert_eq!(
        change,
        Change::Element {
            page: 1,
            role: ElementRole::Text,
            slot: 1,
        }
    );
    assert_eq!(transform(&session, 1, 3, "y"), 500.0);
    assert_eq!(transform(&session, 1, 3, "height"), 40.0);
    assert_eq!(*seen.borrow(), vec![change]);
    assert!(session.is_dirty());
}

#[test]
fn edit_height_keeps_top() {
    let mut session = Session::from_text(TEMPLATE).unwrap();
    session
        .apply(Mutation::SetField {
            page: 2,
            row: 0,
            column: Column::Height,
            value: 600.0,
        })
        .unwrap();
    assert_eq!(transform(&session, 2, 2, "y"), 52.5);
    assert_eq!(transform(&session, 2, 2, "height"), 600.0);
}

#[test]
fn bad_row_leaves_state_unchanged() {
    let mut session = Session::from_text(TEMPLATE).unwrap();
    let seen = recorder(&mut session);
    let before = session.snapshot();

    let err = session
        .apply(Mutation::SetField {
            page: 1,
            row: 7,
            column: Column::X,
            value: 1.0,
        })
        .unwrap_err();

    assert!(matches!(err, EditError::NoSuchRow { page: 1, row: 7 }));
    assert_eq!(session.snapshot(), before);
    assert!(seen.borrow().is_empty());
    assert!(!session.is_dirty());
}

// ─── Layout operations ──────────────────────────────────────────────────

#[test]
fn align_then_spacing_on_one_page() {
    let mut session = Session::from_text(TEMPLATE).unwrap();
    session
        .apply(Mutation::SnapToGrid { page: 1, grid: 0.5 })
        .unwrap();
    let change = session
        .apply(Mutation::AlignToMargins {
            page: 1,
            margins: Margins::uniform(52.5),
            capture: 42.0,
        })
        .unwrap();
    assert_eq!(change, Change::Page { page: 1, moved: 4 });
    session
        .apply(Mutation::SetSpacing {
            page: 1,
            spacing: 10.0,
            capture: 42.0,
        })
        .unwrap();

    assert_eq!(transform(&session, 1, 1, "x"), 52.5);
    assert_eq!(transform(&session, 1, 2, "x"), 455.5);
    assert_eq!(transform(&session, 1, 3, "y"), 497.3);
}

#[test]
fn tidy_matches_core_pipeline() {
    let mut session = Session::from_text(TEMPLATE).unwrap();
    session.apply(Mutation::Tidy(LayoutConfig::default())).unwrap();
    let expected = lrt_core::tidy_document(TEMPLATE, &LayoutConfig::default()).unwrap();
    assert_eq!(session.to_text(), expected);
}

// ─── Path edits ─────────────────────────────────────────────────────────

#[test]
fn set_path_reprojects_pages() {
    let mut session = Session::from_text(TEMPLATE).unwrap();
    let change = session
        .apply(Mutation::SetPath {
            path: "pages/2/pageWidth".into(),
            value: Value::Integer(1000),
        })
        .unwrap();
    assert_eq!(
        change,
        Change::Path {
            path: "pages/2/pageWidth".into()
        }
    );
    assert_eq!(session.page(2).unwrap().size.width, 1000.0);
}

#[test]
fn set_path_that_breaks_projection_is_refused() {
    let mut session = Session::from_text(TEMPLATE).unwrap();
    let before = session.snapshot();
    let err = session
        .apply(Mutation::SetPath {
            path: "pages/1/pageHeight".into(),
            value: Value::from("tall"),
        })
        .unwrap_err();
    assert!(matches!(err, EditError::Template(_)));
    assert_eq!(session.snapshot(), before);
}

#[test]
fn set_path_cannot_create_keys() {
    let mut session = Session::from_text(TEMPLATE).unwrap();
    let err = session
        .apply(Mutation::SetPath {
            path: "hints/brandNew".into(),
            value: Value::Boolean(true),
        })
        .unwrap_err();
    assert!(matches!(err, EditError::Access(_)));
}

// ─── Save / open ────────────────────────────────────────────────────────

#[test]
fn save_clears_dirty_and_reopens() {
    let path = std::env::temp_dir().join(format!("lrt-session-{}.lua", std::process::id()));
    let mut session = Session::from_text(TEMPLATE).unwrap();
    session
        .apply(Mutation::SetField {
            page: 1,
            row: 0,
            column: Column::Width,
            value: 400.0,
        })
        .unwrap();
    assert!(session.is_dirty());

    let seen = recorder(&mut session);
    session.save(&path).unwrap();
    assert!(!session.is_dirty());
    assert_eq!(
        *seen.borrow(),
        vec![Change::Saved { path: path.clone() }]
    );

    let reopened = Session::open(&path).unwrap();
    assert_eq!(reopened.path(), Some(path.as_path()));
    assert_eq!(reopened.document(), session.document());
    assert_eq!(
        parse_document(&reopened.to_text()).unwrap(),
        *session.document()
    );
    let _ = std::fs::remove_file(&path);
}

#[test]
fn open_missing_file_fails() {
    let err = Session::open("/nonexistent/templatePages.lua").err().unwrap();
    assert!(matches!(err, EditError::Core(lrt_core::Error::Io { .. })));
}
