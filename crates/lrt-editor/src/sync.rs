//! Editing session: one template document and its projected pages.
//!
//! The session is what a presentation layer talks to. It exposes the pages
//! as a flat table model (rows are elements, columns are role, slot and the
//! four rectangle fields), accepts edits as `Mutation` values, and writes
//! every successful edit straight back into the document through the
//! path-set contract so the text can be regenerated at any time.
//!
//! There is no implicit broadcast: consumers register callbacks with
//! `subscribe` and are told about each committed change. A mutation that
//! fails leaves the session untouched and notifies nobody.

use lrt_core::emitter::emit_document;
use lrt_core::parser::{load_document, parse_document};
use lrt_core::template::{load_pages, store_page, store_pages};
use lrt_core::{
    AccessFault, Element, ElementRole, LayoutConfig, Margins, NamedVariant, Page, Table,
    TemplateError, Value, apply_layout,
};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ─── Errors ───────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Core(#[from] lrt_core::Error),
    #[error(transparent)]
    Access(#[from] AccessFault),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("document root `{0}` is not a table")]
    RootNotATable(String),
    #[error("no page {0}")]
    NoSuchPage(usize),
    #[error("page {page} has no row {row}")]
    NoSuchRow { page: usize, row: usize },
    #[error("page {0} has no size")]
    NoPageSize(usize),
    #[error("column `{0}` is read-only")]
    ReadOnly(Column),
    #[error("{value} is not a valid {what}")]
    InvalidValue { what: &'static str, value: f64 },
}

// ─── Table model ──────────────────────────────────────────────────────────

/// Columns of the element table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Role,
    Slot,
    X,
    Y,
    Width,
    Height,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Role,
        Column::Slot,
        Column::X,
        Column::Y,
        Column::Width,
        Column::Height,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Role => "role",
            Column::Slot => "slot",
            Column::X => "x",
            Column::Y => "y",
            Column::Width => "width",
            Column::Height => "height",
        }
    }

    pub fn is_editable(self) -> bool {
        !matches!(self, Column::Role | Column::Slot)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Contents of one table cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Role(ElementRole),
    Slot(usize),
    Number(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Role(role) => write!(f, "{role}"),
            Cell::Slot(slot) => write!(f, "{slot}"),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

// ─── Mutations and changes ────────────────────────────────────────────────

/// An edit requested by the presentation layer. Pages are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Edit one rectangle field. `x`/`y` move the element keeping its size;
    /// `width`/`height` resize it keeping the top-left corner.
    SetField {
        page: usize,
        row: usize,
        column: Column,
        value: f64,
    },
    SnapToGrid {
        page: usize,
        grid: f64,
    },
    AlignToMargins {
        page: usize,
        margins: Margins,
        capture: f64,
    },
    SetSpacing {
        page: usize,
        spacing: f64,
        capture: f64,
    },
    /// Run the full layout pipeline over every page.
    Tidy(LayoutConfig),
    /// Replace an existing value anywhere in the document.
    SetPath {
        path: String,
        value: Value,
    },
}

/// What a committed edit touched; passed to every observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Element {
        page: usize,
        role: ElementRole,
        slot: usize,
    },
    Page {
        page: usize,
        moved: usize,
    },
    Pages {
        moved: usize,
    },
    Path {
        path: String,
    },
    /// Whole state replaced by an undo or redo.
    Restored,
    Saved {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

type Observer = Box<dyn FnMut(&Change)>;

/// Value copy of the editable state, used for undo/redo.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    document: NamedVariant,
    pages: Vec<Page>,
}

// ─── Session ──────────────────────────────────────────────────────────────

pub struct Session {
    document: NamedVariant,
    pages: Vec<Page>,
    path: Option<PathBuf>,
    dirty: bool,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: usize,
}

impl Session {
    /// Wrap a parsed document. The root value must be a table with a
    /// `pages` sequence.
    pub fn from_document(document: NamedVariant) -> Result<Self, EditError> {
        let root = document
            .table()
            .ok_or_else(|| EditError::RootNotATable(document.name.clone()))?;
        let pages = load_pages(root)?;
        debug!("session opened with {} pages", pages.len());
        Ok(Self {
            document,
            pages,
            path: None,
            dirty: false,
            observers: Vec::new(),
            next_observer: 0,
        })
    }

    pub fn from_text(text: &str) -> Result<Self, EditError> {
        let document = parse_document(text).map_err(lrt_core::Error::from)?;
        Self::from_document(document)
    }

    /// Load a template file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EditError> {
        let path = path.as_ref();
        let mut session = Self::from_document(load_document(path)?)?;
        session.path = Some(path.to_path_buf());
        info!("opened {}", path.display());
        Ok(session)
    }

    /// Write the regenerated text to `path` and mark the session clean.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), EditError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_text()).map_err(|e| lrt_core::Error::io(path, e))?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        info!("saved {}", path.display());
        self.notify(&Change::Saved {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Regenerated document text.
    pub fn to_text(&self) -> String {
        emit_document(&self.document)
    }

    pub fn document(&self) -> &NamedVariant {
        &self.document
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page `index`, 1-based.
    pub fn page(&self, index: usize) -> Option<&Page> {
        index.checked_sub(1).and_then(|i| self.pages.get(i))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True when there are edits not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ─── Observers ───────────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: impl FnMut(&Change) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    fn notify(&mut self, change: &Change) {
        for (_, observer) in &mut self.observers {
            observer(change);
        }
    }

    // ─── Table model ─────────────────────────────────────────────────────

    /// Rows of `page`: photos then texts, placeholders omitted.
    pub fn rows(&self, page: usize) -> Vec<&Element> {
        self.page(page)
            .map(|p| p.iter().filter(|e| !e.is_placeholder()).collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, page: usize) -> usize {
        self.rows(page).len()
    }

    pub fn cell(&self, page: usize, row: usize, column: Column) -> Option<Cell> {
        let element = *self.rows(page).get(row)?;
        let r = element.rect;
        Some(match column {
            Column::Role => Cell::Role(element.role),
            Column::Slot => Cell::Slot(element.slot),
            Column::X => Cell::Number(r.x),
            Column::Y => Cell::Number(r.y),
            Column::Width => Cell::Number(r.width),
            Column::Height => Cell::Number(r.height),
        })
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply `mutation`, write the result back into the document, mark the
    /// session dirty, and notify observers.
    pub fn apply(&mut self, mutation: Mutation) -> Result<Change, EditError> {
        let change = match mutation {
            Mutation::SetField {
                page,
                row,
                column,
                value,
            } => self.set_field(page, row, column, value)?,

            Mutation::SnapToGrid { page, grid } => {
                if !(grid > 0.0 && grid.is_finite()) {
                    return Err(EditError::InvalidValue {
                        what: "grid spacing",
                        value: grid,
                    });
                }
                let mut edited = self.page_for_edit(page)?;
                let moved = edited.snap_to_grid(grid);
                self.commit_page(edited)?;
                Change::Page { page, moved }
            }

            Mutation::AlignToMargins {
                page,
                margins,
                capture,
            } => {
                let mut edited = self.page_for_edit(page)?;
                if edited.size.is_empty() {
                    return Err(EditError::NoPageSize(page));
                }
                let moved = edited.align_to_margins(&margins, capture);
                self.commit_page(edited)?;
                Change::Page { page, moved }
            }

            Mutation::SetSpacing {
                page,
                spacing,
                capture,
            } => {
                let mut edited = self.page_for_edit(page)?;
                let moved = edited.set_spacing(spacing, capture);
                self.commit_page(edited)?;
                Change::Page { page, moved }
            }

            Mutation::Tidy(config) => {
                let mut pages = self.pages.clone();
                let moved = pages.iter_mut().map(|p| apply_layout(p, &config)).sum::<usize>();
                store_pages(self.root_mut()?, &pages)?;
                self.pages = pages;
                Change::Pages { moved }
            }

            Mutation::SetPath { path, value } => {
                let mut root = self.root_mut()?.clone();
                root.set(&path, value)?;
                let pages = load_pages(&root)?;
                *self.root_mut()? = root;
                self.pages = pages;
                Change::Path { path }
            }
        };

        self.dirty = true;
        debug!("applied {change:?}");
        self.notify(&change);
        Ok(change)
    }

    fn set_field(
        &mut self,
        page: usize,
        row: usize,
        column: Column,
        value: f64,
    ) -> Result<Change, EditError> {
        if !value.is_finite() {
            return Err(EditError::InvalidValue {
                what: column.name(),
                value,
            });
        }

        let mut edited = self.page_for_edit(page)?;
        let (role, slot) = self
            .rows(page)
            .get(row)
            .map(|e| (e.role, e.slot))
            .ok_or(EditError::NoSuchRow { page, row })?;
        let element = edited
            .element_mut(role, slot)
            .ok_or(EditError::NoSuchRow { page, row })?;
        let r = &mut element.rect;
        let (x, y) = (r.x, r.y);

        match column {
            Column::Role | Column::Slot => return Err(EditError::ReadOnly(column)),
            Column::X => r.move_to(value, y),
            Column::Y => r.move_to(x, value),
            Column::Width | Column::Height if value <= 0.0 => {
                return Err(EditError::InvalidValue {
                    what: column.name(),
                    value,
                });
            }
            Column::Width => r.width = value,
            Column::Height => r.height = value,
        }

        self.commit_page(edited)?;
        Ok(Change::Element { page, role, slot })
    }

    fn page_for_edit(&self, page: usize) -> Result<Page, EditError> {
        self.page(page).cloned().ok_or(EditError::NoSuchPage(page))
    }

    /// Store `page` into the document, then replace the projected copy.
    fn commit_page(&mut self, page: Page) -> Result<(), EditError> {
        store_page(self.root_mut()?, &page)?;
        let slot = page
            .index
            .checked_sub(1)
            .and_then(|i| self.pages.get_mut(i))
            .ok_or(EditError::NoSuchPage(page.index))?;
        *slot = page;
        Ok(())
    }

    fn root_mut(&mut self) -> Result<&mut Table, EditError> {
        let name = &self.document.name;
        match &mut self.document.value {
            Value::Table(root) => Ok(root),
            _ => Err(EditError::RootNotATable(name.clone())),
        }
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.document.clone(),
            pages: self.pages.clone(),
        }
    }

    /// Replace the whole editable state and notify observers.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.document = snapshot.document;
        self.pages = snapshot.pages;
        self.dirty = true;
        self.notify(&Change::Restored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ONE_PAGE: &str = r#"t = {
        pages = {
            {
                name = "p",
                pageHeight = 200,
                pageWidth = 300,
                {
                    children = {
                        {
                            hints = { photoIndex = 1, placeholderType = "photo" },
                            transform = { height = 50, width = 80, x = 12, y = 14 },
                        },
                    },
                },
            },
        },
    }"#;

    #[test]
    fn cells_follow_rows() {
        let session = Session::from_text(ONE_PAGE).unwrap();
        assert_eq!(session.row_count(1), 1);
        assert_eq!(session.cell(1, 0, Column::Role), Some(Cell::Role(ElementRole::Photo)));
        assert_eq!(session.cell(1, 0, Column::Slot), Some(Cell::Slot(1)));
        assert_eq!(session.cell(1, 0, Column::Width), Some(Cell::Number(80.0)));
        assert_eq!(session.cell(1, 1, Column::X), None);
        assert_eq!(session.cell(2, 0, Column::X), None);
    }

    #[test]
    fn edit_x_moves_keeping_size() {
        let mut session = Session::from_text(ONE_PAGE).unwrap();
        session
            .apply(Mutation::SetField {
                page: 1,
                row: 0,
                column: Column::X,
                value: 20.0,
            })
            .unwrap();
        let root = session.document().table().unwrap();
        assert_eq!(root.get_f64("pages/1/1/children/1/transform/x").unwrap(), 20.0);
        assert_eq!(root.get_f64("pages/1/1/children/1/transform/width").unwrap(), 80.0);
        assert!(session.is_dirty());
    }

    #[test]
    fn edit_width_keeps_top_left() {
        let mut session = Session::from_text(ONE_PAGE).unwrap();
        session
            .apply(Mutation::SetField {
                page: 1,
                row: 0,
                column: Column::Width,
                value: 100.0,
            })
            .unwrap();
        assert_eq!(session.cell(1, 0, Column::X), Some(Cell::Number(12.0)));
        assert_eq!(session.cell(1, 0, Column::Width), Some(Cell::Number(100.0)));
    }

    #[test]
    fn read_only_column_is_rejected_silently() {
        let mut session = Session::from_text(ONE_PAGE).unwrap();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        session.subscribe(move |_| *counter.borrow_mut() += 1);

        let err = session
            .apply(Mutation::SetField {
                page: 1,
                row: 0,
                column: Column::Slot,
                value: 2.0,
            })
            .unwrap_err();
        assert!(matches!(err, EditError::ReadOnly(Column::Slot)));
        assert_eq!(*seen.borrow(), 0);
        assert!(!session.is_dirty());
    }

    #[test]
    fn non_positive_size_is_rejected() {
        let mut session = Session::from_text(ONE_PAGE).unwrap();
        let before = session.snapshot();
        let err = session
            .apply(Mutation::SetField {
                page: 1,
                row: 0,
                column: Column::Height,
                value: 0.0,
            })
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidValue { what: "height", .. }));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut session = Session::from_text(ONE_PAGE).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = session.subscribe(move |c| sink.borrow_mut().push(c.clone()));

        session
            .apply(Mutation::SnapToGrid { page: 1, grid: 0.5 })
            .unwrap();
        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session
            .apply(Mutation::SnapToGrid { page: 1, grid: 0.5 })
            .unwrap();

        assert_eq!(*seen.borrow(), vec![Change::Page { page: 1, moved: 0 }]);
    }

    #[test]
    fn snap_reports_moved_edges() {
        let mut session = Session::from_text(ONE_PAGE).unwrap();
        session
            .apply(Mutation::SetField {
                page: 1,
                row: 0,
                column: Column::X,
                value: 12.3,
            })
            .unwrap();
        let change = session
            .apply(Mutation::SnapToGrid { page: 1, grid: 0.5 })
            .unwrap();
        assert_eq!(change, Change::Page { page: 1, moved: 2 });
        assert_eq!(session.cell(1, 0, Column::X), Some(Cell::Number(12.5)));
    }

    #[test]
    fn root_must_be_a_table() {
        assert!(matches!(
            Session::from_text("t = 1"),
            Err(EditError::RootNotATable(_))
        ));
    }
}
