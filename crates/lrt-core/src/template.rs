//! Projection between template documents and layout pages.
//!
//! A `templatePages.lua` root table looks like:
//!
//! ```text
//! templatePages = {
//!     hints = { bookTitle = "Custom Pages", ... },
//!     pages = {
//!         {
//!             name = "...", previewName = "...",
//!             pageWidth = 909, pageHeight = 783,
//!             {
//!                 children = {
//!                     {
//!                         hints = { placeholderType = "photo", photoIndex = 1 },
//!                         transform = { x = 0, y = 348, width = 580.5, height = 435.5 },
//!                     },
//!                 },
//!             },
//!         },
//!     },
//! }
//! ```
//!
//! Loading reads each page's children into a `Page`; storing writes the
//! four transform numbers of every element back to the child it came from
//! and touches nothing else.

use crate::error::{AccessFault, TemplateError};
use crate::layout::{Element, ElementRole, Rect, Size};
use crate::page::Page;
use crate::value::Table;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Element children of a page, relative to the page table.
const CHILDREN: &str = "1/children";

/// `hints/bookTitle`, if present.
pub fn book_title(root: &Table) -> Option<&str> {
    root.get_str("hints/bookTitle").ok()
}

/// Number of entries in the `pages` sequence.
pub fn page_count(root: &Table) -> Result<usize, TemplateError> {
    root.sequence_len("pages").map_err(TemplateError::Root)
}

/// Project every page of the template.
pub fn load_pages(root: &Table) -> Result<Vec<Page>, TemplateError> {
    let count = page_count(root)?;
    debug!("template has {count} pages");
    (1..=count).map(|i| load_page(root, i)).collect()
}

/// Project page `index` (1-based).
pub fn load_page(root: &Table, index: usize) -> Result<Page, TemplateError> {
    let page_fault = |fault| TemplateError::Page { page: index, fault };

    let table = root
        .get_table(&format!("pages/{index}"))
        .map_err(page_fault)?;

    let size = Size::new(
        table.get_f64("pageWidth").map_err(page_fault)?,
        table.get_f64("pageHeight").map_err(page_fault)?,
    );
    let mut page = Page::new(optional_str(table, "name").map_err(page_fault)?, size);
    page.preview_name = optional_str(table, "previewName").map_err(page_fault)?;
    page.index = index;

    let children = match table.get_table(CHILDREN) {
        Ok(children) => children,
        Err(AccessFault::MissingKey(_) | AccessFault::IndexOutOfRange { .. }) => {
            debug!("page {index} has no element children");
            return Ok(page);
        }
        Err(fault) => return Err(page_fault(fault)),
    };

    for (offset, child) in children.sequence().enumerate() {
        let child_index = offset + 1;
        let Some(child) = child.as_table() else {
            debug!("page {index}, child {child_index}: not a table, skipped");
            continue;
        };
        let element = read_element(child).map_err(|fault| TemplateError::Element {
            page: index,
            child: child_index,
            fault,
        })?;
        match element {
            Some(element) => {
                page.place(element.with_source(child_index));
            }
            None => debug!("page {index}, child {child_index}: not a placeholder, skipped"),
        }
    }

    Ok(page)
}

/// Read one child table. `Ok(None)` for children that are not photo or text
/// placeholders with a slot and a transform.
fn read_element(child: &Table) -> Result<Option<Element>, AccessFault> {
    let kind = optional_str(child, "hints/placeholderType")?;
    let role = if kind.is_empty() {
        ElementRole::Photo
    } else {
        match ElementRole::from_placeholder(&kind) {
            Some(role) => role,
            None => return Ok(None),
        }
    };

    let slot_key = match role {
        ElementRole::Photo => "hints/photoIndex",
        ElementRole::Text => "hints/textIndex",
    };
    let slot = match child.get_int(slot_key) {
        Ok(slot) => slot,
        Err(AccessFault::MissingKey(_)) => return Ok(None),
        Err(fault) => return Err(fault),
    };
    let Ok(slot) = usize::try_from(slot) else {
        warn!("negative {role} slot {slot} skipped");
        return Ok(None);
    };

    if child.get_table("transform").is_err() {
        return Ok(None);
    }
    let rect = Rect::new(
        child.get_f64("transform/x")?,
        child.get_f64("transform/y")?,
        child.get_f64("transform/width")?,
        child.get_f64("transform/height")?,
    );
    Ok(Some(Element::new(role, slot, rect)))
}

/// Write `page`'s element rectangles back into the template.
///
/// Elements without a source child (added by hand) are skipped. On error the
/// template is left unchanged.
pub fn store_page(root: &mut Table, page: &Page) -> Result<(), TemplateError> {
    let mut updated = root.clone();
    write_page(&mut updated, page)?;
    *root = updated;
    Ok(())
}

/// Write several pages back; all or nothing.
pub fn store_pages(root: &mut Table, pages: &[Page]) -> Result<(), TemplateError> {
    let mut updated = root.clone();
    for page in pages {
        write_page(&mut updated, page)?;
    }
    *root = updated;
    Ok(())
}

fn write_page(root: &mut Table, page: &Page) -> Result<(), TemplateError> {
    if page.index == 0 {
        return Err(TemplateError::Page {
            page: 0,
            fault: AccessFault::IndexOutOfRange {
                index: 0,
                len: root.sequence_len("pages").unwrap_or(0),
            },
        });
    }

    for element in page.iter().filter(|e| !e.is_placeholder()) {
        let Some(child) = element.source else {
            debug!("page {}: {element} has no template child, not stored", page.index);
            continue;
        };
        let base = format!("pages/{}/{CHILDREN}/{child}/transform", page.index);
        let r = element.rect;
        for (key, number) in [("x", r.x), ("y", r.y), ("width", r.width), ("height", r.height)] {
            root.set_number(&format!("{base}/{key}"), number)
                .map_err(|fault| TemplateError::Element {
                    page: page.index,
                    child,
                    fault,
                })?;
        }
    }
    Ok(())
}

fn optional_str(table: &Table, path: &str) -> Result<String, AccessFault> {
    match table.get_str(path) {
        Ok(s) => Ok(s.to_string()),
        Err(AccessFault::MissingKey(_)) => Ok(String::new()),
        Err(fault) => Err(fault),
    }
}

// ─── Template sizes ───────────────────────────────────────────────────────

/// One book format from `layout_template_sizes.lua`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSize {
    pub id: String,
    pub title: String,
    pub width: f64,
    pub height: f64,
}

/// Read the sequence of book formats from a template-sizes root table.
pub fn load_template_sizes(root: &Table) -> Result<Vec<TemplateSize>, TemplateError> {
    let mut sizes = Vec::with_capacity(root.len());
    for (offset, entry) in root.sequence().enumerate() {
        let index = offset + 1;
        let size_fault = |fault| TemplateError::Size { entry: index, fault };
        let table = entry.as_table().ok_or_else(|| {
            size_fault(AccessFault::TypeMismatch {
                path: index.to_string(),
                expected: "a table",
                found: entry.type_name(),
            })
        })?;
        sizes.push(TemplateSize {
            id: table.get_str("id").map_err(size_fault)?.to_string(),
            title: optional_str(table, "title").map_err(size_fault)?,
            width: table.get_f64("width").map_err(size_fault)?,
            height: table.get_f64("height").map_err(size_fault)?,
        });
    }
    Ok(sizes)
}
