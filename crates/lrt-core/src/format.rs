//! Template tidying pipeline: parse → load pages → layout passes → store → emit.
//!
//! Used by the `lrt tidy` command and by the editor's one-shot tidy action.

use crate::emitter::emit_document;
use crate::error::{AccessFault, Error};
use crate::layout::Margins;
use crate::page::Page;
use crate::parser::parse_document;
use crate::template::{load_pages, store_pages};
use log::{info, warn};
use serde::{Deserialize, Serialize};

// ─── Config ───────────────────────────────────────────────────────────────

/// Parameters for `apply_layout` and `tidy_document`.
///
/// Defaults are the values the product ships with: a half-point grid, a
/// 52.5pt margin on every side, 10pt gutters, and a 42pt capture threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Grid spacing for edge snapping. Default: **0.5**.
    pub grid: f64,

    /// Uniform page margin. Default: **52.5**.
    pub margin: f64,

    /// Desired gap between neighbouring elements. Default: **10**.
    pub spacing: f64,

    /// Largest drift treated as accidental and corrected. Default: **42**.
    pub capture: f64,

    pub snap_to_grid: bool,
    pub align_to_margins: bool,
    pub normalize_spacing: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid: 0.5,
            margin: 52.5,
            spacing: 10.0,
            capture: 42.0,
            snap_to_grid: true,
            align_to_margins: true,
            normalize_spacing: true,
        }
    }
}

impl LayoutConfig {
    pub fn margins(&self) -> Margins {
        Margins::uniform(self.margin)
    }
}

// ─── Pipeline ─────────────────────────────────────────────────────────────

/// Run the enabled layout passes on one page: snap to grid, align to
/// margins, then normalize spacing. Returns the number of edges moved.
///
/// A page without a size skips margin alignment.
pub fn apply_layout(page: &mut Page, config: &LayoutConfig) -> usize {
    let mut moved = 0;

    if config.snap_to_grid {
        moved += page.snap_to_grid(config.grid);
    }

    if config.align_to_margins {
        if page.size.is_empty() {
            warn!("page `{}` has no size, margin alignment skipped", page.name);
        } else {
            moved += page.align_to_margins(&config.margins(), config.capture);
        }
    }

    if config.normalize_spacing {
        moved += page.set_spacing(config.spacing, config.capture);
    }

    moved
}

/// Parse a template document, tidy every page, and re-emit it.
///
/// # Errors
/// Any parse error, a root value that is not a table, or a template
/// projection fault.
pub fn tidy_document(text: &str, config: &LayoutConfig) -> Result<String, Error> {
    let mut doc = parse_document(text)?;
    let name = doc.name.clone();
    let root = doc.table_mut().ok_or(AccessFault::NotATable(name))?;

    let mut pages = load_pages(root)?;
    for page in &mut pages {
        let moved = apply_layout(page, config);
        info!("page {} `{}`: {moved} edges moved", page.index, page.name);
    }
    store_pages(root, &pages)?;

    Ok(emit_document(&doc))
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Element, ElementRole, Rect, Size};
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"templatePages = {
        pages = {
            {
                name = "p1",
                pageHeight = 783,
                pageWidth = 909,
                {
                    children = {
                        {
                            hints = { photoIndex = 1, placeholderType = "photo" },
                            transform = { height = 300.2, width = 380.1, x = 55.3, y = 54 },
                        },
                        {
                            hints = { photoIndex = 2, placeholderType = "photo" },
                            transform = { height = 300, width = 400, x = 449.1, y = 54 },
                        },
                    },
                },
            },
        },
    }"#;

    #[test]
    fn config_defaults() {
        let config = LayoutConfig::default();
        assert_eq!(config.grid, 0.5);
        assert_eq!(config.margins(), Margins::uniform(52.5));
        assert_eq!(config.spacing, 10.0);
        assert_eq!(config.capture, 42.0);
        assert!(config.snap_to_grid && config.align_to_margins && config.normalize_spacing);
    }

    #[test]
    fn apply_layout_runs_passes_in_order() {
        let mut page = Page::new("p", Size::new(909.0, 783.0));
        page.place(Element::new(ElementRole::Photo, 1, Rect::new(55.3, 54.0, 380.1, 300.2)));
        page.place(Element::new(ElementRole::Photo, 2, Rect::new(449.1, 54.0, 400.0, 300.0)));
        apply_layout(&mut page, &LayoutConfig::default());

        let a = page.element(ElementRole::Photo, 1).unwrap().rect;
        let b = page.element(ElementRole::Photo, 2).unwrap().rect;
        // snapped, then pulled onto the 52.5 frame
        assert_eq!(a.left(), 52.5);
        assert_eq!(a.top(), 52.5);
        assert_eq!(b.top(), 52.5);
        assert_eq!(b.right(), 856.5);
        // gutter normalized to 10
        assert_eq!(b.left() - a.right(), 10.0);
    }

    #[test]
    fn apply_layout_keeps_captions_in_place() {
        let mut page = Page::new("p", Size::new(909.0, 783.0));
        page.place(Element::new(ElementRole::Photo, 1, Rect::new(52.5, 52.5, 400.0, 300.0)));
        let caption = Rect::new(100.0, 382.5, 200.0, 20.0);
        page.place(Element::new(ElementRole::Text, 1, caption));

        apply_layout(&mut page, &LayoutConfig::default());
        assert_eq!(page.element(ElementRole::Text, 1).unwrap().rect, caption);
    }

    #[test]
    fn apply_layout_counts_snapped_edges() {
        let mut page = Page::new("p", Size::new(909.0, 783.0));
        page.place(Element::new(ElementRole::Photo, 1, Rect::new(300.2, 300.0, 100.0, 100.0)));
        assert_eq!(apply_layout(&mut page, &LayoutConfig::default()), 2);
    }

    #[test]
    fn disabled_passes_leave_page_alone() {
        let mut page = Page::new("p", Size::new(909.0, 783.0));
        page.place(Element::new(ElementRole::Photo, 1, Rect::new(55.3, 54.0, 380.1, 300.2)));
        let before = page.clone();
        let config = LayoutConfig {
            snap_to_grid: false,
            align_to_margins: false,
            normalize_spacing: false,
            ..LayoutConfig::default()
        };
        assert_eq!(apply_layout(&mut page, &config), 0);
        assert_eq!(page, before);
    }

    #[test]
    fn page_without_size_skips_alignment() {
        let mut page = Page::new("p", Size::default());
        page.place(Element::new(ElementRole::Photo, 1, Rect::new(55.0, 54.0, 100.0, 100.0)));
        apply_layout(&mut page, &LayoutConfig::default());
        assert_eq!(page.element(ElementRole::Photo, 1).unwrap().rect.left(), 55.0);
    }

    #[test]
    fn tidy_is_idempotent() {
        let config = LayoutConfig::default();
        let once = tidy_document(PAGE, &config).unwrap();
        let twice = tidy_document(&once, &config).unwrap();
        assert_eq!(once, twice);
        assert!(once.contains("x = 52.5,"));
    }

    #[test]
    fn tidy_reports_parse_errors() {
        let err = tidy_document("templatePages = {", &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn tidy_requires_table_root() {
        let err = tidy_document("n = 3", &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Access(AccessFault::NotATable(_))));
    }
}
