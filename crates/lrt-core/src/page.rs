//! Page layout engine.
//!
//! A `Page` holds two slot-indexed element collections (photos and texts)
//! and the page-level corrections applied to the photos: grid snapping,
//! margin alignment, and gap-spacing normalization. Every correction
//! compares against fixed thresholds and only moves edges whose drift is
//! small enough to be accidental. Text elements are never touched by the
//! layout passes.
//!
//! Placeholder elements (null rectangles left behind by sparse slot growth)
//! take no part in any operation.

use crate::layout::{Element, ElementRole, Margins, Rect, Size};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Gaps at or below this are treated as touching, not as drift.
const TOUCH_TOLERANCE: f64 = 0.1;

// ─── Page ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub preview_name: String,
    pub size: Size,
    /// 1-based position of the page in its template, 0 when built by hand.
    #[serde(default)]
    pub index: usize,
    photos: Vec<Element>,
    texts: Vec<Element>,
}

/// Bounding box of the photos and the outer margins it leaves on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub bounding_box: Rect,
    pub margins: Margins,
}

impl Page {
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            name: name.into(),
            size,
            ..Self::default()
        }
    }

    pub fn photos(&self) -> &[Element] {
        &self.photos
    }

    pub fn texts(&self) -> &[Element] {
        &self.texts
    }

    pub fn elements(&self, role: ElementRole) -> &[Element] {
        match role {
            ElementRole::Photo => &self.photos,
            ElementRole::Text => &self.texts,
        }
    }

    /// Photos then texts, placeholders included.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.photos.iter().chain(self.texts.iter())
    }

    /// Number of non-placeholder elements of both roles.
    pub fn active_count(&self) -> usize {
        self.iter().filter(|e| !e.is_placeholder()).count()
    }

    pub fn element(&self, role: ElementRole, slot: usize) -> Option<&Element> {
        slot.checked_sub(1)
            .and_then(|i| self.elements(role).get(i))
    }

    pub fn element_mut(&mut self, role: ElementRole, slot: usize) -> Option<&mut Element> {
        let collection = match role {
            ElementRole::Photo => &mut self.photos,
            ElementRole::Text => &mut self.texts,
        };
        slot.checked_sub(1).and_then(|i| collection.get_mut(i))
    }

    /// Store `element` at its slot, growing the collection with placeholders
    /// as needed so slots may be filled in any order. Returns `false` (and
    /// stores nothing) for slot 0.
    pub fn place(&mut self, element: Element) -> bool {
        if element.slot == 0 {
            warn!("{} slot 0 on page `{}` ignored", element.role, self.name);
            return false;
        }
        let role = element.role;
        let collection = match role {
            ElementRole::Photo => &mut self.photos,
            ElementRole::Text => &mut self.texts,
        };
        if collection.len() < element.slot {
            let start = collection.len() + 1;
            collection.extend((start..=element.slot).map(|slot| Element::placeholder(role, slot)));
        }
        collection[element.slot - 1] = element;
        true
    }

    // ─── Queries ──────────────────────────────────────────────────────────

    /// Union of all non-placeholder photo rectangles, or `None` if there
    /// are none.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.photos
            .iter()
            .filter(|e| !e.is_placeholder())
            .map(|e| e.rect)
            .reduce(|acc, r| acc.united(&r))
    }

    /// Bounding box plus the margins between it and the page edges.
    pub fn report(&self) -> Option<PageReport> {
        let br = self.bounding_box()?;
        Some(PageReport {
            bounding_box: br,
            margins: Margins::new(
                br.left(),
                br.top(),
                self.size.width - br.right(),
                self.size.height - br.bottom(),
            ),
        })
    }

    // ─── Layout operations ────────────────────────────────────────────────

    /// Snap every photo's edges to the nearest multiple of `spacing`.
    /// Returns the number of edges moved.
    pub fn snap_to_grid(&mut self, spacing: f64) -> usize {
        if !(spacing > 0.0 && spacing.is_finite()) {
            warn!("ignoring grid spacing {spacing} on page `{}`", self.name);
            return 0;
        }
        let mut moved = 0;
        for element in self.photos.iter_mut().filter(|e| !e.is_placeholder()) {
            let edges = element.snap_to_grid(spacing);
            if edges > 0 {
                debug!("snapped {edges} edges of {element} to {spacing} grid");
            }
            moved += edges;
        }
        moved
    }

    /// Pull edges within `capture` (exclusive) of the margin frame onto it.
    /// Returns the number of edges moved.
    ///
    /// # Panics
    /// If the page size is empty; the frame is undefined without one.
    pub fn align_to_margins(&mut self, margins: &Margins, capture: f64) -> usize {
        assert!(
            !self.size.is_empty(),
            "align_to_margins on page `{}` with no page size",
            self.name
        );

        let frame = self.size.to_rect().margins_removed(margins);
        let mut moved = 0;

        for e in self.photos.iter_mut() {
            if e.is_placeholder() {
                continue;
            }
            if let Some(to) = capture_edge(e.rect.top(), frame.top(), capture) {
                debug!("aligning top of {e} from {} to {to}", e.rect.top());
                e.rect.set_top(to);
                moved += 1;
            }
            if let Some(to) = capture_edge(e.rect.bottom(), frame.bottom(), capture) {
                debug!("aligning bottom of {e} from {} to {to}", e.rect.bottom());
                e.rect.set_bottom(to);
                moved += 1;
            }
            if let Some(to) = capture_edge(e.rect.left(), frame.left(), capture) {
                debug!("aligning left of {e} from {} to {to}", e.rect.left());
                e.rect.set_left(to);
                moved += 1;
            }
            if let Some(to) = capture_edge(e.rect.right(), frame.right(), capture) {
                debug!("aligning right of {e} from {} to {to}", e.rect.right());
                e.rect.set_right(to);
                moved += 1;
            }
        }
        moved
    }

    /// Normalize horizontal gaps between side-by-side photos to `spacing`.
    /// Returns the number of edges moved.
    pub fn set_horizontal_spacing(&mut self, spacing: f64, capture: f64) -> usize {
        normalize_gaps(&mut self.photos, spacing, capture, Axis::Horizontal)
    }

    /// Normalize vertical gaps between stacked photos to `spacing`.
    pub fn set_vertical_spacing(&mut self, spacing: f64, capture: f64) -> usize {
        normalize_gaps(&mut self.photos, spacing, capture, Axis::Vertical)
    }

    /// Horizontal pass, then vertical pass over the updated positions.
    pub fn set_spacing(&mut self, spacing: f64, capture: f64) -> usize {
        self.set_horizontal_spacing(spacing, capture) + self.set_vertical_spacing(spacing, capture)
    }
}

fn capture_edge(edge: f64, target: f64, capture: f64) -> Option<f64> {
    (edge != target && (target - edge).abs() < capture).then_some(target)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// All-pairs gap correction. The subject is re-read on every comparison so
/// moves made earlier in the scan are seen by later pairs.
fn normalize_gaps(elements: &mut [Element], spacing: f64, capture: f64, axis: Axis) -> usize {
    let mut moved = 0;
    for s in 0..elements.len() {
        for o in 0..elements.len() {
            if s == o {
                continue;
            }
            let subject = elements[s];
            let other = &mut elements[o];
            if subject.is_placeholder() || other.is_placeholder() {
                continue;
            }

            let (neighbour, near_edge, far_edge) = match axis {
                Axis::Horizontal => (
                    other.is_to_the_right_of(&subject),
                    subject.rect.right(),
                    other.rect.left(),
                ),
                Axis::Vertical => (
                    other.is_below(&subject),
                    subject.rect.bottom(),
                    other.rect.top(),
                ),
            };
            if !neighbour {
                continue;
            }

            let gap = (near_edge - far_edge).abs();
            if gap > TOUCH_TOLERANCE && gap != spacing && gap <= capture {
                let to = near_edge + spacing;
                match axis {
                    Axis::Horizontal => {
                        debug!("horizontal gap {subject} to {other} was {gap}, left edge {far_edge} -> {to}");
                        other.rect.set_left(to);
                    }
                    Axis::Vertical => {
                        debug!("vertical gap {subject} to {other} was {gap}, top edge {far_edge} -> {to}");
                        other.rect.set_top(to);
                    }
                }
                moved += 1;
            }
        }
    }
    moved
}

// ─── Tests ────────────────────────────────────────────────────────────────
