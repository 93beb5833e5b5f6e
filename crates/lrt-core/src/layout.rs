//! Rectangle geometry for layout elements.
//!
//! Coordinates follow the template convention: `y` grows downward, so `top`
//! is the smaller value and `bottom` the larger.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Rect ─────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle with `f64` coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Move the left edge, keeping the right edge in place.
    pub fn set_left(&mut self, left: f64) {
        let right = self.right();
        self.x = left;
        self.width = right - left;
    }

    /// Move the top edge, keeping the bottom edge in place.
    pub fn set_top(&mut self, top: f64) {
        let bottom = self.bottom();
        self.y = top;
        self.height = bottom - top;
    }

    pub fn set_right(&mut self, right: f64) {
        self.width = right - self.x;
    }

    pub fn set_bottom(&mut self, bottom: f64) {
        self.height = bottom - self.y;
    }

    /// Move the top-left corner, keeping the size.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// A placeholder rectangle: zero width and zero height.
    pub fn is_null(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    /// Smallest rectangle containing both. Null rectangles contribute nothing.
    pub fn united(&self, other: &Rect) -> Rect {
        if self.is_null() {
            return *other;
        }
        if other.is_null() {
            return *self;
        }
        Rect::from_edges(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Shrink by `margins` on each side.
    pub fn margins_removed(&self, margins: &Margins) -> Rect {
        Rect::from_edges(
            self.left() + margins.left,
            self.top() + margins.top,
            self.right() - margins.right,
            self.bottom() - margins.bottom,
        )
    }

    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        self.top() <= other.bottom() && self.bottom() >= other.top()
    }

    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.left() <= other.right() && self.right() >= other.left()
    }

    /// Snap each edge independently to the nearest multiple of `spacing`,
    /// in the order top, bottom, left, right. Ties round forward.
    /// Returns the number of edges that moved.
    pub fn snap_to_grid(&mut self, spacing: f64) -> usize {
        let mut moved = 0;
        let top = snap(self.top(), spacing);
        if top != self.top() {
            self.set_top(top);
            moved += 1;
        }
        let bottom = snap(self.bottom(), spacing);
        if bottom != self.bottom() {
            self.set_bottom(bottom);
            moved += 1;
        }
        let left = snap(self.left(), spacing);
        if left != self.left() {
            self.set_left(left);
            moved += 1;
        }
        let right = snap(self.right(), spacing);
        if right != self.right() {
            self.set_right(right);
            moved += 1;
        }
        moved
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

fn snap(value: f64, spacing: f64) -> f64 {
    let rem = value.rem_euclid(spacing);
    if rem < spacing / 2.0 {
        value - rem
    } else {
        value + (spacing - rem)
    }
}

// ─── Margins / Size ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Margins {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Same margin on all four sides.
    pub fn uniform(margin: f64) -> Self {
        Self::new(margin, margin, margin, margin)
    }
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

// ─── Element ──────────────────────────────────────────────────────────────

/// Which placeholder collection an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementRole {
    Photo,
    Text,
}

impl ElementRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementRole::Photo => "photo",
            ElementRole::Text => "text",
        }
    }

    /// Role named by a `placeholderType` hint.
    pub fn from_placeholder(kind: &str) -> Option<Self> {
        match kind {
            "photo" => Some(ElementRole::Photo),
            "text" => Some(ElementRole::Text),
            _ => None,
        }
    }
}

impl fmt::Display for ElementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned placeholder box on a page.
///
/// `slot` is the externally assigned 1-based identity ("photo #3"), not the
/// element's position in any collection. `source` records which template
/// child the element was read from so edits can be written back there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub role: ElementRole,
    pub slot: usize,
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
}

impl Element {
    pub fn new(role: ElementRole, slot: usize, rect: Rect) -> Self {
        Self {
            role,
            slot,
            rect,
            source: None,
        }
    }

    /// Empty stand-in for a slot no template child has filled.
    pub fn placeholder(role: ElementRole, slot: usize) -> Self {
        Self::new(role, slot, Rect::default())
    }

    pub fn with_source(mut self, child: usize) -> Self {
        self.source = Some(child);
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.rect.is_null()
    }

    pub fn is_to_the_right_of(&self, other: &Element) -> bool {
        self.rect.overlaps_vertically(&other.rect) && self.rect.left() >= other.rect.right()
    }

    /// Note: not the mirror of `is_to_the_right_of`; any vertically
    /// overlapping element whose left edge is not past our right edge counts.
    pub fn is_to_the_left_of(&self, other: &Element) -> bool {
        self.rect.overlaps_vertically(&other.rect) && self.rect.right() >= other.rect.left()
    }

    pub fn is_below(&self, other: &Element) -> bool {
        self.rect.overlaps_horizontally(&other.rect) && self.rect.top() >= other.rect.bottom()
    }

    pub fn is_above(&self, other: &Element) -> bool {
        self.rect.overlaps_horizontally(&other.rect) && self.rect.bottom() >= other.rect.top()
    }

    pub fn snap_to_grid(&mut self, spacing: f64) -> usize {
        self.rect.snap_to_grid(spacing)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role, self.slot)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn photo(slot: usize, x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::new(ElementRole::Photo, slot, Rect::new(x, y, w, h))
    }

    #[test]
    fn edge_setters_keep_opposite_edge() {
        let mut r = Rect::new(10.0, 20.0, 100.0, 50.0);
        r.set_left(15.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.width, 95.0);
        r.set_top(25.0);
        assert_eq!(r.bottom(), 70.0);
        r.set_right(120.0);
        assert_eq!(r.left(), 15.0);
        r.set_bottom(80.0);
        assert_eq!(r.top(), 25.0);
        assert_eq!(r, Rect::from_edges(15.0, 25.0, 120.0, 80.0));
    }

    #[test]
    fn move_to_keeps_size() {
        let mut r = Rect::new(0.0, 0.0, 30.0, 40.0);
        r.move_to(5.0, 6.0);
        assert_eq!(r, Rect::new(5.0, 6.0, 30.0, 40.0));
    }

    #[test]
    fn united_ignores_null() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.united(&b), Rect::from_edges(0.0, 0.0, 30.0, 15.0));
        assert_eq!(Rect::default().united(&b), b);
        assert_eq!(a.united(&Rect::default()), a);
    }

    #[test]
    fn right_of_requires_vertical_overlap() {
        let a = photo(1, 0.0, 0.0, 10.0, 10.0);
        let b = photo(2, 15.0, 0.0, 10.0, 10.0);
        let far_below = photo(3, 15.0, 100.0, 10.0, 10.0);
        assert!(b.is_to_the_right_of(&a));
        assert!(!a.is_to_the_right_of(&b));
        assert!(!far_below.is_to_the_right_of(&a));
    }

    #[test]
    fn left_of_is_not_the_mirror_of_right_of() {
        let a = photo(1, 0.0, 0.0, 10.0, 10.0);
        let b = photo(2, 15.0, 0.0, 10.0, 10.0);
        assert!(a.is_to_the_left_of(&b));
        // b is right of a, yet b.right (25) >= a.left (0) also holds.
        assert!(b.is_to_the_left_of(&a));
    }

    #[test]
    fn below_and_above() {
        let a = photo(1, 0.0, 0.0, 10.0, 10.0);
        let b = photo(2, 0.0, 20.0, 10.0, 10.0);
        assert!(b.is_below(&a));
        assert!(!a.is_below(&b));
        assert!(a.is_above(&b));
        let beside = photo(3, 50.0, 20.0, 10.0, 10.0);
        assert!(!beside.is_below(&a));
    }

    #[test]
    fn touching_edges_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(a.overlaps_vertically(&b));
        assert!(a.overlaps_horizontally(&b));
    }

    #[test]
    fn snap_tie_rounds_forward() {
        assert_eq!(snap(1.25, 0.5), 1.5);
        assert_eq!(snap(1.2, 0.5), 1.0);
        assert_eq!(snap(1.0, 0.5), 1.0);
        assert_eq!(snap(348.75, 0.5), 349.0);
    }

    #[test]
    fn snap_edges_independently() {
        let mut r = Rect::from_edges(1.2, 1.25, 10.3, 20.7);
        assert_eq!(r.snap_to_grid(0.5), 4);
        assert_eq!(r, Rect::from_edges(1.0, 1.5, 10.5, 20.5));
        assert_eq!(r.snap_to_grid(0.5), 0);
    }

    #[test]
    fn frame_from_margins() {
        let page = Size::new(909.0, 783.0).to_rect();
        let frame = page.margins_removed(&Margins::uniform(52.5));
        assert_eq!(frame, Rect::from_edges(52.5, 52.5, 856.5, 730.5));
    }

    #[test]
    fn role_from_placeholder_type() {
        assert_eq!(ElementRole::from_placeholder("photo"), Some(ElementRole::Photo));
        assert_eq!(ElementRole::from_placeholder("text"), Some(ElementRole::Text));
        assert_eq!(ElementRole::from_placeholder("graphic"), None);
    }
}
