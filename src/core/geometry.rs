//! Geometry types and the rendering-surface capability.
//!
//! The [`Surface`] trait is everything the section observer needs from
//! whatever draws the document: element extents, the viewport position, a way
//! to scroll, and scroll-listener registration.  The terminal document pane
//! implements it for real; tests implement it with fixed rectangles.

use super::listener::ListenerId;

/// Vertical extent of a region in viewport coordinates (rows).
///
/// `top` is inclusive, `bottom` exclusive.  Either may be negative when the
/// region has scrolled above the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub top: i64,
    pub bottom: i64,
}

impl Extent {
    pub fn new(top: i64, bottom: i64) -> Self {
        Self { top, bottom }
    }

    /// Whether the horizontal reference line at `line` falls inside.
    pub fn contains(&self, line: i64) -> bool {
        self.top <= line && line < self.bottom
    }
}

/// Snapshot of the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Visible height.
    pub height: i64,
    /// Distance scrolled from the document top.
    pub scroll_top: i64,
    /// Total height of the document flow.
    pub document_height: i64,
}

impl Viewport {
    /// True when the viewport shows the end of the document.
    pub fn at_bottom(&self) -> bool {
        self.height + self.scroll_top >= self.document_height
    }
}

/// Geometry queries and scroll control provided by the rendering layer.
pub trait Surface {
    /// Current extent of the section with `id`, or `None` if it has no
    /// on-screen element right now.
    fn bounding_rect(&self, id: &str) -> Option<Extent>;

    fn viewport(&self) -> Viewport;

    /// Start a smooth scroll toward document position `top`.  Completion is
    /// not observable.
    fn scroll_to(&mut self, top: i64);

    fn add_scroll_listener(&mut self) -> ListenerId;

    /// Returns `false` if `id` was not registered.
    fn remove_scroll_listener(&mut self, id: ListenerId) -> bool;

    fn has_scroll_listener(&self, id: ListenerId) -> bool;
}
