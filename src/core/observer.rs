//! Section observer: tracks which section sits under the reference line.
//!
//! The reference line is `offset` rows below the viewport top (normally the
//! bottom edge of a sticky header).  A section is *in view* when
//! `top <= offset < bottom`.  Among in-view sections the first one in input
//! order wins, regardless of geometry.  When nothing is in view the observer
//! falls back to the last section if the viewport is at the document bottom,
//! and otherwise keeps whatever was active before.
//!
//! The observer only recomputes while it holds a registered scroll listener
//! on the surface.  [`SectionObserver::activate`] and
//! [`SectionObserver::deactivate`] are symmetric and idempotent.

use super::geometry::Surface;
use super::listener::ListenerId;

/// Outcome of one selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// A section contains the reference line.
    InView(&'a str),
    /// Nothing contains the line but the viewport is at the bottom.
    Bottom(&'a str),
    /// Leave the previous value alone.
    Keep,
}

impl<'a> Selection<'a> {
    pub fn id(self) -> Option<&'a str> {
        match self {
            Self::InView(id) | Self::Bottom(id) => Some(id),
            Self::Keep => None,
        }
    }
}

/// Pure selection rule over the current surface geometry.
pub fn select_active<'a, S: Surface + ?Sized>(
    sections: &'a [String],
    surface: &S,
    offset: i64,
) -> Selection<'a> {
    let in_view = sections.iter().find(|id| {
        surface
            .bounding_rect(id)
            .is_some_and(|extent| extent.contains(offset))
    });
    if let Some(id) = in_view {
        return Selection::InView(id);
    }

    match sections.last() {
        Some(last) if surface.viewport().at_bottom() => Selection::Bottom(last),
        _ => Selection::Keep,
    }
}

/// Scroll-synchronised active-section tracker.
#[derive(Debug)]
pub struct SectionObserver {
    /// Section ids in document order.
    sections: Vec<String>,
    offset: i64,
    active: Option<String>,
    listener: Option<ListenerId>,
}

impl SectionObserver {
    pub fn new<I, S>(sections: I, offset: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(Into::into).collect(),
            offset: i64::from(offset),
            active: None,
            listener: None,
        }
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn offset(&self) -> u32 {
        self.offset as u32
    }

    /// The currently active section id, if any has ever been selected.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// True between `activate` and `deactivate`.
    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Register a scroll listener and compute the initial active section.
    /// Calling this while already active does nothing.
    pub fn activate<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if self.listener.is_some() {
            return;
        }
        let id = surface.add_scroll_listener();
        self.listener = Some(id);
        tracing::debug!(sections = self.sections.len(), offset = self.offset, "observer activated");
        self.recompute(surface);
    }

    /// Remove the scroll listener.  Later scroll notifications are ignored.
    pub fn deactivate<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(id) = self.listener.take() {
            surface.remove_scroll_listener(id);
            tracing::debug!("observer deactivated");
        }
    }

    /// Handle a scroll notification.  Returns `true` when the active section
    /// changed.
    pub fn on_scroll<S: Surface + ?Sized>(&mut self, surface: &S) -> bool {
        match self.listener {
            Some(id) if surface.has_scroll_listener(id) => self.recompute(surface),
            _ => false,
        }
    }

    /// Move the reference line.  Recomputes immediately while active.
    pub fn set_offset<S: Surface + ?Sized>(&mut self, offset: u32, surface: &S) -> bool {
        self.offset = i64::from(offset);
        self.on_scroll(surface)
    }

    /// Smooth-scroll so section `id` starts at the reference line.
    ///
    /// Unknown ids and sections without geometry are ignored.  Returns
    /// whether a scroll was issued.
    pub fn scroll_to_section<S: Surface + ?Sized>(&self, id: &str, surface: &mut S) -> bool {
        if !self.sections.iter().any(|s| s == id) {
            return false;
        }
        let Some(extent) = surface.bounding_rect(id) else {
            return false;
        };
        let target = extent.top + surface.viewport().scroll_top - self.offset;
        tracing::debug!(section = id, target, "scroll to section");
        surface.scroll_to(target);
        true
    }

    /// Section `step` positions away from the active one, clamped to the
    /// ends.  With nothing active yet this is the first section.
    pub fn neighbour(&self, step: isize) -> Option<&str> {
        let current = self
            .active
            .as_deref()
            .and_then(|a| self.sections.iter().position(|s| s == a));
        let idx = match current {
            Some(i) => i.saturating_add_signed(step).min(self.sections.len().saturating_sub(1)),
            None => 0,
        };
        self.sections.get(idx).map(String::as_str)
    }

    fn recompute<S: Surface + ?Sized>(&mut self, surface: &S) -> bool {
        let Some(next) = select_active(&self.sections, surface, self.offset).id() else {
            return false;
        };
        if self.active.as_deref() == Some(next) {
            return false;
        }
        self.active = Some(next.to_owned());
        true
    }
}

impl Drop for SectionObserver {
    fn drop(&mut self) {
        if self.listener.is_some() {
            tracing::warn!("section observer dropped without deactivate");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::core::geometry::{Extent, Viewport};
    use crate::core::listener::ListenerSet;

    /// Surface with fixed document-space extents and a settable scroll
    /// position.
    #[derive(Default)]
    pub(crate) struct FakeSurface {
        pub extents: HashMap<String, Extent>,
        pub height: i64,
        pub document_height: i64,
        pub scroll_top: i64,
        pub scroll_requests: Vec<i64>,
        pub listeners: ListenerSet,
    }

    impl FakeSurface {
        pub fn new(height: i64, document_height: i64) -> Self {
            Self {
                height,
                document_height,
                ..Self::default()
            }
        }

        pub fn section(mut self, id: &str, top: i64, bottom: i64) -> Self {
            self.extents.insert(id.to_string(), Extent::new(top, bottom));
            self
        }
    }

    impl Surface for FakeSurface {
        fn bounding_rect(&self, id: &str) -> Option<Extent> {
            self.extents
                .get(id)
                .map(|e| Extent::new(e.top - self.scroll_top, e.bottom - self.scroll_top))
        }

        fn viewport(&self) -> Viewport {
            Viewport {
                height: self.height,
                scroll_top: self.scroll_top,
                document_height: self.document_height,
            }
        }

        fn scroll_to(&mut self, top: i64) {
            self.scroll_requests.push(top);
        }

        fn add_scroll_listener(&mut self) -> ListenerId {
            self.listeners.add()
        }

        fn remove_scroll_listener(&mut self, id: ListenerId) -> bool {
            self.listeners.remove(id)
        }

        fn has_scroll_listener(&self, id: ListenerId) -> bool {
            self.listeners.contains(id)
        }
    }

    fn abc() -> FakeSurface {
        FakeSurface::new(200, 600)
            .section("a", 0, 100)
            .section("b", 100, 300)
            .section("c", 300, 600)
    }

    fn observer() -> SectionObserver {
        SectionObserver::new(["a", "b", "c"], 50)
    }

    #[test]
    fn follows_reference_line_while_scrolling() {
        let mut surface = abc();
        surface.scroll_top = 10;
        let mut obs = observer();
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("a"));

        surface.scroll_top = 60;
        assert!(obs.on_scroll(&surface));
        assert_eq!(obs.active(), Some("b"));
        obs.deactivate(&mut surface);
    }

    #[test]
    fn each_position_selects_the_containing_section() {
        let mut surface = abc();
        let mut obs = observer();
        obs.activate(&mut surface);
        for (scroll, expected) in [(0, "a"), (49, "a"), (50, "b"), (249, "b"), (250, "c"), (400, "c")] {
            surface.scroll_top = scroll;
            obs.on_scroll(&surface);
            assert_eq!(obs.active(), Some(expected), "scroll_top = {scroll}");
        }
        obs.deactivate(&mut surface);
    }

    #[test]
    fn overlap_prefers_input_order() {
        // "late" is listed first but starts further down.
        let mut surface = FakeSurface::new(100, 1000)
            .section("early", 0, 200)
            .section("late", 40, 200);
        let mut obs = SectionObserver::new(["late", "early"], 50);
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("late"));
        obs.deactivate(&mut surface);
    }

    #[test]
    fn bottom_of_document_selects_last_section() {
        // Short final section never reaches the reference line.
        let mut surface = FakeSurface::new(100, 420)
            .section("a", 0, 300)
            .section("b", 300, 400)
            .section("c", 400, 420);
        let mut obs = SectionObserver::new(["a", "b", "c"], 10);
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("a"));

        // Gap region: nothing contains the line, not at bottom.
        surface.extents.insert("b".into(), Extent::new(330, 400));
        surface.scroll_top = 310;
        assert!(!obs.on_scroll(&surface));
        assert_eq!(obs.active(), Some("a"));

        surface.scroll_top = 320;
        surface.extents.insert("b".into(), Extent::new(300, 320));
        assert!(obs.on_scroll(&surface));
        assert_eq!(obs.active(), Some("c"));
        obs.deactivate(&mut surface);
    }

    #[test]
    fn nothing_in_view_keeps_previous_value() {
        let mut surface = FakeSurface::new(100, 1000)
            .section("a", 0, 100)
            .section("b", 500, 600);
        let mut obs = SectionObserver::new(["a", "b"], 0);
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("a"));

        surface.scroll_top = 200;
        assert!(!obs.on_scroll(&surface));
        assert_eq!(obs.active(), Some("a"));
        obs.deactivate(&mut surface);
    }

    #[test]
    fn absent_elements_are_skipped() {
        let mut surface = FakeSurface::new(100, 1000).section("b", 0, 100);
        let mut obs = SectionObserver::new(["a", "b"], 10);
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("b"));
        assert!(!obs.scroll_to_section("a", &mut surface));
        assert!(surface.scroll_requests.is_empty());
        obs.deactivate(&mut surface);
    }

    #[test]
    fn offset_past_document_end_falls_back_to_last() {
        let mut surface = abc();
        surface.height = 600;
        let mut obs = SectionObserver::new(["a", "b", "c"], 5000);
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("c"));
        obs.deactivate(&mut surface);
    }

    #[test]
    fn empty_section_set_stays_unset() {
        let mut surface = FakeSurface::new(100, 0);
        let mut obs = SectionObserver::new(Vec::<String>::new(), 10);
        obs.activate(&mut surface);
        assert_eq!(obs.active(), None);
        assert!(!obs.scroll_to_section("anything", &mut surface));
        assert_eq!(obs.neighbour(1), None);
        obs.deactivate(&mut surface);
    }

    #[test]
    fn scroll_to_unknown_id_is_a_no_op() {
        let mut surface = abc();
        let mut obs = observer();
        obs.activate(&mut surface);
        let before = obs.active().map(str::to_owned);
        assert!(!obs.scroll_to_section("missing", &mut surface));
        assert!(surface.scroll_requests.is_empty());
        assert_eq!(obs.active().map(str::to_owned), before);
        obs.deactivate(&mut surface);
    }

    #[test]
    fn scroll_to_section_targets_reference_line() {
        let mut surface = abc();
        surface.scroll_top = 20;
        let obs = observer();
        assert!(obs.scroll_to_section("c", &mut surface));
        // Document top of c is 300; minus offset 50.
        assert_eq!(surface.scroll_requests, vec![250]);
    }

    #[test]
    fn no_updates_after_deactivate() {
        let mut surface = abc();
        let mut obs = observer();
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("a"));
        obs.deactivate(&mut surface);
        assert!(surface.listeners.is_empty());

        surface.scroll_top = 400;
        assert!(!obs.on_scroll(&surface));
        assert_eq!(obs.active(), Some("a"));
    }

    #[test]
    fn listener_lifecycle_is_symmetric() {
        let mut surface = abc();
        let mut obs = observer();
        obs.activate(&mut surface);
        obs.activate(&mut surface);
        assert_eq!(surface.listeners.len(), 1);
        obs.deactivate(&mut surface);
        obs.deactivate(&mut surface);
        assert_eq!(surface.listeners.len(), 0);

        obs.activate(&mut surface);
        assert_eq!(surface.listeners.len(), 1);
        obs.deactivate(&mut surface);
    }

    #[test]
    fn offset_change_recomputes() {
        let mut surface = abc();
        let mut obs = SectionObserver::new(["a", "b", "c"], 10);
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("a"));
        assert!(obs.set_offset(150, &surface));
        assert_eq!(obs.active(), Some("b"));
        assert_eq!(obs.offset(), 150);
        obs.deactivate(&mut surface);
    }

    #[test]
    fn neighbour_steps_and_clamps() {
        let mut surface = abc();
        let mut obs = observer();
        assert_eq!(obs.neighbour(1), Some("a"));
        obs.activate(&mut surface);
        assert_eq!(obs.neighbour(1), Some("b"));
        assert_eq!(obs.neighbour(-1), Some("a"));
        assert_eq!(obs.neighbour(10), Some("c"));
        obs.deactivate(&mut surface);
    }
}
