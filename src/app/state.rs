//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::path::PathBuf;

use ratatui::layout::Rect;

use crate::config::{AppConfig, ConfigStore};
use crate::core::{document::Document, observer::SectionObserver};
use crate::ui::{document_view::DocumentSurface, layout::AppLayout, outline::OutlineState};

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Document,
    SettingsMenu,
    ControlsSubmenu,
}

impl ActiveView {
    /// Name shown in the status bar.
    pub fn route_name(self) -> &'static str {
        match self {
            ActiveView::Document => "Document",
            ActiveView::SettingsMenu => "Settings",
            ActiveView::ControlsSubmenu => "Settings › Controls",
        }
    }
}

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaneFocus {
    #[default]
    Document,
    Outline,
}

/// Top-level application state.
pub struct AppState {
    pub doc: Document,
    /// Path the document was loaded from (block title).
    pub source: PathBuf,
    /// Wrapped document + scroll position.
    pub surface: DocumentSurface,
    /// Tracks the section under the sticky header.  Active only while the
    /// outline is visible.
    pub observer: SectionObserver,
    pub outline_state: OutlineState,
    /// Screen regions from the most recent frame (for mouse hit-testing).
    pub layout: AppLayout,
    pub focus: PaneFocus,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    pub active_view: ActiveView,
    /// Key bindings and preferences.
    pub config: AppConfig,
    /// Where `config` is persisted.
    pub store: ConfigStore,
    /// Currently highlighted item in the settings menu.
    pub settings_selected: usize,
    /// Currently highlighted item in the controls submenu.
    pub controls_selected: usize,
    /// When `true`, the controls submenu is waiting for the user to press
    /// a key to rebind the action at `controls_selected`.
    pub awaiting_rebind: bool,
}

impl AppState {
    pub fn new(source: PathBuf, doc: Document, config: AppConfig, store: ConfigStore) -> Self {
        let prefs = &config.prefs;
        let header_rows = prefs.header_rows();
        Self {
            surface: DocumentSurface::new(prefs.smooth_scroll(), prefs.scroll_speed()),
            observer: SectionObserver::new(doc.section_ids(), u32::from(header_rows)),
            doc,
            source,
            outline_state: OutlineState::default(),
            layout: AppLayout::default(),
            focus: PaneFocus::default(),
            should_quit: false,
            status_message: None,
            active_view: ActiveView::default(),
            config,
            store,
            settings_selected: 0,
            controls_selected: 0,
            awaiting_rebind: false,
        }
    }

    /// Recompute screen regions for `area` and resize the document surface.
    /// The observer is (re)activated here once the surface has geometry.
    pub fn sync_layout(&mut self, area: Rect) {
        self.layout = AppLayout::from_area(area, &self.config.prefs);
        let inner = self.layout.document_inner();
        self.surface.set_viewport(&self.doc, inner.width, inner.height);
        self.sync_observer();
    }

    /// Activate or deactivate the observer to match outline visibility.
    pub fn sync_observer(&mut self) {
        let want = self.config.prefs.outline_visible() && !self.surface.layout().is_empty();
        if want && !self.observer.is_active() {
            self.observer.activate(&mut self.surface);
            self.follow_active();
        } else if !want && self.observer.is_active() {
            self.observer.deactivate(&mut self.surface);
            if self.focus == PaneFocus::Outline {
                self.focus = PaneFocus::Document;
            }
        }
    }

    /// Deliver at most one pending scroll notification to the observer.
    pub fn dispatch_scroll(&mut self) {
        if self.surface.take_scroll_event() && self.observer.on_scroll(&self.surface) {
            self.follow_active();
        }
    }

    /// Sticky header height.  The observer's offset is the source of truth
    /// because `--offset` may override the stored preference.
    pub fn header_rows(&self) -> u16 {
        u16::try_from(self.observer.offset()).unwrap_or(u16::MAX)
    }

    /// Move the sticky header edge, and with it the reference line.
    pub fn apply_header_rows(&mut self, rows: u16) {
        if self.observer.set_offset(u32::from(rows), &self.surface) {
            self.follow_active();
        }
    }

    pub fn apply_scroll_prefs(&mut self) {
        let prefs = &self.config.prefs;
        self.surface.set_smooth(prefs.smooth_scroll(), prefs.scroll_speed());
    }

    /// Scroll to section `id` and report it in the status bar.
    pub fn jump_to(&mut self, id: &str) {
        if self.observer.scroll_to_section(id, &mut self.surface) {
            if let Some(section) = self.doc.section(id) {
                self.status_message = Some(format!("→ {}", section.title));
            }
        }
    }

    /// Title of the active section.
    pub fn active_title(&self) -> Option<&str> {
        self.observer
            .active()
            .and_then(|id| self.doc.section(id))
            .map(|s| s.title.as_str())
    }

    /// Persist the config, reporting failures in the status bar.
    pub fn save_config(&mut self) {
        if let Err(e) = self.config.save(&self.store) {
            tracing::warn!(path = %self.store.path().display(), "failed to save config: {e:#}");
            self.status_message = Some(format!("Could not save settings: {e}"));
        }
    }

    /// Release the observer's listener before the state goes away.
    pub fn shutdown(&mut self) {
        self.observer.deactivate(&mut self.surface);
    }

    /// Move the outline cursor onto the active section while the user is
    /// not driving the outline.
    fn follow_active(&mut self) {
        if self.focus == PaneFocus::Outline {
            return;
        }
        if let Some(idx) = self
            .observer
            .active()
            .and_then(|id| self.doc.sections.iter().position(|s| s.id == id))
        {
            self.outline_state.cursor = idx;
        }
    }
}
