//! Layout helpers: split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::config::Preferences;

/// Screen regions: optional outline on the left, document pane, and a bottom
/// status bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppLayout {
    pub outline_area: Option<Rect>,
    pub document_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Compute the layout from the full terminal area.
    pub fn from_area(area: Rect, prefs: &Preferences) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // panes
                Constraint::Length(1), // status bar
            ])
            .split(area);

        if !prefs.outline_visible() {
            return Self {
                outline_area: None,
                document_area: rows[0],
                status_area: rows[1],
            };
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(prefs.outline_width_pct()),
                Constraint::Min(10),
            ])
            .split(rows[0]);

        Self {
            outline_area: Some(cols[0]),
            document_area: cols[1],
            status_area: rows[1],
        }
    }

    /// Document area minus its border; this is the scroll viewport.
    pub fn document_inner(&self) -> Rect {
        let a = self.document_area;
        Rect {
            x: a.x.saturating_add(1),
            y: a.y.saturating_add(1),
            width: a.width.saturating_sub(2),
            height: a.height.saturating_sub(2),
        }
    }
}
