//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes the *core* data structures and turns them into cells on
//! the terminal.  No file I/O happens here.

pub mod document_view;
pub mod layout;
pub mod outline;
pub mod popup;
pub mod smooth_scroll;
pub mod theme;

use ratatui::{
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::state::{ActiveView, AppState, PaneFocus};

use self::document_view::DocumentView;
use self::outline::OutlineWidget;
use self::theme::Theme;

fn pane_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(Theme::title_style())
        .borders(Borders::ALL)
        .border_style(if focused {
            Theme::focused_border_style()
        } else {
            Theme::border_style()
        })
}

/// Draw one frame.  Expects `state.layout` to be current.
pub fn draw(frame: &mut Frame, state: &mut AppState) {
    let layout = state.layout;

    if let Some(area) = layout.outline_area {
        let outline = OutlineWidget::new(&state.doc)
            .active(state.observer.active())
            .focused(state.focus == PaneFocus::Outline)
            .block(pane_block(" Outline ".into(), state.focus == PaneFocus::Outline));
        frame.render_stateful_widget(outline, area, &mut state.outline_state);
    }

    let name = state
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let breadcrumb = if state.observer.is_active() {
        state.active_title()
    } else {
        None
    };
    let document = DocumentView::new(&state.surface, &state.doc.title)
        .breadcrumb(breadcrumb)
        .header_rows(state.header_rows())
        .block(pane_block(format!(" {name} "), state.focus == PaneFocus::Document));
    frame.render_widget(document, layout.document_area);

    frame.render_widget(
        Paragraph::new(status_line(state)).style(Theme::status_bar_style()),
        layout.status_area,
    );

    match state.active_view {
        ActiveView::SettingsMenu => frame.render_widget(
            popup::SettingsPopup {
                state: &*state,
                selected: state.settings_selected,
            },
            frame.area(),
        ),
        ActiveView::ControlsSubmenu => frame.render_widget(
            popup::ControlsPopup {
                config: &state.config,
                selected: state.controls_selected,
                awaiting_rebind: state.awaiting_rebind,
            },
            frame.area(),
        ),
        ActiveView::Document => {}
    }
}

fn status_line(state: &AppState) -> String {
    let max = state.surface.max_scroll();
    let position = if max == 0 {
        "All".to_string()
    } else {
        format!("{}%", state.surface.position() * 100 / max)
    };
    let hint = match state.active_view {
        ActiveView::Document => state
            .status_message
            .clone()
            .unwrap_or_else(|| state.config.status_bar_hint()),
        ActiveView::SettingsMenu | ActiveView::ControlsSubmenu => String::new(),
    };
    format!(" {} │ {position} │ {hint}", state.active_view.route_name())
}
