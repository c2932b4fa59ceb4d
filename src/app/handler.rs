//! Input handling: maps key/mouse events to state mutations.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::config::{Action, KeyBind};
use crate::ui::outline::OutlineWidget;

use super::settings::{SettingsItem, SETTINGS_ITEMS};
use super::state::{ActiveView, AppState, PaneFocus};

/// Total selectable rows in the controls submenu (actions + "Reset").
pub fn controls_item_count() -> usize {
    Action::ALL.len() + 1
}

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.active_view {
        ActiveView::Document => handle_document_key(state, key),
        ActiveView::SettingsMenu => handle_settings_key(state, key),
        ActiveView::ControlsSubmenu => {
            if state.awaiting_rebind {
                handle_rebind_key(state, key);
            } else {
                handle_controls_key(state, key);
            }
        }
    }
}

// ── Document view (configurable bindings) ───────────────────────

fn handle_document_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Tab if state.config.prefs.outline_visible() => {
            state.focus = match state.focus {
                PaneFocus::Document => PaneFocus::Outline,
                PaneFocus::Outline => PaneFocus::Document,
            };
            return;
        }
        KeyCode::Esc if state.focus == PaneFocus::Outline => {
            state.focus = PaneFocus::Document;
            return;
        }
        KeyCode::Home => {
            state.surface.scroll_home();
            return;
        }
        KeyCode::End => {
            state.surface.scroll_end();
            return;
        }
        _ => {}
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };
    state.status_message = None;

    match action {
        Action::Quit => state.should_quit = true,
        Action::OpenSettings => {
            state.active_view = ActiveView::SettingsMenu;
            state.settings_selected = 0;
        }
        Action::ScrollUp => match state.focus {
            PaneFocus::Outline => state.outline_state.select_prev(),
            PaneFocus::Document => state.surface.scroll_by(-1),
        },
        Action::ScrollDown => match state.focus {
            PaneFocus::Outline => state.outline_state.select_next(state.doc.sections.len()),
            PaneFocus::Document => state.surface.scroll_by(1),
        },
        Action::PageUp => state.surface.scroll_by(-page_rows(state)),
        Action::PageDown => state.surface.scroll_by(page_rows(state)),
        Action::PrevSection => step_section(state, -1),
        Action::NextSection => step_section(state, 1),
        Action::JumpToSection => {
            if let Some(id) = state
                .doc
                .sections
                .get(state.outline_state.cursor)
                .map(|s| s.id.clone())
            {
                state.jump_to(&id);
                state.focus = PaneFocus::Document;
            }
        }
        Action::ToggleOutline => {
            let visible = !state.config.prefs.outline_visible();
            state.config.prefs.set_outline_visible(visible);
            state.save_config();
            if !visible {
                state.focus = PaneFocus::Document;
            }
        }
    }
}

/// Rows moved by a page key: the viewport minus the sticky header.
fn page_rows(state: &AppState) -> i64 {
    (i64::from(state.surface.height()) - i64::from(state.header_rows())).max(1)
}

/// Jump `step` sections away from the current one.
///
/// The observer's answer is only used once the view has settled and been
/// reported.  Otherwise (outline hidden, animation in flight, or an earlier
/// jump in the same batch) the current section is the one the scroll target
/// will bring under the reference line.
fn step_section(state: &mut AppState, step: isize) {
    let settled = !state.surface.is_animating() && !state.surface.scroll_pending();
    let target = if settled && state.observer.is_active() {
        state.observer.neighbour(step).map(str::to_owned)
    } else {
        let sections = state.observer.sections();
        let row = state.surface.target() + i64::from(state.observer.offset());
        let idx = state.surface.layout().section_at_row(row).map_or(0, |i| {
            i.saturating_add_signed(step)
                .min(sections.len().saturating_sub(1))
        });
        sections.get(idx).cloned()
    };
    if let Some(id) = target {
        state.jump_to(&id);
    }
}

// ── Settings menu (hardcoded navigation) ────────────────────────

fn handle_settings_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            state.active_view = ActiveView::Document;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.settings_selected = state.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.settings_selected < SETTINGS_ITEMS.len() - 1 {
                state.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
            match SETTINGS_ITEMS.get(state.settings_selected) {
                Some(SettingsItem::Submenu { view, .. }) => {
                    state.active_view = *view;
                    state.controls_selected = 0;
                }
                Some(SettingsItem::Toggle { get, set, .. }) => {
                    let current = get(state);
                    set(state, !current);
                }
                Some(SettingsItem::Cycle { cycle, .. }) => cycle(state),
                None => {}
            }
        }
        _ => {}
    }
}

// ── Controls submenu (interactive rebinding) ────────────────────

fn handle_controls_key(state: &mut AppState, key: KeyEvent) {
    let item_count = controls_item_count();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            state.active_view = ActiveView::Document;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.active_view = ActiveView::SettingsMenu;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.controls_selected = state.controls_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.controls_selected < item_count - 1 {
                state.controls_selected += 1;
            }
        }
        KeyCode::Enter => {
            if state.controls_selected < Action::ALL.len() {
                state.awaiting_rebind = true;
            } else {
                state.config.reset_defaults();
                state.save_config();
            }
        }
        KeyCode::Delete | KeyCode::Backspace => {
            if let Some(&action) = Action::ALL.get(state.controls_selected) {
                state.config.bindings.insert(action, Vec::new());
                state.save_config();
            }
        }
        _ => {}
    }
}

/// Capture the next key press as a new binding.
fn handle_rebind_key(state: &mut AppState, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        state.awaiting_rebind = false;
        return;
    }
    // Ctrl+C stays reserved for quitting.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return;
    }

    if let Some(&action) = Action::ALL.get(state.controls_selected) {
        state.config.add_binding(action, KeyBind::from_key_event(key));
        state.save_config();
    }
    state.awaiting_rebind = false;
}

// ── Mouse ───────────────────────────────────────────────────────

/// Process a mouse event.  Only the document view reacts to the mouse.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    if state.active_view != ActiveView::Document {
        return;
    }
    let wheel = i64::from(state.config.prefs.wheel_rows());
    let over_outline = state
        .layout
        .outline_area
        .is_some_and(|a| point_in_rect(a, mouse.column, mouse.row));

    match mouse.kind {
        MouseEventKind::ScrollDown if over_outline => {
            state.outline_state.select_next(state.doc.sections.len());
        }
        MouseEventKind::ScrollUp if over_outline => state.outline_state.select_prev(),
        MouseEventKind::ScrollDown => state.surface.scroll_by(wheel),
        MouseEventKind::ScrollUp => state.surface.scroll_by(-wheel),
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(area) = state.layout.outline_area else {
                if point_in_rect(state.layout.document_area, mouse.column, mouse.row) {
                    state.focus = PaneFocus::Document;
                }
                return;
            };
            let count = state.doc.sections.len();
            if let Some(idx) =
                OutlineWidget::section_at(area, &state.outline_state, mouse.column, mouse.row, count)
            {
                state.outline_state.cursor = idx;
                let id = state.doc.sections[idx].id.clone();
                state.jump_to(&id);
            } else if point_in_rect(state.layout.document_area, mouse.column, mouse.row) {
                state.focus = PaneFocus::Document;
            }
        }
        _ => {}
    }
}

fn point_in_rect(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}
