//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme: change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── document pane ──────────────────────────────────────────
    pub fn heading_style(level: u8) -> Style {
        match level {
            0 | 1 => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            2 => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn body_style() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn code_style() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn header_style() -> Style {
        Style::default().bg(Color::Black)
    }

    pub fn breadcrumb_style() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::ITALIC)
    }

    // ── outline ────────────────────────────────────────────────
    pub fn outline_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn active_section_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn focused_border_style() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }
}
