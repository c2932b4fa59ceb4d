//! Outline sidebar: one row per section, indented by heading level.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, StatefulWidget, Widget},
};

use crate::core::document::Document;

use super::theme::Theme;

// ───────────────────────────────────────── state ─────────────

/// Cursor and scroll offset of the outline list.
#[derive(Debug, Default)]
pub struct OutlineState {
    /// Section index under the cursor.
    pub cursor: usize,
    /// First visible row.
    pub offset: usize,
}

impl OutlineState {
    pub fn select_next(&mut self, max: usize) {
        if max > 0 && self.cursor < max - 1 {
            self.cursor += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Keep the cursor inside a viewport of `height` rows.
    pub fn clamp_scroll(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor - height + 1;
        }
    }
}

// ───────────────────────────────────────── widget ────────────

pub struct OutlineWidget<'a> {
    doc: &'a Document,
    active: Option<&'a str>,
    /// Show the cursor highlight (outline has keyboard focus).
    focused: bool,
    block: Option<Block<'a>>,
}

impl<'a> OutlineWidget<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            active: None,
            focused: false,
            block: None,
        }
    }

    pub fn active(mut self, id: Option<&'a str>) -> Self {
        self.active = id;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Section index under a click at (`column`, `row`) for an outline drawn
    /// with a full border in `area`.
    pub fn section_at(area: Rect, state: &OutlineState, column: u16, row: u16, count: usize) -> Option<usize> {
        let inner = Rect {
            x: area.x.saturating_add(1),
            y: area.y.saturating_add(1),
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        };
        let inside = column >= inner.x
            && column < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        if !inside {
            return None;
        }
        let idx = state.offset + usize::from(row - inner.y);
        (idx < count).then_some(idx)
    }
}

impl<'a> StatefulWidget for OutlineWidget<'a> {
    type State = OutlineState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut OutlineState) {
        let inner = match &self.block {
            Some(b) => {
                let inner = b.inner(area);
                b.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let count = self.doc.sections.len();
        state.cursor = state.cursor.min(count.saturating_sub(1));
        state.clamp_scroll(usize::from(inner.height));

        let visible = self
            .doc
            .sections
            .iter()
            .enumerate()
            .skip(state.offset)
            .take(usize::from(inner.height));

        for (row, (i, section)) in visible.enumerate() {
            let is_active = self.active == Some(section.id.as_str());
            let indent = "  ".repeat(usize::from(section.level.saturating_sub(1)));
            let marker = if is_active { "● " } else { "  " };
            let title = if section.title.is_empty() {
                "(untitled)"
            } else {
                section.title.as_str()
            };

            let mut style = if is_active {
                Theme::active_section_style()
            } else {
                Theme::outline_style()
            };
            if self.focused && i == state.cursor {
                style = style.patch(Theme::selected_style());
            }

            let line = Line::from(vec![
                Span::styled(marker, style),
                Span::styled(format!("{indent}{title}"), style),
            ]);
            let y = inner.y + row as u16;
            if self.focused && i == state.cursor {
                buf.set_style(Rect { y, height: 1, ..inner }, style);
            }
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}
