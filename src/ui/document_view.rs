//! Document pane: wrapped layout, the scrollable [`Surface`], and the widget
//! that draws visible rows beneath a sticky header.

use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Clear, Widget},
};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::{
    document::{Document, LineKind},
    geometry::{Extent, Surface, Viewport},
    listener::{ListenerId, ListenerSet},
};

use super::smooth_scroll::ScrollAnimator;
use super::theme::Theme;

// ───────────────────────────────────────── layout ────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Heading(u8),
    Body,
    Code,
    Blank,
}

/// One terminal row of the wrapped document.
#[derive(Debug, Clone)]
pub struct LayoutRow {
    /// Index into [`Document::sections`].
    pub section: usize,
    pub kind: RowKind,
    pub text: String,
}

/// The document wrapped to a fixed width.
///
/// Every section owns a contiguous span of rows: heading, body, and one
/// trailing blank row.
#[derive(Debug, Default)]
pub struct DocumentLayout {
    width: u16,
    rows: Vec<LayoutRow>,
    spans: Vec<(usize, usize)>,
    index: HashMap<String, usize>,
}

impl DocumentLayout {
    /// Wrap `doc` to `width` columns.  A zero width yields an empty layout in
    /// which no section has geometry.
    pub fn build(doc: &Document, width: u16) -> Self {
        let mut layout = Self {
            width,
            ..Self::default()
        };
        if width == 0 {
            return layout;
        }
        let w = usize::from(width);

        for (i, section) in doc.sections.iter().enumerate() {
            let start = layout.rows.len();
            for text in wrap(&section.title, w) {
                layout.push(i, RowKind::Heading(section.level), text);
            }

            for line in &section.body {
                if line.kind == LineKind::Code {
                    for text in hard_wrap(&line.text, w) {
                        layout.push(i, RowKind::Code, text);
                    }
                } else if line.is_blank() {
                    layout.push(i, RowKind::Blank, String::new());
                } else {
                    for text in wrap(&line.text, w) {
                        layout.push(i, RowKind::Body, text);
                    }
                }
            }
            layout.push(i, RowKind::Blank, String::new());

            layout.spans.push((start, layout.rows.len()));
            layout.index.insert(section.id.clone(), i);
        }
        layout
    }

    fn push(&mut self, section: usize, kind: RowKind, text: String) {
        self.rows.push(LayoutRow {
            section,
            kind,
            text,
        });
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn rows(&self) -> &[LayoutRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row span `[start, end)` of section `id` in document coordinates.
    pub fn span(&self, id: &str) -> Option<(usize, usize)> {
        self.index.get(id).and_then(|&i| self.spans.get(i).copied())
    }

    pub fn span_at(&self, section: usize) -> Option<(usize, usize)> {
        self.spans.get(section).copied()
    }

    /// Index of the section owning `row`.  Rows past the end belong to the
    /// last section.
    pub fn section_at_row(&self, row: i64) -> Option<usize> {
        let last = self.rows.len().checked_sub(1)?;
        let row = usize::try_from(row.max(0)).map_or(last, |r| r.min(last));
        Some(self.rows[row].section)
    }
}

/// Word-wrap `line` to `width` display columns.  Words longer than a line
/// are split.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_w = 0;

    for word in line.split_whitespace() {
        let ww = word.width();
        if !cur.is_empty() && cur_w + 1 + ww > width {
            out.push(std::mem::take(&mut cur));
            cur_w = 0;
        }
        if ww > width {
            for chunk in hard_wrap(word, width) {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
                cur_w = chunk.width();
                cur = chunk;
            }
            continue;
        }
        if !cur.is_empty() {
            cur.push(' ');
            cur_w += 1;
        }
        cur.push_str(word);
        cur_w += ww;
    }
    if !cur.is_empty() || out.is_empty() {
        out.push(cur);
    }
    out
}

/// Split at `width` display columns, keeping whitespace (code blocks).  A
/// double-width character never straddles two rows.
fn hard_wrap(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_w = 0;
    for c in line.chars() {
        let cw = c.width().unwrap_or(0);
        if !cur.is_empty() && cur_w + cw > width {
            out.push(std::mem::take(&mut cur));
            cur_w = 0;
        }
        cur.push(c);
        cur_w += cw;
    }
    if !cur.is_empty() || out.is_empty() {
        out.push(cur);
    }
    out
}

// ───────────────────────────────────────── surface ───────────

/// The scrollable document pane seen through the [`Surface`] trait.
pub struct DocumentSurface {
    layout: DocumentLayout,
    height: u16,
    anim: ScrollAnimator,
    smooth: bool,
    listeners: ListenerSet,
    /// Position last reported to listeners.
    reported: i64,
    /// A scroll notification is waiting to be delivered.
    pending: bool,
}

impl DocumentSurface {
    pub fn new(smooth: bool, speed: f64) -> Self {
        Self {
            layout: DocumentLayout::default(),
            height: 0,
            anim: ScrollAnimator::new(speed),
            smooth,
            listeners: ListenerSet::default(),
            reported: 0,
            pending: false,
        }
    }

    pub fn set_smooth(&mut self, smooth: bool, speed: f64) {
        self.smooth = smooth;
        self.anim.set_speed(speed);
    }

    /// Resize the pane.  Re-wraps when the width changed and keeps the top
    /// row anchored inside the same section.
    pub fn set_viewport(&mut self, doc: &Document, width: u16, height: u16) {
        let relayout = width != self.layout.width();
        if !relayout && height == self.height {
            return;
        }

        if relayout {
            let pos = self.position();
            let anchor = self
                .layout
                .rows()
                .get(pos as usize)
                .map(|row| (row.section, pos as usize - self.layout.span_at(row.section).map_or(0, |s| s.0)));
            self.layout = DocumentLayout::build(doc, width);
            let new_pos = anchor
                .and_then(|(section, within)| {
                    self.layout
                        .span_at(section)
                        .map(|(start, end)| start + within.min(end.saturating_sub(start + 1)))
                })
                .unwrap_or(0);
            self.height = height;
            self.anim.jump(self.clamp(new_pos as i64));
        } else {
            self.height = height;
            self.anim.jump(self.clamp(self.position()));
        }
        // Geometry moved even if the scroll position did not.
        self.raise();
        self.reported = self.position();
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Visible scroll position.
    pub fn position(&self) -> i64 {
        self.anim.position()
    }

    pub fn max_scroll(&self) -> i64 {
        (self.layout.len() as i64 - i64::from(self.height)).max(0)
    }

    /// Scroll by `delta` rows without animation.
    pub fn scroll_by(&mut self, delta: i64) {
        let to = self.clamp(self.position() + delta);
        self.anim.jump(to);
        self.note_position();
    }

    pub fn scroll_home(&mut self) {
        self.anim.jump(0);
        self.note_position();
    }

    pub fn scroll_end(&mut self) {
        self.anim.jump(self.max_scroll());
        self.note_position();
    }

    /// Advance an in-flight animation by one frame.
    pub fn tick(&mut self) {
        if self.anim.is_animating() {
            self.anim.tick();
            self.note_position();
        }
    }

    pub fn is_animating(&self) -> bool {
        self.anim.is_animating()
    }

    /// Where the view will come to rest once the animation settles.
    pub fn target(&self) -> i64 {
        self.anim.target()
    }

    /// A scroll notification has been raised but not yet delivered.
    pub fn scroll_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending scroll notification, if any.
    pub fn take_scroll_event(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Rows currently inside the viewport.
    pub fn visible_rows(&self) -> &[LayoutRow] {
        let rows = self.layout.rows();
        let start = (self.position().max(0) as usize).min(rows.len());
        let end = (start + usize::from(self.height)).min(rows.len());
        &rows[start..end]
    }

    fn clamp(&self, top: i64) -> i64 {
        top.clamp(0, self.max_scroll())
    }

    fn note_position(&mut self) {
        let pos = self.position();
        if pos != self.reported {
            self.reported = pos;
            self.raise();
        }
    }

    fn raise(&mut self) {
        if !self.listeners.is_empty() {
            self.pending = true;
        }
    }
}

impl Surface for DocumentSurface {
    fn bounding_rect(&self, id: &str) -> Option<Extent> {
        let (start, end) = self.layout.span(id)?;
        let pos = self.position();
        Some(Extent::new(start as i64 - pos, end as i64 - pos))
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            height: i64::from(self.height),
            scroll_top: self.position(),
            document_height: self.layout.len() as i64,
        }
    }

    fn scroll_to(&mut self, top: i64) {
        let to = self.clamp(top);
        if self.smooth {
            self.anim.set_target(to);
        } else {
            self.anim.jump(to);
        }
        self.note_position();
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

// ───────────────────────────────────────── widget ────────────

/// Draws the visible rows and the sticky header.
pub struct DocumentView<'a> {
    surface: &'a DocumentSurface,
    title: &'a str,
    /// Title of the active section, shown under the document title.
    breadcrumb: Option<&'a str>,
    header_rows: u16,
    block: Option<Block<'a>>,
}

impl<'a> DocumentView<'a> {
    pub fn new(surface: &'a DocumentSurface, title: &'a str) -> Self {
        Self {
            surface,
            title,
            breadcrumb: None,
            header_rows: 1,
            block: None,
        }
    }

    pub fn breadcrumb(mut self, section: Option<&'a str>) -> Self {
        self.breadcrumb = section;
        self
    }

    pub fn header_rows(mut self, rows: u16) -> Self {
        self.header_rows = rows;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let rows = self.header_rows.min(area.height);
        if rows == 0 {
            return;
        }
        let header = Rect { height: rows, ..area };
        Clear.render(header, buf);
        buf.set_style(header, Theme::header_style());

        let crumb = self.breadcrumb.filter(|c| !c.is_empty() && *c != self.title);
        let mut lines: Vec<Line> = Vec::new();
        if rows == 1 {
            let mut spans = vec![Span::styled(self.title, Theme::title_style())];
            if let Some(c) = crumb {
                spans.push(Span::styled(format!(" › {c}"), Theme::breadcrumb_style()));
            }
            lines.push(Line::from(spans));
        } else {
            lines.push(Line::from(Span::styled(self.title, Theme::title_style())));
            lines.push(Line::from(Span::styled(
                crumb.map(|c| format!("› {c}")).unwrap_or_default(),
                Theme::breadcrumb_style(),
            )));
            if rows >= 3 {
                lines.push(Line::from(Span::styled(
                    "─".repeat(usize::from(area.width)),
                    Theme::border_style(),
                )));
            }
        }

        for (i, line) in lines.iter().take(usize::from(rows)).enumerate() {
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}

impl<'a> Widget for DocumentView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
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

        for (i, row) in self.surface.visible_rows().iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.y + inner.height {
                break;
            }
            let style = match row.kind {
                RowKind::Heading(level) => Theme::heading_style(level),
                RowKind::Code => Theme::code_style(),
                RowKind::Body | RowKind::Blank => Theme::body_style(),
            };
            buf.set_stringn(inner.x, y, &row.text, usize::from(inner.width), style);
        }

        self.render_header(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observer::SectionObserver;

    fn doc() -> Document {
        let mut text = String::from("# Brief\nshort intro\n");
        for name in ["Facts", "Argument", "Relief"] {
            text.push_str(&format!("## {name}\n"));
            for n in 0..8 {
                text.push_str(&format!("paragraph {n} of {name}\n"));
            }
        }
        Document::parse("brief", &text)
    }

    #[test]
    fn wrap_breaks_on_words_and_splits_long_ones() {
        assert_eq!(wrap("the quick brown fox", 9), ["the quick", "brown fox"]);
        assert_eq!(wrap("abcdefghij xy", 4), ["abcd", "efgh", "ij", "xy"]);
        assert_eq!(wrap("", 10), [""]);
    }

    #[test]
    fn wrap_measures_display_columns() {
        assert_eq!(wrap("契約書契約書 第一条", 6), ["契約書", "契約書", "第一条"]);
        assert_eq!(hard_wrap("ab契約", 3), ["ab", "契", "約"]);
    }

    #[test]
    fn wide_text_is_not_cut_off() {
        let d = Document::parse("x", "# 契約\n契約書契約書 第一条\n");
        let mut surface = DocumentSurface::new(false, 0.5);
        surface.set_viewport(&d, 6, 4);
        assert_eq!(surface.layout().span("契約"), Some((0, 5)));

        let area = Rect::new(0, 0, 6, 4);
        let mut buf = Buffer::empty(area);
        DocumentView::new(&surface, &d.title)
            .header_rows(0)
            .render(area, &mut buf);
        let row: Vec<&str> = (0u16..6).step_by(2).map(|x| buf[(x, 2u16)].symbol()).collect();
        assert_eq!(row, ["契", "約", "書"]);
    }

    #[test]
    fn sections_own_contiguous_spans() {
        let layout = DocumentLayout::build(&doc(), 40);
        // heading + 1 body + blank
        assert_eq!(layout.span("brief"), Some((0, 3)));
        // heading + 8 body + blank
        assert_eq!(layout.span("facts"), Some((3, 13)));
        assert_eq!(layout.span("relief"), Some((23, 33)));
        assert_eq!(layout.len(), 33);
    }

    #[test]
    fn rows_map_back_to_sections() {
        let layout = DocumentLayout::build(&doc(), 40);
        assert_eq!(layout.section_at_row(0), Some(0));
        assert_eq!(layout.section_at_row(3), Some(1));
        assert_eq!(layout.section_at_row(500), Some(3));
        assert_eq!(DocumentLayout::default().section_at_row(0), None);
    }

    #[test]
    fn zero_width_has_no_geometry() {
        let mut surface = DocumentSurface::new(false, 0.5);
        surface.set_viewport(&doc(), 0, 10);
        assert_eq!(surface.bounding_rect("facts"), None);
    }

    #[test]
    fn code_rows_keep_indentation() {
        let d = Document::parse("x", "# Code\n```\n    indented\n```\n");
        let layout = DocumentLayout::build(&d, 40);
        let code: Vec<_> = layout
            .rows()
            .iter()
            .filter(|r| r.kind == RowKind::Code)
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(code, ["```", "    indented", "```"]);
    }

    #[test]
    fn scroll_to_clamps_to_document_end() {
        let d = doc();
        let mut surface = DocumentSurface::new(false, 0.5);
        surface.set_viewport(&d, 40, 10);
        surface.scroll_to(1_000);
        assert_eq!(surface.position(), 23);
        assert!(surface.viewport().at_bottom());
        surface.scroll_to(-5);
        assert_eq!(surface.position(), 0);
    }

    #[test]
    fn notifications_need_a_listener() {
        let d = doc();
        let mut surface = DocumentSurface::new(false, 0.5);
        surface.set_viewport(&d, 40, 10);
        surface.scroll_by(3);
        assert!(!surface.take_scroll_event());

        let id = surface.add_scroll_listener();
        surface.scroll_by(3);
        assert!(surface.take_scroll_event());
        assert!(!surface.take_scroll_event());
        surface.remove_scroll_listener(id);
    }

    #[test]
    fn smooth_jump_settles_on_target_section() {
        let d = doc();
        let mut surface = DocumentSurface::new(true, 0.5);
        surface.set_viewport(&d, 40, 12);
        let mut obs = SectionObserver::new(d.section_ids(), 2);
        obs.activate(&mut surface);
        assert_eq!(obs.active(), Some("brief"));

        assert!(obs.scroll_to_section("argument", &mut surface));
        assert!(surface.is_animating());
        for _ in 0..40 {
            surface.tick();
            if surface.take_scroll_event() {
                obs.on_scroll(&surface);
            }
        }
        assert!(!surface.is_animating());
        // Argument starts at row 13; the reference line is 2 rows down.
        assert_eq!(surface.position(), 11);
        assert_eq!(obs.active(), Some("argument"));
        obs.deactivate(&mut surface);
    }

    #[test]
    fn resize_keeps_top_row_in_same_section() {
        let d = doc();
        let mut surface = DocumentSurface::new(false, 0.5);
        surface.set_viewport(&d, 40, 5);
        surface.scroll_to(15);
        let section = surface.visible_rows()[0].section;
        surface.set_viewport(&d, 12, 5);
        assert_eq!(surface.visible_rows()[0].section, section);
    }
}
