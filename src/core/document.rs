//! Document model: a Markdown file split into uniquely-identified sections.
//!
//! Block structure comes from `pulldown-cmark`, so ATX and setext headings
//! both start sections and nothing inside a code block ever does.  Bodies
//! keep the original source lines for display.

use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use thiserror::Error;

/// Errors raised while reading a document from disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: String },
}

/// Id given to text that appears before the first heading.
pub const PREAMBLE_ID: &str = "preamble";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Text,
    /// Part of a fenced or indented code block, fences included.
    Code,
}

/// One source line of a section body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLine {
    pub kind: LineKind,
    pub text: String,
}

impl BodyLine {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One section: a heading plus the body lines up to the next heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocSection {
    /// Unique slug derived from the title.
    pub id: String,
    pub title: String,
    /// Heading level 1-6; 0 for the preamble.
    pub level: u8,
    pub body: Vec<BodyLine>,
}

/// A parsed document.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub sections: Vec<DocSection>,
}

/// A heading found by the Markdown parser, located by source line.
struct Heading {
    level: u8,
    title: String,
    lines: Range<usize>,
}

/// Source text split into lines, with byte offsets for mapping parser
/// ranges back to lines.
struct SourceLines<'a> {
    lines: Vec<&'a str>,
    starts: Vec<usize>,
}

impl<'a> SourceLines<'a> {
    fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut starts = Vec::new();
        let mut at = 0;
        for raw in text.split_inclusive('\n') {
            starts.push(at);
            at += raw.len();
            lines.push(raw.trim_end_matches('\n').trim_end_matches('\r'));
        }
        Self { lines, starts }
    }

    /// Line containing byte `offset`.
    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset).saturating_sub(1)
    }

    /// Lines touched by the byte range.
    fn span(&self, bytes: Range<usize>) -> Range<usize> {
        let first = self.line_of(bytes.start);
        let last = self.line_of(bytes.end.saturating_sub(1).max(bytes.start));
        first..last + 1
    }
}

impl Document {
    /// Read and parse `path`.  The file stem is the fallback title.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let display = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
            path: display.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| DocumentError::NotUtf8 { path: display })?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::parse(&stem, &text))
    }

    /// Split `text` into sections.
    pub fn parse(title_hint: &str, text: &str) -> Self {
        let source = SourceLines::new(text);
        let mut headings: Vec<Heading> = Vec::new();
        let mut code = vec![false; source.lines.len()];
        let mut open: Option<(u8, String)> = None;

        for (event, range) in Parser::new_ext(text, Options::empty()).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => open = Some((level as u8, String::new())),
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, title)) = open.take() {
                        headings.push(Heading {
                            level,
                            title: title.trim().to_string(),
                            lines: source.span(range),
                        });
                    }
                }
                Event::Text(t) | Event::Code(t) => {
                    if let Some((_, title)) = open.as_mut() {
                        title.push_str(&t);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some((_, title)) = open.as_mut() {
                        title.push(' ');
                    }
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    for line in source.span(range) {
                        if let Some(flag) = code.get_mut(line) {
                            *flag = true;
                        }
                    }
                }
                _ => {}
            }
        }

        let body = |lines: Range<usize>| -> Vec<BodyLine> {
            let mut out: Vec<BodyLine> = lines
                .filter_map(|i| {
                    source.lines.get(i).map(|text| BodyLine {
                        kind: if code[i] { LineKind::Code } else { LineKind::Text },
                        text: (*text).to_string(),
                    })
                })
                .collect();
            while out.last().is_some_and(BodyLine::is_blank) {
                out.pop();
            }
            out
        };

        let mut used = HashSet::new();
        let mut sections: Vec<DocSection> = headings
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let end = headings
                    .get(i + 1)
                    .map_or(source.lines.len(), |next| next.lines.start);
                DocSection {
                    id: unique_slug(&h.title, &mut used),
                    title: h.title.clone(),
                    level: h.level,
                    body: body(h.lines.end..end),
                }
            })
            .collect();

        let title = sections
            .iter()
            .find(|s| s.level == 1)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| title_hint.to_string());

        let preamble = body(0..headings.first().map_or(source.lines.len(), |h| h.lines.start));
        if preamble.iter().any(|l| !l.is_blank()) || sections.is_empty() {
            // Reserve the id so a heading literally named "Preamble" stays distinct.
            let id = if used.contains(PREAMBLE_ID) {
                unique_slug(PREAMBLE_ID, &mut used)
            } else {
                PREAMBLE_ID.to_string()
            };
            sections.insert(
                0,
                DocSection {
                    id,
                    title: title.clone(),
                    level: 0,
                    body: preamble,
                },
            );
        }

        Self { title, sections }
    }

    pub fn section(&self, id: &str) -> Option<&DocSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Section ids in document order.
    pub fn section_ids(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.id.clone()).collect()
    }
}

/// GitHub-style anchor slug.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if c == ' ' || c == '-' || c == '_' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

fn unique_slug(title: &str, used: &mut HashSet<String>) -> String {
    let base = slugify(title);
    let mut candidate = base.clone();
    let mut n = 1;
    while used.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRIEF: &str = "\
Filed under seal.

# Motion to Compel
Intro paragraph.

## Background
Facts.

## Argument
### Standard of Review
Text.
## Argument
Again.
";

    fn ids(doc: &Document) -> Vec<&str> {
        doc.sections.iter().map(|s| s.id.as_str()).collect()
    }

    fn texts(section: &DocSection) -> Vec<&str> {
        section.body.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn splits_on_headings() {
        let doc = Document::parse("brief", BRIEF);
        assert_eq!(doc.title, "Motion to Compel");
        assert_eq!(
            ids(&doc),
            [
                "preamble",
                "motion-to-compel",
                "background",
                "argument",
                "standard-of-review",
                "argument-1"
            ]
        );
        assert_eq!(texts(&doc.sections[0]), ["Filed under seal."]);
        assert_eq!(doc.sections[2].level, 2);
        assert_eq!(texts(&doc.sections[2]), ["Facts."]);
    }

    #[test]
    fn fenced_hashes_are_body_text() {
        let doc = Document::parse("x", "# Top\n```sh\n# not a heading\n```\nafter\n");
        assert_eq!(doc.sections.len(), 1);
        let body = &doc.sections[0].body;
        assert_eq!(body.len(), 4);
        assert_eq!(body[1].text, "# not a heading");
        let kinds: Vec<_> = body.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, [LineKind::Code, LineKind::Code, LineKind::Code, LineKind::Text]);
    }

    #[test]
    fn tilde_fence_is_not_closed_by_backticks() {
        let doc = Document::parse("x", "# A\n~~~\n```\n# still code\n~~~\n# B\n");
        assert_eq!(ids(&doc), ["a", "b"]);
    }

    #[test]
    fn shorter_fence_does_not_close_a_longer_one() {
        let doc = Document::parse("x", "# A\n````\n```\n# not a heading\n````\n# B\n");
        assert_eq!(ids(&doc), ["a", "b"]);
        assert!(doc.sections[0].body.iter().all(|l| l.kind == LineKind::Code));
    }

    #[test]
    fn indented_and_setext_headings_start_sections() {
        let doc = Document::parse("x", "# A\n   ## Indented\nbody\n");
        assert_eq!(ids(&doc), ["a", "indented"]);
        assert_eq!(texts(&doc.sections[1]), ["body"]);

        let doc = Document::parse("x", "Argument\n========\nThe court erred.\n\nRelief\n------\n");
        assert_eq!(ids(&doc), ["argument", "relief"]);
        assert_eq!(doc.title, "Argument");
        assert_eq!(doc.sections[1].level, 2);
        assert_eq!(texts(&doc.sections[0]), ["The court erred."]);
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        let doc = Document::parse("notes", "#hashtag\n####### seven\n");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].id, PREAMBLE_ID);
        assert_eq!(doc.title, "notes");
    }

    #[test]
    fn empty_document_has_one_section() {
        let doc = Document::parse("empty", "");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "empty");
        assert!(doc.sections[0].body.is_empty());
    }

    #[test]
    fn preamble_heading_name_collision() {
        let doc = Document::parse("x", "lead-in\n# Preamble\n");
        assert_eq!(ids(&doc), ["preamble-1", "preamble"]);
    }

    #[test]
    fn slug_rules() {
        assert_eq!(slugify("Rule 12(b)(6) Motion"), "rule-12b6-motion");
        assert_eq!(slugify("  Spaced -- out  "), "spaced-out");
        assert_eq!(slugify("§§"), "section");
        assert_eq!(slugify("Closing ##"), "closing");
    }

    #[test]
    fn heading_titles_drop_markup() {
        let doc = Document::parse("x", "## Facts ##\n# The `serve` *rule*\n#\n");
        let titles: Vec<_> = doc.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Facts", "The serve rule", ""]);
        assert_eq!(ids(&doc), ["facts", "the-serve-rule", "section"]);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Document::load(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }
}
