//! `.page` documents: parsing, wrapping layout, and the link handles.

use crate::error::Result;
use crate::page_model::{BoundingBox, Handle, HandleId, LinkSource, NavigableHandle, NavigationContext, Region};
use regex::Regex;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use unicode_width::UnicodeWidthChar;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

fn next_handle_id() -> HandleId {
    HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
}

const TAB_WIDTH: usize = 4;

/// Region a page line belongs to, set by `@nav`, `@main`, ... directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRegion {
    Nav,
    Main,
    Listing,
    Content,
    Hidden,
}

impl PageRegion {
    fn from_directive(directive: &str) -> Option<Self> {
        match directive {
            "nav" => Some(PageRegion::Nav),
            "main" => Some(PageRegion::Main),
            "listing" => Some(PageRegion::Listing),
            "content" => Some(PageRegion::Content),
            "hidden" => Some(PageRegion::Hidden),
            _ => None,
        }
    }

    /// Everything but the navbar lives under the content root.
    pub fn in_content_root(self) -> bool {
        self != PageRegion::Nav
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Text,
    Heading,
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Link(usize),
}

#[derive(Debug, Clone)]
struct PageLine {
    region: PageRegion,
    kind: LineKind,
    segments: Vec<Segment>,
    anchor: Option<String>,
}

/// How a laid out cell is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Text,
    Heading,
    Link(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledCell {
    pub ch: char,
    pub style: CellStyle,
}

/// One inline link on a terminal page.
pub struct TerminalLink {
    id: HandleId,
    pub label: String,
    destination: String,
    context: NavigationContext,
    region: PageRegion,
    /// Document coordinates; `bounding_box` shifts by the scroll offset
    /// the page is settling on, so boxes do not lag a smooth scroll.
    rect: Cell<BoundingBox>,
    highlighted: Cell<bool>,
    attached: Cell<bool>,
    scroll_target: Rc<Cell<i32>>,
    focus: Rc<Cell<Option<HandleId>>>,
}

impl TerminalLink {
    pub fn document_box(&self) -> BoundingBox {
        self.rect.get()
    }

    pub fn is_focused(&self) -> bool {
        self.focus.get() == Some(self.id)
    }
}

impl NavigableHandle for TerminalLink {
    fn id(&self) -> HandleId {
        self.id
    }

    fn destination(&self) -> Option<String> {
        if self.destination.is_empty() {
            None
        } else {
            Some(self.destination.clone())
        }
    }

    fn navigation_context(&self) -> NavigationContext {
        self.context
    }

    fn highlight(&self) {
        self.highlighted.set(true);
    }

    fn unhighlight(&self) {
        self.highlighted.set(false);
    }

    fn is_highlighted(&self) -> bool {
        self.highlighted.get()
    }

    fn focus(&self) {
        if self.attached.get() {
            self.focus.set(Some(self.id));
        }
    }

    fn bounding_box(&self) -> BoundingBox {
        let rect = self.rect.get();
        let dy = self.scroll_target.get();
        BoundingBox {
            top: rect.top - dy,
            bottom: rect.bottom - dy,
            ..rect
        }
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn is_visible(&self) -> bool {
        self.attached.get() && self.region != PageRegion::Hidden && !self.rect.get().is_empty()
    }
}

/// Compiled patterns for page parsing.
pub struct PageParser {
    link_re: Regex,
}

impl PageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            link_re: Regex::new(r"\[([^\]]*)\]\(([^)\s]*)\)(?:\{([^}]*)\})?")?,
        })
    }

    pub fn parse(&self, source: &str) -> TerminalPage {
        let scroll_target = Rc::new(Cell::new(0));
        let focus = Rc::new(Cell::new(None));
        let mut lines = Vec::new();
        let mut links: Vec<Rc<TerminalLink>> = Vec::new();
        let mut routes_payload = None;
        let mut region = PageRegion::Content;
        let mut pending_anchor: Option<String> = None;

        for raw in source.lines() {
            let raw = raw.trim_end();

            if let Some(rest) = raw.strip_prefix('@').filter(|r| !r.starts_with('@')) {
                let (directive, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if let Some(next) = PageRegion::from_directive(directive) {
                    region = next;
                    continue;
                }
                match directive {
                    "routes" => {
                        routes_payload = Some(arg.trim().to_string());
                        continue;
                    }
                    "anchor" => {
                        pending_anchor = Some(arg.trim().to_string());
                        continue;
                    }
                    _ => {} // Unknown directives render as text
                }
            }

            // "@@" escapes a literal leading '@'
            let text = raw.strip_prefix('@').filter(|r| r.starts_with('@')).unwrap_or(raw);
            let (kind, text) = match text.strip_prefix("# ") {
                Some(heading) => (LineKind::Heading, heading),
                None => (LineKind::Text, text),
            };
            let text = text.replace('\t', &" ".repeat(TAB_WIDTH));

            let mut segments = Vec::new();
            let mut last = 0;
            for caps in self.link_re.captures_iter(&text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                if whole.start() > last {
                    segments.push(Segment::Text(text[last..whole.start()].to_string()));
                }
                let label = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let destination = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                let target = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

                links.push(Rc::new(TerminalLink {
                    id: next_handle_id(),
                    label: label.to_string(),
                    destination: destination.to_string(),
                    context: NavigationContext::from_target(target),
                    region,
                    rect: Cell::new(BoundingBox::default()),
                    highlighted: Cell::new(false),
                    attached: Cell::new(true),
                    scroll_target: Rc::clone(&scroll_target),
                    focus: Rc::clone(&focus),
                }));
                segments.push(Segment::Link(links.len() - 1));
                last = whole.end();
            }
            if last < text.len() {
                segments.push(Segment::Text(text[last..].to_string()));
            }

            lines.push(PageLine {
                region,
                kind,
                segments,
                anchor: pending_anchor.take(),
            });
        }

        log::debug!("parsed page: {} lines, {} links", lines.len(), links.len());
        TerminalPage {
            lines,
            links,
            rows: Vec::new(),
            anchors: HashMap::new(),
            routes_payload,
            scroll_y: Cell::new(0),
            scroll_target,
            focus,
        }
    }
}

/// A parsed page plus its current layout.
pub struct TerminalPage {
    lines: Vec<PageLine>,
    links: Vec<Rc<TerminalLink>>,
    rows: Vec<Vec<StyledCell>>,
    anchors: HashMap<String, i32>,
    routes_payload: Option<String>,
    /// Offset currently drawn.
    scroll_y: Cell<i32>,
    /// Offset a smooth scroll is heading for.
    scroll_target: Rc<Cell<i32>>,
    focus: Rc<Cell<Option<HandleId>>>,
}

impl TerminalPage {
    pub fn routes_payload(&self) -> Option<&str> {
        self.routes_payload.as_deref()
    }

    pub fn rows(&self) -> &[Vec<StyledCell>] {
        &self.rows
    }

    pub fn row_count(&self) -> i32 {
        self.rows.len() as i32
    }

    pub fn link(&self, index: usize) -> Option<&Rc<TerminalLink>> {
        self.links.get(index)
    }

    pub fn scroll_y(&self) -> i32 {
        self.scroll_y.get()
    }

    pub fn scroll_target(&self) -> i32 {
        self.scroll_target.get()
    }

    /// Jump: the drawn offset and the target both become `y`.
    pub fn set_scroll_y(&self, y: i32) {
        self.scroll_y.set(y);
        self.scroll_target.set(y);
    }

    /// Start a smooth scroll toward `y`.
    pub fn set_scroll_target(&self, y: i32) {
        self.scroll_target.set(y);
    }

    /// Move the drawn offset a step toward the target. Returns whether it moved.
    pub fn step_scroll(&self) -> bool {
        let current = self.scroll_y.get();
        let distance = self.scroll_target.get() - current;
        if distance == 0 {
            return false;
        }
        let step = (distance.abs() / 3).max(1) * distance.signum();
        self.scroll_y.set(current + step);
        true
    }

    pub fn anchor_row(&self, id: &str) -> Option<i32> {
        self.anchors.get(id).copied()
    }

    pub fn focused(&self) -> Option<HandleId> {
        self.focus.get()
    }

    /// Mark every link detached, as when the page is replaced.
    pub fn detach_all(&self) {
        for link in &self.links {
            link.attached.set(false);
            link.highlighted.set(false);
        }
        self.focus.set(None);
    }

    /// Wrap every rendered line to `width` columns and recompute link boxes.
    pub fn layout(&mut self, width: usize) {
        let width = width.max(1);
        self.rows.clear();
        self.anchors.clear();
        for link in &self.links {
            link.rect.set(BoundingBox::default());
        }

        for line in &self.lines {
            if line.region == PageRegion::Hidden {
                continue;
            }
            if let Some(anchor) = &line.anchor {
                self.anchors.insert(anchor.clone(), self.rows.len() as i32);
            }

            let mut row: Vec<StyledCell> = Vec::new();
            let mut col = 0usize;
            for segment in &line.segments {
                let (text, style) = match segment {
                    Segment::Text(text) => {
                        let style = match line.kind {
                            LineKind::Heading => CellStyle::Heading,
                            LineKind::Text => CellStyle::Text,
                        };
                        (text.as_str(), style)
                    }
                    Segment::Link(idx) => (self.links[*idx].label.as_str(), CellStyle::Link(*idx)),
                };

                let mut start: Option<(usize, usize)> = None;
                let mut end = (0usize, 0usize);
                for ch in text.chars() {
                    let w = ch.width().unwrap_or(0);
                    if w == 0 {
                        continue;
                    }
                    if col + w > width && col > 0 {
                        self.rows.push(std::mem::take(&mut row));
                        col = 0;
                    }
                    let row_idx = self.rows.len();
                    start.get_or_insert((row_idx, col));
                    row.push(StyledCell { ch, style });
                    col += w;
                    end = (row_idx, col);
                }

                if let (Segment::Link(idx), Some((start_row, start_col))) = (segment, start) {
                    let (end_row, end_col) = end;
                    let rect = if start_row == end_row {
                        BoundingBox::new(start_row as i32, start_col as i32, 1, (end_col - start_col) as i32)
                    } else {
                        BoundingBox::new(start_row as i32, 0, (end_row - start_row + 1) as i32, width as i32)
                    };
                    self.links[*idx].rect.set(rect);
                }
            }
            self.rows.push(row);
        }
    }

    /// Link under a document cell, for pointer presses.
    pub fn link_at(&self, row: i32, col: usize) -> Option<Handle> {
        let cells = self.rows.get(usize::try_from(row).ok()?)?;
        let mut x = 0usize;
        for cell in cells {
            let w = cell.ch.width().unwrap_or(0);
            if col < x + w {
                return match cell.style {
                    CellStyle::Link(idx) => self.links.get(idx).map(|l| Rc::clone(l) as Handle),
                    _ => None,
                };
            }
            x += w;
        }
        None
    }

    fn handles_where(&self, keep: impl Fn(PageRegion) -> bool) -> Vec<Handle> {
        self.links
            .iter()
            .filter(|link| keep(link.region))
            .map(|link| Rc::clone(link) as Handle)
            .collect()
    }
}

impl LinkSource for TerminalPage {
    fn links_in(&self, region: Region) -> Vec<Handle> {
        match region {
            Region::PrimaryNav => self.handles_where(|r| r == PageRegion::Nav),
            Region::MainContent => self.handles_where(|r| r == PageRegion::Main),
            Region::ContentRoot => self.handles_where(PageRegion::in_content_root),
        }
    }
}

/// Page shown when a destination does not resolve.
pub fn not_found_source(destination: &str) -> String {
    format!(
        "@nav\n[home](/) [help](/help/)\n@main\n# E484: Can't open file {destination}\n\nThe page does not exist. Try [going home](/) or press : and type home.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::link_nav::collect_links;

    const SAMPLE: &str = "@routes {\":home\":\"/\"}\n\
@nav\n\
[home](/) [help](/help/)\n\
@main\n\
# Welcome\n\
Read the [first post](/posts/first/) or [docs](https://example.com){_blank}.\n\
@anchor bottom\n\
@content\n\
footer [about](/about/)\n\
@hidden\n\
[secret](/secret/)\n";

    fn parse(source: &str) -> TerminalPage {
        let parser = PageParser::new().unwrap();
        let mut page = parser.parse(source);
        page.layout(80);
        page
    }

    fn labels(handles: &[Handle], page: &TerminalPage) -> Vec<String> {
        handles
            .iter()
            .map(|h| {
                page.links
                    .iter()
                    .find(|l| l.id() == h.id())
                    .map(|l| l.label.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn test_parse_directives_and_links() {
        let page = parse(SAMPLE);
        assert_eq!(page.routes_payload(), Some("{\":home\":\"/\"}"));
        assert_eq!(page.links.len(), 6);
        assert_eq!(page.links[3].navigation_context(), NavigationContext::NewContext);
        assert_eq!(page.links[3].destination().as_deref(), Some("https://example.com"));
        // Hidden line is not laid out
        assert_eq!(page.row_count(), 4);
        assert_eq!(page.anchor_row("bottom"), Some(3));
    }

    #[test]
    fn test_discovery_order_skips_hidden() {
        let page = parse(SAMPLE);
        let links = collect_links(&page);
        assert_eq!(labels(&links, &page), vec!["home", "help", "first post", "docs", "about"]);
    }

    #[test]
    fn test_link_boxes_follow_scroll() {
        let page = parse(SAMPLE);
        let first_post = Rc::clone(&page.links[2]);
        // "Read the " is 9 columns on row 2
        assert_eq!(first_post.bounding_box(), BoundingBox::new(2, 9, 1, 10));

        page.set_scroll_y(2);
        assert_eq!(first_post.bounding_box().top, 0);
        assert_eq!(first_post.document_box().top, 2);
    }

    #[test]
    fn test_link_boxes_measure_against_scroll_target() {
        let page = parse(SAMPLE);
        let first_post = Rc::clone(&page.links[2]);

        page.set_scroll_target(2);
        // Nothing drawn has moved yet, but the box already reflects the target
        assert_eq!(page.scroll_y(), 0);
        assert_eq!(first_post.bounding_box().top, 0);

        while page.step_scroll() {}
        assert_eq!(page.scroll_y(), 2);
        assert_eq!(first_post.bounding_box().top, 0);
    }

    #[test]
    fn test_wrapping_spans_rows() {
        let parser = PageParser::new().unwrap();
        let mut page = parser.parse("abcdef [long label](/x/)");
        page.layout(10);
        // "abcdef lon" | "g label"
        assert_eq!(page.row_count(), 2);
        let rect = page.links[0].document_box();
        assert_eq!(rect.top, 0);
        assert_eq!(rect.bottom, 2);
        assert_eq!(rect.width(), 10);
    }

    #[test]
    fn test_wide_characters_wrap_by_display_width() {
        let parser = PageParser::new().unwrap();
        let mut page = parser.parse("中中中");
        page.layout(4);
        assert_eq!(page.row_count(), 2);
        assert_eq!(page.rows()[0].len(), 2);
    }

    #[test]
    fn test_empty_label_is_invisible() {
        let page = parse("[](/nowhere/) [ok](/ok/)");
        assert!(!page.links[0].is_visible());
        assert!(page.links[1].is_visible());
    }

    #[test]
    fn test_link_at_hit_testing() {
        let page = parse(SAMPLE);
        // Row 0 is "home help"
        let hit = page.link_at(0, 7).map(|h| h.id());
        assert_eq!(hit, Some(page.links[1].id()));
        assert!(page.link_at(0, 4).is_none());
        assert!(page.link_at(1, 2).is_none());
        assert!(page.link_at(99, 0).is_none());
    }

    #[test]
    fn test_detach_all() {
        let page = parse(SAMPLE);
        page.links[0].highlight();
        page.links[0].focus();
        assert_eq!(page.focused(), Some(page.links[0].id()));

        page.detach_all();
        assert!(!page.links[0].is_attached());
        assert!(!page.links[0].is_visible());
        assert!(!page.links[0].is_highlighted());
        assert_eq!(page.focused(), None);
        assert!(collect_links(&page).is_empty());
    }

    #[test]
    fn test_escaped_at_and_unknown_directive() {
        let page = parse("@@handle\n@title hello");
        let first: String = page.rows()[0].iter().map(|c| c.ch).collect();
        let second: String = page.rows()[1].iter().map(|c| c.ch).collect();
        assert_eq!(first, "@handle");
        assert_eq!(second, "@title hello");
    }

    #[test]
    fn test_not_found_page_has_links() {
        let page = parse(&not_found_source("/missing/"));
        assert!(page.routes_payload().is_none());
        assert_eq!(collect_links(&page).len(), 3);
    }

    #[test]
    fn test_handle_ids_unique_across_parses() {
        let a = parse("[x](/x/)");
        let b = parse("[x](/x/)");
        assert_ne!(a.links[0].id(), b.links[0].id());
    }
}
