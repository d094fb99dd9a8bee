//! Navigable handles - the link capability the navigator works against.
//!
//! A host wraps each on-page link in something implementing
//! `NavigableHandle`. The navigator never sees the rendering surface itself.

use std::rc::Rc;

/// Stable identity of a handle for the life of the element it wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

/// Where a link asks to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationContext {
    #[default]
    SameContext,
    NewContext,
}

impl NavigationContext {
    /// Interpret a link `target` attribute value.
    pub fn from_target(target: &str) -> Self {
        if target.trim().eq_ignore_ascii_case("_blank") {
            NavigationContext::NewContext
        } else {
            NavigationContext::SameContext
        }
    }

    pub fn as_target(&self) -> Option<&'static str> {
        match self {
            NavigationContext::SameContext => None,
            NavigationContext::NewContext => Some("_blank"),
        }
    }
}

/// Viewport-relative box of a rendered element, in host units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl BoundingBox {
    pub fn new(top: i32, left: i32, height: i32, width: i32) -> Self {
        Self {
            top,
            bottom: top + height,
            left,
            right: left + width,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// A box counts as rendered if either dimension is non-zero.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 && self.height() == 0
    }
}

/// Capability set of one on-page link.
///
/// Methods take `&self`: handles are shared between the host and the
/// navigator, so implementations keep their mutable bits in `Cell`s.
pub trait NavigableHandle {
    fn id(&self) -> HandleId;

    /// The link destination, `None` when the link has no href.
    fn destination(&self) -> Option<String>;

    fn navigation_context(&self) -> NavigationContext;

    fn highlight(&self);
    fn unhighlight(&self);
    fn is_highlighted(&self) -> bool;

    /// Move accessibility focus here. Must not scroll.
    fn focus(&self);

    fn bounding_box(&self) -> BoundingBox;

    fn is_attached(&self) -> bool;

    /// Rendered and not hidden. Detached handles are never visible.
    fn is_visible(&self) -> bool;
}

pub type Handle = Rc<dyn NavigableHandle>;

/// Document regions links are collected from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    PrimaryNav,
    MainContent,
    ContentRoot,
}

impl Region {
    pub const PRIORITY: [Region; 3] = [Region::PrimaryNav, Region::MainContent, Region::ContentRoot];
}

/// Query side of the document: which links live in a region.
///
/// A region missing from the page yields an empty list.
pub trait LinkSource {
    fn links_in(&self, region: Region) -> Vec<Handle>;
}
