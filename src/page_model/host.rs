//! Host capabilities the overlay depends on besides the links themselves.

use super::handle::LinkSource;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Window geometry, scrolling, and the footer the page keeps fixed on top.
pub trait Viewport {
    fn viewport_height(&self) -> i32;

    /// Height of the rendered fixed footer, `None` when there is none.
    fn footer_box_height(&self) -> Option<i32>;

    /// Last value written through `set_reserved_footer_height`, if any.
    fn reserved_footer_height(&self) -> Option<i32>;

    /// Tell the page layout how much room the fixed footer takes.
    fn set_reserved_footer_height(&mut self, height: i32);

    fn prefers_reduced_motion(&self) -> bool;

    fn scroll_by(&mut self, dy: i32, behavior: ScrollBehavior);
}

/// The browsing location. Every call is best effort.
pub trait BrowsingContext {
    /// Same-context navigation.
    fn assign(&mut self, destination: &str) -> Result<()>;

    fn open_new_context(&mut self, destination: &str) -> Result<()>;

    /// Close the current context. Hosts may refuse.
    fn close_context(&mut self) -> Result<()>;
}

/// Notifications a host can deliver to `NavOverlay::on_content_signal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSignal {
    Resize,
    Mutation,
    Load,
    FontsReady,
}

impl ContentSignal {
    pub const ALL: [ContentSignal; 4] = [
        ContentSignal::Resize,
        ContentSignal::Mutation,
        ContentSignal::Load,
        ContentSignal::FontsReady,
    ];
}

/// Subscription side of content watching.
///
/// `Err(NavError::Unsupported)` means the host cannot produce that signal.
pub trait ChangeObserver {
    fn watch(&mut self, signal: ContentSignal) -> Result<()>;
}

/// Everything the overlay needs from a host in one object.
pub trait PageHost: LinkSource + Viewport + BrowsingContext {}

impl<T: LinkSource + Viewport + BrowsingContext> PageHost for T {}
