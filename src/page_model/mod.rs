/// Page model subsystem - What the overlay knows about the page
///
/// This module holds the route table, the link handle capability and the
/// host traits the controllers are written against, so the state machines
/// never touch a concrete rendering surface.

pub mod handle;
pub mod host;
pub mod route_table;
pub mod site;

// Re-export public interface
pub use handle::{BoundingBox, Handle, HandleId, LinkSource, NavigableHandle, NavigationContext, Region};
pub use host::{BrowsingContext, ChangeObserver, ContentSignal, PageHost, ScrollBehavior, Viewport};
pub use route_table::{RouteTable, SENTINEL};
pub use site::{Location, Site};
