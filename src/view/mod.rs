/// View subsystem - Terminal pages and rendering
///
/// This module parses `.page` documents into laid out rows with link
/// handles, and draws them together with the overlay footer.

pub mod renderer;
pub mod terminal_page;

// Re-export public interface
pub use renderer::{RenderParams, View};
pub use terminal_page::{PageParser, PageRegion, TerminalLink, TerminalPage};
