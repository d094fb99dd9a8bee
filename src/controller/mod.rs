/// Controller subsystem - Handles all user input and navigation decisions
///
/// This module contains the link navigator, the command line interpreter,
/// the delayed navigator they both funnel into, and the overlay that fixes
/// the order in which they see each event.

pub mod command;
pub mod key_bar;
pub mod link_nav;
pub mod navigation;
pub mod overlay;
pub mod scroll;
pub mod session;
pub mod shared_state;

#[cfg(test)]
pub mod test_host;

// Re-export public interface
pub use command::{CommandInterpreter, CommandLine, CommandResult};
pub use key_bar::KeyBarButton;
pub use link_nav::LinkNavigator;
pub use navigation::{DelayedNavigator, NavigationOutcome};
pub use overlay::NavOverlay;
pub use session::Session;
pub use shared_state::{KeyController, KeyDisposition, LinkPreview, ModeContext, NavContext, SharedNavState, StatusView};
