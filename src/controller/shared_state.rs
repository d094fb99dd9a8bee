use crate::config::NavConfig;
use crate::controller::navigation::DelayedNavigator;
use crate::page_model::{NavigationContext, PageHost};
use crossterm::event::KeyEvent;
use std::fmt;
use std::time::Instant;

/// The single coordination point between link navigation and command entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModeContext {
    command_active: bool,
}

impl ModeContext {
    pub fn is_command_active(&self) -> bool {
        self.command_active
    }

    pub fn set_command_active(&mut self, active: bool) {
        if self.command_active != active {
            log::debug!("command mode {}", if active { "entered" } else { "left" });
        }
        self.command_active = active;
    }
}

/// What the footer link-target area shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkPreview {
    #[default]
    Hidden,
    Target {
        destination: String,
        context: NavigationContext,
    },
    /// Navigation pending; busy for assistive technology.
    Loading,
}

impl LinkPreview {
    pub fn is_busy(&self) -> bool {
        matches!(self, LinkPreview::Loading)
    }
}

/// Footer status: `position:total` plus the link preview.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusView {
    /// 1-based selected position, 0 when nothing is selected.
    pub position: usize,
    pub total: usize,
    pub preview: LinkPreview,
}

impl StatusView {
    pub fn set_position(&mut self, position: usize, total: usize) {
        self.position = position;
        self.total = total;
    }

    /// Show a link target. An empty destination hides the preview.
    pub fn set_link_target(&mut self, destination: &str, context: NavigationContext) {
        let destination = destination.trim();
        self.preview = if destination.is_empty() {
            LinkPreview::Hidden
        } else {
            LinkPreview::Target {
                destination: destination.to_string(),
                context,
            }
        };
    }

    pub fn clear_link_target(&mut self) {
        self.preview = LinkPreview::Hidden;
    }

    pub fn show_loading(&mut self) {
        self.preview = LinkPreview::Loading;
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.position, self.total)
    }
}

/// Append-only command output log.
#[derive(Debug, Default, Clone)]
pub struct CommandOutput {
    lines: Vec<String>,
}

impl CommandOutput {
    const MAX_LINES: usize = 200;

    pub fn print(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
        if self.lines.len() > Self::MAX_LINES {
            let excess = self.lines.len() - Self::MAX_LINES;
            self.lines.drain(..excess);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The newest `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> &[String] {
        let start = self.lines.len().saturating_sub(count);
        &self.lines[start..]
    }
}

/// Shared state that both controllers need access to
pub struct SharedNavState {
    pub config: NavConfig,
    pub mode: ModeContext,
    pub status: StatusView,
    pub output: CommandOutput,
    pub navigator: DelayedNavigator,
    /// An editable field other than the command input holds focus.
    pub editable_focused: bool,
}

impl SharedNavState {
    pub fn new(config: NavConfig) -> Self {
        let navigator = DelayedNavigator::new(config.navigation_delay_ms);
        Self {
            config,
            mode: ModeContext::default(),
            status: StatusView::default(),
            output: CommandOutput::default(),
            navigator,
            editable_focused: false,
        }
    }
}

/// Everything a controller may touch while handling one event.
pub struct NavContext<'a> {
    pub shared: &'a mut SharedNavState,
    pub host: &'a mut dyn PageHost,
    pub now: Instant,
}

/// Result of offering a key event to a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Handled; later controllers do not see the key.
    Consumed,
    /// Later controllers still get the key.
    Passed,
}

/// Trait that every key-handling controller implements
pub trait KeyController {
    fn handle_key(&mut self, key_event: KeyEvent, ctx: &mut NavContext<'_>) -> KeyDisposition;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_context_toggle() {
        let mut mode = ModeContext::default();
        assert!(!mode.is_command_active());
        mode.set_command_active(true);
        assert!(mode.is_command_active());
        mode.set_command_active(false);
        assert!(!mode.is_command_active());
    }

    #[test]
    fn test_status_view_display() {
        let mut status = StatusView::default();
        assert_eq!(status.to_string(), "0:0");
        status.set_position(2, 7);
        assert_eq!(status.to_string(), "2:7");
    }

    #[test]
    fn test_link_target_preview() {
        let mut status = StatusView::default();
        status.set_link_target("  /posts/  ", NavigationContext::SameContext);
        assert_eq!(
            status.preview,
            LinkPreview::Target { destination: "/posts/".to_string(), context: NavigationContext::SameContext }
        );

        status.show_loading();
        assert!(status.preview.is_busy());

        // Empty destination hides the preview and clears busy state
        status.set_link_target("", NavigationContext::NewContext);
        assert_eq!(status.preview, LinkPreview::Hidden);
    }

    #[test]
    fn test_command_output_tail() {
        let mut output = CommandOutput::default();
        assert!(output.tail(3).is_empty());
        for i in 0..5 {
            output.print(format!("line {i}"));
        }
        assert_eq!(output.tail(2), ["line 3".to_string(), "line 4".to_string()]);
        assert_eq!(output.tail(10).len(), 5);
    }

    #[test]
    fn test_command_output_is_bounded() {
        let mut output = CommandOutput::default();
        for i in 0..250 {
            output.print(format!("{i}"));
        }
        assert_eq!(output.lines().len(), 200);
        assert_eq!(output.lines()[0], "50");
    }
}
