use crate::config::NavConfig;
use crate::controller::command::{CommandInterpreter, CommandLine};
use crate::controller::key_bar::KeyBarButton;
use crate::controller::link_nav::{self, LinkNavigator};
use crate::controller::navigation;
use crate::controller::shared_state::{
    CommandOutput, KeyController, KeyDisposition, NavContext, SharedNavState, StatusView,
};
use crate::page_model::{ChangeObserver, ContentSignal, Handle, PageHost, RouteTable, Viewport};
use crossterm::event::KeyEvent;
use std::time::{Duration, Instant};

/// One page view's worth of overlay state, and the event entry points a host calls.
pub struct NavOverlay {
    shared: SharedNavState,
    links: LinkNavigator,
    command: CommandInterpreter,
}

impl NavOverlay {
    pub fn new(config: NavConfig, routes: RouteTable) -> Self {
        Self {
            shared: SharedNavState::new(config),
            links: LinkNavigator::new(),
            command: CommandInterpreter::new(routes),
        }
    }

    /// Subscribe to every content signal the host can deliver.
    pub fn attach<O: ChangeObserver + ?Sized>(&mut self, observer: &mut O) {
        for signal in ContentSignal::ALL {
            if let Err(e) = observer.watch(signal) {
                log::warn!("not watching {signal:?}: {e}");
            }
        }
    }

    /// Initial discovery. Nothing is selected afterwards.
    pub fn start(&mut self, host: &mut dyn PageHost) {
        self.reserve_footer_space(&mut *host);
        self.links.discover(host, &mut self.shared);
    }

    pub fn on_content_signal(&mut self, signal: ContentSignal, host: &mut dyn PageHost) {
        log::debug!("content signal {signal:?}");
        self.reserve_footer_space(&mut *host);
        self.links.discover(host, &mut self.shared);
    }

    /// Publish the rendered footer height so page layout can leave room for it.
    fn reserve_footer_space<V: Viewport + ?Sized>(&self, viewport: &mut V) {
        if let Some(height) = viewport.footer_box_height() {
            viewport.set_reserved_footer_height(height.max(0));
        }
    }

    /// Offer a key to the link navigator, then the command line.
    ///
    /// The link navigator goes first so Escape clears the selection even
    /// while the command line is open.
    pub fn handle_key(&mut self, key_event: KeyEvent, host: &mut dyn PageHost, now: Instant) -> KeyDisposition {
        let mut ctx = NavContext {
            shared: &mut self.shared,
            host,
            now,
        };
        if self.links.handle_key(key_event, &mut ctx) == KeyDisposition::Consumed {
            return KeyDisposition::Consumed;
        }
        self.command.handle_key(key_event, &mut ctx)
    }

    pub fn press(&mut self, button: KeyBarButton, host: &mut dyn PageHost, now: Instant) -> KeyDisposition {
        self.handle_key(button.key_event(), host, now)
    }

    /// A pointer press somewhere on the page.
    ///
    /// Outside the command surface it closes the command line, unless the
    /// press comes right after opening it. It never clears the link selection.
    pub fn on_pointer_down(&mut self, inside_command: bool, host: &mut dyn PageHost, now: Instant) {
        if inside_command || !self.shared.mode.is_command_active() {
            return;
        }
        let guard = Duration::from_millis(self.shared.config.open_guard_ms);
        if let Some(opened_at) = self.command.opened_at() {
            if now.saturating_duration_since(opened_at) < guard {
                return;
            }
        }
        let mut ctx = NavContext {
            shared: &mut self.shared,
            host,
            now,
        };
        self.command.blur(&mut ctx);
    }

    /// A plain activation of a link by pointer. Returns `true` when the
    /// overlay took over navigation; otherwise the host does its default.
    pub fn on_link_click(&mut self, link: &Handle, modified: bool, host: &mut dyn PageHost, now: Instant) -> bool {
        if !link_nav::intercepts_click(link, modified) {
            return false;
        }
        let Some(destination) = link.destination() else {
            return false;
        };
        navigation::navigate(&mut self.shared, host, &destination, link.navigation_context(), now);
        true
    }

    /// Fire due navigations.
    pub fn tick(&mut self, host: &mut dyn PageHost, now: Instant) -> usize {
        self.shared.navigator.poll(now, host)
    }

    /// The host resolved a navigation without leaving the page, so nothing will replace
    /// the loading indicator. Puts the selection preview back once no timer is left.
    pub fn cancel_loading(&mut self) {
        if !self.shared.status.preview.is_busy() || self.shared.navigator.has_pending() {
            return;
        }
        match self.links.selected() {
            Some(link) => self
                .shared
                .status
                .set_link_target(&link.destination().unwrap_or_default(), link.navigation_context()),
            None => self.shared.status.clear_link_target(),
        }
    }

    /// Another editable field gained or lost focus.
    pub fn set_editable_focus(&mut self, focused: bool) {
        self.shared.editable_focused = focused;
    }

    pub fn print(&mut self, line: impl Into<String>) {
        self.shared.output.print(line);
    }

    pub fn status(&self) -> &StatusView {
        &self.shared.status
    }

    pub fn output(&self) -> &CommandOutput {
        &self.shared.output
    }

    pub fn config(&self) -> &NavConfig {
        &self.shared.config
    }

    pub fn is_command_active(&self) -> bool {
        self.shared.mode.is_command_active()
    }

    pub fn command_line(&self) -> &CommandLine {
        self.command.line()
    }

    pub fn routes(&self) -> &RouteTable {
        self.command.routes()
    }

    pub fn links(&self) -> &LinkNavigator {
        &self.links
    }

    pub fn has_pending_navigation(&self) -> bool {
        self.shared.navigator.has_pending()
    }
}
