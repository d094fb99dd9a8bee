use crate::config::NavConfig;
use crate::controller::overlay::NavOverlay;
use crate::controller::shared_state::KeyDisposition;
use crate::controller::key_bar::KeyBarButton;
use crate::error::{NavError, Result};
use crate::page_model::{
    BrowsingContext, ChangeObserver, ContentSignal, Handle, LinkSource, Location, NavigationContext, Region,
    RouteTable, ScrollBehavior, Site, Viewport,
};
use crate::view::renderer::{self, RenderParams};
use crate::view::terminal_page::{self, PageParser, TerminalPage};
use crate::view::View;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use std::ffi::OsString;
use std::fs;
use std::io::stdout;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant, SystemTime};

const TICK: Duration = Duration::from_millis(40);
const RELOAD_CHECK: Duration = Duration::from_millis(500);
const WHEEL_ROWS: i32 = 3;

/// A location change the overlay asked for, applied by the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    Assign(String),
    OpenNew(String),
    Close,
}

/// The terminal as a page host: one laid out page, a scroll offset and a fixed footer.
pub struct TerminalHost {
    page: TerminalPage,
    width: u16,
    height: u16,
    footer_rows: i32,
    reserved_footer: Option<i32>,
    reduced_motion: bool,
    requests: Vec<HostRequest>,
    watched: Vec<ContentSignal>,
}

impl TerminalHost {
    pub fn new(mut page: TerminalPage, width: u16, height: u16, config: &NavConfig) -> Self {
        page.layout(width as usize);
        Self {
            page,
            width,
            height,
            footer_rows: renderer::footer_rows(config.output_lines, config.show_key_bar),
            reserved_footer: None,
            reduced_motion: config.reduced_motion,
            requests: Vec::new(),
            watched: Vec::new(),
        }
    }

    pub fn page(&self) -> &TerminalPage {
        &self.page
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Swap in a new page. Handles from the old one become detached.
    pub fn replace_page(&mut self, mut page: TerminalPage, keep_scroll: bool) {
        page.layout(self.width as usize);
        let scroll = if keep_scroll { self.page.scroll_target() } else { 0 };
        self.page.detach_all();
        self.page = page;
        self.page.set_scroll_y(self.clamp_scroll(scroll));
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.page.layout(width as usize);
        let target = self.clamp_scroll(self.page.scroll_target());
        self.page.set_scroll_y(self.clamp_scroll(self.page.scroll_y()));
        self.page.set_scroll_target(target);
    }

    fn max_scroll(&self) -> i32 {
        let footer = self.reserved_footer.unwrap_or(self.footer_rows);
        (self.page.row_count() + footer - self.height as i32).max(0)
    }

    fn clamp_scroll(&self, y: i32) -> i32 {
        y.clamp(0, self.max_scroll())
    }

    /// Jump straight to a document row.
    pub fn scroll_to(&mut self, row: i32) {
        self.page.set_scroll_y(self.clamp_scroll(row));
    }

    /// Step a smooth scroll toward its target. Returns whether anything moved.
    pub fn animate(&mut self) -> bool {
        self.page.step_scroll()
    }

    pub fn is_watching(&self, signal: ContentSignal) -> bool {
        self.watched.contains(&signal)
    }

    pub fn take_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }

    /// What an unintercepted click does.
    pub fn activate_default(&mut self, link: &Handle) {
        let Some(destination) = link.destination() else {
            return;
        };
        self.requests.push(match link.navigation_context() {
            NavigationContext::NewContext => HostRequest::OpenNew(destination),
            NavigationContext::SameContext => HostRequest::Assign(destination),
        });
    }

    /// Document row under a screen row, if the row shows page content.
    pub fn page_row_at(&self, screen_row: u16) -> Option<i32> {
        let page_height = self.height as i32 - self.footer_rows;
        let row = screen_row as i32;
        (row < page_height).then(|| row + self.page.scroll_y())
    }
}

impl LinkSource for TerminalHost {
    fn links_in(&self, region: Region) -> Vec<Handle> {
        self.page.links_in(region)
    }
}

impl Viewport for TerminalHost {
    fn viewport_height(&self) -> i32 {
        self.height as i32
    }

    fn footer_box_height(&self) -> Option<i32> {
        Some(self.footer_rows)
    }

    fn reserved_footer_height(&self) -> Option<i32> {
        self.reserved_footer
    }

    fn set_reserved_footer_height(&mut self, height: i32) {
        self.reserved_footer = Some(height);
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// `dy` is relative to the scroll target, which is what link boxes measure against.
    fn scroll_by(&mut self, dy: i32, behavior: ScrollBehavior) {
        let target = self.clamp_scroll(self.page.scroll_target() + dy);
        match behavior {
            ScrollBehavior::Instant => self.page.set_scroll_y(target),
            ScrollBehavior::Smooth => self.page.set_scroll_target(target),
        }
    }
}

impl BrowsingContext for TerminalHost {
    fn assign(&mut self, destination: &str) -> Result<()> {
        self.requests.push(HostRequest::Assign(destination.to_string()));
        Ok(())
    }

    fn open_new_context(&mut self, destination: &str) -> Result<()> {
        self.requests.push(HostRequest::OpenNew(destination.to_string()));
        Ok(())
    }

    fn close_context(&mut self) -> Result<()> {
        self.requests.push(HostRequest::Close);
        Ok(())
    }
}

impl ChangeObserver for TerminalHost {
    fn watch(&mut self, signal: ContentSignal) -> Result<()> {
        if signal == ContentSignal::FontsReady {
            return Err(NavError::Unsupported("terminal fonts are fixed".to_string()));
        }
        if !self.watched.contains(&signal) {
            self.watched.push(signal);
        }
        Ok(())
    }
}

/// A browsing session over a site directory.
pub struct Session {
    site: Site,
    config: NavConfig,
    parser: PageParser,
    host: TerminalHost,
    overlay: NavOverlay,
    view: View,
    current_path: String,
    page_file: Option<PathBuf>,
    page_mtime: Option<SystemTime>,
    last_reload_check: Instant,
    started: Instant,
    /// Program external URLs go to, from `$BROWSER`.
    browser: Option<OsString>,
    load_signaled: bool,
    quit: bool,
}

impl Session {
    pub fn new(site: Site, config: NavConfig, start_path: &str) -> Result<Self> {
        let parser = PageParser::new()?;
        let (width, height) = terminal::size().unwrap_or((80, 24));
        let placeholder = parser.parse("");
        let host = TerminalHost::new(placeholder, width, height, &config);
        let overlay = NavOverlay::new(config.clone(), RouteTable::fallback());

        let mut session = Self {
            site,
            config,
            parser,
            host,
            overlay,
            view: View::new(),
            current_path: "/".to_string(),
            page_file: None,
            page_mtime: None,
            last_reload_check: Instant::now(),
            started: Instant::now(),
            browser: std::env::var_os("BROWSER").filter(|b| !b.is_empty()),
            load_signaled: false,
            quit: false,
        };
        session.follow(start_path);
        Ok(session)
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn overlay(&self) -> &NavOverlay {
        &self.overlay
    }

    pub fn host(&self) -> &TerminalHost {
        &self.host
    }

    pub fn routes(&self) -> &RouteTable {
        self.overlay.routes()
    }

    pub fn is_finished(&self) -> bool {
        self.quit
    }

    pub fn run(mut self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;

        let result = self.run_loop();

        execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, cursor::Show)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        while !self.quit {
            self.render()?;

            // Load fires once the first frame is on screen
            self.signal_loaded();

            if event::poll(TICK)? {
                let now = Instant::now();
                match event::read()? {
                    Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                        self.on_key(key_event, now);
                    }
                    Event::Mouse(mouse_event) => self.on_mouse(mouse_event, now),
                    Event::Resize(width, height) => self.on_resize(width, height),
                    _ => {}
                }
            }

            self.advance(Instant::now());
            self.check_reload();
        }
        Ok(())
    }

    fn render(&mut self) -> std::io::Result<()> {
        // Fixed height footer: pad the output log to its configured size
        let tail = self.overlay.output().tail(self.config.output_lines);
        let mut output = vec![String::new(); self.config.output_lines - tail.len()];
        output.extend(tail.iter().cloned());

        let command = self.overlay.is_command_active().then(|| self.overlay.command_line());
        let params = RenderParams {
            page: self.host.page(),
            status: self.overlay.status(),
            output: &output,
            command,
            show_key_bar: self.config.show_key_bar,
            frame: (self.started.elapsed().as_millis() / 250) as usize,
        };
        self.view.render(&params)
    }

    /// Timers, smooth scrolling and queued location changes.
    pub fn advance(&mut self, now: Instant) {
        self.overlay.tick(&mut self.host, now);
        self.host.animate();
        for request in self.host.take_requests() {
            match request {
                HostRequest::Assign(destination) => self.follow(&destination),
                HostRequest::OpenNew(destination) => self.open_new(&destination),
                HostRequest::Close => {
                    log::info!("closing session");
                    self.quit = true;
                }
            }
        }
    }

    pub fn on_key(&mut self, key_event: KeyEvent, now: Instant) {
        if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        if self.overlay.handle_key(key_event, &mut self.host, now) == KeyDisposition::Consumed {
            return;
        }
        if self.overlay.is_command_active() {
            return;
        }

        // Keys the overlay passed on get the usual pager behavior
        let page_step = (self.host.height as i32 - self.host.footer_rows).max(1);
        let dy = match key_event.code {
            KeyCode::Down => 1,
            KeyCode::Up => -1,
            KeyCode::PageDown | KeyCode::Char(' ') => page_step,
            KeyCode::PageUp => -page_step,
            KeyCode::Home => -self.host.page.row_count(),
            KeyCode::End => self.host.page.row_count(),
            _ => return,
        };
        self.host.scroll_by(dy, ScrollBehavior::Instant);
    }

    pub fn on_mouse(&mut self, mouse_event: MouseEvent, now: Instant) {
        let (width, height) = self.host.size();
        match mouse_event.kind {
            MouseEventKind::ScrollDown => self.host.scroll_by(WHEEL_ROWS, ScrollBehavior::Instant),
            MouseEventKind::ScrollUp => self.host.scroll_by(-WHEEL_ROWS, ScrollBehavior::Instant),
            MouseEventKind::Down(MouseButton::Left) => {
                let row = mouse_event.row;
                let col = mouse_event.column;

                if self.config.show_key_bar && row + 1 == height {
                    let button = renderer::key_bar_layout(width)
                        .into_iter()
                        .find(|(_, start, end)| (*start..*end).contains(&col))
                        .map(|(button, _, _)| button);
                    if let Some(button) = button {
                        self.press(button, now);
                    }
                    return;
                }

                let Some(doc_row) = self.host.page_row_at(row) else {
                    // Footer presses count as inside the command surface
                    self.overlay.on_pointer_down(true, &mut self.host, now);
                    return;
                };
                self.overlay.on_pointer_down(false, &mut self.host, now);

                if let Some(link) = self.host.page.link_at(doc_row, col as usize) {
                    let modified = mouse_event
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT);
                    if !self.overlay.on_link_click(&link, modified, &mut self.host, now) {
                        self.host.activate_default(&link);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn press(&mut self, button: KeyBarButton, now: Instant) {
        self.overlay.press(button, &mut self.host, now);
    }

    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.host.resize(width, height);
        self.view.force_redraw();
        self.deliver(ContentSignal::Resize);
    }

    /// Deliver Load for the current page, once. Returns whether it went out now.
    fn signal_loaded(&mut self) -> bool {
        if self.load_signaled {
            return false;
        }
        self.load_signaled = true;
        self.deliver(ContentSignal::Load);
        true
    }

    fn deliver(&mut self, signal: ContentSignal) {
        if self.host.is_watching(signal) {
            self.overlay.on_content_signal(signal, &mut self.host);
        }
    }

    /// Same-context location change.
    fn follow(&mut self, destination: &str) {
        match self.site.resolve(destination, &self.current_path) {
            Ok(Location::Fragment(id)) => self.jump_to_anchor(&id),
            Ok(Location::Page {
                path,
                site_path,
                fragment,
            }) => {
                match fs::read_to_string(&path) {
                    Ok(source) => {
                        self.page_mtime = modified_time(&path);
                        self.page_file = Some(path);
                        self.show_page(&source, site_path);
                    }
                    Err(e) => {
                        log::warn!("reading {}: {e}", path.display());
                        self.show_not_found(destination);
                        return;
                    }
                }
                if let Some(id) = fragment {
                    self.jump_to_anchor(&id);
                }
            }
            Ok(Location::External(url)) => {
                self.open_external(&url);
                self.overlay.cancel_loading();
            }
            Err(e) => {
                log::warn!("{e}");
                self.show_not_found(destination);
            }
        }
    }

    fn show_not_found(&mut self, destination: &str) {
        self.page_file = None;
        self.page_mtime = None;
        let source = terminal_page::not_found_source(destination);
        let site_path = self.current_path.clone();
        self.show_page(&source, site_path);
    }

    /// Load a new document: fresh overlay, routes read from the page.
    fn show_page(&mut self, source: &str, site_path: String) {
        let page = self.parser.parse(source);
        let routes = RouteTable::load(page.routes_payload());
        self.host.replace_page(page, false);
        self.current_path = site_path;
        log::info!("showing {}", self.current_path);

        self.overlay = NavOverlay::new(self.config.clone(), routes);
        self.overlay.attach(&mut self.host);
        self.overlay.start(&mut self.host);
        self.load_signaled = false;
        self.view.force_redraw();
    }

    fn jump_to_anchor(&mut self, id: &str) {
        match self.host.page.anchor_row(id) {
            Some(row) => self.host.scroll_to(row),
            None => log::warn!("no anchor #{id} on {}", self.current_path),
        }
    }

    fn open_new(&mut self, destination: &str) {
        match self.site.resolve(destination, &self.current_path) {
            Ok(Location::External(url)) => self.open_external(&url),
            _ => self.overlay.print(format!("new tab: {destination}")),
        }
    }

    /// Hand a URL to `$BROWSER`, best effort.
    fn open_external(&mut self, url: &str) {
        let Some(browser) = self.browser.clone() else {
            self.overlay.print(format!("no $BROWSER set, cannot open {url}"));
            return;
        };
        let spawned = Command::new(&browser)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                // Reaped off the loop thread
                let name = browser.to_string_lossy().into_owned();
                std::thread::spawn(move || {
                    if let Err(e) = child.wait() {
                        log::warn!("waiting on {name}: {e}");
                    }
                });
                self.overlay.print(format!("opened {url}"));
            }
            Err(e) => {
                log::warn!("launching {}: {e}", browser.to_string_lossy());
                self.overlay.print(format!("could not open {url}"));
            }
        }
    }

    fn check_reload(&mut self) {
        if self.last_reload_check.elapsed() < RELOAD_CHECK {
            return;
        }
        self.last_reload_check = Instant::now();
        self.reload_if_changed();
    }

    /// Re-read the page file after an edit. Keeps the overlay and reports a mutation.
    pub fn reload_if_changed(&mut self) -> bool {
        let Some(path) = self.page_file.clone() else {
            return false;
        };
        let mtime = modified_time(&path);
        if mtime == self.page_mtime {
            return false;
        }
        self.page_mtime = mtime;

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("reloading {}: {e}", path.display());
                return false;
            }
        };
        log::debug!("{} changed, reloading", path.display());
        let page = self.parser.parse(&source);
        self.host.replace_page(page, true);
        self.view.force_redraw();
        self.deliver(ContentSignal::Mutation);
        true
    }
}

fn modified_time(path: &std::path::Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
