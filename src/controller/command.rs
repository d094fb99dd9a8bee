use crate::controller::navigation;
use crate::controller::shared_state::{KeyController, KeyDisposition, NavContext};
use crate::page_model::route_table::{is_quit_command, normalize_command};
use crate::page_model::{NavigationContext, RouteTable, SENTINEL};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

/// Text of the command input with a caret, indexed in chars.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandLine {
    text: String,
    caret: usize,
}

impl CommandLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Replace the text and put the caret at the end.
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.caret = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }

    pub fn take(&mut self) -> String {
        self.caret = 0;
        std::mem::take(&mut self.text)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.caret);
        self.text.insert(at, c);
        self.caret += 1;
    }

    /// Delete the char before the caret.
    pub fn backspace(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        let at = self.byte_index(self.caret - 1);
        self.text.remove(at);
        self.caret -= 1;
        true
    }

    /// Delete the char under the caret.
    pub fn delete(&mut self) -> bool {
        if self.caret >= self.char_count() {
            return false;
        }
        let at = self.byte_index(self.caret);
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.caret = self.caret.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.caret = (self.caret + 1).min(self.char_count());
    }

    pub fn move_home(&mut self) {
        self.caret = 0;
    }

    pub fn move_end(&mut self) {
        self.caret = self.char_count();
    }

    pub fn starts_with_sentinel(&self) -> bool {
        self.text.starts_with(SENTINEL)
    }
}

/// What `handle` did with a submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Empty,
    Navigated { command: String, destination: String },
    Quit { destination: String },
    Unknown(String),
}

/// The `:` command line.
///
/// Whether it is open lives in the shared `ModeContext`, so anything that
/// clears the flag (a scheduled navigation, for one) closes it too.
pub struct CommandInterpreter {
    routes: RouteTable,
    line: CommandLine,
    opened_at: Option<Instant>,
}

impl CommandInterpreter {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            line: CommandLine::default(),
            opened_at: None,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn line(&self) -> &CommandLine {
        &self.line
    }

    pub fn opened_at(&self) -> Option<Instant> {
        self.opened_at
    }

    /// Open the command line, pre-filled with the sentinel.
    pub fn enter(&mut self, ctx: &mut NavContext<'_>) {
        if !ctx.shared.mode.is_command_active() {
            self.opened_at = Some(ctx.now);
        }
        self.line.set(&SENTINEL.to_string());
        ctx.shared.mode.set_command_active(true);
    }

    /// Close the command line and give the keyboard back.
    pub fn exit(&mut self, ctx: &mut NavContext<'_>) {
        self.line.clear();
        self.opened_at = None;
        ctx.shared.mode.set_command_active(false);
    }

    /// Focus left the command input.
    pub fn blur(&mut self, ctx: &mut NavContext<'_>) {
        if ctx.shared.mode.is_command_active() {
            log::debug!("command input lost focus");
            self.exit(ctx);
        }
    }

    /// Parse and dispatch one submitted line.
    pub fn handle(&mut self, raw: &str, ctx: &mut NavContext<'_>) -> CommandResult {
        let command = raw.trim();
        if command.is_empty() {
            return CommandResult::Empty;
        }

        // Accept with or without the leading sentinel
        let normalized = normalize_command(command);
        let destination = self
            .routes
            .lookup(&normalized)
            .filter(|destination| !destination.trim().is_empty())
            .map(str::to_string);
        let Some(destination) = destination else {
            log::debug!("unknown command {command:?}");
            ctx.shared
                .output
                .print(format!("E492: Not an editor command: {command}"));
            return CommandResult::Unknown(command.to_string());
        };

        ctx.shared.output.print(normalized.clone());
        if is_quit_command(&normalized) {
            // Hosts often refuse to close contexts they did not open
            if let Err(e) = ctx.host.close_context() {
                log::warn!("{normalized}: could not close browsing context: {e}");
            }
            navigation::navigate(ctx.shared, &mut *ctx.host, &destination, NavigationContext::SameContext, ctx.now);
            return CommandResult::Quit { destination };
        }

        log::info!("{normalized} -> {destination}");
        navigation::navigate(ctx.shared, &mut *ctx.host, &destination, NavigationContext::SameContext, ctx.now);
        CommandResult::Navigated { command: normalized, destination }
    }

    fn submit(&mut self, ctx: &mut NavContext<'_>) -> CommandResult {
        let text = self.line.take();
        let result = self.handle(&text, ctx);
        self.exit(ctx);
        result
    }

    /// Close if an edit removed the leading sentinel.
    fn check_sentinel(&mut self, ctx: &mut NavContext<'_>) {
        if !self.line.starts_with_sentinel() {
            self.exit(ctx);
        }
    }

    fn handle_active_key(&mut self, key_event: KeyEvent, ctx: &mut NavContext<'_>) {
        match key_event.code {
            KeyCode::Esc => self.exit(ctx),
            KeyCode::Enter => {
                self.submit(ctx);
            }
            KeyCode::Backspace => {
                // Deleting the sentinel closes the command line instead
                if self.line.starts_with_sentinel() && self.line.caret() == 1 {
                    self.exit(ctx);
                } else if self.line.backspace() {
                    self.check_sentinel(ctx);
                }
            }
            KeyCode::Delete => {
                if self.line.delete() {
                    self.check_sentinel(ctx);
                }
            }
            KeyCode::Left => self.line.move_left(),
            KeyCode::Right => self.line.move_right(),
            KeyCode::Home => self.line.move_home(),
            KeyCode::End => self.line.move_end(),
            KeyCode::Char(c) if !key_event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                self.line.insert(c);
                self.check_sentinel(ctx);
            }
            _ => {}
        }
    }
}

impl KeyController for CommandInterpreter {
    fn handle_key(&mut self, key_event: KeyEvent, ctx: &mut NavContext<'_>) -> KeyDisposition {
        if ctx.shared.mode.is_command_active() {
            // The input owns the keyboard while open
            self.handle_active_key(key_event, ctx);
            return KeyDisposition::Consumed;
        }

        // The flag may have been cleared elsewhere; drop any stale text
        if !self.line.text().is_empty() {
            self.line.clear();
        }

        match key_event.code {
            KeyCode::Char(c) if c == SENTINEL && !ctx.shared.editable_focused => {
                self.enter(ctx);
                KeyDisposition::Consumed
            }
            _ => KeyDisposition::Passed,
        }
    }
}
