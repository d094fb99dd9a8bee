use super::terminal_page::{CellStyle, TerminalPage};
use crate::controller::{CommandLine, KeyBarButton, LinkPreview, StatusView};
use crate::page_model::{NavigableHandle, NavigationContext};
use crossterm::{
    cursor, execute,
    style::{Attribute, Color, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType, size},
};
use std::io::{self, Write, stdout};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TEXT_COLOR: Color = Color::Green;
const HEADING_COLOR: Color = Color::Rgb { r: 0x7c, g: 0xff, b: 0x7c };
const DIM_COLOR: Color = Color::DarkGreen;

#[derive(Clone)]
pub struct RenderParams<'a> {
    pub page: &'a TerminalPage,
    pub status: &'a StatusView,
    /// Output log lines already cut to the configured count.
    pub output: &'a [String],
    /// The command line, when command mode is active.
    pub command: Option<&'a CommandLine>,
    pub show_key_bar: bool,
    /// Animation frame for the loading dots.
    pub frame: usize,
}

/// Rows the fixed footer takes: output log, status line, key bar.
pub fn footer_rows(output_lines: usize, show_key_bar: bool) -> i32 {
    (output_lines + 1 + usize::from(show_key_bar)) as i32
}

/// Key bar buttons and the columns they occupy, `[start, end)`.
pub fn key_bar_layout(width: u16) -> Vec<(KeyBarButton, u16, u16)> {
    let mut layout = Vec::new();
    let mut col = 0u16;
    for button in KeyBarButton::ALL {
        let w = button.label().width() as u16 + 2;
        if col + w > width {
            break;
        }
        layout.push((button, col, col + w));
        col += w + 1;
    }
    layout
}

/// Cut `text` to at most `width` display columns.
pub fn clip_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out
}

/// Plain text of the status line outside command mode.
pub fn status_text(status: &StatusView, frame: usize) -> String {
    match &status.preview {
        LinkPreview::Hidden => status.to_string(),
        LinkPreview::Target { destination, context } => {
            let suffix = match context {
                NavigationContext::NewContext => " [new tab]",
                NavigationContext::SameContext => "",
            };
            format!("{status}  -> {destination}{suffix}")
        }
        LinkPreview::Loading => format!("{status}  loading{}", ".".repeat(frame % 4)),
    }
}

pub struct View {
    last_lines: Vec<String>,
    last_terminal_size: (u16, u16),
    last_cursor: Option<(u16, u16)>,
    needs_full_redraw: bool,
    render_count: usize,
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    pub fn new() -> Self {
        Self {
            last_lines: Vec::new(),
            last_terminal_size: (0, 0),
            last_cursor: None,
            needs_full_redraw: true,
            render_count: 0,
        }
    }

    fn clear_screen(&self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))
    }

    fn move_cursor(&self, line: usize, column: usize) -> io::Result<()> {
        execute!(stdout(), cursor::MoveTo(column as u16, line as u16))
    }

    pub fn force_redraw(&mut self) {
        self.needs_full_redraw = true;
    }

    /// One page row with link and heading styling applied.
    fn page_row(&self, page: &TerminalPage, row: usize) -> String {
        let Some(cells) = page.rows().get(row) else {
            return String::new();
        };
        let mut result = String::new();
        let mut current: Option<(CellStyle, bool)> = None;

        for cell in cells {
            let highlighted = match cell.style {
                CellStyle::Link(idx) => page.link(idx).is_some_and(|link| link.is_highlighted()),
                _ => false,
            };
            if current != Some((cell.style, highlighted)) {
                result.push_str(&format!("{}{ResetColor}", SetAttribute(Attribute::Reset)));
                match cell.style {
                    CellStyle::Text => result.push_str(&format!("{}", SetForegroundColor(TEXT_COLOR))),
                    CellStyle::Heading => result.push_str(&format!(
                        "{}{}",
                        SetForegroundColor(HEADING_COLOR),
                        SetAttribute(Attribute::Bold)
                    )),
                    CellStyle::Link(_) if highlighted => result.push_str(&format!(
                        "{}{}",
                        SetBackgroundColor(TEXT_COLOR),
                        SetForegroundColor(Color::Black)
                    )),
                    CellStyle::Link(_) => result.push_str(&format!(
                        "{}{}",
                        SetForegroundColor(HEADING_COLOR),
                        SetAttribute(Attribute::Underlined)
                    )),
                }
                current = Some((cell.style, highlighted));
            }
            result.push(cell.ch);
        }
        if current.is_some() {
            result.push_str(&format!("{}{ResetColor}", SetAttribute(Attribute::Reset)));
        }
        result
    }

    fn key_bar_line(&self, width: u16) -> String {
        let mut line = String::new();
        let mut col = 0u16;
        for (button, start, _) in key_bar_layout(width) {
            line.push_str(&" ".repeat((start - col) as usize));
            line.push_str(&format!(
                "{}{} {} {ResetColor}",
                SetBackgroundColor(DIM_COLOR),
                SetForegroundColor(Color::Black),
                button.label()
            ));
            col = start + button.label().width() as u16 + 2;
        }
        line
    }

    pub fn render(&mut self, params: &RenderParams<'_>) -> io::Result<()> {
        let (width, height) = size()?;

        self.render_count += 1;

        // Force full redraw every 50 renders to prevent state drift
        if self.render_count % 50 == 0 {
            self.needs_full_redraw = true;
        }

        if self.last_terminal_size != (width, height) {
            self.needs_full_redraw = true;
            self.last_terminal_size = (width, height);
        }

        if self.needs_full_redraw {
            self.clear_screen()?;
            self.needs_full_redraw = false;
            self.last_lines.clear();
            self.last_cursor = None;
        }

        let footer = footer_rows(params.output.len(), params.show_key_bar).max(0) as usize;
        let page_rows = (height as usize).saturating_sub(footer);
        let scroll = params.page.scroll_y().max(0) as usize;

        let mut lines: Vec<String> = (0..page_rows).map(|i| self.page_row(params.page, scroll + i)).collect();

        for line in params.output {
            lines.push(format!(
                "{}{}{ResetColor}",
                SetForegroundColor(TEXT_COLOR),
                clip_to_width(line, width as usize)
            ));
        }

        let status_row = lines.len();
        let status_line = match params.command {
            Some(command) => command.text().to_string(),
            None => status_text(params.status, params.frame),
        };
        lines.push(format!(
            "{}{}{ResetColor}",
            SetForegroundColor(HEADING_COLOR),
            clip_to_width(&status_line, width as usize)
        ));

        if params.show_key_bar {
            lines.push(self.key_bar_line(width));
        }
        lines.truncate(height as usize);

        // Only redraw changed lines
        for (i, line) in lines.iter().enumerate() {
            if self.last_lines.get(i) != Some(line) {
                self.move_cursor(i, 0)?;
                execute!(stdout(), Clear(ClearType::CurrentLine))?;
                print!("{line}");
            }
        }
        self.last_lines = lines;

        let cursor_pos = params.command.map(|command| {
            let before: String = command.text().chars().take(command.caret()).collect();
            (before.width().min(width.saturating_sub(1) as usize) as u16, status_row as u16)
        });
        match cursor_pos {
            Some((col, row)) => {
                if self.last_cursor != cursor_pos {
                    execute!(stdout(), cursor::Show)?;
                }
                self.move_cursor(row as usize, col as usize)?;
            }
            None => {
                if self.last_cursor.is_some() || self.render_count == 1 {
                    execute!(stdout(), cursor::Hide)?;
                }
            }
        }
        self.last_cursor = cursor_pos;

        stdout().flush()?;
        Ok(())
    }
}
