//! On-screen key bar for hosts without a convenient keyboard.
//!
//! Each button synthesizes the key event its physical key would send, so
//! the overlay cannot tell the two apart.

use crate::page_model::SENTINEL;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBarButton {
    Command,
    Enter,
    Next,
    Previous,
}

impl KeyBarButton {
    pub const ALL: [KeyBarButton; 4] = [
        KeyBarButton::Command,
        KeyBarButton::Enter,
        KeyBarButton::Next,
        KeyBarButton::Previous,
    ];

    pub fn key_event(self) -> KeyEvent {
        let code = match self {
            KeyBarButton::Command => KeyCode::Char(SENTINEL),
            KeyBarButton::Enter => KeyCode::Enter,
            KeyBarButton::Next => KeyCode::Char('j'),
            KeyBarButton::Previous => KeyCode::Char('k'),
        };
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    pub fn label(self) -> &'static str {
        match self {
            KeyBarButton::Command => ":",
            KeyBarButton::Enter => "enter",
            KeyBarButton::Next => "j",
            KeyBarButton::Previous => "k",
        }
    }
}
