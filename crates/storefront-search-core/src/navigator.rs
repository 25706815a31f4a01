//! Keyboard navigation over a ranked result list.
//!
//! The cursor is clamped at both ends (no wraparound) and only moves
//! while the list is non-empty. `Escape` is honoured regardless of the
//! list so the overlay can always be dismissed.

use std::fmt;
use std::str::FromStr;

/// A navigation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

impl FromStr for Key {
    type Err = String;

    /// Accepts DOM `KeyboardEvent.key` names and short CLI aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrowdown" | "down" | "j" => Ok(Key::ArrowDown),
            "arrowup" | "up" | "k" => Ok(Key::ArrowUp),
            "enter" | "return" => Ok(Key::Enter),
            "escape" | "esc" => Ok(Key::Escape),
            other => Err(format!("unknown key: '{}'", other)),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Key::ArrowDown => "ArrowDown",
            Key::ArrowUp => "ArrowUp",
            Key::Enter => "Enter",
            Key::Escape => "Escape",
        };
        f.write_str(name)
    }
}

/// What a key press resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// Cursor is now at this index (may be unchanged at a boundary).
    Moved(usize),
    /// Confirm the entry at this index.
    Confirm(usize),
    /// Close the search surface.
    Close,
    /// Nothing to navigate.
    Ignored,
}

/// Selection cursor over a list of `len` results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardNavigator {
    cursor: usize,
    len: usize,
}

impl KeyboardNavigator {
    pub fn new(len: usize) -> Self {
        Self { cursor: 0, len }
    }

    /// Point at a freshly ranked list; the cursor returns to the top.
    pub fn reset(&mut self, len: usize) {
        self.cursor = 0;
        self.len = len;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn handle(&mut self, key: Key) -> NavEvent {
        if key == Key::Escape {
            return NavEvent::Close;
        }
        if self.len == 0 {
            return NavEvent::Ignored;
        }
        match key {
            Key::ArrowDown => {
                self.cursor = (self.cursor + 1).min(self.len - 1);
                NavEvent::Moved(self.cursor)
            }
            Key::ArrowUp => {
                self.cursor = self.cursor.saturating_sub(1);
                NavEvent::Moved(self.cursor)
            }
            Key::Enter => NavEvent::Confirm(self.cursor),
            Key::Escape => NavEvent::Close,
        }
    }
}
