// Local keyboard input through crossterm raw mode
//
// The terminal is switched to raw mode for the lifetime of `Keyboard` so
// single key presses arrive without Enter. Q, Esc and Ctrl-C end the loop.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::warn;

/// Result of draining the terminal for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Polled {
    /// Most recent character key pressed since the last poll
    pub key: Option<char>,
    pub quit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyInput {
    Key(char),
    Quit,
}

/// Q (either case), Esc or Ctrl-C
pub fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => true,
        _ => false,
    }
}

fn classify(key: &KeyEvent) -> Option<KeyInput> {
    if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
        return None;
    }
    if is_quit(key) {
        return Some(KeyInput::Quit);
    }
    match key.code {
        KeyCode::Char(c) => Some(KeyInput::Key(c)),
        _ => None,
    }
}

pub struct Keyboard {
    _private: (),
}

impl Keyboard {
    pub fn open() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { _private: () })
    }

    /// Drain every pending event without blocking
    pub fn poll(&mut self) -> io::Result<Polled> {
        let mut polled = Polled::default();
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                match classify(&key) {
                    Some(KeyInput::Key(c)) => polled.key = Some(c),
                    Some(KeyInput::Quit) => polled.quit = true,
                    None => {}
                }
            }
        }
        Ok(polled)
    }
}

impl Drop for Keyboard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}
