//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Keys that trigger a remote
//! call only record a request; the main loop runs it so this module stays
//! free of I/O.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('d') => app.request("done"),
        KeyCode::Char('r') => app.request("read"),
        KeyCode::Char('u') => app.request("unsubscribe"),
        _ => {}
    }
}
