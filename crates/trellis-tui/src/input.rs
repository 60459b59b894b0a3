//! Crossterm to core key translation.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use trellis_core::KeyInput;

/// Convert a crossterm key event to a core [`KeyInput`].
///
/// Returns `None` for keys the state machines have no use for. Shift+Tab
/// arrives as `BackTab` from crossterm; Ctrl combinations keep only the
/// letter.
pub fn convert_key(event: &KeyEvent) -> Option<KeyInput> {
    if event.modifiers.contains(KeyModifiers::CONTROL)
        && let KeyCode::Char(c) = event.code
    {
        return Some(KeyInput::Ctrl(c.to_ascii_lowercase()));
    }

    match event.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Delete => Some(KeyInput::Delete),
        KeyCode::Tab => Some(KeyInput::Tab),
        KeyCode::BackTab => Some(KeyInput::BackTab),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::Home => Some(KeyInput::Home),
        KeyCode::End => Some(KeyInput::End),
        _ => None,
    }
}
