//! Key input events.
//!
//! Terminal-agnostic key events consumed by the table and form state
//! machines. The shell crate converts backend key codes into this type.

/// Key input events from the host terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Character with the Control modifier held.
    Ctrl(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Tab key.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Escape key.
    Esc,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
}
