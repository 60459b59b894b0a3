//! Key-binding tables.
//!
//! A [`Bindings`] table maps keys (declared by name, e.g. `"ctrl+l"`) to
//! action identifiers. Declarations are ordered and the most recent wins,
//! so a screen can layer its own bindings over a shared base table.

use thiserror::Error;
use trellis_core::KeyInput;

/// Errors from binding declarations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The key name was not recognized.
    #[error("unknown key name: {name:?}")]
    UnknownKey {
        /// The name that failed to parse.
        name: String,
    },
}

/// Ordered key-to-action table.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<(KeyInput, String)>,
}

impl Bindings {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `key` triggers `action`.
    ///
    /// Key names: `"enter"`, `"esc"`, `"tab"`, `"shift+tab"`, `"space"`,
    /// arrows, `"home"`, `"end"`, `"backspace"`, `"delete"`, a single
    /// character, or `"ctrl+"` plus a character.
    pub fn bind(
        &mut self,
        key: &str,
        action: impl Into<String>,
    ) -> Result<(), BindingError> {
        let key = parse_key(key)?;
        self.entries.push((key, action.into()));
        Ok(())
    }

    /// Builder form of [`Bindings::bind`].
    pub fn with(mut self, key: &str, action: impl Into<String>) -> Result<Self, BindingError> {
        self.bind(key, action)?;
        Ok(self)
    }

    /// Action for `key`, if bound. Later declarations shadow earlier ones.
    pub fn lookup(&self, key: KeyInput) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(bound, _)| *bound == key)
            .map(|(_, action)| action.as_str())
    }

    /// All `(key, action)` pairs in declaration order, shadowed entries
    /// included.
    pub fn entries(&self) -> &[(KeyInput, String)] {
        &self.entries
    }
}

fn parse_key(name: &str) -> Result<KeyInput, BindingError> {
    let lowered = name.to_lowercase();

    if let Some(rest) = lowered.strip_prefix("ctrl+") {
        let mut chars = rest.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(KeyInput::Ctrl(c));
        }
        return Err(BindingError::UnknownKey { name: name.to_owned() });
    }

    let key = match lowered.as_str() {
        "enter" => KeyInput::Enter,
        "esc" | "escape" => KeyInput::Esc,
        "tab" => KeyInput::Tab,
        "backtab" | "shift+tab" => KeyInput::BackTab,
        "space" => KeyInput::Char(' '),
        "up" => KeyInput::Up,
        "down" => KeyInput::Down,
        "left" => KeyInput::Left,
        "right" => KeyInput::Right,
        "home" => KeyInput::Home,
        "end" => KeyInput::End,
        "backspace" => KeyInput::Backspace,
        "delete" | "del" => KeyInput::Delete,
        single => {
            let mut chars = single.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyInput::Char(c),
                _ => return Err(BindingError::UnknownKey { name: name.to_owned() }),
            }
        },
    };
    Ok(key)
}
