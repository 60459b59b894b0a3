//! Terminal capability detection.
//!
//! Capabilities are read from the environment once at startup and threaded
//! into shell setup as a value. Nothing here mutates the environment;
//! overrides come in through `TRELLIS_COLOR` and `TRELLIS_MOUSE`.

/// Color depth the terminal is believed to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSupport {
    /// 24-bit color.
    TrueColor,
    /// 256-color palette.
    Extended256,
    /// 16 ANSI colors.
    Basic,
}

/// Detected terminal capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    /// Color depth.
    pub color: ColorSupport,
    /// Whether to enable mouse capture.
    pub mouse: bool,
}

/// Terminal emulators known to interfere with mouse capture.
const MOUSE_UNFRIENDLY: &[&str] = &["jetbrains", "jediterm"];

/// Terminal programs known to support 24-bit color without advertising it
/// through `COLORTERM`.
const TRUECOLOR_PROGRAMS: &[&str] = &["iterm.app", "wezterm", "vscode", "ghostty"];

/// Detect capabilities from the process environment.
pub fn detect_capabilities() -> TerminalCapabilities {
    let caps = capabilities_from(|name| std::env::var(name).ok());
    tracing::debug!(?caps, "terminal capabilities");
    caps
}

/// Detection over an arbitrary variable source, for tests.
fn capabilities_from(lookup: impl Fn(&str) -> Option<String>) -> TerminalCapabilities {
    TerminalCapabilities { color: detect_color(&lookup), mouse: detect_mouse(&lookup) }
}

fn detect_color(lookup: &impl Fn(&str) -> Option<String>) -> ColorSupport {
    if let Some(forced) = lookup("TRELLIS_COLOR") {
        return match forced.to_lowercase().as_str() {
            "truecolor" | "24bit" => ColorSupport::TrueColor,
            "256" => ColorSupport::Extended256,
            "basic" | "16" => ColorSupport::Basic,
            other => {
                tracing::warn!(value = other, "unrecognized TRELLIS_COLOR, detecting instead");
                detect_color_ambient(lookup)
            },
        };
    }
    detect_color_ambient(lookup)
}

fn detect_color_ambient(lookup: &impl Fn(&str) -> Option<String>) -> ColorSupport {
    let colorterm = lookup("COLORTERM").unwrap_or_default().to_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorSupport::TrueColor;
    }

    let program = lookup("TERM_PROGRAM").unwrap_or_default().to_lowercase();
    if TRUECOLOR_PROGRAMS.iter().any(|known| program.contains(known)) {
        return ColorSupport::TrueColor;
    }

    let term = lookup("TERM").unwrap_or_default().to_lowercase();
    if term.contains("256color") {
        return ColorSupport::Extended256;
    }

    ColorSupport::Basic
}

fn detect_mouse(lookup: &impl Fn(&str) -> Option<String>) -> bool {
    if let Some(forced) = lookup("TRELLIS_MOUSE") {
        return !matches!(forced.to_lowercase().as_str(), "0" | "false" | "off" | "no");
    }

    for var in ["TERM_PROGRAM", "TERMINAL_EMULATOR"] {
        let value = lookup(var).unwrap_or_default().to_lowercase();
        if MOUSE_UNFRIENDLY.iter().any(|known| value.contains(known)) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn colorterm_wins_over_term() {
        let caps = capabilities_from(env(&[
            ("COLORTERM", "truecolor"),
            ("TERM", "xterm-256color"),
        ]));
        assert_eq!(caps.color, ColorSupport::TrueColor);
    }

    #[test]
    fn term_256color_without_colorterm() {
        let caps = capabilities_from(env(&[("TERM", "screen-256color")]));
        assert_eq!(caps.color, ColorSupport::Extended256);
    }

    #[test]
    fn bare_term_falls_back_to_basic() {
        let caps = capabilities_from(env(&[("TERM", "vt100")]));
        assert_eq!(caps.color, ColorSupport::Basic);
    }

    #[test]
    fn known_truecolor_program_is_recognized() {
        let caps = capabilities_from(env(&[("TERM_PROGRAM", "WezTerm")]));
        assert_eq!(caps.color, ColorSupport::TrueColor);
    }

    #[test]
    fn color_override_beats_detection() {
        let caps = capabilities_from(env(&[
            ("TRELLIS_COLOR", "basic"),
            ("COLORTERM", "truecolor"),
        ]));
        assert_eq!(caps.color, ColorSupport::Basic);
    }

    #[test]
    fn unrecognized_override_falls_through_to_detection() {
        let caps = capabilities_from(env(&[
            ("TRELLIS_COLOR", "millions"),
            ("COLORTERM", "24bit"),
        ]));
        assert_eq!(caps.color, ColorSupport::TrueColor);
    }

    #[test]
    fn mouse_defaults_on_and_honors_override() {
        assert!(capabilities_from(env(&[])).mouse);
        assert!(!capabilities_from(env(&[("TRELLIS_MOUSE", "off")])).mouse);
        assert!(capabilities_from(env(&[("TRELLIS_MOUSE", "1")])).mouse);
    }

    #[test]
    fn mouse_unfriendly_emulator_disables_capture() {
        let caps = capabilities_from(env(&[("TERMINAL_EMULATOR", "JetBrains-JediTerm")]));
        assert!(!caps.mouse);
    }
}
