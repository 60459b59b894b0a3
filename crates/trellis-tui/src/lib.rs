//! Terminal shell for Trellis
//!
//! A thin shell over the pure state machines in `trellis-core`: crossterm
//! input translation, key-binding tables, terminal capability detection,
//! ratatui rendering, and a screen-stack runtime that delivers each
//! screen's result to a continuation.
//!
//! All layout and widget composition lives in [`ui`] as pure render
//! functions; the shell only drives I/O.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bindings;
mod input;
mod screen;
pub mod shell;
mod term;
pub mod ui;

pub use bindings::{BindingError, Bindings};
pub use input::convert_key;
pub use screen::{ActionHandler, Screen, ScreenBuilder};
pub use shell::{Shell, ShellError};
pub use term::{ColorSupport, TerminalCapabilities, detect_capabilities};
pub use trellis_core::{
    Field, FieldValue, FormState, KeyInput, ScreenResult, SelectMode, TableRow, TableState,
};
