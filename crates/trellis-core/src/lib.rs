//! Core state machines for Trellis
//!
//! Pure, I/O-free state machines that back the terminal widgets: the layered
//! table (selection, filtering, identity-based reconciliation), the form
//! screen (fields, validation, the review-then-confirm protocol), and a flat
//! key/value state store with change watchers.
//!
//! # Components
//!
//! - [`TableState`]: selectable, filterable, layer-grouped row grid
//! - [`FormState`]: declarative field list compiled into a screen
//! - [`StateManager`]: key/value store with per-key watchers
//!
//! Everything here processes [`KeyInput`] events and returns actions for a
//! host shell to execute. No terminal, no async, no rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod form;
mod input;
mod row;
mod state;
mod table;

pub use error::TableError;
pub use form::{
    Field, FieldKind, FieldValue, FieldWidget, FormAction, FormField, FormState, PanelContent,
    ScreenResult, VisiblePredicate,
};
pub use input::KeyInput;
pub use row::TableRow;
pub use state::{StateChange, StateManager, WatchHandle};
pub use table::{DisplayLine, MissingKey, SelectMode, TableEvent, TableState};
