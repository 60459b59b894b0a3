//! Persistent configuration for Trellis tools
//!
//! A flat key/value store over a single JSON document on disk. Every
//! mutation rewrites the whole document through a temp-file-and-rename
//! sequence, so a crash mid-write leaves either the old file or the new one,
//! never a torn mix.
//!
//! Concurrency across processes is last-writer-wins at file granularity;
//! there is no cross-process locking.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod store;

pub use error::ConfigError;
pub use store::ConfigManager;
