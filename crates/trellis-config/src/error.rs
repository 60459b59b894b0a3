//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from configuration load, decode, and persistence.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the backing file failed.
    #[error("config io at {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not valid JSON.
    ///
    /// Surfaced rather than swallowed: silently starting over discards the
    /// user's settings on the first typo in a hand-edited file.
    #[error("config at {path} is not valid JSON: {source}")]
    Parse {
        /// The file involved.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The backing file parses but its top level is not a JSON object.
    #[error("config at {path} must be a JSON object")]
    NotAnObject {
        /// The file involved.
        path: PathBuf,
    },

    /// The in-memory document could not be rendered as JSON text.
    #[error("config at {path} failed to serialize: {source}")]
    Serialize {
        /// The file involved.
        path: PathBuf,
        /// The underlying serialize error.
        #[source]
        source: serde_json::Error,
    },

    /// A stored value could not be decoded as the requested type.
    #[error("config key {key:?} holds an incompatible value: {source}")]
    Decode {
        /// The key being read.
        key: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("config key {key:?} rejected value: {source}")]
    Encode {
        /// The key being written.
        key: String,
        /// The underlying encode error.
        #[source]
        source: serde_json::Error,
    },
}
