//! The on-disk key/value store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::ConfigError;

/// A JSON-backed key/value store, persisted on every mutation.
///
/// Values round-trip through `serde_json::Value`, so any `Serialize` type
/// can be stored and read back as any compatible `Deserialize` type.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl ConfigManager {
    /// Open the store at `path`, loading the existing document if present.
    ///
    /// A missing file yields an empty store; the file is created on first
    /// write. A present-but-corrupt file is an error, not an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => parse_document(&path, &text)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, starting empty");
                Map::new()
            },
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Ok(Self { path, entries })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the value under `key`, if present.
    ///
    /// `Ok(None)` for an absent key; [`ConfigError::Decode`] when the stored
    /// value does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| ConfigError::Decode { key: key.to_owned(), source }),
        }
    }

    /// Decode the value under `key`, falling back to `default` when the key
    /// is absent or the stored value does not fit `T`.
    ///
    /// Decode failures log at warn level; a hand-edited bad value should not
    /// take the whole tool down on a read path.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(error) => {
                tracing::warn!(%error, key, "falling back to default");
                default
            },
        }
    }

    /// Store `value` under `key` and persist the document.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), ConfigError> {
        let key = key.into();
        let value = serde_json::to_value(value)
            .map_err(|source| ConfigError::Encode { key: key.clone(), source })?;
        self.entries.insert(key, value);
        self.save()
    }

    /// Remove `key`, persisting only if it was present. Returns whether it
    /// was.
    pub fn remove(&mut self, key: &str) -> Result<bool, ConfigError> {
        if self.entries.remove(key).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Whether `key` has a stored value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Discard in-memory state and re-read the backing file.
    ///
    /// Under concurrent writers this adopts whatever the last writer
    /// persisted.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        *self = Self::open(self.path.clone())?;
        Ok(())
    }

    /// Persist the full document atomically.
    ///
    /// Writes a sibling temp file, then renames it over the target. The
    /// rename stays on one filesystem, so it is atomic on every platform
    /// this runs on.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Io { path: parent.to_path_buf(), source })?;
        }

        let text = serde_json::to_string_pretty(&Value::Object(self.entries.clone()))
            .map_err(|source| ConfigError::Serialize { path: self.path.clone(), source })?;

        let tmp = temp_sibling(&self.path);
        fs::write(&tmp, text)
            .map_err(|source| ConfigError::Io { path: tmp.clone(), source })?;
        fs::rename(&tmp, &self.path).map_err(|source| {
            // Leave no stray temp file behind on failure.
            let _ = fs::remove_file(&tmp);
            ConfigError::Io { path: self.path.clone(), source }
        })?;

        tracing::debug!(path = %self.path.display(), keys = self.entries.len(), "config saved");
        Ok(())
    }
}

fn parse_document(path: &Path, text: &str) -> Result<Map<String, Value>, ConfigError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    match value {
        Value::Object(entries) => Ok(entries),
        _ => Err(ConfigError::NotAnObject { path: path.to_path_buf() }),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
