//! Durable key-value storage
//!
//! Every key maps to one pretty-printed JSON document under the data
//! directory:
//!
//! - `<data_dir>/<ledger_key>.json` - depositor totals
//! - `<data_dir>/<claims_key>.json` - last claim allocation snapshot
//!
//! Writes go to a sibling `.tmp` file first and are renamed into place, so a
//! crash mid-write leaves the previous document intact.

use crate::{
    error::{Error, Result},
    Config,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const FILE_EXTENSION: &str = "json";

/// True if `key` can name a document under the storage root
///
/// Keys are file stems; anything that could escape the root is refused.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !key.starts_with('.')
}

/// Storage backed by a directory of JSON documents
#[derive(Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Open or create the data directory
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_dir(&config.data_dir)
    }

    /// Open or create storage rooted at `path`
    pub fn open_dir(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        tracing::info!("Opened deposit storage at {:?}", root);

        Ok(Self { root })
    }

    /// Storage root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the object stored under `key`; `None` if it was never written
    pub fn read_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&content)?;
        Ok(Some(value))
    }

    /// Replace the object stored under `key`
    pub fn write_object<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(value)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;

        tracing::debug!(key, path = %path.display(), "Object written");

        Ok(())
    }

    /// True if an object has been written under `key`
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.path_for(key)?.exists())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            return Err(Error::Storage(format!("Invalid storage key '{}'", key)));
        }

        Ok(self.root.join(format!("{}.{}", key, FILE_EXTENSION)))
    }
}
