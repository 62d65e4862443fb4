//! JSON persistence for the entity mappings.
//!
//! Each entity type lives in one pretty-printed JSON document mapping
//! string identifiers to records. Files are rewritten whole after every
//! mutation; there is no locking and no atomic rename, so a crash mid-save
//! may truncate the file. Load failures downgrade to an empty mapping and
//! leave the on-disk file untouched.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Failures raised by [`JsonStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Io(String),
    Parse(String),
    Serialize(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "IO error: {msg}"),
            StoreError::Parse(msg) => write!(f, "Parse error: {msg}"),
            StoreError::Serialize(msg) => write!(f, "Serialize error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Directory paths for the application's persisted state.
///
/// Only `main` should construct this from the process environment; all
/// other code receives it by parameter passing, so tests can point the
/// whole application at an isolated temp directory.
#[derive(Debug, Clone)]
pub struct DataContext {
    data_dir: PathBuf,
}

impl DataContext {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Create a DataContext rooted in a temp directory (for tests).
    pub fn for_testing(dir: &Path) -> Self {
        Self {
            data_dir: dir.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn products_path(&self) -> PathBuf {
        self.data_dir.join("products.json")
    }

    pub fn customers_path(&self) -> PathBuf {
        self.data_dir.join("customers.json")
    }

    pub fn receipts_path(&self) -> PathBuf {
        self.data_dir.join("receipts.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("till.log")
    }
}

/// Load/save of a `BTreeMap<String, T>` backed by a single JSON file.
#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    _record: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> JsonStore<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the mapping, treating a missing file as empty.
    pub fn load(&self) -> Result<BTreeMap<String, T>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| StoreError::Parse(format!("{}: {}", self.path.display(), e)))
    }

    /// Lenient load: on read or parse failure, log a warning and start
    /// with an empty mapping. The file itself is left untouched until the
    /// next successful save.
    pub fn load_or_default(&self) -> BTreeMap<String, T> {
        match self.load() {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("failed to load {}: {e}; starting empty", self.path.display());
                BTreeMap::new()
            }
        }
    }

    /// Serialize the full mapping and overwrite the file, creating the
    /// parent directory if needed.
    pub fn save(&self, map: &BTreeMap<String, T>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("{}: {}", parent.display(), e)))?;
        }

        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        std::fs::write(&self.path, json)
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))
    }
}
