//! Hierarchical YAML configuration cache.
//!
//! [`ConfigStore`] is the single source of truth for every YAML-backed store
//! (Main, Settings, Ignore, Game, GameLocal). Each store's document is cached
//! together with the modification time observed when it was loaded; the cached
//! copy is reused until the file's mtime changes, at which point it is reloaded
//! before the next access.
//!
//! Values are addressed with dotted paths (`Section.Subsection.Key`) and read
//! back with total coercion: a missing key, a null leaf or an impossible
//! coercion all yield `None`, never an error.

pub mod document;
pub mod locator;

pub use document::ConfigDocument;
pub use locator::{DataLayout, StoreLocator};

use crate::metrics::Metrics;
use crate::models::{ConfigValue, FromConfigValue, YamlStore};
use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use thiserror::Error;

/// Dotted path of the Settings template inside the Main store
pub const DEFAULT_SETTINGS_KEY: &str = "CLASSIC_Info.default_settings";

/// Root section of the Settings store
pub const SETTINGS_SECTION: &str = "CLASSIC_Settings";

/// Errors raised by the configuration cache
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid default settings in the Main store, cannot create {path}")]
    FatalBootstrap { path: Utf8PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Failed to serialize YAML: {0}")]
    Serialize(#[from] serde_yaml_ng::Error),

    #[error("Cannot write {path}: segment '{segment}' already holds a {found}")]
    PathConflict {
        path: String,
        segment: String,
        found: &'static str,
    },

    #[error("Refusing to overwrite unreadable store file {path}")]
    Corrupt { path: Utf8PathBuf },

    #[error("Invalid dotted path '{0}'")]
    InvalidPath(String),
}

/// Cached state of one backing file
#[derive(Debug, Default)]
struct StoreEntry {
    document: ConfigDocument,
    /// Modification time observed at the last load or write, `None` when the file was absent
    modified: Option<SystemTime>,
    loaded: bool,
    /// The file exists but could not be read or parsed
    corrupt: bool,
    /// Settings file absent and not creatable from the Main template
    bootstrap_failed: bool,
}

/// Process-lifetime cache of YAML stores with dotted-path access.
///
/// Each backing file has its own lock, held across the
/// check-mtime / reload / mutate sequence so a reload can never race a write.
pub struct ConfigStore {
    locator: Arc<dyn StoreLocator>,
    entries: Mutex<HashMap<Utf8PathBuf, Arc<Mutex<StoreEntry>>>>,
    metrics: Arc<Metrics>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}

fn file_mtime(path: &Utf8Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

impl ConfigStore {
    /// Create a cache without touching the disk.
    pub fn new(locator: Arc<dyn StoreLocator>) -> Self {
        Self::with_metrics(locator, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(locator: Arc<dyn StoreLocator>, metrics: Arc<Metrics>) -> Self {
        Self {
            locator,
            entries: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    /// Create a cache and materialize the Settings store if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FatalBootstrap`] when the Settings file is missing
    /// and the Main store carries no default template for it.
    pub fn open(locator: Arc<dyn StoreLocator>) -> Result<Self, ConfigError> {
        let store = Self::new(locator);
        store.bootstrap_settings()?;
        Ok(store)
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Resolve the current backing file of `store`.
    pub fn path_for(&self, store: YamlStore) -> Utf8PathBuf {
        self.locator.locate(store)
    }

    /// Modification time recorded for the store's current backing file.
    pub fn cached_mtime(&self, store: YamlStore) -> Option<SystemTime> {
        let path = self.path_for(store);
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&path)?;
        let entry = entry.lock().unwrap_or_else(PoisonError::into_inner);
        entry.modified
    }

    /// Write the Settings file from the Main store's template when it does not exist.
    pub fn bootstrap_settings(&self) -> Result<(), ConfigError> {
        let path = self.path_for(YamlStore::Settings);
        if path.exists() {
            return Ok(());
        }

        let template = self
            .get::<String>(YamlStore::Main, DEFAULT_SETTINGS_KEY)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ConfigError::FatalBootstrap { path: path.clone() })?;

        write_file(&path, &template)?;
        self.metrics.record_disk_write();
        tracing::info!("Generated {} from default settings template", path);
        Ok(())
    }

    /// Read the leaf at `path`, coerced to `T`.
    ///
    /// Returns `None` when the file, any segment or the leaf is missing, or when
    /// the stored value cannot be coerced. Never creates the file.
    pub fn get<T: FromConfigValue>(&self, store: YamlStore, path: &str) -> Option<T> {
        self.with_entry(store, |entry, file| self.read_leaf(entry, file, path))
    }

    /// Write `value` at `path` and persist the whole document.
    ///
    /// The cached mtime is taken from the written file, so the next read does
    /// not reload it.
    pub fn set<T>(&self, store: YamlStore, path: &str, value: T) -> Result<T, ConfigError>
    where
        T: Into<ConfigValue> + Clone,
    {
        self.with_entry(store, |entry, file| {
            self.write_leaf(entry, file, path, value.clone().into())?;
            Ok(value)
        })
    }

    /// Read the leaf at `path`, storing `default` first when it is absent.
    ///
    /// A present value that cannot be coerced to `T` is left untouched and
    /// `default` is returned without writing.
    pub fn get_or_create<T>(&self, store: YamlStore, path: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromConfigValue + Into<ConfigValue> + Clone,
    {
        self.with_entry(store, |entry, file| {
            if entry.document.get(path).is_some() {
                return Ok(self.read_leaf(entry, file, path).unwrap_or(default));
            }
            self.write_leaf(entry, file, path, default.clone().into())?;
            Ok(default)
        })
    }

    /// `CLASSIC_Settings.{name}` from the Settings store
    pub fn setting<T: FromConfigValue>(&self, name: &str) -> Option<T> {
        self.get(YamlStore::Settings, &format!("{}.{}", SETTINGS_SECTION, name))
    }

    /// Update `CLASSIC_Settings.{name}` in the Settings store
    pub fn set_setting<T>(&self, name: &str, value: T) -> Result<T, ConfigError>
    where
        T: Into<ConfigValue> + Clone,
    {
        self.set(YamlStore::Settings, &format!("{}.{}", SETTINGS_SECTION, name), value)
    }

    /// Deserialize a whole store into a typed model.
    ///
    /// Returns `None` (and logs) when the document does not match `T`.
    pub fn document_as<T: DeserializeOwned>(&self, store: YamlStore) -> Option<T> {
        self.with_entry(store, |entry, file| {
            match serde_yaml_ng::from_value(entry.document.to_value()) {
                Ok(typed) => Some(typed),
                Err(e) => {
                    tracing::warn!("{} does not match the expected layout: {}", file, e);
                    None
                }
            }
        })
    }

    /// Run `f` on the refreshed entry of `store` while holding its lock.
    fn with_entry<R>(&self, store: YamlStore, f: impl FnOnce(&mut StoreEntry, &Utf8Path) -> R) -> R {
        let path = self.path_for(store);
        let mut bootstrap_failed = false;
        if store == YamlStore::Settings && !path.exists() {
            if let Err(e) = self.bootstrap_settings() {
                tracing::error!("Settings store unavailable: {}", e);
                bootstrap_failed = true;
            }
        }

        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(path.clone()).or_default())
        };
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        self.refresh(&mut entry, &path);
        entry.bootstrap_failed = bootstrap_failed;
        f(&mut entry, &path)
    }

    /// Reload the cached document iff the file's mtime differs from the recorded one.
    fn refresh(&self, entry: &mut StoreEntry, path: &Utf8Path) {
        let current = file_mtime(path);
        if entry.loaded && entry.modified == current {
            self.metrics.record_cache_hit();
            return;
        }

        entry.loaded = true;
        entry.modified = current;
        entry.corrupt = false;
        entry.document = ConfigDocument::new();

        if current.is_none() {
            tracing::debug!("Store file {} does not exist, using an empty document", path);
            return;
        }

        self.metrics.record_cache_reload();
        match fs::read_to_string(path) {
            Ok(text) => match ConfigDocument::parse(&text) {
                Ok(document) => {
                    tracing::debug!("Loaded store file {}", path);
                    entry.document = document;
                }
                Err(source) => {
                    let err = ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    };
                    tracing::error!("{}; treating store as empty", err);
                    entry.corrupt = true;
                }
            },
            Err(source) => {
                let err = ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::error!("{}; treating store as empty", err);
                entry.corrupt = true;
            }
        }
    }

    fn read_leaf<T: FromConfigValue>(&self, entry: &StoreEntry, file: &Utf8Path, path: &str) -> Option<T> {
        let value = entry.document.get(path)?;
        let coerced = T::from_config_value(value);
        if coerced.is_none() {
            self.metrics.record_coercion_failure();
            tracing::warn!(
                "Cannot coerce {} at '{}' in {} to {}",
                value.kind(),
                path,
                file,
                std::any::type_name::<T>()
            );
        }
        coerced
    }

    fn write_leaf(
        &self,
        entry: &mut StoreEntry,
        file: &Utf8Path,
        path: &str,
        value: ConfigValue,
    ) -> Result<(), ConfigError> {
        if entry.corrupt {
            return Err(ConfigError::Corrupt {
                path: file.to_path_buf(),
            });
        }
        if entry.bootstrap_failed {
            return Err(ConfigError::FatalBootstrap {
                path: file.to_path_buf(),
            });
        }

        let mut updated = entry.document.clone();
        if !updated.set(path, value)? {
            return Ok(());
        }

        let text = updated.to_yaml_string()?;
        write_file(file, &text)?;
        self.metrics.record_disk_write();

        entry.document = updated;
        entry.modified = file_mtime(file);
        tracing::debug!("Persisted '{}' to {}", path, file);
        Ok(())
    }
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    fs::write(path, contents).map_err(io_err)
}
