//! Services module - the diagnostic pipeline.
//!
//! Every service reads and writes configuration through a shared
//! [`ConfigStore`](crate::config::ConfigStore) handle and reports its findings
//! as ordered [`DiagnosticMessage`](crate::models::DiagnosticMessage) lists.
//! Failures inside a check become messages; nothing here aborts a run.
//!
//! # Components
//!
//! - [`PathResolver`]: discovers and persists the game and documents folders
//!   ([`FolderProbe`] strategies per platform, [`PathPrompt`] as the last resort)
//! - [`IntegrityChecker`]: script extender hashes, script extender log/version, game executable
//! - [`LogScanner`]: case-insensitive include/exclude line matching over a log file
//! - [`DocsChecker`]: documents folder and game INI checks, including the archive invalidation repair
//! - [`ReportAggregator`]: runs the checks in fixed order and collects one [`Report`]
//! - [`UpdateRequest`]: optional, non-fatal online version check
//! - [`FormIdIndex`]: SQLite lookup table built once from the FormID text dump

pub mod docs;
pub mod files;
pub mod hashing;
pub mod integrity;
pub mod log_scan;
pub mod lookup;
pub mod paths;
pub mod probe;
pub mod prompt;
pub mod report;
pub mod update;

pub use docs::DocsChecker;
pub use files::generate_default_files;
pub use hashing::{FingerprintRecord, FingerprintStatus, sha256_file};
pub use integrity::IntegrityChecker;
pub use log_scan::{LogMatch, LogScanner};
pub use lookup::FormIdIndex;
pub use paths::{DocsPaths, GamePaths, PathResolver};
pub use probe::{FolderProbe, Platform, ProbeRequest};
pub use prompt::{ConsolePrompt, NonInteractivePrompt, PathPrompt, PromptRequest};
pub use report::{Report, ReportAggregator};
pub use update::{GitHubReleases, UpdateRequest, VersionSource};

use crate::config::ConfigError;
use crate::models::YamlStore;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Failure taxonomy of the diagnostic pipeline
#[derive(Error, Debug)]
pub enum DiagnosticError {
    #[error("{0} not found")]
    MissingResource(Utf8PathBuf),

    #[error("Access to {0} was denied")]
    PermissionDenied(Utf8PathBuf),

    #[error("{path} is corrupt or unparseable: {reason}")]
    CorruptOrUnparseable { path: Utf8PathBuf, reason: String },

    #[error("Cannot start: {0}")]
    FatalBootstrap(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Cannot proceed: no {what} could be located and no interactive input is available")]
    Unresolved { what: String },

    #[error("{key} is not set in the {store} store")]
    MissingSetting { store: YamlStore, key: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DiagnosticError {
    /// Classify an I/O failure on `path`.
    pub fn from_io(path: &Utf8Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => DiagnosticError::MissingResource(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                DiagnosticError::PermissionDenied(path.to_path_buf())
            }
            _ => DiagnosticError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
