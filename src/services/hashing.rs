use super::DiagnosticError;
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};

/// Lowercase hex SHA-256 of a file's contents, read in chunks.
pub fn sha256_file(path: &Utf8Path) -> Result<String, DiagnosticError> {
    let file = File::open(path).map_err(|e| DiagnosticError::from_io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| DiagnosticError::from_io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Outcome of comparing one file against its recorded fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintStatus {
    Match,
    Missing,
    Mismatch,
}

/// Expected versus discovered fingerprint of one file, produced during an integrity run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintRecord {
    /// File name as listed in the database
    pub target: String,
    pub expected: String,
    /// `None` when the file is absent or unreadable
    pub discovered: Option<String>,
}

impl FingerprintRecord {
    /// Hash `path` and pair it with the expected digest.
    pub fn inspect(target: impl Into<String>, expected: impl Into<String>, path: &Utf8Path) -> Self {
        let discovered = match sha256_file(path) {
            Ok(hash) => Some(hash),
            Err(DiagnosticError::MissingResource(_)) => None,
            Err(e) => {
                tracing::warn!("Could not hash {}: {}", path, e);
                None
            }
        };
        Self {
            target: target.into(),
            expected: expected.into(),
            discovered,
        }
    }

    pub fn status(&self) -> FingerprintStatus {
        match &self.discovered {
            None => FingerprintStatus::Missing,
            Some(hash) if hash.eq_ignore_ascii_case(self.expected.trim()) => FingerprintStatus::Match,
            Some(_) => FingerprintStatus::Mismatch,
        }
    }
}
