use super::DiagnosticError;
use camino::Utf8Path;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Include patterns used when the Main store carries no `catch_log_errors` list
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["critical", "error", "failed"];

/// Exclude patterns used when the Main store carries no `exclude_log_errors` list
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "failed to get next record",
    "failed to open pdb",
    "failed to register method",
    "keybind",
    "no errors with this",
    "unable to locate pdb",
];

/// One line that matched an include pattern and no exclude pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMatch {
    /// 1-based line number
    pub line_number: usize,
    /// The raw line without its line terminator
    pub line: String,
    /// The include pattern that matched, as configured
    pub pattern: String,
}

impl LogMatch {
    pub fn trimmed(&self) -> &str {
        self.line.trim()
    }
}

/// Case-insensitive substring filter over log lines.
///
/// A line survives when it contains at least one include pattern and none of
/// the exclude patterns. Empty patterns are ignored.
#[derive(Debug, Clone, Default)]
pub struct LogScanner {
    /// (as configured, lowercased)
    include: Vec<(String, String)>,
    exclude: Vec<String>,
}

impl LogScanner {
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let include = include
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .map(|p| {
                let lower = p.to_lowercase();
                (p, lower)
            })
            .collect();
        let exclude = exclude
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { include, exclude }
    }

    /// Scanner with the built-in pattern lists.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_INCLUDE_PATTERNS, DEFAULT_EXCLUDE_PATTERNS)
    }

    /// Return the include pattern that `line` matches, if the line survives filtering.
    pub fn match_line(&self, line: &str) -> Option<&str> {
        let lower = line.to_lowercase();
        if self.exclude.iter().any(|p| lower.contains(p.as_str())) {
            return None;
        }
        self.include
            .iter()
            .find(|(_, p)| lower.contains(p.as_str()))
            .map(|(original, _)| original.as_str())
    }

    /// Open `path` and lazily yield the surviving lines.
    ///
    /// Each call opens the file afresh, so scans are restartable.
    pub fn scan(&self, path: &Utf8Path) -> Result<LogMatches<'_, BufReader<File>>, DiagnosticError> {
        let file = File::open(path).map_err(|e| DiagnosticError::from_io(path, e))?;
        Ok(self.scan_reader(BufReader::new(file)))
    }

    /// Lazily yield the surviving lines of `reader`.
    pub fn scan_reader<R: BufRead>(&self, reader: R) -> LogMatches<'_, R> {
        LogMatches {
            scanner: self,
            reader,
            buffer: Vec::new(),
            line_number: 0,
        }
    }
}

/// Streaming iterator over matching lines.
///
/// Invalid UTF-8 is replaced rather than rejected. A read error ends the
/// iteration after logging it.
pub struct LogMatches<'a, R> {
    scanner: &'a LogScanner,
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> Iterator for LogMatches<'_, R> {
    type Item = LogMatch;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Stopped reading log after line {}: {}", self.line_number, e);
                    return None;
                }
            }
            self.line_number += 1;

            let line = String::from_utf8_lossy(&self.buffer);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(pattern) = self.scanner.match_line(line) {
                return Some(LogMatch {
                    line_number: self.line_number,
                    line: line.to_string(),
                    pattern: pattern.to_string(),
                });
            }
        }
    }
}

/// First line of a text file, `None` for an empty file.
pub fn read_first_line(path: &Utf8Path) -> Result<Option<String>, DiagnosticError> {
    let file = File::open(path).map_err(|e| DiagnosticError::from_io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    let read = reader
        .read_until(b'\n', &mut buffer)
        .map_err(|e| DiagnosticError::from_io(path, e))?;
    if read == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buffer);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}
