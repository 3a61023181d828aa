use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::time::{Duration, SystemTime};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Journal file written next to the executable
pub const JOURNAL_FILE: &str = "CLASSIC Journal.log";

/// Delete the journal when it is older than `max_age_days`.
///
/// The age is taken from the file's modification time.
///
/// # Returns
/// `true` if the journal was deleted
pub fn expire_journal(journal: &Utf8Path, max_age_days: u64) -> Result<bool> {
    let Ok(metadata) = fs::metadata(journal) else {
        return Ok(false);
    };
    let modified = metadata
        .modified()
        .with_context(|| format!("Failed to read modification time of {}", journal))?;
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);

    if age <= Duration::from_secs(max_age_days * 24 * 60 * 60) {
        return Ok(false);
    }

    fs::remove_file(journal).with_context(|| format!("Failed to delete expired journal: {}", journal))?;
    Ok(true)
}

/// Setup logging to the CLASSIC journal, with optional console output.
///
/// The journal is appended to across runs and expired by
/// [`expire_journal`] rather than rotated by date. `RUST_LOG` overrides the
/// level chosen by `debug_mode`.
///
/// # Arguments
/// * `log_dir` - Directory holding the journal
/// * `debug_mode` - If true, use debug level; otherwise use info level
/// * `console_output` - If true, also log to stderr
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(
    log_dir: &Utf8Path,
    debug_mode: bool,
    console_output: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }

    let file_appender = rolling::never(log_dir, JOURNAL_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if debug_mode { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, debug={}, console={}",
        log_dir,
        debug_mode,
        console_output
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_journal_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Utf8Path::from_path(temp_dir.path()).unwrap().join(JOURNAL_FILE);
        fs::write(&journal, "2026-10-18 INFO started\n").unwrap();

        assert!(!expire_journal(&journal, 7).unwrap());
        assert!(journal.exists());
    }

    #[test]
    fn test_zero_day_expiry_deletes_old_journal() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Utf8Path::from_path(temp_dir.path()).unwrap().join(JOURNAL_FILE);
        fs::write(&journal, "old\n").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert!(expire_journal(&journal, 0).unwrap());
        assert!(!journal.exists());
    }

    #[test]
    fn test_missing_journal_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Utf8Path::from_path(temp_dir.path()).unwrap().join(JOURNAL_FILE);
        assert!(!expire_journal(&journal, 7).unwrap());
    }

    #[test]
    fn test_log_directory_created() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = Utf8Path::from_path(temp_dir.path()).unwrap().join("logs");

        // A second global subscriber may already exist in this test process;
        // the directory is created before that matters.
        let _ = setup_logging(&log_dir, false, false);

        assert!(log_dir.exists());
    }
}
