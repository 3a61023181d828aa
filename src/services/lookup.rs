//! FormID lookup index.
//!
//! `{Game} FID Main.txt` is a large `plugin | formid | entry` dump. It is
//! loaded into `{Game} FormIDs.db` once; later runs reuse the database.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};

/// Whether the index was built during this call or already existed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    Built { rows: usize },
    Reused,
}

/// SQLite table of `(plugin, formid, entry)` rows for one game.
pub struct FormIdIndex {
    conn: Connection,
    table: String,
    origin: IndexOrigin,
}

impl std::fmt::Debug for FormIdIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormIdIndex")
            .field("table", &self.table)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl FormIdIndex {
    /// Open the index at `db_path`, building it from `source` when the database does not exist.
    ///
    /// # Arguments
    ///
    /// * `db_path` - SQLite database file
    /// * `source` - `plugin | formid | entry` text dump
    /// * `game` - Table name, e.g. `Fallout4`
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is not alphanumeric, the source is
    /// missing while the database is absent, or SQLite fails. A failed build
    /// removes the partial database so the next run retries.
    pub fn open_or_build(db_path: &Utf8Path, source: &Utf8Path, game: &str) -> Result<Self> {
        if game.is_empty() || !game.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!("Invalid FormID table name: {:?}", game);
        }

        if db_path.exists() {
            let conn = Connection::open(db_path)
                .with_context(|| format!("Failed to open FormID database: {}", db_path))?;
            tracing::debug!("Reusing FormID database {}", db_path);
            return Ok(Self {
                conn,
                table: game.to_string(),
                origin: IndexOrigin::Reused,
            });
        }

        if !source.exists() {
            bail!("FormID source file not found: {}", source);
        }

        match Self::build(db_path, source, game) {
            Ok(index) => Ok(index),
            Err(e) => {
                let _ = fs::remove_file(db_path);
                Err(e)
            }
        }
    }

    fn build(db_path: &Utf8Path, source: &Utf8Path, game: &str) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent))?;
        }
        let mut conn = Connection::open(db_path)
            .with_context(|| format!("Failed to create FormID database: {}", db_path))?;

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plugin TEXT,
                formid TEXT,
                entry TEXT
            );
            CREATE INDEX IF NOT EXISTS {table}_index ON {table}(formid, plugin COLLATE NOCASE);",
            table = game
        ))?;

        let file = File::open(source).with_context(|| format!("Failed to open FormID source: {}", source))?;
        let reader = BufReader::new(file);

        let tx = conn.transaction()?;
        let mut rows = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (plugin, formid, entry) VALUES (?1, ?2, ?3)",
                game
            ))?;
            for line in reader.split(b'\n') {
                let line = line.with_context(|| format!("Failed to read FormID source: {}", source))?;
                let line = String::from_utf8_lossy(&line);
                let Some((plugin, formid, entry)) = parse_line(&line) else {
                    continue;
                };
                stmt.execute(params![plugin, formid, entry])?;
                rows += 1;
            }
        }
        tx.commit()?;

        tracing::info!("Built FormID database {} with {} entries", db_path, rows);
        Ok(Self {
            conn,
            table: game.to_string(),
            origin: IndexOrigin::Built { rows },
        })
    }

    pub fn origin(&self) -> IndexOrigin {
        self.origin
    }

    /// Entry text for `formid` in `plugin` (plugin compared case-insensitively).
    pub fn lookup(&self, formid: &str, plugin: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT entry FROM {} WHERE formid = ?1 AND plugin = ?2 COLLATE NOCASE LIMIT 1",
            self.table
        ))?;
        let entry = stmt
            .query_row(params![formid, plugin], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(entry)
    }

    /// Number of rows in the table.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Split a `plugin | formid | entry` line; lines with fewer fields are skipped.
fn parse_line(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.split('|');
    let plugin = parts.next()?.trim();
    let formid = parts.next()?.trim();
    let entry = parts.next()?.trim();
    if plugin.is_empty() || formid.is_empty() {
        return None;
    }
    Some((plugin, formid, entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FID_MAIN: &str = "Fallout4.esm | 000014 | Player\r\nnot a record\nDLCRobot.esm | 000800 | Ada\n\nFallout4.esm|0001F4|Codsworth\n";

    #[test]
    fn test_build_then_reuse() {
        let temp_dir = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp_dir.path()).unwrap();
        let source = base.join("Fallout4 FID Main.txt");
        let db = base.join("databases/Fallout4 FormIDs.db");
        fs::write(&source, FID_MAIN).unwrap();

        let index = FormIdIndex::open_or_build(&db, &source, "Fallout4").unwrap();
        assert_eq!(index.origin(), IndexOrigin::Built { rows: 3 });
        assert_eq!(index.len().unwrap(), 3);
        assert_eq!(
            index.lookup("000014", "fallout4.ESM").unwrap(),
            Some("Player".to_string())
        );
        assert_eq!(index.lookup("000014", "DLCRobot.esm").unwrap(), None);
        drop(index);

        // The source is not read again once the database exists
        fs::remove_file(&source).unwrap();
        let index = FormIdIndex::open_or_build(&db, &source, "Fallout4").unwrap();
        assert_eq!(index.origin(), IndexOrigin::Reused);
        assert_eq!(index.lookup("0001F4", "Fallout4.esm").unwrap(), Some("Codsworth".to_string()));
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        let temp_dir = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp_dir.path()).unwrap();
        let err = FormIdIndex::open_or_build(&base.join("x.db"), &base.join("x.txt"), "Fallout4; DROP TABLE x")
            .unwrap_err();
        assert!(err.to_string().contains("Invalid FormID table name"));
    }

    #[test]
    fn test_missing_source_is_error_without_database() {
        let temp_dir = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp_dir.path()).unwrap();
        let db = base.join("Fallout4 FormIDs.db");

        assert!(FormIdIndex::open_or_build(&db, &base.join("missing.txt"), "Fallout4").is_err());
        assert!(!db.exists());
    }
}
