//! Script extender and game executable integrity checks.
//!
//! Static facts (expected hashes, latest version markers, warning texts) come
//! from the Game and Main stores; discovered paths come from GameLocal. Every
//! check returns report messages and never fails: a missing or unreadable
//! input becomes a caution in the report.

use super::DiagnosticError;
use super::hashing::{FingerprintRecord, FingerprintStatus, sha256_file};
use super::log_scan::{self, LogScanner};
use crate::config::ConfigStore;
use crate::models::{DiagnosticMessage, GameVars, YamlStore};
use crate::state::ContextManager;
use camino::Utf8PathBuf;
use indexmap::IndexMap;

const WARN_SCRIPTS_MISSING: &str = "❌ CAUTION : Some Script Extender files are missing from your game Scripts folder!\n  Reinstall the Script Extender and make sure its Data folder contents are copied to your game folder.";
const WARN_SCRIPTS_MISMATCH: &str = "[!] CAUTION : Some Script Extender files are outdated or overridden by another mod!\n  Reinstall the Script Extender and check which mod overwrites its script files.";
const WARN_XSE_OUTDATED: &str = "❌ CAUTION : Your Script Extender is outdated! Download and install the latest version.";
const WARN_ADLIB_MISSING: &str = "❌ CAUTION : *Address Library* for Script Extender is not installed or could not be found!\n  Install it from the Nexus so Script Extender plugins can run.";
const WARN_ROOT_PATH: &str = "❌ CAUTION : Your game files are installed inside the Program Files folder!\n  Move the game outside of Program Files to avoid permission problems with mods.";

/// Runs the script extender and executable checks for the active game.
pub struct IntegrityChecker<'a> {
    store: &'a ConfigStore,
    context: ContextManager,
}

impl<'a> IntegrityChecker<'a> {
    pub fn new(store: &'a ConfigStore, context: ContextManager) -> Self {
        Self { store, context }
    }

    /// Fingerprint every script listed in `XSE_HashedScripts`.
    ///
    /// # Errors
    ///
    /// [`DiagnosticError::MissingSetting`] when the expected hashes or the
    /// Scripts folder are unknown.
    pub fn script_fingerprints(&self) -> Result<Vec<FingerprintRecord>, DiagnosticError> {
        let vars = self.context.snapshot();
        let hashes_key = vars.info_key("XSE_HashedScripts");
        let expected = self
            .store
            .get::<IndexMap<String, String>>(YamlStore::Game, &hashes_key)
            .ok_or_else(|| DiagnosticError::MissingSetting {
                store: YamlStore::Game,
                key: hashes_key.clone(),
            })?;

        let scripts_key = vars.info_key("Game_Folder_Scripts");
        let scripts = self
            .store
            .get::<Utf8PathBuf>(YamlStore::GameLocal, &scripts_key)
            .ok_or(DiagnosticError::MissingSetting {
                store: YamlStore::GameLocal,
                key: scripts_key,
            })?;

        Ok(expected
            .into_iter()
            .map(|(file, hash)| {
                let path = scripts.join(&file);
                FingerprintRecord::inspect(file, hash, &path)
            })
            .collect())
    }

    /// Compare the script extender's script files against their recorded hashes.
    ///
    /// Produces one combined block listing every missing or mismatched file,
    /// followed by a single rollup message.
    pub fn check_xse_hashes(&self) -> Vec<DiagnosticMessage> {
        tracing::info!("- - - INITIATED XSE FILE HASH CHECK");
        self.store.metrics().record_check();

        let records = match self.script_fingerprints() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Skipping script hash check: {}", e);
                return vec![DiagnosticMessage::caution(format!(
                    "CLASSIC could not check your Script Extender files: {}",
                    e
                ))];
            }
        };

        let mut problems = Vec::new();
        let mut missing = false;
        let mut mismatch = false;
        for record in &records {
            match record.status() {
                FingerprintStatus::Match => {}
                FingerprintStatus::Missing => {
                    missing = true;
                    problems.push(format!(
                        "❌ CAUTION : {} Script Extender file is missing from your game Scripts folder!",
                        record.target
                    ));
                }
                FingerprintStatus::Mismatch => {
                    mismatch = true;
                    problems.push(format!(
                        "[!] CAUTION : {} Script Extender file is outdated or overridden by another mod!",
                        record.target
                    ));
                }
            }
        }

        let mut messages = Vec::new();
        if !problems.is_empty() {
            messages.push(DiagnosticMessage::from_text(problems.join("\n")));
        }
        if missing {
            messages.push(self.warning_text("Warnings_XSE.Warn_Missing", WARN_SCRIPTS_MISSING));
        }
        if mismatch {
            messages.push(self.warning_text("Warnings_XSE.Warn_Mismatch", WARN_SCRIPTS_MISMATCH));
        }
        if !missing && !mismatch {
            messages.push(DiagnosticMessage::success(
                "All Script Extender files have been found and accounted for!",
            ));
        }
        messages
    }

    /// Check the Address Library, the script extender log and its reported version,
    /// then list the log's error lines.
    pub fn check_xse_integrity(&self) -> Vec<DiagnosticMessage> {
        tracing::info!("- - - INITIATED XSE INTEGRITY CHECK");
        self.store.metrics().record_check();

        let vars = self.context.snapshot();
        let mut messages = Vec::new();

        let address_library_key = vars.info_key("Game_File_AddressLib");
        if let Some(address_library) = self
            .store
            .get::<Utf8PathBuf>(YamlStore::GameLocal, &address_library_key)
        {
            if address_library.is_file() {
                messages.push(DiagnosticMessage::success(
                    "REQUIRED: *Address Library* for Script Extender is installed!",
                ));
            } else {
                messages.push(self.warning_text("Warnings_MODS.Warn_ADLIB_Missing", WARN_ADLIB_MISSING));
            }
        }

        let acronym = self
            .game_fact(&vars, "XSE_Acronym")
            .unwrap_or_else(|| "XSE".to_string());
        let full_name = self
            .game_fact(&vars, "XSE_FullName")
            .unwrap_or_else(|| acronym.clone());
        let log_missing = || {
            DiagnosticMessage::caution(format!(
                "*{acr}.log* FILE IS MISSING FROM YOUR DOCUMENTS FOLDER!\n   You need to run the game at least once with {acr}_loader.exe\n    After that, try running CLASSIC again!",
                acr = acronym.to_lowercase()
            ))
        };

        let Some(log_file) = self
            .store
            .get::<Utf8PathBuf>(YamlStore::GameLocal, &vars.info_key("Docs_File_XSE"))
        else {
            messages.push(log_missing());
            return messages;
        };

        let first_line = match log_scan::read_first_line(&log_file) {
            Ok(line) => line.unwrap_or_default(),
            Err(DiagnosticError::MissingResource(_)) => {
                messages.push(log_missing());
                return messages;
            }
            Err(e) => {
                tracing::warn!("Could not read {}: {}", log_file, e);
                messages.push(DiagnosticMessage::caution(format!(
                    "CLASSIC could not read {}: {}",
                    log_file, e
                )));
                return messages;
            }
        };

        messages.push(DiagnosticMessage::success(format!(
            "REQUIRED: *{}* is installed!",
            full_name
        )));

        match self.game_fact(&vars, "XSE_Ver_Latest") {
            Some(latest) if first_line.contains(latest.as_str()) => {
                messages.push(DiagnosticMessage::success(format!(
                    "You have the latest version of *{}*!",
                    full_name
                )));
            }
            Some(_) => messages.push(self.warning_text("Warnings_XSE.Warn_Outdated", WARN_XSE_OUTDATED)),
            None => tracing::warn!("No latest {} version recorded, skipping version check", acronym),
        }

        let scanner = self.log_scanner();
        match scanner.scan(&log_file) {
            Ok(matches) => {
                let failures: Vec<DiagnosticMessage> = matches
                    .map(|m| DiagnosticMessage::failure_line(m.trimmed()))
                    .collect();
                if !failures.is_empty() {
                    tracing::info!("{} reports {} error lines", log_file, failures.len());
                    messages.push(DiagnosticMessage::from_text(format!(
                        "#❌ CAUTION : {}.log REPORTS THE FOLLOWING ERRORS #",
                        acronym
                    )));
                    messages.extend(failures);
                }
            }
            Err(e) => {
                tracing::warn!("Could not scan {}: {}", log_file, e);
                messages.push(DiagnosticMessage::caution(format!(
                    "CLASSIC could not scan {} for errors: {}",
                    log_file, e
                )));
            }
        }

        messages
    }

    /// Check the game executable's version and install location.
    ///
    /// The executable counts as up to date only when its hash equals the
    /// recorded `EXE_HashedOLD` value and no `steam_api.ini` is present.
    pub fn check_game_integrity(&self) -> Vec<DiagnosticMessage> {
        tracing::info!("- - - INITIATED GAME INTEGRITY CHECK");
        self.store.metrics().record_check();

        let vars = self.context.snapshot();
        let root_name = self
            .game_fact(&vars, "Main_Root_Name")
            .unwrap_or_else(|| vars.game.clone());

        let Some(exe) = self
            .store
            .get::<Utf8PathBuf>(YamlStore::GameLocal, &vars.info_key("Game_File_EXE"))
        else {
            return vec![DiagnosticMessage::caution(format!(
                "The location of {} is unknown, CLASSIC cannot check your game version!",
                vars.exe_name()
            ))];
        };

        let exe_hash = match sha256_file(&exe) {
            Ok(hash) => hash,
            Err(DiagnosticError::MissingResource(_)) => {
                return vec![DiagnosticMessage::caution(format!(
                    "{} is missing from your game folder!",
                    vars.exe_name()
                ))];
            }
            Err(e) => {
                tracing::warn!("Could not hash {}: {}", exe, e);
                return vec![DiagnosticMessage::caution(format!(
                    "CLASSIC could not read {}: {}",
                    exe, e
                ))];
            }
        };

        let mut messages = Vec::new();
        let expected = self.game_fact(&vars, "EXE_HashedOLD");
        let steam_ini_present = self
            .store
            .get::<Utf8PathBuf>(YamlStore::GameLocal, &vars.info_key("Game_File_SteamINI"))
            .is_some_and(|ini| ini.exists());

        if expected.as_deref() == Some(exe_hash.as_str()) && !steam_ini_present {
            messages.push(DiagnosticMessage::success(format!(
                "You have the latest version of {}!",
                root_name
            )));
        } else {
            messages.push(DiagnosticMessage::caution(format!(
                "YOUR {} GAME / EXE VERSION IS OUT OF DATE",
                root_name
            )));
        }

        if exe.as_str().contains("Program Files") {
            messages.push(self.warning_text("Warnings_GAME.warn_root_path", WARN_ROOT_PATH));
        } else {
            messages.push(DiagnosticMessage::success(format!(
                "Your {} game files are installed outside of the Program Files folder!",
                root_name
            )));
        }

        messages
    }

    /// Scanner configured from `catch_log_errors` / `exclude_log_errors`.
    pub fn log_scanner(&self) -> LogScanner {
        let include = self
            .store
            .get::<Vec<String>>(YamlStore::Main, "catch_log_errors")
            .filter(|patterns| !patterns.is_empty());
        let exclude = self
            .store
            .get::<Vec<String>>(YamlStore::Main, "exclude_log_errors")
            .filter(|patterns| !patterns.is_empty());

        match (include, exclude) {
            (Some(include), Some(exclude)) => LogScanner::new(include, exclude),
            (Some(include), None) => LogScanner::new(include, log_scan::DEFAULT_EXCLUDE_PATTERNS),
            (None, Some(exclude)) => LogScanner::new(log_scan::DEFAULT_INCLUDE_PATTERNS, exclude),
            (None, None) => LogScanner::with_defaults(),
        }
    }

    /// Per-variant fact from the Game store, falling back to GameLocal.
    fn game_fact(&self, vars: &GameVars, key: &str) -> Option<String> {
        let path = vars.info_key(key);
        self.store
            .get::<String>(YamlStore::Game, &path)
            .or_else(|| self.store.get::<String>(YamlStore::GameLocal, &path))
            .filter(|value| !value.trim().is_empty())
    }

    /// Preformatted warning text from the Game or Main store.
    fn warning_text(&self, path: &str, fallback: &str) -> DiagnosticMessage {
        let text = self
            .store
            .get::<String>(YamlStore::Game, path)
            .or_else(|| self.store.get::<String>(YamlStore::Main, path))
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        DiagnosticMessage::from_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use camino::Utf8Path;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    // sha256("abc")
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    fn create_store(temp_dir: &TempDir) -> (ConfigStore, Utf8PathBuf) {
        let base = Utf8Path::from_path(temp_dir.path()).unwrap().to_path_buf();
        let root = base.clone();
        let store = ConfigStore::new(Arc::new(move |store: YamlStore| root.join(format!("{}.yaml", store))));
        (store, base)
    }

    #[test]
    fn test_game_integrity_up_to_date() {
        let temp_dir = TempDir::new().unwrap();
        let (store, base) = create_store(&temp_dir);
        let exe = base.join("Games/Fallout 4/Fallout4.exe");
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, "abc").unwrap();

        fs::write(
            base.join("Game.yaml"),
            format!("Game_Info:\n  Main_Root_Name: Fallout 4\n  EXE_HashedOLD: {}\n", ABC_SHA256),
        )
        .unwrap();
        store
            .set(YamlStore::GameLocal, "Game_Info.Game_File_EXE", exe.as_str())
            .unwrap();
        store
            .set(
                YamlStore::GameLocal,
                "Game_Info.Game_File_SteamINI",
                base.join("Games/Fallout 4/steam_api.ini").as_str(),
            )
            .unwrap();

        let checker = IntegrityChecker::new(&store, ContextManager::default());
        let messages = checker.check_game_integrity();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "✔️ You have the latest version of Fallout 4!");
        assert_eq!(messages[1].severity, Severity::Success);
    }

    #[test]
    fn test_game_integrity_steam_ini_marks_out_of_date() {
        let temp_dir = TempDir::new().unwrap();
        let (store, base) = create_store(&temp_dir);
        let exe = base.join("Fallout4.exe");
        fs::write(&exe, "abc").unwrap();
        let steam_ini = base.join("steam_api.ini");
        fs::write(&steam_ini, "[Settings]\n").unwrap();

        fs::write(
            base.join("Game.yaml"),
            format!("Game_Info:\n  Main_Root_Name: Fallout 4\n  EXE_HashedOLD: {}\n", ABC_SHA256),
        )
        .unwrap();
        store
            .set(YamlStore::GameLocal, "Game_Info.Game_File_EXE", exe.as_str())
            .unwrap();
        store
            .set(YamlStore::GameLocal, "Game_Info.Game_File_SteamINI", steam_ini.as_str())
            .unwrap();

        let checker = IntegrityChecker::new(&store, ContextManager::default());
        let messages = checker.check_game_integrity();

        // A matching hash still reports out of date while steam_api.ini exists
        assert_eq!(
            messages[0].text,
            "❌ CAUTION : YOUR Fallout 4 GAME / EXE VERSION IS OUT OF DATE"
        );
    }

    #[test]
    fn test_game_integrity_unknown_exe() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _base) = create_store(&temp_dir);

        let checker = IntegrityChecker::new(&store, ContextManager::default());
        let messages = checker.check_game_integrity();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Caution);
    }

    #[test]
    fn test_hash_check_without_database_is_caution() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _base) = create_store(&temp_dir);

        let checker = IntegrityChecker::new(&store, ContextManager::default());
        let messages = checker.check_xse_hashes();

        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.contains("XSE_HashedScripts"));
    }

    #[test]
    fn test_log_scanner_uses_store_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let (store, base) = create_store(&temp_dir);
        fs::write(
            base.join("Main.yaml"),
            "catch_log_errors: [critical, error]\nexclude_log_errors: [harmless]\n",
        )
        .unwrap();

        let scanner = IntegrityChecker::new(&store, ContextManager::default()).log_scanner();
        assert_eq!(scanner.match_line("harmless error"), None);
        assert_eq!(scanner.match_line("Critical failure"), Some("critical"));
        assert_eq!(scanner.match_line("failed to start"), None);
    }
}
