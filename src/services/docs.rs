//! Documents folder and game INI checks.
//!
//! The custom INI (`{Docs Name}Custom.ini`) must carry an `[Archive]` section
//! for loose files to load. When it is missing the section is appended in
//! place; when the custom INI does not exist it is created from the
//! `Default_CustomINI` template. A read-only INI is never modified.

use super::DiagnosticError;
use crate::config::ConfigStore;
use crate::models::{DiagnosticMessage, GameVars, YamlStore};
use crate::state::ContextManager;
use camino::{Utf8Path, Utf8PathBuf};
use ini::{Ini, ParseOption};
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Section appended to a custom INI that lacks archive invalidation
pub const ARCHIVE_SECTION: &str = "[Archive]\nbInvalidateOlderFiles=1\nsResourceDataDirsFinal=\n";

const WARN_ONEDRIVE: &str = "❌ CAUTION : Your Documents folder is inside OneDrive!\n  OneDrive can lock or roll back game INI and save files. Move your Documents folder out of OneDrive.";

/// Checks the contents of the game's documents folder.
pub struct DocsChecker<'a> {
    store: &'a ConfigStore,
    context: ContextManager,
}

impl<'a> DocsChecker<'a> {
    pub fn new(store: &'a ConfigStore, context: ContextManager) -> Self {
        Self { store, context }
    }

    /// Documents folder check followed by the main, custom and prefs INI checks.
    pub fn check_all(&self) -> Vec<DiagnosticMessage> {
        let docs_name = self.docs_name(&self.context.snapshot());
        let mut messages = self.check_docs_folder();
        for suffix in ["", "Custom", "Prefs"] {
            messages.extend(self.check_ini(&format!("{}{}.ini", docs_name, suffix)));
        }
        messages
    }

    /// Warn when the documents folder lives under OneDrive.
    pub fn check_docs_folder(&self) -> Vec<DiagnosticMessage> {
        self.store.metrics().record_check();
        let vars = self.context.snapshot();
        let Some(docs) = self.docs_folder(&vars) else {
            return Vec::new();
        };

        if docs.as_str().to_lowercase().contains("onedrive") {
            let text = self
                .store
                .get::<String>(YamlStore::Main, "Warnings_GAME.warn_docs_path")
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| WARN_ONEDRIVE.to_string());
            return vec![DiagnosticMessage::from_text(text)];
        }
        Vec::new()
    }

    /// Check one INI file in the documents folder.
    ///
    /// # Arguments
    ///
    /// * `ini_name` - File name, matched case-insensitively against the folder listing
    pub fn check_ini(&self, ini_name: &str) -> Vec<DiagnosticMessage> {
        tracing::info!("- - - INITIATED {} CHECK", ini_name);
        self.store.metrics().record_check();

        let vars = self.context.snapshot();
        let docs_name = self.docs_name(&vars);
        let is_custom = ini_name.eq_ignore_ascii_case(&format!("{}Custom.ini", docs_name));
        let is_main = ini_name.eq_ignore_ascii_case(&format!("{}.ini", docs_name));

        let Some(docs) = self.docs_folder(&vars) else {
            return vec![DiagnosticMessage::caution(format!(
                "The documents folder is unknown, CLASSIC cannot check {}!",
                ini_name
            ))];
        };

        let existing = match find_file_case_insensitive(&docs, ini_name) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!("Could not list {}: {}", docs, e);
                return vec![DiagnosticMessage::caution(format!(
                    "CLASSIC could not read your documents folder {}: {}",
                    docs, e
                ))];
            }
        };

        match existing {
            Some(path) => self.check_existing_ini(&path, ini_name, &docs_name, is_custom),
            None if is_main => vec![DiagnosticMessage::caution(format!(
                "{ini} FILE IS MISSING FROM YOUR DOCUMENTS FOLDER!\n   You need to run the game at least once with {docs}Launcher.exe\n    This will create files and INI settings required for the game to run.",
                ini = ini_name,
                docs = docs_name
            ))],
            None if is_custom => self.create_custom_ini(&docs.join(ini_name), ini_name, &vars),
            None => Vec::new(),
        }
    }

    fn check_existing_ini(
        &self,
        path: &Utf8Path,
        ini_name: &str,
        docs_name: &str,
        is_custom: bool,
    ) -> Vec<DiagnosticMessage> {
        let has_archive = match parse_ini(path) {
            Ok(parsed) => has_section(&parsed, "Archive"),
            Err(DiagnosticError::CorruptOrUnparseable { reason, .. }) => {
                tracing::warn!("{} failed to parse: {}", path, reason);
                return vec![broken_ini_message(ini_name, docs_name)];
            }
            Err(DiagnosticError::PermissionDenied(_)) => {
                return vec![read_only_message(ini_name)];
            }
            Err(e) => {
                return vec![DiagnosticMessage::caution(format!(
                    "CLASSIC could not read {}: {}",
                    path, e
                ))];
            }
        };

        let mut messages = vec![DiagnosticMessage::success(format!(
            "No obvious corruption detected in {}, file seems OK!",
            ini_name
        ))];
        if !is_custom {
            return messages;
        }

        if has_archive {
            messages.push(DiagnosticMessage::success(
                "Archive Invalidation / Loose Files setting is already enabled!",
            ));
            return messages;
        }

        match append_archive_section(path) {
            Ok(()) => {
                tracing::info!("Enabled archive invalidation in {}", path);
                messages.push(archive_enabled_message());
            }
            Err(DiagnosticError::PermissionDenied(_)) => messages.push(read_only_message(ini_name)),
            Err(e) => {
                tracing::error!("Could not repair {}: {}", path, e);
                messages.push(DiagnosticMessage::caution(format!(
                    "CLASSIC could not enable archive invalidation in {}: {}",
                    ini_name, e
                )));
            }
        }
        messages
    }

    fn create_custom_ini(&self, path: &Utf8Path, ini_name: &str, vars: &GameVars) -> Vec<DiagnosticMessage> {
        let template = self
            .store
            .get::<String>(YamlStore::Game, &vars.info_key("Default_CustomINI"))
            .or_else(|| self.store.get::<String>(YamlStore::Main, "Default_CustomINI"))
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| ARCHIVE_SECTION.to_string());

        match fs::write(path, template) {
            Ok(()) => {
                tracing::info!("Created {} with archive invalidation enabled", path);
                vec![archive_enabled_message()]
            }
            Err(e) => {
                let e = DiagnosticError::from_io(path, e);
                tracing::error!("Could not create {}: {}", path, e);
                vec![DiagnosticMessage::caution(format!(
                    "CLASSIC could not create {}: {}",
                    ini_name, e
                ))]
            }
        }
    }

    fn docs_folder(&self, vars: &GameVars) -> Option<Utf8PathBuf> {
        self.store
            .get::<Utf8PathBuf>(YamlStore::GameLocal, &vars.info_key("Root_Folder_Docs"))
    }

    fn docs_name(&self, vars: &GameVars) -> String {
        self.store
            .get::<String>(YamlStore::Game, &vars.info_key("Main_Docs_Name"))
            .unwrap_or_else(|| format!("{}{}", vars.game, vars.vr_suffix()))
    }
}

/// Parse an INI file the way the game reads it.
///
/// Backslashes are literal: `SLocalSavePath=Saves\` must not continue onto
/// the next line. A leading UTF-8 BOM is ignored.
pub fn parse_ini(path: &Utf8Path) -> Result<Ini, DiagnosticError> {
    let bytes = fs::read(path).map_err(|e| DiagnosticError::from_io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    let options = ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    };
    Ini::load_from_str_opt(text.trim_start_matches('\u{feff}'), options).map_err(|e| {
        DiagnosticError::CorruptOrUnparseable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

/// Whether `section` exists; section names compare case-insensitively.
pub fn has_section(parsed: &Ini, section: &str) -> bool {
    parsed
        .sections()
        .flatten()
        .any(|name| name.trim().eq_ignore_ascii_case(section))
}

/// Append [`ARCHIVE_SECTION`] to the end of an INI file.
///
/// # Errors
///
/// [`DiagnosticError::PermissionDenied`] when the file is read-only.
pub fn append_archive_section(path: &Utf8Path) -> Result<(), DiagnosticError> {
    let metadata = fs::metadata(path).map_err(|e| DiagnosticError::from_io(path, e))?;
    if metadata.permissions().readonly() {
        return Err(DiagnosticError::PermissionDenied(path.to_path_buf()));
    }

    let ends_with_newline = fs::read(path)
        .map_err(|e| DiagnosticError::from_io(path, e))?
        .last()
        .is_none_or(|byte| *byte == b'\n');

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| DiagnosticError::from_io(path, e))?;
    let separator = if ends_with_newline { "\n" } else { "\n\n" };
    file.write_all(format!("{}{}", separator, ARCHIVE_SECTION).as_bytes())
        .map_err(|e| DiagnosticError::from_io(path, e))
}

fn find_file_case_insensitive(dir: &Utf8Path, name: &str) -> std::io::Result<Option<Utf8PathBuf>> {
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_name().eq_ignore_ascii_case(name) && entry.path().is_file() {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

fn archive_enabled_message() -> DiagnosticMessage {
    DiagnosticMessage::warning(
        "Archive Invalidation / Loose Files setting is not enabled.\n  CLASSIC will now enable this setting automatically in the game INI files.",
    )
}

fn read_only_message(ini_name: &str) -> DiagnosticMessage {
    DiagnosticMessage::notice(format!(
        "YOUR {} FILE IS SET TO READ ONLY.\n     PLEASE REMOVE THE READ ONLY PROPERTY FROM THIS FILE,\n     SO CLASSIC CAN MAKE THE REQUIRED CHANGES TO IT.",
        ini_name
    ))
}

fn broken_ini_message(ini_name: &str, docs_name: &str) -> DiagnosticMessage {
    DiagnosticMessage::notice(format!(
        "YOUR {ini} FILE IS VERY LIKELY BROKEN, PLEASE CREATE A NEW ONE\n    Delete this file from your Documents/My Games/{docs} folder, then run\n    CLASSIC again to generate a new {ini} file.",
        ini = ini_name,
        docs = docs_name
    ))
}
