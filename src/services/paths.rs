//! Game and documents folder resolution.
//!
//! Resolution order for each root folder:
//!
//! 1. The value persisted in the GameLocal store, if that directory still exists
//! 2. The `INI Folder Path` setting (documents folder only)
//! 3. The platform's [`FolderProbe`]s, in order
//! 4. The [`PathPrompt`], repeated until it names an existing directory
//!
//! A folder found by steps 2-4 is written back to GameLocal, so later runs stop
//! at step 1. When the prompt gives up the caller receives
//! [`DiagnosticError::Unresolved`] instead of an empty path.
//!
//! Derived paths (Data, Scripts, the script extender log, ...) are computed
//! from the roots and persisted next to them.

use super::DiagnosticError;
use super::probe::{self, FolderProbe, Platform, ProbeRequest};
use super::prompt::{PathPrompt, PromptRequest};
use crate::config::ConfigStore;
use crate::models::{DiagnosticMessage, GameVars, YamlStore};
use crate::state::ContextManager;
use camino::{Utf8Path, Utf8PathBuf};

/// Address Library file checked for Fallout 4
const ADDRESS_LIBRARY: &str = "version-1-10-163-0.bin";
/// Address Library file checked for Fallout 4 VR
const ADDRESS_LIBRARY_VR: &str = "version-1-2-72-0.csv";

/// Paths derived from the game root folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePaths {
    pub root: Utf8PathBuf,
    pub data: Utf8PathBuf,
    pub scripts: Utf8PathBuf,
    pub plugins: Utf8PathBuf,
    pub steam_ini: Utf8PathBuf,
    pub exe: Utf8PathBuf,
    /// Only tracked for games that need the Address Library
    pub address_library: Option<Utf8PathBuf>,
}

/// Paths derived from the documents folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsPaths {
    pub root: Utf8PathBuf,
    pub xse_folder: Utf8PathBuf,
    pub papyrus_log: Utf8PathBuf,
    pub wrye_bash_checker: Utf8PathBuf,
    pub xse_log: Utf8PathBuf,
}

/// Which root folder is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    Docs,
    Game,
}

impl RootKind {
    fn key(self) -> &'static str {
        match self {
            RootKind::Docs => "Root_Folder_Docs",
            RootKind::Game => "Root_Folder_Game",
        }
    }

    fn description(self) -> &'static str {
        match self {
            RootKind::Docs => "documents folder",
            RootKind::Game => "game folder",
        }
    }
}

/// Discovers, validates and persists the game and documents folders.
pub struct PathResolver<'a> {
    store: &'a ConfigStore,
    context: ContextManager,
    docs_probes: Vec<Box<dyn FolderProbe>>,
    game_probes: Vec<Box<dyn FolderProbe>>,
    prompt: Box<dyn PathPrompt>,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver with the default probes for `platform`.
    pub fn new(
        store: &'a ConfigStore,
        context: ContextManager,
        platform: Platform,
        prompt: Box<dyn PathPrompt>,
    ) -> Self {
        Self::with_probes(
            store,
            context,
            probe::docs_probes(platform),
            probe::game_probes(platform),
            prompt,
        )
    }

    pub fn with_probes(
        store: &'a ConfigStore,
        context: ContextManager,
        docs_probes: Vec<Box<dyn FolderProbe>>,
        game_probes: Vec<Box<dyn FolderProbe>>,
        prompt: Box<dyn PathPrompt>,
    ) -> Self {
        Self {
            store,
            context,
            docs_probes,
            game_probes,
            prompt,
        }
    }

    /// Resolve the documents folder (`Documents/My Games/{Docs Name}`).
    ///
    /// # Errors
    ///
    /// [`DiagnosticError::Unresolved`] when no source yields an existing directory.
    pub fn resolve_docs_folder(&self) -> Result<Utf8PathBuf, DiagnosticError> {
        let vars = self.context.snapshot();
        let request = self.probe_request(&vars, None);

        if let Some(path) = self.persisted_root(&vars, RootKind::Docs) {
            return Ok(path);
        }

        if let Some(custom) = self.store.setting::<Utf8PathBuf>("INI Folder Path") {
            if custom.is_dir() {
                tracing::info!("Using documents folder from the INI Folder Path setting: {}", custom);
                return Ok(self.persist_root(&vars, RootKind::Docs, custom));
            }
            tracing::warn!("INI Folder Path setting {} is not a directory, ignoring it", custom);
        }

        let prompt = PromptRequest {
            marker: format!("{}.ini", request.docs_name),
            example: format!("C:/Users/Your Name/Documents/My Games/{}", request.docs_name),
        };
        self.discover(&vars, RootKind::Docs, &self.docs_probes, &request, &prompt)
    }

    /// Resolve the game installation folder.
    ///
    /// The script extender log probe needs the documents folder, so resolve
    /// that first when possible.
    ///
    /// # Errors
    ///
    /// [`DiagnosticError::Unresolved`] when no source yields an existing directory.
    pub fn resolve_game_folder(&self) -> Result<Utf8PathBuf, DiagnosticError> {
        let vars = self.context.snapshot();
        if let Some(path) = self.persisted_root(&vars, RootKind::Game) {
            return Ok(path);
        }

        let xse_log = self
            .store
            .get::<Utf8PathBuf>(YamlStore::GameLocal, &vars.info_key("Docs_File_XSE"));
        let request = self.probe_request(&vars, xse_log);
        let prompt = PromptRequest {
            marker: vars.exe_name(),
            example: format!("C:/Steam/steamapps/common/{}", request.root_name),
        };
        self.discover(&vars, RootKind::Game, &self.game_probes, &request, &prompt)
    }

    /// Compute and persist the paths derived from the game root.
    pub fn generate_game_paths(&self, root: &Utf8Path) -> Result<GamePaths, DiagnosticError> {
        let vars = self.context.snapshot();
        let xse_base = self.xse_acronym_base()?;
        let data = root.join("Data");

        let mut paths = GamePaths {
            root: root.to_path_buf(),
            scripts: data.join("Scripts"),
            plugins: data.join(&xse_base).join("Plugins"),
            steam_ini: root.join("steam_api.ini"),
            exe: root.join(vars.exe_name()),
            address_library: None,
            data,
        };
        if vars.game == "Fallout4" {
            let file = if vars.vr { ADDRESS_LIBRARY_VR } else { ADDRESS_LIBRARY };
            paths.address_library = Some(paths.plugins.join(file));
        }

        self.persist_path(&vars, "Game_Folder_Data", &paths.data)?;
        self.persist_path(&vars, "Game_Folder_Scripts", &paths.scripts)?;
        self.persist_path(&vars, "Game_Folder_Plugins", &paths.plugins)?;
        self.persist_path(&vars, "Game_File_SteamINI", &paths.steam_ini)?;
        self.persist_path(&vars, "Game_File_EXE", &paths.exe)?;
        if let Some(address_library) = &paths.address_library {
            self.persist_path(&vars, "Game_File_AddressLib", address_library)?;
        }

        tracing::info!("Generated game paths under {}", root);
        Ok(paths)
    }

    /// Compute and persist the paths derived from the documents folder.
    pub fn generate_docs_paths(&self, root: &Utf8Path) -> Result<DocsPaths, DiagnosticError> {
        let vars = self.context.snapshot();
        let xse_base = self.xse_acronym_base()?;
        let xse_variant = self
            .store
            .get::<String>(YamlStore::Game, &vars.info_key("XSE_Acronym"))
            .unwrap_or_else(|| xse_base.clone());
        let xse_folder = root.join(&xse_base);

        let paths = DocsPaths {
            root: root.to_path_buf(),
            papyrus_log: root.join("Logs").join("Script").join("Papyrus.0.log"),
            wrye_bash_checker: root.join("ModChecker.html"),
            xse_log: xse_folder.join(format!("{}.log", xse_variant.to_lowercase())),
            xse_folder,
        };

        self.persist_path(&vars, "Docs_Folder_XSE", &paths.xse_folder)?;
        self.persist_path(&vars, "Docs_File_PapyrusLog", &paths.papyrus_log)?;
        self.persist_path(&vars, "Docs_File_WryeBashPC", &paths.wrye_bash_checker)?;
        self.persist_path(&vars, "Docs_File_XSE", &paths.xse_log)?;

        tracing::info!("Generated documents paths under {}", root);
        Ok(paths)
    }

    /// Resolve both roots and generate their derived paths.
    ///
    /// Resolution failures are returned as report messages; an unresolvable
    /// root stops only the work that depends on it.
    pub fn resolve_all(&self) -> Vec<DiagnosticMessage> {
        let mut messages = Vec::new();

        match self.resolve_docs_folder() {
            Ok(docs) => {
                if let Err(e) = self.generate_docs_paths(&docs) {
                    tracing::error!("Documents path generation failed: {}", e);
                    messages.push(DiagnosticMessage::caution(format!(
                        "CLASSIC could not generate the documents folder paths: {}",
                        e
                    )));
                }
            }
            Err(e) => {
                tracing::error!("{}", e);
                messages.push(unresolved_message(&e));
            }
        }

        match self.resolve_game_folder() {
            Ok(game) => {
                if let Err(e) = self.generate_game_paths(&game) {
                    tracing::error!("Game path generation failed: {}", e);
                    messages.push(DiagnosticMessage::caution(format!(
                        "CLASSIC could not generate the game folder paths: {}",
                        e
                    )));
                }
            }
            Err(e) => {
                tracing::error!("{}", e);
                messages.push(unresolved_message(&e));
            }
        }

        messages
    }

    fn probe_request(&self, vars: &GameVars, xse_log: Option<Utf8PathBuf>) -> ProbeRequest {
        let game_key = |key: &str| self.store.get::<String>(YamlStore::Game, &vars.info_key(key));
        ProbeRequest {
            steam_id: game_key("Main_SteamID"),
            docs_name: game_key("Main_Docs_Name").unwrap_or_else(|| vars.game.clone()),
            root_name: game_key("Main_Root_Name").unwrap_or_else(|| vars.game.clone()),
            xse_log,
            xse_acronym: self
                .store
                .get::<String>(YamlStore::Game, "Game_Info.XSE_Acronym")
                .unwrap_or_default(),
        }
    }

    fn persisted_root(&self, vars: &GameVars, kind: RootKind) -> Option<Utf8PathBuf> {
        let path = self
            .store
            .get::<Utf8PathBuf>(YamlStore::GameLocal, &vars.info_key(kind.key()))?;
        if path.is_dir() {
            tracing::debug!("Using stored {}: {}", kind.description(), path);
            Some(path)
        } else {
            tracing::warn!("Stored {} {} no longer exists", kind.description(), path);
            None
        }
    }

    fn discover(
        &self,
        vars: &GameVars,
        kind: RootKind,
        probes: &[Box<dyn FolderProbe>],
        request: &ProbeRequest,
        prompt: &PromptRequest,
    ) -> Result<Utf8PathBuf, DiagnosticError> {
        for probe in probes {
            match probe.probe(request) {
                Some(candidate) if candidate.is_dir() => {
                    tracing::info!("Found {} via {}: {}", kind.description(), probe.name(), candidate);
                    return Ok(self.persist_root(vars, kind, candidate));
                }
                Some(candidate) => {
                    tracing::debug!("{} suggested {} but it does not exist", probe.name(), candidate);
                }
                None => tracing::debug!("{} found no {}", probe.name(), kind.description()),
            }
        }

        let mut rejected = None;
        loop {
            let Some(answer) = self.prompt.ask_directory(prompt, rejected.take()) else {
                return Err(DiagnosticError::Unresolved {
                    what: kind.description().to_string(),
                });
            };
            let candidate = Utf8PathBuf::from(answer.trim());
            if !answer.trim().is_empty() && candidate.is_dir() {
                tracing::info!("Operator entered {}: {}", kind.description(), candidate);
                return Ok(self.persist_root(vars, kind, candidate));
            }
            rejected = Some(answer);
        }
    }

    /// Persist a discovered root; a failed write is logged and the path still used.
    fn persist_root(&self, vars: &GameVars, kind: RootKind, path: Utf8PathBuf) -> Utf8PathBuf {
        if let Err(e) = self
            .store
            .set(YamlStore::GameLocal, &vars.info_key(kind.key()), &path)
        {
            tracing::error!("Could not remember {} {}: {}", kind.description(), path, e);
        }
        path
    }

    fn persist_path(&self, vars: &GameVars, key: &str, path: &Utf8Path) -> Result<(), DiagnosticError> {
        self.store
            .set(YamlStore::GameLocal, &vars.info_key(key), path.as_str())?;
        Ok(())
    }

    fn xse_acronym_base(&self) -> Result<String, DiagnosticError> {
        self.store
            .get::<String>(YamlStore::Game, "Game_Info.XSE_Acronym")
            .ok_or_else(|| DiagnosticError::MissingSetting {
                store: YamlStore::Game,
                key: "Game_Info.XSE_Acronym".to_string(),
            })
    }
}

fn unresolved_message(error: &DiagnosticError) -> DiagnosticMessage {
    DiagnosticMessage::caution(format!(
        "{}\n  Set the folder in CLASSIC Settings.yaml or run CLASSIC from a console to enter it.",
        error
    ))
}
