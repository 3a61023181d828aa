//! End-to-end tests for the game files scan
//!
//! These tests verify:
//! - A healthy install produces every check's messages in pipeline order
//! - Discovered roots and derived paths are persisted to the GameLocal store
//! - Without any discoverable folder and no operator input the scan still
//!   completes, reporting why it could not proceed

use camino::{Utf8Path, Utf8PathBuf};
use classic::config::{ConfigStore, DataLayout};
use classic::services::{
    FolderProbe, NonInteractivePrompt, PathResolver, ProbeRequest, ReportAggregator, sha256_file,
};
use classic::{ContextManager, YamlStore};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const MAIN_YAML: &str = r#"
CLASSIC_Info:
  version: CLASSIC v7.30
  default_settings: |
    CLASSIC_Settings:
      Managed Game: Fallout 4
      Update Check: false
      VR Mode: false
"#;

/// Probe that always suggests the same folder
struct FixedProbe(Utf8PathBuf);

impl FolderProbe for FixedProbe {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn probe(&self, _request: &ProbeRequest) -> Option<Utf8PathBuf> {
        Some(self.0.clone())
    }
}

struct FakeInstall {
    _temp_dir: TempDir,
    base: Utf8PathBuf,
    game_root: Utf8PathBuf,
    docs_root: Utf8PathBuf,
    context: ContextManager,
    layout: Arc<DataLayout>,
}

fn create_data_files() -> FakeInstall {
    let temp_dir = TempDir::new().unwrap();
    let base = Utf8Path::from_path(temp_dir.path()).unwrap().to_path_buf();
    let context = ContextManager::default();
    let layout = Arc::new(DataLayout::new(&base, context.clone()));
    fs::create_dir_all(layout.databases_dir()).unwrap();
    fs::write(layout.databases_dir().join("CLASSIC Main.yaml"), MAIN_YAML).unwrap();

    FakeInstall {
        game_root: base.join("Games/Fallout 4"),
        docs_root: base.join("Documents/My Games/Fallout4"),
        _temp_dir: temp_dir,
        base,
        context,
        layout,
    }
}

fn create_fake_install() -> FakeInstall {
    let install = create_data_files();
    let game = &install.game_root;
    let docs = &install.docs_root;

    fs::create_dir_all(game.join("Data/Scripts")).unwrap();
    fs::create_dir_all(game.join("Data/F4SE/Plugins")).unwrap();
    fs::write(game.join("Fallout4.exe"), "game executable").unwrap();
    fs::write(game.join("Data/Scripts/Actor.pex"), "actor script").unwrap();
    fs::write(game.join("Data/F4SE/Plugins/version-1-10-163-0.bin"), "offsets").unwrap();

    fs::create_dir_all(docs.join("F4SE")).unwrap();
    fs::write(
        docs.join("F4SE/f4se.log"),
        "F4SE runtime: initialize (version = 0.6.23 010A0A30 01D9E2C4F5A6B7C8, running F4SE 0.6.23)\n\
         plugin directory = C:\\Games\\Fallout 4\\Data\\F4SE\\Plugins\n",
    )
    .unwrap();
    fs::write(docs.join("Fallout4.ini"), "[General]\nsLanguage=en\n").unwrap();
    fs::write(
        docs.join("Fallout4Custom.ini"),
        "[Archive]\nbInvalidateOlderFiles=1\nsResourceDataDirsFinal=\n",
    )
    .unwrap();
    fs::write(docs.join("Fallout4Prefs.ini"), "[Display]\niSizeW=1920\n").unwrap();

    let game_yaml = format!(
        "Game_Info:\n  Main_Root_Name: Fallout 4\n  Main_Docs_Name: Fallout4\n  XSE_Acronym: F4SE\n  XSE_FullName: Fallout 4 Script Extender (F4SE)\n  XSE_Ver_Latest: 0.6.23\n  EXE_HashedOLD: {}\n  XSE_HashedScripts:\n    Actor.pex: {}\n",
        sha256_file(&game.join("Fallout4.exe")).unwrap(),
        sha256_file(&game.join("Data/Scripts/Actor.pex")).unwrap(),
    );
    fs::write(
        install.layout.databases_dir().join("CLASSIC Fallout4.yaml"),
        game_yaml,
    )
    .unwrap();

    install
}

#[test]
fn test_healthy_install_reports_in_order() {
    let install = create_fake_install();
    let store = ConfigStore::open(install.layout.clone()).unwrap();

    let resolver = PathResolver::with_probes(
        &store,
        install.context.clone(),
        vec![Box::new(FixedProbe(install.docs_root.clone()))],
        vec![Box::new(FixedProbe(install.game_root.clone()))],
        Box::new(NonInteractivePrompt),
    );
    let report = ReportAggregator::new(&store, install.context.clone(), resolver).run();

    let texts: Vec<&str> = report.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "✔️ All Script Extender files have been found and accounted for!",
            "✔️ REQUIRED: *Address Library* for Script Extender is installed!",
            "✔️ REQUIRED: *Fallout 4 Script Extender (F4SE)* is installed!",
            "✔️ You have the latest version of *Fallout 4 Script Extender (F4SE)*!",
            "✔️ You have the latest version of Fallout 4!",
            "✔️ Your Fallout 4 game files are installed outside of the Program Files folder!",
            "✔️ No obvious corruption detected in Fallout4.ini, file seems OK!",
            "✔️ No obvious corruption detected in Fallout4Custom.ini, file seems OK!",
            "✔️ Archive Invalidation / Loose Files setting is already enabled!",
            "✔️ No obvious corruption detected in Fallout4Prefs.ini, file seems OK!",
        ]
    );
    assert_eq!(report.problem_count(), 0);
    assert!(report.render().ends_with("-----\n"));

    assert_eq!(
        store.get::<Utf8PathBuf>(YamlStore::GameLocal, "Game_Info.Root_Folder_Game"),
        Some(install.game_root.clone())
    );
    assert_eq!(
        store.get::<Utf8PathBuf>(YamlStore::GameLocal, "Game_Info.Docs_File_XSE"),
        Some(install.docs_root.join("F4SE/f4se.log"))
    );
}

#[test]
fn test_persisted_roots_survive_a_second_run() {
    let install = create_fake_install();
    let store = ConfigStore::open(install.layout.clone()).unwrap();
    let first = PathResolver::with_probes(
        &store,
        install.context.clone(),
        vec![Box::new(FixedProbe(install.docs_root.clone()))],
        vec![Box::new(FixedProbe(install.game_root.clone()))],
        Box::new(NonInteractivePrompt),
    );
    let first_report = ReportAggregator::new(&store, install.context.clone(), first).run();

    // A new process with no probes finds everything through the GameLocal store
    let store = ConfigStore::open(install.layout.clone()).unwrap();
    let second = PathResolver::with_probes(
        &store,
        install.context.clone(),
        Vec::new(),
        Vec::new(),
        Box::new(NonInteractivePrompt),
    );
    let second_report = ReportAggregator::new(&store, install.context.clone(), second).run();

    assert_eq!(first_report, second_report);
}

#[test]
fn test_unresolvable_folders_still_produce_report() {
    let install = create_data_files();
    let store = ConfigStore::open(install.layout.clone()).unwrap();

    let resolver = PathResolver::with_probes(
        &store,
        install.context.clone(),
        Vec::new(),
        Vec::new(),
        Box::new(NonInteractivePrompt),
    );
    let report = ReportAggregator::new(&store, install.context.clone(), resolver).run();

    let messages = report.messages();
    assert!(messages.len() > 2);
    assert!(messages[0].text.contains("Cannot proceed"));
    assert!(messages[0].text.contains("documents folder"));
    assert!(messages[1].text.contains("Cannot proceed"));
    assert!(messages[1].text.contains("game folder"));
    assert_eq!(report.problem_count(), report.len());
    assert!(report.render().contains("CAUTION"));

    // No empty or guessed path is persisted
    assert!(!install.base.join("CLASSIC Data/CLASSIC Fallout4 Local.yaml").exists());
}
