//! Integration tests for ConfigStore backed by the real CLASSIC file layout
//!
//! These tests verify:
//! - Settings bootstrap from the Main store template
//! - Context changes retarget the per-game stores
//! - Concurrent writers to one store all persist
//! - Dotted-path values survive a fresh cache (property-based)

use camino::Utf8PathBuf;
use classic::config::{ConfigError, ConfigStore, DataLayout};
use classic::{ContextManager, YamlStore};
use proptest::prelude::*;
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

fn create_layout() -> (TempDir, Utf8PathBuf, ContextManager, Arc<DataLayout>) {
    let temp_dir = TempDir::new().unwrap();
    let base = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let context = ContextManager::default();
    let layout = Arc::new(DataLayout::new(&base, context.clone()));
    fs::create_dir_all(layout.databases_dir()).unwrap();
    (temp_dir, base, context, layout)
}

#[test]
fn test_open_bootstraps_settings() {
    let (_temp_dir, base, _context, layout) = create_layout();
    fs::write(layout.databases_dir().join("CLASSIC Main.yaml"), MAIN_YAML).unwrap();

    let store = ConfigStore::open(layout).unwrap();

    assert!(base.join("CLASSIC Settings.yaml").exists());
    assert_eq!(store.setting::<bool>("Update Check"), Some(false));
    assert_eq!(store.metrics().disk_writes(), 1);
}

#[test]
fn test_open_without_template_is_fatal() {
    let (_temp_dir, base, _context, layout) = create_layout();

    let err = ConfigStore::open(layout).unwrap_err();

    assert!(matches!(err, ConfigError::FatalBootstrap { .. }));
    assert!(!base.join("CLASSIC Settings.yaml").exists());
}

#[test]
fn test_existing_settings_are_not_overwritten() {
    let (_temp_dir, base, _context, layout) = create_layout();
    fs::write(layout.databases_dir().join("CLASSIC Main.yaml"), MAIN_YAML).unwrap();
    fs::write(
        base.join("CLASSIC Settings.yaml"),
        "CLASSIC_Settings:\n  Managed Game: Fallout 4\n  VR Mode: true\n",
    )
    .unwrap();

    let store = ConfigStore::open(layout).unwrap();

    assert_eq!(store.setting::<bool>("VR Mode"), Some(true));
    assert_eq!(store.metrics().disk_writes(), 0);
}

#[test]
fn test_context_switch_retargets_game_stores() {
    let (_temp_dir, base, context, layout) = create_layout();
    let store = ConfigStore::new(layout);

    store
        .set(YamlStore::GameLocal, "Game_Info.Root_Folder_Game", "D:/Games/Fallout 4")
        .unwrap();
    assert!(base.join("CLASSIC Data/CLASSIC Fallout4 Local.yaml").exists());

    context.set_game("SkyrimSE");
    assert_eq!(
        store.get::<String>(YamlStore::GameLocal, "Game_Info.Root_Folder_Game"),
        None
    );

    context.set_game("Fallout4");
    assert_eq!(
        store.get::<String>(YamlStore::GameLocal, "Game_Info.Root_Folder_Game"),
        Some("D:/Games/Fallout 4".to_string())
    );
}

#[test]
fn test_concurrent_writers_all_persist() {
    let (_temp_dir, _base, _context, layout) = create_layout();
    let store = ConfigStore::new(layout.clone());

    std::thread::scope(|scope| {
        for i in 0..8 {
            let store = &store;
            scope.spawn(move || {
                store
                    .set(YamlStore::GameLocal, &format!("Game_Info.Key{}", i), i as i64)
                    .unwrap();
            });
        }
    });

    // A fresh cache only sees what reached the disk
    let reread = ConfigStore::new(layout);
    for i in 0..8 {
        assert_eq!(
            reread.get::<i64>(YamlStore::GameLocal, &format!("Game_Info.Key{}", i)),
            Some(i as i64)
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_values_survive_a_fresh_cache(
        segments in prop::collection::vec("[A-Za-z][A-Za-z0-9_]{0,8}", 1..4),
        value in "[A-Za-z][A-Za-z0-9 _-]{0,16}[A-Za-z0-9]",
    ) {
        let temp_dir = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let root = base.clone();
        let locator = move |store: YamlStore| root.join(format!("{}.yaml", store));
        let path = segments.join(".");

        let store = ConfigStore::new(Arc::new(locator.clone()));
        store.set(YamlStore::Test, &path, value.clone()).unwrap();

        let fresh = ConfigStore::new(Arc::new(locator));
        prop_assert_eq!(fresh.get::<String>(YamlStore::Test, &path), Some(value));
    }
}
