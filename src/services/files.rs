use crate::config::{ConfigStore, DataLayout};
use crate::models::YamlStore;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Create the user-editable files CLASSIC ships templates for.
///
/// Each file is written from its template only when it does not exist yet:
///
/// - `CLASSIC Ignore.yaml` from `CLASSIC_Info.default_ignorefile` (Main)
/// - `CLASSIC {Game} Local.yaml` from `CLASSIC_Info.default_localyaml` (Main)
/// - `{Game} FID Mods.txt` from `Default_FIDMods` (Game)
///
/// A missing or empty template is logged and skipped.
///
/// # Returns
///
/// The files that were created
///
/// # Errors
///
/// Returns an error if a file cannot be written
pub fn generate_default_files(store: &ConfigStore, layout: &DataLayout) -> Result<Vec<Utf8PathBuf>> {
    let targets = [
        (
            store.path_for(YamlStore::Ignore),
            YamlStore::Main,
            "CLASSIC_Info.default_ignorefile",
        ),
        (
            store.path_for(YamlStore::GameLocal),
            YamlStore::Main,
            "CLASSIC_Info.default_localyaml",
        ),
        (layout.fid_mods_file(), YamlStore::Game, "Default_FIDMods"),
    ];

    let mut generated = Vec::new();
    for (path, source, key) in targets {
        if path.exists() {
            continue;
        }
        let Some(template) = store
            .get::<String>(source, key)
            .filter(|text| !text.trim().is_empty())
        else {
            tracing::warn!("No {} template in the {} store, not generating {}", key, source, path);
            continue;
        };

        write_new_file(&path, &template)?;
        tracing::info!("Generated {}", path);
        generated.push(path);
    }
    Ok(generated)
}

fn write_new_file(path: &Utf8Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write file: {}", path))
}
