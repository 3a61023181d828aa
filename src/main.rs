//! CLASSIC - Crash Log Auto Scanner & Setup Integrity Checker
//!
//! Console entry point for the game files scan.
//!
//! # Execution Flow
//!
//! 1. Open the configuration cache, materializing `CLASSIC Settings.yaml`
//!    (fatal when the Main store has no settings template)
//! 2. Expire and open the journal → `CLASSIC Journal.log`
//! 3. Apply the managed game and VR mode from the settings
//! 4. Generate missing default files and the FormID lookup database
//! 5. Start the update check on the tokio runtime
//! 6. Run the game files scan (paths, script extender, game, documents)
//! 7. Append the update check result, print the report and write
//!    `CLASSIC GFS Report.md`
//!
//! # Data Files
//!
//! Expected next to the executable:
//! - `CLASSIC Data/databases/CLASSIC Main.yaml`: settings templates, warning texts
//! - `CLASSIC Data/databases/CLASSIC {Game}.yaml`: per-game facts and hashes

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use classic::config::{ConfigStore, DataLayout};
use classic::logging::{self, JOURNAL_FILE};
use classic::models::{DiagnosticMessage, GameVars, SettingsFile};
use classic::services::{
    ConsolePrompt, FormIdIndex, GitHubReleases, NonInteractivePrompt, PathPrompt, PathResolver,
    Platform, ReportAggregator, UpdateRequest, VersionSource, generate_default_files,
};
use classic::{APP_NAME, ContextManager, VERSION, YamlStore};
use std::fs;
use std::io::IsTerminal;
use std::sync::Arc;

/// Main entry point for the CLASSIC game files scan
///
/// # Errors
///
/// This function can fail if:
/// - The application directory is not valid UTF-8
/// - Logging initialization fails (disk space, permissions)
/// - The Settings store cannot be created from the Main store template
/// - Tokio runtime creation fails (system resources)
fn main() -> Result<()> {
    let base_dir = application_dir()?;

    let context = ContextManager::default();
    let layout = Arc::new(DataLayout::new(&base_dir, context.clone()));
    let store = ConfigStore::open(layout.clone())
        .context("Cannot start: the Settings store is unavailable")?;

    let settings = store
        .document_as::<SettingsFile>(YamlStore::Settings)
        .map(|file| file.classic_settings)
        .unwrap_or_default();

    let journal = base_dir.join(JOURNAL_FILE);
    let expired = logging::expire_journal(&journal, u64::from(settings.journal_expiration));
    let _guard = logging::setup_logging(&base_dir, settings.debug_mode, false)?;
    match expired {
        Ok(true) => tracing::info!(
            "Deleted journal older than {} days",
            settings.journal_expiration
        ),
        Ok(false) => {}
        Err(e) => tracing::warn!("Could not expire journal: {:#}", e),
    }
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    context.update(|vars| {
        vars.game = GameVars::game_from_setting(&settings.managed_game);
        vars.vr = settings.vr_mode;
    });
    tracing::info!(
        "Managing {} (VR mode: {})",
        context.read(|vars| vars.game.clone()),
        settings.vr_mode
    );

    match generate_default_files(&store, &layout) {
        Ok(generated) => {
            for path in generated {
                tracing::info!("Created default file {}", path);
            }
        }
        Err(e) => tracing::error!("Default file generation failed: {:#}", e),
    }

    let game = context.read(|vars| vars.game.clone());
    let fid_main = layout.fid_main_file();
    if fid_main.exists() {
        match FormIdIndex::open_or_build(&layout.formid_db_file(), &fid_main, &game) {
            Ok(index) => tracing::info!("FormID database ready ({:?})", index.origin()),
            Err(e) => tracing::warn!("FormID database unavailable: {:#}", e),
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("classic-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let update_request = UpdateRequest::from_store(&store, &game);
    let update_task = runtime.spawn(async move {
        match GitHubReleases::new() {
            Ok(source) => {
                let source: &dyn VersionSource = &source;
                update_request.run(source).await
            }
            Err(e) => {
                tracing::warn!("Update check unavailable: {}", e);
                vec![DiagnosticMessage::from_text(update_request.unavailable_text)]
            }
        }
    });

    let prompt: Box<dyn PathPrompt> = if std::io::stdin().is_terminal() {
        Box::new(ConsolePrompt)
    } else {
        Box::new(NonInteractivePrompt)
    };
    let resolver = PathResolver::new(&store, context.clone(), Platform::current(), prompt);
    let mut report = ReportAggregator::new(&store, context.clone(), resolver).run();

    match runtime.block_on(update_task) {
        Ok(messages) => report.extend(messages),
        Err(e) => tracing::error!("Update check task failed: {}", e),
    }

    let rendered = report.render();
    println!("{}", rendered);

    let report_file = layout.report_file();
    match fs::write(&report_file, &rendered) {
        Ok(()) => tracing::info!("Report written to {}", report_file),
        Err(e) => tracing::error!("Failed to write report {}: {}", report_file, e),
    }

    store.metrics().log_summary();
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("Game files scan complete");
    Ok(())
}

/// Directory containing the executable; data files are resolved against it.
fn application_dir() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the executable")?;
    let exe = Utf8PathBuf::from_path_buf(exe)
        .map_err(|path| anyhow::anyhow!("Executable path is not valid UTF-8: {}", path.display()))?;
    Ok(exe
        .parent()
        .map(|dir| dir.to_path_buf())
        .unwrap_or_else(|| Utf8PathBuf::from(".")))
}
