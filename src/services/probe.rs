//! Folder discovery strategies for the game and documents folders.
//!
//! Each [`FolderProbe`] tries one way of finding a folder and returns `None`
//! when it has nothing to offer. [`PathResolver`](super::PathResolver) runs the
//! probes selected for the current [`Platform`] in order and falls back to
//! asking the operator.
//!
//! - [`NativeDocumentsProbe`]: `Documents/My Games/{Docs Name}` from the OS known folder
//! - [`CompatLayerProbe`]: the documents folder inside a Steam Proton prefix
//! - [`XseLogProbe`]: the game folder from the script extender log's plugin directory line
//! - [`SteamLibraryProbe`]: the game folder inside the Steam library that owns the app id

use camino::Utf8PathBuf;
use regex::Regex;
use std::fs;
use std::sync::LazyLock;

/// Operating system family, used to pick the probe set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

/// Static game facts a probe may need, read from the Game store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeRequest {
    /// Steam app id, e.g. `377160`
    pub steam_id: Option<String>,
    /// Folder name under `My Games`, e.g. `Fallout4`
    pub docs_name: String,
    /// Folder name under `steamapps/common`, e.g. `Fallout 4`
    pub root_name: String,
    /// Script extender log, known once the documents folder is resolved
    pub xse_log: Option<Utf8PathBuf>,
    /// Script extender acronym used in the log's plugin directory line
    pub xse_acronym: String,
}

/// One strategy for locating a folder.
#[cfg_attr(test, mockall::automock)]
pub trait FolderProbe: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Return a candidate folder, or `None` when this strategy finds nothing.
    ///
    /// Candidates are validated by the caller; a probe may return a path that
    /// does not exist.
    fn probe(&self, request: &ProbeRequest) -> Option<Utf8PathBuf>;
}

/// Probes used to discover the documents folder on `platform`.
pub fn docs_probes(platform: Platform) -> Vec<Box<dyn FolderProbe>> {
    match platform {
        Platform::Windows => vec![Box::new(NativeDocumentsProbe::new())],
        Platform::Other => vec![Box::new(CompatLayerProbe::new())],
    }
}

/// Probes used to discover the game folder on `platform`.
pub fn game_probes(platform: Platform) -> Vec<Box<dyn FolderProbe>> {
    vec![
        Box::new(XseLogProbe),
        Box::new(SteamLibraryProbe::new(default_library_manifests(platform))),
    ]
}

/// `Documents/My Games/{Docs Name}` under the OS documents folder.
#[derive(Debug, Clone)]
pub struct NativeDocumentsProbe {
    documents_dir: Option<Utf8PathBuf>,
}

impl NativeDocumentsProbe {
    pub fn new() -> Self {
        let documents_dir = dirs::document_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok());
        Self { documents_dir }
    }

    pub fn with_documents_dir(documents_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            documents_dir: Some(documents_dir.into()),
        }
    }
}

impl Default for NativeDocumentsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderProbe for NativeDocumentsProbe {
    fn name(&self) -> &'static str {
        "documents folder"
    }

    fn probe(&self, request: &ProbeRequest) -> Option<Utf8PathBuf> {
        let documents = self.documents_dir.as_ref()?;
        Some(documents.join("My Games").join(&request.docs_name))
    }
}

/// The documents folder inside the Proton prefix of the library that owns the game.
#[derive(Debug, Clone)]
pub struct CompatLayerProbe {
    manifests: Vec<Utf8PathBuf>,
}

impl CompatLayerProbe {
    pub fn new() -> Self {
        Self::with_manifests(default_library_manifests(Platform::Other))
    }

    pub fn with_manifests(manifests: Vec<Utf8PathBuf>) -> Self {
        Self { manifests }
    }
}

impl Default for CompatLayerProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderProbe for CompatLayerProbe {
    fn name(&self) -> &'static str {
        "Steam compatibility prefix"
    }

    fn probe(&self, request: &ProbeRequest) -> Option<Utf8PathBuf> {
        let steam_id = request.steam_id.as_deref()?;
        let library = find_library(&self.manifests, steam_id)?;
        Some(
            library
                .join("steamapps/compatdata")
                .join(steam_id)
                .join("pfx/drive_c/users/steamuser/My Documents/My Games")
                .join(&request.docs_name),
        )
    }
}

/// `{library}/steamapps/common/{Root Name}` for the library that owns the game.
#[derive(Debug, Clone)]
pub struct SteamLibraryProbe {
    manifests: Vec<Utf8PathBuf>,
}

impl SteamLibraryProbe {
    pub fn new(manifests: Vec<Utf8PathBuf>) -> Self {
        Self { manifests }
    }
}

impl FolderProbe for SteamLibraryProbe {
    fn name(&self) -> &'static str {
        "Steam library"
    }

    fn probe(&self, request: &ProbeRequest) -> Option<Utf8PathBuf> {
        let steam_id = request.steam_id.as_deref()?;
        let library = find_library(&self.manifests, steam_id)?;
        Some(library.join("steamapps/common").join(&request.root_name))
    }
}

static PLUGIN_DIRECTORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)plugin directory\s*=\s*(.+)$").expect("valid plugin directory regex")
});

/// Game folder recovered from the script extender log.
///
/// The log records `plugin directory = {Game}\Data\{XSE}\Plugins`; the game
/// folder is everything before `\Data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XseLogProbe;

impl FolderProbe for XseLogProbe {
    fn name(&self) -> &'static str {
        "script extender log"
    }

    fn probe(&self, request: &ProbeRequest) -> Option<Utf8PathBuf> {
        let log = request.xse_log.as_ref()?;
        let text = fs::read(log).ok()?;
        let text = String::from_utf8_lossy(&text);
        text.lines().find_map(|line| plugin_directory_root(line, &request.xse_acronym))
    }
}

/// Extract the game folder from a `plugin directory = ...` log line.
///
/// # Arguments
///
/// * `line` - One line of the script extender log
/// * `xse_acronym` - Script extender acronym, e.g. `F4SE`
///
/// # Returns
///
/// The game folder when the line names a plugin directory under `Data`
pub fn plugin_directory_root(line: &str, xse_acronym: &str) -> Option<Utf8PathBuf> {
    let captures = PLUGIN_DIRECTORY.captures(line)?;
    let directory = captures.get(1)?.as_str().trim();

    let lower = directory.to_ascii_lowercase();
    let acronym = xse_acronym.to_ascii_lowercase();
    let suffixes = [
        format!("\\data\\{}\\plugins", acronym),
        format!("/data/{}/plugins", acronym),
    ];
    let cut = suffixes
        .iter()
        .filter_map(|suffix| lower.strip_suffix(suffix.as_str()).map(str::len))
        .next()?;

    let root = directory[..cut].trim_end_matches(['\\', '/']);
    if root.is_empty() {
        return None;
    }
    Some(Utf8PathBuf::from(root))
}

/// Well-known `libraryfolders.vdf` locations for `platform`.
pub fn default_library_manifests(platform: Platform) -> Vec<Utf8PathBuf> {
    match platform {
        Platform::Windows => vec![
            Utf8PathBuf::from("C:/Program Files (x86)/Steam/steamapps/libraryfolders.vdf"),
            Utf8PathBuf::from("C:/Program Files/Steam/steamapps/libraryfolders.vdf"),
        ],
        Platform::Other => {
            let Some(home) = dirs::home_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok()) else {
                return Vec::new();
            };
            vec![
                home.join(".local/share/Steam/steamapps/libraryfolders.vdf"),
                home.join(".local/share/Steam/steamapps/common/libraryfolders.vdf"),
                home.join(".steam/steam/steamapps/libraryfolders.vdf"),
            ]
        }
    }
}

fn find_library(manifests: &[Utf8PathBuf], steam_id: &str) -> Option<Utf8PathBuf> {
    manifests.iter().find_map(|manifest| {
        let text = fs::read_to_string(manifest).ok()?;
        let library = library_for_app(&text, steam_id);
        if let Some(library) = &library {
            tracing::debug!("{} lists app {} under {}", manifest, steam_id, library);
        }
        library
    })
}

/// Find the library folder whose app list contains `steam_id`.
///
/// `libraryfolders.vdf` lists each library's `"path"` before its `"apps"`
/// block, so the most recent path seen owns the app.
pub fn library_for_app(vdf: &str, steam_id: &str) -> Option<Utf8PathBuf> {
    let quoted_id = format!("\"{}\"", steam_id);
    let mut current: Option<&str> = None;

    for line in vdf.lines() {
        let line = line.trim();
        if line.starts_with("\"path\"") {
            current = line.split('"').nth(3);
        } else if line.starts_with(&quoted_id) {
            if let Some(path) = current {
                return Some(Utf8PathBuf::from(path.replace("\\\\", "\\")));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use tempfile::TempDir;

    const VDF: &str = r#"
"libraryfolders"
{
	"0"
	{
		"path"		"/home/deck/.local/share/Steam"
		"apps"
		{
			"228980"		"1234"
		}
	}
	"1"
	{
		"path"		"/run/media/games/SteamLibrary"
		"apps"
		{
			"377160"		"33000000000"
			"611670"		"1000"
		}
	}
}
"#;

    #[test]
    fn test_library_for_app() {
        assert_eq!(
            library_for_app(VDF, "377160"),
            Some(Utf8PathBuf::from("/run/media/games/SteamLibrary"))
        );
        assert_eq!(
            library_for_app(VDF, "228980"),
            Some(Utf8PathBuf::from("/home/deck/.local/share/Steam"))
        );
        assert_eq!(library_for_app(VDF, "489830"), None);
    }

    #[test]
    fn test_library_for_app_windows_escapes() {
        let vdf = "\"path\"\t\t\"D:\\\\SteamLibrary\"\n\"377160\"\t\t\"1\"\n";
        assert_eq!(
            library_for_app(vdf, "377160"),
            Some(Utf8PathBuf::from("D:\\SteamLibrary"))
        );
    }

    #[test]
    fn test_plugin_directory_root() {
        let line = "plugin directory = D:\\Games\\Fallout 4\\Data\\F4SE\\Plugins";
        assert_eq!(
            plugin_directory_root(line, "F4SE"),
            Some(Utf8PathBuf::from("D:\\Games\\Fallout 4"))
        );
        assert_eq!(plugin_directory_root("checking plugin F4EE.dll", "F4SE"), None);
        assert_eq!(
            plugin_directory_root("plugin directory = D:\\Elsewhere\\Plugins", "F4SE"),
            None
        );
    }

    #[test]
    fn test_compat_layer_probe() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Utf8Path::from_path(temp_dir.path()).unwrap().join("libraryfolders.vdf");
        fs::write(&manifest, VDF).unwrap();

        let probe = CompatLayerProbe::with_manifests(vec![manifest]);
        let request = ProbeRequest {
            steam_id: Some("377160".to_string()),
            docs_name: "Fallout4".to_string(),
            ..Default::default()
        };

        assert_eq!(
            probe.probe(&request),
            Some(Utf8PathBuf::from(
                "/run/media/games/SteamLibrary/steamapps/compatdata/377160/pfx/drive_c/users/steamuser/My Documents/My Games/Fallout4"
            ))
        );
    }

    #[test]
    fn test_steam_library_probe_without_app_id() {
        let probe = SteamLibraryProbe::new(vec![Utf8PathBuf::from("/nope/libraryfolders.vdf")]);
        assert_eq!(probe.probe(&ProbeRequest::default()), None);
    }

    #[test]
    fn test_native_documents_probe() {
        let probe = NativeDocumentsProbe::with_documents_dir("C:/Users/me/Documents");
        let request = ProbeRequest {
            docs_name: "Fallout4".to_string(),
            ..Default::default()
        };
        assert_eq!(
            probe.probe(&request),
            Some(Utf8PathBuf::from("C:/Users/me/Documents/My Games/Fallout4"))
        );
    }

    #[test]
    fn test_xse_log_probe() {
        let temp_dir = TempDir::new().unwrap();
        let log = Utf8Path::from_path(temp_dir.path()).unwrap().join("f4se.log");
        fs::write(
            &log,
            "F4SE runtime: initialize (version = 0.6.23 010A0A30)\r\nplugin directory = C:\\Steam\\Fallout 4\\Data\\F4SE\\Plugins\r\n",
        )
        .unwrap();

        let request = ProbeRequest {
            xse_log: Some(log),
            xse_acronym: "F4SE".to_string(),
            ..Default::default()
        };
        assert_eq!(
            XseLogProbe.probe(&request),
            Some(Utf8PathBuf::from("C:\\Steam\\Fallout 4"))
        );
    }
}
