use serde::{Deserialize, Serialize};

/// Typed view of `CLASSIC Settings.yaml`.
///
/// Only used for whole-document reads at startup; individual settings are
/// otherwise addressed through [`crate::config::ConfigStore::setting`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(rename = "CLASSIC_Settings", default)]
    pub classic_settings: ClassicSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicSettings {
    #[serde(rename = "Managed Game", default = "default_managed_game")]
    pub managed_game: String,

    #[serde(rename = "Update Check", default = "default_true")]
    pub update_check: bool,

    #[serde(rename = "VR Mode", default)]
    pub vr_mode: bool,

    #[serde(rename = "FCX Mode", default = "default_true")]
    pub fcx_mode: bool,

    #[serde(rename = "Simplify Logs", default)]
    pub simplify_logs: bool,

    #[serde(rename = "Show FormID Values", default)]
    pub show_formid_values: bool,

    #[serde(rename = "Move Unsolved Logs", default = "default_true")]
    pub move_unsolved_logs: bool,

    #[serde(rename = "INI Folder Path", default)]
    pub ini_folder_path: Option<String>,

    #[serde(rename = "MODS Folder Path", default)]
    pub mods_folder_path: Option<String>,

    #[serde(rename = "SCAN Custom Path", default)]
    pub scan_custom_path: Option<String>,

    #[serde(rename = "Audio Notifications", default = "default_true")]
    pub audio_notifications: bool,

    #[serde(rename = "Update Source", default = "default_update_source")]
    pub update_source: String,

    #[serde(rename = "Journal Expiration", default = "default_journal_expiration")]
    pub journal_expiration: u32,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for ClassicSettings {
    fn default() -> Self {
        Self {
            managed_game: default_managed_game(),
            update_check: true,
            vr_mode: false,
            fcx_mode: true,
            simplify_logs: false,
            show_formid_values: false,
            move_unsolved_logs: true,
            ini_folder_path: None,
            mods_folder_path: None,
            scan_custom_path: None,
            audio_notifications: true,
            update_source: default_update_source(),
            journal_expiration: default_journal_expiration(),
            debug_mode: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_managed_game() -> String {
    "Fallout 4".to_string()
}

fn default_update_source() -> String {
    "Both".to_string()
}

fn default_journal_expiration() -> u32 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = ClassicSettings::default();
        assert_eq!(settings.managed_game, "Fallout 4");
        assert_eq!(settings.journal_expiration, 7);
        assert!(settings.update_check);
        assert!(!settings.vr_mode);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let yaml = "CLASSIC_Settings:\n  VR Mode: true\n  INI Folder Path:\n";
        let file: SettingsFile = serde_yaml_ng::from_str(yaml).unwrap();

        assert!(file.classic_settings.vr_mode);
        assert!(file.classic_settings.fcx_mode);
        assert_eq!(file.classic_settings.ini_folder_path, None);
        assert_eq!(file.classic_settings.update_source, "Both");
    }
}
