/// Which game CLASSIC is currently managing, and whether its VR edition is targeted.
///
/// Store paths (`CLASSIC {Game}.yaml`) and key prefixes (`Game{VR}_Info`) are
/// derived from this on every access, so a context change is picked up by the
/// next configuration read without any cache flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameVars {
    /// Internal game name, e.g. `Fallout4`
    pub game: String,
    pub vr: bool,
}

impl GameVars {
    pub fn new(game: impl Into<String>, vr: bool) -> Self {
        Self {
            game: game.into(),
            vr,
        }
    }

    /// `"VR"` when the VR edition is targeted, empty otherwise.
    pub fn vr_suffix(&self) -> &'static str {
        if self.vr { "VR" } else { "" }
    }

    /// Prefix of the per-variant info section, `Game_Info` or `GameVR_Info`.
    pub fn info_section(&self) -> String {
        format!("Game{}_Info", self.vr_suffix())
    }

    /// Dotted path to `key` inside the per-variant info section.
    pub fn info_key(&self, key: &str) -> String {
        format!("{}.{}", self.info_section(), key)
    }

    /// Executable name of the active variant, e.g. `Fallout4VR.exe`.
    pub fn exe_name(&self) -> String {
        format!("{}{}.exe", self.game, self.vr_suffix())
    }

    /// Map the `Managed Game` setting to an internal game name.
    pub fn game_from_setting(managed_game: &str) -> String {
        match managed_game.trim() {
            "Fallout 4" | "" => "Fallout4".to_string(),
            "Skyrim SE" | "Skyrim Special Edition" => "SkyrimSE".to_string(),
            other => other.replace(' ', ""),
        }
    }
}

impl Default for GameVars {
    fn default() -> Self {
        Self::new("Fallout4", false)
    }
}
