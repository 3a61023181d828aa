use std::fmt;

/// Logical YAML stores known to the configuration cache.
///
/// The backing file of each store is resolved on every access, because the
/// `Game` and `GameLocal` files depend on which game is currently managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YamlStore {
    /// `CLASSIC Data/databases/CLASSIC Main.yaml`
    Main,
    /// `CLASSIC Settings.yaml`
    Settings,
    /// `CLASSIC Ignore.yaml`
    Ignore,
    /// `CLASSIC Data/databases/CLASSIC {Game}.yaml`
    Game,
    /// `CLASSIC Data/CLASSIC {Game} Local.yaml`
    GameLocal,
    /// `tests/test_settings.yaml`
    Test,
}

impl YamlStore {
    pub const ALL: [YamlStore; 6] = [
        YamlStore::Main,
        YamlStore::Settings,
        YamlStore::Ignore,
        YamlStore::Game,
        YamlStore::GameLocal,
        YamlStore::Test,
    ];

    pub fn name(self) -> &'static str {
        match self {
            YamlStore::Main => "Main",
            YamlStore::Settings => "Settings",
            YamlStore::Ignore => "Ignore",
            YamlStore::Game => "Game",
            YamlStore::GameLocal => "GameLocal",
            YamlStore::Test => "Test",
        }
    }
}

impl fmt::Display for YamlStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
